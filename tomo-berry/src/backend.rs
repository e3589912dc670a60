//! 外部协作者的能力接口, 以及一个基于 `rustfft` 的 CPU 频域滤波后端.
//!
//! 预处理核心只负责准备数据: 填充后的分块与权重谱交给 [`SpectralFilter`],
//! 反投影交给 [`Reconstructor`]. 两者都在构造时由 [`crate::mode::select_mode`] 按尺寸创建.

use crate::error::{check_shape, ProcResult};
use crate::float::TomoFloat;
use crate::mode::ReconLayout;
use crate::stream::ExecStream;
use ndarray::{ArrayView1, ArrayView2, ArrayViewMut2, ArrayViewMut3, Axis};
use num::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// 频域滤波器的构造尺寸.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FilterSizing {
    /// 探测器宽度.
    pub n: usize,

    /// 第二轴长度 (平面模式为角度数, 层析模式为每块角度数).
    pub nproj: usize,

    /// 第一轴长度 (平面模式为每块切片数, 层析模式为总行数).
    pub nz: usize,

    /// 填充后的滤波长度.
    pub ne: usize,
}

/// 频域滤波后端.
///
/// `filter` 对 `data` 的最后一轴做实数 FFT, 第 `s` 个切片乘以权重 `weights` 的第 `s` 行,
/// 再做逆变换, 结果就地写回. 工作提交到 `stream` 上, 调用方负责在读取结果前同步.
pub trait SpectralFilter<T: TomoFloat>: Sized {
    /// 按尺寸构造.
    fn sized(sizing: FilterSizing) -> ProcResult<Self>;

    /// 就地滤波. `data` 形状为 `[s, a, ne]`, `weights` 形状为 `[s, ne / 2 + 1]`.
    fn filter(
        &self,
        data: ArrayViewMut3<T>,
        weights: ArrayView2<Complex<T>>,
        stream: &ExecStream,
    ) -> ProcResult<()>;
}

/// 重建后端. 由外层调度器调用, 预处理核心只负责按布局构造它.
pub trait Reconstructor: Sized {
    /// 按布局构造.
    fn build(layout: ReconLayout) -> ProcResult<Self>;
}

/// 布局本身即可充当占位重建器: 调度器可读取布局后自行创建真正的重建器.
impl Reconstructor for ReconLayout {
    #[inline]
    fn build(layout: ReconLayout) -> ProcResult<Self> {
        Ok(layout)
    }
}

/// 基于 `rustfft` 的 CPU 频域滤波器. 计划 (plan) 在构造时创建并复用.
pub struct RustFftFilter<T: TomoFloat> {
    sizing: FilterSizing,
    forward: Arc<dyn Fft<T>>,
    inverse: Arc<dyn Fft<T>>,
}

impl<T: TomoFloat> std::fmt::Debug for RustFftFilter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RustFftFilter")
            .field("sizing", &self.sizing)
            .finish()
    }
}

impl<T: TomoFloat> RustFftFilter<T> {
    /// 构造尺寸.
    #[inline]
    pub fn sizing(&self) -> FilterSizing {
        self.sizing
    }

    /// 单个切片所需的 (变换缓冲, 草稿缓冲).
    fn buffers(&self) -> (Vec<Complex<T>>, Vec<Complex<T>>) {
        let scratch = self
            .forward
            .get_inplace_scratch_len()
            .max(self.inverse.get_inplace_scratch_len());
        (
            vec![Complex::new(T::zero(), T::zero()); self.sizing.ne],
            vec![Complex::new(T::zero(), T::zero()); scratch],
        )
    }

    /// 对一个切片 `[a, ne]` 的每一行做滤波.
    fn filter_slab(
        &self,
        mut slab: ArrayViewMut2<T>,
        w: ArrayView1<Complex<T>>,
        buf: &mut [Complex<T>],
        scratch: &mut [Complex<T>],
    ) {
        let ne = self.sizing.ne;
        let half = ne / 2;
        let scale = T::one() / T::of_f64(ne as f64);

        for mut row in slab.rows_mut() {
            for (b, &x) in buf.iter_mut().zip(row.iter()) {
                *b = Complex::new(x, T::zero());
            }
            self.forward.process_with_scratch(buf, scratch);

            // 实信号的谱共轭对称, 负频率用共轭权重.
            buf[0] = buf[0] * w[0];
            for k in 1..=half {
                buf[k] = buf[k] * w[k];
                if ne - k != k {
                    buf[ne - k] = buf[ne - k] * w[k].conj();
                }
            }

            self.inverse.process_with_scratch(buf, scratch);
            for (x, b) in row.iter_mut().zip(buf.iter()) {
                *x = b.re * scale;
            }
        }
    }
}

impl<T: TomoFloat> SpectralFilter<T> for RustFftFilter<T> {
    fn sized(sizing: FilterSizing) -> ProcResult<Self> {
        let mut planner = FftPlanner::<T>::new();
        let forward = planner.plan_fft_forward(sizing.ne);
        let inverse = planner.plan_fft_inverse(sizing.ne);
        log::debug!(
            "rustfft filter planned: n = {}, ne = {}, [{}, {}]",
            sizing.n,
            sizing.ne,
            sizing.nz,
            sizing.nproj
        );
        Ok(Self {
            sizing,
            forward,
            inverse,
        })
    }

    fn filter(
        &self,
        mut data: ArrayViewMut3<T>,
        weights: ArrayView2<Complex<T>>,
        stream: &ExecStream,
    ) -> ProcResult<()> {
        let (ns, na, ne) = data.dim();
        let nfreq = self.sizing.ne / 2 + 1;
        check_shape("padded chunk", &[ns, na, self.sizing.ne], &[ns, na, ne])?;
        check_shape("filter weights", &[ns, nfreq], weights.shape())?;

        stream.run(|| {
            cfg_if::cfg_if! {
                if #[cfg(feature = "rayon")] {
                    use ndarray::parallel::prelude::*;

                    data.axis_iter_mut(Axis(0))
                        .into_par_iter()
                        .zip(weights.axis_iter(Axis(0)).into_par_iter())
                        .for_each_init(
                            || self.buffers(),
                            |(buf, scratch), (slab, w)| self.filter_slab(slab, w, buf, scratch),
                        );
                } else {
                    let (mut buf, mut scratch) = self.buffers();
                    for (slab, w) in data.axis_iter_mut(Axis(0)).zip(weights.axis_iter(Axis(0))) {
                        self.filter_slab(slab, w, &mut buf, &mut scratch);
                    }
                }
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    fn sizing(ne: usize) -> FilterSizing {
        FilterSizing {
            n: ne,
            nproj: 2,
            nz: 2,
            ne,
        }
    }

    /// 全 1 权重是恒等变换.
    #[test]
    fn test_unit_weights_identity() {
        let f = RustFftFilter::<f64>::sized(sizing(12)).unwrap();
        let data = Array3::from_shape_fn((2, 3, 12), |(s, a, c)| {
            (s as f64 + 1.0) * ((c * 7 + a) % 5) as f64
        });
        let mut out = data.clone();
        let w = Array2::from_elem((2, 7), Complex::new(1.0, 0.0));
        f.filter(out.view_mut(), w.view(), &ExecStream::default())
            .unwrap();
        for (a, b) in data.iter().zip(out.iter()) {
            assert!((a - b).abs() < 1e-10);
        }
    }

    /// 线性相位 `exp(-2 pi i k s / ne)` 等价于循环右移 `s` 个采样.
    #[test]
    fn test_linear_phase_is_circular_shift() {
        let ne = 16;
        let f = RustFftFilter::<f64>::sized(sizing(ne)).unwrap();
        let data = Array3::from_shape_fn((1, 1, ne), |(_, _, c)| (c as f64 * 0.7).sin());
        let mut out = data.clone();
        let w = Array2::from_shape_fn((1, ne / 2 + 1), |(_, k)| {
            let phase = -2.0 * std::f64::consts::PI * k as f64 * 2.0 / ne as f64;
            Complex::new(phase.cos(), phase.sin())
        });
        f.filter(out.view_mut(), w.view(), &ExecStream::default())
            .unwrap();
        for c in 0..ne {
            let expected = data[(0, 0, (c + ne - 2) % ne)];
            assert!((out[(0, 0, c)] - expected).abs() < 1e-10);
        }
    }

    #[test]
    fn test_shape_checked() {
        let f = RustFftFilter::<f32>::sized(sizing(8)).unwrap();
        let mut data = Array3::<f32>::zeros((2, 2, 6));
        let w = Array2::from_elem((2, 5), Complex::new(1.0f32, 0.0));
        assert!(f
            .filter(data.view_mut(), w.view(), &ExecStream::default())
            .is_err());

        let mut data = Array3::<f32>::zeros((2, 2, 8));
        let w = Array2::from_elem((3, 5), Complex::new(1.0f32, 0.0));
        assert!(f
            .filter(data.view_mut(), w.view(), &ExecStream::default())
            .is_err());
    }
}
