//! 斜坡滤波 + 亚像素旋转中心校正.
//!
//! 沿最后一轴边缘延拓到长度 `ne`, 在频域乘以 `w(t) * exp(-2 pi i t (-center + shift + n/2))`,
//! 再裁剪回原宽度. 频域乘法本身交给 [`SpectralFilter`] 后端.

use crate::backend::SpectralFilter;
use crate::conf::FbpFilter;
use crate::consts::{PAD_DEN, PAD_NUM};
use crate::error::{check_shape, ProcError, ProcResult};
use crate::float::{Precision, TomoFloat};
use crate::stream::ExecStream;
use ndarray::{s, Array2, Array3, ArrayView1, ArrayViewMut3};
use num::Complex;
use std::f64::consts::PI;

/// 滤波填充长度: `ceil(3n / 2)`, 低精度模式下再取不小于它的 2 的幂.
#[inline]
pub fn padded_len(n: usize, precision: Precision) -> usize {
    let ne = (PAD_NUM * n + PAD_DEN - 1) / PAD_DEN;
    if precision.is_reduced() {
        ne.next_power_of_two()
    } else {
        ne
    }
}

/// 实数 FFT 的非负频率 `k / ne, k = 0 ..= ne / 2`.
pub fn rfftfreq(ne: usize) -> Vec<f64> {
    let ne_f = ne as f64;
    (0..=ne / 2).map(|k| k as f64 / ne_f).collect()
}

/// 归一化 sinc: `sin(pi x) / (pi x)`, `sinc(0) = 1`.
#[inline]
pub fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let px = PI * x;
        px.sin() / px
    }
}

/// 频率 `t` 处的实数斜坡权重.
#[inline]
pub fn ramp_amplitude(family: FbpFilter, t: f64) -> f64 {
    match family {
        FbpFilter::Parzen => t * (1.0 - 2.0 * t).powi(3),
        FbpFilter::Shepp => t * sinc(t),
    }
}

/// 构造 `[slices, ne / 2 + 1]` 的复权重.
///
/// 第 `s` 行的相位由 `-center + shift[s] + n / 2` 决定. `shift` 为 `None` 时视为全 0.
/// 调用方保证 `shift` 的长度为 `slices`.
pub fn ramp_weights<T: TomoFloat>(
    family: FbpFilter,
    ne: usize,
    n: usize,
    center: f64,
    slices: usize,
    shift: Option<ArrayView1<f64>>,
) -> Array2<Complex<T>> {
    let t = rfftfreq(ne);
    let half_n = n as f64 / 2.0;
    Array2::from_shape_fn((slices, t.len()), |(s, k)| {
        let sht = shift.as_ref().map_or(0.0, |v| v[s]);
        let tk = t[k];
        let amp = ramp_amplitude(family, tk);
        let phase = -2.0 * PI * tk * (-center + sht + half_n);
        Complex::new(T::of_f64(amp * phase.cos()), T::of_f64(amp * phase.sin()))
    })
}

/// 就地斜坡滤波并校正旋转中心.
///
/// `data` 形状为 `[s, a, n]`, `filter` 的填充长度为 `ne`. 结果覆盖 `data`.
///
/// # 返回值
///
/// `data` 最后一轴不等于 `n`, 或 `shift` 长度不等于 `s` 时返回 `ShapeMismatch`,
/// 且 `data` 不变.
#[allow(clippy::too_many_arguments)]
pub fn fbp_filter_center<T, F>(
    mut data: ArrayViewMut3<T>,
    filter: &F,
    family: FbpFilter,
    ne: usize,
    n: usize,
    center: f64,
    shift: Option<ArrayView1<f64>>,
    stream: &ExecStream,
) -> ProcResult<()>
where
    T: TomoFloat,
    F: SpectralFilter<T>,
{
    let (ns, na, nw) = data.dim();
    check_shape("ramp filter chunk", &[ns, na, n], &[ns, na, nw])?;
    if let Some(v) = shift.as_ref() {
        check_shape("center shift", &[ns], v.shape())?;
    }
    if ne < n {
        return Err(ProcError::shape("padded length", &[n], &[ne]));
    }

    let left = ne / 2 - n / 2;
    let right = left + n;
    let mut padded = Array3::<T>::zeros((ns, na, ne));
    padded.slice_mut(s![.., .., left..right]).assign(&data);
    if left > 0 {
        padded
            .slice_mut(s![.., .., ..left])
            .assign(&data.slice(s![.., .., ..1]));
    }
    if right < ne {
        padded
            .slice_mut(s![.., .., right..])
            .assign(&data.slice(s![.., .., n - 1..]));
    }

    let weights = ramp_weights::<T>(family, ne, n, center, ns, shift);
    filter.filter(padded.view_mut(), weights.view(), stream)?;
    stream.synchronize();

    data.assign(&padded.slice(s![.., .., left..right]));
    log::trace!("ramp filter ({family:?}) applied on [{ns}, {na}, {n}], ne = {ne}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{FilterSizing, RustFftFilter};
    use ndarray::{array, Array3};

    fn rust_fft<T: TomoFloat>(n: usize, precision: Precision) -> RustFftFilter<T> {
        RustFftFilter::sized(FilterSizing {
            n,
            nproj: 3,
            nz: 2,
            ne: padded_len(n, precision),
        })
        .unwrap()
    }

    #[test]
    fn test_padded_len() {
        assert_eq!(padded_len(64, Precision::Float32), 96);
        assert_eq!(padded_len(65, Precision::Float64), 98);
        assert_eq!(padded_len(64, Precision::Float16), 128);
        assert_eq!(padded_len(100, Precision::Float16), 256);
        for n in 1..300 {
            for p in [Precision::Float16, Precision::Float32] {
                let ne = padded_len(n, p);
                assert!(2 * ne >= 3 * n);
                if p.is_reduced() {
                    assert!(ne.is_power_of_two());
                }
            }
        }
    }

    #[test]
    fn test_amplitudes() {
        assert_eq!(sinc(0.0), 1.0);
        assert!(sinc(1.0).abs() < 1e-15);
        assert_eq!(ramp_amplitude(FbpFilter::Parzen, 0.0), 0.0);
        assert_eq!(ramp_amplitude(FbpFilter::Shepp, 0.0), 0.0);
        // Parzen 在 Nyquist 处归零.
        assert_eq!(ramp_amplitude(FbpFilter::Parzen, 0.5), 0.0);
        assert!((ramp_amplitude(FbpFilter::Shepp, 0.5) - 1.0 / PI).abs() < 1e-15);
        assert_eq!(rfftfreq(6), vec![0.0, 1.0 / 6.0, 2.0 / 6.0, 0.5]);
    }

    /// 旋转中心与单切片偏移只以 `-center + shift` 的组合出现.
    #[test]
    fn test_shift_equivalent_to_center() {
        let shift = array![0.25, -1.5];
        let a = ramp_weights::<f64>(FbpFilter::Shepp, 48, 32, 16.0, 2, Some(shift.view()));
        for (s, d) in shift.iter().enumerate() {
            let b = ramp_weights::<f64>(FbpFilter::Shepp, 48, 32, 16.0 - d, 1, None);
            for k in 0..25 {
                assert!((a[(s, k)] - b[(0, k)]).norm() < 1e-12);
            }
        }
        // center 恰为 n/2 且无偏移时权重为实数.
        let c = ramp_weights::<f32>(FbpFilter::Parzen, 48, 32, 16.0, 1, None);
        assert!(c.iter().all(|w| w.im == 0.0));
    }

    /// `center = n/2 + d` (整数 `d`) 时结果整体左移 `d` 列.
    #[test]
    fn test_center_shift_direction() {
        let n = 32;
        let d = 3;
        let f = rust_fft::<f64>(n, Precision::Float64);
        let ne = f.sizing().ne;
        let stream = ExecStream::default();

        let mut impulse = Array3::<f64>::zeros((1, 1, n));
        impulse[(0, 0, 16)] = 1.0;
        let run = |center: f64| {
            let mut data = impulse.clone();
            fbp_filter_center(
                data.view_mut(),
                &f,
                FbpFilter::Shepp,
                ne,
                n,
                center,
                None,
                &stream,
            )
            .unwrap();
            data.into_raw_vec()
        };
        let base = run(n as f64 / 2.0);
        let moved = run((n / 2 + d) as f64);

        for c in 0..n - d {
            assert!((moved[c] - base[c + d]).abs() < 1e-9, "column {c}");
        }
        let argmax = |v: &[f64]| {
            (0..v.len())
                .max_by(|&a, &b| v[a].cmp_total(&v[b]))
                .unwrap()
        };
        assert_eq!(argmax(&base[..]), 16);
        assert_eq!(argmax(&moved[..]), 16 - d);
    }

    /// 常数输入的直流分量被滤掉.
    #[test]
    fn test_constant_input_vanishes() {
        let n = 20;
        let f = rust_fft::<f64>(n, Precision::Float64);
        let ne = f.sizing().ne;
        let mut data = Array3::from_elem((2, 3, n), 5.0f64);
        fbp_filter_center(
            data.view_mut(),
            &f,
            FbpFilter::Parzen,
            ne,
            n,
            n as f64 / 2.0,
            None,
            &ExecStream::default(),
        )
        .unwrap();
        assert_eq!(data.dim(), (2, 3, n));
        assert!(data.iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn test_reduced_precision_keeps_shape() {
        let n = 24;
        let f = rust_fft::<f32>(n, Precision::Float16);
        let ne = f.sizing().ne;
        assert_eq!(ne, 64);
        let mut data = Array3::from_shape_fn((2, 3, n), |(a, b, c)| (a + b * c) as f32);
        let shift = array![0.5, -0.5];
        fbp_filter_center(
            data.view_mut(),
            &f,
            FbpFilter::Shepp,
            ne,
            n,
            11.7,
            Some(shift.view()),
            &ExecStream::new(1),
        )
        .unwrap();
        assert_eq!(data.dim(), (2, 3, n));
        assert!(data.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_shift_length_checked() {
        let n = 8;
        let f = rust_fft::<f32>(n, Precision::Float32);
        let ne = f.sizing().ne;
        let mut data = Array3::from_elem((2, 3, n), 1.0f32);
        let shift = array![0.0, 1.0, 2.0];
        let err = fbp_filter_center(
            data.view_mut(),
            &f,
            FbpFilter::Parzen,
            ne,
            n,
            4.0,
            Some(shift.view()),
            &ExecStream::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ProcError::ShapeMismatch {
                what: "center shift",
                ..
            }
        ));
        assert!(data.iter().all(|&v| v == 1.0));
    }
}
