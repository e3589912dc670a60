//! 分块处理流水线.
//!
//! 正弦图分块: 暗场/平场校正 → 去坏点 → 去条纹.
//! 投影分块: 相位恢复 → 负对数 → 360° 填充 (或直接复制).
//!
//! 所有步骤都在调用方给出的缓冲上进行, 不在调用之间保存任何分块状态.

use crate::backend::{Reconstructor, RustFftFilter, SpectralFilter};
use crate::conf::{FbpFilter, PhaseMethod, ScanType, StripeMethod, TomoConf};
use crate::correct;
use crate::error::{check_shape, ConfigError, ProcError, ProcResult};
use crate::external::{self, Collaborators};
use crate::float::{Precision, TomoFloat};
use crate::mode::{select_mode, Geometry, Mode, ReconLayout};
use crate::pad360::{self, blend_width};
use crate::ramp::{fbp_filter_center, padded_len};
use crate::stream::ExecStream;
use ndarray::{Array3, ArrayView1, ArrayView3, ArrayViewMut3};
use num::traits::AsPrimitive;

/// 预处理核心. 构造后几何参数与模式只读.
///
/// `F` 为频域滤波后端, `R` 为重建后端.
pub struct TomoFunctions<T: TomoFloat, F = RustFftFilter<T>, R = ReconLayout> {
    mode: Mode,
    geometry: Geometry,
    precision: Precision,
    filter: F,
    rec: R,
    family: FbpFilter,
    ne: usize,
    scan: ScanType,
    dezinger: usize,
    stripe: StripeMethod,
    phase: PhaseMethod,
    collaborators: Collaborators<T>,
}

impl<T, F, R> std::fmt::Debug for TomoFunctions<T, F, R>
where
    T: TomoFloat,
    F: std::fmt::Debug,
    R: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TomoFunctions")
            .field("mode", &self.mode)
            .field("geometry", &self.geometry)
            .field("precision", &self.precision)
            .field("filter", &self.filter)
            .field("rec", &self.rec)
            .field("family", &self.family)
            .field("ne", &self.ne)
            .field("scan", &self.scan)
            .field("dezinger", &self.dezinger)
            .field("stripe", &self.stripe)
            .field("phase", &self.phase)
            .field("collaborators", &self.collaborators)
            .finish()
    }
}

impl<T, F, R> TomoFunctions<T, F, R>
where
    T: TomoFloat,
    F: SpectralFilter<T>,
    R: Reconstructor,
{
    /// 根据配置构造, 并注入外部算法.
    ///
    /// # 返回值
    ///
    /// 以下情况返回 [`ConfigError`]:
    ///
    /// - 任何字符串键 (算法名, 滤波族, 扫描类型, 去条纹/相位恢复方法) 无法识别;
    /// - 模式非法, 见 [`select_mode`];
    /// - 配置了去条纹或相位恢复, 但 `collaborators` 中没有对应实现.
    pub fn new(conf: &TomoConf, collaborators: Collaborators<T>) -> ProcResult<Self> {
        let family = conf.filter_family()?;
        let scan = conf.scan_type()?;
        let stripe = conf.stripe_method()?;
        let phase = conf.phase_method()?;

        if stripe != StripeMethod::Disabled && collaborators.stripe.is_none() {
            return Err(ConfigError::MissingCollaborator("fw").into());
        }
        if phase != PhaseMethod::Disabled && collaborators.phase.is_none() {
            return Err(ConfigError::MissingCollaborator("paganin").into());
        }

        let sel = select_mode::<T, F, R>(conf)?;
        let ne = padded_len(conf.n, conf.precision);
        log::info!(
            "tomo functions ready: {:?}, {:?} filter (ne = {ne}), {:?}, dezinger = {}",
            sel.mode,
            family,
            scan,
            conf.dezinger
        );

        Ok(Self {
            mode: sel.mode,
            geometry: sel.geometry,
            precision: conf.precision,
            filter: sel.filter,
            rec: sel.rec,
            family,
            ne,
            scan,
            dezinger: conf.dezinger,
            stripe,
            phase,
            collaborators,
        })
    }
}

impl<T: TomoFloat, F, R> TomoFunctions<T, F, R> {
    /// 模式.
    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// 几何参数 (旋转中心已按模式调整).
    #[inline]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// 精度模式.
    #[inline]
    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// 频域滤波后端.
    #[inline]
    pub fn filter(&self) -> &F {
        &self.filter
    }

    /// 重建后端.
    #[inline]
    pub fn reconstructor(&self) -> &R {
        &self.rec
    }

    /// 滤波填充长度.
    #[inline]
    pub fn padded_len(&self) -> usize {
        self.ne
    }

    /// 扫描类型.
    #[inline]
    pub fn scan_type(&self) -> ScanType {
        self.scan
    }

    /// 正弦图分块后两轴应有的形状: `[角度数, ni]`.
    /// 层析模式下每块只含 `ncproj` 个角度, 否则为全部 `nproj` 个.
    fn sinogram_frame(&self) -> [usize; 2] {
        let g = &self.geometry;
        let nangles = if self.mode.lamino { g.ncproj } else { g.nproj };
        [nangles, g.ni]
    }

    /// 处理一个正弦图分块, 结果写入 `res`. `raw` 不被修改.
    ///
    /// `raw`, `dark`, `flat` 的后两轴必须为 `[角度数, ni]`, 层析模式下角度数为 `ncproj`.
    /// 形状不符时在写入 `res` 之前返回 `ShapeMismatch`.
    pub fn process_sinogram_chunk_into<U>(
        &self,
        raw: ArrayView3<U>,
        dark: ArrayView3<U>,
        flat: ArrayView3<U>,
        mut res: ArrayViewMut3<T>,
    ) -> ProcResult<()>
    where
        U: AsPrimitive<T> + Sync,
    {
        let [nangles, ni] = self.sinogram_frame();
        for (what, shape) in [("sinogram chunk", raw.shape()), ("dark", dark.shape()), ("flat", flat.shape())] {
            check_shape(what, &[shape[0], nangles, ni], shape)?;
        }
        correct::darkflat_correction(raw, dark, flat, res.view_mut())?;
        correct::remove_outliers(res.view_mut(), self.dezinger);
        external::remove_stripe(res, &self.stripe, self.collaborators.stripe.as_deref())
    }

    /// 处理一个正弦图分块, 结果写入新分配的数组.
    pub fn process_sinogram_chunk<U>(
        &self,
        raw: ArrayView3<U>,
        dark: ArrayView3<U>,
        flat: ArrayView3<U>,
    ) -> ProcResult<Array3<T>>
    where
        U: AsPrimitive<T> + Sync,
    {
        let mut res = Array3::zeros(raw.dim());
        self.process_sinogram_chunk_into(raw, dark, flat, res.view_mut())?;
        Ok(res)
    }

    /// 投影分块输入应有的列数: 双倍视场时为 `n / 2`, 否则为 `n`.
    fn projection_width(&self, found: usize) -> ProcResult<usize> {
        let n = self.geometry.n;
        match self.scan {
            ScanType::Standard => Ok(n),
            ScanType::DoubleFov if n % 2 == 0 => Ok(n / 2),
            ScanType::DoubleFov => Err(ProcError::shape("projection chunk", &[n / 2], &[found])),
        }
    }

    /// 处理一个投影分块, 结果 (`[a, b, n]`) 写入 `res`.
    ///
    /// `data` 作为工作区被就地改写 (相位恢复与负对数). 所有形状检查都在第一次写入之前完成.
    pub fn process_projection_chunk_into(
        &self,
        mut data: ArrayViewMut3<T>,
        mut res: ArrayViewMut3<T>,
    ) -> ProcResult<()> {
        let (a, b, m) = data.dim();
        let width = self.projection_width(m)?;
        check_shape("projection chunk", &[a, b, width], data.shape())?;
        check_shape("projection result", &[a, b, self.geometry.n], res.shape())?;
        if self.scan == ScanType::DoubleFov {
            let w = blend_width(self.geometry.ni, self.geometry.center);
            if w > m {
                return Err(ProcError::shape("pad360 blend region", &[m], &[w]));
            }
        }

        external::retrieve_phase(
            data.view_mut(),
            &self.phase,
            self.collaborators.phase.as_deref(),
        )?;
        correct::minus_log(data.view_mut());
        match self.scan {
            ScanType::DoubleFov => {
                let g = &self.geometry;
                pad360::pad360_into(data.view(), res, g.ni, g.centeri, g.center)
            }
            ScanType::Standard => {
                res.assign(&data);
                Ok(())
            }
        }
    }

    /// 处理一个投影分块, 结果写入新分配的 `[a, b, n]` 数组.
    pub fn process_projection_chunk(&self, data: ArrayViewMut3<T>) -> ProcResult<Array3<T>> {
        let (a, b, _) = data.dim();
        let mut res = Array3::zeros((a, b, self.geometry.n));
        self.process_projection_chunk_into(data, res.view_mut())?;
        Ok(res)
    }
}

impl<T, F, R> TomoFunctions<T, F, R>
where
    T: TomoFloat,
    F: SpectralFilter<T>,
{
    /// 就地斜坡滤波并校正旋转中心. `shift` 按第一轴逐切片给出额外的水平偏移.
    ///
    /// 滤波工作提交到 `stream` 上, 见 [`fbp_filter_center`].
    pub fn apply_ramp_filter_center(
        &self,
        data: ArrayViewMut3<T>,
        shift: Option<ArrayView1<f64>>,
        stream: &ExecStream,
    ) -> ProcResult<()> {
        fbp_filter_center(
            data,
            &self.filter,
            self.family,
            self.ne,
            self.geometry.n,
            self.geometry.center,
            shift,
            stream,
        )
    }
}
