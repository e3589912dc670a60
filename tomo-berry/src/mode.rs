//! 重建模式选择.
//!
//! 构造时根据 (层析开关 × 算法名) 选出滤波器与重建器的尺寸, 并调整旋转中心约定.
//! 该步骤之后几何参数只读.

use crate::backend::{FilterSizing, Reconstructor, SpectralFilter};
use crate::conf::{ReconAlgorithm, TomoConf};
use crate::consts::LOG_POLAR_CENTER_SHIFT;
use crate::error::{ConfigError, ProcResult};
use crate::float::{Precision, TomoFloat};
use crate::ramp::padded_len;

/// 重建模式.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Mode {
    /// 是否为层析 (laminography) 模式.
    pub lamino: bool,

    /// 重建算法.
    pub algorithm: ReconAlgorithm,
}

/// 构造后固定的几何参数. 旋转中心已按模式调整.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Geometry {
    /// 探测器宽度.
    pub n: usize,
    /// 原始图像宽度.
    pub ni: usize,
    /// 总切片数.
    pub nz: usize,
    /// 每块切片数.
    pub ncz: usize,
    /// 总角度数.
    pub nproj: usize,
    /// 每块角度数.
    pub ncproj: usize,
    /// 原始旋转中心.
    pub centeri: f64,
    /// 调整后的旋转中心.
    pub center: f64,
}

impl Geometry {
    fn from_conf(conf: &TomoConf) -> Self {
        Self {
            n: conf.n,
            ni: conf.ni,
            nz: conf.nz,
            ncz: conf.ncz,
            nproj: conf.nproj,
            ncproj: conf.ncproj,
            centeri: conf.centeri,
            center: conf.center,
        }
    }
}

/// 重建器布局: 重建器变体及其尺寸.
#[derive(Clone, Debug, PartialEq)]
pub enum ReconLayout {
    /// 傅里叶重建.
    Fourier {
        /// 投影角.
        theta: Vec<f64>,
        /// 探测器宽度.
        n: usize,
        /// 角度数.
        nproj: usize,
        /// 每块切片数.
        ncz: usize,
    },

    /// 对数极坐标重建. 尺寸同傅里叶重建.
    LogPolar {
        /// 投影角.
        theta: Vec<f64>,
        /// 探测器宽度.
        n: usize,
        /// 角度数.
        nproj: usize,
        /// 每块切片数.
        ncz: usize,
    },

    /// 线积分重建. 输入 (投影) 与输出 (重建) 的角度数/行数可以不同.
    LineIntegral {
        /// 投影角.
        theta: Vec<f64>,
        /// 输入角度数.
        nproj_src: usize,
        /// 输出角度数.
        nproj_dst: usize,
        /// 输入行数.
        nz_src: usize,
        /// 输出行数.
        nz_dst: usize,
        /// 探测器宽度.
        n: usize,
    },
}

/// 模式选择结果: 已构造的滤波器与重建器, 以及调整后的几何参数.
#[derive(Debug)]
pub struct ModeSelection<F, R> {
    /// 模式.
    pub mode: Mode,
    /// 几何参数.
    pub geometry: Geometry,
    /// 频域滤波器.
    pub filter: F,
    /// 重建器.
    pub rec: R,
}

/// 根据配置选择模式并构造 (滤波器, 重建器) 对.
///
/// # 返回值
///
/// - 未知算法名, 或层析模式下请求非线积分算法时, 返回 [`ConfigError`];
/// - 元素类型 `T` 与 `conf.precision` 不符时, 返回 [`ConfigError::PrecisionMismatch`];
/// - 选择对数极坐标算法时, `center` 与 `centeri` 各增加 0.5.
pub fn select_mode<T, F, R>(conf: &TomoConf) -> ProcResult<ModeSelection<F, R>>
where
    T: TomoFloat,
    F: SpectralFilter<T>,
    R: Reconstructor,
{
    if !T::accepts(conf.precision) {
        return Err(ConfigError::PrecisionMismatch(conf.precision, T::STORAGE).into());
    }
    conf.check_geometry()?;

    let mut geometry = Geometry::from_conf(conf);
    let theta = conf.theta.clone();
    let sizing = |nproj, nz| filter_sizing(conf.n, nproj, nz, conf.precision);

    let (mode, filter, rec) = if !conf.is_lamino() {
        let algorithm = conf.algorithm()?;
        let filter = F::sized(sizing(conf.nproj, conf.ncz))?;
        let layout = match algorithm {
            ReconAlgorithm::Fourier => ReconLayout::Fourier {
                theta,
                n: conf.n,
                nproj: conf.nproj,
                ncz: conf.ncz,
            },
            ReconAlgorithm::LogPolar => {
                geometry.centeri += LOG_POLAR_CENTER_SHIFT;
                geometry.center += LOG_POLAR_CENTER_SHIFT;
                ReconLayout::LogPolar {
                    theta,
                    n: conf.n,
                    nproj: conf.nproj,
                    ncz: conf.ncz,
                }
            }
            ReconAlgorithm::LineIntegral => ReconLayout::LineIntegral {
                theta,
                nproj_src: conf.nproj,
                nproj_dst: conf.nproj,
                nz_src: conf.ncz,
                nz_dst: conf.ncz,
                n: conf.n,
            },
        };
        let mode = Mode {
            lamino: false,
            algorithm,
        };
        (mode, filter, R::build(layout)?)
    } else {
        // 层析模式: 先按投影分块, 轴与平面模式互换.
        let algorithm = match conf.algorithm() {
            Ok(ReconAlgorithm::LineIntegral) => ReconAlgorithm::LineIntegral,
            _ => {
                return Err(
                    ConfigError::InvalidLaminoAlgorithm(conf.reconstruction_algorithm.clone())
                        .into(),
                )
            }
        };
        let filter = F::sized(sizing(conf.ncproj, conf.nz))?;
        let layout = ReconLayout::LineIntegral {
            theta,
            nproj_src: conf.nproj,
            nproj_dst: conf.ncproj,
            nz_src: conf.nz,
            nz_dst: conf.ncz,
            n: conf.n,
        };
        let mode = Mode {
            lamino: true,
            algorithm,
        };
        (mode, filter, R::build(layout)?)
    };

    log::debug!(
        "mode selected: {mode:?}, center = {}, centeri = {}",
        geometry.center,
        geometry.centeri
    );
    Ok(ModeSelection {
        mode,
        geometry,
        filter,
        rec,
    })
}

#[inline]
fn filter_sizing(n: usize, nproj: usize, nz: usize, precision: Precision) -> FilterSizing {
    FilterSizing {
        n,
        nproj,
        nz,
        ne: padded_len(n, precision),
    }
}
