//! 构造配置.
//!
//! 配置文件的加载由外层调度器负责. 该模块只定义字段并把字符串键解析成强类型枚举.
//! 所有解析错误都在构造阶段以 [`ConfigError`] 返回.

use crate::error::ConfigError;
use crate::float::Precision;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 重建算法.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ReconAlgorithm {
    /// 基于傅里叶变换的重建.
    Fourier,

    /// 对数极坐标重建.
    LogPolar,

    /// 线积分 (直接反投影) 重建.
    LineIntegral,
}

impl FromStr for ReconAlgorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fourierrec" | "fourier" => Ok(Self::Fourier),
            "lprec" | "log-polar" => Ok(Self::LogPolar),
            "linerec" | "line-integral" => Ok(Self::LineIntegral),
            _ => Err(ConfigError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// 斜坡滤波族.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FbpFilter {
    /// `w = t * (1 - 2t)^3`.
    Parzen,

    /// `w = t * sinc(t)`.
    Shepp,
}

impl FromStr for FbpFilter {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "parzen" => Ok(Self::Parzen),
            "shepp" => Ok(Self::Shepp),
            _ => Err(ConfigError::UnknownFilter(s.to_string())),
        }
    }
}

/// 去条纹方法.
#[derive(Clone, Debug, PartialEq)]
pub enum StripeMethod {
    /// 不去条纹.
    Disabled,

    /// 傅里叶-小波去条纹.
    FourierWavelet {
        /// 高斯阻尼宽度.
        sigma: f64,
        /// 小波滤波器名.
        filter: String,
        /// 分解层数. `None` 由外部算法自行决定.
        level: Option<u32>,
    },
}

/// 相位恢复方法.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PhaseMethod {
    /// 不做相位恢复.
    Disabled,

    /// Paganin 滤波. 所有长度单位已换算为厘米.
    Paganin {
        /// 像素尺寸 (cm).
        pixel_size_cm: f64,
        /// 传播距离 (cm).
        propagation_distance_cm: f64,
        /// 能量 (keV).
        energy: f64,
        /// 正则化强度.
        alpha: f64,
    },
}

/// 扫描类型.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ScanType {
    /// 普通扫描.
    Standard,

    /// 双倍视场 (偏心 360° 扫描), 需要 360° 填充.
    DoubleFov,
}

impl FromStr for ScanType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Self::Standard),
            "double_fov" => Ok(Self::DoubleFov),
            _ => Err(ConfigError::UnknownFileType(s.to_string())),
        }
    }
}

/// 预处理核心的全部构造参数.
///
/// 长度类参数使用采集时的习惯单位: `pixel_size` 为微米, `propagation_distance` 为毫米,
/// `energy` 为 keV. 换算在 [`TomoConf::phase_method`] 中完成.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TomoConf {
    /// 数值精度.
    pub precision: Precision,

    /// 探测器宽度 (双倍视场时为填充后的宽度).
    pub n: usize,

    /// 原始图像宽度.
    pub ni: usize,

    /// 总切片 (行) 数.
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

    /// 投影角 (弧度).
    pub theta: Vec<f64>,

    /// 层析倾角 (度). 为 0 时关闭层析模式.
    pub lamino_angle: f64,

    /// 重建算法名, 见 [`ReconAlgorithm`].
    pub reconstruction_algorithm: String,

    /// 斜坡滤波族名, 见 [`FbpFilter`].
    pub fbp_filter: String,

    /// 去坏点半径. 0 表示关闭.
    pub dezinger: usize,

    /// 去条纹方法名: `none` 或 `fw`.
    pub remove_stripe_method: String,

    /// 傅里叶-小波去条纹的 sigma.
    pub fw_sigma: f64,

    /// 傅里叶-小波去条纹的小波名.
    pub fw_filter: String,

    /// 傅里叶-小波去条纹的层数.
    pub fw_level: Option<u32>,

    /// 相位恢复方法名: `none` 或 `paganin`.
    pub retrieve_phase_method: String,

    /// 像素尺寸 (微米).
    pub pixel_size: f64,

    /// 传播距离 (毫米).
    pub propagation_distance: f64,

    /// 能量 (keV).
    pub energy: f64,

    /// Paganin 正则化强度.
    pub retrieve_phase_alpha: f64,

    /// 扫描类型名: `standard` 或 `double_fov`.
    pub file_type: String,
}

impl Default for TomoConf {
    fn default() -> Self {
        Self {
            precision: Precision::Float32,
            n: 0,
            ni: 0,
            nz: 0,
            ncz: 0,
            nproj: 0,
            ncproj: 0,
            centeri: 0.0,
            center: 0.0,
            theta: vec![],
            lamino_angle: 0.0,
            reconstruction_algorithm: "fourierrec".to_string(),
            fbp_filter: "parzen".to_string(),
            dezinger: 0,
            remove_stripe_method: "none".to_string(),
            fw_sigma: 1.0,
            fw_filter: "sym16".to_string(),
            fw_level: None,
            retrieve_phase_method: "none".to_string(),
            pixel_size: 0.0,
            propagation_distance: 0.0,
            energy: 0.0,
            retrieve_phase_alpha: 0.0,
            file_type: "standard".to_string(),
        }
    }
}

impl TomoConf {
    /// 是否为层析模式.
    #[inline]
    pub fn is_lamino(&self) -> bool {
        self.lamino_angle != 0.0
    }

    /// 解析重建算法.
    #[inline]
    pub fn algorithm(&self) -> Result<ReconAlgorithm, ConfigError> {
        self.reconstruction_algorithm.parse()
    }

    /// 解析斜坡滤波族.
    #[inline]
    pub fn filter_family(&self) -> Result<FbpFilter, ConfigError> {
        self.fbp_filter.parse()
    }

    /// 解析扫描类型.
    #[inline]
    pub fn scan_type(&self) -> Result<ScanType, ConfigError> {
        self.file_type.parse()
    }

    /// 解析去条纹方法.
    pub fn stripe_method(&self) -> Result<StripeMethod, ConfigError> {
        match self.remove_stripe_method.as_str() {
            "none" => Ok(StripeMethod::Disabled),
            "fw" => Ok(StripeMethod::FourierWavelet {
                sigma: self.fw_sigma,
                filter: self.fw_filter.clone(),
                level: self.fw_level,
            }),
            s => Err(ConfigError::UnknownStripeMethod(s.to_string())),
        }
    }

    /// 解析相位恢复方法, 同时把长度单位换算为厘米.
    pub fn phase_method(&self) -> Result<PhaseMethod, ConfigError> {
        use crate::consts::{MICRON_TO_CM, MM_TO_CM};

        match self.retrieve_phase_method.as_str() {
            "none" => Ok(PhaseMethod::Disabled),
            "paganin" => Ok(PhaseMethod::Paganin {
                pixel_size_cm: self.pixel_size * MICRON_TO_CM,
                propagation_distance_cm: self.propagation_distance * MM_TO_CM,
                energy: self.energy,
                alpha: self.retrieve_phase_alpha,
            }),
            s => Err(ConfigError::UnknownPhaseMethod(s.to_string())),
        }
    }

    /// 检查几何参数的基本合法性.
    pub fn check_geometry(&self) -> Result<(), ConfigError> {
        if self.n == 0 || self.ni == 0 {
            return Err(ConfigError::InvalidGeometry("探测器宽度不能为 0"));
        }
        if self.nproj == 0 || self.ncproj == 0 || self.ncproj > self.nproj {
            return Err(ConfigError::InvalidGeometry("角度数必须满足 0 < ncproj <= nproj"));
        }
        if self.nz == 0 || self.ncz == 0 || self.ncz > self.nz {
            return Err(ConfigError::InvalidGeometry("切片数必须满足 0 < ncz <= nz"));
        }
        if self.theta.len() != self.nproj {
            return Err(ConfigError::InvalidGeometry("投影角个数必须等于 nproj"));
        }
        if !self.center.is_finite() || !self.centeri.is_finite() {
            return Err(ConfigError::InvalidGeometry("旋转中心必须是有限值"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("lprec".parse::<ReconAlgorithm>(), Ok(ReconAlgorithm::LogPolar));
        assert_eq!("line-integral".parse::<ReconAlgorithm>(), Ok(ReconAlgorithm::LineIntegral));
        assert_eq!(
            "gridrec".parse::<ReconAlgorithm>(),
            Err(ConfigError::UnknownAlgorithm("gridrec".to_string()))
        );
        assert_eq!("shepp".parse::<FbpFilter>(), Ok(FbpFilter::Shepp));
        assert!("hann".parse::<FbpFilter>().is_err());
        assert_eq!("double_fov".parse::<ScanType>(), Ok(ScanType::DoubleFov));
    }

    #[test]
    fn test_phase_units() {
        let conf = TomoConf {
            retrieve_phase_method: "paganin".to_string(),
            pixel_size: 0.65,
            propagation_distance: 50.0,
            energy: 20.0,
            retrieve_phase_alpha: 1e-3,
            ..Default::default()
        };
        let PhaseMethod::Paganin {
            pixel_size_cm,
            propagation_distance_cm,
            energy,
            alpha,
        } = conf.phase_method().unwrap()
        else {
            panic!("应为 Paganin");
        };
        assert!((pixel_size_cm - 0.65e-4).abs() < 1e-12);
        assert!((propagation_distance_cm - 5.0).abs() < 1e-12);
        assert_eq!(energy, 20.0);
        assert_eq!(alpha, 1e-3);
    }

    #[test]
    fn test_stripe_method() {
        let mut conf = TomoConf::default();
        assert_eq!(conf.stripe_method(), Ok(StripeMethod::Disabled));
        conf.remove_stripe_method = "fw".to_string();
        conf.fw_level = Some(7);
        assert!(matches!(
            conf.stripe_method(),
            Ok(StripeMethod::FourierWavelet { level: Some(7), .. })
        ));
        conf.remove_stripe_method = "ti".to_string();
        assert!(conf.stripe_method().is_err());
    }
}
