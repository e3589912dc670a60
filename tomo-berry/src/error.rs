//! 运行时错误.

use crate::float::Precision;
use std::fmt::{self, Display, Formatter};

/// 外部算法 (去条纹, 相位恢复等) 抛出的错误. 原样向上传递.
pub type ExternalError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 构造阶段的配置错误. 不可恢复.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// 未知重建算法名.
    UnknownAlgorithm(String),

    /// 未知斜坡滤波族名.
    UnknownFilter(String),

    /// 未知去条纹方法名.
    UnknownStripeMethod(String),

    /// 未知相位恢复方法名.
    UnknownPhaseMethod(String),

    /// 未知扫描类型名.
    UnknownFileType(String),

    /// 层析 (laminography) 模式下只支持线积分重建, 参数为请求的算法名.
    InvalidLaminoAlgorithm(String),

    /// 元素类型与配置精度不符. 第一个参数是配置精度, 第二个参数是元素类型的存储精度.
    PrecisionMismatch(Precision, Precision),

    /// 配置了某外部算法, 但未注入对应实现.
    MissingCollaborator(&'static str),

    /// 几何参数非法.
    InvalidGeometry(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAlgorithm(s) => write!(f, "未知重建算法 `{s}`"),
            Self::UnknownFilter(s) => write!(f, "未知滤波器 `{s}`"),
            Self::UnknownStripeMethod(s) => write!(f, "未知去条纹方法 `{s}`"),
            Self::UnknownPhaseMethod(s) => write!(f, "未知相位恢复方法 `{s}`"),
            Self::UnknownFileType(s) => write!(f, "未知扫描类型 `{s}`"),
            Self::InvalidLaminoAlgorithm(s) => {
                write!(f, "层析模式仅支持线积分重建, 而请求的是 `{s}`")
            }
            Self::PrecisionMismatch(want, got) => {
                write!(f, "配置精度 {want:?} 与元素类型 {got:?} 不符")
            }
            Self::MissingCollaborator(name) => write!(f, "已配置 `{name}`, 但未提供实现"),
            Self::InvalidGeometry(s) => write!(f, "几何参数非法: {s}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// 分块处理错误.
#[derive(Debug)]
pub enum ProcError {
    /// 配置错误, 见 [`ConfigError`].
    Config(ConfigError),

    /// 调用方提供的数组形状与几何配置不一致. 该错误总在任何就地修改之前返回.
    ShapeMismatch {
        /// 出错的数组.
        what: &'static str,
        /// 期望形状.
        expected: Vec<usize>,
        /// 实际形状.
        found: Vec<usize>,
    },

    /// 外部算法失败. 不重试.
    External {
        /// 外部算法名.
        algorithm: &'static str,
        /// 原始错误.
        source: ExternalError,
    },
}

impl ProcError {
    /// 形状不符.
    pub(crate) fn shape(what: &'static str, expected: &[usize], found: &[usize]) -> Self {
        Self::ShapeMismatch {
            what,
            expected: expected.to_vec(),
            found: found.to_vec(),
        }
    }
}

impl Display for ProcError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "配置错误: {e}"),
            Self::ShapeMismatch {
                what,
                expected,
                found,
            } => write!(f, "`{what}` 形状不符: 期望 {expected:?}, 实际 {found:?}"),
            Self::External { algorithm, source } => write!(f, "外部算法 `{algorithm}` 失败: {source}"),
        }
    }
}

impl std::error::Error for ProcError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::ShapeMismatch { .. } => None,
            Self::External { source, .. } => Some(source.as_ref()),
        }
    }
}

impl From<ConfigError> for ProcError {
    #[inline]
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

/// 检查 `found` 与 `expected` 是否一致.
#[inline]
pub(crate) fn check_shape(what: &'static str, expected: &[usize], found: &[usize]) -> ProcResult<()> {
    if expected == found {
        Ok(())
    } else {
        Err(ProcError::shape(what, expected, found))
    }
}

/// 分块处理结果.
pub type ProcResult<T> = Result<T, ProcError>;
