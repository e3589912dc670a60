//! 通用常量.

/// 暗场/平场校正分母的保护项, 防止除法爆炸.
pub const DARK_FLAT_EPSILON: f64 = 1e-3;

/// 暗场/平场校正后, 非正值统一替换为该值.
pub const NON_POSITIVE_FALLBACK: f64 = 1.0;

/// 负对数变换后 NaN 的替换值 (代表饱和吸收).
pub const NAN_SENTINEL: f64 = 6.0;

/// 负对数变换后 Inf 的替换值.
pub const INF_SENTINEL: f64 = 0.0;

/// 对数极坐标重建时, 旋转中心的固定偏移 (与傅里叶重建保持一致).
pub const LOG_POLAR_CENTER_SHIFT: f64 = 0.5;

/// 去坏点阈值: 偏离局部中值超过中值绝对值的该倍数时替换.
pub const OUTLIER_RATIO: f64 = 0.5;

/// 滤波填充长度与探测器宽度之比为 `PAD_NUM / PAD_DEN`.
pub const PAD_NUM: usize = 3;

/// 见 [`PAD_NUM`].
pub const PAD_DEN: usize = 2;

/// 360° 扫描融合窗口的五次多项式系数, 由低次到高次
/// (作用于 `x^5 * (c0 + c1 x + c2 x^2 + c3 x^3 + c4 x^4)`).
pub const SMOOTHSTEP5: [f64; 5] = [126.0, -420.0, 540.0, -315.0, 70.0];

/// Paganin 相位恢复: 像素尺寸由微米转换为厘米的倍率.
pub const MICRON_TO_CM: f64 = 1e-4;

/// Paganin 相位恢复: 传播距离由毫米转换为厘米的倍率.
pub const MM_TO_CM: f64 = 0.1;
