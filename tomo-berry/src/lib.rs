#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 层析成像分块预处理核心. 在流式重建流水线中, 对每个投影/正弦图分块做重建前的校正与滤波.
//!
//! 该 crate 只负责 "准备数据": 反投影, 去条纹, 相位恢复等算法由外层调度器注入,
//! 本 crate 只规定它们的调用签名.
//!
//! # 注意
//!
//! 1. 分块数据以 `ndarray` 三维数组传入, 元素类型为 `f32` 或 `f64`, 见 [`TomoFloat`].
//!   CPU 上没有半精度, 低精度模式下仍以 `f32` 存储, 只沿用其尺寸规则.
//! 2. 所有操作都尽量就地进行. 需要新缓冲的操作同时提供 `_into` 版本, 由调用方给出输出.
//! 3. 形状错误总在第一次写入之前返回, 不会留下写了一半的缓冲.
//!
//! # 开发计划
//!
//! ### 模式选择 ✅
//!
//! (层析开关 × 重建算法) 决定滤波器尺寸与重建器布局. 对数极坐标重建时旋转中心 +0.5.
//!
//! 实现位于 `tomo-berry/src/mode.rs`.
//!
//! ### 暗场/平场校正, 去坏点, 负对数 ✅
//!
//! 实现位于 `tomo-berry/src/correct`.
//!
//! ### 去条纹/相位恢复接入 ✅
//!
//! 实现位于 `tomo-berry/src/external.rs`.
//!
//! ### 斜坡滤波 + 亚像素旋转中心校正 ✅
//!
//! Parzen 与 Shepp-Logan 两种滤波族. 频域乘法由 [`SpectralFilter`] 后端完成,
//! 自带一个基于 `rustfft` 的 CPU 后端 [`RustFftFilter`].
//!
//! 实现位于 `tomo-berry/src/ramp.rs`, `tomo-berry/src/backend.rs`.
//!
//! ### 双倍视场 360° 填充 ✅
//!
//! 实现位于 `tomo-berry/src/pad360.rs`.
//!
//! ### 环状伪影去除 ⌛️
//!
//! 在斜坡滤波前沿角度方向求平均并减去其差分的高通分量. 尚未决定是否需要.
//!
//! ### 完善代码文档 ✅
//!
//! 给每个 public API 提供文档, 并视情况给 private
//! API 提供文档.

mod float;

pub use float::{Precision, TomoFloat};

pub mod consts;

mod error;

pub use error::{ConfigError, ExternalError, ProcError, ProcResult};

pub mod conf;

mod stream;

pub use stream::ExecStream;

pub mod backend;

pub use backend::{FilterSizing, Reconstructor, RustFftFilter, SpectralFilter};

pub mod mode;

pub mod correct;

pub mod external;

pub mod ramp;

pub mod pad360;

mod pipeline;

pub use pipeline::TomoFunctions;

pub mod prelude;
