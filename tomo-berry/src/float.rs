//! 数值精度.

use num::traits::{Float, FloatConst};
use ordered_float::OrderedFloat;
use rustfft::FftNum;
use std::cmp::Ordering;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 运行精度. 决定分块数据的元素类型以及部分尺寸规则.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Precision {
    /// 低精度模式.
    ///
    /// CPU 上没有半精度运算, 数据仍以 `f32` 存储,
    /// 但滤波填充长度等尺寸规则按低精度模式执行 (取 2 的幂).
    Float16,

    /// 单精度.
    #[default]
    Float32,

    /// 双精度.
    Float64,
}

impl Precision {
    /// 是否为低精度模式.
    #[inline]
    pub const fn is_reduced(&self) -> bool {
        matches!(self, Self::Float16)
    }

    /// 该模式在 CPU 上实际使用的存储精度.
    #[inline]
    pub const fn storage(&self) -> Precision {
        match self {
            Self::Float16 | Self::Float32 => Self::Float32,
            Self::Float64 => Self::Float64,
        }
    }
}

/// 分块数据的元素类型. 目前为 `f32` 与 `f64` 实现.
pub trait TomoFloat: Float + FloatConst + FftNum + Default {
    /// 该类型对应的存储精度.
    const STORAGE: Precision;

    /// 从 `f64` 有损转换.
    fn of_f64(v: f64) -> Self;

    /// 全序比较: NaN 彼此相等且大于任何数, `-0.0 == 0.0`.
    fn cmp_total(&self, other: &Self) -> Ordering;

    /// 该类型能否承载精度模式 `p`.
    #[inline]
    fn accepts(p: Precision) -> bool {
        p.storage() == Self::STORAGE
    }
}

macro_rules! impl_tomo_float {
    ($fp: ty, $storage: expr) => {
        impl TomoFloat for $fp {
            const STORAGE: Precision = $storage;

            #[inline]
            fn of_f64(v: f64) -> Self {
                v as $fp
            }

            #[inline]
            fn cmp_total(&self, other: &Self) -> Ordering {
                OrderedFloat(*self).cmp(&OrderedFloat(*other))
            }
        }
    };
}

impl_tomo_float!(f32, Precision::Float32);
impl_tomo_float!(f64, Precision::Float64);
