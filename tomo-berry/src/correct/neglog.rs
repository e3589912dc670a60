//! 负对数变换.

use crate::consts::{INF_SENTINEL, NAN_SENTINEL};
use crate::float::TomoFloat;
use ndarray::{ArrayViewMut, Dimension};

/// 单个采样的 `-ln(x)`, 带哨兵值替换.
///
/// - `x == 0` 或 `NaN` 得到 `6`;
/// - 结果为无穷 (含 `x = +inf` 以及负无穷的对数) 得到 `0`.
#[inline]
pub fn minus_log_value<T: TomoFloat>(x: T) -> T {
    if x.is_nan() || x == T::zero() {
        return T::of_f64(NAN_SENTINEL);
    }
    let y = -x.ln();
    if y.is_nan() {
        T::of_f64(NAN_SENTINEL)
    } else if y.is_infinite() {
        T::of_f64(INF_SENTINEL)
    } else {
        y
    }
}

/// 就地做负对数变换 `x <- -ln(x)`. 适用于任意维数的数据.
pub fn minus_log<T: TomoFloat, D: Dimension>(mut data: ArrayViewMut<T, D>) {
    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            data.par_map_inplace(|x| *x = minus_log_value(*x));
        } else {
            data.map_inplace(|x| *x = minus_log_value(*x));
        }
    }
    log::trace!("minus log applied on {:?}", data.shape());
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};

    #[test]
    fn test_sentinels() {
        assert_eq!(minus_log_value(1.0f32), 0.0);
        assert_eq!(minus_log_value(0.0f32), 6.0);
        assert_eq!(minus_log_value(f64::NAN), 6.0);
        assert_eq!(minus_log_value(f64::INFINITY), 0.0);
        // 负数的对数为 NaN.
        assert_eq!(minus_log_value(-2.0f64), 6.0);
    }

    #[test]
    fn test_strictly_decreasing() {
        let xs = [1e-6f64, 1e-3, 0.1, 0.5, 1.0, 2.0, 10.0, 1e3];
        let ys: Vec<f64> = xs.iter().map(|&x| minus_log_value(x)).collect();
        assert!(ys.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_in_place_any_dimension() {
        let mut a = Array3::from_elem((2, 3, 4), 1.0f32);
        a[(1, 2, 3)] = std::f32::consts::E;
        minus_log(a.view_mut());
        assert_eq!(a[(0, 0, 0)], 0.0);
        assert!((a[(1, 2, 3)] + 1.0).abs() < 1e-6);

        let mut b = array![[0.0f64, 1.0], [f64::NAN, 0.5]];
        minus_log(b.view_mut());
        assert_eq!(b[(0, 0)], 6.0);
        assert_eq!(b[(0, 1)], 0.0);
        assert_eq!(b[(1, 0)], 6.0);
        assert!((b[(1, 1)] - std::f64::consts::LN_2).abs() < 1e-12);
    }
}
