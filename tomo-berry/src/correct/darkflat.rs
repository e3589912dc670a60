//! 暗场/平场校正.

use crate::consts::{DARK_FLAT_EPSILON, NON_POSITIVE_FALLBACK};
use crate::error::{check_shape, ProcError, ProcResult};
use crate::float::TomoFloat;
use ndarray::{Array2, ArrayView3, ArrayViewMut3, Axis, Zip};
use num::traits::AsPrimitive;

/// 沿第一轴求平均, 得到单帧参考图.
///
/// 空栈返回 `ShapeMismatch`.
pub fn mean_frame<U, T>(what: &'static str, stack: ArrayView3<U>) -> ProcResult<Array2<T>>
where
    U: AsPrimitive<T>,
    T: TomoFloat,
{
    let (len, h, w) = stack.dim();
    if len == 0 {
        return Err(ProcError::shape(what, &[1, h, w], &[0, h, w]));
    }
    let mut acc = Array2::<T>::zeros((h, w));
    for frame in stack.axis_iter(Axis(0)) {
        Zip::from(&mut acc)
            .and(&frame)
            .for_each(|a, &v| *a = *a + v.as_());
    }
    let len = T::of_f64(len as f64);
    acc.mapv_inplace(|a| a / len);
    Ok(acc)
}

/// 暗场/平场校正: `res = (data - dark0) / (flat0 - dark0 + 1e-3)`, 其中非正值替换为 1.
///
/// `dark0`, `flat0` 分别是 `dark`, `flat` 沿第一轴的平均帧. 该函数不修改 `data`,
/// 只写入 `res`.
///
/// # 返回值
///
/// 以下情况返回 `ShapeMismatch`, 且 `res` 保持不变:
///
/// - `dark` 或 `flat` 为空栈, 或其后两轴与 `data` 不一致;
/// - `res` 与 `data` 形状不一致.
pub fn darkflat_correction<U, T>(
    data: ArrayView3<U>,
    dark: ArrayView3<U>,
    flat: ArrayView3<U>,
    mut res: ArrayViewMut3<T>,
) -> ProcResult<()>
where
    U: AsPrimitive<T> + Sync,
    T: TomoFloat,
{
    let frame = &data.shape()[1..];
    check_shape("dark", frame, &dark.shape()[1..])?;
    check_shape("flat", frame, &flat.shape()[1..])?;
    check_shape("result", data.shape(), res.shape())?;

    let dark0 = mean_frame::<U, T>("dark", dark)?;
    let mut denom = mean_frame::<U, T>("flat", flat)?;
    let eps = T::of_f64(DARK_FLAT_EPSILON);
    Zip::from(&mut denom)
        .and(&dark0)
        .for_each(|f, &d| *f = *f - d + eps);

    let fallback = T::of_f64(NON_POSITIVE_FALLBACK);
    let zip = Zip::from(&mut res)
        .and(&data)
        .and_broadcast(&dark0)
        .and_broadcast(&denom);
    let op = |r: &mut T, &v: &U, &d: &T, &q: &T| {
        let x = (v.as_() - d) / q;
        *r = if x <= T::zero() { fallback } else { x };
    };

    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            zip.par_for_each(op);
        } else {
            zip.for_each(op);
        }
    }
    Ok(())
}
