//! 双倍视场 (偏心 360° 扫描) 的填充.
//!
//! 必要时先沿列方向镜像, 再用五次平滑阶跃窗口衰减最后 `w` 列,
//! 最后以 0 把列数扩展为两倍, 为重建器拼接另一半留出空间.

use crate::consts::SMOOTHSTEP5;
use crate::error::{check_shape, ProcError, ProcResult};
use crate::float::TomoFloat;
use ndarray::{s, Array3, ArrayView3, ArrayViewMut3, Axis};

/// 融合宽度 `max(1, trunc(2 * (ni - center)))`.
#[inline]
pub fn blend_width(ni: usize, center: f64) -> usize {
    let w = (2.0 * (ni as f64 - center)) as i64;
    w.max(1) as usize
}

/// 是否需要镜像: 旋转中心位于图像左半部分.
#[inline]
pub fn needs_mirror(ni: usize, centeri: f64) -> bool {
    centeri < (ni / 2) as f64
}

/// 五次平滑阶跃 `x^5 (126 - 420x + 540x^2 - 315x^3 + 70x^4)`. 在 0, 1 处一阶, 二阶导数为 0.
#[inline]
pub fn smoothstep5(x: f64) -> f64 {
    let poly = SMOOTHSTEP5.iter().rev().fold(0.0, |acc, &c| acc * x + c);
    x.powi(5) * poly
}

/// 长度为 `w` 的融合窗口, 在 `(1, 0]` 上等距递减采样: `x_k = 1 - (k + 1) / w`.
///
/// 末尾采样恰为 0. 因此融合宽度被钳到 `w = 1` (`center >= ni - 0.5`) 时窗口为 `[0]`,
/// 最后一列也被清零, 而不是原样保留.
pub fn blend_window(w: usize) -> Vec<f64> {
    let wf = w as f64;
    (0..w)
        .map(|k| smoothstep5(1.0 - (k + 1) as f64 / wf))
        .collect()
}

/// 360° 填充, 结果写入 `out`. `data` 不被修改.
///
/// `data` 形状为 `[a, b, m]`, `out` 必须为 `[a, b, 2m]`.
///
/// # 返回值
///
/// `out` 形状不符, 或融合宽度超过 `m` 时返回 `ShapeMismatch`, 且 `out` 不变.
pub fn pad360_into<T: TomoFloat>(
    data: ArrayView3<T>,
    mut out: ArrayViewMut3<T>,
    ni: usize,
    centeri: f64,
    center: f64,
) -> ProcResult<()> {
    let (a, b, m) = data.dim();
    check_shape("pad360 output", &[a, b, 2 * m], out.shape())?;
    let w = blend_width(ni, center);
    if w > m {
        return Err(ProcError::shape("pad360 blend region", &[m], &[w]));
    }

    let mut src = data;
    let mirror = needs_mirror(ni, centeri);
    if mirror {
        src.invert_axis(Axis(2));
    }

    let (mut head, mut tail) = out.view_mut().split_at(Axis(2), m);
    head.assign(&src);
    tail.fill(T::zero());

    let window = blend_window(w);
    for (mut col, &v) in head
        .slice_mut(s![.., .., m - w..])
        .axis_iter_mut(Axis(2))
        .zip(window.iter())
    {
        let v = T::of_f64(v);
        col.mapv_inplace(|x| x * v);
    }

    log::trace!("pad360: mirror = {mirror}, blend width = {w}, width {m} -> {}", 2 * m);
    Ok(())
}

/// 360° 填充, 分配新的输出.
pub fn pad360<T: TomoFloat>(
    data: ArrayView3<T>,
    ni: usize,
    centeri: f64,
    center: f64,
) -> ProcResult<Array3<T>> {
    let (a, b, m) = data.dim();
    let mut out = Array3::zeros((a, b, 2 * m));
    pad360_into(data, out.view_mut(), ni, centeri, center)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothstep_endpoints() {
        assert_eq!(smoothstep5(0.0), 0.0);
        assert!((smoothstep5(1.0) - 1.0).abs() < 1e-12);
        assert!((smoothstep5(0.5) - 0.5).abs() < 1e-12);
        assert_eq!(blend_width(512, 256.0), 512);
        assert_eq!(blend_width(512, 511.8), 1);
        assert_eq!(blend_width(512, 600.0), 1);
        assert_eq!(blend_window(1), vec![0.0]);
    }

    /// `w == ni` 时整段被单调衰减, 最后一列恰为 0.
    #[test]
    fn test_full_blend_monotone() {
        let ni = 8;
        let data = Array3::from_elem((2, 3, ni), 1.0f64);
        let out = pad360(data.view(), ni, ni as f64 / 2.0, ni as f64 / 2.0).unwrap();
        assert_eq!(out.dim(), (2, 3, 2 * ni));

        let row: Vec<f64> = out.slice(s![1, 2, ..ni]).to_vec();
        assert!(row.windows(2).all(|p| p[0] > p[1]));
        assert!(row[0] < 1.0);
        assert_eq!(row[ni - 1], 0.0);
        assert!(out.slice(s![.., .., ni..]).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_mirror_condition() {
        let ni = 6;
        // w = 1: 只有最后一列被清零.
        let center = ni as f64 - 0.5;
        let ramp = Array3::from_shape_fn((1, 2, ni), |(_, _, c)| c as f32 + 1.0);

        let kept = pad360(ramp.view(), ni, (ni / 2) as f64, center).unwrap();
        assert_eq!(kept[(0, 0, 0)], 1.0);
        assert_eq!(kept[(0, 0, ni - 1)], 0.0);

        let mirrored = pad360(ramp.view(), ni, 0.0, center).unwrap();
        assert_eq!(mirrored[(0, 0, 0)], ni as f32);
        assert_eq!(mirrored[(0, 1, ni - 2)], 2.0);
        assert_eq!(mirrored[(0, 1, ni - 1)], 0.0);

        // 对称体模: 镜像与否结果相同.
        let phantom = Array3::from_shape_fn((1, 2, ni), |(_, r, c)| {
            (r + 1) as f32 * (c.min(ni - 1 - c) + 1) as f32
        });
        let a = pad360(phantom.view(), ni, (ni / 2) as f64, center).unwrap();
        let b = pad360(phantom.view(), ni, 0.0, center).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_shape_errors() {
        let data = Array3::from_elem((1, 1, 4), 1.0f32);
        let mut out = Array3::from_elem((1, 1, 7), -1.0f32);
        assert!(pad360_into(data.view(), out.view_mut(), 4, 2.0, 2.0).is_err());
        assert!(out.iter().all(|&v| v == -1.0));

        // ni 大于实际宽度时融合宽度越界.
        assert!(matches!(
            pad360(data.view(), 16, 8.0, 8.0),
            Err(ProcError::ShapeMismatch { .. })
        ));
    }
}
