//! 去坏点 (dezinger).

use crate::consts::OUTLIER_RATIO;
use crate::float::TomoFloat;
use ndarray::{Array2, ArrayView2, ArrayViewMut2, ArrayViewMut3, Axis, Zip};

/// 以半采样对称方式 (`d c b a | a b c d | d c b a`) 把越界索引折回 `[0, len)`.
#[inline]
fn reflect_index(idx: isize, len: usize) -> usize {
    let n = len as isize;
    let period = 2 * n;
    let m = idx.rem_euclid(period);
    (if m < n { m } else { period - 1 - m }) as usize
}

/// `r × r` 局部中值滤波. 窗口偏移为 `-(r / 2) ..= r - 1 - r / 2`,
/// 取排序后第 `r * r / 2` 个元素 (偶数窗口取上中位数). NaN 排在最后.
///
/// `r == 0` 时原样返回.
pub fn median_filter_2d<T: TomoFloat>(frame: ArrayView2<T>, r: usize) -> Array2<T> {
    if r == 0 {
        return frame.to_owned();
    }
    let (h, w) = frame.dim();
    let lo = (r / 2) as isize;
    let rank = r * r / 2;

    // 行/列的折回索引只与偏移有关, 预先算好.
    let rows: Vec<Vec<usize>> = (0..h)
        .map(|i| {
            (0..r)
                .map(|d| reflect_index(i as isize + d as isize - lo, h))
                .collect()
        })
        .collect();
    let cols: Vec<Vec<usize>> = (0..w)
        .map(|j| {
            (0..r)
                .map(|d| reflect_index(j as isize + d as isize - lo, w))
                .collect()
        })
        .collect();

    let mut window = Vec::with_capacity(r * r);
    Array2::from_shape_fn((h, w), |(i, j)| {
        window.clear();
        for &ii in rows[i].iter() {
            window.extend(cols[j].iter().map(|&jj| frame[(ii, jj)]));
        }
        *window.select_nth_unstable_by(rank, |a, b| a.cmp_total(b)).1
    })
}

/// 对单帧去坏点: 偏离局部中值超过 `0.5 * |中值|` 的像素替换为中值.
fn dezinger_frame<T: TomoFloat>(mut frame: ArrayViewMut2<T>, r: usize) -> usize {
    let median = median_filter_2d(frame.view(), r);
    let ratio = T::of_f64(OUTLIER_RATIO);
    let mut cnt = 0usize;
    Zip::from(&mut frame).and(&median).for_each(|x, &m| {
        if (m - *x).abs() > ratio * m.abs() {
            *x = m;
            cnt += 1;
        }
    });
    cnt
}

/// 去坏点. 对第一轴的每一帧独立做 `1 × r × r` 中值滤波, 不跨帧平滑.
///
/// `radius == 0` 时为恒等变换. 返回被替换的像素个数.
pub fn remove_outliers<T: TomoFloat>(mut data: ArrayViewMut3<T>, radius: usize) -> usize {
    if radius == 0 {
        return 0;
    }

    let frames = data.axis_iter_mut(Axis(0));

    #[cfg(feature = "rayon")]
    let cnt: usize = {
        use ndarray::parallel::prelude::*;

        frames
            .into_par_iter()
            .map(|frame| dezinger_frame(frame, radius))
            .sum()
    };

    #[cfg(not(feature = "rayon"))]
    let cnt: usize = frames.map(|frame| dezinger_frame(frame, radius)).sum();

    log::trace!("dezinger (r = {radius}) replaced {cnt} samples");
    cnt
}
