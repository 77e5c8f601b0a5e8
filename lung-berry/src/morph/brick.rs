//! 水平方向 (`k * 1`) 的二值腐蚀、膨胀、开运算与闭运算.
//!
//! 越出图像的像素不参与计算: 腐蚀时视为前景, 膨胀时视为背景.

use super::window_range;
use crate::consts::gray::*;
use ndarray::{Array2, ArrayView2, Axis};

/// 逐行按窗口内前景个数决定输出. `keep(count, window_len)` 为真时输出前景.
fn horizontal_by_count(
    slice: ArrayView2<u8>,
    k: usize,
    keep: impl Fn(usize, usize) -> bool,
) -> Array2<u8> {
    assert!(k >= 1, "结构元素不能为空");
    let (h, w) = slice.dim();
    let mut ans = Array2::from_elem((h, w), MASK_BACKGROUND);
    let mut prefix = vec![0usize; w + 1];

    for (row, mut out) in slice.axis_iter(Axis(0)).zip(ans.axis_iter_mut(Axis(0))) {
        for (i, &p) in row.iter().enumerate() {
            prefix[i + 1] = prefix[i] + usize::from(is_foreground(p));
        }
        for (i, o) in out.iter_mut().enumerate() {
            let r = window_range(i, w, k);
            if keep(prefix[r.end] - prefix[r.start], r.len()) {
                *o = MASK_FOREGROUND;
            }
        }
    }
    ans
}

/// 以 `k * 1` 水平结构元素腐蚀.
#[inline]
pub fn erode_horizontal(slice: ArrayView2<u8>, k: usize) -> Array2<u8> {
    horizontal_by_count(slice, k, |cnt, len| cnt == len)
}

/// 以 `k * 1` 水平结构元素膨胀.
#[inline]
pub fn dilate_horizontal(slice: ArrayView2<u8>, k: usize) -> Array2<u8> {
    horizontal_by_count(slice, k, |cnt, _| cnt > 0)
}

/// 水平开运算 (先腐蚀后膨胀). 去除宽度小于 `k` 的水平前景片段.
#[inline]
pub fn open_horizontal(slice: ArrayView2<u8>, k: usize) -> Array2<u8> {
    dilate_horizontal(erode_horizontal(slice, k).view(), k)
}

/// 水平闭运算 (先膨胀后腐蚀). 连接间隔小于 `k` 的水平前景片段.
#[inline]
pub fn close_horizontal(slice: ArrayView2<u8>, k: usize) -> Array2<u8> {
    erode_horizontal(dilate_horizontal(slice, k).view(), k)
}
