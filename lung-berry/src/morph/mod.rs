//! 二维切片上的滤波与形态学算子.
//!
//! 所有算子都接受只读视图并返回新数组, 不修改输入.
//!
//! 核边长为 `k` 时, 以像素 `i` 为锚点的窗口覆盖 `[i - k / 2, i + (k - 1 - k / 2)]`.
//! `k` 为偶数时窗口向前多覆盖一格. 越出图像的部分:
//!
//! - 中值滤波按边缘复制处理;
//! - 盒滤波按 101 反射处理 (`dcb|abcd|cba`);
//! - 腐蚀/膨胀直接忽略.

mod boxsum;
mod brick;
mod rank;
mod threshold;

use crate::consts::gray::invert as invert_pixel;
use crate::Idx2d;
use ndarray::{Array2, ArrayView2};
use std::ops::Range;

pub use boxsum::{box_sum, fill_holes};
pub use brick::{close_horizontal, dilate_horizontal, erode_horizontal, open_horizontal};
pub use rank::median_filter;
pub use threshold::binarize_relative;

/// 获得 `(h, w)` 的 4-邻居索引. 不检查越界.
#[inline]
pub(crate) fn neighbour4((h, w): Idx2d) -> [Idx2d; 4] {
    [
        (h.wrapping_sub(1), w),
        (h.saturating_add(1), w),
        (h, w.wrapping_sub(1)),
        (h, w.saturating_add(1)),
    ]
}

/// 长度为 `len` 的维度上, 以 `i` 为锚点、边长为 `k` 的窗口与图像的交集.
#[inline]
pub(crate) fn window_range(i: usize, len: usize, k: usize) -> Range<usize> {
    debug_assert!(k >= 1);
    let (before, after) = (k / 2, k - 1 - k / 2);
    i.saturating_sub(before)..(i + after + 1).min(len)
}

/// 二值图取反: 前景变背景, 背景变前景.
#[inline]
pub fn invert(slice: ArrayView2<u8>) -> Array2<u8> {
    slice.mapv(invert_pixel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_window_range() {
        assert_eq!(window_range(0, 10, 5), 0..3);
        assert_eq!(window_range(5, 10, 5), 3..8);
        assert_eq!(window_range(9, 10, 5), 7..10);
        // 偶数核: 前 2 后 1.
        assert_eq!(window_range(5, 10, 4), 3..7);
        assert_eq!(window_range(3, 10, 1), 3..4);
    }

    #[test]
    fn test_invert() {
        let a = array![[0u8, 1], [1, 0]];
        assert_eq!(invert(a.view()), array![[1u8, 0], [0, 1]]);
    }
}
