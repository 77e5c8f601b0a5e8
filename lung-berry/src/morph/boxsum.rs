//! 方形盒滤波 (不归一化) 与基于它的空洞填充.

use super::invert;
use crate::consts::gray::*;
use ndarray::{Array2, ArrayView2};

/// 按 101 反射规则 (`dcb|abcd|cba`) 把越界索引 `p` 折回 `[0, len)`.
///
/// `len == 1` 时恒为 0. `len` 不能为 0.
#[inline]
pub(crate) fn reflect101(mut p: isize, len: usize) -> usize {
    debug_assert!(len >= 1);
    let n = len as isize;
    if n == 1 {
        return 0;
    }
    while p < 0 || p >= n {
        p = if p < 0 { -p } else { 2 * (n - 1) - p };
    }
    p as usize
}

/// 不归一化的 `k * k` 盒滤波: 每个输出像素为窗口内前景像素个数.
///
/// 越出图像的部分按 101 反射取值 (见 [`reflect101`]).
/// 内部先反射填充再求积分图, 与 `k` 无关地线性时间完成.
pub fn box_sum(slice: ArrayView2<'_, u8>, k: usize) -> Array2<u32> {
    assert!(k >= 1, "盒滤波核不能为空");
    let (h, w) = slice.dim();
    if h == 0 || w == 0 {
        return Array2::zeros((h, w));
    }

    // 第 (i, j) 个像素的窗口为 padded[i..i + k, j..j + k].
    let before = (k / 2) as isize;
    let padded = Array2::from_shape_fn((h + k - 1, w + k - 1), |(i, j)| {
        let src = (
            reflect101(i as isize - before, h),
            reflect101(j as isize - before, w),
        );
        u32::from(is_foreground(slice[src]))
    });

    // integral[(i, j)] = padded[..i, ..j] 之和.
    let (ph, pw) = padded.dim();
    let mut integral = Array2::<u32>::zeros((ph + 1, pw + 1));
    for i in 0..ph {
        let mut row_acc = 0u32;
        for j in 0..pw {
            row_acc += padded[(i, j)];
            integral[(i + 1, j + 1)] = integral[(i, j + 1)] + row_acc;
        }
    }

    Array2::from_shape_fn((h, w), |(i, j)| {
        integral[(i + k, j + k)] + integral[(i, j)] - integral[(i, j + k)] - integral[(i + k, j)]
    })
}

/// 以 `k * k` 窗口近似的空洞填充.
///
/// 对输入取反, 再做不归一化盒滤波, 窗口内至少有一个 (取反后的) 前景像素的位置记为前景.
/// 等价于对取反图做一次 `k * k` 方形膨胀.
pub fn fill_holes(slice: ArrayView2<'_, u8>, k: usize) -> Array2<u8> {
    box_sum(invert(slice).view(), k).mapv(|s| {
        if s >= 1 {
            MASK_FOREGROUND
        } else {
            MASK_BACKGROUND
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_reflect101() {
        let got: Vec<_> = (-4..9).map(|p| reflect101(p, 5)).collect();
        assert_eq!(got, vec![4, 3, 2, 1, 0, 1, 2, 3, 4, 3, 2, 1, 0]);
        assert_eq!(reflect101(-7, 1), 0);
        assert_eq!(reflect101(9, 2), 1);
        assert_eq!(reflect101(-5, 2), 1);
    }

    #[test]
    fn test_box_sum_matches_naive() {
        let a = Array2::from_shape_fn((7, 9), |(i, j)| ((i * 7 + j * 3) % 4 == 0) as u8);
        for k in [1, 2, 3, 4, 5, 30] {
            let fast = box_sum(a.view(), k);
            let before = (k / 2) as isize;
            let naive = Array2::from_shape_fn((7, 9), |(i, j)| {
                let mut s = 0u32;
                for di in 0..k as isize {
                    for dj in 0..k as isize {
                        let r = reflect101(i as isize - before + di, 7);
                        let c = reflect101(j as isize - before + dj, 9);
                        s += a[(r, c)] as u32;
                    }
                }
                s
            });
            assert_eq!(fast, naive, "k = {k}");
        }
    }

    #[test]
    fn test_box_sum_reflects_at_border() {
        let a = array![[0u8, 1, 0, 0]];
        // 第 0 列的窗口为 [a[1], a[0], a[1]], 行方向同理反射 (单行恒取第 0 行).
        assert_eq!(box_sum(a.view(), 3), array![[6u32, 3, 3, 0]]);
        assert_eq!(box_sum(a.view(), 1), array![[0u32, 1, 0, 0]]);
    }

    #[test]
    fn test_fill_holes_is_dilation_of_inverse() {
        let mut a = Array2::from_elem((9, 9), MASK_FOREGROUND);
        a[(4, 4)] = MASK_BACKGROUND;
        let f = fill_holes(a.view(), 3);
        assert_eq!(f.iter().filter(|p| **p == MASK_FOREGROUND).count(), 9);
        assert_eq!(f[(3, 3)], MASK_FOREGROUND);
        assert_eq!(f[(5, 5)], MASK_FOREGROUND);
        assert_eq!(f[(2, 4)], MASK_BACKGROUND);
    }

    #[test]
    fn test_fill_holes_reaches_across_border() {
        // 空洞紧邻左边界, 反射后其镜像也落入窗口.
        let mut a = Array2::from_elem((5, 6), MASK_FOREGROUND);
        a[(2, 1)] = MASK_BACKGROUND;
        let f = fill_holes(a.view(), 5);
        assert_eq!(f[(2, 0)], MASK_FOREGROUND);
        assert_eq!(f[(2, 3)], MASK_FOREGROUND);
        assert_eq!(f[(2, 4)], MASK_BACKGROUND);
        assert_eq!(f[(0, 3)], MASK_FOREGROUND);
    }

    #[test]
    fn test_fill_holes_all_foreground_gives_background() {
        let a = array![[1u8, 1], [1, 1]];
        assert_eq!(fill_holes(a.view(), 30), array![[0u8, 0], [0, 0]]);
    }
}
