use crate::consts::ElemType;
use ndarray::{Array2, ArrayView2};

/// 相对阈值二值化: 阈值取 `max(slice) - 1`, 不小于阈值的像素为前景.
///
/// 阈值随每幅切片的最大值变化, 因而对不同切片间的强度差异不敏感.
/// 全部像素相同的切片整体成为前景. `NaN` 不参与求最大值, 且始终为背景.
/// 空切片或全 `NaN` 切片返回全背景.
pub fn binarize_relative(slice: ArrayView2<f32>) -> Array2<u8> {
    let max = slice
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(f32::NEG_INFINITY, f32::max);
    let threshold = max - 1.0;
    slice.mapv(|v| {
        let t = if max.is_finite() && v >= threshold {
            ElemType::Foreground
        } else {
            ElemType::Background
        };
        t.value()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_binarize_relative() {
        let a = array![[100.0f32, 699.0, 700.0], [698.5, 500.0, f32::NAN]];
        assert_eq!(binarize_relative(a.view()), array![[0u8, 1, 1], [0, 0, 0]]);
    }

    #[test]
    fn test_binarize_uniform_slice() {
        let a = Array2::<f32>::from_elem((3, 3), 100.0);
        assert!(binarize_relative(a.view()).iter().all(|p| *p == 1));
        let e = Array2::<f32>::from_elem((2, 2), f32::NAN);
        assert!(binarize_relative(e.view()).iter().all(|p| *p == 0));
    }
}
