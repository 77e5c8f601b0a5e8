use crate::data::slice::PosIter;
use ndarray::{Array2, ArrayView2};
use ordered_float::OrderedFloat;

/// `k * k` 方形窗口中值滤波. 边缘按复制处理 (窗口越界时取最近的边缘像素).
///
/// `NaN` 被视为比任何数都大. `k` 为偶数时取上中位数.
pub fn median_filter(slice: ArrayView2<f32>, k: usize) -> Array2<f32> {
    assert!(k >= 1, "中值滤波核不能为空");
    let (h, w) = slice.dim();
    if h == 0 || w == 0 {
        return Array2::zeros((h, w));
    }

    let before = k / 2;
    let mut buf: Vec<OrderedFloat<f32>> = Vec::with_capacity(k * k);
    let data: Vec<f32> = PosIter::new((h, w))
        .map(|(ch, cw)| {
            buf.clear();
            // 复制边缘: 越界索引被钳制到图像内.
            for dh in 0..k {
                let sh = (ch + dh).saturating_sub(before).min(h - 1);
                for dw in 0..k {
                    let sw = (cw + dw).saturating_sub(before).min(w - 1);
                    buf.push(OrderedFloat(slice[(sh, sw)]));
                }
            }
            let mid = buf.len() / 2;
            let (_, m, _) = buf.select_nth_unstable(mid);
            m.0
        })
        .collect();

    // `PosIter` 为行优先, 与标准布局一致, 该操作不会生成 `Err`.
    Array2::from_shape_vec((h, w), data).unwrap()
}

/// 仅用于测试: 窗口与图像交集上的朴素中值, 用于和复制边缘版本对照.
#[cfg(test)]
fn median_clipped(slice: ArrayView2<f32>, k: usize) -> Array2<f32> {
    let (h, w) = slice.dim();
    Array2::from_shape_fn((h, w), |(ch, cw)| {
        let mut v: Vec<OrderedFloat<f32>> = super::window_range(ch, h, k)
            .flat_map(|sh| super::window_range(cw, w, k).map(move |sw| (sh, sw)))
            .map(|p| OrderedFloat(slice[p]))
            .collect();
        v.sort();
        v[v.len() / 2].into_inner()
    })
}
