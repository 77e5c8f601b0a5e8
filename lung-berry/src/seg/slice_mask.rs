//! 单层切片的粗掩膜.

use crate::config::SegmentConfig;
use crate::consts::gray::*;
use crate::morph::{binarize_relative, close_horizontal, fill_holes, median_filter, open_horizontal};
use crate::MaskSliceMut;
use ndarray::{s, Array2, ArrayView2, Zip};

/// 由一幅截断后的 HU 切片生成二值粗掩膜.
///
/// 流程依次为:
///
/// 1. 中值滤波去噪;
/// 2. 以 `max - 1` 为阈值二值化;
/// 3. 仅对第 0 行做水平开运算, 去掉贴着图像顶部的扫描床横条;
/// 4. 整幅水平闭运算后, 将最左、最右两列置为背景,
///   再从左上角和右上角按 4-相邻规则泛洪填充.
///   泛洪未到达的区域记为保留区域;
/// 5. 对泛洪后的工作图填充空洞 (见 [`fill_holes`]);
/// 6. 与保留区域取交集.
///
/// 全部步骤只读取输入切片. 全零或全为同一值的切片得到全背景掩膜.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SliceMaskBuilder {
    median_kernel: usize,
    table_opening_width: usize,
    closing_width: usize,
    hole_fill_kernel: usize,
}

impl SliceMaskBuilder {
    /// 从配置中读取核大小. 不检查配置是否合法.
    pub fn new(config: &SegmentConfig) -> Self {
        Self {
            median_kernel: config.median_kernel,
            table_opening_width: config.table_opening_width,
            closing_width: config.closing_width,
            hole_fill_kernel: config.hole_fill_kernel,
        }
    }

    /// 对一幅切片执行完整流程, 返回同形状的二值掩膜.
    pub fn build(&self, slice: ArrayView2<f32>) -> Array2<u8> {
        let (h, w) = slice.dim();
        if h == 0 || w == 0 {
            return Array2::from_elem((h, w), MASK_BACKGROUND);
        }

        let denoised = median_filter(slice, self.median_kernel);
        let mut binary = binarize_relative(denoised.view());
        self.open_table(&mut binary);

        let (working, keep) = self.uniform_background(binary.view());
        let mut ans = fill_holes(working.view(), self.hole_fill_kernel);
        Zip::from(&mut ans).and(&keep).for_each(|p, &k| {
            if is_background(k) {
                *p = MASK_BACKGROUND;
            }
        });
        ans
    }

    /// 顶行水平开运算.
    fn open_table(&self, binary: &mut Array2<u8>) {
        let top = open_horizontal(binary.slice(s![..1, ..]), self.table_opening_width);
        binary.slice_mut(s![..1, ..]).assign(&top);
    }

    /// 返回 (泛洪填充后的工作图, 保留区域).
    ///
    /// 保留区域中, 被泛洪改写过的像素为背景, 其余为前景.
    fn uniform_background(&self, binary: ArrayView2<u8>) -> (Array2<u8>, Array2<u8>) {
        let mut working = close_horizontal(binary, self.closing_width);
        let mut keep = Array2::from_elem(working.dim(), MASK_FOREGROUND);
        let last_col = working.ncols() - 1;

        let mut sli = MaskSliceMut::new(working.view_mut());
        sli.fill_column(0, MASK_BACKGROUND);
        sli.fill_column(last_col, MASK_BACKGROUND);
        for seed in [(0, 0), (0, last_col)] {
            for pos in sli.flood_fill(seed, MASK_FOREGROUND) {
                keep[pos] = MASK_BACKGROUND;
            }
        }
        (working, keep)
    }
}
