//! 分割流程的可调参数.

use crate::consts::defaults::*;
use crate::data::window::HuWindow;
use crate::error::{SegmentError, SegmentResult};
use crate::post_proc::Connectivity;
use crate::AnatomicalAxis;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 分割流程的全部可调参数.
///
/// 每一项都有默认值 (见 [`crate::consts::defaults`]). 使用前应调用
/// [`SegmentConfig::validate`], [`crate::LungSegmenter::new`] 会自动调用.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentConfig {
    /// HU 截断窗口.
    pub window: HuWindow,

    /// 中值滤波核边长, 必须为正奇数.
    pub median_kernel: usize,

    /// 去除扫描床时, 顶行水平开运算的核宽.
    pub table_opening_width: usize,

    /// 整幅切片水平闭运算的核宽.
    pub closing_width: usize,

    /// 空洞填充盒滤波边长.
    pub hole_fill_kernel: usize,

    /// 断层判定阈值, 取值 `[0, 1)`.
    pub broken_slice_threshold: f64,

    /// 断层修复最多迭代次数. `None` 表示取沿切片方向的切片个数.
    pub repair_budget: Option<usize>,

    /// 逐切片建立粗掩膜及断层修复所沿的方向.
    pub slicing_axis: AnatomicalAxis,

    /// 第二遍空洞填充所沿的方向. 必须与 `slicing_axis` 不同.
    pub refill_axis: AnatomicalAxis,

    /// 后处理保留的最大连通域个数.
    pub top_k: usize,

    /// 判断左右肺成对的相对容差, 取值 `[0, 1]`.
    pub pair_tolerance: f64,

    /// 三维连通规则.
    pub connectivity: Connectivity,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            window: HuWindow::from_lung_default(),
            median_kernel: MEDIAN_KERNEL,
            table_opening_width: TABLE_OPENING_WIDTH,
            closing_width: CLOSING_WIDTH,
            hole_fill_kernel: HOLE_FILL_KERNEL,
            broken_slice_threshold: BROKEN_SLICE_THRESHOLD,
            repair_budget: None,
            slicing_axis: AnatomicalAxis::Sagittal,
            refill_axis: AnatomicalAxis::Axial,
            top_k: TOP_K,
            pair_tolerance: PAIR_TOLERANCE,
            connectivity: Connectivity::Face,
        }
    }
}

impl SegmentConfig {
    /// 检查所有参数是否合法.
    pub fn validate(&self) -> SegmentResult<()> {
        // 反序列化得到的窗口不经过 `HuWindow::new`, 这里再查一次.
        HuWindow::new(self.window.lower_bound(), self.window.upper_bound())?;

        let invalid = |msg: String| Err(SegmentError::InvalidConfig(msg));
        if self.median_kernel == 0 || self.median_kernel % 2 == 0 {
            return invalid(format!(
                "median kernel must be a positive odd number, got {}",
                self.median_kernel
            ));
        }
        for (name, k) in [
            ("table opening width", self.table_opening_width),
            ("closing width", self.closing_width),
            ("hole fill kernel", self.hole_fill_kernel),
            ("top k", self.top_k),
        ] {
            if k == 0 {
                return invalid(format!("{name} must be positive"));
            }
        }
        if !(0.0..1.0).contains(&self.broken_slice_threshold) {
            return invalid(format!(
                "broken slice threshold must be in [0, 1), got {}",
                self.broken_slice_threshold
            ));
        }
        if !(0.0..=1.0).contains(&self.pair_tolerance) {
            return invalid(format!(
                "pair tolerance must be in [0, 1], got {}",
                self.pair_tolerance
            ));
        }
        if self.slicing_axis == self.refill_axis {
            return invalid(format!(
                "slicing axis and refill axis must differ, both are {:?}",
                self.slicing_axis
            ));
        }
        Ok(())
    }

    /// 设置 HU 截断窗口.
    #[inline]
    pub fn with_window(mut self, window: HuWindow) -> Self {
        self.window = window;
        self
    }

    /// 设置断层判定阈值.
    #[inline]
    pub fn with_broken_slice_threshold(mut self, threshold: f64) -> Self {
        self.broken_slice_threshold = threshold;
        self
    }

    /// 设置断层修复最多迭代次数.
    #[inline]
    pub fn with_repair_budget(mut self, budget: usize) -> Self {
        self.repair_budget = Some(budget);
        self
    }

    /// 设置切片方向与第二遍空洞填充方向.
    #[inline]
    pub fn with_axes(mut self, slicing: AnatomicalAxis, refill: AnatomicalAxis) -> Self {
        self.slicing_axis = slicing;
        self.refill_axis = refill;
        self
    }

    /// 设置后处理保留的最大连通域个数.
    #[inline]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// 设置左右肺成对的相对容差.
    #[inline]
    pub fn with_pair_tolerance(mut self, tolerance: f64) -> Self {
        self.pair_tolerance = tolerance;
        self
    }

    /// 设置三维连通规则.
    #[inline]
    pub fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = connectivity;
        self
    }
}
