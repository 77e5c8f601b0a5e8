//! 肺掩膜分割主流程.
//!
//! 截断 HU → 逐切片粗掩膜 → 断层修复 → 第二遍空洞填充 → 三维连通域后处理.

mod coarse;
mod repair;
mod slice_mask;

pub use coarse::CoarseMaskAssembler;
pub use repair::{RepairReport, RepairState, SliceAreaProfile, SliceStackRepairer};
pub use slice_mask::SliceMaskBuilder;

use crate::config::SegmentConfig;
use crate::error::{ensure_shape, SegmentError, SegmentResult};
use crate::post_proc::{ComponentPostprocessor, LungSelection};
use crate::{CtScan, LungMask, VolumeAttr};
use itertools::Itertools;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 取消标志. 克隆得到的实例共享同一个标志.
///
/// 分割流程在切片之间、修复迭代之间检查该标志.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// 新的未取消标志.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求取消.
    #[inline]
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// 是否已请求取消.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// 一次分割的诊断信息.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentReport {
    /// 按修复顺序排列的被覆盖的层索引 (沿切片方向). 每次迭代一项, 同一层可能出现多次.
    pub slices_repaired: Vec<usize>,

    /// 断层修复的迭代次数.
    pub repair_iterations: usize,

    /// 断层修复的迭代次数上限.
    pub repair_budget: usize,

    /// 次数用尽时是否仍有断层. 此时掩膜仍可用, 但质量存疑.
    pub repair_budget_exhausted: bool,

    /// 粗掩膜中的连通域个数.
    pub components_found: usize,

    /// 最终保留的连通域.
    pub selection: LungSelection,
}

impl SegmentReport {
    /// 是否识别出了左右肺.
    #[inline]
    pub fn lung_pair_detected(&self) -> bool {
        self.selection.is_pair()
    }

    /// 是否找到了肺. 为 `false` 时最终掩膜为全背景.
    #[inline]
    pub fn lung_found(&self) -> bool {
        self.selection.is_found()
    }

    /// 修复过的层数. 同一层被覆盖多次只算一次, 覆盖次数见 `repair_iterations`.
    #[inline]
    pub fn slices_repaired_count(&self) -> usize {
        self.slices_repaired.iter().unique().count()
    }
}

/// 分割结果: 与输入同形状的二值掩膜和诊断信息.
#[derive(Clone, Debug)]
pub struct Segmentation {
    /// 最终掩膜.
    pub mask: LungMask,

    /// 诊断信息.
    pub report: SegmentReport,
}

impl Segmentation {
    /// 取出掩膜. 没有找到肺时返回 `Err(SegmentError::NoLungFound)`.
    pub fn into_lung_mask(self) -> SegmentResult<LungMask> {
        if self.report.lung_found() {
            Ok(self.mask)
        } else {
            Err(SegmentError::NoLungFound)
        }
    }
}

/// 肺掩膜分割器. 配置在构造时检查, 之后可对任意多个体数据重复使用.
///
/// 每次调用都从零开始, 不同体数据之间不共享任何状态.
#[derive(Clone, Debug, Default)]
pub struct LungSegmenter {
    config: SegmentConfig,
}

impl LungSegmenter {
    /// 以 `config` 构建. 配置不合法时返回 `Err`.
    pub fn new(config: SegmentConfig) -> SegmentResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// 当前配置.
    #[inline]
    pub fn config(&self) -> &SegmentConfig {
        &self.config
    }

    /// 分割 `scan`.
    #[inline]
    pub fn segment(&self, scan: &CtScan) -> SegmentResult<Segmentation> {
        self.segment_with_cancel(scan, &CancelToken::new())
    }

    /// 只生成粗掩膜 (截断、逐切片掩膜、断层修复、第二遍空洞填充), 不做连通域后处理.
    pub fn coarse_mask(
        &self,
        scan: &CtScan,
        cancel: &CancelToken,
    ) -> SegmentResult<(LungMask, RepairReport)> {
        let clipped = self.config.window.clip_scan(scan);
        ensure_shape(scan.shape(), clipped.shape())?;
        CoarseMaskAssembler::new(&self.config).assemble(&clipped, cancel)
    }

    /// 分割 `scan`, 并可通过 `cancel` 中途放弃. 放弃时返回 `Err(SegmentError::Cancelled)`.
    pub fn segment_with_cancel(
        &self,
        scan: &CtScan,
        cancel: &CancelToken,
    ) -> SegmentResult<Segmentation> {
        let shape = scan.shape();
        log::debug!("segmenting volume of shape {shape:?}");

        let (coarse, repair) = self.coarse_mask(scan, cancel)?;
        ensure_shape(shape, coarse.shape())?;
        if cancel.is_cancelled() {
            return Err(SegmentError::Cancelled);
        }

        let post = ComponentPostprocessor::new(&self.config).process(&coarse);
        ensure_shape(shape, post.mask.shape())?;

        let report = SegmentReport {
            slices_repaired: repair.repaired,
            repair_iterations: repair.iterations,
            repair_budget: repair.budget,
            repair_budget_exhausted: repair.budget_exhausted,
            components_found: post.components_found,
            selection: post.selection,
        };
        Ok(Segmentation {
            mask: post.mask,
            report,
        })
    }
}

/// 以默认配置分割 `scan`.
#[inline]
pub fn segment_lungs(scan: &CtScan) -> SegmentResult<Segmentation> {
    LungSegmenter::default().segment(scan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AnatomicalAxis;
    use ndarray::Array3;

    #[test]
    fn test_cancel_token_is_shared() {
        let a = CancelToken::new();
        let b = a.clone();
        assert!(!b.is_cancelled());
        a.cancel();
        assert!(b.is_cancelled());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config =
            SegmentConfig::default().with_axes(AnatomicalAxis::Axial, AnatomicalAxis::Axial);
        assert!(matches!(
            LungSegmenter::new(config),
            Err(SegmentError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_zero_volume() {
        let scan = CtScan::new(Array3::zeros((8, 10, 12))).unwrap();
        let seg = segment_lungs(&scan).unwrap();
        assert_eq!(seg.mask.shape(), (8, 10, 12));
        assert!(seg.mask.is_background());
        assert_eq!(seg.report.components_found, 0);
        assert_eq!(seg.report.repair_budget, 12);
        assert_eq!(seg.report.slices_repaired_count(), 0);
        assert!(!seg.report.repair_budget_exhausted);
        assert!(!seg.report.lung_found());
        assert!(!seg.report.lung_pair_detected());
        assert_eq!(seg.into_lung_mask(), Err(SegmentError::NoLungFound));
    }

    #[test]
    fn test_repeated_repairs_count_once() {
        let report = SegmentReport {
            slices_repaired: vec![3, 4, 4, 5, 4],
            repair_iterations: 5,
            repair_budget: 10,
            repair_budget_exhausted: false,
            components_found: 0,
            selection: LungSelection::NotFound,
        };
        assert_eq!(report.slices_repaired_count(), 3);
        assert_eq!(report.slices_repaired.len(), report.repair_iterations);
    }
}
