//! 断层检测与修复.
//!
//! 沿切片方向统计每层掩膜的面积, 面积曲线的一阶差分出现异常陡降时,
//! 认为陡降之后的那一层 "断掉" 了, 用前一层覆盖它. 反复进行直到没有断层,
//! 或迭代次数用尽.

use super::CancelToken;
use crate::config::SegmentConfig;
use crate::error::{SegmentError, SegmentResult};
use crate::{AnatomicalAxis, LungMask, VolumeAttr};
use itertools::Itertools;

/// 每层掩膜的前景像素个数.
///
/// 面积随掩膜一起维护: 掩膜的某层被改写后, 必须调用 [`SliceAreaProfile::refresh`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SliceAreaProfile {
    axis: AnatomicalAxis,
    areas: Vec<usize>,
}

impl SliceAreaProfile {
    /// 沿 `axis` 统计 `mask` 每层的面积.
    pub fn from_mask(mask: &LungMask, axis: AnatomicalAxis) -> Self {
        Self {
            axis,
            areas: mask.slice_iter(axis).map(|s| s.area()).collect(),
        }
    }

    /// 重新统计第 `index` 层的面积.
    #[inline]
    pub fn refresh(&mut self, mask: &LungMask, index: usize) {
        self.areas[index] = mask.slice_at(self.axis, index).area();
    }

    /// 每层面积.
    #[inline]
    pub fn areas(&self) -> &[usize] {
        &self.areas
    }

    /// 统计所沿的方向.
    #[inline]
    pub fn axis(&self) -> AnatomicalAxis {
        self.axis
    }

    /// 前向差分 `areas[i + 1] - areas[i]`. 长度比层数少 1, 层数不足 2 时为空.
    pub fn derivative(&self) -> Vec<f64> {
        self.areas
            .iter()
            .tuple_windows()
            .map(|(&a, &b)| b as f64 - a as f64)
            .collect()
    }
}

/// 一次修复过程中见过的最小差分值, 用于归一化.
///
/// 只增不减地记录陡降程度. 每个体数据的修复过程都应使用新的实例.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RepairState {
    min_derivative: f64,
}

impl RepairState {
    /// 初始状态, 最小差分为 0.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 目前为止的最小差分. 从未见过负差分时为 0.
    #[inline]
    pub fn min_derivative(&self) -> f64 {
        self.min_derivative
    }

    /// 用新的差分序列更新最小值.
    pub fn observe(&mut self, derivative: &[f64]) {
        for &d in derivative {
            if d < self.min_derivative {
                self.min_derivative = d;
            }
        }
    }

    /// 将 `d` 截断到 `[min, 0]` 后除以 `min`, 得到 `[0, 1]` 内的陡降程度.
    ///
    /// 从未见过负差分时恒为 0.
    #[inline]
    pub fn normalize(&self, d: f64) -> f64 {
        let m = self.min_derivative;
        if m < 0.0 {
            d.clamp(m, 0.0) / m
        } else {
            0.0
        }
    }
}

/// 一次完整修复的结果.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// 按修复顺序排列的被覆盖的层索引. 同一层可能出现多次.
    pub repaired: Vec<usize>,

    /// 实际执行的修复次数.
    pub iterations: usize,

    /// 修复次数上限.
    pub budget: usize,

    /// 次数用尽时是否仍有断层.
    pub budget_exhausted: bool,
}

/// 逐层检测并修复断层.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SliceStackRepairer {
    axis: AnatomicalAxis,
    threshold: f64,
    budget: Option<usize>,
}

impl SliceStackRepairer {
    /// 沿 `config.slicing_axis` 修复.
    pub fn new(config: &SegmentConfig) -> Self {
        Self {
            axis: config.slicing_axis,
            threshold: config.broken_slice_threshold,
            budget: config.repair_budget,
        }
    }

    /// 沿 `axis`, 以 `threshold` 为阈值修复, 修复次数上限为层数.
    pub fn with_axis(axis: AnatomicalAxis, threshold: f64) -> Self {
        Self {
            axis,
            threshold,
            budget: None,
        }
    }

    /// 设置修复次数上限.
    #[inline]
    pub fn budget(mut self, budget: usize) -> Self {
        self.budget = Some(budget);
        self
    }

    /// 检测所有断层, 按升序返回层索引.
    ///
    /// 会用本次的差分更新 `state`.
    pub fn detect(&self, profile: &SliceAreaProfile, state: &mut RepairState) -> Vec<usize> {
        let derivative = profile.derivative();
        state.observe(&derivative);
        derivative
            .iter()
            .positions(|&d| state.normalize(d) > self.threshold)
            // 差分第 i 项描述的是进入第 i + 1 层时的变化.
            .map(|i| i + 1)
            .collect()
    }

    /// 反复修复 `mask` 中的第一个断层, 直到没有断层或次数用尽.
    ///
    /// 每轮开始前检查 `cancel`, 已取消时返回 `Err`.
    pub fn repair(&self, mask: &mut LungMask, cancel: &CancelToken) -> SegmentResult<RepairReport> {
        let budget = self.budget.unwrap_or_else(|| mask.len_along(self.axis));
        let mut profile = SliceAreaProfile::from_mask(mask, self.axis);
        let mut state = RepairState::new();
        let mut report = RepairReport {
            budget,
            ..Default::default()
        };

        loop {
            if cancel.is_cancelled() {
                return Err(SegmentError::Cancelled);
            }
            let broken = self.detect(&profile, &mut state);
            let Some(&first) = broken.first() else {
                break;
            };
            if report.iterations >= budget {
                report.budget_exhausted = true;
                log::warn!(
                    "repair budget {budget} exhausted, {} broken slice(s) left along {:?}",
                    broken.len(),
                    self.axis
                );
                break;
            }

            log::trace!("slice {first} along {:?} is broken", self.axis);
            let mirror = mask.slice_at(self.axis, first - 1).mirror();
            mask.slice_at_mut(self.axis, first).resume(&mirror);
            profile.refresh(mask, first);
            debug_assert_eq!(profile, SliceAreaProfile::from_mask(mask, self.axis));

            report.repaired.push(first);
            report.iterations += 1;
        }
        Ok(report)
    }
}
