//! HU 截断窗口.

use crate::consts::defaults::{HU_HIGH, HU_LOW};
use crate::error::{SegmentError, SegmentResult};
use crate::CtScan;
use ndarray::{Array3, ArrayView3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 将 `volume` 的每个元素截断到闭区间 `[low, high]` 内, 返回新的体数据.
///
/// 形状和元素类型保持不变. `low > high` (或二者不可比较) 时返回 `Err`.
/// 与 `low`, `high` 都不可比较的元素 (如 `NaN`) 原样保留.
pub fn clip<A>(volume: ArrayView3<'_, A>, low: A, high: A) -> SegmentResult<Array3<A>>
where
    A: Copy + PartialOrd + Into<f64>,
{
    if !matches!(low.partial_cmp(&high), Some(o) if o.is_le()) {
        return Err(SegmentError::InvalidRange {
            low: low.into(),
            high: high.into(),
        });
    }
    Ok(volume.mapv(|v| {
        if v < low {
            low
        } else if v > high {
            high
        } else {
            v
        }
    }))
}

/// CT HU 截断窗口, 包含下限和上限.
///
/// 该窗口是只读的. 若要修改窗口参数, 你应该创建新的实例.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HuWindow {
    low: f32,
    high: f32,
}

impl Default for HuWindow {
    #[inline]
    fn default() -> Self {
        Self::from_lung_default()
    }
}

impl HuWindow {
    /// 构建截断窗口.
    ///
    /// `low` 和 `high` 必须有限且 `low <= high`, 否则返回 `Err`.
    pub fn new(low: f32, high: f32) -> SegmentResult<HuWindow> {
        if low.is_finite() && high.is_finite() && low <= high {
            Ok(Self { low, high })
        } else {
            Err(SegmentError::InvalidRange {
                low: low as f64,
                high: high as f64,
            })
        }
    }

    /// 以窗位 `level` 和窗宽 `width` 构建窗口, 即 `[level - width / 2, level + width / 2]`.
    #[inline]
    pub fn from_level_width(level: f32, width: f32) -> SegmentResult<HuWindow> {
        Self::new(level - width / 2.0, level + width / 2.0)
    }

    /// 肺掩膜分割使用的默认窗口 `[100, 700]`.
    ///
    /// 该区间与含气肺组织的典型 HU 值并不重合, 这里保留它作为可配置的默认值.
    #[inline]
    pub const fn from_lung_default() -> HuWindow {
        Self {
            low: HU_LOW,
            high: HU_HIGH,
        }
    }

    /// 窗下限.
    #[inline]
    pub fn lower_bound(&self) -> f32 {
        self.low
    }

    /// 窗上限.
    #[inline]
    pub fn upper_bound(&self) -> f32 {
        self.high
    }

    /// 窗位.
    #[inline]
    pub fn level(&self) -> f32 {
        (self.low + self.high) / 2.0
    }

    /// 窗宽.
    #[inline]
    pub fn width(&self) -> f32 {
        self.high - self.low
    }

    /// 将 `hu` 截断到窗口内.
    ///
    /// 如果 `hu` 无意义 (如 inf, NaN), 则返回 `None`.
    #[inline]
    pub fn clamp(&self, hu: f32) -> Option<f32> {
        hu.is_finite().then(|| hu.clamp(self.low, self.high))
    }

    /// 截断整个扫描. 无意义的 HU 值被当作窗下限.
    pub fn clip_scan(&self, scan: &CtScan) -> CtScan {
        let data = scan.data().mapv(|hu| self.clamp(hu).unwrap_or(self.low));
        CtScan { data }
    }
}
