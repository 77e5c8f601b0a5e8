//! 从粗掩膜的连通域中挑出左右肺.

use super::components::{label_components, Component, ComponentMap, Connectivity};
use crate::config::SegmentConfig;
use crate::{Idx3d, LungMask, VolumeAttr};
use binary_heap_plus::BinaryHeap;
use std::cmp::Reverse;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 后处理最终保留的连通域.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LungSelection {
    /// 体素数相近的两个连通域, 视为左右肺. 较大者在前.
    Pair([Component; 2]),

    /// 只保留最大的一个连通域 (两肺相连, 或只剩一侧).
    Single(Component),

    /// 没有连通域留下, 最终掩膜为全背景.
    NotFound,
}

impl LungSelection {
    /// 保留的连通域标签.
    pub fn labels(&self) -> Vec<u32> {
        self.components().iter().map(|c| c.label).collect()
    }

    /// 保留的连通域.
    pub fn components(&self) -> &[Component] {
        match self {
            Self::Pair(pair) => pair,
            Self::Single(c) => std::slice::from_ref(c),
            Self::NotFound => &[],
        }
    }

    /// 保留的体素总数.
    #[inline]
    pub fn voxels(&self) -> usize {
        self.components().iter().map(|c| c.voxels).sum()
    }

    /// 是否识别出了左右肺.
    #[inline]
    pub fn is_pair(&self) -> bool {
        matches!(self, Self::Pair(_))
    }

    /// 是否找到了肺.
    #[inline]
    pub fn is_found(&self) -> bool {
        !matches!(self, Self::NotFound)
    }
}

/// 体素数 `a` 和 `b` 是否足够接近, 可以视为一对肺.
///
/// 判断条件为 `|a - b| / max(a, b) <= tolerance`. 两者都为 0 时返回 `false`.
#[inline]
pub fn is_lung_pair(a: usize, b: usize, tolerance: f64) -> bool {
    let (a, b) = (a as f64, b as f64);
    let m = a.max(b);
    m > 0.0 && (a - b).abs() / m <= tolerance
}

/// 后处理的结果.
#[derive(Clone, Debug)]
pub struct Postprocessed {
    /// 最终的二值掩膜.
    pub mask: LungMask,

    /// 粗掩膜中的连通域个数.
    pub components_found: usize,

    /// 最终保留的连通域.
    pub selection: LungSelection,
}

/// 三维连通域后处理:
///
/// 1. 标记粗掩膜的所有连通域;
/// 2. 取体素数最多的 `top_k` 个 (体素数相同时标签小者优先), 丢弃空连通域;
/// 3. 丢弃接触体数据任一表面的连通域;
/// 4. 剩余的前两个体素数相近时保留两者, 否则只保留最大者;
/// 5. 合并为最终掩膜.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ComponentPostprocessor {
    top_k: usize,
    pair_tolerance: f64,
    connectivity: Connectivity,
}

impl ComponentPostprocessor {
    /// 从配置构建. 不检查配置是否合法.
    pub fn new(config: &SegmentConfig) -> Self {
        Self {
            top_k: config.top_k,
            pair_tolerance: config.pair_tolerance,
            connectivity: config.connectivity,
        }
    }

    /// 体素数最多的至多 `top_k` 个非空连通域, 按体素数降序排列.
    pub fn largest<'a>(&self, map: &'a ComponentMap) -> Vec<&'a Component> {
        // 堆顶是目前保留的最差者.
        let mut heap = BinaryHeap::new_by_key(|c: &&Component| (Reverse(c.voxels), c.label));
        heap.reserve(self.top_k + 1);
        for c in map.components().iter().filter(|c| c.voxels > 0) {
            heap.push(c);
            if heap.len() > self.top_k {
                heap.pop();
            }
        }
        heap.into_sorted_vec()
    }

    /// 在 `map` 中挑选肺. `shape` 为体数据形状, 用于排除接触表面的连通域.
    pub fn select(&self, map: &ComponentMap, shape: Idx3d) -> LungSelection {
        let survivors: Vec<&Component> = self
            .largest(map)
            .into_iter()
            .filter(|c| {
                let touched = c.touches_surface(shape);
                if touched {
                    log::debug!("component {} touches the volume surface", c.label);
                }
                !touched
            })
            .collect();

        match survivors[..] {
            [a, b, ..] if is_lung_pair(a.voxels, b.voxels, self.pair_tolerance) => {
                LungSelection::Pair([*a, *b])
            }
            [a, ..] => LungSelection::Single(*a),
            [] => LungSelection::NotFound,
        }
    }

    /// 对粗掩膜执行完整后处理.
    pub fn process(&self, coarse: &LungMask) -> Postprocessed {
        let map = label_components(coarse, self.connectivity);
        let selection = self.select(&map, coarse.shape());
        match &selection {
            LungSelection::NotFound => {
                log::warn!("no lung found among {} component(s)", map.len())
            }
            s => log::debug!(
                "kept component(s) {:?} out of {}, {} voxel(s)",
                s.labels(),
                map.len(),
                s.voxels()
            ),
        }

        Postprocessed {
            mask: map.merge(&selection.labels()),
            components_found: map.len(),
            selection,
        }
    }
}
