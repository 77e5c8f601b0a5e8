//! 3D 连通域标记.

use crate::consts::gray::*;
use crate::{Idx3d, LungMask, VolumeAttr};
use itertools::iproduct;
use ndarray::{Array3, ArrayView3};
use std::collections::VecDeque;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 三维体素的相邻规则.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Connectivity {
    /// 共面相邻, 即前后上下左右 6 个体素.
    #[default]
    Face,

    /// 共面、共棱或共顶点相邻, 即周围 26 个体素.
    Full,
}

impl Connectivity {
    /// 相邻体素相对于中心的偏移量.
    pub fn offsets(self) -> Vec<(isize, isize, isize)> {
        match self {
            Self::Face => vec![
                (-1, 0, 0),
                (1, 0, 0),
                (0, -1, 0),
                (0, 1, 0),
                (0, 0, -1),
                (0, 0, 1),
            ],
            Self::Full => iproduct!(-1..=1, -1..=1, -1..=1)
                .filter(|&o| o != (0, 0, 0))
                .collect(),
        }
    }
}

/// `pos + offset`, 越界时返回 `None`.
#[inline]
fn step((z, h, w): Idx3d, (dz, dh, dw): (isize, isize, isize), shape: Idx3d) -> Option<Idx3d> {
    let ans = (
        z.checked_add_signed(dz)?,
        h.checked_add_signed(dh)?,
        w.checked_add_signed(dw)?,
    );
    (ans.0 < shape.0 && ans.1 < shape.1 && ans.2 < shape.2).then_some(ans)
}

/// 一个连通域的摘要.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Component {
    /// 标签, 从 1 开始.
    pub label: u32,

    /// 体素个数.
    pub voxels: usize,

    /// 包围盒各维的最小索引.
    pub lower: Idx3d,

    /// 包围盒各维的最大索引 (含).
    pub upper: Idx3d,
}

impl Component {
    #[inline]
    fn seed(label: u32, pos: Idx3d) -> Self {
        Self {
            label,
            voxels: 0,
            lower: pos,
            upper: pos,
        }
    }

    #[inline]
    fn include(&mut self, (z, h, w): Idx3d) {
        self.voxels += 1;
        self.lower = (self.lower.0.min(z), self.lower.1.min(h), self.lower.2.min(w));
        self.upper = (self.upper.0.max(z), self.upper.1.max(h), self.upper.2.max(w));
    }

    /// 是否有体素位于形状为 `shape` 的长方体的六个表面之一上.
    ///
    /// 包围盒是紧的, 故只需检查包围盒.
    pub fn touches_surface(&self, (z, h, w): Idx3d) -> bool {
        let (l, u) = (self.lower, self.upper);
        l.0 == 0 || l.1 == 0 || l.2 == 0 || u.0 + 1 >= z || u.1 + 1 >= h || u.2 + 1 >= w
    }
}

/// 标签体数据及所有连通域.
#[derive(Clone, Debug)]
pub struct ComponentMap {
    labels: Array3<u32>,
    components: Vec<Component>,
}

impl ComponentMap {
    /// 标签体数据. 背景为 0.
    #[inline]
    pub fn labels(&self) -> ArrayView3<'_, u32> {
        self.labels.view()
    }

    /// 所有连通域, 第 `i` 项的标签为 `i + 1`.
    #[inline]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// 连通域个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// 是否没有任何连通域.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// 按标签查找.
    #[inline]
    pub fn get(&self, label: u32) -> Option<&Component> {
        let i = (label as usize).checked_sub(1)?;
        self.components.get(i)
    }

    /// 将 `keep` 中各标签的连通域合并为一个二值掩膜.
    pub fn merge(&self, keep: &[u32]) -> LungMask {
        LungMask::from_raw(self.labels.mapv(|l| {
            if l != 0 && keep.contains(&l) {
                MASK_FOREGROUND
            } else {
                MASK_BACKGROUND
            }
        }))
    }
}

/// 按 `connectivity` 规则标记 `mask` 的所有前景连通域.
///
/// 以 `(z, y, x)` 行优先顺序扫描, 先遇到的连通域标签较小.
pub fn label_components(mask: &LungMask, connectivity: Connectivity) -> ComponentMap {
    let shape = mask.shape();
    let offsets = connectivity.offsets();
    let mut labels = Array3::<u32>::zeros(shape);
    let mut components = Vec::new();
    let mut bfs_q = VecDeque::with_capacity(64);

    for (pos, &p) in mask.data().indexed_iter() {
        if is_background(p) || labels[pos] != 0 {
            continue;
        }
        let label = components.len() as u32 + 1;
        let mut comp = Component::seed(label, pos);
        labels[pos] = label;
        bfs_q.push_back(pos);

        while let Some(cur) = bfs_q.pop_front() {
            comp.include(cur);
            for neigh in offsets.iter().filter_map(|&o| step(cur, o, shape)) {
                if is_foreground(mask[neigh]) && labels[neigh] == 0 {
                    labels[neigh] = label;
                    bfs_q.push_back(neigh);
                }
            }
        }
        components.push(comp);
    }

    ComponentMap { labels, components }
}
