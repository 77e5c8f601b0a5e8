use super::MaskMirror;
use crate::consts::gray::*;
use crate::consts::ElemType;
use crate::morph::neighbour4;
use crate::Idx2d;
use ndarray::iter::{Iter, IterMut};
use ndarray::{Array2, ArrayView2, ArrayViewMut2, Ix2};
use std::collections::VecDeque;
use std::ops::{Index, IndexMut};

/// 不可变、借用的二维掩膜切片.
pub struct MaskSlice<'a> {
    /// 底层数据的轻量级视图, 借用于 [`crate::LungMask`].
    data: ArrayView2<'a, u8>,
}

impl Index<Idx2d> for MaskSlice<'_> {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

/// 可变、借用的二维掩膜切片.
pub struct MaskSliceMut<'a> {
    /// 底层数据的轻量级视图, 借用于 [`crate::LungMask`].
    data: ArrayViewMut2<'a, u8>,
}

/// 可变方法集合.
impl<'a> MaskSliceMut<'a> {
    /// 获取可以迭代并修改图像像素的迭代器.
    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, u8, Ix2> {
        self.data.iter_mut()
    }

    /// 用 `mirror` 覆写原本 `self` 的内容.
    ///
    /// 如果 `mirror` 大小与 `self.size()` 不符, 则程序 panic.
    pub fn resume(&mut self, mirror: &MaskMirror) {
        assert_eq!(self.size(), mirror.0.len(), "镜像大小不符");
        for (r, w) in mirror.0.iter().zip(self.iter_mut()) {
            *w = *r;
        }
    }

    /// 用 `src` 覆写本切片. 形状不一致时 panic.
    #[inline]
    pub fn assign(&mut self, src: &ArrayView2<'_, u8>) {
        self.data.assign(src);
    }

    /// 将第 `w` 列填充为 `value`. 越界时什么也不做.
    pub fn fill_column(&mut self, w: usize, value: u8) {
        if w < self.width() {
            self.data.column_mut(w).fill(value);
        }
    }

    /// 以 `seed` 为种子, 按照 4-相邻规则泛洪填充.
    ///
    /// 与种子像素值相同且 4-连通的区域全部被改写为 `value`.
    /// 返回被改写的像素索引 (含种子本身), 无顺序保证.
    /// 如果 `seed` 越界, 或种子像素已经等于 `value`, 则返回空 `Vec`.
    pub fn flood_fill(&mut self, seed: Idx2d, value: u8) -> Vec<Idx2d> {
        let Some(&origin) = self.get(seed) else {
            return vec![];
        };
        if ElemType::from(origin) == ElemType::from(value) {
            return vec![];
        }

        let mut filled = Vec::with_capacity(64);
        let mut bfs_q = VecDeque::with_capacity(64);
        self[seed] = value;
        bfs_q.push_back(seed);

        while let Some(cur) = bfs_q.pop_front() {
            filled.push(cur);
            for neigh in neighbour4(cur) {
                // 改写即标记已访问.
                if self.get(neigh).is_some_and(|&p| p == origin) {
                    self[neigh] = value;
                    bfs_q.push_back(neigh);
                }
            }
        }
        filled
    }
}

impl Index<Idx2d> for MaskSliceMut<'_> {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx2d> for MaskSliceMut<'_> {
    #[inline]
    fn index_mut(&mut self, index: Idx2d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

/// 掩膜切片不可变方法集合.
macro_rules! impl_mask_slice_immut {
    ($life: lifetime, $slice: ty, $array: ty) => {
        /// 不可变方法集合.
        impl<$life> $slice {
            /// 直接初始化.
            #[inline]
            pub(crate) fn new(data: $array) -> Self {
                Self { data }
            }

            /// 获得 **底层** 数据的一份不可变 shallow copy.
            #[inline]
            pub fn array_view(&self) -> ArrayView2<'_, u8> {
                self.data.view()
            }

            /// 获取可以迭代图像像素的迭代器.
            #[inline]
            pub fn iter(&self) -> Iter<'_, u8, Ix2> {
                self.data.iter()
            }

            /// 获取给定位置 (高, 宽) 的像素值. 越界时返回 `None`.
            #[inline]
            pub fn get(&self, pos: Idx2d) -> Option<&u8> {
                self.data.get(pos)
            }

            /// 该图是否为全背景图?
            #[inline]
            pub fn is_background(&self) -> bool {
                self.data.iter().copied().all(is_background)
            }

            /// 图像的分辨率 (高, 宽).
            #[inline]
            pub fn shape(&self) -> Idx2d {
                self.data.dim()
            }

            /// 图像的像素个数.
            #[inline]
            pub fn size(&self) -> usize {
                let (h, w) = self.shape();
                h * w
            }

            /// 获得图像的高.
            #[inline]
            pub fn height(&self) -> usize {
                self.shape().0
            }

            /// 获得图像的宽.
            #[inline]
            pub fn width(&self) -> usize {
                self.shape().1
            }

            /// 判断一个索引是否合法 (未越界).
            #[inline]
            pub fn check(&self, (h, w): Idx2d) -> bool {
                let (h_len, w_len) = self.shape();
                h < h_len && w < w_len
            }

            /// 统计前景像素个数, 即该层掩膜的面积.
            #[inline]
            pub fn area(&self) -> usize {
                self.data.iter().filter(|&p| is_foreground(*p)).count()
            }

            /// 获取拥有所有权的镜像, 供以后可能的恢复.
            #[inline]
            pub fn mirror(&self) -> MaskMirror {
                self.into()
            }

            /// 克隆自己, 获得拥有所有权的二维数组.
            #[inline]
            pub fn to_owned(&self) -> Array2<u8> {
                self.data.to_owned()
            }

            /// 获得 `pos` 的 4-邻域像素索引. 保证返回的索引都不越界.
            pub fn n4_positions(&self, pos: Idx2d) -> Vec<Idx2d> {
                neighbour4(pos)
                    .into_iter()
                    .filter(|p| self.check(*p))
                    .collect()
            }
        }
    };
}

impl_mask_slice_immut!('a, MaskSlice<'a>, ArrayView2<'a, u8>);
impl_mask_slice_immut!('a, MaskSliceMut<'a>, ArrayViewMut2<'a, u8>);

#[cfg(test)]
mod tests {
    use crate::consts::gray::*;
    use crate::{AnatomicalAxis, LungMask};
    use ndarray::{array, Array3};

    fn mask_with(slice: ndarray::Array2<u8>) -> LungMask {
        let (h, w) = slice.dim();
        let mut data = Array3::<u8>::zeros((1, h, w));
        data.index_axis_mut(ndarray::Axis(0), 0).assign(&slice);
        LungMask::from_raw(data)
    }

    #[test]
    fn test_flood_fill_stops_at_barrier() {
        let mut mask = mask_with(array![
            [0, 0, 1, 0],
            [0, 1, 1, 0],
            [1, 1, 0, 0],
            [0, 0, 0, 0],
        ]);
        let mut sli = mask.slice_at_mut(AnatomicalAxis::Axial, 0);
        let filled = sli.flood_fill((0, 0), MASK_FOREGROUND);
        assert_eq!(filled.len(), 3);
        assert_eq!(
            sli.array_view(),
            array![[1, 1, 1, 0], [1, 1, 1, 0], [1, 1, 0, 0], [0, 0, 0, 0]]
        );

        // 剩余背景是 4-连通的一整块.
        let filled = sli.flood_fill((3, 3), MASK_FOREGROUND);
        assert_eq!(filled.len(), 8);
        assert_eq!(sli.area(), 16);
    }

    #[test]
    fn test_flood_fill_noop() {
        let mut mask = mask_with(array![[1, 1], [0, 0]]);
        let mut sli = mask.slice_at_mut(AnatomicalAxis::Axial, 0);
        assert!(sli.flood_fill((0, 0), MASK_FOREGROUND).is_empty());
        assert!(sli.flood_fill((5, 5), MASK_FOREGROUND).is_empty());
        assert_eq!(sli.area(), 2);
    }

    #[test]
    fn test_mirror_resume_along_sagittal() {
        let mut data = Array3::<u8>::zeros((3, 4, 2));
        data[(0, 0, 0)] = 1;
        data[(2, 3, 0)] = 1;
        data[(1, 1, 0)] = 1;
        let mut mask = LungMask::from_raw(data);

        let mirror = mask.slice_at(AnatomicalAxis::Sagittal, 0).mirror();
        assert!(mask.slice_at(AnatomicalAxis::Sagittal, 1).is_background());
        mask.slice_at_mut(AnatomicalAxis::Sagittal, 1).resume(&mirror);

        let (a, b) = (
            mask.slice_at(AnatomicalAxis::Sagittal, 0),
            mask.slice_at(AnatomicalAxis::Sagittal, 1),
        );
        assert_eq!(a.shape(), (3, 4));
        assert_eq!(a.array_view(), b.array_view());
        assert_eq!(b.area(), 3);
    }

    #[test]
    fn test_n4_positions_at_corner() {
        let mask = LungMask::zeros((1, 3, 3));
        let sli = mask.slice_at(AnatomicalAxis::Axial, 0);
        let mut n = sli.n4_positions((0, 0));
        n.sort();
        assert_eq!(n, vec![(0, 1), (1, 0)]);
        assert_eq!(sli.n4_positions((1, 1)).len(), 4);
    }
}
