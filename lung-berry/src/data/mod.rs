use std::ops::{Index, IndexMut};

use ndarray::{Array3, ArrayView, ArrayView2, ArrayViewMut, Axis, Ix3, Zip};
use num::ToPrimitive;

use crate::consts::gray::*;
use crate::error::{SegmentError, SegmentResult};
use crate::{Idx2d, Idx3d};

pub mod slice;
pub mod window;

use slice::{MaskSlice, MaskSliceMut};

/// 体数据的解剖学方向.
///
/// 体数据按 `(axial, coronal, sagittal)` 即 `(z, y, x)` 存储.
/// 沿某一方向取切片, 得到的是垂直于该方向的二维平面:
///
/// - `Axial`: 水平切片, 形状 `(y, x)`;
/// - `Coronal`: 冠状切片, 形状 `(z, x)`;
/// - `Sagittal`: 矢状切片, 形状 `(z, y)`.
///
/// 冠状/矢状切片的第 0 行对应 axial 索引 0, 即图像 "顶部".
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum AnatomicalAxis {
    /// 头脚方向, 对应 `Axis(0)`.
    Axial,

    /// 前后方向, 对应 `Axis(1)`.
    Coronal,

    /// 左右方向, 对应 `Axis(2)`.
    Sagittal,
}

impl AnatomicalAxis {
    /// 对应的 `ndarray` 轴.
    #[inline]
    pub const fn axis(self) -> Axis {
        match self {
            Self::Axial => Axis(0),
            Self::Coronal => Axis(1),
            Self::Sagittal => Axis(2),
        }
    }

    /// 沿该方向切片后, 二维切片的形状 (高, 宽).
    #[inline]
    pub const fn slice_shape(self, (z, y, x): Idx3d) -> Idx2d {
        match self {
            Self::Axial => (y, x),
            Self::Coronal => (z, x),
            Self::Sagittal => (z, y),
        }
    }
}

/// 3D 体数据的共用属性和部分通用操作.
pub trait VolumeAttr {
    /// 获取数据形状大小 (z, y, x).
    fn shape(&self) -> Idx3d;

    /// 获取数据体素个数.
    #[inline]
    fn size(&self) -> usize {
        let (z, h, w) = self.shape();
        z * h * w
    }

    /// 沿 `axis` 方向的切片个数.
    #[inline]
    fn len_along(&self, axis: AnatomicalAxis) -> usize {
        let (z, y, x) = self.shape();
        match axis {
            AnatomicalAxis::Axial => z,
            AnatomicalAxis::Coronal => y,
            AnatomicalAxis::Sagittal => x,
        }
    }
}

/// 3D CT 扫描. HU 值以 `f32` 保存, 轴顺序为 `(z, y, x)`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct CtScan {
    data: Array3<f32>,
}

impl VolumeAttr for CtScan {
    #[inline]
    fn shape(&self) -> Idx3d {
        self.data.dim()
    }
}

impl Index<Idx3d> for CtScan {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx3d> for CtScan {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl CtScan {
    /// 直接由 `(z, y, x)` 排列的 HU 数组创建.
    ///
    /// 任一维长度为 0 时返回 `Err`.
    pub fn new(data: Array3<f32>) -> SegmentResult<Self> {
        let sh = data.dim();
        if sh.0 == 0 || sh.1 == 0 || sh.2 == 0 {
            return Err(SegmentError::EmptyVolume(sh));
        }
        Ok(Self { data })
    }

    /// 由任意数值类型 (如 `i16` 原始 HU) 的数组创建. 无法表示为 `f32` 的值记为 `NaN`.
    pub fn from_array<T: ToPrimitive>(data: &ArrayView<'_, T, Ix3>) -> SegmentResult<Self> {
        Self::new(data.map(|v| v.to_f32().unwrap_or(f32::NAN)))
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, f32, Ix3> {
        self.data.view()
    }

    /// 获得数据的一份可变 shallow copy.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut<'_, f32, Ix3> {
        self.data.view_mut()
    }

    /// 沿 `axis` 获取第 `index` 层切片视图.
    ///
    /// 当 `index` 越界时 panic.
    #[inline]
    pub fn slice_along(&self, axis: AnatomicalAxis, index: usize) -> ArrayView2<'_, f32> {
        self.data.index_axis(axis.axis(), index)
    }

    /// 将 `mask` 以外的体素置 0, 得到只含肺部的 HU 体数据.
    ///
    /// 形状不一致时返回 `Err`.
    pub fn masked(&self, mask: &LungMask) -> SegmentResult<Array3<f32>> {
        crate::error::ensure_shape(self.shape(), mask.shape())?;
        let mut ans = self.data.clone();
        Zip::from(&mut ans).and(&mask.data).for_each(|hu, &m| {
            if is_background(m) {
                *hu = 0.0;
            }
        });
        Ok(ans)
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array3<f32> {
        self.data
    }
}

/// 3D 肺二值掩膜, 像素值仅为 `MASK_BACKGROUND` 或 `MASK_FOREGROUND`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LungMask {
    data: Array3<u8>,
}

impl VolumeAttr for LungMask {
    #[inline]
    fn shape(&self) -> Idx3d {
        self.data.dim()
    }
}

impl Index<Idx3d> for LungMask {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx3d> for LungMask {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl LungMask {
    /// 创建全背景掩膜.
    #[inline]
    pub fn zeros(shape: Idx3d) -> Self {
        Self {
            data: Array3::from_elem(shape, MASK_BACKGROUND),
        }
    }

    /// 由任意 `u8` 数组创建. 非零值一律视为前景并归一化为 `MASK_FOREGROUND`.
    pub fn from_raw(data: Array3<u8>) -> Self {
        Self {
            data: data.mapv_into(|p| {
                if is_foreground(p) {
                    MASK_FOREGROUND
                } else {
                    MASK_BACKGROUND
                }
            }),
        }
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, u8, Ix3> {
        self.data.view()
    }

    /// 获得数据的一份可变 shallow copy.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut<'_, u8, Ix3> {
        self.data.view_mut()
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array3<u8> {
        self.data
    }

    /// 沿 `axis` 获取第 `index` 层不可变切片.
    ///
    /// 当 `index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, axis: AnatomicalAxis, index: usize) -> MaskSlice<'_> {
        MaskSlice::new(self.data.index_axis(axis.axis(), index))
    }

    /// 沿 `axis` 获取第 `index` 层可变切片.
    ///
    /// 当 `index` 越界时 panic.
    #[inline]
    pub fn slice_at_mut(&mut self, axis: AnatomicalAxis, index: usize) -> MaskSliceMut<'_> {
        MaskSliceMut::new(self.data.index_axis_mut(axis.axis(), index))
    }

    /// 获取能沿 `axis` 按升序迭代不可变切片的迭代器.
    #[inline]
    pub fn slice_iter(
        &self,
        axis: AnatomicalAxis,
    ) -> impl ExactSizeIterator<Item = MaskSlice<'_>> {
        self.data.axis_iter(axis.axis()).map(MaskSlice::new)
    }

    /// 获取能沿 `axis` 按升序迭代可变切片的迭代器.
    #[inline]
    pub fn slice_iter_mut(
        &mut self,
        axis: AnatomicalAxis,
    ) -> impl ExactSizeIterator<Item = MaskSliceMut<'_>> {
        self.data.axis_iter_mut(axis.axis()).map(MaskSliceMut::new)
    }

    /// 前景体素个数.
    #[inline]
    pub fn count(&self) -> usize {
        self.data.iter().filter(|p| is_foreground(**p)).count()
    }

    /// 是否为全背景.
    #[inline]
    pub fn is_background(&self) -> bool {
        self.data.iter().copied().all(is_background)
    }

    /// 所有像素值是否都在 `{0, 1}` 内.
    #[inline]
    pub fn is_binary(&self) -> bool {
        self.data
            .iter()
            .all(|p| matches!(*p, MASK_BACKGROUND | MASK_FOREGROUND))
    }
}
