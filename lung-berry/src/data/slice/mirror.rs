//! 切片镜像. 用于备份某层掩膜, 并写回到同层或其它层.

use super::{MaskSlice, MaskSliceMut};

/// 一个拥有所有权的二维掩膜切片的不透明镜像.
///
/// 断层修复时, 用它把前一层的掩膜原样复制到断掉的那一层.
/// 数据按切片的逻辑行优先顺序保存, 因此与底层内存布局无关.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaskMirror(pub(crate) Vec<u8>);

impl From<&MaskSlice<'_>> for MaskMirror {
    fn from(value: &MaskSlice<'_>) -> Self {
        Self(value.iter().copied().collect())
    }
}

impl From<&MaskSliceMut<'_>> for MaskMirror {
    fn from(value: &MaskSliceMut<'_>) -> Self {
        Self(value.iter().copied().collect())
    }
}
