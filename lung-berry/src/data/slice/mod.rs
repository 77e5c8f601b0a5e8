//! 二维掩膜切片对象的操作.

mod core;
mod iter;
mod mirror;

pub use core::{MaskSlice, MaskSliceMut};

pub(crate) use iter::PosIter;

pub use mirror::MaskMirror;
