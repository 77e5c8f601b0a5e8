//! 🫁欢迎光临🫁
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d};

pub use crate::data::slice::{MaskMirror, MaskSlice, MaskSliceMut};
pub use crate::data::window::{clip, HuWindow};
pub use crate::data::{AnatomicalAxis, CtScan, LungMask, VolumeAttr};

pub use crate::consts::gray::{MASK_BACKGROUND, MASK_FOREGROUND};
pub use crate::consts::ElemType;

pub use crate::config::SegmentConfig;
pub use crate::error::{SegmentError, SegmentResult};

pub use crate::post_proc::{Component, Connectivity, LungSelection};
pub use crate::seg::{segment_lungs, CancelToken, LungSegmenter, SegmentReport, Segmentation};
