#![warn(missing_docs)]

//! 核心库. 从胸部 3D CT 扫描 (HU 值) 中提取肺实质的二值掩膜.
//!
//! 该 crate 仅负责内存中的计算: 输入一个 3D HU 体数据, 输出同形状的
//! 0/1 掩膜和一份诊断报告. 文件读写、批处理、配准等均由调用方负责.
//!
//! # 注意
//!
//! 1. 体数据的轴顺序固定为 `(axial, coronal, sagittal)`, 即 `(z, y, x)`.
//!   参见 [`AnatomicalAxis`].
//! 2. 默认 HU 窗口为 `[100, 700]`, 与通常的含气肺组织 HU 范围
//!   (约 -1000 ~ -500) 并不一致. 这里原样保留并允许配置, 但不保证其在所有数据上合理.
//!
//! # 流程
//!
//! ### HU 窗口截断 ✅
//!
//! 将原始 HU 值截断到工作区间. 实现位于 `lung-berry/src/data/window.rs`.
//!
//! ### 逐切片粗掩膜 ✅
//!
//! 中值滤波 → 相对阈值二值化 → 去除扫描床 → 背景泛洪填充 → 空洞填充 → 合并.
//!
//! 实现位于 `lung-berry/src/seg/slice_mask.rs`, 形态学算子位于 `lung-berry/src/morph`.
//!
//! ### 断层修复 ✅
//!
//! 根据每层掩膜面积的一阶差分检测 "断掉" 的切片, 并用前一层覆盖.
//!
//! 实现位于 `lung-berry/src/seg/repair.rs`.
//!
//! ### 三维连通域后处理 ✅
//!
//! 取最大的若干连通域, 去掉接触体数据表面的部分, 再判断左右肺是否成对.
//!
//! 实现位于 `lung-berry/src/post_proc`.

/// 二维索引 (高, 宽).
pub type Idx2d = (usize, usize);

/// 三维索引 (z, y, x).
pub type Idx3d = (usize, usize, usize);

pub mod config;
pub mod consts;
mod data;
pub mod error;
pub mod morph;
pub mod post_proc;
pub mod prelude;
pub mod seg;

pub use config::SegmentConfig;
pub use data::slice::{MaskMirror, MaskSlice, MaskSliceMut};
pub use data::window::{clip, HuWindow};
pub use data::{AnatomicalAxis, CtScan, LungMask, VolumeAttr};
pub use error::{SegmentError, SegmentResult};
pub use seg::{segment_lungs, CancelToken, LungSegmenter, SegmentReport, Segmentation};
