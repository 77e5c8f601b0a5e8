//! 运行时错误.

use crate::Idx3d;
use thiserror::Error;

/// 分割流程的运行时错误.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SegmentError {
    /// HU 窗口不合法 (`low > high` 或不可比较).
    #[error("invalid HU range: low {low} > high {high}")]
    InvalidRange {
        /// 下限.
        low: f64,
        /// 上限.
        high: f64,
    },

    /// 其它配置项不合法.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// 中间结果形状与输入不一致. 正常情况下不应出现, 出现即内部一致性错误.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// 输入体数据形状.
        expected: Idx3d,
        /// 实际得到的形状.
        actual: Idx3d,
    },

    /// 体数据某一维长度为 0.
    #[error("empty volume: {0:?}")]
    EmptyVolume(Idx3d),

    /// 处理被调用方取消. 部分结果已丢弃.
    #[error("segmentation cancelled")]
    Cancelled,

    /// 后处理后没有任何连通域留下.
    #[error("no lung component found")]
    NoLungFound,
}

/// 分割流程运行时结果.
pub type SegmentResult<T> = Result<T, SegmentError>;

/// 检查两个形状是否一致.
#[inline]
pub(crate) fn ensure_shape(expected: Idx3d, actual: Idx3d) -> SegmentResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(SegmentError::ShapeMismatch { expected, actual })
    }
}
