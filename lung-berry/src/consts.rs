//! 通用常量.

/// 单通道二值掩膜像素值.
pub mod gray {
    /// 掩膜中背景的像素值.
    pub const MASK_BACKGROUND: u8 = 0;

    /// 掩膜中前景 (肺) 的像素值.
    pub const MASK_FOREGROUND: u8 = 1;

    /// 像素是否是前景?
    #[inline]
    pub const fn is_foreground(p: u8) -> bool {
        p != MASK_BACKGROUND
    }

    /// 像素是否是背景?
    #[inline]
    pub const fn is_background(p: u8) -> bool {
        p == MASK_BACKGROUND
    }

    /// 取反. 任何非零值都视为前景.
    #[inline]
    pub const fn invert(p: u8) -> u8 {
        if is_background(p) {
            MASK_FOREGROUND
        } else {
            MASK_BACKGROUND
        }
    }
}

/// 各项可调参数的默认值.
pub mod defaults {
    /// HU 截断窗口下限.
    pub const HU_LOW: f32 = 100.0;

    /// HU 截断窗口上限.
    pub const HU_HIGH: f32 = 700.0;

    /// 中值滤波核边长 (奇数).
    pub const MEDIAN_KERNEL: usize = 5;

    /// 去除扫描床时, 顶行水平开运算的核宽.
    pub const TABLE_OPENING_WIDTH: usize = 25;

    /// 整幅切片水平闭运算的核宽.
    pub const CLOSING_WIDTH: usize = 20;

    /// 空洞填充所用方形盒滤波的边长.
    pub const HOLE_FILL_KERNEL: usize = 30;

    /// 归一化差分超过该值的切片被视为断层.
    pub const BROKEN_SLICE_THRESHOLD: f64 = 0.1;

    /// 后处理时保留的最大连通域个数.
    pub const TOP_K: usize = 3;

    /// 左右肺体素数的相对容差.
    pub const PAIR_TOLERANCE: f64 = 0.5;
}

/// 体素/像素类型.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ElemType {
    /// `MASK_BACKGROUND`, 代表背景.
    Background,

    /// `MASK_FOREGROUND`, 代表前景.
    Foreground,
}

impl ElemType {
    /// 是否为前景.
    #[inline]
    pub fn is_foreground(&self) -> bool {
        matches!(self, Self::Foreground)
    }

    /// 是否为背景.
    #[inline]
    pub fn is_background(&self) -> bool {
        !self.is_foreground()
    }

    /// 对应的掩膜像素值.
    #[inline]
    pub const fn value(self) -> u8 {
        match self {
            Self::Background => gray::MASK_BACKGROUND,
            Self::Foreground => gray::MASK_FOREGROUND,
        }
    }
}

impl From<u8> for ElemType {
    #[inline]
    fn from(p: u8) -> Self {
        if gray::is_foreground(p) {
            Self::Foreground
        } else {
            Self::Background
        }
    }
}
