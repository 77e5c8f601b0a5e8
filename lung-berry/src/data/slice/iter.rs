use crate::Idx2d;

/// 行优先索引迭代器, 依次产生 `(0, 0), (0, 1), ..., (h - 1, w - 1)`.
///
/// 相比 `(0..h).flat_map(..)` 组合, 该结构体积更小, 且能报告精确长度.
#[derive(Debug, Clone)]
pub struct PosIter {
    cur: usize,
    h: usize,
    w: usize,
}

impl PosIter {
    #[inline]
    pub fn new((h, w): Idx2d) -> Self {
        Self { cur: 0, h, w }
    }

    #[inline]
    fn total(&self) -> usize {
        self.h * self.w
    }
}

impl Iterator for PosIter {
    type Item = Idx2d;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.cur >= self.total() {
            return None;
        }
        let ret_pos = (self.cur / self.w, self.cur % self.w);
        self.cur += 1;
        Some(ret_pos)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.total().saturating_sub(self.cur);
        (left, Some(left))
    }
}

impl ExactSizeIterator for PosIter {}
