//! 三维粗掩膜.

use super::repair::{RepairReport, SliceStackRepairer};
use super::slice_mask::SliceMaskBuilder;
use super::CancelToken;
use crate::config::SegmentConfig;
use crate::error::{ensure_shape, SegmentError, SegmentResult};
use crate::morph::{fill_holes, invert};
use crate::{AnatomicalAxis, CtScan, LungMask, MaskSliceMut, VolumeAttr};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
    }
}

/// 组装三维粗掩膜:
///
/// 1. 沿 `slicing_axis` 对每层调用 [`SliceMaskBuilder`];
/// 2. 沿同一方向修复断层;
/// 3. 沿 `refill_axis` 对每层取反后再做一次空洞填充.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CoarseMaskAssembler {
    builder: SliceMaskBuilder,
    repairer: SliceStackRepairer,
    slicing_axis: AnatomicalAxis,
    refill_axis: AnatomicalAxis,
    hole_fill_kernel: usize,
}

impl CoarseMaskAssembler {
    /// 从配置构建. 不检查配置是否合法.
    pub fn new(config: &SegmentConfig) -> Self {
        Self {
            builder: SliceMaskBuilder::new(config),
            repairer: SliceStackRepairer::new(config),
            slicing_axis: config.slicing_axis,
            refill_axis: config.refill_axis,
            hole_fill_kernel: config.hole_fill_kernel,
        }
    }

    /// 对已截断的扫描 `clipped` 生成粗掩膜, 同时返回断层修复的结果.
    pub fn assemble(
        &self,
        clipped: &CtScan,
        cancel: &CancelToken,
    ) -> SegmentResult<(LungMask, RepairReport)> {
        let shape = clipped.shape();

        let mut mask = self.build_slices(clipped, cancel)?;
        ensure_shape(shape, mask.shape())?;
        log::debug!(
            "built {} slice(s) along {:?}, {} foreground voxel(s)",
            mask.len_along(self.slicing_axis),
            self.slicing_axis,
            mask.count()
        );

        let report = self.repairer.repair(&mut mask, cancel)?;
        log::debug!("repaired {} broken slice(s)", report.iterations);

        self.refill(&mut mask, cancel)?;
        ensure_shape(shape, mask.shape())?;
        Ok((mask, report))
    }

    /// 已取消时返回 `Err`.
    #[inline]
    fn check_cancel(cancel: &CancelToken) -> SegmentResult<()> {
        if cancel.is_cancelled() {
            Err(SegmentError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// 沿切片方向逐层建立掩膜.
    fn build_slices(&self, clipped: &CtScan, cancel: &CancelToken) -> SegmentResult<LungMask> {
        let mut mask = LungMask::zeros(clipped.shape());
        let axis = self.slicing_axis.axis();
        let src = clipped.data();
        let mut dst = mask.data_mut();

        cfg_if::cfg_if! {
            if #[cfg(feature = "rayon")] {
                dst.axis_iter_mut(axis)
                    .into_par_iter()
                    .zip(src.axis_iter(axis).into_par_iter())
                    .try_for_each(|(mut out, sli)| {
                        Self::check_cancel(cancel)?;
                        out.assign(&self.builder.build(sli));
                        Ok(())
                    })?;
            } else {
                for (mut out, sli) in dst.axis_iter_mut(axis).zip(src.axis_iter(axis)) {
                    Self::check_cancel(cancel)?;
                    out.assign(&self.builder.build(sli));
                }
            }
        }
        Ok(mask)
    }

    /// 沿 `refill_axis` 对每层取反后填充空洞.
    fn refill(&self, mask: &mut LungMask, cancel: &CancelToken) -> SegmentResult<()> {
        let k = self.hole_fill_kernel;
        let refill_one = |mut sli: MaskSliceMut| {
            let filled = fill_holes(invert(sli.array_view()).view(), k);
            sli.assign(&filled.view());
        };

        cfg_if::cfg_if! {
            if #[cfg(feature = "rayon")] {
                mask.data_mut()
                    .axis_iter_mut(self.refill_axis.axis())
                    .into_par_iter()
                    .try_for_each(|v| {
                        Self::check_cancel(cancel)?;
                        refill_one(MaskSliceMut::new(v));
                        Ok(())
                    })?;
            } else {
                for sli in mask.slice_iter_mut(self.refill_axis) {
                    Self::check_cancel(cancel)?;
                    refill_one(sli);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::gray::*;
    use ndarray::{Array2, Array3};

    #[test]
    fn test_refill_dilates_along_axial() {
        let config = SegmentConfig {
            hole_fill_kernel: 3,
            ..Default::default()
        };
        let assembler = CoarseMaskAssembler::new(&config);
        let mut data = Array3::from_elem((2, 7, 7), MASK_BACKGROUND);
        data[(1, 3, 3)] = MASK_FOREGROUND;
        let mut mask = LungMask::from_raw(data);

        assembler.refill(&mut mask, &CancelToken::new()).unwrap();
        assert!(mask.slice_at(AnatomicalAxis::Axial, 0).is_background());
        assert_eq!(mask.slice_at(AnatomicalAxis::Axial, 1).area(), 9);
        assert_eq!(mask[(1, 2, 2)], MASK_FOREGROUND);
        assert_eq!(mask[(1, 4, 4)], MASK_FOREGROUND);
        assert_eq!(mask[(1, 1, 3)], MASK_BACKGROUND);
    }

    #[test]
    fn test_build_matches_single_slice_builder() {
        let config = SegmentConfig::default();
        let assembler = CoarseMaskAssembler::new(&config);
        let raw = Array3::from_shape_fn((20, 12, 3), |(z, y, _)| {
            if (4..16).contains(&z) && (2..10).contains(&y) {
                700.0
            } else {
                100.0
            }
        });
        let scan = CtScan::new(raw).unwrap();
        let mask = assembler.build_slices(&scan, &CancelToken::new()).unwrap();

        let builder = SliceMaskBuilder::new(&config);
        for x in 0..3 {
            let expected: Array2<u8> =
                builder.build(scan.slice_along(AnatomicalAxis::Sagittal, x));
            assert_eq!(
                mask.slice_at(AnatomicalAxis::Sagittal, x).to_owned(),
                expected
            );
        }
    }

    #[test]
    fn test_zero_scan_gives_empty_mask() {
        let assembler = CoarseMaskAssembler::new(&SegmentConfig::default());
        let scan = CtScan::new(Array3::from_elem((6, 8, 8), 100.0)).unwrap();
        let (mask, report) = assembler.assemble(&scan, &CancelToken::new()).unwrap();
        assert_eq!(mask.shape(), (6, 8, 8));
        assert!(mask.is_background());
        assert_eq!(report.iterations, 0);
        assert_eq!(report.budget, 8);
    }

    #[test]
    fn test_cancel_between_slices() {
        let assembler = CoarseMaskAssembler::new(&SegmentConfig::default());
        let scan = CtScan::new(Array3::from_elem((4, 4, 4), 100.0)).unwrap();
        let token = CancelToken::new();
        token.cancel();
        assert_eq!(
            assembler.assemble(&scan, &token).unwrap_err(),
            SegmentError::Cancelled
        );
    }
}
