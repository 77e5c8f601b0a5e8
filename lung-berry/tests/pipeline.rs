use itertools::iproduct;
use lung_berry::post_proc::{ComponentPostprocessor, LungSelection};
use lung_berry::prelude::*;
use ndarray::Array3;

fn init_logger() {
    // 多个测试共用一个进程, 重复初始化的错误可以忽略.
    let _ = simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Debug)
        .init();
}

const PHANTOM_SHAPE: Idx3d = (24, 40, 40);

fn in_body((z, y, x): Idx3d) -> bool {
    (4..20).contains(&z) && (4..36).contains(&y) && (4..36).contains(&x)
}

fn in_cavity((z, y, x): Idx3d) -> bool {
    (8..16).contains(&z)
        && (10..30).contains(&y)
        && ((8..18).contains(&x) || (22..32).contains(&x))
}

/// 距某个低亮区域体素至多一格 (含对角).
fn near_cavity((z, y, x): Idx3d) -> bool {
    iproduct!(-1isize..=1, -1isize..=1, -1isize..=1).any(|(dz, dy, dx)| {
        match (
            z.checked_add_signed(dz),
            y.checked_add_signed(dy),
            x.checked_add_signed(dx),
        ) {
            (Some(z), Some(y), Some(x)) => in_cavity((z, y, x)),
            _ => false,
        }
    })
}

/// 空气背景中, 一个被高亮外壳包住的体, 内部有两块左右对称、互不相连的低亮区域.
fn phantom() -> CtScan {
    let raw = Array3::from_shape_fn(PHANTOM_SHAPE, |pos| match (in_body(pos), in_cavity(pos)) {
        (true, false) => 1200i16,
        (true, true) => -800,
        _ => -1000,
    });
    CtScan::from_array(&raw.view()).unwrap()
}

/// 在 `phantom` 上能找到左右肺的配置: 空洞填充不扩张, 且不做断层修复.
fn lung_config() -> SegmentConfig {
    SegmentConfig {
        hole_fill_kernel: 1,
        ..Default::default()
    }
    .with_repair_budget(0)
}

#[test]
fn zero_volume_gives_empty_mask() {
    init_logger();
    let raw = Array3::<i16>::zeros((10, 16, 16));
    let scan = CtScan::from_array(&raw.view()).unwrap();

    let seg = segment_lungs(&scan).unwrap();
    assert_eq!(seg.mask.shape(), scan.shape());
    assert!(seg.mask.is_background());
    assert_eq!(seg.report.components_found, 0);
    assert_eq!(seg.report.selection, LungSelection::NotFound);
    assert!(!seg.report.lung_found());
    assert_eq!(seg.into_lung_mask(), Err(SegmentError::NoLungFound));
}

#[test]
fn empty_volume_is_rejected() {
    let raw = Array3::<f32>::zeros((0, 4, 4));
    assert_eq!(
        CtScan::new(raw).unwrap_err(),
        SegmentError::EmptyVolume((0, 4, 4))
    );
}

#[test]
fn output_is_binary_and_keeps_shape() {
    init_logger();
    let scan = phantom();
    let configs = [
        lung_config(),
        SegmentConfig::default(),
        SegmentConfig::default().with_axes(AnatomicalAxis::Axial, AnatomicalAxis::Coronal),
        SegmentConfig::default()
            .with_connectivity(Connectivity::Full)
            .with_repair_budget(2),
    ];

    for config in configs {
        let segmenter = LungSegmenter::new(config).unwrap();
        let (coarse, _) = segmenter.coarse_mask(&scan, &CancelToken::new()).unwrap();
        assert_eq!(coarse.shape(), scan.shape());
        assert!(coarse.is_binary());

        let seg = segmenter.segment(&scan).unwrap();
        assert_eq!(seg.mask.shape(), scan.shape());
        assert!(seg.mask.is_binary());
        assert_eq!(seg.report.lung_found(), !seg.mask.is_background());
        assert_eq!(seg.mask.count(), seg.report.selection.voxels());
        assert!(seg.report.repair_iterations <= seg.report.repair_budget);
        assert_eq!(
            seg.report.slices_repaired.len(),
            seg.report.repair_iterations
        );
        assert!(seg.report.slices_repaired_count() <= seg.report.repair_iterations);

        // 最终掩膜只是粗掩膜的一部分.
        let raw = seg.mask.data();
        assert!(raw
            .indexed_iter()
            .all(|(pos, &p)| p == MASK_BACKGROUND || coarse[pos] == MASK_FOREGROUND));

        // 对最终掩膜再做一次后处理, 结果不变.
        let again = ComponentPostprocessor::new(segmenter.config()).process(&seg.mask);
        assert_eq!(again.mask, seg.mask);
        assert_eq!(again.selection.is_found(), seg.report.lung_found());
    }
}

#[test]
fn phantom_cavities_are_found_as_pair() {
    init_logger();
    let segmenter = LungSegmenter::new(lung_config()).unwrap();
    let seg = segmenter.segment(&phantom()).unwrap();

    assert!(seg.report.lung_found());
    assert!(seg.report.lung_pair_detected());
    assert!(!seg.mask.is_background());
    assert_eq!(seg.report.components_found, 2);
    assert_eq!(seg.report.repair_budget, 0);
    assert_eq!(seg.report.repair_iterations, 0);
    assert_eq!(seg.report.slices_repaired_count(), 0);

    // 掩膜只落在两块低亮区域上 (允许一格偏移), 且左右各一个连通域.
    assert!(seg
        .mask
        .data()
        .indexed_iter()
        .all(|(pos, &p)| p == MASK_BACKGROUND || near_cavity(pos)));
    let LungSelection::Pair([a, b]) = seg.report.selection else {
        panic!("expected a pair, got {:?}", seg.report.selection);
    };
    let (left, right) = if a.lower.2 < b.lower.2 { (a, b) } else { (b, a) };
    assert!(left.upper.2 < 20 && right.lower.2 >= 20);
    assert_eq!(a.voxels, b.voxels);
    assert_eq!(seg.mask.count(), a.voxels + b.voxels);

    let mask = seg.into_lung_mask().unwrap();
    assert_eq!(mask.shape(), PHANTOM_SHAPE);
}

#[test]
fn surface_voxels_never_survive() {
    let segmenter = LungSegmenter::new(lung_config()).unwrap();
    let seg = segmenter.segment(&phantom()).unwrap();
    assert!(!seg.mask.is_background());
    let (z, y, x) = seg.mask.shape();
    for axis in [
        AnatomicalAxis::Axial,
        AnatomicalAxis::Coronal,
        AnatomicalAxis::Sagittal,
    ] {
        let last = seg.mask.len_along(axis) - 1;
        assert!(seg.mask.slice_at(axis, 0).is_background());
        assert!(seg.mask.slice_at(axis, last).is_background());
    }
    assert_eq!(seg.mask.size(), z * y * x);
}

#[test]
fn cancelled_run_returns_error() {
    let scan = phantom();
    let token = CancelToken::new();
    token.cancel();
    let ans = LungSegmenter::default().segment_with_cancel(&scan, &token);
    assert_eq!(ans.unwrap_err(), SegmentError::Cancelled);
}

#[test]
fn symmetric_cuboids_are_both_kept() {
    let mut coarse = LungMask::zeros((16, 24, 24));
    for z in 4..12 {
        for y in 4..20 {
            for x in (3..10).chain(14..21) {
                coarse[(z, y, x)] = MASK_FOREGROUND;
            }
        }
    }

    let post = ComponentPostprocessor::new(&SegmentConfig::default()).process(&coarse);
    assert_eq!(post.components_found, 2);
    assert!(post.selection.is_pair());
    assert_eq!(post.mask, coarse);
}

#[test]
fn masked_scan_keeps_lung_voxels_only() {
    let raw = Array3::from_shape_fn((3, 4, 5), |(z, y, x)| (z * 100 + y * 10 + x) as f32 + 1.0);
    let scan = CtScan::new(raw).unwrap();
    let mut mask = LungMask::zeros(scan.shape());
    mask[(1, 2, 3)] = MASK_FOREGROUND;
    mask[(2, 0, 0)] = MASK_FOREGROUND;

    let masked = scan.masked(&mask).unwrap();
    assert_eq!(masked[(1, 2, 3)], 124.0);
    assert_eq!(masked[(2, 0, 0)], 201.0);
    assert_eq!(masked.iter().filter(|v| **v != 0.0).count(), 2);

    let other = LungMask::zeros((3, 4, 6));
    assert!(matches!(
        scan.masked(&other),
        Err(SegmentError::ShapeMismatch { .. })
    ));
}

#[test]
fn invalid_window_is_rejected() {
    assert!(matches!(
        HuWindow::new(700.0, 100.0),
        Err(SegmentError::InvalidRange { .. })
    ));

    let config = SegmentConfig {
        median_kernel: 6,
        ..Default::default()
    };
    assert!(matches!(
        LungSegmenter::new(config),
        Err(SegmentError::InvalidConfig(_))
    ));
}
