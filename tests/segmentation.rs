use image::{Rgb, RgbImage};
use image_watershed::config::ChannelOrder;
use image_watershed::decode::encode_rgba;
use image_watershed::diagnostics::{DumpObserver, LabelColoring};
use image_watershed::{
    MarkerSeedStrategy, RIDGE, SegmentationConfig, SegmentationError, Segmenter, segment,
    segment_rgba,
};

fn squares(size: u32, origins: &[(u32, u32)], side: u32) -> RgbImage {
    RgbImage::from_fn(size, size, |x, y| {
        let inside = origins
            .iter()
            .any(|&(ox, oy)| (ox..ox + side).contains(&x) && (oy..oy + side).contains(&y));
        if inside {
            Rgb([255, 255, 255])
        } else {
            Rgb([0, 0, 0])
        }
    })
}

fn two_separated_squares() -> RgbImage {
    squares(100, &[(20, 20), (65, 60)], 10)
}

#[test]
fn two_separated_squares_yield_two_basins() {
    let segmentation = Segmenter::new(SegmentationConfig::default())
        .unwrap()
        .run(&two_separated_squares())
        .unwrap();

    assert_eq!(segmentation.marker_count, 2);
    let areas = segmentation.labels.basin_areas();
    assert_eq!(areas.keys().copied().collect::<Vec<_>>(), vec![1, 2]);

    let first = segmentation.labels.get(25, 25);
    let second = segmentation.labels.get(70, 65);
    assert!(first > 0 && second > 0 && first != second);
}

#[test]
fn labels_stay_in_legal_range() {
    let image = squares(80, &[(5, 5), (30, 8), (50, 50), (10, 55)], 14);
    let segmentation = Segmenter::new(SegmentationConfig::default())
        .unwrap()
        .run(&image)
        .unwrap();

    let k = segmentation.labels.max_label();
    assert!(k >= 1);
    assert!(
        segmentation
            .labels
            .as_slice()
            .iter()
            .all(|&l| l == 0 || l == RIDGE || (1..=k).contains(&l))
    );
}

#[test]
fn segmentation_is_deterministic() {
    let image = squares(90, &[(10, 10), (22, 14), (60, 40)], 12);
    let config = SegmentationConfig::default();

    let first = segment(&image, &config).unwrap();
    let second = segment(&image, &config).unwrap();
    assert_eq!(first.as_raw(), second.as_raw());
}

#[test]
fn overlay_alpha_is_one_of_two_constants() {
    let image = squares(90, &[(10, 10), (22, 14), (60, 40)], 12);
    let config = SegmentationConfig::default();
    let overlay = segment(&image, &config).unwrap();

    let style = config.overlay;
    for pixel in overlay.pixels() {
        let [r, g, b, a] = pixel.0;
        if a == style.ridge_alpha {
            assert_eq!([r, g, b], style.ridge_color);
        } else {
            assert_eq!(a, style.background_alpha);
            assert_eq!([r, g, b], [0, 0, 0]);
        }
    }
}

#[test]
fn constant_image_is_degenerate() {
    let gray = RgbImage::from_pixel(128, 128, Rgb([128, 128, 128]));
    let result = segment(&gray, &SegmentationConfig::default());
    assert!(
        matches!(result, Err(SegmentationError::DegenerateInput { .. })),
        "{result:?}"
    );
}

#[test]
fn short_buffer_is_a_decode_error() {
    let (width, height) = (32, 24);
    let bytes = vec![0u8; (width * height * 4 - 1) as usize];
    let result = segment_rgba(&bytes, width, height, &SegmentationConfig::default());
    assert!(
        matches!(result, Err(SegmentationError::Decode { .. })),
        "{result:?}"
    );
}

#[test]
fn raw_buffers_segment_like_decoded_images() {
    let image = two_separated_squares();
    let config = SegmentationConfig::default();
    let bytes = encode_rgba(&image, 255);

    let from_bytes = segment_rgba(&bytes, 100, 100, &config).unwrap();
    let from_image = segment(&image, &config).unwrap();
    assert_eq!(from_bytes, from_image);
}

#[test]
fn bgra_buffers_are_thresholded_on_the_red_channel() {
    // Red squares on a blue background: only the red channel separates them.
    let image = RgbImage::from_fn(60, 60, |x, y| {
        if (10..30).contains(&x) && (10..30).contains(&y) {
            Rgb([250, 0, 120])
        } else {
            Rgb([10, 0, 120])
        }
    });
    let bgra: Vec<u8> = image
        .pixels()
        .flat_map(|p| [p.0[2], p.0[1], p.0[0], 255])
        .collect();

    let config = SegmentationConfig {
        channel_order: ChannelOrder::Bgra,
        ..Default::default()
    };
    let segmentation = Segmenter::new(config).unwrap().run_rgba(&bgra, 60, 60).unwrap();
    assert_eq!(segmentation.marker_count, 1);
}

#[test]
fn speckle_only_image_has_no_markers_and_no_ridges() {
    let image = RgbImage::from_fn(40, 40, |x, y| {
        if x % 7 == 3 && y % 9 == 4 {
            Rgb([255, 255, 255])
        } else {
            Rgb([0, 0, 0])
        }
    });
    // Without blur every speck is a single pixel, which the opening removes.
    let config = SegmentationConfig {
        blur_kernel_size: 1,
        ..Default::default()
    };
    let segmentation = Segmenter::new(config).unwrap().run(&image).unwrap();

    assert_eq!(segmentation.marker_count, 0);
    assert_eq!(segmentation.labels.ridge_count(), 0);
    assert!(segmentation.overlay.pixels().all(|p| p.0[3] == 128));
}

#[test]
fn local_maxima_strategy_seeds_each_square() {
    let config = SegmentationConfig {
        marker_seed_strategy: MarkerSeedStrategy::LocalMaxima { min_distance: 5 },
        ..Default::default()
    };
    let segmentation = Segmenter::new(config)
        .unwrap()
        .run(&squares(100, &[(10, 10), (60, 55)], 20))
        .unwrap();
    assert_eq!(segmentation.marker_count, 2);
}

#[test]
fn dump_observer_records_every_stage() {
    let dir = tempfile::tempdir().unwrap();
    let observer = DumpObserver::new(dir.path(), LabelColoring::Random { seed: 1 });
    let mut segmenter = Segmenter::new(SegmentationConfig::default())
        .unwrap()
        .with_observer(observer);
    segmenter.run(&two_separated_squares()).unwrap();

    let written = segmenter.into_observer().written().to_vec();
    assert_eq!(written.len(), 12);
    assert!(dir.path().join("watershed.png").exists());
    assert!(dir.path().join("distance_transform.png").exists());
    assert!(dir.path().join("overlay.png").exists());
}

#[test]
fn dumped_label_maps_use_the_configured_ridge_color() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = SegmentationConfig::default();
    config.overlay.ridge_color = [255, 0, 0];
    let observer = DumpObserver::new(dir.path(), LabelColoring::Contrasting);
    let mut segmenter = Segmenter::new(config).unwrap().with_observer(observer);
    let segmentation = segmenter.run(&two_separated_squares()).unwrap();

    let labels = &segmentation.labels;
    let (x, y) = (0..labels.height())
        .flat_map(|y| (0..labels.width()).map(move |x| (x, y)))
        .find(|&(x, y)| labels.get(x, y) == RIDGE)
        .expect("two basins meet somewhere");

    for name in ["watershed.png", "watershed_on_image.png"] {
        let dumped = image::open(dir.path().join(name)).unwrap().to_rgb8();
        assert_eq!(dumped.get_pixel(x, y), &Rgb([255, 0, 0]), "{name}");
    }
}
