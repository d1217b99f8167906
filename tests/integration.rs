use std::io::Write;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use gemini_unblend::{
    compute_region, select_variant, Error, OpacityMap, OpacityMaps, ProcessOptions,
    WatermarkEngine, WatermarkVariant,
};
use image::{DynamicImage, Rgba, RgbaImage};

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

/// Opacity ramp peaking in the centre of the logo, zero at the border.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn ramp_map(variant: WatermarkVariant) -> Vec<u8> {
    let size = variant.logo_size();
    let half = f32::from(u16::try_from(size).unwrap()) / 2.0;
    let mut data = Vec::with_capacity(variant.map_len());
    for row in 0..size {
        for col in 0..size {
            let dx = (col as f32 + 0.5 - half).abs() / half;
            let dy = (row as f32 + 0.5 - half).abs() / half;
            let d = dx.max(dy);
            data.push(((1.0 - d) * 160.0).round() as u8);
        }
    }
    data
}

fn write_assets(dir: &Path, variants: &[WatermarkVariant]) {
    for &variant in variants {
        let name = gemini_unblend::opacity::asset_name(variant);
        std::fs::write(dir.join(name), gzip(&ramp_map(variant))).unwrap();
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn watermark(img: &mut RgbaImage, map: &[u8], variant: WatermarkVariant) {
    let region = compute_region(img.width(), img.height(), variant);
    let size = variant.logo_size();
    for row in 0..size {
        for col in 0..size {
            let a = f32::from(map[(row * size + col) as usize]);
            let px = img.get_pixel_mut(region.x as u32 + col, region.y as u32 + row);
            for channel in &mut px.0[..3] {
                let o = f32::from(*channel);
                *channel = (o * (255.0 - a) / 255.0 + a).round() as u8;
            }
        }
    }
}

fn gradient(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            u8::try_from(x % 200).unwrap(),
            u8::try_from(y % 150).unwrap(),
            90,
            255,
        ])
    })
}

#[test]
fn engine_loads_gzip_assets_from_dir() {
    let dir = tempfile::tempdir().unwrap();
    write_assets(dir.path(), &[WatermarkVariant::Small, WatermarkVariant::Large]);

    let engine = WatermarkEngine::from_dir(dir.path()).unwrap();
    let small = engine.maps().get(WatermarkVariant::Small).unwrap();
    assert_eq!(small.as_bytes(), ramp_map(WatermarkVariant::Small).as_slice());
    assert!(engine.maps().get(WatermarkVariant::Large).is_some());
}

#[test]
fn engine_from_buffers_accepts_raw_and_gzip() {
    let small = ramp_map(WatermarkVariant::Small);
    let large = gzip(&ramp_map(WatermarkVariant::Large));
    let engine = WatermarkEngine::from_buffers(&small, &large).unwrap();
    assert_eq!(
        engine.maps().get(WatermarkVariant::Large).unwrap().as_bytes(),
        ramp_map(WatermarkVariant::Large).as_slice()
    );
}

#[test]
fn remove_recovers_watermarked_image() {
    let map = ramp_map(WatermarkVariant::Small);
    let engine = WatermarkEngine::from_buffers(&map, &ramp_map(WatermarkVariant::Large)).unwrap();

    let original = gradient(640, 480);
    let mut img = original.clone();
    watermark(&mut img, &map, WatermarkVariant::Small);
    assert_ne!(img, original);

    engine.remove(&mut img, None).unwrap();

    // Peak coverage is 160, so one rounding step costs at most 255/95 < 3.
    for (got, want) in img.pixels().zip(original.pixels()) {
        for ch in 0..3 {
            assert!(got[ch].abs_diff(want[ch]) <= 2, "{got:?} vs {want:?}");
        }
        assert_eq!(got[3], want[3]);
    }
}

#[test]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn remove_large_variant_on_large_image() {
    let map = ramp_map(WatermarkVariant::Large);
    let engine = WatermarkEngine::from_buffers(&ramp_map(WatermarkVariant::Small), &map).unwrap();

    let original = gradient(1280, 1100);
    let mut img = original.clone();
    watermark(&mut img, &map, WatermarkVariant::Large);

    let region = engine.remove(&mut img, None).unwrap();
    assert_eq!(region, compute_region(1280, 1100, WatermarkVariant::Large));
    let (cx, cy) = (region.x as u32 + 48, region.y as u32 + 48);
    for ch in 0..3 {
        assert!(img.get_pixel(cx, cy)[ch].abs_diff(original.get_pixel(cx, cy)[ch]) <= 2);
    }
}

#[test]
fn missing_large_map_leaves_image_untouched() {
    let small = OpacityMap::from_bytes(
        WatermarkVariant::Small,
        ramp_map(WatermarkVariant::Small),
    )
    .unwrap();
    let engine = WatermarkEngine::new(OpacityMaps::new(Some(small), None));

    let mut img = gradient(2048, 2048);
    let before = img.clone();
    let err = engine.remove(&mut img, None).unwrap_err();
    assert!(matches!(err, Error::MissingOpacityMap(WatermarkVariant::Large)));
    assert_eq!(img, before);
}

#[test]
fn end_to_end_100x100_with_zero_map() {
    let engine = WatermarkEngine::from_buffers(&[0; 48 * 48], &[0; 96 * 96]).unwrap();
    let mut img = RgbaImage::from_pixel(100, 100, Rgba([100, 100, 100, 255]));
    let before = img.clone();

    assert_eq!(select_variant(100, 100), WatermarkVariant::Small);
    let region = engine.remove(&mut img, None).unwrap();
    assert_eq!((region.x, region.y, region.width, region.height), (20, 20, 48, 48));
    assert_eq!(img, before);
}

#[test]
fn process_file_writes_restored_png_with_alpha() {
    let dir = tempfile::tempdir().unwrap();
    write_assets(dir.path(), &[WatermarkVariant::Small]);
    let engine = WatermarkEngine::from_dir(dir.path()).unwrap();

    let map = ramp_map(WatermarkVariant::Small);
    let mut original = gradient(300, 200);
    original.put_pixel(240, 140, Rgba([10, 20, 30, 128]));
    let mut marked = original.clone();
    watermark(&mut marked, &map, WatermarkVariant::Small);

    let input = dir.path().join("in.png");
    let output = dir.path().join("nested").join("out.png");
    marked.save(&input).unwrap();

    let result = engine.process_file(&input, &output, &ProcessOptions::default());
    assert!(result.success, "{}", result.message);
    assert!(!result.skipped);
    assert_eq!(result.variant, Some(WatermarkVariant::Small));

    let restored = image::open(&output).unwrap().to_rgba8();
    assert_eq!(restored.dimensions(), (300, 200));
    assert_eq!(restored.get_pixel(240, 140)[3], 128);
    for (got, want) in restored.pixels().zip(original.pixels()) {
        for ch in 0..3 {
            assert!(got[ch].abs_diff(want[ch]) <= 2);
        }
    }
}

#[test]
fn process_file_skips_image_smaller_than_footprint() {
    let engine = WatermarkEngine::from_buffers(&[0; 48 * 48], &[0; 96 * 96]).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("tiny.png");
    let output = dir.path().join("tiny_cleaned.png");
    RgbaImage::new(50, 50).save(&input).unwrap();

    let result = engine.process_file(&input, &output, &ProcessOptions::default());
    assert!(result.skipped);
    assert!(result.success);
    assert!(!output.exists());
}

#[test]
fn process_file_fails_without_matching_map() {
    let dir = tempfile::tempdir().unwrap();
    write_assets(dir.path(), &[WatermarkVariant::Small]);
    let engine = WatermarkEngine::from_dir(dir.path()).unwrap();

    let input = dir.path().join("big.png");
    let output = dir.path().join("big_cleaned.png");
    RgbaImage::new(1100, 1100).save(&input).unwrap();

    let result = engine.process_file(&input, &output, &ProcessOptions::default());
    assert!(!result.success);
    assert!(!result.skipped);
    assert!(result.message.contains("96x96"));
    assert!(!output.exists());

    // Forcing the small variant works on the same image.
    let opts = ProcessOptions {
        force_variant: Some(WatermarkVariant::Small),
        ..ProcessOptions::default()
    };
    let result = engine.process_file(&input, &output, &opts);
    assert!(result.success, "{}", result.message);
    assert!(output.exists());
}

#[test]
fn process_file_reports_unreadable_input() {
    let engine = WatermarkEngine::from_buffers(&[0; 48 * 48], &[0; 96 * 96]).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.png");
    std::fs::write(&input, b"not an image").unwrap();

    let result = engine.process_file(&input, &dir.path().join("o.png"), &ProcessOptions::default());
    assert!(!result.success);
    assert!(result.message.starts_with("Failed to load"));
}

#[test]
fn process_directory_handles_every_supported_file() {
    let assets = tempfile::tempdir().unwrap();
    write_assets(assets.path(), &[WatermarkVariant::Small, WatermarkVariant::Large]);
    let engine = WatermarkEngine::from_dir(assets.path()).unwrap();

    let input_dir = tempfile::tempdir().unwrap();
    let output_root = tempfile::tempdir().unwrap();
    let output_dir = output_root.path().join("out");

    gradient(200, 200).save(input_dir.path().join("a.png")).unwrap();
    DynamicImage::from(gradient(320, 240))
        .to_rgb8()
        .save(input_dir.path().join("b.bmp"))
        .unwrap();
    RgbaImage::new(20, 20).save(input_dir.path().join("c.png")).unwrap();
    std::fs::write(input_dir.path().join("notes.txt"), "ignore me").unwrap();

    let mut results =
        engine.process_directory(input_dir.path(), &output_dir, &ProcessOptions::default());
    results.sort_by(|a, b| a.path.cmp(&b.path));

    assert_eq!(results.len(), 3);
    assert!(results[0].success && !results[0].skipped);
    assert!(results[1].success && !results[1].skipped);
    assert!(results[2].skipped);
    assert!(output_dir.join("a.png").exists());
    assert!(output_dir.join("b.bmp").exists());
    assert!(!output_dir.join("c.png").exists());
    assert!(!output_dir.join("notes.txt").exists());
}

#[test]
fn process_directory_reports_missing_input_dir() {
    let engine = WatermarkEngine::from_buffers(&[0; 48 * 48], &[0; 96 * 96]).unwrap();
    let root = tempfile::tempdir().unwrap();
    let results = engine.process_directory(
        &root.path().join("nope"),
        &root.path().join("out"),
        &ProcessOptions::default(),
    );
    assert_eq!(results.len(), 1);
    assert!(!results[0].success);
}
