//! End-to-end pipeline tests with a deterministic in-process detector.

use aerochip::config::{CoordinateSpace, OutputFormat, SensorRegistry};
use aerochip::detection::{BBox, Detection, Reassembler};
use aerochip::imagery::GsdEstimator;
use aerochip::inference::{DetectionModel, LabelMap};
use aerochip::pipeline::{ProcessOptions, ResamplePlan, Submission, detect_image, process_file};
use image::{Rgb, RgbImage};
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

/// Reports the bounding box of bright pixels, but only when they do not
/// touch the chip border.
struct BrightSpotModel {
    chips_seen: usize,
}

impl DetectionModel for BrightSpotModel {
    fn input_size(&self) -> u32 {
        128
    }

    fn infer(
        &mut self,
        chips: &[&RgbImage],
        _min_confidence: f32,
    ) -> aerochip::Result<Vec<Vec<Detection>>> {
        self.chips_seen += chips.len();
        Ok(chips.iter().map(|chip| bright_spot(chip)).collect())
    }
}

fn bright_spot(chip: &RgbImage) -> Vec<Detection> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in chip.enumerate_pixels() {
        if pixel.0[0] > 200 {
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
    }

    let Some((x0, y0, x1, y1)) = bounds else {
        return Vec::new();
    };
    if x0 == 0 || y0 == 0 || x1 + 1 == chip.width() || y1 + 1 == chip.height() {
        return Vec::new();
    }

    #[allow(clippy::cast_precision_loss)]
    let bbox = BBox::new(x0 as f32, y0 as f32, (x1 + 1) as f32, (y1 + 1) as f32);
    vec![Detection::new(bbox, 1, 0.8)]
}

fn scene() -> RgbImage {
    let mut image = RgbImage::new(300, 200);
    for y in 90..110 {
        for x in 140..160 {
            image.put_pixel(x, y, Rgb([255, 255, 255]));
        }
    }
    image
}

fn options(formats: Vec<OutputFormat>) -> ProcessOptions {
    ProcessOptions {
        output_dir: None,
        formats,
        force: true,
        target_gsd_cm: 2.0,
        chip_size: 128,
        chip_overlap: 32,
        batch_size: 3,
        coordinates: CoordinateSpace::Resampled,
        reassembler: Reassembler::default(),
    }
}

fn estimator() -> GsdEstimator {
    GsdEstimator::new(SensorRegistry::builtin())
}

#[test]
fn test_object_seen_by_overlapping_chips_is_reported_once() {
    let mut model = BrightSpotModel { chips_seen: 0 };
    let out = detect_image(
        scene(),
        "scene.png",
        &ResamplePlan::Native,
        &estimator(),
        &mut model,
        &options(vec![OutputFormat::Json]),
        None,
    )
    .unwrap();

    assert_eq!(model.chips_seen, out.plan.grid.len());
    assert!(out.raw_detections >= 1);
    assert_eq!(out.result.len(), 1);
    assert_eq!(out.result.bboxes[0], BBox::new(140.0, 90.0, 160.0, 110.0));
    assert_eq!(out.result.classes, vec![1]);
}

#[test]
fn test_process_file_writes_json_and_csv() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("scene.png");
    scene().save(&input).unwrap();

    let labels = LabelMap::parse_lines("debris\n");
    let mut model = BrightSpotModel { chips_seen: 0 };
    let result = process_file(
        &input,
        dir.path(),
        &ResamplePlan::Native,
        &estimator(),
        &mut model,
        Some(&labels),
        &options(vec![OutputFormat::Json, OutputFormat::Csv]),
        None,
    )
    .unwrap();

    assert_eq!(result.detections, 1);
    assert_eq!(result.outputs.len(), 2);

    let json_path = dir.path().join("scene_inference_results.json");
    let json: Value = serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    let entry = &json["scene.png"];
    let bbox: Vec<f64> = entry["bboxes"][0]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_f64().unwrap())
        .collect();
    assert_eq!(bbox, vec![140.0, 90.0, 160.0, 110.0]);
    assert_eq!(entry["classes"][0], 1);

    let csv = std::fs::read_to_string(dir.path().join("scene_inference_results.csv")).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("image,xmin,ymin,xmax,ymax,class_id,class_name,score")
    );
    let row = lines.next().unwrap();
    assert!(row.starts_with("scene.png,140.00,90.00,160.00,110.00,1,debris,"));
    assert!(lines.next().is_none());

    let archive = dir.path().join("results.zip");
    let count = aerochip::output::write_archive(&archive, &result.outputs).unwrap();
    assert_eq!(count, 2);
    let zip = zip::ZipArchive::new(std::fs::File::open(&archive).unwrap()).unwrap();
    let mut names: Vec<_> = zip.file_names().map(str::to_string).collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "scene_inference_results.csv".to_string(),
            "scene_inference_results.json".to_string()
        ]
    );
}

#[test]
fn test_empty_scene_still_writes_an_entry() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("empty.png");
    RgbImage::new(64, 64).save(&input).unwrap();

    let mut model = BrightSpotModel { chips_seen: 0 };
    let result = process_file(
        &input,
        dir.path(),
        &ResamplePlan::Native,
        &estimator(),
        &mut model,
        None,
        &options(vec![OutputFormat::Json]),
        None,
    )
    .unwrap();
    assert_eq!(result.detections, 0);

    let json: Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("empty_inference_results.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(json["empty.png"]["bboxes"], Value::Array(Vec::new()));
}

#[test]
fn test_unreadable_image_is_a_per_image_error() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("broken.jpg");
    std::fs::write(&input, b"not a jpeg").unwrap();

    let mut model = BrightSpotModel { chips_seen: 0 };
    let err = process_file(
        &input,
        dir.path(),
        &ResamplePlan::Native,
        &estimator(),
        &mut model,
        None,
        &options(vec![OutputFormat::Json]),
        None,
    )
    .unwrap_err();
    assert!(err.is_per_image());
    assert_eq!(model.chips_seen, 0);
    assert!(!Path::new(&dir.path().join("broken_inference_results.json")).exists());
}

#[test]
fn test_submission_without_flight_parameters_is_rejected() {
    let err = Submission::default().validate(&estimator()).unwrap_err();
    assert!(err.is_validation());
}
