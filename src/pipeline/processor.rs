//! Single image processing pipeline.

use crate::config::{CoordinateSpace, OutputFormat};
use crate::detection::{ChipDetections, ReassembledResult};
use crate::error::{Error, Result};
use crate::imagery::{
    Chip, ChipPool, GsdEstimate, GsdEstimator, TileGrid, decode_image_file, resample,
    resampled_dimensions, tile,
};
use crate::inference::{DetectionModel, LabelMap};
use crate::output::{CsvWriter, JsonResultWriter, OutputWriter, progress, records};
use crate::pipeline::{ProcessOptions, ResamplePlan, output_path_for};
use image::RgbImage;
use indicatif::MultiProgress;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Geometry an image goes through before inference.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePlan {
    /// Decoded dimensions.
    pub native_dimensions: (u32, u32),
    /// Estimated GSD, absent when resampling is skipped.
    pub gsd: Option<GsdEstimate>,
    /// Dimensions after resampling.
    pub working_dimensions: (u32, u32),
    /// Chip grid over the working image.
    pub grid: TileGrid,
}

impl ImagePlan {
    /// Per-axis factor from native to working pixels.
    pub fn scale(&self) -> (f32, f32) {
        let (nw, nh) = self.native_dimensions;
        let (ww, wh) = self.working_dimensions;
        (ww as f32 / nw as f32, wh as f32 / nh as f32)
    }
}

/// Work out GSD, resampled size and chip grid without touching pixels.
pub fn plan_image(
    width: u32,
    height: u32,
    plan: &ResamplePlan,
    estimator: &GsdEstimator,
    options: &ProcessOptions,
) -> Result<ImagePlan> {
    let (gsd, working_dimensions) = match plan {
        ResamplePlan::Native => {
            if width == 0 || height == 0 {
                return Err(Error::InvalidDimension { width, height });
            }
            (None, (width, height))
        }
        ResamplePlan::ToGsd(flight) => {
            let gsd = estimator.estimate_for(flight, width, height)?;
            let dims = resampled_dimensions(width, height, gsd.effective(), options.target_gsd_cm)?;
            (Some(gsd), dims)
        }
    };

    let grid = tile(
        working_dimensions.0,
        working_dimensions.1,
        options.chip_size,
        options.chip_overlap,
    )?;

    Ok(ImagePlan {
        native_dimensions: (width, height),
        gsd,
        working_dimensions,
        grid,
    })
}

/// Detections for one image plus the geometry they were produced with.
#[derive(Debug, Clone)]
pub struct ImageDetections {
    /// Deduplicated detections in the requested coordinate space.
    pub result: ReassembledResult,
    /// Geometry used for chipping.
    pub plan: ImagePlan,
    /// Detections returned by the model before filtering and NMS.
    pub raw_detections: usize,
}

/// Run estimate → resample → tile → infer → reassemble on one decoded image.
///
/// All chips are inferred before reassembly starts. The chip buffers are
/// pooled per image and freed when this returns.
#[allow(clippy::too_many_arguments)]
pub fn detect_image<M: DetectionModel + ?Sized>(
    image: RgbImage,
    source_id: &str,
    plan: &ResamplePlan,
    estimator: &GsdEstimator,
    model: &mut M,
    options: &ProcessOptions,
    multi_progress: Option<&MultiProgress>,
) -> Result<ImageDetections> {
    let (width, height) = image.dimensions();
    let image_plan = plan_image(width, height, plan, estimator, options)?;

    let working = match image_plan.gsd {
        Some(gsd) => {
            info!(
                "{}: GSD {:.3} cm/px (height {:.3}, width {:.3}), resampling to {:.3} cm/px",
                source_id,
                gsd.effective(),
                gsd.height_cm_per_px,
                gsd.width_cm_per_px,
                options.target_gsd_cm
            );
            let resampled = resample(image, gsd.effective(), options.target_gsd_cm)?;
            debug!(
                "{}: {}x{} -> {}x{}",
                source_id,
                width,
                height,
                resampled.width(),
                resampled.height()
            );
            resampled
        }
        None => {
            debug!("{}: resampling skipped, chipping at {}x{}", source_id, width, height);
            image
        }
    };

    if working.dimensions() != image_plan.working_dimensions {
        return Err(Error::GeometryInvariant {
            message: format!(
                "resampled image is {:?}, planned {:?}",
                working.dimensions(),
                image_plan.working_dimensions
            ),
        });
    }

    let grid = &image_plan.grid;
    info!(
        "{}: {} chips ({} x {}) of {}x{} px",
        source_id,
        grid.len(),
        grid.columns(),
        grid.rows(),
        grid.chip_dimensions().0,
        grid.chip_dimensions().1
    );

    let chip_progress = multi_progress.and_then(|mp| {
        progress::create_chip_progress(grid.len(), source_id, true).map(|pb| mp.add(pb))
    });

    let min_confidence = options.reassembler.min_confidence();
    let windows: Vec<_> = grid.iter().collect();
    let mut pool = ChipPool::new();
    let mut chip_detections = Vec::with_capacity(windows.len());

    for batch in windows.chunks(options.batch_size.max(1)) {
        let chips = batch
            .iter()
            .map(|&window| {
                Ok(Chip {
                    source_id: source_id.to_string(),
                    window,
                    pixels: pool.cut(&working, window)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let inputs: Vec<&RgbImage> = chips.iter().map(|c| &c.pixels).collect();
        let outputs = model.infer(&inputs, min_confidence)?;
        if outputs.len() != chips.len() {
            return Err(Error::Inference {
                reason: format!(
                    "model returned {} results for {} chips",
                    outputs.len(),
                    chips.len()
                ),
            });
        }

        for (chip, detections) in chips.into_iter().zip(outputs) {
            chip_detections.push(ChipDetections {
                source_id: chip.source_id,
                window: chip.window,
                detections,
            });
            pool.release(chip.pixels);
        }
        progress::inc_progress(chip_progress.as_ref(), batch.len());
    }

    if let (Some(mp), Some(pb)) = (multi_progress, chip_progress) {
        pb.finish_and_clear();
        mp.remove(&pb);
    }
    drop(working);
    debug!(
        "{}: {} chip buffers allocated for {} chips",
        source_id,
        pool.allocations(),
        windows.len()
    );

    let raw_detections: usize = chip_detections.iter().map(|c| c.detections.len()).sum();
    let result = options
        .reassembler
        .reassemble(chip_detections)
        .remove(source_id)
        .unwrap_or_default();

    let result = match options.coordinates {
        CoordinateSpace::Resampled => result,
        CoordinateSpace::Native => {
            let (sx, sy) = image_plan.scale();
            result.unscaled(sx, sy)
        }
    };

    Ok(ImageDetections {
        result,
        plan: image_plan,
        raw_detections,
    })
}

/// Process a single image file and write detection results.
#[allow(clippy::too_many_arguments)]
pub fn process_file<M: DetectionModel + ?Sized>(
    input_path: &Path,
    output_dir: &Path,
    plan: &ResamplePlan,
    estimator: &GsdEstimator,
    model: &mut M,
    labels: Option<&LabelMap>,
    options: &ProcessOptions,
    multi_progress: Option<&MultiProgress>,
) -> Result<ProcessResult> {
    let start_time = Instant::now();
    info!("Processing: {}", input_path.display());

    let decoded = decode_image_file(input_path)?;
    debug!(
        "Decoded {:?} image {}x{}",
        decoded.format,
        decoded.pixels.width(),
        decoded.pixels.height()
    );

    let image_name = input_path
        .file_name()
        .map_or_else(|| "image".to_string(), |n| n.to_string_lossy().into_owned());

    let detections = detect_image(
        decoded.pixels,
        &image_name,
        plan,
        estimator,
        model,
        options,
        multi_progress,
    )?;

    info!(
        "Found {} detections ({} raw) above {:.1}% confidence",
        detections.result.len(),
        detections.raw_detections,
        options.reassembler.min_confidence() * 100.0
    );

    let mut outputs = Vec::with_capacity(options.formats.len());
    for format in &options.formats {
        outputs.push(write_output(
            input_path,
            output_dir,
            *format,
            &image_name,
            &detections.result,
            labels,
        )?);
    }

    let duration_secs = start_time.elapsed().as_secs_f64();
    let chips = detections.plan.grid.len();
    #[allow(clippy::cast_precision_loss)]
    let chips_per_sec = if duration_secs > 0.0 {
        chips as f64 / duration_secs
    } else {
        0.0
    };
    info!(
        "Processed {} chips in {:.2}s ({:.1} chips/sec)",
        chips, duration_secs, chips_per_sec
    );

    Ok(ProcessResult {
        detections: detections.result.len(),
        chips,
        duration_secs,
        outputs,
    })
}

/// Write detections for one image in the given format.
fn write_output(
    input_path: &Path,
    output_dir: &Path,
    format: OutputFormat,
    image_name: &str,
    result: &ReassembledResult,
    labels: Option<&LabelMap>,
) -> Result<PathBuf> {
    let output_path = output_path_for(input_path, output_dir, format);
    debug!("Writing {} output: {}", format, output_path.display());

    let mut writer: Box<dyn OutputWriter> = match format {
        OutputFormat::Json => Box::new(JsonResultWriter::new(&output_path, image_name)),
        OutputFormat::Csv => Box::new(CsvWriter::new(&output_path)?),
    };

    writer.write_header()?;
    for record in records(image_name, result, labels) {
        writer.write_detection(&record)?;
    }
    writer.finalize()?;

    Ok(output_path)
}

/// Result of processing a single image.
#[derive(Debug)]
pub struct ProcessResult {
    /// Number of detections after NMS.
    pub detections: usize,
    /// Number of chips inferred.
    pub chips: usize,
    /// Processing duration in seconds.
    pub duration_secs: f64,
    /// Files written for this image.
    pub outputs: Vec<PathBuf>,
}
