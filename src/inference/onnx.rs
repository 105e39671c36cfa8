//! ONNX Runtime detector for TF Object Detection API exports.

use crate::config::{InferenceConfig, InferenceDevice, ModelConfig, TensorNames};
use crate::detection::{BBox, ClassId, Detection};
use crate::error::{Error, Result};
use crate::inference::DetectionModel;
use image::RgbImage;
use ort::session::Session;
use ort::value::Tensor;
use tracing::{debug, info, trace};

/// Object detector backed by an `ort` session.
///
/// Expects a graph with a uint8 `[1, H, W, 3]` image input and the
/// standard post-processed outputs: normalized `[ymin, xmin, ymax, xmax]`
/// boxes, float class ids, scores and `num_detections`.
pub struct OnnxDetector {
    session: Session,
    tensors: TensorNames,
    input_size: u32,
}

impl OnnxDetector {
    /// Build a detector from model and inference configuration.
    pub fn from_config(model: &ModelConfig, inference: &InferenceConfig) -> Result<Self> {
        let builder = Session::builder().map_err(build_error)?;

        let builder = match inference.intra_threads {
            Some(threads) => builder.with_intra_threads(threads).map_err(build_error)?,
            None => builder,
        };

        let (mut builder, device) = configure_device(builder, inference.device)?;

        let session = builder
            .commit_from_file(&model.path)
            .map_err(build_error)?;

        info!(
            "Loaded model: {}, input: {}px, device: {}",
            model.path.display(),
            model.input_size,
            device
        );

        Ok(Self {
            session,
            tensors: model.tensors.clone(),
            input_size: model.input_size,
        })
    }

    fn run_chip(&mut self, chip: &RgbImage, min_confidence: f32) -> Result<Vec<Detection>> {
        let (width, height) = chip.dimensions();
        let shape = [1_usize, height as usize, width as usize, 3];
        let input = Tensor::from_array((shape, chip.as_raw().clone())).map_err(inference_error)?;

        let outputs = self
            .session
            .run(ort::inputs![self.tensors.input.as_str() => input])
            .map_err(inference_error)?;

        let extract = |name: &str| -> Result<Vec<f32>> {
            let value = outputs.get(name).ok_or_else(|| Error::Inference {
                reason: format!("model has no output named '{name}'"),
            })?;
            let (_, data) = value.try_extract_tensor::<f32>().map_err(inference_error)?;
            Ok(data.to_vec())
        };

        let boxes = extract(&self.tensors.boxes)?;
        let classes = extract(&self.tensors.classes)?;
        let scores = extract(&self.tensors.scores)?;
        let count = extract(&self.tensors.num_detections)?
            .first()
            .map_or(scores.len(), |&n| n.max(0.0) as usize);

        Ok(decode_outputs(
            &boxes,
            &classes,
            &scores,
            count,
            width,
            height,
            min_confidence,
        ))
    }
}

impl DetectionModel for OnnxDetector {
    fn input_size(&self) -> u32 {
        self.input_size
    }

    fn infer(&mut self, chips: &[&RgbImage], min_confidence: f32) -> Result<Vec<Vec<Detection>>> {
        // Exported TF OD graphs take a single image per call.
        chips
            .iter()
            .map(|chip| self.run_chip(chip, min_confidence))
            .collect()
    }
}

/// Convert raw graph outputs into chip-local pixel detections.
///
/// Rows past `count`, rows with missing fields and scores below
/// `min_confidence` are dropped. Boxes are clamped to the chip.
pub(crate) fn decode_outputs(
    boxes: &[f32],
    classes: &[f32],
    scores: &[f32],
    count: usize,
    width: u32,
    height: u32,
    min_confidence: f32,
) -> Vec<Detection> {
    let rows = count
        .min(boxes.len() / 4)
        .min(classes.len())
        .min(scores.len());
    let (w, h) = (width as f32, height as f32);

    let detections: Vec<Detection> = (0..rows)
        .filter(|&i| scores[i] >= min_confidence)
        .map(|i| {
            let [ymin, xmin, ymax, xmax] = [
                boxes[i * 4],
                boxes[i * 4 + 1],
                boxes[i * 4 + 2],
                boxes[i * 4 + 3],
            ];
            let bbox = BBox::new(
                (xmin * w).clamp(0.0, w),
                (ymin * h).clamp(0.0, h),
                (xmax * w).clamp(0.0, w),
                (ymax * h).clamp(0.0, h),
            );
            Detection::new(bbox, classes[i].round().max(0.0) as ClassId, scores[i])
        })
        .collect();

    trace!(
        "Decoded {} of {} rows above {}",
        detections.len(),
        rows,
        min_confidence
    );
    detections
}

fn configure_device(
    builder: ort::session::builder::SessionBuilder,
    device: InferenceDevice,
) -> Result<(ort::session::builder::SessionBuilder, &'static str)> {
    match device {
        InferenceDevice::Cpu => {
            debug!("Requested device: CPU");
            Ok((builder, "CPU"))
        }
        #[cfg(feature = "cuda")]
        InferenceDevice::Auto => {
            // silent CPU fallback when CUDA cannot be registered
            let provider = ort::execution_providers::CUDAExecutionProvider::default().build();
            let builder = builder
                .with_execution_providers([provider])
                .map_err(build_error)?;
            Ok((builder, "Auto (CUDA)"))
        }
        #[cfg(feature = "cuda")]
        InferenceDevice::Gpu => {
            let provider = ort::execution_providers::CUDAExecutionProvider::default()
                .build()
                .error_on_failure();
            let builder = builder
                .with_execution_providers([provider])
                .map_err(build_error)?;
            Ok((builder, "CUDA"))
        }
        #[cfg(not(feature = "cuda"))]
        InferenceDevice::Auto => Ok((builder, "CPU")),
        #[cfg(not(feature = "cuda"))]
        InferenceDevice::Gpu => {
            tracing::warn!("GPU requested but aerochip was built without the 'cuda' feature, using CPU");
            Ok((builder, "GPU (fallback to CPU)"))
        }
    }
}

fn build_error(e: impl std::fmt::Display) -> Error {
    Error::ModelBuild {
        reason: e.to_string(),
    }
}

fn inference_error(e: impl std::fmt::Display) -> Error {
    Error::Inference {
        reason: e.to_string(),
    }
}
