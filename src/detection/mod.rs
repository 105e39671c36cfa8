//! Detection types, suppression and chip reassembly.

mod nms;
mod reassemble;
mod types;

pub use nms::non_max_suppression;
pub use reassemble::Reassembler;
pub use types::{BBox, ChipDetections, ClassId, Detection, ReassembledResult};
