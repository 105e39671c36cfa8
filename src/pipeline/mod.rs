//! Processing pipeline components.

mod coordinator;
mod processor;
mod submission;

pub use coordinator::{
    ProcessCheck, ProcessOptions, check_output_collisions, collect_input_files, is_image_file, output_dir_for,
    output_path_for, should_process,
};
pub use processor::{
    ImageDetections, ImagePlan, ProcessResult, detect_image, plan_image, process_file,
};
pub use submission::{ResamplePlan, Submission};
