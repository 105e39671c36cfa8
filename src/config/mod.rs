//! Configuration loading and management.

mod file;
mod sensors;
mod types;
mod validate;

pub use file::{
    CONFIG_ENV_VAR, config_dir, config_file_path, load_config_file, load_default_config,
    save_config, save_default_config,
};
pub use sensors::{SensorProfile, SensorRegistry};
pub use types::{
    Config, CoordinateSpace, DefaultsConfig, InferenceConfig, InferenceDevice, ModelConfig,
    OutputFormat, TensorNames,
};
pub use validate::{get_model, validate_config, validate_model_config};
