//! CLI argument parsing and command handling.

mod args;
mod validators;

pub use args::{
    AnalyzeArgs, Cli, Command, ConfigAction, GeometryArgs, ModelsAction, SensorsAction,
};
