//! Aerochip - GSD-normalized chipping and object detection for aerial imagery.
//!
//! Images are resampled to a common ground sampling distance, cut into
//! overlapping model-sized chips, run through an ONNX detector and the
//! per-chip detections are merged back into image coordinates.

#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod constants;
pub mod detection;
pub mod error;
pub mod imagery;
pub mod inference;
pub mod output;
pub mod pipeline;

use clap::Parser;
use cli::{AnalyzeArgs, Cli, Command, GeometryArgs};
use config::{
    Config, DefaultsConfig, InferenceDevice, ModelConfig, SensorRegistry, TensorNames,
    config_file_path, load_default_config, save_default_config, validate_config,
    validate_model_config,
};
use detection::Reassembler;
use imagery::GsdEstimator;
use indicatif::MultiProgress;
use inference::{LabelMap, OnnxDetector};
use pipeline::{
    ProcessCheck, ProcessOptions, Submission, check_output_collisions, collect_input_files,
    output_dir_for, plan_image, process_file, should_process,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, warn};

pub use error::{Error, Result};

/// Main entry point for the aerochip CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.analyze.verbose, cli.analyze.quiet);

    let config = load_default_config()?;

    if let Some(command) = cli.command {
        return handle_command(command, &config);
    }

    if cli.inputs.is_empty() {
        return Err(Error::NoValidImageFiles);
    }

    analyze_images(&cli.inputs, &cli.analyze, &config)
}

/// Analyze input images with the given options.
fn analyze_images(inputs: &[PathBuf], args: &AnalyzeArgs, config: &Config) -> Result<()> {
    let total_start = Instant::now();

    let defaults = effective_defaults(config, &args.geometry, Some(args))?;
    let estimator = GsdEstimator::new(SensorRegistry::with_overrides(&config.sensors));

    // Flight geometry is validated before any model or file work.
    let submission = Submission {
        skip_resampling: args.geometry.skip_resampling,
        altitude_agl_m: args.geometry.altitude,
        sensor_platform: args.geometry.sensor.clone(),
        min_confidence: defaults.min_confidence,
    };
    let resample_plan = submission.validate(&estimator)?;

    let files = collect_input_files(inputs)?;
    if files.is_empty() {
        return Err(Error::NoValidImageFiles);
    }
    info!("Found {} image file(s) to process", files.len());
    check_output_collisions(&files, args.output_dir.as_deref())?;

    let model_config = resolve_model(args, config, &defaults)?;
    validate_model_config(&model_config)?;

    if defaults.chip_size != model_config.input_size {
        warn!(
            "Chip size {}px differs from model input size {}px",
            defaults.chip_size, model_config.input_size
        );
    }

    let labels = args
        .labels_path
        .as_ref()
        .or(model_config.labels.as_ref())
        .map(|path| {
            info!("Loading label map: {}", path.display());
            LabelMap::from_file(path)
        })
        .transpose()?;

    let mut inference = config.inference.clone();
    if args.gpu {
        inference.device = InferenceDevice::Gpu;
    } else if args.cpu {
        inference.device = InferenceDevice::Cpu;
    }

    let mut model = OnnxDetector::from_config(&model_config, &inference)?;

    let options = ProcessOptions {
        output_dir: args.output_dir.clone(),
        formats: defaults.formats.clone(),
        force: args.force,
        target_gsd_cm: defaults.target_gsd_cm,
        chip_size: defaults.chip_size,
        chip_overlap: defaults.chip_overlap,
        batch_size: defaults.batch_size,
        coordinates: defaults.coordinates,
        reassembler: Reassembler::new(defaults.iou_threshold, defaults.min_confidence)?,
    };

    let progress_enabled = !args.quiet && !args.no_progress;
    let multi_progress = progress_enabled.then(MultiProgress::new);
    let image_progress = output::progress::create_image_progress(files.len(), progress_enabled)
        .map(|pb| match &multi_progress {
            Some(multi) => multi.add(pb),
            None => pb,
        });

    let mut processed = 0;
    let mut skipped = 0;
    let mut errors = 0;
    let mut total_detections = 0;
    let mut total_chips = 0;
    let mut written = Vec::new();

    for file in &files {
        let image_output_dir = output_dir_for(file, options.output_dir.as_deref());

        if should_process(file, &image_output_dir, &options.formats, options.force)
            == ProcessCheck::SkipExists
        {
            info!("Skipping (output exists): {}", file.display());
            skipped += 1;
            output::progress::inc_progress(image_progress.as_ref(), 1);
            continue;
        }

        std::fs::create_dir_all(&image_output_dir).map_err(|source| {
            Error::OutputDirCreateFailed {
                path: image_output_dir.clone(),
                source,
            }
        })?;

        match process_file(
            file,
            &image_output_dir,
            &resample_plan,
            &estimator,
            &mut model,
            labels.as_ref(),
            &options,
            multi_progress.as_ref(),
        ) {
            Ok(result) => {
                processed += 1;
                total_detections += result.detections;
                total_chips += result.chips;
                written.extend(result.outputs);
            }
            Err(e) if e.is_per_image() && !args.fail_fast => {
                error!("Failed to process {}: {}", file.display(), e);
                errors += 1;
            }
            Err(e) => {
                output::progress::finish_progress(image_progress, "Failed");
                return Err(e);
            }
        }
        output::progress::inc_progress(image_progress.as_ref(), 1);
    }

    output::progress::finish_progress(image_progress, "Complete");

    if let Some(archive_path) = &args.archive {
        let count = output::write_archive(archive_path, &written)?;
        info!("Archived {} file(s) to {}", count, archive_path.display());
    }

    let total_duration = total_start.elapsed().as_secs_f64();
    info!(
        "Complete: {} processed, {} skipped, {} errors, {} total detections in {:.2}s",
        processed, skipped, errors, total_detections, total_duration
    );

    if processed > 0 {
        #[allow(clippy::cast_precision_loss)]
        let chips_per_sec = if total_duration > 0.0 {
            total_chips as f64 / total_duration
        } else {
            0.0
        };
        info!("Performance: {:.1} chips/sec overall", chips_per_sec);
    }

    if errors > 0 {
        warn!("{} image(s) had errors", errors);
    }

    Ok(())
}

/// Merge command-line overrides into configured defaults and validate the result.
fn effective_defaults(
    config: &Config,
    geometry: &GeometryArgs,
    args: Option<&AnalyzeArgs>,
) -> Result<DefaultsConfig> {
    let mut merged = config.clone();
    let defaults = &mut merged.defaults;

    if let Some(gsd) = geometry.target_gsd {
        defaults.target_gsd_cm = gsd;
    }
    if let Some(size) = geometry.chip_size {
        defaults.chip_size = size;
    }
    if let Some(overlap) = geometry.overlap {
        defaults.chip_overlap = overlap;
    }

    if let Some(args) = args {
        if let Some(confidence) = args.min_confidence {
            defaults.min_confidence = confidence;
        }
        if let Some(iou) = args.iou_threshold {
            defaults.iou_threshold = iou;
        }
        if let Some(batch_size) = args.batch_size {
            defaults.batch_size = batch_size;
        }
        if let Some(formats) = &args.format {
            defaults.formats.clone_from(formats);
        }
        if let Some(coordinates) = args.coordinates {
            defaults.coordinates = coordinates;
        }
    }

    validate_config(&merged)?;
    Ok(merged.defaults)
}

/// Pick the model from `--model-path`, `--model` or the configured default.
fn resolve_model(
    args: &AnalyzeArgs,
    config: &Config,
    defaults: &DefaultsConfig,
) -> Result<ModelConfig> {
    if let Some(path) = &args.model_path {
        info!("Loading model: {}", path.display());
        return Ok(ModelConfig {
            path: path.clone(),
            labels: None,
            input_size: defaults.chip_size,
            tensors: TensorNames::default(),
        });
    }

    let name = args
        .model
        .clone()
        .or_else(|| defaults.model.clone())
        .ok_or_else(|| Error::ConfigValidation {
            message: "no model specified (use -m, --model-path or set defaults.model in config)"
                .to_string(),
        })?;

    info!("Loading model: {}", name);
    config::get_model(config, &name).cloned()
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    // ORT logging is suppressed by default because CUDA fallback is expected in auto mode.
    let filter_str = if quiet {
        "warn,ort=off".to_string()
    } else {
        match verbose {
            0 => "info,ort=off".to_string(),
            1 => "debug,ort=warn".to_string(),
            2 => "trace,ort=info".to_string(),
            _ => "trace".to_string(),
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn handle_command(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Config { action } => handle_config_command(action),
        Command::Sensors { action } => {
            handle_sensors_command(action, config);
            Ok(())
        }
        Command::Models { action } => handle_models_command(action, config),
        Command::Plan { image, geometry } => handle_plan_command(&image, &geometry, config),
    }
}

fn handle_config_command(action: cli::ConfigAction) -> Result<()> {
    use cli::ConfigAction;

    match action {
        ConfigAction::Init => {
            let path = config_file_path()?;
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
                println!("Use 'aerochip models add' to add models.");
            } else {
                let saved_path = save_default_config(&Config::default())?;
                println!("Created configuration file: {}", saved_path.display());
                println!("\nNext steps:");
                println!(
                    "  aerochip models add <name> --path <model.onnx> --labels <labels.pbtxt> --default"
                );
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_default_config()?;
            let text = toml::to_string_pretty(&config)
                .map_err(|source| Error::ConfigSerialize { source })?;
            println!("{text}");
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", config_file_path()?.display());
            Ok(())
        }
    }
}

fn handle_sensors_command(action: cli::SensorsAction, config: &Config) {
    use cli::SensorsAction;

    match action {
        SensorsAction::List => {
            let registry = SensorRegistry::with_overrides(&config.sensors);
            println!("Sensor platforms:");
            for (id, profile) in registry.iter() {
                println!(
                    "  {id}: focal {} mm, sensor {} x {} cm (h x w)",
                    profile.focal_length_mm, profile.sensor_height_cm, profile.sensor_width_cm
                );
            }
        }
    }
}

fn handle_models_command(action: cli::ModelsAction, config: &Config) -> Result<()> {
    use cli::ModelsAction;

    match action {
        ModelsAction::List => {
            if config.models.is_empty() {
                println!("No models configured.");
            } else {
                println!("Configured models:");
                let mut names: Vec<_> = config.models.keys().collect();
                names.sort();
                for name in names {
                    let model = &config.models[name];
                    let default_marker = config.defaults.model.as_ref().is_some_and(|d| d == name);
                    println!(
                        "  {} ({}px){}",
                        name,
                        model.input_size,
                        if default_marker { " [default]" } else { "" }
                    );
                }
            }
            Ok(())
        }
        ModelsAction::Add {
            name,
            path,
            labels,
            input_size,
            default,
        } => handle_models_add(name, path, labels, input_size, default),
        ModelsAction::Check => {
            for (name, model) in &config.models {
                validate_model_config(model)?;
                println!("  {name}: OK");
            }
            Ok(())
        }
    }
}

/// Handle the `models add` command.
fn handle_models_add(
    name: String,
    path: PathBuf,
    labels: Option<PathBuf>,
    input_size: Option<u32>,
    set_default: bool,
) -> Result<()> {
    let model = ModelConfig {
        path,
        labels,
        input_size: input_size.unwrap_or(constants::DEFAULT_CHIP_SIZE),
        tensors: TensorNames::default(),
    };
    validate_model_config(&model)?;

    let mut config = load_default_config()?;
    if config.models.contains_key(&name) {
        return Err(Error::ModelAlreadyExists { name });
    }

    println!("Added model '{name}' ({}px)", model.input_size);
    println!("  Model: {}", model.path.display());
    if let Some(labels) = &model.labels {
        println!("  Labels: {}", labels.display());
    }
    println!("  Default: {}", if set_default { "yes" } else { "no" });

    config.models.insert(name.clone(), model);
    if set_default {
        config.defaults.model = Some(name);
    }

    let config_path = save_default_config(&config)?;
    println!("\nConfiguration saved to: {}", config_path.display());

    Ok(())
}

/// Handle the `plan` command: report geometry without running a model.
fn handle_plan_command(image_path: &Path, geometry: &GeometryArgs, config: &Config) -> Result<()> {
    let defaults = effective_defaults(config, geometry, None)?;
    let estimator = GsdEstimator::new(SensorRegistry::with_overrides(&config.sensors));

    let submission = Submission {
        skip_resampling: geometry.skip_resampling,
        altitude_agl_m: geometry.altitude,
        sensor_platform: geometry.sensor.clone(),
        min_confidence: defaults.min_confidence,
    };
    let resample_plan = submission.validate(&estimator)?;

    let (width, height) =
        image::image_dimensions(image_path).map_err(|source| Error::ImageDecode {
            name: image_path.display().to_string(),
            source,
        })?;

    let options = ProcessOptions {
        output_dir: None,
        formats: defaults.formats.clone(),
        force: false,
        target_gsd_cm: defaults.target_gsd_cm,
        chip_size: defaults.chip_size,
        chip_overlap: defaults.chip_overlap,
        batch_size: defaults.batch_size,
        coordinates: defaults.coordinates,
        reassembler: Reassembler::default(),
    };
    let plan = plan_image(width, height, &resample_plan, &estimator, &options)?;

    println!("Image: {}", image_path.display());
    println!("  Native size: {}x{}", width, height);
    match plan.gsd {
        Some(gsd) => {
            println!(
                "  GSD: {:.4} cm/px (height {:.4}, width {:.4})",
                gsd.effective(),
                gsd.height_cm_per_px,
                gsd.width_cm_per_px
            );
            println!("  Target GSD: {:.4} cm/px", defaults.target_gsd_cm);
        }
        None => println!("  GSD: not estimated (resampling skipped)"),
    }
    println!(
        "  Working size: {}x{}",
        plan.working_dimensions.0, plan.working_dimensions.1
    );
    println!(
        "  Chips: {} ({} columns x {} rows, {}px with {}px overlap)",
        plan.grid.len(),
        plan.grid.columns(),
        plan.grid.rows(),
        defaults.chip_size,
        defaults.chip_overlap
    );

    Ok(())
}

