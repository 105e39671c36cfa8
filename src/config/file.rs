//! Configuration file location, loading and saving.

use crate::config::{Config, validate_config};
use crate::constants::APP_NAME;
use crate::error::{Error, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Environment variable that points at an alternative config file.
pub const CONFIG_ENV_VAR: &str = "AEROCHIP_CONFIG";

/// Get the configuration directory for the current platform.
///
/// - Linux: `~/.config/aerochip/`
/// - macOS: `~/Library/Application Support/aerochip/`
/// - Windows: `%APPDATA%\aerochip\`
pub fn config_dir() -> Result<PathBuf> {
    ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or(Error::ConfigDirNotFound)
}

/// Get the full path to the config file.
///
/// `AEROCHIP_CONFIG` takes precedence over the platform location.
pub fn config_file_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    Ok(config_dir()?.join("config.toml"))
}

/// Load and validate configuration from a TOML file.
///
/// A missing file yields the default configuration.
pub fn load_config_file(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: Config = toml::from_str(&contents).map_err(|e| Error::ConfigParse {
        path: path.to_path_buf(),
        source: e,
    })?;

    validate_config(&config)?;
    Ok(config)
}

/// Load configuration from the resolved config path.
pub fn load_default_config() -> Result<Config> {
    config_file_path().map_or_else(|_| Ok(Config::default()), |path| load_config_file(&path))
}

/// Save configuration to a TOML file, creating parent directories.
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::ConfigWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let contents =
        toml::to_string_pretty(config).map_err(|e| Error::ConfigSerialize { source: e })?;

    std::fs::write(path, contents).map_err(|e| Error::ConfigWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Save configuration to the resolved config path.
pub fn save_default_config(config: &Config) -> Result<PathBuf> {
    let path = config_file_path()?;
    save_config(config, &path)?;
    Ok(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::config::{ModelConfig, OutputFormat, TensorNames};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_dir_names_app() {
        let path = config_dir().unwrap();
        assert!(path.to_string_lossy().contains("aerochip"));
    }

    #[test]
    fn test_load_nonexistent_file_returns_default() {
        let config = load_config_file(Path::new("/nonexistent/path/config.toml")).unwrap();
        assert!(config.models.is_empty());
        assert!(config.sensors.is_empty());
    }

    #[test]
    fn test_load_sensors_and_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[sensors.mavic3]
focal_length_mm = 12.29
sensor_height_cm = 1.3
sensor_width_cm = 1.73

[defaults]
chip_size = 640
chip_overlap = 100
formats = ["json", "csv"]
"#
        )
        .unwrap();

        let config = load_config_file(file.path()).unwrap();
        assert_eq!(config.sensors["mavic3"].focal_length_mm, 12.29);
        assert_eq!(config.defaults.chip_size, 640);
        assert_eq!(config.defaults.chip_overlap, 100);
        assert_eq!(
            config.defaults.formats,
            vec![OutputFormat::Json, OutputFormat::Csv]
        );
        // untouched keys keep their defaults
        assert_eq!(config.defaults.target_gsd_cm, 2.0);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[defaults]\nchip_size = 256\nchip_overlap = 256").unwrap();
        let result = load_config_file(file.path());
        assert!(matches!(result, Err(Error::ConfigValidation { .. })));
    }

    #[test]
    fn test_load_invalid_toml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "this is not valid toml {{{{").unwrap();
        assert!(matches!(
            load_config_file(file.path()),
            Err(Error::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_save_then_load_preserves_models() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.models.insert(
            "debris".to_string(),
            ModelConfig {
                path: PathBuf::from("/models/debris.onnx"),
                labels: Some(PathBuf::from("/models/labels.txt")),
                input_size: 512,
                tensors: TensorNames::default(),
            },
        );
        config.defaults.model = Some("debris".to_string());

        save_config(&config, &path).unwrap();
        let loaded = load_config_file(&path).unwrap();
        assert_eq!(loaded.defaults.model.as_deref(), Some("debris"));
        assert_eq!(loaded.models["debris"].input_size, 512);
        assert_eq!(loaded.models["debris"].tensors, TensorNames::default());
    }
}
