//! Pipeline coordination for image processing.

use crate::config::{CoordinateSpace, OutputFormat};
use crate::constants::{IMAGE_EXTENSIONS, output_extensions};
use crate::detection::Reassembler;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Options for processing a single image.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Output directory (None = same as input).
    pub output_dir: Option<PathBuf>,
    /// Output formats to generate.
    pub formats: Vec<OutputFormat>,
    /// Force reprocessing even if output exists.
    pub force: bool,
    /// Target ground sampling distance in cm/px.
    pub target_gsd_cm: f64,
    /// Chip edge length in pixels.
    pub chip_size: u32,
    /// Overlap between neighboring chips in pixels.
    pub chip_overlap: u32,
    /// Chips per inference call.
    pub batch_size: usize,
    /// Pixel space of written boxes.
    pub coordinates: CoordinateSpace,
    /// Score filter and NMS settings.
    pub reassembler: Reassembler,
}

/// Result of checking whether an image should be processed.
#[derive(Debug, PartialEq, Eq)]
pub enum ProcessCheck {
    /// Image should be processed.
    Process,
    /// Skip - output already exists.
    SkipExists,
}

/// Determine the output directory for an image.
pub fn output_dir_for(input: &Path, explicit_output_dir: Option<&Path>) -> PathBuf {
    explicit_output_dir.map_or_else(
        || {
            input
                .parent()
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
        },
        Path::to_path_buf,
    )
}

/// Get output file path for a given format.
pub fn output_path_for(input: &Path, output_dir: &Path, format: OutputFormat) -> PathBuf {
    // Non-UTF-8 stems are kept lossily rather than rejected
    let stem = input.file_stem().map_or_else(
        || std::borrow::Cow::Borrowed("output"),
        |s| s.to_string_lossy(),
    );

    let extension = match format {
        OutputFormat::Json => output_extensions::JSON,
        OutputFormat::Csv => output_extensions::CSV,
    };

    output_dir.join(format!("{stem}{extension}"))
}

/// Check if an image should be processed.
pub fn should_process(
    input: &Path,
    output_dir: &Path,
    formats: &[OutputFormat],
    force: bool,
) -> ProcessCheck {
    if !force {
        let all_exist = formats
            .iter()
            .all(|fmt| output_path_for(input, output_dir, *fmt).exists());
        if all_exist {
            return ProcessCheck::SkipExists;
        }
    }

    ProcessCheck::Process
}

/// Collect input images from paths (files and directories).
///
/// Directories are searched recursively and non-image files in them are
/// ignored. Explicitly named files with an unsupported extension are
/// skipped with a warning.
pub fn collect_input_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_image_file(path) {
                files.push(path.clone());
            } else {
                warn!(
                    "Skipping unsupported file type (expected {}): {}",
                    IMAGE_EXTENSIONS.join("/"),
                    path.display()
                );
            }
        } else if path.is_dir() {
            collect_image_files_recursive(path, &mut files)?;
        } else {
            warn!("Skipping non-existent path: {}", path.display());
        }
    }

    Ok(files)
}

/// Reject inputs whose result files would overwrite each other.
///
/// Output names keep only the file stem, so `site.jpg` and `site.png` in one
/// directory, or equal names from several directories sent to one
/// `--output-dir`, would otherwise share results and the later image would be
/// skipped as already processed.
pub fn check_output_collisions(files: &[PathBuf], explicit_output_dir: Option<&Path>) -> Result<()> {
    let mut claimed: HashMap<PathBuf, &PathBuf> = HashMap::with_capacity(files.len());

    for file in files {
        let output = output_path_for(
            file,
            &output_dir_for(file, explicit_output_dir),
            OutputFormat::Json,
        );
        if let Some(first) = claimed.insert(output.clone(), file)
            && first != file
        {
            return Err(Error::OutputNameCollision {
                first: first.clone(),
                second: file.clone(),
                output,
            });
        }
    }

    Ok(())
}

fn collect_image_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            collect_image_files_recursive(&path, files)?;
        } else if is_image_file(&path) {
            files.push(path);
        }
    }

    Ok(())
}

/// Check if a file has a supported image extension.
pub fn is_image_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| {
        IMAGE_EXTENSIONS
            .iter()
            .any(|supported| ext.eq_ignore_ascii_case(supported))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_output_dir_for_with_explicit() {
        let input = Path::new("/data/scene.jpg");
        let output = output_dir_for(input, Some(Path::new("/results")));
        assert_eq!(output, PathBuf::from("/results"));
    }

    #[test]
    fn test_output_dir_for_without_explicit() {
        let input = Path::new("/data/scene.jpg");
        let output = output_dir_for(input, None);
        assert_eq!(output, PathBuf::from("/data"));
    }

    #[test]
    fn test_output_path_for_formats() {
        let json = output_path_for(
            Path::new("DJI_0042.JPG"),
            Path::new("/output"),
            OutputFormat::Json,
        );
        assert_eq!(json, PathBuf::from("/output/DJI_0042_inference_results.json"));

        let csv = output_path_for(
            Path::new("DJI_0042.JPG"),
            Path::new("/output"),
            OutputFormat::Csv,
        );
        assert!(csv.to_string_lossy().ends_with("_inference_results.csv"));
    }

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("scene.jpg")));
        assert!(is_image_file(Path::new("scene.JPEG")));
        assert!(is_image_file(Path::new("ortho.tif")));
        assert!(is_image_file(Path::new("ortho.TIFF")));
        assert!(is_image_file(Path::new("mask.png")));
        assert!(!is_image_file(Path::new("notes.txt")));
        assert!(!is_image_file(Path::new("scene.gif")));
        assert!(!is_image_file(Path::new("README")));
    }

    #[test]
    fn test_output_path_for_unicode() {
        let path = output_path_for(
            Path::new("pelto_ääni.jpg"),
            Path::new("/output"),
            OutputFormat::Json,
        );
        assert!(path.to_string_lossy().contains("pelto_ääni"));
    }

    #[test]
    fn test_collect_input_files_filters_and_recurses() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("flight_02");
        std::fs::create_dir(&nested).unwrap();
        for name in ["a.jpg", "b.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::write(nested.join("c.tif"), b"x").unwrap();

        let files = collect_input_files(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(files, vec![dir.path().join("a.jpg"), nested.join("c.tif")]);

        let explicit = collect_input_files(&[dir.path().join("b.txt")]).unwrap();
        assert!(explicit.is_empty());
    }

    #[test]
    fn test_check_output_collisions_same_stem_in_one_dir() {
        let dir = TempDir::new().unwrap();
        let files = vec![dir.path().join("site.jpg"), dir.path().join("site.png")];
        let err = check_output_collisions(&files, None).unwrap_err();
        assert!(matches!(err, Error::OutputNameCollision { .. }));
        assert!(err.is_validation());

        let distinct = vec![dir.path().join("site.jpg"), dir.path().join("site_02.jpg")];
        assert!(check_output_collisions(&distinct, None).is_ok());
    }

    #[test]
    fn test_check_output_collisions_across_dirs() {
        let a = Path::new("/flights/a/x.jpg").to_path_buf();
        let b = Path::new("/flights/b/x.jpg").to_path_buf();
        let files = vec![a, b];

        // separate directories keep separate results
        assert!(check_output_collisions(&files, None).is_ok());
        assert!(matches!(
            check_output_collisions(&files, Some(Path::new("/results"))),
            Err(Error::OutputNameCollision { .. })
        ));
    }

    #[test]
    fn test_should_process_skips_existing_unless_forced() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("scene.jpg");
        let formats = [OutputFormat::Json];
        assert_eq!(
            should_process(&input, dir.path(), &formats, false),
            ProcessCheck::Process
        );

        std::fs::write(
            output_path_for(&input, dir.path(), OutputFormat::Json),
            b"{}",
        )
        .unwrap();
        assert_eq!(
            should_process(&input, dir.path(), &formats, false),
            ProcessCheck::SkipExists
        );
        assert_eq!(
            should_process(&input, dir.path(), &formats, true),
            ProcessCheck::Process
        );
    }
}
