//! Zip packaging of result files.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Package `files` into a deflate-compressed zip at `archive_path`.
///
/// Entries are named by their path relative to the deepest directory shared
/// by all files, so results from different input directories stay apart.
/// A file listed twice is stored once.
pub fn write_archive(archive_path: &Path, files: &[impl AsRef<Path>]) -> Result<usize> {
    let zip_error = |source| Error::Archive {
        path: archive_path.to_path_buf(),
        source,
    };

    let mut paths: Vec<PathBuf> = Vec::with_capacity(files.len());
    for file in files {
        let path = std::fs::canonicalize(file.as_ref())?;
        if paths.contains(&path) {
            debug!("Skipping repeated archive input: {}", path.display());
        } else {
            paths.push(path);
        }
    }
    let base = common_ancestor(&paths);

    let out = File::create(archive_path)?;
    let mut zip = ZipWriter::new(BufWriter::new(out));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut names: HashMap<String, &PathBuf> = HashMap::with_capacity(paths.len());
    for path in &paths {
        let name = entry_name(path, base.as_deref());
        if let Some(first) = names.insert(name.clone(), path) {
            return Err(Error::OutputNameCollision {
                first: first.clone(),
                second: path.clone(),
                output: archive_path.join(name),
            });
        }

        zip.start_file(name, options).map_err(zip_error)?;
        let mut source = File::open(path)?;
        io::copy(&mut source, &mut zip)?;
    }

    zip.finish().map_err(zip_error)?;
    info!(
        "Wrote {} file(s) to archive {}",
        paths.len(),
        archive_path.display()
    );
    Ok(paths.len())
}

fn common_ancestor(paths: &[PathBuf]) -> Option<PathBuf> {
    let mut base = paths.first()?.parent()?.to_path_buf();
    for path in &paths[1..] {
        while !path.starts_with(&base) {
            base = base.parent()?.to_path_buf();
        }
    }
    Some(base)
}

/// Zip entry name with `/` separators.
fn entry_name(path: &Path, base: Option<&Path>) -> String {
    let relative = base
        .and_then(|b| path.strip_prefix(b).ok())
        .unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
