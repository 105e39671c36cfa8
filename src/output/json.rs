//! JSON output format writer.

use crate::detection::ReassembledResult;
use crate::error::{Error, Result};
use crate::output::{OutputRecord, OutputWriter};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes `{ "<image>": { "bboxes": [...], "classes": [...], "scores": [...] } }`.
///
/// Detections are buffered and the document is written on `finalize`.
/// An image written through `write_header` alone appears with empty arrays.
pub struct JsonResultWriter {
    output_path: PathBuf,
    image: String,
    results: BTreeMap<String, ReassembledResult>,
}

impl JsonResultWriter {
    /// Create a writer for the results of `image`.
    pub fn new(path: &Path, image: &str) -> Self {
        Self {
            output_path: path.to_path_buf(),
            image: image.to_string(),
            results: BTreeMap::new(),
        }
    }
}

impl OutputWriter for JsonResultWriter {
    fn write_header(&mut self) -> Result<()> {
        self.results.entry(self.image.clone()).or_default();
        Ok(())
    }

    fn write_detection(&mut self, record: &OutputRecord<'_>) -> Result<()> {
        self.results
            .entry(record.image.to_string())
            .or_default()
            .push(record.detection);
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        let file = File::create(&self.output_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.results).map_err(|e| {
            Error::JsonWrite {
                path: self.output_path.clone(),
                source: e,
            }
        })?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}
