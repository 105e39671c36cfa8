//! CSV output format writer.

use crate::constants::confidence::DECIMAL_PLACES;
use crate::error::{Error, Result};
use crate::output::{OutputRecord, OutputWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

const HEADER: [&str; 8] = [
    "image",
    "xmin",
    "ymin",
    "xmax",
    "ymax",
    "class_id",
    "class_name",
    "score",
];

/// CSV format output writer, one row per detection.
pub struct CsvWriter {
    writer: csv::Writer<BufWriter<File>>,
    path: PathBuf,
}

impl CsvWriter {
    /// Create a new CSV writer.
    pub fn new(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: csv::Writer::from_writer(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    fn csv_error(&self, source: csv::Error) -> Error {
        Error::CsvWrite {
            path: self.path.clone(),
            source,
        }
    }
}

impl OutputWriter for CsvWriter {
    fn write_header(&mut self) -> Result<()> {
        self.writer
            .write_record(HEADER)
            .map_err(|e| self.csv_error(e))
    }

    fn write_detection(&mut self, record: &OutputRecord<'_>) -> Result<()> {
        let bbox = record.detection.bbox;
        let row = [
            record.image.to_string(),
            format!("{:.2}", bbox.xmin),
            format!("{:.2}", bbox.ymin),
            format!("{:.2}", bbox.xmax),
            format!("{:.2}", bbox.ymax),
            record.detection.class_id.to_string(),
            record.class_name.unwrap_or_default().to_string(),
            format!("{:.decimal$}", record.detection.score, decimal = DECIMAL_PLACES),
        ];
        self.writer
            .write_record(&row)
            .map_err(|e| self.csv_error(e))
    }

    fn finalize(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
