//! CSV sink for measurement samples.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::time::Instant;

use crate::error::{SweepError, SweepResult};

pub const CSV_HEADER: [&str; 4] = ["Time_s", "V_Gate", "I_Drain_A", "I_Gate_A"];

/// Appends one row per sample: elapsed seconds, gate volts, raw response.
///
/// The raw instrument line is stored as a single opaque field, so data rows
/// carry three fields under a four-column header. The writer is built
/// `flexible` for that reason.
pub struct ResponseLogger<W: Write> {
    writer: csv::Writer<W>,
    start: Instant,
    rows: usize,
}

impl ResponseLogger<File> {
    /// Create (or truncate) the CSV file and write the header.
    pub fn create<P: AsRef<Path>>(path: P) -> SweepResult<Self> {
        let path = path.as_ref();
        let writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|source| SweepError::CsvOpen {
                path: path.display().to_string(),
                source,
            })?;
        log::info!("Logging samples to '{}'", path.display());
        Self::with_writer(writer)
    }
}

impl<W: Write> ResponseLogger<W> {
    pub fn from_writer(inner: W) -> SweepResult<Self> {
        let writer = csv::WriterBuilder::new().flexible(true).from_writer(inner);
        Self::with_writer(writer)
    }

    fn with_writer(mut writer: csv::Writer<W>) -> SweepResult<Self> {
        writer.write_record(CSV_HEADER)?;
        Ok(Self {
            writer,
            start: Instant::now(),
            rows: 0,
        })
    }

    /// Mark the start of the measurement; elapsed times count from here.
    pub fn start_clock(&mut self) {
        self.start = Instant::now();
    }

    pub fn record(&mut self, gate_voltage: f64, raw_response: &str) -> SweepResult<()> {
        let elapsed = self.start.elapsed().as_secs_f64();
        self.writer.write_record([
            format!("{:.6}", elapsed),
            format!("{:.6}", gate_voltage),
            raw_response.trim().to_string(),
        ])?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush buffered rows and return the number of data rows written.
    pub fn finish(mut self) -> SweepResult<usize> {
        self.writer.flush()?;
        Ok(self.rows)
    }

    pub fn into_inner(self) -> SweepResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| {
                SweepError::Transport(io::Error::new(e.error().kind(), e.error().to_string()))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(logger: ResponseLogger<Vec<u8>>) -> String {
        String::from_utf8(logger.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_header_only() {
        let logger = ResponseLogger::from_writer(Vec::new()).unwrap();
        assert_eq!(text(logger), "Time_s,V_Gate,I_Drain_A,I_Gate_A\n");
    }

    #[test]
    fn test_row_format() {
        let mut logger = ResponseLogger::from_writer(Vec::new()).unwrap();
        logger.start_clock();
        logger.record(-1.0, "1.5e-06\t2.0e-12\n").unwrap();
        assert_eq!(logger.rows(), 1);

        let out = text(logger);
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(out.as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        let fields: Vec<&str> = record.iter().collect();
        assert_eq!(fields.len(), 3);
        assert!(fields[0].parse::<f64>().unwrap() >= 0.0);
        assert_eq!(fields[0].split('.').nth(1).unwrap().len(), 6);
        assert_eq!(fields[1], "-1.000000");
        assert_eq!(fields[2], "1.5e-06\t2.0e-12");
    }

    #[test]
    fn test_create_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "stale,data\nmore\n").unwrap();

        let mut logger = ResponseLogger::create(&path).unwrap();
        logger.record(1.0, "x").unwrap();
        assert_eq!(logger.finish().unwrap(), 1);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Time_s,V_Gate,I_Drain_A,I_Gate_A\n"));
        assert!(!content.contains("stale"));
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_create_in_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        let err = ResponseLogger::create(&path).err().unwrap();
        assert!(matches!(err, SweepError::CsvOpen { .. }));
        assert!(err.is_init_failure());
    }
}
