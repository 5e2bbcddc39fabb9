// ============================================================
// Layer 6 — Run Log and Step Summary
// ============================================================
// Two per-run artifacts, both opened once when the run starts:
//
//   <log_dir>/<run>.log          human-readable epoch log
//     2026-10-19 14:25:07: epoch 0, train_accuracy = 0.512500, train_loss = 0.693100.
//     2026-10-19 14:25:09:          val_accuracy = 0.550000, val_loss = 0.688000
//
//   <log_dir>/<run>.summary.csv  one row per optimizer step
//     step,loss,accuracy
//     1,0.693147,0.500000
//
// The summary is only written when the run asks for it.

use std::{
    fs::{self, File},
    io::{BufWriter, LineWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::Local;

use crate::ml::schedule::EpochMetrics;

/// Wall-clock stamp used at the start of every log line
pub fn print_time() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Per-step CSV of training loss and accuracy.
pub struct SummaryWriter {
    path: PathBuf,
    out:  BufWriter<File>,
}

impl SummaryWriter {
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::create(&path)
            .with_context(|| format!("Cannot create summary '{}'", path.display()))?;
        let mut out = BufWriter::new(file);
        writeln!(out, "step,loss,accuracy")?;
        Ok(Self { path, out })
    }

    pub fn add_scalars(&mut self, step: u64, loss: f64, accuracy: f64) -> Result<()> {
        writeln!(self.out, "{},{:.6},{:.6}", step, loss, accuracy)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// The per-run plaintext log plus the optional step summary.
pub struct RunLog {
    log_path: PathBuf,
    log:      LineWriter<File>,
    summary:  Option<SummaryWriter>,
}

impl RunLog {
    /// Create `<dir>/<log_file>` and, when `summary_file` is set, the CSV summary.
    pub fn create(dir: &Path, log_file: &str, summary_file: Option<&str>) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create log directory '{}'", dir.display()))?;

        let log_path = dir.join(log_file);
        let file = File::create(&log_path)
            .with_context(|| format!("Cannot create log file '{}'", log_path.display()))?;

        let summary = summary_file
            .map(|name| SummaryWriter::create(dir.join(name)))
            .transpose()?;

        Ok(Self { log_path, log: LineWriter::new(file), summary })
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn summary_path(&self) -> Option<&Path> {
        self.summary.as_ref().map(SummaryWriter::path)
    }

    /// Write a free-form line
    pub fn note(&mut self, line: &str) -> Result<()> {
        writeln!(self.log, "{line}")?;
        Ok(())
    }

    pub fn train_epoch(&mut self, m: &EpochMetrics) -> Result<()> {
        writeln!(
            self.log,
            "{}: epoch {}, train_accuracy = {:.6}, train_loss = {:.6}.",
            print_time(), m.epoch, m.accuracy, m.loss
        )?;
        Ok(())
    }

    pub fn validation(&mut self, m: &EpochMetrics) -> Result<()> {
        writeln!(
            self.log,
            "{}:          val_accuracy = {:.6}, val_loss = {:.6}",
            print_time(), m.accuracy, m.loss
        )?;
        Ok(())
    }

    pub fn periodic_test(&mut self, m: &EpochMetrics) -> Result<()> {
        writeln!(
            self.log,
            "{}: epoch {}, test_accuracy = {:.6}, test_loss = {:.6}",
            print_time(), m.epoch, m.accuracy, m.loss
        )?;
        Ok(())
    }

    pub fn final_test(&mut self, accuracy: f64, loss: f64) -> Result<()> {
        writeln!(self.log, "Done test!")?;
        writeln!(self.log, "Test_accuracy = {:.6}, test_loss = {:.6}", accuracy, loss)?;
        Ok(())
    }

    /// Record one optimizer step in the summary, if enabled
    pub fn step(&mut self, step: u64, loss: f64, accuracy: f64) -> Result<()> {
        if let Some(summary) = self.summary.as_mut() {
            summary.add_scalars(step, loss, accuracy)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.log.flush()?;
        if let Some(summary) = self.summary.as_mut() {
            summary.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_lines() {
        let dir = TempDir::new().unwrap();
        let mut log = RunLog::create(dir.path(), "run.log", None).unwrap();
        log.note("10 training images and 2 test images").unwrap();
        log.train_epoch(&EpochMetrics::new(0, 0.5, 0.75)).unwrap();
        log.validation(&EpochMetrics::new(0, 0.25, 1.0)).unwrap();
        log.final_test(1.0, 0.125).unwrap();
        log.flush().unwrap();
        assert!(log.summary_path().is_none());

        let text = fs::read_to_string(dir.path().join("run.log")).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "10 training images and 2 test images");
        assert!(lines[1].ends_with("epoch 0, train_accuracy = 0.500000, train_loss = 0.750000."));
        assert!(lines[2].ends_with("val_accuracy = 0.250000, val_loss = 1.000000"));
        assert_eq!(lines[4], "Test_accuracy = 1.000000, test_loss = 0.125000");
    }

    #[test]
    fn test_summary_rows() {
        let dir = TempDir::new().unwrap();
        let mut log = RunLog::create(dir.path(), "run.log", Some("run.summary.csv")).unwrap();
        log.step(1, 0.5, 0.25).unwrap();
        log.step(2, 0.4, 0.5).unwrap();
        log.flush().unwrap();

        let csv = fs::read_to_string(dir.path().join("run.summary.csv")).unwrap();
        assert_eq!(csv, "step,loss,accuracy\n1,0.500000,0.250000\n2,0.400000,0.500000\n");
    }
}
