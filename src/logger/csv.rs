use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};

use ::csv::{Writer, WriterBuilder};

use crate::error::Result;
use crate::logger::{AgentRow, TickLogger, TickReport};

const HEADER: [&str; 7] = ["tick", "agent", "teacher", "action", "step_reward", "pending_reward", "steps"];

/// Writes one CSV record per agent per tick to `<log_dir>/ticks.csv`.
///
/// Names are quoted as needed, so any agent or teacher name is safe to log.
pub struct CsvLogger {
    path: PathBuf,
    writer: Option<Writer<File>>,
}

impl CsvLogger {
    /// Create the log directory and a fresh `ticks.csv` with its header
    pub fn new<P: AsRef<Path>>(log_dir: P) -> Result<Self> {
        create_dir_all(log_dir.as_ref())?;
        let path = log_dir.as_ref().join("ticks.csv");

        let mut writer = WriterBuilder::new().has_headers(false).from_path(&path)?;
        writer.write_record(HEADER)?;
        writer.flush()?;

        Ok(CsvLogger {
            path,
            writer: Some(writer),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn record(tick: u64, row: &AgentRow) -> [String; 7] {
    [
        tick.to_string(),
        row.agent.clone(),
        row.teacher.clone().unwrap_or_default(),
        optional(row.action),
        optional(row.step_reward),
        row.pending_reward.to_string(),
        row.steps.to_string(),
    ]
}

impl TickLogger for CsvLogger {
    fn on_tick(&mut self, report: &TickReport) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            for row in &report.rows {
                writer.write_record(&record(report.tick, row))?;
            }
            writer.flush()?;
        }
        Ok(())
    }

    fn dispose(&mut self) {
        let _ = self.flush();
        self.writer = None;
    }
}

impl Drop for CsvLogger {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
