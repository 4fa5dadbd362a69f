use std::sync::{Arc, Mutex};

use crate::error::Result;
use crate::logger::{AgentRow, TickLogger, TickReport};

/// In-memory table of tick reports.
///
/// Clones share the same table, so a caller can keep one clone for reading
/// while the academy owns the other.
#[derive(Clone, Default)]
pub struct TableLogger {
    reports: Arc<Mutex<Vec<TickReport>>>,
    history_size: Option<usize>,
}

impl TableLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only the latest `history_size` reports
    pub fn with_history(history_size: usize) -> Self {
        TableLogger {
            reports: Arc::new(Mutex::new(Vec::new())),
            history_size: Some(history_size),
        }
    }

    pub fn reports(&self) -> Vec<TickReport> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Every row recorded for `agent`, oldest first, paired with its tick
    pub fn rows_for(&self, agent: &str) -> Vec<(u64, AgentRow)> {
        self.lock()
            .iter()
            .filter_map(|report| report.row(agent).map(|row| (report.tick, row.clone())))
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<TickReport>> {
        // A poisoned table still holds valid reports
        self.reports.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TickLogger for TableLogger {
    fn on_tick(&mut self, report: &TickReport) -> Result<()> {
        let history_size = self.history_size;
        let mut reports = self.lock();
        reports.push(report.clone());
        if let Some(limit) = history_size {
            let excess = reports.len().saturating_sub(limit);
            reports.drain(..excess);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(tick: u64, action: Option<usize>) -> TickReport {
        TickReport {
            tick,
            rows: vec![AgentRow {
                agent: "bot".to_string(),
                teacher: Some("coach".to_string()),
                action,
                step_reward: None,
                pending_reward: 0.0,
                steps: tick,
            }],
        }
    }

    #[test]
    fn test_clones_share_table() {
        let reader = TableLogger::new();
        let mut writer = reader.clone();

        writer.on_tick(&report(0, Some(1))).unwrap();
        writer.on_tick(&report(1, None)).unwrap();

        assert_eq!(reader.len(), 2);
        let rows = reader.rows_for("bot");
        assert_eq!(rows[0].0, 0);
        assert_eq!(rows[0].1.action, Some(1));
        assert!(reader.rows_for("ghost").is_empty());
    }

    #[test]
    fn test_history_limit() {
        let mut logger = TableLogger::with_history(2);
        for tick in 0..5 {
            logger.on_tick(&report(tick, None)).unwrap();
        }

        let ticks: Vec<u64> = logger.reports().iter().map(|r| r.tick).collect();
        assert_eq!(ticks, vec![3, 4]);
    }
}
