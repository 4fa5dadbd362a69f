//! Tick loggers
//!
//! A [`TickLogger`] is told about every completed `step` through a
//! [`TickReport`]: one row per registered agent with its teacher, the action
//! it received this tick (if any) and its reward state. Loggers are pure
//! observers; a failing logger never fails the step that fed it.

mod csv;
mod table;

pub use self::csv::CsvLogger;
pub use self::table::TableLogger;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::Action;

/// State of one agent at the end of a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRow {
    pub agent: String,
    pub teacher: Option<String>,
    /// Action handed out this tick
    pub action: Option<Action>,
    /// Reward consumed by the agent's latest step
    pub step_reward: Option<f32>,
    /// Reward accumulated since the latest step
    pub pending_reward: f32,
    pub steps: u64,
}

/// Everything a logger learns about one completed tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// 0-based tick number since creation or the last reset
    pub tick: u64,
    pub rows: Vec<AgentRow>,
}

impl TickReport {
    pub fn row(&self, agent: &str) -> Option<&AgentRow> {
        self.rows.iter().find(|row| row.agent == agent)
    }
}

/// Observer of completed ticks
pub trait TickLogger: Send {
    /// Record a completed tick
    fn on_tick(&mut self, report: &TickReport) -> Result<()>;

    /// Release resources. Called before the logger is replaced or detached.
    fn dispose(&mut self) {}
}

impl<L: TickLogger + ?Sized> TickLogger for Box<L> {
    fn on_tick(&mut self, report: &TickReport) -> Result<()> {
        (**self).on_tick(report)
    }

    fn dispose(&mut self) {
        (**self).dispose()
    }
}
