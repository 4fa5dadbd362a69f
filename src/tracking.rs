//! Per-agent telemetry.
//!
//! Every step a strategy takes for an agent leaves a [`TrackingRecord`]. A
//! teacher aggregates the records of its roster into [`AgentTracking`]
//! values, which can be summarised or written out as JSON.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::model::Action;

/// One observed step of one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingRecord {
    /// Agent-local step counter, starting at 0
    pub step: u64,
    /// Lesson the step belonged to
    pub lesson: usize,
    pub action: Action,
    /// Reward consumed by this step
    pub reward: f32,
    /// Exploration rate in effect when the action was chosen
    pub exploration: f32,
    /// Loss of the most recent learning pass, if any
    pub loss: Option<f32>,
}

/// Tracking history of one agent, as reported by its teacher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentTracking {
    pub agent: String,
    pub records: Vec<TrackingRecord>,
}

impl AgentTracking {
    pub fn new<S: Into<String>>(agent: S, records: Vec<TrackingRecord>) -> Self {
        AgentTracking {
            agent: agent.into(),
            records,
        }
    }

    pub fn total_reward(&self) -> f32 {
        self.records.iter().map(|r| r.reward).sum()
    }

    /// Mean reward over the last `window` records
    pub fn avg_reward(&self, window: usize) -> Option<f32> {
        if self.records.is_empty() || window == 0 {
            return None;
        }

        let n = window.min(self.records.len());
        let sum: f32 = self.records.iter().rev().take(n).map(|r| r.reward).sum();
        Some(sum / n as f32)
    }

    /// Most recent learning loss
    pub fn last_loss(&self) -> Option<f32> {
        self.records.iter().rev().find_map(|r| r.loss)
    }
}

/// Save tracking data to a JSON file
pub fn save_json<P: AsRef<Path>>(data: &[AgentTracking], path: P) -> Result<()> {
    let serialized = serde_json::to_string_pretty(data)?;
    std::fs::write(path, serialized)?;
    Ok(())
}

/// Load tracking data from a JSON file
pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Vec<AgentTracking>> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}
