//! # Agents
//!
//! An [`Agent`] is the academy's handle on one learning model. Besides the
//! model it carries the state a teacher needs between ticks:
//!
//! - a reward accumulator the caller feeds through the academy,
//! - a replay memory of completed transitions,
//! - the pending transition (last observation and action, waiting for the
//!   next observation),
//! - a tracking history of every step taken.
//!
//! Agents are created by [`Academy::add_agent`](crate::academy::Academy::add_agent)
//! and live until the academy is reset.

use ndarray::{Array1, ArrayView1};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::error::Result;
use crate::memory::{ReplayMemory, Transition};
use crate::model::{Action, Model};
use crate::tracking::TrackingRecord;

/// Behaviour settings of a single agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Preferred name. Used when still free at registration.
    pub name: Option<String>,
    /// Replay memory capacity
    pub memory_size: usize,
    /// Transitions sampled per learning pass
    pub batch_size: usize,
    /// Keep at most this many tracking records; `None` keeps all
    pub tracking_capacity: Option<usize>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            name: None,
            memory_size: 1000,
            batch_size: 32,
            tracking_capacity: None,
        }
    }
}

/// Hyper-parameters handed to [`Model::fit`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Discount factor
    pub gamma: f32,
    pub learning_rate: f32,
}

impl Default for LearningConfig {
    fn default() -> Self {
        LearningConfig {
            gamma: 0.9,
            learning_rate: 0.001,
        }
    }
}

/// Everything needed to register an agent
pub struct BuildAgentConfig {
    pub model: Box<dyn Model>,
    pub agent_config: Option<AgentConfig>,
    pub learning_config: Option<LearningConfig>,
}

impl BuildAgentConfig {
    pub fn new<M: Model + 'static>(model: M) -> Self {
        BuildAgentConfig {
            model: Box::new(model),
            agent_config: None,
            learning_config: None,
        }
    }

    pub fn agent_config(mut self, config: AgentConfig) -> Self {
        self.agent_config = Some(config);
        self
    }

    pub fn learning_config(mut self, config: LearningConfig) -> Self {
        self.learning_config = Some(config);
        self
    }
}

/// A named learning model plus its reward, memory and tracking state
pub struct Agent {
    name: String,
    model: Box<dyn Model>,
    config: AgentConfig,
    learning: LearningConfig,
    reward: f32,
    memory: ReplayMemory,
    pending: Option<(Array1<f32>, Action)>,
    steps: u64,
    last_loss: Option<f32>,
    tracking: VecDeque<TrackingRecord>,
}

impl Agent {
    pub(crate) fn new(
        name: String,
        model: Box<dyn Model>,
        mut config: AgentConfig,
        learning: LearningConfig,
    ) -> Self {
        config.name = Some(name.clone());
        let memory = ReplayMemory::new(config.memory_size);

        Agent {
            name,
            model,
            config,
            learning,
            reward: 0.0,
            memory,
            pending: None,
            steps: 0,
            last_loss: None,
            tracking: VecDeque::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn learning_config(&self) -> &LearningConfig {
        &self.learning
    }

    /// Current value of the reward accumulator
    pub fn reward(&self) -> f32 {
        self.reward
    }

    /// Accumulate `delta` into the reward
    pub fn add_reward(&mut self, delta: f32) {
        self.reward += delta;
    }

    /// Overwrite the reward, discarding what was accumulated
    pub fn set_reward(&mut self, value: f32) {
        self.reward = value;
    }

    /// Read the reward and reset the accumulator to zero
    pub fn take_reward(&mut self) -> f32 {
        std::mem::take(&mut self.reward)
    }

    /// Number of steps recorded since registration
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn last_loss(&self) -> Option<f32> {
        self.last_loss
    }

    pub fn memory(&self) -> &ReplayMemory {
        &self.memory
    }

    pub fn model_mut(&mut self) -> &mut dyn Model {
        self.model.as_mut()
    }

    pub fn predict(&mut self, input: ArrayView1<f32>) -> Result<Array1<f32>> {
        self.model.predict(input)
    }

    /// Remember `state` and `action` until the next observation arrives
    pub fn open_transition(&mut self, state: Array1<f32>, action: Action) {
        self.pending = Some((state, action));
    }

    /// Complete the pending transition, if any, and store it in memory
    pub fn close_transition(&mut self, next_state: ArrayView1<f32>, reward: f32) {
        if let Some((state, action)) = self.pending.take() {
            self.memory.add(Transition {
                state,
                action,
                reward,
                next_state: next_state.to_owned(),
            });
        }
    }

    /// Drop the pending transition without storing it
    pub fn abandon_transition(&mut self) {
        self.pending = None;
    }

    /// Fit the model on a batch sampled from memory.
    ///
    /// Returns `None` without touching the model when memory is empty.
    pub fn learn(&mut self, rng: &mut dyn RngCore) -> Result<Option<f32>> {
        if self.memory.is_empty() {
            return Ok(None);
        }

        let batch = self.memory.sample(self.config.batch_size.max(1), rng);
        let loss = self.model.fit(&batch, &self.learning)?;
        self.last_loss = Some(loss);
        Ok(Some(loss))
    }

    /// Append a tracking record for one step
    pub fn record_step(&mut self, action: Action, reward: f32, exploration: f32, lesson: usize) {
        let record = TrackingRecord {
            step: self.steps,
            lesson,
            action,
            reward,
            exploration,
            loss: self.last_loss,
        };
        self.steps += 1;

        if let Some(capacity) = self.config.tracking_capacity {
            if capacity == 0 {
                return;
            }
            while self.tracking.len() >= capacity {
                self.tracking.pop_front();
            }
        }
        self.tracking.push_back(record);
    }

    /// Tracking history, oldest first
    pub fn tracking_data(&self) -> Vec<TrackingRecord> {
        self.tracking.iter().cloned().collect()
    }

    pub fn last_record(&self) -> Option<&TrackingRecord> {
        self.tracking.back()
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("reward", &self.reward)
            .field("steps", &self.steps)
            .field("memory", &self.memory.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct CountingModel {
        fits: usize,
        last_batch: usize,
    }

    impl Model for CountingModel {
        fn predict(&mut self, input: ArrayView1<f32>) -> Result<Array1<f32>> {
            Ok(input.to_owned())
        }

        fn fit(&mut self, batch: &[&Transition], _config: &LearningConfig) -> Result<f32> {
            self.fits += 1;
            self.last_batch = batch.len();
            Ok(0.5)
        }
    }

    fn agent(config: AgentConfig) -> Agent {
        let model = CountingModel { fits: 0, last_batch: 0 };
        Agent::new("bot".to_string(), Box::new(model), config, LearningConfig::default())
    }

    #[test]
    fn test_reward_accumulation() {
        let mut agent = agent(AgentConfig::default());
        agent.add_reward(3.0);
        agent.add_reward(4.0);
        assert_eq!(agent.reward(), 7.0);

        agent.set_reward(10.0);
        assert_eq!(agent.reward(), 10.0);

        assert_eq!(agent.take_reward(), 10.0);
        assert_eq!(agent.reward(), 0.0);
    }

    #[test]
    fn test_name_written_back_to_config() {
        let agent = agent(AgentConfig::default());
        assert_eq!(agent.config().name.as_deref(), Some("bot"));
    }

    #[test]
    fn test_transitions_feed_memory() {
        let mut agent = agent(AgentConfig::default());

        // Nothing pending yet
        agent.close_transition(array![1.0].view(), 1.0);
        assert!(agent.memory().is_empty());

        agent.open_transition(array![0.0], 2);
        agent.close_transition(array![1.0].view(), 1.0);
        assert_eq!(agent.memory().len(), 1);

        // Closing consumes the pending transition
        agent.close_transition(array![2.0].view(), 1.0);
        assert_eq!(agent.memory().len(), 1);

        agent.open_transition(array![3.0], 0);
        agent.abandon_transition();
        agent.close_transition(array![4.0].view(), 1.0);
        assert_eq!(agent.memory().len(), 1);
    }

    #[test]
    fn test_model_reachable_through_agent() {
        let mut agent = agent(AgentConfig { memory_size: 8, ..AgentConfig::default() });
        assert_eq!(agent.memory().capacity(), 8);

        let scores = agent.model_mut().predict(array![0.5, 2.0].view()).unwrap();
        assert_eq!(scores, array![0.5, 2.0]);

        let transition = Transition {
            state: array![0.0],
            action: 0,
            reward: 1.0,
            next_state: array![1.0],
        };
        assert_eq!(agent.model_mut().fit(&[&transition], &LearningConfig::default()).unwrap(), 0.5);
    }

    #[test]
    fn test_learn_requires_memory() {
        let mut agent = agent(AgentConfig { batch_size: 4, ..AgentConfig::default() });
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(agent.learn(&mut rng).unwrap(), None);

        for i in 0..6 {
            agent.open_transition(array![i as f32], i);
            agent.close_transition(array![i as f32 + 1.0].view(), 0.0);
        }
        assert_eq!(agent.learn(&mut rng).unwrap(), Some(0.5));
        assert_eq!(agent.last_loss(), Some(0.5));
    }

    #[test]
    fn test_tracking_history_is_bounded() {
        let mut agent = agent(AgentConfig { tracking_capacity: Some(2), ..AgentConfig::default() });
        for action in 0..5 {
            agent.record_step(action, 1.0, 0.1, 0);
        }

        let data = agent.tracking_data();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].step, 3);
        assert_eq!(data[1].action, 4);
        assert_eq!(agent.steps(), 5);
    }
}
