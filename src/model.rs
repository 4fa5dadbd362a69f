//! The opaque learning model an agent wraps.

use ndarray::{Array1, ArrayView1};

use crate::agent::LearningConfig;
use crate::error::Result;
use crate::memory::Transition;

/// Discrete action index chosen for an agent
pub type Action = usize;

/// Capability every agent model must provide.
///
/// The academy never looks inside a model. Strategies ask it to score the
/// available actions for an observation and, at lesson boundaries, to fit on
/// a batch of remembered transitions.
pub trait Model: Send {
    /// Score every action for one observation. The index of a score is the action.
    fn predict(&mut self, input: ArrayView1<f32>) -> Result<Array1<f32>>;

    /// Fit on a batch of transitions and return the training loss.
    ///
    /// Models that do not learn keep the default, which reports zero loss.
    fn fit(&mut self, _batch: &[&Transition], _config: &LearningConfig) -> Result<f32> {
        Ok(0.0)
    }
}

impl<M: Model + ?Sized> Model for Box<M> {
    fn predict(&mut self, input: ArrayView1<f32>) -> Result<Array1<f32>> {
        (**self).predict(input)
    }

    fn fit(&mut self, batch: &[&Transition], config: &LearningConfig) -> Result<f32> {
        (**self).fit(batch, config)
    }
}
