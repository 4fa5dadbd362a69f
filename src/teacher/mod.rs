//! # Teachers
//!
//! A [`Teacher`] wraps one [`TeachingStrategy`] and drives every agent on its
//! roster through it once per tick. The roster itself is owned by the
//! academy's assignment index; the teacher is handed the rostered agents,
//! in roster order, for each call.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle -> InLesson -> LessonEnded -> InLesson ...
//!                                 \-> TeachingEnded
//! ```
//!
//! The strategy decides when lessons and the teaching run end by returning
//! [`LessonEvent`]s from `finish_tick`. The teacher applies them to its state
//! and only then runs the caller's hooks, so a hook never observes or
//! interrupts a strategy mid-update. A teacher in `TeachingEnded` hands out
//! no more actions until it is restarted.

mod episodic;
mod strategy;

pub use episodic::EpisodicStrategy;
pub use strategy::{LessonEvent, TeachingStrategy};

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::agent::Agent;
use crate::error::{AcademyError, Result};
use crate::model::Action;
use crate::tracking::AgentTracking;

/// Settings of a teacher and its default strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeachingConfig {
    /// Preferred name. Used when still free at registration.
    pub name: Option<String>,
    /// Ticks per lesson
    pub lesson_length: usize,
    /// Lessons per teaching run
    pub lessons_quantity: usize,
    /// Leading lessons in which every action is random
    pub lessons_with_random_actions: usize,
    pub epsilon: f32,
    /// Multiplier applied to epsilon after every lesson
    pub epsilon_decay: f32,
    pub min_epsilon: f32,
}

impl Default for TeachingConfig {
    fn default() -> Self {
        TeachingConfig {
            name: None,
            lesson_length: 1000,
            lessons_quantity: 30,
            lessons_with_random_actions: 2,
            epsilon: 1.0,
            epsilon_decay: 0.95,
            min_epsilon: 0.05,
        }
    }
}

impl TeachingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.lesson_length == 0 {
            return Err(AcademyError::invalid_parameter("lesson_length", "must be greater than 0"));
        }
        if self.lessons_quantity == 0 {
            return Err(AcademyError::invalid_parameter("lessons_quantity", "must be greater than 0"));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(AcademyError::invalid_parameter("epsilon", "must be within [0, 1]"));
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return Err(AcademyError::invalid_parameter("epsilon_decay", "must be within (0, 1]"));
        }
        if !(0.0..=self.epsilon).contains(&self.min_epsilon) {
            return Err(AcademyError::invalid_parameter("min_epsilon", "must be within [0, epsilon]"));
        }
        Ok(())
    }
}

/// Observable lifecycle state of a teacher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeacherState {
    Idle,
    InLesson,
    LessonEnded,
    TeachingEnded,
}

/// A lifecycle event tagged with the teacher that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct TeacherEvent {
    pub teacher: String,
    pub event: LessonEvent,
}

/// Observation handed to the students of one teacher for one tick
#[derive(Debug, Clone, PartialEq)]
pub enum AgentInputs {
    /// Every student sees the same observation
    Shared(Array1<f32>),
    /// Each student sees its own observation, keyed by agent name
    Keyed(HashMap<String, Array1<f32>>),
}

impl AgentInputs {
    pub fn shared(input: Array1<f32>) -> Self {
        AgentInputs::Shared(input)
    }

    pub fn keyed<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = (S, Array1<f32>)>,
        S: Into<String>,
    {
        AgentInputs::Keyed(inputs.into_iter().map(|(name, input)| (name.into(), input)).collect())
    }

    /// Observation meant for `agent`, if any
    pub fn for_agent(&self, agent: &str) -> Option<ArrayView1<'_, f32>> {
        match self {
            AgentInputs::Shared(input) => Some(input.view()),
            AgentInputs::Keyed(inputs) => inputs.get(agent).map(|input| input.view()),
        }
    }
}

impl From<Array1<f32>> for AgentInputs {
    fn from(input: Array1<f32>) -> Self {
        AgentInputs::Shared(input)
    }
}

impl From<Vec<f32>> for AgentInputs {
    fn from(input: Vec<f32>) -> Self {
        AgentInputs::Shared(Array1::from_vec(input))
    }
}

type TeacherHook = Box<dyn FnMut(&str) + Send>;
type LessonHook = Box<dyn FnMut(&str, usize) + Send>;

#[derive(Default)]
struct LifecycleHooks {
    lesson_ended: Option<LessonHook>,
    learning_lesson_ended: Option<TeacherHook>,
    teaching_ended: Option<TeacherHook>,
}

/// A named teaching strategy plus its lifecycle state and hooks
pub struct Teacher {
    name: String,
    config: TeachingConfig,
    strategy: Box<dyn TeachingStrategy>,
    state: TeacherState,
    hooks: LifecycleHooks,
}

impl Teacher {
    pub(crate) fn new(name: String, strategy: Box<dyn TeachingStrategy>, mut config: TeachingConfig) -> Self {
        config.name = Some(name.clone());
        Teacher {
            name,
            config,
            strategy,
            state: TeacherState::Idle,
            hooks: LifecycleHooks::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &TeachingConfig {
        &self.config
    }

    pub fn state(&self) -> TeacherState {
        self.state
    }

    /// Called with the teacher name and the number of the lesson that ended
    pub fn on_lesson_ended<F>(&mut self, callback: F)
    where
        F: FnMut(&str, usize) + Send + 'static,
    {
        self.hooks.lesson_ended = Some(Box::new(callback));
    }

    /// Called with the teacher name once students have learned from a lesson
    pub fn on_learning_lesson_ended<F>(&mut self, callback: F)
    where
        F: FnMut(&str) + Send + 'static,
    {
        self.hooks.learning_lesson_ended = Some(Box::new(callback));
    }

    /// Called with the teacher name when the teaching run is over
    pub fn on_teaching_ended<F>(&mut self, callback: F)
    where
        F: FnMut(&str) + Send + 'static,
    {
        self.hooks.teaching_ended = Some(Box::new(callback));
    }

    /// Run one tick over `students`, which must be in roster order.
    ///
    /// Returns the chosen actions in roster order together with the lifecycle
    /// events of the tick. Fails with `MissingAgentInput` before the strategy
    /// is touched if a student has no observation.
    pub fn teach(
        &mut self,
        students: &mut [&mut Agent],
        inputs: &AgentInputs,
    ) -> Result<(Vec<(String, Action)>, Vec<TeacherEvent>)> {
        if self.state == TeacherState::TeachingEnded {
            debug!("teacher '{}' has finished teaching, no actions", self.name);
            return Ok((Vec::new(), Vec::new()));
        }

        let mut observations = Vec::with_capacity(students.len());
        for student in students.iter() {
            let input = inputs.for_agent(student.name()).ok_or_else(|| AcademyError::MissingAgentInput {
                teacher: self.name.clone(),
                agent: student.name().to_string(),
            })?;
            observations.push(input);
        }

        self.state = TeacherState::InLesson;

        let mut actions = Vec::with_capacity(students.len());
        for (student, input) in students.iter_mut().zip(observations) {
            let action = self.strategy.act(student, input)?;
            actions.push((student.name().to_string(), action));
        }

        debug!("teacher '{}' taught {} students", self.name, actions.len());

        let events = self.strategy.finish_tick(students)?;
        for event in &events {
            self.apply(event);
        }
        self.dispatch(&events);

        let events = events
            .into_iter()
            .map(|event| TeacherEvent {
                teacher: self.name.clone(),
                event,
            })
            .collect();

        Ok((actions, events))
    }

    /// Tracking history of every student
    pub fn data(&self, students: &[&Agent]) -> Vec<AgentTracking> {
        students
            .iter()
            .map(|student| AgentTracking::new(student.name(), student.tracking_data()))
            .collect()
    }

    /// Reset the strategy and return to `Idle`
    pub fn restart(&mut self) {
        self.strategy.reset();
        self.state = TeacherState::Idle;
    }

    fn apply(&mut self, event: &LessonEvent) {
        let next = match event {
            LessonEvent::LessonEnded { .. } | LessonEvent::LearningLessonEnded { .. } => TeacherState::LessonEnded,
            LessonEvent::TeachingEnded { .. } => TeacherState::TeachingEnded,
        };
        if self.state != TeacherState::TeachingEnded {
            debug!("teacher '{}': {:?} -> {:?}", self.name, self.state, next);
            self.state = next;
        }
    }

    fn dispatch(&mut self, events: &[LessonEvent]) {
        for event in events {
            match event {
                LessonEvent::LessonEnded { lesson } => {
                    if let Some(hook) = self.hooks.lesson_ended.as_mut() {
                        hook(&self.name, *lesson);
                    }
                }
                LessonEvent::LearningLessonEnded { .. } => {
                    if let Some(hook) = self.hooks.learning_lesson_ended.as_mut() {
                        hook(&self.name);
                    }
                }
                LessonEvent::TeachingEnded { .. } => {
                    if let Some(hook) = self.hooks.teaching_ended.as_mut() {
                        hook(&self.name);
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for Teacher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Teacher")
            .field("name", &self.name)
            .field("state", &self.state)
            .finish()
    }
}
