//! # Academy - Coordination of Learning Agents and Their Teachers
//!
//! Academy is the orchestration layer of an episodic reinforcement-learning
//! loop. It registers learning agents and the teachers that train them,
//! binds agents to teachers, and advances everyone through synchronized
//! step ticks while reporting the lesson/teaching lifecycle.
//!
//! The learning model and the teaching algorithm stay opaque: an agent wraps
//! any [`Model`](model::Model), a teacher wraps any
//! [`TeachingStrategy`](teacher::TeachingStrategy). A default lesson-based
//! epsilon-greedy strategy ships with the crate.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use academy::academy::StepInput;
//! use academy::agent::BuildAgentConfig;
//! use academy::builders::AcademyBuilder;
//! use academy::model::Model;
//! use academy::teacher::TeachingConfig;
//! use ndarray::{array, Array1, ArrayView1};
//!
//! struct Echo;
//!
//! impl Model for Echo {
//!     fn predict(&mut self, input: ArrayView1<f32>) -> academy::error::Result<Array1<f32>> {
//!         Ok(input.to_owned())
//!     }
//! }
//!
//! let mut academy = AcademyBuilder::new().seed(7).build();
//! let agent = academy.add_agent(BuildAgentConfig::new(Echo), Some("walker")).unwrap();
//! let config = TeachingConfig { lesson_length: 100, ..TeachingConfig::default() };
//! let teacher = academy.add_teacher(Some(config), Some("coach")).unwrap();
//! academy.assign_teacher_to_agent(&agent, &teacher).unwrap();
//!
//! academy.on_lesson_ended(&teacher, |name, lesson| println!("{} finished lesson {}", name, lesson)).unwrap();
//!
//! for _ in 0..1000 {
//!     let actions = academy.step(StepInput::new("coach", array![0.5, 0.1])).unwrap();
//!     let reward = if actions["walker"] == 0 { 1.0 } else { 0.0 };
//!     academy.add_reward_to_agent("walker", reward);
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`academy`] - The coordinator: registration, assignment, step dispatch
//! - [`agent`] - Agent handles, agent and learning configuration
//! - [`builders`] - Builder for the academy
//! - [`config`] - Academy-wide configuration
//! - [`error`] - Error types and result handling
//! - [`identity`] - Name resolution and injectable name generators
//! - [`logger`] - Per-tick logger collaborators
//! - [`memory`] - Replay memory of transitions
//! - [`model`] - The opaque model capability
//! - [`teacher`] - Teacher handles, strategies and lifecycle
//! - [`tracking`] - Per-agent tracking records

pub mod academy;
pub mod agent;
pub mod builders;
pub mod config;
pub mod error;
pub mod identity;
pub mod logger;
pub mod memory;
pub mod model;
pub mod teacher;
pub mod tracking;

pub use academy::{Academy, Actions, StepBatch, StepInput};
pub use error::{AcademyError, Result};
