//! # The Academy
//!
//! The academy is the registry and step-dispatch authority over agents and
//! teachers. Agents and teachers live in arenas addressed by unique name; the
//! assignment of agents to teachers is a separate index and the only record
//! of who teaches whom. A teacher's roster is read from that index, in the
//! order agents were assigned.
//!
//! ## Example
//!
//! ```rust,no_run
//! use academy::academy::{Academy, StepInput};
//! use academy::agent::BuildAgentConfig;
//! use academy::error::Result;
//! use academy::model::Model;
//! use ndarray::{array, Array1, ArrayView1};
//!
//! struct Echo;
//!
//! impl Model for Echo {
//!     fn predict(&mut self, input: ArrayView1<f32>) -> Result<Array1<f32>> {
//!         Ok(input.to_owned())
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let mut academy = Academy::new();
//! let agent = academy.add_agent(BuildAgentConfig::new(Echo), Some("walker"))?;
//! let teacher = academy.add_teacher(None, Some("coach"))?;
//! academy.assign_teacher_to_agent(&agent, &teacher)?;
//!
//! let actions = academy.step(StepInput::new("coach", array![0.2, 0.8]))?;
//! academy.add_reward_to_agent(&agent, if actions["walker"] == 1 { 1.0 } else { -1.0 });
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};
use tracing::{debug, warn};

use crate::agent::{Agent, BuildAgentConfig};
use crate::config::{AcademyConfig, UnknownTeacherPolicy};
use crate::error::{AcademyError, EntityKind, Result};
use crate::identity::{resolve_name, NameGenerator, UuidNameGenerator};
use crate::logger::{AgentRow, TickLogger, TickReport};
use crate::model::Action;
use crate::teacher::{
    AgentInputs, EpisodicStrategy, Teacher, TeacherEvent, TeacherState, TeachingConfig, TeachingStrategy,
};
use crate::tracking::AgentTracking;

/// Actions handed out by one step, keyed by agent name
pub type Actions = HashMap<String, Action>;

/// Input of one teacher for one step
#[derive(Debug, Clone, PartialEq)]
pub struct StepInput {
    pub teacher_name: String,
    pub agents_input: AgentInputs,
}

impl StepInput {
    pub fn new<S, I>(teacher_name: S, agents_input: I) -> Self
    where
        S: Into<String>,
        I: Into<AgentInputs>,
    {
        StepInput {
            teacher_name: teacher_name.into(),
            agents_input: agents_input.into(),
        }
    }
}

/// Ordered entries of one step; built from a single input or a sequence
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StepBatch(pub Vec<StepInput>);

impl From<StepInput> for StepBatch {
    fn from(input: StepInput) -> Self {
        StepBatch(vec![input])
    }
}

impl From<Vec<StepInput>> for StepBatch {
    fn from(inputs: Vec<StepInput>) -> Self {
        StepBatch(inputs)
    }
}

impl<const N: usize> From<[StepInput; N]> for StepBatch {
    fn from(inputs: [StepInput; N]) -> Self {
        StepBatch(inputs.into())
    }
}

#[derive(Debug, Clone, Copy)]
struct Assignment {
    teacher: usize,
    // Position in the teacher's roster
    seq: u64,
}

/// Coordinator of agents, teachers and the ticks that drive them
pub struct Academy {
    config: AcademyConfig,
    names: Box<dyn NameGenerator>,
    agents: Vec<Agent>,
    agent_index: HashMap<String, usize>,
    teachers: Vec<Teacher>,
    teacher_index: HashMap<String, usize>,
    assignments: HashMap<usize, Assignment>,
    next_seq: u64,
    tick: u64,
    logger: Option<Box<dyn TickLogger>>,
    subscribers: Vec<Sender<TeacherEvent>>,
}

impl Academy {
    pub fn new() -> Self {
        Self::with_config(AcademyConfig::default())
    }

    pub fn with_config(config: AcademyConfig) -> Self {
        Self::with_parts(config, Box::new(UuidNameGenerator))
    }

    pub(crate) fn with_parts(config: AcademyConfig, names: Box<dyn NameGenerator>) -> Self {
        Academy {
            config,
            names,
            agents: Vec::new(),
            agent_index: HashMap::new(),
            teachers: Vec::new(),
            teacher_index: HashMap::new(),
            assignments: HashMap::new(),
            next_seq: 0,
            tick: 0,
            logger: None,
            subscribers: Vec::new(),
        }
    }

    pub fn config(&self) -> &AcademyConfig {
        &self.config
    }

    /// Register an agent and return its resolved name.
    ///
    /// The name embedded in the agent config wins, then `name`, then a
    /// generated one; taken names fall through to the next choice.
    pub fn add_agent(&mut self, build: BuildAgentConfig, name: Option<&str>) -> Result<String> {
        let BuildAgentConfig {
            model,
            agent_config,
            learning_config,
        } = build;
        let agent_config = agent_config.unwrap_or_default();

        let index = &self.agent_index;
        let resolved = resolve_name(
            EntityKind::Agent,
            agent_config.name.as_deref(),
            name,
            |candidate| index.contains_key(candidate),
            self.names.as_mut(),
        )?;

        let agent = Agent::new(resolved.clone(), model, agent_config, learning_config.unwrap_or_default());
        self.agent_index.insert(resolved.clone(), self.agents.len());
        self.agents.push(agent);

        debug!("registered agent '{}'", resolved);
        Ok(resolved)
    }

    /// Register a teacher running the default [`EpisodicStrategy`]
    pub fn add_teacher(&mut self, config: Option<TeachingConfig>, name: Option<&str>) -> Result<String> {
        let config = config.unwrap_or_default();
        let seed = self.config.seed.map(|seed| seed.wrapping_add(self.teachers.len() as u64));
        let strategy = EpisodicStrategy::new(config.clone(), seed)?;
        self.add_teacher_with_strategy(strategy, Some(config), name)
    }

    /// Register a teacher running a caller-supplied strategy.
    ///
    /// Only the name of `config` is used for naming; the strategy is expected
    /// to carry its own settings.
    pub fn add_teacher_with_strategy<S>(
        &mut self,
        strategy: S,
        config: Option<TeachingConfig>,
        name: Option<&str>,
    ) -> Result<String>
    where
        S: TeachingStrategy + 'static,
    {
        let config = config.unwrap_or_default();

        let index = &self.teacher_index;
        let resolved = resolve_name(
            EntityKind::Teacher,
            config.name.as_deref(),
            name,
            |candidate| index.contains_key(candidate),
            self.names.as_mut(),
        )?;

        let teacher = Teacher::new(resolved.clone(), Box::new(strategy), config);
        self.teacher_index.insert(resolved.clone(), self.teachers.len());
        self.teachers.push(teacher);

        debug!("registered teacher '{}'", resolved);
        Ok(resolved)
    }

    /// Put `agent_name` on the roster of `teacher_name`.
    ///
    /// An agent has at most one teacher: assigning it elsewhere moves it to
    /// the end of the new roster and drops its half-finished transition, so
    /// replay memory never mixes observations of two teachers. Assigning it
    /// to its current teacher changes nothing.
    pub fn assign_teacher_to_agent(&mut self, agent_name: &str, teacher_name: &str) -> Result<()> {
        let agent = self.agent_id(agent_name)?;
        let teacher = self.teacher_id(teacher_name)?;

        if let Some(current) = self.assignments.get(&agent) {
            if current.teacher == teacher {
                return Ok(());
            }
            debug!(
                "moving agent '{}' from teacher '{}' to '{}'",
                agent_name,
                self.teachers[current.teacher].name(),
                teacher_name
            );
            self.agents[agent].abandon_transition();
        }

        self.assignments.insert(agent, Assignment { teacher, seq: self.next_seq });
        self.next_seq += 1;
        Ok(())
    }

    /// Run one tick.
    ///
    /// Entries are processed in order. Each named teacher drives its roster
    /// and the resulting actions are merged into one mapping; an agent that
    /// receives a second action fails the step with `DuplicateAction`. An
    /// unknown teacher is skipped or fails the step according to
    /// [`AcademyConfig::unknown_teacher_in_step`]. Once every entry is done
    /// the attached logger is notified.
    pub fn step<B: Into<StepBatch>>(&mut self, inputs: B) -> Result<Actions> {
        let StepBatch(entries) = inputs.into();
        let mut actions = Actions::new();

        for entry in entries {
            let teacher = match self.teacher_index.get(&entry.teacher_name) {
                Some(&teacher) => teacher,
                None => match self.config.unknown_teacher_in_step {
                    UnknownTeacherPolicy::Skip => {
                        warn!("No teacher has name {}, skipping its input", entry.teacher_name);
                        continue;
                    }
                    UnknownTeacherPolicy::Fail => {
                        return Err(AcademyError::unknown_teacher(entry.teacher_name));
                    }
                },
            };

            let roster = self.roster_ids(teacher);
            let (taught, events) = {
                let mut slots: Vec<Option<&mut Agent>> = self.agents.iter_mut().map(Some).collect();
                let mut students: Vec<&mut Agent> = roster.iter().filter_map(|&id| slots[id].take()).collect();
                self.teachers[teacher].teach(&mut students, &entry.agents_input)?
            };
            self.publish(&events);

            for (agent, action) in taught {
                if actions.contains_key(&agent) {
                    return Err(AcademyError::DuplicateAction { agent });
                }
                actions.insert(agent, action);
            }
        }

        let tick = self.tick;
        self.tick += 1;

        if self.logger.is_some() {
            let report = self.report(tick, &actions);
            if let Some(logger) = self.logger.as_mut() {
                if let Err(err) = logger.on_tick(&report) {
                    warn!("tick logger failed on tick {}: {}", tick, err);
                }
            }
        }

        Ok(actions)
    }

    /// Add to an agent's reward. Unknown names are ignored.
    pub fn add_reward_to_agent(&mut self, name: &str, reward: f32) {
        if let Some(&id) = self.agent_index.get(name) {
            self.agents[id].add_reward(reward);
        }
    }

    /// Overwrite an agent's reward. Unknown names are ignored.
    pub fn set_reward_of_agent(&mut self, name: &str, reward: f32) {
        if let Some(&id) = self.agent_index.get(name) {
            self.agents[id].set_reward(reward);
        }
    }

    /// Install the hook run for `teacher_name` once its students have learned from a lesson, replacing any
    /// previous one. Fails with `UnknownEntity` for an unregistered teacher
    /// instead of silently dropping the hook.
    pub fn on_learning_lesson_ended<F>(&mut self, teacher_name: &str, callback: F) -> Result<()>
    where
        F: FnMut(&str) + Send + 'static,
    {
        let id = self.teacher_id(teacher_name)?;
        self.teachers[id].on_learning_lesson_ended(callback);
        Ok(())
    }

    /// Install the hook run for `teacher_name` whenever one of its lessons ends, replacing any
    /// previous one. Fails with `UnknownEntity` for an unregistered teacher
    /// instead of silently dropping the hook.
    pub fn on_lesson_ended<F>(&mut self, teacher_name: &str, callback: F) -> Result<()>
    where
        F: FnMut(&str, usize) + Send + 'static,
    {
        let id = self.teacher_id(teacher_name)?;
        self.teachers[id].on_lesson_ended(callback);
        Ok(())
    }

    /// Install the hook run for `teacher_name` when its teaching run is over, replacing any
    /// previous one. Fails with `UnknownEntity` for an unregistered teacher
    /// instead of silently dropping the hook.
    pub fn on_teaching_ended<F>(&mut self, teacher_name: &str, callback: F) -> Result<()>
    where
        F: FnMut(&str) + Send + 'static,
    {
        let id = self.teacher_id(teacher_name)?;
        self.teachers[id].on_teaching_ended(callback);
        Ok(())
    }

    /// Receive every lifecycle event from every teacher, in emission order
    pub fn subscribe(&mut self) -> Receiver<TeacherEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    /// Forget every agent, teacher and assignment. Logger and subscribers stay.
    pub fn reset(&mut self) {
        self.agents.clear();
        self.agent_index.clear();
        self.teachers.clear();
        self.teacher_index.clear();
        self.assignments.clear();
        self.next_seq = 0;
        self.tick = 0;
    }

    /// Teacher names in registration order
    pub fn teachers(&self) -> Vec<String> {
        self.teachers.iter().map(|t| t.name().to_string()).collect()
    }

    /// Agent names in registration order
    pub fn agents(&self) -> Vec<String> {
        self.agents.iter().map(|a| a.name().to_string()).collect()
    }

    pub fn agent(&self, name: &str) -> Option<&Agent> {
        self.agent_index.get(name).map(|&id| &self.agents[id])
    }

    /// Tracking data of every agent on the teacher's roster
    pub fn get_teacher_data(&self, name: &str) -> Result<Vec<AgentTracking>> {
        let id = self.teacher_id(name)?;
        let students: Vec<&Agent> = self.roster_ids(id).into_iter().map(|a| &self.agents[a]).collect();
        Ok(self.teachers[id].data(&students))
    }

    pub fn teacher_state(&self, name: &str) -> Result<TeacherState> {
        let id = self.teacher_id(name)?;
        Ok(self.teachers[id].state())
    }

    /// Agent names on the teacher's roster, in roster order
    pub fn roster(&self, name: &str) -> Result<Vec<String>> {
        let id = self.teacher_id(name)?;
        Ok(self
            .roster_ids(id)
            .into_iter()
            .map(|a| self.agents[a].name().to_string())
            .collect())
    }

    /// Name of the teacher the agent is assigned to
    pub fn assignment_of(&self, agent_name: &str) -> Option<&str> {
        let agent = self.agent_index.get(agent_name)?;
        self.assignments
            .get(agent)
            .map(|assignment| self.teachers[assignment.teacher].name())
    }

    /// Start the teacher's strategy over from its first lesson
    pub fn restart_teacher(&mut self, name: &str) -> Result<()> {
        let id = self.teacher_id(name)?;
        self.teachers[id].restart();
        Ok(())
    }

    /// Number of completed ticks since creation or the last reset
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Attach a tick logger, disposing any logger already attached
    pub fn attach_logger<L: TickLogger + 'static>(&mut self, logger: L) {
        if let Some(mut previous) = self.logger.take() {
            previous.dispose();
        }
        self.logger = Some(Box::new(logger));
    }

    /// Dispose and hand back the attached logger
    pub fn detach_logger(&mut self) -> Option<Box<dyn TickLogger>> {
        let mut logger = self.logger.take()?;
        logger.dispose();
        Some(logger)
    }

    pub fn has_logger(&self) -> bool {
        self.logger.is_some()
    }

    fn agent_id(&self, name: &str) -> Result<usize> {
        self.agent_index
            .get(name)
            .copied()
            .ok_or_else(|| AcademyError::unknown_agent(name))
    }

    fn teacher_id(&self, name: &str) -> Result<usize> {
        self.teacher_index
            .get(name)
            .copied()
            .ok_or_else(|| AcademyError::unknown_teacher(name))
    }

    fn roster_ids(&self, teacher: usize) -> Vec<usize> {
        let mut roster: Vec<(u64, usize)> = self
            .assignments
            .iter()
            .filter(|(_, assignment)| assignment.teacher == teacher)
            .map(|(&agent, assignment)| (assignment.seq, agent))
            .collect();
        roster.sort_unstable();
        roster.into_iter().map(|(_, agent)| agent).collect()
    }

    fn publish(&mut self, events: &[TeacherEvent]) {
        if events.is_empty() {
            return;
        }
        self.subscribers
            .retain(|tx| events.iter().all(|event| tx.send(event.clone()).is_ok()));
    }

    fn report(&self, tick: u64, actions: &Actions) -> TickReport {
        let rows = self
            .agents
            .iter()
            .enumerate()
            .map(|(id, agent)| AgentRow {
                agent: agent.name().to_string(),
                teacher: self
                    .assignments
                    .get(&id)
                    .map(|assignment| self.teachers[assignment.teacher].name().to_string()),
                action: actions.get(agent.name()).copied(),
                step_reward: agent.last_record().map(|record| record.reward),
                pending_reward: agent.reward(),
                steps: agent.steps(),
            })
            .collect();

        TickReport { tick, rows }
    }
}

impl Default for Academy {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Academy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Academy")
            .field("agents", &self.agents)
            .field("teachers", &self.teachers)
            .field("tick", &self.tick)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentConfig;
    use crate::identity::SequentialNameGenerator;
    use crate::model::Model;
    use crate::teacher::LessonEvent;
    use ndarray::{array, Array1, ArrayView1};

    struct Echo;

    impl Model for Echo {
        fn predict(&mut self, input: ArrayView1<f32>) -> Result<Array1<f32>> {
            Ok(input.to_owned())
        }
    }

    fn academy() -> Academy {
        let config = AcademyConfig {
            seed: Some(11),
            ..AcademyConfig::default()
        };
        Academy::with_parts(config, Box::new(SequentialNameGenerator::new("id")))
    }

    fn greedy() -> TeachingConfig {
        TeachingConfig {
            lesson_length: 2,
            lessons_quantity: 1,
            lessons_with_random_actions: 0,
            epsilon: 0.0,
            min_epsilon: 0.0,
            ..TeachingConfig::default()
        }
    }

    #[test]
    fn test_agent_config_name_wins_over_suggestion() {
        let mut academy = academy();
        let build = BuildAgentConfig::new(Echo).agent_config(AgentConfig {
            name: Some("from-config".to_string()),
            ..AgentConfig::default()
        });

        assert_eq!(academy.add_agent(build, Some("suggested")).unwrap(), "from-config");
        assert_eq!(academy.add_agent(BuildAgentConfig::new(Echo), Some("from-config")).unwrap(), "id-0");
    }

    #[test]
    fn test_namespaces_are_independent() {
        let mut academy = academy();
        assert_eq!(academy.add_agent(BuildAgentConfig::new(Echo), Some("shared")).unwrap(), "shared");
        assert_eq!(academy.add_teacher(None, Some("shared")).unwrap(), "shared");
    }

    #[test]
    fn test_invalid_teaching_config_rejected() {
        let mut academy = academy();
        let config = TeachingConfig { lesson_length: 0, ..TeachingConfig::default() };
        assert!(academy.add_teacher(Some(config), Some("coach")).is_err());
        assert!(academy.teachers().is_empty());
    }

    #[test]
    fn test_reassignment_moves_agent() {
        let mut academy = academy();
        for name in ["a", "b"] {
            academy.add_agent(BuildAgentConfig::new(Echo), Some(name)).unwrap();
        }
        academy.add_teacher(None, Some("t1")).unwrap();
        academy.add_teacher(None, Some("t2")).unwrap();

        academy.assign_teacher_to_agent("a", "t1").unwrap();
        academy.assign_teacher_to_agent("b", "t1").unwrap();
        academy.assign_teacher_to_agent("a", "t1").unwrap();
        assert_eq!(academy.roster("t1").unwrap(), vec!["a", "b"]);

        academy.assign_teacher_to_agent("a", "t2").unwrap();
        assert_eq!(academy.roster("t1").unwrap(), vec!["b"]);
        assert_eq!(academy.roster("t2").unwrap(), vec!["a"]);
        assert_eq!(academy.assignment_of("a"), Some("t2"));

        academy.assign_teacher_to_agent("a", "t1").unwrap();
        assert_eq!(academy.roster("t1").unwrap(), vec!["b", "a"]);
    }

    #[test]
    fn test_reassignment_drops_pending_transition() {
        let mut academy = academy();
        academy.add_agent(BuildAgentConfig::new(Echo), Some("a")).unwrap();
        academy.add_teacher(Some(TeachingConfig { lesson_length: 10, ..greedy() }), Some("t1")).unwrap();
        academy.add_teacher(Some(TeachingConfig { lesson_length: 10, ..greedy() }), Some("t2")).unwrap();
        academy.assign_teacher_to_agent("a", "t1").unwrap();

        academy.step(StepInput::new("t1", vec![0.0, 1.0])).unwrap();
        academy.assign_teacher_to_agent("a", "t2").unwrap();
        academy.step(StepInput::new("t2", vec![5.0, 5.0, 5.0])).unwrap();
        assert!(academy.agent("a").unwrap().memory().is_empty());

        // Transitions under the new teacher are stored as usual
        academy.step(StepInput::new("t2", vec![1.0, 0.0, 0.0])).unwrap();
        let memory = academy.agent("a").unwrap().memory();
        assert_eq!(memory.len(), 1);

        // Re-assigning to the current teacher keeps the pending transition
        academy.assign_teacher_to_agent("a", "t2").unwrap();
        academy.step(StepInput::new("t2", vec![0.0, 0.0, 1.0])).unwrap();
        assert_eq!(academy.agent("a").unwrap().memory().len(), 2);
    }

    #[test]
    fn test_unknown_teacher_policy_fail() {
        let config = AcademyConfig {
            unknown_teacher_in_step: UnknownTeacherPolicy::Fail,
            seed: Some(1),
        };
        let mut academy = Academy::with_config(config);
        let err = academy.step(StepInput::new("ghost", vec![1.0])).unwrap_err();
        assert!(err.is_unknown_entity());
        assert_eq!(academy.tick(), 0);
    }

    #[test]
    fn test_events_reach_subscribers_and_hooks() {
        let mut academy = academy();
        academy.add_agent(BuildAgentConfig::new(Echo), Some("a")).unwrap();
        academy.add_teacher(Some(greedy()), Some("coach")).unwrap();
        academy.assign_teacher_to_agent("a", "coach").unwrap();

        let events = academy.subscribe();
        let (tx, hook_rx) = channel();
        academy
            .on_teaching_ended("coach", move |name| tx.send(name.to_string()).unwrap())
            .unwrap();

        academy.step(StepInput::new("coach", vec![0.0, 1.0])).unwrap();
        assert!(events.try_recv().is_err());

        academy.step(StepInput::new("coach", vec![0.0, 1.0])).unwrap();
        let received: Vec<LessonEvent> = events.try_iter().map(|e| e.event).collect();
        assert_eq!(received.len(), 3);
        assert_eq!(received[0], LessonEvent::LessonEnded { lesson: 0 });
        assert_eq!(received[2], LessonEvent::TeachingEnded { lessons: 1 });
        assert_eq!(hook_rx.try_recv().unwrap(), "coach");
        assert_eq!(academy.teacher_state("coach").unwrap(), TeacherState::TeachingEnded);

        // Finished teaching: no more actions until restarted
        assert!(academy.step(StepInput::new("coach", vec![0.0, 1.0])).unwrap().is_empty());
        academy.restart_teacher("coach").unwrap();
        assert_eq!(academy.step(StepInput::new("coach", vec![0.0, 1.0])).unwrap()["a"], 1);
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let mut academy = academy();
        academy.add_agent(BuildAgentConfig::new(Echo), Some("a")).unwrap();
        academy.add_teacher(Some(TeachingConfig { lesson_length: 1, ..greedy() }), Some("coach")).unwrap();
        academy.assign_teacher_to_agent("a", "coach").unwrap();

        drop(academy.subscribe());
        academy.step(StepInput::new("coach", vec![1.0])).unwrap();
        assert!(academy.subscribers.is_empty());
    }

    #[test]
    fn test_callbacks_on_unknown_teacher() {
        let mut academy = academy();
        assert!(academy.on_lesson_ended("ghost", |_, _| {}).unwrap_err().is_unknown_entity());
        assert!(academy.on_learning_lesson_ended("ghost", |_| {}).is_err());
        assert!(academy.on_teaching_ended("ghost", |_| {}).is_err());
    }
}
