use ndarray::{Array1, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::agent::Agent;
use crate::error::{AcademyError, Result};
use crate::model::Action;
use crate::teacher::strategy::{LessonEvent, TeachingStrategy};
use crate::teacher::TeachingConfig;

/// Default teaching loop: fixed-length lessons with epsilon-greedy acting.
///
/// Every tick each student consumes its accumulated reward, closes its
/// pending transition, and picks an action. The first
/// `lessons_with_random_actions` lessons act uniformly at random; afterwards
/// the strategy explores with probability `epsilon` and otherwise takes the
/// highest-scoring action. After `lesson_length` ticks the lesson ends, every
/// student learns from its replay memory, and epsilon decays. After
/// `lessons_quantity` lessons the teaching run is over.
pub struct EpisodicStrategy {
    config: TeachingConfig,
    epsilon: f32,
    lesson: usize,
    lesson_tick: usize,
    seed: Option<u64>,
    rng: StdRng,
}

impl EpisodicStrategy {
    /// Build a strategy from a validated config. `seed` makes exploration and
    /// replay sampling reproducible.
    pub fn new(config: TeachingConfig, seed: Option<u64>) -> Result<Self> {
        config.validate()?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(EpisodicStrategy {
            epsilon: config.epsilon,
            config,
            lesson: 0,
            lesson_tick: 0,
            seed,
            rng,
        })
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Index of the lesson in progress
    pub fn lesson(&self) -> usize {
        self.lesson
    }

    pub fn is_finished(&self) -> bool {
        self.lesson >= self.config.lessons_quantity
    }

    fn exploration_rate(&self) -> f32 {
        if self.lesson < self.config.lessons_with_random_actions {
            1.0
        } else {
            self.epsilon
        }
    }
}

fn argmax(scores: &Array1<f32>) -> Action {
    let mut best = 0;
    for (i, &score) in scores.iter().enumerate() {
        if score > scores[best] || scores[best].is_nan() {
            best = i;
        }
    }
    best
}

impl TeachingStrategy for EpisodicStrategy {
    fn act(&mut self, student: &mut Agent, input: ArrayView1<f32>) -> Result<Action> {
        let reward = student.take_reward();
        student.close_transition(input, reward);

        let scores = student.predict(input)?;
        if scores.is_empty() {
            return Err(AcademyError::Model(format!(
                "model of agent '{}' scored no actions",
                student.name()
            )));
        }

        let exploration = self.exploration_rate();
        let action = if exploration > 0.0 && self.rng.gen::<f32>() < exploration {
            self.rng.gen_range(0..scores.len())
        } else {
            argmax(&scores)
        };

        student.open_transition(input.to_owned(), action);
        student.record_step(action, reward, exploration, self.lesson);
        Ok(action)
    }

    fn finish_tick(&mut self, students: &mut [&mut Agent]) -> Result<Vec<LessonEvent>> {
        let mut events = Vec::new();
        if self.is_finished() {
            return Ok(events);
        }

        self.lesson_tick += 1;
        if self.lesson_tick < self.config.lesson_length {
            return Ok(events);
        }

        let lesson = self.lesson;
        events.push(LessonEvent::LessonEnded { lesson });

        let mut losses = Vec::new();
        for student in students.iter_mut() {
            if let Some(loss) = student.learn(&mut self.rng)? {
                losses.push(loss);
            }
        }
        let loss = if losses.is_empty() {
            None
        } else {
            Some(losses.iter().sum::<f32>() / losses.len() as f32)
        };
        events.push(LessonEvent::LearningLessonEnded { lesson, loss });

        self.lesson_tick = 0;
        self.lesson += 1;
        self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.min_epsilon);

        if self.is_finished() {
            events.push(LessonEvent::TeachingEnded { lessons: self.lesson });
        }

        Ok(events)
    }

    fn reset(&mut self) {
        self.epsilon = self.config.epsilon;
        self.lesson = 0;
        self.lesson_tick = 0;
        if let Some(seed) = self.seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
    }
}
