use ndarray::ArrayView1;

use crate::agent::Agent;
use crate::error::Result;
use crate::model::Action;

/// Lifecycle signal reported by a strategy at the end of a tick
#[derive(Debug, Clone, PartialEq)]
pub enum LessonEvent {
    /// Lesson number `lesson` (0-based) is over
    LessonEnded { lesson: usize },
    /// Students finished learning from lesson `lesson`; `loss` is their mean loss
    LearningLessonEnded { lesson: usize, loss: Option<f32> },
    /// The whole teaching run is over after `lessons` lessons
    TeachingEnded { lessons: usize },
}

/// How a teacher turns observations into actions and decides when lessons end.
///
/// A tick is one `act` call per rostered student, in roster order, followed
/// by one `finish_tick` call over the whole roster.
pub trait TeachingStrategy: Send {
    /// Choose an action for `student` given its observation
    fn act(&mut self, student: &mut Agent, input: ArrayView1<f32>) -> Result<Action>;

    /// Close the tick and report any lifecycle events, in the order they happened
    fn finish_tick(&mut self, students: &mut [&mut Agent]) -> Result<Vec<LessonEvent>>;

    /// Forget all progress and start a new teaching run
    fn reset(&mut self) {}
}
