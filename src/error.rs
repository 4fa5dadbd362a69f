use std::fmt;

use thiserror::Error;

/// Result type for Academy operations
pub type Result<T> = std::result::Result<T, AcademyError>;

/// The two registries an entity name can live in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Agent,
    Teacher,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Agent => write!(f, "agent"),
            EntityKind::Teacher => write!(f, "teacher"),
        }
    }
}

/// Main error type for the Academy
#[derive(Error, Debug)]
pub enum AcademyError {
    /// Name not registered in the agent or teacher registry
    #[error("no {kind} named '{name}' has been registered")]
    UnknownEntity { kind: EntityKind, name: String },

    /// Two step entries produced an action for the same agent
    #[error("agent '{agent}' has already registered an action this step")]
    DuplicateAction { agent: String },

    /// Keyed step input lacks an observation for a rostered agent
    #[error("teacher '{teacher}' received no input for agent '{agent}'")]
    MissingAgentInput { teacher: String, agent: String },

    /// The name generator kept producing names that were already taken
    #[error("could not generate a free {kind} name after {attempts} attempts")]
    NameExhausted { kind: EntityKind, attempts: usize },

    /// Invalid parameter value
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Failure reported by a model or teaching strategy
    #[error("model error: {0}")]
    Model(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

// Helper functions for common error patterns
impl AcademyError {
    pub fn unknown_agent<S: Into<String>>(name: S) -> Self {
        AcademyError::UnknownEntity {
            kind: EntityKind::Agent,
            name: name.into(),
        }
    }

    pub fn unknown_teacher<S: Into<String>>(name: S) -> Self {
        AcademyError::UnknownEntity {
            kind: EntityKind::Teacher,
            name: name.into(),
        }
    }

    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        AcademyError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// True for `UnknownEntity` errors of either kind
    pub fn is_unknown_entity(&self) -> bool {
        matches!(self, AcademyError::UnknownEntity { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_entity_messages() {
        let err = AcademyError::unknown_teacher("coach");
        assert!(err.is_unknown_entity());
        assert_eq!(err.to_string(), "no teacher named 'coach' has been registered");

        let err = AcademyError::unknown_agent("bot");
        assert_eq!(err.to_string(), "no agent named 'bot' has been registered");
    }

    #[test]
    fn test_duplicate_action_message() {
        let err = AcademyError::DuplicateAction { agent: "bot".to_string() };
        assert!(!err.is_unknown_entity());
        assert!(err.to_string().contains("already registered an action"));
    }
}
