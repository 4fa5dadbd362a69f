//! # Entity naming
//!
//! Agents and teachers are addressed by name. A name comes from one of three
//! places, tried in order:
//!
//! 1. the name embedded in the entity's configuration,
//! 2. the name suggested by the caller at registration,
//! 3. a fresh name from the academy's [`NameGenerator`].
//!
//! Tiers 1 and 2 only win when the name is still free in the entity's own
//! registry. Generators are injectable so tests can use predictable names.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

use crate::error::{AcademyError, EntityKind, Result};

/// Upper bound on generator retries before giving up on a free name
pub const MAX_NAME_ATTEMPTS: usize = 64;

/// Source of fresh entity names
pub trait NameGenerator: Send {
    /// Produce a candidate name. Callers retry on collision.
    fn generate(&mut self) -> String;
}

/// Random v4 UUIDs. The default generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidNameGenerator;

impl NameGenerator for UuidNameGenerator {
    fn generate(&mut self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// `prefix-0`, `prefix-1`, ...
#[derive(Debug, Clone)]
pub struct SequentialNameGenerator {
    prefix: String,
    next: u64,
}

impl SequentialNameGenerator {
    pub fn new<S: Into<String>>(prefix: S) -> Self {
        SequentialNameGenerator {
            prefix: prefix.into(),
            next: 0,
        }
    }
}

impl NameGenerator for SequentialNameGenerator {
    fn generate(&mut self) -> String {
        let name = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        name
    }
}

/// UUID-shaped names drawn from a seeded RNG, reproducible across runs
#[derive(Debug, Clone)]
pub struct SeededNameGenerator {
    rng: StdRng,
}

impl SeededNameGenerator {
    pub fn new(seed: u64) -> Self {
        SeededNameGenerator {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl NameGenerator for SeededNameGenerator {
    fn generate(&mut self) -> String {
        let bytes: [u8; 16] = self.rng.gen();
        uuid::Builder::from_random_bytes(bytes).into_uuid().to_string()
    }
}

/// Resolve the name for a new entity.
///
/// `is_taken` answers whether a name already exists in the entity's registry.
pub(crate) fn resolve_name<F>(
    kind: EntityKind,
    embedded: Option<&str>,
    suggested: Option<&str>,
    is_taken: F,
    generator: &mut dyn NameGenerator,
) -> Result<String>
where
    F: Fn(&str) -> bool,
{
    for candidate in [embedded, suggested].into_iter().flatten() {
        if candidate.is_empty() {
            continue;
        }
        if !is_taken(candidate) {
            return Ok(candidate.to_string());
        }
        warn!("{} name '{}' is already taken, falling back", kind, candidate);
    }

    for _ in 0..MAX_NAME_ATTEMPTS {
        let candidate = generator.generate();
        if !candidate.is_empty() && !is_taken(&candidate) {
            return Ok(candidate);
        }
    }

    Err(AcademyError::NameExhausted {
        kind,
        attempts: MAX_NAME_ATTEMPTS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct ConstantGenerator;

    impl NameGenerator for ConstantGenerator {
        fn generate(&mut self) -> String {
            "same".to_string()
        }
    }

    #[test]
    fn test_embedded_name_wins() {
        let mut gen = SequentialNameGenerator::new("agent");
        let name = resolve_name(EntityKind::Agent, Some("cfg"), Some("arg"), |_| false, &mut gen).unwrap();
        assert_eq!(name, "cfg");
    }

    #[test]
    fn test_taken_names_fall_through() {
        let taken: HashSet<&str> = ["cfg", "arg"].into_iter().collect();
        let mut gen = SequentialNameGenerator::new("agent");

        let name = resolve_name(EntityKind::Agent, None, Some("arg"), |n| taken.contains(n), &mut gen).unwrap();
        assert_eq!(name, "agent-0");

        let name = resolve_name(EntityKind::Agent, Some("cfg"), Some("free"), |n| taken.contains(n), &mut gen).unwrap();
        assert_eq!(name, "free");
    }

    #[test]
    fn test_generator_skips_taken_names() {
        let taken: HashSet<&str> = ["t-0", "t-1"].into_iter().collect();
        let mut gen = SequentialNameGenerator::new("t");
        let name = resolve_name(EntityKind::Teacher, None, None, |n| taken.contains(n), &mut gen).unwrap();
        assert_eq!(name, "t-2");
    }

    #[test]
    fn test_exhausted_generator() {
        let result = resolve_name(EntityKind::Teacher, None, None, |n| n == "same", &mut ConstantGenerator);
        assert!(matches!(result, Err(AcademyError::NameExhausted { kind: EntityKind::Teacher, .. })));
    }

    #[test]
    fn test_seeded_generator_is_reproducible() {
        let mut a = SeededNameGenerator::new(7);
        let mut b = SeededNameGenerator::new(7);
        let first = a.generate();
        assert_eq!(first, b.generate());
        assert_ne!(first, a.generate());
        assert_eq!(first.len(), 36);
    }

    #[test]
    fn test_uuid_generator_unique() {
        let mut gen = UuidNameGenerator;
        let names: HashSet<String> = (0..100).map(|_| gen.generate()).collect();
        assert_eq!(names.len(), 100);
    }
}
