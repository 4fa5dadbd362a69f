use crate::academy::Academy;
use crate::config::{AcademyConfig, UnknownTeacherPolicy};
use crate::identity::{NameGenerator, SeededNameGenerator, UuidNameGenerator};
use crate::logger::TickLogger;

/// Builder for [`Academy`]
pub struct AcademyBuilder {
    config: AcademyConfig,
    names: Option<Box<dyn NameGenerator>>,
    logger: Option<Box<dyn TickLogger>>,
}

impl AcademyBuilder {
    /// Create a new academy builder
    pub fn new() -> Self {
        AcademyBuilder {
            config: AcademyConfig::default(),
            names: None,
            logger: None,
        }
    }

    /// Start from an existing config
    pub fn config(mut self, config: AcademyConfig) -> Self {
        self.config = config;
        self
    }

    pub fn unknown_teacher_policy(mut self, policy: UnknownTeacherPolicy) -> Self {
        self.config.unknown_teacher_in_step = policy;
        self
    }

    /// Seed the default strategies
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Generator for names the caller does not choose
    pub fn name_generator<G: NameGenerator + 'static>(mut self, generator: G) -> Self {
        self.names = Some(Box::new(generator));
        self
    }

    pub fn logger<L: TickLogger + 'static>(mut self, logger: L) -> Self {
        self.logger = Some(Box::new(logger));
        self
    }

    /// Build the academy.
    ///
    /// Without an explicit generator, a seeded academy draws reproducible
    /// names from its seed and an unseeded one uses random UUIDs.
    pub fn build(self) -> Academy {
        let names = match (self.names, self.config.seed) {
            (Some(names), _) => names,
            (None, Some(seed)) => Box::new(SeededNameGenerator::new(seed)),
            (None, None) => Box::new(UuidNameGenerator),
        };

        let mut academy = Academy::with_parts(self.config, names);
        if let Some(logger) = self.logger {
            academy.attach_logger(logger);
        }
        academy
    }
}

impl Default for AcademyBuilder {
    fn default() -> Self {
        Self::new()
    }
}
