pub mod calendar;
pub mod config;
pub mod error;
pub mod generator;
pub mod metrics;
pub mod output;
pub mod record;
pub mod rng;
pub mod roster;
pub mod sampling;
pub mod volume;

// Re-export commonly used types for convenience.
pub use config::{resolve, ConfigSources, DirectOverrides, EffectiveConfig};
pub use error::{ConfigError, CoverageError, GenerationError, GenerationResult, SchemaViolation};
pub use generator::{generate, GenerationReport, RunOptions, RunSummary};
pub use record::CallRecord;
pub use rng::{Seed, StreamFactory};
