use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Malformed or inconsistent configuration. Always fatal, raised before
/// any record is generated.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unable to read configuration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse configuration {source_name}: {message}")]
    Parse { source_name: String, message: String },

    #[error("required configuration section `{section}` is missing")]
    MissingSection { section: String },

    #[error("weight for `{option}` under `{key}` is negative ({weight})")]
    NegativeWeight {
        key: String,
        option: String,
        weight: f64,
    },

    #[error("distribution `{key}` has no positive weight")]
    EmptyDistribution { key: String },

    #[error("`{key}` references unknown value `{reference}`")]
    UnknownReference { key: String, reference: String },

    #[error("attribute dependencies form a cycle through {}", fields.join(" -> "))]
    DependencyCycle { fields: Vec<String> },

    #[error("invalid value for `{key}`: {message}")]
    InvalidValue { key: String, message: String },

    #[error("daily volume for {date} is negative ({total})")]
    NegativeVolume { date: NaiveDate, total: f64 },
}

/// The roster cannot staff a time bucket that has planned calls.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("bucket {bucket} on {date} needs {required} agents, only {available} can be scheduled")]
pub struct CoverageError {
    pub date: NaiveDate,
    pub bucket: String,
    pub required: usize,
    pub available: usize,
}

/// A single record failed validation against the call schema.
#[derive(Error, Debug, Clone, PartialEq, serde::Serialize)]
#[error("call {call_id}: field `{field}` expected {expected}, found {actual}")]
pub struct SchemaViolation {
    pub call_id: String,
    pub field: String,
    pub expected: String,
    pub actual: String,
}

impl SchemaViolation {
    pub fn new(
        call_id: impl Into<String>,
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Umbrella error for a generation run.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Coverage(#[from] CoverageError),

    #[error(transparent)]
    Schema(#[from] SchemaViolation),

    #[error("failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {what}: {source}")]
    Serialize {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to configure worker pool: {0}")]
    WorkerPool(String),

    #[error("failed to compile the call schema: {0}")]
    SchemaCompile(String),
}

pub type GenerationResult<T> = Result<T, GenerationError>;
