use thiserror::Error;

/// Input problems found before or while committing mandatory pairings.
/// A roster that simply has no solution is not an error, see `SearchOutcome`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    #[error("{context} references unknown participant '{participant}'")]
    UnknownParticipant { participant: String, context: &'static str },

    #[error("{context} references unknown activity '{activity}'")]
    UnknownActivity { activity: String, context: &'static str },

    #[error("participant '{0}' is listed more than once")]
    DuplicateParticipant(String),

    #[error("activity '{0}' is listed more than once")]
    DuplicateActivity(String),

    #[error("mandatory pairing {participant} -> {activity} cannot be satisfied: {reason}")]
    InfeasibleMandatory {
        participant: String,
        activity: String,
        reason: String,
    },
}

impl SolveError {
    pub fn is_reference_error(&self) -> bool {
        !matches!(self, SolveError::InfeasibleMandatory { .. })
    }
}

/// Failures while reading a roster table
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing section: {0}")]
    MissingSection(&'static str),
}

/// Failures while reading the scheduler configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Failures while writing an assignment to disk
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
