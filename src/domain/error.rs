//! Domain error types.

/// Top-level error type for ematrail.
#[derive(Debug, thiserror::Error)]
pub enum EmatrailError {
    #[error("invalid EMA span {span}: must be at least 1")]
    InvalidSpan { span: usize },

    #[error("invalid stop percent {stop_pct}: must be strictly between 0 and 1")]
    InvalidStopPercent { stop_pct: f64 },

    #[error("initial capital must be positive, got {capital}")]
    NonPositiveCapital { capital: f64 },

    #[error("empty series")]
    EmptySeries,

    #[error("no data for {symbol}: {reason}")]
    NoData { symbol: String, reason: String },

    #[error("data integrity error: {reason}")]
    DataIntegrity { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EmatrailError {
    pub(crate) fn misaligned(what: &str, expected: usize, got: usize) -> Self {
        EmatrailError::DataIntegrity {
            reason: format!("{what} has {got} values, expected {expected}"),
        }
    }
}

impl EmatrailError {
    /// Process exit status for this error class.
    pub fn exit_code(&self) -> u8 {
        match self {
            EmatrailError::Io(_) => 1,
            EmatrailError::ConfigParse { .. }
            | EmatrailError::ConfigMissing { .. }
            | EmatrailError::ConfigInvalid { .. } => 2,
            EmatrailError::InvalidSpan { .. }
            | EmatrailError::InvalidStopPercent { .. }
            | EmatrailError::NonPositiveCapital { .. } => 3,
            EmatrailError::DataIntegrity { .. } => 4,
            EmatrailError::EmptySeries | EmatrailError::NoData { .. } => 5,
        }
    }
}

impl From<&EmatrailError> for std::process::ExitCode {
    fn from(err: &EmatrailError) -> Self {
        std::process::ExitCode::from(err.exit_code())
    }
}
