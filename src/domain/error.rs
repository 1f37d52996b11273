//! Domain error types.

/// Top-level error type for stocklens.
#[derive(Debug, thiserror::Error)]
pub enum StocklensError {
    #[error("insufficient data: have {available} points, need {needed}")]
    InsufficientData { needed: usize, available: usize },

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("data error: {reason}")]
    Data { reason: String },

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

    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StocklensError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        StocklensError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        StocklensError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, StocklensError::InsufficientData { .. })
    }
}

impl From<&StocklensError> for std::process::ExitCode {
    fn from(err: &StocklensError) -> Self {
        let code: u8 = match err {
            StocklensError::Io(_) | StocklensError::Data { .. } | StocklensError::Json(_) => 1,
            StocklensError::ConfigParse { .. }
            | StocklensError::ConfigMissing { .. }
            | StocklensError::ConfigInvalid { .. } => 2,
            StocklensError::NotFound { .. } => 3,
            StocklensError::InvalidParameter { .. } => 4,
            StocklensError::InsufficientData { .. } => 5,
            StocklensError::Cancelled => 6,
        };
        std::process::ExitCode::from(code)
    }
}
