//! Error types.
//!
//! - `AlignError`: failures inside the alignment core (pure, no I/O)
//! - `AppError`: what the binary reports, carrying the process exit code
//!
//! Exit codes:
//! - 2: usage / configuration / local file problems
//! - 3: no usable data
//! - 4: upstream (network, remote payload) failures

/// Errors raised while building or transforming a `TimeSeries`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AlignError {
    #[error("duplicate date {date} in series '{series}'")]
    DuplicateDate { series: String, date: String },

    #[error("field '{field}' is not declared in series '{series}'")]
    UnknownField { series: String, field: String },

    #[error("cannot compute month end for {year}-{month:02}")]
    MonthEnd { year: i32, month: u32 },
}

#[derive(Clone, thiserror::Error)]
#[error("{message}")]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl From<AlignError> for AppError {
    fn from(err: AlignError) -> Self {
        AppError::new(3, err.to_string())
    }
}
