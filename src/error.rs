use thiserror::Error;

/// Failure of an analysis or listing request.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Malformed filter input; reported back to the caller verbatim.
    #[error("{0}")]
    Validation(String),

    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl AnalysisError {
    pub fn validation(message: impl Into<String>) -> Self {
        AnalysisError::Validation(message.into())
    }

    pub fn status_code(&self) -> u16 {
        match self {
            AnalysisError::Validation(_) => 400,
            AnalysisError::Internal(_) => 500,
        }
    }

    /// Message safe to hand to a client. Internal details stay in the log.
    pub fn public_message(&self) -> String {
        match self {
            AnalysisError::Validation(message) => message.clone(),
            AnalysisError::Internal(_) => "internal error while processing request".to_string(),
        }
    }
}
