use thiserror::Error;

use crate::generation::render::RenderError;
use crate::llm_client::LlmError;

/// Application-level error type.
///
/// Transport and parse failures never reach this type: they are absorbed by
/// the LLM client and the outline generator. What remains are caller
/// mistakes, configuration problems and renderer failures.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code, printed alongside failures by the CLI.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Llm(_) => "LLM_ERROR",
            AppError::Render(_) => "RENDER_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::MissingCredential => AppError::Config(err.to_string()),
            other => AppError::Llm(other.to_string()),
        }
    }
}
