//! Error types for loading, analysing and narrating campaign exports.
//!
//! Aggregation itself never fails in lenient mode; these cover the edges
//! around it (files, CSV framing, config, strict parsing, narration).

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read config {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("Invalid value for {field}: '{value}'")]
    InvalidField { field: String, value: String },
}

/// Failures of the external text-generation call.
///
/// Kept apart from [`ReportError`] so callers can still use a finished
/// summary when only narration went wrong.
#[derive(Error, Debug)]
pub enum NarrationError {
    #[error("API key is not set (expected in ${env_var})")]
    MissingApiKey { env_var: String },

    #[error("Narration request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Narration service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Narration response contained no text")]
    EmptyResponse,
}

impl NarrationError {
    /// Short message suitable for showing to the analyst.
    pub fn user_message(&self) -> &'static str {
        match self {
            NarrationError::MissingApiKey { .. } => {
                "OpenAI APIキーが設定されていないか無効です。設定を確認してください。"
            }
            _ => "データ分析中にエラーが発生しました",
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
