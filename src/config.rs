//! Run configuration.
//!
//! Every field has a default, so an absent or partial TOML file works.
//! Example:
//!
//! ```toml
//! parse_policy = "strict"
//!
//! [labels]
//! cost = "Cost"
//!
//! [narration]
//! model = "gpt-4o-mini"
//! timeout_secs = 30
//! ```

use crate::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// How malformed numeric cells are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParsePolicy {
    /// Bad cells become 0 and the run continues.
    #[default]
    Lenient,
    /// Bad non-empty cells abort normalization with an error.
    Strict,
}

/// Header labels of the upstream exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldLabels {
    pub date: String,
    pub impressions: String,
    pub clicks: String,
    pub application_starts: String,
    pub applications: String,
    pub cost: String,
    pub campaign: String,
    pub job_count: String,
    pub ctr: String,
    pub asr: String,
    pub completion_rate: String,
    pub ar: String,
    pub cpc: String,
    pub cpas: String,
    pub cpa: String,
}

impl Default for FieldLabels {
    fn default() -> Self {
        FieldLabels {
            date: "期間：日単位".to_string(),
            impressions: "表示回数".to_string(),
            clicks: "クリック数".to_string(),
            application_starts: "応募開始数".to_string(),
            applications: "応募数".to_string(),
            cost: "費用".to_string(),
            campaign: "キャンペーン".to_string(),
            job_count: "Job Count".to_string(),
            ctr: "クリック率（CTR）".to_string(),
            asr: "応募開始率 (ASR)".to_string(),
            completion_rate: "応募完了率".to_string(),
            ar: "応募率 (AR)".to_string(),
            cpc: "クリック単価（CPC）".to_string(),
            cpas: "応募開始単価（CPAS）".to_string(),
            cpa: "応募単価（CPA）".to_string(),
        }
    }
}

/// Settings for the external text-generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationConfig {
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub max_tokens: Option<u32>,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        NarrationConfig {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
            max_tokens: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub parse_policy: ParsePolicy,
    pub labels: FieldLabels,
    pub narration: NarrationConfig,
}

impl AnalysisConfig {
    pub fn from_toml_str(s: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text).map_err(|e| ReportError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!("Loaded config from {}: {:?}", path.display(), config.parse_policy);
        Ok(config)
    }

    /// Load `path` when given, otherwise fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}
