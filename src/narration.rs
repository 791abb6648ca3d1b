//! Boundary to the external text-generation service.
//!
//! The analysis hands over a finished prompt string and gets a string back.
//! Retry and backoff belong to whoever drives this; nothing here retries.

use crate::config::NarrationConfig;
use crate::error::NarrationError;
use crate::prompt::build_prompt;
use crate::types::AnalysisSummary;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

pub trait Narrator {
    fn narrate(&self, prompt: &str) -> Result<String, NarrationError>;
}

/// A summary plus the outcome of narrating it. The summary survives a
/// failed narration.
#[derive(Debug)]
pub struct NarratedSummary {
    pub summary: AnalysisSummary,
    pub prompt: String,
    pub narration: Result<String, NarrationError>,
}

pub fn narrate_summary<N: Narrator + ?Sized>(summary: AnalysisSummary, narrator: &N) -> NarratedSummary {
    let prompt = build_prompt(&summary);
    debug!("Narration prompt is {} chars", prompt.chars().count());
    let narration = narrator.narrate(&prompt);
    match &narration {
        Ok(text) => info!("Narration returned {} chars", text.chars().count()),
        Err(e) => warn!("Narration failed: {}", e),
    }
    NarratedSummary {
        summary,
        prompt,
        narration,
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client for OpenAI-compatible endpoints.
pub struct OpenAiNarrator {
    client: reqwest::blocking::Client,
    config: NarrationConfig,
    api_key: String,
}

impl OpenAiNarrator {
    /// Reads the API key from the configured environment variable.
    pub fn from_env(config: &NarrationConfig) -> Result<Self, NarrationError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| NarrationError::MissingApiKey {
                env_var: config.api_key_env.clone(),
            })?;
        Self::new(config, api_key)
    }

    pub fn new(config: &NarrationConfig, api_key: String) -> Result<Self, NarrationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(OpenAiNarrator {
            client,
            config: config.clone(),
            api_key,
        })
    }
}

impl Narrator for OpenAiNarrator {
    fn narrate(&self, prompt: &str) -> Result<String, NarrationError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.config.max_tokens,
        };
        debug!("POST {} (model {})", self.config.endpoint, self.config.model);
        let resp = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(NarrationError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let parsed: ChatResponse = resp.json()?;
        parsed
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or(NarrationError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::summary::analyze;
    use crate::types::RawDailyRow;
    use std::cell::RefCell;

    struct Recording {
        seen: RefCell<Vec<String>>,
        reply: Option<String>,
    }

    impl Narrator for Recording {
        fn narrate(&self, prompt: &str) -> Result<String, NarrationError> {
            self.seen.borrow_mut().push(prompt.to_string());
            self.reply.clone().ok_or(NarrationError::EmptyResponse)
        }
    }

    fn summary() -> AnalysisSummary {
        let rows = vec![RawDailyRow {
            date: Some("2024-06-01".to_string()),
            impressions: Some("100".to_string()),
            ..RawDailyRow::default()
        }];
        analyze(&rows, &[], &AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn narrator_receives_the_built_prompt() {
        let n = Recording {
            seen: RefCell::new(vec![]),
            reply: Some("分析結果".to_string()),
        };
        let out = narrate_summary(summary(), &n);
        assert_eq!(out.narration.unwrap(), "分析結果");
        assert_eq!(n.seen.borrow().as_slice(), &[out.prompt.clone()]);
    }

    #[test]
    fn failed_narration_keeps_the_summary() {
        let n = Recording {
            seen: RefCell::new(vec![]),
            reply: None,
        };
        let expected = summary();
        let out = narrate_summary(expected.clone(), &n);
        assert!(matches!(out.narration, Err(NarrationError::EmptyResponse)));
        assert_eq!(out.summary, expected);
    }

    #[test]
    fn missing_key_is_reported_before_any_request() {
        let config = NarrationConfig {
            api_key_env: "CAMPAIGN_REPORT_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..NarrationConfig::default()
        };
        match OpenAiNarrator::from_env(&config) {
            Err(NarrationError::MissingApiKey { env_var }) => {
                assert_eq!(env_var, "CAMPAIGN_REPORT_TEST_KEY_THAT_IS_NEVER_SET")
            }
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("expected a missing key error"),
        }
    }

    #[test]
    fn request_body_matches_chat_schema() {
        let body = ChatRequest {
            model: "gpt-4o",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            max_tokens: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["messages"][0]["role"], "user");
        assert!(json.get("max_tokens").is_none());
    }
}
