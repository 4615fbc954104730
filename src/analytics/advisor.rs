/// External coaching advisor
///
/// The advisor is an optional collaborator: a hosted text-generation service
/// asked to phrase coaching advice from a pattern summary. It is modelled as a
/// capability trait with a live OpenAI-compatible implementation and a null
/// implementation chosen when no API key is configured.
///
/// # Configuration
///
/// Environment variables:
/// - `OPENAI_API_KEY`: API key (required for the live advisor)
/// - `OPENAI_MODEL`: Model name (default: gpt-3.5-turbo)
/// - `OPENAI_BASE_URL`: Server URL (default: https://api.openai.com)

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::analytics::InsightPayload;
use crate::domain::{InsightMode, PatternSummary};

/// How long a single advisor call may take before the engine falls back
pub const DEFAULT_ADVISOR_TIMEOUT: Duration = Duration::from_secs(10);

/// Placeholder shipped in example environment files; treated as "no key"
const PLACEHOLDER_API_KEY: &str = "your-openai-api-key-here";

const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Errors an advisor call can produce
///
/// None of these ever reach a caller of the insight engine; the orchestrator
/// logs them and switches to rule-based generation.
#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("No advisor is configured")]
    NotConfigured,

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Advisor API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Advisor returned an empty response")]
    EmptyResponse,

    #[error("Advisor did not answer within {0:?}")]
    Timeout(Duration),
}

/// Capability interface for anything that can turn a summary into advice
#[async_trait]
pub trait Advisor: Send + Sync {
    /// Produce advice for the summary in the requested mode
    async fn advise(
        &self,
        summary: &PatternSummary,
        mode: InsightMode,
    ) -> Result<InsightPayload, AdvisorError>;

    /// Whether a call is worth attempting at all
    fn is_configured(&self) -> bool {
        true
    }

    /// Name used in logs
    fn name(&self) -> &str;
}

/// Advisor used when nothing is configured; every call reports NotConfigured
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAdvisor;

#[async_trait]
impl Advisor for NullAdvisor {
    async fn advise(
        &self,
        _summary: &PatternSummary,
        _mode: InsightMode,
    ) -> Result<InsightPayload, AdvisorError> {
        Err(AdvisorError::NotConfigured)
    }

    fn is_configured(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// Connection settings for the live advisor
#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl AdvisorConfig {
    /// Read settings from the environment
    ///
    /// Returns None when the key is missing, blank or still the placeholder.
    pub fn from_env(timeout: Duration) -> Option<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").ok()?;
        let api_key = api_key.trim();
        if api_key.is_empty() || api_key == PLACEHOLDER_API_KEY {
            return None;
        }

        Some(Self {
            api_key: api_key.to_string(),
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            base_url: std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            timeout,
        })
    }
}

/// Live advisor speaking the OpenAI chat completions API
#[derive(Clone)]
pub struct OpenAIAdvisor {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: String,
    timeout: Duration,
}

impl OpenAIAdvisor {
    /// Create a live advisor from explicit settings
    pub fn new(config: AdvisorConfig) -> Result<Self, AdvisorError> {
        let http_client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model,
            api_key: config.api_key,
            timeout: config.timeout,
        })
    }

    /// Send one chat completion request and return the first choice's text
    async fn chat_completion(&self, system_prompt: String, mode: InsightMode) -> Result<String, AdvisorError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: "Provide sleep optimization advice.".to_string(),
                },
            ],
            max_tokens: match mode {
                InsightMode::Quick => 100,
                InsightMode::Detailed => 300,
            },
            temperature: 0.7,
        };

        let response = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisorError::Status { status, body });
        }

        let chat_response: ChatCompletionResponse = response.json().await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(AdvisorError::EmptyResponse)
    }
}

#[async_trait]
impl Advisor for OpenAIAdvisor {
    async fn advise(
        &self,
        summary: &PatternSummary,
        mode: InsightMode,
    ) -> Result<InsightPayload, AdvisorError> {
        let prompt = build_prompt(summary, mode);
        debug!(model = %self.model, mode = mode.label(), "Requesting advice");

        let text = tokio::time::timeout(self.timeout, self.chat_completion(prompt, mode))
            .await
            .map_err(|_| AdvisorError::Timeout(self.timeout))??;

        shape_response(&text, mode)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Pick the advisor implementation from the environment
pub fn advisor_from_env(timeout: Duration) -> Arc<dyn Advisor> {
    match AdvisorConfig::from_env(timeout).map(OpenAIAdvisor::new) {
        Some(Ok(advisor)) => {
            tracing::info!(model = %advisor.model, "External advisor enabled");
            Arc::new(advisor)
        }
        Some(Err(e)) => {
            tracing::warn!("Could not build advisor HTTP client, using rule-based insights: {}", e);
            Arc::new(NullAdvisor)
        }
        None => {
            tracing::info!("No advisor API key configured, using rule-based insights");
            Arc::new(NullAdvisor)
        }
    }
}

/// Build the system prompt describing the sleeper and the requested format
pub fn build_prompt(summary: &PatternSummary, mode: InsightMode) -> String {
    let mut prompt = String::from("You are an expert sleep coach for college students.\n\nStudent Profile:\n");
    prompt.push_str(&format!("- Chronotype: {}\n", summary.chronotype));
    prompt.push_str(&format!("- Average sleep: {:.1} hours\n", summary.avg_sleep));
    prompt.push_str(&format!("- Sleep debt: {:.1} hours\n", summary.sleep_debt));
    prompt.push_str(&format!("- Quality: {:.1}/5\n", summary.avg_quality));
    prompt.push_str(&format!("- Trend: {}\n", summary.trend));
    prompt.push_str(&format!("- Consistency: {:.0}%\n", summary.consistency));
    if summary.afternoon_crash {
        prompt.push_str("- Experiences afternoon energy crashes\n");
    }
    if summary.all_nighters > 0 {
        prompt.push_str(&format!("- Had {} all-nighters recently\n", summary.all_nighters));
    }
    if summary.exam_weeks > 0 {
        prompt.push_str(&format!("- Logged {} nights during exam weeks\n", summary.exam_weeks));
    }

    prompt.push('\n');
    prompt.push_str(match mode {
        InsightMode::Quick => "Provide exactly 3 actionable tips. Each tip should be one short sentence (max 15 words). \
                               Format as bullet points. Be specific and practical for a college student.",
        InsightMode::Detailed => "Provide comprehensive advice in 2-3 paragraphs. Include specific recommendations based on \
                                  their chronotype and patterns. Explain the science briefly. Be encouraging but realistic \
                                  about student life constraints.",
    });

    prompt
}

/// Turn raw advisor text into a payload
///
/// Quick mode keeps the first three non-blank lines; detailed mode keeps the
/// text as-is. Text with nothing usable is an error so the caller falls back.
pub fn shape_response(text: &str, mode: InsightMode) -> Result<InsightPayload, AdvisorError> {
    match mode {
        InsightMode::Quick => {
            let tips: Vec<String> = text
                .lines()
                .filter(|line| !line.trim().is_empty())
                .take(3)
                .map(str::to_string)
                .collect();
            if tips.is_empty() {
                return Err(AdvisorError::EmptyResponse);
            }
            Ok(InsightPayload::QuickTips(tips))
        }
        InsightMode::Detailed => {
            if text.trim().is_empty() {
                return Err(AdvisorError::EmptyResponse);
            }
            Ok(InsightPayload::DetailedNarrative(text.to_string()))
        }
    }
}

// OpenAI chat completions wire format

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}
