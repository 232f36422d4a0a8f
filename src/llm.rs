//! Advisor backed by an OpenAI-compatible chat completion endpoint.
//!
//! Three one-shot calls: pick categories for a video title, summarize a generated day plan, and
//! write a free-form workout plan from coaching preferences. None of them retry.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::coach::CoachRequest;
use crate::error::ClientError;
use crate::video::parse_categories;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_COACH_MODEL: &str = "gpt-4o";

const CLASSIFY_PROMPT: &str = "You label home-training videos. Pick the categories from the \
candidate list that best match the video title, preferring the closest body part when one is \
mentioned. Answer with the chosen categories separated by commas and nothing else.";

const SUMMARIZE_PROMPT: &str = "The user sends a home-training plan built from YouTube videos. \
Each day starts with a 'Day N' line followed by 'title (minutes분) - categories' lines. Give a \
short overview of every day and practical advice for the whole plan.";

const COACH_PROMPT: &str = "You are a fitness coach.";

#[async_trait]
pub trait Advisor: Send + Sync {
    /// Choose labels for a video title out of `candidates`.
    async fn classify(&self, title: &str, candidates: &[String]) -> Result<Vec<String>, ClientError>;

    /// Overview and advice for a rendered day plan.
    async fn summarize(&self, plan_text: &str) -> Result<String, ClientError>;

    /// Free-form plan from coaching preferences.
    async fn coach_plan(&self, request: &CoachRequest) -> Result<String, ClientError>;
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    /// Model for coaching plans; classification and summaries use `model`.
    pub coach_model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            coach_model: DEFAULT_COACH_MODEL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
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

pub struct OpenAiAdvisor {
    client: reqwest::Client,
    config: LlmConfig,
}

impl OpenAiAdvisor {
    pub fn new(config: LlmConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("homefit/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client, config })
    }

    #[instrument(skip(self, system, user))]
    async fn complete(&self, model: &str, system: &str, user: &str) -> Result<String, ClientError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ClientError::NotConfigured("OPENAI_API_KEY"))?;

        let request = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "chat completion failed");
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let response: ChatResponse = response.json().await?;
        let content = first_content(response)?;
        debug!(chars = content.len(), "chat completion received");

        Ok(content)
    }
}

fn first_content(response: ChatResponse) -> Result<String, ClientError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| ClientError::Malformed("completion has no content".to_string()))
}

#[async_trait]
impl Advisor for OpenAiAdvisor {
    async fn classify(&self, title: &str, candidates: &[String]) -> Result<Vec<String>, ClientError> {
        let user = format!(
            "Title: {title}\nCandidate categories: {}",
            candidates.join(" | ")
        );
        let answer = self.complete(&self.config.model, CLASSIFY_PROMPT, &user).await?;

        Ok(parse_categories(&answer))
    }

    async fn summarize(&self, plan_text: &str) -> Result<String, ClientError> {
        self.complete(&self.config.model, SUMMARIZE_PROMPT, plan_text).await
    }

    async fn coach_plan(&self, request: &CoachRequest) -> Result<String, ClientError> {
        self.complete(&self.config.coach_model, COACH_PROMPT, &request.prompt()).await
    }
}

#[cfg(test)]
mod test {
    use super::{first_content, ChatResponse};
    use crate::error::ClientError;

    #[test]
    pub fn test_first_content() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"  상체, 어깨 \n"}}]}"#,
        )
        .unwrap();
        assert_eq!(first_content(response).unwrap(), "상체, 어깨");

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(first_content(empty), Err(ClientError::Malformed(_))));

        let null: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(matches!(first_content(null), Err(ClientError::Malformed(_))));
    }
}
