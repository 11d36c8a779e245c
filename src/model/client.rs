use crate::error::{AgentError, Result};
use crate::model::ActionModel;
use crate::vision;
use base64::Engine;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:8000/v1";
const DEFAULT_MODEL: &str = "shivamg05/groundhog-v1";
const DEFAULT_MAX_TOKENS: u32 = 512;
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Where and how to reach the inference server
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// OpenAI-compatible base URL, e.g. a vLLM server
    pub base_url: String,

    /// Served model name
    pub model: String,

    /// Bearer token, if the server wants one
    pub api_key: Option<String>,

    pub max_tokens: u32,

    pub timeout: Duration,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ModelConfig {
    /// Read `GROUNDHOG_*` variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let max_tokens = match lookup("GROUNDHOG_MAX_TOKENS") {
            Some(raw) => raw
                .parse()
                .map_err(|_| AgentError::InvalidConfig(format!("GROUNDHOG_MAX_TOKENS is not a number: {}", raw)))?,
            None => defaults.max_tokens,
        };

        let timeout = match lookup("GROUNDHOG_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(
                raw.parse()
                    .map_err(|_| AgentError::InvalidConfig(format!("GROUNDHOG_TIMEOUT_SECS is not a number: {}", raw)))?,
            ),
            None => defaults.timeout,
        };

        Ok(Self {
            base_url: lookup("GROUNDHOG_MODEL_URL").unwrap_or(defaults.base_url),
            model: lookup("GROUNDHOG_MODEL").unwrap_or(defaults.model),
            api_key: lookup("GROUNDHOG_API_KEY").filter(|k| !k.is_empty()),
            max_tokens,
            timeout,
        })
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    ImageUrl { image_url: ImageUrl },
    Text { text: String },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client for a served vision-language model
pub struct VisionModelClient {
    http: reqwest::blocking::Client,
    config: ModelConfig,
}

impl VisionModelClient {
    pub fn new(config: ModelConfig) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AgentError::InvalidConfig(format!("Failed to build HTTP client: {}", e)))?;

        log::info!("Model client ready: {} at {}", config.model, config.base_url);
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn build_request(&self, image_png: &[u8], prompt: &str) -> ChatRequest<'_> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(image_png);
        ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: format!("data:image/png;base64,{}", encoded) },
                    },
                    ContentPart::Text { text: prompt.to_string() },
                ],
            }],
            max_tokens: self.config.max_tokens,
            // greedy decoding, as in fine-tuning evaluation
            temperature: 0.0,
        }
    }
}

impl ActionModel for VisionModelClient {
    fn predict(&self, image: &DynamicImage, prompt: &str) -> Result<String> {
        let png = vision::encode_png(image)?;
        let request = self.build_request(&png, prompt);

        let mut builder = self.http.post(self.config.completions_url()).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .map_err(|e| AgentError::ModelRequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AgentError::ModelRequestFailed(format!("{}: {}", status, body)));
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| AgentError::ModelResponseInvalid(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AgentError::ModelResponseInvalid("response has no message content".to_string()))
    }
}
