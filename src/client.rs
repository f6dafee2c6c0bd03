//! Text completion client
//!
//! One outbound `generateContent` call per generation. Failures never reach
//! the caller as errors: they come back as a markdown explanation the UI can
//! render like any other guide.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{ServiceError, ServiceResult};
use crate::metadata::USER_AGENT;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
/// Low but not zero: technical answers should be consistent.
pub const TEMPERATURE: f32 = 0.3;
pub const NO_RESPONSE: &str = "No response generated.";
pub const FALLBACK_HEADING: &str = "### ⚠️ AI Connection Error";

/// A raw completion call. `Ok(None)` means the service answered without
/// any text.
pub trait CompletionBackend: Send + Sync {
    fn complete(&self, instructions: &str, prompt: &str) -> ServiceResult<Option<String>>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    system_instruction: RequestContent<'a>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    fn text(self) -> Option<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Google Gemini over plain HTTPS.
pub struct GeminiBackend {
    agent: ureq::Agent,
    url: String,
    api_key: String,
}

impl GeminiBackend {
    /// Fails when no API key is configured; nothing is sent in that case.
    pub fn new(config: GeminiConfig) -> ServiceResult<Self> {
        let api_key = config
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ServiceError::Config(
                    "API key is missing. Set GEMINI_API_KEY (or API_KEY) or pass --api-key."
                        .to_string(),
                )
            })?;
        let url = format!(
            "{}/models/{}:generateContent",
            config.endpoint.trim_end_matches('/'),
            config.model
        );
        let agent = ureq::AgentBuilder::new().user_agent(USER_AGENT).build();
        Ok(Self {
            agent,
            url,
            api_key,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl CompletionBackend for GeminiBackend {
    fn complete(&self, instructions: &str, prompt: &str) -> ServiceResult<Option<String>> {
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: Some("user"),
                parts: vec![RequestPart { text: prompt }],
            }],
            system_instruction: RequestContent {
                role: None,
                parts: vec![RequestPart { text: instructions }],
            },
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
            },
        };

        tracing::info!(url = %self.url, "requesting completion");
        let response = self
            .agent
            .post(&self.url)
            .set("x-goog-api-key", &self.api_key)
            .send_json(&body)
            .map_err(|e| match e {
                ureq::Error::Status(code, response) => {
                    let detail = response
                        .into_string()
                        .unwrap_or_else(|_| "<unreadable body>".to_string());
                    ServiceError::ApiError(format!("HTTP {code}: {}", detail.trim()))
                }
                ureq::Error::Transport(t) => ServiceError::NetworkError(t.to_string()),
            })?;

        let parsed: GenerateContentResponse = response.into_json().map_err(|e| {
            ServiceError::ApiError(format!("Failed to read completion response: {e}"))
        })?;
        Ok(parsed.text())
    }
}

/// Awaitable front for a backend; the blocking call runs on tokio's
/// blocking pool.
#[derive(Clone)]
pub struct CompletionClient {
    backend: Arc<dyn CompletionBackend>,
}

impl CompletionClient {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    pub fn gemini(config: GeminiConfig) -> ServiceResult<Self> {
        Ok(Self::new(Arc::new(GeminiBackend::new(config)?)))
    }

    /// Resolves with the generated markdown, `NO_RESPONSE`, or the
    /// connection-error guide. Never errors.
    pub async fn generate(&self, instructions: String, prompt: String) -> String {
        let backend = self.backend.clone();
        let outcome =
            tokio::task::spawn_blocking(move || backend.complete(&instructions, &prompt)).await;

        match outcome {
            Ok(Ok(Some(text))) => text,
            Ok(Ok(None)) => NO_RESPONSE.to_string(),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "completion request failed");
                fallback_message(&e.to_string())
            }
            Err(e) => {
                tracing::error!(error = %e, "completion worker failed");
                fallback_message(&e.to_string())
            }
        }
    }
}

pub fn fallback_message(error: &str) -> String {
    format!(
        "{FALLBACK_HEADING}

I'm having trouble connecting to the MakerForge intelligence right now. This is usually temporary.

**Suggestions:**
1. Check your internet connection.
2. Wait a few moments and try **Generate** again.
3. If the issue persists, the AI service might be experiencing high traffic.

_Technical Error Details: {error}_"
    )
}
