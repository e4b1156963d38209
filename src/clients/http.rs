use super::{ModelClient, SendError};
use crate::config::DispatchConfig;
use crate::credentials::Secret;
use crate::models::{LanguageModel, ProviderKind};
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

const OPENROUTER_CHAT_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const OPENROUTER_MAX_TOKENS: u32 = 4096;
const TEMPERATURE: f64 = 0.7;
const BODY_PREVIEW_CHARS: usize = 300;

/// Client for OpenAI-compatible chat-completion endpoints.
#[derive(Clone)]
pub struct HttpModelClient {
    client: reqwest::Client,
    retry_policy: ExponentialBuilder,
}

impl HttpModelClient {
    /// Builds the pooled HTTP client shared by every request of the process.
    ///
    /// No total request timeout is set here: the dispatcher bounds each model
    /// with its per-model timeout, which settings and `send --timeout` can
    /// raise above `request_timeout_seconds`.
    pub fn from_config(config: &DispatchConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;

        Ok(Self::with_client(client, config.max_retries))
    }

    #[must_use]
    pub fn with_client(client: reqwest::Client, max_retries: usize) -> Self {
        let retry_policy = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(200))
            .with_max_delay(Duration::from_secs(2))
            .with_max_times(max_retries)
            .with_jitter();

        Self {
            client,
            retry_policy,
        }
    }

    async fn post_once(&self, url: &str, body: &Value, secret: &Secret) -> Result<String, SendError> {
        let mut request = self
            .client
            .post(url)
            .bearer_auth(secret.expose())
            .json(body);

        if url.starts_with(OPENROUTER_CHAT_URL) {
            request = request
                .header("HTTP-Referer", "https://github.com/chatlist/chatlist")
                .header("X-Title", "ChatList");
        }

        let response = request.send().await.map_err(network_error)?;
        let status = response.status();
        let text = response.text().await.map_err(network_error)?;

        if !status.is_success() {
            return Err(SendError::Http {
                status: status.as_u16(),
                body: preview(&text),
            });
        }

        extract_text(&text)
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    async fn send(
        &self,
        model: &LanguageModel,
        prompt: &str,
        secret: &Secret,
    ) -> Result<String, SendError> {
        let provider = provider_of(model);
        let url = endpoint_url(&model.api_url, &provider);
        let body = request_body(model, prompt, &provider);

        debug!(model = %model.name, url = %url, provider = %provider, "Sending prompt");

        (|| self.post_once(&url, &body, secret))
            .retry(self.retry_policy)
            .when(SendError::is_retryable)
            .notify(|err: &SendError, dur: Duration| {
                warn!(model = %model.name, "Retrying after error {err} in {dur:?}");
            })
            .await
    }
}

fn network_error(err: reqwest::Error) -> SendError {
    if err.is_timeout() {
        SendError::Network(format!("request timed out: {err}"))
    } else if err.is_connect() {
        SendError::Network(format!("connection failed: {err}"))
    } else {
        SendError::Network(err.to_string())
    }
}

/// Explicit provider, else whatever the endpoint URL gives away.
fn provider_of(model: &LanguageModel) -> ProviderKind {
    model
        .provider
        .clone()
        .or_else(|| ProviderKind::parse(&model.api_url))
        .unwrap_or_else(|| ProviderKind::Other(String::new()))
}

/// OpenRouter model pages are often pasted instead of the API endpoint.
pub(crate) fn endpoint_url(api_url: &str, provider: &ProviderKind) -> String {
    let lower = api_url.to_lowercase();
    let is_openrouter = lower.contains("openrouter.ai") || *provider == ProviderKind::OpenRouter;
    if is_openrouter && !lower.contains("/api/v1/chat/completions") {
        return OPENROUTER_CHAT_URL.to_string();
    }
    api_url.to_string()
}

pub(crate) fn request_body(model: &LanguageModel, prompt: &str, provider: &ProviderKind) -> Value {
    let mut body = json!({
        "model": model.name,
        "messages": [{ "role": "user", "content": prompt }],
        "temperature": TEMPERATURE,
    });
    if *provider == ProviderKind::OpenRouter {
        body["max_tokens"] = json!(OPENROUTER_MAX_TOKENS);
    }
    body
}

fn looks_like_html(text: &str) -> bool {
    let head: String = text.chars().take(16).collect::<String>().to_lowercase();
    head.starts_with("<!doctype") || head.starts_with("<html")
}

fn preview(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= BODY_PREVIEW_CHARS {
        return trimmed.to_string();
    }
    let mut cut: String = trimmed.chars().take(BODY_PREVIEW_CHARS).collect();
    cut.push_str("...");
    cut
}

/// Pulls the generated text out of a response body.
///
/// Accepts the chat-completions shape, the legacy completions shape and bare
/// `text`/`response` objects. Plain-text bodies are returned as they are.
pub(crate) fn extract_text(body: &str) -> Result<String, SendError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(SendError::EmptyResponse);
    }
    if looks_like_html(trimmed) {
        return Err(SendError::InvalidResponse(
            "received an HTML page instead of JSON; check the model URL".to_string(),
        ));
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => extract_from_value(&value),
        Err(_) => Ok(trimmed.to_string()),
    }
}

fn extract_from_value(value: &Value) -> Result<String, SendError> {
    if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| error.as_str().map(str::to_string))
            .unwrap_or_else(|| error.to_string());
        return Err(SendError::Api(message));
    }

    let choice = value.get("choices").and_then(|c| c.get(0));
    let candidates = [
        choice.and_then(|c| c.pointer("/message/content")),
        choice.and_then(|c| c.pointer("/message/text")),
        choice.and_then(|c| c.get("text")),
        value.get("text"),
        value.get("response"),
    ];

    let found = candidates.into_iter().flatten().find_map(Value::as_str);
    match found {
        Some(text) if looks_like_html(text.trim()) => Err(SendError::InvalidResponse(
            "response text is an HTML page; check the model URL".to_string(),
        )),
        Some(text) if text.trim().is_empty() => Err(SendError::EmptyResponse),
        Some(text) => Ok(text.to_string()),
        None if choice.is_some() => Err(SendError::EmptyResponse),
        None => {
            let keys = value
                .as_object()
                .map(|o| o.keys().cloned().collect::<Vec<_>>().join(", "))
                .unwrap_or_default();
            Err(SendError::InvalidResponse(format!(
                "unexpected response shape (keys: {keys})"
            )))
        }
    }
}
