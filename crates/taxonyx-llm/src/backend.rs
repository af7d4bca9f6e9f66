//! Oracle backend trait and concrete implementations.
//!
//! Backends:
//!   OllamaBackend    — local Ollama (OpenAI-compatible chat endpoint)
//!   OpenAiBackend    — OpenAI API (gpt-4o-mini, gpt-4o, …)
//!   AnthropicBackend — Anthropic Messages API (claude-*)
//!   GeminiBackend    — Google Gemini API (gemini-2.0-flash, …)
//!
//! All four speak the same `CompletionBackend` contract; provider wire
//! formats stay private to this module.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-request HTTP deadline. The retry policy lives one layer up, in
/// `OracleClient`; a hung connection must not stall an attempt forever.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("API error [{status}]: {message}")]
    Api { status: u16, message: String },
}

// ── Request / Response ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String, // "system" | "user"
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    /// Advisory token counts for telemetry; never used for control flow.
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

// ── Trait ─────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse, OracleError>;
    fn model_id(&self) -> &str;
    fn is_local(&self) -> bool;
}

// ── Helper: parse OpenAI-style response ──────────────────────────────────────

fn parse_openai_response(json: &serde_json::Value, fallback_model: &str) -> CompletionResponse {
    CompletionResponse {
        content: json["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string(),
        model: json["model"]
            .as_str()
            .unwrap_or(fallback_model)
            .to_string(),
        prompt_tokens:     json["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
        completion_tokens: json["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
    }
}

async fn check_response_status(resp: reqwest::Response) -> Result<serde_json::Value, OracleError> {
    let status = resp.status().as_u16();
    let body: serde_json::Value = resp.json().await?;
    if status >= 400 {
        let msg = body["error"]["message"]
            .as_str()
            .or_else(|| body["message"].as_str())
            .unwrap_or("unknown API error")
            .to_string();
        return Err(OracleError::Api { status, message: msg });
    }
    Ok(body)
}

// ── 1. Ollama (local) ─────────────────────────────────────────────────────────

pub struct OllamaBackend {
    pub base_url: String,
    pub model: String,
    client: reqwest::Client,
}

impl OllamaBackend {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), model: model.into(), client: reqwest::Client::new() }
    }
}

#[async_trait]
impl CompletionBackend for OllamaBackend {
    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse, OracleError> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model":       &self.model,
            "messages":    req.messages,
            "max_tokens":  req.max_tokens,
            "temperature": req.temperature,
        });
        let resp = self.client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await?;
        let json = check_response_status(resp).await?;
        Ok(parse_openai_response(&json, &self.model))
    }

    fn model_id(&self) -> &str { &self.model }
    fn is_local(&self) -> bool { true }
}

// ── 2. OpenAI ─────────────────────────────────────────────────────────────────

pub struct OpenAiBackend {
    pub model: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self { model: model.into(), api_key: api_key.into(), client: reqwest::Client::new() }
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse, OracleError> {
        let body = serde_json::json!({
            "model":       &self.model,
            "messages":    req.messages,
            "max_tokens":  req.max_tokens,
            "temperature": req.temperature,
        });
        let resp = self.client
            .post("https://api.openai.com/v1/chat/completions")
            .timeout(REQUEST_TIMEOUT)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let json = check_response_status(resp).await?;
        Ok(parse_openai_response(&json, &self.model))
    }

    fn model_id(&self) -> &str { &self.model }
    fn is_local(&self) -> bool { false }
}

// ── 3. Anthropic (claude-*) ───────────────────────────────────────────────────

pub struct AnthropicBackend {
    pub model: String,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicBackend {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), model: model.into(), client: reqwest::Client::new() }
    }
}

#[async_trait]
impl CompletionBackend for AnthropicBackend {
    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse, OracleError> {
        // Anthropic Messages API: system prompt travels outside the messages array
        let system = req.messages.iter()
            .find(|m| m.role == "system")
            .map(|m| m.content.as_str())
            .unwrap_or("");

        let messages: Vec<serde_json::Value> = req.messages.iter()
            .filter(|m| m.role != "system")
            .map(|m| serde_json::json!({"role": m.role, "content": m.content}))
            .collect();

        let mut body = serde_json::json!({
            "model":       &self.model,
            "messages":    messages,
            "max_tokens":  req.max_tokens,
            "temperature": req.temperature,
        });
        if !system.is_empty() {
            body["system"] = serde_json::Value::String(system.to_string());
        }

        let resp = self.client
            .post("https://api.anthropic.com/v1/messages")
            .timeout(REQUEST_TIMEOUT)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let json = check_response_status(resp).await?;

        let content = json["content"]
            .as_array()
            .and_then(|blocks| blocks.first())
            .and_then(|b| b["text"].as_str())
            .unwrap_or("")
            .to_string();

        Ok(CompletionResponse {
            content,
            model: json["model"].as_str().unwrap_or(&self.model).to_string(),
            prompt_tokens:     json["usage"]["input_tokens"].as_u64().unwrap_or(0) as u32,
            completion_tokens: json["usage"]["output_tokens"].as_u64().unwrap_or(0) as u32,
        })
    }

    fn model_id(&self) -> &str { &self.model }
    fn is_local(&self) -> bool { false }
}

// ── 4. Google Gemini ──────────────────────────────────────────────────────────

pub struct GeminiBackend {
    pub model: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiBackend {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), model: model.into(), client: reqwest::Client::new() }
    }
}

#[async_trait]
impl CompletionBackend for GeminiBackend {
    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse, OracleError> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        // System message → systemInstruction, user messages → contents
        let system_text = req.messages.iter()
            .find(|m| m.role == "system")
            .map(|m| m.content.clone());

        let contents: Vec<serde_json::Value> = req.messages.iter()
            .filter(|m| m.role != "system")
            .map(|m| serde_json::json!({
                "role": "user",
                "parts": [{ "text": m.content }]
            }))
            .collect();

        let mut body = serde_json::json!({
            "contents": contents,
            "generationConfig": {
                "maxOutputTokens": req.max_tokens,
                "temperature":     req.temperature,
            }
        });
        if let Some(sys) = system_text {
            body["systemInstruction"] = serde_json::json!({
                "parts": [{ "text": sys }]
            });
        }

        let resp = self.client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await?;
        let json = check_response_status(resp).await?;

        let content = json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or("")
            .to_string();

        Ok(CompletionResponse {
            content,
            model: self.model.clone(),
            prompt_tokens: json["usageMetadata"]["promptTokenCount"]
                .as_u64().unwrap_or(0) as u32,
            completion_tokens: json["usageMetadata"]["candidatesTokenCount"]
                .as_u64().unwrap_or(0) as u32,
        })
    }

    fn model_id(&self) -> &str { &self.model }
    fn is_local(&self) -> bool { false }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
