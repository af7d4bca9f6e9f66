//! Retrying oracle client.
//!
//! Wraps a `CompletionBackend` with the retry/backoff policy and the
//! JSON-only response-format hint, and accumulates advisory usage
//! telemetry (call count, tokens, latency). Telemetry never affects
//! control flow.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, warn};

use crate::backend::{CompletionBackend, CompletionRequest, Message, OracleError};

/// Appended to every system prompt so all four providers return bare JSON.
const JSON_FORMAT_HINT: &str = "Respond with valid JSON only. No markdown, no extra text.";

// ── Settings ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OracleSettings {
    /// Total attempts per call, including the first.
    pub attempts: u32,
    /// Delay before retry N is `backoff_base^N` seconds (N counted from 0).
    pub backoff_base: f64,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff_base: 2.0,
            temperature: 0.1,
            max_tokens: 512,
        }
    }
}

// ── Usage telemetry ───────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct UsageStats {
    calls: AtomicU64,
    tokens: AtomicU64,
    latency_ms: AtomicU64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct UsageSnapshot {
    pub calls: u64,
    pub tokens: u64,
    pub latency_ms: u64,
}

impl UsageSnapshot {
    pub fn avg_latency_ms(&self) -> u64 {
        if self.calls == 0 { 0 } else { self.latency_ms / self.calls }
    }
}

impl UsageStats {
    fn record(&self, tokens: u64, latency_ms: u64) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.tokens.fetch_add(tokens, Ordering::Relaxed);
        self.latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
    }

    fn snapshot(&self) -> UsageSnapshot {
        UsageSnapshot {
            calls: self.calls.load(Ordering::Relaxed),
            tokens: self.tokens.load(Ordering::Relaxed),
            latency_ms: self.latency_ms.load(Ordering::Relaxed),
        }
    }
}

// ── Completion ────────────────────────────────────────────────────────────────

/// A successful oracle call: the completion text plus advisory metadata.
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    pub model: String,
    pub tokens: Option<u32>,
    pub latency_ms: u64,
}

// ── Client ────────────────────────────────────────────────────────────────────

pub struct OracleClient {
    backend: Arc<dyn CompletionBackend>,
    settings: OracleSettings,
    usage: UsageStats,
}

impl OracleClient {
    pub fn new(backend: Arc<dyn CompletionBackend>, settings: OracleSettings) -> Self {
        Self { backend, settings, usage: UsageStats::default() }
    }

    pub fn model_id(&self) -> &str {
        self.backend.model_id()
    }

    pub fn is_local(&self) -> bool {
        self.backend.is_local()
    }

    pub fn usage(&self) -> UsageSnapshot {
        self.usage.snapshot()
    }

    /// One oracle call with retries. Each failed attempt is logged and
    /// retried after `backoff_base^attempt` seconds; only the final
    /// attempt's failure surfaces to the caller.
    pub async fn complete(
        &self,
        user: &str,
        system: Option<&str>,
    ) -> Result<Completion, OracleError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(Message::system(format!("{system}\n\n{JSON_FORMAT_HINT}")));
        }
        messages.push(Message::user(user));

        let req = CompletionRequest {
            messages,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        let attempts = self.settings.attempts.max(1);
        let mut last_err = OracleError::Unavailable("no attempts made".to_string());

        for attempt in 0..attempts {
            let start = Instant::now();
            match self.backend.complete(req.clone()).await {
                Ok(resp) => {
                    let latency_ms = start.elapsed().as_millis() as u64;
                    let tokens = resp.prompt_tokens + resp.completion_tokens;
                    self.usage.record(tokens as u64, latency_ms);
                    debug!(
                        model = %resp.model,
                        tokens,
                        latency_ms,
                        "oracle call succeeded"
                    );
                    return Ok(Completion {
                        content: resp.content,
                        model: resp.model,
                        tokens: (tokens > 0).then_some(tokens),
                        latency_ms,
                    });
                }
                Err(e) => {
                    let delay = self.settings.backoff_base.powi(attempt as i32);
                    warn!(
                        attempt = attempt + 1,
                        attempts,
                        delay_s = delay,
                        error = %e,
                        "oracle attempt failed"
                    );
                    last_err = e;
                    if attempt + 1 < attempts {
                        tokio::time::sleep(Duration::from_secs_f64(delay)).await;
                    }
                }
            }
        }

        warn!(attempts, "all oracle attempts exhausted");
        Err(last_err)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
