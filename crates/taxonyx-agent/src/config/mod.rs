//! Configuration loading for Taxonyx.
//! Reads taxonyx.toml from the current directory or the path in the
//! TAXONYX_CONFIG env var. Every option has a default, so a missing
//! file still yields a runnable local-Ollama configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use taxonyx_common::TaxonyxError;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Ollama,
    OpenAi,
    Anthropic,
    Gemini,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Ollama    => "ollama",
            Provider::OpenAi    => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Gemini    => "gemini",
        }
    }

    /// Env var consulted when the config file carries no key.
    pub fn key_env_var(&self) -> &'static str {
        match self {
            Provider::Ollama    => "",
            Provider::OpenAi    => "TAXONYX_OPENAI_API_KEY",
            Provider::Anthropic => "TAXONYX_ANTHROPIC_API_KEY",
            Provider::Gemini    => "TAXONYX_GEMINI_API_KEY",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    #[serde(default = "default_provider")]
    pub provider: Provider,
    #[serde(default)]
    pub ollama: OllamaConfig,
    pub openai: Option<HostedConfig>,
    pub anthropic: Option<HostedConfig>,
    pub gemini: Option<HostedConfig>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_backoff_base")]
    pub backoff_base: f64,
}

fn default_provider()       -> Provider { Provider::Ollama }
fn default_temperature()    -> f32 { 0.1 }
fn default_max_tokens()     -> u32 { 512 }
fn default_retry_attempts() -> u32 { 3 }
fn default_backoff_base()   -> f64 { 2.0 }

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            ollama: OllamaConfig::default(),
            openai: None,
            anthropic: None,
            gemini: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            retry_attempts: default_retry_attempts(),
            backoff_base: default_backoff_base(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_url")]
    pub base_url: String,
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

fn default_ollama_url()   -> String { "http://localhost:11434".to_string() }
fn default_ollama_model() -> String { "llama3".to_string() }

impl Default for OllamaConfig {
    fn default() -> Self {
        Self { base_url: default_ollama_url(), model: default_ollama_model() }
    }
}

/// A hosted provider: model id plus credential. An empty api_key falls
/// back to the provider's env var.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostedConfig {
    pub model: String,
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Min hits before a candidate topic is promoted.
    #[serde(default = "default_threshold")]
    pub threshold: u32,
    /// Minimum confidence for downstream consumers; surfaced in the
    /// output, not gated internally.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    #[serde(default = "default_seed_topics")]
    pub seed_topics: Vec<String>,
}

fn default_threshold()      -> u32 { 5 }
fn default_min_confidence() -> f64 { 0.7 }

fn default_seed_topics() -> Vec<String> {
    [
        "Acting Performance",
        "Plot & Story",
        "Visual Effects",
        "Cinematography",
        "Soundtrack & Score",
        "Direction",
        "Dialogue",
    ]
    .map(str::to_string)
    .to_vec()
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            min_confidence: default_min_confidence(),
            seed_topics: default_seed_topics(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_input_path")]
    pub input_path: String,
    #[serde(default = "default_output_path")]
    pub output_path: String,
    #[serde(default = "default_text_column")]
    pub text_column: String,
    #[serde(default = "default_id_column")]
    pub id_column: String,
    #[serde(default = "default_date_column")]
    pub date_column: String,
}

fn default_input_path()  -> String { "data/reviews.csv".to_string() }
fn default_output_path() -> String { "output/labeled_reviews.csv".to_string() }
fn default_text_column() -> String { "review_text".to_string() }
fn default_id_column()   -> String { "id".to_string() }
fn default_date_column() -> String { "date".to_string() }

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            input_path: default_input_path(),
            output_path: default_output_path(),
            text_column: default_text_column(),
            id_column: default_id_column(),
            date_column: default_date_column(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_audit_path")]
    pub log_path: String,
}

fn default_audit_path() -> String { "output/discovery_log.json".to_string() }

impl Default for AuditConfig {
    fn default() -> Self {
        Self { log_path: default_audit_path() }
    }
}


impl Config {
    /// Load configuration from taxonyx.toml.
    /// Explicit path wins, then TAXONYX_CONFIG, then the current
    /// directory. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path: PathBuf = match path {
            Some(p) => p.to_path_buf(),
            None => std::env::var("TAXONYX_CONFIG")
                .unwrap_or_else(|_| "taxonyx.toml".to_string())
                .into(),
        };

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "config file not found, using defaults (copy taxonyx.example.toml to taxonyx.toml to customize)"
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    fn hosted_section(&self, provider: Provider) -> Option<&HostedConfig> {
        match provider {
            Provider::Ollama    => None,
            Provider::OpenAi    => self.oracle.openai.as_ref(),
            Provider::Anthropic => self.oracle.anthropic.as_ref(),
            Provider::Gemini    => self.oracle.gemini.as_ref(),
        }
    }

    /// Credential for a hosted provider: config value first, env var
    /// fallback. `None` for Ollama (no credential needed) or when
    /// nothing is set.
    pub fn resolved_api_key(&self, provider: Provider) -> Option<String> {
        if provider == Provider::Ollama {
            return None;
        }
        self.hosted_section(provider)
            .map(|c| c.api_key.clone())
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(provider.key_env_var()).ok().filter(|k| !k.is_empty()))
    }

    /// Startup validation: a selected hosted provider must have a
    /// section and a resolvable credential before any item is processed.
    pub fn validate(&self) -> Result<(), TaxonyxError> {
        let provider = self.oracle.provider;
        if provider == Provider::Ollama {
            return Ok(());
        }

        if self.hosted_section(provider).is_none() {
            return Err(TaxonyxError::Config(format!(
                "provider '{}' selected but [oracle.{}] is not configured",
                provider.as_str(),
                provider.as_str()
            )));
        }

        if self.resolved_api_key(provider).is_none() {
            return Err(TaxonyxError::Config(format!(
                "no API key for '{}' (set oracle.{}.api_key or {})",
                provider.as_str(),
                provider.as_str(),
                provider.key_env_var()
            )));
        }

        Ok(())
    }
}
