//! Taxonyx — Review topic segmentation with adaptive taxonomy discovery.
//! Entry point for the agent binary.

mod config;
mod datagen;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{Config, Provider};
use taxonyx_core::{run_discovery, Classifier, Sentinel};
use taxonyx_llm::{
    AnthropicBackend, CompletionBackend, GeminiBackend, OllamaBackend, OpenAiBackend,
    OracleClient, OracleSettings,
};
use taxonyx_report::{export_results, load_reviews, render_dashboard, render_taxonomy_summary};

#[derive(Parser, Debug)]
#[command(name = "taxonyx", version, about = "Review topic segmentation with adaptive taxonomy discovery")]
struct Cli {
    /// Path to taxonyx.toml (default: TAXONYX_CONFIG or ./taxonyx.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Input CSV file (overrides config)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Name of the review text column (overrides config)
    #[arg(short, long)]
    text_col: Option<String>,

    /// Max rows to process
    #[arg(short, long)]
    limit: Option<usize>,

    /// Generate synthetic test data at the input path first
    #[arg(short, long)]
    generate: bool,
}

fn build_backend(config: &Config) -> anyhow::Result<Arc<dyn CompletionBackend>> {
    let provider = config.oracle.provider;
    let missing_key = || anyhow::anyhow!("no API key resolved for '{}'", provider.as_str());
    let missing_section =
        || anyhow::anyhow!("[oracle.{}] is not configured", provider.as_str());

    let backend: Arc<dyn CompletionBackend> = match provider {
        Provider::Ollama => {
            let ollama = &config.oracle.ollama;
            Arc::new(OllamaBackend::new(&ollama.base_url, &ollama.model))
        }
        Provider::OpenAi => {
            let section = config.oracle.openai.as_ref().ok_or_else(missing_section)?;
            let key = config.resolved_api_key(provider).ok_or_else(missing_key)?;
            Arc::new(OpenAiBackend::new(key, &section.model))
        }
        Provider::Anthropic => {
            let section = config.oracle.anthropic.as_ref().ok_or_else(missing_section)?;
            let key = config.resolved_api_key(provider).ok_or_else(missing_key)?;
            Arc::new(AnthropicBackend::new(key, &section.model))
        }
        Provider::Gemini => {
            let section = config.oracle.gemini.as_ref().ok_or_else(missing_section)?;
            let key = config.resolved_api_key(provider).ok_or_else(missing_key)?;
            Arc::new(GeminiBackend::new(key, &section.model))
        }
    };
    Ok(backend)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("taxonyx=debug,info")),
        )
        .init();

    let cli = Cli::parse();

    info!("Taxonyx starting up");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(input) = cli.input {
        config.data.input_path = input.display().to_string();
    }
    if let Some(col) = cli.text_col {
        config.data.text_column = col;
    }

    // Missing credentials are fatal before any row is touched
    config.validate()?;

    let input_path = PathBuf::from(&config.data.input_path);
    if cli.generate {
        datagen::generate_reviews(
            &input_path,
            datagen::DEFAULT_ROWS,
            datagen::HIDDEN_TOPIC_RATIO,
            &config.data,
        )?;
    }

    if !input_path.exists() {
        anyhow::bail!(
            "input not found: {} (run with --generate to create test data)",
            input_path.display()
        );
    }

    let backend = build_backend(&config)?;
    info!(
        provider = config.oracle.provider.as_str(),
        model = backend.model_id(),
        local = backend.is_local(),
        "oracle backend ready"
    );

    let oracle = OracleClient::new(
        backend,
        OracleSettings {
            attempts: config.oracle.retry_attempts,
            backoff_base: config.oracle.backoff_base,
            temperature: config.oracle.temperature,
            max_tokens: config.oracle.max_tokens,
        },
    );

    let table = load_reviews(&input_path, &config.data.text_column, cli.limit)?;
    if table.is_empty() {
        anyhow::bail!("input table is empty: {}", input_path.display());
    }

    let mut classifier = Classifier::new(oracle, &config.discovery.seed_topics);
    let mut sentinel = Sentinel::new(config.discovery.threshold, &config.audit.log_path);
    let seed_topics = classifier.topics().as_slice().to_vec();

    info!(
        rows = table.len(),
        topics = seed_topics.len(),
        threshold = config.discovery.threshold,
        min_confidence = config.discovery.min_confidence,
        "processing reviews"
    );

    let texts = table.texts();
    let (outcomes, summary) = run_discovery(&texts, &mut classifier, &mut sentinel).await?;

    println!("\n{}\n", sentinel.status());

    let output_path = Path::new(&config.data.output_path);
    export_results(&table, &outcomes, output_path)?;
    info!(path = %output_path.display(), "results saved");

    let usage = classifier.oracle().usage();
    println!("{}", render_dashboard(&outcomes, &summary, &usage));
    println!("{}", render_taxonomy_summary(&seed_topics, classifier.topics().as_slice()));

    Ok(())
}
