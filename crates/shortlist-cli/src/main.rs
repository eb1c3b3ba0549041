//! shortlist CLI - リクエストを 1 件実行してレポートを出力
//!
//! ```text
//! shortlist request.json --sources sources.json --config shortlist.toml
//! ```
//!
//! sources ファイルはソース名 → レコード一覧の JSON オブジェクト:
//! `{"linkedin": [{"name": "Ada", "skills": ["rust"]}], "indeed": []}`

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use indexmap::IndexMap;
use tracing::info;

use shortlist_core::config::ScoringBackend;
use shortlist_core::domain::Record;
use shortlist_core::impls::{StaticSource, UnavailableSource};
use shortlist_core::logging::init_logging;
use shortlist_core::{OrchestrationRequest, OrchestratorBuilder, Settings};

#[derive(Parser)]
#[command(name = "shortlist", about = "Parse, search, merge and rank candidate records", version)]
struct Cli {
    /// Orchestration request (JSON)
    request: PathBuf,

    /// Config file; `shortlist.toml` in the working directory when present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Static sources (JSON object: source name -> records)
    #[arg(short, long)]
    sources: Option<PathBuf>,

    /// Register a source that always fails (repeatable)
    #[arg(long = "unavailable", value_name = "NAME")]
    unavailable: Vec<String>,

    /// Override the request's mode
    #[arg(short, long)]
    mode: Option<String>,

    /// Override the configured scoring backend
    #[arg(long, value_parser = parse_backend)]
    backend: Option<ScoringBackend>,

    /// Print compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,
}

fn parse_backend(raw: &str) -> Result<ScoringBackend, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|_| format!("unknown scoring backend '{raw}' (expected keyword or neutral)"))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut settings = Settings::load_from(cli.config.as_deref()).context("failed to load settings")?;
    if let Some(backend) = cli.backend {
        settings.scoring.backend = backend;
    }
    init_logging(&settings.logging);

    let mut request: OrchestrationRequest = read_json(&cli.request)?;
    if let Some(mode) = cli.mode {
        request.mode = mode;
    }

    let mut builder = OrchestratorBuilder::from_settings(&settings);
    if let Some(path) = &cli.sources {
        let sources: IndexMap<String, Vec<Record>> = read_json(path)?;
        for (name, records) in sources {
            builder = builder.source(StaticSource::new(name, records));
        }
    }
    for name in cli.unavailable {
        builder = builder.source(UnavailableSource::new(name, "marked unavailable"));
    }
    let orchestrator = builder.build().context("invalid orchestrator wiring")?;

    info!(
        mode = %request.mode,
        sources = ?orchestrator.source_names(),
        "running request"
    );
    let report = orchestrator.run(request).await?;

    let rendered = if cli.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{rendered}");

    Ok(if report.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
