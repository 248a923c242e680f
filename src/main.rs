use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use epg_merger::{
    config::Config,
    generator::XmltvGenerator,
    ingestor::{load_overrides, SourceIngestor},
    merge::{EpgMerger, NameOverrides},
};

#[derive(Parser)]
#[command(name = "epg-merger")]
#[command(version)]
#[command(about = "Merge, deduplicate and rename channels across multiple XMLTV/EPG feeds")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Output XMLTV path (overrides config file)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// JSON run report path (overrides config file)
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("epg_merger={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting EPG merger v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load_from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config.display());

    if let Some(output) = cli.output {
        config.output.path = output;
    }
    if let Some(report) = cli.report {
        config.output.report_path = Some(report);
    }

    if config.sources.is_empty() {
        warn!("No sources configured, the merged document will be empty");
    }

    let overrides = match &config.overrides.path {
        Some(path) => load_overrides(path).await,
        None => NameOverrides::new(),
    };

    let ingestor = SourceIngestor::new(&config.fetch)?;
    let inputs = ingestor
        .ingest_all(&config.sources, chrono::Utc::now().timestamp())
        .await;

    let merger = EpgMerger::new(config.merge_config(overrides));
    let output = merger.merge(inputs);

    let generator = XmltvGenerator::new(
        config.output.generator_info_name.clone(),
        config.output.generator_info_url.clone(),
    );
    generator
        .write_to_file(&output.document, &config.output.path)
        .await?;

    if let Some(report_path) = &config.output.report_path {
        let report_json = serde_json::to_string_pretty(&output.report)?;
        tokio::fs::write(report_path, report_json).await?;
        info!("Run report written to {}", report_path.display());
    }

    Ok(())
}
