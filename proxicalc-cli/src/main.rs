//! Proxicalc CLI - run the proximity indexing batch pipeline
//!
//! Loads the run configuration (TOML file plus flag overrides), connects to
//! the search backend and drives the pipeline to completion. Fatal errors
//! terminate with a diagnostic and a non-zero exit code; per-record failures
//! only show up in logs and the final tally.

use clap::Parser;
use proxicalc_core::{init_logging, IndexerConfig, LoggingConfig};
use proxicalc_elastic::ElasticClient;
use proxicalc_pipeline::ProximityPipeline;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;

#[derive(Parser)]
#[command(name = "proxicalc")]
#[command(about = "Batch proximity indexer for numeric tokens in document collections")]
#[command(version = "0.1.0")]
struct Cli {
    /// Configuration file path (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Index the documents are scrolled from
    #[arg(long)]
    source_index: Option<String>,

    /// Prefix of the per-language target indices
    #[arg(long)]
    target_prefix: Option<String>,

    /// Half-width of the context window around a numeric anchor
    #[arg(long)]
    ambit: Option<usize>,

    /// Hits per scroll page
    #[arg(long)]
    page_size: Option<usize>,

    /// Buffered record count that triggers a flush
    #[arg(long)]
    chunk_threshold: Option<usize>,

    /// Scroll keep-alive in minutes
    #[arg(long)]
    keep_alive: Option<u64>,

    /// Backend scheme (http or https)
    #[arg(long)]
    elastic_scheme: Option<String>,

    /// Backend address
    #[arg(long)]
    elastic_address: Option<String>,

    /// Backend port
    #[arg(long)]
    elastic_port: Option<u16>,

    /// Basic-auth username
    #[arg(long)]
    elastic_username: Option<String>,

    /// Basic-auth password
    #[arg(long)]
    elastic_password: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<IndexerConfig> {
        let mut config = match &self.config {
            Some(path) => IndexerConfig::from_file(path)?,
            None => IndexerConfig::default(),
        };

        if let Some(source_index) = self.source_index {
            config.indexing.source_index = source_index;
        }
        if let Some(target_prefix) = self.target_prefix {
            config.indexing.target_prefix = target_prefix;
        }
        if let Some(ambit) = self.ambit {
            config.indexing.ambit = ambit;
        }
        if let Some(page_size) = self.page_size {
            config.indexing.page_size = page_size;
        }
        if let Some(chunk_threshold) = self.chunk_threshold {
            config.indexing.chunk_threshold = chunk_threshold;
        }
        if let Some(keep_alive) = self.keep_alive {
            config.indexing.keep_alive_minutes = keep_alive;
        }
        if let Some(scheme) = self.elastic_scheme {
            config.elastic.scheme = scheme;
        }
        if let Some(address) = self.elastic_address {
            config.elastic.address = address;
        }
        if let Some(port) = self.elastic_port {
            config.elastic.port = port;
        }
        if let Some(username) = self.elastic_username {
            config.elastic.username = Some(username);
        }
        if let Some(password) = self.elastic_password {
            config.elastic.password = Some(password);
        }

        config.validate()?;
        Ok(config)
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut logging = LoggingConfig::default();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    init_logging(&logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let config = cli.into_config()?;
    let client = Arc::new(ElasticClient::new(&config.elastic)?);

    let pipeline = ProximityPipeline::new(config, client);
    let summary = pipeline.run().await?;

    println!(
        "Done in {:?}: {}/{} documents, {} records indexed, {} failed, {} cycles",
        summary.elapsed,
        summary.processed_docs,
        summary.total_docs,
        summary.succeeded,
        summary.failed,
        summary.cycles
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!(error = %e, "Run aborted");
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
