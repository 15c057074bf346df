use alloy_network::AnyNetwork;
use alloy_primitives::B256;
use alloy_provider::ProviderBuilder;
use anyhow::{Result, anyhow};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{self, EnvFilter};
use url::Url;

use calltree::contracts::SourcifyClient;
use calltree::models::common::Settings;
use calltree::tracer::{RpcChainSource, trace_transaction};
use calltree::utils::load_config;

/// Render the decoded call tree of a transaction
#[derive(Parser, Debug)]
#[command(name = "calltree", version)]
struct Cli {
    /// Hash of the transaction to trace
    tx_hash: B256,

    /// Node endpoint serving `debug_traceTransaction`
    #[arg(long)]
    rpc_url: Option<String>,

    /// Chain id for verification lookups, detected over RPC when omitted
    #[arg(long)]
    chain_id: Option<u64>,

    /// Project root holding sources and build artifacts
    #[arg(long)]
    project_path: Option<PathBuf>,

    /// Artifacts directory relative to the project root
    #[arg(long)]
    artifacts_dir: Option<String>,

    #[arg(long)]
    verification_url: Option<String>,

    /// YAML config file, `config.yml` is read when present
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    no_color: bool,

    /// Log debug output, including the raw trace, to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    // Flags take precedence over config file and environment
    fn apply(&self, settings: &mut Settings) {
        if let Some(rpc_url) = &self.rpc_url {
            settings.rpc_url = rpc_url.clone();
        }
        if let Some(chain_id) = self.chain_id {
            settings.chain_id = chain_id;
        }
        if let Some(project_path) = &self.project_path {
            settings.project_path = project_path.clone();
        }
        if let Some(artifacts_dir) = &self.artifacts_dir {
            settings.artifacts_dir = artifacts_dir.clone();
        }
        if let Some(verification_url) = &self.verification_url {
            settings.verification_url = verification_url.clone();
        }
        if self.no_color {
            settings.color = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Stdout carries only the rendered tree
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let mut settings = match load_config(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to load config: {:#}", e);
            return Err(e);
        }
    };
    cli.apply(&mut settings);

    let rpc_url: Url = settings.rpc_url.parse()?;
    info!("RPC URL: {}", rpc_url);
    let provider = ProviderBuilder::new()
        .network::<AnyNetwork>()
        .connect_http(rpc_url);
    let chain = RpcChainSource::new(provider);

    let chain_id = if settings.chain_id == 0 {
        chain.get_chain_id().await?
    } else {
        settings.chain_id
    };
    info!("Chain ID: {}", chain_id);

    let verifier = SourcifyClient::new(settings.verification_url.as_str());
    match trace_transaction(&chain, &verifier, &settings, chain_id, cli.tx_hash).await {
        Ok(rendered) => {
            println!("{rendered}");
            Ok(())
        }
        Err(e) => {
            error!("Failed to trace {}: {}", cli.tx_hash, e);
            Err(anyhow!(e))
        }
    }
}
