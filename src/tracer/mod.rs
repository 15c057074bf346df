pub mod render;
pub mod rpc;
pub mod transformations;

use alloy_eips::BlockId;
use alloy_network::AnyNetwork;
use alloy_primitives::{Address, B256, Bytes};
use alloy_provider::Provider;
use alloy_rpc_types_trace::geth::{
    GethDebugBuiltInTracerType, GethDebugTracerConfig, GethDebugTracerType,
    GethDebugTracingOptions,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::contracts::{ContractResolver, VerificationSource, load_artifacts};
use crate::models::common::Settings;
use crate::models::errors::{ResolveError, TraceError};
use crate::models::trace::RawCall;
use crate::tracer::render::TraceRenderer;
use crate::tracer::rpc::traces::TraceParser;
use crate::tracer::transformations::calls::flatten_call_tree;

/// Chain reads needed to render one transaction.
#[async_trait]
pub trait ChainSource: Send + Sync {
    /// Nested `callTracer` frame with logs, `None` when the node knows no such transaction.
    async fn trace_transaction(&self, tx_hash: B256) -> Result<Option<RawCall>, TraceError>;

    /// Runtime bytecode at the latest block.
    async fn get_code(&self, address: Address) -> Result<Bytes, ResolveError>;
}

pub struct RpcChainSource<P> {
    provider: P,
}

impl<P> RpcChainSource<P>
where
    P: Provider<AnyNetwork>,
{
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub async fn get_chain_id(&self) -> Result<u64> {
        self.provider
            .get_chain_id()
            .await
            .context("failed to get chain id")
    }
}

#[async_trait]
impl<P> ChainSource for RpcChainSource<P>
where
    P: Provider<AnyNetwork> + Send + Sync,
{
    async fn trace_transaction(&self, tx_hash: B256) -> Result<Option<RawCall>, TraceError> {
        let trace_options = GethDebugTracingOptions {
            tracer: Some(GethDebugTracerType::BuiltInTracer(
                GethDebugBuiltInTracerType::CallTracer,
            )),
            tracer_config: GethDebugTracerConfig(serde_json::json!({"withLog": true})),
            ..Default::default()
        };

        // Raw frames keep quantities as hex strings for normalization
        self.provider
            .raw_request::<_, Option<RawCall>>(
                "debug_traceTransaction".into(),
                (tx_hash, trace_options),
            )
            .await
            .map_err(|e| TraceError::Rpc {
                tx_hash,
                reason: e.to_string(),
            })
    }

    async fn get_code(&self, address: Address) -> Result<Bytes, ResolveError> {
        self.provider
            .get_code_at(address)
            .block_id(BlockId::latest())
            .await
            .map_err(|e| ResolveError::Network {
                resource: "bytecode",
                address,
                reason: e.to_string(),
            })
    }
}

/// Fetches, normalizes, resolves and renders the call tree of one transaction.
///
/// The trace fetch and artifact loading run together. All contract resolutions complete
/// before rendering starts.
pub async fn trace_transaction(
    chain: &dyn ChainSource,
    verifier: &dyn VerificationSource,
    settings: &Settings,
    chain_id: u64,
    tx_hash: B256,
) -> Result<String, TraceError> {
    let artifacts_path = settings.artifacts_path();
    let (raw_trace, artifacts) = tokio::join!(
        chain.trace_transaction(tx_hash),
        load_artifacts(&artifacts_path)
    );
    let raw_trace = raw_trace?.ok_or(TraceError::MissingTrace { tx_hash })?;

    if tracing::enabled!(tracing::Level::DEBUG) {
        match serde_json::to_string_pretty(&raw_trace) {
            Ok(dump) => debug!("Raw trace for {}:\n{}", tx_hash, dump),
            Err(e) => debug!("Raw trace for {} not serializable: {}", tx_hash, e),
        }
    }

    // Any malformed quantity aborts before resolution starts
    let root = raw_trace.parse_trace()?;
    let flattened = flatten_call_tree(&root);
    info!(
        "Trace has {} calls across {} addresses",
        flattened.nodes.len(),
        flattened.addresses.len()
    );

    let resolver = ContractResolver::new(
        chain,
        verifier,
        &artifacts,
        &settings.project_path,
        chain_id,
    );
    // Barrier: every address is resolved before anything renders
    let contracts = resolver.resolve_all(&flattened.addresses).await;

    Ok(TraceRenderer::new(&contracts)
        .with_color(settings.color)
        .render(&root))
}
