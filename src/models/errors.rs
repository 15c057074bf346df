use alloy_primitives::{Address, B256, Selector};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Malformed trace data: field `{field}` is not a valid hex quantity: {value:?}")]
    MalformedTraceData { field: &'static str, value: String },
    #[error("Trace source returned no result for transaction {tx_hash}")]
    MissingTrace { tx_hash: B256 },
    #[error("RPC error while tracing transaction {tx_hash}: {reason}")]
    Rpc { tx_hash: B256, reason: String },
}

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Network failure fetching {resource} for {address}: {reason}")]
    Network {
        resource: &'static str,
        address: Address,
        reason: String,
    },
    #[error("No bytecode deployed at {address}")]
    NoBytecode { address: Address },
    #[error("Verification service has no usable match for {address}")]
    Unverified { address: Address },
    #[error("Invalid verification metadata for {address}: {reason}")]
    InvalidMetadata { address: Address, reason: String },
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Unknown selector {selector}")]
    UnknownSelector { selector: Selector },
    #[error("Calldata shorter than a selector ({len} bytes)")]
    EmptyCalldata { len: usize },
    #[error("No event matches topic {topic} with {indexed} indexed parameters")]
    UnknownEvent { topic: B256, indexed: usize },
    #[error("Log has no topics")]
    AnonymousLog,
    #[error("Unknown error selector in revert data")]
    UnknownError,
    #[error("Contract ABI declares no constructor")]
    MissingConstructor,
    #[error("ABI decoding failed: {0}")]
    Abi(#[from] alloy_dyn_abi::Error),
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Contract {address} not found")]
    MissingContract { address: Address },
}
