use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::models::contract::{Contract, ContractSource, MatchKind, Metadata};
use crate::models::errors::ResolveError;
use crate::utils::strip_html;

const METADATA_FILE: &str = "metadata.json";

static SOURCE_PATH_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/contracts/(full|partial)_match/\d*/\w*/(sources/)?")
        .expect("source path prefix pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    #[serde(alias = "full")]
    Perfect,
    Partial,
}

impl From<VerificationStatus> for MatchKind {
    fn from(status: VerificationStatus) -> Self {
        match status {
            VerificationStatus::Perfect => MatchKind::RemotePerfect,
            VerificationStatus::Partial => MatchKind::RemotePartial,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifiedFile {
    pub name: String,
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerificationResponse {
    pub status: VerificationStatus,
    #[serde(default)]
    pub files: Vec<VerifiedFile>,
}

/// Remote registry of verified contract sources.
#[async_trait]
pub trait VerificationSource: Send + Sync {
    async fn fetch_files(
        &self,
        chain_id: u64,
        address: Address,
    ) -> Result<VerificationResponse, ResolveError>;
}

pub struct SourcifyClient {
    client: reqwest::Client,
    base_url: String,
}

impl SourcifyClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn files_url(&self, chain_id: u64, address: Address) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            chain_id,
            address
        )
    }
}

#[async_trait]
impl VerificationSource for SourcifyClient {
    async fn fetch_files(
        &self,
        chain_id: u64,
        address: Address,
    ) -> Result<VerificationResponse, ResolveError> {
        let url = self.files_url(chain_id, address);
        debug!("Fetching verified sources from {}", url);

        let response =
            self.client
                .get(&url)
                .send()
                .await
                .map_err(|e| ResolveError::Network {
                    resource: "verified sources",
                    address,
                    reason: e.to_string(),
                })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(
                "Verification lookup for {} returned {}: {}",
                address,
                status,
                strip_html(&body)
            );
            return Err(ResolveError::Unverified { address });
        }

        response
            .json::<VerificationResponse>()
            .await
            .map_err(|e| ResolveError::InvalidMetadata {
                address,
                reason: e.to_string(),
            })
    }
}

/// Builds a contract from a verification response.
///
/// `metadata.json` supplies the ABI and compiler info. Every other file is a source text.
pub fn contract_from_files(
    address: Address,
    bytecode: Bytes,
    response: VerificationResponse,
) -> Result<Contract, ResolveError> {
    let (metadata_files, source_files): (Vec<_>, Vec<_>) = response
        .files
        .into_iter()
        .partition(|file| file.name == METADATA_FILE);

    let metadata_file = metadata_files
        .into_iter()
        .next()
        .ok_or_else(|| ResolveError::InvalidMetadata {
            address,
            reason: format!("{METADATA_FILE} missing"),
        })?;
    let metadata: Metadata = serde_json::from_str(&metadata_file.content).map_err(|e| {
        ResolveError::InvalidMetadata {
            address,
            reason: e.to_string(),
        }
    })?;

    let name = metadata
        .target_name()
        .map(str::to_string)
        .unwrap_or_else(|| address.to_string());
    let sources = source_files
        .into_iter()
        .map(|file| ContractSource {
            path: strip_source_prefix(&file.path),
            content: file.content,
        })
        .collect();

    Ok(
        Contract::new(address, name, metadata.abi(), bytecode, response.status.into())
            .with_sources(sources)
            .with_info(metadata.info()),
    )
}

/// Drops the `/contracts/<match>/<chain>/<address>/sources/` prefix of a stored file path.
pub fn strip_source_prefix(path: &str) -> String {
    let rooted = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    SOURCE_PATH_PREFIX.replace(&rooted, "").into_owned()
}
