use alloy_primitives::{Address, Bytes};
use futures::future::join_all;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

use crate::contracts::artifacts::read_local_sources;
use crate::contracts::sourcify::{VerificationSource, contract_from_files};
use crate::models::contract::{Artifact, Contract, MatchKind};
use crate::models::errors::ResolveError;
use crate::tracer::ChainSource;

/// Maps addresses to contracts: local artifacts first, then the verification service, then a stub.
pub struct ContractResolver<'a> {
    chain: &'a dyn ChainSource,
    verifier: &'a dyn VerificationSource,
    artifacts: &'a [Artifact],
    project_path: &'a Path,
    chain_id: u64,
}

impl<'a> ContractResolver<'a> {
    pub fn new(
        chain: &'a dyn ChainSource,
        verifier: &'a dyn VerificationSource,
        artifacts: &'a [Artifact],
        project_path: &'a Path,
        chain_id: u64,
    ) -> Self {
        Self {
            chain,
            verifier,
            artifacts,
            project_path,
            chain_id,
        }
    }

    /// Resolves every address concurrently and waits for the full set.
    ///
    /// Addresses are expected to be distinct; each one costs one bytecode read.
    pub async fn resolve_all(&self, addresses: &[Address]) -> HashMap<Address, Contract> {
        let contracts = join_all(addresses.iter().map(|&address| self.resolve(address))).await;
        contracts
            .into_iter()
            .map(|contract| (contract.address, contract))
            .collect()
    }

    /// Never fails: anything unresolvable becomes [`Contract::unknown`].
    pub async fn resolve(&self, address: Address) -> Contract {
        // Step 1: runtime code, read once per address
        let bytecode = match self.chain.get_code(address).await {
            Ok(bytecode) => bytecode,
            Err(e) => {
                warn!("{}", e);
                return Contract::unknown(address, Bytes::new());
            }
        };

        // EOAs and destroyed contracts have nothing to match
        if bytecode.is_empty() {
            debug!("{}", ResolveError::NoBytecode { address });
            return Contract::unknown(address, bytecode);
        }

        // Step 2: local artifacts, step 3: verification service
        let contract = match self.find_artifact(&bytecode) {
            Some(artifact) => self.contract_from_artifact(address, bytecode, artifact).await,
            None => self.fetch_verified(address, bytecode).await,
        };
        debug!(
            "Resolved {} as {} ({})",
            address, contract.name, contract.provenance
        );
        contract
    }

    fn find_artifact(&self, bytecode: &Bytes) -> Option<&'a Artifact> {
        self.artifacts
            .iter()
            .find(|artifact| artifact.deployed_code().as_ref() == Some(bytecode))
    }

    async fn contract_from_artifact(
        &self,
        address: Address,
        bytecode: Bytes,
        artifact: &Artifact,
    ) -> Contract {
        let contract = Contract::new(
            address,
            artifact.contract_name(),
            artifact.abi.clone(),
            bytecode,
            MatchKind::LocalExact,
        );
        match &artifact.metadata {
            Some(metadata) => contract
                .with_sources(read_local_sources(self.project_path, metadata).await)
                .with_info(metadata.info()),
            None => contract,
        }
    }

    async fn fetch_verified(&self, address: Address, bytecode: Bytes) -> Contract {
        let result = self
            .verifier
            .fetch_files(self.chain_id, address)
            .await
            .and_then(|response| contract_from_files(address, bytecode.clone(), response));

        match result {
            Ok(contract) => contract,
            // Network failures warn, an unverified address only logs at debug
            Err(e @ ResolveError::Network { .. }) => {
                warn!("{}", e);
                Contract::unknown(address, bytecode)
            }
            Err(e) => {
                debug!("{}", e);
                Contract::unknown(address, bytecode)
            }
        }
    }
}
