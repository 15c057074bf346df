use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";
pub const DEFAULT_VERIFICATION_URL: &str = "https://sourcify.dev/server/files/any";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub rpc_url: String,
    // 0 means detect over RPC
    pub chain_id: u64,
    pub project_path: PathBuf,
    pub artifacts_dir: String,
    pub verification_url: String,
    pub color: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            chain_id: 0,
            project_path: PathBuf::from("."),
            artifacts_dir: "out".to_string(),
            verification_url: DEFAULT_VERIFICATION_URL.to_string(),
            color: true,
        }
    }
}

impl Settings {
    pub fn artifacts_path(&self) -> PathBuf {
        self.project_path.join(&self.artifacts_dir)
    }
}
