use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::models::contract::{Artifact, ContractSource, Metadata};

/// Loads every artifact under `<artifacts_path>/*.sol/*.json`.
///
/// A missing artifacts directory yields an empty corpus. Unreadable or unparseable files are
/// skipped.
pub async fn load_artifacts(artifacts_path: &Path) -> Vec<Artifact> {
    let mut artifacts = Vec::new();

    let source_dirs = match sorted_entries(artifacts_path).await {
        Ok(entries) => entries,
        Err(e) => {
            debug!(
                "No artifacts loaded from {}: {}",
                artifacts_path.display(),
                e
            );
            return artifacts;
        }
    };

    for source_dir in source_dirs {
        let is_source_dir = source_dir
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(".sol"));
        if !is_source_dir {
            continue;
        }
        if !fs::metadata(&source_dir)
            .await
            .is_ok_and(|metadata| metadata.is_dir())
        {
            continue;
        }

        let files = match sorted_entries(&source_dir).await {
            Ok(files) => files,
            Err(e) => {
                warn!("Failed to list {}: {}", source_dir.display(), e);
                continue;
            }
        };

        for file in files {
            if file.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match read_artifact(&file).await {
                Ok(artifact) => artifacts.push(artifact),
                Err(e) => warn!("Skipping artifact {}: {}", file.display(), e),
            }
        }
    }

    debug!(
        "Loaded {} artifacts from {}",
        artifacts.len(),
        artifacts_path.display()
    );
    artifacts
}

async fn read_artifact(path: &Path) -> anyhow::Result<Artifact> {
    let contents = fs::read_to_string(path).await?;
    let mut artifact: Artifact = serde_json::from_str(&contents)?;
    artifact.artifact_name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default()
        .to_string();
    Ok(artifact)
}

async fn sorted_entries(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    let mut read_dir = fs::read_dir(dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        entries.push(entry.path());
    }
    entries.sort();
    Ok(entries)
}

/// Reads the source files named in an artifact's metadata, relative to the project root.
pub async fn read_local_sources(project_path: &Path, metadata: &Metadata) -> Vec<ContractSource> {
    let mut sources = Vec::with_capacity(metadata.sources.len());
    for source in metadata.sources.keys() {
        let path = project_path.join(source);
        match fs::read_to_string(&path).await {
            Ok(content) => sources.push(ContractSource {
                path: source.clone(),
                content,
            }),
            Err(e) => warn!("Failed to read source {}: {}", path.display(), e),
        }
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;

    const COUNTER: &str = r#"{
        "abi": [{"type":"function","name":"increment","inputs":[],"outputs":[],"stateMutability":"nonpayable"}],
        "bytecode": {"object": "0x6080"},
        "deployedBytecode": {"object": "0x6001600155"},
        "metadata": {
            "compiler": {"version": "0.8.24+commit.e11b9ed9"},
            "language": "Solidity",
            "settings": {
                "evmVersion": "cancun",
                "optimizer": {"enabled": true, "runs": 200},
                "compilationTarget": {"src/Counter.sol": "Counter"}
            },
            "sources": {"src/Counter.sol": {}, "lib/Missing.sol": {}}
        }
    }"#;

    #[tokio::test]
    async fn test_load_artifacts_skips_noise() {
        let project = tempfile::tempdir().unwrap();
        let out = project.path().join("out");
        std_fs::create_dir_all(out.join("Counter.sol")).unwrap();
        std_fs::create_dir_all(out.join("build-info")).unwrap();
        std_fs::write(out.join("Counter.sol/Counter.json"), COUNTER).unwrap();
        std_fs::write(out.join("Counter.sol/Broken.json"), "{not json").unwrap();
        std_fs::write(out.join("Counter.sol/notes.txt"), "ignored").unwrap();
        std_fs::write(out.join("build-info/abc.json"), COUNTER).unwrap();

        let artifacts = load_artifacts(&out).await;
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].contract_name(), "Counter");
        assert_eq!(
            artifacts[0].deployed_code().unwrap().as_ref(),
            &[0x60, 0x01, 0x60, 0x01, 0x55]
        );
    }

    #[tokio::test]
    async fn test_missing_artifacts_dir_is_empty() {
        let project = tempfile::tempdir().unwrap();
        assert!(load_artifacts(&project.path().join("out")).await.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_sources_are_skipped() {
        let project = tempfile::tempdir().unwrap();
        std_fs::create_dir_all(project.path().join("src")).unwrap();
        std_fs::write(project.path().join("src/Counter.sol"), "contract Counter {}").unwrap();

        let artifact: Artifact = serde_json::from_str(COUNTER).unwrap();
        let metadata = artifact.metadata.unwrap();
        let sources = read_local_sources(project.path(), &metadata).await;

        assert_eq!(
            sources,
            vec![ContractSource {
                path: "src/Counter.sol".to_string(),
                content: "contract Counter {}".to_string(),
            }]
        );
    }
}
