use alloy_primitives::U256;
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use std::path::Path;
use tracing::{debug, info};

use crate::models::common::Settings;
use crate::models::errors::TraceError;

pub const ENV_PREFIX: &str = "CALLTREE";

/// Parses a `0x`-prefixed hex quantity into a 256-bit integer.
pub fn hex_to_u256(field: &'static str, value: &str) -> Result<U256, TraceError> {
    let malformed = || TraceError::MalformedTraceData {
        field,
        value: value.to_string(),
    };

    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .ok_or_else(malformed)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(malformed());
    }

    // Overflow past 256 bits is rejected here
    U256::from_str_radix(digits, 16).map_err(|_| malformed())
}

/// Layers `config.yml`, then `CALLTREE_*` environment variables, over the defaults.
///
/// An explicitly requested file must exist. The implicit `config.yml` is optional.
pub fn load_config(file_name: Option<&Path>) -> Result<Settings> {
    let (config_path, required) = match file_name {
        Some(path) => (path, true),
        None => (Path::new("config.yml"), false),
    };
    info!("Config path: {}", config_path.to_string_lossy());

    let settings: Settings = Config::builder()
        .add_source(
            File::from(config_path)
                .format(FileFormat::Yaml)
                .required(required),
        )
        .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
        .build()
        .context("failed to read config")?
        .try_deserialize()
        .context("failed to parse config")?;

    debug!("Loaded settings: {:?}", settings);
    Ok(settings)
}

/// Readable text of an HTTP error body.
///
/// HTML error pages collapse to their first line that is not markup. Other bodies pass through.
pub fn strip_html(body: &str) -> String {
    let lowered = body.to_ascii_lowercase();
    if !lowered.contains("<!doctype html") && !lowered.contains("<html") {
        return body.trim().to_string();
    }
    body.lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !(line.starts_with('<') || line.ends_with('>')))
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_hex_quantities() {
        assert_eq!(hex_to_u256("gas", "0x5208").unwrap(), U256::from(21000));
        assert_eq!(hex_to_u256("gas", "0X0").unwrap(), U256::ZERO);
        assert_eq!(
            hex_to_u256("value", &format!("0x{}", "f".repeat(64))).unwrap(),
            U256::MAX
        );
        // Canonical re-encoding
        assert_eq!(
            format!("{:#x}", hex_to_u256("gas", "0x5208").unwrap()),
            "0x5208"
        );
    }

    #[test]
    fn test_malformed_hex_quantities() {
        let overflow = format!("0x1{}", "0".repeat(64));
        for bad in ["", "0x", "5208", "0xzz", "0x-1", overflow.as_str()] {
            match hex_to_u256("gasUsed", bad) {
                Err(TraceError::MalformedTraceData { field, value }) => {
                    assert_eq!(field, "gasUsed");
                    assert_eq!(value, bad);
                }
                other => panic!("expected malformed error for {bad:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_load_config_from_yaml() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(
            file,
            "rpc_url: https://rpc.example.org\nchain_id: 10\nartifacts_dir: build"
        )
        .unwrap();

        let settings = load_config(Some(file.path())).unwrap();
        assert_eq!(settings.rpc_url, "https://rpc.example.org");
        assert_eq!(settings.chain_id, 10);
        assert_eq!(settings.artifacts_dir, "build");
        // Untouched keys keep their defaults
        assert_eq!(settings.verification_url, Settings::default().verification_url);
        assert!(settings.color);
    }

    #[test]
    fn test_missing_explicit_config_fails() {
        assert!(load_config(Some(Path::new("/nonexistent/calltree.yml"))).is_err());
    }

    #[test]
    fn test_strip_html() {
        let page = "<!DOCTYPE html>\n<html>\n<body>\n  Too Many Requests\n</body>\n</html>";
        assert_eq!(strip_html(page), "Too Many Requests");
        assert_eq!(strip_html("<html><body></body></html>"), "");
        assert_eq!(strip_html(" plain error\n"), "plain error");
    }
}
