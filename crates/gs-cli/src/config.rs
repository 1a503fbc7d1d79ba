//! CLI configuration loaded from `goscript.toml` files

use crate::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILE: &str = "goscript.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub toolchain: ToolchainConfig,
    pub run: RunConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// The `go` binary, looked up in `PATH` when relative.
    pub go: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Leave the rewritten sources on disk after the program exits.
    pub keep_temp_dir: bool,
    pub temp_prefix: String,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            go: PathBuf::from("go"),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            keep_temp_dir: false,
            temp_prefix: "goscript".to_string(),
        }
    }
}

impl CliConfig {
    /// Load configuration from `config_path`, or from `goscript.toml` in the
    /// home directory and then the working directory, each layered over the
    /// defaults. Missing files in the standard locations are skipped.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut merged = toml::Value::try_from(Self::default())
            .map_err(|e| CliError::Config(format!("Failed to serialize defaults: {}", e)))?;

        if let Some(path) = config_path {
            merge(&mut merged, Self::read_value(path)?);
        } else {
            let candidates = dirs::home_dir()
                .map(|home| home.join(CONFIG_FILE))
                .into_iter()
                .chain(std::iter::once(PathBuf::from(CONFIG_FILE)));
            for path in candidates {
                if path.is_file() {
                    merge(&mut merged, Self::read_value(&path)?);
                }
            }
        }

        merged
            .try_into()
            .map_err(|e| CliError::Config(format!("Invalid configuration: {}", e)))
    }

    /// Load configuration from a specific file, filling gaps with defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        Self::load(Some(path))
    }

    fn read_value(path: &Path) -> Result<toml::Value> {
        debug!(path = %path.display(), "reading configuration");
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            CliError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })
    }
}

fn merge(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[run]\nkeep_temp_dir = true").unwrap();

        let config = CliConfig::load(Some(file.path())).unwrap();
        assert!(config.run.keep_temp_dir);
        assert_eq!(config.run.temp_prefix, "goscript");
        assert_eq!(config.toolchain.go, PathBuf::from("go"));
    }

    #[test]
    fn later_tables_override_earlier_ones() {
        let mut base = toml::Value::try_from(CliConfig::default()).unwrap();
        merge(
            &mut base,
            toml::from_str("[toolchain]\ngo = \"/usr/local/go/bin/go\"").unwrap(),
        );
        let config: CliConfig = base.try_into().unwrap();
        assert_eq!(config.toolchain.go, PathBuf::from("/usr/local/go/bin/go"));
        assert!(!config.run.keep_temp_dir);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[run\nkeep_temp_dir = ").unwrap();

        let err = CliConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, CliError::Config(_)), "{err}");
    }
}
