//! Work pool configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use nanpow_kernel::KernelSource;

use crate::partition::Grid;
use crate::spawner::SpawnerKind;
use crate::WorkError;

/// Configuration for a [`WorkPool`](crate::WorkPool).
///
/// Can be loaded from a TOML file via [`WorkConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkConfig {
    /// Number of lanes, and therefore blocks per round.
    #[serde(default = "default_lanes")]
    pub lanes: usize,

    /// Where lanes run: dedicated threads or tokio blocking tasks.
    #[serde(default)]
    pub spawner: SpawnerKind,

    /// Kernel bytecode to load instead of the built-in kernel.
    #[serde(default)]
    pub kernel_path: Option<PathBuf>,

    /// Abandon a round that has not settled after this many milliseconds.
    #[serde(default)]
    pub round_timeout_ms: Option<u64>,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_lanes() -> usize {
    16
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl WorkConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, WorkError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| WorkError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, WorkError> {
        let config: Self = toml::from_str(s).map_err(|e| WorkError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, WorkError> {
        toml::to_string_pretty(self).map_err(|e| WorkError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), WorkError> {
        Grid::for_lanes(self.lanes)?;
        if self.round_timeout_ms == Some(0) {
            return Err(WorkError::Config(
                "round_timeout_ms must be positive when set".to_string(),
            ));
        }
        match self.log_format.as_str() {
            "human" | "json" => Ok(()),
            other => Err(WorkError::Config(format!(
                "log_format must be \"human\" or \"json\", got {other:?}"
            ))),
        }
    }

    pub fn round_timeout(&self) -> Option<Duration> {
        self.round_timeout_ms.map(Duration::from_millis)
    }

    pub fn kernel_source(&self) -> KernelSource {
        match &self.kernel_path {
            Some(path) => KernelSource::File(path.clone()),
            None => KernelSource::Native,
        }
    }
}

impl Default for WorkConfig {
    fn default() -> Self {
        Self {
            lanes: default_lanes(),
            spawner: SpawnerKind::default(),
            kernel_path: None,
            round_timeout_ms: None,
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = WorkConfig::default();
        let toml_str = config.to_toml_string().expect("should serialize");
        let parsed = WorkConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.lanes, config.lanes);
        assert_eq!(parsed.spawner, config.spawner);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = WorkConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.lanes, 16);
        assert_eq!(config.spawner, SpawnerKind::Thread);
        assert_eq!(config.round_timeout(), None);
        assert!(matches!(config.kernel_source(), KernelSource::Native));
        assert_eq!(config.log_format, "human");
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            lanes = 12
            spawner = "blocking"
            round_timeout_ms = 2500
            kernel_path = "kernels/pow.wasm"
        "#;
        let config = WorkConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.lanes, 12);
        assert_eq!(config.spawner, SpawnerKind::Blocking);
        assert_eq!(config.round_timeout(), Some(Duration::from_millis(2500)));
        assert!(matches!(config.kernel_source(), KernelSource::File(_)));
        assert_eq!(config.log_level, "info"); // default
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(WorkConfig::from_toml_str("lanes = 0").is_err());
        assert!(WorkConfig::from_toml_str("lanes = 1000").is_err());
        assert!(WorkConfig::from_toml_str("round_timeout_ms = 0").is_err());
        assert!(WorkConfig::from_toml_str("log_format = \"xml\"").is_err());
        assert!(WorkConfig::from_toml_str("spawner = \"fiber\"").is_err());
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = WorkConfig::from_toml_file("/nonexistent/nanpow.toml");
        assert!(matches!(result, Err(WorkError::Config(_))));
    }

    #[test]
    fn file_is_read() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nanpow.toml");
        std::fs::write(&path, "lanes = 4\nlog_format = \"json\"\n").unwrap();
        let config = WorkConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.lanes, 4);
        assert_eq!(config.log_format, "json");
    }
}
