//! Configuration management for Wordmill
//!
//! Settings merge in precedence order: built-in defaults, an optional TOML
//! file, `WORDMILL_`-prefixed environment variables, then explicit CLI flags
//! (applied by the command layer). Worker sizing is resolved once at startup
//! into an immutable [`EffectiveConfig`].

use std::path::Path;

use anyhow::{Context, Result, bail};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

/// Configuration file looked up in the working directory when no `--config`
/// path is given.
const DEFAULT_CONFIG_FILE: &str = "wordmill.toml";

/// Main configuration structure for Wordmill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordmillConfig {
    /// Analysis worker threads (0 = use all available CPUs)
    pub workers: usize,

    /// Per-stage timeout applied to each record's analysis and
    /// acknowledgment (milliseconds)
    pub task_timeout_ms: u64,

    /// Simulated acknowledgment latency (milliseconds)
    pub notify_latency_ms: u64,

    /// CSV column holding the free text to analyze
    pub text_column: String,

    /// CSV column holding the record identifier
    pub id_column: String,
}

impl Default for WordmillConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            task_timeout_ms: 30_000,
            notify_latency_ms: 100,
            text_column: "text".to_string(),
            id_column: "id".to_string(),
        }
    }
}

impl WordmillConfig {
    /// Load configuration, merging defaults, an optional TOML file and
    /// `WORDMILL_`-prefixed environment variables.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        match config_path {
            Some(path) => {
                if !Path::new(path).exists() {
                    bail!("configuration file not found: {path}");
                }
                figment = figment.merge(Toml::file(path));
            }
            None => {
                figment = figment.merge(Toml::file(DEFAULT_CONFIG_FILE));
            }
        }

        figment = figment.merge(Env::prefixed("WORDMILL_"));

        figment.extract().context("invalid configuration")
    }

    /// The worker count to request from [`EffectiveConfig::resolve`], with
    /// `workers = 0` meaning "all available CPUs".
    pub fn requested_workers(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get()
        } else {
            self.workers
        }
    }
}

/// Worker-pool sizing fixed once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EffectiveConfig {
    /// Pool size actually used
    pub workers: usize,
    /// Worker count the caller asked for
    pub requested: usize,
    /// Host CPU capacity at resolution time
    pub host_cpus: usize,
}

impl EffectiveConfig {
    /// Clamp the requested worker count to host CPU capacity. A request of
    /// zero is an invalid configuration and is rejected before any record is
    /// processed.
    pub fn resolve(requested: usize) -> Result<Self> {
        Self::resolve_with_capacity(requested, num_cpus::get())
    }

    pub fn resolve_with_capacity(requested: usize, host_cpus: usize) -> Result<Self> {
        if requested == 0 {
            bail!("invalid worker count: must be at least 1");
        }

        let host_cpus = host_cpus.max(1);
        Ok(Self {
            workers: requested.min(host_cpus),
            requested,
            host_cpus,
        })
    }

    /// Whether the request exceeded capacity and was reduced.
    pub fn clamped(&self) -> bool {
        self.workers < self.requested
    }

    /// Advisory notice for the caller when the request was clamped. The run
    /// proceeds with the reduced size; this is not an error.
    pub fn advisory(&self) -> Option<String> {
        self.clamped().then(|| {
            format!(
                "requested {} workers exceeds {} available CPUs; running with {}",
                self.requested, self.host_cpus, self.workers
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_sensible() {
        let config = WordmillConfig::default();
        assert_eq!(config.workers, 0);
        assert_eq!(config.text_column, "text");
        assert_eq!(config.id_column, "id");
        assert!(config.requested_workers() >= 1);
    }

    #[test]
    fn load_merges_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "workers = 3\ntext_column = \"overview\"").unwrap();

        let config = WordmillConfig::load(file.path().to_str()).unwrap();
        assert_eq!(config.workers, 3);
        assert_eq!(config.text_column, "overview");
        // untouched keys keep their defaults
        assert_eq!(config.id_column, "id");
    }

    #[test]
    fn load_rejects_missing_explicit_file() {
        assert!(WordmillConfig::load(Some("/nonexistent/wordmill.toml")).is_err());
    }

    #[test]
    fn resolve_clamps_to_capacity() {
        let effective = EffectiveConfig::resolve_with_capacity(16, 4).unwrap();
        assert_eq!(effective.workers, 4);
        assert!(effective.clamped());

        let advisory = effective.advisory().expect("clamped request advises");
        assert!(advisory.contains("16"));
        assert!(advisory.contains("4"));
    }

    #[test]
    fn resolve_keeps_requests_within_capacity() {
        let effective = EffectiveConfig::resolve_with_capacity(2, 8).unwrap();
        assert_eq!(effective.workers, 2);
        assert!(!effective.clamped());
        assert!(effective.advisory().is_none());
    }

    #[test]
    fn resolve_rejects_zero_workers() {
        assert!(EffectiveConfig::resolve_with_capacity(0, 8).is_err());
    }

    #[test]
    fn resolve_yields_at_least_one_worker() {
        for requested in 1..=4 {
            let effective = EffectiveConfig::resolve_with_capacity(requested, 1).unwrap();
            assert_eq!(effective.workers, 1);
        }
    }

    #[test]
    fn resolve_against_host_matches_min_rule() {
        let cpus = num_cpus::get();
        let effective = EffectiveConfig::resolve(cpus + 12).unwrap();
        assert_eq!(effective.workers, cpus);
        assert!(effective.advisory().is_some());
    }
}
