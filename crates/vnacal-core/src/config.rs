//! Configuration for calibration and multiport assembly
//!
//! Loaded from TOML, with `VNACAL_*` environment variables taking
//! precedence over file values:
//!
//! ```toml
//! [calibration]
//! n_thrus = 1
//! source_port = 1
//! isolation = false
//!
//! [assembly]
//! diagonal = "last_write"
//! ```
//!
//! Every field has an override:
//!
//! | Variable | Field |
//! |---|---|
//! | `VNACAL_N_THRUS` | `calibration.n_thrus` |
//! | `VNACAL_SOURCE_PORT` | `calibration.source_port` |
//! | `VNACAL_ISOLATION` | `calibration.isolation` |
//! | `VNACAL_SINGULAR_TOLERANCE` | `calibration.singular_tolerance` |
//! | `VNACAL_THROUGH_TOLERANCE` | `calibration.through_tolerance` |
//! | `VNACAL_DIAGONAL` | `assembly.diagonal` |

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{SINGULAR_TOL, THROUGH_RESIDUAL_TOL};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub calibration: CalibrationConfig,

    #[serde(default)]
    pub assembly: AssemblyConfig,
}

/// One-path two-port calibration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Number of through standards expected among the standards
    pub n_thrus: usize,
    /// Analyzer port driving the stimulus (1 or 2)
    pub source_port: usize,
    /// Take the isolation term from the match standard's raw S21
    pub isolation: bool,
    /// Smallest reciprocal condition number accepted per frequency point
    pub singular_tolerance: f64,
    /// Through residual above which the solve logs a warning
    pub through_tolerance: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            n_thrus: 1,
            source_port: 1,
            isolation: false,
            singular_tolerance: SINGULAR_TOL,
            through_tolerance: THROUGH_RESIDUAL_TOL,
        }
    }
}

/// How diagonal entries are combined when several port pairs report them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagonalPolicy {
    /// Keep the value from the last pair written
    #[default]
    LastWrite,
    /// Average every pair's value
    Average,
}

/// Multiport assembly options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    pub diagonal: DiagonalPolicy,
}

impl Config {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config")?;
        Ok(config)
    }

    /// Load configuration from file, then apply environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read config file")?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_vars()?;
        Ok(config)
    }

    /// Serialize configuration to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Apply environment variable overrides
    pub fn apply_env_vars(&mut self) -> Result<()> {
        if let Ok(v) = std::env::var("VNACAL_N_THRUS") {
            self.calibration.n_thrus = v.parse().context("Invalid VNACAL_N_THRUS")?;
        }

        if let Ok(v) = std::env::var("VNACAL_SOURCE_PORT") {
            self.calibration.source_port = v.parse().context("Invalid VNACAL_SOURCE_PORT")?;
        }

        if let Ok(v) = std::env::var("VNACAL_ISOLATION") {
            self.calibration.isolation = v.parse().context("Invalid VNACAL_ISOLATION")?;
        }

        if let Ok(v) = std::env::var("VNACAL_SINGULAR_TOLERANCE") {
            self.calibration.singular_tolerance =
                v.parse().context("Invalid VNACAL_SINGULAR_TOLERANCE")?;
        }

        if let Ok(v) = std::env::var("VNACAL_THROUGH_TOLERANCE") {
            self.calibration.through_tolerance =
                v.parse().context("Invalid VNACAL_THROUGH_TOLERANCE")?;
        }

        if let Ok(v) = std::env::var("VNACAL_DIAGONAL") {
            self.assembly.diagonal = match v.to_lowercase().as_str() {
                "last_write" => DiagonalPolicy::LastWrite,
                "average" => DiagonalPolicy::Average,
                _ => return Err(anyhow::anyhow!("Invalid diagonal policy: {}", v)),
            };
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.calibration.n_thrus, 1);
        assert_eq!(config.calibration.source_port, 1);
        assert!(!config.calibration.isolation);
        assert_eq!(config.assembly.diagonal, DiagonalPolicy::LastWrite);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml_str(
            r#"
            [calibration]
            source_port = 2

            [assembly]
            diagonal = "average"
            "#,
        )
        .unwrap();

        assert_eq!(config.calibration.source_port, 2);
        assert_eq!(config.calibration.n_thrus, 1);
        assert_eq!(config.calibration.singular_tolerance, SINGULAR_TOL);
        assert_eq!(config.assembly.diagonal, DiagonalPolicy::Average);
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config.calibration.isolation = true;
        let toml_str = config.to_toml_string().unwrap();
        let parsed = Config::from_toml_str(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::from_toml_str("[assembly]\ndiagonal = \"median\"").unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    // only test in this binary that touches the environment
    #[test]
    fn test_env_overrides_every_field() {
        let vars = [
            ("VNACAL_N_THRUS", "2"),
            ("VNACAL_SOURCE_PORT", "2"),
            ("VNACAL_ISOLATION", "true"),
            ("VNACAL_SINGULAR_TOLERANCE", "1e-6"),
            ("VNACAL_THROUGH_TOLERANCE", "0.25"),
            ("VNACAL_DIAGONAL", "Average"),
        ];
        for (key, value) in vars {
            std::env::set_var(key, value);
        }

        let mut config = Config::default();
        let applied = config.apply_env_vars();

        std::env::set_var("VNACAL_SINGULAR_TOLERANCE", "tiny");
        let invalid = Config::default().apply_env_vars().unwrap_err();

        for (key, _) in vars {
            std::env::remove_var(key);
        }

        applied.unwrap();
        assert_eq!(config.calibration.n_thrus, 2);
        assert_eq!(config.calibration.source_port, 2);
        assert!(config.calibration.isolation);
        assert_eq!(config.calibration.singular_tolerance, 1e-6);
        assert_eq!(config.calibration.through_tolerance, 0.25);
        assert_eq!(config.assembly.diagonal, DiagonalPolicy::Average);
        assert!(invalid.to_string().contains("VNACAL_SINGULAR_TOLERANCE"));
    }
}
