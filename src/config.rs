//! Runtime configuration from environment variables
//!
//! | variable | default |
//! |----------|---------|
//! | `DATA_DIR` | `data` |
//! | `PORT` | `3000` |
//! | `POPULATION_YEAR` | `2020` |
//! | `DEBOUNCE_MS` | `500` |
//! | `SESSION_TTL_SECS` | `1800` |

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    pub data_dir: PathBuf,
    pub port: u16,
    pub population_year: i32,
    pub debounce: Duration,
    pub session_ttl: Duration,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            port: 3000,
            population_year: 2020,
            debounce: Duration::from_millis(500),
            session_ttl: Duration::from_secs(1800),
        }
    }
}

impl PlannerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unparsable values fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            data_dir: lookup("DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            port: lookup("PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(defaults.port),
            population_year: lookup("POPULATION_YEAR")
                .and_then(|y| y.trim().parse().ok())
                .unwrap_or(defaults.population_year),
            debounce: parsed("DEBOUNCE_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.debounce),
            session_ttl: parsed("SESSION_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.session_ttl),
        }
    }

    pub fn log(&self) {
        tracing::info!("Configuration:");
        tracing::info!("  DATA_DIR: {}", self.data_dir.display());
        tracing::info!("  PORT: {}", self.port);
        tracing::info!("  POPULATION_YEAR: {}", self.population_year);
        tracing::info!("  DEBOUNCE_MS: {}", self.debounce.as_millis());
        tracing::info!("  SESSION_TTL_SECS: {}", self.session_ttl.as_secs());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;

    #[test]
    fn test_defaults_when_unset() {
        let config = PlannerConfig::from_lookup(|_| None);
        assert_eq!(config, PlannerConfig::default());
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let env: FxHashMap<&str, &str> = [
            ("DATA_DIR", "/opt/planner/data"),
            ("PORT", "8080"),
            ("POPULATION_YEAR", "2015"),
            ("DEBOUNCE_MS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let config = PlannerConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.data_dir, PathBuf::from("/opt/planner/data"));
        assert_eq!(config.port, 8080);
        assert_eq!(config.population_year, 2015);
        assert_eq!(config.debounce, Duration::from_millis(500));
    }
}
