use std::path::PathBuf;

use anyhow::{anyhow, ensure};
use serde::Deserialize;

use data_loader::{CatalogOptions, DEFAULT_TAG_DELIMITER};

/// Prefix shared by every environment variable the service reads
pub const ENV_PREFIX: &str = "RECS_";

/// Service configuration loaded from `RECS_*` environment variables
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    /// Catalog CSV file
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    /// Directory holding the similarity matrix and vocabulary
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Recommendations returned when a request does not say
    #[serde(default = "default_top_n")]
    pub default_top_n: usize,

    /// Upper bound on `top_n` for a single request
    #[serde(default = "default_max_top_n")]
    pub max_top_n: usize,

    /// Separator between tags in the catalog's tag column (one character)
    #[serde(default = "default_tag_delimiter")]
    pub tag_delimiter: String,
}

fn default_data_path() -> PathBuf {
    PathBuf::from("data/movies.csv")
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5001
}

fn default_top_n() -> usize {
    5
}

fn default_max_top_n() -> usize {
    50
}

fn default_tag_delimiter() -> String {
    DEFAULT_TAG_DELIMITER.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            model_dir: default_model_dir(),
            host: default_host(),
            port: default_port(),
            default_top_n: default_top_n(),
            max_top_n: default_max_top_n(),
            tag_delimiter: default_tag_delimiter(),
        }
    }
}

impl Config {
    /// Load configuration from the environment, reading `.env` first if present
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::prefixed(ENV_PREFIX)
            .from_env::<Config>()
            .map_err(|e| anyhow!("Failed to load config: {}", e))?
            .validated()
    }

    /// Load configuration from explicit `(KEY, value)` pairs
    pub fn from_iter<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed(ENV_PREFIX)
            .from_iter::<_, Config>(vars)
            .map_err(|e| anyhow!("Failed to load config: {}", e))?
            .validated()
    }

    fn validated(self) -> anyhow::Result<Self> {
        ensure!(
            self.tag_delimiter.chars().count() == 1,
            "{}TAG_DELIMITER must be a single character, got '{}'",
            ENV_PREFIX,
            self.tag_delimiter
        );
        ensure!(self.max_top_n > 0, "{}MAX_TOP_N must be at least 1", ENV_PREFIX);
        Ok(self)
    }

    pub fn delimiter(&self) -> char {
        self.tag_delimiter.chars().next().unwrap_or(DEFAULT_TAG_DELIMITER)
    }

    /// Loader options for the configured catalog layout
    pub fn catalog_options(&self) -> CatalogOptions {
        CatalogOptions {
            tag_delimiter: self.delimiter(),
            ..CatalogOptions::default()
        }
    }

    /// `host:port` to bind the listener to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_iter(vars(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.bind_addr(), "0.0.0.0:5001");
        assert_eq!(config.data_path, PathBuf::from("data/movies.csv"));
        assert_eq!(config.default_top_n, 5);
        assert_eq!(config.catalog_options().tag_delimiter, '|');
    }

    #[test]
    fn test_prefixed_overrides() {
        let config = Config::from_iter(vars(&[
            ("RECS_PORT", "8080"),
            ("RECS_MODEL_DIR", "/var/lib/recs"),
            ("RECS_TAG_DELIMITER", ";"),
            ("PORT", "9999"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.model_dir, PathBuf::from("/var/lib/recs"));
        assert_eq!(config.delimiter(), ';');
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Config::from_iter(vars(&[("RECS_TAG_DELIMITER", "||")])).is_err());
        assert!(Config::from_iter(vars(&[("RECS_MAX_TOP_N", "0")])).is_err());
        assert!(Config::from_iter(vars(&[("RECS_PORT", "not-a-port")])).is_err());
    }
}
