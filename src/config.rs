use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::core::ResultLimits;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub graph: GraphSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

#[derive(Debug, Clone, Deserialize)]
pub struct GraphSettings {
    #[serde(default = "default_graph_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_graph_database")]
    pub database: String,
    #[serde(default = "default_graph_username")]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Ceiling on recipes fetched per graph query
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            endpoint: default_graph_endpoint(),
            database: default_graph_database(),
            username: default_graph_username(),
            password: String::new(),
            request_timeout_secs: default_timeout_secs(),
            max_candidates: default_max_candidates(),
        }
    }
}

impl GraphSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_graph_endpoint() -> String { "http://localhost:7474".to_string() }
fn default_graph_database() -> String { "neo4j".to_string() }
fn default_graph_username() -> String { "neo4j".to_string() }
fn default_timeout_secs() -> u64 { 10 }
fn default_max_candidates() -> usize { crate::services::graph::DEFAULT_MAX_CANDIDATES }

#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_search_index")]
    pub index: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_search_size")]
    pub default_size: usize,
    #[serde(default = "default_max_size")]
    pub max_size: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            index: default_search_index(),
            username: None,
            password: None,
            api_key: None,
            request_timeout_secs: default_timeout_secs(),
            default_size: default_search_size(),
            max_size: default_max_size(),
        }
    }
}

impl SearchSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn limits(&self) -> ResultLimits {
        ResultLimits::new(self.default_size, self.max_size)
    }
}

fn default_search_endpoint() -> String { "http://localhost:9200".to_string() }
fn default_search_index() -> String { "recipeswithreviewsfinal".to_string() }
fn default_search_size() -> usize { 10 }
fn default_max_size() -> usize { 100 }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

impl MatchingSettings {
    pub fn limits(&self) -> ResultLimits {
        ResultLimits::new(self.default_limit, self.max_limit)
    }
}

fn default_limit() -> usize { 25 }
fn default_max_limit() -> usize { 100 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "compact".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with RECIPE_MATCH__)
    /// 4. Store credentials (NEO4J_*, ELASTIC_*)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            // Local overrides for development
            .add_source(File::with_name("config/local").required(false))
            // e.g., RECIPE_MATCH__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("RECIPE_MATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        apply_store_credentials(settings, |name| std::env::var(name).ok())?.try_deserialize()
    }
}

/// Store credential variables and the settings keys they override
const CREDENTIAL_VARS: [(&str, &str); 8] = [
    ("NEO4J_URI", "graph.endpoint"),
    ("NEO4J_DATABASE", "graph.database"),
    ("NEO4J_USERNAME", "graph.username"),
    ("NEO4J_PASSWORD", "graph.password"),
    ("ELASTIC_URL", "search.endpoint"),
    ("ELASTIC_INDEX", "search.index"),
    ("ELASTIC_USERNAME", "search.username"),
    ("ELASTIC_PASSWORD", "search.password"),
];

/// Override settings with the conventional store credential variables
fn apply_store_credentials<F>(settings: Config, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = Config::builder().add_source(settings);

    for (var, key) in CREDENTIAL_VARS {
        if let Some(value) = lookup(var) {
            builder = builder.set_override(key, value)?;
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_sources() {
        let settings: Settings = Config::builder().build().unwrap().try_deserialize().unwrap();

        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.graph.database, "neo4j");
        assert_eq!(settings.search.index, "recipeswithreviewsfinal");
        assert_eq!(settings.matching.limits(), ResultLimits::new(25, 100));
        assert_eq!(settings.search.limits(), ResultLimits::new(10, 100));
        assert_eq!(settings.graph.request_timeout(), Duration::from_secs(10));
        assert_eq!(settings.graph.max_candidates, 5_000);
    }

    #[test]
    fn test_logging_section() {
        let settings: Settings = toml::from_str("[logging]\nformat = \"pretty\"").unwrap();
        assert_eq!(settings.logging.format, "pretty");
        assert_eq!(settings.logging.level, "info");

        let defaults = LoggingSettings::default();
        assert_eq!(defaults.format, "compact");
        assert_eq!(defaults.level, "info");
    }

    #[test]
    fn test_toml_file_layout() {
        let raw = r#"
            [server]
            port = 9000

            [graph]
            endpoint = "http://graph:7474"
            password = "pw"
            request_timeout_secs = 3
            max_candidates = 800

            [matching]
            default_limit = 5
            max_limit = 20
        "#;
        let settings: Settings = toml::from_str(raw).unwrap();

        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.graph.endpoint, "http://graph:7474");
        assert_eq!(settings.graph.request_timeout_secs, 3);
        assert_eq!(settings.graph.max_candidates, 800);
        assert_eq!(settings.matching.limits(), ResultLimits::new(5, 20));
        assert_eq!(settings.search.max_size, 100);
    }

    #[test]
    fn test_store_credentials_override() {
        let base = Config::builder().build().unwrap();
        let config = apply_store_credentials(base, |name| match name {
            "NEO4J_URI" => Some("http://neo4j.internal:7474".to_string()),
            "NEO4J_PASSWORD" => Some("hunter2".to_string()),
            _ => None,
        })
        .unwrap();
        let settings: Settings = config.try_deserialize().unwrap();

        assert_eq!(settings.graph.endpoint, "http://neo4j.internal:7474");
        assert_eq!(settings.graph.password, "hunter2");
        assert_eq!(settings.graph.username, "neo4j");
    }
}
