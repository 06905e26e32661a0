//! Query builder configuration.
//!
//! [`QueryConfig`] is loaded from the `[query]` table of `config/config.toml`
//! and from `LIFEGUARD_QUERY__*` environment variables, e.g.
//! `LIFEGUARD_QUERY__QUOTE_STYLE=double_quote`.

use crate::query::SqlGrammar;
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config/config.toml";

/// Identifier quoting style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStyle {
    /// `` `name` ``
    #[default]
    Backtick,
    /// `"name"`
    DoubleQuote,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueryConfig {
    #[serde(default)]
    pub quote_style: QuoteStyle,
    /// Prefix of the synthetic aliases joint queries select columns under
    #[serde(default = "default_joint_alias_prefix")]
    pub joint_alias_prefix: String,
    /// Alias aggregate queries select their single value under
    #[serde(default = "default_aggregate_alias")]
    pub aggregate_alias: String,
}

fn default_joint_alias_prefix() -> String {
    "jc_".to_string()
}

fn default_aggregate_alias() -> String {
    "aggregate".to_string()
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            quote_style: QuoteStyle::default(),
            joint_alias_prefix: default_joint_alias_prefix(),
            aggregate_alias: default_aggregate_alias(),
        }
    }
}

fn environment() -> Environment {
    Environment::with_prefix("LIFEGUARD")
        .prefix_separator("_")
        .separator("__")
}

impl QueryConfig {
    /// Load the query configuration from `config/config.toml`, falling back to env vars.
    ///
    /// A missing `[query]` table yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(CONFIG_FILE)
    }

    /// Like [`load`](Self::load), reading the file at `path` instead
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(environment());

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                // unreadable file: retry with the environment only
                log::warn!("Failed to load {path}, falling back to env: {err}");
                Config::builder().add_source(environment()).build().map_err(|env_err| {
                    ConfigError::Message(format!(
                        "Failed to load configuration from file and env: {err}, then env-only error: {env_err}"
                    ))
                })?
            }
        };

        Self::from_settings(&settings)
    }

    /// Parse a TOML document holding a `[query]` table
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Self::from_settings(&settings)
    }

    fn from_settings(settings: &Config) -> Result<Self, ConfigError> {
        match settings.get::<QueryConfig>("query") {
            Ok(config) => Ok(config),
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(ConfigError::Message(format!(
                "Query configuration could not be loaded from file or environment: {e}"
            ))),
        }
    }

    /// Grammar quoting identifiers in the configured style
    pub fn grammar(&self) -> SqlGrammar {
        SqlGrammar::new(self.quote_style)
    }
}
