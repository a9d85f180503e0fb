use crate::error::Result;
use crate::models::ExpectationTable;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Environment variable naming the optional TOML config file
pub const CONFIG_PATH_VAR: &str = "REPORT_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "report.toml";
const ENV_PREFIX: &str = "REPORT";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub source: SourceConfig,
    pub access: AccessConfig,
    /// Expected bills per supplier and period, in display order
    pub expectations: Vec<Expectation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Bookkeeping service endpoints and credentials
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub token_url: String,
    pub income_url: String,
    pub expense_url: String,
    pub api_key: String,
    pub secret: String,
    /// Preferred language of income document links
    pub download_language: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            token_url: String::new(),
            income_url: String::new(),
            expense_url: String::new(),
            api_key: String::new(),
            secret: String::new(),
            download_language: "he".to_string(),
        }
    }
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("token_url", &self.token_url)
            .field("income_url", &self.income_url)
            .field("expense_url", &self.expense_url)
            .field("api_key", &redacted(&self.api_key))
            .field("secret", &redacted(&self.secret))
            .field("download_language", &self.download_language)
            .finish()
    }
}

/// Shared secret guarding the pages
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    pub code: String,
}

impl fmt::Debug for AccessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessConfig")
            .field("code", &redacted(&self.code))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expectation {
    pub supplier: String,
    pub expected: u32,
}

/// RFC 6265 `cookie-octet`: visible ASCII except `"`, `,`, `;` and `\`
fn is_cookie_octet(c: char) -> bool {
    c.is_ascii_graphic() && !matches!(c, '"' | ',' | ';' | '\\')
}

fn redacted(value: &str) -> &'static str {
    if value.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

impl AppConfig {
    /// Loads `.env`, the TOML file named by `REPORT_CONFIG` (default `report.toml`, optional)
    /// and `REPORT__SECTION__KEY` environment overrides, in that order.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::from_sources(Some(&path))
    }

    pub fn from_sources(path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;
        settings.try_deserialize::<Self>()?.validated()
    }

    /// Parses a TOML document directly, without environment overrides
    pub fn from_toml(contents: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Toml))
            .build()?;
        settings.try_deserialize::<Self>()?.validated()
    }

    /// The access code travels as a cookie value, so it must be a plain cookie octet string
    fn validated(self) -> Result<Self> {
        if let Some(c) = self.access.code.chars().find(|c| !is_cookie_octet(*c)) {
            return Err(config::ConfigError::Message(format!(
                "access.code may not contain {:?}",
                c
            ))
            .into());
        }
        Ok(self)
    }

    /// Builds the expectation table; a repeated supplier keeps its last value
    pub fn expectation_table(&self) -> ExpectationTable {
        self.expectations
            .iter()
            .map(|e| (e.supplier.clone(), e.expected))
            .collect()
    }
}
