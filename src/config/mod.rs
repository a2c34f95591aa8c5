//! Configuration loading and management
//!
//! Every section and every field has a default, so an empty YAML document
//! is a valid configuration.
//!
//! ```yaml
//! server:
//!   port: 8080
//! documents:
//!   directory: public/invoices
//!   issuer: ACME Ltd
//!   format: pdf
//! timeouts:
//!   store_ms: 2000
//! ```

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::core::service::{ServiceSettings, Timeouts};
use crate::render::IssuerInfo;

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Prefix of every invoice route (e.g. `/api` → `/api/invoices`)
    pub api_prefix: String,

    /// Attach a permissive CORS layer
    pub cors: bool,

    /// Add hardening headers (`x-content-type-options`, `x-frame-options`, ...)
    /// to every response that does not set them itself
    pub security_headers: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            api_prefix: "/api".to_string(),
            cors: true,
            security_headers: true,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Identity extraction settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Header carrying the authenticated user id, set by the gateway
    pub user_header: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            user_header: crate::core::auth::HeaderAuthProvider::DEFAULT_HEADER.to_string(),
        }
    }
}

/// Output format of generated documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    #[default]
    Pdf,
    Text,
}

/// Document generation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
    /// Directory artifacts are written to
    pub directory: PathBuf,

    /// Issuer name printed in every document header
    pub issuer: String,

    /// Currency used when a create payload names none
    pub currency: String,

    pub format: DocumentFormat,

    /// Tera template replacing the built-in layout
    pub template: Option<PathBuf>,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("public/invoices"),
            issuer: "Invoicer".to_string(),
            currency: "EUR".to_string(),
            format: DocumentFormat::default(),
            template: None,
        }
    }
}

/// Invoice record storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Lmdb,
}

/// Record storage settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// Database directory, used by the `lmdb` backend
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: PathBuf::from("data/invoices"),
        }
    }
}

/// Collaborator deadlines in milliseconds. Absent means no deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    pub store_ms: Option<u64>,
    pub render_ms: Option<u64>,
}

impl From<TimeoutsConfig> for Timeouts {
    fn from(config: TimeoutsConfig) -> Self {
        Timeouts {
            store: config.store_ms.map(Duration::from_millis),
            render: config.render_ms.map(Duration::from_millis),
        }
    }
}

/// Complete configuration of the invoicing service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoicingConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub documents: DocumentsConfig,
    pub storage: StorageConfig,
    pub timeouts: TimeoutsConfig,
}

impl InvoicingConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        // serde_yaml reads an empty document as null
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot check
    pub fn validate(&self) -> Result<()> {
        let prefix = &self.server.api_prefix;
        if !prefix.is_empty() && !prefix.starts_with('/') {
            bail!("server.api_prefix must start with '/': {}", prefix);
        }
        if prefix.len() > 1 && prefix.ends_with('/') {
            bail!("server.api_prefix must not end with '/': {}", prefix);
        }
        if self.server.port == 0 {
            bail!("server.port must not be 0");
        }
        if self.auth.user_header.trim().is_empty() {
            bail!("auth.user_header must not be empty");
        }

        let currency = &self.documents.currency;
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            bail!(
                "documents.currency must be a three-letter code: {}",
                currency
            );
        }

        Ok(())
    }

    /// Service settings derived from this configuration
    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            issuer: IssuerInfo::new(self.documents.issuer.clone()),
            default_currency: self.documents.currency.to_ascii_uppercase(),
            timeouts: self.timeouts.into(),
        }
    }
}
