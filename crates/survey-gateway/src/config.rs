//! Gateway configuration
//!
//! Built once at startup and shared read-only by every request.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use survey_core::verification::RECAPTCHA_VERIFY_URL;
use survey_core::BODY_LIMIT;

use crate::{GatewayError, DEFAULT_HOST, DEFAULT_ORIGIN, DEFAULT_PORT};

/// Main gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// The single origin allowed by CORS
    pub allowed_origin: String,

    /// Request bytes read before decoding; the rest is dropped
    pub body_limit: usize,

    /// Object write timeout in seconds
    pub write_timeout_secs: u64,

    /// Storage configuration
    pub storage: StorageSettings,

    /// reCAPTCHA configuration
    pub recaptcha: RecaptchaSettings,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            allowed_origin: DEFAULT_ORIGIN.to_string(),
            body_limit: BODY_LIMIT,
            write_timeout_secs: 50,
            storage: StorageSettings::default(),
            recaptcha: RecaptchaSettings::default(),
        }
    }
}

impl GatewayConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the host
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the CORS origin
    pub fn with_allowed_origin(mut self, origin: impl Into<String>) -> Self {
        self.allowed_origin = origin.into();
        self
    }

    /// Set the target bucket
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.storage.bucket = bucket.into();
        self
    }

    /// Select the storage backend
    pub fn with_storage_backend(mut self, backend: StorageBackend) -> Self {
        self.storage.backend = backend;
        self
    }

    /// Set the site secret; an empty string disables verification
    pub fn with_private_key(mut self, key: impl Into<String>) -> Self {
        self.recaptcha.private_key = non_empty(key.into());
        self
    }

    /// Set the token that skips verification; an empty string means none
    pub fn with_bypass(mut self, bypass: impl Into<String>) -> Self {
        self.recaptcha.bypass = non_empty(bypass.into());
        self
    }

    /// Set the write timeout
    pub fn with_write_timeout_secs(mut self, secs: u64) -> Self {
        self.write_timeout_secs = secs;
        self
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> crate::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| GatewayError::InvalidConfig(format!("bad listen address: {}", e)))
    }

    /// Check the settings the gateway cannot start without
    pub fn validate(&self) -> crate::Result<()> {
        if self.storage.bucket.trim().is_empty() {
            return Err(GatewayError::InvalidConfig(
                "BUCKET_NAME environment variable must be set".to_string(),
            ));
        }
        if self.allowed_origin.trim().is_empty() {
            return Err(GatewayError::InvalidConfig(
                "allowed origin must not be empty".to_string(),
            ));
        }
        if self.body_limit == 0 {
            return Err(GatewayError::InvalidConfig(
                "body limit must be positive".to_string(),
            ));
        }
        self.socket_addr()?;
        Ok(())
    }
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Google Cloud Storage
    Gcs,
    /// Directory on the local filesystem
    Local,
    /// In-process map, lost on exit
    Memory,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Gcs => write!(f, "gcs"),
            StorageBackend::Local => write!(f, "local"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

/// Storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Bucket every object is written under
    pub bucket: String,

    /// Backend kind
    pub backend: StorageBackend,

    /// Root directory for the local backend
    pub local_root: String,

    /// `host:port` of a storage emulator (gcs backend only)
    pub emulator_host: Option<String>,

    /// Static bearer token; the metadata server is used when absent
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            backend: StorageBackend::Gcs,
            local_root: "./data".to_string(),
            emulator_host: None,
            access_token: None,
        }
    }
}

/// reCAPTCHA settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecaptchaSettings {
    /// Site secret; `None` disables verification
    #[serde(skip_serializing)]
    pub private_key: Option<String>,

    /// Token value that skips verification
    #[serde(skip_serializing)]
    pub bypass: Option<String>,

    /// Verification URL
    pub verify_url: String,
}

impl Default for RecaptchaSettings {
    fn default() -> Self {
        Self {
            private_key: None,
            bypass: None,
            verify_url: RECAPTCHA_VERIFY_URL.to_string(),
        }
    }
}

impl RecaptchaSettings {
    /// Whether a site secret is configured
    pub fn enabled(&self) -> bool {
        self.private_key.is_some()
    }

    /// Whether a submission carrying `token` has to be verified
    pub fn requires_verification(&self, token: &str) -> bool {
        self.enabled() && self.bypass.as_deref() != Some(token)
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
