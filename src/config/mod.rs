//! Configuration loading and management.
//!
//! Loads folio configuration from `./folio.toml` (or `$FOLIO_CONFIG_PATH`).
//! Environment variables override file values; file values override defaults.
//!
//! Precedence: env vars > config file > defaults.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::credentials::Credentials;
use crate::transport::ethereal::ETHEREAL_API_BASE;
use crate::transport::resend::RESEND_API_BASE;

/// Default transport timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 15;

// ── Execution mode ──────────────────────────────────────────────

/// Process-wide execution mode. Read once at start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Local development: the sandbox transport is allowed.
    Development,
    /// Deployed: only the primary transport and the sink are used.
    #[default]
    Production,
}

impl ExecutionMode {
    /// Whether sandbox delivery may be attempted.
    pub fn allows_sandbox(self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for ExecutionMode {
    type Err = std::convert::Infallible;

    /// Anything that is not `development`/`dev` is treated as production.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            _ => Ok(Self::Production),
        }
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => f.write_str("development"),
            Self::Production => f.write_str("production"),
        }
    }
}

// ── Top-level config ────────────────────────────────────────────

/// Top-level folio configuration loaded from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    /// Site owner and mode settings (`[site]`).
    pub site: SiteConfig,
    /// Primary transport settings (`[primary]`).
    pub primary: PrimaryConfig,
    /// Development sandbox settings (`[sandbox]`).
    pub sandbox: SandboxConfig,
    /// Fallback sink settings (`[sink]`).
    pub sink: SinkConfig,
    /// HTTP server settings (`[server]`).
    pub server: ServerConfig,
}

impl FolioConfig {
    /// Load configuration with precedence: env vars > `.env` > TOML file > defaults.
    ///
    /// Config file path: `$FOLIO_CONFIG_PATH` or `./folio.toml`.
    /// If the file does not exist, returns defaults.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read or parsed.
    pub fn load(credentials: &Credentials) -> Result<Self> {
        let resolve = |key: &str| credentials.resolve(key);
        let mut config = Self::load_from_file(Self::config_path_with(resolve))?;
        config.apply_overrides(resolve);
        Ok(config)
    }

    /// Load from TOML file only, no env overrides.
    fn load_from_file(path: PathBuf) -> Result<Self> {
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                tracing::info!(path = %path.display(), "loading config from file");
                Self::from_toml(&contents)
                    .with_context(|| format!("invalid config at {}", path.display()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no config file found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "failed to read config file {}: {e}",
                path.display()
            )),
        }
    }

    /// Resolve the config path using a custom env resolver.
    pub fn config_path_with(env: impl Fn(&str) -> Option<String>) -> PathBuf {
        env("FOLIO_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("folio.toml"))
    }

    /// Apply environment variable overrides (env > config > defaults).
    ///
    /// Takes a resolver function for testability (avoids unsafe `set_var` in tests).
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        // Site.
        if let Some(v) = env("FOLIO_ENV").or_else(|| env("NODE_ENV")) {
            self.site.mode = v.parse().unwrap_or_default();
        }
        if let Some(v) = env("FOLIO_OWNER_EMAIL") {
            self.site.owner_email = v;
        }
        if let Some(v) = env("FOLIO_CONTACT_EMAIL") {
            self.site.contact_email = Some(v);
        }

        // Primary transport (key presence enables it).
        if let Some(v) = env("RESEND_API_KEY").filter(|v| !v.trim().is_empty()) {
            self.primary.api_key = Some(v);
        }
        if let Some(v) = env("FOLIO_RESEND_API_BASE") {
            self.primary.api_base = v;
        }
        if let Some(v) = env("FOLIO_MAIL_FROM") {
            self.primary.from = v;
        }

        // Sandbox.
        if let Some(v) = env("FOLIO_SANDBOX_ENABLED") {
            match v.parse() {
                Ok(b) => self.sandbox.enabled = b,
                Err(_) => tracing::warn!(
                    var = "FOLIO_SANDBOX_ENABLED",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }

        // Sink.
        if let Some(v) = env("FOLIO_SINK_PATH") {
            self.sink.path = PathBuf::from(v);
        }

        // Server.
        if let Some(v) = env("FOLIO_BIND") {
            self.server.bind = v;
        }
        if let Some(v) = env("FOLIO_LOGS_DIR") {
            self.server.logs_dir = PathBuf::from(v);
        }
    }

    /// Parse a TOML string into config.
    ///
    /// # Errors
    ///
    /// Returns an error when the TOML is malformed or has wrongly typed keys.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: FolioConfig = toml::from_str(toml_str).context("failed to parse config TOML")?;
        Ok(config)
    }

    /// Address visitors are pointed at when delivery fails.
    pub fn contact_address(&self) -> &str {
        self.site
            .contact_email
            .as_deref()
            .unwrap_or(&self.site.owner_email)
    }
}

// ── Site config ─────────────────────────────────────────────────

/// Site owner and mode settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Execution mode.
    pub mode: ExecutionMode,
    /// Where contact messages are delivered.
    pub owner_email: String,
    /// Address shown to visitors in failure text. Defaults to `owner_email`.
    pub contact_email: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::default(),
            owner_email: "owner@example.com".to_string(),
            contact_email: None,
        }
    }
}

// ── Primary config ──────────────────────────────────────────────

/// Primary (Resend) transport config. Absent key means not configured.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct PrimaryConfig {
    /// API key.
    pub api_key: Option<String>,
    /// API base URL.
    pub api_base: String,
    /// Verified sender identity.
    pub from: String,
    /// Seconds before a send attempt is abandoned.
    pub timeout_secs: u64,
}

impl PrimaryConfig {
    /// Whether the primary transport can be used.
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

impl std::fmt::Debug for PrimaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrimaryConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "__REDACTED__"))
            .field("api_base", &self.api_base)
            .field("from", &self.from)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for PrimaryConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: RESEND_API_BASE.to_string(),
            from: "Portfolio Contact Form <onboarding@resend.dev>".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

// ── Sandbox config ──────────────────────────────────────────────

/// Development sandbox config.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Whether the sandbox may be used in development mode.
    pub enabled: bool,
    /// Account API base URL.
    pub api_base: String,
    /// Requestor name sent when provisioning accounts.
    pub requestor: String,
    /// Seconds before provisioning or an SMTP session is abandoned.
    pub timeout_secs: u64,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base: ETHEREAL_API_BASE.to_string(),
            requestor: "folio".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

// ── Sink config ─────────────────────────────────────────────────

/// Which sink records undelivered messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Append to a JSON Lines file.
    #[default]
    File,
    /// Log only.
    Log,
}

/// Fallback sink config.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Sink implementation.
    pub kind: SinkKind,
    /// JSONL path for the file sink.
    pub path: PathBuf,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            kind: SinkKind::default(),
            path: PathBuf::from("data/messages.jsonl"),
        }
    }
}

// ── Server config ───────────────────────────────────────────────

/// HTTP server config.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address.
    pub bind: String,
    /// Directory for rotated JSON logs.
    pub logs_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            logs_dir: PathBuf::from("logs"),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────
