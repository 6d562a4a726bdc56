//! Credential loading from an optional `.env` file.
//!
//! Values from the file sit underneath the process environment: a variable set
//! in the environment always wins over the same key in `.env`.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use tracing::{debug, warn};

/// Credentials loaded from a `.env` file.
#[derive(Clone, Default)]
pub struct Credentials {
    vars: BTreeMap<String, String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("keys", &self.vars.keys().collect::<Vec<_>>())
            .field("values", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    /// Build credentials from a key-value map.
    pub fn from_map(vars: BTreeMap<String, String>) -> Self {
        Self { vars }
    }

    /// Returns a credential value for a key, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Number of loaded keys.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether no keys were loaded.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Resolve a key from the process environment first, then from these
    /// credentials. Suitable as the resolver for
    /// [`FolioConfig::apply_overrides`](crate::config::FolioConfig::apply_overrides).
    pub fn resolve(&self, key: &str) -> Option<String> {
        self.resolve_with(key, |k| std::env::var(k).ok())
    }

    /// [`Credentials::resolve`] with an injectable environment (for testing).
    pub fn resolve_with(&self, key: &str, env: impl Fn(&str) -> Option<String>) -> Option<String> {
        env(key).or_else(|| self.get(key).map(str::to_owned))
    }
}

/// Load credentials from a `.env` file. A missing file yields empty credentials.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be parsed.
pub fn load_credentials(path: &Path) -> anyhow::Result<Credentials> {
    if !path.exists() {
        debug!(path = %path.display(), "no credentials file");
        return Ok(Credentials::default());
    }

    warn_if_shared(path);

    let mut vars = BTreeMap::new();
    let iter = dotenvy::from_path_iter(path)
        .with_context(|| format!("failed to read credentials at {}", path.display()))?;

    for item in iter {
        let (key, value) = item.with_context(|| {
            format!(
                "failed to parse key-value entry in credentials file {}",
                path.display()
            )
        })?;
        vars.insert(key, value);
    }

    debug!(path = %path.display(), keys = vars.len(), "credentials loaded");
    Ok(Credentials { vars })
}

#[cfg(unix)]
fn warn_if_shared(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(metadata) = std::fs::metadata(path) {
        let mode = metadata.permissions().mode() & 0o777;
        if mode & 0o077 != 0 {
            warn!(
                path = %path.display(),
                mode = %format!("{mode:o}"),
                "credentials file is readable by other users; consider chmod 600"
            );
        }
    }
}

#[cfg(not(unix))]
fn warn_if_shared(_path: &Path) {}
