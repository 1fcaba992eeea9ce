use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;
use std::io::Write;
use std::path::{Path, PathBuf};

const DEFAULT_SESSION_TTL_DAYS: i64 = 30;
const SECRET_FILE: &str = "session.key";

/// Runtime settings, read from `BUDGETSPACE_*` environment variables with
/// defaults under the platform data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Config {
    pub(crate) data_dir: PathBuf,
    pub(crate) db_path: PathBuf,
    /// Explicit signing secret. When absent the secret lives in `data_dir`.
    pub(crate) secret: Option<String>,
    pub(crate) session_ttl_days: i64,
    pub(crate) log_json: bool,
}

impl Config {
    pub(crate) fn from_env() -> Result<Self> {
        Self::from_lookup(platform_data_dir, |key| std::env::var(key).ok())
    }

    /// `default_data_dir` is only consulted when `BUDGETSPACE_DATA_DIR` is
    /// unset.
    pub(crate) fn from_lookup(
        default_data_dir: impl FnOnce() -> Option<PathBuf>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_dir = match get("BUDGETSPACE_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir().ok_or_else(|| {
                anyhow::anyhow!("Could not determine data directory; set BUDGETSPACE_DATA_DIR")
            })?,
        };
        let db_path = get("BUDGETSPACE_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("budgetspace.db"));

        let session_ttl_days = match get("BUDGETSPACE_SESSION_TTL_DAYS") {
            Some(raw) => {
                let days: i64 = raw.trim().parse().with_context(|| {
                    format!("BUDGETSPACE_SESSION_TTL_DAYS must be a number, got '{raw}'")
                })?;
                if days <= 0 {
                    anyhow::bail!("BUDGETSPACE_SESSION_TTL_DAYS must be positive, got {days}");
                }
                days
            }
            None => DEFAULT_SESSION_TTL_DAYS,
        };

        let log_json = get("BUDGETSPACE_LOG_JSON")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            data_dir,
            db_path,
            secret: get("BUDGETSPACE_SECRET"),
            session_ttl_days,
            log_json,
        })
    }

    /// Signing secret: the configured one, or the persisted key in the data
    /// directory, created on first use.
    pub(crate) fn session_secret(&self) -> Result<Vec<u8>> {
        if let Some(secret) = &self.secret {
            return Ok(secret.as_bytes().to_vec());
        }

        let path = self.data_dir.join(SECRET_FILE);
        if path.exists() {
            let encoded = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            return STANDARD
                .decode(encoded.trim())
                .with_context(|| format!("Corrupt session key in {}", path.display()));
        }

        std::fs::create_dir_all(&self.data_dir).with_context(|| {
            format!("Failed to create data directory: {}", self.data_dir.display())
        })?;
        let mut key = vec![0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut key);
        write_private(&path, STANDARD.encode(&key).as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "generated session signing key");
        Ok(key)
    }

    pub(crate) fn ensure_data_dir(&self) -> Result<()> {
        if let Some(parent) = self.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create data directory: {}", parent.display())
            })?;
        }
        Ok(())
    }
}

fn platform_data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "budgetspace", "budgetspace")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

/// Create `path` readable by the owner only.
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
