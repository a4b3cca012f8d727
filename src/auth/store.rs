use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::credentials::Credentials;
use super::error::AuthError;

/// Durable storage for the access/refresh token pair.
///
/// Implementations are plain key-value persistence; the
/// [`CredentialVault`](super::vault::CredentialVault) is the only component
/// that writes through them.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<Option<Credentials>, AuthError>;
    fn save(&self, credentials: &Credentials) -> Result<(), AuthError>;
    fn clear(&self) -> Result<(), AuthError>;
}

/// File-backed credential store using a TOML file.
///
/// The file holds `accessToken` and `refreshToken` string values and is
/// created with mode `0600` on Unix.
///
/// # Example
/// ```no_run
/// use soko::auth::{CredentialStore, Credentials, FileCredentialStore};
///
/// let store = FileCredentialStore::new(std::path::PathBuf::from("/tmp/soko"));
/// store.save(&Credentials::new("access", Some("refresh".to_string())))?;
/// # Ok::<(), soko::auth::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    base_dir: PathBuf,
    profile: String,
}

impl FileCredentialStore {
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            profile: "default".to_string(),
        }
    }

    pub fn new_default() -> Self {
        Self::new(default_soko_dir())
    }

    /// Keep a separate credential file per profile (e.g. buyer vs seller accounts).
    pub fn with_profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = normalize_label(profile.as_ref());
        self
    }

    pub fn path(&self) -> PathBuf {
        let name = if self.profile == "default" {
            "credentials.toml".to_string()
        } else {
            format!("credentials.{}.toml", self.profile)
        };
        self.base_dir.join(name)
    }

    fn ensure_parent(path: &Path) -> Result<(), AuthError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Credentials>, AuthError> {
        let raw = match fs::read_to_string(self.path()) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(AuthError::Io(err.to_string())),
        };
        let file: CredentialFile = toml::from_str(&raw)?;
        if file.access_token.is_empty() {
            return Ok(None);
        }
        Ok(Some(Credentials {
            access_token: file.access_token,
            refresh_token: file.refresh_token.filter(|token| !token.is_empty()),
        }))
    }

    fn save(&self, credentials: &Credentials) -> Result<(), AuthError> {
        let path = self.path();
        Self::ensure_parent(&path)?;
        let file = CredentialFile {
            version: 1,
            saved_at: Utc::now(),
            access_token: credentials.access_token.clone(),
            refresh_token: credentials.refresh_token.clone(),
        };
        let serialized = toml::to_string(&file)?;
        fs::write(&path, serialized)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        match fs::remove_file(self.path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AuthError::Io(err.to_string())),
        }
    }
}

/// Process-local credential store; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credentials: Mutex<Option<Credentials>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            credentials: Mutex::new(Some(credentials)),
        }
    }

    /// Current contents, bypassing the trait's `Result`.
    pub fn snapshot(&self) -> Option<Credentials> {
        self.credentials
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<Credentials>, AuthError> {
        Ok(self.snapshot())
    }

    fn save(&self, credentials: &Credentials) -> Result<(), AuthError> {
        *self
            .credentials
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(credentials.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        *self
            .credentials
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CredentialFile {
    version: u32,
    saved_at: DateTime<Utc>,
    #[serde(rename = "accessToken")]
    access_token: String,
    #[serde(
        rename = "refreshToken",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    refresh_token: Option<String>,
}

/// `~/.soko`, or `.soko` in the working directory when no home is known.
pub fn default_soko_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".soko"))
        .unwrap_or_else(|| PathBuf::from(".soko"))
}

fn normalize_label(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "default".to_string();
    }
    let mut out = String::with_capacity(trimmed.len());
    for ch in trimmed.chars() {
        let lower = ch.to_ascii_lowercase();
        if lower.is_ascii_alphanumeric() || lower == '-' {
            out.push(lower);
        } else {
            out.push('-');
        }
    }
    if out.trim_matches('-').is_empty() {
        "default".to_string()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, FileCredentialStore) {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().to_path_buf());
        (dir, store)
    }

    #[test]
    fn credentials_round_trip_with_persisted_key_names() {
        let (_dir, store) = temp_store();
        store
            .save(&Credentials::new("access", Some("refresh".to_string())))
            .unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("accessToken = \"access\""));
        assert!(raw.contains("refreshToken = \"refresh\""));

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.access_token, "access");
        assert_eq!(loaded.refresh_token.as_deref(), Some("refresh"));
    }

    #[test]
    fn clear_removes_credentials_and_is_idempotent() {
        let (_dir, store) = temp_store();
        store.save(&Credentials::new("access", None)).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn profiles_use_separate_files() {
        let (_dir, store) = temp_store();
        let seller = store.clone().with_profile("Seller Account");
        seller.save(&Credentials::new("seller", None)).unwrap();

        assert!(seller.path().ends_with("credentials.seller-account.toml"));
        assert!(store.load().unwrap().is_none());
        assert_eq!(seller.load().unwrap().unwrap().access_token, "seller");
    }

    #[cfg(unix)]
    #[test]
    fn credential_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, store) = temp_store();
        store.save(&Credentials::new("access", None)).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
