//! Token storage - where the bearer credential survives restarts
//!
//! Two implementations of [`TokenStore`]: an in-memory one for tests and
//! embedding, and a single-file store for the CLI.

use campus_core::{storage_error, AccessToken, CampusResult, TokenStore};
use parking_lot::Mutex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Token held only for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<AccessToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(AccessToken::new(token))),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> CampusResult<Option<AccessToken>> {
        Ok(self.token.lock().clone())
    }

    fn set(&self, token: &AccessToken) -> CampusResult<()> {
        *self.token.lock() = Some(token.clone());
        Ok(())
    }

    fn remove(&self) -> CampusResult<()> {
        self.token.lock().take();
        Ok(())
    }
}

/// Token persisted as the sole content of one file
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> CampusResult<Option<AccessToken>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = AccessToken::new(content.trim());
                Ok((!token.is_empty()).then_some(token))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error!(
                format!("Failed to read token file {}", self.path.display()),
                "file_token_store",
                e
            )),
        }
    }

    fn set(&self, token: &AccessToken) -> CampusResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                storage_error!(
                    format!("Failed to create {}", parent.display()),
                    "file_token_store",
                    e
                )
            })?;
        }

        // Write-then-rename so a reader never sees a half-written token
        let staging = self.path.with_extension("tmp");
        std::fs::write(&staging, token.expose()).map_err(|e| {
            storage_error!(
                format!("Failed to write token file {}", staging.display()),
                "file_token_store",
                e
            )
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&staging, std::fs::Permissions::from_mode(0o600)).map_err(
                |e| storage_error!("Failed to restrict token file permissions", "file_token_store", e),
            )?;
        }

        std::fs::rename(&staging, &self.path).map_err(|e| {
            storage_error!(
                format!("Failed to move token file into {}", self.path.display()),
                "file_token_store",
                e
            )
        })?;

        info!("Stored credential at {}", self.path.display());
        Ok(())
    }

    fn remove(&self) -> CampusResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Removed credential at {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error!(
                format!("Failed to remove token file {}", self.path.display()),
                "file_token_store",
                e
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryTokenStore::new();
        assert!(store.get().unwrap().is_none());

        store.set(&AccessToken::new("tok1")).unwrap();
        assert_eq!(store.get().unwrap().unwrap().expose(), "tok1");

        store.remove().unwrap();
        store.remove().unwrap();
        assert!(store.get().unwrap().is_none());
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("campus").join("token");

        let store = FileTokenStore::new(&path);
        assert!(store.get().unwrap().is_none());
        store.set(&AccessToken::new("tok1")).unwrap();

        let reopened = FileTokenStore::new(&path);
        assert_eq!(reopened.get().unwrap().unwrap().expose(), "tok1");
        assert!(!path.with_extension("tmp").exists());

        reopened.remove().unwrap();
        assert!(!path.exists());
        assert!(store.get().unwrap().is_none());
        // Removing twice is fine
        reopened.remove().unwrap();
    }

    #[test]
    fn test_file_store_ignores_blank_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "  \n").unwrap();

        assert!(FileTokenStore::new(&path).get().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        FileTokenStore::new(&path)
            .set(&AccessToken::new("tok1"))
            .unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
