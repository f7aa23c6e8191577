use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// File names under the state directory. Fixed so a session survives a
/// restart of the client.
pub const ACCESS_TOKEN_FILE: &str = "accessToken";
pub const REFRESH_TOKEN_FILE: &str = "refreshToken";

/// Durable storage for the session's token pair.
///
/// Business logic never touches ambient storage directly; it goes through
/// this trait, so tests swap in [`MemoryTokenStore`].
pub trait TokenStore: Send + Sync {
    fn access_token(&self) -> Option<String>;
    fn refresh_token(&self) -> Option<String>;
    /// Store both tokens (login).
    fn set_pair(&self, access: &str, refresh: &str) -> Result<()>;
    /// Replace only the access token (refresh).
    fn set_access_token(&self, access: &str) -> Result<()>;
    /// Remove both tokens. Idempotent.
    fn clear(&self) -> Result<()>;
}

/// File-backed store: one file per token under a state directory.
pub struct FileTokenStore {
    dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).context("Failed to create token store directory")?;
        Ok(Self { dir })
    }

    /// Store at the default location (`~/.tavle`).
    pub fn default_location() -> Result<Self> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Self::new(home.join(".tavle"))
    }

    fn read(&self, name: &str) -> Option<String> {
        let value = fs::read_to_string(self.dir.join(name)).ok()?;
        let value = value.trim().to_string();
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    fn write(&self, name: &str, value: &str) -> Result<()> {
        fs::write(self.dir.join(name), value)
            .with_context(|| format!("Failed to write token file '{}'", name))
    }

    fn remove(&self, name: &str) -> Result<()> {
        match fs::remove_file(self.dir.join(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to remove token file '{}'", name))
            }
        }
    }
}

impl TokenStore for FileTokenStore {
    fn access_token(&self) -> Option<String> {
        self.read(ACCESS_TOKEN_FILE)
    }

    fn refresh_token(&self) -> Option<String> {
        self.read(REFRESH_TOKEN_FILE)
    }

    fn set_pair(&self, access: &str, refresh: &str) -> Result<()> {
        self.write(ACCESS_TOKEN_FILE, access)?;
        self.write(REFRESH_TOKEN_FILE, refresh)
    }

    fn set_access_token(&self, access: &str) -> Result<()> {
        self.write(ACCESS_TOKEN_FILE, access)
    }

    fn clear(&self) -> Result<()> {
        self.remove(ACCESS_TOKEN_FILE)?;
        self.remove(REFRESH_TOKEN_FILE)
    }
}

/// In-memory store for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryTokenStore {
    inner: Mutex<TokenState>,
}

#[derive(Default)]
struct TokenState {
    access: Option<String>,
    refresh: Option<String>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeded store, for tests that start mid-session.
    pub fn with_tokens(access: &str, refresh: &str) -> Self {
        Self {
            inner: Mutex::new(TokenState {
                access: Some(access.to_string()),
                refresh: Some(refresh.to_string()),
            }),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn access_token(&self) -> Option<String> {
        self.inner.lock().unwrap().access.clone()
    }

    fn refresh_token(&self) -> Option<String> {
        self.inner.lock().unwrap().refresh.clone()
    }

    fn set_pair(&self, access: &str, refresh: &str) -> Result<()> {
        let mut state = self.inner.lock().unwrap();
        state.access = Some(access.to_string());
        state.refresh = Some(refresh.to_string());
        Ok(())
    }

    fn set_access_token(&self, access: &str) -> Result<()> {
        self.inner.lock().unwrap().access = Some(access.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut state = self.inner.lock().unwrap();
        state.access = None;
        state.refresh = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path()).unwrap();

        assert!(store.access_token().is_none());
        assert!(store.refresh_token().is_none());

        store.set_pair("access-1", "refresh-1").unwrap();
        assert_eq!(store.access_token().as_deref(), Some("access-1"));
        assert_eq!(store.refresh_token().as_deref(), Some("refresh-1"));

        // The files carry the fixed names a reload looks for
        assert!(dir.path().join(ACCESS_TOKEN_FILE).exists());
        assert!(dir.path().join(REFRESH_TOKEN_FILE).exists());

        store.set_access_token("access-2").unwrap();
        assert_eq!(store.access_token().as_deref(), Some("access-2"));
        assert_eq!(store.refresh_token().as_deref(), Some("refresh-1"));
    }

    #[test]
    fn test_file_store_clear_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path()).unwrap();

        store.set_pair("a", "r").unwrap();
        store.clear().unwrap();
        assert!(store.access_token().is_none());
        assert!(store.refresh_token().is_none());

        // Clearing an already-empty store succeeds
        store.clear().unwrap();
    }

    #[test]
    fn test_empty_token_file_reads_as_absent() {
        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path()).unwrap();
        std::fs::write(dir.path().join(ACCESS_TOKEN_FILE), "\n").unwrap();
        assert!(store.access_token().is_none());
    }
}
