//! Token persistence
//!
//! Manages a JSON file mapping token ids to records. All writes use
//! atomic temp-file + rename to prevent corruption on crash, and the
//! file is created 0600 since records carry secret digests and SCM
//! credentials. A tokio Mutex serializes concurrent access, so each
//! single-record operation is atomic; concurrent writers to the same
//! record are last-writer-wins.
//!
//! Records are kept in a `BTreeMap`, so listing order is ascending id —
//! that is the store's natural ordering and it is preserved by
//! `list_owned_by`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::TokenRecord;

/// File-backed token store.
pub struct TokenStore {
    path: PathBuf,
    state: Mutex<BTreeMap<String, TokenRecord>>,
}

impl TokenStore {
    /// Load tokens from the given file path.
    ///
    /// If the file doesn't exist, creates it as `{}` (cold start with
    /// zero tokens).
    pub async fn load(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Storage(format!("reading token file: {e}")))?;
            let tokens: BTreeMap<String, TokenRecord> = serde_json::from_str(&contents)
                .map_err(|e| Error::Storage(format!("parsing token file: {e}")))?;
            info!(path = %path.display(), tokens = tokens.len(), "loaded token store");
            tokens
        } else {
            info!(path = %path.display(), "token file not found, starting with empty store");
            let tokens = BTreeMap::new();
            write_atomic(&path, &tokens).await?;
            tokens
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Insert a freshly created record and persist.
    pub async fn insert(&self, record: TokenRecord) -> Result<()> {
        let mut state = self.state.lock().await;
        debug!(id = record.id, owner = record.owner, "inserting token");
        state.insert(record.id.clone(), record);
        write_atomic(&self.path, &state).await
    }

    /// Get a clone of a record by id.
    pub async fn get(&self, id: &str) -> Option<TokenRecord> {
        let state = self.state.lock().await;
        state.get(id).cloned()
    }

    /// Replace an existing record and persist.
    ///
    /// Errors with `TokenNotFound` if the id is absent — updates never
    /// resurrect a destroyed token.
    pub async fn update(&self, record: TokenRecord) -> Result<()> {
        let mut state = self.state.lock().await;
        let slot = state
            .get_mut(&record.id)
            .ok_or_else(|| Error::TokenNotFound(record.id.clone()))?;
        *slot = record;
        write_atomic(&self.path, &state).await
    }

    /// Remove a record entirely and persist.
    ///
    /// Returns the removed record if it existed.
    pub async fn remove(&self, id: &str) -> Result<Option<TokenRecord>> {
        let mut state = self.state.lock().await;
        let removed = state.remove(id);
        if removed.is_some() {
            debug!(id, "removed token");
            write_atomic(&self.path, &state).await?;
        }
        Ok(removed)
    }

    /// All records owned by the given principal, in id order.
    pub async fn list_owned_by(&self, owner: &str) -> Vec<TokenRecord> {
        let state = self.state.lock().await;
        state
            .values()
            .filter(|record| record.owner == owner)
            .cloned()
            .collect()
    }

    /// Number of stored tokens.
    pub async fn len(&self) -> usize {
        let state = self.state.lock().await;
        state.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Write the token map to a file atomically.
///
/// Writes to a temporary file in the same directory, then renames it
/// over the target. File permissions are set to 0600.
async fn write_atomic(path: &Path, data: &BTreeMap<String, TokenRecord>) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| Error::Storage(format!("serializing tokens: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Storage("token file path has no parent directory".into()))?;

    let tmp_path = dir.join(format!(".tokens.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Storage(format!("writing temp token file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Storage(format!("setting token file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Storage(format!("renaming temp token file: {e}")))?;

    debug!(path = %path.display(), "persisted tokens");
    Ok(())
}
