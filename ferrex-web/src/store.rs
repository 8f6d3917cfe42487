//! Client-side account stores
//!
//! [`MemoryAccountStore`] backs tests and short-lived runtimes;
//! [`FileAccountStore`] persists to a JSON file under the platform data
//! directory, the same place the desktop player keeps its auth cache.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use directories::ProjectDirs;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    account::{Account, AccountPatch, AccountStore},
    error::StoreError,
};

pub(crate) const ACCOUNTS_FILE: &str = "accounts.json";

/// Known accounts plus the one currently selected
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredAccounts {
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
}

impl StoredAccounts {
    fn current(&self) -> Option<&Account> {
        let selected = self.selected.as_deref()?;
        self.accounts.iter().find(|account| account.id == selected)
    }

    fn patch(&mut self, id: &str, patch: AccountPatch) -> Result<(), StoreError> {
        let account = self
            .accounts
            .iter_mut()
            .find(|account| account.id == id)
            .ok_or_else(|| StoreError::UnknownAccount(id.to_owned()))?;
        account.apply(patch);
        Ok(())
    }

    fn upsert(&mut self, account: Account) {
        self.selected = Some(account.id.clone());
        match self.accounts.iter_mut().find(|known| known.id == account.id) {
            Some(known) => *known = account,
            None => self.accounts.push(account),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    state: RwLock<StoredAccounts>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an account and make it the current one.
    pub fn add_account(&self, account: Account) {
        self.state.write().upsert(account);
    }

    pub fn snapshot(&self) -> StoredAccounts {
        self.state.read().clone()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn current_account(&self) -> Result<Option<Account>, StoreError> {
        Ok(self.state.read().current().cloned())
    }

    async fn update_account(&self, id: &str, patch: AccountPatch) -> Result<(), StoreError> {
        self.state.write().patch(id, patch)
    }
}

/// JSON file backed store. A missing file reads as "no accounts".
#[derive(Debug)]
pub struct FileAccountStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileAccountStore {
    pub fn new() -> Result<Self, StoreError> {
        let dirs = ProjectDirs::from("", "ferrex", "ferrex-web").ok_or(StoreError::NoDataDir)?;
        Ok(Self::at(dirs.data_dir().join(ACCOUNTS_FILE)))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store an account and make it the current one.
    pub async fn add_account(&self, account: Account) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut stored = self.load().await?;
        stored.upsert(account);
        self.save(&stored).await
    }

    async fn load(&self) -> Result<StoredAccounts, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Ok(StoredAccounts::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, stored: &StoredAccounts) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(stored)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl AccountStore for FileAccountStore {
    async fn current_account(&self) -> Result<Option<Account>, StoreError> {
        Ok(self.load().await?.current().cloned())
    }

    async fn update_account(&self, id: &str, patch: AccountPatch) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut stored = self.load().await?;
        stored.patch(id, patch)?;
        self.save(&stored).await?;
        tracing::debug!(account_id = id, path = %self.path.display(), "account updated");
        Ok(())
    }
}
