//! Persistence of generated credentials.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::blockchain::wallet::Credential;
use crate::storage::{StorageError, StorageResult};

/// Somewhere a generated credential can be handed off to.
pub trait KeyStore: Send + Sync {
    /// Persist `credential` and return a human-readable location.
    fn store(&self, credential: &Credential) -> StorageResult<String>;
}

/// Writes `<address>_key.txt` files holding the hex private key.
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    dir: PathBuf,
}

impl FileKeyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File a credential is written to.
    pub fn path_for(&self, credential: &Credential) -> PathBuf {
        self.dir.join(format!("{}_key.txt", credential.address()))
    }

    fn write_new(path: &Path, content: &str) -> std::io::Result<()> {
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()
    }
}

impl KeyStore for FileKeyStore {
    fn store(&self, credential: &Credential) -> StorageResult<String> {
        let path = self.path_for(credential);
        Self::write_new(&path, &credential.private_key_hex()).map_err(|source| {
            StorageError::StorageWrite {
                path: path.clone(),
                source,
            }
        })?;

        tracing::warn!(
            address = %credential.address(),
            path = %path.display(),
            "Deposit private key written in plaintext"
        );
        Ok(path.display().to_string())
    }
}
