use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use common::{Error, Result, Signal, SignalStore};

/// Signals kept as a pretty-printed JSON array in a single file.
///
/// Appends rewrite the whole file through a temporary sibling and a rename,
/// so readers never observe a half-written array.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<Signal>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::StoreCorruption(format!("{}: {e}", self.path.display())))
    }

    /// Move an unreadable file to `<name>.corrupt-<unix_ts>`.
    async fn set_aside(&self) -> Result<PathBuf> {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".corrupt-{}", Utc::now().timestamp()));
        let backup = self.path.with_file_name(name);
        tokio::fs::rename(&self.path, &backup).await?;
        Ok(backup)
    }

    async fn write_all(&self, signals: &[Signal]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let body = serde_json::to_vec_pretty(signals)?;
        let mut tmp_name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp = self.path.with_file_name(tmp_name);

        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl SignalStore for JsonFileStore {
    async fn append(&self, signal: &Signal) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut signals = match self.read_all().await {
            Ok(signals) => signals,
            Err(Error::StoreCorruption(reason)) => {
                let backup = self.set_aside().await?;
                error!(
                    %reason,
                    backup = %backup.display(),
                    "Signal file unreadable, moved aside and starting a new one"
                );
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        if signals.iter().any(|s| s.id == signal.id) {
            warn!(signal_id = %signal.id, "Signal already stored, skipping");
            return Ok(());
        }

        signals.push(signal.clone());
        self.write_all(&signals).await?;
        debug!(signal_id = %signal.id, total = signals.len(), "Signal appended");
        Ok(())
    }

    async fn load(&self) -> Result<Vec<Signal>> {
        self.read_all().await
    }
}
