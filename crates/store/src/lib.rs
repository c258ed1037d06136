pub mod json;
pub mod sqlite;

use std::sync::Arc;

use tracing::info;

use common::{Result, SignalStore};

pub use json::JsonFileStore;
pub use sqlite::SqliteSignalStore;

/// Open the store named by `SIGNAL_STORE`.
///
/// A `sqlite:` URL selects the SQLite store; anything else is a JSON file path.
pub async fn open_store(location: &str) -> Result<Arc<dyn SignalStore>> {
    if location.starts_with("sqlite:") {
        info!(url = location, "Using SQLite signal store");
        Ok(Arc::new(SqliteSignalStore::connect(location).await?))
    } else {
        info!(path = location, "Using JSON file signal store");
        Ok(Arc::new(JsonFileStore::new(location)))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn location_selects_backend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signals.json");

        let json = open_store(path.to_str().unwrap()).await.unwrap();
        json.append(&fixtures::signal("a", 0)).await.unwrap();
        assert!(path.exists());

        let sqlite = open_store("sqlite::memory:").await.unwrap();
        sqlite.append(&fixtures::signal("a", 0)).await.unwrap();
        assert_eq!(sqlite.load().await.unwrap().len(), 1);
    }
}
