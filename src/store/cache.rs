use rusqlite::{params, OptionalExtension};

use super::{now_unix, EventStore};

impl EventStore {
    /// Returns the cached value if present and unexpired (SPEC_FULL.md §4.2).
    pub async fn cache_get(&self, key: &str) -> Result<Option<Vec<u8>>, String> {
        let conn = self.get_read_connection()?;
        let now = now_unix();
        conn.query_row(
            "SELECT value FROM cache WHERE key = ?1 AND expires_at > ?2",
            params![key, now],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| format!("cache_get failed: {}", e))
    }

    /// Overwrites any existing entry; expiry = now + ttl.
    pub async fn cache_set(&self, key: &str, value: &[u8], ttl: std::time::Duration) -> Result<(), String> {
        let conn = self.get_write_connection()?;
        let expires_at = now_unix() + ttl.as_secs_f64();
        conn.execute(
            "INSERT INTO cache (key, value, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
            params![key, value, expires_at],
        )
        .map_err(|e| format!("cache_set failed: {}", e))?;
        Ok(())
    }

    /// Convenience wrapper for JSON-shaped cache values.
    pub async fn cache_get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.cache_get(key).await.ok().flatten()?;
        serde_json::from_slice(&raw).ok()
    }

    pub async fn cache_set_json<T: serde::Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: std::time::Duration,
    ) -> Result<(), String> {
        let raw = serde_json::to_vec(value).map_err(|e| format!("cache serialize failed: {}", e))?;
        self.cache_set(key, &raw, ttl).await
    }

    /// Deletes all rows past expiry; returns the number removed
    /// (SPEC_FULL.md §4.8 "DB maintenance").
    pub async fn cache_purge_expired(&self) -> Result<usize, String> {
        let conn = self.get_write_connection()?;
        let now = now_unix();
        conn.execute("DELETE FROM cache WHERE expires_at <= ?1", params![now])
            .map_err(|e| format!("cache_purge_expired failed: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.db");
        let store = EventStore::new(path.to_str().unwrap()).await.unwrap();

        store
            .cache_set("k", b"v", std::time::Duration::from_secs(60))
            .await
            .unwrap();
        let got = store.cache_get("k").await.unwrap();
        assert_eq!(got, Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn expired_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.db");
        let store = EventStore::new(path.to_str().unwrap()).await.unwrap();

        store
            .cache_set("k", b"v", std::time::Duration::from_millis(1))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let got = store.cache_get("k").await.unwrap();
        assert_eq!(got, None);
    }
}
