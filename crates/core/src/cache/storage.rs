//! Named cache management.
//!
//! Mirrors the browser's CacheStorage: caches are created on first open,
//! listed with their entry counts, and pruned wholesale together with their
//! entries when a newer generation takes over.

use super::connection::TileStore;
use super::generation::CacheGeneration;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// Name and entry count of one cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CacheSummary {
    pub name: String,
    pub entries: u64,
}

impl TileStore {
    /// Create the named cache if it does not exist yet.
    pub async fn open_cache(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)",
                    params![name, chrono::Utc::now().to_rfc3339()],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Every cache with its entry count, sorted by name.
    pub async fn cache_summaries(&self) -> Result<Vec<CacheSummary>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<CacheSummary>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT c.name, COUNT(e.key)
                     FROM caches c LEFT JOIN entries e ON e.cache_name = c.name
                     GROUP BY c.name ORDER BY c.name",
                )?;
                let summaries = stmt
                    .query_map([], |row| {
                        Ok(CacheSummary { name: row.get(0)?, entries: row.get::<_, i64>(1)? as u64 })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(summaries)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every cache in the generation's family except the generation
    /// itself.
    ///
    /// Caches outside the family are left alone. Returns the deleted names.
    pub async fn prune_generations(&self, keep: &CacheGeneration) -> Result<Vec<String>, Error> {
        let keep = keep.clone();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let tx = conn.transaction()?;
                let stale = {
                    let mut stmt = tx.prepare("SELECT name FROM caches ORDER BY name")?;
                    stmt.query_map([], |row| row.get::<_, String>(0))?
                        .collect::<Result<Vec<_>, _>>()?
                        .into_iter()
                        .filter(|name| keep.is_stale(name))
                        .collect::<Vec<_>>()
                };
                for name in &stale {
                    tx.execute("DELETE FROM entries WHERE cache_name = ?1", params![name])?;
                    tx.execute("DELETE FROM caches WHERE name = ?1", params![name])?;
                }
                tx.commit()?;
                Ok(stale)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn generation() -> CacheGeneration {
        CacheGeneration::at("mapbox-tiles", Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap())
    }

    async fn names(store: &TileStore) -> Vec<String> {
        store
            .cache_summaries()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect()
    }

    #[tokio::test]
    async fn test_open_cache_is_idempotent() {
        let store = TileStore::open_in_memory().await.unwrap();
        store.open_cache("mapbox-tiles-2026-03").await.unwrap();
        store.open_cache("mapbox-tiles-2026-03").await.unwrap();
        assert_eq!(names(&store).await, vec!["mapbox-tiles-2026-03".to_string()]);
    }

    #[tokio::test]
    async fn test_summaries_count_entries() {
        let store = TileStore::open_in_memory().await.unwrap();
        store.open_cache("mapbox-tiles-2026-02").await.unwrap();
        let summaries = store.cache_summaries().await.unwrap();
        assert_eq!(summaries, vec![CacheSummary { name: "mapbox-tiles-2026-02".into(), entries: 0 }]);
    }

    #[tokio::test]
    async fn test_prune_keeps_current_and_foreign_caches() {
        let store = TileStore::open_in_memory().await.unwrap();
        for name in ["mapbox-tiles-2026-01", "mapbox-tiles-2026-02", "mapbox-tiles-2026-03", "app-shell-v2"] {
            store.open_cache(name).await.unwrap();
        }

        let pruned = store.prune_generations(&generation()).await.unwrap();
        assert_eq!(pruned, vec!["mapbox-tiles-2026-01".to_string(), "mapbox-tiles-2026-02".to_string()]);
        assert_eq!(names(&store).await, vec!["app-shell-v2".to_string(), "mapbox-tiles-2026-03".to_string()]);
    }

    #[tokio::test]
    async fn test_prune_matches_generation_staleness_rule() {
        let store = TileStore::open_in_memory().await.unwrap();
        let candidates = ["mapbox-tiles", "mapbox-tiles-legacy", "mapbox-tiles-2026-03", "static-assets-v1"];
        for name in candidates {
            store.open_cache(name).await.unwrap();
        }

        let keep = generation();
        let expected: Vec<String> = candidates
            .iter()
            .filter(|n| keep.is_stale(n))
            .map(|n| n.to_string())
            .collect();

        let pruned = store.prune_generations(&keep).await.unwrap();
        assert_eq!(pruned, expected);
        assert_eq!(pruned, vec!["mapbox-tiles-legacy".to_string()]);
    }

    #[tokio::test]
    async fn test_prune_treats_like_wildcards_literally() {
        let store = TileStore::open_in_memory().await.unwrap();
        store.open_cache("mapboxXtiles-2026-01").await.unwrap();
        let keep = CacheGeneration::at("mapbox_tiles", Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap());

        let pruned = store.prune_generations(&keep).await.unwrap();
        assert!(pruned.is_empty());
    }

    #[tokio::test]
    async fn test_prune_without_caches() {
        let store = TileStore::open_in_memory().await.unwrap();
        assert!(store.prune_generations(&generation()).await.unwrap().is_empty());
    }
}
