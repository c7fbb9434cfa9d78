//! Response snapshot storage.
//!
//! Entries are addressed by (cache name, request key). Writing an entry
//! implicitly opens its cache, the same way `cache.put` works on a cache
//! handle that was just opened.

use super::connection::TileStore;
use super::hash::compute_request_key;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A cached HTTP response.
///
/// Holds everything needed to replay the response: status, headers in
/// wire order, and the full body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub cache_name: String,
    pub method: String,
    pub url: String,
    pub status_code: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl CachedResponse {
    /// Request key this entry is stored under.
    pub fn key(&self) -> String {
        compute_request_key(&self.method, &self.url)
    }

    /// First header value with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl TileStore {
    /// Insert or replace a response snapshot.
    pub async fn put_entry(&self, entry: &CachedResponse) -> Result<(), Error> {
        let entry = entry.clone();
        let key = entry.key();
        let headers_json = serde_json::to_string(&entry.headers)
            .map_err(|e| Error::InvalidInput(format!("unserializable headers: {e}")))?;
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)",
                    params![&entry.cache_name, chrono::Utc::now().to_rfc3339()],
                )?;
                tx.execute(
                    "INSERT INTO entries (
                    cache_name, key, method, url, status_code, headers_json, body, stored_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT(cache_name, key) DO UPDATE SET
                    status_code = excluded.status_code,
                    headers_json = excluded.headers_json,
                    body = excluded.body,
                    stored_at = excluded.stored_at",
                    params![
                        &entry.cache_name,
                        &key,
                        &entry.method.to_ascii_uppercase(),
                        &entry.url,
                        entry.status_code,
                        &headers_json,
                        &entry.body,
                        &entry.stored_at,
                    ],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up the entry for an exact request in the named cache.
    ///
    /// Returns None if the cache or the entry doesn't exist.
    pub async fn match_entry(&self, cache_name: &str, method: &str, url: &str) -> Result<Option<CachedResponse>, Error> {
        let cache_name = cache_name.to_string();
        let key = compute_request_key(method, url);
        self.conn
            .call(move |conn| -> Result<Option<CachedResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT cache_name, method, url, status_code, headers_json, body, stored_at
                     FROM entries WHERE cache_name = ?1 AND key = ?2",
                )?;

                let result = stmt.query_row(params![cache_name, key], |row| {
                    Ok((
                        CachedResponse {
                            cache_name: row.get(0)?,
                            method: row.get(1)?,
                            url: row.get(2)?,
                            status_code: row.get(3)?,
                            headers: Vec::new(),
                            body: row.get(5)?,
                            stored_at: row.get(6)?,
                        },
                        row.get::<_, String>(4)?,
                    ))
                });

                match result {
                    Ok((mut entry, headers_json)) => {
                        entry.headers = serde_json::from_str(&headers_json)
                            .map_err(|e| Error::InvalidResponse(format!("corrupt cached headers: {e}")))?;
                        Ok(Some(entry))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries held by the named cache.
    pub async fn count_entries(&self, cache_name: &str) -> Result<u64, Error> {
        let cache_name = cache_name.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE cache_name = ?1", params![cache_name], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
