//! Stored response CRUD operations.
//!
//! One row per (tag, path). Install writes a whole generation in a single
//! transaction; activation deletes whole tags.

use super::connection::StoreDb;
use super::key::response_key;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A captured response stored under one cache generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedResponse {
    pub key: String,
    pub tag: String,
    pub path: String,
    pub status: u16,
    pub content_type: Option<String>,
    /// Response headers as a JSON array of (name, value) pairs.
    pub headers_json: Option<String>,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl CachedResponse {
    /// Build a row for the given tag and normalized path, stamped now.
    pub fn new(
        tag: &str, path: &str, status: u16, content_type: Option<String>, headers_json: Option<String>, body: Vec<u8>,
    ) -> Self {
        Self {
            key: response_key(tag, path),
            tag: tag.to_string(),
            path: path.to_string(),
            status,
            content_type,
            headers_json,
            body,
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

const UPSERT_SQL: &str = "INSERT INTO responses (
        key, tag, path, status, content_type, headers_json, body, stored_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    ON CONFLICT(key) DO UPDATE SET
        status = excluded.status,
        content_type = excluded.content_type,
        headers_json = excluded.headers_json,
        body = excluded.body,
        stored_at = excluded.stored_at";

fn execute_upsert(conn: &rusqlite::Connection, response: &CachedResponse) -> Result<(), rusqlite::Error> {
    conn.execute(
        UPSERT_SQL,
        params![
            &response.key,
            &response.tag,
            &response.path,
            response.status as i64,
            &response.content_type,
            &response.headers_json,
            &response.body,
            &response.stored_at,
        ],
    )?;
    Ok(())
}

impl StoreDb {
    /// Insert or update one cached response.
    pub async fn put_response(&self, response: &CachedResponse) -> Result<(), Error> {
        let response = response.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                execute_upsert(conn, &response).map_err(Error::from)
            })
            .await
            .map_err(Error::from)
    }

    /// Write a whole generation in one transaction.
    ///
    /// All-or-nothing: if any row fails, the transaction rolls back and no
    /// entry of the batch is visible.
    pub async fn put_all(&self, responses: Vec<CachedResponse>) -> Result<(), Error> {
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction().map_err(Error::from)?;
                for response in &responses {
                    execute_upsert(&tx, response).map_err(Error::from)?;
                }
                tx.commit().map_err(Error::from)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get the response stored for a path under a tag.
    ///
    /// Returns None if no row exists.
    pub async fn get_response(&self, tag: &str, path: &str) -> Result<Option<CachedResponse>, Error> {
        let key = response_key(tag, path);
        self.conn
            .call(move |conn| -> Result<Option<CachedResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key, tag, path, status, content_type, headers_json, body, stored_at
                     FROM responses WHERE key = ?1",
                )?;

                let result = stmt.query_row(params![key], |row| {
                    Ok(CachedResponse {
                        key: row.get(0)?,
                        tag: row.get(1)?,
                        path: row.get(2)?,
                        status: row.get::<_, i64>(3)? as u16,
                        content_type: row.get(4)?,
                        headers_json: row.get(5)?,
                        body: row.get(6)?,
                        stored_at: row.get(7)?,
                    })
                });

                match result {
                    Ok(r) => Ok(Some(r)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// All tags with at least one stored response, oldest first.
    pub async fn list_tags(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT tag FROM responses GROUP BY tag ORDER BY MIN(stored_at)")?;
                let tags = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(tags)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every response stored under a tag.
    ///
    /// Returns the number of deleted entries.
    pub async fn delete_tag(&self, tag: &str) -> Result<u64, Error> {
        let tag = tag.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM responses WHERE tag = ?1", params![tag])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of responses stored under a tag.
    pub async fn count_tag(&self, tag: &str) -> Result<u64, Error> {
        let tag = tag.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM responses WHERE tag = ?1", params![tag], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
