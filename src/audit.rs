//! SQLite audit log for search requests.
//!
//! One row per recorded call. Write failures are reported to the caller, who
//! logs and moves on; auditing must never fail a search.

use chrono::Local;
use parking_lot::Mutex;
use rusqlite::{Connection, params};
use serde_json::Value;
use std::path::Path;

const API_LOG_TABLE_DDL: &str = "CREATE TABLE IF NOT EXISTS api (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    date TEXT NOT NULL,
    endpoint TEXT NOT NULL,
    request TEXT,
    duration REAL,
    status_code INTEGER,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)";

/// Audit log failure
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Append-only request log backed by SQLite.
pub struct AuditLog {
    conn: Mutex<Connection>,
}

impl AuditLog {
    /// Open (and initialize if needed) the audit database at `path`
    pub fn open(path: &Path) -> Result<Self, AuditError> {
        let conn = Connection::open(path)?;
        conn.execute(API_LOG_TABLE_DDL, [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory log, used in tests
    pub fn open_in_memory() -> Result<Self, AuditError> {
        let conn = Connection::open_in_memory()?;
        conn.execute(API_LOG_TABLE_DDL, [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Record one call
    pub fn record(
        &self,
        endpoint: &str,
        request: &Value,
        duration_secs: f64,
        status_code: u16,
    ) -> Result<(), AuditError> {
        let now = Local::now();
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO api (timestamp, date, endpoint, request, duration, status_code)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                now.format("%Y-%m-%d %H:%M:%S %z").to_string(),
                now.format("%Y-%m-%d").to_string(),
                endpoint,
                request.to_string(),
                duration_secs,
                status_code,
            ],
        )?;
        Ok(())
    }

    /// Number of recorded calls
    pub fn count(&self) -> Result<u64, AuditError> {
        let conn = self.conn.lock();
        let count: u64 = conn.query_row("SELECT COUNT(*) FROM api", [], |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::AuditLog;
    use serde_json::json;

    #[test]
    fn test_record_and_count() {
        let log = AuditLog::open_in_memory().expect("open");
        log.record("ai_search", &json!({"query": "show n-linked glycans"}), 0.42, 200)
            .expect("record");
        log.record("ai_search", &json!({"query": "hgf protein"}), 1.1, 429)
            .expect("record");
        assert_eq!(log.count().expect("count"), 2);
    }
}
