//! SQLite schema for the peer registry and its forward-only migrations.

use std::path::Path;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use rusqlite::Connection;
use tracing::debug;

use crate::error::Result;
use crate::fsutil;

/// Database file name inside the data directory.
pub const DB_FILE: &str = "vpn.db";

const CREATE_PEERS: &str = "
    CREATE TABLE IF NOT EXISTS peers (
        id          TEXT PRIMARY KEY,
        name        TEXT UNIQUE NOT NULL,
        public_key  TEXT UNIQUE NOT NULL,
        private_key TEXT,
        allowed_ip  TEXT UNIQUE NOT NULL,
        enabled     INTEGER DEFAULT 1,
        created_at  DATETIME NOT NULL
    );
";

/// Opens (creating if needed) the database at `path` and brings its schema
/// up to date.
pub(crate) fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fsutil::ensure_private_dir(parent)?;
    }
    let mut conn = Connection::open(path)?;
    fsutil::restrict_file(path)?;
    ensure_schema(&mut conn)?;
    Ok(conn)
}

/// Creates the `peers` table and applies pending migrations in a single
/// transaction. A failure leaves the store exactly as it was.
pub(crate) fn ensure_schema(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(CREATE_PEERS)?;

    if !has_column(&tx, "peers", "private_key")? {
        debug!("migrating peers table: adding private_key column");
        tx.execute_batch("ALTER TABLE peers ADD COLUMN private_key TEXT")?;
    }

    tx.commit()?;
    Ok(())
}

fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names.iter().any(|name| name == column))
}

/// Formats a creation timestamp for storage, always in UTC.
///
/// Rows written by older stores carry a local offset instead, so the text
/// of two rows does not order by instant. Queries order on
/// `julianday(created_at)`, which SQLite normalizes to UTC.
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a stored timestamp. Accepts RFC 3339 as well as the
/// `YYYY-MM-DD HH:MM:SS[.f][±HH:MM]` layout used by older stores.
pub(crate) fn parse_timestamp(raw: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z"))
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").map(|naive| naive.and_utc())
        })
}
