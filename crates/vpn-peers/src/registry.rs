//! Durable peer registry.
//!
//! The registry owns a single SQLite connection behind a mutex. Every entry
//! point holds the mutex for its whole duration, so within one process two
//! creations can never observe the same set of used addresses. Creation also
//! runs in an IMMEDIATE transaction, which takes the database write lock
//! before the address scan and serializes writers from other processes.
//!
//! There is no busy timeout beyond the SQLite driver default and no retry:
//! contention is returned to the caller as [`Error::Storage`].

use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::path::Path;

use chrono::{SubsecRound, Utc};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row, TransactionBehavior};
use tracing::{debug, info};
use vpn_wireguard::{generate_id, KeyPair};

use crate::allocation::{parse_allocated, to_host_cidr, AddressPool};
use crate::error::{Error, Result};
use crate::schema::{self, format_timestamp, parse_timestamp, DB_FILE};
use crate::types::{EnabledPeer, Peer};

const PEER_COLUMNS: &str = "id, name, public_key, private_key, allowed_ip, enabled, created_at";

/// Durable store of peer records.
pub struct PeerRegistry {
    conn: Mutex<Connection>,
}

impl PeerRegistry {
    /// Opens the registry database at `path`, creating and migrating it as
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] or [`Error::Io`] if the database cannot be
    /// opened or migrated; a failed migration is rolled back.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = schema::open_db(path)?;
        debug!(path = %path.display(), "opened peer registry");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens `vpn.db` inside `data_dir`.
    ///
    /// # Errors
    ///
    /// See [`PeerRegistry::open`].
    pub fn open_in_dir(data_dir: &Path) -> Result<Self> {
        Self::open(&data_dir.join(DB_FILE))
    }

    /// Opens a private in-memory registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if SQLite fails to initialize.
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        schema::ensure_schema(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates a peer named `name` with a fresh key pair and the lowest free
    /// address in `prefix`.
    ///
    /// Name check, key generation, address scan and insert form one
    /// transaction; on any error nothing is written.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidName`] for an empty name or one with surrounding whitespace
    /// - [`Error::Conflict`] if the name is taken or a unique key/address constraint trips
    /// - [`Error::CapacityExhausted`] if the prefix has no free address
    /// - [`Error::ConfigFormat`] / [`Error::UnsupportedAddressFamily`] for a bad prefix
    /// - [`Error::RandomSource`] if key or ID generation fails
    /// - [`Error::Storage`] for database failures
    pub fn create_peer(&self, name: &str, prefix: &str) -> Result<Peer> {
        let pool = AddressPool::parse(prefix)?;
        self.create_peer_in(name, &pool)
    }

    /// Same as [`PeerRegistry::create_peer`] with an already parsed pool.
    ///
    /// # Errors
    ///
    /// See [`PeerRegistry::create_peer`].
    pub fn create_peer_in(&self, name: &str, pool: &AddressPool) -> Result<Peer> {
        validate_name(name)?;

        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM peers WHERE name = ?1)",
            params![name],
            |row| row.get(0),
        )?;
        if exists {
            return Err(Error::Conflict {
                name: name.to_string(),
            });
        }

        let keys = KeyPair::generate()?;

        let mut used = used_addresses(&tx)?;
        used.insert(pool.server_address());
        let address = pool.allocate(&used)?;

        let peer = Peer {
            id: generate_id()?,
            name: name.to_string(),
            public_key: keys.public_key().to_base64(),
            private_key: Some(keys.private_key().to_base64()),
            allowed_ip: to_host_cidr(address),
            enabled: true,
            created_at: Utc::now().trunc_subsecs(6),
        };

        tx.execute(
            "INSERT INTO peers (id, name, public_key, private_key, allowed_ip, enabled, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                peer.id,
                peer.name,
                peer.public_key,
                peer.private_key,
                peer.allowed_ip,
                peer.enabled,
                format_timestamp(peer.created_at),
            ],
        )
        .map_err(|e| conflict_or_storage(e, &peer.name))?;
        tx.commit()?;

        info!(name = %peer.name, id = %peer.id, address = %peer.allowed_ip, "created peer");
        Ok(peer)
    }

    /// Deletes the peer named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no such peer exists, including on a
    /// second call for the same name.
    pub fn remove_peer(&self, name: &str) -> Result<()> {
        let conn = self.conn.lock();
        let removed = conn.execute("DELETE FROM peers WHERE name = ?1", params![name])?;
        if removed == 0 {
            return Err(Error::NotFound {
                name: name.to_string(),
            });
        }
        info!(name, "removed peer");
        Ok(())
    }

    /// Returns every peer, oldest first. Rows created within the same
    /// millisecond keep insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] on database failures.
    pub fn list_peers(&self) -> Result<Vec<Peer>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PEER_COLUMNS} FROM peers ORDER BY julianday(created_at), rowid"
        ))?;
        let peers = stmt
            .query_map([], peer_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(peers)
    }

    /// Returns public key and address of every enabled peer, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] on database failures.
    pub fn enabled_peers(&self) -> Result<Vec<EnabledPeer>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT public_key, allowed_ip FROM peers WHERE enabled = 1 ORDER BY julianday(created_at), rowid",
        )?;
        let peers = stmt
            .query_map([], |row| {
                Ok(EnabledPeer {
                    public_key: row.get(0)?,
                    allowed_ip: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(peers)
    }

    /// Looks up a single peer by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no such peer exists.
    pub fn get_peer(&self, name: &str) -> Result<Peer> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {PEER_COLUMNS} FROM peers WHERE name = ?1"),
            params![name],
            peer_from_row,
        )
        .optional()?
        .ok_or_else(|| Error::NotFound {
            name: name.to_string(),
        })
    }

    /// Sets the enabled flag. Keys and address are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no such peer exists.
    pub fn set_enabled(&self, name: &str, enabled: bool) -> Result<()> {
        let conn = self.conn.lock();
        let updated = conn.execute(
            "UPDATE peers SET enabled = ?1 WHERE name = ?2",
            params![enabled, name],
        )?;
        if updated == 0 {
            return Err(Error::NotFound {
                name: name.to_string(),
            });
        }
        info!(name, enabled, "updated peer");
        Ok(())
    }
}

impl std::fmt::Debug for PeerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerRegistry").finish_non_exhaustive()
    }
}

/// Names are stored exactly as given and looked up by exact match, so they
/// are never rewritten here. Blank names and names with surrounding
/// whitespace are refused instead.
fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() || name.trim() != name {
        return Err(Error::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Addresses already handed out. Rows whose address does not parse cannot
/// collide with a scan candidate and are ignored.
fn used_addresses(conn: &Connection) -> Result<HashSet<Ipv4Addr>> {
    let mut stmt = conn.prepare("SELECT allowed_ip FROM peers")?;
    let stored = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(stored.iter().filter_map(|ip| parse_allocated(ip)).collect())
}

fn peer_from_row(row: &Row<'_>) -> rusqlite::Result<Peer> {
    let created_raw: String = row.get(6)?;
    let created_at = parse_timestamp(&created_raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?;
    let private_key: Option<String> = row.get(3)?;

    Ok(Peer {
        id: row.get(0)?,
        name: row.get(1)?,
        public_key: row.get(2)?,
        private_key: private_key.filter(|k| !k.is_empty()),
        allowed_ip: row.get(4)?,
        enabled: row.get::<_, Option<bool>>(5)?.unwrap_or(true),
        created_at,
    })
}

fn conflict_or_storage(err: rusqlite::Error, name: &str) -> Error {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _) if e.code == ErrorCode::ConstraintViolation => {
            Error::Conflict {
                name: name.to_string(),
            }
        }
        other => Error::Storage(other),
    }
}
