//! Registry behaviour against on-disk stores.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use rusqlite::{params, Connection};
use vpn_peers::{
    extract_peer_sections, render_server_config, Error, NetworkConfig, PeerRegistry,
    RenderCapabilities, DB_FILE,
};

const PREFIX: &str = "10.0.0.1/24";

fn legacy_store(dir: &std::path::Path) {
    let conn = Connection::open(dir.join(DB_FILE)).expect("open legacy db");
    conn.execute_batch(
        "CREATE TABLE peers (
            id TEXT PRIMARY KEY,
            name TEXT UNIQUE NOT NULL,
            public_key TEXT UNIQUE NOT NULL,
            allowed_ip TEXT UNIQUE NOT NULL,
            enabled INTEGER DEFAULT 1,
            created_at DATETIME NOT NULL
        )",
    )
    .expect("legacy schema");
    conn.execute(
        "INSERT INTO peers (id, name, public_key, allowed_ip, enabled, created_at)
         VALUES (?1, ?2, ?3, ?4, 1, ?5)",
        params![
            "a1b2c3d4e5f60718",
            "laptop",
            "bGVnYWN5LXB1YmxpYy1rZXktMzItYnl0ZXMtbG9uZyE=",
            "10.0.0.2/32",
            "2023-06-01 10:00:00.123456789+00:00",
        ],
    )
    .expect("legacy row");
}

#[test]
fn legacy_store_is_migrated_on_open() {
    let dir = tempfile::tempdir().expect("tempdir");
    legacy_store(dir.path());

    let registry = PeerRegistry::open_in_dir(dir.path()).expect("open migrates");
    let peers = registry.list_peers().expect("list");
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].name, "laptop");
    assert_eq!(peers[0].private_key, None);
    assert!(peers[0].enabled);

    let fresh = registry.create_peer("phone", PREFIX).expect("create after migration");
    assert_eq!(fresh.allowed_ip, "10.0.0.3/32");

    let names: Vec<_> = registry
        .list_peers()
        .expect("list")
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, ["laptop", "phone"]);
    drop(registry);

    let conn = Connection::open(dir.path().join(DB_FILE)).expect("reopen raw");
    let has_column: bool = conn
        .query_row(
            "SELECT COUNT(*) > 0 FROM pragma_table_info('peers') WHERE name = 'private_key'",
            [],
            |row| row.get(0),
        )
        .expect("pragma");
    assert!(has_column);
}

#[test]
fn reopening_is_idempotent_and_durable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let created = {
        let registry = PeerRegistry::open_in_dir(dir.path()).expect("open");
        registry.create_peer("alice", PREFIX).expect("create")
    };

    let registry = PeerRegistry::open_in_dir(dir.path()).expect("reopen");
    let stored = registry.get_peer("alice").expect("persisted");
    assert_eq!(stored, created);
}

#[test]
fn concurrent_creations_never_share_addresses() {
    let dir = tempfile::tempdir().expect("tempdir");
    let registry = Arc::new(PeerRegistry::open_in_dir(dir.path()).expect("open"));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                (0..5)
                    .map(|i| {
                        registry
                            .create_peer(&format!("t{t}-p{i}"), PREFIX)
                            .expect("create")
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut addresses = HashSet::new();
    let mut keys = HashSet::new();
    for handle in handles {
        for peer in handle.join().expect("thread") {
            assert!(addresses.insert(peer.allowed_ip.clone()), "dup {}", peer.allowed_ip);
            assert!(keys.insert(peer.public_key.clone()));
        }
    }
    assert_eq!(addresses.len(), 40);
    assert!(!addresses.contains("10.0.0.1/32"));
}

#[test]
fn concurrent_duplicate_names_yield_exactly_one_winner() {
    let registry = Arc::new(PeerRegistry::open_in_memory().expect("open"));
    let handles: Vec<_> = (0..6)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.create_peer("shared", PREFIX))
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("thread"))
        .collect();
    let wins = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(Error::Conflict { .. })))
        .count();
    assert_eq!((wins, conflicts), (1, 5));
    assert_eq!(registry.list_peers().expect("list").len(), 1);
}

#[test]
fn rendered_server_config_follows_registry_order() {
    let registry = PeerRegistry::open_in_memory().expect("open");
    let alice = registry.create_peer("alice", PREFIX).expect("alice");
    let bob = registry.create_peer("bob", PREFIX).expect("bob");
    registry.remove_peer("alice").expect("remove");
    let carol = registry.create_peer("carol", PREFIX).expect("carol");
    assert_eq!(carol.allowed_ip, alice.allowed_ip);

    let dir = tempfile::tempdir().expect("tempdir");
    let config = NetworkConfig::generate(dir.path(), vpn_peers::InitOptions::default())
        .expect("config");
    let text = render_server_config(
        &config,
        &registry.enabled_peers().expect("enabled"),
        RenderCapabilities::default(),
    );

    let expected = format!(
        "[Peer]\nPublicKey = {}\nAllowedIPs = 10.0.0.3/32\n\n[Peer]\nPublicKey = {}\nAllowedIPs = 10.0.0.2/32\n",
        bob.public_key, carol.public_key
    );
    assert_eq!(extract_peer_sections(&text), expected);
}
