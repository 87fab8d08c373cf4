// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use pokedex_app::{
    CapturedEntry, CatalogId, CollectionStore, NewCapture, insert_unique, remove_exact,
};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "pokedex";
pub const COLLECTION_SLOT: &str = "myPokemons";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS slots (
  name TEXT PRIMARY KEY,
  value TEXT NOT NULL,
  updated_at TEXT NOT NULL
);
";

const REQUIRED_SLOT_COLUMNS: [&str; 3] = ["name", "value", "updated_at"];

const DEMO_CAPTURES: [(i64, &str, &str); 4] = [
    (25, "pikachu", "Sparky"),
    (1, "bulbasaur", "Sprout"),
    (7, "squirtle", "Shellby"),
    (133, "eevee", "Fluff"),
];

/// SQLite-backed key/value slots. The captured collection is one slot holding
/// a JSON array.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        self.conn
            .execute_batch(SCHEMA)
            .context("create schema")?;
        validate_schema(&self.conn)
    }

    pub fn read_slot(&self, name: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM slots WHERE name = ?",
                params![name],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("read slot {name}"))
    }

    pub fn load_collection(&self) -> Result<Vec<CapturedEntry>> {
        decode_collection(self.read_slot(COLLECTION_SLOT)?)
    }

    /// Seeds a handful of captures into an empty collection. Returns how many
    /// were added.
    pub fn seed_demo_data(&mut self) -> Result<usize> {
        if !self.load_collection()?.is_empty() {
            return Ok(0);
        }
        let mut added = 0;
        for (id, name, nickname) in DEMO_CAPTURES {
            let capture = NewCapture {
                id: CatalogId::new(id),
                name: name.to_owned(),
                nickname: nickname.to_owned(),
            };
            if self.add(&capture)? {
                added += 1;
            }
        }
        tracing::info!(added, "seeded demo collection");
        Ok(added)
    }

    /// Read-modify-write of the collection slot under one IMMEDIATE
    /// transaction. `apply` returns whether it changed anything; unchanged
    /// collections are not written back.
    fn mutate_collection(
        &mut self,
        action: &str,
        apply: impl FnOnce(&mut Vec<CapturedEntry>) -> bool,
    ) -> Result<bool> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .with_context(|| format!("begin transaction for {action}"))?;

        let raw: Option<String> = tx
            .query_row(
                "SELECT value FROM slots WHERE name = ?",
                params![COLLECTION_SLOT],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("read slot {COLLECTION_SLOT}"))?;
        let mut entries = decode_collection(raw)?;

        if !apply(&mut entries) {
            tx.rollback()
                .with_context(|| format!("roll back {action}"))?;
            return Ok(false);
        }

        let encoded = serde_json::to_string(&entries)
            .with_context(|| format!("encode slot {COLLECTION_SLOT}"))?;
        tx.execute(
            "
            INSERT INTO slots (name, value, updated_at)
            VALUES (?, ?, strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
            ON CONFLICT(name) DO UPDATE SET
              value = excluded.value,
              updated_at = excluded.updated_at
            ",
            params![COLLECTION_SLOT, encoded],
        )
        .with_context(|| format!("write slot {COLLECTION_SLOT}"))?;
        tx.commit().with_context(|| format!("commit {action}"))?;
        Ok(true)
    }
}

impl CollectionStore for Store {
    fn list_all(&self) -> Result<Vec<CapturedEntry>> {
        self.load_collection()
    }

    fn add(&mut self, capture: &NewCapture) -> Result<bool> {
        let added = self.mutate_collection("add capture", |entries| {
            insert_unique(entries, capture)
        })?;
        if added {
            tracing::info!(id = %capture.id, name = %capture.name, nickname = %capture.nickname, "capture saved");
        } else {
            tracing::info!(nickname = %capture.nickname, "capture rejected: nickname taken");
        }
        Ok(added)
    }

    fn remove(&mut self, nickname: &str) -> Result<()> {
        let removed = self.mutate_collection("remove capture", |entries| {
            remove_exact(entries, nickname)
        })?;
        if removed {
            tracing::info!(nickname, "capture removed");
        } else {
            tracing::debug!(nickname, "remove skipped: nickname not in collection");
        }
        Ok(())
    }
}

fn decode_collection(raw: Option<String>) -> Result<Vec<CapturedEntry>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    serde_json::from_str(&raw).with_context(|| {
        format!("slot {COLLECTION_SLOT} does not hold a valid collection -- remove the slot or restore a backup")
    })
}

/// Per-user data directory for the database and log file. Created on demand.
pub fn data_dir() -> Result<PathBuf> {
    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set POKEDEX_DB_PATH to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir)
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("POKEDEX_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }
    Ok(data_dir()?.join("pokedex.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn validate_schema(conn: &Connection) -> Result<()> {
    let mut stmt = conn
        .prepare("PRAGMA table_info(slots)")
        .context("prepare slots column lookup")?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .context("query slots columns")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("read slots columns")?;

    for required in REQUIRED_SLOT_COLUMNS {
        if !columns.iter().any(|column| column == required) {
            bail!(
                "slots table is missing column {required} -- this database was not created by {APP_NAME}"
            );
        }
    }
    Ok(())
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}
