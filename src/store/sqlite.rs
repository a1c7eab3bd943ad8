use super::{RemoteStore, Snapshot, merge_document, queries};
use crate::identity::UserHandle;
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create DB directory: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite DB: {}", path.display()))?;

        let store = Self { conn };
        store.init_schema()?;

        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory SQLite DB")?;

        let store = Self { conn };
        store.init_schema()?;

        Ok(store)
    }

    pub fn init_schema(&self) -> Result<()> {
        queries::schema_statements()
            .iter()
            .try_for_each(|statement| {
                self.conn
                    .execute(statement, [])
                    .context("Failed to initialize schema")
                    .map(|_| ())
            })
    }

    pub fn read_document(&self, uid: &str) -> Result<Option<Value>> {
        read_document(&self.conn, uid)
    }
}

impl RemoteStore for SqliteStore {
    fn read(&self, user: &UserHandle) -> Result<Option<Snapshot>> {
        self.read_document(&user.uid)?
            .map(Snapshot::from_document)
            .transpose()
    }

    fn write(&self, user: &UserHandle, snapshot: &Snapshot) -> Result<()> {
        let transaction = self
            .conn
            .unchecked_transaction()
            .context("Failed to start transaction")?;

        let existing = read_document(&transaction, &user.uid)?;
        let merged = merge_document(existing, snapshot)?;
        let body = serde_json::to_string(&merged).context("Failed to serialize document")?;

        transaction
            .execute(
                queries::UPSERT_DOCUMENT,
                params![&user.uid, body, Utc::now().timestamp()],
            )
            .context("Failed to upsert document")?;

        transaction
            .commit()
            .context("Failed to commit document")?;

        debug!(user = %user.uid, "snapshot written to sqlite store");
        Ok(())
    }
}

fn read_document(conn: &Connection, uid: &str) -> Result<Option<Value>> {
    let body: Option<String> = conn
        .query_row(queries::SELECT_DOCUMENT, params![uid], |row| row.get(0))
        .optional()
        .context("Failed to query document")?;

    body.map(|raw| {
        serde_json::from_str(&raw).with_context(|| format!("Corrupted document for user: {uid}"))
    })
    .transpose()
}
