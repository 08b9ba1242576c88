//! SQLite implementation of the XFieldStore trait.
//!
//! This is the primary storage backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use fedchain_core::{
    BlockHash, BlockHeader, Decode, Encode, Hash256, XFieldChange, XFieldChangeList, XFieldType,
};

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::{AppendResult, XFieldStore};

const GENESIS_KEY: &str = "genesis";

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Execute a blocking operation on the connection.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(lock_error)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| {
            StoreError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
                Some(format!("spawn_blocking failed: {}", e)),
            ))
        })?
    }
}

fn lock_error<T>(e: PoisonError<T>) -> StoreError {
    StoreError::Database(rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
        Some(format!("mutex poisoned: {}", e)),
    ))
}

fn xfield_type_from_column(db_key: u8) -> Result<XFieldType> {
    XFieldType::from_db_key(db_key)
        .ok_or_else(|| StoreError::InvalidData(format!("unknown xfield db key {}", db_key)))
}

fn hash_from_column(bytes: Vec<u8>) -> Result<BlockHash> {
    let arr: [u8; 32] = bytes
        .try_into()
        .map_err(|b: Vec<u8>| StoreError::InvalidData(format!("block hash of {} bytes", b.len())))?;
    Ok(Hash256::from_bytes(arr))
}

/// Decode a stored change and check it against its indexed columns.
fn row_to_change(ty: XFieldType, change_bytes: &[u8], height: u32, block_hash: Vec<u8>) -> Result<XFieldChange> {
    let change = XFieldChange::from_bytes_as(ty, change_bytes)?;
    let block_hash = hash_from_column(block_hash)?;
    if change.height != height || change.block_hash != block_hash {
        return Err(StoreError::InvalidData(format!(
            "xfield change row for block {} does not match its encoding",
            block_hash
        )));
    }
    Ok(change)
}

fn insert_change(conn: &Connection, change: &XFieldChange, now: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO xfield_changes (db_key, block_hash, height, change_bytes, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            change.xfield_type().db_key(),
            change.block_hash.as_bytes().as_slice(),
            change.height,
            change.encode(),
            now,
        ],
    )?;
    Ok(())
}

#[async_trait]
impl XFieldStore for SqliteStore {
    async fn put_genesis(&self, genesis: &BlockHeader) -> Result<()> {
        let bytes = genesis.encode();

        self.run(move |conn| {
            let existing: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT value FROM chain_meta WHERE key = ?1",
                    params![GENESIS_KEY],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(existing) = existing {
                if existing == bytes {
                    return Ok(());
                }
                let existing = BlockHeader::from_bytes(&existing)?;
                return Err(StoreError::Conflict {
                    what: "genesis".into(),
                    existing: existing.block_hash().to_string(),
                });
            }

            conn.execute(
                "INSERT INTO chain_meta (key, value, updated_at) VALUES (?1, ?2, ?3)",
                params![GENESIS_KEY, bytes, now_millis()],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_genesis(&self) -> Result<Option<BlockHeader>> {
        self.run(|conn| {
            let bytes: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT value FROM chain_meta WHERE key = ?1",
                    params![GENESIS_KEY],
                    |row| row.get(0),
                )
                .optional()?;

            match bytes {
                Some(bytes) => Ok(Some(BlockHeader::from_bytes(&bytes)?)),
                None => Ok(None),
            }
        })
        .await
    }

    async fn append_change(&self, change: &XFieldChange) -> Result<AppendResult> {
        let change = change.clone();

        self.run(move |conn| {
            let ty = change.xfield_type();
            let existing: Option<(Vec<u8>, u32, Vec<u8>)> = conn
                .query_row(
                    "SELECT change_bytes, height, block_hash FROM xfield_changes
                     WHERE db_key = ?1 AND block_hash = ?2",
                    params![ty.db_key(), change.block_hash.as_bytes().as_slice()],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()?;

            if let Some((bytes, height, hash)) = existing {
                let existing = row_to_change(ty, &bytes, height, hash)?;
                if existing == change {
                    return Ok(AppendResult::AlreadyExists);
                }
                return Err(StoreError::Conflict {
                    what: format!("xfield {} in block {}", ty, change.block_hash),
                    existing: existing.value.to_string(),
                });
            }

            insert_change(conn, &change, now_millis())?;
            debug!(xfield_type = %ty, height = change.height, block = %change.block_hash, "recorded xfield change");
            Ok(AppendResult::Appended)
        })
        .await
    }

    async fn read_change_list(&self, xfield_type: XFieldType) -> Result<XFieldChangeList> {
        self.run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT change_bytes, height, block_hash FROM xfield_changes
                 WHERE db_key = ?1
                 ORDER BY height ASC, rowid ASC",
            )?;

            let rows = stmt
                .query_map(params![xfield_type.db_key()], |row| {
                    Ok((
                        row.get::<_, Vec<u8>>(0)?,
                        row.get::<_, u32>(1)?,
                        row.get::<_, Vec<u8>>(2)?,
                    ))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let mut list = XFieldChangeList::new(xfield_type);
            for (bytes, height, hash) in rows {
                list.changes.push(row_to_change(xfield_type, &bytes, height, hash)?);
            }
            Ok(list)
        })
        .await
    }

    async fn write_change_list(&self, list: &XFieldChangeList) -> Result<()> {
        let list = list.clone();

        self.run(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM xfield_changes WHERE db_key = ?1",
                params![list.xfield_type.db_key()],
            )?;

            let now = now_millis();
            for change in &list.changes {
                if change.xfield_type() != list.xfield_type {
                    return Err(StoreError::InvalidData(format!(
                        "xfield {} change in list of type {}",
                        change.xfield_type(),
                        list.xfield_type
                    )));
                }
                insert_change(&tx, change, now)?;
            }

            tx.commit()?;
            debug!(xfield_type = %list.xfield_type, count = list.changes.len(), "wrote xfield change list");
            Ok(())
        })
        .await
    }

    async fn remove_changes_for_block(&self, block_hash: &BlockHash) -> Result<Vec<XFieldChange>> {
        let block_hash = *block_hash;

        self.run(move |conn| {
            let tx = conn.transaction()?;

            let rows = {
                let mut stmt = tx.prepare(
                    "SELECT db_key, change_bytes, height, block_hash FROM xfield_changes
                     WHERE block_hash = ?1
                     ORDER BY db_key ASC",
                )?;
                let rows = stmt
                    .query_map(params![block_hash.as_bytes().as_slice()], |row| {
                        Ok((
                            row.get::<_, u8>(0)?,
                            row.get::<_, Vec<u8>>(1)?,
                            row.get::<_, u32>(2)?,
                            row.get::<_, Vec<u8>>(3)?,
                        ))
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            };

            let mut removed = Vec::with_capacity(rows.len());
            for (db_key, bytes, height, hash) in rows {
                let ty = xfield_type_from_column(db_key)?;
                removed.push(row_to_change(ty, &bytes, height, hash)?);
            }

            tx.execute(
                "DELETE FROM xfield_changes WHERE block_hash = ?1",
                params![block_hash.as_bytes().as_slice()],
            )?;
            tx.commit()?;

            if !removed.is_empty() {
                debug!(block = %block_hash, count = removed.len(), "removed xfield changes");
            }
            Ok(removed)
        })
        .await
    }
}
