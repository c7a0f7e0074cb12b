//! Database connection management
//!
//! Provides lazy initialization and caching of embedded-database connections,
//! one live handle per database file path. The engine only behaves correctly
//! with a single writer connection per file, so every component that needs a
//! handle for a path must go through the same [`ConnectionCache`].

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rusqlite::{Connection, OpenFlags};

use crate::error::{Result, StorageError};

/// The handle handed out to callers. `rusqlite::Connection` is not `Sync`,
/// so access is serialized behind a mutex.
pub type SharedConnection = Arc<Mutex<Connection>>;

#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionOptions {
    /// Open an in-memory database instead of the file at the path. The cache
    /// is still keyed by the path, so test harnesses keep the
    /// one-handle-per-path behavior without touching the disk.
    pub in_memory: bool,
}

/// Registry of live database connections, keyed by file path.
///
/// Owned explicitly by whoever wires up the resource clients and passed by
/// reference to components that need database access; there is no ambient
/// singleton.
#[derive(Debug, Default)]
pub struct ConnectionCache {
    connections: DashMap<PathBuf, SharedConnection>,
}

impl ConnectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached handle for `path`, creating and configuring a fresh
    /// connection on first request. Concurrent callers for the same path all
    /// receive the same handle.
    pub fn open(&self, path: impl AsRef<Path>, options: ConnectionOptions) -> Result<SharedConnection> {
        let path = path.as_ref().to_path_buf();
        // The entry guard holds the map shard while the connection is being
        // created, so a racing open for the same path waits instead of
        // opening a second handle.
        match self.connections.entry(path.clone()) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let conn = create_connection(&path, options)?;
                let handle = Arc::new(Mutex::new(conn));
                entry.insert(Arc::clone(&handle));
                tracing::debug!("Opened database connection: {}", path.display());
                Ok(handle)
            }
        }
    }

    /// Evict and close the handle for `path`; no-op for an unknown path.
    /// A subsequent [`ConnectionCache::open`] creates a fresh connection.
    pub fn close(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some((path, handle)) = self.connections.remove(path.as_ref()) {
            close_handle(&path, handle)?;
        }
        Ok(())
    }

    /// Evict and close every cached handle, allowing graceful shutdown.
    pub fn close_all(&self) -> Result<()> {
        let paths: Vec<PathBuf> = self
            .connections
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        for path in paths {
            self.close(&path)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

fn create_connection(path: &Path, options: ConnectionOptions) -> Result<Connection> {
    let mut flags = OpenFlags::default();
    if options.in_memory {
        flags |= OpenFlags::SQLITE_OPEN_MEMORY;
    }

    let conn = Connection::open_with_flags(path, flags).map_err(|e| open_error(path, e))?;

    // Enable WAL mode for better concurrent access
    conn.pragma_update(None, "journal_mode", WAL)
        .map_err(|e| configure_error(path, e))?;

    // Enable foreign key constraints
    conn.pragma_update(None, "foreign_keys", ON)
        .map_err(|e| configure_error(path, e))?;

    Ok(conn)
}

fn open_error(path: &Path, e: rusqlite::Error) -> StorageError {
    // The driver reports a missing parent directory only through this
    // message, there is no structured code for it.
    if e.to_string().contains("unable to open database file") {
        StorageError::NotFound(format!("database directory for {}", path.display()))
    } else {
        StorageError::Other(
            anyhow::Error::new(e).context(format!("opening database {}", path.display())),
        )
    }
}

fn configure_error(path: &Path, e: rusqlite::Error) -> StorageError {
    StorageError::Other(
        anyhow::Error::new(e).context(format!("configuring database {}", path.display())),
    )
}

fn close_handle(path: &Path, handle: SharedConnection) -> Result<()> {
    match Arc::try_unwrap(handle) {
        Ok(mutex) => {
            let conn = mutex
                .into_inner()
                .map_err(|_| StorageError::Other(anyhow!("Poisoned lock")))?;
            conn.close().map_err(|(_, e)| StorageError::Database(e))?;
            tracing::debug!("Closed database connection: {}", path.display());
        }
        Err(_) => {
            // Callers still hold clones; the connection closes when the last
            // clone drops. It is already gone from the cache either way.
            tracing::debug!(
                "Evicted database connection still in use: {}",
                path.display()
            );
        }
    }
    Ok(())
}

// SQL pragma constants
const WAL: &str = "WAL";
const ON: &str = "ON";
