//! SQLite-backed document store shared by credentials, events, blobs and tasks.
//!
//! One database file holds every collection the gateway touches. The handle is
//! cheap to clone; all clones share a single connection behind a `Mutex`, so the
//! store itself provides the concurrency control between requests.

use anyhow::{anyhow, Context, Result};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;


/// Handle to the gateway's document database.
#[derive(Clone)]
pub struct DocumentStore {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
}

impl DocumentStore {
    /// Resolves the database file for a store address and database name.
    ///
    /// The store address is a data directory; the database name is the file stem.
    pub fn locate(store_addr: &str, db_name: &str) -> PathBuf {
        Path::new(store_addr).join(format!("{}.db", db_name))
    }

    /// Opens (or creates) the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open document store at {}", path.display()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        })
    }

    /// Opens the store and checks it is reachable, giving up after `timeout`.
    ///
    /// Opening happens on a blocking thread so a stalled filesystem cannot wedge
    /// the runtime during startup.
    pub async fn connect(store_addr: &str, db_name: &str, timeout: Duration) -> Result<Self> {
        let path = Self::locate(store_addr, db_name);
        info!(path = %path.display(), "Connecting to document store");

        let task = tokio::task::spawn_blocking(move || -> Result<Self> {
            let store = Self::open(&path)?;
            store.blocking(|conn| {
                conn.busy_timeout(timeout)
                    .context("Failed to set busy timeout")?;
                Ok(())
            })?;
            store.ping()?;
            Ok(store)
        });

        match tokio::time::timeout(timeout, task).await {
            Ok(joined) => joined.context("Document store connect task failed")?,
            Err(_) => Err(anyhow!(
                "Timed out after {:?} connecting to document store",
                timeout
            )),
        }
    }

    /// Path of the underlying database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reachability check.
    pub fn ping(&self) -> Result<()> {
        self.blocking(|conn| {
            let one: i64 = conn
                .query_row("SELECT 1", [], |row| row.get(0))
                .context("Document store ping failed")?;
            if one != 1 {
                return Err(anyhow!("Document store ping returned {}", one));
            }
            Ok(())
        })
    }

    /// Runs `f` against the connection on the current thread.
    ///
    /// Only for startup and schema setup. Request paths use [`DocumentStore::run`].
    pub fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("Document store connection lock poisoned"))?;
        f(&conn)
    }

    /// Runs `f` against the connection on tokio's blocking pool.
    pub async fn run<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.blocking(f))
            .await
            .context("Document store task failed")?
    }
}
