//! Store handle and lifecycle.

use std::fs::DirBuilder;
use std::path::Path;

use nestdb_storage::backends::RedbEngine;
use nestdb_storage::StorageEngine;
use tracing::{debug, info};

use crate::auto_commit::AutoCommit;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::session::Session;

/// A handle to one database file.
///
/// A store starts closed. [`Store::open`] acquires the file, after which
/// sessions can be started. Sessions borrow the store, so it cannot be
/// closed while one is alive.
///
/// # Example
///
/// ```ignore
/// use nestdb::{Config, Store};
///
/// let mut store = Store::new(Config::new("data/app.db"));
/// store.open()?;
///
/// let mut session = store.write_session()?;
/// session.write(&["settings"], "theme", b"dark")?;
/// session.close()?;
///
/// store.close();
/// ```
pub struct Store {
    config: Config,
    engine: Option<RedbEngine>,
}

impl Store {
    /// Create a closed store. Does no I/O.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config, engine: None }
    }

    /// Create an open store backed by memory only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the in-memory database cannot be created.
    pub fn in_memory() -> Result<Self> {
        let engine = RedbEngine::in_memory()?;
        Ok(Self { config: Config::default(), engine: Some(engine) })
    }

    /// The configuration this store was created with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Whether the store is open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.engine.is_some()
    }

    /// Open the database file, creating it and its parent directory if needed.
    ///
    /// Waits up to the configured request timeout for another handle to
    /// release the file. Does nothing if the store is already open.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an invalid configuration, [`Error::Io`]
    /// if the parent directory cannot be created, and [`Error::Storage`] if
    /// the database cannot be opened in time.
    pub fn open(&mut self) -> Result<()> {
        if self.engine.is_some() {
            return Ok(());
        }
        self.config.validate()?;

        let path = self.config.db_path.as_path();
        if let Some(parent) = path.parent() {
            create_parent(parent)?;
        }

        let engine = RedbEngine::open_with_config(path, self.config.engine_config())?;
        info!(db_path = %path.display(), "store opened");
        self.engine = Some(engine);
        Ok(())
    }

    /// Release the database file. Closing a closed store does nothing.
    pub fn close(&mut self) {
        if self.engine.take().is_some() {
            debug!(db_path = %self.config.db_path.display(), "store closed");
        }
    }

    /// Start a session over a read-only transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Closed`] if the store is not open.
    pub fn read_session(&self) -> Result<Session<'_>> {
        Ok(Session::new(self.engine()?.begin_read()?))
    }

    /// Start a session over a read-write transaction.
    ///
    /// Blocks while another write transaction is in progress.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Closed`] if the store is not open.
    pub fn write_session(&self) -> Result<Session<'_>> {
        Ok(Session::new(self.engine()?.begin_write()?))
    }

    /// A handle that runs every operation in its own transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Closed`] if the store is not open.
    pub fn auto_commit(&self) -> Result<AutoCommit<'_>> {
        Ok(AutoCommit::new(self.engine()?))
    }

    fn engine(&self) -> Result<&RedbEngine> {
        self.engine.as_ref().ok_or(Error::Closed)
    }
}

fn create_parent(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() || dir.is_dir() {
        return Ok(());
    }

    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir).map_err(|e| Error::io(dir, e))
}
