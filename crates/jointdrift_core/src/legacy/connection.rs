//! Single-connection access to a legacy export database file.
//!
//! # Responsibility
//! - Own at most one open, read-only connection to the legacy store.
//! - Release every partially opened resource on failure.
//!
//! # Invariants
//! - `open` never replaces an open connection; it fails without I/O.
//! - A failed `open` leaves the provider disconnected.
//! - `close` on a disconnected provider is a successful no-op.

use log::{error, info, warn};
use rusqlite::{Connection, OpenFlags};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Instant;

pub type ConnectionResult<T> = Result<T, ConnectionError>;

/// Lifecycle failures of the legacy store connection.
#[derive(Debug)]
pub enum ConnectionError {
    /// `open` was called while another file is still open.
    AlreadyOpen { open_path: PathBuf, requested: PathBuf },
    /// A read was attempted without an open connection.
    NotOpen,
    /// The file could not be opened or is not a readable database.
    Open { path: PathBuf, source: rusqlite::Error },
    /// The connection reported an error while closing.
    Close { path: PathBuf, source: rusqlite::Error },
}

impl Display for ConnectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyOpen {
                open_path,
                requested,
            } => write!(
                f,
                "a legacy connection to `{}` is already open; close it before opening `{}`",
                open_path.display(),
                requested.display()
            ),
            Self::NotOpen => write!(f, "legacy database connection is not open"),
            Self::Open { path, source } => {
                write!(f, "failed to open legacy database `{}`: {source}", path.display())
            }
            Self::Close { path, source } => {
                write!(f, "failed to close legacy database `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ConnectionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } | Self::Close { source, .. } => Some(source),
            Self::AlreadyOpen { .. } | Self::NotOpen => None,
        }
    }
}

struct ActiveConnection {
    path: PathBuf,
    conn: Connection,
}

/// Owner of the one legacy store connection a session may hold.
#[derive(Default)]
pub struct LegacyConnectionProvider {
    active: Option<ActiveConnection>,
}

impl LegacyConnectionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.active.is_some()
    }

    /// Opens `path` read-only.
    ///
    /// # Errors
    /// - `AlreadyOpen` when a connection exists; the existing one is kept.
    /// - `Open` when the file is missing or is not a database.
    pub fn open(&mut self, path: impl AsRef<Path>) -> ConnectionResult<()> {
        let requested = path.as_ref().to_path_buf();
        if let Some(active) = &self.active {
            warn!(
                "event=legacy_open module=legacy status=rejected reason=already_open open_path={} requested={}",
                active.path.display(),
                requested.display()
            );
            return Err(ConnectionError::AlreadyOpen {
                open_path: active.path.clone(),
                requested,
            });
        }

        let started_at = Instant::now();
        info!(
            "event=legacy_open module=legacy status=start path={}",
            requested.display()
        );

        match open_read_only(&requested) {
            Ok(conn) => {
                info!(
                    "event=legacy_open module=legacy status=ok path={} duration_ms={}",
                    requested.display(),
                    started_at.elapsed().as_millis()
                );
                self.active = Some(ActiveConnection {
                    path: requested,
                    conn,
                });
                Ok(())
            }
            Err(source) => {
                error!(
                    "event=legacy_open module=legacy status=error path={} duration_ms={} error={}",
                    requested.display(),
                    started_at.elapsed().as_millis(),
                    source
                );
                Err(ConnectionError::Open {
                    path: requested,
                    source,
                })
            }
        }
    }

    /// Closes the open connection, if any.
    ///
    /// The provider is disconnected afterwards even when closing reports an
    /// error.
    pub fn close(&mut self) -> ConnectionResult<()> {
        let Some(active) = self.active.take() else {
            return Ok(());
        };

        match active.conn.close() {
            Ok(()) => {
                info!(
                    "event=legacy_close module=legacy status=ok path={}",
                    active.path.display()
                );
                Ok(())
            }
            Err((conn, source)) => {
                drop(conn);
                error!(
                    "event=legacy_close module=legacy status=error path={} error={}",
                    active.path.display(),
                    source
                );
                Err(ConnectionError::Close {
                    path: active.path,
                    source,
                })
            }
        }
    }

    /// Borrows the open connection.
    pub fn current_connection(&self) -> Option<&Connection> {
        self.active.as_ref().map(|active| &active.conn)
    }

    /// Path of the open file.
    pub fn current_path(&self) -> Option<&Path> {
        self.active.as_ref().map(|active| active.path.as_path())
    }

    pub(crate) fn require_connection(&self) -> ConnectionResult<&Connection> {
        self.current_connection().ok_or(ConnectionError::NotOpen)
    }
}

fn open_read_only(path: &Path) -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    // SQLite defers reading the header until the first statement.
    conn.query_row("SELECT count(*) FROM sqlite_master;", [], |row| {
        row.get::<_, i64>(0)
    })?;
    Ok(conn)
}
