use rusqlite::Connection;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Opens the ticket database, creating its parent directory. Tables are
/// only created by `setup`.
pub fn conn(database_path: &Path) -> Result<Connection> {
    if let Some(parent) = database_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(Connection::open(database_path)?)
}
