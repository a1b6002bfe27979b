//! JSON persistence of wizard sessions
//!
//! The engine keeps progress in memory only. These helpers are for callers,
//! such as the CLI, that choose to carry a session across processes.

use crate::services::facade::SessionState;
use std::fs;
use std::io::{Error, ErrorKind, Result};
use std::path::Path;

/// Load a saved session, `None` if the file does not exist.
pub fn read_session(path: &Path) -> Result<Option<SessionState>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    let state = serde_json::from_str(&text).map_err(|e| Error::new(ErrorKind::InvalidData, e))?;
    Ok(Some(state))
}

pub fn write_session(path: &Path, state: &SessionState) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(state).map_err(Error::other)?;
    fs::write(path, json + "\n")
}
