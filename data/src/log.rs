use std::path::PathBuf;
use std::{fs, io};

use crate::data_path;

const LOG_FILE: &str = "bandscope-current.log";
const PREVIOUS_LOG_FILE: &str = "bandscope-previous.log";

pub fn path() -> Result<PathBuf, Error> {
    let full_path = data_path(Some(LOG_FILE));

    let parent = full_path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Invalid log file path"))?;

    if !parent.exists() {
        fs::create_dir_all(parent)?;
    }

    Ok(full_path)
}

/// Moves the current log aside so each run starts with an empty file.
pub fn rotate(log_path: &PathBuf) -> Result<(), Error> {
    let fallback = PathBuf::from(".");
    let dir = log_path.parent().unwrap_or(&fallback);

    let previous = dir.join(PREVIOUS_LOG_FILE);

    if previous.exists() {
        fs::remove_file(&previous)?;
    }
    if log_path.exists() {
        fs::rename(log_path, &previous)?;
    }

    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    SetLog(#[from] log::SetLoggerError),
    #[error(transparent)]
    ParseLevel(#[from] log::ParseLevelError),
}
