//! Test utilities for yarder
//!
//! Shared fixtures for the unit test modules.

#![cfg(test)]

use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

/// Creates a temporary directory that is automatically cleaned up
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Appends `lines` to `path`, one per line, flushing after each write
pub fn append_lines(path: &Path, lines: &[&str]) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    for line in lines {
        writeln!(file, "{}", line)?;
        file.flush()?;
    }
    Ok(())
}
