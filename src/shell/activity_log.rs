//! Activity log
//!
//! Appends timestamped lines to two files: one for values read and written,
//! one for connection events.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::Result;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only value and connection logs
pub struct ActivityLog {
    values: BufWriter<File>,
    connection: BufWriter<File>,
    values_path: PathBuf,
    connection_path: PathBuf,
}

fn open_append(path: &Path) -> Result<BufWriter<File>> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(BufWriter::new(file))
}

fn write_line(out: &mut BufWriter<File>, at: DateTime<Local>, text: &str) -> Result<()> {
    writeln!(out, "{} {}", at.format(TIMESTAMP_FORMAT), text)?;
    out.flush()?;
    Ok(())
}

impl ActivityLog {
    /// Open (or create) both log files for appending
    pub fn open(values_path: impl Into<PathBuf>, connection_path: impl Into<PathBuf>) -> Result<Self> {
        let values_path = values_path.into();
        let connection_path = connection_path.into();
        Ok(Self {
            values: open_append(&values_path)?,
            connection: open_append(&connection_path)?,
            values_path,
            connection_path,
        })
    }

    pub fn values_path(&self) -> &Path {
        &self.values_path
    }

    pub fn connection_path(&self) -> &Path {
        &self.connection_path
    }

    // -------------------------------------------------------------------------
    // Connection log
    // -------------------------------------------------------------------------

    pub fn connected(&mut self, addr: &str, identity: &str) -> Result<()> {
        let text = format!("Connected to {} ({})", addr, identity);
        write_line(&mut self.connection, Local::now(), &text)
    }

    pub fn disconnected(&mut self, addr: &str) -> Result<()> {
        let text = format!("Disconnected from {}", addr);
        write_line(&mut self.connection, Local::now(), &text)
    }

    pub fn manual_keep_alive(&mut self) -> Result<()> {
        write_line(&mut self.connection, Local::now(), "Manual keep-alive sent")
    }

    pub fn automatic_keep_alive(&mut self, at: DateTime<Local>) -> Result<()> {
        write_line(&mut self.connection, at, "Automatic keep-alive sent")
    }

    pub fn failure(&mut self, at: DateTime<Local>, what: &str, error: &str) -> Result<()> {
        let text = format!("{} failed: {}", what, error);
        write_line(&mut self.connection, at, &text)
    }

    // -------------------------------------------------------------------------
    // Value log
    // -------------------------------------------------------------------------

    pub fn value_read(&mut self, at: DateTime<Local>, name: &str, value: &str) -> Result<()> {
        let text = format!("Read {} = {}", name, value);
        write_line(&mut self.values, at, &text)
    }

    pub fn value_written(&mut self, name: &str, requested: &str, echoed: &str) -> Result<()> {
        let text = format!("Wrote {} = {} (controller reports {})", name, requested, echoed);
        write_line(&mut self.values, Local::now(), &text)
    }
}
