//! On-disk primitives for entity tables and the event log
//!
//! Tables are replaced whole: the snapshot is serialized in memory, written
//! to a sibling temp file, synced and renamed over the old table. The event
//! log only ever grows by complete lines: a failed append is cut back to the
//! length the file had before it, so a retry never duplicates or tears a line.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{TrailError, TrailResult};

fn table_error(table: &str, path: &Path, what: &str, e: impl std::fmt::Display) -> TrailError {
    TrailError::Storage(format!(
        "{} table at {}: {}: {}",
        table,
        path.display(),
        what,
        e
    ))
}

/// Read a table snapshot; a table never saved reads as empty
pub fn load_table<T>(table: &str, path: &Path) -> TrailResult<T>
where
    T: DeserializeOwned + Default,
{
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(table_error(table, path, "cannot read", e)),
    };

    serde_json::from_slice(&bytes).map_err(|e| table_error(table, path, "cannot parse", e))
}

/// Replace a table snapshot on disk
///
/// Readers see either the previous snapshot or the new one, never a mix.
pub fn store_table<T>(table: &str, path: &Path, snapshot: &T) -> TrailResult<()>
where
    T: Serialize,
{
    let bytes = serde_json::to_vec_pretty(snapshot)
        .map_err(|e| table_error(table, path, "cannot serialize", e))?;

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| table_error(table, path, "cannot create directory", e))?;
    }

    let staged = path.with_extension("json.tmp");
    let result = File::create(&staged)
        .and_then(|mut file| {
            file.write_all(&bytes)?;
            file.sync_all()
        })
        .and_then(|_| fs::rename(&staged, path));

    if let Err(e) = result {
        let _ = fs::remove_file(&staged);
        return Err(table_error(table, path, "cannot write", e));
    }
    Ok(())
}

/// Append one newline-terminated record to a log file, creating it if needed
///
/// Either the whole record is durably appended or the file is left exactly
/// as it was.
pub fn append_record(path: &Path, record: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)?;
    append_or_rewind(&mut file, record, |file| {
        file.flush()?;
        file.sync_data()
    })
}

/// Write `record`, run `finish`, and truncate back on any failure
fn append_or_rewind<F>(file: &mut File, record: &[u8], finish: F) -> io::Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let start = file.metadata()?.len();

    // A line torn by a crash must not swallow the next record
    let needs_separator = start > 0 && {
        let mut last = [0u8; 1];
        file.seek(SeekFrom::Start(start - 1))?;
        file.read_exact(&mut last)?;
        last[0] != b'\n'
    };

    let result = (|| {
        if needs_separator {
            file.write_all(b"\n")?;
        }
        file.write_all(record)?;
        finish(file)
    })();

    if let Err(e) = result {
        file.set_len(start)?;
        let _ = file.sync_data();
        return Err(e);
    }
    Ok(())
}
