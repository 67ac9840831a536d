//! Output file handling. The schematic is written to a sibling `.tmp` file
//! and renamed into place only once encoding has succeeded, so a failed run
//! never leaves a truncated `.schem` behind.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Run `write` against a buffered temporary file next to `path`, then move it
/// over `path`. On failure the temporary file is removed and `path` is left
/// untouched.
pub fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(BufWriter<File>) -> Result<BufWriter<File>>,
{
    let tmp = tmp_path(path);
    let result = write_and_sync(&tmp, write);
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
        return result;
    }
    fs::rename(&tmp, path)
        .with_context(|| format!("moving {} to {}", tmp.display(), path.display()))
}

fn write_and_sync<F>(tmp: &Path, write: F) -> Result<()>
where
    F: FnOnce(BufWriter<File>) -> Result<BufWriter<File>>,
{
    let file = File::create(tmp).with_context(|| format!("creating {}", tmp.display()))?;
    let mut writer = write(BufWriter::new(file))?;
    writer
        .flush()
        .with_context(|| format!("writing {}", tmp.display()))?;
    let file = writer
        .into_inner()
        .map_err(|e| e.into_error())
        .with_context(|| format!("writing {}", tmp.display()))?;
    file.sync_all()
        .with_context(|| format!("syncing {}", tmp.display()))?;
    Ok(())
}
