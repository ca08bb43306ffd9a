use std::io;
use std::io::Write as _;
use std::path::Path;

use anyhow::Context;
use tempfile::NamedTempFile;

/// Replace `path` with `contents` via a temp file in the same directory and a rename, so readers
/// never observe a half-written file. Missing parent directories are created.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Err(io::Error::other(format!(
            "invalid path for atomic write: {}",
            path.display()
        )));
    };
    std::fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(contents)?;
    if !contents.ends_with(b"\n") {
        tmp.write_all(b"\n")?;
    }
    tmp.flush()?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

pub fn write_atomic_text(path: &Path, contents: &str) -> anyhow::Result<()> {
    write_atomic(path, contents.as_bytes())
        .with_context(|| format!("persist file to {}", path.display()))
}
