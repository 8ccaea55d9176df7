use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SplitError;

/// `007 Dela Cruz, Juan.pdf`
pub fn page_filename(index: u32, formatted: &str) -> String {
    format!("{:03} {}.pdf", index, formatted)
}

pub fn ensure_dir(dir: &Path) -> Result<(), SplitError> {
    fs::create_dir_all(dir).map_err(|source| SplitError::Write {
        path: dir.to_path_buf(),
        source,
    })
}

/// Write through a sibling temp file and rename, so `dest` is either absent or complete.
pub fn write_atomic(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf, SplitError> {
    let dest = dir.join(name);
    let tmp = dir.join(format!(".{}.part", name));
    let write_err = |source| SplitError::Write {
        path: dest.clone(),
        source,
    };

    fs::write(&tmp, bytes).map_err(write_err)?;
    if let Err(source) = fs::rename(&tmp, &dest) {
        let _ = fs::remove_file(&tmp);
        return Err(write_err(source));
    }
    Ok(dest)
}
