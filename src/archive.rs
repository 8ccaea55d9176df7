use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::SplitError;

/// ZIP archive bytes from `(entry name, contents)` pairs.
pub fn pack(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>, SplitError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, bytes) in entries {
        writer.start_file(name.as_str(), options)?;
        writer.write_all(bytes).map_err(ZipError::from)?;
    }
    let cursor = writer.finish()?;
    debug!(entries = entries.len(), "packed archive");
    Ok(cursor.into_inner())
}

/// Archive `files`, naming each entry by its path relative to `root`.
pub fn pack_files(root: &Path, files: &[PathBuf]) -> Result<Vec<u8>, SplitError> {
    let mut entries = Vec::with_capacity(files.len());
    for file in files {
        let bytes = fs::read(file).map_err(|source| SplitError::Read {
            path: file.clone(),
            source,
        })?;
        entries.push((entry_name(root, file), bytes));
    }
    pack(&entries)
}

fn entry_name(root: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_keep_folder_relative_names() {
        let root = tempfile::tempdir().unwrap();
        let folder = root.path().join("Cruz, Juan");
        fs::create_dir(&folder).unwrap();
        let file = folder.join("001 Cruz, Juan.pdf");
        fs::write(&file, b"%PDF-1.5").unwrap();

        let bytes = pack_files(root.path(), &[file]).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 1);
        assert_eq!(
            archive.by_index(0).unwrap().name(),
            "Cruz, Juan/001 Cruz, Juan.pdf"
        );
    }

    #[test]
    fn missing_file_is_reported() {
        let root = tempfile::tempdir().unwrap();
        let err = pack_files(root.path(), &[root.path().join("gone.pdf")]).err();
        assert!(matches!(err, Some(SplitError::Read { .. })));
    }
}
