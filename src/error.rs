use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SplitError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("not a readable PDF: {0}")]
    Parse(#[source] lopdf::Error),
    #[error("document has no pages")]
    NoPages,
    #[error("page {page}: text extraction failed: {source}")]
    Text { page: u32, source: lopdf::Error },
    #[error("page {page}: could not build single-page document: {source}")]
    Split { page: u32, source: lopdf::Error },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}
