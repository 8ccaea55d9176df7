use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::SplitError;
use crate::names::{self, Resolved};
use crate::output::{ensure_dir, page_filename, write_atomic};
use crate::pdf::SourcePdf;

#[derive(Debug, Clone, Serialize)]
pub struct PageRecord {
    pub page: u32,
    pub filename: String,
    #[serde(flatten)]
    pub resolved: Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Text,
    Split,
    Write,
}

#[derive(Debug)]
pub struct PageFailure {
    pub page: u32,
    pub stage: Stage,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub total_pages: usize,
    pub found: usize,
    pub unknown: usize,
    pub pages: Vec<PageRecord>,
    pub written: Vec<PathBuf>,
    pub failures: Vec<PageFailure>,
}

impl BatchReport {
    /// Filenames written by this run, in page order.
    pub fn written_names(&self) -> Vec<String> {
        self.written
            .iter()
            .filter_map(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect()
    }

    pub fn print(&self) {
        println!(
            "Processed {} pages: {} named, {} unknown, {} written, {} failed.",
            self.total_pages,
            self.found,
            self.unknown,
            self.written.len(),
            self.failures.len(),
        );
        for f in &self.failures {
            println!("  page {:03} ({:?}): {}", f.page, f.stage, f.message);
        }
    }
}

/// Text of every page in order. Pages whose text cannot be read get empty
/// text (and so resolve to `unknown`) instead of being dropped.
pub fn read_texts(source: &SourcePdf, report: &mut BatchReport) -> Vec<(u32, String)> {
    source
        .page_numbers()
        .map(|page| match source.page_text(page) {
            Ok(text) => (page, text),
            Err(e) => {
                warn!(page, error = %e, "text extraction failed, page will be named unknown");
                report.failures.push(PageFailure {
                    page,
                    stage: Stage::Text,
                    message: e.to_string(),
                });
                (page, String::new())
            }
        })
        .collect()
}

pub fn resolve_page(page: u32, text: &str) -> PageRecord {
    let resolved = names::resolve(text);
    PageRecord {
        page,
        filename: page_filename(page, &resolved.formatted),
        resolved,
    }
}

#[cfg(feature = "rayon")]
fn resolve_chunk(chunk: &[(u32, String)]) -> Vec<PageRecord> {
    use rayon::prelude::*;

    chunk
        .par_iter()
        .map(|(page, text)| resolve_page(*page, text))
        .collect()
}

#[cfg(not(feature = "rayon"))]
fn resolve_chunk(chunk: &[(u32, String)]) -> Vec<PageRecord> {
    chunk
        .iter()
        .map(|(page, text)| resolve_page(*page, text))
        .collect()
}

/// Resolve names for all pages; output order matches input order.
pub fn resolve_all(texts: &[(u32, String)], chunk_size: usize) -> Vec<PageRecord> {
    let mut records = Vec::with_capacity(texts.len());
    for chunk in texts.chunks(chunk_size.max(1)) {
        records.extend(resolve_chunk(chunk));
    }
    records
}

/// Split out and write each page. A failing page is recorded and skipped.
pub fn write_pages(
    source: &SourcePdf,
    records: &[PageRecord],
    pages_dir: &Path,
    progress: &ProgressBar,
    report: &mut BatchReport,
) {
    for record in records {
        progress.set_message(record.filename.clone());
        let written = source
            .split_page(record.page)
            .and_then(|bytes| write_atomic(pages_dir, &record.filename, &bytes));

        match written {
            Ok(path) => {
                match &record.resolved.candidate {
                    Some(name) if record.resolved.found => {
                        info!(page = record.page, name = %name, "extracted name")
                    }
                    _ => info!(page = record.page, "no name found, using generic filename"),
                }
                report.written.push(path);
            }
            Err(e) => {
                let stage = match e {
                    SplitError::Split { .. } => Stage::Split,
                    _ => Stage::Write,
                };
                warn!(page = record.page, error = %e, "skipping page");
                report.failures.push(PageFailure {
                    page: record.page,
                    stage,
                    message: e.to_string(),
                });
            }
        }
        progress.inc(1);
    }
}

/// Full batch: read text, resolve names, write one PDF per page into `pages_dir`.
///
/// Only directory creation can fail the whole batch; page-level problems end
/// up in the report.
pub fn run(
    source: &SourcePdf,
    pages_dir: &Path,
    chunk_size: usize,
    progress: &ProgressBar,
) -> Result<BatchReport, SplitError> {
    ensure_dir(pages_dir)?;
    let mut report = BatchReport {
        total_pages: source.page_count(),
        ..Default::default()
    };

    let texts = read_texts(source, &mut report);
    let records = resolve_all(&texts, chunk_size);
    report.found = records.iter().filter(|r| r.resolved.found).count();
    report.unknown = records.len() - report.found;

    write_pages(source, &records, pages_dir, progress, &mut report);
    report.pages = records;
    Ok(report)
}
