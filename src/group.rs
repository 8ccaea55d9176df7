use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use crate::error::SplitError;
use crate::names::UNKNOWN;
use crate::output::ensure_dir;

static OUTPUT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\s+(.*?)\.(?i:pdf)$").unwrap());

/// Result of one grouping pass.
#[derive(Debug, Default)]
pub struct GroupSummary {
    pub folders: usize,
    pub files: Vec<PathBuf>,
    pub failures: Vec<(String, String)>,
}

/// Formatted name encoded in a `NNN <name>.pdf` output filename.
pub fn parse_output_name(filename: &str) -> Option<String> {
    let caps = OUTPUT_NAME_RE.captures(filename)?;
    let name = caps[1].trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Folder name -> files that belong in it. `unknown` pages are left out.
pub fn plan<I, S>(filenames: I) -> BTreeMap<String, Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for filename in filenames {
        let filename = filename.as_ref();
        let Some(name) = parse_output_name(filename) else {
            continue;
        };
        // "." and ".." would escape the organized directory.
        if name.eq_ignore_ascii_case(UNKNOWN) || !name.chars().any(char::is_alphanumeric) {
            continue;
        }
        groups.entry(name).or_default().push(filename.to_string());
    }
    for files in groups.values_mut() {
        files.sort();
    }
    groups
}

/// Copy every named page in `pages_dir` into a per-person folder under `organized_dir`.
pub fn organize(pages_dir: &Path, organized_dir: &Path) -> Result<GroupSummary, SplitError> {
    let read_err = |source| SplitError::Read {
        path: pages_dir.to_path_buf(),
        source,
    };
    let mut filenames = Vec::new();
    for entry in fs::read_dir(pages_dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            filenames.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    organize_files(pages_dir, &filenames, organized_dir)
}

/// Copy the listed files of `pages_dir` into per-person folders. Anything else
/// in `pages_dir` is left alone.
///
/// Files keep their numbered name, so repeated certificates for one person sit side by side.
pub fn organize_files<S: AsRef<str>>(
    pages_dir: &Path,
    filenames: &[S],
    organized_dir: &Path,
) -> Result<GroupSummary, SplitError> {
    ensure_dir(organized_dir)?;
    let groups = plan(filenames);
    let mut summary = GroupSummary::default();

    for (name, files) in &groups {
        let folder = organized_dir.join(name);
        if let Err(e) = ensure_dir(&folder) {
            warn!(folder = %name, error = %e, "skipping folder");
            summary.failures.push((name.clone(), e.to_string()));
            continue;
        }
        summary.folders += 1;

        for file in files {
            let dest = folder.join(file);
            match fs::copy(pages_dir.join(file), &dest) {
                Ok(_) => summary.files.push(dest),
                Err(e) => {
                    warn!(file = %file, error = %e, "copy failed");
                    summary.failures.push((file.clone(), e.to_string()));
                }
            }
        }
    }

    info!(
        folders = summary.folders,
        files = summary.files.len(),
        "organized pages into folders"
    );
    Ok(summary)
}
