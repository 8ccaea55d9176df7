pub mod extract;
pub mod format;

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub use extract::Strategy;

/// Placeholder used wherever no usable name could be resolved.
pub const UNKNOWN: &str = "unknown";

/// Surname-linking tokens (lowercase). These never stand alone as a surname.
pub const NAME_PREFIXES: &[&str] = &[
    "de", "del", "dela", "della", "des", "di", "du", "el", "la", "le", "van", "von", "der", "den",
    "das", "dos", "da", "do", "san", "st", "sta.", "sto.", "sta", "sto",
];

static COMPLETION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)COMPLETION").unwrap());
static CERTIFICATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)CERTIFICATE").unwrap());
static THIS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bThis\b").unwrap());
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

pub fn is_name_prefix(token: &str) -> bool {
    NAME_PREFIXES.contains(&token.to_lowercase().as_str())
}

/// Collapse every whitespace run to a single space and trim.
pub fn collapse_whitespace(s: &str) -> String {
    WS_RE.replace_all(s, " ").trim().to_string()
}

/// Remove template words that leak into captured names.
///
/// `COMPLETION` and `CERTIFICATE` go case-insensitively (also inside longer
/// words); `This` only as a whole, case-sensitive word.
pub fn strip_boilerplate(s: &str) -> String {
    let s = COMPLETION_RE.replace_all(s, "");
    let s = CERTIFICATE_RE.replace_all(&s, "");
    let s = THIS_RE.replace_all(&s, "");
    collapse_whitespace(&s)
}

/// Outcome of running one page's text through extractor and formatter.
#[derive(Debug, Clone, Serialize)]
pub struct Resolved {
    pub strategy: Option<Strategy>,
    pub candidate: Option<String>,
    pub formatted: String,
    pub found: bool,
}

pub fn resolve(text: &str) -> Resolved {
    let (strategy, candidate) = match extract::extract(text) {
        Some((strategy, name)) => (Some(strategy), Some(name)),
        None => (None, None),
    };
    let formatted = candidate.as_deref().and_then(format::try_format);
    let found = formatted.is_some();
    Resolved {
        strategy,
        candidate,
        formatted: formatted.unwrap_or_else(|| UNKNOWN.to_string()),
        found,
    }
}
