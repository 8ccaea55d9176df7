use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use super::{collapse_whitespace, strip_boilerplate};

const ANCHOR: &str = "CERTIFICATE OF COMPLETION";
const BODY_START: &str = "This certificate";
const TITLE_PHRASES: &[&str] = &["Chief Operating", "Operations Manager"];
const CONTEXT_CHARS: usize = 20;

// Only the capture group is used, so matching the trailing phrase instead of
// looking ahead for it captures the same text.
static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"CERTIFICATE OF COMPLETION\s+([A-Za-z\s.\-]+)\s+This certificate").unwrap()
});
static RELIGIOUS_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z][a-z]+)\s+(Sta\.|Sto\.)\s+([A-Z][a-z]+)").unwrap());
static GENERAL_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"([A-Z][a-z]+|[A-Z]{2,})\s+((?:[A-Za-z]\.?\s+)?(?:[a-z]{1,3}\s+)?[A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)",
    )
    .unwrap()
});
static PRESENTED_TO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)presented to\s+(.*?)\s+for successfully").unwrap());

/// Rule that located a name on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Anchor,
    LineWindow,
    Pattern,
    PresentedTo,
}

impl Strategy {
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::Anchor => "anchor",
            Strategy::LineWindow => "line-window",
            Strategy::Pattern => "pattern",
            Strategy::PresentedTo => "presented-to",
        }
    }
}

type StrategyFn = fn(&str) -> Option<String>;

/// Strategies in priority order; the first non-empty result wins.
const STRATEGIES: &[(Strategy, StrategyFn)] = &[
    (Strategy::Anchor, anchor_phrase),
    (Strategy::LineWindow, line_window),
    (Strategy::Pattern, name_pattern),
    (Strategy::PresentedTo, presented_to),
];

/// Best-guess recipient name for one page of certificate text.
///
/// The winning candidate has boilerplate words stripped; a candidate that is
/// empty after stripping counts as not found (later strategies are not tried).
pub fn extract(text: &str) -> Option<(Strategy, String)> {
    let text = text.replace('\0', "");
    if text.is_empty() {
        return None;
    }

    let (strategy, raw) = STRATEGIES.iter().find_map(|(strategy, rule)| {
        rule(text.as_str())
            .filter(|name| !name.is_empty())
            .map(|name| (*strategy, name))
    })?;

    let name = strip_boilerplate(&raw);
    if name.is_empty() {
        debug!(strategy = strategy.label(), raw = %raw, "candidate empty after cleanup");
        return None;
    }
    Some((strategy, name))
}

fn contains_title(s: &str) -> bool {
    TITLE_PHRASES.iter().any(|t| s.contains(t))
}

/// Text run between the certificate heading and the body sentence.
pub fn anchor_phrase(text: &str) -> Option<String> {
    let caps = ANCHOR_RE.captures(text)?;
    let name = collapse_whitespace(&caps[1]);
    // Title-looking captures are logged, not rejected.
    if contains_title(&name) {
        debug!(name = %name, "anchor capture looks like a job title");
    }
    Some(name)
}

/// First plausible line strictly between the heading line and the body line.
pub fn line_window(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut anchor = None;
    let mut body = None;
    for (i, line) in lines.iter().enumerate() {
        if line.contains(ANCHOR) {
            anchor = Some(i);
        }
        if line.contains(BODY_START) {
            body = Some(i);
            break;
        }
    }

    let (start, end) = (anchor?, body?);
    if start >= end {
        return None;
    }
    lines[start + 1..end]
        .iter()
        .map(|l| l.trim())
        .find(|l| {
            !l.is_empty() && !l.starts_with("Chief") && !l.ends_with("Officer") && !l.contains("Manager")
        })
        .map(str::to_string)
}

/// Capitalized-name patterns, skipping matches that sit next to a job title.
pub fn name_pattern(text: &str) -> Option<String> {
    [&*RELIGIOUS_NAME_RE, &*GENERAL_NAME_RE]
        .into_iter()
        .find_map(|re| {
            re.find_iter(text).find_map(|m| {
                let candidate = m.as_str().trim();
                if contains_title(candidate) {
                    return None;
                }
                let context = context_window(text, m.start(), m.end(), CONTEXT_CHARS);
                if context.contains("Officer") || context.contains("Manager") {
                    return None;
                }
                Some(candidate.to_string())
            })
        })
}

/// Everything between "presented to" and "for successfully", across lines.
pub fn presented_to(text: &str) -> Option<String> {
    PRESENTED_TO_RE
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
}

/// `text[start..end]` widened by up to `chars` characters on each side.
fn context_window(text: &str, start: usize, end: usize, chars: usize) -> &str {
    let from = text[..start]
        .char_indices()
        .rev()
        .take(chars)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(start);
    let to = text[end..]
        .char_indices()
        .nth(chars)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());
    &text[from..to]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.txt", name)).unwrap()
    }

    #[test]
    fn anchor_captures_text_between_heading_and_body() {
        let text = fixture("anchor");
        assert_eq!(anchor_phrase(&text).as_deref(), Some("Michelle Moreno"));
        assert_eq!(
            extract(&text),
            Some((Strategy::Anchor, "Michelle Moreno".to_string()))
        );
    }

    #[test]
    fn anchor_collapses_whitespace() {
        let text = "CERTIFICATE OF COMPLETION\n\n  John   van der\n Wal \nThis certificate is awarded";
        assert_eq!(anchor_phrase(text).as_deref(), Some("John van der Wal"));
    }

    #[test]
    fn anchor_keeps_title_like_capture() {
        let text = "CERTIFICATE OF COMPLETION\nOperations Manager\nThis certificate is awarded";
        assert_eq!(
            extract(text),
            Some((Strategy::Anchor, "Operations Manager".to_string()))
        );
    }

    #[test]
    fn nul_characters_are_dropped_before_matching() {
        let text = "CERTIFICATE OF COMPLETION\n Jua\0n Dela Cruz \nThis certificate";
        assert_eq!(
            extract(text),
            Some((Strategy::Anchor, "Juan Dela Cruz".to_string()))
        );
        assert_eq!(extract("\0\0"), None);
        assert_eq!(extract(""), None);
    }

    #[test]
    fn line_window_skips_title_lines() {
        let text = fixture("line_window");
        assert_eq!(anchor_phrase(&text), None);
        assert_eq!(line_window(&text).as_deref(), Some("José Ñiguez"));
        assert_eq!(
            extract(&text),
            Some((Strategy::LineWindow, "José Ñiguez".to_string()))
        );
    }

    #[test]
    fn line_window_needs_heading_before_body() {
        let text = "This certificate is awarded to\nAna Reyes\nCERTIFICATE OF COMPLETION";
        assert_eq!(line_window(text), None);
        let same_line = "CERTIFICATE OF COMPLETION This certificate\nAna Reyes";
        assert_eq!(line_window(same_line), None);
    }

    #[test]
    fn line_window_uses_last_heading_before_body() {
        let text = "CERTIFICATE OF COMPLETION\nÁngel Ruiz\nCERTIFICATE OF COMPLETION\nÓscar Díaz\nThis certificate";
        assert_eq!(line_window(text).as_deref(), Some("Óscar Díaz"));
    }

    #[test]
    fn religious_prefix_pattern_wins_over_general_pattern() {
        let text = fixture("pattern_religious");
        assert_eq!(name_pattern(&text).as_deref(), Some("Rafa Sta. Ana"));
    }

    #[test]
    fn general_pattern_finds_plain_name() {
        let text = fixture("pattern_general");
        assert_eq!(
            extract(&text),
            Some((Strategy::Pattern, "Carlo Mendoza".to_string()))
        );
    }

    #[test]
    fn pattern_skips_names_next_to_titles() {
        let text = "Approved by Maria Santos Training Officer\nthis page was issued to all staff\nCarlo Mendoza";
        assert_eq!(name_pattern(text).as_deref(), Some("Carlo Mendoza"));
    }

    #[test]
    fn presented_to_is_last_resort() {
        let text = fixture("presented_to");
        assert_eq!(name_pattern(&text), None);
        assert_eq!(
            extract(&text),
            Some((Strategy::PresentedTo, "Ana-Marie O'Neil".to_string()))
        );
    }

    #[test]
    fn cleanup_emptying_candidate_means_not_found() {
        let text = "awarded and presented to\nCERTIFICATE\nfor successfully finishing";
        assert_eq!(presented_to(text).as_deref(), Some("CERTIFICATE"));
        assert_eq!(extract(text), None);
    }

    #[test]
    fn context_window_counts_characters() {
        let text = "ééé Ana Cruz ééé";
        let m = text.find("Ana").unwrap();
        assert_eq!(context_window(text, m, m + 8, 2), "é Ana Cruz é");
    }
}
