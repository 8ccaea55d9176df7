use super::{is_name_prefix, strip_boilerplate, UNKNOWN};

/// Characters that can never appear in an output filename.
const BLOCKED_CHARS: &[char] = &['\n', '\r', '\t', '\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Keeps `NNN <name>.pdf` under the usual 255-byte filename limit.
const MAX_NAME_BYTES: usize = 200;

/// Canonical `Last, First` form of a candidate name, or `unknown`.
pub fn format_name(name: Option<&str>) -> String {
    name.and_then(try_format)
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Like [`format_name`] but returns `None` instead of the placeholder.
///
/// Only raw candidates should be passed in: formatting an already formatted
/// name does not give the same string back.
pub fn try_format(name: &str) -> Option<String> {
    let filtered: String = name
        .chars()
        .filter(|c| !c.is_control() && !BLOCKED_CHARS.contains(c))
        .collect();
    let cleaned = strip_boilerplate(&filtered);
    // Nothing but punctuation left ("..", "-") is not a name and is unsafe as a folder.
    if !cleaned.chars().any(char::is_alphanumeric) {
        return None;
    }

    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    if tokens.len() < 2 {
        return Some(cap_length(&cleaned));
    }

    let first = tokens[0];
    Some(cap_length(&format!("{}, {}", surname(&tokens), first)))
}

fn surname(tokens: &[&str]) -> String {
    let n = tokens.len();
    if n >= 3 {
        let second = tokens[1];
        if is_religious_prefix(second.strip_suffix('.').unwrap_or(second)) {
            return tokens[1..].join(" ");
        }

        let penult = tokens[n - 2];
        if is_religious_prefix(&penult.replace('.', "")) {
            return tokens[n - 2..].join(" ");
        }
        // Must run before the single-prefix rule, which would claim "der Wal" out of "van der Wal".
        if n >= 4 && is_name_prefix(tokens[n - 3]) && is_name_prefix(penult) {
            return tokens[n - 3..].join(" ");
        }
        if is_name_prefix(penult) {
            return tokens[n - 2..].join(" ");
        }
    }
    tokens[n - 1].to_string()
}

fn is_religious_prefix(token: &str) -> bool {
    matches!(token.to_lowercase().as_str(), "sta" | "sto")
}

fn cap_length(name: &str) -> String {
    if name.len() <= MAX_NAME_BYTES {
        return name.to_string();
    }
    let mut end = MAX_NAME_BYTES;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end]
        .trim_end_matches(|c: char| c.is_whitespace() || c == ',')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(name: &str) -> String {
        format_name(Some(name))
    }

    #[test]
    fn missing_or_empty_is_unknown() {
        assert_eq!(format_name(None), "unknown");
        assert_eq!(fmt(""), "unknown");
        assert_eq!(fmt("  CERTIFICATE of COMPLETION  "), "of");
        assert_eq!(fmt("CERTIFICATE This"), "unknown");
    }

    #[test]
    fn two_tokens_use_last_as_surname() {
        assert_eq!(fmt("Michelle Moreno"), "Moreno, Michelle");
    }

    #[test]
    fn single_token_is_returned_as_is() {
        assert_eq!(fmt("Cher"), "Cher");
    }

    #[test]
    fn religious_prefix_after_given_name() {
        assert_eq!(fmt("Rafa Sta. Ana"), "Sta. Ana, Rafa");
        assert_eq!(fmt("Rafa sto Tomas Reyes"), "sto Tomas Reyes, Rafa");
    }

    #[test]
    fn religious_prefix_before_surname() {
        assert_eq!(fmt("Jose de Sta. Maria"), "Sta. Maria, Jose");
        assert_eq!(fmt("Maria Cristina Sto. Domingo"), "Sto. Domingo, Maria");
    }

    #[test]
    fn single_surname_prefix() {
        assert_eq!(fmt("Juan Dela Cruz"), "Dela Cruz, Juan");
        assert_eq!(fmt("Godwin de Guzman"), "de Guzman, Godwin");
        assert_eq!(fmt("Anna Maria von Trapp"), "von Trapp, Anna");
    }

    #[test]
    fn double_surname_prefix() {
        assert_eq!(fmt("John van der Wal"), "van der Wal, John");
        assert_eq!(fmt("Maria Luisa de la Paz"), "de la Paz, Maria");
        // "la Cruz" alone would lose the leading "de".
        assert_eq!(fmt("Maria de la Cruz"), "de la Cruz, Maria");
    }

    #[test]
    fn middle_names_are_dropped() {
        assert_eq!(fmt("Ana B. Reyes"), "Reyes, Ana");
    }

    #[test]
    fn unsafe_characters_are_removed() {
        assert_eq!(fmt("Ana: Reyes?"), "Reyes, Ana");
        assert_eq!(fmt("Ana/Reyes"), "AnaReyes");
        assert_eq!(fmt(".."), "unknown");
    }

    #[test]
    fn formatting_is_not_idempotent() {
        let once = fmt("Juan Dela Cruz");
        assert_ne!(fmt(&once), once);
    }

    #[test]
    fn long_names_are_capped() {
        let long = format!("Ana {}", "x".repeat(300));
        let out = fmt(&long);
        assert!(out.len() <= MAX_NAME_BYTES);
        assert!(out.starts_with("xxx"));
    }
}
