// Identifier/name cleanup and validation against the Harness naming rules.
// Cleaning is permissive (suggest a default), validation is strict and runs
// again at request-building time before anything touches the network.

use regex::Regex;
use std::sync::OnceLock;

pub const IDENTIFIER_PATTERN: &str = "^[a-zA-Z_][0-9a-zA-Z_$]{0,127}$";
pub const NAME_PATTERN: &str = r"^[a-zA-Z_][0-9a-zA-Z\-_ ]{0,127}$";

const MAX_LENGTH: usize = 127;
const FALLBACK_IDENTIFIER: &str = "pipeline_1";
const FALLBACK_NAME: &str = "My Pipeline";

static IDENTIFIER_RE: OnceLock<Regex> = OnceLock::new();
static NAME_RE: OnceLock<Regex> = OnceLock::new();

/// Replaces every character outside `[0-9a-zA-Z_$]` with `_` and caps the
/// result at 127 characters. The "must not start with a digit" rule is not
/// applied here; `validate_identifier` catches that before submission.
pub fn sanitize_identifier(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '$' { c } else { '_' })
        .take(MAX_LENGTH)
        .collect();
    if cleaned.is_empty() {
        FALLBACK_IDENTIFIER.to_string()
    } else {
        cleaned
    }
}

/// Caps a display name at 127 characters. Names already allow most free
/// text; the full character-set rule is checked by `validate_name`.
pub fn sanitize_name(raw: &str) -> String {
    let truncated: String = raw.chars().take(MAX_LENGTH).collect();
    if truncated.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        truncated
    }
}

pub fn validate_identifier(s: &str) -> bool {
    IDENTIFIER_RE
        .get_or_init(|| Regex::new(IDENTIFIER_PATTERN).expect("identifier pattern compiles"))
        .is_match(s)
}

pub fn validate_name(s: &str) -> bool {
    NAME_RE
        .get_or_init(|| Regex::new(NAME_PATTERN).expect("name pattern compiles"))
        .is_match(s)
}
