//! Deterministic cleanup of the model's reply.
//!
//! Chat models often wrap an otherwise fine answer in a ```` ```markdown ````
//! fence (a bare ```` ``` ```` fence is content: a code answer stays code), answer with CRLF line endings, or sprinkle zero-width characters
//! copied from their training data. None of that should reach the result
//! box or the exported PDF. The rules here only touch layout, never wording.
//!
//! Rule order matters: fences are stripped before line endings are
//! normalised, and the final trim runs last so the result has no leading or
//! trailing whitespace.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply every cleanup rule to the raw reply.
///
/// 1. Strip an outer `markdown` / `md` fence wrapping the whole reply
/// 2. Normalise line endings (CRLF / CR → LF)
/// 3. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 4. Trim trailing whitespace per line, keeping Markdown hard breaks
/// 5. Collapse runs of 3+ blank lines to a single blank line
/// 6. Trim the whole reply
pub fn clean_response(input: &str) -> String {
    let s = strip_outer_fence(input);
    let s = normalise_line_endings(&s);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    s.trim().to_string()
}

static RE_OUTER_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```(?:markdown|md)[ \t]*\r?\n(.*?)\r?\n```\s*$")
        .expect("outer fence pattern is valid")
});

fn strip_outer_fence(input: &str) -> String {
    match RE_OUTER_FENCE.captures(input.trim()) {
        // Two separate blocks at start and end, not one wrapper.
        Some(caps) if caps[1].contains("```") => input.to_string(),
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

fn remove_invisible_chars(input: &str) -> String {
    input
        .chars()
        .filter(|c| {
            !matches!(
                c,
                '\u{200B}' | '\u{FEFF}' | '\u{00AD}' | '\u{200C}' | '\u{200D}' | '\u{2060}'
            )
        })
        .collect()
}

/// A line ending in two or more spaces is a hard break; it keeps exactly two.
fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| {
            let trimmed = line.trim_end();
            if line[trimmed.len()..].starts_with("  ") && !trimmed.is_empty() {
                format!("{trimmed}  ")
            } else {
                trimmed.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

static RE_BLANK_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("blank-run pattern is valid"));

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_RUNS.replace_all(input, "\n\n").into_owned()
}
