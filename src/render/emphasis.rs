//! Inline emphasis scanner for the line-oriented renderer.
//!
//! A two-state machine over one line of text. In the plain state the scanner
//! looks for the next `*`; a following `*` makes the delimiter `**`,
//! otherwise it is `*`. In the emphasis state it looks for the next
//! occurrence of that same delimiter. Both `*…*` and `**…**` come out bold.
//!
//! An opening delimiter without a matching close is emitted literally, along
//! with everything after it.

/// One run of a scanned line: its text and whether it is bold.
pub type Segment = (String, bool);

enum State<'a> {
    Plain,
    Emphasis { delimiter: &'static str, opened_at: &'a str },
}

/// Split `line` into plain and bold runs. Empty runs are omitted.
pub fn scan(line: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut rest = line;
    let mut state = State::Plain;

    loop {
        match state {
            State::Plain => {
                let Some(pos) = rest.find('*') else {
                    push(&mut segments, rest, false);
                    break;
                };
                let delimiter = if rest[pos + 1..].starts_with('*') {
                    "**"
                } else {
                    "*"
                };
                push(&mut segments, &rest[..pos], false);
                state = State::Emphasis {
                    delimiter,
                    opened_at: &rest[pos..],
                };
                rest = &rest[pos + delimiter.len()..];
            }
            State::Emphasis {
                delimiter,
                opened_at,
            } => {
                let Some(end) = rest.find(delimiter) else {
                    push(&mut segments, opened_at, false);
                    break;
                };
                push(&mut segments, &rest[..end], true);
                rest = &rest[end + delimiter.len()..];
                state = State::Plain;
            }
        }
    }

    segments
}

fn push(segments: &mut Vec<Segment>, text: &str, bold: bool) {
    if !text.is_empty() {
        segments.push((text.to_string(), bold));
    }
}

/// The inner text if the whole (trimmed) line is a single `**…**` run.
pub fn whole_line_bold(line: &str) -> Option<&str> {
    let inner = line.trim().strip_prefix("**")?.strip_suffix("**")?;
    if inner.is_empty() || inner.contains("**") {
        return None;
    }
    Some(inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(text: &str, bold: bool) -> Segment {
        (text.to_string(), bold)
    }

    #[test]
    fn double_star_run() {
        assert_eq!(
            scan("Hello **world**!"),
            vec![seg("Hello ", false), seg("world", true), seg("!", false)]
        );
    }

    #[test]
    fn single_star_runs_are_bold_too() {
        assert_eq!(
            scan("*a* and *b*"),
            vec![seg("a", true), seg(" and ", false), seg("b", true)]
        );
    }

    #[test]
    fn unterminated_delimiter_is_literal() {
        assert_eq!(
            scan("unterminated **bold"),
            vec![seg("unterminated ", false), seg("**bold", false)]
        );
    }

    #[test]
    fn remainder_after_unterminated_is_not_parsed() {
        assert_eq!(
            scan("x **a *b* c"),
            vec![seg("x ", false), seg("**a *b* c", false)]
        );
    }

    #[test]
    fn plain_line_is_one_segment() {
        assert_eq!(scan("no emphasis here"), vec![seg("no emphasis here", false)]);
        assert!(scan("").is_empty());
    }

    #[test]
    fn empty_emphasis_is_dropped() {
        assert_eq!(scan("a****b"), vec![seg("a", false), seg("b", false)]);
    }

    #[test]
    fn trailing_lone_star() {
        assert_eq!(scan("rating 8/10 *"), vec![seg("rating 8/10 ", false), seg("*", false)]);
    }

    #[test]
    fn multibyte_text_is_kept_intact() {
        assert_eq!(
            scan("Café **naïve** ünïcode"),
            vec![seg("Café ", false), seg("naïve", true), seg(" ünïcode", false)]
        );
    }

    #[test]
    fn whole_line_bold_detection() {
        assert_eq!(whole_line_bold("**Strengths:**"), Some("Strengths:"));
        assert_eq!(whole_line_bold("  **Summary**  "), Some("Summary"));
        assert_eq!(whole_line_bold("**a** and **b**"), None);
        assert_eq!(whole_line_bold("****"), None);
        assert_eq!(whole_line_bold("Hello **world**"), None);
    }
}
