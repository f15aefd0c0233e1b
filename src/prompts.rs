//! Instruction templates for the three analysis operations.
//!
//! Every prompt the model sees is built here so the wording can be reviewed
//! and tested without a network call. A prompt is the operation's fixed
//! template with the document text substituted, optionally followed by a
//! delimited block carrying the user's extra context.

use crate::error::PromptError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// What the model is asked to do with the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Concise, fact-preserving summary.
    Summarize,
    /// HR-style review of a resume against a role.
    EvaluateResume,
    /// Complete, formal answers to an assignment.
    SolveAssignment,
}

impl Operation {
    /// All operations in menu order.
    pub const ALL: [Operation; 3] = [
        Operation::Summarize,
        Operation::EvaluateResume,
        Operation::SolveAssignment,
    ];

    /// The literal menu label of the operation.
    pub fn label(self) -> &'static str {
        match self {
            Operation::Summarize => "summarize pdf",
            Operation::EvaluateResume => "evaluate resume",
            Operation::SolveAssignment => "Solve Assignment",
        }
    }

    /// Parse a menu label or one of its short aliases.
    ///
    /// Matching ignores case and treats `-`, `_` and runs of spaces alike, so
    /// `"Solve Assignment"`, `"solve-assignment"` and `"solve_assignment"` are
    /// the same operation.
    pub fn from_label(label: &str) -> Result<Operation, PromptError> {
        let normalised = label
            .trim()
            .to_lowercase()
            .replace(['-', '_'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        match normalised.as_str() {
            "summarize pdf" | "summarize" | "summary" => Ok(Operation::Summarize),
            "evaluate resume" | "evaluate" | "resume" => Ok(Operation::EvaluateResume),
            "solve assignment" | "solve" | "assignment" => Ok(Operation::SolveAssignment),
            _ => Err(PromptError::UnknownOperation {
                label: label.to_string(),
            }),
        }
    }

    fn template(self) -> &'static str {
        match self {
            Operation::Summarize => SUMMARIZE_TEMPLATE,
            Operation::EvaluateResume => EVALUATE_RESUME_TEMPLATE,
            Operation::SolveAssignment => SOLVE_ASSIGNMENT_TEMPLATE,
        }
    }

    fn context_header(self) -> &'static str {
        match self {
            Operation::Summarize => "Additional context for the summary:",
            Operation::EvaluateResume => "Additional job description/context:",
            Operation::SolveAssignment => "Additional information for solutions",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Operation {
    type Err = PromptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::from_label(s)
    }
}

/// Placeholder replaced by the document text.
const TEXT_SLOT: &str = "{text}";

const SUMMARIZE_TEMPLATE: &str = "
You are an expert at summarizing documents. I will provide the full extracted text of a PDF file. Your job is to create a clear and concise summary that captures the key points, important details, and overall purpose of the document.

Rules:
- Keep it concise and easy to understand.
- Use bullet points if appropriate.
- Preserve important names, dates, numbers, or facts.
- Remove any irrelevant or repetitive content.

Here is the PDF text:
{text}
";

const EVALUATE_RESUME_TEMPLATE: &str = "
You are an experienced HR with technical experience. Your task is to review the provided resume and:
- Evaluate alignment to the chosen role.
- List existing skills and suggest missing/important skills.
- Highlight strengths and weaknesses.
- Provide a short rating out of 10.

Resume:
{text}
";

const SOLVE_ASSIGNMENT_TEMPLATE: &str = "
You are a knowledgeable and detail-oriented academic assistant.
Your task is to carefully read the provided assignment text and produce clear, complete, and well-structured solutions.

Rules:
- Answer all parts of the assignment thoroughly.
- Use clear formatting: headings, bullet points, or numbered lists where applicable.
- Keep the tone formal and academic.

Assignment Text:
{text}
";

/// Build the instruction for `operation` over `text`.
///
/// Returns an empty string when `text` is empty. A blank or absent `context`
/// leaves the base template untouched; otherwise the context block follows it.
pub fn build_prompt(text: &str, operation: Operation, context: Option<&str>) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut prompt = operation.template().replacen(TEXT_SLOT, text, 1);

    if let Some(ctx) = context.filter(|c| !c.trim().is_empty()) {
        prompt.push('\n');
        prompt.push_str(operation.context_header());
        prompt.push('\n');
        prompt.push_str(ctx);
        prompt.push('\n');
    }

    prompt
}

/// Resolve `label` and build the prompt, reporting why no prompt was made.
///
/// An unknown label is logged as a warning and returned as
/// [`PromptError::UnknownOperation`]; it is a no-op for the caller, not a crash.
pub fn prepare_prompt(
    text: &str,
    label: &str,
    context: Option<&str>,
) -> Result<(Operation, String), PromptError> {
    let operation = match Operation::from_label(label) {
        Ok(op) => op,
        Err(e) => {
            warn!("please choose a valid operation! ignoring '{}'", label);
            return Err(e);
        }
    };

    if text.is_empty() {
        return Err(PromptError::EmptyInput);
    }

    Ok((operation, build_prompt(text, operation, context)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_gives_empty_prompt() {
        for op in Operation::ALL {
            assert_eq!(build_prompt("", op, None), "");
            assert_eq!(build_prompt("", op, Some("context")), "");
        }
    }

    #[test]
    fn non_empty_text_gives_non_empty_prompt() {
        for op in Operation::ALL {
            let p = build_prompt("x", op, None);
            assert!(!p.is_empty());
            assert!(p.contains('x'));
            assert!(!p.contains(TEXT_SLOT));
        }
    }

    #[test]
    fn context_follows_base_template() {
        for op in Operation::ALL {
            let base = build_prompt("The document body.", op, None);
            let with_ctx = build_prompt("The document body.", op, Some("Senior Rust role"));
            assert!(with_ctx.starts_with(&base));
            let pos = with_ctx.find("Senior Rust role").unwrap();
            assert!(pos >= base.len());
            assert!(with_ctx.contains(op.context_header()));
        }
    }

    #[test]
    fn blank_context_is_ignored() {
        let base = build_prompt("body", Operation::Summarize, None);
        assert_eq!(build_prompt("body", Operation::Summarize, Some("")), base);
        assert_eq!(build_prompt("body", Operation::Summarize, Some("  \n ")), base);
    }

    #[test]
    fn templates_carry_their_role() {
        assert!(build_prompt("t", Operation::Summarize, None).contains("summariz"));
        let resume = build_prompt("t", Operation::EvaluateResume, None);
        assert!(resume.contains("rating out of 10"));
        assert!(resume.contains("Resume:\nt\n"));
        let assignment = build_prompt("t", Operation::SolveAssignment, None);
        assert!(assignment.contains("formal and academic"));
    }

    #[test]
    fn text_with_braces_is_inserted_verbatim() {
        let p = build_prompt("fn main() { {text} }", Operation::Summarize, None);
        assert!(p.contains("fn main() { {text} }"));
    }

    #[test]
    fn labels_round_trip() {
        for op in Operation::ALL {
            assert_eq!(Operation::from_label(op.label()), Ok(op));
            assert_eq!(op.to_string().parse::<Operation>(), Ok(op));
        }
    }

    #[test]
    fn aliases_are_accepted() {
        assert_eq!(Operation::from_label("SUMMARIZE"), Ok(Operation::Summarize));
        assert_eq!(
            Operation::from_label("evaluate-resume"),
            Ok(Operation::EvaluateResume)
        );
        assert_eq!(
            Operation::from_label(" solve_assignment "),
            Ok(Operation::SolveAssignment)
        );
    }

    #[test]
    fn unknown_operation_is_a_no_op() {
        let err = prepare_prompt("some text", "translate pdf", None).unwrap_err();
        assert_eq!(
            err,
            PromptError::UnknownOperation {
                label: "translate pdf".into()
            }
        );
    }

    #[test]
    fn prepare_prompt_rejects_empty_text() {
        assert_eq!(
            prepare_prompt("", "summarize pdf", None).unwrap_err(),
            PromptError::EmptyInput
        );
    }

    #[test]
    fn prepare_prompt_builds_the_same_prompt() {
        let (op, prompt) = prepare_prompt("body", "evaluate resume", Some("Backend")).unwrap();
        assert_eq!(op, Operation::EvaluateResume);
        assert_eq!(prompt, build_prompt("body", op, Some("Backend")));
    }
}
