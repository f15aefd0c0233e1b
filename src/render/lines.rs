//! Line-oriented block builder: one paragraph per source line.

use super::emphasis::{scan, whole_line_bold};
use super::{Block, BlockKind, Span, SpanStyle};

/// Turn `text` into one paragraph per line with bold runs detected.
///
/// A blank line becomes an empty paragraph so vertical spacing survives.
pub fn to_blocks(text: &str) -> Vec<Block> {
    text.lines().map(line_block).collect()
}

fn line_block(line: &str) -> Block {
    if let Some(inner) = whole_line_bold(line) {
        return Block::new(BlockKind::Paragraph, vec![Span::new(inner, SpanStyle::BOLD)]);
    }

    let spans = scan(line)
        .into_iter()
        .map(|(text, bold)| {
            let style = if bold {
                SpanStyle::BOLD
            } else {
                SpanStyle::PLAIN
            };
            Span::new(text, style)
        })
        .collect();
    Block::new(BlockKind::Paragraph, spans)
}
