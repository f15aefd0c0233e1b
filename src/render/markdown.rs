//! Markdown block builder and HTML export, both driven by pulldown-cmark.

use super::style::HTML_STYLE;
use super::{Block, BlockKind, Span, SpanStyle};
use pulldown_cmark::{html, Event, Options, Parser, Tag, TagEnd};

fn parser_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

/// Walks parser events and collects styled blocks.
#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<Block>,
    current: Option<Block>,
    bold: usize,
    italic: usize,
    /// Closing tags of the open block quotes.
    quote_ends: Vec<TagEnd>,
    /// One entry per open list: `Some(next number)` for ordered lists.
    lists: Vec<Option<u64>>,
    in_code_block: bool,
    in_table_head: bool,
}

impl BlockBuilder {
    fn style(&self) -> SpanStyle {
        SpanStyle {
            bold: self.bold > 0 || self.in_table_head,
            italic: self.italic > 0,
            code: self.in_code_block,
        }
    }

    fn open(&mut self, kind: BlockKind) {
        self.flush();
        self.current = Some(Block::new(kind, Vec::new()));
    }

    fn flush(&mut self) {
        if let Some(mut block) = self.current.take() {
            block.trim_end();
            if !block.spans.is_empty() || block.kind == BlockKind::Rule {
                self.blocks.push(block);
            }
        }
    }

    fn paragraph_kind(&self) -> BlockKind {
        if !self.quote_ends.is_empty() {
            BlockKind::Quote
        } else {
            BlockKind::Paragraph
        }
    }

    fn push_text(&mut self, text: &str, style: SpanStyle) {
        if self.current.is_none() {
            let kind = self.paragraph_kind();
            self.current = Some(Block::new(kind, Vec::new()));
        }
        if let Some(block) = self.current.as_mut() {
            block.push(text, style);
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Paragraph) => {
                // Loose list items wrap their text in a paragraph; keep the item.
                let in_fresh_item = matches!(
                    &self.current,
                    Some(Block { kind: BlockKind::ListItem { .. }, spans }) if spans.is_empty()
                );
                if !in_fresh_item {
                    let kind = self.paragraph_kind();
                    self.open(kind);
                }
            }
            Event::End(TagEnd::Paragraph) => self.flush(),
            Event::Start(Tag::Heading { level, .. }) => self.open(BlockKind::Heading(level as u8)),
            Event::End(TagEnd::Heading(_)) => self.flush(),
            Event::Start(Tag::List(start)) => {
                self.flush();
                self.lists.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                self.flush();
                self.lists.pop();
            }
            Event::Start(Tag::Item) => {
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let m = format!("{}.", n);
                        *n += 1;
                        m
                    }
                    _ => "-".to_string(),
                };
                let depth = self.lists.len().max(1);
                self.open(BlockKind::ListItem { depth, marker });
            }
            Event::End(TagEnd::Item) => self.flush(),
            Event::Start(Tag::CodeBlock(_)) => {
                self.open(BlockKind::CodeBlock);
                self.in_code_block = true;
            }
            Event::End(TagEnd::CodeBlock) => {
                self.in_code_block = false;
                self.flush();
            }
            Event::Start(tag @ Tag::BlockQuote(_)) => {
                self.flush();
                self.quote_ends.push(tag.to_end());
            }
            Event::End(end) if self.quote_ends.last() == Some(&end) => {
                self.flush();
                self.quote_ends.pop();
            }
            Event::Start(Tag::Strong) => self.bold += 1,
            Event::End(TagEnd::Strong) => self.bold = self.bold.saturating_sub(1),
            Event::Start(Tag::Emphasis) => self.italic += 1,
            Event::End(TagEnd::Emphasis) => self.italic = self.italic.saturating_sub(1),
            Event::Start(Tag::TableHead) => {
                self.open(BlockKind::Paragraph);
                self.in_table_head = true;
            }
            Event::End(TagEnd::TableHead) => {
                self.in_table_head = false;
                self.end_table_row();
            }
            Event::Start(Tag::TableRow) => self.open(BlockKind::Paragraph),
            Event::End(TagEnd::TableRow) => self.end_table_row(),
            Event::End(TagEnd::TableCell) => {
                let style = self.style();
                self.push_text(" | ", style);
            }
            Event::Text(t) => {
                let style = self.style();
                self.push_text(&t, style);
            }
            Event::Code(t) => {
                let style = SpanStyle {
                    code: true,
                    ..self.style()
                };
                self.push_text(&t, style);
            }
            Event::Html(t) | Event::InlineHtml(t) => {
                let style = self.style();
                self.push_text(&t, style);
            }
            Event::SoftBreak => {
                let style = self.style();
                self.push_text(" ", style);
            }
            Event::HardBreak => {
                let style = self.style();
                self.push_text("\n", style);
            }
            Event::TaskListMarker(done) => {
                let style = self.style();
                self.push_text(if done { "[x] " } else { "[ ] " }, style);
            }
            Event::Rule => {
                self.flush();
                self.blocks.push(Block::new(BlockKind::Rule, Vec::new()));
            }
            _ => {}
        }
    }

    fn end_table_row(&mut self) {
        if let Some(block) = self.current.as_mut() {
            block.strip_suffix(" | ");
        }
        self.flush();
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush();
        self.blocks
    }
}

/// Parse `text` as Markdown into styled blocks.
pub fn to_blocks(text: &str) -> Vec<Block> {
    let mut builder = BlockBuilder::default();
    for event in Parser::new_ext(text, parser_options()) {
        builder.handle(event);
    }
    builder.finish()
}

/// Render `text` as a standalone, styled HTML document.
pub fn render_html(text: &str) -> String {
    let mut body = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut body, Parser::new_ext(text, parser_options()));

    format!(
        "<html>\n<head>\n<meta charset=\"UTF-8\">\n<style>\n{}\n</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        HTML_STYLE, body
    )
}
