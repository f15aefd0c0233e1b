//! Line breaking and pagination.
//!
//! [`layout`] turns blocks into absolutely positioned text runs, page by
//! page, in PDF user space: points, origin at the bottom-left corner, `y`
//! is the baseline. Wrapping is greedy on whitespace; a word wider than the
//! line is broken between characters.

use super::style::{text_width, FontFace, Rgb, Stylesheet};
use super::{Block, BlockKind, Span, SpanStyle};

/// Something drawn on a page.
#[derive(Debug, Clone, PartialEq)]
pub enum PlacedItem {
    Text {
        x: f32,
        y: f32,
        text: String,
        face: FontFace,
        size: f32,
        color: Rgb,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: Rgb,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub items: Vec<PlacedItem>,
}

impl PageLayout {
    /// Text of every run on the page, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|item| match item {
            PlacedItem::Text { text, .. } => Some(text.as_str()),
            PlacedItem::Line { .. } => None,
        })
    }
}

/// Geometry and colouring shared by every line of a block.
struct BlockFrame {
    x: f32,
    width: f32,
    size: f32,
    force_bold: bool,
    force_mono: bool,
    base_color: Rgb,
    strong_color: Rgb,
    space_before: f32,
}

impl BlockFrame {
    fn for_block(kind: &BlockKind, sheet: &Stylesheet) -> Self {
        let mut frame = BlockFrame {
            x: sheet.margin,
            width: sheet.content_width(),
            size: sheet.body_size,
            force_bold: false,
            force_mono: false,
            base_color: sheet.text_color,
            strong_color: sheet.strong_color,
            space_before: sheet.paragraph_spacing,
        };
        match kind {
            BlockKind::Heading(level) => {
                frame.size = sheet.heading_size(*level);
                frame.force_bold = true;
                frame.base_color = sheet.heading_color;
                frame.strong_color = sheet.heading_color;
                frame.space_before = frame.size * 0.75;
            }
            BlockKind::ListItem { depth, .. } => {
                let indent = sheet.list_indent * *depth as f32;
                frame.x += indent;
                frame.width -= indent;
                frame.space_before = sheet.list_item_spacing;
            }
            BlockKind::Quote => {
                frame.x += sheet.list_indent;
                frame.width -= sheet.list_indent;
            }
            BlockKind::CodeBlock => {
                frame.size = sheet.code_size;
                frame.force_mono = true;
                frame.x += sheet.list_indent / 2.0;
                frame.width -= sheet.list_indent / 2.0;
            }
            BlockKind::Paragraph | BlockKind::Rule => {}
        }
        frame
    }

    fn face(&self, style: SpanStyle) -> FontFace {
        FontFace::new(
            style.bold || self.force_bold,
            style.italic,
            style.code || self.force_mono,
        )
    }

    fn color(&self, style: SpanStyle) -> Rgb {
        if style.bold {
            self.strong_color
        } else {
            self.base_color
        }
    }

    fn width_of(&self, text: &str, style: SpanStyle) -> f32 {
        text_width(text, self.face(style), self.size)
    }
}

/// One wrapped line: pieces of text with their style.
type Line = Vec<(String, SpanStyle)>;

/// Page cursor: the current page and the top of the next line.
struct Cursor<'s> {
    sheet: &'s Stylesheet,
    pages: Vec<PageLayout>,
    y: f32,
}

impl<'s> Cursor<'s> {
    fn new(sheet: &'s Stylesheet) -> Self {
        Self {
            sheet,
            pages: vec![PageLayout::default()],
            y: sheet.page_height - sheet.margin,
        }
    }

    fn top(&self) -> f32 {
        self.sheet.page_height - self.sheet.margin
    }

    fn at_page_top(&self) -> bool {
        self.y >= self.top()
    }

    fn new_page(&mut self) {
        self.pages.push(PageLayout::default());
        self.y = self.top();
    }

    /// Vertical gap before a block; swallowed at the top of a page.
    fn gap(&mut self, amount: f32) {
        if !self.at_page_top() {
            self.y -= amount;
        }
    }

    /// Reserve `height`, breaking the page first if it does not fit.
    fn reserve(&mut self, height: f32) -> f32 {
        if self.y - height < self.sheet.margin && !self.at_page_top() {
            self.new_page();
        }
        let top = self.y;
        self.y -= height;
        top
    }

    fn place(&mut self, item: PlacedItem) {
        if let Some(page) = self.pages.last_mut() {
            page.items.push(item);
        }
    }
}

/// Lay `blocks` out on A4 pages. Always returns at least one page.
pub fn layout(blocks: &[Block], sheet: &Stylesheet) -> Vec<PageLayout> {
    let mut cursor = Cursor::new(sheet);

    for (index, block) in blocks.iter().enumerate() {
        let frame = BlockFrame::for_block(&block.kind, sheet);
        if index > 0 {
            cursor.gap(frame.space_before);
        }

        match &block.kind {
            BlockKind::Rule => place_rule(&mut cursor, &frame),
            BlockKind::CodeBlock => {
                for source_line in block.plain_text().split('\n') {
                    let spans = [Span::new(source_line, SpanStyle::PLAIN)];
                    let mut lines = wrap(&spans, &frame);
                    if lines.is_empty() {
                        lines.push(Vec::new());
                    }
                    for line in &lines {
                        place_line(&mut cursor, &frame, line, None);
                    }
                }
            }
            kind => {
                let marker = match kind {
                    BlockKind::ListItem { marker, .. } => Some(marker.as_str()),
                    _ => None,
                };
                let lines = wrap(&block.spans, &frame);
                if lines.is_empty() {
                    // A blank source line still takes vertical space.
                    place_line(&mut cursor, &frame, &Vec::new(), marker);
                }
                for (i, line) in lines.iter().enumerate() {
                    place_line(&mut cursor, &frame, line, if i == 0 { marker } else { None });
                }
            }
        }
    }

    cursor.pages
}

fn line_advance(frame: &BlockFrame, sheet: &Stylesheet) -> f32 {
    frame.size * sheet.line_height
}

fn place_rule(cursor: &mut Cursor<'_>, frame: &BlockFrame) {
    let advance = line_advance(frame, cursor.sheet);
    let top = cursor.reserve(advance);
    let y = top - advance / 2.0;
    cursor.place(PlacedItem::Line {
        x1: frame.x,
        y1: y,
        x2: frame.x + frame.width,
        y2: y,
        color: cursor.sheet.heading_color,
    });
}

fn place_line(cursor: &mut Cursor<'_>, frame: &BlockFrame, line: &Line, marker: Option<&str>) {
    let advance = line_advance(frame, cursor.sheet);
    let top = cursor.reserve(advance);
    // Centre the glyphs in the line box; 0.2 em approximates the descender.
    let baseline = top - (advance + frame.size) / 2.0 + 0.2 * frame.size;

    if let Some(marker) = marker {
        let style = SpanStyle::PLAIN;
        let width = frame.width_of(marker, style);
        cursor.place(PlacedItem::Text {
            x: frame.x - width - 4.0,
            y: baseline,
            text: marker.to_string(),
            face: frame.face(style),
            size: frame.size,
            color: frame.base_color,
        });
    }

    let mut x = frame.x;
    for (text, style) in merge_runs(line) {
        let width = frame.width_of(&text, style);
        cursor.place(PlacedItem::Text {
            x,
            y: baseline,
            text,
            face: frame.face(style),
            size: frame.size,
            color: frame.color(style),
        });
        x += width;
    }
}

/// Join neighbouring pieces that draw identically.
fn merge_runs(line: &Line) -> Vec<(String, SpanStyle)> {
    let mut runs: Vec<(String, SpanStyle)> = Vec::new();
    for (text, style) in line {
        match runs.last_mut() {
            Some((last, last_style)) if last_style == style => last.push_str(text),
            _ => runs.push((text.clone(), *style)),
        }
    }
    runs
}

enum Token<'t> {
    Word(&'t str, SpanStyle),
    Space(SpanStyle),
    Break,
}

fn tokenize(spans: &[Span]) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    for span in spans {
        let mut word_start: Option<usize> = None;
        for (i, c) in span.text.char_indices() {
            if c.is_whitespace() {
                if let Some(start) = word_start.take() {
                    tokens.push(Token::Word(&span.text[start..i], span.style));
                }
                tokens.push(if c == '\n' {
                    Token::Break
                } else {
                    Token::Space(span.style)
                });
            } else if word_start.is_none() {
                word_start = Some(i);
            }
        }
        if let Some(start) = word_start {
            tokens.push(Token::Word(&span.text[start..], span.style));
        }
    }
    tokens
}

/// Greedy line breaking of `spans` into lines no wider than the frame.
fn wrap(spans: &[Span], frame: &BlockFrame) -> Vec<Line> {
    let mut lines: Vec<Line> = Vec::new();
    let mut line: Line = Vec::new();
    let mut width = 0.0_f32;
    let mut pending_space: Option<SpanStyle> = None;

    for token in tokenize(spans) {
        match token {
            Token::Break => {
                lines.push(std::mem::take(&mut line));
                width = 0.0;
                pending_space = None;
            }
            Token::Space(style) => {
                if !line.is_empty() && pending_space.is_none() {
                    pending_space = Some(style);
                }
            }
            Token::Word(word, style) => {
                let word_width = frame.width_of(word, style);
                let space_width = pending_space.map_or(0.0, |s| frame.width_of(" ", s));

                if !line.is_empty() && width + space_width + word_width > frame.width {
                    lines.push(std::mem::take(&mut line));
                    width = 0.0;
                    pending_space = None;
                }

                if let Some(space_style) = pending_space.take() {
                    line.push((" ".to_string(), space_style));
                    width += space_width;
                }

                if word_width <= frame.width - width {
                    line.push((word.to_string(), style));
                    width += word_width;
                    continue;
                }

                // Wider than a whole line: break between characters.
                let mut chunk = String::new();
                for c in word.chars() {
                    let mut buf = [0u8; 4];
                    let c_width = frame.width_of(c.encode_utf8(&mut buf), style);
                    if width + c_width > frame.width && !(line.is_empty() && chunk.is_empty()) {
                        if !chunk.is_empty() {
                            line.push((std::mem::take(&mut chunk), style));
                        }
                        lines.push(std::mem::take(&mut line));
                        width = 0.0;
                    }
                    chunk.push(c);
                    width += c_width;
                }
                if !chunk.is_empty() {
                    line.push((chunk, style));
                }
            }
        }
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines
}
