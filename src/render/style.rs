//! Fixed stylesheet and font metrics.
//!
//! The exported PDF uses pdfium's built-in standard fonts, so text widths
//! come from the Adobe core-font metrics below rather than from a font file.
//! Oblique faces share the widths of their upright counterparts.

/// An sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
}

/// One of the standard faces the renderer draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFace {
    Regular,
    Bold,
    Italic,
    BoldItalic,
    Mono,
}

impl FontFace {
    pub fn new(bold: bool, italic: bool, mono: bool) -> Self {
        match (mono, bold, italic) {
            (true, _, _) => FontFace::Mono,
            (false, true, true) => FontFace::BoldItalic,
            (false, true, false) => FontFace::Bold,
            (false, false, true) => FontFace::Italic,
            (false, false, false) => FontFace::Regular,
        }
    }

    fn is_bold(self) -> bool {
        matches!(self, FontFace::Bold | FontFace::BoldItalic)
    }
}

/// Page geometry, type sizes and colours of the exported document.
#[derive(Debug, Clone, PartialEq)]
pub struct Stylesheet {
    /// A4 in points.
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub body_size: f32,
    pub code_size: f32,
    /// Multiplier applied to the font size to get the line advance.
    pub line_height: f32,
    /// h1..h6
    pub heading_sizes: [f32; 6],
    pub text_color: Rgb,
    pub heading_color: Rgb,
    pub strong_color: Rgb,
    pub list_indent: f32,
    pub list_item_spacing: f32,
    pub paragraph_spacing: f32,
}

impl Default for Stylesheet {
    fn default() -> Self {
        Self {
            page_width: 595.0,
            page_height: 842.0,
            margin: 56.0,
            body_size: 12.0,
            code_size: 10.0,
            line_height: 1.6,
            heading_sizes: [24.0, 18.0, 15.0, 13.0, 12.0, 12.0],
            text_color: Rgb::BLACK,
            heading_color: Rgb(0x2C, 0x3E, 0x50),
            strong_color: Rgb(0x34, 0x49, 0x5E),
            list_indent: 20.0,
            list_item_spacing: 6.0,
            paragraph_spacing: 10.0,
        }
    }
}

impl Stylesheet {
    pub fn content_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    pub fn heading_size(&self, level: u8) -> f32 {
        let idx = (level.clamp(1, 6) - 1) as usize;
        self.heading_sizes[idx]
    }
}

/// Stylesheet of the standalone HTML export.
pub const HTML_STYLE: &str = "\
body { font-family: Arial, sans-serif; line-height: 1.6; font-size: 16px; }
h1, h2, h3 { color: #2C3E50; }
ul { margin-left: 20px; }
li { margin-bottom: 8px; }
strong { color: #34495E; font-weight: bold; }";

// Advance widths (1/1000 em) for U+0020..=U+007E.
#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

const COURIER: u16 = 600;

fn char_width(c: char, face: FontFace) -> u16 {
    if face == FontFace::Mono {
        return COURIER;
    }
    let table = if face.is_bold() {
        &HELVETICA_BOLD
    } else {
        &HELVETICA
    };
    match c as u32 {
        0x20..=0x7E => table[(c as u32 - 0x20) as usize],
        0xA0 => table[0],
        // Typographic punctuation the models like to emit.
        0x2013 => 556,
        0x2014 => 1000,
        0x2018 | 0x2019 => 222,
        0x201C | 0x201D => 333,
        0x2022 => 350,
        0x2026 => 1000,
        _ => table[(b'o' - 0x20) as usize],
    }
}

/// Width of `text` in points when set in `face` at `size`.
pub fn text_width(text: &str, face: FontFace, size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| char_width(c, face) as u32).sum();
    units as f32 * size / 1000.0
}
