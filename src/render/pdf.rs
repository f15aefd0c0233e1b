//! PDF writer: draws laid-out pages with pdfium's standard fonts.

use super::layout::{PageLayout, PlacedItem};
use super::style::{FontFace, Rgb, Stylesheet};
use crate::error::RenderError;
use pdfium_render::prelude::*;

struct Fonts {
    regular: PdfFontToken,
    bold: PdfFontToken,
    italic: PdfFontToken,
    bold_italic: PdfFontToken,
    mono: PdfFontToken,
}

impl Fonts {
    fn get(&self, face: FontFace) -> PdfFontToken {
        match face {
            FontFace::Regular => self.regular,
            FontFace::Bold => self.bold,
            FontFace::Italic => self.italic,
            FontFace::BoldItalic => self.bold_italic,
            FontFace::Mono => self.mono,
        }
    }
}

fn color(rgb: Rgb) -> PdfColor {
    PdfColor::new(rgb.0, rgb.1, rgb.2, 255)
}

/// Write `pages` into a new PDF and return its bytes.
///
/// Any pdfium failure aborts the whole document.
pub fn write_pdf(
    pdfium: &Pdfium,
    pages: &[PageLayout],
    sheet: &Stylesheet,
) -> Result<Vec<u8>, RenderError> {
    let mut document = pdfium.create_new_pdf().map_err(RenderError::conversion_debug)?;

    let fonts = {
        let f = document.fonts_mut();
        Fonts {
            regular: f.helvetica(),
            bold: f.helvetica_bold(),
            italic: f.helvetica_oblique(),
            bold_italic: f.helvetica_bold_oblique(),
            mono: f.courier(),
        }
    };

    for layout in pages {
        let paper = PdfPagePaperSize::Custom(
            PdfPoints::new(sheet.page_width),
            PdfPoints::new(sheet.page_height),
        );
        let mut page = document
            .pages_mut()
            .create_page_at_end(paper)
            .map_err(RenderError::conversion_debug)?;

        for item in &layout.items {
            match item {
                PlacedItem::Text {
                    x,
                    y,
                    text,
                    face,
                    size,
                    color: rgb,
                } => {
                    let mut object = page
                        .objects_mut()
                        .create_text_object(
                            PdfPoints::new(*x),
                            PdfPoints::new(*y),
                            text,
                            fonts.get(*face),
                            PdfPoints::new(*size),
                        )
                        .map_err(RenderError::conversion_debug)?;
                    object
                        .set_fill_color(color(*rgb))
                        .map_err(RenderError::conversion_debug)?;
                }
                PlacedItem::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    color: rgb,
                } => {
                    page.objects_mut()
                        .create_path_object_line(
                            PdfPoints::new(*x1),
                            PdfPoints::new(*y1),
                            PdfPoints::new(*x2),
                            PdfPoints::new(*y2),
                            color(*rgb),
                            PdfPoints::new(0.75),
                        )
                        .map_err(RenderError::conversion_debug)?;
                }
            }
        }
    }

    document.save_to_bytes().map_err(RenderError::conversion_debug)
}

impl RenderError {
    fn conversion_debug(e: PdfiumError) -> Self {
        RenderError::conversion(format!("{:?}", e))
    }
}
