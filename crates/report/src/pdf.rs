//! Writes a composed [`Document`] to PDF bytes with `printpdf`.
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument,
    PdfLayerReference, Rect, Rgb as PdfRgb,
    image_crate::{DynamicImage, RgbImage},
    path::PaintMode,
};

use crate::{
    ReportError, Result,
    charts::{ChartImage, ChartImages},
    layout::{Align, Document, Op, PAGE_HEIGHT, PAGE_WIDTH},
    text::{Weight, text_width},
    theme::Rgb,
};

const LAYER: &str = "Contenu";

fn pdf_error(err: impl std::fmt::Debug) -> ReportError {
    ReportError::Pdf(format!("{err:?}"))
}

fn color(rgb: Rgb) -> Color {
    let (r, g, b) = rgb.to_unit();
    Color::Rgb(PdfRgb::new(r, g, b, None))
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Fonts {
    fn get(&self, weight: Weight) -> &IndirectFontRef {
        match weight {
            Weight::Regular => &self.regular,
            Weight::Bold => &self.bold,
        }
    }
}

/// Renders `document`, resolving image ops against `charts`.
///
/// An image op whose chart is missing draws nothing.
pub fn render_pdf(document: &Document, charts: &ChartImages, title: &str) -> Result<Vec<u8>> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER);
    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(pdf_error)?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_error)?,
    };

    for (idx, page) in document.pages.iter().enumerate() {
        let layer = if idx == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER);
            doc.get_page(page).get_layer(layer)
        };
        for op in &page.ops {
            draw(&layer, op, &fonts, charts)?;
        }
    }

    doc.save_to_bytes().map_err(pdf_error)
}

fn draw(layer: &PdfLayerReference, op: &Op, fonts: &Fonts, charts: &ChartImages) -> Result<()> {
    match op {
        Op::Rect {
            x,
            y,
            w,
            h,
            fill,
            stroke,
        } => {
            let rect = Rect::new(
                Mm(*x),
                Mm(PAGE_HEIGHT - y - h),
                Mm(x + w),
                Mm(PAGE_HEIGHT - y),
            );
            layer.set_fill_color(color(*fill));
            match stroke {
                Some(stroke) => {
                    layer.set_outline_color(color(*stroke));
                    layer.set_outline_thickness(0.5);
                    layer.add_rect(rect.with_mode(PaintMode::FillStroke));
                }
                None => layer.add_rect(rect.with_mode(PaintMode::Fill)),
            }
        }
        Op::Text {
            x,
            y,
            text,
            size,
            weight,
            color: fill,
            align,
        } => {
            let width = text_width(text, *size, *weight);
            let left = match align {
                Align::Left => *x,
                Align::Center => x - width / 2.0,
                Align::Right => x - width,
            };
            layer.set_fill_color(color(*fill));
            layer.use_text(
                text.as_str(),
                *size,
                Mm(left),
                Mm(PAGE_HEIGHT - y),
                fonts.get(*weight),
            );
        }
        Op::Image { x, y, w, h, kind } => {
            if let Some(image) = charts.get(*kind) {
                place_image(layer, image, (*x, *y, *w, *h))?;
            }
        }
    }
    Ok(())
}

fn place_image(
    layer: &PdfLayerReference,
    image: &ChartImage,
    (x, y, w, h): (f32, f32, f32, f32),
) -> Result<()> {
    let buffer = RgbImage::from_raw(image.width, image.height, image.pixels.clone())
        .ok_or_else(|| ReportError::Pdf(format!("{} image buffer is truncated", image.kind)))?;
    // At this dpi the image is exactly `w` millimetres wide.
    let dpi = image.width as f32 * 25.4 / w;
    let natural_height = image.height as f32 * 25.4 / dpi;
    Image::from_dynamic_image(&DynamicImage::ImageRgb8(buffer)).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x)),
            translate_y: Some(Mm(PAGE_HEIGHT - y - h)),
            dpi: Some(dpi),
            scale_x: Some(1.0),
            scale_y: Some(h / natural_height),
            ..Default::default()
        },
    );
    Ok(())
}
