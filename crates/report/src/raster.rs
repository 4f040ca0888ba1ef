//! Default rasterizer, drawing with the `plotters` bitmap backend.
//!
//! Charts carry no text: titles, legends and values are laid out as PDF text
//! by the composer, so no font stack is needed here.
use std::f64::consts::TAU;

use plotters::prelude::*;

use crate::{
    charts::{ChartError, ChartKind, ChartSpec, PADDING, Rasterizer, Surface},
    theme::{self, Rgb},
};

/// Largest surface edge accepted, in device pixels.
const MAX_EDGE: u32 = 8192;

// Geometry in CSS pixels, relative to the chart area.
const PIE_CENTER: (f64, f64) = (240.0, 150.0);
const PIE_OUTER: f64 = 110.0;
const PIE_INNER: f64 = 55.0;
const BAR_PLOT: (f64, f64, f64, f64) = (60.0, 10.0, 470.0, 260.0);
const BAR_FILL: f64 = 0.8;
const BAR_MAX_WIDTH: f64 = 90.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct PlottersRasterizer;

impl Rasterizer for PlottersRasterizer {
    fn render(&self, spec: &ChartSpec) -> Result<Surface, ChartError> {
        let (width, height) = spec.surface_size();
        if width > MAX_EDGE || height > MAX_EDGE {
            return Err(ChartError::Unavailable(format!(
                "{width}x{height} surface exceeds {MAX_EDGE}px"
            )));
        }
        let mut pixels = vec![0u8; width as usize * height as usize * 3];
        draw(spec, &mut pixels, (width, height)).map_err(ChartError::Draw)?;
        tracing::trace!(chart = %spec.kind, width, height, "chart drawn");
        Ok(Surface::new(spec.kind, width, height, pixels))
    }
}

fn rgb(color: Rgb) -> RGBColor {
    RGBColor(color.0, color.1, color.2)
}

/// Maps chart-area CSS coordinates to device pixels.
struct Scale {
    ratio: f64,
}

impl Scale {
    fn point(&self, x: f64, y: f64) -> (i32, i32) {
        let pad = f64::from(PADDING);
        (
            ((x + pad) * self.ratio).round() as i32,
            ((y + pad) * self.ratio).round() as i32,
        )
    }

    fn length(&self, value: f64) -> i32 {
        (value * self.ratio).round() as i32
    }
}

fn draw(spec: &ChartSpec, pixels: &mut [u8], size: (u32, u32)) -> Result<(), String> {
    let root = BitMapBackend::with_buffer(pixels, size).into_drawing_area();
    root.fill(&WHITE).map_err(|err| err.to_string())?;
    let scale = Scale {
        ratio: f64::from(spec.pixel_ratio),
    };
    match spec.kind {
        ChartKind::Charges | ChartKind::Revenus => draw_pie(&root, spec, &scale)?,
        ChartKind::ChargesFixes => draw_bars(&root, spec, &scale)?,
    }
    root.present().map_err(|err| err.to_string())
}

fn draw_pie(
    root: &DrawingArea<BitMapBackend<'_>, plotters::coord::Shift>,
    spec: &ChartSpec,
    scale: &Scale,
) -> Result<(), String> {
    let total = spec.total().cents() as f64;
    let (cx, cy) = PIE_CENTER;
    let mut start = 0.0_f64;
    for slice in &spec.slices {
        let sweep = slice.value.cents() as f64 / total * TAU;
        // One vertex per degree or so keeps the outline smooth at 2x.
        let steps = ((sweep / TAU) * 360.0).ceil().max(2.0) as usize;
        let mut points = Vec::with_capacity(steps + 2);
        points.push(scale.point(cx, cy));
        for step in 0..=steps {
            let angle = start + sweep * step as f64 / steps as f64;
            points.push(scale.point(
                cx + PIE_OUTER * angle.cos(),
                cy - PIE_OUTER * angle.sin(),
            ));
        }
        root.draw(&Polygon::new(points, rgb(slice.color).filled()))
            .map_err(|err| err.to_string())?;
        start += sweep;
    }
    let (hx, hy) = scale.point(cx, cy);
    root.draw(&Circle::new(
        (hx, hy),
        scale.length(PIE_INNER),
        WHITE.filled(),
    ))
    .map_err(|err| err.to_string())
}

fn draw_bars(
    root: &DrawingArea<BitMapBackend<'_>, plotters::coord::Shift>,
    spec: &ChartSpec,
    scale: &Scale,
) -> Result<(), String> {
    let (left, top, right, bottom) = BAR_PLOT;
    let max = spec
        .slices
        .iter()
        .map(|s| s.value.cents())
        .max()
        .unwrap_or(1)
        .max(1) as f64;

    let grid = rgb(theme::BORDER);
    for step in 1..=4 {
        let y = bottom - (bottom - top) * f64::from(step) / 4.0;
        root.draw(&PathElement::new(
            vec![scale.point(left, y), scale.point(right, y)],
            grid.stroke_width(1),
        ))
        .map_err(|err| err.to_string())?;
    }

    let band = (right - left) / spec.slices.len() as f64;
    let bar_width = (band * BAR_FILL).min(BAR_MAX_WIDTH);
    for (idx, slice) in spec.slices.iter().enumerate() {
        let center = left + band * (idx as f64 + 0.5);
        let height = (bottom - top) * slice.value.cents() as f64 / max;
        root.draw(&Rectangle::new(
            [
                scale.point(center - bar_width / 2.0, bottom - height),
                scale.point(center + bar_width / 2.0, bottom),
            ],
            rgb(slice.color).filled(),
        ))
        .map_err(|err| err.to_string())?;
    }

    let axis = rgb(theme::AXIS).stroke_width(scale.length(1.0).max(1) as u32);
    root.draw(&PathElement::new(
        vec![scale.point(left, top), scale.point(left, bottom), scale.point(right, bottom)],
        axis,
    ))
    .map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::MoneyCents;

    fn pixel(surface_pixels: &[u8], width: u32, x: u32, y: u32) -> (u8, u8, u8) {
        let at = ((y * width + x) * 3) as usize;
        (surface_pixels[at], surface_pixels[at + 1], surface_pixels[at + 2])
    }

    #[test]
    fn pie_has_colored_ring_and_white_hole() {
        let spec = ChartSpec::new(
            ChartKind::Charges,
            [("Charges fixes", MoneyCents::new(90_000))],
            1,
        )
        .unwrap();
        let image = PlottersRasterizer.render(&spec).unwrap().capture().unwrap();
        assert_eq!((image.width, image.height), (500, 320));

        let (cx, cy) = (240 + PADDING, 150 + PADDING);
        assert_eq!(pixel(&image.pixels, image.width, cx, cy), (255, 255, 255));
        let ring = pixel(&image.pixels, image.width, cx + 80, cy);
        assert_eq!(ring, (0xff, 0x6b, 0x47));
        assert_eq!(pixel(&image.pixels, image.width, 2, 2), (255, 255, 255));
    }

    #[test]
    fn bars_use_accent_color() {
        let spec = ChartSpec::new(
            ChartKind::ChargesFixes,
            [("Logement", MoneyCents::new(90_000))],
            1,
        )
        .unwrap();
        let image = PlottersRasterizer.render(&spec).unwrap().capture().unwrap();
        // Middle of the only bar.
        let x = (60 + 470) / 2 + PADDING;
        let y = 200 + PADDING;
        assert_eq!(pixel(&image.pixels, image.width, x, y), (0xff, 0x6b, 0x47));
    }

    #[test]
    fn oversized_surface_is_unavailable() {
        let spec = ChartSpec::new(ChartKind::Charges, [("x", MoneyCents::new(1))], 20).unwrap();
        assert!(matches!(
            PlottersRasterizer.render(&spec),
            Err(ChartError::Unavailable(_))
        ));
    }
}
