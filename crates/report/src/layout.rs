//! Page geometry and the display list produced by the composer.
//!
//! Coordinates are millimetres from the top-left corner of an A4 page; text
//! `y` is the baseline. Footers are stamped by [`PageBuilder::finish`] once
//! the number of pages is known.
use crate::{
    charts::ChartKind,
    text::{Weight, pdf_safe},
    theme::{self, Rgb},
};

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;
pub const MARGIN: f32 = 15.0;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
pub const ACCENT_BAR_HEIGHT: f32 = 4.0;
/// Content starting below this line moves to the next page.
pub const BOTTOM_LIMIT: f32 = PAGE_HEIGHT - 25.0;
/// First baseline of a page.
pub const TOP: f32 = 16.0;
pub const BRAND: &str = "Liryna";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        fill: Rgb,
        stroke: Option<Rgb>,
    },
    Text {
        x: f32,
        y: f32,
        text: String,
        size: f32,
        weight: Weight,
        color: Rgb,
        align: Align,
    },
    Image {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        kind: ChartKind,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<Op>,
}

impl Page {
    /// Folded text of every text op, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            Op::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn images(&self) -> impl Iterator<Item = ChartKind> + '_ {
        self.ops.iter().filter_map(|op| match op {
            Op::Image { kind, .. } => Some(*kind),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub pages: Vec<Page>,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Text styling for [`PageBuilder::text`].
#[derive(Debug, Clone, Copy)]
pub struct Style {
    pub size: f32,
    pub weight: Weight,
    pub color: Rgb,
    pub align: Align,
}

impl Style {
    pub const fn new(size: f32, weight: Weight, color: Rgb) -> Self {
        Self {
            size,
            weight,
            color,
            align: Align::Left,
        }
    }

    pub const fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }
}

/// Accumulates pages with a vertical cursor.
#[derive(Debug)]
pub struct PageBuilder {
    done: Vec<Page>,
    current: Page,
    pub y: f32,
}

impl Default for PageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PageBuilder {
    pub fn new() -> Self {
        let mut builder = Self {
            done: Vec::new(),
            current: Page::default(),
            y: TOP,
        };
        builder.decorate();
        builder
    }

    fn decorate(&mut self) {
        self.rect(0.0, 0.0, PAGE_WIDTH, ACCENT_BAR_HEIGHT, theme::ACCENT, None);
    }

    /// Finalizes the current page and starts a new one at the top.
    pub fn new_page(&mut self) {
        let page = std::mem::take(&mut self.current);
        self.done.push(page);
        self.y = TOP;
        self.decorate();
    }

    /// Starts a new page when the cursor is below `limit`.
    pub fn break_if_below(&mut self, limit: f32) -> bool {
        if self.y > limit {
            self.new_page();
            true
        } else {
            false
        }
    }

    pub fn rect(&mut self, x: f32, y: f32, w: f32, h: f32, fill: Rgb, stroke: Option<Rgb>) {
        self.current.ops.push(Op::Rect {
            x,
            y,
            w,
            h,
            fill,
            stroke,
        });
    }

    /// Adds text, restricted to the WinAnsi repertoire.
    pub fn text(&mut self, x: f32, y: f32, text: &str, style: Style) {
        self.current.ops.push(Op::Text {
            x,
            y,
            text: pdf_safe(text),
            size: style.size,
            weight: style.weight,
            color: style.color,
            align: style.align,
        });
    }

    pub fn image(&mut self, x: f32, y: f32, w: f32, h: f32, kind: ChartKind) {
        self.current.ops.push(Op::Image { x, y, w, h, kind });
    }

    /// Closes the last page and stamps `brand` and `Page X/N` on every page.
    pub fn finish(mut self) -> Document {
        self.done.push(self.current);
        let total = self.done.len();
        let style = Style::new(8.0, Weight::Regular, theme::TEXT_SECONDARY);
        for (idx, page) in self.done.iter_mut().enumerate() {
            let y = PAGE_HEIGHT - 8.0;
            page.ops.push(Op::Text {
                x: MARGIN,
                y,
                text: BRAND.to_string(),
                size: style.size,
                weight: style.weight,
                color: style.color,
                align: Align::Left,
            });
            page.ops.push(Op::Text {
                x: PAGE_WIDTH - MARGIN,
                y,
                text: format!("Page {}/{total}", idx + 1),
                size: style.size,
                weight: style.weight,
                color: style.color,
                align: Align::Right,
            });
        }
        Document { pages: self.done }
    }
}
