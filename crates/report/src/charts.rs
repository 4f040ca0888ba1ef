//! Off-screen rendering of the dashboard charts into raster images.
//!
//! Every chart gets its own surface, rendered on a blocking task. All tasks
//! are issued up front, the renderer waits for them, lets a settle delay
//! elapse and only then captures the surfaces, in the fixed order of
//! [`ChartKind::ALL`]. The outcome is a map keyed by chart kind, so a chart
//! that failed is simply absent.
use std::{collections::BTreeMap, fmt, sync::Arc, time::Duration};

use engine::{BudgetDashboard, MoneyCents, Percent};
use tokio::task::JoinHandle;

use crate::{
    ReportError, Result,
    raster::PlottersRasterizer,
    theme::{self, Rgb},
};

/// Default wait between the end of rendering and the capture.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(1000);
/// Default device pixel ratio of the surfaces.
pub const DEFAULT_PIXEL_RATIO: u32 = 2;
/// Blank border around each chart, in CSS pixels.
pub const PADDING: u32 = 10;
const MAX_PIXEL_RATIO: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChartKind {
    Charges,
    Revenus,
    ChargesFixes,
}

impl ChartKind {
    /// Capture order.
    pub const ALL: [ChartKind; 3] = [Self::Charges, Self::Revenus, Self::ChargesFixes];

    pub fn title(self) -> &'static str {
        match self {
            Self::Charges => "Répartition des charges",
            Self::Revenus => "Répartition des revenus",
            Self::ChargesFixes => "Détail des charges fixes par catégorie",
        }
    }

    pub fn is_pie(self) -> bool {
        !matches!(self, Self::ChargesFixes)
    }

    /// Chart area in CSS pixels, padding excluded.
    pub fn size(self) -> (u32, u32) {
        if self.is_pie() { (480, 300) } else { (500, 300) }
    }

    fn palette(self) -> &'static [Rgb] {
        match self {
            Self::Charges => &theme::CHARGES_PALETTE,
            Self::Revenus => &theme::REVENUS_PALETTE,
            Self::ChargesFixes => std::slice::from_ref(&theme::ACCENT),
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Charges => "charges",
            Self::Revenus => "revenus",
            Self::ChargesFixes => "charges_fixes",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slice {
    pub label: String,
    pub value: MoneyCents,
    pub color: Rgb,
}

/// What a rasterizer needs to draw one chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub slices: Vec<Slice>,
    pub pixel_ratio: u32,
}

impl ChartSpec {
    /// Builds the spec of `kind`, keeping only strictly positive values.
    ///
    /// Returns `None` when nothing is left to draw.
    pub fn new<'a>(
        kind: ChartKind,
        series: impl IntoIterator<Item = (&'a str, MoneyCents)>,
        pixel_ratio: u32,
    ) -> Option<Self> {
        let palette = kind.palette();
        let slices: Vec<Slice> = series
            .into_iter()
            .filter(|(_, value)| value.is_positive())
            .enumerate()
            .map(|(idx, (label, value))| Slice {
                label: label.to_string(),
                value,
                color: palette[idx % palette.len()],
            })
            .collect();
        if slices.is_empty() {
            return None;
        }
        Some(Self {
            kind,
            slices,
            pixel_ratio,
        })
    }

    /// Specs for every non-empty chart of the dashboard, in capture order.
    pub fn for_dashboard(dashboard: &BudgetDashboard, pixel_ratio: u32) -> Vec<Self> {
        let t = &dashboard.totaux;
        let charges = [
            ("Charges fixes", t.charges_fixes),
            ("Charges variables", t.charges_variables),
            ("Dettes", t.total_mensualites_dettes),
        ];
        [
            Self::new(ChartKind::Charges, charges, pixel_ratio),
            Self::new(
                ChartKind::Revenus,
                dashboard.revenue_breakdown().iter(),
                pixel_ratio,
            ),
            Self::new(
                ChartKind::ChargesFixes,
                dashboard.details.charges_fixes_par_categorie.iter(),
                pixel_ratio,
            ),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Surface size in device pixels, padding included.
    pub fn surface_size(&self) -> (u32, u32) {
        let (w, h) = self.kind.size();
        (
            (w + 2 * PADDING) * self.pixel_ratio,
            (h + 2 * PADDING) * self.pixel_ratio,
        )
    }

    pub fn total(&self) -> MoneyCents {
        self.slices.iter().map(|s| s.value).sum()
    }

    /// Share of each slice in the chart total.
    pub fn shares(&self) -> Vec<Percent> {
        let total = self.total();
        self.slices
            .iter()
            // A slice never exceeds the total, so the ratio stays in range.
            .map(|s| Percent::ratio(s.value, total).unwrap_or(Percent::ZERO))
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("drawing failed: {0}")]
    Draw(String),
    #[error("capture failed: {0}")]
    Capture(String),
    /// The rasterizer cannot work at all; aborts the whole report.
    #[error("rasterizer unavailable: {0}")]
    Unavailable(String),
}

/// A rendered, not yet captured, chart surface.
///
/// Owns its pixel buffer; dropping it releases the surface whatever the
/// exit path.
pub struct Surface {
    kind: ChartKind,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Surface {
    pub fn new(kind: ChartKind, width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            kind,
            width,
            height,
            pixels,
        }
    }

    pub fn kind(&self) -> ChartKind {
        self.kind
    }

    /// Turns the surface into a [`ChartImage`].
    pub fn capture(mut self) -> std::result::Result<ChartImage, ChartError> {
        let expected = self.width as usize * self.height as usize * 3;
        if self.width == 0 || self.height == 0 || self.pixels.len() != expected {
            return Err(ChartError::Capture(format!(
                "{} surface holds {} bytes, expected {expected}",
                self.kind,
                self.pixels.len()
            )));
        }
        Ok(ChartImage {
            kind: self.kind,
            width: self.width,
            height: self.height,
            pixels: std::mem::take(&mut self.pixels),
        })
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        tracing::trace!(chart = %self.kind, "surface released");
    }
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("kind", &self.kind)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Captured chart: packed 8-bit RGB rows, top to bottom.
#[derive(Clone, PartialEq, Eq)]
pub struct ChartImage {
    pub kind: ChartKind,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl fmt::Debug for ChartImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChartImage")
            .field("kind", &self.kind)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Captured charts with the series they were drawn from.
#[derive(Debug, Clone, Default)]
pub struct ChartImages {
    images: BTreeMap<ChartKind, (ChartImage, ChartSpec)>,
}

impl ChartImages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, image: ChartImage, spec: ChartSpec) {
        self.images.insert(image.kind, (image, spec));
    }

    pub fn get(&self, kind: ChartKind) -> Option<&ChartImage> {
        self.images.get(&kind).map(|(image, _)| image)
    }

    pub fn spec(&self, kind: ChartKind) -> Option<&ChartSpec> {
        self.images.get(&kind).map(|(_, spec)| spec)
    }

    pub fn contains(&self, kind: ChartKind) -> bool {
        self.images.contains_key(&kind)
    }

    pub fn kinds(&self) -> Vec<ChartKind> {
        self.images.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Draws a chart onto a fresh surface. Runs on a blocking thread.
pub trait Rasterizer: Send + Sync + 'static {
    fn render(&self, spec: &ChartSpec) -> std::result::Result<Surface, ChartError>;
}

pub struct ChartRenderer<R = PlottersRasterizer> {
    rasterizer: Arc<R>,
    settle: Duration,
    pixel_ratio: u32,
}

impl Default for ChartRenderer<PlottersRasterizer> {
    fn default() -> Self {
        Self::new(PlottersRasterizer)
    }
}

impl<R: Rasterizer> ChartRenderer<R> {
    pub fn new(rasterizer: R) -> Self {
        Self {
            rasterizer: Arc::new(rasterizer),
            settle: DEFAULT_SETTLE,
            pixel_ratio: DEFAULT_PIXEL_RATIO,
        }
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn with_pixel_ratio(mut self, pixel_ratio: u32) -> Self {
        self.pixel_ratio = pixel_ratio;
        self
    }

    /// Renders and captures every non-empty chart of `dashboard`.
    ///
    /// Individual chart failures are logged and leave that chart out.
    /// Invalid surface geometry or an unavailable rasterizer fails the whole
    /// call.
    pub async fn render(&self, dashboard: &BudgetDashboard) -> Result<ChartImages> {
        if self.pixel_ratio == 0 || self.pixel_ratio > MAX_PIXEL_RATIO {
            return Err(ReportError::Render(format!(
                "pixel ratio {} outside 1..={MAX_PIXEL_RATIO}",
                self.pixel_ratio
            )));
        }

        let specs = ChartSpec::for_dashboard(dashboard, self.pixel_ratio);
        tracing::debug!(charts = specs.len(), "rendering charts");

        let tasks: Vec<(ChartSpec, JoinHandle<_>)> = specs
            .into_iter()
            .map(|spec| {
                let rasterizer = Arc::clone(&self.rasterizer);
                let task_spec = spec.clone();
                let handle = tokio::task::spawn_blocking(move || rasterizer.render(&task_spec));
                (spec, handle)
            })
            .collect();

        let mut surfaces = BTreeMap::new();
        let mut unavailable = None;
        for (spec, handle) in tasks {
            let kind = spec.kind;
            match handle.await {
                Ok(Ok(surface)) => {
                    surfaces.insert(kind, (surface, spec));
                }
                Ok(Err(ChartError::Unavailable(reason))) => {
                    unavailable.get_or_insert(reason);
                }
                Ok(Err(err)) => tracing::warn!(chart = %kind, "chart skipped: {err}"),
                Err(err) => tracing::warn!(chart = %kind, "chart task failed: {err}"),
            }
        }
        if let Some(reason) = unavailable {
            return Err(ReportError::Render(reason));
        }

        if !surfaces.is_empty() {
            tokio::time::sleep(self.settle).await;
        }

        let mut images = ChartImages::new();
        for kind in ChartKind::ALL {
            let Some((surface, spec)) = surfaces.remove(&kind) else {
                continue;
            };
            match surface.capture() {
                Ok(image) => images.insert(image, spec),
                Err(err) => tracing::warn!(chart = %kind, "chart skipped: {err}"),
            }
        }
        tracing::debug!(captured = images.len(), "charts captured");
        Ok(images)
    }
}
