//! PDF export of a budget dashboard.
//!
//! The pipeline is strictly ordered: charts are rasterized and captured by
//! [`ChartRenderer`], then [`composer::compose`] lays the pages out, then
//! [`pdf::render_pdf`] writes the bytes.
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use engine::BudgetDashboard;

pub use charts::{
    ChartError, ChartImage, ChartImages, ChartKind, ChartRenderer, ChartSpec, Rasterizer, Slice,
    Surface,
};
pub use error::{ReportError, Result};
pub use raster::PlottersRasterizer;

pub mod charts;
pub mod composer;
mod error;
pub mod layout;
pub mod pdf;
mod raster;
pub mod text;
pub mod theme;

pub const REPORT_FILE_NAME: &str = "budget-tableau-de-bord.pdf";

/// A finished export, not yet written to disk.
#[derive(Debug, Clone)]
pub struct Report {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub charts: Vec<ChartKind>,
}

impl Report {
    /// Writes the report as [`REPORT_FILE_NAME`] inside `dir`.
    pub async fn save(&self, dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(REPORT_FILE_NAME);
        tokio::fs::write(&path, &self.bytes).await?;
        tracing::info!(
            path = %path.display(),
            pages = self.page_count,
            "report saved"
        );
        Ok(path)
    }
}

/// Renders the charts of `dashboard` and composes the PDF.
///
/// Fails only when chart rendering is unavailable as a whole or the PDF
/// cannot be written; missing charts are left out of the document.
pub async fn build_report<R: Rasterizer>(
    dashboard: &BudgetDashboard,
    renderer: &ChartRenderer<R>,
    generated_at: NaiveDateTime,
) -> Result<Report> {
    let charts = renderer.render(dashboard).await?;
    let document = composer::compose(dashboard, &charts, generated_at);
    tracing::debug!(pages = document.page_count(), "report laid out");
    let bytes = pdf::render_pdf(&document, &charts, composer::TITLE)?;
    Ok(Report {
        bytes,
        page_count: document.page_count(),
        charts: charts.kinds(),
    })
}
