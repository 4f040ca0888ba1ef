use std::time::{Duration, Instant};

use chrono::{NaiveDate, NaiveDateTime};
use engine::{Budget, BudgetDashboard, BudgetDebt, BudgetEntry, MoneyCents, Section};
use proptest::prelude::*;
use report::{
    ChartError, ChartKind, ChartRenderer, ChartSpec, PlottersRasterizer, REPORT_FILE_NAME,
    Rasterizer, ReportError, Surface, build_report, composer,
};

fn eur(euros: i64) -> MoneyCents {
    MoneyCents::new(euros * 100)
}

fn at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 17)
        .unwrap()
        .and_hms_opt(14, 30, 0)
        .unwrap()
}

fn reference_dashboard() -> BudgetDashboard {
    let budget = Budget::new(
        2,
        Some("Revoir l'assurance auto en janvier.".to_string()),
        vec![
            BudgetEntry::new(Section::Revenus, Some("Salaires"), "Salaire Alex", eur(2000)),
            BudgetEntry::new(Section::Revenus, Some("Salaires"), "Salaire Sam", eur(1800)),
            BudgetEntry::new(Section::ChargesFixes, Some("Logement"), "Loyer", eur(900)),
        ],
        vec![BudgetDebt::new("Auto", "Banque", eur(300))],
    )
    .unwrap();
    engine::compute(&budget).unwrap()
}

fn empty_dashboard() -> BudgetDashboard {
    let budget = Budget::new(1, None, vec![], vec![]).unwrap();
    engine::compute(&budget).unwrap()
}

fn fast<R: Rasterizer>(rasterizer: R) -> ChartRenderer<R> {
    ChartRenderer::new(rasterizer)
        .with_settle(Duration::ZERO)
        .with_pixel_ratio(1)
}

/// Delegates to plotters except for one chart kind.
struct FailingOn(ChartKind);

impl Rasterizer for FailingOn {
    fn render(&self, spec: &ChartSpec) -> Result<Surface, ChartError> {
        if spec.kind == self.0 {
            return Err(ChartError::Draw("boom".to_string()));
        }
        PlottersRasterizer.render(spec)
    }
}

/// Hands back surfaces that cannot be captured.
struct Truncating;

impl Rasterizer for Truncating {
    fn render(&self, spec: &ChartSpec) -> Result<Surface, ChartError> {
        Ok(Surface::new(spec.kind, 10, 10, vec![0; 7]))
    }
}

struct Unavailable;

impl Rasterizer for Unavailable {
    fn render(&self, _spec: &ChartSpec) -> Result<Surface, ChartError> {
        Err(ChartError::Unavailable("no graphics backend".to_string()))
    }
}

#[tokio::test]
async fn reference_report_has_all_charts_on_two_pages() {
    let dashboard = reference_dashboard();
    let report = build_report(&dashboard, &fast(PlottersRasterizer), at())
        .await
        .unwrap();
    assert_eq!(report.charts, ChartKind::ALL.to_vec());
    assert_eq!(report.page_count, 2);
    assert!(report.bytes.starts_with(b"%PDF-"));
}

#[tokio::test]
async fn empty_budget_yields_two_pages_without_images() {
    let dashboard = empty_dashboard();
    let charts = fast(PlottersRasterizer).render(&dashboard).await.unwrap();
    assert!(charts.is_empty());

    let document = composer::compose(&dashboard, &charts, at());
    assert_eq!(document.page_count(), 2);
    assert_eq!(document.pages[1].images().count(), 0);
    let texts: Vec<&str> = document.pages[1].texts().collect();
    assert_eq!(texts, vec!["Graphiques", "Liryna", "Page 2/2"]);
}

#[tokio::test]
async fn failed_chart_is_absent_and_others_kept() {
    let dashboard = reference_dashboard();
    let charts = fast(FailingOn(ChartKind::Revenus))
        .render(&dashboard)
        .await
        .unwrap();
    assert_eq!(charts.kinds(), vec![ChartKind::Charges, ChartKind::ChargesFixes]);

    let document = composer::compose(&dashboard, &charts, at());
    let drawn: Vec<ChartKind> = document.pages.iter().flat_map(|p| p.images()).collect();
    assert_eq!(drawn, vec![ChartKind::Charges, ChartKind::ChargesFixes]);
}

#[tokio::test]
async fn capture_failures_are_tolerated() {
    let charts = fast(Truncating).render(&reference_dashboard()).await.unwrap();
    assert!(charts.is_empty());
}

#[tokio::test]
async fn unavailable_rasterizer_aborts_the_report() {
    let result = build_report(&reference_dashboard(), &fast(Unavailable), at()).await;
    assert!(matches!(result, Err(ReportError::Render(_))));
}

#[tokio::test]
async fn invalid_pixel_ratio_aborts_the_report() {
    let renderer = fast(PlottersRasterizer).with_pixel_ratio(0);
    assert!(matches!(
        renderer.render(&reference_dashboard()).await,
        Err(ReportError::Render(_))
    ));
}

#[tokio::test]
async fn capture_waits_for_settle_delay() {
    let renderer = ChartRenderer::new(PlottersRasterizer)
        .with_pixel_ratio(1)
        .with_settle(Duration::from_millis(50));
    let started = Instant::now();
    let charts = renderer.render(&reference_dashboard()).await.unwrap();
    assert_eq!(charts.len(), 3);
    assert!(started.elapsed() >= Duration::from_millis(50));
}

#[tokio::test]
async fn report_is_saved_under_fixed_name() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("exports");
    let report = build_report(&empty_dashboard(), &fast(PlottersRasterizer), at())
        .await
        .unwrap();

    let path = report.save(&target).await.unwrap();
    assert_eq!(path, target.join(REPORT_FILE_NAME));
    let written = std::fs::read(&path).unwrap();
    assert_eq!(written, report.bytes);
}

#[test]
fn charges_pie_uses_section_totals() {
    let specs = ChartSpec::for_dashboard(&reference_dashboard(), 1);
    let charges = specs
        .iter()
        .find(|s| s.kind == ChartKind::Charges)
        .unwrap();
    let labels: Vec<&str> = charges.slices.iter().map(|s| s.label.as_str()).collect();
    // No variable charges in the reference budget.
    assert_eq!(labels, vec!["Charges fixes", "Dettes"]);

    let revenus = specs
        .iter()
        .find(|s| s.kind == ChartKind::Revenus)
        .unwrap();
    let labels: Vec<&str> = revenus.slices.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["Salaire Alex", "Salaire Sam"]);
}

proptest! {
    #[test]
    fn chart_series_keep_only_positive_values(values in prop::collection::vec(-5_000i64..5_000, 0..10)) {
        let labels: Vec<String> = (0..values.len()).map(|i| format!("k{i}")).collect();
        let series = labels
            .iter()
            .zip(&values)
            .map(|(label, cents)| (label.as_str(), MoneyCents::new(*cents)));
        let positives = values.iter().filter(|v| **v > 0).count();

        match ChartSpec::new(ChartKind::ChargesFixes, series, 1) {
            None => prop_assert_eq!(positives, 0),
            Some(spec) => {
                prop_assert_eq!(spec.slices.len(), positives);
                prop_assert!(spec.slices.iter().all(|s| s.value.is_positive()));
            }
        }
    }
}
