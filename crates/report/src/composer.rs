//! Lays the dashboard out as an A4 display list.
//!
//! Page one holds the summary (cards, remainder banner, indicators,
//! recommendation, fixed-charges table). Charts and notes follow on a new
//! page. Rows and note lines that would start below [`BOTTOM_LIMIT`] continue
//! on the next page; pie legends too long for the page end with a `+N autres`
//! line.
use chrono::NaiveDateTime;
use engine::{BudgetDashboard, Level, MoneyCents, format_eur};

use crate::{
    charts::{ChartImages, ChartKind, ChartSpec, PADDING},
    layout::{
        Align, BOTTOM_LIMIT, CONTENT_WIDTH, Document, MARGIN, PAGE_HEIGHT, PageBuilder, Style,
    },
    text::{Weight, format_datetime_fr, line_height, pdf_safe, wrap},
    theme::{self, Rgb},
};

pub const TITLE: &str = "Tableau de bord Budget";
const NOTES_LIMIT: f32 = PAGE_HEIGHT - 40.0;
const CARD_GAP: f32 = 3.0;
const ROW_HEIGHT: f32 = 8.0;
const PIE_WIDTH: f32 = 85.0;
const PIE_GUTTER: f32 = 95.0;
const LEGEND_STEP: f32 = 4.5;

const H1: Style = Style::new(22.0, Weight::Bold, theme::TEXT_PRIMARY);
const H2: Style = Style::new(16.0, Weight::Bold, theme::TEXT_PRIMARY);
const H3: Style = Style::new(13.0, Weight::Bold, theme::TEXT_PRIMARY);
const CHART_TITLE: Style = Style::new(10.0, Weight::Bold, theme::TEXT_PRIMARY);
const BODY: Style = Style::new(10.0, Weight::Regular, theme::TEXT_PRIMARY);
const SMALL: Style = Style::new(9.0, Weight::Regular, theme::TEXT_SECONDARY);
const CARD_LABEL: Style = Style::new(8.0, Weight::Regular, theme::TEXT_SECONDARY);
const LEGEND: Style = Style::new(8.0, Weight::Regular, theme::TEXT_PRIMARY);

/// Builds the report pages for `dashboard`.
pub fn compose(
    dashboard: &BudgetDashboard,
    charts: &ChartImages,
    generated_at: NaiveDateTime,
) -> Document {
    let mut page = PageBuilder::new();
    header(&mut page, dashboard, generated_at);
    summary_cards(&mut page, dashboard);
    remainder_banner(&mut page, dashboard);
    indicators(&mut page, dashboard);
    recommendation(&mut page, dashboard);
    fixed_charges_table(&mut page, dashboard);

    page.new_page();
    page.text(MARGIN, page.y + 4.0, "Graphiques", H2);
    page.y += 12.0;
    pies(&mut page, charts);
    bars(&mut page, charts);
    notes(&mut page, dashboard);
    page.finish()
}

fn household(personnes: u32) -> String {
    if personnes > 1 {
        format!("{personnes} personnes")
    } else {
        format!("{personnes} personne")
    }
}

fn header(page: &mut PageBuilder, dashboard: &BudgetDashboard, generated_at: NaiveDateTime) {
    page.text(MARGIN, page.y, TITLE, H1);
    page.y += 7.0;
    let exported = format!("Export du {}", format_datetime_fr(generated_at));
    page.text(MARGIN, page.y, &exported, SMALL);
    page.y += 5.0;
    let foyer = format!("Foyer : {}", household(dashboard.budget.nombre_personnes));
    page.text(MARGIN, page.y, &foyer, SMALL);
    page.y += 12.0;
}

fn card(page: &mut PageBuilder, x: f32, w: f32, h: f32, accent: Rgb) {
    let y = page.y;
    page.rect(x, y, w, h, theme::CARD_BG, Some(theme::BORDER));
    page.rect(x, y, w, 1.5, accent, None);
}

fn summary_cards(page: &mut PageBuilder, dashboard: &BudgetDashboard) {
    let t = &dashboard.totaux;
    let cards = [
        ("Revenus", t.revenus, theme::GREEN),
        ("Charges fixes", t.charges_fixes, theme::ACCENT),
        ("Charges variables", t.charges_variables, theme::ORANGE),
        ("Dettes", t.total_mensualites_dettes, theme::RED),
    ];
    let width = (CONTENT_WIDTH - CARD_GAP * 3.0) / 4.0;
    for (idx, (label, amount, color)) in cards.into_iter().enumerate() {
        let x = MARGIN + idx as f32 * (width + CARD_GAP);
        card(page, x, width, 26.0, color);
        page.text(x + 4.0, page.y + 9.0, label, CARD_LABEL);
        page.text(
            x + 4.0,
            page.y + 19.0,
            &format_eur(amount),
            Style::new(11.0, Weight::Bold, color),
        );
    }
    page.y += 36.0;
}

fn remainder_banner(page: &mut PageBuilder, dashboard: &BudgetDashboard) {
    let t = &dashboard.totaux;
    let fill = if t.reste_a_vivre.is_negative() {
        theme::RED
    } else {
        theme::GREEN
    };
    let center = MARGIN + CONTENT_WIDTH / 2.0;
    let y = page.y;
    page.rect(MARGIN, y, CONTENT_WIDTH, 30.0, fill, None);
    page.text(
        center,
        y + 8.0,
        "RESTE À VIVRE",
        Style::new(10.0, Weight::Bold, theme::WHITE).align(Align::Center),
    );
    page.text(
        center,
        y + 18.0,
        &format_eur(t.reste_a_vivre),
        Style::new(20.0, Weight::Bold, theme::WHITE).align(Align::Center),
    );
    let per_person = format!(
        "{} / personne ({} pers.)",
        format_eur(t.reste_a_vivre_par_personne),
        dashboard.budget.nombre_personnes
    );
    page.text(
        center,
        y + 25.5,
        &per_person,
        Style::new(9.0, Weight::Regular, theme::WHITE).align(Align::Center),
    );
    page.y += 38.0;
}

fn indicators(page: &mut PageBuilder, dashboard: &BudgetDashboard) {
    let i = &dashboard.indicateurs;
    page.text(MARGIN, page.y + 4.0, "Indicateurs", H3);
    page.y += 8.0;

    let width = (CONTENT_WIDTH - CARD_GAP) / 2.0;
    let alert = |flag: bool| if flag { theme::RED } else { theme::GREEN };
    let cards = [
        ("Taux d'endettement", i.taux_endettement, alert(i.debt_alert())),
        ("Ratio charges/revenus", i.ratio_charges_revenus, alert(i.charge_alert())),
    ];
    for (idx, (label, value, color)) in cards.into_iter().enumerate() {
        let x = MARGIN + idx as f32 * (width + CARD_GAP);
        card(page, x, width, 24.0, theme::BORDER);
        page.text(x + 4.0, page.y + 8.0, label, SMALL);
        page.text(
            x + 4.0,
            page.y + 18.0,
            &format!("{value}%"),
            Style::new(16.0, Weight::Bold, color),
        );
    }
    page.y += 32.0;
}

fn recommendation(page: &mut PageBuilder, dashboard: &BudgetDashboard) {
    let rec = &dashboard.recommandation;
    let (background, strip) = match rec.level {
        Level::Success => (theme::SUCCESS_BG, theme::GREEN),
        Level::Warning => (theme::WARNING_BG, theme::ORANGE),
        Level::Danger => (theme::DANGER_BG, theme::RED),
    };
    let lines = wrap(&pdf_safe(&rec.message), 165.0, BODY.size, BODY.weight);
    let step = line_height(BODY.size);
    let height = (lines.len() as f32 * step + 8.0).max(18.0);

    let y = page.y;
    page.rect(MARGIN, y, CONTENT_WIDTH, height, background, None);
    page.rect(MARGIN, y, 3.0, height, strip, None);
    let mut baseline = y + 7.0;
    for line in &lines {
        page.text(MARGIN + 8.0, baseline, line, BODY);
        baseline += step;
    }
    page.y += height + 8.0;
}

fn table_row(page: &mut PageBuilder, label: &str, amount: MoneyCents, style: Style) {
    page.text(MARGIN + 4.0, page.y + 5.5, label, style);
    page.text(
        MARGIN + CONTENT_WIDTH - 4.0,
        page.y + 5.5,
        &format_eur(amount),
        style.align(Align::Right),
    );
}

fn fixed_charges_table(page: &mut PageBuilder, dashboard: &BudgetDashboard) {
    let breakdown = &dashboard.details.charges_fixes_par_categorie;
    if breakdown.is_empty() {
        return;
    }
    page.text(MARGIN, page.y + 4.0, "Détail des charges fixes", H3);
    page.y += 8.0;

    let y = page.y;
    page.rect(MARGIN, y, CONTENT_WIDTH, ROW_HEIGHT, theme::ACCENT, None);
    let head = Style::new(9.0, Weight::Bold, theme::WHITE);
    page.text(MARGIN + 4.0, y + 5.5, "CATÉGORIE", head);
    page.text(
        MARGIN + CONTENT_WIDTH - 4.0,
        y + 5.5,
        "MONTANT",
        head.align(Align::Right),
    );
    page.y += ROW_HEIGHT;

    let row = Style::new(9.0, Weight::Regular, theme::TEXT_PRIMARY);
    for (idx, (category, amount)) in breakdown.iter().enumerate() {
        page.break_if_below(BOTTOM_LIMIT);
        if idx % 2 == 0 {
            page.rect(MARGIN, page.y, CONTENT_WIDTH, ROW_HEIGHT, theme::CARD_BG, None);
        }
        table_row(page, category, amount, row);
        page.y += ROW_HEIGHT;
    }

    page.break_if_below(BOTTOM_LIMIT);
    page.rect(MARGIN, page.y, CONTENT_WIDTH, ROW_HEIGHT, theme::BORDER, None);
    table_row(
        page,
        "TOTAL",
        breakdown.total(),
        Style::new(9.0, Weight::Bold, theme::TEXT_PRIMARY),
    );
    page.y += ROW_HEIGHT;
}

/// Image height keeping the surface aspect ratio at `width` millimetres.
fn image_height(kind: ChartKind, width: f32) -> f32 {
    let (w, h) = kind.size();
    width * (h + 2 * PADDING) as f32 / (w + 2 * PADDING) as f32
}

fn whole_percent(hundredths: i64) -> i64 {
    (hundredths + 50) / 100
}

/// Draws colour keys with whole-percent shares; returns the legend height.
///
/// Keys that would start below [`BOTTOM_LIMIT`] are folded into a last
/// `+N autres` line carrying their combined share.
fn pie_legend(page: &mut PageBuilder, x: f32, top: f32, spec: &ChartSpec) -> f32 {
    let room = ((BOTTOM_LIMIT - top) / LEGEND_STEP).floor().max(0.0) as usize + 1;
    let count = spec.slices.len();
    let shown = if count > room { room - 1 } else { count };
    let shares = spec.shares();

    let mut y = top;
    for (slice, share) in spec.slices.iter().zip(&shares).take(shown) {
        page.rect(x, y - 2.5, 3.0, 3.0, slice.color, None);
        let whole = whole_percent(share.hundredths());
        page.text(x + 5.0, y, &format!("{} {whole}%", slice.label), LEGEND);
        y += LEGEND_STEP;
    }
    if shown < count {
        let rest: i64 = shares[shown..].iter().map(|share| share.hundredths()).sum();
        let line = format!("+{} autres {}%", count - shown, whole_percent(rest));
        page.text(x + 5.0, y, &line, LEGEND);
        y += LEGEND_STEP;
    }
    y - top
}

fn pies(page: &mut PageBuilder, charts: &ChartImages) {
    let slots = [
        (ChartKind::Charges, MARGIN),
        (ChartKind::Revenus, MARGIN + PIE_GUTTER),
    ];
    let mut used = 0.0_f32;
    for (kind, x) in slots {
        let (Some(_), Some(spec)) = (charts.get(kind), charts.spec(kind)) else {
            continue;
        };
        let top = page.y;
        page.text(x, top, kind.title(), CHART_TITLE);
        let height = image_height(kind, PIE_WIDTH);
        page.image(x, top + 3.0, PIE_WIDTH, height, kind);
        let legend_height = pie_legend(page, x, top + 3.0 + height + 5.0, spec);
        used = used.max(3.0 + height + 5.0 + legend_height);
    }
    if used > 0.0 {
        page.y += used + 6.0;
    }
}

fn bars(page: &mut PageBuilder, charts: &ChartImages) {
    let kind = ChartKind::ChargesFixes;
    let (Some(_), Some(spec)) = (charts.get(kind), charts.spec(kind)) else {
        return;
    };
    let height = image_height(kind, CONTENT_WIDTH);
    if page.y + height + 8.0 > BOTTOM_LIMIT {
        page.new_page();
    }
    page.text(MARGIN, page.y, kind.title(), CHART_TITLE);
    page.image(MARGIN, page.y + 3.0, CONTENT_WIDTH, height, kind);
    page.y += height + 8.0;

    for slice in &spec.slices {
        let line = format!("{} : {}", slice.label, format_eur(slice.value));
        page.break_if_below(BOTTOM_LIMIT);
        page.rect(MARGIN, page.y - 2.5, 3.0, 3.0, slice.color, None);
        page.text(MARGIN + 5.0, page.y, &line, LEGEND);
        page.y += LEGEND_STEP;
    }
    page.y += 6.0;
}

fn notes(page: &mut PageBuilder, dashboard: &BudgetDashboard) {
    let Some(notes) = dashboard.budget.notes.as_deref() else {
        return;
    };
    page.break_if_below(NOTES_LIMIT);
    page.text(MARGIN, page.y + 4.0, "Notes", H3);
    page.y += 10.0;
    let step = line_height(BODY.size);
    for line in wrap(&pdf_safe(notes), CONTENT_WIDTH, BODY.size, BODY.weight) {
        page.break_if_below(BOTTOM_LIMIT);
        page.text(MARGIN, page.y, &line, BODY);
        page.y += step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        charts::ChartImage,
        layout::{BRAND, Op},
    };
    use chrono::NaiveDate;
    use engine::{Budget, BudgetEntry, Section};

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 17)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap()
    }

    fn dashboard(fixed: usize, notes: Option<&str>) -> BudgetDashboard {
        let mut entries = vec![BudgetEntry::new(
            Section::Revenus,
            Some("Salaires"),
            "Salaire",
            MoneyCents::new(300_000),
        )];
        for idx in 0..fixed {
            let category = format!("Poste {idx}");
            entries.push(BudgetEntry::new(
                Section::ChargesFixes,
                Some(&category),
                &category,
                MoneyCents::new(1_000),
            ));
        }
        let budget = Budget::new(1, notes.map(str::to_string), entries, vec![]).unwrap();
        engine::compute(&budget).unwrap()
    }

    fn many_revenue_sources(count: usize) -> BudgetDashboard {
        let mut entries: Vec<BudgetEntry> = (0..count)
            .map(|idx| {
                let source = format!("Source {idx}");
                BudgetEntry::new(Section::Revenus, Some(source.as_str()), &source, MoneyCents::new(10_000))
            })
            .collect();
        entries.push(BudgetEntry::new(
            Section::ChargesFixes,
            Some("Logement"),
            "Loyer",
            MoneyCents::new(50_000),
        ));
        let budget = Budget::new(1, None, entries, vec![]).unwrap();
        engine::compute(&budget).unwrap()
    }

    /// Blank images for every chart the dashboard yields.
    fn blank_images(dashboard: &BudgetDashboard) -> ChartImages {
        let mut images = ChartImages::new();
        for spec in ChartSpec::for_dashboard(dashboard, 1) {
            let (width, height) = spec.surface_size();
            let image = ChartImage {
                kind: spec.kind,
                width,
                height,
                pixels: vec![255; (width * height * 3) as usize],
            };
            images.insert(image, spec);
        }
        images
    }

    fn text_after<'a>(texts: &[&'a str], label: &str) -> Option<&'a str> {
        let idx = texts.iter().position(|t| *t == label)?;
        texts.get(idx + 1).copied()
    }

    #[test]
    fn first_page_lists_summary() {
        let doc = compose(&dashboard(2, None), &ChartImages::new(), at());
        let first: Vec<&str> = doc.pages[0].texts().collect();
        assert!(first.contains(&"Tableau de bord Budget"));
        assert!(first.contains(&"Export du 17 octobre 2026 à 14:30"));
        assert!(first.contains(&"Foyer : 1 personne"));
        assert!(first.contains(&"RESTE À VIVRE"));
        assert!(first.contains(&"2 980,00 € / personne (1 pers.)"));
        assert!(first.contains(&"Détail des charges fixes"));
        assert!(first.contains(&"Poste 1"));
        assert_eq!(text_after(&first, "TOTAL"), Some("20,00 €"));
    }

    #[test]
    fn table_total_is_the_sum_of_its_rows() {
        let mut dashboard = dashboard(2, None);
        dashboard.totaux.charges_fixes = MoneyCents::new(99_900);
        let doc = compose(&dashboard, &ChartImages::new(), at());
        let first: Vec<&str> = doc.pages[0].texts().collect();
        assert_eq!(text_after(&first, "TOTAL"), Some("20,00 €"));
    }

    #[test]
    fn no_fixed_charges_means_no_table() {
        let doc = compose(&dashboard(0, None), &ChartImages::new(), at());
        let first: Vec<&str> = doc.pages[0].texts().collect();
        assert!(!first.contains(&"Détail des charges fixes"));
        assert!(!first.contains(&"CATÉGORIE"));
        assert!(!first.contains(&"TOTAL"));
    }

    #[test]
    fn indicators_below_thresholds_are_green() {
        let doc = compose(&dashboard(2, None), &ChartImages::new(), at());
        let debt = doc.pages[0].ops.iter().find_map(|op| match op {
            Op::Text { text, color, .. } if text == "0%" => Some(*color),
            _ => None,
        });
        assert_eq!(debt, Some(theme::GREEN));
    }

    #[test]
    fn long_pie_legend_stays_above_footer() {
        let dashboard = many_revenue_sources(60);
        let doc = compose(&dashboard, &blank_images(&dashboard), at());

        for page in &doc.pages {
            for op in &page.ops {
                if let Op::Text { text, y, .. } = op {
                    if text == BRAND || text.starts_with("Page ") {
                        continue;
                    }
                    assert!(*y < PAGE_HEIGHT - 8.0, "{text:?} drawn at y={y}");
                }
            }
        }
        let charts_page: Vec<&str> = doc.pages[1].texts().collect();
        assert!(charts_page.contains(&"Source 0 2%"));
        assert!(charts_page.iter().any(|t| t.starts_with("+20 autres")));
    }

    #[test]
    fn bar_chart_spans_content_width() {
        let dashboard = dashboard(3, None);
        let doc = compose(&dashboard, &blank_images(&dashboard), at());
        let bar = doc.pages.iter().flat_map(|page| &page.ops).find_map(|op| match op {
            Op::Image { x, w, h, kind: ChartKind::ChargesFixes, .. } => Some((*x, *w, *h)),
            _ => None,
        });
        let (x, w, h) = bar.unwrap();
        assert_eq!(x, MARGIN);
        assert_eq!(w, CONTENT_WIDTH);
        assert!((h - CONTENT_WIDTH * 320.0 / 520.0).abs() < 1e-3);
    }

    #[test]
    fn long_table_continues_on_next_page() {
        let doc = compose(&dashboard(40, None), &ChartImages::new(), at());
        // Summary spills once, then the charts page.
        assert_eq!(doc.page_count(), 3);
        let second: Vec<&str> = doc.pages[1].texts().collect();
        assert!(second.contains(&"Poste 39"));
        assert!(second.contains(&"TOTAL"));
        assert!(doc.pages[2].texts().any(|t| t == "Graphiques"));
        assert!(doc.pages[2].texts().any(|t| t == "Page 3/3"));
    }

    #[test]
    fn notes_follow_charts_heading_without_images() {
        let doc = compose(&dashboard(1, Some("Penser à l'assurance")), &ChartImages::new(), at());
        assert_eq!(doc.page_count(), 2);
        let charts_page: Vec<&str> = doc.pages[1].texts().collect();
        assert!(charts_page.contains(&"Notes"));
        assert!(charts_page.contains(&"Penser à l'assurance"));
        assert_eq!(doc.pages[1].images().count(), 0);
    }

    #[test]
    fn very_long_notes_overflow() {
        let long = "Une ligne de notes.\n".repeat(120);
        let doc = compose(&dashboard(1, Some(&long)), &ChartImages::new(), at());
        assert!(doc.page_count() >= 4);
        let total = doc.page_count();
        assert!(doc.pages[total - 1].texts().any(|t| t == format!("Page {total}/{total}")));
    }
}
