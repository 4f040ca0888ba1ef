//! Plain-text rendering of the dashboard for the terminal.
use std::fmt::Write;

use engine::{BudgetDashboard, Level, format_eur};

fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Success => "[OK]",
        Level::Warning => "[ATTENTION]",
        Level::Danger => "[ALERTE]",
    }
}

pub fn render(dashboard: &BudgetDashboard) -> String {
    let t = &dashboard.totaux;
    let i = &dashboard.indicateurs;
    let mut out = String::new();

    let _ = writeln!(out, "Tableau de bord Budget");
    let _ = writeln!(out, "Foyer : {} pers.", dashboard.budget.nombre_personnes);
    let _ = writeln!(out);
    for (label, amount) in [
        ("Revenus", t.revenus),
        ("Charges fixes", t.charges_fixes),
        ("Charges variables", t.charges_variables),
        ("Dettes", t.total_mensualites_dettes),
        ("Total charges", t.total_charges),
    ] {
        let _ = writeln!(out, "{label:<20}{:>16}", format_eur(amount));
    }
    let _ = writeln!(
        out,
        "{:<20}{:>16}  ({} / personne)",
        "Reste à vivre",
        format_eur(t.reste_a_vivre),
        format_eur(t.reste_a_vivre_par_personne)
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "Taux d'endettement     {}%", i.taux_endettement);
    let _ = writeln!(out, "Ratio charges/revenus  {}%", i.ratio_charges_revenus);
    let _ = writeln!(
        out,
        "{} {}",
        level_tag(dashboard.recommandation.level),
        dashboard.recommandation.message
    );

    let revenue_title = if dashboard.revenue_by_entry() {
        "Revenus par personne"
    } else {
        "Revenus par catégorie"
    };
    for (title, breakdown) in [
        (revenue_title, dashboard.revenue_breakdown()),
        (
            "Charges fixes par catégorie",
            &dashboard.details.charges_fixes_par_categorie,
        ),
    ] {
        if breakdown.is_empty() {
            continue;
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "{title}");
        for (key, amount) in breakdown.iter() {
            let _ = writeln!(out, "  {key:<24}{:>14}", format_eur(amount));
        }
    }

    if let Some(notes) = &dashboard.budget.notes {
        let _ = writeln!(out);
        let _ = writeln!(out, "Notes");
        let _ = writeln!(out, "{notes}");
    }
    out
}
