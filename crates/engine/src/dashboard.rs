//! Aggregation of a `Budget` into its dashboard.
//!
//! [`compute`] is a pure function of the budget snapshot: totals per section,
//! debt and charge ratios, the rule-based recommendation and the breakdowns
//! used by charts and tables. A dashboard received pre-aggregated from the
//! API converts into the same [`BudgetDashboard`] type.
use api_types::{amount::Amount, dashboard as wire};
use serde::{Deserialize, Serialize};

use crate::{
    Breakdown, Budget, EngineError, MoneyCents, Percent, ResultEngine, Section,
    budget::validate_household, util::normalize_label,
};

/// Above this debt ratio the household is considered over-indebted.
pub const DEBT_RATIO_LIMIT: Percent = Percent::whole(33);
/// Above this charge-to-revenue ratio the budget is under pressure.
pub const CHARGE_RATIO_LIMIT: Percent = Percent::whole(80);
/// Key used for entries without a category.
pub const UNCATEGORIZED: &str = "Autres";

pub const MESSAGE_DEBT: &str = "Votre taux d'endettement dépasse 33 % de vos revenus. \
     Vos mensualités de crédit pèsent trop lourd : évitez tout nouvel emprunt et envisagez \
     un rachat ou une renégociation de vos crédits.";
pub const MESSAGE_DEFICIT: &str = "Votre budget est déficitaire : vos charges et mensualités \
     dépassent vos revenus. Identifiez les dépenses variables à réduire en priorité.";
pub const MESSAGE_PRESSURE: &str = "Vos charges représentent plus de 80 % de vos revenus. \
     Votre marge de manœuvre est faible : surveillez vos dépenses variables.";
pub const MESSAGE_HEALTHY: &str = "Votre budget est équilibré. Vos charges restent maîtrisées \
     par rapport à vos revenus.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Success,
    Warning,
    Danger,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub level: Level,
    pub message: String,
}

impl Recommendation {
    /// First matching rule wins: debt ratio, deficit, charge ratio, healthy.
    pub fn evaluate(indicators: &Indicators, reste_a_vivre: MoneyCents) -> Self {
        let (level, message) = if indicators.taux_endettement > DEBT_RATIO_LIMIT {
            (Level::Danger, MESSAGE_DEBT)
        } else if reste_a_vivre.is_negative() {
            (Level::Danger, MESSAGE_DEFICIT)
        } else if indicators.ratio_charges_revenus > CHARGE_RATIO_LIMIT {
            (Level::Warning, MESSAGE_PRESSURE)
        } else {
            (Level::Success, MESSAGE_HEALTHY)
        };
        Self {
            level,
            message: message.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub revenus: MoneyCents,
    pub charges_fixes: MoneyCents,
    pub charges_variables: MoneyCents,
    pub total_mensualites_dettes: MoneyCents,
    pub total_charges: MoneyCents,
    pub reste_a_vivre: MoneyCents,
    pub reste_a_vivre_par_personne: MoneyCents,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indicators {
    pub taux_endettement: Percent,
    pub ratio_charges_revenus: Percent,
}

impl Indicators {
    pub fn from_totals(totals: &Totals) -> ResultEngine<Self> {
        Ok(Self {
            taux_endettement: Percent::ratio(totals.total_mensualites_dettes, totals.revenus)?,
            ratio_charges_revenus: Percent::ratio(totals.total_charges, totals.revenus)?,
        })
    }

    pub fn debt_alert(&self) -> bool {
        self.taux_endettement > DEBT_RATIO_LIMIT
    }

    pub fn charge_alert(&self) -> bool {
        self.ratio_charges_revenus > CHARGE_RATIO_LIMIT
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardBudget {
    pub id: Option<i64>,
    pub nombre_personnes: u32,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Details {
    pub charges_fixes_par_categorie: Breakdown,
    pub revenus_par_categorie: Breakdown,
    pub revenus_par_entree: Option<Breakdown>,
}

/// Derived, read-only view of a budget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetDashboard {
    pub budget: DashboardBudget,
    pub totaux: Totals,
    pub indicateurs: Indicators,
    pub recommandation: Recommendation,
    pub details: Details,
}

impl BudgetDashboard {
    /// Whether revenue is shown per entry rather than per category.
    ///
    /// Every consumer (console view, charts, report) goes through this, so
    /// the choice cannot drift between them.
    pub fn revenue_by_entry(&self) -> bool {
        self.budget.nombre_personnes >= 2
            && self
                .details
                .revenus_par_entree
                .as_ref()
                .is_some_and(|by_entry| by_entry.len() > 1)
    }

    /// Revenue breakdown to display.
    pub fn revenue_breakdown(&self) -> &Breakdown {
        match (&self.details.revenus_par_entree, self.revenue_by_entry()) {
            (Some(by_entry), true) => by_entry,
            _ => &self.details.revenus_par_categorie,
        }
    }
}

fn checked_total(mut amounts: impl Iterator<Item = MoneyCents>) -> ResultEngine<MoneyCents> {
    amounts.try_fold(MoneyCents::ZERO, |acc, amount| {
        acc.checked_add(amount)
            .ok_or_else(|| EngineError::InvalidAmount("total too large".to_string()))
    })
}

fn category_key(category: Option<&str>) -> String {
    category
        .and_then(normalize_label)
        .unwrap_or_else(|| UNCATEGORIZED.to_string())
}

/// Computes the dashboard of a budget.
pub fn compute(budget: &Budget) -> ResultEngine<BudgetDashboard> {
    let section_total =
        |section: Section| checked_total(budget.section(section).map(|entry| entry.amount));

    let revenus = section_total(Section::Revenus)?;
    let charges_fixes = section_total(Section::ChargesFixes)?;
    let charges_variables = section_total(Section::ChargesVariables)?;
    let total_mensualites_dettes = checked_total(budget.debts().iter().map(|d| d.mensualite))?;

    let overflow = || EngineError::InvalidAmount("total too large".to_string());
    let total_charges = charges_fixes
        .checked_add(charges_variables)
        .and_then(|sum| sum.checked_add(total_mensualites_dettes))
        .ok_or_else(overflow)?;
    let reste_a_vivre = revenus.checked_sub(total_charges).ok_or_else(overflow)?;
    let reste_a_vivre_par_personne = reste_a_vivre
        .split(budget.nombre_personnes())
        .ok_or_else(|| EngineError::InvalidHousehold("household size is zero".to_string()))?;

    let totaux = Totals {
        revenus,
        charges_fixes,
        charges_variables,
        total_mensualites_dettes,
        total_charges,
        reste_a_vivre,
        reste_a_vivre_par_personne,
    };
    let indicateurs = Indicators::from_totals(&totaux)?;
    let recommandation = Recommendation::evaluate(&indicateurs, reste_a_vivre);

    let mut charges_fixes_par_categorie = Breakdown::new();
    for entry in budget.section(Section::ChargesFixes) {
        charges_fixes_par_categorie.add(&category_key(entry.category.as_deref()), entry.amount);
    }

    let mut revenus_par_categorie = Breakdown::new();
    let mut revenus_par_entree = Breakdown::new();
    for (idx, entry) in budget.section(Section::Revenus).enumerate() {
        revenus_par_categorie.add(&category_key(entry.category.as_deref()), entry.amount);
        let key = normalize_label(&entry.label)
            .or_else(|| entry.category.as_deref().and_then(normalize_label))
            .unwrap_or_else(|| format!("Revenu {}", idx + 1));
        revenus_par_entree.push_distinct(&key, entry.amount);
    }

    Ok(BudgetDashboard {
        budget: DashboardBudget {
            id: budget.id(),
            nombre_personnes: budget.nombre_personnes(),
            notes: budget.notes().map(str::to_string),
        },
        totaux,
        indicateurs,
        recommandation,
        details: Details {
            charges_fixes_par_categorie,
            revenus_par_categorie,
            revenus_par_entree: Some(revenus_par_entree),
        },
    })
}

fn money(amount: Amount) -> MoneyCents {
    MoneyCents::new(amount.minor())
}

fn breakdown(map: wire::AmountMap) -> Breakdown {
    map.0
        .into_iter()
        .map(|(key, amount)| (key, money(amount)))
        .collect()
}

impl TryFrom<wire::BudgetDashboard> for BudgetDashboard {
    type Error = EngineError;

    /// Accepts a server-side dashboard after checking the totals invariants.
    fn try_from(dashboard: wire::BudgetDashboard) -> Result<Self, Self::Error> {
        let nombre_personnes = validate_household(dashboard.budget.nombre_personnes)?;
        let t = &dashboard.totaux;
        let totaux = Totals {
            revenus: money(t.revenus),
            charges_fixes: money(t.charges_fixes),
            charges_variables: money(t.charges_variables),
            total_mensualites_dettes: money(t.total_mensualites_dettes),
            total_charges: money(t.total_charges),
            reste_a_vivre: money(t.reste_a_vivre),
            reste_a_vivre_par_personne: money(t.reste_a_vivre_par_personne),
        };

        let expected_charges = totaux.charges_fixes.cents() as i128
            + totaux.charges_variables.cents() as i128
            + totaux.total_mensualites_dettes.cents() as i128;
        if expected_charges != totaux.total_charges.cents() as i128 {
            return Err(EngineError::InvalidBudget(format!(
                "totalCharges {} does not match its parts",
                totaux.total_charges
            )));
        }
        if totaux.revenus.cents() as i128 - totaux.total_charges.cents() as i128
            != totaux.reste_a_vivre.cents() as i128
        {
            return Err(EngineError::InvalidBudget(format!(
                "resteAVivre {} does not match revenus - totalCharges",
                totaux.reste_a_vivre
            )));
        }

        let charges_fixes_par_categorie = breakdown(dashboard.details.charges_fixes_par_categorie);
        let rows: i128 = charges_fixes_par_categorie
            .iter()
            .map(|(_, amount)| amount.cents() as i128)
            .sum();
        if rows != totaux.charges_fixes.cents() as i128 {
            return Err(EngineError::InvalidBudget(format!(
                "chargesFixesParCategorie does not add up to chargesFixes {}",
                totaux.charges_fixes
            )));
        }

        let level = match dashboard.recommandation.level {
            wire::RecommandationLevel::Success => Level::Success,
            wire::RecommandationLevel::Warning => Level::Warning,
            wire::RecommandationLevel::Danger => Level::Danger,
        };

        Ok(Self {
            budget: DashboardBudget {
                id: Some(dashboard.budget.id),
                nombre_personnes,
                notes: dashboard.budget.notes.filter(|n| !n.trim().is_empty()),
            },
            totaux,
            indicateurs: Indicators {
                taux_endettement: Percent::from_f64(dashboard.indicateurs.taux_endettement)?,
                ratio_charges_revenus: Percent::from_f64(
                    dashboard.indicateurs.ratio_charges_revenus,
                )?,
            },
            recommandation: Recommendation {
                level,
                message: dashboard.recommandation.message,
            },
            details: Details {
                charges_fixes_par_categorie,
                revenus_par_categorie: breakdown(dashboard.details.revenus_par_categorie),
                revenus_par_entree: dashboard.details.revenus_par_entree.map(breakdown),
            },
        })
    }
}

fn amount_map(breakdown: &Breakdown) -> wire::AmountMap {
    wire::AmountMap(
        breakdown
            .iter()
            .map(|(key, value)| (key.to_string(), Amount::from_minor(value.cents())))
            .collect(),
    )
}

impl From<&BudgetDashboard> for wire::BudgetDashboard {
    fn from(dashboard: &BudgetDashboard) -> Self {
        let amount = |value: MoneyCents| Amount::from_minor(value.cents());
        let t = &dashboard.totaux;
        Self {
            budget: wire::DashboardBudget {
                id: dashboard.budget.id.unwrap_or_default(),
                nombre_personnes: i64::from(dashboard.budget.nombre_personnes),
                notes: dashboard.budget.notes.clone(),
            },
            totaux: wire::Totaux {
                revenus: amount(t.revenus),
                charges_fixes: amount(t.charges_fixes),
                charges_variables: amount(t.charges_variables),
                total_mensualites_dettes: amount(t.total_mensualites_dettes),
                total_charges: amount(t.total_charges),
                reste_a_vivre: amount(t.reste_a_vivre),
                reste_a_vivre_par_personne: amount(t.reste_a_vivre_par_personne),
            },
            indicateurs: wire::Indicateurs {
                taux_endettement: dashboard.indicateurs.taux_endettement.as_f64(),
                ratio_charges_revenus: dashboard.indicateurs.ratio_charges_revenus.as_f64(),
            },
            recommandation: wire::Recommandation {
                level: match dashboard.recommandation.level {
                    Level::Success => wire::RecommandationLevel::Success,
                    Level::Warning => wire::RecommandationLevel::Warning,
                    Level::Danger => wire::RecommandationLevel::Danger,
                },
                message: dashboard.recommandation.message.clone(),
            },
            details: wire::Details {
                charges_fixes_par_categorie: amount_map(&dashboard.details.charges_fixes_par_categorie),
                revenus_par_categorie: amount_map(&dashboard.details.revenus_par_categorie),
                revenus_par_entree: dashboard.details.revenus_par_entree.as_ref().map(amount_map),
            },
        }
    }
}
