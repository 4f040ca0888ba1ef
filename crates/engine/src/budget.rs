//! The module contains the household `Budget` and its lines.
//!
//! A `Budget` can only be built through validating constructors, so every
//! value reaching the aggregation engine already satisfies:
//!
//! - household size ≥ 1
//! - non-negative entry amounts and debt payments
//! - lines ordered by `sort_order`, ties kept in insertion order
use std::fmt;

use api_types::{
    amount::Amount,
    budget::{
        Budget as BudgetWire, BudgetDebt as BudgetDebtWire, BudgetDebtForm,
        BudgetEntry as BudgetEntryWire, BudgetEntryForm, BudgetForm, BudgetSection,
    },
};
use serde::{Deserialize, Serialize};

use crate::{EngineError, MoneyCents, ResultEngine};

/// The three sections a budget entry can belong to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Revenus,
    ChargesFixes,
    ChargesVariables,
}

impl Section {
    pub fn label(self) -> &'static str {
        match self {
            Self::Revenus => "Revenus",
            Self::ChargesFixes => "Charges fixes",
            Self::ChargesVariables => "Charges variables",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<BudgetSection> for Section {
    fn from(value: BudgetSection) -> Self {
        match value {
            BudgetSection::Revenus => Self::Revenus,
            BudgetSection::ChargesFixes => Self::ChargesFixes,
            BudgetSection::ChargesVariables => Self::ChargesVariables,
        }
    }
}

impl From<Section> for BudgetSection {
    fn from(value: Section) -> Self {
        match value {
            Section::Revenus => Self::Revenus,
            Section::ChargesFixes => Self::ChargesFixes,
            Section::ChargesVariables => Self::ChargesVariables,
        }
    }
}

/// A single labeled amount under one section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BudgetEntry {
    pub section: Section,
    pub category: Option<String>,
    pub label: String,
    pub amount: MoneyCents,
    pub sort_order: i32,
}

impl BudgetEntry {
    pub fn new(
        section: Section,
        category: Option<&str>,
        label: &str,
        amount: MoneyCents,
    ) -> Self {
        Self {
            section,
            category: category.map(str::to_string),
            label: label.to_string(),
            amount,
            sort_order: 0,
        }
    }

    pub fn with_sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = sort_order;
        self
    }
}

/// A recurring monthly payment owed to a creditor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BudgetDebt {
    pub kind: String,
    pub organisme: String,
    pub mensualite: MoneyCents,
    pub sort_order: i32,
}

impl BudgetDebt {
    pub fn new(kind: &str, organisme: &str, mensualite: MoneyCents) -> Self {
        Self {
            kind: kind.to_string(),
            organisme: organisme.to_string(),
            mensualite,
            sort_order: 0,
        }
    }

    pub fn with_sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = sort_order;
        self
    }
}

/// A household's financial profile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Budget {
    id: Option<i64>,
    nombre_personnes: u32,
    notes: Option<String>,
    entries: Vec<BudgetEntry>,
    debts: Vec<BudgetDebt>,
}

impl Budget {
    /// Builds a validated budget.
    ///
    /// Fails when the household size is below 1 or any amount is negative.
    pub fn new(
        nombre_personnes: i64,
        notes: Option<String>,
        mut entries: Vec<BudgetEntry>,
        mut debts: Vec<BudgetDebt>,
    ) -> ResultEngine<Self> {
        let nombre_personnes = validate_household(nombre_personnes)?;

        for entry in &entries {
            if entry.amount.is_negative() {
                return Err(EngineError::InvalidAmount(format!(
                    "entry '{}' has a negative amount",
                    entry.label
                )));
            }
        }
        for debt in &debts {
            if debt.mensualite.is_negative() {
                return Err(EngineError::InvalidAmount(format!(
                    "debt '{}' has a negative monthly payment",
                    debt.organisme
                )));
            }
        }

        // Stable sorts keep insertion order on ties.
        entries.sort_by_key(|entry| entry.sort_order);
        debts.sort_by_key(|debt| debt.sort_order);

        Ok(Self {
            id: None,
            nombre_personnes,
            notes: notes.filter(|n| !n.trim().is_empty()),
            entries,
            debts,
        })
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn nombre_personnes(&self) -> u32 {
        self.nombre_personnes
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn entries(&self) -> &[BudgetEntry] {
        &self.entries
    }

    pub fn debts(&self) -> &[BudgetDebt] {
        &self.debts
    }

    /// Entries of one section, in budget order.
    pub fn section(&self, section: Section) -> impl Iterator<Item = &BudgetEntry> {
        self.entries.iter().filter(move |entry| entry.section == section)
    }

    /// Request body for saving this budget, with sort positions renumbered
    /// from the current order.
    pub fn to_form(&self) -> BudgetForm {
        BudgetForm {
            nombre_personnes: i64::from(self.nombre_personnes),
            notes: self.notes.clone().unwrap_or_default(),
            entries: self
                .entries
                .iter()
                .enumerate()
                .map(|(idx, entry)| BudgetEntryForm {
                    section: entry.section.into(),
                    category: entry.category.clone().unwrap_or_default(),
                    label: entry.label.clone(),
                    amount: Amount::from_minor(entry.amount.cents()),
                    sort_order: idx as i32,
                })
                .collect(),
            debts: self
                .debts
                .iter()
                .enumerate()
                .map(|(idx, debt)| BudgetDebtForm {
                    kind: debt.kind.clone(),
                    organisme: debt.organisme.clone(),
                    mensualite: Amount::from_minor(debt.mensualite.cents()),
                    sort_order: idx as i32,
                })
                .collect(),
        }
    }
}

pub(crate) fn validate_household(nombre_personnes: i64) -> ResultEngine<u32> {
    if nombre_personnes < 1 {
        return Err(EngineError::InvalidHousehold(format!(
            "household size must be >= 1, got {nombre_personnes}"
        )));
    }
    u32::try_from(nombre_personnes).map_err(|_| {
        EngineError::InvalidHousehold(format!("household size too large: {nombre_personnes}"))
    })
}

impl From<BudgetEntryWire> for BudgetEntry {
    fn from(entry: BudgetEntryWire) -> Self {
        Self {
            section: entry.section.into(),
            category: entry.category,
            label: entry.label,
            amount: MoneyCents::new(entry.amount.minor()),
            sort_order: entry.sort_order,
        }
    }
}

impl From<BudgetDebtWire> for BudgetDebt {
    fn from(debt: BudgetDebtWire) -> Self {
        Self {
            kind: debt.kind,
            organisme: debt.organisme,
            mensualite: MoneyCents::new(debt.mensualite.minor()),
            sort_order: debt.sort_order,
        }
    }
}

impl TryFrom<BudgetWire> for Budget {
    type Error = EngineError;

    fn try_from(budget: BudgetWire) -> Result<Self, Self::Error> {
        let entries = budget.entries.into_iter().map(BudgetEntry::from).collect();
        let debts = budget.debts.into_iter().map(BudgetDebt::from).collect();
        Ok(Self::new(budget.nombre_personnes, budget.notes, entries, debts)?.with_id(budget.id))
    }
}

impl TryFrom<BudgetForm> for Budget {
    type Error = EngineError;

    /// Builds a budget from form data, as stored in a local snapshot file.
    fn try_from(form: BudgetForm) -> Result<Self, Self::Error> {
        let entries = form
            .entries
            .into_iter()
            .map(|entry| BudgetEntry {
                section: entry.section.into(),
                category: Some(entry.category).filter(|c| !c.trim().is_empty()),
                label: entry.label,
                amount: MoneyCents::new(entry.amount.minor()),
                sort_order: entry.sort_order,
            })
            .collect();
        let debts = form
            .debts
            .into_iter()
            .map(|debt| BudgetDebt {
                kind: debt.kind,
                organisme: debt.organisme,
                mensualite: MoneyCents::new(debt.mensualite.minor()),
                sort_order: debt.sort_order,
            })
            .collect();
        Self::new(form.nombre_personnes, Some(form.notes), entries, debts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn household_below_one_is_rejected() {
        let err = Budget::new(0, None, vec![], vec![]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidHousehold(_)));
        assert!(Budget::new(-2, None, vec![], vec![]).is_err());
    }

    #[test]
    fn negative_amounts_are_rejected_not_clamped() {
        let entries = vec![BudgetEntry::new(
            Section::ChargesFixes,
            Some("Logement"),
            "Loyer",
            MoneyCents::new(-1),
        )];
        assert!(matches!(
            Budget::new(1, None, entries, vec![]),
            Err(EngineError::InvalidAmount(_))
        ));

        let debts = vec![BudgetDebt::new("Credit auto", "Banque", MoneyCents::new(-500))];
        assert!(Budget::new(1, None, vec![], debts).is_err());
    }

    #[test]
    fn entries_sorted_by_position_with_stable_ties() {
        let entries = vec![
            BudgetEntry::new(Section::Revenus, None, "b", MoneyCents::new(1)).with_sort_order(2),
            BudgetEntry::new(Section::Revenus, None, "a", MoneyCents::new(1)).with_sort_order(1),
            BudgetEntry::new(Section::Revenus, None, "c", MoneyCents::new(1)).with_sort_order(2),
        ];
        let budget = Budget::new(1, None, entries, vec![]).unwrap();
        let labels: Vec<&str> = budget.entries().iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["a", "b", "c"]);
    }

    #[test]
    fn blank_notes_are_dropped() {
        let budget = Budget::new(1, Some("   ".to_string()), vec![], vec![]).unwrap();
        assert_eq!(budget.notes(), None);
    }

    #[test]
    fn form_renumbers_sort_positions() {
        let entries = vec![
            BudgetEntry::new(Section::Revenus, None, "Salaire", MoneyCents::new(10)).with_sort_order(7),
            BudgetEntry::new(Section::ChargesFixes, Some("Logement"), "Loyer", MoneyCents::new(5))
                .with_sort_order(9),
        ];
        let form = Budget::new(2, None, entries, vec![]).unwrap().to_form();
        let positions: Vec<i32> = form.entries.iter().map(|e| e.sort_order).collect();
        assert_eq!(positions, vec![0, 1]);
        assert_eq!(form.entries[0].category, "");
        assert_eq!(form.nombre_personnes, 2);
    }

    #[test]
    fn wire_budget_converts_and_validates() {
        let wire: BudgetWire = serde_json::from_str(
            r#"{"id":4,"userId":1,"nombrePersonnes":0,"notes":null,"entries":[],"debts":[]}"#,
        )
        .unwrap();
        assert!(Budget::try_from(wire).is_err());
    }

    #[test]
    fn form_data_round_trips_through_budget() {
        let form: BudgetForm = serde_json::from_str(
            r#"{"nombrePersonnes":2,"notes":"","entries":[
                {"section":"charges_fixes","category":" ","label":"Box","amount":"29.99","sortOrder":1},
                {"section":"revenus","category":"Salaires","label":"Salaire","amount":2000,"sortOrder":0}
            ],"debts":[{"type":"Auto","organisme":"Banque","mensualite":150,"sortOrder":0}]}"#,
        )
        .unwrap();
        let budget = Budget::try_from(form).unwrap();
        assert_eq!(budget.notes(), None);
        assert_eq!(budget.entries()[0].label, "Salaire");
        assert_eq!(budget.entries()[1].category, None);
        assert_eq!(budget.entries()[1].amount, MoneyCents::new(2999));
        assert_eq!(budget.to_form().debts[0].mensualite.minor(), 15_000);
    }
}
