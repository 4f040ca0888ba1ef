//! Budget domain model and aggregation engine.
//!
//! The crate has no I/O: it validates budget snapshots and derives the
//! dashboard (totals, indicators, recommendation, breakdowns) consumed by the
//! console view and by the PDF report.
//!
//! ```rust
//! use engine::{Budget, BudgetDebt, BudgetEntry, Level, MoneyCents, Section};
//!
//! let budget = Budget::new(
//!     1,
//!     None,
//!     vec![BudgetEntry::new(Section::Revenus, Some("Salaires"), "Salaire", MoneyCents::new(200_000))],
//!     vec![BudgetDebt::new("Immobilier", "Banque", MoneyCents::new(50_000))],
//! )
//! .unwrap();
//!
//! let dashboard = engine::compute(&budget).unwrap();
//! assert_eq!(dashboard.totaux.reste_a_vivre, MoneyCents::new(150_000));
//! assert_eq!(dashboard.recommandation.level, Level::Success);
//! ```
pub use breakdown::Breakdown;
pub use budget::{Budget, BudgetDebt, BudgetEntry, Section};
pub use currency::Currency;
pub use dashboard::{
    BudgetDashboard, CHARGE_RATIO_LIMIT, DEBT_RATIO_LIMIT, DashboardBudget, Details, Indicators,
    Level, Recommendation, Totals, UNCATEGORIZED, compute,
};
pub use error::EngineError;
pub use money::{MoneyCents, format_eur, parse_eur};
pub use percent::Percent;
pub use util::normalize_spaces;

mod breakdown;
mod budget;
mod currency;
pub mod dashboard;
mod error;
mod money;
mod percent;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
