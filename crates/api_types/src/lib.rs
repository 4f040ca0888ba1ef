use serde::{Deserialize, Serialize};

pub mod amount {
    use std::fmt;

    use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

    /// Monetary value exchanged with the API, held as integer minor units.
    ///
    /// The API sends amounts either as JSON numbers (`2000.5`) or as decimal
    /// strings (`"2000.50"`, straight from a SQL `DECIMAL` column). Both are
    /// rounded to the nearest cent on the way in.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct Amount(i64);

    impl Amount {
        #[must_use]
        pub const fn from_minor(minor: i64) -> Self {
            Self(minor)
        }

        #[must_use]
        pub const fn minor(self) -> i64 {
            self.0
        }

        fn from_major_f64(value: f64) -> Result<Self, String> {
            if !value.is_finite() {
                return Err(format!("invalid amount: {value}"));
            }
            let minor = (value * 100.0).round();
            if minor.abs() > 9.0e15 {
                return Err(format!("amount too large: {value}"));
            }
            Ok(Self(minor as i64))
        }
    }

    impl fmt::Display for Amount {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let sign = if self.0 < 0 { "-" } else { "" };
            let abs = self.0.unsigned_abs();
            write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
        }
    }

    impl Serialize for Amount {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_f64(self.0 as f64 / 100.0)
        }
    }

    impl<'de> Deserialize<'de> for Amount {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            #[derive(Deserialize)]
            #[serde(untagged)]
            enum Raw {
                Int(i64),
                Float(f64),
                Text(String),
            }

            match Raw::deserialize(deserializer)? {
                Raw::Int(major) => major
                    .checked_mul(100)
                    .map(Self)
                    .ok_or_else(|| de::Error::custom(format!("amount too large: {major}"))),
                Raw::Float(major) => Self::from_major_f64(major).map_err(de::Error::custom),
                Raw::Text(text) => {
                    let major = text
                        .trim()
                        .parse::<f64>()
                        .map_err(|_| de::Error::custom(format!("invalid amount: {text:?}")))?;
                    Self::from_major_f64(major).map_err(de::Error::custom)
                }
            }
        }
    }
}

pub mod budget {
    use super::*;
    use crate::amount::Amount;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum BudgetSection {
        Revenus,
        ChargesFixes,
        ChargesVariables,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BudgetEntry {
        pub id: i64,
        pub budget_id: i64,
        pub section: BudgetSection,
        pub category: Option<String>,
        pub label: String,
        pub amount: Amount,
        pub sort_order: i32,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BudgetDebt {
        pub id: i64,
        pub budget_id: i64,
        #[serde(rename = "type")]
        pub kind: String,
        pub organisme: String,
        pub mensualite: Amount,
        pub sort_order: i32,
    }

    /// A user's budget as returned by `GET /budgets`.
    ///
    /// The API omits `entries`/`debts` entirely for a fresh budget.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Budget {
        pub id: i64,
        pub user_id: i64,
        pub nombre_personnes: i64,
        pub notes: Option<String>,
        #[serde(default)]
        pub entries: Vec<BudgetEntry>,
        #[serde(default)]
        pub debts: Vec<BudgetDebt>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BudgetEntryForm {
        pub section: BudgetSection,
        pub category: String,
        pub label: String,
        pub amount: Amount,
        pub sort_order: i32,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BudgetDebtForm {
        #[serde(rename = "type")]
        pub kind: String,
        pub organisme: String,
        pub mensualite: Amount,
        pub sort_order: i32,
    }

    /// Request body for `POST /budgets`.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BudgetForm {
        pub nombre_personnes: i64,
        pub notes: String,
        pub entries: Vec<BudgetEntryForm>,
        pub debts: Vec<BudgetDebtForm>,
    }

    /// Request body for `PATCH /budgets/{id}`; absent fields are left as-is.
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BudgetPatch {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub nombre_personnes: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub notes: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub entries: Option<Vec<BudgetEntryForm>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub debts: Option<Vec<BudgetDebtForm>>,
    }
}

pub mod dashboard {
    use std::fmt;

    use serde::{
        Deserializer, Serializer,
        de::{MapAccess, Visitor},
        ser::SerializeMap,
    };

    use super::*;
    use crate::amount::Amount;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct DashboardBudget {
        pub id: i64,
        pub nombre_personnes: i64,
        pub notes: Option<String>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Totaux {
        pub revenus: Amount,
        pub charges_fixes: Amount,
        pub charges_variables: Amount,
        pub total_mensualites_dettes: Amount,
        pub total_charges: Amount,
        pub reste_a_vivre: Amount,
        pub reste_a_vivre_par_personne: Amount,
    }

    /// Ratios in percent, e.g. `7.89`.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Indicateurs {
        pub taux_endettement: f64,
        pub ratio_charges_revenus: f64,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum RecommandationLevel {
        Success,
        Warning,
        Danger,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct Recommandation {
        pub level: RecommandationLevel,
        pub message: String,
    }

    /// JSON object of `label -> amount`, kept in document order.
    #[derive(Clone, Debug, Default, PartialEq, Eq)]
    pub struct AmountMap(pub Vec<(String, Amount)>);

    impl Serialize for AmountMap {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(Some(self.0.len()))?;
            for (key, value) in &self.0 {
                map.serialize_entry(key, value)?;
            }
            map.end()
        }
    }

    impl<'de> Deserialize<'de> for AmountMap {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            struct AmountMapVisitor;

            impl<'de> Visitor<'de> for AmountMapVisitor {
                type Value = AmountMap;

                fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str("an object of label to amount")
                }

                fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<AmountMap, A::Error> {
                    let mut items = Vec::with_capacity(access.size_hint().unwrap_or(0));
                    while let Some((key, value)) = access.next_entry::<String, Amount>()? {
                        items.push((key, value));
                    }
                    Ok(AmountMap(items))
                }
            }

            deserializer.deserialize_map(AmountMapVisitor)
        }
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Details {
        pub charges_fixes_par_categorie: AmountMap,
        pub revenus_par_categorie: AmountMap,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub revenus_par_entree: Option<AmountMap>,
    }

    /// Pre-aggregated dashboard from `GET /budgets/dashboard`.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct BudgetDashboard {
        pub budget: DashboardBudget,
        pub totaux: Totaux,
        pub indicateurs: Indicateurs,
        pub recommandation: Recommandation,
        pub details: Details,
    }
}

pub mod response {
    use super::*;

    /// Envelope wrapping every API response.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ApiResponse<T> {
        pub success: bool,
        #[serde(default)]
        pub message: String,
        pub data: Option<T>,
    }
}
