use serde::{Deserialize, Serialize};

use crate::MoneyCents;

/// Ordered `label -> amount` totals, in first-seen order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakdown {
    items: Vec<(String, MoneyCents)>,
}

impl Breakdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `amount` to `key`, creating it at the end if missing.
    pub fn add(&mut self, key: &str, amount: MoneyCents) {
        match self.items.iter_mut().find(|(k, _)| k == key) {
            Some((_, total)) => *total += amount,
            None => self.items.push((key.to_string(), amount)),
        }
    }

    /// Appends `key` as its own item, suffixing ` (2)`, ` (3)`… when the key
    /// is already taken. Returns the key actually used.
    pub fn push_distinct(&mut self, key: &str, amount: MoneyCents) -> String {
        let mut candidate = key.to_string();
        let mut n = 2;
        while self.contains(&candidate) {
            candidate = format!("{key} ({n})");
            n += 1;
        }
        self.items.push((candidate.clone(), amount));
        candidate
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.iter().any(|(k, _)| k == key)
    }

    pub fn get(&self, key: &str) -> Option<MoneyCents> {
        self.items.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, MoneyCents)> {
        self.items.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn total(&self) -> MoneyCents {
        self.items.iter().map(|(_, v)| *v).sum()
    }

    /// Items with a strictly positive amount.
    pub fn positive(&self) -> impl Iterator<Item = (&str, MoneyCents)> {
        self.iter().filter(|(_, v)| v.is_positive())
    }
}

impl FromIterator<(String, MoneyCents)> for Breakdown {
    fn from_iter<T: IntoIterator<Item = (String, MoneyCents)>>(iter: T) -> Self {
        let mut breakdown = Self::new();
        for (key, amount) in iter {
            breakdown.add(&key, amount);
        }
        breakdown
    }
}
