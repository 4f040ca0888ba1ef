use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{EngineError, MoneyCents, money::div_round};

/// A percentage held as integer hundredths of a percent (`789` = `7.89 %`).
///
/// Two decimals is the display precision of every dashboard indicator, so
/// rounding happens once, when the ratio is computed.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Percent(i64);

impl Percent {
    pub const ZERO: Percent = Percent(0);

    #[must_use]
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Self(hundredths)
    }

    /// A whole percentage (`33` = `33 %`).
    #[must_use]
    pub const fn whole(percent: i64) -> Self {
        Self(percent * 100)
    }

    #[must_use]
    pub const fn hundredths(self) -> i64 {
        self.0
    }

    /// `part / whole * 100`, rounded half away from zero to two decimals.
    ///
    /// A zero `whole` yields `0 %` rather than a division error. A ratio too
    /// large for an `i64` of hundredths is rejected.
    pub fn ratio(part: MoneyCents, whole: MoneyCents) -> Result<Self, EngineError> {
        if whole.is_zero() {
            return Ok(Self::ZERO);
        }
        let scaled = i128::from(part.cents()) * 10_000;
        let hundredths = div_round(scaled, i128::from(whole.cents()));
        i64::try_from(hundredths)
            .map(Self)
            .map_err(|_| EngineError::InvalidAmount(format!("ratio too large: {part} / {whole}")))
    }

    /// Converts a percentage received as a JSON number (`7.89`).
    pub fn from_f64(value: f64) -> Result<Self, EngineError> {
        if !value.is_finite() {
            return Err(EngineError::InvalidBudget(format!(
                "invalid percentage: {value}"
            )));
        }
        Ok(Self((value * 100.0).round() as i64))
    }

    #[must_use]
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Percent {
    /// Shortest decimal form, like a JavaScript number: `7.89`, `7.9`, `40`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let (whole, frac) = (abs / 100, abs % 100);
        if frac == 0 {
            write!(f, "{sign}{whole}")
        } else if frac % 10 == 0 {
            write!(f, "{sign}{whole}.{}", frac / 10)
        } else {
            write!(f, "{sign}{whole}.{frac:02}")
        }
    }
}
