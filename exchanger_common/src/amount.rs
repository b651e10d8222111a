use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

//--------------------------------------       Amount        ---------------------------------------------------------

/// A payout or deposit amount in the target currency's major unit.
///
/// Merchant ledgers report amounts as decimal floats, so this wraps an `f64` rather than a fixed-point integer.
/// Payout instructions must carry the amount as decimal text; use [`Amount::to_payout_string`] for that, never the
/// raw float.
#[derive(Debug, Clone, Copy, Default, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(f64);

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as an amount: {0}")]
pub struct AmountConversionError(String);

impl Amount {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Renders the amount as fixed six-decimal text for the payout wire format.
    pub fn to_payout_string(&self) -> String {
        format!("{:.6}", self.0)
    }

    /// Ledger records and requests are considered to carry the same amount when they agree to within half of the
    /// smallest wire-representable unit.
    pub fn matches(&self, other: Amount) -> bool {
        (self.0 - other.0).abs() < 5e-7
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl PartialEq for Amount {
    fn eq(&self, other: &Self) -> bool {
        self.matches(*other)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_payout_string())
    }
}

impl FromStr for Amount {
    type Err = AmountConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<f64>().map(Self).map_err(|e| AmountConversionError(format!("{s}: {e}")))
    }
}

//--------------------------------------       Ticker        ---------------------------------------------------------

/// A currency ticker, normalized to upper case (e.g. `USDT`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticker(String);

impl Ticker {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S: AsRef<str>> From<S> for Ticker {
    fn from(value: S) -> Self {
        Self(value.as_ref().to_uppercase())
    }
}

impl Display for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
