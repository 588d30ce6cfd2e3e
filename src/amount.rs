use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{LedgerError, Result};

const INVALID_AMOUNT: &str = "Please enter a valid opening amount (e.g., 100 or 100.00)";

fn submit_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+(\.\d{1,2})?$").expect("static regex"))
}

fn typing_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d*(\.\d{0,2})?$").expect("static regex"))
}

/// Non-negative money value with exactly two fraction digits, held in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Amount(u64);

impl Amount {
    pub fn cents(self) -> u64 {
        self.0
    }

    /// Validate user input and normalize it to two decimals.
    /// `"100"` becomes 100.00 and `"100.5"` becomes 100.50.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if !submit_pattern().is_match(input) {
            return Err(LedgerError::validation(INVALID_AMOUNT));
        }
        let (whole, frac) = input.split_once('.').unwrap_or((input, ""));
        let whole: u64 = whole
            .parse()
            .map_err(|_| LedgerError::validation(INVALID_AMOUNT))?;
        let frac: u64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<u64>().unwrap_or(0) * 10,
            _ => frac.parse().unwrap_or(0),
        };
        whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac))
            .map(Self)
            .ok_or_else(|| LedgerError::validation(INVALID_AMOUNT))
    }

    /// Round a server-side float to the nearest cent; negatives clamp to zero.
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() && value > 0.0 {
            Self((value * 100.0).round() as u64)
        } else {
            Self(0)
        }
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cents = self.cents();
        write!(f, "{}.{:02}", cents / 100, cents % 100)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

/// Whether `input` is an acceptable intermediate state while typing an amount.
pub fn is_partial_amount(input: &str) -> bool {
    typing_pattern().is_match(input)
}

/// Accept amounts the server encodes either as numbers or decimal strings.
pub fn deserialize_loose<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Number(f64),
        Text(String),
        Null(()),
    }
    match Loose::deserialize(deserializer)? {
        Loose::Number(n) => Ok(n),
        Loose::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
        Loose::Null(()) => Ok(0.0),
    }
}
