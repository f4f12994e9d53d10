//! Prices in the store currency using decimal arithmetic.
//!
//! The backend stores a display string (`price`, e.g. `"$1.250.000"`) next to
//! a numeric value (`priceNumeric`). Totals are always computed from the
//! numeric value; the text is only a fallback when the number is missing.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (pesos, dollars).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in Colombian pesos.
    #[must_use]
    pub const fn cop(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::COP)
    }

    /// Format for display.
    ///
    /// COP uses dots for thousands and no decimals (`$1.250.000`), USD uses
    /// commas and two decimals (`$1,250.00`).
    #[must_use]
    pub fn display(&self) -> String {
        let negative = self.amount.is_sign_negative() && !self.amount.is_zero();
        let abs = self.amount.abs();
        let (int_part, frac_part) = match self.currency_code {
            CurrencyCode::COP => (
                abs.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
                None,
            ),
            CurrencyCode::USD => {
                let rounded = abs.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
                let cents = ((rounded - rounded.trunc()) * Decimal::ONE_HUNDRED)
                    .round()
                    .to_u32()
                    .unwrap_or(0);
                (rounded.trunc(), Some(cents))
            }
        };

        let grouped = group_thousands(&int_part.to_string(), self.currency_code.group_separator());
        let sign = if negative { "-" } else { "" };
        match frac_part {
            Some(cents) => format!("{sign}${grouped}.{cents:02}"),
            None => format!("{sign}${grouped}"),
        }
    }

    /// Amount in cents as required by the Wompi widget (`amount-in-cents`).
    ///
    /// Returns `None` if the amount does not fit in an `i64`.
    #[must_use]
    pub fn amount_in_cents(&self) -> Option<i64> {
        (self.amount * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
    }
}

/// ISO 4217 currency codes accepted by the payment widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    COP,
    USD,
}

impl CurrencyCode {
    /// Currency code as sent to the payment provider.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::COP => "COP",
            Self::USD => "USD",
        }
    }

    const fn group_separator(self) -> char {
        match self {
            Self::COP => '.',
            Self::USD => ',',
        }
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "COP" => Ok(Self::COP),
            "USD" => Ok(Self::USD),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

fn group_thousands(digits: &str, separator: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}

/// Extract a numeric amount from a display price such as `"$1.200.000"`,
/// `"COP 2,350,000"` or `"$1.200.000,50"`.
///
/// The last `.` or `,` is treated as a decimal separator only when it is
/// followed by one or two digits; every other separator groups thousands.
#[must_use]
pub fn parse_price_text(text: &str) -> Option<Decimal> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let (int_part, frac_part) = match cleaned.rfind(['.', ',']) {
        Some(pos) => {
            let tail = cleaned.get(pos + 1..).unwrap_or("");
            if (1..=2).contains(&tail.len()) {
                (cleaned.get(..pos).unwrap_or(""), tail)
            } else {
                (cleaned.as_str(), "")
            }
        }
        None => (cleaned.as_str(), ""),
    };

    let int_digits: String = int_part.chars().filter(char::is_ascii_digit).collect();
    let normalized = if frac_part.is_empty() {
        int_digits
    } else {
        format!(
            "{}.{frac_part}",
            if int_digits.is_empty() { "0" } else { &int_digits }
        )
    };
    normalized.parse::<Decimal>().ok()
}
