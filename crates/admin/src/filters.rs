//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use climatech_core::Price;
use rust_decimal::Decimal;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Format an amount in Colombian pesos (`$1.250.000`).
///
/// Values that are not numbers are printed unchanged.
///
/// Usage in templates: `{{ order.total|cop }}`
#[askama::filter_fn]
pub fn cop(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_cop(&value.to_string()))
}

fn format_cop(raw: &str) -> String {
    raw.trim()
        .parse::<Decimal>()
        .map_or_else(|_| raw.to_string(), |amount| Price::cop(amount).display())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cop() {
        assert_eq!(format_cop("1250000"), "$1.250.000");
        assert_eq!(format_cop("1250000.40"), "$1.250.000");
        assert_eq!(format_cop("a convenir"), "a convenir");
    }
}
