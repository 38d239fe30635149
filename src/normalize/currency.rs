//! Monetary value parsing and locale-aware rendering.
//!
//! Two readings of a raw monetary string exist and are kept apart:
//! [`parse_currency`] treats the digits as an already scaled amount
//! (`"EUR5.00"` → `5.0`), [`format_currency`] treats them as minor units
//! (`"500"` → `5,00 €`). For values with exactly two decimals both agree.

use std::str::FromStr;

use super::error::NormalizeError;

/// Locales with known currency conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurrencyLocale {
    #[default]
    DeDe,
    DeAt,
    DeCh,
    EnUs,
    EnGb,
    FrFr,
}

struct Conventions {
    thousands: &'static str,
    decimal: char,
    symbol: &'static str,
    symbol_first: bool,
    spaced: bool,
}

impl CurrencyLocale {
    fn conventions(self) -> Conventions {
        match self {
            Self::DeDe => Conventions {
                thousands: ".",
                decimal: ',',
                symbol: "€",
                symbol_first: false,
                spaced: true,
            },
            Self::DeAt => Conventions {
                thousands: ".",
                decimal: ',',
                symbol: "€",
                symbol_first: true,
                spaced: true,
            },
            Self::DeCh => Conventions {
                thousands: "'",
                decimal: '.',
                symbol: "CHF",
                symbol_first: true,
                spaced: true,
            },
            Self::EnUs => Conventions {
                thousands: ",",
                decimal: '.',
                symbol: "$",
                symbol_first: true,
                spaced: false,
            },
            Self::EnGb => Conventions {
                thousands: ",",
                decimal: '.',
                symbol: "£",
                symbol_first: true,
                spaced: false,
            },
            Self::FrFr => Conventions {
                thousands: "\u{202f}",
                decimal: ',',
                symbol: "€",
                symbol_first: false,
                spaced: true,
            },
        }
    }

    /// Canonical tag, e.g. `de_DE`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DeDe => "de_DE",
            Self::DeAt => "de_AT",
            Self::DeCh => "de_CH",
            Self::EnUs => "en_US",
            Self::EnGb => "en_GB",
            Self::FrFr => "fr_FR",
        }
    }
}

impl FromStr for CurrencyLocale {
    type Err = NormalizeError;

    /// Accepts `de_DE`, `de-DE` and codeset-suffixed forms like `de_DE.UTF-8`.
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let base = tag.split('.').next().unwrap_or_default().replace('-', "_");
        match base.to_ascii_lowercase().as_str() {
            "de_de" => Ok(Self::DeDe),
            "de_at" => Ok(Self::DeAt),
            "de_ch" => Ok(Self::DeCh),
            "en_us" => Ok(Self::EnUs),
            "en_gb" => Ok(Self::EnGb),
            "fr_fr" => Ok(Self::FrFr),
            _ => Err(NormalizeError::UnknownLocale {
                tag: tag.to_string(),
            }),
        }
    }
}

/// Parses a monetary string such as `EUR5.00` into a number.
///
/// Every character that is not an ASCII digit, `.` or `-` is dropped before
/// parsing. Returns `0.0` when the remainder is not a number.
#[must_use]
pub fn parse_currency(raw: &str) -> f64 {
    let numeric: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    numeric.parse::<f64>().unwrap_or(0.0)
}

/// Renders a raw monetary string read as minor units.
///
/// `None` renders as an empty string. Otherwise only the digits are kept and
/// divided by 100; input without digits renders the locale's zero amount.
#[must_use]
pub fn format_currency(raw: Option<&str>, locale: CurrencyLocale) -> String {
    let Some(raw) = raw else {
        return String::new();
    };
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    let minor_units = digits.parse::<f64>().unwrap_or(0.0);
    format_amount(minor_units / 100.0, locale)
}

/// Renders an already scaled amount with grouping, two decimals and symbol.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn format_amount(value: f64, locale: CurrencyLocale) -> String {
    let conventions = locale.conventions();
    let value = if value.is_finite() { value } else { 0.0 };
    let cents = (value.abs() * 100.0).round() as u64;
    let negative = value < 0.0 && cents > 0;

    let units = group_thousands(cents / 100, conventions.thousands);
    let number = format!("{units}{}{:02}", conventions.decimal, cents % 100);
    let sign = if negative { "-" } else { "" };
    let gap = if conventions.spaced { " " } else { "" };

    if conventions.symbol_first {
        format!("{sign}{}{gap}{number}", conventions.symbol)
    } else {
        format!("{sign}{number}{gap}{}", conventions.symbol)
    }
}

fn group_thousands(value: u64, separator: &str) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 * separator.len());
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push_str(separator);
        }
        grouped.push(digit);
    }
    grouped
}
