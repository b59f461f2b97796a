//! Display formatting for prices, percentages, supplies and dates.
//!
//! Formatting is one-way: values go in, display strings come out. Nothing
//! here parses a formatted string back.

use crate::constants::{INVALID_DATE, PLACEHOLDER};
use chrono::{DateTime, NaiveDate};
use num_format::{Locale, ToFormattedString};

/// Separators and date pattern of a display locale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberLocale {
    pub name: &'static str,
    pub group_separator: &'static str,
    pub decimal_separator: &'static str,
    /// chrono `strftime` pattern for calendar dates
    pub date_format: &'static str,
}

impl NumberLocale {
    /// South African English: `R 1 234,56`, `2024/03/14`
    pub const EN_ZA: NumberLocale = NumberLocale {
        name: "en-ZA",
        group_separator: " ",
        decimal_separator: ",",
        date_format: "%Y/%m/%d",
    };

    /// US English: `$1,234.56`, `3/14/2024`
    pub const EN_US: NumberLocale = NumberLocale {
        name: "en-US",
        group_separator: ",",
        decimal_separator: ".",
        date_format: "%-m/%-d/%Y",
    };

    /// Looks a locale up by its tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "en-ZA" | "en_ZA" => Some(Self::EN_ZA),
            "en-US" | "en_US" => Some(Self::EN_US),
            _ => None,
        }
    }
}

impl Default for NumberLocale {
    fn default() -> Self {
        Self::EN_ZA
    }
}

/// Returns the display symbol for a currency code
///
/// Unknown codes are shown as the code itself.
pub fn currency_symbol(code: &str) -> &str {
    match code {
        "ZAR" => "R",
        "USD" => "$",
        "EUR" => "€",
        "GBP" => "£",
        "JPY" => "¥",
        "CNY" => "CN¥",
        "INR" => "₹",
        "AUD" => "A$",
        "CAD" => "CA$",
        "NGN" => "₦",
        "KES" => "Ksh",
        "BRL" => "R$",
        _ => code,
    }
}

/// Locale-aware formatter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Formatter {
    locale: NumberLocale,
}

impl Formatter {
    pub fn new(locale: NumberLocale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> NumberLocale {
        self.locale
    }

    /// Currency amount with exactly 2 fractional digits
    pub fn currency(&self, amount: f64, currency_code: &str) -> String {
        self.currency_with_decimals(amount, currency_code, 2)
    }

    /// Currency amount with no fractional digits, for large magnitudes
    pub fn currency_no_fraction(&self, amount: f64, currency_code: &str) -> String {
        self.currency_with_decimals(amount, currency_code, 0)
    }

    /// Grouped integer digits without a currency symbol
    pub fn plain_number(&self, value: f64) -> String {
        if !value.is_finite() {
            return PLACEHOLDER.to_string();
        }
        let (negative, body) = self.number_parts(value, 0);
        if negative {
            format!("-{}", body)
        } else {
            body
        }
    }

    /// Two-decimal percentage with an explicit sign; zero counts as positive
    pub fn percentage(&self, value: f64) -> String {
        if !value.is_finite() {
            return PLACEHOLDER.to_string();
        }
        let sign = if value < 0.0 { '-' } else { '+' };
        let digits = format!("{:.2}", value.abs()).replace('.', self.locale.decimal_separator);
        format!("{}{}%", sign, digits)
    }

    /// Calendar date in the locale's pattern
    ///
    /// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates. Anything
    /// else yields `Invalid date`.
    pub fn date(&self, iso: &str) -> String {
        let iso = iso.trim();
        let date = DateTime::parse_from_rfc3339(iso)
            .map(|dt| dt.date_naive())
            .or_else(|_| NaiveDate::parse_from_str(iso, "%Y-%m-%d"));

        match date {
            Ok(date) => date.format(self.locale.date_format).to_string(),
            Err(_) => INVALID_DATE.to_string(),
        }
    }

    fn currency_with_decimals(&self, amount: f64, currency_code: &str, decimals: usize) -> String {
        if !amount.is_finite() {
            return PLACEHOLDER.to_string();
        }

        let symbol = currency_symbol(currency_code);
        let spacer = if symbol.chars().last().is_some_and(char::is_alphabetic) {
            " "
        } else {
            ""
        };
        let (negative, body) = self.number_parts(amount, decimals);
        let sign = if negative { "-" } else { "" };

        format!("{}{}{}{}", sign, symbol, spacer, body)
    }

    /// Rounds to `decimals`, groups the integer part and swaps in the
    /// locale's decimal separator. The sign is dropped when the rounded
    /// value is zero.
    fn number_parts(&self, value: f64, decimals: usize) -> (bool, String) {
        let formatted = format!("{:.1$}", value.abs(), decimals);
        let negative = value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0');

        let body = match formatted.split_once('.') {
            Some((integer, fraction)) => format!(
                "{}{}{}",
                self.group_digits(integer),
                self.locale.decimal_separator,
                fraction
            ),
            None => self.group_digits(&formatted),
        };

        (negative, body)
    }

    /// Digits beyond `u128` are left ungrouped
    fn group_digits(&self, digits: &str) -> String {
        match digits.parse::<u128>() {
            Ok(value) => value
                .to_formatted_string(&Locale::en)
                .replace(',', self.locale.group_separator),
            Err(_) => digits.to_string(),
        }
    }
}

/// [`Formatter::currency`] in the default locale
pub fn format_currency(amount: f64, currency_code: &str) -> String {
    Formatter::default().currency(amount, currency_code)
}

/// [`Formatter::currency_no_fraction`] in the default locale
pub fn format_currency_no_fraction(amount: f64, currency_code: &str) -> String {
    Formatter::default().currency_no_fraction(amount, currency_code)
}

/// [`Formatter::plain_number`] in the default locale
pub fn format_plain_number(value: f64) -> String {
    Formatter::default().plain_number(value)
}

/// [`Formatter::percentage`] in the default locale
pub fn format_percentage(value: f64) -> String {
    Formatter::default().percentage(value)
}

/// [`Formatter::date`] in the default locale
pub fn format_date(iso: &str) -> String {
    Formatter::default().date(iso)
}
