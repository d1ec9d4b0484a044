//! Money handling with decimal arithmetic.
//!
//! All catalog prices are in euros and quoted with Spanish VAT (IVA, 21%).
//! Cart lines persist both the net and gross unit price, so the conversion
//! helpers here are the single place where the rate lives.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Spanish general VAT rate (21%).
pub const VAT_RATE: Decimal = Decimal::from_parts(21, 0, 0, false, 2);

/// Multiplier applied to net amounts to obtain gross amounts (1.21).
const VAT_MULTIPLIER: Decimal = Decimal::from_parts(121, 0, 0, false, 2);

/// Add VAT to a net amount. The result is not rounded.
#[must_use]
pub fn add_vat(net: Decimal) -> Decimal {
    net * VAT_MULTIPLIER
}

/// Remove VAT from a gross amount. The result is not rounded.
#[must_use]
pub fn remove_vat(gross: Decimal) -> Decimal {
    gross / VAT_MULTIPLIER
}

/// Round to cents, half away from zero.
#[must_use]
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (euros, not cents).
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

    /// Create a euro price.
    #[must_use]
    pub const fn eur(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::EUR)
    }

    /// Format the price the way `es-ES` renders currency.
    ///
    /// Decimal comma, `.` thousands grouping from five integer digits upward
    /// (Spanish locale convention), two decimals and a trailing symbol
    /// separated by a non-breaking space: `1234,50 €`, `12.345,00 €`.
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = round_cents(self.amount);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let fixed = format!("{:.2}", rounded.abs());
        let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

        let grouped = if int_part.len() >= 5 {
            group_thousands(int_part)
        } else {
            int_part.to_string()
        };

        let sign = if negative { "-" } else { "" };
        format!(
            "{sign}{grouped},{frac_part}\u{a0}{}",
            self.currency_code.symbol()
        )
    }
}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.display())
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    EUR,
    USD,
    GBP,
}

impl CurrencyCode {
    /// Currency symbol used in formatted prices.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::EUR => "€",
            Self::USD => "$",
            Self::GBP => "£",
        }
    }

    /// ISO code as stored in the database.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::EUR => "EUR",
            Self::USD => "USD",
            Self::GBP => "GBP",
        }
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "EUR" => Ok(Self::EUR),
            "USD" => Ok(Self::USD),
            "GBP" => Ok(Self::GBP),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vat_roundtrip() {
        let net = Decimal::new(1000, 2);
        let gross = add_vat(net);
        assert_eq!(gross, Decimal::new(1210, 2));
        assert_eq!(round_cents(remove_vat(gross)), net);
    }

    #[test]
    fn test_remove_vat_rounds_to_cents() {
        // 15.00 / 1.21 = 12.396...
        assert_eq!(round_cents(remove_vat(Decimal::new(1500, 2))), Decimal::new(1240, 2));
    }

    #[test]
    fn test_display_small_amounts() {
        assert_eq!(Price::eur(Decimal::new(1250, 2)).display(), "12,50\u{a0}€");
        assert_eq!(Price::eur(Decimal::ZERO).display(), "0,00\u{a0}€");
    }

    #[test]
    fn test_display_grouping_starts_at_five_digits() {
        assert_eq!(Price::eur(Decimal::new(123_450, 2)).display(), "1234,50\u{a0}€");
        assert_eq!(Price::eur(Decimal::new(1_234_500, 2)).display(), "12.345,00\u{a0}€");
        assert_eq!(
            Price::eur(Decimal::new(123_456_789, 2)).display(),
            "1.234.567,89\u{a0}€"
        );
    }

    #[test]
    fn test_display_rounds_half_away_from_zero() {
        assert_eq!(Price::eur(Decimal::new(10_005, 3)).display(), "10,01\u{a0}€");
        assert_eq!(Price::eur(Decimal::new(-2_505, 3)).display(), "-2,51\u{a0}€");
    }

    #[test]
    fn test_currency_code_parse() {
        assert_eq!("eur".parse::<CurrencyCode>(), Ok(CurrencyCode::EUR));
        assert!("JPY".parse::<CurrencyCode>().is_err());
    }
}
