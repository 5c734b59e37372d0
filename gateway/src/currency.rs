//! Currency collaborator.
//!
//! The gateways want two things the request does not carry: the ISO-4217
//! numeric code (the modern gateway has no idea what "EUR" means) and the
//! number of minor units, to turn `12.50` into `1250`. Where those come from
//! is the integrator's business; [`Iso4217`] covers the currencies card
//! acquirers in the gateways' markets actually settle.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::GatewayError;

/// Looks up currency metadata by alphabetic ISO-4217 code.
pub trait CurrencyService: Send + Sync {
    /// Three-digit numeric code, e.g. `"978"` for `"EUR"`.
    fn numeric_code(&self, alpha: &str) -> Option<&str>;

    /// Number of decimal places in the minor unit (2 for EUR, 0 for JPY).
    fn minor_units(&self, alpha: &str) -> Option<u32>;
}

/// Static ISO-4217 subset.
#[derive(Debug, Clone, Copy, Default)]
pub struct Iso4217;

/// `(alpha, numeric, minor units)`.
const ISO_4217: &[(&str, &str, u32)] = &[
    ("EUR", "978", 2),
    ("USD", "840", 2),
    ("GBP", "826", 2),
    ("CHF", "756", 2),
    ("JPY", "392", 0),
    ("CAD", "124", 2),
    ("AUD", "036", 2),
    ("SEK", "752", 2),
    ("DKK", "208", 2),
    ("NOK", "578", 2),
    ("XPF", "953", 0),
    ("XOF", "952", 0),
    ("MAD", "504", 2),
    ("TND", "788", 3),
    ("KWD", "414", 3),
    ("BRL", "986", 2),
];

impl Iso4217 {
    fn find(alpha: &str) -> Option<&'static (&'static str, &'static str, u32)> {
        ISO_4217
            .iter()
            .find(|(code, _, _)| code.eq_ignore_ascii_case(alpha))
    }
}

impl CurrencyService for Iso4217 {
    fn numeric_code(&self, alpha: &str) -> Option<&str> {
        Self::find(alpha).map(|(_, numeric, _)| *numeric)
    }

    fn minor_units(&self, alpha: &str) -> Option<u32> {
        Self::find(alpha).map(|(_, _, units)| *units)
    }
}

/// Converts a decimal amount to an integer count of minor units.
///
/// Rejects negative amounts and amounts with more decimals than the
/// currency has. Rounding would silently change what the customer pays.
pub fn to_minor_units(value: Decimal, minor_units: u32) -> Result<u64, GatewayError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(GatewayError::invalid_field("amount", "must not be negative"));
    }
    let normalized = value.normalize();
    if normalized.scale() > minor_units {
        return Err(GatewayError::invalid_field(
            "amount",
            format!("has more than {} decimal places", minor_units),
        ));
    }

    let factor = 10u64
        .checked_pow(minor_units)
        .map(Decimal::from)
        .ok_or_else(|| {
            GatewayError::invalid_field(
                "currency",
                format!("{} minor units is not a usable exponent", minor_units),
            )
        })?;
    let scaled = normalized
        .checked_mul(factor)
        .ok_or_else(|| GatewayError::invalid_field("amount", "is too large"))?;
    scaled
        .to_u64()
        .ok_or_else(|| GatewayError::invalid_field("amount", "is too large"))
}

/// Renders a decimal amount with exactly `minor_units` decimals: `12.5`
/// becomes `"12.50"` for EUR, `1000` stays `"1000"` for JPY.
pub fn to_fixed_decimal(value: Decimal, minor_units: u32) -> String {
    let mut fixed = value;
    fixed.rescale(minor_units);
    fixed.to_string()
}
