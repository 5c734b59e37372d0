//! Core type definitions for payment requests.
//!
//! These types form the vocabulary of every request the builder signs.
//! Optional data is `Option`, not an empty string or a zero: "amount is
//! zero" and "amount was never set" are different requests.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

// ---------------------------------------------------------------------------
// OperationType
// ---------------------------------------------------------------------------

/// The logical operation a request performs, independent of gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationType {
    /// Reserve funds without capturing them.
    AuthorizeOnly,
    /// Capture a previous authorization.
    Debit,
    /// Authorize and capture in one step. What most checkouts do.
    AuthorizeAndDebit,
    /// Refund to the card.
    Credit,
    /// Cancel a previous operation before settlement.
    Cancel,
    /// Store a card on the gateway under a subscriber reference.
    RegisterSubscriber,
    /// Replace the card stored for a subscriber.
    UpdateSubscriber,
    /// Forget a subscriber.
    DeleteSubscriber,
}

impl OperationType {
    /// Every operation, in declaration order.
    pub const ALL: [OperationType; 8] = [
        Self::AuthorizeOnly,
        Self::Debit,
        Self::AuthorizeAndDebit,
        Self::Credit,
        Self::Cancel,
        Self::RegisterSubscriber,
        Self::UpdateSubscriber,
        Self::DeleteSubscriber,
    ];

    /// Everything but subscriber deletion moves money and needs an amount
    /// and a reference.
    pub fn requires_amount(&self) -> bool {
        !matches!(self, Self::DeleteSubscriber)
    }

    /// Operations that act on a stored subscriber record by definition.
    pub fn is_subscriber_lifecycle(&self) -> bool {
        matches!(
            self,
            Self::RegisterSubscriber | Self::UpdateSubscriber | Self::DeleteSubscriber
        )
    }

    /// Operations that follow up on an earlier gateway transaction.
    pub fn requires_original_transaction(&self) -> bool {
        matches!(self, Self::Debit | Self::Cancel)
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthorizeOnly => write!(f, "AuthorizeOnly"),
            Self::Debit => write!(f, "Debit"),
            Self::AuthorizeAndDebit => write!(f, "AuthorizeAndDebit"),
            Self::Credit => write!(f, "Credit"),
            Self::Cancel => write!(f, "Cancel"),
            Self::RegisterSubscriber => write!(f, "RegisterSubscriber"),
            Self::UpdateSubscriber => write!(f, "UpdateSubscriber"),
            Self::DeleteSubscriber => write!(f, "DeleteSubscriber"),
        }
    }
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// How a signed request reaches the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    /// Auto-submitting HTML form posted by the customer's browser.
    Form,
    /// Redirect URL with the fields in the query string.
    Url,
    /// Synchronous server-to-server POST.
    DirectHttp,
}

impl Channel {
    /// Form and Url both land on the hosted payment page.
    pub fn is_hosted_page(&self) -> bool {
        matches!(self, Self::Form | Self::Url)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Form => write!(f, "form"),
            Self::Url => write!(f, "url"),
            Self::DirectHttp => write!(f, "direct"),
        }
    }
}

// ---------------------------------------------------------------------------
// Amount
// ---------------------------------------------------------------------------

/// A decimal amount and its alphabetic ISO-4217 currency.
///
/// The value is kept as a decimal because that is what the merchant's
/// order says; conversion to minor units happens at signing time through
/// the [`crate::currency::CurrencyService`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    pub value: Decimal,
    pub currency: String,
}

impl Amount {
    pub fn new(value: Decimal, currency: impl Into<String>) -> Self {
        Self {
            value,
            currency: currency.into().trim().to_ascii_uppercase(),
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.currency)
    }
}

// ---------------------------------------------------------------------------
// Payment sources
// ---------------------------------------------------------------------------

/// Raw card data. Only ever sent over the direct channel.
///
/// Zeroized on drop; `Debug` shows the last four digits only.
#[derive(Clone)]
pub struct CardData {
    pan: Zeroizing<String>,
    expiry: String,
    cvv: Option<Zeroizing<String>>,
}

impl CardData {
    /// `expiry` is `MMYY`.
    pub fn new(pan: impl Into<String>, expiry: impl Into<String>, cvv: Option<String>) -> Self {
        Self {
            pan: Zeroizing::new(pan.into().chars().filter(|c| !c.is_whitespace()).collect()),
            expiry: expiry.into(),
            cvv: cvv.map(Zeroizing::new),
        }
    }

    pub fn pan(&self) -> &str {
        &self.pan
    }

    pub fn expiry(&self) -> &str {
        &self.expiry
    }

    pub fn cvv(&self) -> Option<&str> {
        self.cvv.as_ref().map(|c| c.as_str())
    }

    /// `497010******0001`-style rendering for logs and receipts.
    pub fn masked(&self) -> String {
        mask_pan(&self.pan)
    }
}

impl fmt::Debug for CardData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardData")
            .field("pan", &self.masked())
            .field("expiry", &self.expiry)
            .field("cvv", &self.cvv.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Keeps the first six and last four digits, masks the rest.
pub fn mask_pan(pan: &str) -> String {
    let len = pan.chars().count();
    if len <= 10 {
        return "*".repeat(len);
    }
    pan.chars()
        .enumerate()
        .map(|(i, c)| if i < 6 || i >= len - 4 { c } else { '*' })
        .collect()
}

/// A card previously stored on the gateway, as returned at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberToken {
    /// Opaque gateway-issued token standing in for the PAN.
    pub token: String,
    /// `MMYY` of the stored card.
    pub expiry: String,
}

impl SubscriberToken {
    pub fn new(token: impl Into<String>, expiry: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expiry: expiry.into(),
        }
    }
}

/// Where the money comes from. Raw card data and a stored reference are
/// mutually exclusive by construction.
#[derive(Debug, Clone)]
pub enum PaymentSource {
    Card(CardData),
    Subscriber(SubscriberToken),
}

impl PaymentSource {
    pub fn is_stored_subscriber(&self) -> bool {
        matches!(self, Self::Subscriber(_))
    }
}

// ---------------------------------------------------------------------------
// Follow-up references and URLs
// ---------------------------------------------------------------------------

/// Identifiers of an earlier gateway transaction, for captures and cancels.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OriginalTransaction {
    /// `NUMAPPEL` on the modern gateway.
    pub call_number: Option<String>,
    /// `NUMTRANS` on the modern gateway.
    pub transaction_number: Option<String>,
    /// Date the original order was placed. The legacy capture signs it.
    pub order_date: Option<chrono::NaiveDate>,
}

/// Where the gateway sends the customer's browser afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReturnUrls {
    pub ok: Option<String>,
    pub refused: Option<String>,
    pub cancelled: Option<String>,
    pub pending: Option<String>,
    pub home: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_operations_are_distinct() {
        let mut ops = OperationType::ALL.to_vec();
        ops.dedup();
        assert_eq!(ops.len(), 8);
    }

    #[test]
    fn only_delete_subscriber_skips_amount() {
        for op in OperationType::ALL {
            assert_eq!(op.requires_amount(), op != OperationType::DeleteSubscriber);
        }
    }

    #[test]
    fn amount_currency_is_normalized() {
        let a = Amount::new(Decimal::new(1250, 2), " eur ");
        assert_eq!(a.currency, "EUR");
        assert_eq!(a.to_string(), "12.50 EUR");
    }

    #[test]
    fn pan_is_masked() {
        assert_eq!(mask_pan("4970101122334455"), "497010******4455");
        assert_eq!(mask_pan("1234"), "****");
    }

    #[test]
    fn card_debug_hides_pan_and_cvv() {
        let card = CardData::new("4970 1011 2233 4455", "1228", Some("123".into()));
        assert_eq!(card.pan(), "4970101122334455");
        let debug = format!("{:?}", card);
        assert!(!debug.contains("4970101122334455"));
        assert!(!debug.contains("123\""));
        assert!(debug.contains("497010******4455"));
    }

    #[test]
    fn channel_classification() {
        assert!(Channel::Form.is_hosted_page());
        assert!(Channel::Url.is_hosted_page());
        assert!(!Channel::DirectHttp.is_hosted_page());
    }
}
