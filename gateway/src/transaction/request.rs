//! Validated transaction requests.
//!
//! A [`TransactionRequest`] can only be obtained through
//! [`RequestDraft::finish`], which checks every gateway-independent rule in
//! one pass and reports all failures together. Gateway-specific rules
//! (reference length, legacy return URLs, channel support) are checked by
//! the builder, which knows the merchant's gateway.

use chrono::{DateTime, Utc};
use url::Url;

use super::types::{Amount, OperationType, OriginalTransaction, PaymentSource, ReturnUrls};
use crate::config;
use crate::error::{GatewayError, ValidationErrors};

/// An immutable, validated payment request.
#[derive(Debug, Clone)]
pub struct TransactionRequest {
    operation: OperationType,
    amount: Option<Amount>,
    reference: Option<String>,
    free_text: Option<String>,
    language: Option<String>,
    customer_email: Option<String>,
    payment_source: Option<PaymentSource>,
    subscriber_id: Option<String>,
    original: Option<OriginalTransaction>,
    return_urls: ReturnUrls,
    callback_url: Option<String>,
    timestamp: DateTime<Utc>,
    question_number: Option<u64>,
}

impl TransactionRequest {
    /// Starts a new request for `operation`.
    ///
    /// ```
    /// use paygate::transaction::{OperationType, TransactionRequest};
    /// use paygate::transaction::types::Amount;
    /// use rust_decimal::Decimal;
    ///
    /// let request = TransactionRequest::draft(OperationType::AuthorizeAndDebit)
    ///     .amount(Amount::new(Decimal::new(1250, 2), "EUR"))
    ///     .reference("ORDER-042")
    ///     .finish()
    ///     .unwrap();
    /// assert_eq!(request.reference(), Some("ORDER-042"));
    /// ```
    pub fn draft(operation: OperationType) -> RequestDraft {
        RequestDraft {
            operation,
            amount: None,
            reference: None,
            free_text: None,
            language: None,
            customer_email: None,
            payment_source: None,
            subscriber_id: None,
            original: None,
            return_urls: ReturnUrls::default(),
            callback_url: None,
            timestamp: None,
            question_number: None,
        }
    }

    pub fn operation(&self) -> OperationType {
        self.operation
    }

    pub fn amount(&self) -> Option<&Amount> {
        self.amount.as_ref()
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn free_text(&self) -> Option<&str> {
        self.free_text.as_deref()
    }

    /// The language as supplied, before normalization.
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn customer_email(&self) -> Option<&str> {
        self.customer_email.as_deref()
    }

    pub fn payment_source(&self) -> Option<&PaymentSource> {
        self.payment_source.as_ref()
    }

    /// `true` when the payment runs against a stored subscriber.
    pub fn uses_stored_subscriber(&self) -> bool {
        self.operation.is_subscriber_lifecycle()
            || self
                .payment_source
                .as_ref()
                .map(PaymentSource::is_stored_subscriber)
                .unwrap_or(false)
    }

    pub fn subscriber_id(&self) -> Option<&str> {
        self.subscriber_id.as_deref()
    }

    pub fn original(&self) -> Option<&OriginalTransaction> {
        self.original.as_ref()
    }

    pub fn return_urls(&self) -> &ReturnUrls {
        &self.return_urls
    }

    pub fn callback_url(&self) -> Option<&str> {
        self.callback_url.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn question_number(&self) -> Option<u64> {
        self.question_number
    }
}

/// Unvalidated request under construction. Consumed by [`finish`](Self::finish).
#[derive(Debug, Clone)]
pub struct RequestDraft {
    operation: OperationType,
    amount: Option<Amount>,
    reference: Option<String>,
    free_text: Option<String>,
    language: Option<String>,
    customer_email: Option<String>,
    payment_source: Option<PaymentSource>,
    subscriber_id: Option<String>,
    original: Option<OriginalTransaction>,
    return_urls: ReturnUrls,
    callback_url: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    question_number: Option<u64>,
}

impl RequestDraft {
    pub fn amount(mut self, amount: Amount) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn free_text(mut self, text: impl Into<String>) -> Self {
        self.free_text = Some(text.into());
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn customer_email(mut self, email: impl Into<String>) -> Self {
        self.customer_email = Some(email.into());
        self
    }

    pub fn payment_source(mut self, source: PaymentSource) -> Self {
        self.payment_source = Some(source);
        self
    }

    /// Merchant-side subscriber reference (`REFABONNE`).
    pub fn subscriber_id(mut self, id: impl Into<String>) -> Self {
        self.subscriber_id = Some(id.into());
        self
    }

    pub fn original_transaction(mut self, original: OriginalTransaction) -> Self {
        self.original = Some(original);
        self
    }

    pub fn return_urls(mut self, urls: ReturnUrls) -> Self {
        self.return_urls = urls;
        self
    }

    /// Server-to-server notification URL (IPN).
    pub fn callback_url(mut self, url: impl Into<String>) -> Self {
        self.callback_url = Some(url.into());
        self
    }

    /// Defaults to the time [`finish`](Self::finish) is called.
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Modern direct `NUMQUESTION`. Derived from the timestamp when unset.
    pub fn question_number(mut self, number: u64) -> Self {
        self.question_number = Some(number);
        self
    }

    /// Validates the draft and freezes it.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Validation`] listing every rejected field.
    pub fn finish(self) -> Result<TransactionRequest, GatewayError> {
        let mut errors = ValidationErrors::new();
        let op = self.operation;

        let reference = non_blank(self.reference);
        let subscriber_id = non_blank(self.subscriber_id);
        let customer_email = non_blank(self.customer_email);
        let free_text = self.free_text.filter(|t| !t.is_empty());
        let language = non_blank(self.language);

        if op.requires_amount() {
            match &self.amount {
                None => errors.push("amount", "is required"),
                Some(amount) => {
                    if amount.value.is_sign_negative() && !amount.value.is_zero() {
                        errors.push("amount", "must not be negative");
                    }
                    if amount.currency.len() != 3
                        || !amount.currency.bytes().all(|b| b.is_ascii_alphabetic())
                    {
                        errors.push("currency", "must be a three-letter ISO-4217 code");
                    }
                }
            }
            if reference.is_none() {
                errors.push("reference", "is required");
            }
        }

        if let Some(reference) = &reference {
            if !reference
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
            {
                errors.push("reference", "may only contain letters, digits, '-' and '_'");
            }
        }

        if let Some(email) = &customer_email {
            if !looks_like_email(email) {
                errors.push("customer_email", "is not an e-mail address");
            }
        }

        if op.is_subscriber_lifecycle() && subscriber_id.is_none() {
            errors.push("subscriber_id", "is required for subscriber operations");
        }

        if matches!(
            op,
            OperationType::RegisterSubscriber | OperationType::UpdateSubscriber
        ) && !matches!(self.payment_source, Some(PaymentSource::Card(_)))
        {
            errors.push("payment_source", "card data is required to store a subscriber");
        }

        if let Some(PaymentSource::Card(card)) = &self.payment_source {
            if card.pan().len() < 12
                || card.pan().len() > 19
                || !card.pan().bytes().all(|b| b.is_ascii_digit())
            {
                errors.push("payment_source", "card number must be 12 to 19 digits");
            }
            if !is_mmyy(card.expiry()) {
                errors.push("payment_source", "card expiry must be MMYY");
            }
        }

        if op.requires_original_transaction() && self.original.is_none() {
            errors.push("original", "an earlier gateway transaction is required");
        }

        if let Some(number) = self.question_number {
            if number > config::MODERN_DIRECT_NUMERIC_MAX {
                errors.push(
                    "question_number",
                    format!("must be at most {} digits", config::MODERN_DIRECT_NUMERIC_WIDTH),
                );
            }
        }

        let urls = &self.return_urls;
        for (field, value) in [
            ("return_urls.ok", &urls.ok),
            ("return_urls.refused", &urls.refused),
            ("return_urls.cancelled", &urls.cancelled),
            ("return_urls.pending", &urls.pending),
            ("return_urls.home", &urls.home),
            ("callback_url", &self.callback_url),
        ] {
            if let Some(value) = value {
                if !is_absolute_http_url(value) {
                    errors.push(field, "must be an absolute http(s) URL");
                }
            }
        }

        errors.into_result()?;

        Ok(TransactionRequest {
            operation: op,
            amount: self.amount,
            reference,
            free_text,
            language,
            customer_email,
            payment_source: self.payment_source,
            subscriber_id,
            original: self.original,
            return_urls: self.return_urls,
            callback_url: self.callback_url,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            question_number: self.question_number,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

fn is_mmyy(expiry: &str) -> bool {
    if expiry.len() != 4 || !expiry.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    matches!(expiry[..2].parse::<u8>(), Ok(1..=12))
}

fn is_absolute_http_url(value: &str) -> bool {
    Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false)
}
