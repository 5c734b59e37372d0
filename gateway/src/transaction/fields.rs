//! Canonical field assembly.
//!
//! Each gateway signs a fixed, ordered list of fields, and that list is
//! never the same as the set of fields actually posted:
//!
//! - the legacy payment MAC covers ten reserved split-payment segments that
//!   are never sent, and the return URLs are posted but not signed;
//! - the legacy capture MAC folds three amount fields into one segment and
//!   ends with an empty one;
//! - the modern gateway signs exactly what it receives, as `KEY=value`
//!   pairs, minus the signature field itself.
//!
//! [`SignedPayload`] keeps both lists so the signed message can always be
//! rebuilt from the payload alone.

use chrono::Timelike;

use super::operation::OperationCode;
use super::request::TransactionRequest;
use super::types::{Channel, OperationType, PaymentSource};
use crate::config;
use crate::crypto::keys::SigningKey;
use crate::crypto::signatures::{self, canonical_message};
use crate::currency::{to_fixed_decimal, to_minor_units, CurrencyService};
use crate::error::{GatewayError, ValidationErrors};
use crate::merchant::{GatewayVariant, MerchantCredentials};

/// Name of the posted signature field, per gateway and channel.
pub const LEGACY_SIGNATURE_FIELD: &str = "MAC";
pub const MODERN_PAGE_SIGNATURE_FIELD: &str = "PBX_HMAC";
pub const MODERN_DIRECT_SIGNATURE_FIELD: &str = "HMAC";

/// Legacy free text field. The only value the form entity-encodes.
pub const LEGACY_FREE_TEXT_FIELD: &str = "texte-libre";

/// Reserved legacy segments between `mail` and the end of the MAC string.
const LEGACY_RESERVED_SEGMENTS: [&str; 10] = [
    "nbrech",
    "dateech1",
    "montantech1",
    "dateech2",
    "montantech2",
    "dateech3",
    "montantech3",
    "dateech4",
    "montantech4",
    "options",
];

// ---------------------------------------------------------------------------
// SignedPayload
// ---------------------------------------------------------------------------

/// A signed field set, ready to render or send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPayload {
    variant: GatewayVariant,
    signed: Vec<(String, String)>,
    posted: Vec<(String, String)>,
    signature_field: &'static str,
    signature: String,
}

impl SignedPayload {
    /// Signs `signed` with `key` and remembers what to post.
    pub fn new(
        variant: GatewayVariant,
        signed: Vec<(String, String)>,
        posted: Vec<(String, String)>,
        signature_field: &'static str,
        key: &SigningKey,
    ) -> Self {
        let segments = segments(variant, &signed);
        let signature = signatures::sign(&segments, variant.delimiter(), key, variant.mac_scheme());
        Self {
            variant,
            signed,
            posted,
            signature_field,
            signature,
        }
    }

    pub fn variant(&self) -> GatewayVariant {
        self.variant
    }

    /// The signed fields, in signing order.
    pub fn signed_fields(&self) -> &[(String, String)] {
        &self.signed
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn signature_field(&self) -> &'static str {
        self.signature_field
    }

    pub fn delimiter(&self) -> &'static str {
        self.variant.delimiter()
    }

    /// Value of a posted field, if present.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.posted
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The exact string that was signed.
    pub fn message(&self) -> String {
        canonical_message(&segments(self.variant, &self.signed), self.delimiter())
    }

    /// Every field to post, signature last.
    pub fn posted_fields(&self) -> Vec<(String, String)> {
        let mut fields = self.posted.clone();
        fields.push((self.signature_field.to_string(), self.signature.clone()));
        fields
    }

    /// Recomputes the signature with `credentials` and compares.
    pub fn verify(&self, credentials: &MerchantCredentials) -> Result<bool, GatewayError> {
        if credentials.variant() != self.variant {
            return Err(GatewayError::Configuration(format!(
                "payload was signed for the {} gateway, credentials are for {}",
                self.variant,
                credentials.variant()
            )));
        }
        let key = credentials.signing_key()?;
        Ok(signatures::verify(
            &segments(self.variant, &self.signed),
            self.delimiter(),
            &key,
            self.variant.mac_scheme(),
            &self.signature,
        ))
    }
}

/// Legacy signs bare values, modern signs `KEY=value`.
pub fn segments(variant: GatewayVariant, fields: &[(String, String)]) -> Vec<String> {
    match variant {
        GatewayVariant::Legacy => fields.iter().map(|(_, v)| v.clone()).collect(),
        GatewayVariant::Modern => fields.iter().map(|(k, v)| format!("{}={}", k, v)).collect(),
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// An amount resolved against the currency service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedAmount {
    /// `12.50`
    pub fixed: String,
    /// `1250`
    pub minor_units: u64,
    /// `978`
    pub numeric_currency: String,
    /// `EUR`
    pub currency: String,
}

/// Request values after the gateway-specific rules ran.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub language: String,
    pub free_text: String,
    pub amount: Option<NormalizedAmount>,
}

/// Uppercases and truncates to two characters; anything shorter, or not
/// alphabetic, falls back to [`config::DEFAULT_LANGUAGE`].
pub fn normalize_language(input: Option<&str>) -> String {
    let code: String = input
        .unwrap_or_default()
        .trim()
        .chars()
        .take(2)
        .collect::<String>()
        .to_uppercase();
    if code.chars().count() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        code
    } else {
        config::DEFAULT_LANGUAGE.to_string()
    }
}

/// Applies the gateway- and channel-specific rules to a validated request.
///
/// # Errors
///
/// [`GatewayError::Validation`] listing every rejected field.
pub fn normalize(
    variant: GatewayVariant,
    channel: Channel,
    request: &TransactionRequest,
    currencies: &dyn CurrencyService,
) -> Result<Normalized, GatewayError> {
    let mut errors = ValidationErrors::new();

    let max_reference = match variant {
        GatewayVariant::Legacy => config::LEGACY_MAX_REFERENCE_LENGTH,
        GatewayVariant::Modern => config::MODERN_MAX_REFERENCE_LENGTH,
    };
    if let Some(reference) = request.reference() {
        if reference.len() > max_reference {
            errors.push(
                "reference",
                format!("must be at most {} characters", max_reference),
            );
        }
    }

    let amount = match request.amount() {
        None => None,
        Some(amount) => match (
            currencies.minor_units(&amount.currency),
            currencies.numeric_code(&amount.currency),
        ) {
            (Some(units), Some(numeric)) => match to_minor_units(amount.value, units) {
                Ok(minor_units) => Some(NormalizedAmount {
                    fixed: to_fixed_decimal(amount.value, units),
                    minor_units,
                    numeric_currency: numeric.to_string(),
                    currency: amount.currency.clone(),
                }),
                Err(GatewayError::Validation(e)) => {
                    errors.extend(e);
                    None
                }
                Err(other) => return Err(other),
            },
            _ => {
                errors.push(
                    "currency",
                    format!("'{}' is not a supported currency", amount.currency),
                );
                None
            }
        },
    };

    if variant == GatewayVariant::Modern && !channel.is_hosted_page() {
        if let Some(amount) = &amount {
            if amount.minor_units > config::MODERN_DIRECT_NUMERIC_MAX {
                errors.push(
                    "amount",
                    format!(
                        "exceeds {} digits in minor units",
                        config::MODERN_DIRECT_NUMERIC_WIDTH
                    ),
                );
            }
        }
    }

    if channel.is_hosted_page() && request.payment_source().is_some() {
        errors.push("payment_source", "card details are collected by the payment page");
    }

    match variant {
        GatewayVariant::Legacy => check_legacy(channel, request, &mut errors),
        GatewayVariant::Modern => check_modern(channel, request, &mut errors),
    }

    errors.into_result()?;

    let free_text = match (variant, request.free_text()) {
        (_, Some(text)) => text.to_string(),
        (GatewayVariant::Legacy, None) => config::LEGACY_FREE_TEXT_PLACEHOLDER.to_string(),
        (GatewayVariant::Modern, None) => String::new(),
    };

    Ok(Normalized {
        language: normalize_language(request.language()),
        free_text,
        amount,
    })
}

fn check_legacy(channel: Channel, request: &TransactionRequest, errors: &mut ValidationErrors) {
    if let Some(text) = request.free_text() {
        if text.chars().count() > config::LEGACY_MAX_FREE_TEXT_LENGTH {
            errors.push(
                "free_text",
                format!("must be at most {} characters", config::LEGACY_MAX_FREE_TEXT_LENGTH),
            );
        }
    }

    if channel.is_hosted_page() {
        let urls = request.return_urls();
        if urls.ok.is_none() {
            errors.push("return_urls.ok", "is required by the legacy payment page");
        }
        if urls.refused.is_none() {
            errors.push("return_urls.refused", "is required by the legacy payment page");
        }
    }
}

fn check_modern(channel: Channel, request: &TransactionRequest, errors: &mut ValidationErrors) {
    if channel.is_hosted_page() {
        if request.customer_email().is_none() {
            errors.push("customer_email", "is required by the modern payment page");
        }
        return;
    }

    let op = request.operation();
    if matches!(
        op,
        OperationType::AuthorizeOnly | OperationType::AuthorizeAndDebit | OperationType::Credit
    ) && request.payment_source().is_none()
    {
        errors.push("payment_source", "is required for a direct payment");
    }

    if matches!(request.payment_source(), Some(PaymentSource::Subscriber(_)))
        && request.subscriber_id().is_none()
    {
        errors.push("subscriber_id", "is required to pay with a stored subscriber");
    }

    if op.requires_original_transaction() {
        let original = request.original();
        if original.and_then(|o| o.call_number.as_deref()).is_none() {
            errors.push("original.call_number", "is required by the modern gateway");
        }
        if original.and_then(|o| o.transaction_number.as_deref()).is_none() {
            errors.push(
                "original.transaction_number",
                "is required by the modern gateway",
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Builds and signs the field set for `channel`.
pub fn assemble(
    credentials: &MerchantCredentials,
    request: &TransactionRequest,
    normalized: &Normalized,
    code: OperationCode,
    channel: Channel,
) -> Result<SignedPayload, GatewayError> {
    let key = credentials.signing_key()?;
    let variant = credentials.variant();

    let payload = match (variant, channel) {
        (GatewayVariant::Legacy, Channel::DirectHttp) => {
            let (signed, posted) = legacy_capture(credentials, request, normalized);
            SignedPayload::new(variant, signed, posted, LEGACY_SIGNATURE_FIELD, &key)
        }
        (GatewayVariant::Legacy, _) => {
            let (signed, posted) = legacy_payment(credentials, request, normalized);
            SignedPayload::new(variant, signed, posted, LEGACY_SIGNATURE_FIELD, &key)
        }
        (GatewayVariant::Modern, Channel::DirectHttp) => {
            let fields = modern_direct(credentials, request, normalized, code);
            SignedPayload::new(
                variant,
                fields.clone(),
                fields,
                MODERN_DIRECT_SIGNATURE_FIELD,
                &key,
            )
        }
        (GatewayVariant::Modern, _) => {
            let fields = modern_page(credentials, request, normalized);
            SignedPayload::new(
                variant,
                fields.clone(),
                fields,
                MODERN_PAGE_SIGNATURE_FIELD,
                &key,
            )
        }
    };
    Ok(payload)
}

type Fields = Vec<(String, String)>;

fn pair(key: &str, value: impl Into<String>) -> (String, String) {
    (key.to_string(), value.into())
}

fn legacy_amount(normalized: &Normalized) -> (String, String) {
    normalized
        .amount
        .as_ref()
        .map(|a| (format!("{}{}", a.fixed, a.currency), a.currency.clone()))
        .unwrap_or_default()
}

fn legacy_payment(
    credentials: &MerchantCredentials,
    request: &TransactionRequest,
    normalized: &Normalized,
) -> (Fields, Fields) {
    let (montant, _) = legacy_amount(normalized);
    let date = request
        .timestamp()
        .format(config::LEGACY_DATE_FORMAT)
        .to_string();

    let mut signed = vec![
        pair("TPE", credentials.site_id()),
        pair("date", date),
        pair("montant", montant),
        pair("reference", request.reference().unwrap_or_default()),
        pair(LEGACY_FREE_TEXT_FIELD, normalized.free_text.as_str()),
        pair("version", config::LEGACY_PROTOCOL_VERSION),
        pair("lgue", normalized.language.as_str()),
        pair("societe", credentials.company_code()),
        pair("mail", request.customer_email().unwrap_or_default()),
    ];
    let mut posted = signed.clone();
    signed.extend(LEGACY_RESERVED_SEGMENTS.iter().map(|name| pair(name, "")));

    let urls = request.return_urls();
    if let Some(home) = urls.home.as_ref().or(urls.ok.as_ref()) {
        posted.push(pair("url_retour", home.as_str()));
    }
    if let Some(ok) = &urls.ok {
        posted.push(pair("url_retour_ok", ok.as_str()));
    }
    if let Some(refused) = &urls.refused {
        posted.push(pair("url_retour_err", refused.as_str()));
    }

    (signed, posted)
}

fn legacy_capture(
    credentials: &MerchantCredentials,
    request: &TransactionRequest,
    normalized: &Normalized,
) -> (Fields, Fields) {
    let (montant, currency) = legacy_amount(normalized);
    let nothing = format!("0{}", currency);
    let cancel = request.operation() == OperationType::Cancel;
    let to_capture = if cancel { nothing.clone() } else { montant.clone() };

    let timestamp = request.timestamp();
    let date = timestamp.format(config::LEGACY_DATE_FORMAT).to_string();
    let order_date = request
        .original()
        .and_then(|o| o.order_date)
        .unwrap_or_else(|| timestamp.date_naive())
        .format(config::LEGACY_ORDER_DATE_FORMAT)
        .to_string();
    let reference = request.reference().unwrap_or_default();

    let signed = vec![
        pair("TPE", credentials.site_id()),
        pair("date", date.as_str()),
        pair(
            "montants",
            format!("{}{}{}", to_capture, nothing, nothing),
        ),
        pair("reference", reference),
        pair(LEGACY_FREE_TEXT_FIELD, normalized.free_text.as_str()),
        pair("version", config::LEGACY_PROTOCOL_VERSION),
        pair("lgue", normalized.language.as_str()),
        pair("societe", credentials.company_code()),
        pair("", ""),
    ];

    let mut posted = vec![
        pair("version", config::LEGACY_PROTOCOL_VERSION),
        pair("TPE", credentials.site_id()),
        pair("date", date),
        pair("date_commande", order_date),
        pair("montant", montant),
        pair("montant_a_capturer", to_capture),
        pair("montant_deja_capture", nothing.as_str()),
        pair("montant_restant", nothing.as_str()),
        pair("reference", reference),
        pair(LEGACY_FREE_TEXT_FIELD, normalized.free_text.as_str()),
        pair("lgue", normalized.language.as_str()),
        pair("societe", credentials.company_code()),
    ];
    if cancel {
        posted.push(pair("annulation", "1"));
    }

    (signed, posted)
}

fn modern_page(
    credentials: &MerchantCredentials,
    request: &TransactionRequest,
    normalized: &Normalized,
) -> Fields {
    let (total, devise) = normalized
        .amount
        .as_ref()
        .map(|a| (a.minor_units.to_string(), a.numeric_currency.clone()))
        .unwrap_or_default();

    let mut fields = vec![
        pair("PBX_SITE", credentials.site_id()),
        pair("PBX_RANG", credentials.rank().unwrap_or_default()),
        pair("PBX_IDENTIFIANT", credentials.company_code()),
        pair("PBX_TOTAL", total),
        pair("PBX_DEVISE", devise),
        pair("PBX_CMD", request.reference().unwrap_or_default()),
        pair("PBX_PORTEUR", request.customer_email().unwrap_or_default()),
        pair("PBX_RETOUR", config::modern_return_format()),
        pair("PBX_HASH", config::MODERN_HASH_NAME),
        pair(
            "PBX_TIME",
            request
                .timestamp()
                .format(config::MODERN_TIME_FORMAT)
                .to_string(),
        ),
    ];

    if request.language().is_some() {
        fields.push(pair(
            "PBX_LANGUE",
            config::modern_language(&normalized.language),
        ));
    }
    let urls = request.return_urls();
    for (key, url) in [
        ("PBX_EFFECTUE", &urls.ok),
        ("PBX_REFUSE", &urls.refused),
        ("PBX_ANNULE", &urls.cancelled),
        ("PBX_ATTENTE", &urls.pending),
    ] {
        if let Some(url) = url {
            fields.push(pair(key, url.as_str()));
        }
    }
    if let Some(ipn) = request.callback_url() {
        fields.push(pair("PBX_REPONDRE_A", ipn));
    }
    if request.operation() == OperationType::AuthorizeOnly {
        fields.push(pair("PBX_AUTOSEULE", "O"));
    }
    if let Some(subscriber) = request.subscriber_id() {
        fields.push(pair("PBX_REFABONNE", subscriber));
    }

    fields
}

fn modern_direct(
    credentials: &MerchantCredentials,
    request: &TransactionRequest,
    normalized: &Normalized,
    code: OperationCode,
) -> Fields {
    let width = config::MODERN_DIRECT_NUMERIC_WIDTH;
    let timestamp = request.timestamp();
    let question = request
        .question_number()
        .unwrap_or_else(|| question_number_from(&timestamp));

    let mut fields = vec![
        pair("VERSION", config::MODERN_DIRECT_VERSION),
        pair("TYPE", code.as_str()),
        pair("SITE", credentials.site_id()),
        pair("RANG", credentials.rank().unwrap_or_default()),
        pair("NUMQUESTION", format!("{:0width$}", question, width = width)),
    ];

    if let Some(amount) = &normalized.amount {
        fields.push(pair(
            "MONTANT",
            format!("{:0width$}", amount.minor_units, width = width),
        ));
        fields.push(pair("DEVISE", amount.numeric_currency.as_str()));
    }
    if let Some(reference) = request.reference() {
        fields.push(pair("REFERENCE", reference));
    }

    if let Some(subscriber) = request.subscriber_id() {
        fields.push(pair("REFABONNE", subscriber));
    }
    match request.payment_source() {
        Some(PaymentSource::Card(card)) => {
            fields.push(pair("PORTEUR", card.pan()));
            fields.push(pair("DATEVAL", card.expiry()));
            if let Some(cvv) = card.cvv() {
                fields.push(pair("CVV", cvv));
            }
        }
        Some(PaymentSource::Subscriber(token)) => {
            fields.push(pair("PORTEUR", token.token.as_str()));
            fields.push(pair("DATEVAL", token.expiry.as_str()));
        }
        None => {}
    }

    if let Some(original) = request.original() {
        if let Some(call) = &original.call_number {
            fields.push(pair("NUMAPPEL", call.as_str()));
        }
        if let Some(trans) = &original.transaction_number {
            fields.push(pair("NUMTRANS", trans.as_str()));
        }
    }

    fields.push(pair("ACTIVITE", config::MODERN_DIRECT_ACTIVITY));
    fields.push(pair(
        "DATEQ",
        timestamp.format(config::MODERN_DIRECT_DATE_FORMAT).to_string(),
    ));
    fields.push(pair("HASH", config::MODERN_HASH_NAME));

    fields
}

/// Milliseconds since midnight, plus one. Unique per merchant per day as
/// long as two requests don't share a millisecond.
fn question_number_from(timestamp: &chrono::DateTime<chrono::Utc>) -> u64 {
    u64::from(timestamp.num_seconds_from_midnight()) * 1000
        + u64::from(timestamp.timestamp_subsec_millis() % 1000)
        + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::Iso4217;
    use crate::merchant::{Environment, SecretKey};
    use crate::transaction::operation::resolve;
    use crate::transaction::types::{Amount, CardData, OriginalTransaction, ReturnUrls};
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn legacy_credentials() -> MerchantCredentials {
        MerchantCredentials::new(
            GatewayVariant::Legacy,
            "1234567",
            "monSite1",
            None,
            SecretKey::new("0123456789abcdef0123456789abcdef01234567"),
            Environment::Sandbox,
        )
        .unwrap()
    }

    fn modern_credentials() -> MerchantCredentials {
        MerchantCredentials::new(
            GatewayVariant::Modern,
            "1999888",
            "107904482",
            Some("32".into()),
            SecretKey::new("0123456789ABCDEF".repeat(8)),
            Environment::Sandbox,
        )
        .unwrap()
    }

    fn at() -> chrono::DateTime<chrono::Utc> {
        chrono::Utc.with_ymd_and_hms(2026, 10, 18, 10, 0, 0).unwrap()
    }

    fn urls() -> ReturnUrls {
        ReturnUrls {
            ok: Some("https://shop.example/ok".into()),
            refused: Some("https://shop.example/ko".into()),
            ..ReturnUrls::default()
        }
    }

    fn payload(
        creds: &MerchantCredentials,
        request: &TransactionRequest,
        channel: Channel,
    ) -> SignedPayload {
        let normalized = normalize(creds.variant(), channel, request, &Iso4217).unwrap();
        let code = resolve(creds.variant(), request.operation(), request.uses_stored_subscriber())
            .unwrap();
        assemble(creds, request, &normalized, code, channel).unwrap()
    }

    #[test]
    fn language_normalization() {
        assert_eq!(normalize_language(Some("en")), "EN");
        assert_eq!(normalize_language(Some("deu")), "DE");
        assert_eq!(normalize_language(Some("f")), "FR");
        assert_eq!(normalize_language(Some("1x")), "FR");
        assert_eq!(normalize_language(None), "FR");
    }

    #[test]
    fn legacy_payment_has_nineteen_segments() {
        let request = TransactionRequest::draft(OperationType::AuthorizeAndDebit)
            .amount(Amount::new(Decimal::new(1250, 2), "EUR"))
            .reference("ORDER-042")
            .return_urls(urls())
            .timestamp(at())
            .finish()
            .unwrap();
        let payload = payload(&legacy_credentials(), &request, Channel::Form);

        assert_eq!(payload.signed_fields().len(), 19);
        assert_eq!(
            payload.message(),
            "1234567*18/10/2026:10:00:00*12.50EUR*ORDER-042*-*3.0*FR*monSite1***********"
        );
        assert_eq!(payload.field("montant"), Some("12.50EUR"));
        assert_eq!(payload.field("url_retour"), Some("https://shop.example/ok"));
        assert!(payload.field("nbrech").is_none());
        assert!(payload.verify(&legacy_credentials()).unwrap());
    }

    #[test]
    fn legacy_capture_folds_amounts() {
        let request = TransactionRequest::draft(OperationType::Cancel)
            .amount(Amount::new(Decimal::new(1250, 2), "EUR"))
            .reference("ORDER-042")
            .original_transaction(OriginalTransaction {
                order_date: chrono::NaiveDate::from_ymd_opt(2026, 10, 17),
                ..OriginalTransaction::default()
            })
            .timestamp(at())
            .finish()
            .unwrap();
        let payload = payload(&legacy_credentials(), &request, Channel::DirectHttp);

        assert_eq!(
            payload.message(),
            "1234567*18/10/2026:10:00:00*0EUR0EUR0EUR*ORDER-042*-*3.0*FR*monSite1*"
        );
        assert_eq!(payload.field("annulation"), Some("1"));
        assert_eq!(payload.field("date_commande"), Some("17/10/2026"));
        assert_eq!(payload.field("montant"), Some("12.50EUR"));
    }

    #[test]
    fn modern_page_order() {
        let request = TransactionRequest::draft(OperationType::AuthorizeOnly)
            .amount(Amount::new(Decimal::new(1250, 2), "EUR"))
            .reference("ORDER-042")
            .customer_email("test@example.com")
            .language("en")
            .timestamp(at())
            .finish()
            .unwrap();
        let payload = payload(&modern_credentials(), &request, Channel::Form);
        let keys: Vec<&str> = payload.signed_fields().iter().map(|(k, _)| k.as_str()).collect();

        assert_eq!(
            keys,
            [
                "PBX_SITE",
                "PBX_RANG",
                "PBX_IDENTIFIANT",
                "PBX_TOTAL",
                "PBX_DEVISE",
                "PBX_CMD",
                "PBX_PORTEUR",
                "PBX_RETOUR",
                "PBX_HASH",
                "PBX_TIME",
                "PBX_LANGUE",
                "PBX_AUTOSEULE",
            ]
        );
        assert_eq!(payload.field("PBX_TOTAL"), Some("1250"));
        assert_eq!(payload.field("PBX_DEVISE"), Some("978"));
        assert_eq!(payload.field("PBX_LANGUE"), Some("GBR"));
        assert_eq!(payload.field("PBX_TIME"), Some("2026-10-18T10:00:00+00:00"));
        assert!(payload.message().starts_with("PBX_SITE=1999888&PBX_RANG=32&"));
        assert_eq!(payload.signature().len(), 128);
    }

    #[test]
    fn modern_direct_card_payment() {
        let request = TransactionRequest::draft(OperationType::AuthorizeAndDebit)
            .amount(Amount::new(Decimal::new(1250, 2), "EUR"))
            .reference("ORDER-042")
            .payment_source(PaymentSource::Card(CardData::new(
                "1111222233334444",
                "1228",
                Some("123".into()),
            )))
            .question_number(42)
            .timestamp(at())
            .finish()
            .unwrap();
        let payload = payload(&modern_credentials(), &request, Channel::DirectHttp);

        assert_eq!(payload.field("TYPE"), Some("00003"));
        assert_eq!(payload.field("MONTANT"), Some("0000001250"));
        assert_eq!(payload.field("NUMQUESTION"), Some("0000000042"));
        assert_eq!(payload.field("DATEQ"), Some("18102026100000"));
        assert_eq!(payload.signature_field(), "HMAC");
        assert!(payload.message().contains("&PORTEUR=1111222233334444&DATEVAL=1228&CVV=123&"));
        assert!(payload.message().ends_with("&ACTIVITE=024&DATEQ=18102026100000&HASH=SHA512"));
    }

    #[test]
    fn question_number_is_derived_from_time() {
        assert_eq!(question_number_from(&at()), 36_000_001);
    }

    #[test]
    fn unknown_currency_and_long_reference_reported_together() {
        let request = TransactionRequest::draft(OperationType::AuthorizeAndDebit)
            .amount(Amount::new(Decimal::new(100, 2), "XYZ"))
            .reference("R".repeat(51))
            .return_urls(urls())
            .finish()
            .unwrap();
        match normalize(GatewayVariant::Legacy, Channel::Form, &request, &Iso4217) {
            Err(GatewayError::Validation(errors)) => {
                assert!(errors.contains("currency"));
                assert!(errors.contains("reference"));
            }
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn legacy_form_requires_return_urls() {
        let request = TransactionRequest::draft(OperationType::AuthorizeAndDebit)
            .amount(Amount::new(Decimal::new(100, 2), "EUR"))
            .reference("R1")
            .finish()
            .unwrap();
        match normalize(GatewayVariant::Legacy, Channel::Url, &request, &Iso4217) {
            Err(GatewayError::Validation(errors)) => {
                assert!(errors.contains("return_urls.ok"));
                assert!(errors.contains("return_urls.refused"));
            }
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn modern_capture_needs_call_and_transaction_numbers() {
        let request = TransactionRequest::draft(OperationType::Debit)
            .amount(Amount::new(Decimal::new(100, 2), "EUR"))
            .reference("R1")
            .original_transaction(OriginalTransaction {
                call_number: Some("0012345".into()),
                ..OriginalTransaction::default()
            })
            .finish()
            .unwrap();
        match normalize(GatewayVariant::Modern, Channel::DirectHttp, &request, &Iso4217) {
            Err(GatewayError::Validation(errors)) => {
                assert!(errors.contains("original.transaction_number"));
                assert!(!errors.contains("original.call_number"));
            }
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn payload_rejects_foreign_credentials() {
        let request = TransactionRequest::draft(OperationType::AuthorizeAndDebit)
            .amount(Amount::new(Decimal::new(100, 2), "EUR"))
            .reference("R1")
            .return_urls(urls())
            .finish()
            .unwrap();
        let payload = payload(&legacy_credentials(), &request, Channel::Form);
        assert!(matches!(
            payload.verify(&modern_credentials()),
            Err(GatewayError::Configuration(_))
        ));
    }

    #[test]
    fn modern_direct_amount_must_fit_ten_digits() {
        let card = PaymentSource::Card(CardData::new("1111222233334444", "1228", None));
        let request = |value: Decimal| {
            TransactionRequest::draft(OperationType::AuthorizeAndDebit)
                .amount(Amount::new(value, "EUR"))
                .reference("R1")
                .payment_source(card.clone())
                .finish()
                .unwrap()
        };

        // 99_999_999.99 EUR is exactly ten digits of cents.
        let largest = request(Decimal::new(9_999_999_999, 2));
        let payload = payload(&modern_credentials(), &largest, Channel::DirectHttp);
        assert_eq!(payload.field("MONTANT"), Some("9999999999"));

        let oversized = request(Decimal::new(1_000_000_000_000, 2));
        match normalize(GatewayVariant::Modern, Channel::DirectHttp, &oversized, &Iso4217) {
            Err(GatewayError::Validation(errors)) => assert!(errors.contains("amount")),
            other => panic!("expected Validation, got {:?}", other),
        }
    }
}
