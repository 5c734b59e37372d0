//! # Callback Validation
//!
//! The gateway tells the merchant what happened by calling back: a browser
//! redirect, a server-to-server notification, or both. Either way the
//! merchant gets a bag of form fields and a signature, and has to decide
//! whether to believe them.
//!
//! The response is signed over a different field list than the request,
//! and the values that identify the merchant (terminal, site, rank) are
//! taken from the merchant's own configuration rather than from the
//! callback. A callback signed for someone else's terminal does not verify
//! here, whatever it claims to be.
//!
//! Validation only fails with an `Err` when the callback is structurally
//! unusable. A bad signature is a normal, expected result: it produces a
//! response with outcome [`OperationOutcome::Error`], so the handler can
//! still send the acknowledgement the gateway is waiting for.

use tracing::{debug, info, warn};
use url::form_urlencoded;

use super::codes::ResponseCodeCatalog;
use super::response::{GatewayResponse, OperationOutcome};
use crate::config;
use crate::crypto::signatures;
use crate::error::GatewayError;
use crate::merchant::{GatewayVariant, MerchantCredentials};

// ---------------------------------------------------------------------------
// CallbackRequest
// ---------------------------------------------------------------------------

/// How the callback reached us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryMethod {
    Get,
    Post,
    /// Anything else. Always rejected.
    Other(String),
}

impl DeliveryMethod {
    pub fn parse(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "GET" => Self::Get,
            "POST" => Self::Post,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Raw callback fields, as delivered.
#[derive(Debug, Clone)]
pub struct CallbackRequest {
    method: DeliveryMethod,
    fields: Vec<(String, String)>,
}

impl CallbackRequest {
    pub fn new(method: DeliveryMethod, fields: Vec<(String, String)>) -> Self {
        Self { method, fields }
    }

    /// Parses a GET query string. A leading `?` is ignored.
    pub fn from_query(query: &str) -> Self {
        Self::new(DeliveryMethod::Get, parse_urlencoded(query.trim_start_matches('?')))
    }

    /// Parses an `application/x-www-form-urlencoded` POST body.
    pub fn from_form_body(body: &str) -> Self {
        Self::new(DeliveryMethod::Post, parse_urlencoded(body.trim()))
    }

    pub fn method(&self) -> &DeliveryMethod {
        &self.method
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// First value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

fn parse_urlencoded(input: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(input.as_bytes())
        .into_owned()
        .collect()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Legacy response MAC segments after `TPE`, in signing order. `version`
/// is the protocol constant, not the received value.
const LEGACY_RESPONSE_FIELDS: [&str; 19] = [
    "date",
    "montant",
    "reference",
    "texte-libre",
    "version",
    "code-retour",
    "cvx",
    "vld",
    "brand",
    "status3ds",
    "numauto",
    "motifrefus",
    "originecb",
    "bincb",
    "hpancb",
    "ipclient",
    "originetr",
    "veres",
    "pares",
];

const LEGACY_SUCCESS_CODES: [&str; 2] = ["paiement", "payetest"];
const MODERN_SUCCESS_CODE: &str = "00000";
const MODERN_PENDING_CODE: &str = "99999";

/// Validates callbacks against a merchant's credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseValidator;

impl ResponseValidator {
    /// Recomputes the callback's signature and classifies the outcome.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidCallback`] if the delivery method is not
    ///   GET or POST, or the terminal/site field is missing.
    /// - [`GatewayError::Configuration`] if the credentials' key cannot be
    ///   derived.
    pub fn validate(
        callback: &CallbackRequest,
        credentials: &MerchantCredentials,
    ) -> Result<GatewayResponse, GatewayError> {
        if let DeliveryMethod::Other(method) = callback.method() {
            warn!(method = %method, "callback rejected: unsupported delivery method");
            return Err(GatewayError::InvalidCallback(format!(
                "unsupported delivery method {}",
                method
            )));
        }

        let variant = credentials.variant();
        let terminal_field = match variant {
            GatewayVariant::Legacy => "TPE",
            GatewayVariant::Modern => "Site",
        };
        if callback.get(terminal_field).is_none() {
            warn!(field = terminal_field, "callback rejected: terminal field missing");
            return Err(GatewayError::InvalidCallback(format!(
                "missing {} field",
                terminal_field
            )));
        }

        let key = credentials.signing_key()?;
        let scheme = variant.mac_scheme();
        let (segments, signature_field) = match variant {
            GatewayVariant::Legacy => (legacy_segments(callback, credentials), "MAC"),
            GatewayVariant::Modern => (
                modern_segments(callback, credentials),
                config::MODERN_SIGNATURE_VARIABLE,
            ),
        };

        let computed = signatures::sign(&segments, variant.delimiter(), &key, scheme);
        let received = callback.get(signature_field).map(str::to_string);
        let signature_valid = received
            .as_deref()
            .map(|r| signatures::signatures_match(&computed, r, scheme))
            .unwrap_or(false);

        debug!(
            variant = %variant,
            segments = segments.len(),
            "callback signature recomputed"
        );

        let response = match variant {
            GatewayVariant::Legacy => legacy_response(callback, computed, received, signature_valid),
            GatewayVariant::Modern => modern_response(callback, computed, received, signature_valid),
        };

        if !response.signature_valid {
            warn!(
                variant = %variant,
                reference = response.reference.as_deref().unwrap_or(""),
                "callback signature mismatch"
            );
        } else if response.outcome == OperationOutcome::Approved {
            info!(
                variant = %variant,
                reference = response.reference.as_deref().unwrap_or(""),
                "payment approved"
            );
        }

        Ok(response)
    }
}

fn legacy_segments(callback: &CallbackRequest, credentials: &MerchantCredentials) -> Vec<String> {
    let mut segments = Vec::with_capacity(LEGACY_RESPONSE_FIELDS.len() + 2);
    segments.push(credentials.site_id().to_string());
    for name in LEGACY_RESPONSE_FIELDS {
        let value = if name == "version" {
            config::LEGACY_PROTOCOL_VERSION
        } else {
            callback.get(name).unwrap_or_default()
        };
        segments.push(value.to_string());
    }
    // Trailing delimiter.
    segments.push(String::new());
    segments
}

fn modern_segments(callback: &CallbackRequest, credentials: &MerchantCredentials) -> Vec<String> {
    config::MODERN_RETURN_VARIABLES
        .iter()
        .map(|(name, _)| {
            let value = match *name {
                "Site" => credentials.site_id(),
                "Rang" => credentials.rank().unwrap_or_default(),
                other => callback.get(other).unwrap_or_default(),
            };
            format!("{}={}", name, value)
        })
        .collect()
}

fn owned(callback: &CallbackRequest, name: &str) -> Option<String> {
    callback
        .get(name)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn legacy_response(
    callback: &CallbackRequest,
    computed: String,
    received: Option<String>,
    signature_valid: bool,
) -> GatewayResponse {
    let code = owned(callback, "code-retour");
    let refusal = owned(callback, "motifrefus");

    let outcome = match (&code, signature_valid) {
        (_, false) => OperationOutcome::Error,
        (Some(c), true) if LEGACY_SUCCESS_CODES.contains(&c.as_str()) => OperationOutcome::Approved,
        _ => OperationOutcome::Refused,
    };

    let message = match (outcome, &refusal) {
        (OperationOutcome::Error, _) => "Signature mismatch".to_string(),
        (OperationOutcome::Refused, Some(reason)) => {
            ResponseCodeCatalog::message(GatewayVariant::Legacy, reason).to_string()
        }
        _ => ResponseCodeCatalog::message(
            GatewayVariant::Legacy,
            code.as_deref().unwrap_or_default(),
        )
        .to_string(),
    };

    GatewayResponse {
        variant: GatewayVariant::Legacy,
        fields: callback.fields().to_vec(),
        received_signature: received,
        computed_signature: computed,
        signature_valid,
        outcome,
        response_code: code,
        message,
        reference: owned(callback, "reference"),
        amount: owned(callback, "montant"),
        authorization_number: owned(callback, "numauto"),
        call_number: None,
        transaction_number: None,
        card_brand: owned(callback, "brand"),
        masked_pan: owned(callback, "bincb").map(|bin| format!("{}******", bin)),
        card_expiry: owned(callback, "vld"),
        three_ds_status: owned(callback, "status3ds"),
        three_ds_version: None,
    }
}

fn modern_response(
    callback: &CallbackRequest,
    computed: String,
    received: Option<String>,
    signature_valid: bool,
) -> GatewayResponse {
    let code = owned(callback, "Erreur");

    let outcome = match (code.as_deref(), signature_valid) {
        (_, false) => OperationOutcome::Error,
        (Some(MODERN_SUCCESS_CODE), true) => OperationOutcome::Approved,
        (Some(MODERN_PENDING_CODE), true) => OperationOutcome::Pending,
        _ => OperationOutcome::Refused,
    };

    let message = if outcome == OperationOutcome::Error {
        "Signature mismatch".to_string()
    } else {
        ResponseCodeCatalog::message(GatewayVariant::Modern, code.as_deref().unwrap_or_default())
            .to_string()
    };

    let masked_pan = match (owned(callback, "Bin6"), owned(callback, "Digits")) {
        (Some(bin), Some(last)) => Some(format!("{}******{}", bin, last)),
        (Some(bin), None) => Some(format!("{}******", bin)),
        _ => None,
    };

    GatewayResponse {
        variant: GatewayVariant::Modern,
        fields: callback.fields().to_vec(),
        received_signature: received,
        computed_signature: computed,
        signature_valid,
        outcome,
        response_code: code,
        message,
        reference: owned(callback, "Ref"),
        amount: owned(callback, "Mt"),
        authorization_number: owned(callback, "Auto"),
        call_number: owned(callback, "Appel"),
        transaction_number: owned(callback, "Trans"),
        card_brand: owned(callback, "Carte"),
        masked_pan,
        card_expiry: owned(callback, "Validite"),
        three_ds_status: owned(callback, "Auth3DS"),
        three_ds_version: owned(callback, "Version3DS"),
    }
}
