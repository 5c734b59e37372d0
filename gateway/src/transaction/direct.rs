//! Server-to-server requests: body encoding and reply parsing.
//!
//! Neither gateway signs its direct replies. What comes back is trusted
//! because it came back over the TLS connection we opened, so parsing is
//! strict about shape: a reply without a result code is treated as the
//! gateway being unavailable, not as a refusal.

use std::collections::BTreeMap;

use serde::Serialize;
use url::form_urlencoded;

use super::fields::SignedPayload;
use crate::callback::codes::ResponseCodeCatalog;
use crate::callback::response::OperationOutcome;
use crate::error::GatewayError;
use crate::merchant::GatewayVariant;

/// A direct call that went through, with its parsed reply.
#[derive(Debug, Clone)]
pub struct DirectPayment {
    pub payload: SignedPayload,
    pub response: DirectResponse,
}

/// Parsed server-to-server reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectResponse {
    pub fields: BTreeMap<String, String>,
    pub outcome: OperationOutcome,
    pub code: String,
    pub message: String,
    pub call_number: Option<String>,
    pub transaction_number: Option<String>,
    pub authorization_number: Option<String>,
    /// Subscriber reference echoed back (`REFABONNE`).
    pub subscriber_id: Option<String>,
    /// Card token issued at subscriber registration (`PORTEUR`).
    pub subscriber_token: Option<String>,
}

/// URL-encodes the payload's posted fields, signature included.
pub fn encode_body(payload: &SignedPayload) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in payload.posted_fields() {
        serializer.append_pair(&key, &value);
    }
    serializer.finish()
}

/// Parses a reply body for `variant`.
///
/// # Errors
///
/// [`GatewayError::GatewayUnavailable`] if the body is not in the
/// gateway's format or lacks a result code.
pub fn parse_reply(variant: GatewayVariant, body: &str) -> Result<DirectResponse, GatewayError> {
    match variant {
        GatewayVariant::Legacy => parse_legacy(body),
        GatewayVariant::Modern => parse_modern(body),
    }
}

/// `key=value` lines: `cdr` 1 approved, 0 refused, -1 error.
fn parse_legacy(body: &str) -> Result<DirectResponse, GatewayError> {
    let fields: BTreeMap<String, String> = body
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let code = fields
        .get("cdr")
        .cloned()
        .ok_or_else(|| GatewayError::GatewayUnavailable("reply has no cdr field".into()))?;

    let outcome = match code.as_str() {
        "1" => OperationOutcome::Approved,
        "0" => OperationOutcome::Refused,
        _ => OperationOutcome::Error,
    };
    let message = fields
        .get("lib")
        .filter(|m| !m.is_empty())
        .cloned()
        .unwrap_or_else(|| ResponseCodeCatalog::message(GatewayVariant::Legacy, &code).to_string());
    let authorization_number = fields.get("aut").filter(|a| !a.is_empty()).cloned();

    Ok(DirectResponse {
        outcome,
        code,
        message,
        call_number: None,
        transaction_number: None,
        authorization_number,
        subscriber_id: None,
        subscriber_token: None,
        fields,
    })
}

/// JSON object; `CODEREPONSE` 00000 approved, 99999 pending.
fn parse_modern(body: &str) -> Result<DirectResponse, GatewayError> {
    let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(body)
        .map_err(|e| GatewayError::GatewayUnavailable(format!("unparsable reply: {}", e)))?;

    let fields: BTreeMap<String, String> = object
        .into_iter()
        .map(|(k, v)| {
            let value = match v {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            (k, value)
        })
        .collect();

    let code = fields
        .get("CODEREPONSE")
        .cloned()
        .ok_or_else(|| GatewayError::GatewayUnavailable("reply has no CODEREPONSE".into()))?;

    let outcome = match code.as_str() {
        "00000" => OperationOutcome::Approved,
        "99999" => OperationOutcome::Pending,
        _ => OperationOutcome::Refused,
    };
    let get = |name: &str| fields.get(name).filter(|v| !v.is_empty()).cloned();
    let message = get("COMMENTAIRE")
        .unwrap_or_else(|| ResponseCodeCatalog::message(GatewayVariant::Modern, &code).to_string());

    Ok(DirectResponse {
        outcome,
        message,
        call_number: get("NUMAPPEL"),
        transaction_number: get("NUMTRANS"),
        authorization_number: get("AUTORISATION"),
        subscriber_id: get("REFABONNE"),
        subscriber_token: get("PORTEUR"),
        code,
        fields,
    })
}
