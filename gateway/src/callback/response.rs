//! The result of validating a gateway callback.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::merchant::GatewayVariant;

/// What the gateway says happened, once its signature has been checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationOutcome {
    Approved,
    Refused,
    /// The issuer has not decided yet. Modern gateway only.
    Pending,
    /// The callback could not be trusted, or the gateway reported a
    /// processing error.
    Error,
}

impl fmt::Display for OperationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::Refused => write!(f, "refused"),
            Self::Pending => write!(f, "pending"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A validated (or rejected) callback. Immutable.
///
/// An invalid signature does not make this an `Err`: the merchant still
/// has to acknowledge the call. Check [`is_signature_valid`] or use
/// [`into_verified`] before trusting anything in here.
///
/// [`is_signature_valid`]: Self::is_signature_valid
/// [`into_verified`]: Self::into_verified
#[derive(Debug, Clone, Serialize)]
pub struct GatewayResponse {
    pub(crate) variant: GatewayVariant,
    pub(crate) fields: Vec<(String, String)>,
    pub(crate) received_signature: Option<String>,
    pub(crate) computed_signature: String,
    pub(crate) signature_valid: bool,
    pub(crate) outcome: OperationOutcome,
    pub(crate) response_code: Option<String>,
    pub(crate) message: String,
    pub(crate) reference: Option<String>,
    pub(crate) amount: Option<String>,
    pub(crate) authorization_number: Option<String>,
    pub(crate) call_number: Option<String>,
    pub(crate) transaction_number: Option<String>,
    pub(crate) card_brand: Option<String>,
    pub(crate) masked_pan: Option<String>,
    pub(crate) card_expiry: Option<String>,
    pub(crate) three_ds_status: Option<String>,
    pub(crate) three_ds_version: Option<String>,
}

impl GatewayResponse {
    pub fn variant(&self) -> GatewayVariant {
        self.variant
    }

    /// Every field as received, in order.
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// First value received under `name`.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn received_signature(&self) -> Option<&str> {
        self.received_signature.as_deref()
    }

    pub fn computed_signature(&self) -> &str {
        &self.computed_signature
    }

    pub fn is_signature_valid(&self) -> bool {
        self.signature_valid
    }

    pub fn outcome(&self) -> OperationOutcome {
        self.outcome
    }

    pub fn response_code(&self) -> Option<&str> {
        self.response_code.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    /// Amount exactly as the gateway wrote it (`12.50EUR`, `1250`).
    pub fn amount(&self) -> Option<&str> {
        self.amount.as_deref()
    }

    pub fn authorization_number(&self) -> Option<&str> {
        self.authorization_number.as_deref()
    }

    pub fn call_number(&self) -> Option<&str> {
        self.call_number.as_deref()
    }

    pub fn transaction_number(&self) -> Option<&str> {
        self.transaction_number.as_deref()
    }

    pub fn card_brand(&self) -> Option<&str> {
        self.card_brand.as_deref()
    }

    pub fn masked_pan(&self) -> Option<&str> {
        self.masked_pan.as_deref()
    }

    pub fn card_expiry(&self) -> Option<&str> {
        self.card_expiry.as_deref()
    }

    pub fn three_ds_status(&self) -> Option<&str> {
        self.three_ds_status.as_deref()
    }

    pub fn three_ds_version(&self) -> Option<&str> {
        self.three_ds_version.as_deref()
    }

    /// `Err(SignatureMismatch)` unless the signature checked out.
    pub fn into_verified(self) -> Result<Self, GatewayError> {
        if self.signature_valid {
            Ok(self)
        } else {
            Err(GatewayError::SignatureMismatch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(valid: bool) -> GatewayResponse {
        GatewayResponse {
            variant: GatewayVariant::Modern,
            fields: vec![("Erreur".into(), "00000".into())],
            received_signature: Some("AB".into()),
            computed_signature: "AB".into(),
            signature_valid: valid,
            outcome: if valid {
                OperationOutcome::Approved
            } else {
                OperationOutcome::Error
            },
            response_code: Some("00000".into()),
            message: "Operation successful".into(),
            reference: None,
            amount: None,
            authorization_number: None,
            call_number: None,
            transaction_number: None,
            card_brand: None,
            masked_pan: None,
            card_expiry: None,
            three_ds_status: None,
            three_ds_version: None,
        }
    }

    #[test]
    fn verified_response_passes() {
        let r = response(true).into_verified().unwrap();
        assert_eq!(r.field("Erreur"), Some("00000"));
    }

    #[test]
    fn forged_response_is_signature_mismatch() {
        match response(false).into_verified() {
            Err(GatewayError::SignatureMismatch) => {}
            other => panic!("expected SignatureMismatch, got {:?}", other),
        }
    }

    #[test]
    fn outcome_display() {
        assert_eq!(OperationOutcome::Pending.to_string(), "pending");
    }
}
