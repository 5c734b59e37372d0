//! Error taxonomy for the gateway core.
//!
//! Configuration and validation failures are raised before any network
//! activity. Signature problems on inbound callbacks are *not* raised here;
//! they end up in [`crate::callback::GatewayResponse::outcome`] so that the
//! callback handler can always answer the gateway.

use std::fmt;

use thiserror::Error;

use crate::merchant::GatewayVariant;
use crate::transaction::types::OperationType;

/// Every way a gateway operation can fail.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Bad or missing credentials, or a missing collaborator. Fatal.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// One or more transaction fields are missing or malformed.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// The transport collaborator failed or the gateway answered with
    /// something unusable. The caller decides whether to retry.
    #[error("gateway unavailable: {0}")]
    GatewayUnavailable(String),

    /// The inbound callback is structurally unusable.
    #[error("invalid callback: {0}")]
    InvalidCallback(String),

    /// The recomputed signature does not match the one received.
    #[error("signature mismatch")]
    SignatureMismatch,

    /// The operation has no code on this gateway (or not on this channel).
    #[error("unsupported operation {operation} on {variant} gateway (stored subscriber: {stored_subscriber})")]
    UnsupportedOperation {
        variant: GatewayVariant,
        operation: OperationType,
        stored_subscriber: bool,
    },
}

impl GatewayError {
    /// Shorthand for a single-field validation failure.
    pub fn invalid_field(field: &'static str, reason: impl Into<String>) -> Self {
        GatewayError::Validation(ValidationErrors::single(field, reason))
    }
}

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Name of the request field, as exposed on [`crate::transaction::TransactionRequest`].
    pub field: &'static str,
    /// Human-readable reason.
    pub reason: String,
}

/// All field errors found in one validation pass.
///
/// Validation does not stop at the first problem; a merchant fixing a form
/// should see every rejected field at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, reason: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, reason);
        errors
    }

    pub fn push(&mut self, field: &'static str, reason: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            reason: reason.into(),
        });
    }

    /// Appends every error from `other`.
    pub fn extend(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// Returns `true` if `field` is among the rejected fields.
    pub fn contains(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// `Ok(())` when nothing was collected, otherwise the whole batch.
    pub fn into_result(self) -> Result<(), GatewayError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(GatewayError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.reason))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}
