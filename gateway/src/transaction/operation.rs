//! Operation type resolution.
//!
//! Maps a logical [`OperationType`] to the code each gateway puts on the
//! wire. The modern gateway numbers every operation, with a second range
//! (`0005x`) for operations run against a stored subscriber instead of raw
//! card data. The legacy gateway only knows three operations, and each of
//! them exists on exactly one channel.

use std::fmt;

use super::types::{Channel, OperationType};
use crate::error::GatewayError;
use crate::merchant::GatewayVariant;

/// Gateway-specific operation code, e.g. `"00003"` or `"paiement"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationCode(&'static str);

impl OperationCode {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for OperationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Modern codes: `(operation, plain, stored subscriber)`.
const MODERN_CODES: &[(OperationType, &str, &str)] = &[
    (OperationType::AuthorizeOnly, "00001", "00051"),
    (OperationType::Debit, "00002", "00052"),
    (OperationType::AuthorizeAndDebit, "00003", "00053"),
    (OperationType::Credit, "00004", "00054"),
    (OperationType::Cancel, "00005", "00005"),
    (OperationType::RegisterSubscriber, "00056", "00056"),
    (OperationType::UpdateSubscriber, "00057", "00057"),
    (OperationType::DeleteSubscriber, "00058", "00058"),
];

/// Legacy codes. No stored-subscriber variants exist.
const LEGACY_CODES: &[(OperationType, &str, Channel)] = &[
    (OperationType::AuthorizeAndDebit, "paiement", Channel::Form),
    (OperationType::Debit, "capture", Channel::DirectHttp),
    (OperationType::Cancel, "annulation", Channel::DirectHttp),
];

/// Resolves the wire code for `operation` on `variant`.
///
/// # Errors
///
/// [`GatewayError::UnsupportedOperation`] when the gateway has no code for
/// the combination. Never for the modern gateway.
pub fn resolve(
    variant: GatewayVariant,
    operation: OperationType,
    uses_stored_subscriber: bool,
) -> Result<OperationCode, GatewayError> {
    let unsupported = || GatewayError::UnsupportedOperation {
        variant,
        operation,
        stored_subscriber: uses_stored_subscriber,
    };

    match variant {
        GatewayVariant::Modern => MODERN_CODES
            .iter()
            .find(|(op, _, _)| *op == operation)
            .map(|(_, plain, stored)| {
                OperationCode(if uses_stored_subscriber { *stored } else { *plain })
            })
            .ok_or_else(unsupported),
        GatewayVariant::Legacy => {
            if uses_stored_subscriber {
                return Err(unsupported());
            }
            LEGACY_CODES
                .iter()
                .find(|(op, _, _)| *op == operation)
                .map(|(_, code, _)| OperationCode(*code))
                .ok_or_else(unsupported)
        }
    }
}

/// Checks that `operation` may travel over `channel` on `variant`.
///
/// The hosted pages only take customer-present payments. Everything else
/// goes server to server. On the legacy gateway, the payment itself is
/// page-only and captures/cancels are direct-only.
pub fn ensure_channel(
    variant: GatewayVariant,
    operation: OperationType,
    uses_stored_subscriber: bool,
    channel: Channel,
) -> Result<(), GatewayError> {
    let allowed = match variant {
        GatewayVariant::Modern => {
            !channel.is_hosted_page()
                || matches!(
                    operation,
                    OperationType::AuthorizeOnly | OperationType::AuthorizeAndDebit
                )
        }
        GatewayVariant::Legacy => LEGACY_CODES
            .iter()
            .find(|(op, _, _)| *op == operation)
            .map(|(_, _, home)| home.is_hosted_page() == channel.is_hosted_page())
            .unwrap_or(false),
    };

    if allowed {
        Ok(())
    } else {
        Err(GatewayError::UnsupportedOperation {
            variant,
            operation,
            stored_subscriber: uses_stored_subscriber,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn modern_is_total() {
        for op in OperationType::ALL {
            for stored in [false, true] {
                assert!(
                    resolve(GatewayVariant::Modern, op, stored).is_ok(),
                    "{} (stored: {}) has no modern code",
                    op,
                    stored
                );
            }
        }
    }

    #[test]
    fn modern_is_injective_within_each_partition() {
        for stored in [false, true] {
            let codes: HashSet<&str> = OperationType::ALL
                .iter()
                .map(|op| resolve(GatewayVariant::Modern, *op, stored).unwrap().as_str())
                .collect();
            assert_eq!(codes.len(), OperationType::ALL.len());
        }
    }

    #[test]
    fn modern_known_codes() {
        let code = |op, stored| resolve(GatewayVariant::Modern, op, stored).unwrap().as_str();
        assert_eq!(code(OperationType::AuthorizeOnly, false), "00001");
        assert_eq!(code(OperationType::AuthorizeAndDebit, false), "00003");
        assert_eq!(code(OperationType::AuthorizeAndDebit, true), "00053");
        assert_eq!(code(OperationType::Credit, true), "00054");
        assert_eq!(code(OperationType::Cancel, true), "00005");
        assert_eq!(code(OperationType::DeleteSubscriber, false), "00058");
    }

    #[test]
    fn legacy_supports_three_operations() {
        let code = |op| resolve(GatewayVariant::Legacy, op, false).unwrap().as_str();
        assert_eq!(code(OperationType::AuthorizeAndDebit), "paiement");
        assert_eq!(code(OperationType::Debit), "capture");
        assert_eq!(code(OperationType::Cancel), "annulation");
    }

    #[test]
    fn legacy_rejects_the_rest() {
        for op in [
            OperationType::AuthorizeOnly,
            OperationType::Credit,
            OperationType::RegisterSubscriber,
            OperationType::UpdateSubscriber,
            OperationType::DeleteSubscriber,
        ] {
            match resolve(GatewayVariant::Legacy, op, false) {
                Err(GatewayError::UnsupportedOperation { operation, .. }) => {
                    assert_eq!(operation, op)
                }
                other => panic!("expected UnsupportedOperation, got {:?}", other),
            }
        }
    }

    #[test]
    fn legacy_rejects_stored_subscriber() {
        assert!(resolve(GatewayVariant::Legacy, OperationType::AuthorizeAndDebit, true).is_err());
    }

    #[test]
    fn channel_rules() {
        use Channel::*;
        use OperationType::*;

        assert!(ensure_channel(GatewayVariant::Legacy, AuthorizeAndDebit, false, Form).is_ok());
        assert!(ensure_channel(GatewayVariant::Legacy, AuthorizeAndDebit, false, Url).is_ok());
        assert!(ensure_channel(GatewayVariant::Legacy, AuthorizeAndDebit, false, DirectHttp).is_err());
        assert!(ensure_channel(GatewayVariant::Legacy, Debit, false, DirectHttp).is_ok());
        assert!(ensure_channel(GatewayVariant::Legacy, Cancel, false, Form).is_err());

        assert!(ensure_channel(GatewayVariant::Modern, AuthorizeOnly, false, Form).is_ok());
        assert!(ensure_channel(GatewayVariant::Modern, Credit, false, Url).is_err());
        assert!(ensure_channel(GatewayVariant::Modern, DeleteSubscriber, false, DirectHttp).is_ok());
    }
}
