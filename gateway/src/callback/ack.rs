//! Acknowledgement bodies.
//!
//! Both gateways call the merchant's notification URL server to server and
//! expect a fixed plain-text answer. The legacy gateway retries until it
//! gets one; what it gets tells it whether the merchant accepted the MAC.

use crate::merchant::GatewayVariant;

pub const LEGACY_ACK_ACCEPTED: &str = "version=2\ncdr=0\n";
pub const LEGACY_ACK_REJECTED: &str = "version=2\ncdr=1\n";
pub const MODERN_ACK_ACCEPTED: &str = "OK";
pub const MODERN_ACK_REJECTED: &str = "KO";

/// Body to answer a callback with, given whether its signature checked out.
pub fn acknowledgement(variant: GatewayVariant, is_signature_valid: bool) -> &'static str {
    match (variant, is_signature_valid) {
        (GatewayVariant::Legacy, true) => LEGACY_ACK_ACCEPTED,
        (GatewayVariant::Legacy, false) => LEGACY_ACK_REJECTED,
        (GatewayVariant::Modern, true) => MODERN_ACK_ACCEPTED,
        (GatewayVariant::Modern, false) => MODERN_ACK_REJECTED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acknowledgement_bodies() {
        assert_eq!(acknowledgement(GatewayVariant::Legacy, true), "version=2\ncdr=0\n");
        assert_eq!(acknowledgement(GatewayVariant::Legacy, false), "version=2\ncdr=1\n");
        assert_eq!(acknowledgement(GatewayVariant::Modern, true), "OK");
        assert_eq!(acknowledgement(GatewayVariant::Modern, false), "KO");
    }
}
