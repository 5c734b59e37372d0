//! Response code catalog.
//!
//! Human-readable text for the codes each gateway returns. Two tables per
//! gateway: general gateway codes, and card-network (authorization centre)
//! codes. The general table wins when a code appears in both.
//!
//! Advisory only. Nothing in the crate branches on these strings.

use crate::merchant::GatewayVariant;

/// Returned for any code not in the tables.
pub const UNKNOWN_ERROR: &str = "Unknown error";

type Table = &'static [(&'static str, &'static str)];

const MODERN_GENERAL: Table = &[
    ("00000", "Operation successful"),
    ("00001", "Connection to the authorization centre failed"),
    ("00002", "Inconsistent request"),
    ("00003", "Gateway error"),
    ("00004", "Invalid card number"),
    ("00005", "Invalid question number"),
    ("00006", "Access refused or site/rank/identifier incorrect"),
    ("00007", "Invalid date"),
    ("00008", "Invalid card expiry date"),
    ("00009", "Invalid operation type"),
    ("00010", "Unknown currency"),
    ("00011", "Invalid amount"),
    ("00012", "Invalid order reference"),
    ("00013", "Unsupported protocol version"),
    ("00014", "Inconsistent request frame"),
    ("00015", "Payment already made"),
    ("00016", "Subscriber already exists"),
    ("00017", "Subscriber does not exist"),
    ("00018", "Transaction not found"),
    ("00020", "Card verification value missing"),
    ("00021", "Card not accepted by the merchant"),
    ("00022", "Card not allowed for this operation"),
    ("00023", "Card type not accepted"),
    ("00024", "3-D Secure error"),
    ("00029", "Card not compliant"),
    ("00030", "Timeout on the payment page"),
    ("00031", "Reserved"),
    ("00032", "Reserved"),
    ("00033", "Country of the customer's IP address not allowed"),
    ("00034", "Operation refused by the fraud filter"),
    ("00040", "Operation without 3-D Secure authentication blocked by the fraud filter"),
    ("99999", "Operation pending validation by the issuer"),
];

const MODERN_CARD_NETWORK: Table = &[
    ("00100", "Transaction approved"),
    ("00102", "Contact the card issuer"),
    ("00103", "Invalid merchant"),
    ("00104", "Retain the card"),
    ("00105", "Do not honour"),
    ("00107", "Retain the card, special conditions"),
    ("00108", "Approve after cardholder identification"),
    ("00112", "Invalid transaction"),
    ("00113", "Invalid amount"),
    ("00114", "Invalid cardholder number"),
    ("00115", "Card issuer unknown"),
    ("00117", "Cancelled by the customer"),
    ("00119", "Repeat the transaction later"),
    ("00120", "Invalid response"),
    ("00124", "File update not supported"),
    ("00125", "Record not found"),
    ("00126", "Duplicate record"),
    ("00127", "File update error"),
    ("00130", "Format error"),
    ("00131", "Acquirer unknown"),
    ("00133", "Card expired"),
    ("00134", "Suspected fraud"),
    ("00138", "Too many PIN attempts"),
    ("00141", "Lost card"),
    ("00143", "Stolen card"),
    ("00151", "Insufficient funds"),
    ("00154", "Card expired"),
    ("00155", "Incorrect PIN"),
    ("00156", "Card not on file"),
    ("00157", "Transaction not permitted to the cardholder"),
    ("00158", "Transaction not permitted to the terminal"),
    ("00159", "Suspected fraud"),
    ("00160", "Card acceptor must contact the acquirer"),
    ("00161", "Withdrawal limit exceeded"),
    ("00163", "Security rules violated"),
    ("00168", "Response not received or received too late"),
    ("00175", "Too many PIN attempts"),
    ("00176", "Cardholder already blocked"),
    ("00189", "Authentication failed"),
    ("00190", "System temporarily unavailable"),
    ("00191", "Card issuer unreachable"),
    ("00194", "Duplicate request"),
    ("00196", "System malfunction"),
    ("00197", "Global surveillance timeout"),
    ("00198", "Server unreachable"),
    ("00199", "Incident in the initiating domain"),
];

const LEGACY_GENERAL: Table = &[
    ("paiement", "Payment accepted"),
    ("payetest", "Payment accepted (test)"),
    ("Annulation", "Payment refused or cancelled"),
    ("1", "Request processed"),
    ("0", "Request refused"),
    ("-1", "Request rejected: invalid parameters or signature"),
];

const LEGACY_CARD_NETWORK: Table = &[
    ("Appel Phonie", "The issuer requires a voice authorization"),
    ("Refus", "Refused by the issuer"),
    ("Interdit", "Card blocked by the issuer"),
    ("filtrage", "Blocked by the merchant's fraud filter"),
    ("scoring", "Blocked by risk scoring"),
    ("3DSecure", "3-D Secure authentication failed"),
];

/// Looks `code` up in `general`, then `card_network`.
pub fn lookup(general: Table, card_network: Table, code: &str) -> &'static str {
    general
        .iter()
        .chain(card_network.iter())
        .find(|(c, _)| *c == code)
        .map(|(_, message)| *message)
        .unwrap_or(UNKNOWN_ERROR)
}

/// Code-to-message catalog for both gateways.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseCodeCatalog;

impl ResponseCodeCatalog {
    /// Message for `code` on `variant`, or [`UNKNOWN_ERROR`].
    pub fn message(variant: GatewayVariant, code: &str) -> &'static str {
        match variant {
            GatewayVariant::Legacy => lookup(LEGACY_GENERAL, LEGACY_CARD_NETWORK, code.trim()),
            GatewayVariant::Modern => lookup(MODERN_GENERAL, MODERN_CARD_NETWORK, code.trim()),
        }
    }

    pub fn is_known(variant: GatewayVariant, code: &str) -> bool {
        Self::message(variant, code) != UNKNOWN_ERROR
    }
}
