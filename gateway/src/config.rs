//! # Protocol Configuration & Constants
//!
//! Every magic string the two gateways expect lives here. If you're
//! hardcoding an endpoint or a field width somewhere else, you're doing it
//! wrong and the next gateway migration will find you.
//!
//! These values are dictated by the banks, not by us. Changing one of them
//! without a matching change on the gateway side produces requests that are
//! "correctly" signed and still rejected, which is the worst kind of bug.

// ---------------------------------------------------------------------------
// Legacy gateway (HMAC-SHA1, `*`-delimited)
// ---------------------------------------------------------------------------

/// Protocol version sent in every legacy request and folded into the MAC.
pub const LEGACY_PROTOCOL_VERSION: &str = "3.0";

/// Length of the merchant secret as delivered in the bank's key file.
pub const LEGACY_SECRET_LENGTH: usize = 40;

/// Number of secret characters copied verbatim before the tail transform.
pub const LEGACY_SECRET_PREFIX: usize = 38;

/// Field delimiter for legacy MAC strings.
pub const LEGACY_DELIMITER: &str = "*";

/// `date` format for payment requests and captures: `dd/mm/yyyy:hh:mm:ss`.
pub const LEGACY_DATE_FORMAT: &str = "%d/%m/%Y:%H:%M:%S";

/// `date_commande` format for captures: `dd/mm/yyyy`.
pub const LEGACY_ORDER_DATE_FORMAT: &str = "%d/%m/%Y";

/// Maximum reference length accepted by the legacy gateway.
pub const LEGACY_MAX_REFERENCE_LENGTH: usize = 50;

/// Maximum free-text length accepted by the legacy gateway.
pub const LEGACY_MAX_FREE_TEXT_LENGTH: usize = 3200;

/// The legacy gateway refuses an empty `texte-libre`; this stands in for it.
pub const LEGACY_FREE_TEXT_PLACEHOLDER: &str = "-";

/// Hosted payment page, production.
pub const LEGACY_FORM_URL_PRODUCTION: &str = "https://p.monetico-services.com/paiement.cgi";

/// Hosted payment page, test environment.
pub const LEGACY_FORM_URL_SANDBOX: &str = "https://p.monetico-services.com/test/paiement.cgi";

/// Server-to-server capture/cancel endpoint, production.
pub const LEGACY_DIRECT_URL_PRODUCTION: &str =
    "https://p.monetico-services.com/capture_paiement.cgi";

/// Server-to-server capture/cancel endpoint, test environment.
pub const LEGACY_DIRECT_URL_SANDBOX: &str =
    "https://p.monetico-services.com/test/capture_paiement.cgi";

// ---------------------------------------------------------------------------
// Modern gateway (HMAC-SHA512, `&`-delimited KEY=value)
// ---------------------------------------------------------------------------

/// Length of the merchant secret: 64 bytes, hex-encoded.
pub const MODERN_SECRET_LENGTH: usize = 128;

/// Field delimiter for modern MAC strings.
pub const MODERN_DELIMITER: &str = "&";

/// Value of `PBX_HASH` / `HASH`. Signed along with everything else.
pub const MODERN_HASH_NAME: &str = "SHA512";

/// Server-to-server protocol version.
pub const MODERN_DIRECT_VERSION: &str = "00104";

/// Activity code for e-commerce (internet) transactions.
pub const MODERN_DIRECT_ACTIVITY: &str = "024";

/// Width of the zero-padded `MONTANT` and `NUMQUESTION` direct fields.
pub const MODERN_DIRECT_NUMERIC_WIDTH: usize = 10;

/// Largest value that fits [`MODERN_DIRECT_NUMERIC_WIDTH`] digits.
pub const MODERN_DIRECT_NUMERIC_MAX: u64 = 9_999_999_999;

/// `DATEQ` format for direct requests: `ddmmyyyyhhmmss`.
pub const MODERN_DIRECT_DATE_FORMAT: &str = "%d%m%Y%H%M%S";

/// `PBX_TIME` format (ISO-8601 with offset).
pub const MODERN_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Maximum reference (`PBX_CMD` / `REFERENCE`) length.
pub const MODERN_MAX_REFERENCE_LENGTH: usize = 250;

/// Hosted payment page, production.
pub const MODERN_FORM_URL_PRODUCTION: &str =
    "https://tpeweb.paybox.com/cgi/MYchoix_pagepaiement.cgi";

/// Hosted payment page, pre-production.
pub const MODERN_FORM_URL_SANDBOX: &str =
    "https://preprod-tpeweb.paybox.com/cgi/MYchoix_pagepaiement.cgi";

/// Server-to-server endpoint, production.
pub const MODERN_DIRECT_URL_PRODUCTION: &str = "https://ppps.paybox.com/PPPS.php";

/// Server-to-server endpoint, pre-production.
pub const MODERN_DIRECT_URL_SANDBOX: &str = "https://preprod-ppps.paybox.com/PPPS.php";

/// Variables the modern gateway echoes back on the callback, in the order
/// they are requested through `PBX_RETOUR` and therefore signed. The
/// signature itself comes back last under [`MODERN_SIGNATURE_VARIABLE`].
///
/// `Site` and `Rang` are echoed so the merchant can route the callback; the
/// signature is always recomputed from the configured values, never the
/// echoed ones.
pub const MODERN_RETURN_VARIABLES: &[(&str, char)] = &[
    ("Site", 'X'),
    ("Rang", 'Y'),
    ("Mt", 'M'),
    ("Ref", 'R'),
    ("Auto", 'A'),
    ("Appel", 'T'),
    ("Trans", 'S'),
    ("Abonnement", 'B'),
    ("Carte", 'C'),
    ("Bin6", 'N'),
    ("Digits", 'J'),
    ("Validite", 'D'),
    ("Auth3DS", 'F'),
    ("Version3DS", 'v'),
    ("Erreur", 'E'),
];

/// Name of the callback variable carrying the response signature.
pub const MODERN_SIGNATURE_VARIABLE: &str = "Sign";

/// Letter code the gateway substitutes with the signature in `PBX_RETOUR`.
pub const MODERN_SIGNATURE_CODE: char = 'K';

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

/// Language used when the request carries fewer than two letters.
pub const DEFAULT_LANGUAGE: &str = "FR";

/// Two-letter language code to the modern gateway's three-letter code.
/// Anything not listed falls back to English, which is what the gateway
/// itself does with unknown values.
pub const MODERN_LANGUAGES: &[(&str, &str)] = &[
    ("FR", "FRA"),
    ("EN", "GBR"),
    ("DE", "DEU"),
    ("ES", "ESP"),
    ("IT", "ITA"),
    ("NL", "NLD"),
    ("PT", "PRT"),
    ("SV", "SWE"),
];

/// Fallback three-letter code for [`MODERN_LANGUAGES`].
pub const MODERN_DEFAULT_LANGUAGE: &str = "GBR";

/// Builds the `PBX_RETOUR` value from [`MODERN_RETURN_VARIABLES`], ending
/// with the signature slot: `Site:X;Rang:Y;...;Erreur:E;Sign:K`.
pub fn modern_return_format() -> String {
    let mut parts: Vec<String> = MODERN_RETURN_VARIABLES
        .iter()
        .map(|(name, code)| format!("{}:{}", name, code))
        .collect();
    parts.push(format!(
        "{}:{}",
        MODERN_SIGNATURE_VARIABLE, MODERN_SIGNATURE_CODE
    ));
    parts.join(";")
}

/// Maps a normalized two-letter language to the modern gateway's code.
pub fn modern_language(code: &str) -> &'static str {
    MODERN_LANGUAGES
        .iter()
        .find(|(two, _)| *two == code)
        .map(|(_, three)| *three)
        .unwrap_or(MODERN_DEFAULT_LANGUAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_lengths() {
        assert_eq!(LEGACY_SECRET_LENGTH, 40);
        assert_eq!(MODERN_SECRET_LENGTH, 128);
        assert!(LEGACY_SECRET_PREFIX + 2 == LEGACY_SECRET_LENGTH);
    }

    #[test]
    fn test_sandbox_urls_differ_from_production() {
        // Posting test cards to production is how you end up on a call
        // with the bank's fraud team.
        assert_ne!(LEGACY_FORM_URL_PRODUCTION, LEGACY_FORM_URL_SANDBOX);
        assert_ne!(LEGACY_DIRECT_URL_PRODUCTION, LEGACY_DIRECT_URL_SANDBOX);
        assert_ne!(MODERN_FORM_URL_PRODUCTION, MODERN_FORM_URL_SANDBOX);
        assert_ne!(MODERN_DIRECT_URL_PRODUCTION, MODERN_DIRECT_URL_SANDBOX);
    }

    #[test]
    fn test_return_spec_ends_with_signature() {
        let value = modern_return_format();
        assert!(value.starts_with("Site:X;Rang:Y;Mt:M;"));
        assert!(value.ends_with(";Erreur:E;Sign:K"));
    }

    #[test]
    fn test_return_variable_names_are_unique() {
        let mut names: Vec<&str> = MODERN_RETURN_VARIABLES.iter().map(|(n, _)| *n).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), MODERN_RETURN_VARIABLES.len());
    }

    #[test]
    fn test_modern_language_mapping() {
        assert_eq!(modern_language("FR"), "FRA");
        assert_eq!(modern_language("EN"), "GBR");
        assert_eq!(modern_language("XX"), MODERN_DEFAULT_LANGUAGE);
    }
}
