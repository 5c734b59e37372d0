//! Property tests for the signature engine and the callback validator.

use proptest::prelude::*;
use url::form_urlencoded;

use paygate::callback::{CallbackRequest, OperationOutcome, ResponseValidator};
use paygate::crypto::keys::{derive_key, SigningKey};
use paygate::crypto::signatures::{sign, verify, MacScheme};
use paygate::merchant::{Environment, GatewayVariant, MerchantCredentials, SecretKey};

/// Replaces the hex digit at `index` with a different one of the same case.
fn flip_hex_digit(signature: &str, index: usize) -> String {
    let mut chars: Vec<char> = signature.chars().collect();
    let i = index % chars.len();
    chars[i] = match chars[i] {
        '0' => '1',
        'a' => 'b',
        'A' => 'B',
        _ => '0',
    };
    chars.into_iter().collect()
}

fn legacy_callback_body(secret: &str, montant: &str, signed_montant: &str) -> String {
    let key = derive_key(secret, GatewayVariant::Legacy).unwrap();
    let mut segments = vec![
        "1234567".to_string(),
        "18/10/2026_a_10:00:00".to_string(),
        signed_montant.to_string(),
        "ORDER-042".to_string(),
        "-".to_string(),
        "3.0".to_string(),
        "paiement".to_string(),
    ];
    // cvx .. pares, then the trailing empty segment.
    segments.extend(std::iter::repeat(String::new()).take(14));
    let mac = sign(&segments, "*", &key, MacScheme::LEGACY);

    form_urlencoded::Serializer::new(String::new())
        .append_pair("TPE", "1234567")
        .append_pair("date", "18/10/2026_a_10:00:00")
        .append_pair("montant", montant)
        .append_pair("reference", "ORDER-042")
        .append_pair("texte-libre", "-")
        .append_pair("code-retour", "paiement")
        .append_pair("MAC", &mac)
        .finish()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn signing_is_deterministic(
        key_bytes in any::<[u8; 32]>(),
        fields in prop::collection::vec("[ -~]{0,24}", 0..20),
    ) {
        let key = SigningKey::from_bytes(key_bytes.to_vec());

        let legacy = sign(&fields, "*", &key, MacScheme::LEGACY);
        prop_assert_eq!(&legacy, &sign(&fields, "*", &key, MacScheme::LEGACY));
        prop_assert_eq!(legacy.len(), 40);
        prop_assert_eq!(legacy.to_lowercase(), legacy.clone());

        let modern = sign(&fields, "&", &key, MacScheme::MODERN);
        prop_assert_eq!(modern.len(), 128);
        prop_assert_eq!(modern.to_uppercase(), modern.clone());
    }

    #[test]
    fn any_single_digit_change_fails_verification(
        key_bytes in prop::collection::vec(any::<u8>(), 64),
        fields in prop::collection::vec("[A-Z_]{1,12}=[a-zA-Z0-9]{0,16}", 1..12),
        index in any::<usize>(),
    ) {
        let key = SigningKey::from_bytes(key_bytes);
        for (scheme, delimiter) in [(MacScheme::LEGACY, "*"), (MacScheme::MODERN, "&")] {
            let signature = sign(&fields, delimiter, &key, scheme);
            prop_assert!(verify(&fields, delimiter, &key, scheme, &signature));

            let tampered = flip_hex_digit(&signature, index);
            prop_assert!(!verify(&fields, delimiter, &key, scheme, &tampered));
        }
    }

    #[test]
    fn legacy_accepts_uppercased_signature(
        key_bytes in any::<[u8; 20]>(),
        fields in prop::collection::vec("[a-z0-9]{0,8}", 1..19),
    ) {
        let key = SigningKey::from_bytes(key_bytes.to_vec());
        let signature = sign(&fields, "*", &key, MacScheme::LEGACY);
        prop_assert!(verify(&fields, "*", &key, MacScheme::LEGACY, &signature.to_uppercase()));
    }

    #[test]
    fn legacy_keys_always_derive_to_twenty_bytes(
        prefix in "[0-9a-fA-F]{38}",
        tail in "[0-9a-fA-F]{2}|[G-PX-Z][0-9a-fA-F]|[0-9a-fA-F]M",
    ) {
        let secret = format!("{}{}", prefix, tail);
        let key = derive_key(&secret, GatewayVariant::Legacy);
        prop_assert!(key.is_ok(), "{} rejected: {:?}", secret, key.err());
        prop_assert_eq!(key.unwrap().len(), 20);
    }

    #[test]
    fn tampered_legacy_amount_is_never_trusted(
        cents in 1u32..1_000_000,
        delta in 1u32..1000,
    ) {
        let secret = "0123456789abcdef0123456789abcdef01234567";
        let creds = MerchantCredentials::new(
            GatewayVariant::Legacy,
            "1234567",
            "monSite1",
            None,
            SecretKey::new(secret),
            Environment::Sandbox,
        ).unwrap();

        let genuine = format!("{}.{:02}EUR", cents / 100, cents % 100);
        let forged_cents = cents + delta;
        let forged = format!("{}.{:02}EUR", forged_cents / 100, forged_cents % 100);

        let ok = ResponseValidator::validate(
            &CallbackRequest::from_form_body(&legacy_callback_body(secret, &genuine, &genuine)),
            &creds,
        ).unwrap();
        prop_assert!(ok.is_signature_valid());
        prop_assert_eq!(ok.outcome(), OperationOutcome::Approved);

        let bad = ResponseValidator::validate(
            &CallbackRequest::from_form_body(&legacy_callback_body(secret, &forged, &genuine)),
            &creds,
        ).unwrap();
        prop_assert!(!bad.is_signature_valid());
        prop_assert_eq!(bad.outcome(), OperationOutcome::Error);
    }
}
