//! # Signature Engine
//!
//! HMAC over a delimiter-joined field list, rendered as hex.
//!
//! Both gateways sign a flat string built by joining an ordered list of
//! fields. Empty fields stay in as zero-length segments: `a**b` and `a*b`
//! are different messages, and the gateways count segments. Drop a
//! trailing empty field and the signature changes.
//!
//! ## Casing
//!
//! The gateways disagree on hex casing, and both compare case-sensitively
//! on their own rendering:
//!
//! - legacy renders lowercase and lowercases whatever it receives before
//!   comparing;
//! - modern renders uppercase and compares the received value as-is.
//!
//! We reproduce each rule rather than normalizing both. Comparison is
//! constant time either way.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha512;
use subtle::ConstantTimeEq;

use super::keys::SigningKey;

/// HMAC hash function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha1,
    Sha512,
}

impl HashAlgorithm {
    /// Digest length in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha512 => 64,
        }
    }
}

/// Hex alphabet of the rendered digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestCase {
    Lower,
    Upper,
}

/// What happens to a received signature before it is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceivedCase {
    /// Lowercased first.
    Lowercased,
    /// Compared exactly as received.
    AsReceived,
}

/// The full signing contract of one gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacScheme {
    pub hash: HashAlgorithm,
    pub digest_case: DigestCase,
    pub received_case: ReceivedCase,
}

impl MacScheme {
    pub const LEGACY: MacScheme = MacScheme {
        hash: HashAlgorithm::Sha1,
        digest_case: DigestCase::Lower,
        received_case: ReceivedCase::Lowercased,
    };

    pub const MODERN: MacScheme = MacScheme {
        hash: HashAlgorithm::Sha512,
        digest_case: DigestCase::Upper,
        received_case: ReceivedCase::AsReceived,
    };
}

/// Joins `fields` with `delimiter`, keeping empty fields.
pub fn canonical_message<S: AsRef<str>>(fields: &[S], delimiter: &str) -> String {
    let mut message = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            message.push_str(delimiter);
        }
        message.push_str(field.as_ref());
    }
    message
}

/// Raw HMAC bytes over `message`.
pub fn hmac_digest(key: &SigningKey, hash: HashAlgorithm, message: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length, so `new_from_slice` cannot fail here.
    match hash {
        HashAlgorithm::Sha1 => {
            let mut mac = <Hmac<Sha1> as Mac>::new_from_slice(key.as_bytes())
                .expect("HMAC accepts keys of any length");
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        HashAlgorithm::Sha512 => {
            let mut mac = <Hmac<Sha512> as Mac>::new_from_slice(key.as_bytes())
                .expect("HMAC accepts keys of any length");
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
    }
}

/// Signs an ordered field list and renders the digest per `scheme`.
///
/// Pure and deterministic: the same fields, delimiter, key and scheme
/// always produce the same string.
///
/// # Example
///
/// ```
/// use paygate::crypto::keys::SigningKey;
/// use paygate::crypto::signatures::{sign, MacScheme};
///
/// let key = SigningKey::from_bytes(vec![0x0b; 20]);
/// let sig = sign(&["a", "", "b"], "*", &key, MacScheme::LEGACY);
/// assert_eq!(sig.len(), 40);
/// assert_eq!(sig, sig.to_lowercase());
/// ```
pub fn sign<S: AsRef<str>>(fields: &[S], delimiter: &str, key: &SigningKey, scheme: MacScheme) -> String {
    let message = canonical_message(fields, delimiter);
    let digest = hmac_digest(key, scheme.hash, message.as_bytes());
    match scheme.digest_case {
        DigestCase::Lower => hex::encode(digest),
        DigestCase::Upper => hex::encode_upper(digest),
    }
}

/// Recomputes the signature and compares it with `expected` in constant
/// time, applying the scheme's casing rule to `expected` first.
pub fn verify<S: AsRef<str>>(
    fields: &[S],
    delimiter: &str,
    key: &SigningKey,
    scheme: MacScheme,
    expected: &str,
) -> bool {
    let computed = sign(fields, delimiter, key, scheme);
    signatures_match(&computed, expected, scheme)
}

/// Compares an already-computed signature with a received one.
pub fn signatures_match(computed: &str, received: &str, scheme: MacScheme) -> bool {
    if received.len() != scheme.hash.output_len() * 2 {
        return false;
    }
    let received = match scheme.received_case {
        ReceivedCase::Lowercased => received.to_lowercase(),
        ReceivedCase::AsReceived => received.to_string(),
    };
    constant_time_eq(computed.as_bytes(), received.as_bytes())
}

/// Length leaks, content does not. Signature lengths are public anyway.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
