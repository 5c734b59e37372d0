//! # Key Derivation
//!
//! Turns the merchant's hex secret into the exact binary HMAC key each
//! gateway expects.
//!
//! The modern gateway is boring in the best way: the secret *is* the hex
//! encoding of the key. The legacy gateway is not. Its key files carry a
//! 40-character string whose last two characters go through a small
//! transform before the whole thing is hex-decoded. The transform looks
//! arbitrary, and it is, but it is also what the bank's servers do. A
//! "cleaned up" version will agree with the bank on most keys and silently
//! disagree on the rest, so the thresholds below are load-bearing.
//!
//! ## Security considerations
//!
//! - Derived key bytes live in a `Zeroizing` buffer and are wiped on drop.
//! - Keys are never logged, and `Debug` prints only their length.
//! - Error messages say what is wrong with the shape of the secret, never
//!   which characters it contains.

use std::fmt;

use thiserror::Error;
use zeroize::Zeroizing;

use crate::config::{LEGACY_SECRET_LENGTH, LEGACY_SECRET_PREFIX};
use crate::error::GatewayError;
use crate::merchant::GatewayVariant;

/// Errors that can occur while deriving a signing key.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("secret must be {expected} characters, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("secret contains non-ASCII characters")]
    NotAscii,

    #[error("secret does not decode as hexadecimal")]
    InvalidHex,
}

impl From<KeyError> for GatewayError {
    fn from(err: KeyError) -> Self {
        GatewayError::Configuration(err.to_string())
    }
}

/// Binary HMAC key, wiped from memory on drop.
#[derive(Clone)]
pub struct SigningKey {
    bytes: Zeroizing<Vec<u8>>,
}

impl SigningKey {
    /// Wraps raw key bytes. Mostly useful in tests and benchmarks; real
    /// callers go through [`derive_key`].
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Zeroizing::new(bytes),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKey([REDACTED; {} bytes])", self.bytes.len())
    }
}

/// Derives the binary signing key for `variant` from a hex secret.
///
/// # Errors
///
/// - [`KeyError::WrongLength`] if `secret_hex` is not exactly 40 (legacy)
///   or 128 (modern) characters.
/// - [`KeyError::NotAscii`] if it contains anything outside ASCII.
/// - [`KeyError::InvalidHex`] if the (transformed) string is not hex.
///
/// # Example
///
/// ```
/// use paygate::crypto::keys::derive_key;
/// use paygate::merchant::GatewayVariant;
///
/// let key = derive_key("0123456789abcdef0123456789abcdef01234567", GatewayVariant::Legacy).unwrap();
/// assert_eq!(key.len(), 20);
/// ```
pub fn derive_key(secret_hex: &str, variant: GatewayVariant) -> Result<SigningKey, KeyError> {
    if !secret_hex.is_ascii() {
        return Err(KeyError::NotAscii);
    }

    let expected = variant.secret_length();
    if secret_hex.len() != expected {
        return Err(KeyError::WrongLength {
            expected,
            actual: secret_hex.len(),
        });
    }

    match variant {
        GatewayVariant::Legacy => derive_legacy(secret_hex),
        GatewayVariant::Modern => derive_modern(secret_hex),
    }
}

fn derive_legacy(secret: &str) -> Result<SigningKey, KeyError> {
    // ASCII was checked above, so byte indexing is character indexing.
    let bytes = secret.as_bytes();
    let mut usable = Zeroizing::new(String::with_capacity(LEGACY_SECRET_LENGTH));
    usable.push_str(&secret[..LEGACY_SECRET_PREFIX]);

    // The bank reads the tail as `<c0><c1>00` and inspects the first byte.
    let first = bytes[LEGACY_SECRET_PREFIX];
    let second = bytes[LEGACY_SECRET_PREFIX + 1];

    if first > 70 && first < 97 {
        usable.push(char::from(first - 23));
        usable.push(char::from(second));
    } else if second == b'M' {
        usable.push(char::from(first));
        usable.push('0');
    } else {
        usable.push(char::from(first));
        usable.push(char::from(second));
    }

    let decoded = hex::decode(usable.as_bytes()).map_err(|_| KeyError::InvalidHex)?;
    Ok(SigningKey::from_bytes(decoded))
}

fn derive_modern(secret: &str) -> Result<SigningKey, KeyError> {
    let decoded = hex::decode(secret).map_err(|_| KeyError::InvalidHex)?;
    Ok(SigningKey::from_bytes(decoded))
}
