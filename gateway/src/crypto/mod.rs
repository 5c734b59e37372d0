//! # Cryptographic Primitives
//!
//! Key derivation and HMAC signing for both gateway protocols. Every MAC
//! that leaves or enters this crate is computed here.
//!
//! - **keys**: merchant hex secret to binary HMAC key, per gateway.
//! - **signatures**: canonical field joining, HMAC-SHA1 / HMAC-SHA512,
//!   hex rendering and constant-time comparison.
//!
//! Everything is a thin wrapper around the RustCrypto `hmac`, `sha1` and
//! `sha2` crates. The only original logic here is the legacy key transform,
//! and that is the bank's, not ours.

pub mod keys;
pub mod signatures;

pub use keys::{derive_key, KeyError, SigningKey};
pub use signatures::{sign, verify, DigestCase, HashAlgorithm, MacScheme, ReceivedCase};
