//! Merchant credentials and the gateway selector.
//!
//! A [`MerchantCredentials`] value is everything the bank gave the merchant
//! at onboarding: a terminal (or site) number, a company code, sometimes a
//! rank, and a hex secret. It is validated once at construction and is
//! immutable afterwards, so it can be shared freely between threads.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::config;
use crate::crypto::keys::{derive_key, SigningKey};
use crate::crypto::signatures::MacScheme;
use crate::error::GatewayError;

// ---------------------------------------------------------------------------
// GatewayVariant
// ---------------------------------------------------------------------------

/// Which of the two gateway protocols a merchant account speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GatewayVariant {
    /// HMAC-SHA1 TPE gateway, 40-character secret, `*`-delimited values.
    Legacy,
    /// HMAC-SHA512 site/rank gateway, 128-character secret, `&`-joined pairs.
    Modern,
}

impl GatewayVariant {
    /// Required length of the hex secret.
    pub fn secret_length(&self) -> usize {
        match self {
            Self::Legacy => config::LEGACY_SECRET_LENGTH,
            Self::Modern => config::MODERN_SECRET_LENGTH,
        }
    }

    /// Delimiter used when joining signed fields.
    pub fn delimiter(&self) -> &'static str {
        match self {
            Self::Legacy => config::LEGACY_DELIMITER,
            Self::Modern => config::MODERN_DELIMITER,
        }
    }

    /// Hash, digest casing and comparison rule for this gateway.
    pub fn mac_scheme(&self) -> MacScheme {
        match self {
            Self::Legacy => MacScheme::LEGACY,
            Self::Modern => MacScheme::MODERN,
        }
    }
}

impl fmt::Display for GatewayVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            Self::Modern => write!(f, "modern"),
        }
    }
}

impl std::str::FromStr for GatewayVariant {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "legacy" => Ok(Self::Legacy),
            "modern" => Ok(Self::Modern),
            other => Err(GatewayError::Configuration(format!(
                "unknown gateway variant '{}'",
                other
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Production or the bank's test platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Environment {
    Production,
    Sandbox,
}

impl Environment {
    /// The gateways' configuration pages expose this as a "test mode" flag.
    pub fn from_test_flag(test_mode: bool) -> Self {
        if test_mode {
            Self::Sandbox
        } else {
            Self::Production
        }
    }

    pub fn is_sandbox(&self) -> bool {
        matches!(self, Self::Sandbox)
    }
}

// ---------------------------------------------------------------------------
// SecretKey
// ---------------------------------------------------------------------------

/// The merchant's hex secret, as delivered by the bank.
///
/// Zeroized on drop and redacted in `Debug`. There is no `Display` and no
/// `Serialize` on purpose.
#[derive(Clone)]
pub struct SecretKey(Zeroizing<String>);

impl SecretKey {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(Zeroizing::new(hex.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey([REDACTED; {}])", self.0.len())
    }
}

// ---------------------------------------------------------------------------
// MerchantCredentials
// ---------------------------------------------------------------------------

/// Immutable merchant configuration, injected into every call.
#[derive(Debug, Clone)]
pub struct MerchantCredentials {
    variant: GatewayVariant,
    site_id: String,
    company_code: String,
    rank: Option<String>,
    secret: SecretKey,
    environment: Environment,
}

impl MerchantCredentials {
    /// Validates and assembles a credential set.
    ///
    /// The secret is run through [`derive_key`] once here so a bad key is
    /// reported at startup rather than on the first customer's checkout.
    /// The derived key is dropped immediately; every signing call derives
    /// it again.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Configuration`] if the site id is empty, the modern
    /// gateway has no rank, or the secret has the wrong length or alphabet.
    pub fn new(
        variant: GatewayVariant,
        site_id: impl Into<String>,
        company_code: impl Into<String>,
        rank: Option<String>,
        secret: SecretKey,
        environment: Environment,
    ) -> Result<Self, GatewayError> {
        let site_id = site_id.into().trim().to_string();
        let company_code = company_code.into().trim().to_string();
        let rank = rank
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        if site_id.is_empty() {
            return Err(GatewayError::Configuration(
                "terminal/site identifier is required".into(),
            ));
        }
        if variant == GatewayVariant::Modern && rank.is_none() {
            return Err(GatewayError::Configuration(
                "rank is required for the modern gateway".into(),
            ));
        }

        derive_key(secret.expose(), variant)?;

        Ok(Self {
            variant,
            site_id,
            company_code,
            rank,
            secret,
            environment,
        })
    }

    pub fn variant(&self) -> GatewayVariant {
        self.variant
    }

    /// `TPE` on the legacy gateway, `PBX_SITE` / `SITE` on the modern one.
    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    /// `societe` on the legacy gateway, `PBX_IDENTIFIANT` on the modern one.
    pub fn company_code(&self) -> &str {
        &self.company_code
    }

    /// `PBX_RANG` / `RANG`. Always `Some` for the modern gateway.
    pub fn rank(&self) -> Option<&str> {
        self.rank.as_deref()
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Derives the binary signing key for this merchant. Not cached.
    pub fn signing_key(&self) -> Result<SigningKey, GatewayError> {
        Ok(derive_key(self.secret.expose(), self.variant)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY_SECRET: &str = "0123456789abcdef0123456789abcdef01234567";

    fn modern_secret() -> String {
        "0123456789ABCDEF".repeat(8)
    }

    #[test]
    fn legacy_credentials_accept_valid_secret() {
        let creds = MerchantCredentials::new(
            GatewayVariant::Legacy,
            "1234567",
            "monSite1",
            None,
            SecretKey::new(LEGACY_SECRET),
            Environment::Sandbox,
        )
        .unwrap();
        assert_eq!(creds.site_id(), "1234567");
        assert!(creds.rank().is_none());
        assert!(creds.environment().is_sandbox());
    }

    #[test]
    fn modern_credentials_require_rank() {
        let err = MerchantCredentials::new(
            GatewayVariant::Modern,
            "1999888",
            "107904482",
            None,
            SecretKey::new(modern_secret()),
            Environment::Production,
        )
        .unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(_)));
    }

    #[test]
    fn wrong_secret_length_is_configuration_error() {
        // A legacy-length secret on the modern gateway.
        let err = MerchantCredentials::new(
            GatewayVariant::Modern,
            "1999888",
            "107904482",
            Some("32".into()),
            SecretKey::new(LEGACY_SECRET),
            Environment::Production,
        )
        .unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(_)));
    }

    #[test]
    fn empty_site_is_rejected() {
        let err = MerchantCredentials::new(
            GatewayVariant::Legacy,
            "  ",
            "monSite1",
            None,
            SecretKey::new(LEGACY_SECRET),
            Environment::Production,
        )
        .unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(_)));
    }

    #[test]
    fn secret_is_redacted_in_debug() {
        let secret = SecretKey::new(LEGACY_SECRET);
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("0123456789"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn variant_parses_case_insensitively() {
        assert_eq!("Legacy".parse::<GatewayVariant>().unwrap(), GatewayVariant::Legacy);
        assert_eq!("MODERN".parse::<GatewayVariant>().unwrap(), GatewayVariant::Modern);
        assert!("sepa".parse::<GatewayVariant>().is_err());
    }

    #[test]
    fn test_flag_selects_environment() {
        assert_eq!(Environment::from_test_flag(true), Environment::Sandbox);
        assert_eq!(Environment::from_test_flag(false), Environment::Production);
    }
}
