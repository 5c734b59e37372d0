// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Paygate: Signed Payment Gateway Core
//!
//! The part of a card-payment integration that has to be exactly right:
//! building the requests a bank's payment gateway accepts, signing them the
//! way the bank signs them, and checking that whatever comes back was really
//! signed by the bank.
//!
//! Two gateway families are supported, selected per merchant by
//! [`GatewayVariant`]:
//!
//! - **Legacy**: a 40-character secret with a quirky key transform,
//!   HMAC-SHA1, `*`-delimited values, lowercase hex.
//! - **Modern**: a 128-character secret, HMAC-SHA512, `&`-joined
//!   `KEY=value` pairs, uppercase hex.
//!
//! ## Architecture
//!
//! - **crypto**: key derivation and the signature engine. The only place
//!   a MAC is computed.
//! - **transaction**: request model, operation codes, field assembly,
//!   form/URL rendering and direct calls.
//! - **callback**: callback validation, response codes, acknowledgements.
//! - **merchant**: credentials, gateway variant, environment.
//! - **currency** / **transport**: the two collaborators the integrator
//!   may replace.
//! - **config**: protocol constants and endpoints.
//! - **error**: the error taxonomy.
//!
//! ## Design Philosophy
//!
//! 1. The bank is always right about the wire format, even when it's odd.
//! 2. Keys never reach a log line, and `Debug` never prints one.
//! 3. A bad signature on a callback is data, not an exception.
//! 4. If it touches money, it has tests. Plural.

pub mod callback;
pub mod config;
pub mod crypto;
pub mod currency;
pub mod error;
pub mod merchant;
pub mod transaction;
pub mod transport;

pub use callback::{
    acknowledgement, CallbackRequest, GatewayResponse, OperationOutcome, ResponseCodeCatalog,
    ResponseValidator,
};
pub use error::{GatewayError, ValidationErrors};
pub use merchant::{Environment, GatewayVariant, MerchantCredentials, SecretKey};
pub use transaction::{
    Channel, OperationType, RenderedPayment, TransactionRequest, TransactionRequestBuilder,
};
