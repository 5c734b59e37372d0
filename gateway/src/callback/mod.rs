//! # Callback Module
//!
//! Everything that happens when the gateway calls the merchant back.
//!
//! ```text
//! validator.rs: CallbackRequest parsing and ResponseValidator
//! response.rs:  GatewayResponse and OperationOutcome
//! codes.rs:     ResponseCodeCatalog (code → message)
//! ack.rs:       acknowledgement bodies the gateway expects in return
//! ```
//!
//! A typical notification handler:
//!
//! 1. Wrap the query string or body in a [`CallbackRequest`].
//! 2. Run [`ResponseValidator::validate`] with the merchant's credentials.
//! 3. Act on [`GatewayResponse::outcome`] only if the signature is valid.
//! 4. Answer with [`acknowledgement`], valid or not.

pub mod ack;
pub mod codes;
pub mod response;
pub mod validator;

pub use ack::acknowledgement;
pub use codes::ResponseCodeCatalog;
pub use response::{GatewayResponse, OperationOutcome};
pub use validator::{CallbackRequest, DeliveryMethod, ResponseValidator};
