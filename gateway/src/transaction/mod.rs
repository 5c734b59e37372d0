//! # Transaction Module
//!
//! Outbound payment requests: what the merchant asks the gateway to do,
//! and how that request is signed and delivered.
//!
//! ## Architecture
//!
//! ```text
//! types.rs:     OperationType, Channel, Amount, payment sources, return URLs
//! request.rs:   TransactionRequest and its validating RequestDraft
//! operation.rs: OperationTypeResolver: logical operation → gateway code
//! fields.rs:    per-gateway field rules, canonical field order, SignedPayload
//! render.rs:    HTML form and redirect URL rendering
//! direct.rs:    server-to-server body encoding and reply parsing
//! builder.rs:   TransactionRequestBuilder tying the above together
//! ```
//!
//! ## Lifecycle
//!
//! 1. **Draft**: `TransactionRequest::draft(op)` and its setters.
//! 2. **Finish**: `finish()` validates and freezes the request.
//! 3. **Build**: [`TransactionRequestBuilder::build`] resolves, signs and
//!    renders it (or sends it, for DirectHttp).
//! 4. **Callback**: the gateway's answer is checked by
//!    [`crate::callback::ResponseValidator`].
//!
//! ## Design Decisions
//!
//! - Amounts are `rust_decimal::Decimal` up to the point of signing, then
//!   formatted per gateway. No floating point near money.
//! - A request that exists is valid. There is no "set fields, then
//!   discover at send time that one was missing".
//! - The signed field list and the posted field list are kept separately,
//!   because the gateways sign fields they never receive and receive fields
//!   they never sign.

pub mod builder;
pub mod direct;
pub mod fields;
pub mod operation;
pub mod render;
pub mod request;
pub mod types;

pub use builder::{endpoint, RenderedPayment, TransactionRequestBuilder};
pub use direct::{DirectPayment, DirectResponse};
pub use fields::SignedPayload;
pub use operation::{resolve, OperationCode};
pub use render::{PaymentForm, PaymentUrl};
pub use request::{RequestDraft, TransactionRequest};
pub use types::{
    Amount, CardData, Channel, OperationType, OriginalTransaction, PaymentSource, ReturnUrls,
    SubscriberToken,
};
