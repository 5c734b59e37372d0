//! Transport collaborator for server-to-server calls.
//!
//! The core never opens a socket. A DirectHttp build hands one
//! [`DirectRequest`] to the injected [`Transport`] and parses whatever comes
//! back. Timeouts, retries, proxies and TLS settings are the transport's
//! business; the CLI ships a blocking `reqwest` implementation.

use thiserror::Error;

use crate::error::GatewayError;

/// Content type of every direct request body.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A ready-to-send POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectRequest {
    pub url: String,
    pub content_type: &'static str,
    /// Already URL-encoded. Contains card data on card operations; never
    /// log it.
    pub body: String,
}

/// The gateway's raw answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectReply {
    pub status: u16,
    pub body: String,
}

impl DirectReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("request timed out")]
    Timeout,

    #[error("unexpected HTTP status {0}")]
    Status(u16),
}

impl From<TransportError> for GatewayError {
    fn from(err: TransportError) -> Self {
        GatewayError::GatewayUnavailable(err.to_string())
    }
}

/// Performs one HTTP POST. Called at most once per build.
pub trait Transport: Send + Sync {
    fn send(&self, request: &DirectRequest) -> Result<DirectReply, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: &DirectRequest) -> Result<DirectReply, TransportError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send(&self, request: &DirectRequest) -> Result<DirectReply, TransportError> {
        (**self).send(request)
    }
}

/// Sends `request` and turns non-2xx answers into errors.
pub(crate) fn send_checked(
    transport: &dyn Transport,
    request: &DirectRequest,
) -> Result<DirectReply, GatewayError> {
    let reply = transport.send(request)?;
    if !reply.is_success() {
        return Err(TransportError::Status(reply.status).into());
    }
    Ok(reply)
}
