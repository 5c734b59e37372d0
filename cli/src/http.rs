//! # HTTP Transport
//!
//! Blocking `reqwest` implementation of [`paygate::transport::Transport`].
//! One POST per direct operation; no retries, since a retried payment may
//! be a second payment.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

use paygate::transport::{DirectReply, DirectRequest, Transport, TransportError};

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("paygate/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &DirectRequest) -> Result<DirectReply, TransportError> {
        tracing::debug!(url = %request.url, "posting direct request");

        let response = self
            .client
            .post(&request.url)
            .header(CONTENT_TYPE, request.content_type)
            .body(request.body.clone())
            .send()
            .map_err(classify)?;

        let status = response.status().as_u16();
        let body = response.text().map_err(classify)?;
        tracing::debug!(status, bytes = body.len(), "direct reply received");

        Ok(DirectReply { status, body })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Connection(err.to_string())
    }
}
