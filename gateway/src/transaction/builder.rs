//! Transaction request building.
//!
//! [`TransactionRequestBuilder`] turns a validated [`TransactionRequest`]
//! into something the gateway accepts: a self-posting form, a redirect URL,
//! or a completed server-to-server call. The flow is the same for every
//! gateway and channel:
//!
//! 1. resolve the operation code and check the channel;
//! 2. apply the gateway's field rules (all failures reported together);
//! 3. assemble the canonical field list and sign it;
//! 4. render, or send through the injected [`Transport`].
//!
//! Nothing touches the network before step 4, and step 4 happens at most
//! once per call.

use tracing::debug;

use super::direct::{self, DirectPayment};
use super::fields::{self, SignedPayload, LEGACY_FREE_TEXT_FIELD};
use super::operation;
use super::render::{self, PaymentForm, PaymentUrl};
use super::request::TransactionRequest;
use super::types::Channel;
use crate::config;
use crate::currency::{CurrencyService, Iso4217};
use crate::error::GatewayError;
use crate::merchant::{Environment, GatewayVariant, MerchantCredentials};
use crate::transport::{send_checked, DirectRequest, Transport, FORM_CONTENT_TYPE};

// ---------------------------------------------------------------------------
// RenderedPayment
// ---------------------------------------------------------------------------

/// The output of a build, one shape per channel.
#[derive(Debug, Clone)]
pub enum RenderedPayment {
    Form(PaymentForm),
    Url(PaymentUrl),
    Direct(DirectPayment),
}

impl RenderedPayment {
    /// The signed fields behind this rendering.
    pub fn payload(&self) -> &SignedPayload {
        match self {
            Self::Form(form) => &form.payload,
            Self::Url(url) => &url.payload,
            Self::Direct(direct) => &direct.payload,
        }
    }

    pub fn channel(&self) -> Channel {
        match self {
            Self::Form(_) => Channel::Form,
            Self::Url(_) => Channel::Url,
            Self::Direct(_) => Channel::DirectHttp,
        }
    }
}

/// Gateway endpoint for a variant, channel and environment.
pub fn endpoint(variant: GatewayVariant, channel: Channel, environment: Environment) -> &'static str {
    let sandbox = environment.is_sandbox();
    match (variant, channel.is_hosted_page(), sandbox) {
        (GatewayVariant::Legacy, true, false) => config::LEGACY_FORM_URL_PRODUCTION,
        (GatewayVariant::Legacy, true, true) => config::LEGACY_FORM_URL_SANDBOX,
        (GatewayVariant::Legacy, false, false) => config::LEGACY_DIRECT_URL_PRODUCTION,
        (GatewayVariant::Legacy, false, true) => config::LEGACY_DIRECT_URL_SANDBOX,
        (GatewayVariant::Modern, true, false) => config::MODERN_FORM_URL_PRODUCTION,
        (GatewayVariant::Modern, true, true) => config::MODERN_FORM_URL_SANDBOX,
        (GatewayVariant::Modern, false, false) => config::MODERN_DIRECT_URL_PRODUCTION,
        (GatewayVariant::Modern, false, true) => config::MODERN_DIRECT_URL_SANDBOX,
    }
}

// ---------------------------------------------------------------------------
// TransactionRequestBuilder
// ---------------------------------------------------------------------------

/// Signs and renders transaction requests.
///
/// Holds only collaborators, never merchant state, so one builder can serve
/// any number of merchants and threads.
pub struct TransactionRequestBuilder {
    currencies: Box<dyn CurrencyService>,
    transport: Option<Box<dyn Transport>>,
}

impl Default for TransactionRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TransactionRequestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionRequestBuilder")
            .field("transport", &self.transport.is_some())
            .finish_non_exhaustive()
    }
}

impl TransactionRequestBuilder {
    /// A builder with the built-in ISO-4217 table and no transport.
    /// Form and Url builds work; DirectHttp needs [`with_transport`](Self::with_transport).
    pub fn new() -> Self {
        Self {
            currencies: Box::new(Iso4217),
            transport: None,
        }
    }

    pub fn with_currency_service(mut self, currencies: impl CurrencyService + 'static) -> Self {
        self.currencies = Box::new(currencies);
        self
    }

    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    /// Validates and signs `request`, then renders it for `channel` or, for
    /// DirectHttp, sends it and parses the reply.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::UnsupportedOperation`] if the gateway has no code
    ///   for the operation, or not on this channel.
    /// - [`GatewayError::Configuration`] for DirectHttp without a transport,
    ///   or if the credentials' key cannot be derived.
    /// - [`GatewayError::Validation`] listing every rejected field.
    /// - [`GatewayError::GatewayUnavailable`] if the direct call failed or
    ///   the reply was unusable.
    pub fn build(
        &self,
        credentials: &MerchantCredentials,
        request: &TransactionRequest,
        channel: Channel,
    ) -> Result<RenderedPayment, GatewayError> {
        let transport = match channel {
            Channel::DirectHttp => Some(self.transport.as_deref().ok_or_else(|| {
                GatewayError::Configuration("DirectHttp requires a transport".into())
            })?),
            _ => None,
        };

        let payload = self.sign(credentials, request, channel)?;
        let action = endpoint(credentials.variant(), channel, credentials.environment());

        match (channel, transport) {
            (Channel::Form, _) => {
                let free_text = match credentials.variant() {
                    GatewayVariant::Legacy => Some(LEGACY_FREE_TEXT_FIELD),
                    GatewayVariant::Modern => None,
                };
                Ok(RenderedPayment::Form(render::form(action, payload, free_text)))
            }
            (Channel::Url, _) => Ok(RenderedPayment::Url(render::url(action, payload)?)),
            (Channel::DirectHttp, Some(transport)) => {
                let direct_request = DirectRequest {
                    url: action.to_string(),
                    content_type: FORM_CONTENT_TYPE,
                    body: direct::encode_body(&payload),
                };
                debug!(
                    variant = %credentials.variant(),
                    operation = %request.operation(),
                    url = action,
                    "sending direct request"
                );
                let reply = send_checked(transport, &direct_request)?;
                let response = direct::parse_reply(credentials.variant(), &reply.body)?;
                debug!(
                    outcome = %response.outcome,
                    code = %response.code,
                    "direct reply received"
                );
                Ok(RenderedPayment::Direct(DirectPayment { payload, response }))
            }
            (Channel::DirectHttp, None) => Err(GatewayError::Configuration(
                "DirectHttp requires a transport".into(),
            )),
        }
    }

    /// Runs every step of [`build`](Self::build) up to and including
    /// signing, without rendering or sending anything.
    pub fn sign(
        &self,
        credentials: &MerchantCredentials,
        request: &TransactionRequest,
        channel: Channel,
    ) -> Result<SignedPayload, GatewayError> {
        let variant = credentials.variant();
        let stored = request.uses_stored_subscriber();

        let code = operation::resolve(variant, request.operation(), stored)?;
        operation::ensure_channel(variant, request.operation(), stored, channel)?;

        let normalized = fields::normalize(variant, channel, request, self.currencies.as_ref())?;
        let payload = fields::assemble(credentials, request, &normalized, code, channel)?;

        debug!(
            variant = %variant,
            operation = %request.operation(),
            code = %code,
            channel = %channel,
            fields = payload.signed_fields().len(),
            "request signed"
        );

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use chrono::TimeZone;
    use rust_decimal::Decimal;

    use super::*;
    use crate::callback::OperationOutcome;
    use crate::merchant::SecretKey;
    use crate::transaction::types::{Amount, OperationType, ReturnUrls};
    use crate::transport::{DirectReply, TransportError};

    struct CannedTransport {
        calls: Arc<AtomicUsize>,
        reply: DirectReply,
    }

    impl Transport for CannedTransport {
        fn send(&self, request: &DirectRequest) -> Result<DirectReply, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(request.content_type, FORM_CONTENT_TYPE);
            Ok(self.reply.clone())
        }
    }

    fn legacy_credentials(environment: Environment) -> MerchantCredentials {
        MerchantCredentials::new(
            GatewayVariant::Legacy,
            "1234567",
            "monSite1",
            None,
            SecretKey::new("0123456789abcdef0123456789abcdef01234567"),
            environment,
        )
        .unwrap()
    }

    fn payment() -> TransactionRequest {
        TransactionRequest::draft(OperationType::AuthorizeAndDebit)
            .amount(Amount::new(Decimal::new(1250, 2), "EUR"))
            .reference("ORDER-042")
            .return_urls(ReturnUrls {
                ok: Some("https://shop.example/ok".into()),
                refused: Some("https://shop.example/ko".into()),
                ..ReturnUrls::default()
            })
            .timestamp(chrono::Utc.with_ymd_and_hms(2026, 10, 18, 10, 0, 0).unwrap())
            .finish()
            .unwrap()
    }

    #[test]
    fn endpoints_follow_environment() {
        assert_eq!(
            endpoint(GatewayVariant::Legacy, Channel::Form, Environment::Sandbox),
            config::LEGACY_FORM_URL_SANDBOX
        );
        assert_eq!(
            endpoint(GatewayVariant::Modern, Channel::DirectHttp, Environment::Production),
            config::MODERN_DIRECT_URL_PRODUCTION
        );
    }

    #[test]
    fn form_build_targets_sandbox() {
        let rendered = TransactionRequestBuilder::new()
            .build(&legacy_credentials(Environment::Sandbox), &payment(), Channel::Form)
            .unwrap();
        match rendered {
            RenderedPayment::Form(form) => {
                assert_eq!(form.action, config::LEGACY_FORM_URL_SANDBOX);
                assert!(form.html.contains("name=\"montant\" value=\"12.50EUR\""));
            }
            other => panic!("expected Form, got {:?}", other),
        }
    }

    #[test]
    fn url_build_round_trips() {
        let creds = legacy_credentials(Environment::Production);
        let rendered = TransactionRequestBuilder::new()
            .build(&creds, &payment(), Channel::Url)
            .unwrap();
        assert_eq!(rendered.channel(), Channel::Url);
        assert!(rendered.payload().verify(&creds).unwrap());
        match rendered {
            RenderedPayment::Url(url) => {
                assert!(url.url.starts_with(config::LEGACY_FORM_URL_PRODUCTION));
                assert!(url.url.contains("MAC="));
            }
            other => panic!("expected Url, got {:?}", other),
        }
    }

    #[test]
    fn direct_without_transport_is_configuration_error() {
        let request = TransactionRequest::draft(OperationType::Debit)
            .amount(Amount::new(Decimal::new(1250, 2), "EUR"))
            .reference("ORDER-042")
            .original_transaction(Default::default())
            .finish()
            .unwrap();
        match TransactionRequestBuilder::new().build(
            &legacy_credentials(Environment::Sandbox),
            &request,
            Channel::DirectHttp,
        ) {
            Err(GatewayError::Configuration(msg)) => assert!(msg.contains("transport")),
            other => panic!("expected Configuration, got {:?}", other),
        }
    }

    #[test]
    fn legacy_capture_goes_through_transport_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let builder = TransactionRequestBuilder::new().with_transport(CannedTransport {
            calls: Arc::clone(&calls),
            reply: DirectReply {
                status: 200,
                body: "version=1.0\ncdr=1\nlib=paiement accepte\n".into(),
            },
        });
        let request = TransactionRequest::draft(OperationType::Debit)
            .amount(Amount::new(Decimal::new(1250, 2), "EUR"))
            .reference("ORDER-042")
            .original_transaction(Default::default())
            .finish()
            .unwrap();

        let rendered = builder
            .build(&legacy_credentials(Environment::Sandbox), &request, Channel::DirectHttp)
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        match rendered {
            RenderedPayment::Direct(direct) => {
                assert_eq!(direct.response.outcome, OperationOutcome::Approved);
                assert_eq!(direct.payload.field("montant_a_capturer"), Some("12.50EUR"));
            }
            other => panic!("expected Direct, got {:?}", other),
        }
    }

    #[test]
    fn http_error_is_gateway_unavailable() {
        let calls = Arc::new(AtomicUsize::new(0));
        let builder = TransactionRequestBuilder::new().with_transport(CannedTransport {
            calls: Arc::clone(&calls),
            reply: DirectReply {
                status: 500,
                body: String::new(),
            },
        });
        let request = TransactionRequest::draft(OperationType::Cancel)
            .amount(Amount::new(Decimal::new(1250, 2), "EUR"))
            .reference("ORDER-042")
            .original_transaction(Default::default())
            .finish()
            .unwrap();

        assert!(matches!(
            builder.build(&legacy_credentials(Environment::Sandbox), &request, Channel::DirectHttp),
            Err(GatewayError::GatewayUnavailable(_))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsupported_channel_is_rejected_before_validation() {
        let request = TransactionRequest::draft(OperationType::Credit)
            .amount(Amount::new(Decimal::new(1250, 2), "EUR"))
            .reference("ORDER-042")
            .finish()
            .unwrap();
        match TransactionRequestBuilder::new().build(
            &legacy_credentials(Environment::Sandbox),
            &request,
            Channel::Form,
        ) {
            Err(GatewayError::UnsupportedOperation { operation, .. }) => {
                assert_eq!(operation, OperationType::Credit)
            }
            other => panic!("expected UnsupportedOperation, got {:?}", other),
        }
    }
}
