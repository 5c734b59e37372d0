// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Paygate CLI
//!
//! Entry point for the `paygate` binary. Parses CLI arguments, initializes
//! logging, loads merchant credentials and runs one operation against the
//! signing core.
//!
//! The binary supports five subcommands:
//!
//! - `form`:     print a self-submitting HTML payment form
//! - `url`:      print a signed redirect URL
//! - `direct`:   run a server-to-server operation over HTTPS
//! - `callback`: validate a gateway callback
//! - `version`:  print build version information

mod cli;
mod http;
mod logging;

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;

use paygate::callback::{acknowledgement, CallbackRequest, DeliveryMethod, ResponseValidator};
use paygate::transaction::types::{
    Amount, CardData, OriginalTransaction, PaymentSource, ReturnUrls, SubscriberToken,
};
use paygate::transaction::{
    Channel, OperationType, RenderedPayment, RequestDraft, TransactionRequest,
};
use paygate::{Environment, MerchantCredentials, SecretKey, TransactionRequestBuilder};

use cli::{Commands, MerchantArgs, PaygateCli, RequestArgs};
use http::HttpTransport;

fn main() -> Result<()> {
    let cli = PaygateCli::parse();
    logging::init_logging("paygate=info,paygate_cli=info", cli.log_format.into());

    match cli.command {
        Commands::Form(args) => render(&cli.merchant, args, Channel::Form),
        Commands::Url(args) => render(&cli.merchant, args, Channel::Url),
        Commands::Direct(args) => direct(&cli.merchant, args),
        Commands::Callback(args) => callback(&cli.merchant, args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Builds credentials from flags/environment. Fails before anything else
/// runs if the secret is missing or malformed.
fn load_credentials(args: &MerchantArgs) -> Result<MerchantCredentials> {
    let site = match &args.site {
        Some(site) => site.clone(),
        None => bail!("no site configured (use --site or PAYGATE_SITE)"),
    };
    let secret = match &args.secret_key {
        Some(secret) => SecretKey::new(secret.clone()),
        None => bail!("no secret key configured (set PAYGATE_SECRET_KEY)"),
    };

    let credentials = MerchantCredentials::new(
        args.variant.into(),
        site,
        args.company.clone(),
        args.rank.clone(),
        secret,
        Environment::from_test_flag(args.test_mode),
    )
    .context("invalid merchant credentials")?;

    tracing::debug!(
        variant = %credentials.variant(),
        site = credentials.site_id(),
        sandbox = credentials.environment().is_sandbox(),
        "credentials loaded"
    );
    Ok(credentials)
}

/// Applies the shared request flags to a draft.
fn draft_from(args: RequestArgs) -> RequestDraft {
    let mut draft = TransactionRequest::draft(args.operation.into()).return_urls(ReturnUrls {
        ok: args.ok_url,
        refused: args.refused_url,
        cancelled: args.cancelled_url,
        ..ReturnUrls::default()
    });

    if let Some(amount) = args.amount {
        draft = draft.amount(Amount::new(amount, args.currency));
    }
    if let Some(reference) = args.reference {
        draft = draft.reference(reference);
    }
    if let Some(email) = args.email {
        draft = draft.customer_email(email);
    }
    if let Some(language) = args.language {
        draft = draft.language(language);
    }
    if let Some(text) = args.free_text {
        draft = draft.free_text(text);
    }
    if let Some(url) = args.callback_url {
        draft = draft.callback_url(url);
    }
    if let Some(id) = args.subscriber_id {
        draft = draft.subscriber_id(id);
    }
    draft
}

fn render(merchant: &MerchantArgs, args: RequestArgs, channel: Channel) -> Result<()> {
    let credentials = load_credentials(merchant)?;
    let request = draft_from(args).finish().context("invalid transaction")?;

    let rendered = TransactionRequestBuilder::new()
        .build(&credentials, &request, channel)
        .context("failed to build payment request")?;

    match rendered {
        RenderedPayment::Form(form) => println!("{}", form.html),
        RenderedPayment::Url(url) => println!("{}", url.url),
        RenderedPayment::Direct(_) => bail!("unexpected direct result for {} channel", channel),
    }
    Ok(())
}

fn direct(merchant: &MerchantArgs, args: cli::DirectArgs) -> Result<()> {
    let credentials = load_credentials(merchant)?;
    let transport = HttpTransport::new(Duration::from_secs(args.timeout_secs))?;

    // With a subscriber reference the card number is the stored token,
    // except when the card is being registered or replaced.
    let operation: OperationType = args.request.operation.into();
    let stored_subscriber = args.request.subscriber_id.is_some()
        && !matches!(
            operation,
            OperationType::RegisterSubscriber | OperationType::UpdateSubscriber
        );
    let mut draft = draft_from(args.request);

    if let Some(number) = args.card_number {
        let expiry = args.card_expiry.unwrap_or_default();
        let source = if stored_subscriber {
            PaymentSource::Subscriber(SubscriberToken::new(number, expiry))
        } else {
            PaymentSource::Card(CardData::new(number, expiry, args.cvv))
        };
        draft = draft.payment_source(source);
    }
    if args.call_number.is_some() || args.transaction_number.is_some() || args.order_date.is_some() {
        draft = draft.original_transaction(OriginalTransaction {
            call_number: args.call_number,
            transaction_number: args.transaction_number,
            order_date: args.order_date,
        });
    }

    let request = draft.finish().context("invalid transaction")?;
    let rendered = TransactionRequestBuilder::new()
        .with_transport(transport)
        .build(&credentials, &request, Channel::DirectHttp)
        .context("direct request failed")?;

    match rendered {
        RenderedPayment::Direct(payment) => {
            let json = serde_json::to_string_pretty(&payment.response)
                .context("failed to serialize reply")?;
            println!("{}", json);
        }
        _ => bail!("unexpected rendered result for direct channel"),
    }
    Ok(())
}

fn callback(merchant: &MerchantArgs, args: cli::CallbackArgs) -> Result<()> {
    let credentials = load_credentials(merchant)?;

    let data = args.data.trim_start_matches('?');
    let method = DeliveryMethod::parse(&args.method);
    let callback = match &method {
        DeliveryMethod::Get => CallbackRequest::from_query(data),
        DeliveryMethod::Post => CallbackRequest::from_form_body(data),
        DeliveryMethod::Other(_) => {
            CallbackRequest::new(method.clone(), CallbackRequest::from_query(data).fields().to_vec())
        }
    };

    let response = ResponseValidator::validate(&callback, &credentials)
        .context("callback could not be validated")?;

    let json = serde_json::json!({
        "response": response,
        "acknowledgement": acknowledgement(credentials.variant(), response.is_signature_valid()),
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&json).context("failed to serialize verdict")?
    );
    Ok(())
}

fn print_version() {
    println!("paygate {}", env!("CARGO_PKG_VERSION"));
    println!(
        "legacy protocol {}, modern direct protocol {}",
        paygate::config::LEGACY_PROTOCOL_VERSION,
        paygate::config::MODERN_DIRECT_VERSION,
    );
}
