//! # CLI Interface
//!
//! Defines the command-line argument structure for `paygate` using `clap`
//! derive. Merchant credentials are global and fall back to `PAYGATE_*`
//! environment variables, so a shell session can be configured once and
//! then used for any number of `form`, `url`, `direct` or `callback` runs.

use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;

use paygate::transaction::OperationType;
use paygate::GatewayVariant;

/// Signed payment requests and callback checks for bank card gateways.
///
/// Builds the hosted payment form or redirect URL for a transaction, runs
/// server-to-server operations, and validates the signature of a gateway
/// callback. Nothing is stored; every run is independent.
#[derive(Parser, Debug)]
#[command(
    name = "paygate",
    about = "Signed payment gateway requests and callback validation",
    version,
    propagate_version = true
)]
pub struct PaygateCli {
    #[command(flatten)]
    pub merchant: MerchantArgs,

    /// Log output format.
    #[arg(long, global = true, value_enum, env = "PAYGATE_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormatArg,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the `paygate` binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a self-submitting HTML payment form.
    Form(RequestArgs),
    /// Print a signed redirect URL to the hosted payment page.
    Url(RequestArgs),
    /// Send a server-to-server request and print the parsed reply as JSON.
    Direct(DirectArgs),
    /// Validate a callback and print the verdict and acknowledgement body.
    Callback(CallbackArgs),
    /// Print version information and exit.
    Version,
}

/// Merchant credentials. Shared by every subcommand.
#[derive(Args, Debug)]
pub struct MerchantArgs {
    /// Gateway family the merchant is enrolled with.
    #[arg(long, global = true, value_enum, env = "PAYGATE_VARIANT", default_value = "modern")]
    pub variant: VariantArg,

    /// Terminal number (legacy `TPE`) or site number (modern `PBX_SITE`).
    #[arg(long, global = true, env = "PAYGATE_SITE")]
    pub site: Option<String>,

    /// Company code (legacy `societe`) or merchant identifier (modern
    /// `PBX_IDENTIFIANT`).
    #[arg(long, global = true, env = "PAYGATE_COMPANY", default_value = "")]
    pub company: String,

    /// Rank number. Required on the modern gateway.
    #[arg(long, global = true, env = "PAYGATE_RANK")]
    pub rank: Option<String>,

    /// Hex secret issued by the bank.
    ///
    /// Prefer the environment variable; command lines end up in shell
    /// history.
    #[arg(long, global = true, env = "PAYGATE_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Use the sandbox endpoints.
    #[arg(long, global = true, env = "PAYGATE_TEST_MODE")]
    pub test_mode: bool,
}

/// Transaction fields for `form`, `url` and `direct`.
#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Logical operation.
    #[arg(long, short = 'o', value_enum, default_value = "authorize-and-debit")]
    pub operation: OperationArg,

    /// Amount in major units, e.g. `12.50`.
    #[arg(long, short = 'a')]
    pub amount: Option<Decimal>,

    /// ISO-4217 alphabetic currency code.
    #[arg(long, default_value = "EUR")]
    pub currency: String,

    /// Merchant order reference.
    #[arg(long, short = 'r')]
    pub reference: Option<String>,

    /// Customer e-mail address.
    #[arg(long)]
    pub email: Option<String>,

    /// Payment page language, two letters.
    #[arg(long)]
    pub language: Option<String>,

    /// Free text echoed back by the legacy gateway.
    #[arg(long)]
    pub free_text: Option<String>,

    /// Where the customer lands after an accepted payment.
    #[arg(long)]
    pub ok_url: Option<String>,

    /// Where the customer lands after a refused payment.
    #[arg(long)]
    pub refused_url: Option<String>,

    /// Where the customer lands after cancelling.
    #[arg(long)]
    pub cancelled_url: Option<String>,

    /// Server-to-server notification URL.
    #[arg(long)]
    pub callback_url: Option<String>,

    /// Merchant-side subscriber reference.
    #[arg(long)]
    pub subscriber_id: Option<String>,
}

/// Extra fields for server-to-server operations.
#[derive(Args, Debug)]
pub struct DirectArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Card number, or the stored card token with `--subscriber-id`.
    #[arg(long)]
    pub card_number: Option<String>,

    /// Card expiry, MMYY.
    #[arg(long)]
    pub card_expiry: Option<String>,

    /// Card verification value.
    #[arg(long)]
    pub cvv: Option<String>,

    /// Call number of the earlier transaction (Debit, Cancel).
    #[arg(long)]
    pub call_number: Option<String>,

    /// Transaction number of the earlier transaction (Debit, Cancel).
    #[arg(long)]
    pub transaction_number: Option<String>,

    /// Order date of the earlier transaction, `YYYY-MM-DD` (legacy capture).
    #[arg(long)]
    pub order_date: Option<chrono::NaiveDate>,

    /// HTTP timeout in seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

/// Arguments for the `callback` subcommand.
#[derive(Args, Debug)]
pub struct CallbackArgs {
    /// HTTP method the callback arrived with.
    #[arg(long, default_value = "GET")]
    pub method: String,

    /// Query string (GET) or URL-encoded body (POST).
    pub data: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VariantArg {
    Legacy,
    Modern,
}

impl From<VariantArg> for GatewayVariant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Legacy => GatewayVariant::Legacy,
            VariantArg::Modern => GatewayVariant::Modern,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OperationArg {
    AuthorizeOnly,
    Debit,
    AuthorizeAndDebit,
    Credit,
    Cancel,
    RegisterSubscriber,
    UpdateSubscriber,
    DeleteSubscriber,
}

impl From<OperationArg> for OperationType {
    fn from(arg: OperationArg) -> Self {
        match arg {
            OperationArg::AuthorizeOnly => OperationType::AuthorizeOnly,
            OperationArg::Debit => OperationType::Debit,
            OperationArg::AuthorizeAndDebit => OperationType::AuthorizeAndDebit,
            OperationArg::Credit => OperationType::Credit,
            OperationArg::Cancel => OperationType::Cancel,
            OperationArg::RegisterSubscriber => OperationType::RegisterSubscriber,
            OperationArg::UpdateSubscriber => OperationType::UpdateSubscriber,
            OperationArg::DeleteSubscriber => OperationType::DeleteSubscriber,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        PaygateCli::command().debug_assert();
    }

    #[test]
    fn parses_form_invocation() {
        let cli = PaygateCli::try_parse_from([
            "paygate",
            "--variant",
            "legacy",
            "--site",
            "1234567",
            "form",
            "--amount",
            "12.50",
            "--reference",
            "ORDER-042",
        ])
        .unwrap();

        assert_eq!(cli.merchant.variant, VariantArg::Legacy);
        match cli.command {
            Commands::Form(args) => {
                assert_eq!(args.operation, OperationArg::AuthorizeAndDebit);
                assert_eq!(args.amount, Some(Decimal::new(1250, 2)));
                assert_eq!(args.currency, "EUR");
            }
            other => panic!("expected Form, got {:?}", other),
        }
    }

    #[test]
    fn operation_names_are_kebab_case() {
        let cli = PaygateCli::try_parse_from([
            "paygate",
            "direct",
            "--operation",
            "delete-subscriber",
            "--subscriber-id",
            "CUST-1",
        ])
        .unwrap();
        match cli.command {
            Commands::Direct(args) => {
                assert_eq!(
                    OperationType::from(args.request.operation),
                    OperationType::DeleteSubscriber
                );
            }
            other => panic!("expected Direct, got {:?}", other),
        }
    }
}
