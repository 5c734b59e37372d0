//! Browser-facing renderings of a signed payload: an auto-submitting HTML
//! form, or a redirect URL.

use url::Url;

use super::fields::SignedPayload;
use crate::error::GatewayError;

/// An HTML form that posts itself to the gateway on page load.
#[derive(Debug, Clone)]
pub struct PaymentForm {
    pub action: String,
    pub html: String,
    pub payload: SignedPayload,
}

/// A redirect URL carrying every field in its query string.
#[derive(Debug, Clone)]
pub struct PaymentUrl {
    pub url: String,
    pub payload: SignedPayload,
}

/// Entity-encodes free text the way the legacy gateway decodes it.
///
/// `[A-Za-z0-9._-]` passes through. Every other ASCII byte becomes
/// `&#xhh;`. Bytes above `0x7F` pass through untouched, so multi-byte
/// UTF-8 sequences arrive intact.
pub fn encode_free_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
            out.push(ch);
        } else if ch.is_ascii() {
            out.push_str(&format!("&#x{:02x};", ch as u32));
        } else {
            out.push(ch);
        }
    }
    out
}

/// Minimal HTML attribute escaping.
pub fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Renders `payload` as a self-submitting form targeting `action`.
/// The value of `free_text_field`, if any, is entity-encoded instead of
/// attribute-escaped.
pub fn form(action: &str, payload: SignedPayload, free_text_field: Option<&str>) -> PaymentForm {
    let mut html = String::new();
    html.push_str(&format!(
        "<form id=\"paygate-form\" method=\"post\" action=\"{}\">\n",
        escape_attribute(action)
    ));
    for (name, value) in payload.posted_fields() {
        let value = if Some(name.as_str()) == free_text_field {
            encode_free_text(&value)
        } else {
            escape_attribute(&value)
        };
        html.push_str(&format!(
            "  <input type=\"hidden\" name=\"{}\" value=\"{}\"/>\n",
            escape_attribute(&name),
            value
        ));
    }
    html.push_str("  <noscript><input type=\"submit\" value=\"Pay\"/></noscript>\n");
    html.push_str("</form>\n");
    html.push_str(
        "<script>document.getElementById('paygate-form').submit();</script>\n",
    );

    PaymentForm {
        action: action.to_string(),
        html,
        payload,
    }
}

/// Renders `payload` as a GET URL on `action`.
pub fn url(action: &str, payload: SignedPayload) -> Result<PaymentUrl, GatewayError> {
    let url = Url::parse_with_params(action, payload.posted_fields())
        .map_err(|e| GatewayError::Configuration(format!("invalid endpoint '{}': {}", action, e)))?;
    Ok(PaymentUrl {
        url: url.into(),
        payload,
    })
}
