//! HTML renditions of the lifecycle documents: subscription agreement,
//! capital-call notice and payment receipt.
//!
//! Documents are self-contained HTML; the client's hand-drawn signature is
//! embedded as its original data URL.

use chrono::{DateTime, FixedOffset, NaiveDate};

use models::{capital_call, product, subscription};

use crate::errors::ServiceError;

const SIGNATURE_PREFIXES: [&str; 2] = ["data:image/png;base64,", "data:image/jpeg;base64,"];
pub const MAX_SIGNATURE_BYTES: usize = 1024 * 1024;

/// Accept only base64 PNG/JPEG data URLs of bounded size.
pub fn validate_signature(data_url: &str) -> Result<(), ServiceError> {
    let data_url = data_url.trim();
    if data_url.len() > MAX_SIGNATURE_BYTES {
        return Err(ServiceError::Validation("signature image too large".into()));
    }
    let payload = SIGNATURE_PREFIXES
        .iter()
        .find_map(|p| data_url.strip_prefix(p))
        .ok_or_else(|| ServiceError::Validation("signature must be a PNG or JPEG data URL".into()))?;
    if payload.is_empty()
        || !payload
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
    {
        return Err(ServiceError::Validation("signature payload is not base64".into()));
    }
    Ok(())
}

/// `USD 1,250,000.00`
pub fn format_money(cents: i64, currency: &str) -> String {
    let negative = cents < 0;
    let abs = cents.unsigned_abs();
    let units = (abs / 100).to_string();
    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, ch) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{currency} {}{grouped}.{:02}", if negative { "-" } else { "" }, abs % 100)
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{t}</title>\
<style>body{{font-family:Helvetica,Arial,sans-serif;margin:40px}}table{{border-collapse:collapse}}\
td{{padding:4px 12px;border-bottom:1px solid #ddd}}.sig{{max-height:120px}}</style></head>\
<body><h1>{t}</h1>\n{body}\n</body></html>\n",
        t = escape_html(title),
    )
}

fn rows(pairs: &[(&str, String)]) -> String {
    let mut out = String::from("<table>\n");
    for (k, v) in pairs {
        out.push_str(&format!("<tr><td>{}</td><td>{}</td></tr>\n", escape_html(k), escape_html(v)));
    }
    out.push_str("</table>");
    out
}

pub struct Party<'a> {
    pub name: &'a str,
    pub email: &'a str,
}

pub fn subscription_agreement(
    product: &product::Model,
    sub: &subscription::Model,
    client: &Party<'_>,
    signature_data_url: &str,
    signed_at: DateTime<FixedOffset>,
) -> String {
    let fees = &product.fee_schedule;
    let details = rows(&[
        ("Product", format!("{} ({})", product.name, product.code)),
        ("Subscriber", format!("{} <{}>", client.name, client.email)),
        ("Subscription amount", format_money(sub.amount_cents, &sub.currency)),
        ("Management fee", format!("{} bps", fees.management_fee_bps)),
        ("Performance fee", format!("{} bps", fees.performance_fee_bps)),
        ("Entry fee", format!("{} bps", fees.entry_fee_bps)),
        ("Hurdle rate", format!("{} bps", fees.hurdle_rate_bps)),
        ("Subscription reference", sub.id.to_string()),
    ]);
    let body = format!(
        "{details}\n<h2>Terms</h2>\n<pre>{terms}</pre>\n<h2>Signature</h2>\n\
<img class=\"sig\" alt=\"signature\" src=\"{sig}\">\n<p>Signed by {name} on {date}</p>",
        terms = escape_html(&sub.terms),
        sig = escape_html(signature_data_url.trim()),
        name = escape_html(client.name),
        date = signed_at.format("%Y-%m-%d %H:%M UTC%:z"),
    );
    page("Subscription Agreement", &body)
}

pub fn capital_call_notice(
    product: &product::Model,
    call: &capital_call::Model,
    client: &Party<'_>,
) -> String {
    let bank = &call.bank_details;
    let mut pairs = vec![
        ("Product", format!("{} ({})", product.name, product.code)),
        ("Investor", format!("{} <{}>", client.name, client.email)),
        ("Amount due", format_money(call.amount_cents, &call.currency)),
        ("Due date", call.due_date.format("%Y-%m-%d").to_string()),
        ("Bank", bank.bank_name.clone()),
        ("Account name", bank.account_name.clone()),
        ("Account number", bank.account_number.clone()),
    ];
    if let Some(iban) = &bank.iban {
        pairs.push(("IBAN", iban.clone()));
    }
    if let Some(swift) = &bank.swift {
        pairs.push(("SWIFT/BIC", swift.clone()));
    }
    pairs.push(("Payment reference", bank.reference.clone()));
    let body = format!(
        "<p>Dear {}, in accordance with your subscription, please transfer the amount below.</p>\n{}",
        escape_html(client.name),
        rows(&pairs)
    );
    page("Capital Call Notice", &body)
}

pub fn payment_receipt(
    product: &product::Model,
    call: &capital_call::Model,
    client: &Party<'_>,
    received_on: NaiveDate,
    receipt_id: uuid::Uuid,
) -> String {
    let body = rows(&[
        ("Receipt number", receipt_id.to_string()),
        ("Product", format!("{} ({})", product.name, product.code)),
        ("Investor", format!("{} <{}>", client.name, client.email)),
        ("Amount received", format_money(call.amount_cents, &call.currency)),
        ("Received on", received_on.format("%Y-%m-%d").to_string()),
        ("Capital call", call.id.to_string()),
        ("Payment reference", call.bank_details.reference.clone()),
    ]);
    page("Payment Receipt", &body)
}
