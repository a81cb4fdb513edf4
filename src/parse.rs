//! Conversion of the upstream offer feed into [`OfferRecord`]s.
//!
//! Every decimal in the feed arrives as text, and the feed is not clean: missing values show up
//! as absent keys, empty strings or the literal `"null"`. Numbers are therefore parsed
//! defensively and anything unusable reads as zero.

use std::str::FromStr;

use anyhow::Context;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{LoanType, OfferRecord, Period};

/// Longest leading decimal literal of `text` (sign, digits, fraction, exponent), normalized so
/// that `Decimal` accepts it. Trailing garbage is ignored: `"12abc"` reads as `12`.
fn numeric_prefix(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let digits_from = |mut at: usize| {
        while at < bytes.len() && bytes[at].is_ascii_digit() {
            at += 1;
        }
        at
    };

    let mut pos = 0;
    let negative = match bytes.first().copied() {
        Some(b'-') => {
            pos = 1;
            true
        }
        Some(b'+') => {
            pos = 1;
            false
        }
        _ => false,
    };

    let int_end = digits_from(pos);
    let integer = &text[pos..int_end];
    pos = int_end;

    let mut fraction = "";
    if bytes.get(pos).copied() == Some(b'.') {
        let frac_end = digits_from(pos + 1);
        fraction = &text[pos + 1..frac_end];
        pos = frac_end;
    }

    if integer.is_empty() && fraction.is_empty() {
        return None;
    }

    let mut literal = String::new();
    if negative {
        literal.push('-');
    }
    literal.push_str(if integer.is_empty() { "0" } else { integer });
    if !fraction.is_empty() {
        literal.push('.');
        literal.push_str(fraction);
    }

    // exponent only counts when digits follow it
    if matches!(bytes.get(pos).copied(), Some(b'e' | b'E')) {
        let mut exp_start = pos + 1;
        let exp_negative = bytes.get(exp_start).copied() == Some(b'-');
        if matches!(bytes.get(exp_start).copied(), Some(b'-' | b'+')) {
            exp_start += 1;
        }
        let exp_end = digits_from(exp_start);
        if exp_end > exp_start {
            literal.push('e');
            if exp_negative {
                literal.push('-');
            }
            literal.push_str(&text[exp_start..exp_end]);
        }
    }

    Some(literal)
}

/// Parses a text-encoded number, returning `None` for sentinels and text without a leading
/// number.
fn parse_decimal_strict(value: Option<&str>) -> Option<Decimal> {
    let text = value?.trim();
    if text.eq_ignore_ascii_case("null") || text == "undefined" {
        return None;
    }
    let literal = numeric_prefix(text)?;
    if literal.contains('e') {
        Decimal::from_scientific(&literal).ok()
    } else {
        Decimal::from_str(&literal).ok()
    }
}

/// Parses a text-encoded number; missing, sentinel or malformed input yields zero.
///
/// Like a lenient float parse, the longest leading number wins and anything after it is
/// ignored, so `"12abc"` is `12` while `"abc12"` is `0`. Values outside the decimal range also
/// read as zero.
pub fn safe_parse_decimal(value: Option<&str>) -> Decimal {
    parse_decimal_strict(value).unwrap_or(Decimal::ZERO)
}

/// One offer exactly as the feed delivers it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawOffer {
    #[serde(default)]
    pub offer_id: Option<String>,
    #[serde(default)]
    pub bank_name: String,
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub month: u32,
    #[serde(default)]
    pub monthly_interest_rate: Option<String>,
    #[serde(default)]
    pub financed_amount: Option<String>,
    #[serde(default)]
    pub asset_value: Option<String>,
    #[serde(default)]
    pub total_value_with_interest: Option<String>,
    #[serde(default)]
    pub installments_count: Option<u32>,
    #[serde(rename = "type", default)]
    pub loan_type: Option<String>,
    #[serde(default)]
    pub offered: bool,
    #[serde(default)]
    pub offered_interest_rate: Option<String>,
    #[serde(default)]
    pub savings_amount: Option<String>,
}

impl RawOffer {
    /// Whether the outstanding balance is present and numeric.
    pub fn has_usable_balance(&self) -> bool {
        parse_decimal_strict(self.financed_amount.as_deref()).is_some()
    }

    pub fn into_record(self) -> OfferRecord {
        let competitor_rate = if self.offered {
            parse_decimal_strict(self.offered_interest_rate.as_deref())
        } else {
            None
        };

        OfferRecord {
            offer_id: self.offer_id,
            bank_name: self.bank_name,
            period: Period::new(self.year, self.month),
            periodic_rate: safe_parse_decimal(self.monthly_interest_rate.as_deref()),
            principal_original: safe_parse_decimal(self.asset_value.as_deref()),
            outstanding_balance: safe_parse_decimal(self.financed_amount.as_deref()),
            total_value_with_interest: safe_parse_decimal(
                self.total_value_with_interest.as_deref(),
            ),
            term_periods: self.installments_count.unwrap_or_default(),
            loan_type: self
                .loan_type
                .as_deref()
                .map(LoanType::parse)
                .unwrap_or_default(),
            competitively_covered: self.offered,
            competitor_rate,
            savings_amount: safe_parse_decimal(self.savings_amount.as_deref()),
        }
    }
}

/// Response body of the offers endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OffersEnvelope {
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub offers: Vec<RawOffer>,
    pub status: String,
}

/// Drops offers without a usable balance and converts the rest, keeping feed order.
pub fn usable_records(raw: Vec<RawOffer>) -> Vec<OfferRecord> {
    let received = raw.len();
    let records: Vec<OfferRecord> = raw
        .into_iter()
        .filter(RawOffer::has_usable_balance)
        .map(RawOffer::into_record)
        .collect();

    if records.len() < received {
        debug!(
            received,
            kept = records.len(),
            "dropped offers without a usable outstanding balance"
        );
    }
    records
}

/// Decodes an offers response body into engine-ready records.
///
/// # Errors
///
/// Fails when the body is not valid JSON for the envelope or when the API reports a status
/// other than `success`.
pub fn parse_offers_payload(payload: &str) -> anyhow::Result<Vec<OfferRecord>> {
    let envelope: OffersEnvelope =
        serde_json::from_str(payload).context("offers payload is not a valid response body")?;

    if envelope.status != "success" {
        anyhow::bail!("offers API returned status {:?}", envelope.status);
    }

    Ok(usable_records(envelope.offers))
}
