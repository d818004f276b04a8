//! Locale-aware normalization of Turkish price and installment text.
//!
//! Prices follow the `tr-TR` convention: `.` groups thousands and `,` marks
//! decimals, so `"2.499,00 TL"` is `2499.00`. Nothing here fails; unparsable
//! input is logged and collapses to zero.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use tracing::warn;

use crate::models::Installment;

static INSTALLMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:taksit\s*)?x\s*([\d.,]+)\s*(?:TL|₺)").expect("valid regex")
});

const CURRENCY_MARKERS: [&str; 3] = ["TL", "TRY", "₺"];

/// Converts locale-formatted price text into a non-negative decimal.
///
/// Empty, missing, unparsable and negative input all yield `0`.
pub fn normalize_price<'a>(text: impl Into<Option<&'a str>>) -> Decimal {
    let Some(text) = text.into() else {
        return Decimal::ZERO;
    };

    let mut cleaned = text.to_string();
    for marker in CURRENCY_MARKERS {
        cleaned = cleaned.replace(marker, "");
    }
    let cleaned: String = cleaned
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    if cleaned.is_empty() {
        return Decimal::ZERO;
    }

    match Decimal::from_str(&cleaned) {
        Ok(price) if price.is_sign_negative() => {
            warn!("Negative price text {:?}, using 0", text);
            Decimal::ZERO
        }
        Ok(price) => price,
        Err(e) => {
            warn!("Could not parse price {:?}: {}", text, e);
            Decimal::ZERO
        }
    }
}

/// Reads a price from a structured payload value, which may be a locale
/// string or a plain JSON number.
pub fn price_from_json(value: &serde_json::Value) -> Decimal {
    match value {
        serde_json::Value::String(text) => normalize_price(text.as_str()),
        serde_json::Value::Number(number) => Decimal::from_str(&number.to_string())
            .ok()
            .filter(|price| !price.is_sign_negative())
            .unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    }
}

/// Extracts an installment offer such as `"12 x 208,25 TL"` or
/// `"12 Taksit x 499,92 TL"`. Returns [`Installment::NONE`] when nothing matches.
pub fn extract_installment(text: &str) -> Installment {
    let Some(caps) = INSTALLMENT_RE.captures(text) else {
        return Installment::NONE;
    };

    match caps[1].parse::<u32>() {
        Ok(count) => Installment {
            count,
            amount: normalize_price(&caps[2]),
        },
        Err(e) => {
            warn!("Could not parse installment count in {:?}: {}", text, e);
            Installment::NONE
        }
    }
}
