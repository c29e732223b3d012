use serde::{Deserialize, Deserializer, de::Error};

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(f64),
}

/// Deserializes a price sent either as a JSON number or as a string holding
/// a JSON number literal, e.g. `"96.5"`. The result is always finite.
pub fn deserialize_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let price = match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::Number(n) => n,
        StringOrNumber::String(s) => parse_number_literal(&s)
            .ok_or_else(|| D::Error::custom(format!("invalid price {s:?}")))?,
    };

    if !price.is_finite() {
        return Err(D::Error::custom(format!("price out of range: {price}")));
    }
    Ok(price)
}

// Rejects NaN, inf and padded text, which a JSON number cannot spell.
fn parse_number_literal(s: &str) -> Option<f64> {
    if s.is_empty() || s.trim() != s {
        return None;
    }
    serde_json::from_str::<f64>(s).ok()
}

/// Rounds to two decimals, halves away from zero.
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
