use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A price as it arrives from idea payloads.
///
/// Idea generators emit prices as bare numbers, as text (`"$105.20"`,
/// `"100 - 105"`) or wrapped in `{ "type": ..., "value": ... }` objects.
/// The shape is resolved once here so the rest of the crate only sees
/// one of three cases.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceField {
    Number(Decimal),
    Range(Decimal, Decimal),
    Raw(String),
}

impl PriceField {
    /// Single representative price: the number itself, or the midpoint of a
    /// range. `None` for unreadable text or a midpoint that overflows.
    pub fn point(&self) -> Option<Decimal> {
        match self {
            PriceField::Number(n) => Some(*n),
            PriceField::Range(lo, hi) => lo.checked_add(*hi)?.checked_div(Decimal::TWO),
            PriceField::Raw(_) => None,
        }
    }

    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Number(n) => Some(
                decimal_from_str(&n.to_string())
                    .map(PriceField::Number)
                    .unwrap_or_else(|| PriceField::Raw(n.to_string())),
            ),
            Value::String(s) => Some(Self::from_text(s)),
            Value::Array(items) => Some(range_from_items(items).unwrap_or_else(|| {
                PriceField::Raw(value.to_string())
            })),
            Value::Object(map) => {
                let inner = map
                    .get("value")
                    .or_else(|| map.get("price"))
                    .unwrap_or(&Value::Null);
                if let Value::Object(bounds) = inner {
                    let lo = bounds.get("low").or_else(|| bounds.get("min"));
                    let hi = bounds.get("high").or_else(|| bounds.get("max"));
                    if let (Some(lo), Some(hi)) = (lo, hi) {
                        return range_from_items(&[lo.clone(), hi.clone()])
                            .or_else(|| Some(PriceField::Raw(value.to_string())));
                    }
                }
                Self::from_json(inner)
            }
            Value::Bool(_) => Some(PriceField::Raw(value.to_string())),
        }
    }

    /// Parses free text such as `"$1,234.50"` or `"100-105"`.
    pub fn from_text(raw: &str) -> Self {
        let cleaned: String = raw
            .chars()
            .filter(|c| !matches!(c, '$' | ',' | ' ' | '\t'))
            .collect();

        if let Some(n) = decimal_from_str(&cleaned) {
            return PriceField::Number(n);
        }

        // A separator dash, not a leading sign.
        if let Some(pos) = cleaned.char_indices().skip(1).find(|(_, c)| *c == '-').map(|(i, _)| i) {
            let (lo, hi) = cleaned.split_at(pos);
            if let (Some(lo), Some(hi)) = (decimal_from_str(lo), decimal_from_str(&hi[1..])) {
                return ordered_range(lo, hi);
            }
        }

        PriceField::Raw(raw.to_string())
    }
}

impl<'de> Deserialize<'de> for PriceField {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_json(&value).unwrap_or_else(|| PriceField::Raw(String::new())))
    }
}

fn decimal_from_str(s: &str) -> Option<Decimal> {
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

fn range_from_items(items: &[Value]) -> Option<PriceField> {
    if items.len() != 2 {
        return None;
    }
    let lo = PriceField::from_json(&items[0])?.point()?;
    let hi = PriceField::from_json(&items[1])?.point()?;
    Some(ordered_range(lo, hi))
}

fn ordered_range(a: Decimal, b: Decimal) -> PriceField {
    if a <= b {
        PriceField::Range(a, b)
    } else {
        PriceField::Range(b, a)
    }
}
