//! Serde serialization helpers for ensuring consistent JSON output

use num_rational::Rational64;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// Largest denominator accepted when a decimal time value is turned into a rational.
pub const MAX_DENOMINATOR: i64 = 1_000_000;

/// Serialize Option<T> as null when None (don't skip the field)
pub fn serialize_option_as_null<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    match value {
        Some(v) => serializer.serialize_some(v),
        None => serializer.serialize_none(),
    }
}

/// Convert a float to the closest rational whose denominator stays within
/// [`MAX_DENOMINATOR`], walking the continued fraction expansion.
///
/// Returns `None` for NaN, infinities and values too large for `i64`.
///
/// ```
/// use num_rational::Rational64;
/// use sheetgen_wasm::models::serde_helpers::rational_from_f64;
///
/// assert_eq!(rational_from_f64(1.3), Some(Rational64::new(13, 10)));
/// assert_eq!(rational_from_f64(0.25), Some(Rational64::new(1, 4)));
/// ```
pub fn rational_from_f64(value: f64) -> Option<Rational64> {
    if !value.is_finite() || value.abs() > (i64::MAX / 2) as f64 {
        return None;
    }

    let negative = value < 0.0;
    let mut x = value.abs();
    // (p0/q0, p1/q1) are the last two convergents
    let (mut p0, mut q0, mut p1, mut q1) = (0i64, 1i64, 1i64, 0i64);

    loop {
        let whole = x.floor();
        let a = whole as i64;
        let q2 = match a.checked_mul(q1).and_then(|v| v.checked_add(q0)) {
            Some(q) if q <= MAX_DENOMINATOR => q,
            _ => break,
        };
        let p2 = a.checked_mul(p1).and_then(|v| v.checked_add(p0))?;
        p0 = p1;
        q0 = q1;
        p1 = p2;
        q1 = q2;

        let frac = x - whole;
        if frac < 1e-9 {
            break;
        }
        x = 1.0 / frac;
    }

    if q1 == 0 {
        return None;
    }
    Some(Rational64::new(if negative { -p1 } else { p1 }, q1))
}

/// Parse "n/d", "n" or a decimal string into a rational
pub fn parse_rational(text: &str) -> Option<Rational64> {
    let text = text.trim();
    if let Some((numer, denom)) = text.split_once('/') {
        let numer: i64 = numer.trim().parse().ok()?;
        let denom: i64 = denom.trim().parse().ok()?;
        if denom == 0 {
            return None;
        }
        return Some(Rational64::new(numer, denom));
    }
    if let Ok(whole) = text.parse::<i64>() {
        return Some(Rational64::from_integer(whole));
    }
    text.parse::<f64>().ok().and_then(rational_from_f64)
}

/// Quarter-length values travel as `"n/d"` strings so that no precision is
/// lost across the JS boundary. Numbers are accepted on input.
pub mod quarter_length {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S>(value: &Rational64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Rational64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Wire::deserialize(deserializer)? {
            Wire::Number(n) => rational_from_f64(n)
                .ok_or_else(|| de::Error::custom(format!("not a representable time value: {}", n))),
            Wire::Text(s) => parse_rational(&s)
                .ok_or_else(|| de::Error::custom(format!("not a rational time value: '{}'", s))),
        }
    }
}

/// Same as [`quarter_length`] for optional fields
pub mod option_quarter_length {
    use super::*;

    pub fn serialize<S>(value: &Option<Rational64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_some(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Rational64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Wrapped(#[serde(with = "super::quarter_length")] Rational64);

        Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(v)| v))
    }
}
