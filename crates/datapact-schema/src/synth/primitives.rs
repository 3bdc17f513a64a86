use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use rand::{Rng, RngCore};
use serde_json::{Map, Number, Value};

use crate::errors::SchemaError;
use crate::faker_rs::{FakeCategory, FakeProvider, LocaleKey};
use crate::model::{
    DEFAULT_DECIMAL_PLACES, EnumSpec, IntSpec, NumberSpec, StringSpec, TimestampSpec,
};

const DEFAULT_CHARSET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const DEFAULT_NUMBER_MAX: f64 = 9999.0;
const MAX_DIGITS: u32 = 15;

/// Resolved draw interval for `float` and `decimal` fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct NumberBounds {
    pub lower: f64,
    pub upper: f64,
    pub places: Option<u32>,
}

pub(crate) fn int_bounds(spec: &IntSpec, ctx: &str) -> Result<(i64, i64), SchemaError> {
    let min = if spec.positive_only {
        spec.min_val.max(1)
    } else {
        spec.min_val
    };
    if min > spec.max_val {
        return Err(SchemaError::declaration(ctx, "minVal must be <= maxVal"));
    }
    Ok((min, spec.max_val))
}

pub(crate) fn number_bounds(
    spec: &NumberSpec,
    decimal: bool,
    ctx: &str,
) -> Result<NumberBounds, SchemaError> {
    let places = match spec.fractional_digits {
        Some(places) => Some(places),
        None if decimal => Some(DEFAULT_DECIMAL_PLACES),
        None => None,
    };
    for (name, digits) in [
        ("integerDigits", spec.integer_digits),
        ("fractionalDigits", places),
    ] {
        if digits.is_some_and(|digits| digits > MAX_DIGITS) {
            return Err(SchemaError::declaration(
                ctx,
                format!("{name} must be <= {MAX_DIGITS}"),
            ));
        }
    }
    for (name, value) in [("minVal", spec.min_val), ("maxVal", spec.max_val)] {
        if value.is_some_and(|value| !value.is_finite()) {
            return Err(SchemaError::declaration(ctx, format!("{name} must be finite")));
        }
    }

    let step = places.map(|places| 10_f64.powi(-(places as i32)));
    let cap = spec.integer_digits.map(|digits| {
        let limit = 10_f64.powi(digits as i32);
        match step {
            Some(step) => limit - step,
            None => largest_below(limit),
        }
    });

    let mut upper = spec.max_val.or(cap).unwrap_or(DEFAULT_NUMBER_MAX);
    let mut lower = spec.min_val.unwrap_or(0.0);
    if let Some(cap) = cap {
        upper = upper.min(cap);
        lower = lower.max(-cap);
    }
    if spec.positive_only {
        lower = lower.max(step.unwrap_or(f64::MIN_POSITIVE));
    }
    if lower > upper {
        return Err(SchemaError::declaration(
            ctx,
            "minVal must be <= maxVal within the digit limits",
        ));
    }
    Ok(NumberBounds {
        lower,
        upper,
        places,
    })
}

/// Largest `f64` strictly below a positive finite `value`.
fn largest_below(value: f64) -> f64 {
    f64::from_bits(value.to_bits() - 1)
}

pub(crate) fn string_bounds(spec: &StringSpec, ctx: &str) -> Result<(usize, usize), SchemaError> {
    if spec.min_len > spec.max_len {
        return Err(SchemaError::declaration(ctx, "minLen must be <= maxLen"));
    }
    Ok((spec.min_len, spec.max_len))
}

pub(crate) fn resolve_timezone(spec: &TimestampSpec, ctx: &str) -> Result<Tz, SchemaError> {
    match spec.timezone.as_deref() {
        None => Ok(Tz::UTC),
        Some(name) => name.parse::<Tz>().map_err(|_| {
            SchemaError::declaration(ctx, format!("unknown timezone '{name}'"))
        }),
    }
}

pub(crate) fn boolean(rng: &mut dyn RngCore) -> Value {
    Value::Bool(rng.random_bool(0.5))
}

pub(crate) fn integer(spec: &IntSpec, rng: &mut dyn RngCore, ctx: &str) -> Result<Value, SchemaError> {
    let (min, max) = int_bounds(spec, ctx)?;
    Ok(Value::from(rng.random_range(min..=max)))
}

pub(crate) fn number(
    spec: &NumberSpec,
    decimal: bool,
    rng: &mut dyn RngCore,
    ctx: &str,
) -> Result<Value, SchemaError> {
    let bounds = number_bounds(spec, decimal, ctx)?;
    let raw = if bounds.lower == bounds.upper {
        bounds.lower
    } else {
        rng.random_range(bounds.lower..=bounds.upper)
    };
    let value = match bounds.places {
        Some(places) => round_within(raw, places, &bounds),
        None => raw,
    };
    // -0.0 would serialize with its sign
    let value = if value == 0.0 { 0.0 } else { value };
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| SchemaError::declaration(ctx, "generated a non-finite number"))
}

fn round_within(raw: f64, places: u32, bounds: &NumberBounds) -> f64 {
    let factor = 10_f64.powi(places as i32);
    let mut rounded = (raw * factor).round() / factor;
    if rounded > bounds.upper {
        rounded = (bounds.upper * factor).floor() / factor;
    }
    if rounded < bounds.lower {
        rounded = (bounds.lower * factor).ceil() / factor;
    }
    rounded
}

pub(crate) fn string(
    spec: &StringSpec,
    category: Option<FakeCategory>,
    provider: &dyn FakeProvider,
    locale: LocaleKey,
    rng: &mut dyn RngCore,
    ctx: &str,
) -> Result<Value, SchemaError> {
    let (min_len, max_len) = string_bounds(spec, ctx)?;
    let faked = category.and_then(|category| provider.fake(category, locale, rng));
    let text = match faked {
        Some(text) => clamp_text(text, min_len, max_len, rng),
        None => {
            let len = if min_len == max_len {
                min_len
            } else {
                rng.random_range(min_len..=max_len)
            };
            random_text(len, rng)
        }
    };
    Ok(Value::String(text))
}

fn random_text(len: usize, rng: &mut dyn RngCore) -> String {
    let chars: Vec<char> = DEFAULT_CHARSET.chars().collect();
    let mut value = String::with_capacity(len);
    for _ in 0..len {
        let idx = rng.random_range(0..chars.len());
        value.push(chars[idx]);
    }
    value
}

/// Pads with random alphanumerics or truncates on a char boundary.
fn clamp_text(text: String, min_len: usize, max_len: usize, rng: &mut dyn RngCore) -> String {
    let len = text.chars().count();
    if len > max_len {
        return text.chars().take(max_len).collect();
    }
    if len < min_len {
        let mut padded = text;
        padded.push_str(&random_text(min_len - len, rng));
        return padded;
    }
    text
}

pub(crate) fn uuid(rng: &mut dyn RngCore) -> Value {
    let mut bytes = [0_u8; 16];
    rng.fill_bytes(&mut bytes);
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    Value::String(uuid::Uuid::from_bytes(bytes).to_string())
}

/// Random instant in `[reference - window, reference]`.
pub(crate) fn instant(
    reference: DateTime<Utc>,
    window: Duration,
    rng: &mut dyn RngCore,
) -> DateTime<Utc> {
    let span = window.num_milliseconds().max(0);
    let back = if span == 0 {
        0
    } else {
        rng.random_range(0..=span)
    };
    reference - Duration::milliseconds(back)
}

pub(crate) fn enumerated(
    spec: &EnumSpec,
    rng: &mut dyn RngCore,
    ctx: &str,
) -> Result<Value, SchemaError> {
    let candidates = spec.candidates();
    if candidates.is_empty() {
        return Err(SchemaError::declaration(
            ctx,
            "enumeration has no values left after exclusions",
        ));
    }
    let idx = rng.random_range(0..candidates.len());
    Ok(candidates[idx].clone())
}

pub(crate) fn mapping() -> Value {
    Value::Object(Map::new())
}
