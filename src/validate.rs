//! Value coercion and validation rules for item answers.
//!
//! Coercion turns a raw answer (usually a string typed by a user) into the
//! item's declared [`ValueType`]. Validation then applies the first
//! applicable rule of, in order:
//!
//! 1. `required`, which only fails when no element is non-empty
//! 2. `values`, where every element must be an allowed value
//! 3. `regexp`, where every element must match at its start
//! 4. `range` `lo-hi[:step]`, where every element must be a step from `lo`
//!    within the inclusive bounds
//!
//! Once one of 2-4 is declared, the later ones are not consulted.
//!
//! Errors here are plain reasons; the item model attaches the key.

use std::cmp::Ordering;

use regex::Regex;
use toml::Value;

use crate::types::ValueType;

/// `None` and `""` both mean "no answer given".
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Coerce a raw value to the declared type. No type means no coercion.
pub fn coerce(value: Value, ty: Option<ValueType>) -> Result<Value, String> {
    let Some(ty) = ty else {
        return Ok(value);
    };
    match ty {
        ValueType::Csv => split_list(value, |s| s.split(',').map(str::to_string).collect()),
        ValueType::Ssv => split_list(value, |s| {
            s.split_whitespace().map(str::to_string).collect()
        }),
        scalar => match value {
            Value::Array(items) => items
                .iter()
                .map(|item| coerce_scalar(item, scalar))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => coerce_scalar(&other, scalar),
        },
    }
}

fn split_list(value: Value, split: impl Fn(&str) -> Vec<String>) -> Result<Value, String> {
    match value {
        Value::Array(items) => Ok(Value::Array(items)),
        Value::Table(_) => Err("expected a list, got a table".into()),
        other => Ok(Value::Array(
            split(&scalar_text(&other))
                .into_iter()
                .map(Value::String)
                .collect(),
        )),
    }
}

/// Coerce a single scalar. List types pass the value through.
pub fn coerce_scalar(value: &Value, ty: ValueType) -> Result<Value, String> {
    let mismatch = || format!("expected {}, got '{}'", ty.as_str(), scalar_text(value));
    match ty {
        ValueType::Bool => match value {
            Value::Boolean(b) => Ok(Value::Boolean(*b)),
            Value::Integer(i) => Ok(Value::Boolean(*i != 0)),
            Value::String(s) => parse_bool(s).map(Value::Boolean).ok_or_else(mismatch),
            _ => Err(mismatch()),
        },
        ValueType::Int => as_integer(value).map(Value::Integer).map_err(|_| mismatch()),
        ValueType::Float => match value {
            Value::Float(f) => Ok(Value::Float(*f)),
            Value::Integer(i) => Ok(Value::Float(*i as f64)),
            Value::String(s) => s.trim().parse().map(Value::Float).map_err(|_| mismatch()),
            _ => Err(mismatch()),
        },
        ValueType::Str => match value {
            Value::Array(_) | Value::Table(_) => Err(mismatch()),
            other => Ok(Value::String(scalar_text(other))),
        },
        ValueType::Csv | ValueType::Ssv => Ok(value.clone()),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" | "" => Some(false),
        _ => None,
    }
}

/// Bounds of the floats that convert to `i64` exactly: -2^63 up to, not
/// including, 2^63.
const I64_LOWER: f64 = -9_223_372_036_854_775_808.0;
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

/// Read a value as an integer: integers, integral floats, numeric strings.
pub fn as_integer(value: &Value) -> Result<i64, String> {
    match value {
        Value::Integer(i) => Ok(*i),
        Value::Float(f) if f.fract() == 0.0 => {
            if (I64_LOWER..I64_UPPER).contains(f) {
                Ok(*f as i64)
            } else {
                Err(format!("{f} is out of range for an integer"))
            }
        }
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| format!("'{s}' is not an integer")),
        other => Err(format!("'{}' is not an integer", scalar_text(other))),
    }
}

fn as_float(value: &Value) -> Result<f64, String> {
    match value {
        Value::Float(f) => Ok(*f),
        Value::Integer(i) => Ok(*i as f64),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| format!("'{s}' is not a number")),
        other => Err(format!("'{}' is not a number", scalar_text(other))),
    }
}

/// Plain text form of a value: strings unquoted, everything else as TOML.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Match anchored at the start of `text`, but not at its end.
pub fn matches_at_start(re: &Regex, text: &str) -> bool {
    re.find(text).is_some_and(|m| m.start() == 0)
}

/// Ordering used by `values_sort`: numbers numerically, strings
/// lexically, mixed values by their text.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Integer(x), Value::Integer(y)) => x.cmp(y),
        (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
            let (x, y) = (as_float(a).unwrap_or(0.0), as_float(b).unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        _ => scalar_text(a).cmp(&scalar_text(b)),
    }
}

/// A parsed `lo-hi[:step]` range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericRange {
    Int { lo: i64, hi: i64, step: i64 },
    Float { lo: f64, hi: f64, step: f64 },
}

impl NumericRange {
    /// Float items get a float range; everything else an integer range,
    /// falling back to float when the bounds are not integers.
    pub fn parse(spec: &str, ty: Option<ValueType>) -> Result<Self, String> {
        let spec = spec.trim();
        let bad = || format!("range '{spec}' is not of the form 'lo-hi[:step]'");

        // A leading '-' belongs to a negative lower bound.
        let split_at = spec
            .char_indices()
            .skip(1)
            .find(|(_, c)| *c == '-')
            .map(|(i, _)| i)
            .ok_or_else(bad)?;
        let lo = spec[..split_at].trim();
        let (hi, step) = match spec[split_at + 1..].split_once(':') {
            Some((hi, step)) => (hi.trim(), Some(step.trim()).filter(|s| !s.is_empty())),
            None => (spec[split_at + 1..].trim(), None),
        };

        let as_int = || -> Option<NumericRange> {
            Some(NumericRange::Int {
                lo: lo.parse().ok()?,
                hi: hi.parse().ok()?,
                step: match step {
                    Some(s) => s.parse().ok()?,
                    None => 1,
                },
            })
        };
        let as_float = || -> Option<NumericRange> {
            Some(NumericRange::Float {
                lo: lo.parse().ok()?,
                hi: hi.parse().ok()?,
                step: match step {
                    Some(s) => s.parse().ok()?,
                    None => 1.0,
                },
            })
        };

        let range = if ty == Some(ValueType::Float) {
            as_float()
        } else {
            as_int().or_else(as_float)
        }
        .ok_or_else(bad)?;

        match range {
            NumericRange::Int { step: 0, .. } => Err(format!("range '{spec}' has a zero step")),
            NumericRange::Float { step, .. } if step == 0.0 => {
                Err(format!("range '{spec}' has a zero step"))
            }
            range => Ok(range),
        }
    }

    pub fn contains(&self, value: &Value) -> Result<bool, String> {
        Ok(match *self {
            NumericRange::Int { lo, hi, step } => {
                let v = as_integer(value)?;
                lo <= v && v <= hi && (i128::from(v) - i128::from(lo)) % i128::from(step) == 0
            }
            NumericRange::Float { lo, hi, step } => {
                let v = as_float(value)?;
                lo <= v && v <= hi && (v - lo) % step == 0.0
            }
        })
    }
}

/// The validation constraints of one item, already compiled.
#[derive(Debug, Default)]
pub struct Rules<'a> {
    pub required: bool,
    pub values: Option<&'a [Value]>,
    pub regexp: Option<&'a Regex>,
    pub range: Option<&'a NumericRange>,
}

impl Rules<'_> {
    pub fn check(&self, elements: &[Value]) -> Result<(), String> {
        if self.required && elements.iter().all(is_empty_value) {
            return Err("a value is required".into());
        }

        if let Some(allowed) = self.values {
            for element in elements {
                if !allowed.iter().any(|a| same_value(a, element)) {
                    let choices: Vec<String> = allowed.iter().map(scalar_text).collect();
                    return Err(format!(
                        "'{}' is not one of: {}",
                        scalar_text(element),
                        choices.join(", ")
                    ));
                }
            }
        } else if let Some(re) = self.regexp {
            for element in elements {
                let text = scalar_text(element);
                if !matches_at_start(re, &text) {
                    return Err(format!("'{text}' does not match '{}'", re.as_str()));
                }
            }
        } else if let Some(range) = self.range {
            for element in elements {
                if !range.contains(element)? {
                    return Err(format!("'{}' is out of range", scalar_text(element)));
                }
            }
        }
        Ok(())
    }
}

/// Equal values, or a string and a scalar with the same text.
pub(crate) fn same_value(allowed: &Value, given: &Value) -> bool {
    match (allowed, given) {
        (Value::String(_), Value::Array(_) | Value::Table(_))
        | (Value::Array(_) | Value::Table(_), Value::String(_)) => false,
        (Value::String(_), _) | (_, Value::String(_)) => scalar_text(allowed) == scalar_text(given),
        _ => allowed == given,
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
