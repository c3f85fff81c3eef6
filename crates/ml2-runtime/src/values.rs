//! Host-side values crossing the argument contract.
//!
//! Features go out as positional arguments, results come back as stdout
//! lines. Both directions use the encoding in [`ml2_codegen::contract`].

use ml2_codegen::contract::{encode_array, encode_flag, split_array_line};
use ml2_codegen::{Feature, NativeType};
use serde::Serialize;
use std::fmt;

use crate::error::{Result, RuntimeError};

/// A feature or result value as the host sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HostValue {
    Bool(bool),
    Char(char),
    Int(i64),
    Float(f64),
    Text(String),
    Array(Vec<HostValue>),
}

impl HostValue {
    /// Render as a single script argument.
    pub fn encode_arg(&self) -> String {
        match self {
            HostValue::Array(items) => {
                let items: Vec<String> = items.iter().map(HostValue::encode_arg).collect();
                encode_array(&items)
            }
            scalar => scalar.to_string(),
        }
    }

    /// Decode one stdout line into a value of `result`'s declared type.
    pub fn decode(line: &str, result: &Feature) -> Result<Self> {
        if result.is_array {
            return split_array_line(line)
                .into_iter()
                .map(|item| decode_scalar(item, result))
                .collect::<Result<Vec<_>>>()
                .map(HostValue::Array);
        }
        decode_scalar(line, result)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HostValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            HostValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Integers widen to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HostValue::Float(value) => Some(*value),
            HostValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Bool(value) => f.write_str(encode_flag(*value)),
            HostValue::Char(value) => write!(f, "{value}"),
            HostValue::Int(value) => write!(f, "{value}"),
            HostValue::Float(value) => write!(f, "{value}"),
            HostValue::Text(value) => f.write_str(value),
            HostValue::Array(items) => {
                let items: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", items.join(" "))
            }
        }
    }
}

impl From<bool> for HostValue {
    fn from(value: bool) -> Self {
        HostValue::Bool(value)
    }
}

impl From<char> for HostValue {
    fn from(value: char) -> Self {
        HostValue::Char(value)
    }
}

impl From<i64> for HostValue {
    fn from(value: i64) -> Self {
        HostValue::Int(value)
    }
}

impl From<i32> for HostValue {
    fn from(value: i32) -> Self {
        HostValue::Int(i64::from(value))
    }
}

impl From<f64> for HostValue {
    fn from(value: f64) -> Self {
        HostValue::Float(value)
    }
}

impl From<&str> for HostValue {
    fn from(value: &str) -> Self {
        HostValue::Text(value.to_string())
    }
}

impl From<String> for HostValue {
    fn from(value: String) -> Self {
        HostValue::Text(value)
    }
}

impl<T: Into<HostValue>> From<Vec<T>> for HostValue {
    fn from(values: Vec<T>) -> Self {
        HostValue::Array(values.into_iter().map(Into::into).collect())
    }
}

fn decode_scalar(raw: &str, result: &Feature) -> Result<HostValue> {
    let text = raw.trim();
    let fail = |reason: &str| RuntimeError::Decode {
        result: result.name.clone(),
        line: raw.to_string(),
        reason: reason.to_string(),
    };

    match result.ty {
        NativeType::Boolean => {
            if text.eq_ignore_ascii_case("true") {
                Ok(HostValue::Bool(true))
            } else if text.eq_ignore_ascii_case("false") {
                Ok(HostValue::Bool(false))
            } else {
                Err(fail("expected true or false"))
            }
        }
        NativeType::Char => text
            .chars()
            .next()
            .map(HostValue::Char)
            .ok_or_else(|| fail("empty line")),
        ty if ty.is_integral() => match text.parse::<i64>() {
            Ok(value) => Ok(HostValue::Int(value)),
            // Models trained on integral targets may still print `3.0`.
            Err(_) => match text.parse::<f64>() {
                Ok(value) if value.is_finite() && value.fract() == 0.0 => {
                    Ok(HostValue::Int(value as i64))
                }
                _ => Err(fail("not an integer")),
            },
        },
        ty if ty.is_continuous() => text
            .parse::<f64>()
            .map(HostValue::Float)
            .map_err(|_| fail("not a number")),
        _ => Ok(HostValue::Text(text.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encode_scalars() {
        assert_eq!(HostValue::from(true).encode_arg(), "true");
        assert_eq!(HostValue::from('x').encode_arg(), "x");
        assert_eq!(HostValue::from(42).encode_arg(), "42");
        assert_eq!(HostValue::from(2.5).encode_arg(), "2.5");
        assert_eq!(HostValue::from("north").encode_arg(), "north");
    }

    #[test]
    fn test_encode_array_is_single_argument() {
        let value = HostValue::from(vec![1.5, 2.0, 3.25]);
        assert_eq!(value.encode_arg(), "'[1.5 2 3.25]'");
    }

    #[test]
    fn test_decode_python_booleans() {
        let result = Feature::scalar("alarm", NativeType::Boolean);
        assert_eq!(HostValue::decode("True\n", &result).unwrap(), HostValue::Bool(true));
        assert_eq!(HostValue::decode("false", &result).unwrap(), HostValue::Bool(false));
        assert!(HostValue::decode("maybe", &result).is_err());
    }

    #[test]
    fn test_decode_integral_accepts_float_text() {
        let result = Feature::scalar("cluster", NativeType::Int);
        assert_eq!(HostValue::decode("3", &result).unwrap(), HostValue::Int(3));
        assert_eq!(HostValue::decode("3.0", &result).unwrap(), HostValue::Int(3));

        let err = HostValue::decode("three", &result).unwrap_err();
        assert_eq!(err.error_code(), "DECODE_FAILED");
    }

    #[test]
    fn test_decode_integral_rejects_fractions_and_nan() {
        let result = Feature::scalar("cluster", NativeType::Long);
        for text in ["3.7", "nan", "inf", "-0.5"] {
            let err = HostValue::decode(text, &result).unwrap_err();
            assert_eq!(err.error_code(), "DECODE_FAILED", "{text} decoded");
        }
        assert_eq!(HostValue::decode("-2.0", &result).unwrap(), HostValue::Int(-2));

        let levels = Feature::array("levels", NativeType::Int);
        assert!(HostValue::decode("[1 2.5]", &levels).is_err());
    }

    #[test]
    fn test_decode_mixed_results() {
        let history = Feature::array("history", NativeType::Double);
        let label = Feature::scalar("label", NativeType::String);
        let grade = Feature::scalar("grade", NativeType::Char);

        assert_eq!(
            HostValue::decode("[0.5 1.0  2.25]", &history).unwrap(),
            HostValue::Array(vec![
                HostValue::Float(0.5),
                HostValue::Float(1.0),
                HostValue::Float(2.25)
            ])
        );
        assert_eq!(
            HostValue::decode("  warm \n", &label).unwrap(),
            HostValue::Text("warm".to_string())
        );
        assert_eq!(HostValue::decode("B", &grade).unwrap(), HostValue::Char('B'));
        assert_eq!(
            HostValue::decode("[]", &history).unwrap(),
            HostValue::Array(Vec::new())
        );
    }

    #[test]
    fn test_accessors() {
        assert_eq!(HostValue::Int(4).as_f64(), Some(4.0));
        assert_eq!(HostValue::Text("a".into()).as_str(), Some("a"));
        assert_eq!(HostValue::Bool(true).as_i64(), None);
        assert_eq!(HostValue::Bool(true).as_bool(), Some(true));
    }

    #[test]
    fn test_serializes_untagged() {
        let value = HostValue::from(vec![1, 2]);
        assert_eq!(serde_json::to_string(&value).unwrap(), "[1,2]");
    }
}
