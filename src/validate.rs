use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

pub type ValidationResult<T> = Result<T, ValidationError>;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Expected a value, but got null")]
    Null,

    #[error("val={val} is not an object")]
    NotObject { val: String },

    #[error("val=\"{val}\" is not a number")]
    NotNumber { val: String },

    #[error("val=\"{val}\" is not a positive integer")]
    NotPositiveInteger { val: String },

    #[error("{val} does not fit in {max}")]
    TooLarge { val: u64, max: u64 },

    #[error("\"{raw}\" is not a number")]
    NotNumeric { raw: String },
}

/// Rejects a missing or `null` value.
pub fn not_null(val: Option<&Value>) -> ValidationResult<&Value> {
    match val {
        None | Some(Value::Null) => Err(ValidationError::Null),
        Some(val) => Ok(val),
    }
}

/// Narrows `val` to a JSON object. `null` is reported as such, not as a non-object.
pub fn as_object(val: &Value) -> ValidationResult<&Map<String, Value>> {
    let val = not_null(Some(val))?;

    let Value::Object(map) = val else {
        return Err(ValidationError::NotObject {
            val: val.to_string(),
        });
    };

    Ok(map)
}

pub fn as_number(val: &Value) -> ValidationResult<f64> {
    let Some(n) = val.as_f64() else {
        return Err(ValidationError::NotNumber {
            val: val.to_string(),
        });
    };

    Ok(n)
}

/// Narrows `val` to an integer `> 0`.
///
/// Integral floats such as `5.0` are accepted, so the check is on the numeric value rather than
/// on how the number happened to be written.
pub fn as_positive_integer(val: &Value) -> ValidationResult<u64> {
    let n = as_number(val)?;

    if let Some(n) = val.as_u64() {
        if n > 0 {
            return Ok(n);
        }
    } else if n.fract() == 0.0 && n > 0.0 && n < u64::MAX as f64 {
        return Ok(n as u64);
    }

    Err(ValidationError::NotPositiveInteger {
        val: val.to_string(),
    })
}

/// Like `as_positive_integer`, but the result must also fit in a `u32`.
pub fn as_positive_u32(val: &Value) -> ValidationResult<u32> {
    let n = as_positive_integer(val)?;

    u32::try_from(n).map_err(|_| ValidationError::TooLarge {
        val: n,
        max: u32::MAX as u64,
    })
}

/// Parses a raw attribute string as a number.
pub fn parse_number(raw: &str) -> ValidationResult<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| !n.is_nan())
        .ok_or_else(|| ValidationError::NotNumeric {
            raw: raw.to_string(),
        })
}

pub fn validate_positive_integer(n: f64) -> ValidationResult<u64> {
    if n <= 0.0 || n.fract() != 0.0 || n >= u64::MAX as f64 {
        return Err(ValidationError::NotPositiveInteger { val: n.to_string() });
    }

    Ok(n as u64)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::ValidationError;

    #[test]
    fn not_null_rejects_missing_and_null() {
        assert_eq!(super::not_null(None), Err(ValidationError::Null));
        assert_eq!(super::not_null(Some(&json!(null))), Err(ValidationError::Null));
        assert_eq!(super::not_null(Some(&json!(0))), Ok(&json!(0)));
    }

    #[test]
    fn as_object_reports_null_separately() {
        assert!(super::as_object(&json!({"rows": 1})).is_ok());
        assert_eq!(super::as_object(&json!(null)), Err(ValidationError::Null));
        assert!(matches!(
            super::as_object(&json!([1, 2])),
            Err(ValidationError::NotObject { .. })
        ));
    }

    #[test]
    fn positive_integer() {
        assert_eq!(super::as_positive_integer(&json!(7)), Ok(7));
        assert_eq!(super::as_positive_integer(&json!(7.0)), Ok(7));

        for val in [json!(0), json!(-3), json!(1.5), json!(-0.0)] {
            assert!(
                matches!(
                    super::as_positive_integer(&val),
                    Err(ValidationError::NotPositiveInteger { .. })
                ),
                "{val} should be rejected"
            );
        }

        // 2^64 is the nearest f64 to u64::MAX and must not saturate
        assert_eq!(super::as_positive_integer(&json!(u64::MAX)), Ok(u64::MAX));
        assert!(matches!(
            super::as_positive_integer(&json!(18446744073709551616.0)),
            Err(ValidationError::NotPositiveInteger { .. })
        ));

        assert!(matches!(
            super::as_positive_integer(&json!("7")),
            Err(ValidationError::NotNumber { .. })
        ));
    }

    #[test]
    fn positive_u32_rejects_overflow() {
        let val = json!(u32::MAX as u64 + 1);

        assert!(matches!(
            super::as_positive_u32(&val),
            Err(ValidationError::TooLarge { .. })
        ));
    }

    #[test]
    fn attribute_numbers() {
        assert_eq!(super::parse_number(" 12 "), Ok(12.0));
        assert!(super::parse_number("twelve").is_err());
        assert!(super::parse_number("NaN").is_err());

        assert_eq!(super::validate_positive_integer(12.0), Ok(12));
        assert!(super::validate_positive_integer(0.0).is_err());
        assert!(super::validate_positive_integer(2.5).is_err());
        assert!(super::validate_positive_integer(18446744073709551616.0).is_err());
        assert!(super::validate_positive_integer(u64::MAX as f64).is_err());
    }
}
