//! Field-level checks shared by every contract type.
//!
//! A [`Validator`] tracks the current field path and accumulates violations;
//! nothing here short-circuits on the first failure. Parsers return `None`
//! only after they have reported why.

use super::errors::{ErrorType, FieldError, PathSegment};
use super::knowledge::ProcessingStatus;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

pub(crate) struct Validator {
    path: Vec<PathSegment>,
    errors: Vec<FieldError>,
}

impl Validator {
    pub(crate) fn new() -> Self {
        Self {
            path: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Run `f` with `segment` appended to the current path
    pub(crate) fn nested<T>(
        &mut self,
        segment: impl Into<PathSegment>,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        self.path.push(segment.into());
        let out = f(self);
        self.path.pop();
        out
    }

    pub(crate) fn report(&mut self, error_type: ErrorType, msg: impl Into<String>, input: Option<&Value>) {
        self.errors.push(FieldError::new(
            error_type,
            self.path.clone(),
            msg,
            input.cloned(),
        ));
    }

    /// `Ok` only when a value was produced and nothing was reported
    pub(crate) fn finish<T>(self, value: Option<T>) -> Result<T, Vec<FieldError>> {
        match value {
            Some(value) if self.errors.is_empty() => Ok(value),
            _ => Err(self.errors),
        }
    }

    pub(crate) fn check_min_chars(&mut self, s: &str, min: usize) -> bool {
        if s.chars().count() >= min {
            return true;
        }
        let unit = if min == 1 { "character" } else { "characters" };
        self.report(
            ErrorType::StringTooShort,
            format!("String should have at least {} {}", min, unit),
            Some(&Value::String(s.to_string())),
        );
        false
    }

    /// Rejects strings made only of whitespace
    pub(crate) fn check_not_blank(&mut self, s: &str) -> bool {
        if !s.trim().is_empty() {
            return true;
        }
        self.report(
            ErrorType::ValueError,
            "Value error, text cannot be empty or whitespace only",
            Some(&Value::String(s.to_string())),
        );
        false
    }

    pub(crate) fn check_min_int(&mut self, n: i128, min: i128) -> bool {
        if n >= min {
            return true;
        }
        self.report(
            ErrorType::GreaterThanEqual,
            format!("Input should be greater than or equal to {}", min),
            Some(&int_input(n)),
        );
        false
    }

    pub(crate) fn check_min_items(&mut self, len: usize, min: usize) -> bool {
        if len >= min {
            return true;
        }
        let unit = if min == 1 { "item" } else { "items" };
        self.report(
            ErrorType::TooShort,
            format!("List should have at least {} {} after validation, not {}", min, unit, len),
            None,
        );
        false
    }
}

fn int_input(n: i128) -> Value {
    i64::try_from(n)
        .map(Value::from)
        .unwrap_or_else(|_| Value::String(n.to_string()))
}

/// Reads the fields of one JSON object, remembering which keys were declared
pub(crate) struct ObjectReader<'a> {
    map: &'a Map<String, Value>,
    declared: Vec<&'static str>,
}

impl<'a> ObjectReader<'a> {
    /// Reports `model_type` and returns `None` when `value` is not an object
    pub(crate) fn open(v: &mut Validator, value: &'a Value, type_name: &str) -> Option<Self> {
        match value.as_object() {
            Some(map) => Some(Self {
                map,
                declared: Vec::new(),
            }),
            None => {
                v.report(
                    ErrorType::ModelType,
                    format!("Input should be a valid dictionary or instance of {}", type_name),
                    Some(value),
                );
                None
            }
        }
    }

    fn field(&mut self, key: &'static str) -> Option<&'a Value> {
        self.declared.push(key);
        self.map.get(key)
    }

    pub(crate) fn required<T>(
        &mut self,
        v: &mut Validator,
        key: &'static str,
        parse: impl FnOnce(&mut Validator, &'a Value) -> Option<T>,
    ) -> Option<T> {
        match self.field(key) {
            Some(value) => v.nested(key, |v| parse(v, value)),
            None => {
                v.nested(key, |v| v.report(ErrorType::Missing, "Field required", None));
                None
            }
        }
    }

    /// Absent or `null` reads as `Some(None)`
    pub(crate) fn optional<T>(
        &mut self,
        v: &mut Validator,
        key: &'static str,
        parse: impl FnOnce(&mut Validator, &'a Value) -> Option<T>,
    ) -> Option<Option<T>> {
        match self.field(key) {
            None | Some(Value::Null) => Some(None),
            Some(value) => v.nested(key, |v| parse(v, value)).map(Some),
        }
    }

    /// Absent reads as `Some(None)` so the caller can fill its default; `null` is parsed (and rejected)
    pub(crate) fn defaulted<T>(
        &mut self,
        v: &mut Validator,
        key: &'static str,
        parse: impl FnOnce(&mut Validator, &'a Value) -> Option<T>,
    ) -> Option<Option<T>> {
        match self.field(key) {
            None => Some(None),
            Some(value) => v.nested(key, |v| parse(v, value)).map(Some),
        }
    }

    /// Closed shape: every undeclared key is a violation
    pub(crate) fn forbid_extra(self, v: &mut Validator) {
        for (key, value) in self.map {
            if !self.declared.contains(&key.as_str()) {
                v.nested(key.as_str(), |v| {
                    v.report(ErrorType::ExtraForbidden, "Extra inputs are not permitted", Some(value))
                });
            }
        }
    }

    /// Open shape: undeclared keys are carried through untouched
    pub(crate) fn into_extra(self) -> Map<String, Value> {
        self.map
            .iter()
            .filter(|(key, _)| !self.declared.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// Validate a whole payload with `collect`
pub(crate) fn run<T>(
    value: &Value,
    collect: impl FnOnce(&mut Validator, &Value) -> Option<T>,
) -> Result<T, Vec<FieldError>> {
    let mut v = Validator::new();
    let out = collect(&mut v, value);
    v.finish(out)
}

pub(crate) fn string(v: &mut Validator, value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        other => {
            v.report(ErrorType::StringType, "Input should be a valid string", Some(other));
            None
        }
    }
}

/// Booleans, `0`/`1`, and the usual yes/no words (any case)
pub(crate) fn boolean(v: &mut Validator, value: &Value) -> Option<bool> {
    let parsed = match value {
        Value::Bool(b) => return Some(*b),
        Value::Number(num) => match num.as_f64() {
            Some(f) if f == 0.0 => Some(false),
            Some(f) if f == 1.0 => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "0" | "off" | "f" | "false" | "n" | "no" => Some(false),
            "1" | "on" | "t" | "true" | "y" | "yes" => Some(true),
            _ => None,
        },
        other => {
            v.report(ErrorType::BoolType, "Input should be a valid boolean", Some(other));
            return None;
        }
    };

    if parsed.is_none() {
        v.report(
            ErrorType::BoolParsing,
            "Input should be a valid boolean, unable to interpret input",
            Some(value),
        );
    }
    parsed
}

fn fractional(v: &mut Validator, value: &Value) {
    v.report(
        ErrorType::IntFromFloat,
        "Input should be a valid integer, got a number with a fractional part",
        Some(value),
    );
}

/// Integer within `[min, max]`.
///
/// Whole floats, numeric strings and booleans are accepted; anything with a
/// fractional part is not.
pub(crate) fn integer(v: &mut Validator, value: &Value, min: i128, max: i128) -> Option<i128> {
    let n = match value {
        Value::Number(num) => {
            if let Some(n) = num.as_i64() {
                i128::from(n)
            } else if let Some(n) = num.as_u64() {
                i128::from(n)
            } else {
                match num.as_f64() {
                    Some(f) if f.is_finite() && f.fract() == 0.0 => f as i128,
                    _ => {
                        fractional(v, value);
                        return None;
                    }
                }
            }
        }
        Value::Bool(b) => i128::from(*b),
        Value::String(s) => {
            let s = s.trim();
            match (s.parse::<i128>(), s.parse::<f64>()) {
                (Ok(n), _) => n,
                (_, Ok(f)) if f.is_finite() && f.fract() == 0.0 => f as i128,
                (_, Ok(f)) if f.is_finite() => {
                    fractional(v, value);
                    return None;
                }
                _ => {
                    v.report(
                        ErrorType::IntParsing,
                        "Input should be a valid integer, unable to parse string as an integer",
                        Some(value),
                    );
                    return None;
                }
            }
        }
        other => {
            v.report(ErrorType::IntType, "Input should be a valid integer", Some(other));
            return None;
        }
    };

    if !v.check_min_int(n, min) {
        return None;
    }
    if n > max {
        v.report(
            ErrorType::LessThanEqual,
            format!("Input should be less than or equal to {}", max),
            Some(value),
        );
        return None;
    }
    Some(n)
}

/// Integer >= 1 (page numbers, totals)
pub(crate) fn positive_u64(v: &mut Validator, value: &Value) -> Option<u64> {
    integer(v, value, 1, i128::from(u64::MAX)).map(|n| n as u64)
}

pub(crate) fn non_negative_u64(v: &mut Validator, value: &Value) -> Option<u64> {
    integer(v, value, 0, i128::from(u64::MAX)).map(|n| n as u64)
}

pub(crate) fn uuid(v: &mut Validator, value: &Value) -> Option<Uuid> {
    match value {
        Value::String(s) => match Uuid::parse_str(s) {
            Ok(id) => Some(id),
            Err(e) => {
                v.report(
                    ErrorType::UuidParsing,
                    format!("Input should be a valid UUID, {}", e),
                    Some(value),
                );
                None
            }
        },
        other => {
            v.report(ErrorType::UuidType, "UUID input should be a string", Some(other));
            None
        }
    }
}

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Above this magnitude a unix timestamp is read as milliseconds
const EPOCH_MILLIS_THRESHOLD: f64 = 2e10;

fn from_epoch(n: f64) -> Option<DateTime<Utc>> {
    if !n.is_finite() {
        return None;
    }
    let secs = if n.abs() > EPOCH_MILLIS_THRESHOLD { n / 1000.0 } else { n };
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::<Utc>::from_timestamp(whole as i64, nanos)
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|midnight| midnight.and_utc());
    }
    s.parse::<f64>().ok().and_then(from_epoch)
}

/// Timestamp converted to UTC.
///
/// Accepts RFC 3339, the same without offset (read as UTC), a bare date
/// (midnight UTC) and unix time in seconds or milliseconds, as a number or a string.
pub(crate) fn timestamp(v: &mut Validator, value: &Value) -> Option<DateTime<Utc>> {
    let parsed = match value {
        Value::Number(num) => num.as_f64().and_then(from_epoch),
        Value::String(s) => parse_datetime(s.trim()),
        other => {
            v.report(ErrorType::DatetimeType, "Input should be a valid datetime", Some(other));
            return None;
        }
    };

    if parsed.is_none() {
        v.report(
            ErrorType::DatetimeParsing,
            "Input should be a valid datetime or date, unable to parse input",
            Some(value),
        );
    }
    parsed
}

pub(crate) fn status(v: &mut Validator, value: &Value) -> Option<ProcessingStatus> {
    if let Some(status) = value.as_str().and_then(|s| s.parse::<ProcessingStatus>().ok()) {
        return Some(status);
    }
    v.report(
        ErrorType::Enum,
        "Input should be 'success', 'partial', 'failed' or 'validation_error'",
        Some(value),
    );
    None
}

/// Parse every element, reporting each failure under its index
pub(crate) fn list<T>(
    v: &mut Validator,
    value: &Value,
    mut item: impl FnMut(&mut Validator, &Value) -> Option<T>,
) -> Option<Vec<T>> {
    let Value::Array(items) = value else {
        v.report(ErrorType::ListType, "Input should be a valid list", Some(value));
        return None;
    };

    let mut out = Vec::with_capacity(items.len());
    let mut complete = true;
    for (index, element) in items.iter().enumerate() {
        match v.nested(index, |v| item(v, element)) {
            Some(parsed) => out.push(parsed),
            None => complete = false,
        }
    }
    complete.then_some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn errors_of<T>(value: Value, parse: impl FnOnce(&mut Validator, &Value) -> Option<T>) -> Vec<FieldError> {
        match run(&value, parse) {
            Ok(_) => Vec::new(),
            Err(errors) => errors,
        }
    }

    #[test]
    fn test_integer_accepts_whole_floats() {
        assert_eq!(run(&json!(3.0), |v, x| integer(v, x, 0, 10)), Ok(3));
        let errors = errors_of(json!(2.5), |v, x| integer(v, x, 0, 10));
        assert_eq!(errors[0].error_type, ErrorType::IntFromFloat);
    }

    #[test]
    fn test_integer_coerces_strings_and_bools() {
        assert_eq!(run(&json!("3"), non_negative_u64), Ok(3));
        assert_eq!(run(&json!(" 42 "), non_negative_u64), Ok(42));
        assert_eq!(run(&json!("7.0"), non_negative_u64), Ok(7));
        assert_eq!(run(&json!(true), non_negative_u64), Ok(1));
        assert_eq!(run(&json!(false), non_negative_u64), Ok(0));

        assert_eq!(errors_of(json!("seven"), non_negative_u64)[0].error_type, ErrorType::IntParsing);
        assert_eq!(errors_of(json!("2.5"), non_negative_u64)[0].error_type, ErrorType::IntFromFloat);
        assert_eq!(errors_of(json!([1]), non_negative_u64)[0].error_type, ErrorType::IntType);
        assert_eq!(errors_of(json!(null), non_negative_u64)[0].error_type, ErrorType::IntType);
    }

    #[test]
    fn test_integer_bounds() {
        let errors = errors_of(json!(0), positive_u64);
        assert_eq!(errors[0].error_type, ErrorType::GreaterThanEqual);
        assert_eq!(errors[0].msg, "Input should be greater than or equal to 1");

        let errors = errors_of(json!("-1"), non_negative_u64);
        assert_eq!(errors[0].msg, "Input should be greater than or equal to 0");

        let errors = errors_of(json!(false), positive_u64);
        assert_eq!(errors[0].error_type, ErrorType::GreaterThanEqual);
    }

    #[test]
    fn test_integer_has_no_u32_ceiling() {
        assert_eq!(run(&json!(4_294_967_296u64), positive_u64), Ok(4_294_967_296));
        assert_eq!(run(&json!(u64::MAX), non_negative_u64), Ok(u64::MAX));
    }

    #[test]
    fn test_boolean_coercion() {
        for truthy in [json!(true), json!(1), json!(1.0), json!("true"), json!("True"), json!("yes"), json!("on"), json!("1"), json!("t"), json!("y")] {
            assert_eq!(run(&truthy, boolean), Ok(true), "{}", truthy);
        }
        for falsy in [json!(false), json!(0), json!("false"), json!("NO"), json!("off"), json!("0"), json!("f"), json!("n")] {
            assert_eq!(run(&falsy, boolean), Ok(false), "{}", falsy);
        }

        assert_eq!(errors_of(json!("maybe"), boolean)[0].error_type, ErrorType::BoolParsing);
        assert_eq!(errors_of(json!(2), boolean)[0].error_type, ErrorType::BoolParsing);
        assert_eq!(errors_of(json!({}), boolean)[0].error_type, ErrorType::BoolType);
    }

    #[test]
    fn test_timestamp_formats() {
        let with_offset = run(&json!("2025-01-02T03:04:05+02:00"), timestamp).unwrap();
        assert_eq!(with_offset.to_rfc3339(), "2025-01-02T01:04:05+00:00");

        let naive = run(&json!("2025-01-02T03:04:05.250"), timestamp).unwrap();
        assert_eq!(naive.timestamp_subsec_millis(), 250);

        let spaced = run(&json!("2025-01-02 03:04:05"), timestamp).unwrap();
        assert_eq!(spaced.to_rfc3339(), "2025-01-02T03:04:05+00:00");

        let errors = errors_of(json!("yesterday"), timestamp);
        assert_eq!(errors[0].error_type, ErrorType::DatetimeParsing);
        assert_eq!(errors_of(json!(true), timestamp)[0].error_type, ErrorType::DatetimeType);
    }

    #[test]
    fn test_timestamp_date_only_is_midnight_utc() {
        let date = run(&json!("2025-01-02"), timestamp).unwrap();
        assert_eq!(date.to_rfc3339(), "2025-01-02T00:00:00+00:00");
    }

    #[test]
    fn test_timestamp_from_unix_time() {
        let expected = "2023-11-14T22:13:20+00:00";
        assert_eq!(run(&json!(1_700_000_000), timestamp).unwrap().to_rfc3339(), expected);
        assert_eq!(run(&json!(1_700_000_000_000u64), timestamp).unwrap().to_rfc3339(), expected);
        assert_eq!(run(&json!("1700000000"), timestamp).unwrap().to_rfc3339(), expected);

        let fractional = run(&json!(1_700_000_000.5), timestamp).unwrap();
        assert_eq!(fractional.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn test_uuid_errors() {
        assert_eq!(errors_of(json!("not-a-uuid"), uuid)[0].error_type, ErrorType::UuidParsing);
        assert_eq!(errors_of(json!(42), uuid)[0].error_type, ErrorType::UuidType);
    }

    #[test]
    fn test_list_reports_every_bad_element() {
        let errors = errors_of(json!(["ok", 1, "fine", false]), |v, x| list(v, x, string));
        let paths: Vec<_> = errors.iter().map(FieldError::path).collect();
        assert_eq!(paths, vec!["1", "3"]);
    }

    #[test]
    fn test_min_chars_counts_characters_not_bytes() {
        let mut v = Validator::new();
        assert!(v.check_min_chars("éééééééééé", 10));
        assert!(!v.check_min_chars("short", 10));
        let errors = v.finish(Some(())).unwrap_err();
        assert_eq!(errors[0].msg, "String should have at least 10 characters");
    }

    #[test]
    fn test_status_enum() {
        assert_eq!(run(&json!("partial"), status), Ok(ProcessingStatus::Partial));
        let errors = errors_of(json!("done"), status);
        assert_eq!(errors[0].error_type, ErrorType::Enum);
    }
}
