//! The validator capability and the built-in validators.
//!
//! A validator both checks and transforms: it receives the raw value and
//! returns either the (possibly coerced) value or a [`ValidationError`].
//! Chains apply left to right and short-circuit on the first error. Two
//! optional capabilities extend the core contract: display formatting
//! (applied in reverse chain order by [`Field::format`](crate::Field::format))
//! and option enumeration for choice-driven widgets.

use std::fmt;
use std::sync::Arc;

use schemaform_core::error::ValidationError;

use crate::value::Value;

/// An ordered validator chain as stored on a field.
pub type ValidatorChain = Vec<Arc<dyn Validator>>;

/// The validator capability set.
pub trait Validator: Send + Sync + fmt::Debug {
    /// Checks and transforms a raw value.
    fn validate(&self, value: Value) -> Result<Value, ValidationError>;

    /// Formats a stored value back into its display shape.
    ///
    /// The default implementation is the identity.
    fn format(&self, value: Value) -> Value {
        value
    }

    /// Enumerates selectable options as `(key, display)` pairs, if this
    /// validator constrains the value to a fixed set.
    fn options(&self) -> Option<Vec<(String, String)>> {
        None
    }

    /// Whether multiple selections are allowed (only meaningful together
    /// with [`options`](Validator::options)).
    fn is_multiple(&self) -> bool {
        false
    }

    /// Whether this validator explicitly accepts empty input.
    fn allows_empty(&self) -> bool {
        false
    }
}

fn invalid(message: impl Into<String>, code: &str) -> ValidationError {
    ValidationError::new(message, code)
}

// ---------------------------------------------------------------------------
// Length
// ---------------------------------------------------------------------------

/// Validates that a string value stays within a character-count range.
#[derive(Debug, Clone)]
pub struct IsLength {
    /// Maximum allowed length in characters.
    pub maxsize: usize,
    /// Minimum required length in characters.
    pub minsize: usize,
    message: Option<String>,
}

impl IsLength {
    /// Creates a length check bounded above by `maxsize`.
    pub const fn new(maxsize: usize) -> Self {
        Self {
            maxsize,
            minsize: 0,
            message: None,
        }
    }

    /// Sets the minimum required length.
    #[must_use]
    pub const fn min(mut self, minsize: usize) -> Self {
        self.minsize = minsize;
        self
    }

    /// Overrides the error message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn fail(&self, detail: String, code: &str) -> ValidationError {
        invalid(self.message.clone().unwrap_or(detail), code)
    }
}

impl Validator for IsLength {
    fn validate(&self, value: Value) -> Result<Value, ValidationError> {
        let len = match &value {
            Value::Str(s) => s.chars().count(),
            Value::Null => 0,
            _ => return Ok(value),
        };
        if len > self.maxsize {
            return Err(self.fail(
                format!(
                    "Ensure this value has at most {} characters (it has {len}).",
                    self.maxsize
                ),
                "max_length",
            ));
        }
        if len < self.minsize {
            return Err(self.fail(
                format!(
                    "Ensure this value has at least {} characters (it has {len}).",
                    self.minsize
                ),
                "min_length",
            ));
        }
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// Numeric ranges
// ---------------------------------------------------------------------------

/// Validates that a value parses as an integer within an optional range.
///
/// Transforms string input into [`Value::Int`].
#[derive(Debug, Clone)]
pub struct IsIntInRange {
    /// Minimum allowed value.
    pub minimum: Option<i64>,
    /// Maximum allowed value.
    pub maximum: Option<i64>,
    message: Option<String>,
}

impl IsIntInRange {
    /// Creates a range check over `[minimum, maximum]`.
    pub const fn new(minimum: Option<i64>, maximum: Option<i64>) -> Self {
        Self {
            minimum,
            maximum,
            message: None,
        }
    }

    /// Overrides the error message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn error(&self) -> ValidationError {
        let detail = match (self.minimum, self.maximum) {
            (Some(lo), Some(hi)) => format!("Enter a whole number between {lo} and {hi}."),
            (Some(lo), None) => format!("Enter a whole number of at least {lo}."),
            (None, Some(hi)) => format!("Enter a whole number of at most {hi}."),
            (None, None) => "Enter a whole number.".to_string(),
        };
        invalid(self.message.clone().unwrap_or(detail), "invalid_integer")
    }
}

impl Validator for IsIntInRange {
    fn validate(&self, value: Value) -> Result<Value, ValidationError> {
        let n = match &value {
            Value::Int(i) => *i,
            Value::Str(s) => s.trim().parse::<i64>().map_err(|_| self.error())?,
            _ => return Err(self.error()),
        };
        if self.minimum.is_some_and(|lo| n < lo) || self.maximum.is_some_and(|hi| n > hi) {
            return Err(self.error());
        }
        Ok(Value::Int(n))
    }
}

/// Validates that a value parses as a float within an optional range.
///
/// Transforms string input into [`Value::Float`].
#[derive(Debug, Clone)]
pub struct IsFloatInRange {
    /// Minimum allowed value.
    pub minimum: Option<f64>,
    /// Maximum allowed value.
    pub maximum: Option<f64>,
    message: Option<String>,
}

impl IsFloatInRange {
    /// Creates a range check over `[minimum, maximum]`.
    pub const fn new(minimum: Option<f64>, maximum: Option<f64>) -> Self {
        Self {
            minimum,
            maximum,
            message: None,
        }
    }

    /// Overrides the error message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn error(&self) -> ValidationError {
        let detail = match (self.minimum, self.maximum) {
            (Some(lo), Some(hi)) => format!("Enter a number between {lo} and {hi}."),
            (Some(lo), None) => format!("Enter a number of at least {lo}."),
            (None, Some(hi)) => format!("Enter a number of at most {hi}."),
            (None, None) => "Enter a number.".to_string(),
        };
        invalid(self.message.clone().unwrap_or(detail), "invalid_number")
    }
}

impl Validator for IsFloatInRange {
    fn validate(&self, value: Value) -> Result<Value, ValidationError> {
        let n = match &value {
            Value::Float(f) => *f,
            Value::Int(i) => *i as f64,
            Value::Str(s) => s.trim().parse::<f64>().map_err(|_| self.error())?,
            _ => return Err(self.error()),
        };
        if self.minimum.is_some_and(|lo| n < lo) || self.maximum.is_some_and(|hi| n > hi) {
            return Err(self.error());
        }
        Ok(Value::Float(n))
    }
}

/// Validates a fixed-point decimal amount within a range.
///
/// Values are represented as [`Value::Float`]; the validator exists so
/// decimal-typed fields get a distinct default range and error wording.
#[derive(Debug, Clone)]
pub struct IsDecimalInRange {
    /// Minimum allowed value.
    pub minimum: f64,
    /// Maximum allowed value.
    pub maximum: f64,
}

impl IsDecimalInRange {
    /// Creates a range check over `[minimum, maximum]`.
    pub const fn new(minimum: f64, maximum: f64) -> Self {
        Self { minimum, maximum }
    }

    fn error(&self) -> ValidationError {
        invalid(
            format!(
                "Enter a decimal between {} and {}.",
                self.minimum, self.maximum
            ),
            "invalid_decimal",
        )
    }
}

impl Validator for IsDecimalInRange {
    fn validate(&self, value: Value) -> Result<Value, ValidationError> {
        let n = match &value {
            Value::Float(f) => *f,
            Value::Int(i) => *i as f64,
            Value::Str(s) => s.trim().parse::<f64>().map_err(|_| self.error())?,
            _ => return Err(self.error()),
        };
        if n < self.minimum || n > self.maximum {
            return Err(self.error());
        }
        Ok(Value::Float(n))
    }
}

// ---------------------------------------------------------------------------
// Dates and times
// ---------------------------------------------------------------------------

/// Parses and formats dates.
#[derive(Debug, Clone)]
pub struct IsDate {
    /// The strftime-style format used for parsing and display.
    pub format: String,
}

impl Default for IsDate {
    fn default() -> Self {
        Self {
            format: "%Y-%m-%d".to_string(),
        }
    }
}

impl IsDate {
    /// Creates a date validator with a custom format.
    pub fn with_format(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }
}

impl Validator for IsDate {
    fn validate(&self, value: Value) -> Result<Value, ValidationError> {
        match &value {
            Value::Date(_) => Ok(value),
            Value::Str(s) => chrono::NaiveDate::parse_from_str(s.trim(), &self.format)
                .map(Value::Date)
                .map_err(|_| invalid("Enter a valid date.", "invalid_date")),
            _ => Err(invalid("Enter a valid date.", "invalid_date")),
        }
    }

    fn format(&self, value: Value) -> Value {
        match value {
            Value::Date(d) => Value::Str(d.format(&self.format).to_string()),
            other => other,
        }
    }
}

/// Parses and formats times of day.
#[derive(Debug, Clone)]
pub struct IsTime {
    /// The strftime-style format used for display.
    pub format: String,
}

impl Default for IsTime {
    fn default() -> Self {
        Self {
            format: "%H:%M:%S".to_string(),
        }
    }
}

impl Validator for IsTime {
    fn validate(&self, value: Value) -> Result<Value, ValidationError> {
        match &value {
            Value::Time(_) => Ok(value),
            Value::Str(s) => {
                let s = s.trim();
                chrono::NaiveTime::parse_from_str(s, "%H:%M:%S")
                    .or_else(|_| chrono::NaiveTime::parse_from_str(s, "%H:%M"))
                    .map(Value::Time)
                    .map_err(|_| invalid("Enter a valid time.", "invalid_time"))
            }
            _ => Err(invalid("Enter a valid time.", "invalid_time")),
        }
    }

    fn format(&self, value: Value) -> Value {
        match value {
            Value::Time(t) => Value::Str(t.format(&self.format).to_string()),
            other => other,
        }
    }
}

/// Parses and formats date-times.
#[derive(Debug, Clone)]
pub struct IsDatetime {
    /// The strftime-style format used for parsing and display.
    pub format: String,
}

impl Default for IsDatetime {
    fn default() -> Self {
        Self {
            format: "%Y-%m-%d %H:%M:%S".to_string(),
        }
    }
}

impl Validator for IsDatetime {
    fn validate(&self, value: Value) -> Result<Value, ValidationError> {
        match &value {
            Value::DateTime(_) => Ok(value),
            Value::Str(s) => {
                let s = s.trim();
                chrono::NaiveDateTime::parse_from_str(s, &self.format)
                    .or_else(|_| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
                    .or_else(|_| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
                    .map(Value::DateTime)
                    .map_err(|_| invalid("Enter a valid date and time.", "invalid_datetime"))
            }
            _ => Err(invalid("Enter a valid date and time.", "invalid_datetime")),
        }
    }

    fn format(&self, value: Value) -> Value {
        match value {
            Value::DateTime(dt) => Value::Str(dt.format(&self.format).to_string()),
            other => other,
        }
    }
}

// ---------------------------------------------------------------------------
// Sets and emptiness
// ---------------------------------------------------------------------------

/// Constrains a value to an enumerated set and exposes that set to
/// choice-driven widgets.
#[derive(Debug, Clone)]
pub struct IsInSet {
    theset: Vec<(String, String)>,
    multiple: bool,
    message: Option<String>,
}

impl IsInSet {
    /// Creates a set check from `(key, display)` pairs.
    pub fn new<K: Into<String>, D: Into<String>>(pairs: Vec<(K, D)>) -> Self {
        Self {
            theset: pairs
                .into_iter()
                .map(|(k, d)| (k.into(), d.into()))
                .collect(),
            multiple: false,
            message: None,
        }
    }

    /// Creates a set check whose displays equal the keys.
    pub fn from_values<K: Into<String> + Clone>(values: &[K]) -> Self {
        Self::new(
            values
                .iter()
                .map(|v| (v.clone().into(), v.clone().into()))
                .collect(),
        )
    }

    /// Allows multiple selections.
    #[must_use]
    pub const fn multiple(mut self, multiple: bool) -> Self {
        self.multiple = multiple;
        self
    }

    /// Overrides the error message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn error(&self) -> ValidationError {
        invalid(
            self.message
                .clone()
                .unwrap_or_else(|| "Value not allowed.".to_string()),
            "not_in_set",
        )
    }

    fn contains(&self, key: &str) -> bool {
        self.theset.iter().any(|(k, _)| k == key)
    }
}

impl Validator for IsInSet {
    fn validate(&self, value: Value) -> Result<Value, ValidationError> {
        if self.multiple {
            let items: Vec<Value> = match value {
                Value::List(items) => items,
                Value::Null => Vec::new(),
                other => vec![other],
            };
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                let key = item.to_string();
                if !self.contains(&key) {
                    return Err(self.error());
                }
                out.push(Value::Str(key));
            }
            Ok(Value::List(out))
        } else {
            if !self.contains(&value.to_string()) {
                return Err(self.error());
            }
            Ok(value)
        }
    }

    fn options(&self) -> Option<Vec<(String, String)>> {
        Some(self.theset.clone())
    }

    fn is_multiple(&self) -> bool {
        self.multiple
    }
}

/// Rejects empty input.
#[derive(Debug, Clone, Default)]
pub struct IsNotEmpty {
    message: Option<String>,
}

impl IsNotEmpty {
    /// Creates the check.
    pub const fn new() -> Self {
        Self { message: None }
    }

    /// Overrides the error message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl Validator for IsNotEmpty {
    fn validate(&self, value: Value) -> Result<Value, ValidationError> {
        if value.is_empty_input() {
            return Err(invalid(
                self.message
                    .clone()
                    .unwrap_or_else(|| "Enter a value.".to_string()),
                "empty",
            ));
        }
        Ok(value)
    }
}

/// Validates a string against a regular expression.
#[derive(Debug, Clone)]
pub struct IsMatch {
    pattern: regex::Regex,
}

impl IsMatch {
    /// Compiles the pattern.
    ///
    /// Returns `None` if the pattern does not compile; schemas are expected
    /// to carry valid patterns, so callers typically unwrap at startup.
    pub fn new(pattern: &str) -> Option<Self> {
        regex::Regex::new(pattern).ok().map(|p| Self { pattern: p })
    }
}

impl Validator for IsMatch {
    fn validate(&self, value: Value) -> Result<Value, ValidationError> {
        match &value {
            Value::Str(s) if self.pattern.is_match(s) => Ok(value),
            _ => Err(invalid("Invalid expression.", "no_match")),
        }
    }
}

/// Wraps another validator, accepting empty input as `Null`.
///
/// Non-empty input is delegated to the wrapped validator; options,
/// multiplicity, and display formatting delegate as well. Presence of this
/// wrapper (or of an empty chain) is what allows an upload widget to offer
/// its delete checkbox.
#[derive(Debug, Clone)]
pub struct IsEmptyOr {
    other: Arc<dyn Validator>,
}

impl IsEmptyOr {
    /// Wraps `other`.
    pub fn new(other: Arc<dyn Validator>) -> Self {
        Self { other }
    }
}

impl Validator for IsEmptyOr {
    fn validate(&self, value: Value) -> Result<Value, ValidationError> {
        if value.is_empty_input() {
            return Ok(Value::Null);
        }
        self.other.validate(value)
    }

    fn format(&self, value: Value) -> Value {
        self.other.format(value)
    }

    fn options(&self) -> Option<Vec<(String, String)>> {
        self.other.options()
    }

    fn is_multiple(&self) -> bool {
        self.other.is_multiple()
    }

    fn allows_empty(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_length_max() {
        let v = IsLength::new(3);
        assert!(v.validate(Value::from("abc")).is_ok());
        let err = v.validate(Value::from("abcd")).unwrap_err();
        assert_eq!(err.code, "max_length");
    }

    #[test]
    fn test_is_length_min() {
        let v = IsLength::new(10).min(2);
        assert!(v.validate(Value::from("ab")).is_ok());
        assert_eq!(v.validate(Value::from("a")).unwrap_err().code, "min_length");
        assert_eq!(v.validate(Value::Null).unwrap_err().code, "min_length");
    }

    #[test]
    fn test_is_length_passes_non_strings() {
        let v = IsLength::new(1);
        assert_eq!(v.validate(Value::Int(12345)).unwrap(), Value::Int(12345));
    }

    #[test]
    fn test_is_int_in_range_coerces_string() {
        let v = IsIntInRange::new(Some(18), Some(25));
        assert_eq!(v.validate(Value::from("20")).unwrap(), Value::Int(20));
        assert!(v.validate(Value::from("40")).is_err());
        assert!(v.validate(Value::from("abc")).is_err());
    }

    #[test]
    fn test_is_int_in_range_unbounded() {
        let v = IsIntInRange::new(None, None);
        assert_eq!(v.validate(Value::from("-7")).unwrap(), Value::Int(-7));
        assert_eq!(
            v.validate(Value::from("x")).unwrap_err().message,
            "Enter a whole number."
        );
    }

    #[test]
    fn test_is_int_in_range_custom_message() {
        let v = IsIntInRange::new(Some(18), Some(25))
            .with_message("your age is not suitable for me");
        assert_eq!(
            v.validate(Value::from("40")).unwrap_err().message,
            "your age is not suitable for me"
        );
    }

    #[test]
    fn test_is_float_in_range() {
        let v = IsFloatInRange::new(None, None);
        assert_eq!(v.validate(Value::from("2.5")).unwrap(), Value::Float(2.5));
        assert_eq!(v.validate(Value::Int(3)).unwrap(), Value::Float(3.0));
        assert!(v.validate(Value::from("nope")).is_err());
    }

    #[test]
    fn test_is_decimal_in_range() {
        let v = IsDecimalInRange::new(-10.0, 10.0);
        assert_eq!(v.validate(Value::from("1.25")).unwrap(), Value::Float(1.25));
        assert!(v.validate(Value::from("11")).is_err());
    }

    #[test]
    fn test_is_date_parse_and_format() {
        let v = IsDate::default();
        let parsed = v.validate(Value::from("2026-08-06")).unwrap();
        assert!(matches!(parsed, Value::Date(_)));
        assert_eq!(v.format(parsed), Value::from("2026-08-06"));
        assert_eq!(
            v.validate(Value::from("not-a-date")).unwrap_err().code,
            "invalid_date"
        );
    }

    #[test]
    fn test_is_time_short_form() {
        let v = IsTime::default();
        assert!(v.validate(Value::from("14:30")).is_ok());
        assert!(v.validate(Value::from("14:30:15")).is_ok());
        assert!(v.validate(Value::from("25:00")).is_err());
    }

    #[test]
    fn test_is_datetime_formats() {
        let v = IsDatetime::default();
        assert!(v.validate(Value::from("2026-08-06 10:30:00")).is_ok());
        assert!(v.validate(Value::from("2026-08-06T10:30:00")).is_ok());
        assert!(v.validate(Value::from("2026-08-06 10:30")).is_ok());
        assert!(v.validate(Value::from("junk")).is_err());
    }

    #[test]
    fn test_is_in_set_single() {
        let v = IsInSet::new(vec![("red", "Red"), ("blue", "Blue")]);
        assert_eq!(
            v.validate(Value::from("red")).unwrap(),
            Value::from("red")
        );
        assert_eq!(v.validate(Value::from("green")).unwrap_err().code, "not_in_set");
        assert_eq!(
            v.options(),
            Some(vec![
                ("red".to_string(), "Red".to_string()),
                ("blue".to_string(), "Blue".to_string())
            ])
        );
        assert!(!v.is_multiple());
    }

    #[test]
    fn test_is_in_set_multiple() {
        let v = IsInSet::new(vec![("a", "A"), ("b", "B")]).multiple(true);
        assert_eq!(
            v.validate(Value::List(vec![Value::from("a"), Value::from("b")]))
                .unwrap(),
            Value::List(vec![Value::from("a"), Value::from("b")])
        );
        // A scalar is accepted and wrapped.
        assert_eq!(
            v.validate(Value::from("a")).unwrap(),
            Value::List(vec![Value::from("a")])
        );
        assert!(v
            .validate(Value::List(vec![Value::from("zzz")]))
            .is_err());
        assert!(v.is_multiple());
    }

    #[test]
    fn test_is_not_empty() {
        let v = IsNotEmpty::new();
        assert!(v.validate(Value::from("x")).is_ok());
        assert!(v.validate(Value::from("")).is_err());
        assert!(v.validate(Value::Null).is_err());
        assert!(v.validate(Value::List(vec![])).is_err());
    }

    #[test]
    fn test_is_match() {
        let v = IsMatch::new(r"^[A-Z]{3}\d{3}$").unwrap();
        assert!(v.validate(Value::from("ABC123")).is_ok());
        assert!(v.validate(Value::from("abc")).is_err());
        assert!(IsMatch::new("[unclosed").is_none());
    }

    #[test]
    fn test_is_empty_or() {
        let v = IsEmptyOr::new(Arc::new(IsIntInRange::new(Some(0), Some(10))));
        assert_eq!(v.validate(Value::from("")).unwrap(), Value::Null);
        assert_eq!(v.validate(Value::Null).unwrap(), Value::Null);
        assert_eq!(v.validate(Value::from("5")).unwrap(), Value::Int(5));
        assert!(v.validate(Value::from("11")).is_err());
        assert!(v.allows_empty());
    }

    #[test]
    fn test_is_empty_or_delegates_options() {
        let v = IsEmptyOr::new(Arc::new(
            IsInSet::new(vec![("a", "A")]).multiple(true),
        ));
        assert!(v.options().is_some());
        assert!(v.is_multiple());
    }

    #[test]
    fn test_from_values() {
        let v = IsInSet::from_values(&["x", "y"]);
        assert_eq!(
            v.options(),
            Some(vec![
                ("x".to_string(), "x".to_string()),
                ("y".to_string(), "y".to_string())
            ])
        );
    }
}
