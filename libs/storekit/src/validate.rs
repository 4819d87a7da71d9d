//! Declarative payload validation.
//!
//! Every payload type lists its fields and their rules in a [`Validate`]
//! impl. All fields are checked on every call so the caller gets a complete
//! report in one round trip.
//!
//! ```
//! use storekit::validate::{Rule, Validate, ValidationErrors, Validator};
//!
//! struct Signup {
//!     email: String,
//!     password: String,
//! }
//!
//! impl Validate for Signup {
//!     fn validate(&self) -> Result<(), ValidationErrors> {
//!         Validator::new()
//!             .field("email", &self.email, &[Rule::Required, Rule::Email])
//!             .field("password", &self.password, &[Rule::Required, Rule::Password])
//!             .finish()
//!     }
//! }
//!
//! let err = Signup { email: "nope".into(), password: "short".into() }
//!     .validate()
//!     .unwrap_err();
//! assert_eq!(err.errors().len(), 2);
//! ```

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use uuid::Uuid;

#[allow(clippy::unwrap_used)]
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$").unwrap()
});

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    Min(u32),
    Max(u32),
    Email,
    Identifier,
    Password,
}

impl Rule {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::Min(_) => "min",
            Rule::Max(_) => "max",
            Rule::Email => "email",
            Rule::Identifier => "identifier",
            Rule::Password => "password",
        }
    }
}

/// What a rule sees of a field.
#[derive(Debug, Clone, Copy)]
pub enum FieldValue<'a> {
    Absent,
    Text(&'a str),
    Number(f64),
    Bool(bool),
    Uuid(Uuid),
    Timestamp(&'a DateTime<Utc>),
    Collection(usize),
}

impl FieldValue<'_> {
    fn is_zero(&self) -> bool {
        match self {
            FieldValue::Absent => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Number(n) => *n == 0.0,
            FieldValue::Bool(b) => !b,
            FieldValue::Uuid(u) => u.is_nil(),
            FieldValue::Timestamp(ts) => ts.timestamp() == 0 && ts.timestamp_subsec_nanos() == 0,
            FieldValue::Collection(len) => *len == 0,
        }
    }
}

/// Exposes a field to the rule engine.
pub trait Inspect {
    fn inspect(&self) -> FieldValue<'_>;
}

impl Inspect for str {
    fn inspect(&self) -> FieldValue<'_> {
        FieldValue::Text(self)
    }
}

impl Inspect for String {
    fn inspect(&self) -> FieldValue<'_> {
        FieldValue::Text(self)
    }
}

impl Inspect for Uuid {
    fn inspect(&self) -> FieldValue<'_> {
        FieldValue::Uuid(*self)
    }
}

impl Inspect for bool {
    fn inspect(&self) -> FieldValue<'_> {
        FieldValue::Bool(*self)
    }
}

impl Inspect for DateTime<Utc> {
    fn inspect(&self) -> FieldValue<'_> {
        FieldValue::Timestamp(self)
    }
}

impl Inspect for bytes::Bytes {
    fn inspect(&self) -> FieldValue<'_> {
        FieldValue::Collection(self.len())
    }
}

impl<T> Inspect for Vec<T> {
    fn inspect(&self) -> FieldValue<'_> {
        FieldValue::Collection(self.len())
    }
}

impl<T> Inspect for [T] {
    fn inspect(&self) -> FieldValue<'_> {
        FieldValue::Collection(self.len())
    }
}

impl<T: Inspect> Inspect for Option<T> {
    fn inspect(&self) -> FieldValue<'_> {
        self.as_ref().map_or(FieldValue::Absent, Inspect::inspect)
    }
}

macro_rules! inspect_number {
    ($($t:ty),*) => {
        $(
            impl Inspect for $t {
                #[allow(clippy::cast_precision_loss, clippy::cast_lossless)]
                fn inspect(&self) -> FieldValue<'_> {
                    FieldValue::Number(*self as f64)
                }
            }
        )*
    };
}

inspect_number!(i32, i64, u32, u64);

impl Inspect for f64 {
    fn inspect(&self) -> FieldValue<'_> {
        FieldValue::Number(*self)
    }
}

/// One violated rule on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub rule: &'static str,
    pub message: String,
}

/// Aggregated report of every violated rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Report with a single violation, for checks that live outside a schema.
    pub fn single(
        field: impl Into<String>,
        rule: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            errors: vec![FieldError {
                field: field.into(),
                rule,
                message: message.into(),
            }],
        }
    }

    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    #[must_use]
    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }

    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    #[must_use]
    pub fn for_field(&self, field: &str) -> Vec<&FieldError> {
        self.errors.iter().filter(|e| e.field == field).collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "validation failed: {}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

pub trait Validate {
    /// # Errors
    /// Returns every violated rule of the payload.
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Validate every element of a collection and aggregate the errors,
/// prefixing field names with the element index.
///
/// # Errors
/// Returns the union of every element's violations.
pub fn validate_all<T: Validate>(items: &[T]) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();
    for (index, item) in items.iter().enumerate() {
        if let Err(e) = item.validate() {
            errors.extend(e.errors.into_iter().map(|mut fe| {
                fe.field = format!("[{index}].{}", fe.field);
                fe
            }));
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors { errors })
    }
}

/// Collects rule violations field by field.
#[derive(Debug, Default)]
#[must_use]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check `value` against every rule. Rules other than `Required` are
    /// skipped when the value is zero, so an absent optional field is never
    /// reported as too short.
    pub fn field<V: Inspect + ?Sized>(mut self, name: &str, value: &V, rules: &[Rule]) -> Self {
        let value = value.inspect();
        let zero = value.is_zero();
        for rule in rules {
            let outcome = match rule {
                Rule::Required => zero.then(|| "is required".to_owned()),
                _ if zero => None,
                Rule::Min(n) => check_min(value, *n),
                Rule::Max(n) => check_max(value, *n),
                Rule::Email => check_email(value),
                Rule::Identifier => check_identifier(value),
                Rule::Password => check_password(value),
            };
            if let Some(message) = outcome {
                self.errors.push(FieldError {
                    field: name.to_owned(),
                    rule: rule.name(),
                    message,
                });
            }
        }
        self
    }

    /// Merge a nested payload's report under `prefix`.
    pub fn nested(mut self, prefix: &str, result: Result<(), ValidationErrors>) -> Self {
        if let Err(e) = result {
            self.errors.extend(e.errors.into_iter().map(|mut fe| {
                fe.field = format!("{prefix}.{}", fe.field);
                fe
            }));
        }
        self
    }

    /// # Errors
    /// Returns all collected violations, if any.
    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors {
                errors: self.errors,
            })
        }
    }
}

fn measure(value: FieldValue<'_>) -> Option<(f64, &'static str)> {
    #[allow(clippy::cast_precision_loss)]
    match value {
        FieldValue::Text(s) => Some((s.chars().count() as f64, "characters")),
        FieldValue::Collection(len) => Some((len as f64, "items")),
        FieldValue::Number(n) => Some((n, "")),
        _ => None,
    }
}

fn check_min(value: FieldValue<'_>, min: u32) -> Option<String> {
    let (actual, unit) = measure(value)?;
    (actual < f64::from(min)).then(|| {
        if unit.is_empty() {
            format!("must be at least {min}")
        } else {
            format!("must be at least {min} {unit}")
        }
    })
}

fn check_max(value: FieldValue<'_>, max: u32) -> Option<String> {
    let (actual, unit) = measure(value)?;
    (actual > f64::from(max)).then(|| {
        if unit.is_empty() {
            format!("must be at most {max}")
        } else {
            format!("must be at most {max} {unit}")
        }
    })
}

fn check_email(value: FieldValue<'_>) -> Option<String> {
    match value {
        FieldValue::Text(s) if EMAIL_RE.is_match(s.trim()) => None,
        _ => Some("must be a valid email address".to_owned()),
    }
}

fn check_identifier(value: FieldValue<'_>) -> Option<String> {
    let parsed = match value {
        FieldValue::Uuid(u) => Some(u),
        FieldValue::Text(s) => Uuid::parse_str(s.trim()).ok(),
        _ => None,
    };
    match parsed {
        Some(u) if !u.is_nil() => None,
        Some(_) => Some("must not be the nil identifier".to_owned()),
        None => Some("must be a valid identifier".to_owned()),
    }
}

fn check_password(value: FieldValue<'_>) -> Option<String> {
    let FieldValue::Text(s) = value else {
        return Some("must be text".to_owned());
    };
    let mut missing = Vec::new();
    if s.chars().count() < MIN_PASSWORD_LEN {
        missing.push(format!("at least {MIN_PASSWORD_LEN} characters"));
    }
    if !s.chars().any(char::is_uppercase) {
        missing.push("an uppercase letter".to_owned());
    }
    if !s.chars().any(char::is_lowercase) {
        missing.push("a lowercase letter".to_owned());
    }
    if !s.chars().any(|c| c.is_ascii_digit()) {
        missing.push("a digit".to_owned());
    }
    if !s.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace()) {
        missing.push("a symbol".to_owned());
    }
    (!missing.is_empty()).then(|| format!("must contain {}", missing.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Account {
        id: Uuid,
        email: String,
        nickname: Option<String>,
        tags: Vec<String>,
        age: i64,
    }

    impl Validate for Account {
        fn validate(&self) -> Result<(), ValidationErrors> {
            Validator::new()
                .field("id", &self.id, &[Rule::Required, Rule::Identifier])
                .field("email", &self.email, &[Rule::Required, Rule::Email])
                .field("nickname", &self.nickname, &[Rule::Min(3), Rule::Max(12)])
                .field("tags", &self.tags, &[Rule::Max(2)])
                .field("age", &self.age, &[Rule::Min(18)])
                .finish()
        }
    }

    fn valid_account() -> Account {
        Account {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_owned(),
            nickname: None,
            tags: vec![],
            age: 30,
        }
    }

    #[test]
    fn valid_payload_passes() {
        assert!(valid_account().validate().is_ok());
    }

    #[test]
    fn every_field_is_reported() {
        let account = Account {
            id: Uuid::nil(),
            email: "not-an-email".to_owned(),
            nickname: Some("ab".to_owned()),
            tags: vec!["a".into(), "b".into(), "c".into()],
            age: 12,
        };
        let err = account.validate().unwrap_err();
        let fields: Vec<&str> = err.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["id", "email", "nickname", "tags", "age"]);
        assert_eq!(err.for_field("id")[0].rule, "required");
        assert_eq!(err.for_field("age")[0].message, "must be at least 18");
    }

    #[test]
    fn optional_fields_skip_rules_when_absent() {
        let mut account = valid_account();
        account.nickname = Some(String::new());
        assert!(account.validate().is_ok());
    }

    #[test]
    fn required_rejects_blank_text() {
        let mut account = valid_account();
        account.email = "   ".to_owned();
        let err = account.validate().unwrap_err();
        assert_eq!(err.errors().len(), 1);
        assert_eq!(err.errors()[0].rule, "required");
    }

    #[test]
    fn email_shape() {
        for ok in ["a@x.com", "first.last+tag@sub.example.org"] {
            assert!(check_email(FieldValue::Text(ok)).is_none(), "{ok}");
        }
        for bad in ["a@x", "@x.com", "a x@y.com", "a@x.c"] {
            assert!(check_email(FieldValue::Text(bad)).is_some(), "{bad}");
        }
    }

    #[test]
    fn identifier_accepts_text_uuid() {
        let id = Uuid::new_v4().to_string();
        let err = Validator::new()
            .field("a", id.as_str(), &[Rule::Identifier])
            .field("b", "00000000-0000-0000-0000-000000000000", &[Rule::Identifier])
            .field("c", "xyz", &[Rule::Identifier])
            .finish()
            .unwrap_err();
        assert!(!err.has_field("a"));
        assert_eq!(err.for_field("b")[0].message, "must not be the nil identifier");
        assert_eq!(err.for_field("c")[0].message, "must be a valid identifier");
    }

    #[test]
    fn password_reports_all_missing_classes() {
        let err = Validator::new()
            .field("password", "abc", &[Rule::Password])
            .finish()
            .unwrap_err();
        let message = &err.errors()[0].message;
        assert!(message.contains("at least 8 characters"));
        assert!(message.contains("an uppercase letter"));
        assert!(message.contains("a digit"));
        assert!(message.contains("a symbol"));
        assert!(!message.contains("a lowercase letter"));

        assert!(check_password(FieldValue::Text("Str0ng!pass")).is_none());
    }

    #[test]
    fn collections_are_aggregated_by_index() {
        let mut bad = valid_account();
        bad.email = "nope".to_owned();
        let items = vec![valid_account(), bad];
        let err = validate_all(&items).unwrap_err();
        assert_eq!(err.errors().len(), 1);
        assert_eq!(err.errors()[0].field, "[1].email");
    }

    #[test]
    fn display_lists_every_violation() {
        let err = Validator::new()
            .field("a", "", &[Rule::Required])
            .field("b", "", &[Rule::Required])
            .finish()
            .unwrap_err();
        assert_eq!(err.to_string(), "validation failed: a: is required; b: is required");
    }
}
