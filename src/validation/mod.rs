//! Declarative input validation.
//!
//! Handlers describe the expected shape of untrusted input as a list of
//! field rules; validation either returns the normalized values or a
//! structured per-field violation map. Malformed input is an expected,
//! reportable outcome and never panics. Numeric fields coerce from the
//! string form query parameters arrive in, and defaults apply before
//! bounds are checked.

use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

/// Per-field violations accumulated during validation
#[derive(Debug, Default)]
pub struct ValidationErrors {
    field_errors: HashMap<String, String>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        // First violation per field wins; later rules are not evaluated anyway
        self.field_errors.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.field_errors.is_empty()
    }

    pub fn into_field_errors(self) -> HashMap<String, String> {
        self.field_errors
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.field_errors.get(field).map(String::as_str)
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut fields: Vec<&String> = self.field_errors.keys().collect();
        fields.sort();
        write!(f, "validation failed for fields: ")?;
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", field)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Text,
    Integer,
    Boolean,
    TextArray,
}

/// Known string formats, checked by character rules rather than regex
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Email,
    Slug,
    Uuid,
}

#[derive(Debug, Clone)]
pub struct Field {
    name: &'static str,
    kind: Kind,
    required: bool,
    default: Option<Value>,
    min: Option<i64>,
    max: Option<i64>,
    min_len: Option<usize>,
    max_len: Option<usize>,
    one_of: Option<&'static [&'static str]>,
    format: Option<Format>,
}

impl Field {
    fn new(name: &'static str, kind: Kind) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: None,
            min: None,
            max: None,
            min_len: None,
            max_len: None,
            one_of: None,
            format: None,
        }
    }

    pub fn text(name: &'static str) -> Self {
        Self::new(name, Kind::Text)
    }

    pub fn integer(name: &'static str) -> Self {
        Self::new(name, Kind::Integer)
    }

    pub fn boolean(name: &'static str) -> Self {
        Self::new(name, Kind::Boolean)
    }

    pub fn text_array(name: &'static str) -> Self {
        Self::new(name, Kind::TextArray)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn min(mut self, min: i64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: i64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn min_len(mut self, len: usize) -> Self {
        self.min_len = Some(len);
        self
    }

    pub fn max_len(mut self, len: usize) -> Self {
        self.max_len = Some(len);
        self
    }

    pub fn one_of(mut self, values: &'static [&'static str]) -> Self {
        self.one_of = Some(values);
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }
}

#[derive(Debug, Default)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Validate an input object against the schema.
    ///
    /// Unknown input fields are ignored; only declared fields reach the
    /// normalized output.
    pub fn validate(&self, input: &Value) -> Result<Valid, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let Some(object) = input.as_object() else {
            errors.add("body", "expected a JSON object");
            return Err(errors);
        };

        let mut normalized = Map::new();

        for field in &self.fields {
            let raw = object.get(field.name).filter(|v| !v.is_null()).cloned();

            // Defaults apply before any bounds check
            let raw = match raw.or_else(|| field.default.clone()) {
                Some(value) => value,
                None => {
                    if field.required {
                        errors.add(field.name, "is required");
                    }
                    continue;
                }
            };

            match normalize(field, &raw) {
                Ok(value) => {
                    normalized.insert(field.name.to_string(), value);
                }
                Err(message) => errors.add(field.name, message),
            }
        }

        if errors.is_empty() {
            Ok(Valid(normalized))
        } else {
            Err(errors)
        }
    }
}

fn normalize(field: &Field, raw: &Value) -> Result<Value, String> {
    match field.kind {
        Kind::Integer => {
            // Query parameters arrive as strings; coerce before bounds
            let parsed = match raw {
                Value::Number(n) => n.as_i64().ok_or_else(|| "must be an integer".to_string())?,
                Value::String(s) => s.trim().parse::<i64>().map_err(|_| "must be an integer".to_string())?,
                _ => return Err("must be an integer".to_string()),
            };
            if let Some(min) = field.min {
                if parsed < min {
                    return Err(format!("must be at least {}", min));
                }
            }
            if let Some(max) = field.max {
                if parsed > max {
                    return Err(format!("must be at most {}", max));
                }
            }
            Ok(Value::from(parsed))
        }
        Kind::Boolean => match raw {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            Value::String(s) => match s.trim() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err("must be a boolean".to_string()),
            },
            _ => Err("must be a boolean".to_string()),
        },
        Kind::Text => {
            let Value::String(s) = raw else {
                return Err("must be a string".to_string());
            };
            check_text(field, s)?;
            Ok(Value::String(s.clone()))
        }
        Kind::TextArray => {
            let Value::Array(items) = raw else {
                return Err("must be an array of strings".to_string());
            };
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                let Value::String(s) = item else {
                    return Err("must be an array of strings".to_string());
                };
                check_text(field, s)?;
                out.push(Value::String(s.clone()));
            }
            Ok(Value::Array(out))
        }
    }
}

fn check_text(field: &Field, s: &str) -> Result<(), String> {
    if let Some(min_len) = field.min_len {
        if s.chars().count() < min_len {
            return Err(format!("must be at least {} characters", min_len));
        }
    }
    if let Some(max_len) = field.max_len {
        if s.chars().count() > max_len {
            return Err(format!("must be at most {} characters", max_len));
        }
    }
    if let Some(allowed) = field.one_of {
        if !allowed.contains(&s) {
            return Err(format!("must be one of: {}", allowed.join(", ")));
        }
    }
    if let Some(format) = field.format {
        check_format(format, s)?;
    }
    Ok(())
}

fn check_format(format: Format, s: &str) -> Result<(), String> {
    match format {
        Format::Uuid => {
            Uuid::parse_str(s).map_err(|_| "must be a valid UUID".to_string())?;
            Ok(())
        }
        Format::Email => {
            let mut parts = s.split('@');
            let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
                return Err("must be a valid email address".to_string());
            };
            if local.is_empty()
                || domain.is_empty()
                || !domain.contains('.')
                || domain.starts_with('.')
                || domain.ends_with('.')
                || s.chars().any(char::is_whitespace)
            {
                return Err("must be a valid email address".to_string());
            }
            Ok(())
        }
        Format::Slug => {
            let valid = !s.is_empty()
                && s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
                && !s.starts_with('-');
            if valid {
                Ok(())
            } else {
                Err("must contain only lowercase letters, digits, hyphens, and underscores".to_string())
            }
        }
    }
}

/// Normalized, validated values. Accessors are panic-free; for fields the
/// schema marked required (or defaulted) the fallback values are never
/// observed.
#[derive(Debug)]
pub struct Valid(Map<String, Value>);

impl Valid {
    pub fn str(&self, name: &str) -> &str {
        self.0.get(name).and_then(Value::as_str).unwrap_or_default()
    }

    pub fn opt_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn i64(&self, name: &str) -> i64 {
        self.0.get(name).and_then(Value::as_i64).unwrap_or_default()
    }

    pub fn opt_i64(&self, name: &str) -> Option<i64> {
        self.0.get(name).and_then(Value::as_i64)
    }

    pub fn bool(&self, name: &str) -> bool {
        self.0.get(name).and_then(Value::as_bool).unwrap_or_default()
    }

    pub fn opt_bool(&self, name: &str) -> Option<bool> {
        self.0.get(name).and_then(Value::as_bool)
    }

    pub fn str_list(&self, name: &str) -> Vec<String> {
        self.0
            .get(name)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Convert flat string query parameters into an object the schema can
/// validate (coercion happens per-field during validation).
pub fn params_to_value(params: &HashMap<String, String>) -> Value {
    let mut map = Map::new();
    for (k, v) in params {
        map.insert(k.clone(), Value::String(v.clone()));
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integers_coerce_from_query_strings() {
        let schema = Schema::new().field(Field::integer("page").min(1).default(1));
        let valid = schema.validate(&json!({ "page": "3" })).unwrap();
        assert_eq!(valid.i64("page"), 3);
    }

    #[test]
    fn defaults_apply_before_bounds() {
        let schema = Schema::new().field(Field::integer("limit").min(1).max(100).default(20));
        let valid = schema.validate(&json!({})).unwrap();
        assert_eq!(valid.i64("limit"), 20);
    }

    #[test]
    fn negative_limit_is_rejected_naming_the_field() {
        let schema = Schema::new().field(Field::integer("limit").min(1).default(20));
        let errors = schema.validate(&json!({ "limit": -5 })).unwrap_err();
        assert_eq!(errors.get("limit"), Some("must be at least 1"));
    }

    #[test]
    fn required_fields_must_be_present() {
        let schema = Schema::new().field(Field::text("username").required());
        let errors = schema.validate(&json!({})).unwrap_err();
        assert_eq!(errors.get("username"), Some("is required"));

        // Explicit null counts as absent
        let errors = schema.validate(&json!({ "username": null })).unwrap_err();
        assert_eq!(errors.get("username"), Some("is required"));
    }

    #[test]
    fn enum_fields_match_a_closed_set() {
        let schema = Schema::new().field(Field::text("kind").one_of(&["anime", "manga"]).required());
        assert!(schema.validate(&json!({ "kind": "anime" })).is_ok());
        let errors = schema.validate(&json!({ "kind": "podcast" })).unwrap_err();
        assert!(errors.get("kind").unwrap().contains("anime"));
    }

    #[test]
    fn string_length_is_bounded() {
        let schema = Schema::new().field(Field::text("name").min_len(2).max_len(5).required());
        assert!(schema.validate(&json!({ "name": "ok" })).is_ok());
        assert!(schema.validate(&json!({ "name": "x" })).is_err());
        assert!(schema.validate(&json!({ "name": "toolong" })).is_err());
    }

    #[test]
    fn formats_are_checked() {
        let schema = Schema::new()
            .field(Field::text("email").format(Format::Email))
            .field(Field::text("slug").format(Format::Slug))
            .field(Field::text("id").format(Format::Uuid));

        assert!(schema.validate(&json!({ "email": "a@b.io" })).is_ok());
        assert!(schema.validate(&json!({ "email": "nope" })).is_err());
        assert!(schema.validate(&json!({ "email": "a@b" })).is_err());

        assert!(schema.validate(&json!({ "slug": "slice-of-life" })).is_ok());
        assert!(schema.validate(&json!({ "slug": "Bad Slug" })).is_err());

        assert!(schema
            .validate(&json!({ "id": "11111111-1111-1111-1111-111111111111" }))
            .is_ok());
        assert!(schema.validate(&json!({ "id": "not-a-uuid" })).is_err());
    }

    #[test]
    fn text_arrays_validate_each_element() {
        let schema = Schema::new().field(Field::text_array("roles").one_of(&["user", "admin"]));
        let valid = schema.validate(&json!({ "roles": ["user", "admin"] })).unwrap();
        assert_eq!(valid.str_list("roles"), vec!["user", "admin"]);
        assert!(schema.validate(&json!({ "roles": ["root"] })).is_err());
        assert!(schema.validate(&json!({ "roles": "user" })).is_err());
    }

    #[test]
    fn non_object_input_is_a_reported_outcome() {
        let schema = Schema::new().field(Field::text("name"));
        let errors = schema.validate(&json!("just a string")).unwrap_err();
        assert!(errors.get("body").is_some());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let schema = Schema::new().field(Field::text("name"));
        let valid = schema.validate(&json!({ "name": "x", "extra": 42 })).unwrap();
        assert_eq!(valid.opt_str("extra"), None);
    }
}
