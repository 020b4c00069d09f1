//! Built-in declarative schemas.
//!
//! A small rule builder covering what request validation usually needs:
//! types, required keys, bounds, enumerations and defaults. Values are
//! converted where the intent is unambiguous (`"42"` → `42`, `"true"` →
//! `true`), which matters for query strings and headers where everything
//! arrives as text.
//!
//! ```rust
//! use rested::schema;
//!
//! let list_users = schema::object()
//!     .key("page", schema::integer().min(1).default(1))
//!     .key("sort", schema::string().valid(["name", "created"]))
//!     .key("tag", schema::array().items(schema::string()).single());
//! # let _ = list_users;
//! ```
//!
//! Messages name the offending value by its path:
//!
//! | Failure | Message |
//! |---|---|
//! | missing | `"body.name" is required` |
//! | wrong type | `"body.name" must be a string` |
//! | too long | `"body.name" length must be less than or equal to 200 characters long` |
//! | too small | `"query.page" must be greater than or equal to 1` |
//! | not listed | `"query.sort" must be one of [name, created]` |
//! | unknown key | `"body.admin" is not allowed` |
//!
//! Objects reject keys they do not declare unless [`Rule::unknown`] is set.
//! An object with no declared keys accepts any keys.

use serde_json::{Map, Number, Value};

use crate::validate::{Schema, ValidateFuture, ValidationError};

#[derive(Clone, Copy, Debug, PartialEq)]
enum Kind {
    Any,
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
}

/// A validation rule for one value. Build with the functions in this module.
#[derive(Clone, Debug)]
pub struct Rule {
    kind: Kind,
    required: bool,
    default: Option<Value>,
    min: Option<f64>,
    max: Option<f64>,
    valid: Vec<Value>,
    keys: Option<Vec<(String, Rule)>>,
    unknown: bool,
    items: Option<Box<Rule>>,
    single: bool,
    convert: bool,
}

fn rule(kind: Kind) -> Rule {
    Rule {
        kind,
        required: false,
        default: None,
        min: None,
        max: None,
        valid: Vec::new(),
        keys: None,
        unknown: false,
        items: None,
        single: false,
        convert: true,
    }
}

/// Any value.
pub fn any() -> Rule { rule(Kind::Any) }
/// A string. `min`/`max` bound its length in characters.
pub fn string() -> Rule { rule(Kind::String) }
/// A number; numeric strings are converted.
pub fn number() -> Rule { rule(Kind::Number) }
/// A whole number; numeric strings are converted.
pub fn integer() -> Rule { rule(Kind::Integer) }
/// `true` or `false`; the strings `"true"` / `"false"` are converted.
pub fn boolean() -> Rule { rule(Kind::Boolean) }
/// An object. Declare its keys with [`Rule::key`].
pub fn object() -> Rule { rule(Kind::Object) }
/// An array. `min`/`max` bound its item count.
pub fn array() -> Rule { rule(Kind::Array) }

impl Rule {
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Value used when the key is missing. Defaults are validated like input.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn min(mut self, limit: impl Into<f64>) -> Self {
        self.min = Some(limit.into());
        self
    }

    pub fn max(mut self, limit: impl Into<f64>) -> Self {
        self.max = Some(limit.into());
        self
    }

    /// Restricts the value to the listed ones.
    pub fn valid<V: Into<Value>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.valid = values.into_iter().map(Into::into).collect();
        self
    }

    /// Declares an object key.
    pub fn key(mut self, name: &str, rule: Rule) -> Self {
        self.keys.get_or_insert_with(Vec::new).push((name.to_owned(), rule));
        self
    }

    /// Whether an object accepts keys it does not declare.
    pub fn unknown(mut self, allow: bool) -> Self {
        self.unknown = allow;
        self
    }

    /// Rule applied to every array item.
    pub fn items(mut self, rule: Rule) -> Self {
        self.items = Some(Box::new(rule));
        self
    }

    /// Lets an array accept a lone value as a one-item array, e.g. `?tag=a`.
    pub fn single(mut self) -> Self {
        self.single = true;
        self
    }

    /// Disables type conversion: `"42"` is no longer a number.
    pub fn strict(mut self) -> Self {
        self.convert = false;
        self
    }

    /// Validates `value` (`None` when absent) and returns the normalized value.
    fn check(&self, value: Option<Value>, path: &str) -> Result<Option<Value>, ValidationError> {
        let value = match value.or_else(|| self.default.clone()) {
            Some(value) => value,
            None if self.required => return Err(fail(path, "is required")),
            None => return Ok(None),
        };

        let value = self.coerce(value, path)?;

        if !self.valid.is_empty() && !self.valid.contains(&value) {
            let listed: Vec<String> = self.valid.iter().map(display).collect();
            return Err(fail(path, &format!("must be one of [{}]", listed.join(", "))));
        }

        self.check_bounds(&value, path)?;

        match value {
            Value::Object(map) if self.kind == Kind::Object => self.check_keys(map, path).map(Some),
            Value::Array(items) if self.kind == Kind::Array => self.check_items(items, path).map(Some),
            value => Ok(Some(value)),
        }
    }

    fn coerce(&self, value: Value, path: &str) -> Result<Value, ValidationError> {
        match (self.kind, value) {
            (Kind::Any, value) => Ok(value),
            (Kind::String, value @ Value::String(_)) => Ok(value),
            (Kind::String, _) => Err(fail(path, "must be a string")),

            (Kind::Number | Kind::Integer, Value::String(text)) if self.convert => {
                let number = parse_number(&text).ok_or_else(|| fail(path, "must be a number"))?;
                self.coerce(Value::Number(number), path)
            }
            (Kind::Number, value @ Value::Number(_)) => Ok(value),
            (Kind::Integer, Value::Number(n)) => {
                if n.is_i64() || n.is_u64() {
                    Ok(Value::Number(n))
                } else {
                    match n.as_f64() {
                        // 3.0 is a whole number: keep it, as an integer.
                        Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => {
                            Ok(Value::Number(Number::from(f as i64)))
                        }
                        _ => Err(fail(path, "must be an integer")),
                    }
                }
            }
            (Kind::Number | Kind::Integer, _) => Err(fail(path, "must be a number")),

            (Kind::Boolean, value @ Value::Bool(_)) => Ok(value),
            (Kind::Boolean, Value::String(text)) if self.convert => {
                match text.to_ascii_lowercase().as_str() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    _ => Err(fail(path, "must be a boolean")),
                }
            }
            (Kind::Boolean, _) => Err(fail(path, "must be a boolean")),

            (Kind::Object, value @ Value::Object(_)) => Ok(value),
            (Kind::Object, _) => Err(fail(path, "must be of type object")),

            (Kind::Array, value @ Value::Array(_)) => Ok(value),
            (Kind::Array, value) if self.single => Ok(Value::Array(vec![value])),
            (Kind::Array, _) => Err(fail(path, "must be an array")),
        }
    }

    fn check_bounds(&self, value: &Value, path: &str) -> Result<(), ValidationError> {
        let (measure, at_least, at_most) = match (self.kind, value) {
            (Kind::String, Value::String(s)) => (
                s.chars().count() as f64,
                "length must be at least {} characters long",
                "length must be less than or equal to {} characters long",
            ),
            (Kind::Number | Kind::Integer, Value::Number(n)) => (
                n.as_f64().unwrap_or_default(),
                "must be greater than or equal to {}",
                "must be less than or equal to {}",
            ),
            (Kind::Array, Value::Array(items)) => (
                items.len() as f64,
                "must contain at least {} items",
                "must contain less than or equal to {} items",
            ),
            _ => return Ok(()),
        };

        if let Some(min) = self.min.filter(|min| measure < *min) {
            return Err(fail(path, &at_least.replace("{}", &min.to_string())));
        }
        if let Some(max) = self.max.filter(|max| measure > *max) {
            return Err(fail(path, &at_most.replace("{}", &max.to_string())));
        }
        Ok(())
    }

    fn check_keys(&self, mut map: Map<String, Value>, path: &str) -> Result<Value, ValidationError> {
        let Some(keys) = &self.keys else {
            return Ok(Value::Object(map));
        };

        let mut out = Map::new();
        for (name, rule) in keys {
            if let Some(value) = rule.check(map.remove(name), &join(path, name))? {
                out.insert(name.clone(), value);
            }
        }

        for (name, value) in map {
            if !self.unknown {
                return Err(fail(&join(path, &name), "is not allowed"));
            }
            out.insert(name, value);
        }
        Ok(Value::Object(out))
    }

    fn check_items(&self, items: Vec<Value>, path: &str) -> Result<Value, ValidationError> {
        let Some(rule) = &self.items else {
            return Ok(Value::Array(items));
        };

        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            let item_path = format!("{}[{i}]", label(path));
            // Arrays cannot hold "absent"; a missing item is JSON null.
            out.push(rule.check(Some(item), &item_path)?.unwrap_or(Value::Null));
        }
        Ok(Value::Array(out))
    }
}

/// A request part that is `null` (no body) counts as absent.
impl Schema for Rule {
    fn validate<'a>(&'a self, value: Value, path: &'a str) -> ValidateFuture<'a> {
        let value = (!value.is_null()).then_some(value);
        let result = self.check(value, path).map(Option::unwrap_or_default);
        Box::pin(std::future::ready(result))
    }
}

fn parse_number(text: &str) -> Option<Number> {
    let text = text.trim();
    if let Ok(n) = text.parse::<i64>() {
        return Some(Number::from(n));
    }
    text.parse::<f64>().ok().and_then(Number::from_f64)
}

fn label(path: &str) -> &str {
    if path.is_empty() { "value" } else { path }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() { key.to_owned() } else { format!("{path}.{key}") }
}

fn fail(path: &str, reason: &str) -> ValidationError {
    ValidationError::new(path, format!("\"{}\" {reason}", label(path)))
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn run(rule: &Rule, value: Value) -> Result<Value, String> {
        rule.validate(value, "body").await.map_err(|e| e.message)
    }

    #[tokio::test]
    async fn test_should_require_string_with_max_length() {
        let rule = object().key("foo", string().max(200).required());

        assert_eq!(run(&rule, json!({ "foo": "bar" })).await, Ok(json!({ "foo": "bar" })));
        assert_eq!(run(&rule, json!({})).await, Err("\"body.foo\" is required".to_owned()));
        assert_eq!(run(&rule, json!({ "foo": 1 })).await, Err("\"body.foo\" must be a string".to_owned()));
        assert_eq!(
            run(&rule, json!({ "foo": "x".repeat(201) })).await,
            Err("\"body.foo\" length must be less than or equal to 200 characters long".to_owned())
        );
    }

    #[tokio::test]
    async fn test_should_reject_undeclared_keys_unless_allowed() {
        let strict = object().key("foo", string());
        assert_eq!(run(&strict, json!({ "bar": "foo" })).await, Err("\"body.bar\" is not allowed".to_owned()));

        let open = strict.clone().unknown(true);
        assert_eq!(run(&open, json!({ "bar": "foo" })).await, Ok(json!({ "bar": "foo" })));

        assert_eq!(run(&object(), json!({ "x": 1 })).await, Ok(json!({ "x": 1 })));
    }

    #[tokio::test]
    async fn test_should_convert_numbers_and_booleans() {
        let rule = object()
            .key("page", integer().min(1))
            .key("ratio", number())
            .key("active", boolean());

        assert_eq!(
            run(&rule, json!({ "page": "2", "ratio": "0.5", "active": "TRUE" })).await,
            Ok(json!({ "page": 2, "ratio": 0.5, "active": true }))
        );
        assert_eq!(run(&rule, json!({ "page": "0" })).await, Err("\"body.page\" must be greater than or equal to 1".to_owned()));
        assert_eq!(run(&rule, json!({ "page": 1.5 })).await, Err("\"body.page\" must be an integer".to_owned()));
        assert_eq!(run(&rule, json!({ "page": 3.0 })).await, Ok(json!({ "page": 3 })));
        assert_eq!(run(&rule, json!({ "active": "yes" })).await, Err("\"body.active\" must be a boolean".to_owned()));
    }

    #[tokio::test]
    async fn test_should_not_convert_in_strict_mode() {
        let rule = object().key("page", integer().strict());
        assert_eq!(run(&rule, json!({ "page": "2" })).await, Err("\"body.page\" must be a number".to_owned()));
    }

    #[tokio::test]
    async fn test_should_fill_defaults_and_check_them() {
        let rule = object().key("page", integer().default("1")).key("limit", integer().default(20).max(10));

        assert_eq!(run(&rule, json!({ "limit": 5 })).await, Ok(json!({ "page": 1, "limit": 5 })));
        assert_eq!(
            run(&rule, json!({})).await,
            Err("\"body.limit\" must be less than or equal to 10".to_owned())
        );
    }

    #[tokio::test]
    async fn test_should_restrict_to_valid_values() {
        let rule = object().key("sort", string().valid(["name", "created"]));

        assert_eq!(run(&rule, json!({ "sort": "name" })).await, Ok(json!({ "sort": "name" })));
        assert_eq!(
            run(&rule, json!({ "sort": "age" })).await,
            Err("\"body.sort\" must be one of [name, created]".to_owned())
        );
    }

    #[tokio::test]
    async fn test_should_validate_array_items_and_single_values() {
        let rule = object().key("tag", array().items(string().max(3)).single().max(2));

        assert_eq!(run(&rule, json!({ "tag": "a" })).await, Ok(json!({ "tag": ["a"] })));
        assert_eq!(run(&rule, json!({ "tag": ["a", "b"] })).await, Ok(json!({ "tag": ["a", "b"] })));
        assert_eq!(
            run(&rule, json!({ "tag": ["a", "long"] })).await,
            Err("\"body.tag[1]\" length must be less than or equal to 3 characters long".to_owned())
        );
        assert_eq!(
            run(&rule, json!({ "tag": ["a", "b", "c"] })).await,
            Err("\"body.tag\" must contain less than or equal to 2 items".to_owned())
        );
    }

    #[tokio::test]
    async fn test_should_treat_null_part_as_absent() {
        assert_eq!(run(&object().key("foo", string().required()), Value::Null).await, Ok(Value::Null));
        assert_eq!(
            run(&object().required(), Value::Null).await,
            Err("\"body\" is required".to_owned())
        );
        assert_eq!(run(&object(), json!("text")).await, Err("\"body\" must be of type object".to_owned()));
    }

    #[tokio::test]
    async fn test_should_label_unnamed_values() {
        let err = string().validate(json!(1), "").await.unwrap_err();
        assert_eq!(err.message, "\"value\" must be a string");
    }
}
