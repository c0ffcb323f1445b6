//! Resolved fields and metadata maps.
//!
//! A [`Field`] is the result of looking up one key for one page. A
//! [`MetadataMap`] holds the override values (literal or computed) that take
//! precedence over page and site content.

use std::{collections::HashMap, fmt, sync::Arc};

use serde_json::{Map, Value};

use crate::{
    content::Page,
    error::{CoreError, Result},
};

/// Whether a value counts as empty: null, blank strings, empty lists and maps.
///
/// `false` and `0` are values, not emptiness.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Render a scalar value as text. Lists, maps and null have no scalar form.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// A resolved metadata value for a single key.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    model: String,
    key: String,
    value: Option<Value>,
}

impl Field {
    /// Create a field resolved against the model with the given id.
    pub fn new(model: impl Into<String>, key: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            model: model.into(),
            key: key.into(),
            value,
        }
    }

    /// Create a field without a value.
    pub fn empty(model: impl Into<String>, key: impl Into<String>) -> Self {
        Self::new(model, key, None)
    }

    /// Id of the page (or site) this field was resolved against.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The lowercase key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The raw value, if any.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Consume the field, returning its raw value.
    pub fn into_value(self) -> Option<Value> {
        self.value
    }

    /// Whether a value was set at all, even an empty one.
    pub fn exists(&self) -> bool {
        self.value.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.value.as_ref().is_none_or(is_empty_value)
    }

    pub fn is_not_empty(&self) -> bool {
        !self.is_empty()
    }

    /// Return this field if it has content, otherwise a field holding `fallback`.
    #[must_use]
    pub fn or(self, fallback: impl Into<Value>) -> Self {
        if self.is_not_empty() {
            return self;
        }
        Self {
            value: Some(fallback.into()),
            ..self
        }
    }

    /// The value as a string slice, when it is a string.
    pub fn as_str(&self) -> Option<&str> {
        self.value.as_ref().and_then(Value::as_str)
    }

    /// The value as a map, when it is one.
    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        self.value.as_ref().and_then(Value::as_object)
    }

    /// Scalar value rendered as text; `None` when empty or not a scalar.
    pub fn to_text(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        self.value.as_ref().and_then(scalar_to_string)
    }

    /// Numeric value, parsing numeric strings.
    pub fn to_f64(&self) -> Option<f64> {
        match self.value.as_ref()? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value.as_ref().and_then(scalar_to_string) {
            Some(text) => f.write_str(&text),
            None => Ok(()),
        }
    }
}

/// What a metadata producer returns.
#[derive(Debug, Clone, PartialEq)]
pub enum Produced {
    /// A ready field, passed through unchanged.
    Field(Field),
    /// A raw value, wrapped into a field for the requested key.
    Value(Value),
}

impl From<Field> for Produced {
    fn from(field: Field) -> Self {
        Self::Field(field)
    }
}

impl From<Value> for Produced {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<String> for Produced {
    fn from(value: String) -> Self {
        Self::Value(Value::String(value))
    }
}

impl From<&str> for Produced {
    fn from(value: &str) -> Self {
        Self::Value(Value::String(value.to_string()))
    }
}

/// Producer invoked with the page a key is resolved for.
pub type MetaProducer = Arc<dyn Fn(&Page) -> Produced + Send + Sync>;

/// A metadata override value.
#[derive(Clone)]
pub enum MetaValue {
    /// A literal value: scalar, list, nested map or null.
    Literal(Value),
    /// Computed from the page at lookup time.
    Producer(MetaProducer),
}

impl MetaValue {
    /// Wrap a producer closure.
    pub fn producer<F>(f: F) -> Self
    where
        F: Fn(&Page) -> Produced + Send + Sync + 'static,
    {
        Self::Producer(Arc::new(f))
    }
}

impl fmt::Debug for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

impl From<Value> for MetaValue {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        Self::Literal(Value::String(value.to_string()))
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        Self::Literal(Value::String(value))
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        Self::Literal(Value::Bool(value))
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        Self::Literal(Value::from(value))
    }
}

/// Case-insensitive map of metadata overrides.
#[derive(Debug, Clone, Default)]
pub struct MetadataMap {
    entries: HashMap<String, MetaValue>,
}

impl MetadataMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from a configuration value, which must be a table.
    ///
    /// `name` is the option name used in the error message.
    pub fn from_value(value: &Value, name: &str) -> Result<Self> {
        let Some(object) = value.as_object() else {
            return Err(CoreError::config(format!("Option `{name}` must be a table")));
        };

        let mut map = Self::new();
        for (key, value) in object {
            map.insert(key, value.clone());
        }
        Ok(map)
    }

    /// Insert a value; the key is stored lowercased.
    pub fn insert(&mut self, key: &str, value: impl Into<MetaValue>) {
        self.entries.insert(key.to_lowercase(), value.into());
    }

    /// Builder-style [`MetadataMap::insert`].
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<MetaValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries.get(&key.to_lowercase())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&key.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
