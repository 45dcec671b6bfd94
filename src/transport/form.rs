//! Multipart form fields.

use serde::Serialize;
use serde_json::Value;

use crate::errors::{MailgunError, MailgunResult};

/// Ordered multipart form fields. A name may repeat.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    fields: Vec<(String, String)>,
}

impl FormData {
    /// Creates an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a text field.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Builds a form from any value that serializes to a JSON object.
    ///
    /// Null and empty-string fields are left out, arrays become repeated
    /// fields, scalars are sent as text and nested objects as JSON text.
    pub fn from_serializable<T: Serialize + ?Sized>(data: &T) -> MailgunResult<Self> {
        let value = serde_json::to_value(data)?;

        let object = match value {
            Value::Object(object) => object,
            other => {
                return Err(MailgunError::Serialization {
                    message: format!("Form data must be an object, got {}", other),
                })
            }
        };

        let mut form = FormData::new();
        for (name, value) in object {
            match value {
                Value::Array(items) => {
                    for item in items {
                        if let Some(text) = field_text(item) {
                            form = form.text(name.clone(), text);
                        }
                    }
                }
                other => {
                    if let Some(text) = field_text(other) {
                        form = form.text(name, text);
                    }
                }
            }
        }

        Ok(form)
    }

    /// Returns all fields in insertion order.
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Returns every value for a field name.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    /// Returns the first value for a field name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).into_iter().next()
    }

    /// Returns true if the form has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Converts into a reqwest multipart form.
    pub fn to_multipart(&self) -> reqwest::multipart::Form {
        self.fields
            .iter()
            .fold(reqwest::multipart::Form::new(), |form, (name, value)| {
                form.text(name.clone(), value.clone())
            })
    }
}

fn field_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        other => Some(other.to_string()),
    }
}
