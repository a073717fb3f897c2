//! Raw loan application payload as submitted by callers

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// Loosely-typed field mapping from a prediction request.
///
/// Field names are part of the external contract; values are whatever JSON
/// primitive the caller sent. Typed access goes through the coercion helpers
/// below, which report failures against the field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawApplicationInput {
    fields: Map<String, Value>,
}

impl RawApplicationInput {
    /// Parse a request body. The body must be a JSON object.
    pub fn from_slice(body: &[u8]) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| ValidationError::InvalidBody(e.to_string()))?;
        Self::try_from(value)
    }

    /// Set a field, replacing any previous value
    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        self.fields.insert(name.to_string(), value.into());
    }

    /// Remove a field, returning its previous value
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// A field counts as present when it exists and is not `null`.
    pub fn contains(&self, name: &str) -> bool {
        matches!(self.fields.get(name), Some(v) if !v.is_null())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn require(&self, name: &str) -> Result<&Value, ValidationError> {
        self.get(name).ok_or_else(|| ValidationError::missing(name))
    }

    /// Read an integer. Floats truncate toward zero, booleans count as 0/1,
    /// strings must hold an integer literal.
    pub fn integer(&self, name: &str) -> Result<i64, ValidationError> {
        match self.require(name)? {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(i)
                } else {
                    let f = n
                        .as_f64()
                        .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                        .ok_or_else(|| ValidationError::invalid(name, "integer out of range"))?;
                    Ok(f.trunc() as i64)
                }
            }
            Value::Bool(b) => Ok(i64::from(*b)),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| ValidationError::invalid(name, format!("expected an integer, got {:?}", s))),
            other => Err(ValidationError::invalid(
                name,
                format!("expected an integer, got {}", json_type(other)),
            )),
        }
    }

    /// Read a finite decimal from a JSON number or numeric string
    pub fn decimal(&self, name: &str) -> Result<f64, ValidationError> {
        let value = match self.require(name)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            other => {
                return Err(ValidationError::invalid(
                    name,
                    format!("expected a number, got {}", json_type(other)),
                ))
            }
        };
        value
            .filter(|v| v.is_finite())
            .ok_or_else(|| ValidationError::invalid(name, "expected a finite number"))
    }

    /// Read a non-empty string
    pub fn text(&self, name: &str) -> Result<&str, ValidationError> {
        match self.require(name)? {
            Value::String(s) => Ok(s.as_str()),
            other => Err(ValidationError::invalid(
                name,
                format!("expected a string, got {}", json_type(other)),
            )),
        }
    }

    /// Read a truthy value as 0/1.
    ///
    /// Accepts booleans, numbers (zero is false) and the strings
    /// true/false, yes/no, 1/0.
    pub fn flag(&self, name: &str) -> Result<bool, ValidationError> {
        match self.require(name)? {
            Value::Bool(b) => Ok(*b),
            Value::Number(n) => Ok(n.as_f64().map(|f| f != 0.0).unwrap_or(false)),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(true),
                "false" | "no" | "0" => Ok(false),
                _ => Err(ValidationError::invalid(
                    name,
                    format!("expected a boolean, got {:?}", s),
                )),
            },
            other => Err(ValidationError::invalid(
                name,
                format!("expected a boolean, got {}", json_type(other)),
            )),
        }
    }

    /// Read a strict binary indicator (0, 1, false or true)
    pub fn bit(&self, name: &str) -> Result<bool, ValidationError> {
        match self.require(name)? {
            Value::Bool(b) => Ok(*b),
            Value::Number(n) => match n.as_f64() {
                Some(v) if v == 0.0 => Ok(false),
                Some(v) if v == 1.0 => Ok(true),
                _ => Err(ValidationError::invalid(name, "one-hot column must be 0 or 1")),
            },
            _ => Err(ValidationError::invalid(name, "one-hot column must be 0 or 1")),
        }
    }
}

impl TryFrom<Value> for RawApplicationInput {
    type Error = ValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(ValidationError::InvalidBody(format!(
                "expected a JSON object, got {}",
                json_type(&other)
            ))),
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
