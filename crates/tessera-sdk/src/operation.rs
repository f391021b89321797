//! Wire operations exchanged between replicas.
//!
//! An operation carries one character in its `{ value, idArray }` form. The
//! encoding is JSON: `{"kind":"insert","char":{...}}`.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tessera_core::Char;
use tessera_doc::DocError;

/// A single replicated edit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "char", rename_all = "camelCase")]
pub enum Operation {
    Insert(Char),
    Delete(Char),
}

impl Operation {
    /// The character this operation carries.
    pub fn char(&self) -> &Char {
        match self {
            Operation::Insert(ch) | Operation::Delete(ch) => ch,
        }
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Operation::Insert(_))
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self).map_err(DocError::from)?)
    }

    /// Decode an operation, rejecting payloads of the wrong shape before
    /// they reach the document.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes).map_err(DocError::from)?;
        check_shape(&value)?;
        Ok(serde_json::from_value(value).map_err(DocError::from)?)
    }
}

fn check_shape(value: &Value) -> std::result::Result<(), DocError> {
    let Value::Object(map) = value else {
        return Err(mismatch("operation object", value));
    };
    match map.get("kind") {
        Some(Value::String(_)) => {}
        Some(other) => return Err(mismatch("string kind", other)),
        None => return Err(mismatch("string kind", &Value::Null)),
    }
    match map.get("char") {
        Some(Value::Object(_)) => Ok(()),
        Some(other) => Err(mismatch("character object", other)),
        None => Err(mismatch("character object", &Value::Null)),
    }
}

fn mismatch(expected: &str, found: &Value) -> DocError {
    DocError::TypeMismatch {
        expected: expected.to_string(),
        found: json_kind(found).to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
