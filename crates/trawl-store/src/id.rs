use std::fmt;

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// File-safe identity of one staged record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        let bad = value.is_empty()
            || value == "."
            || value == ".."
            || value.starts_with('.')
            || value.chars().any(|c| matches!(c, '/' | '\\' | '\0' | ':'));
        if bad {
            return Err(Error::InvalidId(value));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// How a record's staging identity is derived.
///
/// Strategies are versioned. The version is part of both the staging directory name
/// and the checkpoint key, so switching strategies re-stages everything under the new
/// identities instead of mixing two identity schemes in one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityStrategy {
    /// Uppercase hex SHA-256 of a text field (historically the email address).
    FieldHash { field: String },
    /// The raw value of a stable id field.
    Field { field: String },
}

impl IdentityStrategy {
    pub fn email_hash() -> Self {
        Self::FieldHash {
            field: "email_address".to_string(),
        }
    }

    pub fn internal_id() -> Self {
        Self::Field {
            field: "internal_id".to_string(),
        }
    }

    pub fn version(&self) -> u32 {
        match self {
            Self::FieldHash { .. } => 1,
            Self::Field { .. } => 2,
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Self::FieldHash { field } | Self::Field { field } => field,
        }
    }

    pub fn derive(&self, record: &Value) -> Result<RecordId> {
        let text = scalar_text(record.get(self.field())).ok_or_else(|| Error::MissingIdentity {
            field: self.field().to_string(),
        })?;

        match self {
            Self::FieldHash { .. } => Ok(RecordId(hex::encode_upper(Sha256::digest(text.as_bytes())))),
            Self::Field { .. } => RecordId::new(text),
        }
    }
}

fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
