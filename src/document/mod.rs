//! The secret document model.
//!
//! A secret file is a JSON object whose reserved `_public_key` field names the
//! keypair that can decrypt it. This module parses that object, reads and writes
//! the key, and serializes the result back with `_public_key` first and every other
//! field in its original order. It never touches the disk or the encryption binary.

use crate::constants::{CIPHERTEXT_ENVELOPE_PREFIX, PUBLIC_KEY_FIELD, PUBLIC_KEY_HEX_LEN};
use crate::errors::{AppError, AppResult, DocumentError};
use serde::Serialize;
use serde_json::{Map, Value};

pub mod io;


/// A parsed secret document.
///
/// The root is guaranteed to be a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    fields: Map<String, Value>,
}

/// Counts of string values by encryption state, as reported by `ejflow status`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SecretSummary {
    /// Values already wrapped in a ciphertext envelope.
    pub encrypted: usize,
    /// Values the binary would encrypt but has not yet.
    pub plaintext: usize,
}

impl Document {
    /// Parses document text.
    ///
    /// # Errors
    ///
    /// - `DocumentError::Malformed` if the text is not JSON
    /// - `DocumentError::NotAnObject` if the root is not an object
    ///
    /// # Examples
    ///
    /// ```
    /// use ejflow::document::Document;
    ///
    /// let doc = Document::parse(r#"{"_public_key": "abc", "db": "secret"}"#).unwrap();
    /// assert_eq!(doc.public_key(), Some("abc"));
    ///
    /// assert!(Document::parse("[1, 2]").is_err());
    /// ```
    pub fn parse(text: &str) -> AppResult<Self> {
        let value: Value = serde_json::from_str(text).map_err(DocumentError::Malformed)?;
        match value {
            Value::Object(fields) => Ok(Document { fields }),
            other => Err(DocumentError::NotAnObject {
                found: json_kind(&other),
            }
            .into()),
        }
    }

    /// The `_public_key` value, if present and a string.
    pub fn public_key(&self) -> Option<&str> {
        self.fields.get(PUBLIC_KEY_FIELD).and_then(Value::as_str)
    }

    /// Returns true if the document carries a usable `_public_key`.
    pub fn has_public_key(&self) -> bool {
        self.public_key().is_some()
    }

    /// Returns a copy with `_public_key` set to `key` and moved to the front.
    pub fn with_public_key(&self, key: &str) -> Self {
        let mut fields = Map::with_capacity(self.fields.len() + 1);
        fields.insert(PUBLIC_KEY_FIELD.to_string(), Value::String(key.to_string()));
        for (name, value) in &self.fields {
            if name != PUBLIC_KEY_FIELD {
                fields.insert(name.clone(), value.clone());
            }
        }
        Document { fields }
    }

    /// Read access to the top-level fields, in document order.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Pretty-printed JSON terminated by a newline.
    pub fn to_pretty_string(&self) -> AppResult<String> {
        let mut text =
            serde_json::to_string_pretty(&self.fields).map_err(AppError::Serialization)?;
        text.push('\n');
        Ok(text)
    }

    /// Counts encrypted and plaintext secret values.
    ///
    /// String values under keys starting with `_` are never encrypted and are not
    /// counted.
    pub fn secret_summary(&self) -> SecretSummary {
        let mut summary = SecretSummary::default();
        for (name, value) in &self.fields {
            tally(name, value, &mut summary);
        }
        summary
    }
}

fn tally(name: &str, value: &Value, summary: &mut SecretSummary) {
    match value {
        Value::String(s) if !name.starts_with('_') => {
            if s.starts_with(CIPHERTEXT_ENVELOPE_PREFIX) {
                summary.encrypted += 1;
            } else {
                summary.plaintext += 1;
            }
        }
        Value::Object(map) => {
            for (child_name, child) in map {
                tally(child_name, child, summary);
            }
        }
        Value::Array(items) => {
            for item in items {
                tally(name, item, summary);
            }
        }
        _ => {}
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

/// Returns the document's public key, or `None` if it is keyless.
pub fn get_document_key(document: &Document) -> Option<&str> {
    document.public_key()
}

/// Returns a new document equal to `document` but with `_public_key` set to `key`.
///
/// Applying it twice with the same key yields the same document as applying it once.
///
/// # Examples
///
/// ```
/// use ejflow::document::{insert_key, Document};
///
/// let doc = Document::parse(r#"{"other": "plain"}"#).unwrap();
/// let keyed = insert_key(&doc, "abc123");
/// assert_eq!(
///     keyed.to_pretty_string().unwrap(),
///     "{\n  \"_public_key\": \"abc123\",\n  \"other\": \"plain\"\n}\n"
/// );
/// ```
pub fn insert_key(document: &Document, key: &str) -> Document {
    document.with_public_key(key)
}

/// Parses `text`, sets `_public_key` and serializes the result.
///
/// # Errors
///
/// Returns `DocumentError::Malformed` or `DocumentError::NotAnObject` for text that
/// is not a JSON object.
pub fn insert_key_into_text(text: &str, key: &str) -> AppResult<String> {
    let document = Document::parse(text)?;
    insert_key(&document, key).to_pretty_string()
}

/// Returns true if `key` has the shape of a public key: 64 hex characters.
pub fn looks_like_public_key(key: &str) -> bool {
    key.len() == PUBLIC_KEY_HEX_LEN && key.chars().all(|c| c.is_ascii_hexdigit())
}
