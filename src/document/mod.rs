//! Document Layer
//!
//! The unit of encoding and storage: an ordered, dynamically typed field
//! map, finalized once and immutable thereafter.
//!
//! # Overview
//!
//! - [`FieldValue`] — the closed variant type of everything a field can hold
//! - [`Document`] — an ordered field map with typed read accessors
//! - [`DocumentBuilder`] — the append-only construction path
//! - [`encode`] — the binary (BSON-compatible) wire form
//!
//! Field order is semantically meaningful (array element order carries face
//! winding and vertex order), so the document preserves append order exactly
//! and arrays are encoded as documents keyed `"0"`, `"1"`, … in order.
//!
//! The builder itself does not police the maximum document size; the node
//! factory tracks a running byte estimate and externalizes oversized binary
//! payloads *before* they ever reach a builder (see
//! [`crate::nodes::factory`]).

mod builder;
mod value;

pub mod encode;

pub use builder::DocumentBuilder;
pub use value::FieldValue;

use rustc_hash::FxHashMap;

use crate::errors::{Result, TrellisError};
use crate::ids::NodeId;

/// Maximum encoded size of a single document: 16 MiB, the ceiling of the
/// downstream document store.
pub const MAX_DOCUMENT_BYTES: usize = 16 * 1024 * 1024;

/// An ordered, immutable mapping of field name → typed value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    fields: Vec<(String, FieldValue)>,
    index: FxHashMap<String, usize>,
}

impl Document {
    /// The empty document.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_fields(fields: Vec<(String, FieldValue)>) -> Self {
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, (name, _))| (name.clone(), i))
            .collect();
        Self { fields, index }
    }

    /// Builds an array document: keys are the stringified indices in order.
    #[must_use]
    pub fn array_from<I>(values: I) -> Self
    where
        I: IntoIterator<Item = FieldValue>,
    {
        Self::from_fields(
            values
                .into_iter()
                .enumerate()
                .map(|(i, value)| (i.to_string(), value))
                .collect(),
        )
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Fields in append order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.index.get(name).map(|&i| &self.fields[i].1)
    }

    // ========================================================================
    // Typed getters
    // ========================================================================

    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_str)
    }

    #[must_use]
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(FieldValue::as_f64)
    }

    #[must_use]
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(FieldValue::as_i64)
    }

    #[must_use]
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(FieldValue::as_bool)
    }

    #[must_use]
    pub fn get_uuid(&self, name: &str) -> Option<NodeId> {
        self.get(name).and_then(FieldValue::as_uuid)
    }

    #[must_use]
    pub fn get_binary(&self, name: &str) -> Option<&[u8]> {
        self.get(name).and_then(FieldValue::as_binary)
    }

    #[must_use]
    pub fn get_document(&self, name: &str) -> Option<&Document> {
        self.get(name).and_then(FieldValue::as_document)
    }

    /// Like [`Document::get_uuid`] but a hard failure when the field is
    /// absent — for fields the node contract guarantees (`_id`,
    /// `shared_id`).
    pub fn require_uuid(&self, name: &str) -> Result<NodeId> {
        self.get_uuid(name)
            .ok_or_else(|| TrellisError::MissingField(name.to_string()))
    }

    /// Array element values in index order. Assumes the document was built
    /// via [`Document::array_from`] (or equivalent stringified-index keys).
    pub fn array_values(&self) -> impl Iterator<Item = &FieldValue> {
        self.fields.iter().map(|(_, value)| value)
    }

    // ========================================================================
    // Encoding
    // ========================================================================

    /// Exact size of [`Document::to_bytes`] output, computed without
    /// allocating.
    #[must_use]
    pub fn encoded_size(&self) -> usize {
        encode::document_size(self)
    }

    /// Fails when the encoded form exceeds `limit` bytes.
    ///
    /// Only documents without externalizable binary payloads can trip this
    /// (e.g. a metadata node with an enormous entry set); mesh payloads are
    /// externalized before they ever reach a finished document.
    pub fn check_size(&self, limit: usize) -> Result<()> {
        let size = self.encoded_size();
        if size > limit {
            return Err(TrellisError::DocumentTooLarge { size, limit });
        }
        Ok(())
    }

    /// Encodes into the binary wire form.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        encode::to_bytes(self)
    }
}

// ============================================================================
// Key / name sanitization
// ============================================================================

/// Replaces the structurally significant characters `$` and `.` with `:`.
///
/// Both are reserved in the encoding format's key syntax and must not appear
/// in metadata keys.
#[must_use]
pub fn sanitize_key(key: &str) -> String {
    key.replace(['$', '.'], ":")
}

/// Sanitizes a node or collection name (` `, `$`, `.` → `_`).
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    name.replace([' ', '$', '.'], "_")
}

/// Sanitizes a file extension (` `, `$` → `_`).
#[must_use]
pub fn sanitize_ext(ext: &str) -> String {
    ext.replace([' ', '$'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_key_replaces_reserved_chars() {
        assert_eq!(sanitize_key("a.b$c"), "a:b:c");
        assert_eq!(sanitize_key("plain"), "plain");
    }

    #[test]
    fn array_from_keys_by_index() {
        let array = Document::array_from([
            FieldValue::Int32(10),
            FieldValue::Int32(20),
            FieldValue::Int32(30),
        ]);
        let names: Vec<_> = array.field_names().collect();
        assert_eq!(names, ["0", "1", "2"]);
        assert_eq!(array.get_i64("1"), Some(20));
    }
}
