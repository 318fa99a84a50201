//! Dynamically typed document field values.

use crate::document::Document;
use crate::ids::NodeId;

/// A single document field value.
///
/// This is the closed set of types the wire format can carry. Arrays are
/// documents whose keys are the stringified indices `"0"`, `"1"`, … in
/// order; [`FieldValue::Array`] exists as a separate variant only so the
/// encoder can emit the array tag.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Double(f64),
    String(String),
    Document(Document),
    Array(Document),
    Binary(Vec<u8>),
    Uuid(NodeId),
    Bool(bool),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
    Int32(i32),
    Int64(i64),
}

impl FieldValue {
    /// Numeric view: doubles and both integer widths coerce to `f64`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(value) => Some(*value),
            Self::Int32(value) => Some(f64::from(*value)),
            Self::Int64(value) => Some(*value as f64),
            _ => None,
        }
    }

    /// Integer view: both integer widths coerce to `i64`.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int32(value) => Some(i64::from(*value)),
            Self::Int64(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_uuid(&self) -> Option<NodeId> {
        match self {
            Self::Uuid(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(value) => Some(value),
            _ => None,
        }
    }

    /// Sub-document view; covers both nested documents and arrays.
    #[must_use]
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Self::Document(value) | Self::Array(value) => Some(value),
            _ => None,
        }
    }
}
