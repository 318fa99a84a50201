//! Append-only document construction.

use crate::document::{Document, FieldValue};
use crate::errors::{Result, TrellisError};
use crate::ids::NodeId;

/// Builds a [`Document`] by appending typed fields in order.
///
/// The builder is append-only; once [`DocumentBuilder::build`] has run, the
/// document is immutable and finalizing the same builder again is an
/// [`TrellisError::InvalidDocument`]. Appends after finalization are ignored
/// with a warning (the already-built document cannot be changed).
///
/// The builder does **not** enforce [`crate::document::MAX_DOCUMENT_BYTES`];
/// callers that may embed large binaries track their own running byte
/// estimate and externalize before appending (see
/// [`crate::nodes::factory`]).
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    fields: Vec<(String, FieldValue)>,
    finalized: bool,
}

impl DocumentBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a raw field value under `key`.
    pub fn append(&mut self, key: impl Into<String>, value: FieldValue) -> &mut Self {
        if self.finalized {
            log::warn!("Ignoring append to an already-finalized document builder");
            return self;
        }
        self.fields.push((key.into(), value));
        self
    }

    pub fn append_str(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.append(key, FieldValue::String(value.into()))
    }

    pub fn append_i32(&mut self, key: impl Into<String>, value: i32) -> &mut Self {
        self.append(key, FieldValue::Int32(value))
    }

    pub fn append_i64(&mut self, key: impl Into<String>, value: i64) -> &mut Self {
        self.append(key, FieldValue::Int64(value))
    }

    pub fn append_f64(&mut self, key: impl Into<String>, value: f64) -> &mut Self {
        self.append(key, FieldValue::Double(value))
    }

    pub fn append_bool(&mut self, key: impl Into<String>, value: bool) -> &mut Self {
        self.append(key, FieldValue::Bool(value))
    }

    pub fn append_uuid(&mut self, key: impl Into<String>, value: NodeId) -> &mut Self {
        self.append(key, FieldValue::Uuid(value))
    }

    /// Appends a timestamp in milliseconds since the Unix epoch.
    pub fn append_timestamp(&mut self, key: impl Into<String>, millis: i64) -> &mut Self {
        self.append(key, FieldValue::Timestamp(millis))
    }

    /// Appends the current wall-clock time as a timestamp.
    pub fn append_now(&mut self, key: impl Into<String>) -> &mut Self {
        let millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_millis() as i64);
        self.append_timestamp(key, millis)
    }

    /// Embeds a raw byte range.
    pub fn append_binary(&mut self, key: impl Into<String>, bytes: Vec<u8>) -> &mut Self {
        self.append(key, FieldValue::Binary(bytes))
    }

    /// Appends a nested document.
    pub fn append_document(&mut self, key: impl Into<String>, document: Document) -> &mut Self {
        self.append(key, FieldValue::Document(document))
    }

    /// Splices every field of `document` into this builder, in order.
    pub fn append_elements(&mut self, document: &Document) -> &mut Self {
        for (key, value) in document.iter() {
            self.append(key, value.clone());
        }
        self
    }

    /// Appends an array (a document keyed by stringified indices).
    pub fn append_array(&mut self, key: impl Into<String>, array: Document) -> &mut Self {
        self.append(key, FieldValue::Array(array))
    }

    // ========================================================================
    // Array conveniences
    // ========================================================================

    pub fn append_f64_array(&mut self, key: impl Into<String>, values: &[f64]) -> &mut Self {
        self.append_array(
            key,
            Document::array_from(values.iter().map(|&value| FieldValue::Double(value))),
        )
    }

    pub fn append_f32_array(&mut self, key: impl Into<String>, values: &[f32]) -> &mut Self {
        self.append_array(
            key,
            Document::array_from(values.iter().map(|&value| FieldValue::Double(f64::from(value)))),
        )
    }

    pub fn append_str_array<S: AsRef<str>>(
        &mut self,
        key: impl Into<String>,
        values: &[S],
    ) -> &mut Self {
        self.append_array(
            key,
            Document::array_from(
                values
                    .iter()
                    .map(|value| FieldValue::String(value.as_ref().to_string())),
            ),
        )
    }

    pub fn append_uuid_array(&mut self, key: impl Into<String>, values: &[NodeId]) -> &mut Self {
        self.append_array(
            key,
            Document::array_from(values.iter().map(|&value| FieldValue::Uuid(value))),
        )
    }

    // ========================================================================
    // Finalization
    // ========================================================================

    /// Finalizes into an immutable [`Document`].
    ///
    /// Fails with [`TrellisError::InvalidDocument`] if this builder has
    /// already been finalized; the caller recovers by starting over with a
    /// fresh builder.
    pub fn build(&mut self) -> Result<Document> {
        if self.finalized {
            return Err(TrellisError::InvalidDocument(
                "builder has already been finalized".to_string(),
            ));
        }
        self.finalized = true;
        Ok(Document::from_fields(std::mem::take(&mut self.fields)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_preserve_order() {
        let mut builder = DocumentBuilder::new();
        builder
            .append_str("name", "root")
            .append_i32("count", 3)
            .append_f64("ratio", 0.5);
        let document = builder.build().unwrap();
        let names: Vec<_> = document.field_names().collect();
        assert_eq!(names, ["name", "count", "ratio"]);
    }

    #[test]
    fn double_build_fails() {
        let mut builder = DocumentBuilder::new();
        builder.append_i32("a", 1);
        assert!(builder.build().is_ok());
        assert!(matches!(
            builder.build(),
            Err(TrellisError::InvalidDocument(_))
        ));
    }

    #[test]
    fn append_after_build_is_ignored() {
        let mut builder = DocumentBuilder::new();
        builder.append_i32("a", 1);
        let document = builder.build().unwrap();
        builder.append_i32("b", 2);
        assert_eq!(document.len(), 1);
    }
}
