//! Binary wire encoding.
//!
//! Documents encode to the BSON byte layout so existing document stores can
//! ingest them unchanged: a little-endian `i32` total size, one element per
//! field (`tag | key NUL-terminated | payload`), and a trailing NUL.
//! Identifier fields use the binary element with the UUID subtype.

use crate::document::{Document, FieldValue};

const TAG_DOUBLE: u8 = 0x01;
const TAG_STRING: u8 = 0x02;
const TAG_DOCUMENT: u8 = 0x03;
const TAG_ARRAY: u8 = 0x04;
const TAG_BINARY: u8 = 0x05;
const TAG_BOOL: u8 = 0x08;
const TAG_DATETIME: u8 = 0x09;
const TAG_INT32: u8 = 0x10;
const TAG_INT64: u8 = 0x12;

const SUBTYPE_GENERIC: u8 = 0x00;
const SUBTYPE_UUID: u8 = 0x04;

/// Exact encoded size of a document, without allocating.
#[must_use]
pub fn document_size(document: &Document) -> usize {
    let elements: usize = document
        .iter()
        .map(|(key, value)| 1 + key.len() + 1 + value_size(value))
        .sum();
    4 + elements + 1
}

fn value_size(value: &FieldValue) -> usize {
    match value {
        FieldValue::Double(_) | FieldValue::Timestamp(_) | FieldValue::Int64(_) => 8,
        FieldValue::String(text) => 4 + text.len() + 1,
        FieldValue::Document(inner) | FieldValue::Array(inner) => document_size(inner),
        FieldValue::Binary(bytes) => 4 + 1 + bytes.len(),
        FieldValue::Uuid(_) => 4 + 1 + 16,
        FieldValue::Bool(_) => 1,
        FieldValue::Int32(_) => 4,
    }
}

/// Encodes a document into its wire form.
#[must_use]
pub fn to_bytes(document: &Document) -> Vec<u8> {
    let mut out = Vec::with_capacity(document_size(document));
    write_document(document, &mut out);
    out
}

fn write_document(document: &Document, out: &mut Vec<u8>) {
    let size = document_size(document);
    out.extend_from_slice(&(size as i32).to_le_bytes());
    for (key, value) in document.iter() {
        write_element(key, value, out);
    }
    out.push(0);
}

fn write_element(key: &str, value: &FieldValue, out: &mut Vec<u8>) {
    out.push(tag_of(value));
    out.extend_from_slice(key.as_bytes());
    out.push(0);
    match value {
        FieldValue::Double(number) => out.extend_from_slice(&number.to_le_bytes()),
        FieldValue::String(text) => {
            out.extend_from_slice(&((text.len() + 1) as i32).to_le_bytes());
            out.extend_from_slice(text.as_bytes());
            out.push(0);
        }
        FieldValue::Document(inner) | FieldValue::Array(inner) => write_document(inner, out),
        FieldValue::Binary(bytes) => {
            out.extend_from_slice(&(bytes.len() as i32).to_le_bytes());
            out.push(SUBTYPE_GENERIC);
            out.extend_from_slice(bytes);
        }
        FieldValue::Uuid(id) => {
            out.extend_from_slice(&16i32.to_le_bytes());
            out.push(SUBTYPE_UUID);
            out.extend_from_slice(id.as_bytes());
        }
        FieldValue::Bool(flag) => out.push(u8::from(*flag)),
        FieldValue::Timestamp(millis) => out.extend_from_slice(&millis.to_le_bytes()),
        FieldValue::Int32(number) => out.extend_from_slice(&number.to_le_bytes()),
        FieldValue::Int64(number) => out.extend_from_slice(&number.to_le_bytes()),
    }
}

fn tag_of(value: &FieldValue) -> u8 {
    match value {
        FieldValue::Double(_) => TAG_DOUBLE,
        FieldValue::String(_) => TAG_STRING,
        FieldValue::Document(_) => TAG_DOCUMENT,
        FieldValue::Array(_) => TAG_ARRAY,
        FieldValue::Binary(_) | FieldValue::Uuid(_) => TAG_BINARY,
        FieldValue::Bool(_) => TAG_BOOL,
        FieldValue::Timestamp(_) => TAG_DATETIME,
        FieldValue::Int32(_) => TAG_INT32,
        FieldValue::Int64(_) => TAG_INT64,
    }
}

#[cfg(test)]
mod tests {
    use crate::document::DocumentBuilder;

    #[test]
    fn int32_field_matches_canonical_layout() {
        let mut builder = DocumentBuilder::new();
        builder.append_i32("a", 1);
        let bytes = builder.build().unwrap().to_bytes();
        assert_eq!(
            bytes,
            [0x0c, 0x00, 0x00, 0x00, 0x10, b'a', 0x00, 0x01, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn string_field_matches_canonical_layout() {
        let mut builder = DocumentBuilder::new();
        builder.append_str("hello", "world");
        let bytes = builder.build().unwrap().to_bytes();
        assert_eq!(
            bytes,
            [
                0x16, 0x00, 0x00, 0x00, // total size: 22
                0x02, b'h', b'e', b'l', b'l', b'o', 0x00, // tag + key
                0x06, 0x00, 0x00, 0x00, b'w', b'o', b'r', b'l', b'd', 0x00, // value
                0x00, // terminator
            ]
        );
    }

    #[test]
    fn encoded_size_matches_output_length() {
        let mut inner = DocumentBuilder::new();
        inner.append_f64("x", 1.5).append_bool("flag", true);
        let mut builder = DocumentBuilder::new();
        builder
            .append_str("name", "mesh")
            .append_i64("count", 1 << 40)
            .append_binary("data", vec![1, 2, 3, 4, 5])
            .append_document("nested", inner.build().unwrap())
            .append_f64_array("values", &[1.0, 2.0, 3.0]);
        let document = builder.build().unwrap();
        assert_eq!(document.encoded_size(), document.to_bytes().len());
    }
}
