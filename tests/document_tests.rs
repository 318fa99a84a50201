//! Document Integration Tests
//!
//! Tests for:
//! - Field order preservation and typed read access
//! - Builder finalization contract
//! - Wire encoding: canonical layouts, arrays, UUID subtype, size math
//! - Key/name sanitization

use trellis::document::{sanitize_ext, sanitize_key, sanitize_name};
use trellis::{Document, DocumentBuilder, FieldValue, NodeId, TrellisError};

// ============================================================================
// Ordering & typed access
// ============================================================================

#[test]
fn fields_keep_append_order() {
    let mut builder = DocumentBuilder::new();
    builder
        .append_str("zulu", "last-name-first")
        .append_i32("alpha", 7)
        .append_f64("mike", 2.5);
    let document = builder.build().unwrap();
    let names: Vec<_> = document.field_names().collect();
    assert_eq!(names, ["zulu", "alpha", "mike"]);
}

#[test]
fn numeric_getters_coerce_ints_to_f64() {
    let mut builder = DocumentBuilder::new();
    builder.append_i32("small", 3).append_i64("big", 1 << 40);
    let document = builder.build().unwrap();
    assert_eq!(document.get_f64("small"), Some(3.0));
    assert_eq!(document.get_i64("big"), Some(1 << 40));
    assert_eq!(document.get_f64("missing"), None);
}

#[test]
fn array_documents_key_by_index() {
    let array = Document::array_from([
        FieldValue::Double(0.5),
        FieldValue::Double(1.5),
    ]);
    let keys: Vec<_> = array.field_names().collect();
    assert_eq!(keys, ["0", "1"]);
    assert_eq!(array.get_f64("1"), Some(1.5));
}

// ============================================================================
// Builder finalization
// ============================================================================

#[test]
fn second_build_is_an_error() {
    let mut builder = DocumentBuilder::new();
    builder.append_bool("done", true);
    assert!(builder.build().is_ok());
    assert!(matches!(
        builder.build(),
        Err(TrellisError::InvalidDocument(_))
    ));
}

#[test]
fn appends_after_build_do_not_change_the_document() {
    let mut builder = DocumentBuilder::new();
    builder.append_i32("kept", 1);
    let document = builder.build().unwrap();
    builder.append_i32("dropped", 2);
    assert_eq!(document.len(), 1);
    assert!(!document.contains("dropped"));
}

// ============================================================================
// Wire encoding
// ============================================================================

#[test]
fn int32_document_encodes_to_canonical_bytes() {
    let mut builder = DocumentBuilder::new();
    builder.append_i32("a", 1);
    let bytes = builder.build().unwrap().to_bytes();
    assert_eq!(
        bytes,
        [0x0c, 0x00, 0x00, 0x00, 0x10, b'a', 0x00, 0x01, 0x00, 0x00, 0x00, 0x00]
    );
}

#[test]
fn uuid_encodes_as_binary_subtype_4() {
    let id = NodeId::from_name("3fa85f64-5717-4562-b3fc-2c963f66afa6");
    let mut builder = DocumentBuilder::new();
    builder.append_uuid("id", id);
    let bytes = builder.build().unwrap().to_bytes();
    // tag | "id" NUL | length 16 | subtype | 16 raw bytes
    assert_eq!(bytes[4], 0x05);
    assert_eq!(&bytes[5..8], b"id\0");
    assert_eq!(&bytes[8..12], 16i32.to_le_bytes());
    assert_eq!(bytes[12], 0x04);
    assert_eq!(&bytes[13..29], id.as_bytes());
}

#[test]
fn encoded_size_is_exact_for_nested_documents() {
    let mut inner = DocumentBuilder::new();
    inner.append_str("unit", "mm").append_f64("value", 300.0);
    let mut builder = DocumentBuilder::new();
    builder
        .append_uuid("id", NodeId::nil())
        .append_document("props", inner.build().unwrap())
        .append_f64_array("offset", &[1.0, 2.0, 3.0])
        .append_binary("blob", vec![0xAB; 37])
        .append_timestamp("at", 1_724_572_800_000);
    let document = builder.build().unwrap();
    assert_eq!(document.encoded_size(), document.to_bytes().len());
}

#[test]
fn oversized_document_fails_the_size_check() {
    let mut builder = DocumentBuilder::new();
    builder.append_binary("blob", vec![0u8; 64]);
    let document = builder.build().unwrap();
    assert!(document.check_size(16).is_err());
    assert!(document.check_size(1024).is_ok());
}

// ============================================================================
// Sanitization
// ============================================================================

#[test]
fn sanitizers_replace_reserved_characters() {
    assert_eq!(sanitize_key("Fire Rating.Class$A"), "Fire Rating:Class:A");
    assert_eq!(sanitize_name("Level 1.walls$ext"), "Level_1_walls_ext");
    assert_eq!(sanitize_ext("jp g$"), "jp_g_");
}
