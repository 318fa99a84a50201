//! Node Factory
//!
//! Pure construction functions: raw adapter input in, `(document, external
//! payloads)` out, assembled into a typed [`Node`].
//!
//! # Size-bounded embedding
//!
//! Every constructor tracks an approximate running byte total, seeded with
//! the encoded size of the mandatory fields. Each candidate binary field
//! (vertices → faces → normals → colors → concatenated UV, in that fixed
//! order) is measured before it is appended: if embedding it would reach the
//! configured maximum document size, the field is registered as a named
//! external blob (`<unique_id>_<field>`) instead and only the name's length
//! counts toward the total. The decision is per field, so one mesh may mix
//! embedded and externalized payloads. Size limits are therefore never an
//! error.
//!
//! # Malformed input
//!
//! Zero-geometry meshes, empty texture buffers, inconsistent face arities
//! and the like are warnings, never failures: the importer's partial data is
//! preserved and the caller decides what to do with the advisory scene
//! flags.

use glam::Vec2;

use crate::document::{Document, DocumentBuilder, FieldValue, MAX_DOCUMENT_BYTES};
use crate::document::{sanitize_ext, sanitize_key};
use crate::errors::Result;
use crate::ids::{IdGenerator, NodeId};
use crate::math::{BoundingBox, Matrix44};
use crate::nodes::node::{bounding_box_field, matrix_field, ExternalBlob, PayloadMap};
use crate::nodes::{
    labels, CameraInput, MaterialInput, MeshInput, Node, NodeKind, Primitive, RevisionInput,
};

/// Appends the mandatory fields shared by every node and returns the
/// finalized defaults document (spliced into the caller's builder) together
/// with its encoded byte size.
fn append_defaults(
    builder: &mut DocumentBuilder,
    kind: NodeKind,
    unique_id: NodeId,
    shared_id: NodeId,
    name: &str,
    parents: &[NodeId],
) -> Result<usize> {
    let mut defaults = DocumentBuilder::new();
    defaults.append_uuid(labels::ID, unique_id);
    defaults.append_uuid(labels::SHARED_ID, shared_id);
    defaults.append_str(labels::TYPE, kind.as_str());
    if !parents.is_empty() {
        defaults.append_uuid_array(labels::PARENTS, parents);
    }
    if !name.is_empty() {
        defaults.append_str(labels::NAME, name);
    }
    let defaults = defaults.build()?;
    let bytesize = defaults.encoded_size();
    builder.append_elements(&defaults);
    Ok(bytesize)
}

/// Embeds `bytes` under `label` when it fits, otherwise registers it as an
/// external blob named `<unique_id>_<label>`.
fn embed_or_externalize(
    builder: &mut DocumentBuilder,
    payloads: &mut PayloadMap,
    unique_id: NodeId,
    label: &'static str,
    bytes: Vec<u8>,
    running_total: &mut usize,
    max_bytes: usize,
) {
    if *running_total + bytes.len() >= max_bytes {
        let name = format!("{unique_id}_{label}");
        *running_total += name.len();
        payloads.insert(label, ExternalBlob { name, bytes });
    } else {
        *running_total += bytes.len();
        builder.append_binary(label, bytes);
    }
}

// ============================================================================
// Transformation
// ============================================================================

/// Builds a transformation node from a row-major 4×4 matrix.
///
/// A last row other than `[0, 0, 0, 1]` is tolerated with a warning.
pub fn make_transformation_node(
    matrix: &Matrix44,
    name: &str,
    parents: &[NodeId],
    generator: &mut IdGenerator,
) -> Result<Node> {
    if !matrix.has_affine_last_row() {
        log::warn!(
            "Transformation \"{name}\" does not have [0, 0, 0, 1] as its last row"
        );
    }
    let mut builder = DocumentBuilder::new();
    append_defaults(
        &mut builder,
        NodeKind::Transformation,
        generator.next_id(),
        generator.next_id(),
        name,
        parents,
    )?;
    builder.append(labels::MATRIX, matrix_field(matrix));
    Node::from_parts(NodeKind::Transformation, builder.build()?, PayloadMap::default())
}

/// An identity transformation named "RootNode", the conventional scene
/// root.
pub fn make_root_node(generator: &mut IdGenerator) -> Result<Node> {
    make_transformation_node(&Matrix44::identity(), "RootNode", &[], generator)
}

// ============================================================================
// Mesh
// ============================================================================

/// Builds a mesh node, externalizing any payload whose embedding would
/// cross `max_bytes`.
pub fn make_mesh_node(
    input: &MeshInput,
    name: &str,
    parents: &[NodeId],
    generator: &mut IdGenerator,
    max_bytes: usize,
) -> Result<Node> {
    let unique_id = generator.next_id();
    let mut builder = DocumentBuilder::new();
    let mut payloads = PayloadMap::default();
    let mut running_total = append_defaults(
        &mut builder,
        NodeKind::Mesh,
        unique_id,
        generator.next_id(),
        name,
        parents,
    )?;

    if input.vertices.is_empty() || input.faces.is_empty() {
        log::warn!("Creating a mesh ({unique_id}) with no vertices/faces!");
    }

    let bbox = BoundingBox::from_points(input.vertices.iter().map(|v| v.as_dvec3()));
    if bbox.is_valid() {
        builder.append(labels::BOUNDING_BOX, bounding_box_field(&bbox));
        running_total += 6 * std::mem::size_of::<f64>();
    }

    if !input.outline.is_empty() {
        let outline = Document::array_from(input.outline.iter().map(|pair| {
            FieldValue::Array(Document::array_from(
                pair.iter().map(|&value| FieldValue::Double(value)),
            ))
        }));
        running_total += input.outline.len() * 2 * std::mem::size_of::<f64>();
        builder.append_array(labels::OUTLINE, outline);
    }

    if !input.vertices.is_empty() {
        embed_or_externalize(
            &mut builder,
            &mut payloads,
            unique_id,
            labels::VERTICES,
            bytemuck::cast_slice(&input.vertices).to_vec(),
            &mut running_total,
            max_bytes,
        );
    }

    if !input.faces.is_empty() {
        builder.append_i32(labels::FACES_COUNT, input.faces.len() as i32);
        let (flattened, primitive) = flatten_faces(&input.faces);
        builder.append_i32(labels::PRIMITIVE, primitive as i32);
        embed_or_externalize(
            &mut builder,
            &mut payloads,
            unique_id,
            labels::FACES,
            bytemuck::cast_slice(&flattened).to_vec(),
            &mut running_total,
            max_bytes,
        );
    }

    if !input.normals.is_empty() {
        embed_or_externalize(
            &mut builder,
            &mut payloads,
            unique_id,
            labels::NORMALS,
            bytemuck::cast_slice(&input.normals).to_vec(),
            &mut running_total,
            max_bytes,
        );
    }

    if !input.colors.is_empty() {
        embed_or_externalize(
            &mut builder,
            &mut payloads,
            unique_id,
            labels::COLORS,
            bytemuck::cast_slice(&input.colors).to_vec(),
            &mut running_total,
            max_bytes,
        );
    }

    if !input.uv_channels.is_empty() {
        builder.append_i32(labels::UV_CHANNELS_COUNT, input.uv_channels.len() as i32);
        let concatenated: Vec<Vec2> = input
            .uv_channels
            .iter()
            .flat_map(|channel| channel.iter().copied())
            .collect();
        embed_or_externalize(
            &mut builder,
            &mut payloads,
            unique_id,
            labels::UV_CHANNELS,
            bytemuck::cast_slice(&concatenated).to_vec(),
            &mut running_total,
            max_bytes,
        );
    }

    Node::from_parts(NodeKind::Mesh, builder.build()?, payloads)
}

/// Flattens variable-arity faces to `[n1, i…, n2, i…]`, inferring the
/// primitive type from the first face.
///
/// Later faces of a different arity are accepted with a warning; the
/// first-seen type wins for the whole mesh.
fn flatten_faces(faces: &[crate::nodes::Face]) -> (Vec<u32>, Primitive) {
    let mut flattened = Vec::with_capacity(faces.len() * 4);
    let mut primitive = Primitive::Unknown;
    let mut inferred = false;
    for face in faces {
        let arity = face.len();
        if arity == 0 {
            log::warn!("Number of indices in this face is 0!");
        }
        if inferred {
            if arity != primitive.arity() {
                log::warn!("Mixing different primitives within a mesh is not supported!");
            }
        } else {
            primitive = Primitive::from_arity(arity);
            if primitive == Primitive::Unknown {
                log::warn!(
                    "Unsupported primitive type - only lines and triangles are supported \
                     but this face has {arity} indices!"
                );
            }
            inferred = true;
        }
        flattened.push(arity as u32);
        flattened.extend_from_slice(face);
    }
    (flattened, primitive)
}

// ============================================================================
// Material
// ============================================================================

/// Builds a material node. NaN scalars mean "unset" and are omitted from
/// the document; boolean flags are only encoded when true.
pub fn make_material_node(
    input: &MaterialInput,
    name: &str,
    parents: &[NodeId],
    generator: &mut IdGenerator,
) -> Result<Node> {
    let mut builder = DocumentBuilder::new();
    append_defaults(
        &mut builder,
        NodeKind::Material,
        generator.next_id(),
        generator.next_id(),
        name,
        parents,
    )?;

    let color_fields = [
        (labels::AMBIENT, input.ambient),
        (labels::DIFFUSE, input.diffuse),
        (labels::SPECULAR, input.specular),
        (labels::EMISSIVE, input.emissive),
    ];
    for (label, color) in color_fields {
        if let Some(color) = color {
            builder.append_f32_array(label, &color);
        }
    }

    if input.is_wireframe {
        builder.append_bool(labels::WIREFRAME, true);
    }
    if input.is_two_sided {
        builder.append_bool(labels::TWO_SIDED, true);
    }

    let scalar_fields = [
        (labels::OPACITY, input.opacity),
        (labels::SHININESS, input.shininess),
        (labels::SHININESS_STRENGTH, input.shininess_strength),
        (labels::LINE_WEIGHT, input.line_weight),
    ];
    for (label, value) in scalar_fields {
        if !value.is_nan() {
            builder.append_f64(label, f64::from(value));
        }
    }

    Node::from_parts(NodeKind::Material, builder.build()?, PayloadMap::default())
}

// ============================================================================
// Metadata
// ============================================================================

/// Builds a metadata node from key/value string pairs.
///
/// Keys are sanitized (`$` and `.` become `:`); values are typed by parse
/// priority integer → float → string; entries with an empty key or value
/// are dropped silently.
pub fn make_metadata_node<'a, I>(
    entries: I,
    mime_type: &str,
    name: &str,
    parents: &[NodeId],
    generator: &mut IdGenerator,
) -> Result<Node>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut builder = DocumentBuilder::new();
    append_defaults(
        &mut builder,
        NodeKind::Metadata,
        generator.next_id(),
        generator.next_id(),
        name,
        parents,
    )?;

    if !mime_type.is_empty() {
        builder.append_str(labels::MIME, mime_type);
    }

    let mut meta = DocumentBuilder::new();
    for (raw_key, value) in entries {
        let key = sanitize_key(raw_key);
        if key.is_empty() || value.is_empty() {
            continue;
        }
        meta.append(key, parse_metadata_value(value));
    }
    builder.append_document(labels::METADATA, meta.build()?);

    Node::from_parts(NodeKind::Metadata, builder.build()?, PayloadMap::default())
}

/// Integer first, float second, string as the fallback — first successful
/// parse wins.
fn parse_metadata_value(value: &str) -> FieldValue {
    if let Ok(integer) = value.parse::<i64>() {
        FieldValue::Int64(integer)
    } else if let Ok(float) = value.parse::<f64>() {
        FieldValue::Double(float)
    } else {
        FieldValue::String(value.to_string())
    }
}

// ============================================================================
// Texture
// ============================================================================

/// Builds a texture node. The raw image bytes are always stored as an
/// external payload (`<unique_id>_data`); an empty buffer yields a node
/// with no payload and a warning.
pub fn make_texture_node(
    name: &str,
    data: &[u8],
    width: u32,
    height: u32,
    parents: &[NodeId],
    generator: &mut IdGenerator,
) -> Result<Node> {
    let unique_id = generator.next_id();
    let mut builder = DocumentBuilder::new();
    let mut payloads = PayloadMap::default();
    append_defaults(
        &mut builder,
        NodeKind::Texture,
        unique_id,
        generator.next_id(),
        name,
        parents,
    )?;

    builder.append_i32(labels::WIDTH, width as i32);
    builder.append_i32(labels::HEIGHT, height as i32);

    if let Some((_, extension)) = name.rsplit_once('.') {
        if !extension.is_empty() {
            builder.append_str(labels::EXTENSION, sanitize_ext(extension));
        }
    }

    if data.is_empty() {
        log::warn!("Creating a texture node ({unique_id}) with no texture!");
    } else {
        payloads.insert(
            labels::DATA,
            ExternalBlob {
                name: format!("{unique_id}_{}", labels::DATA),
                bytes: data.to_vec(),
            },
        );
    }

    Node::from_parts(NodeKind::Texture, builder.build()?, payloads)
}

// ============================================================================
// Camera
// ============================================================================

/// Builds a camera node.
pub fn make_camera_node(
    input: &CameraInput,
    name: &str,
    parents: &[NodeId],
    generator: &mut IdGenerator,
) -> Result<Node> {
    let mut builder = DocumentBuilder::new();
    append_defaults(
        &mut builder,
        NodeKind::Camera,
        generator.next_id(),
        generator.next_id(),
        name,
        parents,
    )?;

    builder
        .append_f64(labels::ASPECT_RATIO, f64::from(input.aspect_ratio))
        .append_f64(labels::FAR, f64::from(input.far_clipping_plane))
        .append_f64(labels::NEAR, f64::from(input.near_clipping_plane))
        .append_f64(labels::FOV, f64::from(input.field_of_view))
        .append_f32_array(labels::LOOK_AT, &input.look_at.to_array())
        .append_f32_array(labels::POSITION, &input.position.to_array())
        .append_f32_array(labels::UP, &input.up.to_array());

    Node::from_parts(NodeKind::Camera, builder.build()?, PayloadMap::default())
}

// ============================================================================
// Reference
// ============================================================================

/// Builds a reference node pointing at another database/project/revision.
///
/// `pin_revision` distinguishes "pin to this exact revision" (unique id)
/// from "follow the branch" (shared id).
pub fn make_reference_node(
    database: &str,
    project: &str,
    revision_id: NodeId,
    pin_revision: bool,
    name: &str,
    generator: &mut IdGenerator,
) -> Result<Node> {
    let node_name = if name.is_empty() {
        format!("{database}.{project}")
    } else {
        name.to_string()
    };

    let mut builder = DocumentBuilder::new();
    append_defaults(
        &mut builder,
        NodeKind::Reference,
        generator.next_id(),
        generator.next_id(),
        &node_name,
        &[],
    )?;

    if !database.is_empty() {
        builder.append_str(labels::REF_OWNER, database);
    }
    if !project.is_empty() {
        builder.append_str(labels::REF_PROJECT, project);
    }
    builder.append_uuid(labels::REF_REVISION_ID, revision_id);
    if pin_revision {
        builder.append_bool(labels::REF_UNIQUE, true);
    }

    Node::from_parts(NodeKind::Reference, builder.build()?, PayloadMap::default())
}

// ============================================================================
// Revision
// ============================================================================

/// Builds a revision node recording one import.
///
/// The shared id doubles as the branch id; `None` means the default branch
/// (nil UUID). Source file references are prefixed with the revision's
/// unique id string, matching the external storage keys they are written
/// under.
pub fn make_revision_node(
    input: &RevisionInput,
    branch: Option<NodeId>,
    generator: &mut IdGenerator,
) -> Result<Node> {
    let unique_id = generator.next_id();
    let shared_id = branch.unwrap_or(NodeId::nil());

    let mut builder = DocumentBuilder::new();
    append_defaults(&mut builder, NodeKind::Revision, unique_id, shared_id, "", &[])?;

    if !input.author.is_empty() {
        builder.append_str(labels::AUTHOR, &input.author);
    }
    if !input.message.is_empty() {
        builder.append_str(labels::MESSAGE, &input.message);
    }
    if !input.tag.is_empty() {
        builder.append_str(labels::TAG, &input.tag);
    }
    builder.append_now(labels::TIMESTAMP);

    if !input.current_nodes.is_empty() {
        builder.append_uuid_array(labels::CURRENT_NODES, &input.current_nodes);
    }
    builder.append_f64_array(labels::WORLD_COORD_SHIFT, &input.world_offset);

    if !input.source_files.is_empty() {
        let prefixed: Vec<String> = input
            .source_files
            .iter()
            .map(|file| format!("{unique_id}{file}"))
            .collect();
        builder.append_str_array(labels::REF_FILES, &prefixed);
    }

    Node::from_parts(NodeKind::Revision, builder.build()?, PayloadMap::default())
}

// ============================================================================
// Defaults
// ============================================================================

/// Convenience wrapper for mesh construction with the stock 16 MiB limit.
pub fn make_mesh_node_default(
    input: &MeshInput,
    name: &str,
    parents: &[NodeId],
    generator: &mut IdGenerator,
) -> Result<Node> {
    make_mesh_node(input, name, parents, generator, MAX_DOCUMENT_BYTES)
}
