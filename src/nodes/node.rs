//! The document-backed node and its copy-on-write modifiers.

use glam::{Vec2, Vec3};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::document::{Document, FieldValue};
use crate::errors::Result;
use crate::ids::{IdGenerator, NodeId};
use crate::math::{BoundingBox, Matrix44, Vector3};
use crate::nodes::{labels, Color4, Face, NodeKind, Primitive};

/// A binary payload stored outside its owning document.
///
/// `name` doubles as the external storage key and the in-document link
/// value, following the `<unique_id>_<field>` convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalBlob {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Field label → externally stored payload.
pub type PayloadMap = FxHashMap<&'static str, ExternalBlob>;

/// A scene node: a finalized document, its out-of-line payloads, and the
/// kind tag driving capability dispatch.
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    unique_id: NodeId,
    shared_id: NodeId,
    document: Document,
    payloads: PayloadMap,
}

impl Node {
    /// Assembles a node from a finalized document and payload map.
    ///
    /// Fails when the document is missing either identity field (the
    /// factory guarantees both, so that only fires for hand-built
    /// documents) or when it exceeds the absolute store ceiling — which
    /// only a document with no externalizable payloads can reach.
    pub fn from_parts(kind: NodeKind, document: Document, payloads: PayloadMap) -> Result<Self> {
        let unique_id = document.require_uuid(labels::ID)?;
        let shared_id = document.require_uuid(labels::SHARED_ID)?;
        document.check_size(crate::document::MAX_DOCUMENT_BYTES)?;
        Ok(Self { kind, unique_id, shared_id, document, payloads })
    }

    // ========================================================================
    // Common accessors
    // ========================================================================

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Identifies this immutable content revision.
    #[must_use]
    pub fn unique_id(&self) -> NodeId {
        self.unique_id
    }

    /// Identifies the logical entity; all graph edges use this id.
    #[must_use]
    pub fn shared_id(&self) -> NodeId {
        self.shared_id
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.document.get_str(labels::NAME)
    }

    /// Shared ids of the parents; empty means attached to the scene root.
    #[must_use]
    pub fn parents(&self) -> SmallVec<[NodeId; 2]> {
        self.document
            .get_document(labels::PARENTS)
            .map(|array| array.array_values().filter_map(FieldValue::as_uuid).collect())
            .unwrap_or_default()
    }

    /// The backing document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Externally stored binary payloads.
    #[must_use]
    pub fn payloads(&self) -> &PayloadMap {
        &self.payloads
    }

    /// Drains the external payloads, transferring their ownership to the
    /// caller (the persistence layer).
    pub fn take_payloads(&mut self) -> PayloadMap {
        std::mem::take(&mut self.payloads)
    }

    /// Reads a binary field regardless of where it lives: embedded in the
    /// document or externalized into the payload map.
    #[must_use]
    pub fn binary_field(&self, label: &str) -> Option<&[u8]> {
        self.document
            .get_binary(label)
            .or_else(|| self.payloads.get(label).map(|blob| blob.bytes.as_slice()))
    }

    // ========================================================================
    // Typed views
    // ========================================================================

    /// Transformation matrix (transformation nodes).
    #[must_use]
    pub fn matrix(&self) -> Option<Matrix44> {
        let rows_doc = self.document.get_document(labels::MATRIX)?;
        let mut rows = [[0.0; 4]; 4];
        for (i, row_value) in rows_doc.array_values().take(4).enumerate() {
            let row_doc = row_value.as_document()?;
            for (j, value) in row_doc.array_values().take(4).enumerate() {
                rows[i][j] = value.as_f64()?;
            }
        }
        Some(Matrix44::from_rows(rows))
    }

    /// Mesh vertex positions.
    #[must_use]
    pub fn vertices(&self) -> Option<Vec<Vec3>> {
        self.binary_field(labels::VERTICES)
            .map(bytemuck::pod_collect_to_vec)
    }

    /// Mesh normals.
    #[must_use]
    pub fn normals(&self) -> Option<Vec<Vec3>> {
        self.binary_field(labels::NORMALS)
            .map(bytemuck::pod_collect_to_vec)
    }

    /// Per-vertex colors.
    #[must_use]
    pub fn colors(&self) -> Option<Vec<Color4>> {
        self.binary_field(labels::COLORS)
            .map(bytemuck::pod_collect_to_vec)
    }

    /// Reconstructs the face lists from the flattened
    /// `[n1, i…, n2, i…, …]` buffer.
    #[must_use]
    pub fn faces(&self) -> Option<Vec<Face>> {
        let flattened: Vec<u32> = self
            .binary_field(labels::FACES)
            .map(bytemuck::pod_collect_to_vec)?;
        let mut faces = Vec::new();
        let mut cursor = 0;
        while cursor < flattened.len() {
            let arity = flattened[cursor] as usize;
            cursor += 1;
            if cursor + arity > flattened.len() {
                log::warn!("Truncated face buffer: expected {arity} more indices");
                break;
            }
            faces.push(flattened[cursor..cursor + arity].to_vec());
            cursor += arity;
        }
        Some(faces)
    }

    /// The inferred primitive type of this mesh.
    #[must_use]
    pub fn primitive(&self) -> Option<Primitive> {
        match self.document.get_i64(labels::PRIMITIVE)? {
            2 => Some(Primitive::Lines),
            3 => Some(Primitive::Triangles),
            _ => Some(Primitive::Unknown),
        }
    }

    /// UV coordinates, split back into their channels.
    #[must_use]
    pub fn uv_channels(&self) -> Option<Vec<Vec<Vec2>>> {
        let count = usize::try_from(self.document.get_i64(labels::UV_CHANNELS_COUNT)?).ok()?;
        if count == 0 {
            return Some(Vec::new());
        }
        let concatenated: Vec<Vec2> = self
            .binary_field(labels::UV_CHANNELS)
            .map(bytemuck::pod_collect_to_vec)?;
        let per_channel = concatenated.len() / count;
        Some(
            concatenated
                .chunks(per_channel.max(1))
                .take(count)
                .map(<[Vec2]>::to_vec)
                .collect(),
        )
    }

    /// Mesh bounding box, decoded from the `[[min], [max]]` array pair.
    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let corners = self.document.get_document(labels::BOUNDING_BOX)?;
        let mut values = corners.array_values().filter_map(FieldValue::as_document);
        let decode = |doc: &Document| -> Option<Vector3> {
            let mut axes = doc.array_values().filter_map(FieldValue::as_f64);
            Some(Vector3::new(axes.next()?, axes.next()?, axes.next()?))
        };
        let min = decode(values.next()?)?;
        let max = decode(values.next()?)?;
        Some(BoundingBox { min, max })
    }

    /// The embedded key→value map of a metadata node.
    #[must_use]
    pub fn metadata(&self) -> Option<&Document> {
        self.document.get_document(labels::METADATA)
    }

    /// World offset recorded on a revision node.
    #[must_use]
    pub fn world_offset(&self) -> Option<Vector3> {
        let array = self.document.get_document(labels::WORLD_COORD_SHIFT)?;
        let mut axes = array.array_values().filter_map(FieldValue::as_f64);
        Some(Vector3::new(axes.next()?, axes.next()?, axes.next()?))
    }

    /// Unique ids of the content nodes a revision captures.
    #[must_use]
    pub fn current_nodes(&self) -> Vec<NodeId> {
        self.document
            .get_document(labels::CURRENT_NODES)
            .map(|array| array.array_values().filter_map(FieldValue::as_uuid).collect())
            .unwrap_or_default()
    }

    // ========================================================================
    // Capability dispatch
    // ========================================================================

    /// Whether this node's content depends on its position under a parent
    /// transformation (and therefore must be duplicated rather than shared
    /// when instanced under several transforms).
    #[must_use]
    pub fn position_dependent(&self) -> bool {
        matches!(self.kind, NodeKind::Mesh | NodeKind::Camera)
    }

    /// Returns a new node with `parent` added to the parent list.
    ///
    /// The shared id is preserved — this is still the same logical entity —
    /// but the content revision changes, so a fresh unique id is assigned
    /// and external payloads are re-keyed accordingly.
    #[must_use]
    pub fn clone_with_parent(&self, parent: NodeId, generator: &mut IdGenerator) -> Self {
        let mut parents = self.parents();
        if !parents.contains(&parent) {
            parents.push(parent);
        }
        self.rebuild(generator.next_id(), self.shared_id, &parents, Vec::new())
    }

    /// Returns an independent copy parented under `parent` alone.
    ///
    /// Both ids are fresh: a shared-identifier edge model cannot express one
    /// node under two unrelated parent sets without ambiguity in later
    /// partial updates, so instancing establishes an independent lifetime.
    #[must_use]
    pub fn clone_as_instance(&self, parent: NodeId, generator: &mut IdGenerator) -> Self {
        self.rebuild(generator.next_id(), generator.next_id(), &[parent], Vec::new())
    }

    /// Returns a new node with `transform` applied to its content.
    ///
    /// Transformation nodes compose the matrix; meshes transform vertices,
    /// normals (3×3 part, renormalized) and the bounding box; other kinds
    /// only receive the fresh unique id.
    #[must_use]
    pub fn clone_with_transform(&self, transform: &Matrix44, generator: &mut IdGenerator) -> Self {
        let overrides = match self.kind {
            NodeKind::Transformation => self
                .matrix()
                .map(|matrix| {
                    vec![(labels::MATRIX, matrix_field(&(*transform * matrix)))]
                })
                .unwrap_or_default(),
            NodeKind::Mesh => self.transformed_mesh_fields(transform),
            _ => Vec::new(),
        };
        self.rebuild(generator.next_id(), self.shared_id, &self.parents(), overrides)
    }

    fn transformed_mesh_fields(&self, transform: &Matrix44) -> Vec<(&'static str, FieldValue)> {
        if !transform.has_affine_last_row() {
            log::warn!(
                "Applying a transformation whose last row is not [0, 0, 0, 1] to mesh {}",
                self.unique_id
            );
        }
        let mut overrides = Vec::new();
        if let Some(vertices) = self.vertices() {
            let moved: Vec<Vec3> = vertices
                .iter()
                .map(|v| transform.transform_point_affine(v.as_dvec3()).as_vec3())
                .collect();
            let bbox = BoundingBox::from_points(moved.iter().map(|v| v.as_dvec3()));
            overrides.push((
                labels::VERTICES,
                FieldValue::Binary(bytemuck::cast_slice(&moved).to_vec()),
            ));
            if bbox.is_valid() {
                overrides.push((labels::BOUNDING_BOX, bounding_box_field(&bbox)));
            }
        }
        if let Some(normals) = self.normals() {
            let rotated: Vec<Vec3> = normals
                .iter()
                .map(|n| {
                    transform
                        .transform_direction(n.as_dvec3())
                        .normalize_or_zero()
                        .as_vec3()
                })
                .collect();
            overrides.push((
                labels::NORMALS,
                FieldValue::Binary(bytemuck::cast_slice(&rotated).to_vec()),
            ));
        }
        overrides
    }

    /// Copy-on-write over the backing document: replaces the identity and
    /// parent fields (and any overrides) while preserving field order, then
    /// re-keys external payloads to the new unique id.
    ///
    /// An override targeting an externalized field replaces the payload
    /// bytes and stays external; it never becomes an embedded document
    /// field.
    fn rebuild(
        &self,
        new_unique: NodeId,
        new_shared: NodeId,
        parents: &[NodeId],
        mut overrides: Vec<(&'static str, FieldValue)>,
    ) -> Self {
        let mut payload_overrides: FxHashMap<&'static str, Vec<u8>> = FxHashMap::default();
        overrides.retain_mut(|(label, value)| {
            if self.payloads.contains_key(*label) {
                if let FieldValue::Binary(bytes) = value {
                    payload_overrides.insert(*label, std::mem::take(bytes));
                    return false;
                }
            }
            true
        });

        let mut fields: Vec<(String, FieldValue)> = Vec::with_capacity(self.document.len() + 1);
        let mut wrote_parents = false;
        for (name, value) in self.document.iter() {
            let replacement = if name == labels::ID {
                FieldValue::Uuid(new_unique)
            } else if name == labels::SHARED_ID {
                FieldValue::Uuid(new_shared)
            } else if name == labels::PARENTS {
                wrote_parents = true;
                parents_field(parents)
            } else if let Some(at) = overrides.iter().position(|(key, _)| *key == name) {
                overrides.remove(at).1
            } else {
                value.clone()
            };
            fields.push((name.to_string(), replacement));
        }
        if !wrote_parents && !parents.is_empty() {
            fields.push((labels::PARENTS.to_string(), parents_field(parents)));
        }
        for (key, value) in overrides {
            fields.push((key.to_string(), value));
        }

        let payloads = self
            .payloads
            .iter()
            .map(|(&label, blob)| {
                let bytes = payload_overrides
                    .remove(label)
                    .unwrap_or_else(|| blob.bytes.clone());
                (
                    label,
                    ExternalBlob {
                        name: format!("{new_unique}_{label}"),
                        bytes,
                    },
                )
            })
            .collect();

        Self {
            kind: self.kind,
            unique_id: new_unique,
            shared_id: new_shared,
            document: Document::from_fields(fields),
            payloads,
        }
    }
}

pub(crate) fn parents_field(parents: &[NodeId]) -> FieldValue {
    FieldValue::Array(Document::array_from(
        parents.iter().map(|&id| FieldValue::Uuid(id)),
    ))
}

pub(crate) fn matrix_field(matrix: &Matrix44) -> FieldValue {
    FieldValue::Array(Document::array_from(matrix.rows().iter().map(|row| {
        FieldValue::Array(Document::array_from(
            row.iter().map(|&value| FieldValue::Double(value)),
        ))
    })))
}

pub(crate) fn bounding_box_field(bbox: &BoundingBox) -> FieldValue {
    let corner = |v: Vector3| {
        FieldValue::Array(Document::array_from(
            [v.x, v.y, v.z].into_iter().map(FieldValue::Double),
        ))
    };
    FieldValue::Array(Document::array_from([corner(bbox.min), corner(bbox.max)]))
}
