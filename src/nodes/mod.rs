//! Node Model
//!
//! Polymorphic, document-backed scene nodes.
//!
//! # Overview
//!
//! Every node is a finalized [`Document`](crate::document::Document) plus an
//! auxiliary map of externally stored binary payloads, tagged with a
//! [`NodeKind`]. The common contract:
//!
//! - `_id` — the **unique id**, naming one immutable content revision
//! - `shared_id` — the **logical** identity used by all parent/child edges
//! - `type` — the wire discriminator string
//! - `parents` — shared ids of the parents (omitted when attached to root)
//! - `name` — optional display name
//!
//! Nodes are immutable once constructed. "Modification" — adding a parent,
//! applying a transform, instancing — always produces a *new* node with a
//! new unique id (see [`Node::clone_with_parent`],
//! [`Node::clone_as_instance`], [`Node::clone_with_transform`]).
//!
//! The original polymorphic class hierarchy is flattened into the closed
//! [`NodeKind`] tag with capability dispatch on the kind
//! ([`Node::position_dependent`] etc.) rather than virtual inheritance.

mod node;

pub mod factory;
pub mod input;

pub use input::{
    CameraInput, Color4, Face, MaterialInput, MeshInput, Primitive, RevisionInput,
};
pub use node::{ExternalBlob, Node, PayloadMap};

/// Wire-format field names and type discriminators.
///
/// These string literals are format-significant: documents encoded by this
/// crate are byte-compatible with stores written by earlier implementations,
/// so the names must stay stable.
pub mod labels {
    // Common node fields
    pub const ID: &str = "_id";
    pub const SHARED_ID: &str = "shared_id";
    pub const TYPE: &str = "type";
    pub const PARENTS: &str = "parents";
    pub const NAME: &str = "name";

    // Transformation
    pub const MATRIX: &str = "matrix";

    // Mesh
    pub const VERTICES: &str = "vertices";
    pub const FACES: &str = "faces";
    pub const FACES_COUNT: &str = "faces_count";
    pub const PRIMITIVE: &str = "primitive";
    pub const NORMALS: &str = "normals";
    pub const COLORS: &str = "colors";
    pub const UV_CHANNELS: &str = "uv_channels";
    pub const UV_CHANNELS_COUNT: &str = "uv_channels_count";
    pub const BOUNDING_BOX: &str = "bounding_box";
    pub const OUTLINE: &str = "outline";

    // Material
    pub const AMBIENT: &str = "ambient";
    pub const DIFFUSE: &str = "diffuse";
    pub const SPECULAR: &str = "specular";
    pub const EMISSIVE: &str = "emissive";
    pub const WIREFRAME: &str = "wireframe";
    pub const TWO_SIDED: &str = "two_sided";
    pub const OPACITY: &str = "opacity";
    pub const SHININESS: &str = "shininess";
    pub const SHININESS_STRENGTH: &str = "shininess_strength";
    pub const LINE_WEIGHT: &str = "line_weight";

    // Metadata
    pub const METADATA: &str = "metadata";
    pub const MIME: &str = "mime";

    // Texture
    pub const WIDTH: &str = "width";
    pub const HEIGHT: &str = "height";
    pub const EXTENSION: &str = "extension";
    pub const DATA: &str = "data";

    // Camera
    pub const ASPECT_RATIO: &str = "aspect_ratio";
    pub const FAR: &str = "far";
    pub const NEAR: &str = "near";
    pub const FOV: &str = "fov";
    pub const LOOK_AT: &str = "look_at";
    pub const POSITION: &str = "position";
    pub const UP: &str = "up";

    // Reference
    pub const REF_OWNER: &str = "owner";
    pub const REF_PROJECT: &str = "project";
    pub const REF_REVISION_ID: &str = "_rid";
    pub const REF_UNIQUE: &str = "unique";

    // Revision
    pub const AUTHOR: &str = "author";
    pub const MESSAGE: &str = "desc";
    pub const TAG: &str = "tag";
    pub const TIMESTAMP: &str = "timestamp";
    pub const CURRENT_NODES: &str = "current";
    pub const WORLD_COORD_SHIFT: &str = "coordOffset";
    pub const REF_FILES: &str = "rFile";
}

/// The closed set of node types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Transformation,
    Mesh,
    Material,
    Metadata,
    Texture,
    Camera,
    Reference,
    Revision,
}

impl NodeKind {
    /// All kinds, in the order scene node sets are reported.
    pub const ALL: [Self; 8] = [
        Self::Transformation,
        Self::Mesh,
        Self::Material,
        Self::Metadata,
        Self::Texture,
        Self::Camera,
        Self::Reference,
        Self::Revision,
    ];

    /// The wire-format type discriminator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transformation => "transformation",
            Self::Mesh => "mesh",
            Self::Material => "material",
            Self::Metadata => "meta",
            Self::Texture => "texture",
            Self::Camera => "camera",
            Self::Reference => "ref",
            Self::Revision => "revision",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
