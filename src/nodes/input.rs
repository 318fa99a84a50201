//! Raw adapter inputs.
//!
//! Format adapters (Assimp-based, IFC, vendor-SDK, …) hand these plain
//! structures to the factory; the factory turns them into document-backed
//! nodes. Geometry is `f32`, matching the payload storage format — adapters
//! working in doubles convert after applying the world offset.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// One face: a variable-arity list of vertex indices.
pub type Face = Vec<u32>;

/// Per-vertex RGBA color.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Color4 {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Primitive type of a mesh, inferred from the arity of its first face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Primitive {
    Unknown = 0,
    Lines = 2,
    Triangles = 3,
}

impl Primitive {
    /// Infers the primitive from one face's index count.
    #[must_use]
    pub fn from_arity(arity: usize) -> Self {
        match arity {
            2 => Self::Lines,
            3 => Self::Triangles,
            _ => Self::Unknown,
        }
    }

    /// The face arity this primitive implies (0 for unknown).
    #[must_use]
    pub fn arity(self) -> usize {
        match self {
            Self::Unknown => 0,
            Self::Lines => 2,
            Self::Triangles => 3,
        }
    }
}

/// Raw mesh geometry handed over by an adapter.
#[derive(Debug, Clone, Default)]
pub struct MeshInput {
    pub vertices: Vec<Vec3>,
    pub faces: Vec<Face>,
    pub normals: Vec<Vec3>,
    pub colors: Vec<Color4>,
    /// Per-channel UV coordinates; channels are concatenated on encoding.
    pub uv_channels: Vec<Vec<Vec2>>,
    /// 2D outline polygon(s), one `[x, y]` pair per entry.
    pub outline: Vec<[f64; 2]>,
}

/// Material description record.
///
/// `f32::NAN` is the "unset" sentinel for the scalar properties; unset
/// scalars are omitted from the encoded document entirely.
#[derive(Debug, Clone)]
pub struct MaterialInput {
    pub ambient: Option<[f32; 3]>,
    pub diffuse: Option<[f32; 3]>,
    pub specular: Option<[f32; 3]>,
    pub emissive: Option<[f32; 3]>,
    pub opacity: f32,
    pub shininess: f32,
    pub shininess_strength: f32,
    pub line_weight: f32,
    pub is_wireframe: bool,
    pub is_two_sided: bool,
}

impl Default for MaterialInput {
    fn default() -> Self {
        Self {
            ambient: None,
            diffuse: None,
            specular: None,
            emissive: None,
            opacity: f32::NAN,
            shininess: f32::NAN,
            shininess_strength: f32::NAN,
            line_weight: f32::NAN,
            is_wireframe: false,
            is_two_sided: false,
        }
    }
}

/// Camera parameters.
#[derive(Debug, Clone)]
pub struct CameraInput {
    pub aspect_ratio: f32,
    pub near_clipping_plane: f32,
    pub far_clipping_plane: f32,
    pub field_of_view: f32,
    pub look_at: Vec3,
    pub position: Vec3,
    pub up: Vec3,
}

impl Default for CameraInput {
    fn default() -> Self {
        Self {
            aspect_ratio: 1.0,
            near_clipping_plane: 0.1,
            far_clipping_plane: 1000.0,
            field_of_view: 0.785_398,
            look_at: Vec3::Z,
            position: Vec3::ZERO,
            up: Vec3::Y,
        }
    }
}

/// Everything a revision records about one import.
#[derive(Debug, Clone, Default)]
pub struct RevisionInput {
    pub author: String,
    pub message: String,
    pub tag: String,
    /// Unique ids of the content nodes constituting this revision.
    pub current_nodes: Vec<crate::ids::NodeId>,
    /// Translation subtracted from all coordinates to keep values near the
    /// origin.
    pub world_offset: [f64; 3],
    /// Original source file name(s).
    pub source_files: Vec<String>,
}
