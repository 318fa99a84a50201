#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod document;
pub mod errors;
pub mod ids;
pub mod math;
pub mod nodes;
pub mod scene;

pub use document::{Document, DocumentBuilder, FieldValue, MAX_DOCUMENT_BYTES};
pub use errors::TrellisError;
pub use ids::{shared_generator, IdGenerator, NodeId};
pub use math::{BoundingBox, Matrix44, Vector2, Vector3};
pub use nodes::{
    CameraInput, Color4, ExternalBlob, Face, MaterialInput, MeshInput, Node, NodeKind, Primitive,
    RevisionInput,
};
pub use scene::{AssemblyConfig, SceneBuilder, SceneFlags, SceneGraph, ValidationFinding};
