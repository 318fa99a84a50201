//! Scene assembly from adapter-emitted node sets.

use rustc_hash::FxHashMap;

use crate::errors::Result;
use crate::ids::{IdGenerator, NodeId};
use crate::math::{BoundingBox, Vector3};
use crate::nodes::factory::make_root_node;
use crate::nodes::{Node, NodeKind};
use crate::scene::{AssemblyConfig, SceneFlags, SceneGraph};

/// Assembles a [`SceneGraph`] from the node sets one or more format-adapter
/// passes produce.
///
/// The builder never rejects scene content: malformed or partial input is
/// recorded through [`SceneFlags`] and `log::warn!`, and [`SceneBuilder::build`]
/// produces a graph from whatever was collected.
#[derive(Debug)]
pub struct SceneBuilder {
    name: String,
    config: AssemblyConfig,
    sets: FxHashMap<NodeKind, Vec<Node>>,
    flags: SceneFlags,
    source_files: Vec<String>,
    origin: Option<Vector3>,
}

impl SceneBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, AssemblyConfig::default())
    }

    #[must_use]
    pub fn with_config(name: impl Into<String>, config: AssemblyConfig) -> Self {
        Self {
            name: name.into(),
            config,
            sets: FxHashMap::default(),
            flags: SceneFlags::empty(),
            source_files: Vec::new(),
            origin: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    // ========================================================================
    // Collection
    // ========================================================================

    /// Adds one node to its kind's set, preserving insertion order.
    pub fn add_node(&mut self, node: Node) -> &mut Self {
        self.sets.entry(node.kind()).or_default().push(node);
        self
    }

    /// Adds a whole adapter pass worth of nodes.
    pub fn add_nodes(&mut self, nodes: impl IntoIterator<Item = Node>) -> &mut Self {
        for node in nodes {
            self.add_node(node);
        }
        self
    }

    /// Records a source file for the revision's file references.
    pub fn add_source_file(&mut self, file: impl Into<String>) -> &mut Self {
        self.source_files.push(file.into());
        self
    }

    /// Records the adapter-supplied origin the coordinates were shifted by;
    /// the recorded world offset becomes `bbox.min - origin`.
    ///
    /// Recording only — shifting the coordinates themselves is the adapter's
    /// responsibility.
    pub fn set_origin(&mut self, origin: Vector3) -> &mut Self {
        self.origin = Some(origin);
        self
    }

    /// Flags that at least one texture could not be located or read.
    pub fn set_missing_textures(&mut self) -> &mut Self {
        self.flags |= SceneFlags::MISSING_TEXTURES;
        self
    }

    /// Flags that the adapter dropped nodes it could not convert.
    pub fn set_missing_nodes(&mut self) -> &mut Self {
        self.flags |= SceneFlags::MISSING_NODES;
        self
    }

    // ========================================================================
    // Instancing
    // ========================================================================

    /// Duplicates an already-collected mesh under a second parent.
    ///
    /// Mesh content is position-dependent, so the copy gets a fresh unique
    /// id AND a fresh shared id, its parent list is replaced with
    /// `[new_parent]`, and its external payloads are re-keyed. Returns the
    /// duplicate's shared id, or `None` (with a warning) when no mesh with
    /// `mesh_shared_id` has been collected.
    pub fn duplicate_mesh(
        &mut self,
        mesh_shared_id: NodeId,
        new_parent: NodeId,
        generator: &mut IdGenerator,
    ) -> Option<NodeId> {
        let meshes = self.sets.entry(NodeKind::Mesh).or_default();
        let Some(mesh) = meshes.iter().find(|node| node.shared_id() == mesh_shared_id) else {
            log::warn!("Cannot duplicate mesh {mesh_shared_id}: no such mesh collected");
            return None;
        };
        let duplicate = mesh.clone_as_instance(new_parent, generator);
        let duplicate_shared = duplicate.shared_id();
        meshes.push(duplicate);
        Some(duplicate_shared)
    }

    // ========================================================================
    // Assembly
    // ========================================================================

    /// Assembles the collected sets into a [`SceneGraph`].
    ///
    /// Guarantees a single root transformation: when the collected passes
    /// yield zero or several parentless transformations, an identity
    /// "RootNode" is created and the parentless ones are reparented under
    /// it. Records the world offset and sets
    /// [`SceneFlags::EXCEEDS_MAXIMUM_NODES`] when the node count crosses
    /// the configured ceiling.
    ///
    /// No scene content is ever rejected; the `Result` only carries internal
    /// document-construction failures.
    pub fn build(mut self, generator: &mut IdGenerator) -> Result<SceneGraph> {
        let root = self.ensure_single_root(generator)?;
        let world_offset = self.world_offset();

        let mut flags = self.flags;
        let total: usize = self.sets.values().map(Vec::len).sum();
        if total > self.config.max_node_count {
            log::warn!(
                "Scene has {total} nodes, exceeding the configured maximum of {}",
                self.config.max_node_count
            );
            flags |= SceneFlags::EXCEEDS_MAXIMUM_NODES;
        }

        Ok(SceneGraph {
            name: self.name,
            sets: self.sets,
            root: Some(root),
            world_offset,
            flags,
            source_files: self.source_files,
        })
    }

    /// Returns the shared id of the scene's sole root transformation,
    /// synthesizing one when needed.
    fn ensure_single_root(&mut self, generator: &mut IdGenerator) -> Result<NodeId> {
        let transformations = self.sets.entry(NodeKind::Transformation).or_default();
        let parentless: Vec<usize> = transformations
            .iter()
            .enumerate()
            .filter(|(_, node)| node.parents().is_empty())
            .map(|(index, _)| index)
            .collect();

        if let [only] = parentless[..] {
            return Ok(transformations[only].shared_id());
        }

        let root = make_root_node(generator)?;
        let root_shared = root.shared_id();
        for index in parentless {
            let reparented = transformations[index].clone_with_parent(root_shared, generator);
            transformations[index] = reparented;
        }
        transformations.insert(0, root);
        Ok(root_shared)
    }

    /// Aggregate mesh bounding-box minimum, shifted by the adapter origin
    /// when one was recorded; zero when the scene has no mesh bounds.
    fn world_offset(&self) -> Vector3 {
        let mut bounds = BoundingBox::empty();
        for mesh in self.sets.get(&NodeKind::Mesh).map_or(&[][..], Vec::as_slice) {
            if let Some(bbox) = mesh.bounding_box() {
                bounds = bounds.union(&bbox);
            }
        }
        if !bounds.is_valid() {
            log::warn!("Scene has no mesh bounds; recording a zero world offset");
            return Vector3::ZERO;
        }
        match self.origin {
            Some(origin) => bounds.min - origin,
            None => bounds.min,
        }
    }
}
