//! The assembled scene graph.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::ids::NodeId;
use crate::math::Vector3;
use crate::nodes::{ExternalBlob, Node, NodeKind};
use crate::scene::SceneFlags;

/// A finding reported by the opt-in [`SceneGraph::validate`] pass.
///
/// The core does not enforce graph consistency at construction time —
/// adapters and the assembly step uphold it by contract — so these checks
/// never run implicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationFinding {
    /// A parent edge references a shared id no node in the scene carries.
    DanglingParent { node: NodeId, parent: NodeId },
    /// Two distinct nodes share one unique id.
    DuplicateUniqueId(NodeId),
}

/// The complete set of typed node collections plus scene-level metadata
/// produced by one import.
#[derive(Debug, Default)]
pub struct SceneGraph {
    pub(crate) name: String,
    pub(crate) sets: FxHashMap<NodeKind, Vec<Node>>,
    pub(crate) root: Option<NodeId>,
    pub(crate) world_offset: Vector3,
    pub(crate) flags: SceneFlags,
    pub(crate) source_files: Vec<String>,
}

impl SceneGraph {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All nodes of one kind, in insertion order.
    #[must_use]
    pub fn nodes(&self, kind: NodeKind) -> &[Node] {
        self.sets.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Shared id of the root transformation, when one exists.
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Translation that was subtracted from all coordinates to keep values
    /// near the origin.
    #[must_use]
    pub fn world_offset(&self) -> Vector3 {
        self.world_offset
    }

    #[must_use]
    pub fn flags(&self) -> SceneFlags {
        self.flags
    }

    #[must_use]
    pub fn source_files(&self) -> &[String] {
        &self.source_files
    }

    #[must_use]
    pub fn total_node_count(&self) -> usize {
        self.sets.values().map(Vec::len).sum()
    }

    /// Looks a node up by its shared id within one kind's set.
    #[must_use]
    pub fn node_by_shared_id(&self, kind: NodeKind, shared_id: NodeId) -> Option<&Node> {
        self.nodes(kind).iter().find(|node| node.shared_id() == shared_id)
    }

    /// All nodes (of any kind) whose parent list contains `shared_id`.
    #[must_use]
    pub fn children_of(&self, shared_id: NodeId) -> Vec<&Node> {
        self.iter_all()
            .filter(|node| node.parents().contains(&shared_id))
            .collect()
    }

    /// Every node in the scene, kind by kind.
    pub fn iter_all(&self) -> impl Iterator<Item = &Node> {
        NodeKind::ALL.iter().flat_map(|kind| self.nodes(*kind).iter())
    }

    /// Opt-in consistency pass: reports dangling parent references and
    /// duplicated unique ids without failing the scene.
    #[must_use]
    pub fn validate(&self) -> Vec<ValidationFinding> {
        let mut findings = Vec::new();

        let shared_ids: FxHashSet<NodeId> = self.iter_all().map(Node::shared_id).collect();
        let mut seen_unique = FxHashSet::default();

        for node in self.iter_all() {
            if !seen_unique.insert(node.unique_id()) {
                findings.push(ValidationFinding::DuplicateUniqueId(node.unique_id()));
            }
            for parent in node.parents() {
                if !shared_ids.contains(&parent) {
                    findings.push(ValidationFinding::DanglingParent {
                        node: node.unique_id(),
                        parent,
                    });
                }
            }
        }
        findings
    }

    /// Drains every node's external payloads, transferring ownership to the
    /// persistence layer; the in-memory copies are released here.
    pub fn take_payloads(&mut self) -> Vec<ExternalBlob> {
        let mut blobs = Vec::new();
        for nodes in self.sets.values_mut() {
            for node in nodes {
                blobs.extend(node.take_payloads().into_values());
            }
        }
        blobs
    }
}
