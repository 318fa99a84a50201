//! Scene Assembly Integration Tests
//!
//! Tests for:
//! - Single-root guarantee across one and several adapter passes
//! - Mesh instancing (fresh identity, replaced parent)
//! - World offset recording (bbox minimum, adapter origin, no meshes)
//! - Advisory flags: missing textures/nodes, node-count ceiling
//! - Opt-in validation findings and payload ownership transfer

use glam::Vec3;
use trellis::nodes::factory::{
    make_mesh_node, make_mesh_node_default, make_transformation_node,
};
use trellis::nodes::{labels, PayloadMap};
use trellis::{
    AssemblyConfig, DocumentBuilder, IdGenerator, Matrix44, MeshInput, Node, NodeId, NodeKind,
    SceneBuilder, SceneFlags, ValidationFinding, Vector3,
};

fn mesh_at(origin: Vec3) -> MeshInput {
    MeshInput {
        vertices: vec![origin, origin + Vec3::X, origin + Vec3::Y],
        faces: vec![vec![0, 1, 2]],
        ..MeshInput::default()
    }
}

/// One adapter pass: a parentless transformation with a mesh under it.
fn adapter_pass(generator: &mut IdGenerator, origin: Vec3) -> Vec<Node> {
    let group = make_transformation_node(&Matrix44::identity(), "group", &[], generator).unwrap();
    let mesh =
        make_mesh_node_default(&mesh_at(origin), "slab", &[group.shared_id()], generator).unwrap();
    vec![group, mesh]
}

// ============================================================================
// Single-root guarantee
// ============================================================================

#[test]
fn one_parentless_transformation_becomes_the_root() {
    let mut generator = IdGenerator::seeded(1);
    let pass = adapter_pass(&mut generator, Vec3::ZERO);
    let group_shared = pass[0].shared_id();

    let mut builder = SceneBuilder::new("tower");
    builder.add_nodes(pass);
    let scene = builder.build(&mut generator).unwrap();

    assert_eq!(scene.root(), Some(group_shared));
    // No synthetic root was inserted.
    assert_eq!(scene.nodes(NodeKind::Transformation).len(), 1);
}

#[test]
fn merging_two_passes_synthesizes_one_root() {
    let mut generator = IdGenerator::seeded(2);
    let mut builder = SceneBuilder::new("tower");
    builder.add_nodes(adapter_pass(&mut generator, Vec3::ZERO));
    builder.add_nodes(adapter_pass(&mut generator, Vec3::splat(10.0)));
    let scene = builder.build(&mut generator).unwrap();

    let root = scene.root().unwrap();
    let transformations = scene.nodes(NodeKind::Transformation);
    assert_eq!(transformations.len(), 3);

    let root_node = scene
        .node_by_shared_id(NodeKind::Transformation, root)
        .unwrap();
    assert_eq!(root_node.name(), Some("RootNode"));
    assert!(root_node.matrix().unwrap().is_identity());

    // Both former roots now hang off the synthetic one.
    let children = scene.children_of(root);
    assert_eq!(children.len(), 2);
    assert!(children.iter().all(|node| node.kind() == NodeKind::Transformation));
}

#[test]
fn scene_without_transformations_still_gets_a_root() {
    let mut generator = IdGenerator::seeded(3);
    let mesh = make_mesh_node_default(&mesh_at(Vec3::ZERO), "slab", &[], &mut generator).unwrap();

    let mut builder = SceneBuilder::new("loose");
    builder.add_node(mesh);
    let scene = builder.build(&mut generator).unwrap();

    assert!(scene.root().is_some());
    assert_eq!(scene.nodes(NodeKind::Transformation).len(), 1);
}

// ============================================================================
// Instancing
// ============================================================================

#[test]
fn duplicate_mesh_creates_an_independent_copy() {
    let mut generator = IdGenerator::seeded(4);
    let pass = adapter_pass(&mut generator, Vec3::ZERO);
    let original_shared = pass[1].shared_id();
    let second_parent = generator.next_id();

    let mut builder = SceneBuilder::new("tower");
    builder.add_nodes(pass);
    let duplicate_shared = builder
        .duplicate_mesh(original_shared, second_parent, &mut generator)
        .unwrap();
    assert_ne!(duplicate_shared, original_shared);

    let scene = builder.build(&mut generator).unwrap();
    let meshes = scene.nodes(NodeKind::Mesh);
    assert_eq!(meshes.len(), 2);

    let duplicate = scene
        .node_by_shared_id(NodeKind::Mesh, duplicate_shared)
        .unwrap();
    assert_eq!(duplicate.parents().as_slice(), &[second_parent]);
    let original = scene
        .node_by_shared_id(NodeKind::Mesh, original_shared)
        .unwrap();
    assert_eq!(duplicate.vertices(), original.vertices());
    assert_ne!(duplicate.unique_id(), original.unique_id());
}

#[test]
fn duplicating_an_unknown_mesh_reports_none() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut generator = IdGenerator::seeded(5);
    let mut builder = SceneBuilder::new("tower");
    let missing = generator.next_id();
    let parent = generator.next_id();
    assert!(builder.duplicate_mesh(missing, parent, &mut generator).is_none());
}

// ============================================================================
// World offset
// ============================================================================

#[test]
fn world_offset_is_the_aggregate_bbox_minimum() {
    let mut generator = IdGenerator::seeded(6);
    let mut builder = SceneBuilder::new("site");
    builder.add_nodes(adapter_pass(&mut generator, Vec3::new(10.0, 20.0, 30.0)));
    builder.add_nodes(adapter_pass(&mut generator, Vec3::new(15.0, 5.0, 40.0)));
    let scene = builder.build(&mut generator).unwrap();
    assert_eq!(scene.world_offset(), Vector3::new(10.0, 5.0, 30.0));
}

#[test]
fn adapter_origin_shifts_the_recorded_offset() {
    let mut generator = IdGenerator::seeded(7);
    let mut builder = SceneBuilder::new("site");
    builder.add_nodes(adapter_pass(&mut generator, Vec3::new(10.0, 20.0, 30.0)));
    builder.set_origin(Vector3::new(1.0, 2.0, 3.0));
    let scene = builder.build(&mut generator).unwrap();
    assert_eq!(scene.world_offset(), Vector3::new(9.0, 18.0, 27.0));
}

#[test]
fn scene_without_meshes_records_a_zero_offset() {
    let mut generator = IdGenerator::seeded(8);
    let builder = SceneBuilder::new("empty");
    let scene = builder.build(&mut generator).unwrap();
    assert_eq!(scene.world_offset(), Vector3::ZERO);
}

// ============================================================================
// Advisory flags
// ============================================================================

#[test]
fn partial_failure_flags_accumulate() {
    let mut generator = IdGenerator::seeded(9);
    let mut builder = SceneBuilder::new("partial");
    builder.set_missing_textures();
    builder.set_missing_nodes();
    let scene = builder.build(&mut generator).unwrap();
    assert!(scene.flags().contains(SceneFlags::MISSING_TEXTURES));
    assert!(scene.flags().contains(SceneFlags::MISSING_NODES));
}

#[test]
fn crossing_the_node_ceiling_sets_the_flag() {
    let mut generator = IdGenerator::seeded(10);
    let config = AssemblyConfig {
        max_node_count: 2,
        ..AssemblyConfig::default()
    };
    let mut builder = SceneBuilder::with_config("big", config);
    builder.add_nodes(adapter_pass(&mut generator, Vec3::ZERO));
    builder.add_nodes(adapter_pass(&mut generator, Vec3::ONE));
    let scene = builder.build(&mut generator).unwrap();
    assert!(scene.flags().contains(SceneFlags::EXCEEDS_MAXIMUM_NODES));
    assert!(scene.total_node_count() > 2);
}

// ============================================================================
// Validation
// ============================================================================

fn hand_built_mesh(unique: NodeId, shared: NodeId, parent: Option<NodeId>) -> Node {
    let mut builder = DocumentBuilder::new();
    builder
        .append_uuid(labels::ID, unique)
        .append_uuid(labels::SHARED_ID, shared)
        .append_str(labels::TYPE, "mesh");
    if let Some(parent) = parent {
        builder.append_uuid_array(labels::PARENTS, &[parent]);
    }
    Node::from_parts(NodeKind::Mesh, builder.build().unwrap(), PayloadMap::default()).unwrap()
}

#[test]
fn validate_reports_dangling_parents_and_duplicate_ids() {
    let mut generator = IdGenerator::seeded(11);
    let unique = generator.next_id();
    let shared_a = generator.next_id();
    let shared_b = generator.next_id();
    let nowhere = generator.next_id();

    let mut builder = SceneBuilder::new("broken");
    builder.add_node(hand_built_mesh(unique, shared_a, Some(nowhere)));
    builder.add_node(hand_built_mesh(unique, shared_b, None));
    let scene = builder.build(&mut generator).unwrap();

    let findings = scene.validate();
    assert!(findings.contains(&ValidationFinding::DanglingParent {
        node: unique,
        parent: nowhere,
    }));
    assert!(findings.contains(&ValidationFinding::DuplicateUniqueId(unique)));
}

#[test]
fn a_consistent_scene_validates_clean() {
    let mut generator = IdGenerator::seeded(12);
    let mut builder = SceneBuilder::new("clean");
    builder.add_nodes(adapter_pass(&mut generator, Vec3::ZERO));
    let scene = builder.build(&mut generator).unwrap();
    assert!(scene.validate().is_empty());
}

// ============================================================================
// Payload handoff
// ============================================================================

#[test]
fn take_payloads_transfers_ownership_once() {
    let mut generator = IdGenerator::seeded(13);
    let mesh = make_mesh_node(&mesh_at(Vec3::ZERO), "slab", &[], &mut generator, 64).unwrap();
    assert!(!mesh.payloads().is_empty());

    let mut builder = SceneBuilder::new("tower");
    builder.add_node(mesh);
    let mut scene = builder.build(&mut generator).unwrap();

    let blobs = scene.take_payloads();
    assert!(!blobs.is_empty());
    assert!(blobs.iter().all(|blob| !blob.bytes.is_empty()));
    assert!(scene.take_payloads().is_empty());
}
