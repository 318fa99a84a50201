//! Scene Graph Assembly
//!
//! Combines the node sets emitted by one or more format-adapter passes into
//! a single consistent scene graph with stable identity.
//!
//! # Overview
//!
//! - [`SceneGraph`] — the finished product: per-kind node sets, the world
//!   offset, advisory state flags, and the source file list. Built once,
//!   handed to persistence, then discarded; no in-place mutation after
//!   handoff.
//! - [`SceneBuilder`] — the assembly step: collects nodes, guarantees a
//!   single root transformation, records the world offset, handles
//!   instancing duplication, and accumulates partial-failure flags.
//!
//! Parent/child edges reference **shared ids** exclusively; a node's
//! content revision can change (new unique id) without touching edges from
//! other nodes.

mod builder;
mod graph;

pub use builder::SceneBuilder;
pub use graph::{SceneGraph, ValidationFinding};

use bitflags::bitflags;

use crate::document::MAX_DOCUMENT_BYTES;

bitflags! {
    /// Advisory state accumulated during assembly.
    ///
    /// None of these make construction fail; the caller decides whether any
    /// of them constitute a hard failure for its workflow.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct SceneFlags: u32 {
        /// At least one texture file could not be located or read.
        const MISSING_TEXTURES = 1 << 0;
        /// An adapter reported partial failure (e.g. unsupported geometry).
        const MISSING_NODES = 1 << 1;
        /// Total node count crossed the configured ceiling.
        const EXCEEDS_MAXIMUM_NODES = 1 << 2;
    }
}

/// Assembly limits.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyConfig {
    /// Maximum encoded size of one document; larger binary payloads are
    /// externalized by the node factory.
    pub max_document_bytes: usize,
    /// Node-count ceiling; crossing it sets
    /// [`SceneFlags::EXCEEDS_MAXIMUM_NODES`].
    pub max_node_count: usize,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            max_document_bytes: MAX_DOCUMENT_BYTES,
            max_node_count: 1_000_000,
        }
    }
}
