//! Scene graph module
//!
//! Manages the scene hierarchy and its derived data:
//! - Node: scene node (hierarchy, transform, bounds, render state)
//! - Transform: local TRS state and lazily rebuilt matrices
//! - Boundary: lazily rebuilt world AABB / OBB
//! - Scene: node registry, hierarchy operations, entity maps, events
//! - TransformSystem: world matrix resolution and subtree invalidation

pub mod boundary;
pub mod entity;
pub mod events;
pub mod hierarchy;
pub mod node;
pub mod scene;
pub mod state;
pub mod transform;
pub mod transform_system;
pub mod wrapper;

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use slotmap::new_key_type;

// Re-export commonly used types
pub use entity::EntityRegistry;
pub use events::ListenerKey;
pub use node::Node;
pub use scene::{NodeBuilder, Scene};
pub use state::{RenderFlags, RenderState, StateChange};
pub use transform::Transform;
pub use wrapper::SceneNode;

new_key_type! {
    /// Arena key of a node inside its scene.
    pub struct NodeKey;
}

/// Process-unique identity of a [`Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneId(pub(crate) u32);

static NEXT_SCENE_ID: AtomicU32 = AtomicU32::new(1);

impl SceneId {
    pub(crate) fn next() -> Self {
        Self(NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handle to a node, tagged with the scene that created it.
///
/// Handles are `Copy` and never keep a node alive. Using a handle after its
/// node was destroyed, or on another scene, is reported as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    pub(crate) scene: SceneId,
    pub(crate) key: NodeKey,
}

impl NodeHandle {
    /// The scene this handle belongs to.
    #[inline]
    #[must_use]
    pub fn scene(&self) -> SceneId {
        self.scene
    }
}

/// Scene-unique node identifier, either numeric or textual.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectId {
    Num(u64),
    Str(String),
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<u64> for ObjectId {
    fn from(n: u64) -> Self {
        Self::Num(n)
    }
}

impl From<&str> for ObjectId {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for ObjectId {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

/// A node given either directly by handle or by id, resolved through the
/// scene registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeRef {
    Handle(NodeHandle),
    Id(ObjectId),
}

impl From<NodeHandle> for NodeRef {
    fn from(handle: NodeHandle) -> Self {
        Self::Handle(handle)
    }
}

impl From<ObjectId> for NodeRef {
    fn from(id: ObjectId) -> Self {
        Self::Id(id)
    }
}

impl From<&ObjectId> for NodeRef {
    fn from(id: &ObjectId) -> Self {
        Self::Id(id.clone())
    }
}

impl From<&str> for NodeRef {
    fn from(id: &str) -> Self {
        Self::Id(id.into())
    }
}

impl From<String> for NodeRef {
    fn from(id: String) -> Self {
        Self::Id(id.into())
    }
}

impl From<u64> for NodeRef {
    fn from(id: u64) -> Self {
        Self::Id(id.into())
    }
}
