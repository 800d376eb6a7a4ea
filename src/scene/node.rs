use std::cell::OnceCell;
use std::rc::Rc;

use glam::{Mat4, Quat, Vec3};
use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::resources::geometry::GeometryBounds;
use crate::scene::boundary::Boundary;
use crate::scene::state::RenderState;
use crate::scene::transform::Transform;
use crate::scene::{NodeHandle, ObjectId};

/// A scene node ("object").
///
/// # Hierarchy
///
/// Nodes are owned by their [`Scene`](crate::Scene). A parent lists its
/// children by handle, in insertion order, and additionally indexes them by
/// id; a child points back to its parent by handle only.
///
/// # Derived data
///
/// The world matrices and the bounds are caches guarded by dirty flags. Read
/// them through the scene ([`Scene::world_matrix`](crate::Scene::world_matrix),
/// [`Scene::aabb`](crate::Scene::aabb), ...) so that stale values are
/// rebuilt first. The accessors on `Node` itself only expose state that never
/// needs the rest of the tree.
#[derive(Debug, Clone)]
pub struct Node {
    // === Identity ===
    pub(crate) id: ObjectId,
    pub(crate) guid: Option<Uuid>,
    /// Empty when the node is unclassified.
    pub(crate) entity_type: String,

    // === Hierarchy ===
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,
    pub(crate) child_map: FxHashMap<ObjectId, NodeHandle>,
    /// Lazily built from `children`; reset on every child-set change.
    pub(crate) child_ids: OnceCell<Vec<ObjectId>>,

    // === Spatial ===
    pub(crate) transform: Transform,
    pub(crate) boundary: Boundary,
    pub(crate) geometry: Option<Rc<dyn GeometryBounds>>,

    // === Render state ===
    pub(crate) state: RenderState,
}

impl Node {
    #[must_use]
    pub fn new(id: ObjectId) -> Self {
        Self {
            id,
            guid: None,
            entity_type: String::new(),
            parent: None,
            children: Vec::new(),
            child_map: FxHashMap::default(),
            child_ids: OnceCell::new(),
            transform: Transform::new(),
            boundary: Boundary::new(),
            geometry: None,
            state: RenderState::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    #[inline]
    #[must_use]
    pub fn guid(&self) -> Option<Uuid> {
        self.guid
    }

    /// The entity classification, `None` when unclassified.
    #[inline]
    #[must_use]
    pub fn entity_type(&self) -> Option<&str> {
        (!self.entity_type.is_empty()).then_some(self.entity_type.as_str())
    }

    #[inline]
    #[must_use]
    pub fn is_entity(&self) -> bool {
        !self.entity_type.is_empty()
    }

    /// Returns the parent node handle, if any.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    /// Returns a read-only slice of child node handles.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    #[inline]
    #[must_use]
    pub fn child_at(&self, index: usize) -> Option<NodeHandle> {
        self.children.get(index).copied()
    }

    #[inline]
    #[must_use]
    pub fn child_by_id(&self, id: &ObjectId) -> Option<NodeHandle> {
        self.child_map.get(id).copied()
    }

    /// The local transform state.
    #[inline]
    #[must_use]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Cache flags of the bounds.
    #[inline]
    #[must_use]
    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    #[inline]
    #[must_use]
    pub fn geometry(&self) -> Option<&Rc<dyn GeometryBounds>> {
        self.geometry.as_ref()
    }

    /// The inheritable render state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> &RenderState {
        &self.state
    }

    // Shorthands for the most read transform fields.

    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.transform.position()
    }

    #[inline]
    #[must_use]
    pub fn rotation(&self) -> Vec3 {
        self.transform.rotation()
    }

    #[inline]
    #[must_use]
    pub fn quaternion(&self) -> Quat {
        self.transform.quaternion()
    }

    #[inline]
    #[must_use]
    pub fn scale(&self) -> Vec3 {
        self.transform.scale()
    }

    #[inline]
    #[must_use]
    pub fn local_matrix(&self) -> Mat4 {
        self.transform.local_matrix()
    }

    pub(crate) fn invalidate_child_ids(&mut self) {
        self.child_ids.take();
    }
}
