use std::rc::Rc;

use glam::{Mat4, Quat, Vec3};
use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use uuid::Uuid;

use crate::errors::{Result, SceneError};
use crate::resources::bounds::{Aabb, Obb};
use crate::resources::geometry::GeometryBounds;
use crate::resources::version_tracker::ChangeTracker;
use crate::scene::boundary;
use crate::scene::entity::EntityRegistry;
use crate::scene::events::{BoundaryCallback, BoundaryListeners, ListenerKey};
use crate::scene::node::Node;
use crate::scene::state::RenderState;
use crate::scene::transform::Transform;
use crate::scene::transform_system;
use crate::scene::wrapper::SceneNode;
use crate::scene::{NodeHandle, NodeKey, NodeRef, ObjectId, SceneId};
use crate::settings::SceneSettings;

/// Scene graph
///
/// Owns every node and the registries around them:
/// - id and guid lookup
/// - the root set (exactly the nodes without a parent, in insertion order)
/// - the [`EntityRegistry`]
/// - per-node boundary listeners
///
/// All mutation goes through `&mut Scene`. Reads of derived data (world
/// matrices, bounds) take `&Scene` and rebuild stale caches in place, which
/// keeps the scene on a single thread.
#[derive(Debug)]
pub struct Scene {
    id: SceneId,
    settings: SceneSettings,

    pub(crate) nodes: SlotMap<NodeKey, Node>,
    pub(crate) root_nodes: Vec<NodeHandle>,

    ids: FxHashMap<ObjectId, NodeKey>,
    guids: FxHashMap<Uuid, NodeKey>,
    next_auto_id: u64,

    pub(crate) entities: EntityRegistry,
    listeners: BoundaryListeners,
    /// Listeners moved out while a notify phase runs.
    dispatching: usize,
    version: ChangeTracker,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(SceneSettings::default())
    }

    #[must_use]
    pub fn with_settings(settings: SceneSettings) -> Self {
        Self {
            id: SceneId::next(),
            settings,
            nodes: SlotMap::with_key(),
            root_nodes: Vec::new(),
            ids: FxHashMap::default(),
            guids: FxHashMap::default(),
            next_auto_id: 1,
            entities: EntityRegistry::default(),
            listeners: BoundaryListeners::default(),
            dispatching: 0,
            version: ChangeTracker::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> SceneId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    /// Repaint version, bumped by every mutation that affects rendering.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version.version()
    }

    /// Returns `true` if the scene was mutated after `seen` was read from
    /// [`Scene::version`].
    #[must_use]
    pub fn changed_since(&self, seen: u64) -> bool {
        self.version.changed_since(seen)
    }

    /// Starts building a node.
    pub fn build_node(&mut self) -> NodeBuilder<'_> {
        NodeBuilder::new(self)
    }

    /// Chainable wrapper around one node.
    pub fn node(&mut self, handle: NodeHandle) -> SceneNode<'_> {
        SceneNode::new(self, handle)
    }

    // ========================================================================
    // Handle validation
    // ========================================================================

    pub(crate) fn handle_of(&self, key: NodeKey) -> NodeHandle {
        NodeHandle { scene: self.id, key }
    }

    /// Checks that `handle` is a live node of this scene.
    pub(crate) fn resolve(&self, handle: NodeHandle) -> Result<NodeKey> {
        if handle.scene != self.id {
            return Err(SceneError::ForeignScene {
                handle,
                expected: self.id,
                found: handle.scene,
            });
        }
        if !self.nodes.contains_key(handle.key) {
            return Err(SceneError::StaleHandle(handle));
        }
        Ok(handle.key)
    }

    /// Resolves a handle or an id to a live node of this scene.
    pub(crate) fn resolve_ref(&self, node: &NodeRef) -> Result<NodeKey> {
        match node {
            NodeRef::Handle(handle) => self.resolve(*handle),
            NodeRef::Id(id) => self
                .ids
                .get(id)
                .copied()
                .ok_or_else(|| SceneError::UnknownId(id.clone())),
        }
    }

    fn key_of(&self, handle: NodeHandle) -> Option<NodeKey> {
        self.resolve(handle).ok()
    }

    // ========================================================================
    // Registry queries
    // ========================================================================

    /// Returns a read-only reference to a node.
    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(self.key_of(handle)?)
    }

    #[must_use]
    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.key_of(handle).is_some()
    }

    #[must_use]
    pub fn node_by_id(&self, id: &ObjectId) -> Option<NodeHandle> {
        self.ids.get(id).map(|&key| self.handle_of(key))
    }

    #[must_use]
    pub fn node_by_guid(&self, guid: &Uuid) -> Option<NodeHandle> {
        self.guids.get(guid).map(|&key| self.handle_of(key))
    }

    /// Nodes without a parent, in the order they became roots.
    #[inline]
    #[must_use]
    pub fn root_nodes(&self) -> &[NodeHandle] {
        &self.root_nodes
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates every node, in arena order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeHandle, &Node)> {
        self.nodes.iter().map(|(key, node)| (self.handle_of(key), node))
    }

    #[inline]
    #[must_use]
    pub fn entities(&self) -> &EntityRegistry {
        &self.entities
    }

    // ========================================================================
    // Child queries
    // ========================================================================

    #[must_use]
    pub fn parent(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.get_node(handle)?.parent
    }

    #[must_use]
    pub fn children(&self, handle: NodeHandle) -> &[NodeHandle] {
        match self.get_node(handle) {
            Some(node) => &node.children,
            None => &[],
        }
    }

    #[must_use]
    pub fn num_children(&self, handle: NodeHandle) -> usize {
        self.children(handle).len()
    }

    #[must_use]
    pub fn child_at(&self, handle: NodeHandle, index: usize) -> Option<NodeHandle> {
        self.get_node(handle)?.child_at(index)
    }

    #[must_use]
    pub fn child_by_id(&self, handle: NodeHandle, id: &ObjectId) -> Option<NodeHandle> {
        self.get_node(handle)?.child_by_id(id)
    }

    /// Ids of the children, in child order. Built on first request after a
    /// change to the child set.
    #[must_use]
    pub fn child_ids(&self, handle: NodeHandle) -> Option<&[ObjectId]> {
        let node = self.get_node(handle)?;
        let ids = node.child_ids.get_or_init(|| {
            node.children
                .iter()
                .filter_map(|child| self.nodes.get(child.key))
                .map(|child| child.id.clone())
                .collect()
        });
        Some(ids.as_slice())
    }

    /// Returns `true` if `ancestor` is a strict ancestor of `node`.
    #[must_use]
    pub fn is_ancestor_of(&self, ancestor: NodeHandle, node: NodeHandle) -> bool {
        match (self.key_of(ancestor), self.key_of(node)) {
            (Some(a), Some(n)) => self.is_ancestor_key(a, n),
            _ => false,
        }
    }

    pub(crate) fn is_ancestor_key(&self, ancestor: NodeKey, node: NodeKey) -> bool {
        let mut cursor = self.nodes.get(node).and_then(|n| n.parent);
        while let Some(parent) = cursor {
            if parent.key == ancestor {
                return true;
            }
            cursor = self.nodes.get(parent.key).and_then(|n| n.parent);
        }
        false
    }

    // ========================================================================
    // Transform API
    // ========================================================================

    /// Applies `update` to the local transform, then invalidates the
    /// subtree's world matrices and the affected bounds.
    fn update_transform(&mut self, handle: NodeHandle, update: impl FnOnce(&mut Transform)) -> Result<()> {
        let key = self.resolve(handle)?;
        if let Some(node) = self.nodes.get_mut(key) {
            update(&mut node.transform);
        }
        self.transform_changed(key);
        Ok(())
    }

    pub(crate) fn transform_changed(&mut self, key: NodeKey) {
        transform_system::mark_world_dirty(&self.nodes, key);
        self.invalidate_boundary(&[key]);
    }

    /// Sets the local position. `None` resets to the origin.
    pub fn set_position(&mut self, handle: NodeHandle, position: impl Into<Option<Vec3>>) -> Result<()> {
        let position = position.into();
        self.update_transform(handle, |t| t.set_position(position))
    }

    /// Sets the local rotation, XYZ Euler degrees. `None` resets to zero.
    pub fn set_rotation(&mut self, handle: NodeHandle, degrees: impl Into<Option<Vec3>>) -> Result<()> {
        let degrees = degrees.into();
        self.update_transform(handle, |t| t.set_rotation(degrees))
    }

    /// Sets the local rotation quaternion. `None` resets to identity.
    pub fn set_quaternion(&mut self, handle: NodeHandle, quaternion: impl Into<Option<Quat>>) -> Result<()> {
        let quaternion = quaternion.into();
        self.update_transform(handle, |t| t.set_quaternion(quaternion))
    }

    /// Sets the local scale. `None` resets to `(1, 1, 1)`.
    pub fn set_scale(&mut self, handle: NodeHandle, scale: impl Into<Option<Vec3>>) -> Result<()> {
        let scale = scale.into();
        self.update_transform(handle, |t| t.set_scale(scale))
    }

    /// Sets the local matrix directly. `None` resets to identity.
    pub fn set_matrix(&mut self, handle: NodeHandle, matrix: impl Into<Option<Mat4>>) -> Result<()> {
        let matrix = matrix.into();
        self.update_transform(handle, |t| t.set_matrix(matrix))
    }

    /// Rotates by `degrees` about `axis` in the node's own frame.
    pub fn rotate(&mut self, handle: NodeHandle, axis: Vec3, degrees: f32) -> Result<()> {
        self.update_transform(handle, |t| t.rotate(axis, degrees))
    }

    pub fn rotate_x(&mut self, handle: NodeHandle, degrees: f32) -> Result<()> {
        self.rotate(handle, Vec3::X, degrees)
    }

    pub fn rotate_y(&mut self, handle: NodeHandle, degrees: f32) -> Result<()> {
        self.rotate(handle, Vec3::Y, degrees)
    }

    pub fn rotate_z(&mut self, handle: NodeHandle, degrees: f32) -> Result<()> {
        self.rotate(handle, Vec3::Z, degrees)
    }

    /// Moves `distance` along `axis`, given in the node's rotated frame.
    pub fn translate(&mut self, handle: NodeHandle, axis: Vec3, distance: f32) -> Result<()> {
        self.update_transform(handle, |t| t.translate(axis, distance))
    }

    pub fn translate_x(&mut self, handle: NodeHandle, distance: f32) -> Result<()> {
        self.translate(handle, Vec3::X, distance)
    }

    pub fn translate_y(&mut self, handle: NodeHandle, distance: f32) -> Result<()> {
        self.translate(handle, Vec3::Y, distance)
    }

    pub fn translate_z(&mut self, handle: NodeHandle, distance: f32) -> Result<()> {
        self.translate(handle, Vec3::Z, distance)
    }

    #[must_use]
    pub fn local_matrix(&self, handle: NodeHandle) -> Option<Mat4> {
        Some(self.get_node(handle)?.transform.local_matrix())
    }

    /// World matrix, rebuilt along the dirty part of the parent chain.
    #[must_use]
    pub fn world_matrix(&self, handle: NodeHandle) -> Option<Mat4> {
        let key = self.key_of(handle)?;
        Some(transform_system::world_matrix(&self.nodes, key))
    }

    #[must_use]
    pub fn world_normal_matrix(&self, handle: NodeHandle) -> Option<Mat4> {
        let key = self.key_of(handle)?;
        Some(transform_system::world_normal_matrix(&self.nodes, key))
    }

    /// Translation part of the world matrix.
    #[must_use]
    pub fn world_position(&self, handle: NodeHandle) -> Option<Vec3> {
        self.world_matrix(handle).map(|m| m.w_axis.truncate())
    }

    // ========================================================================
    // Boundary API
    // ========================================================================

    /// World AABB of a node. [`Aabb::EMPTY`] when it has nothing to bound.
    #[must_use]
    pub fn aabb(&self, handle: NodeHandle) -> Option<Aabb> {
        let key = self.key_of(handle)?;
        Some(boundary::aabb(&self.nodes, key))
    }

    #[must_use]
    pub fn obb(&self, handle: NodeHandle) -> Option<Obb> {
        let key = self.key_of(handle)?;
        Some(boundary::obb(&self.nodes, key))
    }

    /// World center (midpoint of the AABB).
    #[must_use]
    pub fn center(&self, handle: NodeHandle) -> Option<Vec3> {
        let key = self.key_of(handle)?;
        Some(boundary::center(&self.nodes, key))
    }

    /// Union of the AABBs of all collidable roots.
    #[must_use]
    pub fn scene_aabb(&self) -> Aabb {
        self.root_nodes
            .iter()
            .filter(|root| self.nodes.get(root.key).is_some_and(|n| n.state.collidable()))
            .fold(Aabb::EMPTY, |acc, root| acc.union(&boundary::aabb(&self.nodes, root.key)))
    }

    #[must_use]
    pub fn scene_center(&self) -> Vec3 {
        self.scene_aabb().center()
    }

    /// Attaches (or removes) leaf geometry bounds.
    pub fn set_geometry(
        &mut self,
        handle: NodeHandle,
        geometry: Option<Rc<dyn GeometryBounds>>,
    ) -> Result<()> {
        let key = self.resolve(handle)?;
        if let Some(node) = self.nodes.get_mut(key) {
            node.geometry = geometry;
        }
        self.invalidate_boundary(&[key]);
        Ok(())
    }

    /// Signals that the shape behind a leaf's geometry changed.
    pub fn geometry_changed(&mut self, handle: NodeHandle) -> Result<()> {
        let key = self.resolve(handle)?;
        self.invalidate_boundary(&[key]);
        Ok(())
    }

    /// Runs one invalidation pass over `roots` and notifies every touched
    /// node once.
    pub(crate) fn invalidate_boundary(&mut self, roots: &[NodeKey]) {
        let touched = boundary::invalidate(&self.nodes, roots);
        self.version.changed();
        self.notify_boundary(&touched);
    }

    fn notify_boundary(&mut self, touched: &[NodeKey]) {
        if !self.settings.boundary_events || self.listeners.is_empty() {
            return;
        }
        let mut listeners = std::mem::take(&mut self.listeners);
        self.dispatching = listeners.len();
        listeners.notify(self, touched);
        self.dispatching = 0;
        self.listeners = listeners;
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Subscribes to "boundary changed" notifications of one node.
    pub fn on_boundary(
        &mut self,
        handle: NodeHandle,
        callback: impl FnMut(&Scene, NodeHandle) + 'static,
    ) -> Result<ListenerKey> {
        let key = self.resolve(handle)?;
        let callback: BoundaryCallback = Box::new(callback);
        Ok(self.listeners.subscribe(key, callback))
    }

    /// Cancels a subscription. Returns `false` if it was already gone.
    pub fn off(&mut self, listener: ListenerKey) -> bool {
        self.listeners.unsubscribe(listener)
    }

    /// Number of live subscriptions, including while listeners are running.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len() + self.dispatching
    }

    pub(crate) fn bump_version(&mut self) {
        self.version.changed();
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    fn next_free_id(&mut self) -> ObjectId {
        loop {
            let id = ObjectId::Num(self.next_auto_id);
            self.next_auto_id += 1;
            if !self.ids.contains_key(&id) {
                return id;
            }
        }
    }

    /// Destroys a node and its whole subtree.
    ///
    /// The node is detached from its parent (whose bounds are invalidated),
    /// and every destroyed node is removed from the id, guid, root and entity
    /// maps and loses its listeners.
    pub fn destroy(&mut self, handle: NodeHandle) -> Result<()> {
        let key = self.resolve(handle).inspect_err(|e| log::error!("destroy: {e}"))?;

        let (id, parent) = {
            let node = &self.nodes[key];
            (node.id.clone(), node.parent)
        };
        match parent.and_then(|p| self.nodes.get_mut(p.key)) {
            Some(p) => {
                p.children.retain(|c| c.key != key);
                p.child_map.remove(&id);
                p.invalidate_child_ids();
            }
            None => self.root_nodes.retain(|r| r.key != key),
        }

        let mut subtree = vec![key];
        let mut i = 0;
        while i < subtree.len() {
            if let Some(node) = self.nodes.get(subtree[i]) {
                subtree.extend(node.children.iter().map(|c| c.key));
            }
            i += 1;
        }

        for &k in &subtree {
            let Some(node) = self.nodes.remove(k) else {
                continue;
            };
            self.ids.remove(&node.id);
            if let Some(guid) = node.guid {
                self.guids.remove(&guid);
            }
            if node.is_entity() {
                self.entities.entity_type_removed(&node.id, &node.entity_type);
            }
            self.listeners.remove_node(k);
        }
        log::debug!("destroyed {} node(s)", subtree.len());

        match parent {
            Some(parent) => self.invalidate_boundary(&[parent.key]),
            None => self.version.changed(),
        }
        Ok(())
    }
}

// ============================================================================
// NodeBuilder
// ============================================================================

/// Staged construction of a node.
///
/// Nothing is inserted until [`NodeBuilder::build`], which validates the
/// whole request first.
///
/// ```rust
/// use glam::Vec3;
/// use myth_scenegraph::Scene;
///
/// let mut scene = Scene::new();
/// let building = scene.build_node().id("building").build()?;
/// let wall = scene
///     .build_node()
///     .id("wall-01")
///     .entity_type("IfcWall")
///     .position(Vec3::new(0.0, 0.0, 4.0))
///     .parent(building)
///     .build()?;
/// assert_eq!(scene.parent(wall), Some(building));
/// # Ok::<(), myth_scenegraph::SceneError>(())
/// ```
pub struct NodeBuilder<'a> {
    scene: &'a mut Scene,
    id: Option<ObjectId>,
    guid: Option<Uuid>,
    entity_type: Option<String>,
    position: Option<Vec3>,
    rotation: Option<Vec3>,
    quaternion: Option<Quat>,
    scale: Option<Vec3>,
    matrix: Option<Mat4>,
    geometry: Option<Rc<dyn GeometryBounds>>,
    state: Option<RenderState>,
    parent: Option<NodeRef>,
    inherit_states: Option<bool>,
    children: Vec<NodeRef>,
}

impl<'a> NodeBuilder<'a> {
    pub fn new(scene: &'a mut Scene) -> Self {
        Self {
            scene,
            id: None,
            guid: None,
            entity_type: None,
            position: None,
            rotation: None,
            quaternion: None,
            scale: None,
            matrix: None,
            geometry: None,
            state: None,
            parent: None,
            inherit_states: None,
            children: Vec::new(),
        }
    }

    // === Chainable configuration ===

    #[must_use]
    pub fn id(mut self, id: impl Into<ObjectId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn guid(mut self, guid: Uuid) -> Self {
        self.guid = Some(guid);
        self
    }

    #[must_use]
    pub fn entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    #[must_use]
    pub fn position(mut self, position: Vec3) -> Self {
        self.position = Some(position);
        self
    }

    /// XYZ Euler degrees. Ignored when a quaternion is also given.
    #[must_use]
    pub fn rotation(mut self, degrees: Vec3) -> Self {
        self.rotation = Some(degrees);
        self
    }

    #[must_use]
    pub fn quaternion(mut self, quaternion: Quat) -> Self {
        self.quaternion = Some(quaternion);
        self
    }

    #[must_use]
    pub fn scale(mut self, scale: Vec3) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Local matrix. Takes precedence over position, rotation and scale.
    #[must_use]
    pub fn matrix(mut self, matrix: Mat4) -> Self {
        self.matrix = Some(matrix);
        self
    }

    #[must_use]
    pub fn geometry(mut self, geometry: Rc<dyn GeometryBounds>) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Initial render state, instead of the scene's `initial_state`.
    ///
    /// When the node is attached with inheritance, the parent's state
    /// replaces it.
    #[must_use]
    pub fn state(mut self, state: RenderState) -> Self {
        self.state = Some(state);
        self
    }

    #[must_use]
    pub fn parent(mut self, parent: impl Into<NodeRef>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Whether attaching to the parent copies the parent's render state.
    #[must_use]
    pub fn inherit_states(mut self, inherit: bool) -> Self {
        self.inherit_states = Some(inherit);
        self
    }

    /// Adopts an existing node as child. Adopted children keep their state.
    #[must_use]
    pub fn child(mut self, child: impl Into<NodeRef>) -> Self {
        self.children.push(child.into());
        self
    }

    // === Finish ===

    /// Validates the request, inserts the node and links it.
    pub fn build(self) -> Result<NodeHandle> {
        let Self {
            scene,
            id,
            guid,
            entity_type,
            position,
            rotation,
            quaternion,
            scale,
            matrix,
            geometry,
            state,
            parent,
            inherit_states,
            children,
        } = self;

        let validated = (|| -> Result<(Option<NodeKey>, Vec<NodeKey>)> {
            if let Some(id) = &id
                && scene.ids.contains_key(id)
            {
                return Err(SceneError::DuplicateId(id.clone()));
            }
            if let Some(guid) = guid
                && scene.guids.contains_key(&guid)
            {
                return Err(SceneError::DuplicateGuid(guid));
            }
            let parent = parent.as_ref().map(|p| scene.resolve_ref(p)).transpose()?;
            let children = children
                .iter()
                .map(|c| scene.resolve_ref(c))
                .collect::<Result<Vec<_>>>()?;
            if let Some(parent) = parent {
                for &child in &children {
                    if child == parent || scene.is_ancestor_key(child, parent) {
                        return Err(SceneError::Cycle {
                            child: scene.nodes[child].id.clone(),
                            parent: scene.nodes[parent].id.clone(),
                        });
                    }
                }
            }
            Ok((parent, children))
        })();
        let (parent, children) = validated.inspect_err(|e| log::error!("build_node: {e}"))?;

        let id = match id {
            Some(id) => id,
            None => scene.next_free_id(),
        };
        let mut node = Node::new(id.clone());
        node.guid = guid;
        node.geometry = geometry;
        node.state = state.unwrap_or(scene.settings.initial_state);
        if let Some(matrix) = matrix {
            node.transform.set_matrix(matrix);
        } else {
            node.transform.set_position(position);
            match quaternion {
                Some(q) => node.transform.set_quaternion(q),
                None => node.transform.set_rotation(rotation),
            }
            node.transform.set_scale(scale);
        }

        let key = scene.nodes.insert(node);
        let handle = scene.handle_of(key);
        scene.ids.insert(id, key);
        if let Some(guid) = guid {
            scene.guids.insert(guid, key);
        }
        scene.root_nodes.push(handle);
        scene.version.changed();

        if let Some(entity_type) = entity_type {
            scene.assign_entity_type(key, entity_type);
        }
        let mut roots = Vec::with_capacity(children.len() + 2);
        if let Some(parent) = parent {
            let inherit = inherit_states.unwrap_or(scene.settings.inherit_states);
            scene.link(parent, key, inherit, &mut roots)?;
        }
        for child in children {
            scene.link(key, child, false, &mut roots)?;
        }
        if !roots.is_empty() {
            scene.invalidate_boundary(&roots);
        }

        Ok(handle)
    }
}
