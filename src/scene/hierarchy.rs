//! Hierarchy Manager
//!
//! Parent/child linking, cascading render state and entity classification,
//! implemented on [`Scene`]. Each structural mutation ends with one world
//! matrix invalidation of the moved subtree and one boundary pass covering
//! every node whose bounds it affected.

use crate::errors::{Result, SceneError};
use crate::scene::scene::Scene;
use crate::scene::state::{RenderFlags, StateChange};
use crate::scene::transform_system;
use crate::scene::{NodeHandle, NodeKey, NodeRef, ObjectId};

/// Generates the named cascading setters, all delegating to
/// [`Scene::set_state`].
macro_rules! impl_state_setters {
    ( $( ($name:ident, $flag:ident, $doc:expr) ),* $(,)? ) => {
        paste::paste! {
            impl Scene {
                $(
                    #[doc = $doc]
                    ///
                    /// Applies to the node and its whole subtree.
                    pub fn [<set_ $name>](&mut self, handle: NodeHandle, on: bool) -> Result<()> {
                        self.set_state(handle, StateChange::Flags(RenderFlags::$flag, on))
                    }
                )*
            }
        }
    };
}

impl_state_setters!(
    (visible, VISIBLE, "Shows or hides the node."),
    (culled, CULLED, "Marks the node as culled."),
    (pickable, PICKABLE, "Whether the node answers picking queries."),
    (clippable, CLIPPABLE, "Whether clipping planes affect the node."),
    (
        collidable,
        COLLIDABLE,
        "Whether the node contributes to its parent's bounds. Invalidates the boundary of the node and its ancestors."
    ),
    (cast_shadow, CAST_SHADOW, "Whether the node casts shadows."),
    (receive_shadow, RECEIVE_SHADOW, "Whether the node receives shadows."),
    (outlined, OUTLINED, "Draws an outline around the node."),
    (highlighted, HIGHLIGHTED, "Highlights the node."),
    (ghosted, GHOSTED, "Draws the node ghosted (translucent)."),
    (selected, SELECTED, "Marks the node as selected."),
);

impl Scene {
    // ========================================================================
    // Linking
    // ========================================================================

    /// Attaches `child` (a handle or an id) to `parent`.
    ///
    /// A child that already has another parent is moved. With
    /// `inherit_states` the parent's current render state is copied onto the
    /// child's subtree once; later changes to the parent reach the child only
    /// through the cascading setters.
    ///
    /// Returns `Ok(false)` if `child` already is a child of `parent`.
    pub fn add_child(
        &mut self,
        parent: NodeHandle,
        child: impl Into<NodeRef>,
        inherit_states: bool,
    ) -> Result<bool> {
        let child = child.into();
        let keys = self
            .resolve(parent)
            .and_then(|p| Ok((p, self.resolve_ref(&child)?)));
        let (parent, child) = keys.inspect_err(|e| log::error!("add_child: {e}"))?;
        self.attach(parent, child, inherit_states)
    }

    /// Links two resolved nodes and runs one invalidation pass. Shared by
    /// [`Scene::add_child`] and [`Scene::set_parent`].
    pub(crate) fn attach(&mut self, parent: NodeKey, child: NodeKey, inherit_states: bool) -> Result<bool> {
        let mut roots = Vec::with_capacity(2);
        let linked = self.link(parent, child, inherit_states, &mut roots)?;
        if linked {
            self.invalidate_boundary(&roots);
        }
        Ok(linked)
    }

    /// Links two resolved nodes without touching boundary caches. The
    /// invalidation roots of the link are pushed onto `roots`.
    pub(crate) fn link(
        &mut self,
        parent: NodeKey,
        child: NodeKey,
        inherit_states: bool,
        roots: &mut Vec<NodeKey>,
    ) -> Result<bool> {
        let parent_handle = self.handle_of(parent);
        let child_handle = self.handle_of(child);

        if self.nodes[child].parent == Some(parent_handle) {
            log::warn!(
                "node '{}' already is a child of '{}'",
                self.nodes[child].id,
                self.nodes[parent].id
            );
            return Ok(false);
        }
        // A leaf cannot be an ancestor.
        let has_children = !self.nodes[child].children.is_empty();
        if child == parent || (has_children && self.is_ancestor_key(child, parent)) {
            let err = SceneError::Cycle {
                child: self.nodes[child].id.clone(),
                parent: self.nodes[parent].id.clone(),
            };
            log::error!("add_child: {err}");
            return Err(err);
        }

        let previous = self.unlink(child);

        let id = self.nodes[child].id.clone();
        let p = &mut self.nodes[parent];
        p.children.push(child_handle);
        p.child_map.insert(id.clone(), child_handle);
        p.invalidate_child_ids();
        self.nodes[child].parent = Some(parent_handle);
        log::debug!("attached '{id}' to '{}'", self.nodes[parent].id);

        if inherit_states {
            let state = self.nodes[parent].state;
            self.cascade_state(child, &StateChange::All(state));
        }

        transform_system::mark_world_dirty(&self.nodes, child);
        roots.push(child);
        roots.extend(previous);
        Ok(true)
    }

    /// Detaches `child` from its parent (or the root set) without touching
    /// caches. Returns the previous parent.
    fn unlink(&mut self, child: NodeKey) -> Option<NodeKey> {
        let Some(parent) = self.nodes[child].parent.take() else {
            self.root_nodes.retain(|r| r.key != child);
            return None;
        };
        let id = self.nodes[child].id.clone();
        if let Some(p) = self.nodes.get_mut(parent.key) {
            p.children.retain(|c| c.key != child);
            p.child_map.remove(&id);
            p.invalidate_child_ids();
        }
        Some(parent.key)
    }

    /// Makes `child` a root again.
    fn detach_to_root(&mut self, child: NodeKey) {
        self.unlink(child);
        let handle = self.handle_of(child);
        self.root_nodes.push(handle);
        transform_system::mark_world_dirty(&self.nodes, child);
    }

    /// Detaches `child` from `parent`.
    ///
    /// Returns `Ok(false)` when `child` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeHandle, child: impl Into<NodeRef>) -> Result<bool> {
        let parent = self
            .resolve(parent)
            .inspect_err(|e| log::error!("remove_child: {e}"))?;
        let Ok(child) = self.resolve_ref(&child.into()) else {
            return Ok(false);
        };
        if self.nodes[child].parent.map(|p| p.key) != Some(parent) {
            return Ok(false);
        }

        self.detach_to_root(child);
        log::debug!("detached '{}' from '{}'", self.nodes[child].id, self.nodes[parent].id);
        self.invalidate_boundary(&[child, parent]);
        Ok(true)
    }

    /// Detaches every child of `parent`. Returns how many were detached.
    pub fn remove_children(&mut self, parent: NodeHandle) -> Result<usize> {
        let parent = self
            .resolve(parent)
            .inspect_err(|e| log::error!("remove_children: {e}"))?;
        let children: Vec<NodeKey> = self.nodes[parent].children.iter().map(|c| c.key).collect();
        if children.is_empty() {
            return Ok(0);
        }

        for &child in &children {
            self.detach_to_root(child);
        }
        log::debug!("detached {} child(ren) from '{}'", children.len(), self.nodes[parent].id);

        let mut roots = children.clone();
        roots.push(parent);
        self.invalidate_boundary(&roots);
        Ok(children.len())
    }

    /// Property-style reparenting. `None` detaches `child` to the root set;
    /// `Some(parent)` attaches it with state inheritance.
    pub fn set_parent(&mut self, child: NodeHandle, parent: Option<NodeHandle>) -> Result<()> {
        match parent {
            Some(parent) => self.add_child(parent, child, true).map(|_| ()),
            None => {
                let key = self
                    .resolve(child)
                    .inspect_err(|e| log::error!("set_parent: {e}"))?;
                match self.nodes[key].parent {
                    Some(parent) => {
                        self.remove_child(parent, child)?;
                    }
                    None => log::warn!("node '{}' already is a root", self.nodes[key].id),
                }
                Ok(())
            }
        }
    }

    // ========================================================================
    // Cascading state
    // ========================================================================

    /// Applies `change` to a node and every descendant.
    ///
    /// Last write wins: values set directly on a descendant earlier are
    /// overwritten. Toggling `collidable` invalidates the boundary of the node
    /// and its ancestors.
    pub fn set_state(&mut self, handle: NodeHandle, change: StateChange) -> Result<()> {
        let key = self
            .resolve(handle)
            .inspect_err(|e| log::error!("set_state: {e}"))?;
        let flipped = self.cascade_state(key, &change);
        if flipped.contains(RenderFlags::COLLIDABLE) {
            self.invalidate_boundary(&[key]);
        } else {
            self.bump_version();
        }
        Ok(())
    }

    /// RGB multiplier of the subtree. `None` resets to white.
    pub fn set_colorize(&mut self, handle: NodeHandle, rgb: impl Into<Option<glam::Vec3>>) -> Result<()> {
        self.set_state(handle, StateChange::Colorize(rgb.into()))
    }

    /// Alpha multiplier of the subtree. `None` resets to opaque.
    pub fn set_opacity(&mut self, handle: NodeHandle, opacity: impl Into<Option<f32>>) -> Result<()> {
        self.set_state(handle, StateChange::Opacity(opacity.into()))
    }

    /// Walks the subtree of `key` applying `change`, and keeps the entity maps
    /// in step. Returns the union of the flags that flipped anywhere.
    pub(crate) fn cascade_state(&mut self, key: NodeKey, change: &StateChange) -> RenderFlags {
        let scene = self.id();
        let Self { nodes, entities, .. } = self;

        let mut flipped_any = RenderFlags::empty();
        let mut visited = 0_usize;
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            let Some(node) = nodes.get_mut(current) else {
                continue;
            };
            let flipped = node.state.apply(change);
            if node.is_entity() && flipped.intersects(RenderFlags::ENTITY_TRACKED) {
                let handle = NodeHandle { scene, key: current };
                entities.entity_state_updated(&node.id, handle, flipped, &node.state);
            }
            flipped_any |= flipped;
            visited += 1;
            stack.extend(node.children.iter().map(|c| c.key));
        }
        log::trace!("state change reached {visited} node(s)");
        flipped_any
    }

    // ========================================================================
    // Entity classification
    // ========================================================================

    /// Classifies the node. An empty type clears the classification.
    ///
    /// Only this node is classified, never its descendants.
    pub fn set_entity_type(&mut self, handle: NodeHandle, entity_type: impl Into<String>) -> Result<()> {
        let key = self
            .resolve(handle)
            .inspect_err(|e| log::error!("set_entity_type: {e}"))?;
        self.assign_entity_type(key, entity_type.into());
        Ok(())
    }

    pub fn clear_entity_type(&mut self, handle: NodeHandle) -> Result<()> {
        self.set_entity_type(handle, String::new())
    }

    pub(crate) fn assign_entity_type(&mut self, key: NodeKey, entity_type: String) {
        let handle = self.handle_of(key);
        let Some(node) = self.nodes.get_mut(key) else {
            return;
        };
        if node.is_entity() {
            self.entities.entity_type_removed(&node.id, &node.entity_type);
        }
        node.entity_type = entity_type;
        if node.is_entity() {
            self.entities
                .entity_type_assigned(&node.id, handle, &node.entity_type, &node.state);
        }
    }

    /// Applies `change` to the subtree of each classified node in `ids`.
    ///
    /// Unknown ids and unclassified nodes are skipped. Returns how many nodes
    /// the change was applied to.
    pub fn set_objects_state(&mut self, ids: &[ObjectId], change: StateChange) -> usize {
        let keys: Vec<NodeKey> = ids
            .iter()
            .filter_map(|id| self.entities.objects().get(id))
            .map(|handle| handle.key)
            .collect();
        self.apply_to_entities(&keys, &change)
    }

    /// Applies `change` to the subtree of every node of `entity_type`.
    ///
    /// The cascade follows the transform hierarchy, so classified composites
    /// pass the change on to their (unclassified) descendants.
    pub fn set_entity_type_state(&mut self, entity_type: &str, change: StateChange) -> usize {
        let keys: Vec<NodeKey> = self
            .entities
            .objects_of_type(entity_type)
            .map(|class| class.values().map(|handle| handle.key).collect())
            .unwrap_or_default();
        self.apply_to_entities(&keys, &change)
    }

    fn apply_to_entities(&mut self, keys: &[NodeKey], change: &StateChange) -> usize {
        if keys.is_empty() {
            return 0;
        }
        let mut collidable_changed = Vec::new();
        for &key in keys {
            if self.cascade_state(key, change).contains(RenderFlags::COLLIDABLE) {
                collidable_changed.push(key);
            }
        }
        if collidable_changed.is_empty() {
            self.bump_version();
        } else {
            self.invalidate_boundary(&collidable_changed);
        }
        keys.len()
    }
}
