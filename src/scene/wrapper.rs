//! Chainable node operation wrapper.
//!
//! [`SceneNode`] borrows a [`Scene`] mutably and provides a fluent API over
//! the transform and state setters, without threading a `Result` through
//! every call.
//!
//! All methods silently no-op when the handle is stale, so a chain never
//! panics on a destroyed node.
//!
//! # Example
//!
//! ```rust
//! use myth_scenegraph::Scene;
//!
//! let mut scene = Scene::new();
//! let handle = scene.build_node().build()?;
//! scene
//!     .node(handle)
//!     .set_position(0.0, 3.0, 0.0)
//!     .set_scale(2.0)
//!     .rotate_y(90.0)
//!     .set_highlighted(true);
//! assert!(scene.get_node(handle).is_some_and(|n| n.state().highlighted()));
//! # Ok::<(), myth_scenegraph::SceneError>(())
//! ```
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::must_use_candidate)]
use glam::{Mat4, Quat, Vec3};

use crate::scene::scene::Scene;
use crate::scene::state::StateChange;
use crate::scene::{NodeHandle, NodeRef};

/// Temporary mutable borrow of a scene node for chainable operations.
pub struct SceneNode<'a> {
    scene: &'a mut Scene,
    handle: NodeHandle,
}

impl<'a> SceneNode<'a> {
    #[inline]
    pub fn new(scene: &'a mut Scene, handle: NodeHandle) -> Self {
        Self { scene, handle }
    }

    /// Returns the underlying handle.
    #[inline]
    #[must_use]
    pub fn handle(&self) -> NodeHandle {
        self.handle
    }

    /// Returns `true` while the handle points at a live node.
    #[inline]
    pub fn exists(&self) -> bool {
        self.scene.contains(self.handle)
    }

    // -- Transform setters (chainable) --

    /// Sets the node's local position.
    #[inline]
    pub fn set_position(self, x: f32, y: f32, z: f32) -> Self {
        self.set_position_vec(Vec3::new(x, y, z))
    }

    /// Sets the node's local position from a Vec3.
    #[inline]
    pub fn set_position_vec(self, pos: Vec3) -> Self {
        let _ = self.scene.set_position(self.handle, pos);
        self
    }

    /// Sets uniform scale.
    #[inline]
    pub fn set_scale(self, s: f32) -> Self {
        self.set_scale_xyz(s, s, s)
    }

    /// Sets non-uniform scale.
    #[inline]
    pub fn set_scale_xyz(self, x: f32, y: f32, z: f32) -> Self {
        let _ = self.scene.set_scale(self.handle, Vec3::new(x, y, z));
        self
    }

    /// Sets rotation from a quaternion.
    #[inline]
    pub fn set_quaternion(self, quat: Quat) -> Self {
        let _ = self.scene.set_quaternion(self.handle, quat);
        self
    }

    /// Sets rotation from Euler angles (XYZ order, degrees).
    #[inline]
    pub fn set_rotation(self, x: f32, y: f32, z: f32) -> Self {
        let _ = self.scene.set_rotation(self.handle, Vec3::new(x, y, z));
        self
    }

    #[inline]
    pub fn set_matrix(self, matrix: Mat4) -> Self {
        let _ = self.scene.set_matrix(self.handle, matrix);
        self
    }

    /// Rotates around the X axis by `degrees` (cumulative).
    #[inline]
    pub fn rotate_x(self, degrees: f32) -> Self {
        let _ = self.scene.rotate_x(self.handle, degrees);
        self
    }

    /// Rotates around the Y axis by `degrees` (cumulative).
    #[inline]
    pub fn rotate_y(self, degrees: f32) -> Self {
        let _ = self.scene.rotate_y(self.handle, degrees);
        self
    }

    /// Rotates around the Z axis by `degrees` (cumulative).
    #[inline]
    pub fn rotate_z(self, degrees: f32) -> Self {
        let _ = self.scene.rotate_z(self.handle, degrees);
        self
    }

    /// Moves along a local axis.
    #[inline]
    pub fn translate(self, axis: Vec3, distance: f32) -> Self {
        let _ = self.scene.translate(self.handle, axis, distance);
        self
    }

    // -- State setters (chainable, cascading) --

    #[inline]
    pub fn set_visible(self, visible: bool) -> Self {
        self.set_state(StateChange::visible(visible))
    }

    #[inline]
    pub fn set_highlighted(self, highlighted: bool) -> Self {
        self.set_state(StateChange::highlighted(highlighted))
    }

    #[inline]
    pub fn set_ghosted(self, ghosted: bool) -> Self {
        self.set_state(StateChange::ghosted(ghosted))
    }

    #[inline]
    pub fn set_selected(self, selected: bool) -> Self {
        self.set_state(StateChange::selected(selected))
    }

    #[inline]
    pub fn set_colorize(self, r: f32, g: f32, b: f32) -> Self {
        self.set_state(StateChange::Colorize(Some(Vec3::new(r, g, b))))
    }

    #[inline]
    pub fn set_opacity(self, opacity: f32) -> Self {
        self.set_state(StateChange::Opacity(Some(opacity)))
    }

    /// Applies any cascading state change.
    #[inline]
    pub fn set_state(self, change: StateChange) -> Self {
        let _ = self.scene.set_state(self.handle, change);
        self
    }

    #[inline]
    pub fn set_entity_type(self, entity_type: &str) -> Self {
        let _ = self.scene.set_entity_type(self.handle, entity_type);
        self
    }

    // -- Hierarchy --

    /// Attaches a child (handle or id) with state inheritance.
    #[inline]
    pub fn add_child(self, child: impl Into<NodeRef>) -> Self {
        let _ = self.scene.add_child(self.handle, child, true);
        self
    }
}
