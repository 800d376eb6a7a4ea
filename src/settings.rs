//! Scene Settings
//!
//! Per-scene configuration, fixed at construction time.
//!
//! # Quick Start
//!
//! ```rust
//! use myth_scenegraph::{RenderState, Scene, SceneSettings};
//!
//! // Default: nodes start visible, pickable, clippable, collidable and
//! // shadow-casting; builder attachments inherit the parent's state.
//! let scene = Scene::new();
//! assert!(scene.settings().inherit_states);
//!
//! // A viewer that builds hidden nodes and reveals them later.
//! let settings = SceneSettings {
//!     initial_state: RenderState::default().with_visible(false),
//!     ..Default::default()
//! };
//! let scene = Scene::with_settings(settings);
//! ```

use crate::scene::state::RenderState;

/// Configuration for a [`Scene`](crate::Scene).
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSettings {
    /// Render state given to every node created through
    /// [`Scene::build_node`](crate::Scene::build_node) before any builder
    /// override is applied.
    pub initial_state: RenderState,

    /// Whether a node built with a parent copies the parent's render state
    /// when it is attached. [`NodeBuilder::inherit_states`](crate::NodeBuilder::inherit_states)
    /// overrides this per node.
    pub inherit_states: bool,

    /// Whether boundary listeners are notified.
    ///
    /// Disabling this only skips the notify phase; bounds are still
    /// invalidated and rebuilt lazily.
    pub boundary_events: bool,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            initial_state: RenderState::default(),
            inherit_states: true,
            boundary_events: true,
        }
    }
}
