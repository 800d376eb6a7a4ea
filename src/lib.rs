#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]
//! Myth scene graph
//!
//! The hierarchical core of the Myth engine as a standalone crate:
//!
//! - **Transforms**: local TRS state with lazily rebuilt local, world and
//!   world-normal matrices.
//! - **Bounds**: world AABB / OBB aggregated up the tree and rebuilt on read
//!   after a two-phase invalidation pass.
//! - **Hierarchy**: parenting, cascading render state and entity
//!   classification maps.
//!
//! ```rust
//! use glam::Vec3;
//! use myth_scenegraph::{Aabb, Scene};
//! use std::rc::Rc;
//!
//! let mut scene = Scene::new();
//! let root = scene.build_node().id("root").position(Vec3::X).build()?;
//! let leaf = scene
//!     .build_node()
//!     .id("leaf")
//!     .position(Vec3::new(0.0, 2.0, 0.0))
//!     .geometry(Rc::new(Aabb::new(Vec3::ZERO, Vec3::ONE)))
//!     .parent(root)
//!     .build()?;
//!
//! assert_eq!(scene.world_position(leaf), Some(Vec3::new(1.0, 2.0, 0.0)));
//! assert_eq!(scene.aabb(root), Some(Aabb::new(Vec3::new(1.0, 2.0, 0.0), Vec3::new(2.0, 3.0, 1.0))));
//! # Ok::<(), myth_scenegraph::SceneError>(())
//! ```

pub mod errors;
pub mod resources;
pub mod scene;
pub mod settings;

pub use errors::{ErrorKind, Result, SceneError};
pub use resources::{Aabb, ChangeTracker, GeometryBounds, Obb, PointBounds};
pub use scene::entity::EntityMap;
pub use scene::{
    EntityRegistry, ListenerKey, Node, NodeBuilder, NodeHandle, NodeKey, NodeRef, ObjectId, RenderFlags,
    RenderState, Scene, SceneId, SceneNode, StateChange, Transform,
};
pub use settings::SceneSettings;
