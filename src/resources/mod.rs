//! Plain-data resources used by the scene graph:
//! - Bounds: world/local AABB and OBB value types
//! - Geometry: the leaf bounds collaborator trait
//! - Version tracker: repaint change counter

pub mod bounds;
pub mod geometry;
pub mod version_tracker;

pub use bounds::{Aabb, Obb};
pub use geometry::{GeometryBounds, PointBounds};
pub use version_tracker::ChangeTracker;
