//! Error Types
//!
//! This module defines the error types used by the scene graph.
//!
//! # Overview
//!
//! The main error type [`SceneError`] covers every rejected mutation:
//! - Validation failures (handles from another scene, cycles, duplicate ids)
//! - Lookups that resolve to nothing (unknown ids, destroyed handles)
//!
//! Redundant operations (re-adding an existing child, detaching a root) are
//! not errors: they are logged as warnings and reported through the return
//! value of the operation.
//!
//! Every error is non-fatal. An operation that returns `Err` has not mutated
//! the scene.
//!
//! # Usage
//!
//! ```rust
//! use myth_scenegraph::errors::{ErrorKind, Result};
//! use myth_scenegraph::Scene;
//!
//! fn attach_by_id(scene: &mut Scene) -> Result<()> {
//!     let root = scene.build_node().id("root").build()?;
//!     scene.add_child(root, "missing", true)?;
//!     Ok(())
//! }
//!
//! let mut scene = Scene::new();
//! let err = attach_by_id(&mut scene).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::NotFound);
//! ```

use thiserror::Error;
use uuid::Uuid;

use crate::scene::{NodeHandle, ObjectId, SceneId};

/// Broad classification of a [`SceneError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request was malformed for this scene (foreign handle, cycle, duplicate).
    Validation,
    /// The request referenced something that does not exist.
    NotFound,
}

/// The main error type for the scene graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    // ========================================================================
    // Not Found
    // ========================================================================
    /// No node is registered under the given id.
    #[error("No node with id '{0}' exists in this scene")]
    UnknownId(ObjectId),

    /// The handle refers to a node that has been destroyed.
    #[error("Node handle {0:?} is stale (node destroyed)")]
    StaleHandle(NodeHandle),

    // ========================================================================
    // Validation
    // ========================================================================
    /// The handle belongs to a different scene.
    #[error("Node handle {handle:?} belongs to scene {found:?}, not scene {expected:?}")]
    ForeignScene {
        /// The offending handle
        handle: NodeHandle,
        /// The scene the operation was issued on
        expected: SceneId,
        /// The scene the handle was created by
        found: SceneId,
    },

    /// Attaching would make a node its own ancestor.
    #[error("Cannot attach '{child}' under '{parent}': it would create a cycle")]
    Cycle {
        /// The node being attached
        child: ObjectId,
        /// The requested parent
        parent: ObjectId,
    },

    /// A node with this id already exists.
    #[error("Duplicate node id '{0}'")]
    DuplicateId(ObjectId),

    /// A node with this guid already exists.
    #[error("Duplicate node guid '{0}'")]
    DuplicateGuid(Uuid),
}

impl SceneError {
    /// Returns the taxonomy bucket of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownId(_) | Self::StaleHandle(_) => ErrorKind::NotFound,
            Self::ForeignScene { .. }
            | Self::Cycle { .. }
            | Self::DuplicateId(_)
            | Self::DuplicateGuid(_) => ErrorKind::Validation,
        }
    }
}

/// Alias for `Result<T, SceneError>`.
pub type Result<T> = std::result::Result<T, SceneError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(SceneError::UnknownId(ObjectId::from("a")).kind(), ErrorKind::NotFound);
        assert_eq!(SceneError::DuplicateId(ObjectId::from(7_u64)).kind(), ErrorKind::Validation);
        let err = SceneError::Cycle {
            child: ObjectId::from("a"),
            parent: ObjectId::from("b"),
        };
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "Cannot attach 'a' under 'b': it would create a cycle");
    }
}
