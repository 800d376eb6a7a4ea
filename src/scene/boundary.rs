//! Boundary Engine
//!
//! Maintains each node's world-space [`Aabb`], center and [`Obb`].
//!
//! # Propagation
//!
//! A node's bounds depend on its own world matrix (leaves) or on its
//! children's bounds (composites). Invalidation therefore travels both ways:
//!
//! - **Down**: every descendant of an invalidated node is flagged, since their
//!   world matrices changed with it.
//! - **Up**: every strict ancestor is flagged, since its aggregate is stale.
//!
//! [`invalidate`] is the mark phase. It returns the deduplicated list of
//! touched nodes so that the caller can run the notify phase once per node.
//! Reads ([`aabb`], [`obb`]) rebuild lazily, bottom-up, and only where flagged.
//!
//! # Rules
//!
//! - Only collidable children contribute to their parent's bounds.
//! - A node with contributing children: AABB is the union of theirs.
//! - A node without: the leaf geometry box carried into world space, or
//!   [`Aabb::EMPTY`] without geometry.
//! - OBB with exactly one contributing child: that child's OBB verbatim.
//!   Leaf with geometry: the geometry OBB in world space. Otherwise the
//!   8-corner box of the node's own AABB, so composite OBBs are axis-aligned.

use std::cell::Cell;

use glam::Vec3;
use rustc_hash::FxHashSet;
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::resources::bounds::{Aabb, Obb};
use crate::scene::node::Node;
use crate::scene::transform_system;
use crate::scene::NodeKey;

/// Cached world-space bounds of one node.
#[derive(Debug, Clone)]
pub struct Boundary {
    aabb: Cell<Aabb>,
    center: Cell<Vec3>,
    obb: Cell<Obb>,
    pub(crate) aabb_dirty: Cell<bool>,
    pub(crate) obb_dirty: Cell<bool>,
}

impl Boundary {
    #[must_use]
    pub fn new() -> Self {
        Self {
            aabb: Cell::new(Aabb::EMPTY),
            center: Cell::new(Vec3::ZERO),
            obb: Cell::new(Obb::default()),
            aabb_dirty: Cell::new(true),
            obb_dirty: Cell::new(true),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_aabb_dirty(&self) -> bool {
        self.aabb_dirty.get()
    }

    #[inline]
    #[must_use]
    pub fn is_obb_dirty(&self) -> bool {
        self.obb_dirty.get()
    }

    fn mark_dirty(&self) {
        self.aabb_dirty.set(true);
        self.obb_dirty.set(true);
    }

    fn store_aabb(&self, aabb: Aabb) {
        self.aabb.set(aabb);
        self.center.set(aabb.center());
        self.aabb_dirty.set(false);
    }

    fn store_obb(&self, obb: Obb) {
        self.obb.set(obb);
        self.obb_dirty.set(false);
    }
}

impl Default for Boundary {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Mark phase
// ============================================================================

/// Flags the bounds of every node in the subtrees of `roots` and of every
/// strict ancestor of each root.
///
/// Returns each touched node exactly once, in visiting order. A node reached
/// twice within the same pass is neither revisited nor listed again.
pub fn invalidate(nodes: &SlotMap<NodeKey, Node>, roots: &[NodeKey]) -> Vec<NodeKey> {
    let mut touched = Vec::new();
    // `seen` is closed under "parent of"; `descended` holds nodes whose whole
    // subtree is already flagged.
    let mut seen: FxHashSet<NodeKey> = FxHashSet::default();
    let mut descended: FxHashSet<NodeKey> = FxHashSet::default();
    let mut stack: Vec<NodeKey> = Vec::with_capacity(32);

    for &root in roots {
        // Down: the root and its subtree.
        stack.push(root);
        while let Some(key) = stack.pop() {
            let Some(node) = nodes.get(key) else {
                continue;
            };
            if !descended.insert(key) {
                continue;
            }
            if seen.insert(key) {
                node.boundary.mark_dirty();
                touched.push(key);
            }
            stack.extend(node.children.iter().rev().map(|h| h.key));
        }

        // Up: strict ancestors. Everything above an already seen ancestor
        // was seen with it.
        let mut cursor = nodes.get(root).and_then(|n| n.parent);
        while let Some(parent) = cursor {
            if !seen.insert(parent.key) {
                break;
            }
            let Some(node) = nodes.get(parent.key) else {
                break;
            };
            node.boundary.mark_dirty();
            touched.push(parent.key);
            cursor = node.parent;
        }
    }

    log::trace!("boundary invalidation touched {} node(s)", touched.len());
    touched
}

// ============================================================================
// Lazy reads
// ============================================================================

/// Children that take part in `node`'s bounds.
fn contributing_children<'a>(
    nodes: &'a SlotMap<NodeKey, Node>,
    node: &'a Node,
) -> impl Iterator<Item = (NodeKey, &'a Node)> + 'a {
    node.children.iter().filter_map(move |h| {
        let child = nodes.get(h.key)?;
        child.state.collidable().then_some((h.key, child))
    })
}

/// World AABB of `key`, rebuilding stale entries bottom-up.
///
/// Uses an explicit post-order stack, so arbitrarily deep hierarchies do not
/// grow the call stack. Clean subtrees are not entered.
pub fn aabb(nodes: &SlotMap<NodeKey, Node>, key: NodeKey) -> Aabb {
    let Some(node) = nodes.get(key) else {
        return Aabb::EMPTY;
    };
    if !node.boundary.aabb_dirty.get() {
        return node.boundary.aabb.get();
    }

    // (node, children already pushed)
    let mut stack: Vec<(NodeKey, bool)> = vec![(key, false)];
    while let Some((current, expanded)) = stack.pop() {
        let Some(node) = nodes.get(current) else {
            continue;
        };
        if !node.boundary.aabb_dirty.get() {
            continue;
        }
        if !expanded {
            stack.push((current, true));
            for (child_key, child) in contributing_children(nodes, node) {
                if child.boundary.aabb_dirty.get() {
                    stack.push((child_key, false));
                }
            }
            continue;
        }

        let mut children = contributing_children(nodes, node).peekable();
        let rebuilt = if children.peek().is_some() {
            children.fold(Aabb::EMPTY, |acc, (_, child)| acc.union(&child.boundary.aabb.get()))
        } else {
            leaf_obb(nodes, current, node).map_or(Aabb::EMPTY, |obb| obb.to_aabb())
        };
        node.boundary.store_aabb(rebuilt);
    }

    node.boundary.aabb.get()
}

/// World-space center of `key` (midpoint of its AABB).
pub fn center(nodes: &SlotMap<NodeKey, Node>, key: NodeKey) -> Vec3 {
    aabb(nodes, key);
    nodes
        .get(key)
        .map_or(Vec3::ZERO, |node| node.boundary.center.get())
}

/// World OBB of `key`.
///
/// Single-child chains pass their bottom OBB through unchanged; the chain is
/// resolved iteratively and every node on it is cached with the same box.
pub fn obb(nodes: &SlotMap<NodeKey, Node>, key: NodeKey) -> Obb {
    let mut chain: SmallVec<[NodeKey; 8]> = SmallVec::new();
    let mut cursor = key;

    let resolved = loop {
        let Some(node) = nodes.get(cursor) else {
            break Obb::default();
        };
        if !node.boundary.obb_dirty.get() {
            break node.boundary.obb.get();
        }
        chain.push(cursor);

        match node.children.as_slice() {
            [only] => cursor = only.key,
            [] => {
                break leaf_obb(nodes, cursor, node).unwrap_or_else(|| Obb::from_aabb(&Aabb::EMPTY));
            }
            _ => break Obb::from_aabb(&aabb(nodes, cursor)),
        }
    };

    for k in chain {
        if let Some(node) = nodes.get(k) {
            node.boundary.store_obb(resolved);
        }
    }
    resolved
}

/// Geometry OBB of a leaf, in world space.
fn leaf_obb(nodes: &SlotMap<NodeKey, Node>, key: NodeKey, node: &Node) -> Option<Obb> {
    let geometry = node.geometry.as_ref()?;
    if geometry.local_aabb().is_empty() {
        return None;
    }
    let world = transform_system::world_matrix(nodes, key);
    Some(geometry.local_obb().transform(&world))
}
