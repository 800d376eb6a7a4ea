//! Transform System
//!
//! Resolves world matrices on demand and propagates world-matrix dirtiness
//! down the hierarchy. Like the boundary engine it only borrows the node
//! arena, never the whole [`Scene`](crate::Scene).
//!
//! # Invariant
//!
//! A node whose world matrix is dirty has a dirty world matrix in every
//! descendant. Writes keep it by flagging whole subtrees ([`mark_world_dirty`]);
//! reads keep it because resolving a node first resolves its dirty ancestors.
//! Consequently a read only has to climb while ancestors are dirty: the first
//! clean ancestor has a clean chain above it.

use glam::Mat4;
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::scene::NodeKey;
use crate::scene::node::Node;

/// World matrix of `key`, rebuilding stale matrices along the parent chain.
///
/// Iterative: climbs to the first clean ancestor, then composes downwards
/// (`parent_world * local`).
pub fn world_matrix(nodes: &SlotMap<NodeKey, Node>, key: NodeKey) -> Mat4 {
    let Some(node) = nodes.get(key) else {
        return Mat4::IDENTITY;
    };
    if !node.transform.world_matrix_dirty.get() {
        return node.transform.world_matrix.get();
    }

    // Dirty chain, deepest first.
    let mut chain: SmallVec<[&Node; 16]> = SmallVec::new();
    let mut base = Mat4::IDENTITY;
    let mut cursor = Some(node);
    while let Some(current) = cursor {
        if !current.transform.world_matrix_dirty.get() {
            base = current.transform.world_matrix.get();
            break;
        }
        chain.push(current);
        cursor = current.parent.and_then(|p| nodes.get(p.key));
    }

    log::trace!("rebuilding {} world matrix(es)", chain.len());
    let mut world = base;
    for current in chain.into_iter().rev() {
        world *= current.transform.local_matrix();
        current.transform.world_matrix.set(world);
        current.transform.world_matrix_dirty.set(false);
    }
    world
}

/// World-normal matrix of `key`: `transpose(inverse(world))`.
///
/// A singular world matrix (e.g. a zero scale) has no inverse; identity is
/// returned for it.
pub fn world_normal_matrix(nodes: &SlotMap<NodeKey, Node>, key: NodeKey) -> Mat4 {
    let Some(node) = nodes.get(key) else {
        return Mat4::IDENTITY;
    };
    if !node.transform.world_normal_matrix_dirty.get() && !node.transform.world_matrix_dirty.get() {
        return node.transform.world_normal_matrix.get();
    }

    let world = world_matrix(nodes, key);
    let normal = if world.determinant().abs() > f32::EPSILON {
        world.inverse().transpose()
    } else {
        Mat4::IDENTITY
    };
    node.transform.world_normal_matrix.set(normal);
    node.transform.world_normal_matrix_dirty.set(false);
    normal
}

/// Flags the world (and world-normal) matrix of `key` and its whole subtree.
///
/// Subtrees whose root is already dirty are skipped; by the module invariant
/// they are dirty throughout. Returns the number of nodes flagged.
pub fn mark_world_dirty(nodes: &SlotMap<NodeKey, Node>, key: NodeKey) -> usize {
    let mut flagged = 0;
    let mut stack: Vec<NodeKey> = Vec::with_capacity(32);

    if let Some(node) = nodes.get(key) {
        // The root itself may already be dirty (e.g. a local setter ran);
        // its subtree still has to be checked.
        node.transform.world_matrix_dirty.set(true);
        node.transform.world_normal_matrix_dirty.set(true);
        flagged += 1;
        stack.extend(node.children.iter().map(|h| h.key));
    }

    while let Some(current) = stack.pop() {
        let Some(node) = nodes.get(current) else {
            continue;
        };
        if node.transform.world_matrix_dirty.get() {
            continue;
        }
        node.transform.world_matrix_dirty.set(true);
        node.transform.world_normal_matrix_dirty.set(true);
        flagged += 1;
        stack.extend(node.children.iter().map(|h| h.key));
    }

    flagged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{NodeHandle, ObjectId, SceneId};
    use glam::Vec3;

    fn chain(length: usize) -> (SlotMap<NodeKey, Node>, Vec<NodeKey>) {
        let mut nodes: SlotMap<NodeKey, Node> = SlotMap::with_key();
        let mut keys: Vec<NodeKey> = Vec::new();
        for i in 0..length {
            let mut node = Node::new(ObjectId::Num(i as u64));
            node.transform.set_position(Vec3::new(1.0, 0.0, 0.0));
            let key = nodes.insert(node);
            if let Some(&parent) = keys.last() {
                nodes[key].parent = Some(NodeHandle { scene: SceneId(0), key: parent });
                nodes[parent].children.push(NodeHandle { scene: SceneId(0), key });
            }
            keys.push(key);
        }
        (nodes, keys)
    }

    #[test]
    fn test_hierarchy_update() {
        let (nodes, keys) = chain(2);
        let child_world_pos = world_matrix(&nodes, keys[1]).w_axis.truncate();
        assert!((child_world_pos - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5);
        assert!(!nodes[keys[0]].transform.is_world_matrix_dirty());
    }

    #[test]
    fn mark_prunes_already_dirty_subtrees() {
        let (nodes, keys) = chain(4);
        world_matrix(&nodes, keys[3]);
        assert_eq!(mark_world_dirty(&nodes, keys[1]), 3);
        // keys[1..] are dirty now, marking again only re-flags the root
        assert_eq!(mark_world_dirty(&nodes, keys[1]), 1);
        assert!(!nodes[keys[0]].transform.is_world_matrix_dirty());
    }

    #[test]
    fn singular_world_has_identity_normal_matrix() {
        let (mut nodes, keys) = chain(1);
        nodes[keys[0]].transform.set_scale(Vec3::ZERO);
        assert_eq!(world_normal_matrix(&nodes, keys[0]), Mat4::IDENTITY);
    }
}
