//! Boundary events
//!
//! Per-node "boundary changed" subscriptions. Listeners are stored in a
//! [`SlotMap`] keyed by [`ListenerKey`], with a per-node index so that a
//! notification only visits the listeners of the touched node.

use rustc_hash::FxHashMap;
use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;

use crate::scene::scene::Scene;
use crate::scene::{NodeHandle, NodeKey};

new_key_type! {
    /// Identifies one boundary subscription.
    pub struct ListenerKey;
}

/// Callback invoked after a node's bounds were invalidated.
///
/// It receives a shared borrow of the scene, so it may read (and thereby
/// rebuild) bounds and matrices, but cannot mutate the tree.
pub type BoundaryCallback = Box<dyn FnMut(&Scene, NodeHandle)>;

struct Listener {
    node: NodeKey,
    callback: BoundaryCallback,
}

#[derive(Default)]
pub(crate) struct BoundaryListeners {
    listeners: SlotMap<ListenerKey, Listener>,
    by_node: FxHashMap<NodeKey, SmallVec<[ListenerKey; 2]>>,
}

impl std::fmt::Debug for BoundaryListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundaryListeners")
            .field("listeners", &self.listeners.len())
            .field("nodes", &self.by_node.len())
            .finish()
    }
}

impl BoundaryListeners {
    pub(crate) fn subscribe(&mut self, node: NodeKey, callback: BoundaryCallback) -> ListenerKey {
        let key = self.listeners.insert(Listener { node, callback });
        self.by_node.entry(node).or_default().push(key);
        key
    }

    pub(crate) fn unsubscribe(&mut self, key: ListenerKey) -> bool {
        let Some(listener) = self.listeners.remove(key) else {
            return false;
        };
        if let Some(keys) = self.by_node.get_mut(&listener.node) {
            keys.retain(|k| *k != key);
            if keys.is_empty() {
                self.by_node.remove(&listener.node);
            }
        }
        true
    }

    /// Drops every subscription of `node`.
    pub(crate) fn remove_node(&mut self, node: NodeKey) {
        if let Some(keys) = self.by_node.remove(&node) {
            for key in keys {
                self.listeners.remove(key);
            }
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Fires the listeners of each touched node once, in `touched` order.
    pub(crate) fn notify(&mut self, scene: &Scene, touched: &[NodeKey]) {
        for &node in touched {
            let Some(keys) = self.by_node.get(&node) else {
                continue;
            };
            let handle = NodeHandle {
                scene: scene.id(),
                key: node,
            };
            for key in keys {
                if let Some(listener) = self.listeners.get_mut(*key) {
                    (listener.callback)(scene, handle);
                }
            }
        }
    }
}
