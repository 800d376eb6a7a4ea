//! Entity registry
//!
//! Scene-level maps of classified nodes ("entities"): every node with a
//! non-empty entity type is listed in the aggregate map and in the map of its
//! class, and additionally in the visible / ghosted / selected / highlighted
//! maps while the corresponding flag is set.
//!
//! Classification is independent of the hierarchy. Classifying a composite
//! node does not classify its descendants.

use rustc_hash::FxHashMap;

use crate::scene::state::{RenderFlags, RenderState};
use crate::scene::{NodeHandle, ObjectId};

pub type EntityMap = FxHashMap<ObjectId, NodeHandle>;

#[derive(Debug, Default)]
pub struct EntityRegistry {
    objects: EntityMap,
    by_type: FxHashMap<String, EntityMap>,
    visible: EntityMap,
    ghosted: EntityMap,
    selected: EntityMap,
    highlighted: EntityMap,
}

impl EntityRegistry {
    // ========================================================================
    // Hooks
    // ========================================================================

    /// Registers `id` under `entity_type` and derives its per-state
    /// membership from `state`.
    pub(crate) fn entity_type_assigned(
        &mut self,
        id: &ObjectId,
        handle: NodeHandle,
        entity_type: &str,
        state: &RenderState,
    ) {
        self.objects.insert(id.clone(), handle);
        self.by_type
            .entry(entity_type.to_owned())
            .or_default()
            .insert(id.clone(), handle);
        self.entity_visibility_updated(id, handle, state.visible());
        self.entity_ghosted_updated(id, handle, state.ghosted());
        self.entity_selected_updated(id, handle, state.selected());
        self.entity_highlighted_updated(id, handle, state.highlighted());
    }

    /// Removes `id` from its class and from every entity map, whatever its
    /// current state.
    pub(crate) fn entity_type_removed(&mut self, id: &ObjectId, entity_type: &str) {
        if let Some(class) = self.by_type.get_mut(entity_type) {
            class.remove(id);
            if class.is_empty() {
                self.by_type.remove(entity_type);
            }
        }
        self.objects.remove(id);
        self.visible.remove(id);
        self.ghosted.remove(id);
        self.selected.remove(id);
        self.highlighted.remove(id);
    }

    pub(crate) fn entity_visibility_updated(&mut self, id: &ObjectId, handle: NodeHandle, visible: bool) {
        toggle(&mut self.visible, id, handle, visible);
    }

    pub(crate) fn entity_ghosted_updated(&mut self, id: &ObjectId, handle: NodeHandle, ghosted: bool) {
        toggle(&mut self.ghosted, id, handle, ghosted);
    }

    pub(crate) fn entity_selected_updated(&mut self, id: &ObjectId, handle: NodeHandle, selected: bool) {
        toggle(&mut self.selected, id, handle, selected);
    }

    pub(crate) fn entity_highlighted_updated(
        &mut self,
        id: &ObjectId,
        handle: NodeHandle,
        highlighted: bool,
    ) {
        toggle(&mut self.highlighted, id, handle, highlighted);
    }

    /// Dispatches the per-state hooks for the tracked flags in `flipped`.
    pub(crate) fn entity_state_updated(
        &mut self,
        id: &ObjectId,
        handle: NodeHandle,
        flipped: RenderFlags,
        state: &RenderState,
    ) {
        if flipped.contains(RenderFlags::VISIBLE) {
            self.entity_visibility_updated(id, handle, state.visible());
        }
        if flipped.contains(RenderFlags::GHOSTED) {
            self.entity_ghosted_updated(id, handle, state.ghosted());
        }
        if flipped.contains(RenderFlags::SELECTED) {
            self.entity_selected_updated(id, handle, state.selected());
        }
        if flipped.contains(RenderFlags::HIGHLIGHTED) {
            self.entity_highlighted_updated(id, handle, state.highlighted());
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// All classified nodes.
    #[must_use]
    pub fn objects(&self) -> &EntityMap {
        &self.objects
    }

    /// Classified nodes of one entity type.
    #[must_use]
    pub fn objects_of_type(&self, entity_type: &str) -> Option<&EntityMap> {
        self.by_type.get(entity_type)
    }

    /// Entity types with at least one member.
    pub fn entity_types(&self) -> impl Iterator<Item = &str> {
        self.by_type.keys().map(String::as_str)
    }

    #[must_use]
    pub fn visible_objects(&self) -> &EntityMap {
        &self.visible
    }

    #[must_use]
    pub fn ghosted_objects(&self) -> &EntityMap {
        &self.ghosted
    }

    #[must_use]
    pub fn selected_objects(&self) -> &EntityMap {
        &self.selected
    }

    #[must_use]
    pub fn highlighted_objects(&self) -> &EntityMap {
        &self.highlighted
    }

    /// Ids of the visible entities, sorted.
    #[must_use]
    pub fn visible_object_ids(&self) -> Vec<ObjectId> {
        sorted_ids(&self.visible)
    }

    /// Ids of the selected entities, sorted.
    #[must_use]
    pub fn selected_object_ids(&self) -> Vec<ObjectId> {
        sorted_ids(&self.selected)
    }

    /// Ids of the highlighted entities, sorted.
    #[must_use]
    pub fn highlighted_object_ids(&self) -> Vec<ObjectId> {
        sorted_ids(&self.highlighted)
    }

    /// Ids of the ghosted entities, sorted.
    #[must_use]
    pub fn ghosted_object_ids(&self) -> Vec<ObjectId> {
        sorted_ids(&self.ghosted)
    }
}

fn toggle(map: &mut EntityMap, id: &ObjectId, handle: NodeHandle, on: bool) {
    if on {
        map.insert(id.clone(), handle);
    } else {
        map.remove(id);
    }
}

fn sorted_ids(map: &EntityMap) -> Vec<ObjectId> {
    let mut ids: Vec<ObjectId> = map.keys().cloned().collect();
    ids.sort();
    ids
}
