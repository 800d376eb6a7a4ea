//! Render State & Entity Registry tests
//!
//! Tests for:
//! - Recursive state setters (last write wins)
//! - One-shot state inheritance on attach
//! - SceneSettings defaults for built nodes
//! - Colorize / opacity
//! - Entity classification maps and bulk state changes

use glam::{Vec3, Vec4};
use myth_scenegraph::{NodeHandle, ObjectId, RenderFlags, RenderState, Scene, SceneSettings, StateChange};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn state(scene: &Scene, handle: NodeHandle) -> RenderState {
    *scene.get_node(handle).unwrap().state()
}

/// root -> [a -> a1, b]
fn tree(scene: &mut Scene) -> anyhow::Result<[NodeHandle; 4]> {
    let root = scene.build_node().id("root").build()?;
    let a = scene.build_node().id("a").parent(root).build()?;
    let a1 = scene.build_node().id("a1").parent(a).build()?;
    let b = scene.build_node().id("b").parent(root).build()?;
    Ok([root, a, a1, b])
}

// ============================================================================
// Cascade
// ============================================================================

#[test]
fn highlight_cascades_without_sticky_overrides() -> anyhow::Result<()> {
    init_logger();
    let mut scene = Scene::new();
    let [root, a, a1, b] = tree(&mut scene)?;

    scene.set_highlighted(root, true)?;
    for node in [root, a, a1, b] {
        assert!(state(&scene, node).highlighted());
    }

    scene.set_highlighted(a1, false)?;
    assert!(!state(&scene, a1).highlighted());
    assert!(state(&scene, a).highlighted());

    scene.set_highlighted(root, true)?;
    assert!(state(&scene, a1).highlighted());
    Ok(())
}

#[test]
fn every_flag_setter_cascades() -> anyhow::Result<()> {
    let mut scene = Scene::new();
    let [root, _, a1, _] = tree(&mut scene)?;

    scene.set_visible(root, false)?;
    scene.set_culled(root, true)?;
    scene.set_pickable(root, false)?;
    scene.set_clippable(root, false)?;
    scene.set_collidable(root, false)?;
    scene.set_cast_shadow(root, false)?;
    scene.set_receive_shadow(root, false)?;
    scene.set_outlined(root, true)?;
    scene.set_ghosted(root, true)?;
    scene.set_selected(root, true)?;

    let s = state(&scene, a1);
    assert!(!s.visible());
    assert!(s.culled());
    assert!(!s.pickable());
    assert!(!s.clippable());
    assert!(!s.collidable());
    assert!(!s.cast_shadow());
    assert!(!s.receive_shadow());
    assert!(s.outlined());
    assert!(s.ghosted());
    assert!(s.selected());
    assert!(!s.highlighted());
    Ok(())
}

#[test]
fn state_change_on_subtree_leaves_siblings_alone() -> anyhow::Result<()> {
    let mut scene = Scene::new();
    let [root, a, a1, b] = tree(&mut scene)?;

    scene.set_state(a, StateChange::ghosted(true))?;
    assert!(state(&scene, a).ghosted());
    assert!(state(&scene, a1).ghosted());
    assert!(!state(&scene, b).ghosted());
    assert!(!state(&scene, root).ghosted());
    Ok(())
}

#[test]
fn colorize_and_opacity_cascade_and_clamp() -> anyhow::Result<()> {
    let mut scene = Scene::new();
    let [root, _, a1, _] = tree(&mut scene)?;

    scene.set_colorize(root, Vec3::new(2.0, 0.5, -1.0))?;
    scene.set_opacity(root, 0.25)?;
    let s = state(&scene, a1);
    assert_eq!(s.colorize(), Vec3::new(1.0, 0.5, 0.0));
    assert_eq!(s.opacity(), 0.25);
    assert_eq!(s.color, Vec4::new(1.0, 0.5, 0.0, 0.25));

    scene.set_colorize(root, None)?;
    scene.set_opacity(root, None)?;
    assert_eq!(state(&scene, a1).color, Vec4::ONE);
    Ok(())
}

// ============================================================================
// Inheritance on attach
// ============================================================================

#[test]
fn attach_copies_parent_state_once() -> anyhow::Result<()> {
    let mut scene = Scene::new();
    let parent = scene.build_node().build()?;
    scene.set_visible(parent, false)?;
    scene.set_colorize(parent, Vec3::new(1.0, 0.0, 0.0))?;

    let child = scene.build_node().build()?;
    let grandchild = scene.build_node().parent(child).build()?;
    scene.add_child(parent, child, true)?;

    assert!(!state(&scene, child).visible());
    assert!(!state(&scene, grandchild).visible());
    assert_eq!(state(&scene, grandchild).colorize(), Vec3::new(1.0, 0.0, 0.0));

    // Not a live binding: the child can diverge afterwards.
    scene.set_visible(child, true)?;
    assert!(state(&scene, child).visible());
    assert!(!state(&scene, parent).visible());
    Ok(())
}

#[test]
fn attach_without_inheritance_keeps_child_state() -> anyhow::Result<()> {
    let mut scene = Scene::new();
    let parent = scene.build_node().build()?;
    scene.set_selected(parent, true)?;
    let child = scene.build_node().build()?;

    scene.add_child(parent, child, false)?;
    assert!(!state(&scene, child).selected());
    Ok(())
}

#[test]
fn builder_state_and_settings() -> anyhow::Result<()> {
    let hidden = RenderState::default().with_visible(false);
    let mut scene = Scene::with_settings(SceneSettings {
        initial_state: hidden,
        inherit_states: false,
        ..Default::default()
    });

    let parent = scene.build_node().state(RenderState::default()).build()?;
    let child = scene.build_node().parent(parent).build()?;
    assert!(state(&scene, parent).visible());
    // Settings: no inheritance, initial state hidden.
    assert!(!state(&scene, child).visible());

    let inheriting = scene.build_node().parent(parent).inherit_states(true).build()?;
    assert!(state(&scene, inheriting).visible());
    Ok(())
}

#[test]
fn render_flags_default_set() {
    let s = RenderState::default();
    assert_eq!(
        s.flags,
        RenderFlags::VISIBLE
            | RenderFlags::PICKABLE
            | RenderFlags::CLIPPABLE
            | RenderFlags::COLLIDABLE
            | RenderFlags::CAST_SHADOW
            | RenderFlags::RECEIVE_SHADOW
    );
    assert_eq!(s.color, Vec4::ONE);
}

// ============================================================================
// Entity registry
// ============================================================================

#[test]
fn entity_type_registers_and_clears() -> anyhow::Result<()> {
    let mut scene = Scene::new();
    let wall = scene.build_node().id("wall").build()?;
    let id = ObjectId::from("wall");

    scene.set_entity_type(wall, "IfcWall")?;
    let entities = scene.entities();
    assert_eq!(entities.objects_of_type("IfcWall").and_then(|m| m.get(&id)), Some(&wall));
    assert_eq!(entities.visible_objects().get(&id), Some(&wall));
    assert_eq!(entities.objects().len(), 1);

    scene.clear_entity_type(wall)?;
    let entities = scene.entities();
    assert!(entities.objects_of_type("IfcWall").is_none());
    assert!(entities.visible_objects().is_empty());
    assert!(entities.objects().is_empty());
    assert_eq!(scene.get_node(wall).unwrap().entity_type(), None);

    // Hidden now: re-classifying does not make it visible.
    scene.set_visible(wall, false)?;
    scene.set_entity_type(wall, "IfcWall")?;
    assert!(scene.entities().objects_of_type("IfcWall").is_some());
    assert!(scene.entities().visible_objects().is_empty());
    Ok(())
}

#[test]
fn reclassifying_moves_between_classes() -> anyhow::Result<()> {
    let mut scene = Scene::new();
    let node = scene.build_node().id("n").entity_type("IfcWall").build()?;
    scene.set_entity_type(node, "IfcSlab")?;

    let entities = scene.entities();
    assert!(entities.objects_of_type("IfcWall").is_none());
    assert_eq!(entities.objects_of_type("IfcSlab").map(|m| m.len()), Some(1));
    assert_eq!(entities.entity_types().collect::<Vec<_>>(), vec!["IfcSlab"]);
    Ok(())
}

#[test]
fn state_maps_track_cascaded_changes() -> anyhow::Result<()> {
    let mut scene = Scene::new();
    let [root, a, a1, _] = tree(&mut scene)?;
    scene.set_entity_type(a1, "IfcDoor")?;
    let id = ObjectId::from("a1");

    scene.set_selected(root, true)?;
    scene.set_ghosted(a, true)?;
    scene.set_highlighted(a1, true)?;
    let entities = scene.entities();
    assert_eq!(entities.selected_object_ids(), vec![id.clone()]);
    assert_eq!(entities.ghosted_object_ids(), vec![id.clone()]);
    assert_eq!(entities.highlighted_object_ids(), vec![id.clone()]);
    assert_eq!(entities.visible_object_ids(), vec![id.clone()]);
    // Unclassified nodes are never listed.
    assert_eq!(entities.selected_objects().len(), 1);

    scene.set_visible(root, false)?;
    scene.set_selected(root, false)?;
    assert!(scene.entities().visible_objects().is_empty());
    assert!(scene.entities().selected_objects().is_empty());
    Ok(())
}

#[test]
fn classification_is_not_hierarchical() -> anyhow::Result<()> {
    let mut scene = Scene::new();
    let [root, a, a1, _] = tree(&mut scene)?;
    scene.set_entity_type(a, "IfcBuildingStorey")?;

    assert_eq!(scene.entities().objects().len(), 1);
    assert_eq!(scene.get_node(a1).unwrap().entity_type(), None);
    assert_eq!(scene.get_node(root).unwrap().entity_type(), None);
    Ok(())
}

#[test]
fn bulk_state_by_type_cascades_down_the_tree() -> anyhow::Result<()> {
    let mut scene = Scene::new();
    let [root, a, a1, b] = tree(&mut scene)?;
    scene.set_entity_type(a, "IfcSpace")?;
    scene.set_entity_type(b, "IfcSpace")?;

    let count = scene.set_entity_type_state("IfcSpace", StateChange::visible(false));
    assert_eq!(count, 2);
    assert!(!state(&scene, a).visible());
    assert!(!state(&scene, b).visible());
    // Reached through the hierarchy, not the classification.
    assert!(!state(&scene, a1).visible());
    assert!(state(&scene, root).visible());

    assert_eq!(scene.set_entity_type_state("IfcUnknown", StateChange::visible(false)), 0);
    Ok(())
}

#[test]
fn bulk_state_by_ids_skips_unknown_and_unclassified() -> anyhow::Result<()> {
    let mut scene = Scene::new();
    let [_, a, a1, b] = tree(&mut scene)?;
    scene.set_entity_type(a1, "IfcWindow")?;
    scene.set_entity_type(b, "IfcWindow")?;

    let ids = [ObjectId::from("a1"), ObjectId::from("a"), ObjectId::from("ghost")];
    assert_eq!(scene.set_objects_state(&ids, StateChange::selected(true)), 1);
    assert!(state(&scene, a1).selected());
    assert!(!state(&scene, a).selected());
    assert!(!state(&scene, b).selected());
    assert_eq!(scene.entities().selected_object_ids(), vec![ObjectId::from("a1")]);
    Ok(())
}

#[test]
fn bulk_collidable_change_invalidates_bounds() -> anyhow::Result<()> {
    use myth_scenegraph::Aabb;
    use std::rc::Rc;

    let mut scene = Scene::new();
    let root = scene.build_node().build()?;
    scene
        .build_node()
        .geometry(Rc::new(Aabb::new(Vec3::ZERO, Vec3::ONE)))
        .parent(root)
        .build()?;
    scene
        .build_node()
        .id("furniture")
        .entity_type("IfcFurniture")
        .position(Vec3::splat(5.0))
        .geometry(Rc::new(Aabb::new(Vec3::ZERO, Vec3::ONE)))
        .parent(root)
        .build()?;
    assert_eq!(scene.aabb(root).unwrap().max, Vec3::splat(6.0));

    scene.set_entity_type_state("IfcFurniture", StateChange::Flags(RenderFlags::COLLIDABLE, false));
    assert_eq!(scene.aabb(root), Some(Aabb::new(Vec3::ZERO, Vec3::ONE)));
    Ok(())
}
