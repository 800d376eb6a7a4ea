//! Transform and TransformSystem tests
//!
//! Tests for:
//! - Euler / quaternion synchronisation through the scene setters
//! - Hierarchical matrix composition (parent_world * local)
//! - Lazy world matrix rebuild at arbitrary depth
//! - set_matrix decomposition and dirty flags
//! - rotate / translate in the node's own frame
//! - World-normal matrix

use glam::{Mat4, Quat, Vec3};
use myth_scenegraph::{NodeHandle, Scene};

// ============================================================================
// Helper
// ============================================================================

const EPSILON: f32 = 1e-4;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

/// Same rotation, allowing for the `q` / `-q` double cover.
fn quat_approx(a: Quat, b: Quat) -> bool {
    a.abs_diff_eq(b, EPSILON) || a.abs_diff_eq(-b, EPSILON)
}

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
}

fn mat4_approx(a: Mat4, b: Mat4) -> bool {
    a.to_cols_array()
        .iter()
        .zip(b.to_cols_array().iter())
        .all(|(x, y)| approx_eq(*x, *y))
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// root -> child -> grandchild, each translated by +1 on X.
fn chain3(scene: &mut Scene) -> anyhow::Result<[NodeHandle; 3]> {
    let root = scene.build_node().id("root").position(Vec3::X).build()?;
    let child = scene.build_node().id("child").position(Vec3::X).parent(root).build()?;
    let grandchild = scene
        .build_node()
        .id("grandchild")
        .position(Vec3::X)
        .parent(child)
        .build()?;
    Ok([root, child, grandchild])
}

// ============================================================================
// Composition
// ============================================================================

#[test]
fn child_world_position_composes_with_parent() -> anyhow::Result<()> {
    init_logger();
    let mut scene = Scene::new();
    let root = scene.build_node().position(Vec3::new(1.0, 0.0, 0.0)).build()?;
    let child = scene
        .build_node()
        .position(Vec3::new(0.0, 2.0, 0.0))
        .parent(root)
        .build()?;

    let world = scene.world_position(child).unwrap();
    assert!(vec3_approx(world, Vec3::new(1.0, 2.0, 0.0)), "got {world}");
    Ok(())
}

#[test]
fn world_is_parent_world_times_local() -> anyhow::Result<()> {
    let mut scene = Scene::new();
    let root = scene
        .build_node()
        .position(Vec3::new(5.0, 0.0, 0.0))
        .rotation(Vec3::new(0.0, 0.0, 90.0))
        .build()?;
    let child = scene
        .build_node()
        .position(Vec3::new(1.0, 0.0, 0.0))
        .scale(Vec3::splat(2.0))
        .parent(root)
        .build()?;

    let expected = scene.world_matrix(root).unwrap() * scene.local_matrix(child).unwrap();
    assert!(mat4_approx(scene.world_matrix(child).unwrap(), expected));
    // Rotated parent frame: local +X maps to world +Y.
    assert!(vec3_approx(scene.world_position(child).unwrap(), Vec3::new(5.0, 1.0, 0.0)));
    Ok(())
}

#[test]
fn root_change_reaches_grandchild_lazily() -> anyhow::Result<()> {
    let mut scene = Scene::new();
    let [root, child, grandchild] = chain3(&mut scene)?;
    assert!(vec3_approx(scene.world_position(grandchild).unwrap(), Vec3::new(3.0, 0.0, 0.0)));

    scene.set_rotation(root, Vec3::new(0.0, 0.0, 90.0))?;

    // Only the flags change on write.
    let node = scene.get_node(grandchild).unwrap();
    assert!(node.transform().is_world_matrix_dirty());
    assert!(scene.get_node(child).unwrap().transform().is_world_matrix_dirty());

    // The read rebuilds the whole dirty chain.
    assert!(vec3_approx(scene.world_position(grandchild).unwrap(), Vec3::new(1.0, 2.0, 0.0)));
    assert!(!scene.get_node(child).unwrap().transform().is_world_matrix_dirty());
    assert!(!scene.get_node(root).unwrap().transform().is_world_matrix_dirty());
    Ok(())
}

#[test]
fn reads_without_writes_keep_caches_clean() -> anyhow::Result<()> {
    let mut scene = Scene::new();
    let [_, _, grandchild] = chain3(&mut scene)?;
    let first = scene.world_matrix(grandchild).unwrap();
    let second = scene.world_matrix(grandchild).unwrap();
    assert_eq!(first, second);
    assert!(!scene.get_node(grandchild).unwrap().transform().is_world_matrix_dirty());
    Ok(())
}

#[test]
fn sibling_subtree_is_not_dirtied() -> anyhow::Result<()> {
    let mut scene = Scene::new();
    let root = scene.build_node().build()?;
    let a = scene.build_node().parent(root).build()?;
    let b = scene.build_node().parent(root).build()?;
    let _ = scene.world_matrix(a);
    let _ = scene.world_matrix(b);

    scene.set_position(a, Vec3::Y)?;
    assert!(scene.get_node(a).unwrap().transform().is_world_matrix_dirty());
    assert!(!scene.get_node(b).unwrap().transform().is_world_matrix_dirty());
    assert!(!scene.get_node(root).unwrap().transform().is_world_matrix_dirty());
    Ok(())
}

// ============================================================================
// Setters
// ============================================================================

#[test]
fn euler_and_quaternion_are_synchronised() -> anyhow::Result<()> {
    let mut scene = Scene::new();
    let node = scene.build_node().build()?;

    scene.set_rotation(node, Vec3::new(30.0, 0.0, 0.0))?;
    let q = scene.get_node(node).unwrap().quaternion();
    assert!(quat_approx(q, Quat::from_rotation_x(30f32.to_radians())));

    scene.set_quaternion(node, Quat::from_rotation_y(60f32.to_radians()))?;
    let euler = scene.get_node(node).unwrap().rotation();
    assert!(vec3_approx(euler, Vec3::new(0.0, 60.0, 0.0)), "got {euler}");
    Ok(())
}

#[test]
fn none_resets_to_defaults() -> anyhow::Result<()> {
    let mut scene = Scene::new();
    let node = scene
        .build_node()
        .position(Vec3::ONE)
        .rotation(Vec3::new(10.0, 20.0, 30.0))
        .scale(Vec3::splat(4.0))
        .build()?;

    scene.set_position(node, None)?;
    scene.set_rotation(node, None)?;
    scene.set_scale(node, None)?;

    let n = scene.get_node(node).unwrap();
    assert_eq!(n.position(), Vec3::ZERO);
    assert_eq!(n.rotation(), Vec3::ZERO);
    assert_eq!(n.quaternion(), Quat::IDENTITY);
    assert_eq!(n.scale(), Vec3::ONE);
    assert_eq!(scene.local_matrix(node), Some(Mat4::IDENTITY));
    Ok(())
}

#[test]
fn set_matrix_is_authoritative_and_decomposed() -> anyhow::Result<()> {
    let mut scene = Scene::new();
    let parent = scene.build_node().position(Vec3::new(0.0, 0.0, 1.0)).build()?;
    let node = scene.build_node().parent(parent).build()?;
    let _ = scene.world_matrix(node);

    let m = Mat4::from_scale_rotation_translation(
        Vec3::new(2.0, 2.0, 2.0),
        Quat::from_rotation_z(90f32.to_radians()),
        Vec3::new(1.0, 2.0, 3.0),
    );
    scene.set_matrix(node, m)?;

    let n = scene.get_node(node).unwrap();
    assert!(!n.transform().is_local_matrix_dirty());
    assert!(n.transform().is_world_matrix_dirty());
    assert!(vec3_approx(n.position(), Vec3::new(1.0, 2.0, 3.0)));
    assert!(vec3_approx(n.scale(), Vec3::splat(2.0)));
    assert!(vec3_approx(n.rotation(), Vec3::new(0.0, 0.0, 90.0)));
    assert_eq!(scene.local_matrix(node), Some(m));
    assert!(vec3_approx(scene.world_position(node).unwrap(), Vec3::new(1.0, 2.0, 4.0)));
    Ok(())
}

#[test]
fn builder_matrix_wins_over_trs() -> anyhow::Result<()> {
    let mut scene = Scene::new();
    let m = Mat4::from_translation(Vec3::new(7.0, 0.0, 0.0));
    let node = scene.build_node().position(Vec3::ONE).matrix(m).build()?;
    assert_eq!(scene.local_matrix(node), Some(m));
    Ok(())
}

#[test]
fn rotate_composes_in_local_frame() -> anyhow::Result<()> {
    let mut scene = Scene::new();
    let node = scene.build_node().build()?;
    scene.rotate_x(node, 90.0)?;
    scene.rotate_y(node, 90.0)?;

    let expected = Quat::from_rotation_x(90f32.to_radians()) * Quat::from_rotation_y(90f32.to_radians());
    let q = scene.get_node(node).unwrap().quaternion();
    assert!(quat_approx(q, expected));
    Ok(())
}

#[test]
fn translate_follows_current_rotation() -> anyhow::Result<()> {
    let mut scene = Scene::new();
    let node = scene.build_node().build()?;
    scene.rotate_z(node, 90.0)?;
    scene.translate_x(node, 2.0)?;
    assert!(vec3_approx(scene.get_node(node).unwrap().position(), Vec3::new(0.0, 2.0, 0.0)));

    scene.translate_y(node, 1.0)?;
    assert!(vec3_approx(scene.get_node(node).unwrap().position(), Vec3::new(-1.0, 2.0, 0.0)));

    scene.translate_z(node, 3.0)?;
    assert!(vec3_approx(scene.get_node(node).unwrap().position(), Vec3::new(-1.0, 2.0, 3.0)));
    Ok(())
}

#[test]
fn degenerate_quaternion_falls_back_to_identity() -> anyhow::Result<()> {
    let mut scene = Scene::new();
    let node = scene.build_node().build()?;
    scene.set_quaternion(node, Quat::from_xyzw(0.0, 0.0, 0.0, 0.0))?;
    assert_eq!(scene.get_node(node).unwrap().quaternion(), Quat::IDENTITY);
    Ok(())
}

// ============================================================================
// World-normal matrix
// ============================================================================

#[test]
fn normal_matrix_is_inverse_transpose() -> anyhow::Result<()> {
    let mut scene = Scene::new();
    let node = scene.build_node().scale(Vec3::new(2.0, 1.0, 1.0)).build()?;
    let normal = scene.world_normal_matrix(node).unwrap();
    assert!(mat4_approx(normal, Mat4::from_scale(Vec3::new(0.5, 1.0, 1.0))));
    Ok(())
}

#[test]
fn normal_matrix_follows_parent_changes() -> anyhow::Result<()> {
    let mut scene = Scene::new();
    let root = scene.build_node().build()?;
    let child = scene.build_node().parent(root).build()?;
    assert!(mat4_approx(scene.world_normal_matrix(child).unwrap(), Mat4::IDENTITY));

    scene.set_scale(root, Vec3::new(1.0, 4.0, 1.0))?;
    assert!(mat4_approx(
        scene.world_normal_matrix(child).unwrap(),
        Mat4::from_scale(Vec3::new(1.0, 0.25, 1.0))
    ));
    Ok(())
}

#[test]
fn zero_scale_gives_identity_normal_matrix() -> anyhow::Result<()> {
    let mut scene = Scene::new();
    let node = scene.build_node().scale(Vec3::ZERO).build()?;
    assert_eq!(scene.world_normal_matrix(node), Some(Mat4::IDENTITY));
    Ok(())
}

// ============================================================================
// Reparenting
// ============================================================================

#[test]
fn reparenting_changes_world_frame() -> anyhow::Result<()> {
    let mut scene = Scene::new();
    let a = scene.build_node().position(Vec3::new(10.0, 0.0, 0.0)).build()?;
    let b = scene.build_node().position(Vec3::new(0.0, 10.0, 0.0)).build()?;
    let leaf = scene.build_node().position(Vec3::Z).parent(a).build()?;
    assert!(vec3_approx(scene.world_position(leaf).unwrap(), Vec3::new(10.0, 0.0, 1.0)));

    scene.add_child(b, leaf, true)?;
    assert!(vec3_approx(scene.world_position(leaf).unwrap(), Vec3::new(0.0, 10.0, 1.0)));

    scene.remove_child(b, leaf)?;
    assert!(vec3_approx(scene.world_position(leaf).unwrap(), Vec3::Z));
    Ok(())
}
