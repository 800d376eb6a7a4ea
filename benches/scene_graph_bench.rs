//! Scene graph benchmarks
//!
//! - Lazy world matrix rebuild after a root change (deep chain)
//! - Boundary invalidation + AABB rebuild after moving one leaf (wide tree)
//! - Cascading state set over a large subtree

use std::hint::black_box;
use std::rc::Rc;

use criterion::{Criterion, criterion_group, criterion_main};
use glam::Vec3;
use myth_scenegraph::{Aabb, GeometryBounds, NodeHandle, Scene};

fn deep_chain(depth: usize) -> (Scene, NodeHandle, NodeHandle) {
    let mut scene = Scene::new();
    let root = scene.build_node().build().unwrap();
    let mut tip = root;
    for _ in 0..depth {
        tip = scene.build_node().position(Vec3::X).parent(tip).build().unwrap();
    }
    (scene, root, tip)
}

/// `groups` groups of `leaves` unit-box leaves under one root.
fn wide_tree(groups: usize, leaves: usize) -> (Scene, NodeHandle, NodeHandle) {
    let mut scene = Scene::new();
    let shape: Rc<dyn GeometryBounds> = Rc::new(Aabb::new(Vec3::ZERO, Vec3::ONE));
    let root = scene.build_node().build().unwrap();
    let mut last = root;
    for g in 0..groups {
        let group = scene.build_node().parent(root).build().unwrap();
        for l in 0..leaves {
            last = scene
                .build_node()
                .position(Vec3::new(g as f32, l as f32, 0.0))
                .geometry(Rc::clone(&shape))
                .parent(group)
                .build()
                .unwrap();
        }
    }
    (scene, root, last)
}

fn bench_world_matrix(c: &mut Criterion) {
    let (mut scene, root, tip) = deep_chain(256);
    let mut angle = 0.0_f32;
    c.bench_function("world_matrix_after_root_rotation/256", |b| {
        b.iter(|| {
            angle += 1.0;
            scene.set_rotation(root, Vec3::new(0.0, 0.0, angle)).unwrap();
            black_box(scene.world_matrix(tip));
        });
    });
}

fn bench_boundary(c: &mut Criterion) {
    let (mut scene, root, leaf) = wide_tree(32, 32);
    let mut offset = 0.0_f32;
    c.bench_function("aabb_after_leaf_move/32x32", |b| {
        b.iter(|| {
            offset += 0.5;
            scene.set_position(leaf, Vec3::new(offset, 0.0, 0.0)).unwrap();
            black_box(scene.aabb(root));
        });
    });
}

fn bench_state_cascade(c: &mut Criterion) {
    let (mut scene, root, _) = wide_tree(32, 32);
    let mut on = false;
    c.bench_function("set_highlighted_cascade/1057", |b| {
        b.iter(|| {
            on = !on;
            scene.set_highlighted(root, on).unwrap();
        });
    });
}

criterion_group!(benches, bench_world_matrix, bench_boundary, bench_state_cascade);
criterion_main!(benches);
