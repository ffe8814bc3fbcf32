//! Integration tests for transform propagation, reparenting and the
//! component sync.
//!
//! # Usage
//!
//! ```sh
//! cargo test --test transform_integration
//! ```

use bevy_ecs::hierarchy::ChildOf;
use bevy_ecs::prelude::*;
use glam::{DAffine2, DVec2};
use std::f64::consts::PI;

use sceneforge::components::globaltransform2d::GlobalTransform2D;
use sceneforge::components::localtransform::LocalTransform;
use sceneforge::components::nodecontent::NodeContent;
use sceneforge::math::{Rect, Transform2D};
use sceneforge::scene::component::transformation_components;
use sceneforge::scene::{ComponentValue, SceneComponentCollection, ids};
use sceneforge::systems::propagate_transforms::{
    global_matrix, link, local_bounds, propagate_from, propagate_transforms, transform_to,
};
use sceneforge::systems::sync::{apply_components, update_components};

const EPSILON: f64 = 1e-6;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn matrix_approx_eq(a: &DAffine2, b: &DAffine2) -> bool {
    a.abs_diff_eq(*b, EPSILON)
}

fn tick_propagate(world: &mut World) {
    let mut schedule = Schedule::default();
    schedule.add_systems(propagate_transforms);
    schedule.run(world);
}

fn spawn_node(world: &mut World, transform: Transform2D, content: Option<Rect>) -> Entity {
    world
        .spawn((
            LocalTransform(transform),
            GlobalTransform2D::default(),
            NodeContent(content),
        ))
        .id()
}

fn random_sign(rng: &mut fastrand::Rng) -> f64 {
    if rng.bool() { 1.0 } else { -1.0 }
}

fn random_range(rng: &mut fastrand::Rng, min: f64, max: f64) -> f64 {
    min + rng.f64() * (max - min)
}

fn random_transform(rng: &mut fastrand::Rng) -> Transform2D {
    let sx = random_sign(rng) * random_range(rng, 0.25, 2.5);
    let sy = random_sign(rng) * random_range(rng, 0.25, 2.5);
    Transform2D::from_position(random_range(rng, -100.0, 100.0), random_range(rng, -100.0, 100.0))
        .with_scale(sx, sy)
        .with_rotation(random_range(rng, -PI, PI))
        .with_skew(random_range(rng, -0.3, 0.3), random_range(rng, -0.3, 0.3))
        .with_pivot(random_range(rng, -20.0, 20.0), random_range(rng, -20.0, 20.0))
}

fn gt(world: &World, node: Entity) -> DAffine2 {
    world.get::<GlobalTransform2D>(node).unwrap().matrix()
}

// =============================================================================
// Propagation
// =============================================================================

#[test]
fn schedule_propagates_three_levels() {
    let mut world = World::new();
    let root = spawn_node(&mut world, Transform2D::from_position(100.0, 50.0), None);
    let mid = spawn_node(
        &mut world,
        Transform2D::from_position(10.0, 0.0).with_scale(2.0, 2.0),
        None,
    );
    let leaf = spawn_node(&mut world, Transform2D::from_position(5.0, 5.0), None);
    world.entity_mut(mid).insert(ChildOf(root));
    world.entity_mut(leaf).insert(ChildOf(mid));
    world.flush();

    tick_propagate(&mut world);

    let leaf_world = gt(&world, leaf);
    assert!(
        approx_eq(leaf_world.translation.x, 120.0) && approx_eq(leaf_world.translation.y, 60.0),
        "Leaf world translation: expected (120, 60), got {:?}",
        leaf_world.translation
    );
    assert!(approx_eq(leaf_world.matrix2.x_axis.x, 2.0));
    assert!(matrix_approx_eq(&leaf_world, &global_matrix(&world, leaf)));
}

#[test]
fn schedule_and_immediate_propagation_agree() {
    let mut rng = fastrand::Rng::with_seed(7);
    let mut world = World::new();
    let root = spawn_node(&mut world, random_transform(&mut rng), None);
    let mut parent = root;
    let mut chain = vec![root];
    for _ in 0..4 {
        let node = spawn_node(&mut world, random_transform(&mut rng), None);
        link(&mut world, node, parent, None);
        chain.push(node);
        parent = node;
    }

    if let Some(mut local) = world.get_mut::<LocalTransform>(root) {
        local.0 = random_transform(&mut rng);
    }
    propagate_from(&mut world, root);
    let immediate: Vec<DAffine2> = chain.iter().map(|&n| gt(&world, n)).collect();

    tick_propagate(&mut world);
    for (node, expected) in chain.iter().zip(immediate) {
        assert!(
            matrix_approx_eq(&gt(&world, *node), &expected),
            "Schedule and propagate_from disagree for {:?}",
            node
        );
    }
}

#[test]
fn local_bounds_include_transformed_children() {
    let mut world = World::new();
    let group = spawn_node(&mut world, Transform2D::IDENTITY, None);
    let a = spawn_node(
        &mut world,
        Transform2D::from_position(10.0, 0.0),
        Some(Rect::new(0.0, 0.0, 10.0, 10.0)),
    );
    let b = spawn_node(
        &mut world,
        Transform2D::from_position(-5.0, 20.0).with_scale(2.0, 0.5),
        Some(Rect::new(0.0, 0.0, 10.0, 10.0)),
    );
    link(&mut world, a, group, None);
    link(&mut world, b, group, None);

    let bounds = local_bounds(&world, group);
    assert!(approx_eq(bounds.x, -5.0));
    assert!(approx_eq(bounds.y, 0.0));
    assert!(approx_eq(bounds.width, 25.0));
    assert!(approx_eq(bounds.height, 25.0));
}

// =============================================================================
// Reparenting
// =============================================================================

#[test]
fn transform_to_preserves_world_matrix() {
    let mut rng = fastrand::Rng::with_seed(0x5eed);
    for round in 0..64 {
        let mut world = World::new();
        let old_parent = spawn_node(&mut world, random_transform(&mut rng), None);
        let new_parent = spawn_node(&mut world, random_transform(&mut rng), None);
        let grand = spawn_node(&mut world, random_transform(&mut rng), None);
        link(&mut world, new_parent, grand, None);
        let node = spawn_node(&mut world, random_transform(&mut rng), None);
        link(&mut world, node, old_parent, None);

        let before = global_matrix(&world, node);
        assert!(transform_to(&mut world, node, new_parent));
        link(&mut world, node, new_parent, None);
        let after = global_matrix(&world, node);
        assert!(
            matrix_approx_eq(&before, &after),
            "round {}: world matrix changed\nbefore {:?}\nafter  {:?}",
            round,
            before,
            after
        );
        assert!(matrix_approx_eq(&gt(&world, node), &after));
    }
}

#[test]
fn transform_to_keeps_flips_as_negative_scale() {
    let mut world = World::new();
    let root = spawn_node(&mut world, Transform2D::IDENTITY, None);
    let parent = spawn_node(&mut world, Transform2D::from_position(50.0, 0.0), None);
    link(&mut world, parent, root, None);
    let node = spawn_node(
        &mut world,
        Transform2D::from_position(5.0, 5.0).with_scale(-2.0, 1.0),
        None,
    );
    link(&mut world, node, root, None);

    assert!(transform_to(&mut world, node, parent));
    let local = world.get::<LocalTransform>(node).unwrap().0;
    assert!(local.scale.x < 0.0, "flip should stay a negative scale");
    assert!(approx_eq(local.position.x, -45.0));
    assert!(approx_eq(local.skew.x, 0.0) && approx_eq(local.skew.y, 0.0));
}

#[test]
fn degenerate_parent_leaves_node_untouched() {
    let mut world = World::new();
    let flat = spawn_node(&mut world, Transform2D::IDENTITY.with_scale(0.0, 1.0), None);
    let original = Transform2D::from_position(3.0, 4.0).with_rotation(0.2);
    let node = spawn_node(&mut world, original, None);

    assert!(!transform_to(&mut world, node, flat));
    assert_eq!(world.get::<LocalTransform>(node).unwrap().0, original);
}

// =============================================================================
// Component sync
// =============================================================================

fn random_components(rng: &mut fastrand::Rng, width: f64, height: f64) -> SceneComponentCollection {
    let t = random_transform(rng);
    let mut comps =
        SceneComponentCollection::from(transformation_components(t.position.x, t.position.y, width, height));
    comps.set_value(ids::SCALE, ComponentValue::Point { x: t.scale.x, y: t.scale.y });
    comps.set_value(
        ids::ROTATION,
        ComponentValue::Range {
            value: t.rotation.to_degrees(),
            min: -180.0,
            max: 180.0,
            step: 1.0,
        },
    );
    comps.set_value(
        ids::SKEW,
        ComponentValue::Point {
            x: t.skew.x.to_degrees(),
            y: t.skew.y.to_degrees(),
        },
    );
    comps.set_value(ids::PIVOT, ComponentValue::Point { x: t.pivot.x, y: t.pivot.y });
    comps
}

#[test]
fn sync_round_trip_is_idempotent() {
    let mut rng = fastrand::Rng::with_seed(42);
    for round in 0..32 {
        let mut world = World::new();
        let parent = spawn_node(&mut world, random_transform(&mut rng), None);
        let node = spawn_node(&mut world, Transform2D::IDENTITY, Some(Rect::new(0.0, 0.0, 12.0, 8.0)));
        link(&mut world, node, parent, None);

        let mut comps = random_components(&mut rng, 12.0, 8.0);
        apply_components(&mut world, node, &comps);
        let first = global_matrix(&world, node);

        update_components(&world, node, parent, &mut comps);
        assert!(
            !update_components(&world, node, parent, &mut comps),
            "round {}: second update changed components",
            round
        );

        apply_components(&mut world, node, &comps);
        let second = global_matrix(&world, node);
        assert!(
            matrix_approx_eq(&first, &second),
            "round {}: apply after update moved the node",
            round
        );
        assert!(
            !update_components(&world, node, parent, &mut comps),
            "round {}: update after re-apply changed components",
            round
        );
    }
}

#[test]
fn size_is_signed_world_size() {
    let mut world = World::new();
    let parent = spawn_node(&mut world, Transform2D::IDENTITY.with_scale(3.0, 3.0), None);
    let node = spawn_node(&mut world, Transform2D::IDENTITY, Some(Rect::new(0.0, 0.0, 10.0, 4.0)));
    link(&mut world, node, parent, None);

    let mut comps = SceneComponentCollection::from(transformation_components(0.0, 0.0, 10.0, 4.0));
    comps.set_value(ids::SCALE, ComponentValue::Point { x: -1.0, y: 0.5 });
    apply_components(&mut world, node, &comps);
    update_components(&world, node, parent, &mut comps);

    let (width, height, local_width, local_height) = comps.size(ids::SIZE).unwrap();
    assert!(approx_eq(width, -30.0), "width: expected -30, got {}", width);
    assert!(approx_eq(height, 6.0), "height: expected 6, got {}", height);
    assert!(approx_eq(local_width, 10.0));
    assert!(approx_eq(local_height, 4.0));
}

#[test]
fn update_never_creates_components() {
    let mut world = World::new();
    let parent = spawn_node(&mut world, Transform2D::IDENTITY, None);
    let node = spawn_node(&mut world, Transform2D::from_position(4.0, 2.0).with_rotation(1.0), None);
    link(&mut world, node, parent, None);

    let mut comps = SceneComponentCollection::from(vec![
        sceneforge::scene::SceneComponent::point(ids::POSITION, 0.0, 0.0),
    ]);
    assert!(update_components(&world, node, parent, &mut comps));
    assert_eq!(comps.len(), 1);
    assert_eq!(comps.point(ids::POSITION), Some(DVec2::new(4.0, 2.0)));
}
