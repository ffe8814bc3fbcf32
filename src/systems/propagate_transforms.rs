//! Transform propagation for the render node hierarchy.
//!
//! Computes [`GlobalTransform2D`] for every render node from its
//! [`LocalTransform`] and its ancestors ([`ChildOf`] / [`Children`]).
//!
//! Two entry points:
//! - [`propagate_transforms`] is an ECS system that refreshes every tree from
//!   its roots; run it through a `Schedule`.
//! - [`propagate_from`] refreshes one subtree immediately and is what the
//!   editor calls after each mutation.
//!
//! The remaining functions are world-aware helpers shared by the sync,
//! selection and handle code. Matrix reads ([`global_matrix`]) compose the
//! ancestor chain on the fly, so they are exact even before propagation ran.

use bevy_ecs::hierarchy::{ChildOf, Children};
use bevy_ecs::prelude::*;
use glam::DAffine2;
use log::warn;
use smallvec::SmallVec;

use crate::components::globaltransform2d::GlobalTransform2D;
use crate::components::localtransform::LocalTransform;
use crate::components::nodecontent::NodeContent;
use crate::math::{Bounds, Rect, reparent_matrix};

/// Propagate transforms from root nodes down through the hierarchy.
///
/// For each root (no [`ChildOf`]):
/// 1. Its [`GlobalTransform2D`] is its local matrix.
/// 2. Children are traversed recursively, composing `parent_world * local`.
///
/// Nodes missing a `GlobalTransform2D` get one inserted via deferred
/// [`Commands`].
pub fn propagate_transforms(
    roots: Query<(Entity, &LocalTransform, Option<&Children>), Without<ChildOf>>,
    children_query: Query<(&LocalTransform, Option<&Children>), With<ChildOf>>,
    mut globals: Query<&mut GlobalTransform2D>,
    mut commands: Commands,
) {
    for (root_entity, local, children) in roots.iter() {
        let root_gt = GlobalTransform2D(local.matrix());

        if let Ok(mut gt) = globals.get_mut(root_entity) {
            *gt = root_gt;
        } else {
            commands.entity(root_entity).insert(root_gt);
        }

        if let Some(children) = children {
            propagate_children(
                &root_gt,
                children,
                &children_query,
                &mut globals,
                &mut commands,
            );
        }
    }
}

fn propagate_children(
    parent_gt: &GlobalTransform2D,
    children: &Children,
    children_query: &Query<(&LocalTransform, Option<&Children>), With<ChildOf>>,
    globals: &mut Query<&mut GlobalTransform2D>,
    commands: &mut Commands,
) {
    for child_entity in children.iter() {
        let Ok((local, maybe_grandchildren)) = children_query.get(child_entity) else {
            continue;
        };

        let child_gt = GlobalTransform2D(parent_gt.0 * local.matrix());

        if let Ok(mut gt) = globals.get_mut(child_entity) {
            *gt = child_gt;
        } else {
            commands.entity(child_entity).insert(child_gt);
        }

        if let Some(grandchildren) = maybe_grandchildren {
            propagate_children(&child_gt, grandchildren, children_query, globals, commands);
        }
    }
}

/// Recomputes the stored world transform of `node` and its whole subtree.
pub fn propagate_from(world: &mut World, node: Entity) {
    let parent_world = parent_of(world, node)
        .map(|p| global_matrix(world, p))
        .unwrap_or(DAffine2::IDENTITY);
    propagate_subtree(world, node, parent_world);
}

fn propagate_subtree(world: &mut World, node: Entity, parent_world: DAffine2) {
    let local = world
        .get::<LocalTransform>(node)
        .map(LocalTransform::matrix)
        .unwrap_or(DAffine2::IDENTITY);
    let node_world = parent_world * local;
    if let Ok(mut entity) = world.get_entity_mut(node) {
        entity.insert(GlobalTransform2D(node_world));
    }
    for child in children_of(world, node) {
        propagate_subtree(world, child, node_world);
    }
}

pub fn parent_of(world: &World, node: Entity) -> Option<Entity> {
    world.get::<ChildOf>(node).map(ChildOf::parent)
}

/// Direct children of `node` in sibling order.
pub fn children_of(world: &World, node: Entity) -> Vec<Entity> {
    world
        .get::<Children>(node)
        .map(|children| children.to_vec())
        .unwrap_or_default()
}

/// `node` and its ancestors, nearest first.
pub fn ancestors(world: &World, node: Entity) -> SmallVec<[Entity; 8]> {
    let mut chain = SmallVec::new();
    let mut current = Some(node);
    while let Some(entity) = current {
        chain.push(entity);
        current = parent_of(world, entity);
    }
    chain
}

pub fn local_matrix(world: &World, node: Entity) -> DAffine2 {
    world
        .get::<LocalTransform>(node)
        .map(LocalTransform::matrix)
        .unwrap_or(DAffine2::IDENTITY)
}

/// World matrix of `node`, composed from the ancestor chain.
pub fn global_matrix(world: &World, node: Entity) -> DAffine2 {
    ancestors(world, node)
        .iter()
        .rev()
        .fold(DAffine2::IDENTITY, |acc, &entity| acc * local_matrix(world, entity))
}

/// Content of `node` plus the local bounds of every child mapped through
/// the child's local matrix, in `node`'s local space.
pub fn local_bounds(world: &World, node: Entity) -> Rect {
    accumulate_bounds(world, node).rect()
}

fn accumulate_bounds(world: &World, node: Entity) -> Bounds {
    let mut bounds = Bounds::default();
    if let Some(NodeContent(Some(content))) = world.get::<NodeContent>(node) {
        bounds.add_rect(content, &DAffine2::IDENTITY);
    }
    for child in children_of(world, node) {
        let child_bounds = accumulate_bounds(world, child);
        if child_bounds.is_empty() {
            continue;
        }
        bounds.add_rect(&child_bounds.rect(), &local_matrix(world, child));
    }
    bounds
}

/// Rewrites `node`'s local transform so that its world matrix is unchanged
/// once it lives under `new_parent`. Does not relink the node.
///
/// Returns `false`, leaving the node untouched, when `new_parent`'s world
/// matrix cannot be inverted.
pub fn transform_to(world: &mut World, node: Entity, new_parent: Entity) -> bool {
    let node_world = global_matrix(world, node);
    let parent_world = global_matrix(world, new_parent);
    let Some(local) = reparent_matrix(&node_world, &parent_world) else {
        warn!(
            "Cannot reparent {:?} under {:?}: degenerate parent transform",
            node, new_parent
        );
        return false;
    };
    if let Some(mut transform) = world.get_mut::<LocalTransform>(node) {
        transform.0.set_from_matrix(&local);
    }
    true
}

/// Links `node` under `parent` at sibling `index` (clamped; `None` appends)
/// and refreshes the node's world transform.
pub fn link(world: &mut World, node: Entity, parent: Entity, index: Option<usize>) {
    if parent_of(world, node).is_some() {
        world.entity_mut(node).remove::<ChildOf>();
    }
    let len = children_of(world, parent).len();
    let index = index.unwrap_or(len).min(len);
    world.entity_mut(parent).insert_children(index, &[node]);
    world.flush();
    propagate_from(world, node);
}
