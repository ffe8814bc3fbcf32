//! Selection container: aggregation, composite components and the handling
//! lock.
//!
//! Selected render nodes are temporarily reparented under one synthetic
//! container node so that a single transform drives all of them:
//!
//! - one selected node is *absorbed*: the container takes its transform and
//!   the node's local transform becomes identity;
//! - several selected nodes keep their world appearance under a container
//!   whose pivot is the center of their union bounds.
//!
//! Nodes always go back to their structural parent (re-entrantly) before the
//! selection changes, so the render tree mirrors the store between calls.

use bevy_ecs::prelude::*;
use glam::DAffine2;
use log::{debug, warn};

use super::propagate_transforms::{
    children_of, global_matrix, link, local_bounds, parent_of, propagate_from, transform_to,
};
use super::render_tree::{insertion_index, node_of, structural_parent_node};
use super::sync::update_components;
use crate::components::globaltransform2d::GlobalTransform2D;
use crate::components::localtransform::LocalTransform;
use crate::components::nodecontent::HitArea;
use crate::components::selectioncontainer::SelectionContainer;
use crate::components::zindex::ZIndex;
use crate::error::SceneError;
use crate::events::bus::{CommandBus, EditorEvent};
use crate::events::scenecmd::SceneCmd;
use crate::handles::HandleRef;
use crate::math::{Bounds, Transform2D, reparent_matrix};
use crate::resources::handlinglock::HandlingLock;
use crate::resources::nodeindex::NodeIndex;
use crate::resources::pendingrender::PendingRender;
use crate::resources::selection::Selection;
use crate::scene::{EntityStore, SceneComponentCollection};

fn local_of(world: &World, node: Entity) -> Transform2D {
    world
        .get::<LocalTransform>(node)
        .map(|l| l.0)
        .unwrap_or_default()
}

fn set_local(world: &mut World, node: Entity, transform: Transform2D) {
    if let Some(mut local) = world.get_mut::<LocalTransform>(node) {
        local.0 = transform;
    }
    propagate_from(world, node);
}

/// Selected ids ordered as in the store, parents before children.
fn in_store_order(store: &dyn EntityStore, ids: &[String]) -> Vec<String> {
    store
        .entities()
        .into_iter()
        .filter(|e| ids.contains(&e.id))
        .map(|e| e.id.clone())
        .collect()
}

/// Moves every selected node back under its structural parent, keeping its
/// world appearance. The container stays alive and empty.
pub fn restore_all(world: &mut World, store: &dyn EntityStore) {
    let (container, absorbed, ids) = {
        let selection = world.resource::<Selection>();
        let Some(container) = selection.container else {
            return;
        };
        (container, selection.absorbed, selection.entities.clone())
    };

    for id in in_store_order(store, &ids) {
        let (Some(node), Some(parent_node)) =
            (node_of(world, &id), structural_parent_node(world, store, &id))
        else {
            continue;
        };

        if absorbed {
            let container_t = local_of(world, container);
            if parent_of(world, container) == Some(parent_node) {
                set_local(world, node, container_t);
            } else {
                let node_world = global_matrix(world, node);
                let parent_world = global_matrix(world, parent_node);
                let mut restored = container_t;
                match reparent_matrix(&node_world, &parent_world) {
                    Some(matrix) => restored.set_from_matrix(&matrix),
                    None => warn!("restore: degenerate parent for '{}'", id),
                }
                set_local(world, node, restored);
            }
        } else {
            transform_to(world, node, parent_node);
        }

        let index = insertion_index(world, store, &id, parent_node);
        link(world, node, parent_node, Some(index));
    }

    world.resource_mut::<Selection>().absorbed = false;
    world.resource_mut::<PendingRender>().request();
}

fn ensure_container(world: &mut World) -> Entity {
    if let Some(container) = world.resource::<Selection>().container {
        return container;
    }
    let root = world.resource::<NodeIndex>().root;
    let container = world
        .spawn((
            SelectionContainer,
            LocalTransform::default(),
            GlobalTransform2D::default(),
            ZIndex(0),
            HitArea::default(),
        ))
        .id();
    link(world, container, root, None);
    world.resource_mut::<Selection>().container = Some(container);
    debug!("selection: spawned container {:?}", container);
    container
}

fn despawn_container(world: &mut World) {
    let container = {
        let mut selection = world.resource_mut::<Selection>();
        selection.absorbed = false;
        selection.components = SceneComponentCollection::new();
        selection.container.take()
    };
    if let Some(container) = container {
        world.despawn(container);
        debug!("selection: despawned container {:?}", container);
    }
}

/// Draws the container above every other scene root.
fn raise_container(world: &mut World, container: Entity) {
    let root = world.resource::<NodeIndex>().root;
    let top = children_of(world, root)
        .into_iter()
        .filter(|&n| n != container)
        .filter_map(|n| world.get::<ZIndex>(n).map(|z| z.0))
        .max()
        .unwrap_or(0);
    world.entity_mut(container).insert(ZIndex(top + 1));
}

/// Builds the container over the currently selected ids. Expects every
/// selected node to sit under its structural parent.
///
/// With `reset_transform` a multi-selection frame is axis-aligned; without
/// it the container keeps its current rotation.
pub fn aggregate(world: &mut World, store: &dyn EntityStore, reset_transform: bool) {
    let ids = world.resource::<Selection>().entities.clone();
    if ids.is_empty() {
        despawn_container(world);
        return;
    }
    let container = ensure_container(world);
    raise_container(world, container);

    let nodes: Vec<(String, Entity)> = ids
        .iter()
        .filter_map(|id| node_of(world, id).map(|n| (id.clone(), n)))
        .collect();

    if let [(id, node)] = nodes.as_slice() {
        let node = *node;
        let node_t = local_of(world, node);
        let container_parent = parent_of(world, container);
        let mut container_t = node_t;
        if container_parent != structural_parent_node(world, store, id) {
            let node_world = global_matrix(world, node);
            let parent_world = container_parent
                .map(|p| global_matrix(world, p))
                .unwrap_or(DAffine2::IDENTITY);
            match reparent_matrix(&node_world, &parent_world) {
                Some(matrix) => container_t.set_from_matrix(&matrix),
                None => warn!("selection: degenerate container parent for '{}'", id),
            }
        }
        set_local(world, container, container_t);
        link(world, node, container, None);
        set_local(world, node, Transform2D::IDENTITY);
        world.resource_mut::<Selection>().absorbed = true;
    } else {
        let previous = local_of(world, container);
        let frame = if reset_transform {
            Transform2D::IDENTITY
        } else {
            Transform2D::IDENTITY.with_rotation(previous.rotation)
        };
        let parent_world = parent_of(world, container)
            .map(|p| global_matrix(world, p))
            .unwrap_or(DAffine2::IDENTITY);
        let frame_world = parent_world * frame.matrix();

        let mut bounds = Bounds::default();
        for (id, node) in &nodes {
            let Some(to_frame) = reparent_matrix(&global_matrix(world, *node), &frame_world)
            else {
                warn!("selection: cannot measure '{}'", id);
                continue;
            };
            bounds.add_rect(&local_bounds(world, *node), &to_frame);
        }
        let center = bounds.rect().center();
        let mut container_t = frame;
        container_t.pivot = center;
        container_t.position = frame.matrix().transform_point2(center);
        set_local(world, container, container_t);

        for (_, node) in &nodes {
            transform_to(world, *node, container);
            link(world, *node, container, None);
        }
        world.resource_mut::<Selection>().absorbed = false;
    }

    let hit_area = local_bounds(world, container);
    world.entity_mut(container).insert(HitArea(hit_area));
    refresh_composite(world, store);
    world.resource_mut::<PendingRender>().request();
}

/// Intersection of the selected entities' components.
///
/// Only ids present with the same type on every entity are kept. Differing
/// values are marked mixed, except transformation components, which carry
/// the container's own transform.
pub fn composite_components(world: &World, store: &dyn EntityStore) -> SceneComponentCollection {
    let selection = world.resource::<Selection>();
    let entities: Vec<_> = selection
        .entities
        .iter()
        .filter_map(|id| store.entity(id))
        .collect();
    let Some((first, rest)) = entities.split_first() else {
        return SceneComponentCollection::new();
    };

    let mut composite = SceneComponentCollection::new();
    for component in first.components.iter() {
        let mut shared = true;
        let mut mixed = false;
        for other in rest {
            match other.components.by_id(&component.id) {
                Some(o) if o.value.same_type(&component.value) => {
                    mixed |= o.value != component.value;
                }
                _ => {
                    shared = false;
                    break;
                }
            }
        }
        if !shared {
            continue;
        }
        let mut merged = component.clone();
        merged.mixed = mixed && !merged.is_transformation();
        composite.add([merged]);
    }

    if let Some(container) = selection.container {
        if let Some(parent) = parent_of(world, container) {
            update_components(world, container, parent, &mut composite);
        }
    }
    composite
}

pub fn refresh_composite(world: &mut World, store: &dyn EntityStore) {
    let composite = composite_components(world, store);
    world.resource_mut::<Selection>().components = composite;
}

fn publish(world: &mut World, event: EditorEvent) {
    if let Some(mut bus) = world.get_resource_mut::<CommandBus>() {
        bus.publish(&event);
    }
}

/// Adds `ids` to the selection and rebuilds the container.
///
/// Already selected and unknown ids are skipped with a warning. Returns the
/// ids that were added.
pub fn select(
    world: &mut World,
    store: &mut dyn EntityStore,
    ids: &[String],
    silent: bool,
    reset_transform: bool,
) -> Vec<String> {
    force_end_handling(world, store);
    restore_all(world, store);

    let mut added = Vec::new();
    for id in ids {
        if world.resource::<Selection>().contains(id) || added.contains(id) {
            warn!("selection: '{}' is already selected", id);
            continue;
        }
        if store.entity(id).is_none() || node_of(world, id).is_none() {
            warn!("selection: unknown entity '{}'", id);
            continue;
        }
        added.push(id.clone());
    }
    world
        .resource_mut::<Selection>()
        .entities
        .extend(added.iter().cloned());

    aggregate(world, store, reset_transform);
    if !silent {
        let ids = world.resource::<Selection>().entities.clone();
        publish(world, EditorEvent::Selected { ids });
    }
    added
}

/// Removes `ids` from the selection, restoring their nodes to their
/// structural parents. Returns the ids that were removed.
pub fn unselect(
    world: &mut World,
    store: &mut dyn EntityStore,
    ids: &[String],
    silent: bool,
) -> Vec<String> {
    force_end_handling(world, store);
    restore_all(world, store);

    let removed: Vec<String> = {
        let mut selection = world.resource_mut::<Selection>();
        let removed = selection
            .entities
            .iter()
            .filter(|id| ids.contains(id))
            .cloned()
            .collect();
        selection.entities.retain(|id| !ids.contains(id));
        removed
    };

    aggregate(world, store, true);
    if !silent && !removed.is_empty() {
        publish(
            world,
            EditorEvent::Unselected {
                ids: removed.clone(),
            },
        );
    }
    removed
}

/// Takes the handling lock for `handle` and snapshots the selected
/// entities' components. Re-entering with the current holder is a no-op.
pub fn begin_handling(
    world: &mut World,
    store: &dyn EntityStore,
    handle: HandleRef,
) -> Result<(), SceneError> {
    let lock = world.resource::<HandlingLock>();
    if lock.is_held_by(handle) {
        return Ok(());
    }
    if let Some(holder) = lock.holder {
        warn!("handling: {:?} refused, held by {:?}", handle, holder);
        return Err(SceneError::HandlingLocked {
            holder,
            requested: handle,
        });
    }
    let snapshot = world
        .resource::<Selection>()
        .entities
        .iter()
        .filter_map(|id| store.entity(id).map(|e| (id.clone(), e.components.clone())))
        .collect();
    let mut lock = world.resource_mut::<HandlingLock>();
    lock.holder = Some(handle);
    lock.snapshot = snapshot;
    debug!("handling: begin {:?}", handle);
    Ok(())
}

/// Releases the lock held by `handle` and commits the interaction.
///
/// Each entity's components are restored to the snapshot and one
/// `UpdateEntity` carrying only the changed components is queued per entity
/// that changed.
pub fn end_handling(
    world: &mut World,
    store: &mut dyn EntityStore,
    handle: HandleRef,
) -> Result<(), SceneError> {
    let snapshot = {
        let mut lock = world.resource_mut::<HandlingLock>();
        if !lock.is_held_by(handle) {
            let holder = lock.holder;
            warn!("handling: {:?} cannot end, held by {:?}", handle, holder);
            return Err(SceneError::NotHandlingHolder {
                caller: handle,
                holder,
            });
        }
        lock.holder = None;
        std::mem::take(&mut lock.snapshot)
    };

    let mut commits = Vec::new();
    for (id, before) in snapshot {
        let (Some(node), Some(parent_node)) =
            (node_of(world, &id), structural_parent_node(world, store, &id))
        else {
            continue;
        };
        let mut after = before.clone();
        update_components(world, node, parent_node, &mut after);
        if let Some(components) = store.components_mut(&id) {
            *components = before.clone();
        }
        let changed = before.diff(&after);
        if !changed.is_empty() {
            commits.push(SceneCmd::UpdateEntity {
                id,
                components: changed,
            });
        }
    }

    debug!("handling: end {:?}, {} entities changed", handle, commits.len());
    let bus = world.resource::<CommandBus>();
    for cmd in commits {
        bus.dispatch(cmd);
    }
    Ok(())
}

/// Ends an active interaction on behalf of its holder.
pub fn force_end_handling(world: &mut World, store: &mut dyn EntityStore) {
    let Some(holder) = world.resource::<HandlingLock>().holder else {
        return;
    };
    warn!("handling: force-ending {:?}", holder);
    if let Err(e) = end_handling(world, store, holder) {
        warn!("handling: force-end failed: {}", e);
    }
}

/// Writes the live transform of every selected node into the store and
/// refreshes the composite, so panels can follow a drag.
pub fn sync_live(world: &mut World, store: &mut dyn EntityStore) {
    let ids = world.resource::<Selection>().entities.clone();
    for id in ids {
        let (Some(node), Some(parent_node)) =
            (node_of(world, &id), structural_parent_node(world, store, &id))
        else {
            continue;
        };
        if let Some(components) = store.components_mut(&id) {
            update_components(world, node, parent_node, components);
        }
    }
    refresh_composite(world, store);
    world.resource_mut::<PendingRender>().request();
}
