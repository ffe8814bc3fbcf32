//! Render node lifecycle: mirroring the entity tree.
//!
//! Each live entity has exactly one render node, created under its parent's
//! node (or the scene root) at its store sibling position. Render nodes are
//! derived state: they are rebuilt from components and never persisted.

use bevy_ecs::prelude::*;
use log::{debug, warn};

use super::propagate_transforms::{children_of, link, parent_of, transform_to};
use super::sync::{apply_components, logical_transform, update_components, write_size};
use crate::components::globaltransform2d::GlobalTransform2D;
use crate::components::localtransform::LocalTransform;
use crate::components::nodecontent::NodeContent;
use crate::components::scenenode::{SceneNode, SceneRoot};
use crate::components::zindex::ZIndex;
use crate::error::SceneError;
use crate::events::bus::CommandBus;
use crate::events::scenecmd::SceneCmd;
use crate::resources::nodeindex::NodeIndex;
use crate::resources::pendingrender::PendingRender;
use crate::resources::renderer::Renderer;
use crate::scene::{EntityStore, SceneComponentCollection, ids};

/// Spawns the scene root node.
pub fn spawn_root(world: &mut World) -> Entity {
    world
        .spawn((
            SceneRoot,
            LocalTransform::default(),
            GlobalTransform2D::default(),
            ZIndex(0),
        ))
        .id()
}

/// Render node of `id`.
pub fn node_of(world: &World, id: &str) -> Option<Entity> {
    world.get_resource::<NodeIndex>()?.get(id)
}

/// Render node that `id` hangs from when it is not selected.
pub fn structural_parent_node(world: &World, store: &dyn EntityStore, id: &str) -> Option<Entity> {
    let index = world.get_resource::<NodeIndex>()?;
    let entity = store.entity(id)?;
    Some(index.parent_node(entity.parent.as_deref()))
}

/// Render sibling index for `id` under `parent_node`: the number of its
/// store siblings before it whose nodes currently live under `parent_node`.
pub fn insertion_index(
    world: &World,
    store: &dyn EntityStore,
    id: &str,
    parent_node: Entity,
) -> usize {
    let Some(entity) = store.entity(id) else {
        return 0;
    };
    let Some(index) = world.get_resource::<NodeIndex>() else {
        return 0;
    };
    store
        .children(entity.parent.as_deref(), false)
        .into_iter()
        .take_while(|sibling| sibling.id != id)
        .filter_map(|sibling| index.get(&sibling.id))
        .filter(|&node| parent_of(world, node) == Some(parent_node))
        .count()
}

/// Creates the render node for `id`, links it at its sibling position and
/// applies its components.
pub fn create_node(
    world: &mut World,
    store: &dyn EntityStore,
    renderer: &mut dyn Renderer,
    id: &str,
) -> Result<Entity, SceneError> {
    let entity = store
        .entity(id)
        .ok_or_else(|| SceneError::UnknownEntity(id.to_string()))?;
    if node_of(world, id).is_some() {
        return Err(SceneError::DuplicateEntity(id.to_string()));
    }
    let parent_node = world
        .resource::<NodeIndex>()
        .parent_node(entity.parent.as_deref());

    let node = world
        .spawn((
            SceneNode {
                id: entity.id.clone(),
                kind: entity.kind,
            },
            LocalTransform::default(),
            GlobalTransform2D::default(),
            ZIndex(0),
            NodeContent(None),
        ))
        .id();
    let content = renderer.create_node(entity, node);
    world.entity_mut(node).insert(NodeContent(content));
    world.resource_mut::<NodeIndex>().insert(id, node);

    let index = insertion_index(world, store, id, parent_node);
    link(world, node, parent_node, Some(index));
    apply_components(world, node, &entity.components);
    world.resource_mut::<PendingRender>().request();
    debug!("render tree: created {:?} for '{}'", node, id);
    Ok(node)
}

/// Re-measures the content of `id` from the renderer.
pub fn refresh_content(
    world: &mut World,
    store: &dyn EntityStore,
    renderer: &dyn Renderer,
    id: &str,
) {
    let (Some(entity), Some(node)) = (store.entity(id), node_of(world, id)) else {
        return;
    };
    if let Some(content) = renderer.content_bounds(entity) {
        world.entity_mut(node).insert(NodeContent(Some(content)));
    }
}

/// Destroys the render node of `id` and its descendants, notifying the
/// renderer for each. Descendants are reported before their parents.
pub fn remove_nodes(world: &mut World, renderer: &mut dyn Renderer, id: &str) {
    let Some(node) = node_of(world, id) else {
        warn!("render tree: no node for '{}'", id);
        return;
    };
    let mut doomed = Vec::new();
    collect_post_order(world, node, &mut doomed);
    for entity in doomed {
        let Some(scene_id) = world.get::<SceneNode>(entity).map(|n| n.id.clone()) else {
            continue;
        };
        renderer.remove_node(&scene_id, entity);
        world.resource_mut::<NodeIndex>().remove(&scene_id);
    }
    world.despawn(node);
    world.resource_mut::<PendingRender>().request();
    debug!("render tree: removed '{}'", id);
}

fn collect_post_order(world: &World, node: Entity, out: &mut Vec<Entity>) {
    for child in children_of(world, node) {
        collect_post_order(world, child, out);
    }
    out.push(node);
}

/// Moves `id`'s node under its (already updated) store parent without
/// changing its world appearance, then writes the compensated transform
/// back into the store.
pub fn reparent_node(
    world: &mut World,
    store: &mut dyn EntityStore,
    id: &str,
) -> Result<(), SceneError> {
    let node = node_of(world, id).ok_or_else(|| SceneError::UnknownEntity(id.to_string()))?;
    let parent_node = structural_parent_node(world, store, id)
        .ok_or_else(|| SceneError::UnknownEntity(id.to_string()))?;

    transform_to(world, node, parent_node);
    let index = insertion_index(world, store, id, parent_node);
    link(world, node, parent_node, Some(index));

    if let Some(components) = store.components_mut(id) {
        let changed = update_components(world, node, parent_node, components);
        debug!("render tree: reparented '{}' (components changed: {})", id, changed);
    }
    world.resource_mut::<PendingRender>().request();
    Ok(())
}

/// Walks from `start` up to a root and queues an `UpdateEntity` for every
/// ancestor whose size component no longer matches its content. Ancestors
/// without a size component are passed over.
pub fn refresh_ancestor_sizes(world: &World, store: &dyn EntityStore, start: Option<&str>) {
    let Some(bus) = world.get_resource::<CommandBus>() else {
        return;
    };
    let max_depth = store.entities().len();
    let mut current = start.map(str::to_string);
    let mut steps = 0;
    while let Some(id) = current {
        steps += 1;
        let Some(entity) = store.entity(&id) else {
            break;
        };
        if steps > max_depth {
            break;
        }
        current = entity.parent.clone();

        let Some(size) = entity.components.by_id(ids::SIZE) else {
            continue;
        };
        let (Some(node), Some(parent_node)) = (
            node_of(world, &id),
            structural_parent_node(world, store, &id),
        ) else {
            continue;
        };
        let mut measured = SceneComponentCollection::from(vec![size.clone()]);
        let logical = logical_transform(world, node, parent_node);
        if write_size(world, node, &logical, &mut measured) {
            debug!("render tree: size of '{}' changed", id);
            bus.dispatch(SceneCmd::UpdateEntity {
                id,
                components: measured,
            });
        }
    }
}
