//! Two-way sync between transformation components and render nodes.
//!
//! Components are the source of truth. [`apply_components`] pushes them into
//! a node's [`LocalTransform`]; [`update_components`] reads the node's
//! logical transform back into the existing components. Both are idempotent.
//!
//! Rotation and skew are stored in degrees in components and in radians in
//! [`Transform2D`].

use bevy_ecs::prelude::*;
use glam::DVec2;
use log::warn;

use super::propagate_transforms::{global_matrix, local_bounds, parent_of, propagate_from};
use crate::components::localtransform::LocalTransform;
use crate::components::selectioncontainer::SelectionContainer;
use crate::math::{Transform2D, reparent_matrix};
use crate::resources::selection::Selection;
use crate::scene::{ComponentValue, SceneComponentCollection, ids};

/// Written values are rounded to this many units so that float noise from a
/// decompose/recompose cycle does not register as a change.
const WRITE_PRECISION: f64 = 1e9;

fn snap(value: f64) -> f64 {
    let snapped = (value * WRITE_PRECISION).round() / WRITE_PRECISION;
    if snapped == 0.0 { 0.0 } else { snapped }
}

/// Wraps degrees into `(-180, 180]`.
fn wrap_degrees(degrees: f64) -> f64 {
    let wrapped = (degrees + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped <= -180.0 { 180.0 } else { wrapped }
}

fn usable_point(components: &SceneComponentCollection, id: &str) -> Option<DVec2> {
    let component = components.by_id(id)?;
    if component.mixed {
        return None;
    }
    components.point(id)
}

/// `base` with every present, non-mixed transformation component applied.
pub fn read_transform(components: &SceneComponentCollection, base: Transform2D) -> Transform2D {
    let mut t = base;
    if let Some(position) = usable_point(components, ids::POSITION) {
        t.position = position;
    }
    if let Some(scale) = usable_point(components, ids::SCALE) {
        t.scale = scale;
    }
    if let Some(rotation) = components
        .by_id(ids::ROTATION)
        .filter(|c| !c.mixed)
        .and_then(|_| components.range_value(ids::ROTATION))
    {
        t.rotation = rotation.to_radians();
    }
    if let Some(skew) = usable_point(components, ids::SKEW) {
        t.skew = DVec2::new(skew.x.to_radians(), skew.y.to_radians());
    }
    if let Some(pivot) = usable_point(components, ids::PIVOT) {
        t.pivot = pivot;
    }
    t
}

fn write_point(components: &mut SceneComponentCollection, id: &str, value: DVec2) -> bool {
    components.set_value(
        id,
        ComponentValue::Point {
            x: snap(value.x),
            y: snap(value.y),
        },
    )
}

/// Writes `t` into the transformation components that already exist.
/// Returns whether anything changed.
pub fn write_transform(components: &mut SceneComponentCollection, t: &Transform2D) -> bool {
    let mut changed = false;
    changed |= write_point(components, ids::POSITION, t.position);
    changed |= write_point(components, ids::SCALE, t.scale);
    if let Some(ComponentValue::Range { min, max, step, .. }) =
        components.by_id(ids::ROTATION).map(|c| c.value.clone())
    {
        changed |= components.set_value(
            ids::ROTATION,
            ComponentValue::Range {
                value: snap(wrap_degrees(t.rotation.to_degrees())),
                min,
                max,
                step,
            },
        );
    }
    changed |= write_point(
        components,
        ids::SKEW,
        DVec2::new(t.skew.x.to_degrees(), t.skew.y.to_degrees()),
    );
    changed |= write_point(components, ids::PIVOT, t.pivot);
    changed
}

/// Applies `components` to `node`'s local transform and refreshes the
/// subtree's world transforms. Absent or mixed components leave their field
/// untouched.
pub fn apply_components(world: &mut World, node: Entity, components: &SceneComponentCollection) {
    let Some(current) = world.get::<LocalTransform>(node).map(|l| l.0) else {
        warn!("apply_components: {:?} has no local transform", node);
        return;
    };
    let next = read_transform(components, current);
    if next != current {
        if let Some(mut local) = world.get_mut::<LocalTransform>(node) {
            local.0 = next;
        }
    }
    propagate_from(world, node);
}

/// Transform of `node` relative to `structural_parent`, whatever its current
/// render parent is.
///
/// While the node is absorbed by the selection container the container
/// carries its transform; that transform is used as is when the container
/// shares the node's structural parent.
pub fn logical_transform(world: &World, node: Entity, structural_parent: Entity) -> Transform2D {
    let local = world
        .get::<LocalTransform>(node)
        .map(|l| l.0)
        .unwrap_or_default();
    let current_parent = parent_of(world, node);
    if current_parent == Some(structural_parent) {
        return local;
    }

    let mut base = local;
    if let Some(container) =
        current_parent.filter(|p| world.get::<SelectionContainer>(*p).is_some())
    {
        let absorbed = world
            .get_resource::<Selection>()
            .is_some_and(|s| s.absorbed);
        if absorbed {
            let container_t = world
                .get::<LocalTransform>(container)
                .map(|l| l.0)
                .unwrap_or_default();
            if parent_of(world, container) == Some(structural_parent) {
                return container_t;
            }
            base = container_t;
        }
    }

    let node_world = global_matrix(world, node);
    let parent_world = global_matrix(world, structural_parent);
    match reparent_matrix(&node_world, &parent_world) {
        Some(matrix) => base.set_from_matrix(&matrix),
        None => warn!(
            "logical_transform: degenerate parent {:?}, keeping local transform",
            structural_parent
        ),
    }
    base
}

/// Writes `node`'s size into an existing `transformation.size` component:
/// `width`/`height` are signed world-unit sizes, `localWidth`/`localHeight`
/// the local bounds.
pub fn write_size(
    world: &World,
    node: Entity,
    logical: &Transform2D,
    components: &mut SceneComponentCollection,
) -> bool {
    if components.size(ids::SIZE).is_none() {
        return false;
    }
    let bounds = local_bounds(world, node);
    let axes = global_matrix(world, node).matrix2;
    let width = logical.scale.x.signum() * axes.x_axis.length() * bounds.width;
    let height = logical.scale.y.signum() * axes.y_axis.length() * bounds.height;
    components.set_value(
        ids::SIZE,
        ComponentValue::Size {
            width: snap(width),
            height: snap(height),
            local_width: snap(bounds.width),
            local_height: snap(bounds.height),
        },
    )
}

/// Writes `node`'s logical transform and size into the existing components.
/// Creates no components. Returns whether anything changed.
pub fn update_components(
    world: &World,
    node: Entity,
    structural_parent: Entity,
    components: &mut SceneComponentCollection,
) -> bool {
    let logical = logical_transform(world, node, structural_parent);
    let mut changed = write_transform(components, &logical);
    changed |= write_size(world, node, &logical, components);
    changed
}
