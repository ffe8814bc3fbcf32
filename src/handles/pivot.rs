//! Pivot handle.
//!
//! Moves the container's pivot in its local space. The position shifts by
//! the same delta mapped through the linear part, so the content stays put
//! and only the center of rotation and scale moves.

use bevy_ecs::prelude::*;
use glam::{DAffine2, DVec2};

use super::{
    HandleRef, HandleState, InteractionHandle, container_transform, container_with,
    set_container_transform,
};
use crate::error::SceneError;
use crate::math::Transform2D;
use crate::resources::editorconfig::EditorConfig;
use crate::scene::{EntityStore, ids};
use crate::systems::propagate_transforms::global_matrix;
use crate::systems::selection::{begin_handling, end_handling};

#[derive(Debug, Clone, Copy)]
struct PivotPress {
    container: Entity,
    start: Transform2D,
    pointer_local: DVec2,
    inverse_world: DAffine2,
}

/// `start` with its pivot moved by `delta` (local units) and the position
/// compensated.
fn moved_pivot(start: &Transform2D, delta: DVec2) -> Transform2D {
    let mut t = *start;
    t.pivot = start.pivot + delta;
    t.position = start.position + start.linear() * delta;
    t
}

#[derive(Debug, Clone, Default)]
pub struct PivotHandle {
    state: HandleState,
    press: Option<PivotPress>,
}

impl PivotHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// World position of the selection's pivot.
    pub fn world_position(&self, world: &World) -> Option<DVec2> {
        let container = container_with(world, ids::PIVOT)?;
        let t = container_transform(world, container);
        Some(global_matrix(world, container).transform_point2(t.pivot))
    }

    /// Moves the pivot by `delta` local units in one committed interaction.
    pub fn nudge(
        &mut self,
        world: &mut World,
        store: &mut dyn EntityStore,
        delta: DVec2,
    ) -> Result<bool, SceneError> {
        let Some(container) = container_with(world, ids::PIVOT) else {
            return Ok(false);
        };
        begin_handling(world, store, HandleRef::Pivot)?;
        let moved = moved_pivot(&container_transform(world, container), delta);
        set_container_transform(world, store, container, moved);
        end_handling(world, store, HandleRef::Pivot)?;
        Ok(true)
    }
}

impl InteractionHandle for PivotHandle {
    fn handle_ref(&self) -> HandleRef {
        HandleRef::Pivot
    }

    fn state(&self) -> HandleState {
        self.state
    }

    fn hit_test(&self, world: &World, config: &EditorConfig, point: DVec2) -> bool {
        self.world_position(world)
            .is_some_and(|pivot| pivot.distance(point) <= config.pivot_hit_radius)
    }

    fn press(
        &mut self,
        world: &mut World,
        store: &mut dyn EntityStore,
        point: DVec2,
    ) -> Result<bool, SceneError> {
        let Some(container) = container_with(world, ids::PIVOT) else {
            return Ok(false);
        };
        begin_handling(world, store, HandleRef::Pivot)?;
        let inverse_world = global_matrix(world, container).inverse();
        self.press = Some(PivotPress {
            container,
            start: container_transform(world, container),
            pointer_local: inverse_world.transform_point2(point),
            inverse_world,
        });
        self.state = HandleState::Pressed;
        Ok(true)
    }

    fn drag(
        &mut self,
        world: &mut World,
        store: &mut dyn EntityStore,
        point: DVec2,
    ) -> Result<(), SceneError> {
        let Some(press) = self.press else {
            return Ok(());
        };
        let delta = press.inverse_world.transform_point2(point) - press.pointer_local;
        set_container_transform(world, store, press.container, moved_pivot(&press.start, delta));
        self.state = HandleState::Dragging;
        Ok(())
    }

    fn release(
        &mut self,
        world: &mut World,
        store: &mut dyn EntityStore,
    ) -> Result<(), SceneError> {
        if self.press.take().is_none() {
            return Ok(());
        }
        self.state = HandleState::Idle;
        end_handling(world, store, HandleRef::Pivot)
    }

    fn cancel(&mut self) {
        self.press = None;
        self.state = HandleState::Idle;
    }
}
