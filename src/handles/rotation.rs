//! Rotation handle.
//!
//! Grabbed anywhere in a band around the selection: inside the hit area
//! scaled by `rotation_band`, outside the hit area itself. The band follows
//! the container's transform, so it scales with the content.

use bevy_ecs::prelude::*;
use glam::DVec2;
use log::debug;
use smallvec::SmallVec;

use super::{
    HandleRef, HandleState, InteractionHandle, container_transform, container_with,
    set_container_transform,
};
use crate::components::nodecontent::HitArea;
use crate::error::SceneError;
use crate::math::{Rect, Transform2D, angle_between, point_in_polygon};
use crate::resources::editorconfig::EditorConfig;
use crate::scene::{EntityStore, ids};
use crate::systems::propagate_transforms::global_matrix;
use crate::systems::selection::{begin_handling, end_handling};

#[derive(Debug, Clone, Copy)]
struct RotationPress {
    container: Entity,
    start: Transform2D,
    pivot_world: DVec2,
    start_angle: f64,
}

#[derive(Debug, Clone, Default)]
pub struct RotationHandle {
    state: HandleState,
    press: Option<RotationPress>,
}

fn world_polygon(world: &World, container: Entity, rect: &Rect) -> SmallVec<[DVec2; 4]> {
    let matrix = global_matrix(world, container);
    rect.corners()
        .into_iter()
        .map(|corner| matrix.transform_point2(corner))
        .collect()
}

/// World position of the container's pivot.
fn pivot_world(world: &World, container: Entity) -> DVec2 {
    let t = container_transform(world, container);
    global_matrix(world, container).transform_point2(t.pivot)
}

impl RotationHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rotates the selection by `degrees` in one committed interaction.
    pub fn rotate_by(
        &mut self,
        world: &mut World,
        store: &mut dyn EntityStore,
        degrees: f64,
    ) -> Result<bool, SceneError> {
        let Some(container) = container_with(world, ids::ROTATION) else {
            return Ok(false);
        };
        begin_handling(world, store, HandleRef::Rotation)?;
        let mut t = container_transform(world, container);
        t.rotation += degrees.to_radians();
        set_container_transform(world, store, container, t);
        end_handling(world, store, HandleRef::Rotation)?;
        Ok(true)
    }
}

impl InteractionHandle for RotationHandle {
    fn handle_ref(&self) -> HandleRef {
        HandleRef::Rotation
    }

    fn state(&self) -> HandleState {
        self.state
    }

    fn hit_test(&self, world: &World, config: &EditorConfig, point: DVec2) -> bool {
        let Some(container) = container_with(world, ids::ROTATION) else {
            return false;
        };
        let Some(area) = world.get::<HitArea>(container).map(|h| h.0) else {
            return false;
        };
        let outer = world_polygon(world, container, &area.scaled_about_center(config.rotation_band));
        let inner = world_polygon(world, container, &area);
        point_in_polygon(point, &outer) && !point_in_polygon(point, &inner)
    }

    fn press(
        &mut self,
        world: &mut World,
        store: &mut dyn EntityStore,
        point: DVec2,
    ) -> Result<bool, SceneError> {
        let Some(container) = container_with(world, ids::ROTATION) else {
            return Ok(false);
        };
        begin_handling(world, store, HandleRef::Rotation)?;
        let pivot_world = pivot_world(world, container);
        let press = RotationPress {
            container,
            start: container_transform(world, container),
            pivot_world,
            start_angle: angle_between(pivot_world, point),
        };
        debug!(
            "rotation: press at {:.3} rad around {:?}",
            press.start_angle, pivot_world
        );
        self.press = Some(press);
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
        let mut t = press.start;
        t.rotation = press.start.rotation + (angle_between(press.pivot_world, point) - press.start_angle);
        set_container_transform(world, store, press.container, t);
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
        end_handling(world, store, HandleRef::Rotation)
    }

    fn cancel(&mut self) {
        self.press = None;
        self.state = HandleState::Idle;
    }
}
