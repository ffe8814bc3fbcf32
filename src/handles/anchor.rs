//! Resize anchors.
//!
//! An anchor sits on a corner or edge midpoint of the container's local
//! bounds. Dragging it changes the container's width and/or height while the
//! opposite anchor stays pinned in parent space. Sizes may cross zero, which
//! flips the content; nothing is clamped.

use bevy_ecs::prelude::*;
use bitflags::bitflags;
use glam::{DAffine2, DVec2};
use log::debug;

use super::{
    HandleRef, HandleState, InteractionHandle, container_transform, container_with,
    set_container_transform,
};
use crate::components::nodecontent::HitArea;
use crate::error::SceneError;
use crate::math::{Rect, Transform2D};
use crate::resources::editorconfig::EditorConfig;
use crate::scene::{EntityStore, ids};
use crate::systems::propagate_transforms::{global_matrix, local_bounds};
use crate::systems::selection::{begin_handling, end_handling};

bitflags! {
    /// Placement of an anchor. `HOR` and `VERT` select the axes it resizes;
    /// the side flags say which side of each axis it sits on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AnchorDirection: u8 {
        const HOR = 1;
        const VERT = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
        const UP = 1 << 4;
        const DOWN = 1 << 5;
    }
}

impl AnchorDirection {
    pub const TOP_LEFT: Self = Self::HOR
        .union(Self::VERT)
        .union(Self::LEFT)
        .union(Self::UP);
    pub const TOP_RIGHT: Self = Self::HOR
        .union(Self::VERT)
        .union(Self::RIGHT)
        .union(Self::UP);
    pub const BOTTOM_LEFT: Self = Self::HOR
        .union(Self::VERT)
        .union(Self::LEFT)
        .union(Self::DOWN);
    pub const BOTTOM_RIGHT: Self = Self::HOR
        .union(Self::VERT)
        .union(Self::RIGHT)
        .union(Self::DOWN);
    pub const LEFT_EDGE: Self = Self::HOR.union(Self::LEFT);
    pub const RIGHT_EDGE: Self = Self::HOR.union(Self::RIGHT);
    pub const TOP_EDGE: Self = Self::VERT.union(Self::UP);
    pub const BOTTOM_EDGE: Self = Self::VERT.union(Self::DOWN);

    /// The eight standard anchors, corners first.
    pub const STANDARD: [Self; 8] = [
        Self::TOP_LEFT,
        Self::TOP_RIGHT,
        Self::BOTTOM_RIGHT,
        Self::BOTTOM_LEFT,
        Self::TOP_EDGE,
        Self::RIGHT_EDGE,
        Self::BOTTOM_EDGE,
        Self::LEFT_EDGE,
    ];

    pub fn validate(self) -> Result<Self, SceneError> {
        if self.contains(Self::LEFT | Self::RIGHT) || self.contains(Self::UP | Self::DOWN) {
            return Err(SceneError::ConflictingAnchorDirection(self));
        }
        let horizontal_side = self.intersects(Self::LEFT | Self::RIGHT);
        let vertical_side = self.intersects(Self::UP | Self::DOWN);
        let hor = self.contains(Self::HOR);
        let vert = self.contains(Self::VERT);
        if (!hor && !vert) || hor != horizontal_side || vert != vertical_side {
            return Err(SceneError::InvalidAnchor(self));
        }
        Ok(self)
    }

    /// The anchor across the bounds, which stays pinned while this one moves.
    pub fn opposite(self) -> Self {
        let mut opposite = self & (Self::HOR | Self::VERT);
        if self.contains(Self::LEFT) {
            opposite |= Self::RIGHT;
        }
        if self.contains(Self::RIGHT) {
            opposite |= Self::LEFT;
        }
        if self.contains(Self::UP) {
            opposite |= Self::DOWN;
        }
        if self.contains(Self::DOWN) {
            opposite |= Self::UP;
        }
        opposite
    }

    /// Where this anchor sits on `rect`.
    pub fn point_on(self, rect: &Rect) -> DVec2 {
        let min = rect.min();
        let max = rect.max();
        let center = rect.center();
        let x = if self.contains(Self::LEFT) {
            min.x
        } else if self.contains(Self::RIGHT) {
            max.x
        } else {
            center.x
        };
        let y = if self.contains(Self::UP) {
            min.y
        } else if self.contains(Self::DOWN) {
            max.y
        } else {
            center.y
        };
        DVec2::new(x, y)
    }

    /// +1 when moving this anchor along +x grows the width, else -1.
    fn side(self) -> DVec2 {
        DVec2::new(
            if self.contains(Self::LEFT) { -1.0 } else { 1.0 },
            if self.contains(Self::UP) { -1.0 } else { 1.0 },
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct AnchorPress {
    container: Entity,
    start: Transform2D,
    bounds: Rect,
    /// Scaled width and height at press.
    start_size: DVec2,
    opposite_local: DVec2,
    opposite_parent: DVec2,
    pointer_local: DVec2,
    inverse_world: DAffine2,
}

impl AnchorPress {
    fn capture(world: &World, container: Entity, direction: AnchorDirection, point: DVec2) -> Self {
        let start = container_transform(world, container);
        let bounds = local_bounds(world, container);
        let opposite_local = direction.opposite().point_on(&bounds);
        let inverse_world = global_matrix(world, container).inverse();
        Self {
            container,
            start,
            bounds,
            start_size: start.scale * bounds.size(),
            opposite_local,
            opposite_parent: start.matrix().transform_point2(opposite_local),
            pointer_local: inverse_world.transform_point2(point),
            inverse_world,
        }
    }

    /// Press transform resized to `size` on the enabled axes, with the
    /// opposite anchor moved back to its press-time spot. Axes with empty
    /// bounds keep their scale.
    fn resized(&self, size: DVec2, hor: bool, vert: bool) -> Transform2D {
        let mut t = self.start;
        if hor && self.bounds.width != 0.0 {
            t.scale.x = size.x / self.bounds.width;
        }
        if vert && self.bounds.height != 0.0 {
            t.scale.y = size.y / self.bounds.height;
        }
        t.position += self.opposite_parent - t.matrix().transform_point2(self.opposite_local);
        t
    }
}

/// One of the eight resize anchors.
#[derive(Debug, Clone)]
pub struct ResizeAnchor {
    direction: AnchorDirection,
    state: HandleState,
    press: Option<AnchorPress>,
}

impl ResizeAnchor {
    pub fn new(direction: AnchorDirection) -> Result<Self, SceneError> {
        Ok(Self {
            direction: direction.validate()?,
            state: HandleState::Idle,
            press: None,
        })
    }

    pub fn standard_set() -> arrayvec::ArrayVec<Self, 8> {
        AnchorDirection::STANDARD
            .into_iter()
            .map(|direction| Self {
                direction,
                state: HandleState::Idle,
                press: None,
            })
            .collect()
    }

    pub fn direction(&self) -> AnchorDirection {
        self.direction
    }

    /// World position of this anchor on the current selection.
    pub fn world_position(&self, world: &World) -> Option<DVec2> {
        let container = container_with(world, ids::SCALE)?;
        let area = world.get::<HitArea>(container)?.0;
        Some(global_matrix(world, container).transform_point2(self.direction.point_on(&area)))
    }

    /// Changes the selection's width and height by `delta` in one committed
    /// interaction, pinning the opposite anchor.
    pub fn nudge(
        &mut self,
        world: &mut World,
        store: &mut dyn EntityStore,
        delta: DVec2,
    ) -> Result<bool, SceneError> {
        let Some(container) = container_with(world, ids::SCALE) else {
            return Ok(false);
        };
        let handle = self.handle_ref();
        begin_handling(world, store, handle)?;
        let press = AnchorPress::capture(world, container, self.direction, DVec2::ZERO);
        let resized = press.resized(
            press.start_size + delta,
            self.direction.contains(AnchorDirection::HOR) && delta.x != 0.0,
            self.direction.contains(AnchorDirection::VERT) && delta.y != 0.0,
        );
        set_container_transform(world, store, container, resized);
        end_handling(world, store, handle)?;
        Ok(true)
    }
}

impl InteractionHandle for ResizeAnchor {
    fn handle_ref(&self) -> HandleRef {
        HandleRef::Anchor(self.direction)
    }

    fn state(&self) -> HandleState {
        self.state
    }

    fn hit_test(&self, world: &World, config: &EditorConfig, point: DVec2) -> bool {
        let Some(anchor) = self.world_position(world) else {
            return false;
        };
        let half = config.anchor_hit_size * 0.5;
        let offset = (point - anchor).abs();
        offset.x <= half && offset.y <= half
    }

    fn press(
        &mut self,
        world: &mut World,
        store: &mut dyn EntityStore,
        point: DVec2,
    ) -> Result<bool, SceneError> {
        let Some(container) = container_with(world, ids::SCALE) else {
            return Ok(false);
        };
        begin_handling(world, store, self.handle_ref())?;
        let press = AnchorPress::capture(world, container, self.direction, point);
        debug!(
            "anchor {:?}: press, size {:?}, pinned at {:?}",
            self.direction, press.start_size, press.opposite_parent
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
        let delta = press.inverse_world.transform_point2(point) - press.pointer_local;
        let size = press.start_size + self.direction.side() * delta * press.start.scale;
        let resized = press.resized(
            size,
            self.direction.contains(AnchorDirection::HOR),
            self.direction.contains(AnchorDirection::VERT),
        );
        set_container_transform(world, store, press.container, resized);
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
        end_handling(world, store, self.handle_ref())
    }

    fn cancel(&mut self) {
        self.press = None;
        self.state = HandleState::Idle;
    }
}
