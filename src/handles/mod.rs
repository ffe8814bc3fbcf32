//! Interaction handles driving the selection container.
//!
//! Each handle is an explicit state machine (`Idle → Pressed → Dragging →
//! Idle`). Pressing takes the handling lock, every drag mutates the
//! container's transform and mirrors it into the store, and releasing ends
//! the lock, which commits the interaction as one `UpdateEntity` per entity.
//!
//! Submodules overview:
//! - [`anchor`] – the eight resize anchors
//! - [`rotation`] – rotation band around the selection
//! - [`pivot`] – draggable pivot point
//!
//! Pointer positions are in world space.

pub mod anchor;
pub mod pivot;
pub mod rotation;

pub use anchor::{AnchorDirection, ResizeAnchor};
pub use pivot::PivotHandle;
pub use rotation::RotationHandle;

use bevy_ecs::prelude::*;
use bitflags::bitflags;
use glam::DVec2;
use log::debug;

use crate::components::localtransform::LocalTransform;
use crate::error::SceneError;
use crate::math::Transform2D;
use crate::resources::editorconfig::EditorConfig;
use crate::resources::selection::Selection;
use crate::scene::EntityStore;
use crate::systems::propagate_transforms::propagate_from;
use crate::systems::selection::sync_live;

/// Identity of a handle, used as the handling-lock holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleRef {
    Anchor(AnchorDirection),
    Rotation,
    Pivot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandleState {
    #[default]
    Idle,
    Pressed,
    Dragging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowKey {
    Left,
    Right,
    Up,
    Down,
}

impl ArrowKey {
    /// Unit step in screen axes (y grows downwards).
    pub fn delta(self) -> DVec2 {
        match self {
            Self::Left => DVec2::new(-1.0, 0.0),
            Self::Right => DVec2::new(1.0, 0.0),
            Self::Up => DVec2::new(0.0, -1.0),
            Self::Down => DVec2::new(0.0, 1.0),
        }
    }
}

bitflags! {
    /// Keyboard modifiers held with an arrow key.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1;
        const ALT = 1 << 1;
        const CTRL = 1 << 2;
    }
}

/// Pointer-driven handle.
pub trait InteractionHandle {
    fn handle_ref(&self) -> HandleRef;

    fn state(&self) -> HandleState;

    /// Whether `point` grabs this handle.
    fn hit_test(&self, world: &World, config: &EditorConfig, point: DVec2) -> bool;

    /// Starts an interaction at `point`. Returns `false` when the handle does
    /// not apply to the current selection.
    fn press(
        &mut self,
        world: &mut World,
        store: &mut dyn EntityStore,
        point: DVec2,
    ) -> Result<bool, SceneError>;

    fn drag(
        &mut self,
        world: &mut World,
        store: &mut dyn EntityStore,
        point: DVec2,
    ) -> Result<(), SceneError>;

    fn release(&mut self, world: &mut World, store: &mut dyn EntityStore)
    -> Result<(), SceneError>;

    /// Forgets an interaction whose lock was already ended elsewhere.
    fn cancel(&mut self);
}

/// Selection container, provided the composite has component `required`.
pub(crate) fn container_with(world: &World, required: &str) -> Option<Entity> {
    let selection = world.get_resource::<Selection>()?;
    let container = selection.container?;
    if !selection.components.contains(required) {
        debug!("handle: composite has no '{}', ignoring", required);
        return None;
    }
    Some(container)
}

pub(crate) fn container_transform(world: &World, container: Entity) -> Transform2D {
    world
        .get::<LocalTransform>(container)
        .map(|l| l.0)
        .unwrap_or_default()
}

/// Sets the container transform and mirrors it into the store.
pub(crate) fn set_container_transform(
    world: &mut World,
    store: &mut dyn EntityStore,
    container: Entity,
    transform: Transform2D,
) {
    if let Some(mut local) = world.get_mut::<LocalTransform>(container) {
        local.0 = transform;
    }
    propagate_from(world, container);
    sync_live(world, store);
}
