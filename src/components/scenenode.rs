//! Identity of a render node.

use bevy_ecs::prelude::*;

use crate::scene::EntityKind;

/// Links a render node back to the logical entity it mirrors.
#[derive(Component, Clone, Debug, PartialEq, Eq)]
pub struct SceneNode {
    pub id: String,
    pub kind: EntityKind,
}

/// Marker for the scene root every top-level render node hangs from.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct SceneRoot;
