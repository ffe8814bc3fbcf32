//! Editable local transform of a render node.

use bevy_ecs::prelude::*;
use glam::DAffine2;

use crate::math::Transform2D;

/// Transform relative to the node's current [`ChildOf`](bevy_ecs::hierarchy::ChildOf)
/// parent. While a node is aggregated under the selection container this is
/// relative to the container, not to the structural parent.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct LocalTransform(pub Transform2D);

impl LocalTransform {
    pub fn matrix(&self) -> DAffine2 {
        self.0.matrix()
    }
}
