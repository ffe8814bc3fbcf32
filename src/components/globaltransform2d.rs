//! Computed world-space transform for render nodes.
//!
//! A render node's [`LocalTransform`](super::localtransform::LocalTransform)
//! is relative to its [`ChildOf`](bevy_ecs::hierarchy::ChildOf) parent. The
//! [`propagate_transforms`](crate::systems::propagate_transforms::propagate_transforms)
//! system composes the ancestor chain and stores the result here.

use bevy_ecs::prelude::*;
use glam::{DAffine2, DVec2};

/// Computed world-space matrix of a render node.
///
/// Managed by transform propagation. For root nodes it equals the local
/// matrix; for children it is `parent_world * local`.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct GlobalTransform2D(pub DAffine2);

impl Default for GlobalTransform2D {
    fn default() -> Self {
        Self(DAffine2::IDENTITY)
    }
}

impl GlobalTransform2D {
    pub fn matrix(&self) -> DAffine2 {
        self.0
    }

    /// World-space translation.
    pub fn translation(&self) -> DVec2 {
        self.0.translation
    }

    pub fn transform_point(&self, point: DVec2) -> DVec2 {
        self.0.transform_point2(point)
    }
}
