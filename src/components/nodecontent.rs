//! Intrinsic content and hit area of render nodes.

use bevy_ecs::prelude::*;

use crate::math::Rect;

/// The node's own drawable extent in local space, as measured by the
/// renderer. `None` for nodes whose extent is only their children.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct NodeContent(pub Option<Rect>);

/// Local-space rectangle used for pointer hit-tests on the selection
/// container.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct HitArea(pub Rect);
