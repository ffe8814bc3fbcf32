//! Z-index component for draw ordering.
//!
//! Sibling render nodes are drawn in ascending [`ZIndex`] order. The
//! selection container is raised above every scene root while it exists.

use bevy_ecs::prelude::Component;

/// Draw order among siblings. Higher values are drawn on top.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ZIndex(pub i32);
