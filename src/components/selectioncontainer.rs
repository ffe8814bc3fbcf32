//! Marker for the synthetic selection node.

use bevy_ecs::prelude::*;

/// Tags the transient render node that aggregates the selected nodes.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct SelectionContainer;
