//! Coalesced render request flag.

use bevy_ecs::prelude::*;

/// Set by every mutation that changes what is on screen; consumed once per
/// [`SceneEditor::run`](crate::editor::SceneEditor::run).
#[derive(Resource, Debug, Default)]
pub struct PendingRender {
    requested: bool,
}

impl PendingRender {
    pub fn request(&mut self) {
        self.requested = true;
    }

    pub fn is_requested(&self) -> bool {
        self.requested
    }

    /// Returns whether a render was requested and clears the flag.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.requested)
    }
}
