//! Exclusive handling lock.

use bevy_ecs::prelude::*;

use crate::handles::HandleRef;
use crate::scene::SceneComponentCollection;

/// At most one handle drives the selection at a time.
///
/// `snapshot` holds each selected entity's components as they were when the
/// holder began; it is restored and diffed against when the holder ends.
#[derive(Resource, Debug, Default)]
pub struct HandlingLock {
    pub holder: Option<HandleRef>,
    pub snapshot: Vec<(String, SceneComponentCollection)>,
}

impl HandlingLock {
    pub fn is_held(&self) -> bool {
        self.holder.is_some()
    }

    pub fn is_held_by(&self, handle: HandleRef) -> bool {
        self.holder == Some(handle)
    }
}
