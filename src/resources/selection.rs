//! Current selection state.

use bevy_ecs::prelude::*;

use crate::scene::SceneComponentCollection;

/// The one selection of an editor.
///
/// `container` is `Some` exactly when `entities` is non-empty. While
/// `absorbed` is set the single selected node has an identity local
/// transform and the container carries its whole transform.
#[derive(Resource, Debug, Default)]
pub struct Selection {
    pub container: Option<Entity>,
    /// Selected ids in selection order, without duplicates.
    pub entities: Vec<String>,
    /// Composite components of the selected entities.
    pub components: SceneComponentCollection,
    pub absorbed: bool,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entities.iter().any(|e| e == id)
    }
}
