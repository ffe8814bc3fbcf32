//! Typed scene commands.
//!
//! Every change to the entity store travels as a [`SceneCmd`] over the
//! [`CommandBus`](super::bus::CommandBus). The editor applies them in order and
//! mirrors the result into the render tree and the selection.

use serde::{Deserialize, Serialize};

use crate::scene::{SceneComponentCollection, SceneEntity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "camelCase")]
pub enum SceneCmd {
    /// Adds `ids` to the selection. The completed command carries the
    /// composite components of the resulting selection.
    Select {
        ids: Vec<String>,
        #[serde(default)]
        components: SceneComponentCollection,
    },
    Unselect {
        ids: Vec<String>,
    },
    /// Moves `id` under `parent` (root when `None`) at sibling `index`,
    /// keeping its world appearance.
    SortEntity {
        id: String,
        parent: Option<String>,
        index: usize,
    },
    /// Sets the given components on `id`.
    UpdateEntity {
        id: String,
        components: SceneComponentCollection,
    },
    /// Removes `id` and all of its descendants.
    DeleteEntity {
        id: String,
    },
    CreateEntity {
        entity: SceneEntity,
        #[serde(default)]
        index: Option<usize>,
    },
}

/// Payload-free discriminant of [`SceneCmd`], used by event filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmdKind {
    Select,
    Unselect,
    SortEntity,
    UpdateEntity,
    DeleteEntity,
    CreateEntity,
}

impl SceneCmd {
    pub fn kind(&self) -> CmdKind {
        match self {
            Self::Select { .. } => CmdKind::Select,
            Self::Unselect { .. } => CmdKind::Unselect,
            Self::SortEntity { .. } => CmdKind::SortEntity,
            Self::UpdateEntity { .. } => CmdKind::UpdateEntity,
            Self::DeleteEntity { .. } => CmdKind::DeleteEntity,
            Self::CreateEntity { .. } => CmdKind::CreateEntity,
        }
    }

    pub fn select(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::Select {
            ids: ids.into_iter().map(Into::into).collect(),
            components: SceneComponentCollection::new(),
        }
    }

    pub fn unselect(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::Unselect {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Entity the command targets, if it targets exactly one.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::SortEntity { id, .. }
            | Self::UpdateEntity { id, .. }
            | Self::DeleteEntity { id } => Some(id),
            Self::CreateEntity { entity, .. } => Some(&entity.id),
            Self::Select { .. } | Self::Unselect { .. } => None,
        }
    }
}
