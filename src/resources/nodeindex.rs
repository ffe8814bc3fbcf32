//! Id to render node lookup.

use bevy_ecs::prelude::*;
use rustc_hash::FxHashMap;

/// Maps entity ids to their render nodes and holds the scene root.
#[derive(Resource, Debug)]
pub struct NodeIndex {
    /// Parent of every top-level render node.
    pub root: Entity,
    nodes: FxHashMap<String, Entity>,
}

impl NodeIndex {
    pub fn new(root: Entity) -> Self {
        Self {
            root,
            nodes: FxHashMap::default(),
        }
    }

    pub fn get(&self, id: &str) -> Option<Entity> {
        self.nodes.get(id).copied()
    }

    pub fn insert(&mut self, id: impl Into<String>, node: Entity) {
        self.nodes.insert(id.into(), node);
    }

    pub fn remove(&mut self, id: &str) -> Option<Entity> {
        self.nodes.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Render node of `parent`, or the scene root for `None`.
    ///
    /// An unknown parent id also falls back to the root.
    pub fn parent_node(&self, parent: Option<&str>) -> Entity {
        parent.and_then(|id| self.get(id)).unwrap_or(self.root)
    }
}
