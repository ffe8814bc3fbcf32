//! Logical scene entities.

use serde::{Deserialize, Serialize};

use super::collection::SceneComponentCollection;
use super::component::SceneComponent;

/// Kind of a logical entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Leaf with visual content of its own.
    #[default]
    Object,
    /// Container whose content is its children.
    Group,
    /// Top-level container.
    Layer,
}

/// A node of the logical scene tree. Owns no render state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneEntity {
    pub id: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: EntityKind,
    #[serde(default)]
    pub components: SceneComponentCollection,
}

impl SceneEntity {
    pub fn new(id: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            id: id.into(),
            parent: None,
            kind,
            components: SceneComponentCollection::new(),
        }
    }

    pub fn object(id: impl Into<String>) -> Self {
        Self::new(id, EntityKind::Object)
    }

    pub fn group(id: impl Into<String>) -> Self {
        Self::new(id, EntityKind::Group)
    }

    pub fn layer(id: impl Into<String>) -> Self {
        Self::new(id, EntityKind::Layer)
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_components(mut self, components: impl IntoIterator<Item = SceneComponent>) -> Self {
        self.components.add(components);
        self
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind, EntityKind::Group | EntityKind::Layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::component::{ids, transformation_components};

    #[test]
    fn parses_minimal_entity() {
        let e: SceneEntity = serde_json::from_str(r#"{"id":"e1"}"#).unwrap();
        assert_eq!(e.kind, EntityKind::Object);
        assert!(e.parent.is_none());
        assert!(e.components.is_empty());
    }

    #[test]
    fn parses_group_with_components() {
        let e: SceneEntity = serde_json::from_str(
            r#"{"id":"g1","parent":"l1","type":"group","components":[
                {"id":"transformation.scale","type":"point","x":2,"y":2}
            ]}"#,
        )
        .unwrap();
        assert!(e.is_container());
        assert_eq!(e.parent.as_deref(), Some("l1"));
        assert_eq!(e.components.point(ids::SCALE).map(|p| p.x), Some(2.0));
    }

    #[test]
    fn builder_collects_components() {
        let e = SceneEntity::object("e1")
            .with_parent("g1")
            .with_components(transformation_components(0.0, 0.0, 10.0, 10.0));
        assert_eq!(e.components.len(), 6);
        assert!(!e.is_container());
    }
}
