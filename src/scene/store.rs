//! Entity store seam and the in-memory store.
//!
//! The editor core never owns scene data: it reads entities through
//! [`EntityStore`] and changes them only by applying [`SceneCmd`]s. Sibling
//! order is the order in which [`EntityStore::children`] returns entities.

use std::path::Path;

use log::{debug, info};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::collection::SceneComponentCollection;
use super::entity::SceneEntity;
use crate::error::SceneError;
use crate::events::scenecmd::SceneCmd;

/// Source of truth for entities and their components.
pub trait EntityStore {
    fn entity(&self, id: &str) -> Option<&SceneEntity>;

    fn components_mut(&mut self, id: &str) -> Option<&mut SceneComponentCollection>;

    /// Children of `parent` (roots when `None`) in sibling order. Recursive
    /// listings are pre-order.
    fn children(&self, parent: Option<&str>, recursive: bool) -> Vec<&SceneEntity>;

    /// Every entity, parents before their children.
    fn entities(&self) -> Vec<&SceneEntity>;

    /// Applies a structural or data command. Selection commands are accepted
    /// and ignored.
    fn apply(&mut self, cmd: &SceneCmd) -> Result<(), SceneError>;

    /// Position of `id` among its siblings.
    fn sibling_index(&self, id: &str) -> Option<usize> {
        let parent = self.entity(id)?.parent.clone();
        self.children(parent.as_deref(), false)
            .iter()
            .position(|e| e.id == id)
    }
}

/// In-memory [`EntityStore`] backed by a flat list. Siblings keep the
/// relative order they have in the list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneStore {
    entities: Vec<SceneEntity>,
}

impl SceneStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store, checking id uniqueness, parent existence and that the
    /// parent graph has no cycles.
    pub fn from_entities(entities: Vec<SceneEntity>) -> Result<Self, SceneError> {
        let mut seen = FxHashSet::default();
        for entity in &entities {
            if !seen.insert(entity.id.as_str()) {
                return Err(SceneError::DuplicateEntity(entity.id.clone()));
            }
        }
        for entity in &entities {
            if let Some(parent) = &entity.parent {
                if !seen.contains(parent.as_str()) {
                    return Err(SceneError::UnknownEntity(parent.clone()));
                }
            }
        }
        let store = Self { entities };
        for entity in &store.entities {
            if let Some(parent) = &entity.parent {
                if store.is_ancestor_or_self(&entity.id, parent) {
                    return Err(SceneError::CyclicParent {
                        id: entity.id.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }
        Ok(store)
    }

    pub fn from_json_str(json: &str) -> Result<Self, SceneError> {
        let parsed: SceneStore = serde_json::from_str(json)?;
        Self::from_entities(parsed.entities)
    }

    /// Loads a scene file of the form `{ "entities": [ ... ] }`.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let store = Self::from_json_str(&text)?;
        info!("Loaded {} entities from {:?}", store.len(), path);
        Ok(store)
    }

    pub fn to_json_string(&self) -> Result<String, SceneError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.entities.iter().position(|e| e.id == id)
    }

    /// Whether `candidate` is `id` or lies on `id`'s parent chain when
    /// walking up from `candidate`.
    fn is_ancestor_or_self(&self, id: &str, candidate: &str) -> bool {
        let mut current = Some(candidate.to_string());
        let mut steps = 0;
        while let Some(cur) = current {
            if cur == id {
                return true;
            }
            steps += 1;
            if steps > self.entities.len() {
                return true;
            }
            current = self.entity(&cur).and_then(|e| e.parent.clone());
        }
        false
    }

    /// Inserts `entity` so that it becomes the `index`-th child of its
    /// parent, or the last one when `index` is `None` or past the end.
    fn insert_ordered(&mut self, entity: SceneEntity, index: Option<usize>) {
        let sibling_slots: Vec<usize> = self
            .entities
            .iter()
            .enumerate()
            .filter(|(_, e)| e.parent == entity.parent)
            .map(|(i, _)| i)
            .collect();
        let slot = match index {
            Some(i) if i < sibling_slots.len() => sibling_slots[i],
            _ => match sibling_slots.last() {
                Some(&last) => last + 1,
                None => self.entities.len(),
            },
        };
        self.entities.insert(slot, entity);
    }

    fn descendants_and_self(&self, id: &str) -> FxHashSet<String> {
        let mut ids: FxHashSet<String> = self
            .children(Some(id), true)
            .into_iter()
            .map(|e| e.id.clone())
            .collect();
        ids.insert(id.to_string());
        ids
    }

    fn collect_children<'a>(&'a self, parent: Option<&str>, recursive: bool, out: &mut Vec<&'a SceneEntity>) {
        for entity in self
            .entities
            .iter()
            .filter(|e| e.parent.as_deref() == parent)
        {
            out.push(entity);
            if recursive {
                self.collect_children(Some(&entity.id), true, out);
            }
        }
    }
}

impl EntityStore for SceneStore {
    fn entity(&self, id: &str) -> Option<&SceneEntity> {
        self.entities.iter().find(|e| e.id == id)
    }

    fn components_mut(&mut self, id: &str) -> Option<&mut SceneComponentCollection> {
        self.entities
            .iter_mut()
            .find(|e| e.id == id)
            .map(|e| &mut e.components)
    }

    fn children(&self, parent: Option<&str>, recursive: bool) -> Vec<&SceneEntity> {
        let mut out = Vec::new();
        self.collect_children(parent, recursive, &mut out);
        out
    }

    fn entities(&self) -> Vec<&SceneEntity> {
        self.children(None, true)
    }

    fn apply(&mut self, cmd: &SceneCmd) -> Result<(), SceneError> {
        match cmd {
            SceneCmd::CreateEntity { entity, index } => {
                if self.entity(&entity.id).is_some() {
                    return Err(SceneError::DuplicateEntity(entity.id.clone()));
                }
                if let Some(parent) = &entity.parent {
                    if self.entity(parent).is_none() {
                        return Err(SceneError::UnknownEntity(parent.clone()));
                    }
                }
                debug!("store: create '{}'", entity.id);
                self.insert_ordered(entity.clone(), *index);
            }
            SceneCmd::DeleteEntity { id } => {
                if self.entity(id).is_none() {
                    return Err(SceneError::UnknownEntity(id.clone()));
                }
                let doomed = self.descendants_and_self(id);
                debug!("store: delete '{}' ({} entities)", id, doomed.len());
                self.entities.retain(|e| !doomed.contains(&e.id));
            }
            SceneCmd::UpdateEntity { id, components } => {
                let target = self
                    .components_mut(id)
                    .ok_or_else(|| SceneError::UnknownEntity(id.clone()))?;
                let changed = target.set(components.iter().cloned())?;
                debug!("store: update '{}' ({} changed)", id, changed);
            }
            SceneCmd::SortEntity { id, parent, index } => {
                if let Some(parent) = parent {
                    if self.entity(parent).is_none() {
                        return Err(SceneError::UnknownEntity(parent.clone()));
                    }
                    if self.is_ancestor_or_self(id, parent) {
                        return Err(SceneError::CyclicParent {
                            id: id.clone(),
                            parent: parent.clone(),
                        });
                    }
                }
                let pos = self
                    .position(id)
                    .ok_or_else(|| SceneError::UnknownEntity(id.clone()))?;
                let mut entity = self.entities.remove(pos);
                entity.parent = parent.clone();
                debug!("store: sort '{}' under {:?} at {}", id, parent, index);
                self.insert_ordered(entity, Some(*index));
            }
            SceneCmd::Select { .. } | SceneCmd::Unselect { .. } => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::component::{SceneComponent, ids};

    fn store() -> SceneStore {
        SceneStore::from_entities(vec![
            SceneEntity::layer("l1"),
            SceneEntity::group("g1").with_parent("l1"),
            SceneEntity::object("a").with_parent("g1"),
            SceneEntity::object("b").with_parent("g1"),
            SceneEntity::object("c").with_parent("l1"),
        ])
        .unwrap()
    }

    fn ids_of(list: Vec<&SceneEntity>) -> Vec<&str> {
        list.into_iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn children_are_pre_order() {
        let s = store();
        assert_eq!(ids_of(s.children(Some("l1"), false)), ["g1", "c"]);
        assert_eq!(ids_of(s.children(Some("l1"), true)), ["g1", "a", "b", "c"]);
        assert_eq!(ids_of(s.entities()), ["l1", "g1", "a", "b", "c"]);
    }

    #[test]
    fn rejects_invalid_scenes() {
        let dup = SceneStore::from_entities(vec![SceneEntity::object("a"), SceneEntity::object("a")]);
        assert!(matches!(dup, Err(SceneError::DuplicateEntity(_))));
        let orphan = SceneStore::from_entities(vec![SceneEntity::object("a").with_parent("x")]);
        assert!(matches!(orphan, Err(SceneError::UnknownEntity(_))));
        let cycle = SceneStore::from_entities(vec![
            SceneEntity::group("a").with_parent("b"),
            SceneEntity::group("b").with_parent("a"),
        ]);
        assert!(matches!(cycle, Err(SceneError::CyclicParent { .. })));
    }

    #[test]
    fn delete_cascades() {
        let mut s = store();
        s.apply(&SceneCmd::DeleteEntity { id: "g1".into() }).unwrap();
        assert_eq!(ids_of(s.entities()), ["l1", "c"]);
    }

    #[test]
    fn sort_moves_to_sibling_index() {
        let mut s = store();
        s.apply(&SceneCmd::SortEntity {
            id: "c".into(),
            parent: Some("g1".into()),
            index: 1,
        })
        .unwrap();
        assert_eq!(ids_of(s.children(Some("g1"), false)), ["a", "c", "b"]);
        assert_eq!(s.sibling_index("c"), Some(1));
    }

    #[test]
    fn sort_rejects_cycles() {
        let mut s = store();
        let result = s.apply(&SceneCmd::SortEntity {
            id: "g1".into(),
            parent: Some("a".into()),
            index: 0,
        });
        assert!(matches!(result, Err(SceneError::CyclicParent { .. })));
    }

    #[test]
    fn create_at_index_and_update() {
        let mut s = store();
        s.apply(&SceneCmd::CreateEntity {
            entity: SceneEntity::object("d").with_parent("g1"),
            index: Some(0),
        })
        .unwrap();
        assert_eq!(ids_of(s.children(Some("g1"), false)), ["d", "a", "b"]);

        s.apply(&SceneCmd::UpdateEntity {
            id: "d".into(),
            components: vec![SceneComponent::point(ids::POSITION, 3.0, 4.0)].into(),
        })
        .unwrap();
        let d = s.entity("d").unwrap();
        assert_eq!(d.components.point(ids::POSITION).map(|p| p.y), Some(4.0));
    }

    #[test]
    fn json_round_trip_keeps_order() {
        let s = store();
        let text = s.to_json_string().unwrap();
        let back = SceneStore::from_json_str(&text).unwrap();
        assert_eq!(ids_of(back.entities()), ids_of(s.entities()));
    }
}
