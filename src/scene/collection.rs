//! Ordered, id-unique component collection.

use glam::DVec2;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::component::{ComponentValue, SceneComponent};
use crate::error::SceneError;

/// The components of one entity, in insertion order. No two components share
/// an id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<SceneComponent>", into = "Vec<SceneComponent>")]
pub struct SceneComponentCollection {
    items: Vec<SceneComponent>,
}

impl From<Vec<SceneComponent>> for SceneComponentCollection {
    fn from(components: Vec<SceneComponent>) -> Self {
        let mut collection = Self::default();
        collection.add(components);
        collection
    }
}

impl From<SceneComponentCollection> for Vec<SceneComponent> {
    fn from(collection: SceneComponentCollection) -> Self {
        collection.items
    }
}

impl FromIterator<SceneComponent> for SceneComponentCollection {
    fn from_iter<I: IntoIterator<Item = SceneComponent>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl SceneComponentCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneComponent> {
        self.items.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|c| c.id.as_str())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id(id).is_some()
    }

    pub fn by_id(&self, id: &str) -> Option<&SceneComponent> {
        self.items.iter().find(|c| c.id == id)
    }

    pub fn by_id_mut(&mut self, id: &str) -> Option<&mut SceneComponent> {
        self.items.iter_mut().find(|c| c.id == id)
    }

    /// Appends components whose id is not present yet. Duplicates are
    /// dropped with a warning. Returns how many were added.
    pub fn add(&mut self, components: impl IntoIterator<Item = SceneComponent>) -> usize {
        let mut added = 0;
        for component in components {
            if self.contains(&component.id) {
                warn!("Duplicate component '{}' ignored", component.id);
                continue;
            }
            self.items.push(component);
            added += 1;
        }
        added
    }

    /// Removes the components with the given ids. Returns how many were
    /// removed.
    pub fn remove<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) -> usize {
        let before = self.items.len();
        for id in ids {
            self.items.retain(|c| c.id != id);
        }
        before - self.items.len()
    }

    /// Replaces existing components by id and appends new ones.
    ///
    /// A component whose `type` differs from the stored one, or from an
    /// earlier entry of the same batch, is rejected; the collection is left
    /// unchanged in that case. Stored components are never `mixed`. Returns
    /// how many components changed.
    pub fn set(
        &mut self,
        components: impl IntoIterator<Item = SceneComponent>,
    ) -> Result<usize, SceneError> {
        let components: Vec<SceneComponent> = components.into_iter().collect();
        for (i, component) in components.iter().enumerate() {
            let earlier = components[..i].iter().find(|c| c.id == component.id);
            if let Some(existing) = earlier.or_else(|| self.by_id(&component.id)) {
                if !existing.value.same_type(&component.value) {
                    return Err(SceneError::ComponentTypeMismatch {
                        id: component.id.clone(),
                        expected: existing.type_name(),
                        found: component.type_name(),
                    });
                }
            }
        }

        let mut changed = 0;
        for mut component in components {
            if component.mixed {
                debug!("Clearing mixed flag of '{}' on commit", component.id);
                component.mixed = false;
            }
            match self.by_id_mut(&component.id) {
                Some(existing) if *existing == component => {}
                Some(existing) => {
                    *existing = component;
                    changed += 1;
                }
                None => {
                    self.items.push(component);
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }

    /// Writes `value` into the existing component `id` and clears its
    /// `mixed` flag.
    ///
    /// Returns `true` when something changed. A missing component or a value
    /// of another type changes nothing.
    pub fn set_value(&mut self, id: &str, value: ComponentValue) -> bool {
        let Some(component) = self.by_id_mut(id) else {
            return false;
        };
        if !component.value.same_type(&value) {
            warn!(
                "Component '{}' is a {}, refusing a {} value",
                id,
                component.type_name(),
                value.type_name()
            );
            return false;
        }
        if component.value == value && !component.mixed {
            return false;
        }
        component.value = value;
        component.mixed = false;
        true
    }

    pub fn filter(&self, predicate: impl Fn(&SceneComponent) -> bool) -> Self {
        Self {
            items: self.items.iter().filter(|c| predicate(c)).cloned().collect(),
        }
    }

    /// Value of `id` if it exists with the given `type`, else `default`.
    pub fn get_value<'a>(
        &'a self,
        id: &str,
        type_name: &str,
        default: &'a ComponentValue,
    ) -> &'a ComponentValue {
        match self.by_id(id) {
            Some(component) if component.type_name() == type_name => &component.value,
            _ => default,
        }
    }

    pub fn point(&self, id: &str) -> Option<DVec2> {
        match self.by_id(id)?.value {
            ComponentValue::Point { x, y } => Some(DVec2::new(x, y)),
            _ => None,
        }
    }

    pub fn range_value(&self, id: &str) -> Option<f64> {
        match self.by_id(id)?.value {
            ComponentValue::Range { value, .. } => Some(value),
            _ => None,
        }
    }

    /// `(width, height, local_width, local_height)` of a size component.
    pub fn size(&self, id: &str) -> Option<(f64, f64, f64, f64)> {
        match self.by_id(id)?.value {
            ComponentValue::Size {
                width,
                height,
                local_width,
                local_height,
            } => Some((width, height, local_width, local_height)),
            _ => None,
        }
    }

    /// Components of `other` that are missing here or hold another value.
    pub fn diff(&self, other: &Self) -> Self {
        other.filter(|c| self.by_id(&c.id).is_none_or(|mine| mine != c))
    }
}
