//! Logical scene data: typed components, entities and the entity store.
//!
//! Submodules overview:
//! - [`component`] – typed, identified component values and well-known ids
//! - [`collection`] – ordered, id-unique component collection
//! - [`entity`] – logical scene entities (object, group, layer)
//! - [`store`] – the [`EntityStore`] seam and the in-memory [`SceneStore`]

pub mod collection;
pub mod component;
pub mod entity;
pub mod store;

pub use collection::SceneComponentCollection;
pub use component::{ComponentValue, SceneComponent, ids};
pub use entity::{EntityKind, SceneEntity};
pub use store::{EntityStore, SceneStore};
