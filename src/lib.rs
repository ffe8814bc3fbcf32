//! sceneforge: scene transform and selection engine for a 2D editor.
//!
//! Logical entities live in an [`EntityStore`](scene::EntityStore); each one
//! is mirrored by a render node in a `bevy_ecs` world. The
//! [`SceneEditor`](editor::SceneEditor) keeps both in sync, aggregates
//! selections under a synthetic container and drives the resize, rotation
//! and pivot handles.
//!
//! - [`math`] – pure 2D transform math
//! - [`scene`] – components, entities and the entity store
//! - [`components`] – ECS components of render nodes
//! - [`resources`] – ECS resources (selection, lock, config, renderer seam)
//! - [`systems`] – render tree, sync, selection and camera operations
//! - [`handles`] – interaction handles
//! - [`events`] – commands, the command bus and editor events
//! - [`editor`] – the facade tying it all together

pub mod components;
pub mod editor;
pub mod error;
pub mod events;
pub mod handles;
pub mod math;
pub mod resources;
pub mod scene;
pub mod systems;

pub use editor::SceneEditor;
pub use error::SceneError;
