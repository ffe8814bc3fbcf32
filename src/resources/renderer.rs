//! Pixel-painting backend seam.
//!
//! The editor core never draws. It tells a [`Renderer`] which nodes exist,
//! asks it for each node's intrinsic content rectangle and requests at most
//! one render per drained command batch.

use bevy_ecs::prelude::Entity;
use log::debug;

use crate::math::Rect;
use crate::scene::{EntityKind, SceneEntity, ids};

pub trait Renderer {
    /// A render node was created for `entity`. Returns its intrinsic
    /// content rectangle in local space, if it has one.
    fn create_node(&mut self, entity: &SceneEntity, node: Entity) -> Option<Rect>;

    /// The render node of `id` was destroyed.
    fn remove_node(&mut self, id: &str, node: Entity);

    /// Current intrinsic content rectangle of `entity`.
    fn content_bounds(&self, entity: &SceneEntity) -> Option<Rect>;

    fn request_render(&mut self);
}

/// Renderer without output. Objects are measured from the local size stored
/// in their `transformation.size` component.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    pub nodes: Vec<(String, Entity)>,
    pub removed: Vec<String>,
    pub renders: usize,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for HeadlessRenderer {
    fn create_node(&mut self, entity: &SceneEntity, node: Entity) -> Option<Rect> {
        self.nodes.push((entity.id.clone(), node));
        self.content_bounds(entity)
    }

    fn remove_node(&mut self, id: &str, _node: Entity) {
        self.nodes.retain(|(n, _)| n != id);
        self.removed.push(id.to_string());
    }

    fn content_bounds(&self, entity: &SceneEntity) -> Option<Rect> {
        if entity.kind != EntityKind::Object {
            return None;
        }
        let (_, _, local_width, local_height) = entity.components.size(ids::SIZE)?;
        Some(Rect::new(0.0, 0.0, local_width, local_height))
    }

    fn request_render(&mut self) {
        self.renders += 1;
        debug!("render #{}", self.renders);
    }
}
