//! Editor facade.
//!
//! [`SceneEditor`] owns the ECS world holding the render nodes, the entity
//! store, the renderer and the handles. All mutation happens synchronously
//! inside its methods:
//!
//! - commands are queued with [`SceneEditor::dispatch`] and applied in order
//!   by [`SceneEditor::run`];
//! - pointer and keyboard entry points drive the handles and call `run`
//!   before returning, so a committed interaction is applied at once;
//! - each `run` issues at most one render request.

use arrayvec::ArrayVec;
use bevy_ecs::prelude::*;
use crossbeam_channel::Receiver;
use glam::{DAffine2, DVec2};
use log::{debug, info, warn};

use crate::components::localtransform::LocalTransform;
use crate::error::SceneError;
use crate::events::bus::{CommandBus, EditorEvent, EventFilter};
use crate::events::scenecmd::SceneCmd;
use crate::handles::{
    AnchorDirection, ArrowKey, HandleRef, InteractionHandle, Modifiers, PivotHandle,
    ResizeAnchor, RotationHandle,
};
use crate::math::{Rect, Transform2D};
use crate::resources::editorconfig::EditorConfig;
use crate::resources::handlinglock::HandlingLock;
use crate::resources::nodeindex::NodeIndex;
use crate::resources::pendingrender::PendingRender;
use crate::resources::renderer::Renderer;
use crate::resources::selection::Selection;
use crate::scene::{EntityStore, SceneComponentCollection, ids};
use crate::systems::camera::{ViewFit, fit_view, get_bounding_rect};
use crate::systems::propagate_transforms::{global_matrix, local_bounds};
use crate::systems::render_tree::{
    create_node, node_of, refresh_ancestor_sizes, refresh_content, remove_nodes,
    reparent_node, spawn_root,
};
use crate::systems::selection::{
    aggregate, begin_handling, end_handling, force_end_handling, restore_all, select, unselect,
};
use crate::systems::sync::apply_components;

pub struct SceneEditor<S: EntityStore, R: Renderer> {
    world: World,
    store: S,
    renderer: R,
    anchors: ArrayVec<ResizeAnchor, 8>,
    rotation: RotationHandle,
    pivot: PivotHandle,
    active: Option<HandleRef>,
}

fn handle_mut<'a>(
    anchors: &'a mut ArrayVec<ResizeAnchor, 8>,
    rotation: &'a mut RotationHandle,
    pivot: &'a mut PivotHandle,
    handle: HandleRef,
) -> Option<&'a mut dyn InteractionHandle> {
    match handle {
        HandleRef::Anchor(direction) => anchors
            .iter_mut()
            .find(|a| a.direction() == direction)
            .map(|a| a as &mut dyn InteractionHandle),
        HandleRef::Rotation => Some(rotation as &mut dyn InteractionHandle),
        HandleRef::Pivot => Some(pivot as &mut dyn InteractionHandle),
    }
}

impl<S: EntityStore, R: Renderer> SceneEditor<S, R> {
    /// Builds the render tree for every entity of `store`.
    pub fn new(store: S, renderer: R, config: EditorConfig) -> Result<Self, SceneError> {
        let mut world = World::new();
        let root = spawn_root(&mut world);
        world.insert_resource(NodeIndex::new(root));
        world.insert_resource(Selection::default());
        world.insert_resource(HandlingLock::default());
        world.insert_resource(PendingRender::default());
        world.insert_resource(CommandBus::new());
        world.insert_resource(config);

        let mut editor = Self {
            world,
            store,
            renderer,
            anchors: ResizeAnchor::standard_set(),
            rotation: RotationHandle::new(),
            pivot: PivotHandle::new(),
            active: None,
        };
        let ids: Vec<String> = editor
            .store
            .entities()
            .into_iter()
            .map(|e| e.id.clone())
            .collect();
        for id in &ids {
            create_node(&mut editor.world, &editor.store, &mut editor.renderer, id)?;
        }
        info!("Editor ready with {} render nodes", ids.len());
        editor.run()?;
        Ok(editor)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn config(&self) -> &EditorConfig {
        self.world.resource::<EditorConfig>()
    }

    pub fn selection(&self) -> &Selection {
        self.world.resource::<Selection>()
    }

    pub fn lock_holder(&self) -> Option<HandleRef> {
        self.world.resource::<HandlingLock>().holder
    }

    pub fn is_handling(&self) -> bool {
        self.world.resource::<HandlingLock>().is_held()
    }

    /// Render node of `id`.
    pub fn node(&self, id: &str) -> Option<Entity> {
        node_of(&self.world, id)
    }

    pub fn local_bounds(&self, id: &str) -> Option<Rect> {
        self.node(id).map(|n| local_bounds(&self.world, n))
    }

    pub fn world_matrix(&self, id: &str) -> Option<DAffine2> {
        self.node(id).map(|n| global_matrix(&self.world, n))
    }

    /// Local transform of the selection container.
    pub fn container_transform(&self) -> Option<Transform2D> {
        let container = self.selection().container?;
        self.world.get::<LocalTransform>(container).map(|l| l.0)
    }

    pub fn subscribe(&mut self, filter: EventFilter) -> Receiver<EditorEvent> {
        self.world.resource_mut::<CommandBus>().subscribe(filter)
    }

    /// Queues `cmd`; it is applied by the next [`run`](Self::run).
    pub fn dispatch(&self, cmd: SceneCmd) {
        self.world.resource::<CommandBus>().dispatch(cmd);
    }

    /// Queues `cmd` and runs the queue.
    pub fn submit(&mut self, cmd: SceneCmd) -> Result<(), SceneError> {
        self.dispatch(cmd);
        self.run()
    }

    fn publish(&mut self, event: EditorEvent) {
        self.world.resource_mut::<CommandBus>().publish(&event);
    }

    /// Applies every queued command, including those queued while draining,
    /// then requests one render if anything changed.
    ///
    /// A failing command is logged and skipped; the first error is returned
    /// after the queue is empty.
    pub fn run(&mut self) -> Result<(), SceneError> {
        let mut first_error = None;
        let queued = self.world.resource::<CommandBus>().pending();
        if queued > 0 {
            debug!("run: {} queued commands", queued);
        }
        while let Some(cmd) = self.world.resource::<CommandBus>().next() {
            self.publish(EditorEvent::Dispatched(cmd.clone()));
            match self.execute(cmd) {
                Ok(done) => self.publish(EditorEvent::Completed(done)),
                Err(e) => {
                    warn!("Command failed: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }
        if self.world.resource_mut::<PendingRender>().take() {
            self.renderer.request_render();
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn execute(&mut self, cmd: SceneCmd) -> Result<SceneCmd, SceneError> {
        debug!("execute {:?}", cmd.kind());
        match cmd {
            SceneCmd::Select { ids, .. } => {
                select(&mut self.world, &mut self.store, &ids, false, true);
                let components = self.selection().components.clone();
                Ok(SceneCmd::Select { ids, components })
            }
            SceneCmd::Unselect { ref ids } => {
                unselect(&mut self.world, &mut self.store, ids, false);
                Ok(cmd)
            }
            SceneCmd::CreateEntity { ref entity, .. } => {
                self.store.apply(&cmd)?;
                create_node(&mut self.world, &self.store, &mut self.renderer, &entity.id)?;
                refresh_ancestor_sizes(&self.world, &self.store, entity.parent.as_deref());
                Ok(cmd)
            }
            SceneCmd::DeleteEntity { ref id } => {
                self.delete_entity(id)?;
                Ok(cmd)
            }
            SceneCmd::SortEntity { ref id, .. } => {
                self.sort_entity(&cmd, id)?;
                Ok(cmd)
            }
            SceneCmd::UpdateEntity {
                ref id,
                ref components,
            } => {
                self.update_entity(&cmd, id, components)?;
                Ok(cmd)
            }
        }
    }

    fn delete_entity(&mut self, id: &str) -> Result<(), SceneError> {
        let entity = self
            .store
            .entity(id)
            .ok_or_else(|| SceneError::UnknownEntity(id.to_string()))?;
        let parent = entity.parent.clone();
        let mut doomed: Vec<String> = self
            .store
            .children(Some(id), true)
            .into_iter()
            .map(|e| e.id.clone())
            .collect();
        doomed.push(id.to_string());

        let had_selection = !self.selection().is_empty();
        force_end_handling(&mut self.world, &mut self.store);
        restore_all(&mut self.world, &self.store);
        let dropped: Vec<String> = {
            let mut selection = self.world.resource_mut::<Selection>();
            let dropped = selection
                .entities
                .iter()
                .filter(|e| doomed.contains(e))
                .cloned()
                .collect();
            selection.entities.retain(|e| !doomed.contains(e));
            dropped
        };

        remove_nodes(&mut self.world, &mut self.renderer, id);
        let result = self.store.apply(&SceneCmd::DeleteEntity { id: id.to_string() });
        if had_selection {
            aggregate(&mut self.world, &self.store, false);
        }
        if !dropped.is_empty() {
            self.publish(EditorEvent::Unselected { ids: dropped });
        }
        result?;
        refresh_ancestor_sizes(&self.world, &self.store, parent.as_deref());
        Ok(())
    }

    fn sort_entity(&mut self, cmd: &SceneCmd, id: &str) -> Result<(), SceneError> {
        let old_parent = self
            .store
            .entity(id)
            .ok_or_else(|| SceneError::UnknownEntity(id.to_string()))?
            .parent
            .clone();

        let had_selection = !self.selection().is_empty();
        force_end_handling(&mut self.world, &mut self.store);
        restore_all(&mut self.world, &self.store);
        let result = match self.store.apply(cmd) {
            Ok(()) => reparent_node(&mut self.world, &mut self.store, id),
            Err(e) => Err(e),
        };
        if had_selection {
            aggregate(&mut self.world, &self.store, false);
        }
        result?;

        let new_parent = self.store.entity(id).and_then(|e| e.parent.clone());
        refresh_ancestor_sizes(&self.world, &self.store, old_parent.as_deref());
        if new_parent != old_parent {
            refresh_ancestor_sizes(&self.world, &self.store, new_parent.as_deref());
        }
        Ok(())
    }

    fn update_entity(
        &mut self,
        cmd: &SceneCmd,
        id: &str,
        components: &SceneComponentCollection,
    ) -> Result<(), SceneError> {
        let entity = self
            .store
            .entity(id)
            .ok_or_else(|| SceneError::UnknownEntity(id.to_string()))?;
        let moves_geometry =
            !entity.is_container() || components.iter().any(|c| c.id != ids::SIZE);
        let parent = entity.parent.clone();
        self.store.apply(cmd)?;

        let selected = self.selection().contains(id);
        let has_selection = !self.selection().is_empty();
        let handling = self.is_handling();
        if handling && selected {
            debug!("update '{}': node is driven by a handle, store only", id);
        } else {
            let regroup = has_selection && !handling;
            if regroup {
                restore_all(&mut self.world, &self.store);
            }
            refresh_content(&mut self.world, &self.store, &self.renderer, id);
            if let (Some(node), Some(entity)) = (node_of(&self.world, id), self.store.entity(id)) {
                apply_components(&mut self.world, node, &entity.components);
            }
            if regroup {
                aggregate(&mut self.world, &self.store, false);
            }
            self.world.resource_mut::<PendingRender>().request();
        }

        if moves_geometry {
            refresh_ancestor_sizes(&self.world, &self.store, parent.as_deref());
        }
        Ok(())
    }

    fn finish<T>(&mut self, result: Result<T, SceneError>) -> Result<T, SceneError> {
        let ran = self.run();
        let value = result?;
        ran?;
        Ok(value)
    }

    /// Takes the handling lock for `handle` outside of a pointer interaction.
    pub fn begin_handling(&mut self, handle: HandleRef) -> Result<(), SceneError> {
        begin_handling(&mut self.world, &self.store, handle)
    }

    /// Ends the interaction held by `handle` and applies the commit.
    pub fn end_handling(&mut self, handle: HandleRef) -> Result<(), SceneError> {
        let result = end_handling(&mut self.world, &mut self.store, handle);
        self.finish(result)
    }

    /// Presses `handle` at `point` without hit-testing.
    pub fn press_handle(&mut self, handle: HandleRef, point: DVec2) -> Result<bool, SceneError> {
        let Self {
            world,
            store,
            anchors,
            rotation,
            pivot,
            ..
        } = self;
        let Some(target) = handle_mut(anchors, rotation, pivot, handle) else {
            warn!("No handle {:?}", handle);
            return Ok(false);
        };
        let result = target.press(world, store, point);
        if let Ok(true) = result {
            self.active = Some(handle);
        }
        self.finish(result)
    }

    /// Cancels the active handle when its lock was force-ended.
    fn drop_stale(&mut self, handle: HandleRef) -> bool {
        if self.world.resource::<HandlingLock>().is_held_by(handle) {
            return false;
        }
        debug!("{:?} lost the handling lock, cancelling", handle);
        if let Some(target) =
            handle_mut(&mut self.anchors, &mut self.rotation, &mut self.pivot, handle)
        {
            target.cancel();
        }
        self.active = None;
        true
    }

    /// Handle under `point`, checked in pivot, anchor, rotation order.
    pub fn hit_test(&self, point: DVec2) -> Option<HandleRef> {
        let config = self.config();
        if self.pivot.hit_test(&self.world, config, point) {
            return Some(HandleRef::Pivot);
        }
        if let Some(anchor) = self
            .anchors
            .iter()
            .find(|a| a.hit_test(&self.world, config, point))
        {
            return Some(anchor.handle_ref());
        }
        if self.rotation.hit_test(&self.world, config, point) {
            return Some(HandleRef::Rotation);
        }
        None
    }

    /// Presses the handle under `point`, if any.
    pub fn pointer_down(&mut self, point: DVec2) -> Result<bool, SceneError> {
        match self.hit_test(point) {
            Some(handle) => self.press_handle(handle, point),
            None => Ok(false),
        }
    }

    pub fn pointer_move(&mut self, point: DVec2) -> Result<(), SceneError> {
        let Some(handle) = self.active else {
            return Ok(());
        };
        if self.drop_stale(handle) {
            return Ok(());
        }
        let Self {
            world,
            store,
            anchors,
            rotation,
            pivot,
            ..
        } = self;
        let result = match handle_mut(anchors, rotation, pivot, handle) {
            Some(target) => target.drag(world, store, point),
            None => Ok(()),
        };
        self.finish(result)
    }

    /// Releases the active handle, committing its interaction.
    pub fn pointer_up(&mut self) -> Result<(), SceneError> {
        let Some(handle) = self.active else {
            return Ok(());
        };
        if self.drop_stale(handle) {
            return Ok(());
        }
        self.active = None;
        let Self {
            world,
            store,
            anchors,
            rotation,
            pivot,
            ..
        } = self;
        let result = match handle_mut(anchors, rotation, pivot, handle) {
            Some(target) => target.release(world, store),
            None => Ok(()),
        };
        self.finish(result)
    }

    /// Keyboard equivalents of the handles:
    /// - `Shift` + arrows resize (top-left pinned)
    /// - `Alt` + Left/Right rotate by the configured step
    /// - `Ctrl` + arrows move the pivot
    ///
    /// Returns whether the key did anything.
    pub fn key_down(&mut self, key: ArrowKey, modifiers: Modifiers) -> Result<bool, SceneError> {
        if self.selection().is_empty() {
            return Ok(false);
        }
        let (step, rotation_step) = {
            let config = self.config();
            (config.nudge_step, config.rotation_step_degrees)
        };
        let result = if modifiers.contains(Modifiers::SHIFT) {
            match self
                .anchors
                .iter_mut()
                .find(|a| a.direction() == AnchorDirection::BOTTOM_RIGHT)
            {
                Some(anchor) => anchor.nudge(&mut self.world, &mut self.store, key.delta() * step),
                None => Ok(false),
            }
        } else if modifiers.contains(Modifiers::ALT) {
            match key {
                ArrowKey::Left => {
                    self.rotation
                        .rotate_by(&mut self.world, &mut self.store, -rotation_step)
                }
                ArrowKey::Right => {
                    self.rotation
                        .rotate_by(&mut self.world, &mut self.store, rotation_step)
                }
                ArrowKey::Up | ArrowKey::Down => Ok(false),
            }
        } else if modifiers.contains(Modifiers::CTRL) {
            self.pivot
                .nudge(&mut self.world, &mut self.store, key.delta() * step)
        } else {
            Ok(false)
        };
        self.finish(result)
    }

    /// Union of the given entities' bounds in the space of `space` (world
    /// space when `None`). Unknown ids are ignored.
    pub fn bounding_rect(&self, ids: &[&str], space: Option<&str>) -> Rect {
        let nodes: Vec<Entity> = ids.iter().filter_map(|id| self.node(id)).collect();
        let space = space.and_then(|id| self.node(id));
        get_bounding_rect(&self.world, &nodes, space)
    }

    /// View placement showing the given entities in `viewport`.
    pub fn fit_view(&self, ids: &[&str], viewport: DVec2) -> ViewFit {
        let rect = self.bounding_rect(ids, None);
        fit_view(&rect, viewport, self.config().fit_padding)
    }
}
