//! Integration tests for the editor facade: command bus, commits, render
//! coalescing, configuration and view fitting.
//!
//! # Usage
//!
//! ```sh
//! cargo test --test editor_integration
//! ```

use glam::DVec2;

use sceneforge::SceneEditor;
use sceneforge::error::SceneError;
use sceneforge::events::bus::{CmdPhase, EditorEvent, EventFilter};
use sceneforge::events::scenecmd::{CmdKind, SceneCmd};
use sceneforge::handles::{ArrowKey, HandleRef, Modifiers};
use sceneforge::math::Rect;
use sceneforge::resources::editorconfig::EditorConfig;
use sceneforge::resources::renderer::HeadlessRenderer;
use sceneforge::scene::component::transformation_components;
use sceneforge::scene::{
    ComponentValue, EntityStore, SceneComponent, SceneComponentCollection, SceneEntity, SceneStore,
    ids,
};

const EPSILON: f64 = 1e-6;

type Editor = SceneEditor<SceneStore, HeadlessRenderer>;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn vec_approx_eq(a: DVec2, b: DVec2) -> bool {
    a.abs_diff_eq(b, EPSILON)
}

fn object(id: &str, x: f64, y: f64, width: f64, height: f64) -> SceneEntity {
    SceneEntity::object(id).with_components(transformation_components(x, y, width, height))
}

fn editor_with(entities: Vec<SceneEntity>, config: EditorConfig) -> Editor {
    let store = SceneStore::from_entities(entities).unwrap();
    SceneEditor::new(store, HeadlessRenderer::new(), config).unwrap()
}

fn two_objects() -> Editor {
    editor_with(
        vec![
            object("e1", 0.0, 0.0, 10.0, 10.0),
            object("e2", 20.0, 0.0, 10.0, 10.0),
        ],
        EditorConfig::new(),
    )
}

fn move_to(id: &str, x: f64, y: f64) -> SceneCmd {
    SceneCmd::UpdateEntity {
        id: id.into(),
        components: SceneComponentCollection::from(vec![SceneComponent::point(
            ids::POSITION,
            x,
            y,
        )]),
    }
}

// =============================================================================
// Command bus
// =============================================================================

#[test]
fn commands_are_published_in_both_phases() {
    let mut editor = two_objects();
    let all = editor.subscribe(EventFilter::Any);
    let dispatched = editor.subscribe(EventFilter::Phase(CmdPhase::Dispatched));
    let completed_updates =
        editor.subscribe(EventFilter::Command(CmdPhase::Completed, CmdKind::UpdateEntity));

    editor.submit(move_to("e1", 3.0, 4.0)).unwrap();

    let events: Vec<EditorEvent> = all.try_iter().collect();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].phase(), Some(CmdPhase::Dispatched));
    assert_eq!(events[1].phase(), Some(CmdPhase::Completed));
    assert_eq!(dispatched.try_iter().count(), 1);
    match completed_updates.try_recv().unwrap() {
        EditorEvent::Completed(cmd) => assert_eq!(cmd.target(), Some("e1")),
        other => panic!("unexpected event {:?}", other),
    }

    let moved = editor.world_matrix("e1").unwrap().translation;
    assert!(vec_approx_eq(moved, DVec2::new(3.0, 4.0)));
}

#[test]
fn dispatch_only_queues() {
    let mut editor = two_objects();
    editor.dispatch(move_to("e1", 50.0, 0.0));
    assert!(vec_approx_eq(
        editor.world_matrix("e1").unwrap().translation,
        DVec2::ZERO
    ));
    editor.run().unwrap();
    assert!(vec_approx_eq(
        editor.world_matrix("e1").unwrap().translation,
        DVec2::new(50.0, 0.0)
    ));
}

#[test]
fn failing_command_does_not_stop_the_queue() {
    let mut editor = two_objects();
    let completed = editor.subscribe(EventFilter::Phase(CmdPhase::Completed));

    editor.dispatch(SceneCmd::DeleteEntity { id: "ghost".into() });
    editor.dispatch(move_to("e1", 7.0, 0.0));
    let result = editor.run();

    assert!(matches!(result, Err(SceneError::UnknownEntity(ref id)) if id == "ghost"));
    assert_eq!(completed.try_iter().count(), 1);
    assert!(vec_approx_eq(
        editor.world_matrix("e1").unwrap().translation,
        DVec2::new(7.0, 0.0)
    ));
}

#[test]
fn commands_parse_from_json() {
    let mut editor = two_objects();
    let cmd: SceneCmd = serde_json::from_str(
        r#"{"cmd":"updateEntity","id":"e2","components":[
            {"id":"transformation.position","type":"point","x":-5,"y":2}
        ]}"#,
    )
    .unwrap();
    editor.submit(cmd).unwrap();
    assert!(vec_approx_eq(
        editor.world_matrix("e2").unwrap().translation,
        DVec2::new(-5.0, 2.0)
    ));

    let select: SceneCmd = serde_json::from_str(r#"{"cmd":"select","ids":["e1","e2"]}"#).unwrap();
    editor.submit(select).unwrap();
    assert_eq!(editor.selection().len(), 2);
}

// =============================================================================
// Interaction commits
// =============================================================================

#[test]
fn drag_commits_one_update_per_entity() {
    let mut editor = two_objects();
    editor.submit(SceneCmd::select(["e1", "e2"])).unwrap();
    let updates = editor.subscribe(EventFilter::Command(CmdPhase::Completed, CmdKind::UpdateEntity));

    assert!(editor.press_handle(HandleRef::Rotation, DVec2::new(40.0, 5.0)).unwrap());
    for step in 1..=20 {
        let angle = step as f64 * 0.05;
        let point = DVec2::new(15.0, 5.0) + DVec2::from_angle(angle) * 25.0;
        editor.pointer_move(point).unwrap();
    }
    assert_eq!(updates.try_iter().count(), 0, "no commit before release");

    editor.pointer_up().unwrap();
    let mut targets: Vec<String> = updates
        .try_iter()
        .filter_map(|e| e.command().and_then(SceneCmd::target).map(str::to_string))
        .collect();
    targets.sort();
    assert_eq!(targets, vec!["e1", "e2"]);

    for id in ["e1", "e2"] {
        let degrees = editor
            .store()
            .entity(id)
            .unwrap()
            .components
            .range_value(ids::ROTATION)
            .unwrap();
        assert!(approx_eq(degrees, 1f64.to_degrees()), "{}: {}", id, degrees);
    }
}

#[test]
fn commit_carries_only_changed_components() {
    let mut editor = two_objects();
    editor.submit(SceneCmd::select(["e1"])).unwrap();
    let updates = editor.subscribe(EventFilter::Command(CmdPhase::Completed, CmdKind::UpdateEntity));

    assert!(editor.key_down(ArrowKey::Down, Modifiers::CTRL).unwrap());

    match updates.try_recv().unwrap() {
        EditorEvent::Completed(SceneCmd::UpdateEntity { id, components }) => {
            assert_eq!(id, "e1");
            let mut changed: Vec<&str> = components.ids().collect();
            changed.sort();
            assert_eq!(changed, vec![ids::PIVOT, ids::POSITION]);
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[test]
fn external_update_regroups_the_selection() {
    let mut editor = two_objects();
    editor.submit(SceneCmd::select(["e1", "e2"])).unwrap();

    editor.submit(move_to("e1", 50.0, 0.0)).unwrap();

    let t = editor.container_transform().unwrap();
    assert!(vec_approx_eq(t.pivot, DVec2::new(40.0, 5.0)));
    assert!(vec_approx_eq(t.position, DVec2::new(40.0, 5.0)));
    assert!(vec_approx_eq(
        editor.world_matrix("e1").unwrap().translation,
        DVec2::new(50.0, 0.0)
    ));
    assert_eq!(editor.selection().len(), 2);
}

#[test]
fn mixed_values_are_committed_as_plain_values() {
    let mut editor = two_objects();
    let mut position = SceneComponent::point(ids::POSITION, 50.0, 50.0);
    position.mixed = true;

    editor
        .submit(SceneCmd::UpdateEntity {
            id: "e1".into(),
            components: SceneComponentCollection::from(vec![position]),
        })
        .unwrap();

    let stored = editor
        .store()
        .entity("e1")
        .unwrap()
        .components
        .by_id(ids::POSITION)
        .unwrap();
    assert!(!stored.mixed, "stored component should not be mixed");
    assert!(vec_approx_eq(
        editor.world_matrix("e1").unwrap().translation,
        DVec2::new(50.0, 50.0)
    ));
}

#[test]
fn external_update_during_handling_touches_only_the_store() {
    let mut editor = two_objects();
    editor.submit(SceneCmd::select(["e1"])).unwrap();
    editor.begin_handling(HandleRef::Rotation).unwrap();
    assert!(editor.is_handling());

    editor.submit(move_to("e1", 50.0, 0.0)).unwrap();

    assert!(vec_approx_eq(
        editor.world_matrix("e1").unwrap().translation,
        DVec2::ZERO
    ));
    let stored = editor
        .store()
        .entity("e1")
        .unwrap()
        .components
        .point(ids::POSITION)
        .unwrap();
    assert!(vec_approx_eq(stored, DVec2::new(50.0, 0.0)));
    editor.end_handling(HandleRef::Rotation).unwrap();
    assert!(!editor.is_handling());
}

// =============================================================================
// Rendering
// =============================================================================

#[test]
fn renders_are_coalesced_per_run() {
    let mut editor = two_objects();
    let start = editor.renderer().renders;
    assert_eq!(start, 1, "initial tree is rendered once");

    editor.dispatch(move_to("e1", 1.0, 0.0));
    editor.dispatch(move_to("e2", 30.0, 0.0));
    editor.dispatch(move_to("e1", 2.0, 0.0));
    editor.run().unwrap();
    assert_eq!(editor.renderer().renders, start + 1);

    editor.pointer_move(DVec2::new(5.0, 5.0)).unwrap();
    editor.run().unwrap();
    assert_eq!(editor.renderer().renders, start + 1, "idle runs do not render");
}

#[test]
fn each_drag_frame_renders_once() {
    let mut editor = two_objects();
    editor.submit(SceneCmd::select(["e1"])).unwrap();
    let start = editor.renderer().renders;

    assert!(editor.press_handle(HandleRef::Pivot, DVec2::ZERO).unwrap());
    for x in 1..=5 {
        editor.pointer_move(DVec2::new(x as f64, 0.0)).unwrap();
    }
    assert_eq!(editor.renderer().renders, start + 5);
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn config_drives_keyboard_steps() {
    let mut config = EditorConfig::new();
    config
        .load_from_str("[handles]\nnudge_step = 5\nrotation_step_degrees = 15\n")
        .unwrap();
    let mut editor = editor_with(vec![object("e1", 0.0, 0.0, 10.0, 10.0)], config);
    editor.submit(SceneCmd::select(["e1"])).unwrap();

    assert!(editor.key_down(ArrowKey::Right, Modifiers::SHIFT).unwrap());
    assert!(editor.key_down(ArrowKey::Right, Modifiers::ALT).unwrap());

    let comps = &editor.store().entity("e1").unwrap().components;
    let (width, _, _, _) = comps.size(ids::SIZE).unwrap();
    assert!(approx_eq(width, 15.0));
    assert!(approx_eq(comps.range_value(ids::ROTATION).unwrap(), 15.0));
}

// =============================================================================
// Bounds and view fitting
// =============================================================================

#[test]
fn bounding_rect_in_world_and_group_space() {
    let mut group = SceneEntity::group("g1").with_components(transformation_components(100.0, 0.0, 0.0, 0.0));
    group
        .components
        .set_value(ids::SCALE, ComponentValue::Point { x: 2.0, y: 2.0 });
    let editor = editor_with(
        vec![
            group,
            object("e1", 0.0, 0.0, 10.0, 10.0).with_parent("g1"),
            object("e2", -50.0, 30.0, 20.0, 5.0),
        ],
        EditorConfig::new(),
    );

    let world = editor.bounding_rect(&["e1", "e2"], None);
    assert_eq!(world, Rect::new(-50.0, 0.0, 170.0, 35.0));

    let local = editor.bounding_rect(&["e1"], Some("g1"));
    assert_eq!(local, Rect::new(0.0, 0.0, 10.0, 10.0));

    assert_eq!(editor.bounding_rect(&[], None), Rect::ZERO);
    assert_eq!(editor.bounding_rect(&["ghost"], None), Rect::ZERO);
}

#[test]
fn fit_view_centers_and_zooms() {
    let editor = editor_with(vec![object("e1", 0.0, 0.0, 100.0, 50.0)], EditorConfig::new());
    let fit = editor.fit_view(&["e1"], DVec2::new(264.0, 264.0));
    assert!(vec_approx_eq(fit.center, DVec2::new(50.0, 25.0)));
    assert!(approx_eq(fit.zoom, 2.0));
}

// =============================================================================
// Loading
// =============================================================================

#[test]
fn editor_builds_from_scene_json() {
    let store = SceneStore::from_json_str(
        r#"{"entities":[
            {"id":"L1","type":"layer"},
            {"id":"e1","parent":"L1","components":[
                {"id":"transformation.position","group":"transformation","type":"point","x":10,"y":20},
                {"id":"transformation.size","type":"size","width":8,"height":4,"localWidth":8,"localHeight":4}
            ]}
        ]}"#,
    )
    .unwrap();
    let editor = SceneEditor::new(store, HeadlessRenderer::new(), EditorConfig::new()).unwrap();

    assert_eq!(editor.renderer().nodes.len(), 2);
    let bounds = editor.bounding_rect(&["e1"], None);
    assert_eq!(bounds, Rect::new(10.0, 20.0, 8.0, 4.0));
}
