//! sceneforge command line entry point.
//!
//! Loads a scene file into a [`SceneStore`], builds a headless
//! [`SceneEditor`], applies an optional selection and prints a JSON report:
//! the selected ids, the selection container transform, the composite
//! components, the bounding rect and a view fit for the given viewport.
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --scene scene.json --select e1,e2 --viewport 1920x1080
//! ```
//!
//! Set `RUST_LOG=debug` to trace command and handle activity.

use clap::Parser;
use glam::DVec2;
use log::{error, warn};
use serde_json::json;
use std::path::PathBuf;

use sceneforge::SceneEditor;
use sceneforge::error::SceneError;
use sceneforge::events::scenecmd::SceneCmd;
use sceneforge::resources::editorconfig::EditorConfig;
use sceneforge::resources::renderer::HeadlessRenderer;
use sceneforge::scene::{EntityStore, SceneStore};

/// Headless scene editor.
#[derive(Parser)]
#[command(
    version,
    about = "Loads a scene, selects entities and reports the selection transform."
)]
struct Cli {
    /// Scene file: `{ "entities": [ ... ] }`.
    #[arg(long, value_name = "PATH")]
    scene: PathBuf,

    /// Editor configuration (default: ./sceneforge.ini).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Comma separated entity ids to select.
    #[arg(long, value_name = "IDS", value_delimiter = ',')]
    select: Vec<String>,

    /// Viewport used for the view fit, as WIDTHxHEIGHT.
    #[arg(long, value_name = "WxH", default_value = "1280x720", value_parser = parse_viewport)]
    viewport: DVec2,
}

fn parse_viewport(text: &str) -> Result<DVec2, String> {
    let (w, h) = text
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{text}'"))?;
    let w: f64 = w.trim().parse().map_err(|e| format!("bad width: {e}"))?;
    let h: f64 = h.trim().parse().map_err(|e| format!("bad height: {e}"))?;
    if w <= 0.0 || h <= 0.0 {
        return Err("viewport must be positive".to_string());
    }
    Ok(DVec2::new(w, h))
}

fn run(cli: Cli) -> Result<serde_json::Value, SceneError> {
    let mut config = match cli.config {
        Some(path) => EditorConfig::with_path(path),
        None => EditorConfig::new(),
    };
    if let Err(e) = config.load_from_file() {
        warn!("Using default editor config: {}", e);
    }

    let store = SceneStore::load_json(&cli.scene)?;
    let mut editor = SceneEditor::new(store, HeadlessRenderer::new(), config)?;

    if !cli.select.is_empty() {
        editor.submit(SceneCmd::select(cli.select.clone()))?;
    }

    let selection = editor.selection();
    let ids: Vec<&str> = selection.entities.iter().map(String::as_str).collect();
    let container = editor.container_transform().map(|t| {
        json!({
            "position": [t.position.x, t.position.y],
            "scale": [t.scale.x, t.scale.y],
            "rotation": t.rotation.to_degrees(),
            "skew": [t.skew.x.to_degrees(), t.skew.y.to_degrees()],
            "pivot": [t.pivot.x, t.pivot.y],
        })
    });
    let all: Vec<String> = editor
        .store()
        .entities()
        .into_iter()
        .map(|e| e.id.clone())
        .collect();
    let fit_ids: Vec<&str> = if ids.is_empty() {
        all.iter().map(String::as_str).collect()
    } else {
        ids.clone()
    };

    Ok(json!({
        "selection": ids,
        "container": container,
        "components": selection.components,
        "boundingRect": editor.bounding_rect(&fit_ids, None),
        "view": editor.fit_view(&fit_ids, cli.viewport),
    }))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                error!("Error writing report: {e}");
                std::process::exit(1);
            }
        },
        Err(e) => {
            error!("Error: {e}");
            std::process::exit(1);
        }
    }
}
