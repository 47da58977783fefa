use std::path::Path;

use tickscene::{
    Entity, FileImageLoader, LoopConfig, Scene, SceneConfig, SetRunningEvent, Surface,
    SurfaceSize,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use super::behaviors::{behavior_from_spec, travel_range};
use super::manifest::{EntitySpec, ManifestError, SceneManifest};

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) manifest: SceneManifest,
}

/// Sets up logging and loads the scene manifest named by the first argument, falling back to the
/// bundled one.
pub(crate) fn build_app() -> Result<AppWiring, ManifestError> {
    init_tracing();
    info!("=== tickscene demo startup ===");

    let manifest = match std::env::args().nth(1) {
        Some(path) => {
            info!(path = %path, "scene_manifest_selected");
            SceneManifest::from_path(Path::new(&path))?
        }
        None => SceneManifest::builtin()?,
    };
    let config = LoopConfig {
        window_title: manifest.window.title.clone(),
        window_width: manifest.window.width,
        window_height: manifest.window.height,
        scene: manifest.scene.clone(),
        ..LoopConfig::default()
    };

    Ok(AppWiring { config, manifest })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

pub(crate) fn build_scene<S: Surface>(
    surface: S,
    config: SceneConfig,
    manifest: &SceneManifest,
) -> Result<Scene<S>, ManifestError> {
    let loader = match &manifest.asset_dir {
        Some(dir) => FileImageLoader::new(dir.clone()),
        None => FileImageLoader::default(),
    };
    let mut scene = Scene::new(surface, config).with_image_loader(loader);
    scene.on_set_running(|event: &mut SetRunningEvent| {
        debug!(requested = event.value, "run_state_requested");
    });

    let bounds = scene.size();
    for spec in &manifest.entities {
        let entity = build_entity(&mut scene, spec, bounds)?;
        match spec.priority {
            Some(priority) => scene.add_entity_with_priority(entity, priority),
            None => scene.add_entity(entity),
        };
    }

    info!(
        entity_count = scene.len(),
        running = scene.is_running(),
        "scene_built"
    );
    Ok(scene)
}

fn build_entity<S: Surface>(
    scene: &mut Scene<S>,
    spec: &EntitySpec,
    bounds: SurfaceSize,
) -> Result<Entity, ManifestError> {
    let mut entity = scene.create_entity(spec.to_entity_data())?;
    if let Some(behavior) = &spec.behavior {
        entity.set_behavior(Some(behavior_from_spec(behavior)));
    }
    if spec.confine {
        let (min, max) = travel_range(&entity, bounds);
        entity.on_move(move |event| {
            event.to.x = event.to.x.clamp(min.x, max.x);
            event.to.y = event.to.y.clamp(min.y, max.y);
        });
    }
    Ok(entity)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tickscene::{DrawCall, ModelKind, RecordingSurface, Vector2};

    use super::super::manifest::parse_manifest_json;
    use super::*;

    const MANIFEST: &str = r##"{
        "scene": { "tick_period_ms": 20, "default_priority": 4 },
        "entities": [
            {
                "x": 10, "y": 10,
                "model": { "kind": "square", "width": 8, "height": 8, "color": "#ff0000" }
            },
            { "x": 30, "y": 10, "priority": 7, "model": { "kind": "circle", "radius": 3 } },
            {
                "x": 85, "y": 5, "motion": { "x": 200, "y": 0 }, "confine": true,
                "model": { "kind": "square", "width": 10, "height": 10 }
            },
            {
                "x": 50, "y": 50, "model": { "kind": "square", "width": 4, "height": 4 },
                "behavior": { "kind": "spin", "degrees_per_tick": 15 }
            }
        ]
    }"##;

    fn scene_from(raw: &str) -> Scene<RecordingSurface> {
        let manifest = parse_manifest_json(raw).expect("manifest");
        let config = manifest.scene.clone();
        build_scene(RecordingSurface::new(100, 80), config, &manifest).expect("scene")
    }

    #[test]
    fn entities_are_added_with_manifest_priorities() {
        let scene = scene_from(MANIFEST);

        let priorities: Vec<_> = scene.entities().map(|(_, priority)| priority).collect();
        assert_eq!(priorities, vec![4, 7, 4, 4]);
        assert!(scene.entities().all(|(entity, _)| !entity.is_closed()));
        assert_eq!(
            scene.entities().nth(1).map(|(entity, _)| entity.model().kind()),
            Some(ModelKind::Circle)
        );
    }

    #[test]
    fn confined_entity_stays_inside_the_surface() {
        let mut scene = scene_from(MANIFEST);
        let id = scene
            .entities()
            .map(|(entity, _)| entity)
            .find(|entity| entity.move_listener_count() == 1)
            .map(Entity::id)
            .expect("confined entity");

        let outcome = scene.poll(Duration::from_millis(100));

        assert!(outcome.ticks_run > 0);
        assert_eq!(
            scene.entity(id).map(Entity::position),
            Some(Vector2::new(90.0, 5.0))
        );
    }

    #[test]
    fn confined_circle_stops_a_radius_from_the_edge() {
        let raw = r#"{
            "entities": [ {
                "x": 90, "y": 40, "motion": { "x": 200, "y": 0 }, "confine": true,
                "model": { "kind": "circle", "radius": 5 }
            } ]
        }"#;
        let mut scene = scene_from(raw);

        scene.step();

        let circle = scene.entities().map(|(entity, _)| entity).next().expect("circle");
        assert_eq!(circle.position(), Vector2::new(95.0, 40.0));
    }

    #[test]
    fn behaviors_run_on_tick() {
        let mut scene = scene_from(MANIFEST);

        scene.step();
        scene.step();

        let spinner = scene
            .entities()
            .map(|(entity, _)| entity)
            .find(|entity| entity.has_behavior())
            .expect("spinner");
        assert_eq!(spinner.angle(), 30.0);
    }

    #[test]
    fn tick_draws_the_red_square() {
        let mut scene = scene_from(MANIFEST);

        scene.step();

        assert!(scene
            .surface()
            .calls()
            .iter()
            .any(|call| *call == DrawCall::FillRect {
                x: 10.0,
                y: 10.0,
                width: 8.0,
                height: 8.0
            }));
    }

    #[test]
    fn incomplete_model_is_rejected() {
        let raw = r#"{ "entities": [ { "model": { "kind": "square", "width": 1 } } ] }"#;
        assert!(parse_manifest_json(raw).is_err());
    }
}
