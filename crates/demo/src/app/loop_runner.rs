use std::process::ExitCode;

use tickscene::run_app;
use tracing::error;

use super::bootstrap::{build_scene, AppWiring};

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring { config, manifest } = app;
    let result = run_app(config, |surface, scene_config| {
        build_scene(surface, scene_config, &manifest)
    });
    if let Err(err) = result {
        error!(error = %err, "startup_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
