use std::error::Error as StdError;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::clock::normalize_non_zero_duration;
use crate::config::SceneConfig;
use crate::scene::Scene;
use crate::surface::PixelSurface;

use super::presenter::FramePresenter;

const DEFAULT_MAX_FRAME_DELTA: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    /// Also the size of the scene's drawing surface.
    pub window_width: u32,
    pub window_height: u32,
    /// Longer gaps between frames are clamped before they reach the scene.
    pub max_frame_delta: Duration,
    pub scene: SceneConfig,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "tickscene".to_string(),
            window_width: 640,
            window_height: 480,
            max_frame_delta: DEFAULT_MAX_FRAME_DELTA,
            scene: SceneConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to set up scene: {0}")]
    SceneSetup(#[source] Box<dyn StdError + Send + Sync>),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostCommand {
    Quit,
    ToggleRunning,
}

/// Opens a window and drives a scene from wall-clock time until the window closes.
///
/// `build_scene` receives a blank surface sized to the window and the scene config. Escape or
/// closing the window quits; Space asks the scene to toggle its run state.
pub fn run_app<F, E>(config: LoopConfig, build_scene: F) -> Result<(), AppError>
where
    F: FnOnce(PixelSurface, SceneConfig) -> Result<Scene<PixelSurface>, E>,
    E: Into<Box<dyn StdError + Send + Sync>>,
{
    let surface = PixelSurface::new(config.window_width, config.window_height);
    let mut scene = build_scene(surface, config.scene.clone())
        .map_err(|error| AppError::SceneSetup(error.into()))?;
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, DEFAULT_MAX_FRAME_DELTA);

    info!(
        window_width = config.window_width,
        window_height = config.window_height,
        tick_period_ms = config.scene.tick_period_ms,
        max_ticks_per_poll = config.scene.max_ticks_per_poll,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        entity_count = scene.len(),
        "loop_config"
    );

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut presenter = FramePresenter::new(
        Arc::clone(&window),
        config.window_width,
        config.window_height,
    )
    .map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);
    let mut last_frame_instant = Instant::now();

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(error) = presenter.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    if let Err(error) = presenter.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    match host_command(event.physical_key, event.state, event.repeat) {
                        Some(HostCommand::Quit) => {
                            info!(reason = "escape_key", "shutdown_requested");
                            window_target.exit();
                        }
                        Some(HostCommand::ToggleRunning) => {
                            let requested = !scene.is_running();
                            scene.set_running(requested);
                        }
                        None => {}
                    }
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;

                    let outcome = scene.poll(clamp_frame_delta(raw_frame_dt, max_frame_delta));
                    if let Some(fps) = outcome.fps_sample {
                        info!(
                            fps,
                            ticks = scene.ticks(),
                            entity_count = scene.len(),
                            running = scene.is_running(),
                            "loop_metrics"
                        );
                    }

                    if let Err(error) = presenter.present(scene.surface()) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                info!(ticks = scene.ticks(), "shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

fn host_command(key: PhysicalKey, state: ElementState, repeat: bool) -> Option<HostCommand> {
    if state != ElementState::Pressed || repeat {
        return None;
    }
    match key {
        PhysicalKey::Code(KeyCode::Escape) => Some(HostCommand::Quit),
        PhysicalKey::Code(KeyCode::Space) => Some(HostCommand::ToggleRunning),
        _ => None,
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}
