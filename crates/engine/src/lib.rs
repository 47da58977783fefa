pub mod app;
pub mod clock;
pub mod config;
pub mod entity;
pub mod event;
pub mod images;
pub mod math;
pub mod metrics;
pub mod model;
pub mod scene;
pub mod surface;

pub use app::{run_app, AppError, LoopConfig};
pub use clock::{StepPlan, TickClock};
pub use config::{ConfigError, LifecyclePolicy, SceneConfig};
pub use entity::{
    Behavior, BorderSide, CollisionTarget, Entity, EntityData, EntityError, EntityId,
    EntityIdAllocator, Rect, MOTION_DECAY_DIVISOR, MOTION_SNAP_EPSILON,
};
pub use event::{Cancellable, EventKind, Listeners, MoveEvent, SetRunningEvent};
pub use images::{
    Bitmap, BitmapError, BitmapSlot, FileImageLoader, ImageLoadError, ImageLoader, ImageRequest,
};
pub use math::Vector2;
pub use metrics::FpsCounter;
pub use model::{
    CollisionPredicate, GlyphMetrics, ImageModel, Model, ModelKind, ShapeModel, TextMetrics,
    TextModel,
};
pub use scene::{PollOutcome, Scene};
pub use surface::{
    rotate_about_center, Color, ColorError, DrawCall, PixelSurface, RecordingSurface, Surface,
    SurfaceSize, TextAlign, TransformGuard,
};
