use tickscene::{Behavior, BorderSide, Entity, Model, SurfaceSize, Vector2};

use super::manifest::BehaviorSpec;

pub(crate) fn behavior_from_spec(spec: &BehaviorSpec) -> Box<dyn Behavior> {
    match spec {
        BehaviorSpec::Drift { impulse } => Box::new(Drift::new(*impulse)),
        BehaviorSpec::Spin { degrees_per_tick } => Box::new(Spin::new(*degrees_per_tick)),
        BehaviorSpec::TickCounter { prefix } => Box::new(TickCounter::new(prefix.clone())),
    }
}

/// Smallest and largest positions that keep the entity's drawn shape inside `bounds`.
///
/// Circles are drawn centred on their position, every other model hangs right and down from it.
pub(crate) fn travel_range(entity: &Entity, bounds: SurfaceSize) -> (Vector2, Vector2) {
    let (min, max) = match entity.model() {
        Model::Circle(shape) => {
            let radius = shape.radius();
            (
                Vector2::new(radius, radius),
                Vector2::new(bounds.width - radius, bounds.height - radius),
            )
        }
        _ => (
            Vector2::ZERO,
            Vector2::new(bounds.width - entity.width(), bounds.height - entity.height()),
        ),
    };
    (min, Vector2::new(max.x.max(min.x), max.y.max(min.y)))
}

fn keep_inside(entity: &mut Entity, bounds: SurfaceSize) {
    if !matches!(entity.model(), Model::Circle(_)) {
        entity.prevent_border(bounds);
        return;
    }
    let (min, max) = travel_range(entity, bounds);
    let position = entity.position();
    entity.set_position((position.x.clamp(min.x, max.x), position.y.clamp(min.y, max.y)));
}

/// Pushes the entity every tick and bounces the push off the surface edges.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Drift {
    impulse: Vector2,
}

impl Drift {
    pub(crate) fn new(impulse: Vector2) -> Self {
        Self { impulse }
    }

    fn bounce(&mut self, entity: &mut Entity, side: BorderSide) {
        let mut motion = entity.motion();
        match side {
            BorderSide::Left => {
                self.impulse.x = self.impulse.x.abs();
                motion.x = motion.x.abs();
            }
            BorderSide::Right => {
                self.impulse.x = -self.impulse.x.abs();
                motion.x = -motion.x.abs();
            }
            BorderSide::Up => {
                self.impulse.y = self.impulse.y.abs();
                motion.y = motion.y.abs();
            }
            BorderSide::Down => {
                self.impulse.y = -self.impulse.y.abs();
                motion.y = -motion.y.abs();
            }
        }
        entity.set_motion(motion);
    }
}

impl Behavior for Drift {
    fn on_update(&mut self, entity: &mut Entity, _tick: u64, bounds: SurfaceSize) -> bool {
        keep_inside(entity, bounds);
        if let Some(side) = entity.near_border(bounds) {
            self.bounce(entity, side);
        }
        entity.add_motion(self.impulse);
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Spin {
    degrees_per_tick: f64,
}

impl Spin {
    pub(crate) fn new(degrees_per_tick: f64) -> Self {
        Self { degrees_per_tick }
    }
}

impl Behavior for Spin {
    fn on_update(&mut self, entity: &mut Entity, _tick: u64, _bounds: SurfaceSize) -> bool {
        let angle = (entity.angle() + self.degrees_per_tick).rem_euclid(360.0);
        entity.set_angle(angle);
        true
    }
}

/// Appends a `"{prefix}{tick}"` line under the text the entity started with.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TickCounter {
    prefix: String,
    heading: Option<String>,
}

impl TickCounter {
    pub(crate) fn new(prefix: String) -> Self {
        Self {
            prefix,
            heading: None,
        }
    }
}

impl Behavior for TickCounter {
    fn on_update(&mut self, entity: &mut Entity, tick: u64, _bounds: SurfaceSize) -> bool {
        let Model::Text(text) = entity.model_mut() else {
            return false;
        };
        let heading = self
            .heading
            .get_or_insert_with(|| text.text().to_string());
        let line = format!("{}{}", self.prefix, tick);
        if heading.is_empty() {
            text.set_text(line);
        } else {
            text.set_text(format!("{heading}\n{line}"));
        }
        true
    }
}
