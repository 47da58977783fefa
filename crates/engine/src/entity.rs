use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tracing::debug;

use crate::event::{Cancellable, Listeners, MoveEvent};
use crate::math::Vector2;
use crate::model::{Model, ModelKind};
use crate::scene::Scene;
use crate::surface::{Surface, SurfaceSize};

/// Motion components smaller than this in magnitude are snapped to zero at the start of a tick.
pub const MOTION_SNAP_EPSILON: f64 = 1e-5;
/// Each tick moves an entity by `motion / MOTION_DECAY_DIVISOR` and removes that step from motion.
pub const MOTION_DECAY_DIVISOR: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(0);

/// Hands out entity ids from one process-wide counter.
///
/// Every allocator draws from the same sequence, so ids stay unique when entities move between
/// scenes or are built outside any scene.
#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    allocated: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let next = NEXT_ENTITY_ID
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |next| {
                Some(next.saturating_add(1))
            })
            .unwrap_or_else(|current| current);
        self.allocated = self.allocated.saturating_add(1);
        EntityId(next)
    }

    /// Number of ids this allocator has handed out.
    pub fn allocated(&self) -> u64 {
        self.allocated
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EntityError {
    #[error("entity requires a model")]
    MissingModel,
}

/// Construction payload for [`Entity::new`].
#[derive(Debug, Clone, Default)]
pub struct EntityData {
    position: Vector2,
    motion: Vector2,
    angle: f64,
    model: Option<Model>,
}

impl EntityData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_x(mut self, x: f64) -> Self {
        self.position.x = x;
        self
    }

    pub fn with_y(mut self, y: f64) -> Self {
        self.position.y = y;
        self
    }

    pub fn with_position(mut self, position: impl Into<Vector2>) -> Self {
        self.position = position.into();
        self
    }

    pub fn with_motion(mut self, motion: impl Into<Vector2>) -> Self {
        self.motion = motion.into();
        self
    }

    pub fn with_angle(mut self, angle: f64) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_model(mut self, model: impl Into<Model>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn position(&self) -> Vector2 {
        self.position
    }

    pub fn motion(&self) -> Vector2 {
        self.motion
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }
}

/// Side of the surface an entity is touching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BorderSide {
    Left,
    Up,
    Right,
    Down,
}

/// Axis-aligned box `[left, right) x [top, bottom)` covered by an entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// What a collision test is run against.
#[derive(Debug, Clone, Copy)]
pub enum CollisionTarget<'a> {
    Entity(&'a Entity),
    Point(Vector2),
}

impl CollisionTarget<'_> {
    pub fn position(&self) -> Vector2 {
        match self {
            CollisionTarget::Entity(entity) => entity.position(),
            CollisionTarget::Point(point) => *point,
        }
    }
}

impl<'a> From<&'a Entity> for CollisionTarget<'a> {
    fn from(entity: &'a Entity) -> Self {
        CollisionTarget::Entity(entity)
    }
}

impl From<Vector2> for CollisionTarget<'_> {
    fn from(point: Vector2) -> Self {
        CollisionTarget::Point(point)
    }
}

/// Per-tick custom behaviour attached to an entity.
///
/// Runs after the built-in motion step of every tick the entity is updated in. The entity is
/// passed mutably, so a behaviour may move it, change its motion or close it.
pub trait Behavior {
    fn on_update(&mut self, entity: &mut Entity, tick: u64, bounds: SurfaceSize) -> bool;
}

impl<F> Behavior for F
where
    F: FnMut(&mut Entity, u64, SurfaceSize) -> bool,
{
    fn on_update(&mut self, entity: &mut Entity, tick: u64, bounds: SurfaceSize) -> bool {
        self(entity, tick, bounds)
    }
}

/// A positioned, possibly moving object with a model.
///
/// Entities start closed; a scene opens them when they are added. Move listeners are owned by
/// the entity and are not carried over by [`Entity::clone_entity`].
pub struct Entity {
    id: EntityId,
    position: Vector2,
    motion: Vector2,
    angle: f64,
    closed: bool,
    model: Model,
    move_listeners: Listeners<MoveEvent>,
    behavior: Option<Box<dyn Behavior>>,
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("position", &self.position)
            .field("motion", &self.motion)
            .field("angle", &self.angle)
            .field("closed", &self.closed)
            .field("model", &self.model)
            .field("move_listeners", &self.move_listeners)
            .field("has_behavior", &self.behavior.is_some())
            .finish()
    }
}

impl Entity {
    pub fn new(data: EntityData, ids: &mut EntityIdAllocator) -> Result<Self, EntityError> {
        let model = data.model.ok_or(EntityError::MissingModel)?;
        Ok(Self {
            id: ids.allocate(),
            position: data.position,
            motion: data.motion,
            angle: data.angle,
            closed: true,
            model,
            move_listeners: Listeners::default(),
            behavior: None,
        })
    }

    pub fn with_behavior(mut self, behavior: impl Behavior + 'static) -> Self {
        self.behavior = Some(Box::new(behavior));
        self
    }

    pub fn set_behavior(&mut self, behavior: Option<Box<dyn Behavior>>) -> &mut Self {
        self.behavior = behavior;
        self
    }

    pub fn has_behavior(&self) -> bool {
        self.behavior.is_some()
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn x(&self) -> f64 {
        self.position.x
    }

    pub fn y(&self) -> f64 {
        self.position.y
    }

    pub fn position(&self) -> Vector2 {
        self.position
    }

    /// Places the entity without raising a move event.
    pub fn set_position(&mut self, position: impl Into<Vector2>) -> &mut Self {
        self.position = position.into();
        self
    }

    pub fn motion(&self) -> Vector2 {
        self.motion
    }

    pub fn set_motion(&mut self, motion: impl Into<Vector2>) -> &mut Self {
        self.motion = motion.into();
        self
    }

    pub fn add_motion(&mut self, impulse: impl Into<Vector2>) -> &mut Self {
        self.motion.add(impulse);
        self
    }

    /// Facing in degrees, clockwise from +x.
    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn set_angle(&mut self, angle: f64) -> &mut Self {
        self.angle = angle;
        self
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    pub fn width(&self) -> f64 {
        self.model.width()
    }

    pub fn height(&self) -> f64 {
        self.model.height()
    }

    pub fn bounding_box(&self) -> Rect {
        Rect {
            left: self.position.x,
            top: self.position.y,
            right: self.position.x + self.width(),
            bottom: self.position.y + self.height(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Closes the entity; closed entities are skipped by scene ticks.
    pub fn close(&mut self) -> &mut Self {
        self.closed = true;
        self
    }

    pub(crate) fn set_closed(&mut self, closed: bool) {
        self.closed = closed;
    }

    /// Registers a listener for move attempts made through [`Entity::move_by`].
    pub fn on_move<F>(&mut self, listener: F) -> &mut Self
    where
        F: FnMut(&mut MoveEvent) + 'static,
    {
        self.move_listeners.register(listener);
        self
    }

    pub fn move_listener_count(&self) -> usize {
        self.move_listeners.len()
    }

    /// Turns the entity to face `point`. The resulting angle is in `[0, 360)`.
    pub fn look_at(&mut self, point: impl Into<Vector2>) -> &mut Self {
        let point = point.into();
        let angle = (point.y - self.position.y).atan2(point.x - self.position.x) / PI * 180.0;
        self.angle = if angle < 0.0 { angle + 360.0 } else { angle };
        self
    }

    /// Unit vector pointing along the current angle.
    pub fn direction(&self) -> Vector2 {
        let theta = (self.angle - 90.0) * PI / 180.0 - FRAC_PI_2;
        Vector2::new(-theta.cos(), -theta.sin())
    }

    /// Tests the entity against another entity or a point.
    ///
    /// A model-supplied predicate decides on its own. Otherwise entities overlap when their
    /// inclusive pixel boxes `[x, x + w - 1] x [y, y + h - 1]` intersect, and a point hits when it
    /// lies within `[x, x + w] x [y, y + h]`.
    pub fn collides<'a>(&self, target: impl Into<CollisionTarget<'a>>) -> bool {
        let target = target.into();
        if let Some(predicate) = self.model.collision_predicate() {
            return predicate(self, target);
        }

        let (x, y) = (self.position.x, self.position.y);
        let (width, height) = (self.width(), self.height());
        match target {
            CollisionTarget::Entity(other) => {
                let (ox, oy) = (other.x(), other.y());
                let (ow, oh) = (other.width(), other.height());
                ox + ow - 1.0 >= x
                    && ox <= x + width - 1.0
                    && oy <= y + height - 1.0
                    && oy + oh - 1.0 >= y
            }
            CollisionTarget::Point(point) => {
                point.x >= x && point.x <= x + width && point.y >= y && point.y <= y + height
            }
        }
    }

    pub fn contains_point(&self, point: impl Into<Vector2>) -> bool {
        self.collides(CollisionTarget::Point(point.into()))
    }

    /// Ids of the open scene entities that report a collision with this entity, in scene
    /// insertion order.
    ///
    /// The entity itself is excluded. `filter` keeps only entities whose model kind is listed.
    pub fn colliding_entities<S: Surface>(
        &self,
        scene: &Scene<S>,
        filter: Option<&[ModelKind]>,
    ) -> Vec<EntityId> {
        scene
            .entities()
            .map(|(other, _)| other)
            .filter(|other| other.id != self.id && !other.closed)
            .filter(|other| filter.map_or(true, |kinds| kinds.contains(&other.model.kind())))
            .filter(|other| other.collides(self))
            .map(|other| other.id)
            .collect()
    }

    fn border_probes(&self, bounds: SurfaceSize) -> [(BorderSide, Vector2); 4] {
        let (x, y) = (self.position.x, self.position.y);
        [
            (BorderSide::Left, Vector2::new(0.0, y)),
            (BorderSide::Up, Vector2::new(x, 0.0)),
            (BorderSide::Right, Vector2::new(bounds.width - 1.0, y)),
            (BorderSide::Down, Vector2::new(x, bounds.height - 1.0)),
        ]
    }

    /// First border the entity touches, checked left, up, right then down.
    pub fn near_border(&self, bounds: SurfaceSize) -> Option<BorderSide> {
        self.border_probes(bounds)
            .into_iter()
            .find(|(_, probe)| self.contains_point(*probe))
            .map(|(side, _)| side)
    }

    pub fn is_near_border(&self, bounds: SurfaceSize) -> bool {
        self.near_border(bounds).is_some()
    }

    /// Clamps the entity inside the surface. Returns true when the position changed.
    ///
    /// No move event is raised.
    pub fn prevent_border(&mut self, bounds: SurfaceSize) -> bool {
        let before = self.position;
        let (width, height) = (self.width(), self.height());
        if self.position.x < 0.0 {
            self.position.x = 0.0;
        }
        if self.position.y < 0.0 {
            self.position.y = 0.0;
        }
        if self.position.x + width > bounds.width {
            self.position.x = bounds.width - width;
        }
        if self.position.y + height > bounds.height {
            self.position.y = bounds.height - height;
        }
        self.position != before
    }

    /// Attempts to move by `(dx, dy)`.
    ///
    /// Zero displacement returns false without raising an event. Otherwise move listeners run in
    /// registration order and may rewrite the target; if any of them cancels, the entity stays
    /// put and false is returned.
    pub fn move_by(&mut self, dx: f64, dy: f64) -> bool {
        let from = self.position;
        let to = from.offset(dx, dy);
        if to == from {
            return false;
        }

        let mut event = MoveEvent::new(self.id, from, to);
        self.move_listeners.dispatch(&mut event);
        if event.is_cancelled() {
            return false;
        }

        self.position = event.to;
        true
    }

    /// Per-tick step: snap tiny motion to zero, move by a tenth of the motion, decay it, then run
    /// the attached behaviour. Returns the behaviour's result, false without one.
    pub fn on_update(&mut self, tick: u64, bounds: SurfaceSize) -> bool {
        if self.motion.x.abs() < MOTION_SNAP_EPSILON {
            self.motion.x = 0.0;
        }
        if self.motion.y.abs() < MOTION_SNAP_EPSILON {
            self.motion.y = 0.0;
        }

        let dx = self.motion.x / MOTION_DECAY_DIVISOR;
        let dy = self.motion.y / MOTION_DECAY_DIVISOR;
        self.move_by(dx, dy);
        self.motion.x -= dx;
        self.motion.y -= dy;

        let Some(mut behavior) = self.behavior.take() else {
            return false;
        };
        let handled = behavior.on_update(self, tick, bounds);
        if self.behavior.is_none() {
            self.behavior = Some(behavior);
        }
        handled
    }

    /// Snapshot of this entity's state under a fresh id.
    ///
    /// Position, motion, angle, closed flag and a copy of the model carry over; a pending image
    /// load stays shared with the original. Move listeners are not copied. `behavior` replaces
    /// whatever behaviour the original has.
    pub fn clone_entity(
        &self,
        ids: &mut EntityIdAllocator,
        behavior: Option<Box<dyn Behavior>>,
    ) -> Entity {
        let clone = Entity {
            id: ids.allocate(),
            position: self.position,
            motion: self.motion,
            angle: self.angle,
            closed: self.closed,
            model: self.model.clone(),
            move_listeners: Listeners::default(),
            behavior,
        };
        debug!(source = self.id.0, clone = clone.id.0, "entity_cloned");
        clone
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::model::ShapeModel;

    fn square_at(ids: &mut EntityIdAllocator, x: f64, y: f64, size: f64) -> Entity {
        Entity::new(
            EntityData::new()
                .with_position((x, y))
                .with_model(Model::square(size, size)),
            ids,
        )
        .expect("entity")
    }

    #[test]
    fn separate_allocators_never_hand_out_the_same_id() {
        let mut first = EntityIdAllocator::default();
        let mut second = EntityIdAllocator::default();

        let a = first.allocate();
        let b = second.allocate();
        let c = first.allocate();

        assert_ne!(a, b);
        assert!(a < c && b != c);
        assert_eq!((first.allocated(), second.allocated()), (2, 1));
    }

    #[test]
    fn missing_model_is_rejected() {
        let mut ids = EntityIdAllocator::default();
        let result = Entity::new(EntityData::new().with_x(1.0), &mut ids);
        assert_eq!(result.err(), Some(EntityError::MissingModel));
    }

    #[test]
    fn builder_fields_flow_into_entity() {
        let mut ids = EntityIdAllocator::default();
        let entity = Entity::new(
            EntityData::new()
                .with_x(3.0)
                .with_y(4.0)
                .with_motion((1.0, -1.0))
                .with_angle(30.0)
                .with_model(Model::square(2.0, 5.0)),
            &mut ids,
        )
        .expect("entity");

        assert_eq!(entity.position(), Vector2::new(3.0, 4.0));
        assert_eq!(entity.motion(), Vector2::new(1.0, -1.0));
        assert_eq!(entity.angle(), 30.0);
        assert_eq!((entity.width(), entity.height()), (2.0, 5.0));
        assert!(entity.is_closed());
    }

    #[test]
    fn bounding_box_spans_model_size() {
        let mut ids = EntityIdAllocator::default();
        let entity = square_at(&mut ids, 2.0, 3.0, 4.0);
        let rect = entity.bounding_box();

        assert_eq!((rect.left, rect.top, rect.right, rect.bottom), (2.0, 3.0, 6.0, 7.0));
        assert_eq!((rect.width(), rect.height()), (4.0, 4.0));
    }

    #[test]
    fn ids_are_unique_per_allocator() {
        let mut ids = EntityIdAllocator::default();
        let a = square_at(&mut ids, 0.0, 0.0, 1.0);
        let b = square_at(&mut ids, 0.0, 0.0, 1.0);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn look_at_normalizes_into_full_turn() {
        let mut ids = EntityIdAllocator::default();
        let mut entity = square_at(&mut ids, 0.0, 0.0, 1.0);

        entity.look_at((1.0, 0.0));
        assert_eq!(entity.angle(), 0.0);
        entity.look_at((0.0, 1.0));
        assert_eq!(entity.angle(), 90.0);
        entity.look_at((0.0, -1.0));
        assert_eq!(entity.angle(), 270.0);
        entity.look_at((-1.0, 0.0));
        assert_eq!(entity.angle(), 180.0);
    }

    #[test]
    fn direction_points_along_angle() {
        let mut ids = EntityIdAllocator::default();
        let mut entity = square_at(&mut ids, 0.0, 0.0, 1.0);

        let east = entity.direction();
        assert!((east.x - 1.0).abs() < 1e-9 && east.y.abs() < 1e-9);

        entity.set_angle(90.0);
        let south = entity.direction();
        assert!(south.x.abs() < 1e-9 && (south.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn boxes_overlap_on_shared_pixel_only() {
        let mut ids = EntityIdAllocator::default();
        let a = square_at(&mut ids, 0.0, 0.0, 10.0);
        let touching = square_at(&mut ids, 9.0, 9.0, 10.0);
        let adjacent = square_at(&mut ids, 10.0, 0.0, 10.0);

        assert!(a.collides(&touching));
        assert!(touching.collides(&a));
        assert!(!a.collides(&adjacent));
    }

    #[test]
    fn separated_boxes_do_not_collide() {
        let mut ids = EntityIdAllocator::default();
        let a = square_at(&mut ids, 0.0, 0.0, 10.0);
        let far = square_at(&mut ids, 11.0, 11.0, 5.0);

        assert!(!a.collides(&far));
        assert!(!far.collides(&a));
    }

    #[test]
    fn prevent_border_clamps_both_horizontal_edges() {
        let mut ids = EntityIdAllocator::default();
        let bounds = SurfaceSize::new(200.0, 200.0);
        let mut left = square_at(&mut ids, -5.0, 20.0, 10.0);
        let mut right = square_at(&mut ids, 195.0, 20.0, 10.0);

        assert!(left.prevent_border(bounds));
        assert!(right.prevent_border(bounds));
        assert_eq!(left.x(), 0.0);
        assert_eq!(right.x(), 190.0);
    }

    #[test]
    fn point_test_includes_far_edges() {
        let mut ids = EntityIdAllocator::default();
        let a = square_at(&mut ids, 0.0, 0.0, 10.0);

        assert!(a.contains_point((10.0, 10.0)));
        assert!(a.contains_point((0.0, 0.0)));
        assert!(!a.contains_point((10.5, 3.0)));
    }

    #[test]
    fn circle_model_overrides_box_test() {
        let mut ids = EntityIdAllocator::default();
        let circle = Entity::new(
            EntityData::new()
                .with_position((20.0, 20.0))
                .with_model(Model::circle(5.0)),
            &mut ids,
        )
        .expect("entity");
        let near = square_at(&mut ids, 23.0, 24.0, 1.0);
        let inside_box_only = square_at(&mut ids, 28.0, 28.0, 1.0);

        assert!(circle.collides(&near));
        assert!(!circle.collides(&inside_box_only));
        assert!(!circle.contains_point((24.0, 24.0)));
    }

    #[test]
    fn near_border_reports_first_touched_side() {
        let mut ids = EntityIdAllocator::default();
        let bounds = SurfaceSize::new(100.0, 50.0);

        assert_eq!(
            square_at(&mut ids, 0.0, 20.0, 5.0).near_border(bounds),
            Some(BorderSide::Left)
        );
        assert_eq!(
            square_at(&mut ids, 20.0, 0.0, 5.0).near_border(bounds),
            Some(BorderSide::Up)
        );
        assert_eq!(
            square_at(&mut ids, 95.0, 20.0, 5.0).near_border(bounds),
            Some(BorderSide::Right)
        );
        assert_eq!(
            square_at(&mut ids, 20.0, 45.0, 5.0).near_border(bounds),
            Some(BorderSide::Down)
        );
        assert_eq!(
            square_at(&mut ids, 0.0, 0.0, 5.0).near_border(bounds),
            Some(BorderSide::Left)
        );
        assert_eq!(
            square_at(&mut ids, 95.0, 45.0, 5.0).near_border(bounds),
            Some(BorderSide::Right)
        );
        let centred = square_at(&mut ids, 40.0, 20.0, 5.0);
        assert_eq!(centred.near_border(bounds), None);
        assert!(!centred.is_near_border(bounds));
    }

    #[test]
    fn prevent_border_clamps_into_surface() {
        let mut ids = EntityIdAllocator::default();
        let bounds = SurfaceSize::new(100.0, 50.0);

        let mut escaped = square_at(&mut ids, -4.0, 48.0, 10.0);
        assert!(escaped.prevent_border(bounds));
        assert_eq!(escaped.position(), Vector2::new(0.0, 40.0));

        let mut inside = square_at(&mut ids, 10.0, 10.0, 10.0);
        assert!(!inside.prevent_border(bounds));
        assert_eq!(inside.position(), Vector2::new(10.0, 10.0));
    }

    #[test]
    fn move_listeners_may_redirect_the_move() {
        let mut ids = EntityIdAllocator::default();
        let mut entity = square_at(&mut ids, 0.0, 0.0, 1.0);
        entity.on_move(|event| event.to = Vector2::new(7.0, 7.0));

        assert!(entity.move_by(1.0, 0.0));
        assert_eq!(entity.position(), Vector2::new(7.0, 7.0));
    }

    #[test]
    fn cancelled_move_leaves_position_and_still_runs_later_listeners() {
        let mut ids = EntityIdAllocator::default();
        let mut entity = square_at(&mut ids, 2.0, 2.0, 1.0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let first = Rc::clone(&seen);
        let second = Rc::clone(&seen);
        entity
            .on_move(move |event| {
                first.borrow_mut().push("first");
                event.cancel();
            })
            .on_move(move |_| second.borrow_mut().push("second"));

        assert!(!entity.move_by(1.0, 1.0));
        assert_eq!(entity.position(), Vector2::new(2.0, 2.0));
        assert_eq!(*seen.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn zero_move_raises_no_event() {
        let mut ids = EntityIdAllocator::default();
        let mut entity = square_at(&mut ids, 0.0, 0.0, 1.0);
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        entity.on_move(move |_| *counter.borrow_mut() += 1);

        assert!(!entity.move_by(0.0, 0.0));
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn motion_moves_a_tenth_and_decays() {
        let mut ids = EntityIdAllocator::default();
        let mut entity = square_at(&mut ids, 0.0, 0.0, 1.0);
        entity.set_motion((10.0, 0.0));
        let bounds = SurfaceSize::new(100.0, 100.0);

        entity.on_update(0, bounds);
        assert_eq!(entity.x(), 1.0);
        assert_eq!(entity.motion().x, 9.0);

        let mut ticks = 1;
        while entity.motion().x != 0.0 && ticks < 500 {
            entity.on_update(ticks, bounds);
            ticks += 1;
        }
        assert_eq!(entity.motion().x, 0.0);
        let settled = entity.x();
        entity.on_update(ticks, bounds);
        assert_eq!(entity.x(), settled);
        assert!((settled - 10.0).abs() < 1e-3);
    }

    #[test]
    fn negative_tiny_motion_also_snaps() {
        let mut ids = EntityIdAllocator::default();
        let mut entity = square_at(&mut ids, 5.0, 5.0, 1.0);
        entity.set_motion((-1e-6, 2e-6));

        entity.on_update(0, SurfaceSize::new(10.0, 10.0));

        assert_eq!(entity.motion(), Vector2::ZERO);
        assert_eq!(entity.position(), Vector2::new(5.0, 5.0));
    }

    #[test]
    fn add_motion_accumulates_impulses() {
        let mut ids = EntityIdAllocator::default();
        let mut entity = square_at(&mut ids, 0.0, 0.0, 1.0);
        entity.add_motion((1.0, 2.0)).add_motion((3.0, -4.0));
        assert_eq!(entity.motion(), Vector2::new(4.0, -2.0));
    }

    #[test]
    fn behavior_runs_after_motion_step() {
        let mut ids = EntityIdAllocator::default();
        let mut entity = square_at(&mut ids, 0.0, 0.0, 1.0)
            .with_behavior(|entity: &mut Entity, tick: u64, _bounds: SurfaceSize| {
                entity.set_angle(entity.x() + tick as f64);
                true
            });
        entity.set_motion((10.0, 0.0));

        assert!(entity.on_update(2, SurfaceSize::new(10.0, 10.0)));
        assert_eq!(entity.angle(), 3.0);
        assert!(entity.has_behavior());
    }

    #[test]
    fn clone_entity_copies_state_under_new_id() {
        let mut ids = EntityIdAllocator::default();
        let mut original = Entity::new(
            EntityData::new()
                .with_position((4.0, 5.0))
                .with_motion((1.0, 1.0))
                .with_angle(45.0)
                .with_model(Model::Square(ShapeModel::new(3.0, 3.0))),
            &mut ids,
        )
        .expect("entity");
        original.on_move(|_| {});

        let clone = original.clone_entity(&mut ids, None);

        assert_ne!(clone.id(), original.id());
        assert_eq!(clone.position(), original.position());
        assert_eq!(clone.motion(), original.motion());
        assert_eq!(clone.angle(), original.angle());
        assert_eq!(clone.is_closed(), original.is_closed());
        assert_eq!(clone.move_listener_count(), 0);
        assert!(!clone.has_behavior());

        original.set_position((0.0, 0.0));
        assert_eq!(clone.position(), Vector2::new(4.0, 5.0));
    }
}
