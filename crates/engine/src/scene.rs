use std::fmt;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::clock::TickClock;
use crate::config::{LifecyclePolicy, SceneConfig};
use crate::entity::{Behavior, Entity, EntityData, EntityError, EntityId, EntityIdAllocator};
use crate::event::{Cancellable, Listeners, SetRunningEvent};
use crate::images::{FileImageLoader, ImageLoader};
use crate::metrics::FpsCounter;
use crate::model::ModelKind;
use crate::surface::{rotate_about_center, Surface, SurfaceSize};

#[derive(Debug)]
struct TrackedEntity {
    entity: Entity,
    priority: i32,
}

/// Result of one [`Scene::poll`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollOutcome {
    pub ticks_run: u32,
    /// New fps value when this poll closed a sampling window.
    pub fps_sample: Option<u32>,
}

/// Owns the tracked entities and drives them against a drawing surface.
///
/// Every tick clears the surface, then updates and renders each open entity in turn, highest
/// priority first. Entities with equal priority keep the order they were added in.
pub struct Scene<S: Surface> {
    surface: S,
    images: Box<dyn ImageLoader>,
    ids: EntityIdAllocator,
    entities: Vec<TrackedEntity>,
    config: SceneConfig,
    running: bool,
    ticks: u64,
    clock: TickClock,
    fps: FpsCounter,
    run_listeners: Listeners<SetRunningEvent>,
}

impl<S: Surface> fmt::Debug for Scene<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("width", &self.surface.width())
            .field("height", &self.surface.height())
            .field("entities", &self.entities.len())
            .field("running", &self.running)
            .field("ticks", &self.ticks)
            .field("fps", &self.fps.fps())
            .finish_non_exhaustive()
    }
}

impl<S: Surface> Scene<S> {
    pub fn new(surface: S, config: SceneConfig) -> Self {
        Self {
            surface,
            images: Box::new(FileImageLoader::default()),
            ids: EntityIdAllocator::default(),
            entities: Vec::new(),
            running: config.start_running,
            ticks: 0,
            clock: TickClock::new(config.tick_period(), config.max_ticks_per_poll),
            fps: FpsCounter::new(config.fps_window()),
            run_listeners: Listeners::default(),
            config,
        }
    }

    pub fn with_image_loader(mut self, loader: impl ImageLoader + 'static) -> Self {
        self.images = Box::new(loader);
        self
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn size(&self) -> SurfaceSize {
        self.surface.size()
    }

    pub fn image_loader(&self) -> &dyn ImageLoader {
        self.images.as_ref()
    }

    /// Builds an entity with an id from this scene's allocator. The entity is not added.
    pub fn create_entity(&mut self, data: EntityData) -> Result<Entity, EntityError> {
        Entity::new(data, &mut self.ids)
    }

    /// Creates an entity and adds it, at the default priority when `priority` is `None`.
    pub fn spawn(
        &mut self,
        data: EntityData,
        priority: Option<i32>,
    ) -> Result<EntityId, EntityError> {
        let entity = self.create_entity(data)?;
        let priority = priority.unwrap_or(self.config.default_priority);
        Ok(self.add_entity_with_priority(entity, priority))
    }

    pub fn add_entity(&mut self, entity: Entity) -> EntityId {
        let priority = self.config.default_priority;
        self.add_entity_with_priority(entity, priority)
    }

    /// Opens the entity and tracks it after every entity already in the scene.
    pub fn add_entity_with_priority(&mut self, mut entity: Entity, priority: i32) -> EntityId {
        let id = entity.id();
        entity.set_closed(false);
        self.entities.push(TrackedEntity { entity, priority });
        id
    }

    /// Stops tracking the entity and hands it back. Unknown ids are ignored.
    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        let index = self.index_of(id)?;
        let mut entity = self.entities.remove(index).entity;
        match self.config.lifecycle {
            LifecyclePolicy::CloseOnRemove => entity.set_closed(true),
            LifecyclePolicy::ReopenOnRemove => entity.set_closed(false),
        }
        Some(entity)
    }

    /// Changes the priority of a tracked entity. Returns false for unknown ids.
    pub fn set_entity_priority(&mut self, id: EntityId, priority: i32) -> bool {
        match self.entities.iter_mut().find(|tracked| tracked.entity.id() == id) {
            Some(tracked) => {
                tracked.priority = priority;
                true
            }
            None => false,
        }
    }

    pub fn priority(&self, id: EntityId) -> Option<i32> {
        self.entities
            .iter()
            .find(|tracked| tracked.entity.id() == id)
            .map(|tracked| tracked.priority)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities
            .iter()
            .find(|tracked| tracked.entity.id() == id)
            .map(|tracked| &tracked.entity)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities
            .iter_mut()
            .find(|tracked| tracked.entity.id() == id)
            .map(|tracked| &mut tracked.entity)
    }

    /// Tracked entities with their priorities, in insertion order.
    pub fn entities(&self) -> impl Iterator<Item = (&Entity, i32)> {
        self.entities
            .iter()
            .map(|tracked| (&tracked.entity, tracked.priority))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.index_of(id).is_some()
    }

    /// See [`Entity::colliding_entities`]. Empty for unknown ids.
    pub fn colliding_entities(&self, id: EntityId, filter: Option<&[ModelKind]>) -> Vec<EntityId> {
        self.entity(id)
            .map(|entity| entity.colliding_entities(self, filter))
            .unwrap_or_default()
    }

    /// Snapshot of a tracked entity under a fresh id, not added to the scene.
    pub fn detached_clone(
        &mut self,
        id: EntityId,
        behavior: Option<Box<dyn Behavior>>,
    ) -> Option<Entity> {
        let index = self.index_of(id)?;
        Some(self.entities[index].entity.clone_entity(&mut self.ids, behavior))
    }

    /// Clones a tracked entity and adds the clone, at the default priority when `priority` is
    /// `None`.
    pub fn clone_entity(
        &mut self,
        id: EntityId,
        behavior: Option<Box<dyn Behavior>>,
        priority: Option<i32>,
    ) -> Option<EntityId> {
        let clone = self.detached_clone(id, behavior)?;
        let priority = priority.unwrap_or(self.config.default_priority);
        Some(self.add_entity_with_priority(clone, priority))
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn on_set_running<F>(&mut self, listener: F) -> &mut Self
    where
        F: FnMut(&mut SetRunningEvent) + 'static,
    {
        self.run_listeners.register(listener);
        self
    }

    /// Asks listeners, then applies the run flag unless one of them cancelled. Returns whether
    /// the flag was applied.
    pub fn set_running(&mut self, value: bool) -> bool {
        let mut event = SetRunningEvent::new(value);
        self.run_listeners.dispatch(&mut event);
        if event.is_cancelled() {
            info!(requested = value, "scene_run_state_vetoed");
            return false;
        }

        if self.running != value {
            info!(running = value, ticks = self.ticks, "scene_run_state_changed");
        }
        self.running = value;
        if !value {
            self.clock.discard();
        }
        true
    }

    /// Rotates the surface about the centre of the given box. Callers reset the transform.
    pub fn rotate(&mut self, angle: f64, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        rotate_about_center(&mut self.surface, angle, x, y, width, height);
        self
    }

    /// Number of ticks run so far; also the number passed to the next tick.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn fps(&self) -> u32 {
        self.fps.fps()
    }

    /// Open entity ids in the order the next tick will visit them.
    pub fn render_order(&self) -> Vec<EntityId> {
        self.tick_order()
            .into_iter()
            .map(|index| self.entities[index].entity.id())
            .collect()
    }

    /// Host scheduler callback. Counts towards fps and runs every tick that became due, but only
    /// while the scene is running.
    pub fn poll(&mut self, elapsed: Duration) -> PollOutcome {
        let fps_sample = self.fps.record_poll(elapsed);
        if let Some(fps) = fps_sample {
            debug!(fps, "fps_sampled");
        }

        if !self.running {
            self.clock.discard();
            return PollOutcome {
                ticks_run: 0,
                fps_sample,
            };
        }

        let plan = self.clock.advance(elapsed);
        if plan.dropped_backlog > Duration::ZERO {
            warn!(
                dropped_backlog_ms = plan.dropped_backlog.as_millis() as u64,
                ticks_run = plan.ticks_to_run,
                "tick_backlog_dropped"
            );
        }
        for _ in 0..plan.ticks_to_run {
            self.step();
        }

        PollOutcome {
            ticks_run: plan.ticks_to_run,
            fps_sample,
        }
    }

    /// Runs the next tick and advances the tick counter.
    pub fn step(&mut self) {
        let tick = self.ticks;
        self.ticks = self.ticks.saturating_add(1);
        self.on_tick(tick);
    }

    /// Runs one tick numbered `tick` without touching the tick counter.
    pub fn on_tick(&mut self, tick: u64) {
        let size = self.surface.size();
        self.surface.clear_rect(0.0, 0.0, size.width, size.height);

        for index in self.tick_order() {
            let tracked = &mut self.entities[index];
            tracked.entity.on_update(tick, size);
            let entity = &tracked.entity;
            entity
                .model()
                .render(entity, &mut self.surface, self.images.as_ref());
        }
    }

    fn tick_order(&self) -> Vec<usize> {
        let mut order: Vec<(usize, i32)> = self
            .entities
            .iter()
            .enumerate()
            .filter(|(_, tracked)| !tracked.entity.is_closed())
            .map(|(index, tracked)| (index, tracked.priority))
            .collect();
        order.sort_by(|a, b| b.1.cmp(&a.1));
        order.into_iter().map(|(index, _)| index).collect()
    }

    fn index_of(&self, id: EntityId) -> Option<usize> {
        self.entities
            .iter()
            .position(|tracked| tracked.entity.id() == id)
    }
}
