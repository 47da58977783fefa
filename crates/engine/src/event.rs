use std::fmt;

use crate::entity::EntityId;
use crate::math::Vector2;

/// Kinds of events emitted by entities and scenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    OnMove,
    OnSetRunning,
}

impl EventKind {
    pub const fn name(self) -> &'static str {
        match self {
            EventKind::OnMove => "onMove",
            EventKind::OnSetRunning => "onSetRunning",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An event whose default follow-up action can be vetoed by any listener.
pub trait Cancellable {
    fn kind(&self) -> EventKind;
    fn is_cancelled(&self) -> bool;
    fn set_cancelled(&mut self, cancelled: bool);

    fn cancel(&mut self) {
        self.set_cancelled(true);
    }
}

/// Ordered listener registry owned by an emitter, one per event kind.
///
/// `dispatch` runs every listener synchronously in registration order against the same event
/// value. Cancelling does not short-circuit the remaining listeners; the emitter checks the flag
/// once dispatch returns.
pub struct Listeners<E> {
    listeners: Vec<Box<dyn FnMut(&mut E)>>,
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }
}

impl<E> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.listeners.len())
            .finish()
    }
}

impl<E> Listeners<E> {
    pub fn register<F>(&mut self, listener: F)
    where
        F: FnMut(&mut E) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn dispatch(&mut self, event: &mut E) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

/// Raised by `Entity::move_by` before the position changes.
///
/// Listeners may rewrite `to`; the entity lands on the final `to` unless the event is cancelled.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveEvent {
    pub entity: EntityId,
    pub from: Vector2,
    pub to: Vector2,
    cancelled: bool,
}

impl MoveEvent {
    pub fn new(entity: EntityId, from: Vector2, to: Vector2) -> Self {
        Self {
            entity,
            from,
            to,
            cancelled: false,
        }
    }

    pub fn delta(&self) -> Vector2 {
        self.to - self.from
    }
}

impl Cancellable for MoveEvent {
    fn kind(&self) -> EventKind {
        EventKind::OnMove
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    fn set_cancelled(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
    }
}

/// Raised by `Scene::set_running` before the run flag changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetRunningEvent {
    pub value: bool,
    cancelled: bool,
}

impl SetRunningEvent {
    pub fn new(value: bool) -> Self {
        Self {
            value,
            cancelled: false,
        }
    }
}

impl Cancellable for SetRunningEvent {
    fn kind(&self) -> EventKind {
        EventKind::OnSetRunning
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    fn set_cancelled(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
    }
}
