//! Subscription hooks for interaction events.

use glam::Vec3;

use crate::input::SourceId;

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    DragStarted,
    DragEnded { position: Vec3 },
    DragCancelled,
    GrabStarted,
    GrabEnded { position: Vec3 },
    GrabCancelled,
    /// A committed or replayed position write
    Moved { position: Vec3 },
    SelectionChanged { selected: bool },
    Teleported { from: Vec3, to: Vec3 },
    ZoneEntered { zone: String },
    ZoneExited { zone: String },
    PinchStarted { origin: Vec3 },
    ScaleStarted { baseline: f32 },
    ScaleUpdated { factor: f32 },
    ScaleEnded,
    Undo { position: Vec3 },
    Redo { position: Vec3 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTopic {
    Drag,
    Move,
    Teleport,
    Zone,
    Gesture,
    Selection,
    History,
    All,
}

impl EventKind {
    pub fn topic(&self) -> EventTopic {
        match self {
            EventKind::DragStarted
            | EventKind::DragEnded { .. }
            | EventKind::DragCancelled
            | EventKind::GrabStarted
            | EventKind::GrabEnded { .. }
            | EventKind::GrabCancelled => EventTopic::Drag,
            EventKind::Moved { .. } => EventTopic::Move,
            EventKind::SelectionChanged { .. } => EventTopic::Selection,
            EventKind::Teleported { .. } => EventTopic::Teleport,
            EventKind::ZoneEntered { .. } | EventKind::ZoneExited { .. } => EventTopic::Zone,
            EventKind::PinchStarted { .. }
            | EventKind::ScaleStarted { .. }
            | EventKind::ScaleUpdated { .. }
            | EventKind::ScaleEnded => EventTopic::Gesture,
            EventKind::Undo { .. } | EventKind::Redo { .. } => EventTopic::History,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionEvent {
    pub kind: EventKind,
    /// Affected station, if any
    pub station: Option<String>,
    pub source: Option<SourceId>,
    /// Seconds, on the caller's frame clock
    pub timestamp: f64,
}

pub type EventHandler = Box<dyn FnMut(&InteractionEvent)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct EventBus {
    handlers: Vec<(SubscriptionId, EventTopic, EventHandler)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, topic: EventTopic, handler: EventHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, topic, handler));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sid, _, _)| *sid != id);
        before != self.handlers.len()
    }

    pub fn emit(&mut self, event: &InteractionEvent) {
        let topic = event.kind.topic();
        for (_, wanted, handler) in &mut self.handlers {
            if *wanted == EventTopic::All || *wanted == topic {
                handler(event);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
