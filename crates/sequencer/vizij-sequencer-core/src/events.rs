//! Named-event bus and the sequence lifecycle events.
//!
//! `EventBus<A>` is a plain registry of `FnMut(&mut A)` handlers keyed by
//! event name. `Sequence` composes one with `A = EventContext`.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::clock::Millis;
use crate::ids::{IdAllocator, ListenerId, StepId};
use crate::sequence::SequenceState;
use crate::step::StepSnapshot;

pub const SEQUENCE_STARTED: &str = "sequence:started";
pub const SEQUENCE_PAUSED: &str = "sequence:paused";
pub const SEQUENCE_RESUMING: &str = "sequence:resuming";
pub const SEQUENCE_REWINDING: &str = "sequence:rewinding";
pub const SEQUENCE_ANIMATED: &str = "sequence:animated";
pub const SEQUENCE_COMPLETED: &str = "sequence:completed";
pub const ANIMATION_COMPLETED: &str = "animation:completed";

/// Boxed event handler.
pub type Handler<A> = Box<dyn FnMut(&mut A)>;

struct Listener<A> {
    id: ListenerId,
    handler: Handler<A>,
}

/// Subscribe/unsubscribe/publish by event name. Handlers for one name run
/// synchronously in registration order. Nothing here fails: unknown names
/// are ignored.
pub struct EventBus<A> {
    listeners: IndexMap<String, Vec<Listener<A>>>,
    ids: IdAllocator,
}

impl<A> EventBus<A> {
    pub fn new() -> Self {
        Self {
            listeners: IndexMap::new(),
            ids: IdAllocator::new(),
        }
    }

    /// Register `handler` for `name`; chainable.
    pub fn on<F>(&mut self, name: &str, handler: F) -> &mut Self
    where
        F: FnMut(&mut A) + 'static,
    {
        self.subscribe(name, handler);
        self
    }

    /// Register `handler` for `name` and return an id usable with `off`.
    pub fn subscribe<F>(&mut self, name: &str, handler: F) -> ListenerId
    where
        F: FnMut(&mut A) + 'static,
    {
        let id = self.ids.alloc_listener();
        self.listeners
            .entry(name.to_string())
            .or_default()
            .push(Listener {
                id,
                handler: Box::new(handler),
            });
        id
    }

    /// Remove one handler. Returns whether it was registered under `name`.
    pub fn off(&mut self, name: &str, id: ListenerId) -> bool {
        let Some(list) = self.listeners.get_mut(name) else {
            return false;
        };
        let before = list.len();
        list.retain(|l| l.id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            self.listeners.shift_remove(name);
        }
        removed
    }

    /// Remove every handler for `name`. Returns how many were removed.
    pub fn off_event(&mut self, name: &str) -> usize {
        self.listeners
            .shift_remove(name)
            .map(|list| list.len())
            .unwrap_or(0)
    }

    /// Remove every handler. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let n = self.total_listeners();
        self.listeners.clear();
        n
    }

    /// Invoke every handler registered for `name`. Returns how many ran.
    pub fn trigger(&mut self, name: &str, args: &mut A) -> usize {
        let Some(list) = self.listeners.get_mut(name) else {
            return 0;
        };
        for listener in list.iter_mut() {
            (listener.handler)(args);
        }
        list.len()
    }

    #[inline]
    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners.get(name).map(|l| l.len()).unwrap_or(0)
    }

    #[inline]
    pub fn total_listeners(&self) -> usize {
        self.listeners.values().map(|l| l.len()).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<A> Default for EventBus<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for EventBus<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: Vec<(&str, usize)> = self
            .listeners
            .iter()
            .map(|(k, v)| (k.as_str(), v.len()))
            .collect();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}

/// Lifecycle signals emitted by a sequence.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[non_exhaustive]
pub enum SequenceEvent {
    /// A forward pass began with `steps` scheduled steps.
    Started { steps: usize },
    Paused,
    Resuming,
    Rewinding,
    /// Every step of the pass has completed (pad time not yet applied).
    Animated,
    Completed,
    AnimationCompleted { step: StepSnapshot },
    /// Host-defined event.
    Custom {
        name: String,
        data: serde_json::Value,
    },
}

impl SequenceEvent {
    pub fn custom(name: impl Into<String>, data: serde_json::Value) -> Self {
        Self::Custom {
            name: name.into(),
            data,
        }
    }

    /// Wire name used for listener lookup.
    #[inline]
    pub fn name(&self) -> &str {
        match self {
            Self::Started { .. } => SEQUENCE_STARTED,
            Self::Paused => SEQUENCE_PAUSED,
            Self::Resuming => SEQUENCE_RESUMING,
            Self::Rewinding => SEQUENCE_REWINDING,
            Self::Animated => SEQUENCE_ANIMATED,
            Self::Completed => SEQUENCE_COMPLETED,
            Self::AnimationCompleted { .. } => ANIMATION_COMPLETED,
            Self::Custom { name, .. } => name,
        }
    }

    /// Check if this is a sequence-level playback event
    #[inline]
    pub fn is_playback_event(&self) -> bool {
        matches!(
            self,
            Self::Started { .. }
                | Self::Paused
                | Self::Resuming
                | Self::Rewinding
                | Self::Animated
                | Self::Completed
        )
    }
}

/// Work a handler asks the sequence to do once the current dispatch returns.
#[derive(Clone, Debug, PartialEq)]
pub enum SequenceCommand {
    Start,
    Pause,
    Resume,
    Rewind,
    Wait(Millis),
    StopStep(StepId),
    /// Remove one listener, typically the requesting handler itself.
    Off(String, ListenerId),
    /// Hard teardown. Commands queued after it in the same dispatch are
    /// dropped.
    OffAll,
}

/// Argument handed to every sequence event handler.
#[derive(Debug)]
pub struct EventContext {
    pub event: SequenceEvent,
    pub sequence: Option<String>,
    pub state: SequenceState,
    pub remaining: usize,
    commands: Vec<SequenceCommand>,
}

impl EventContext {
    pub fn new(
        event: SequenceEvent,
        sequence: Option<String>,
        state: SequenceState,
        remaining: usize,
    ) -> Self {
        Self {
            event,
            sequence,
            state,
            remaining,
            commands: Vec::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.event.name()
    }

    /// Step payload of `animation:completed`.
    pub fn step(&self) -> Option<&StepSnapshot> {
        match &self.event {
            SequenceEvent::AnimationCompleted { step } => Some(step),
            _ => None,
        }
    }

    /// Queue a command for the owning sequence.
    pub fn request(&mut self, command: SequenceCommand) {
        self.commands.push(command);
    }

    pub fn take_commands(&mut self) -> Vec<SequenceCommand> {
        std::mem::take(&mut self.commands)
    }
}
