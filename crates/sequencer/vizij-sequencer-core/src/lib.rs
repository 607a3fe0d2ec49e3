//! Vizij Sequencer Core (renderer-agnostic)
//!
//! Schedules declarative "animate target with properties over duration at
//! offset" steps as one timeline with pause, resume and rewind. Rendering is
//! delegated to a `Renderer` implementation; time comes from an injected
//! `Clock`, and the host drives timers by calling `Sequence::tick`.

pub mod clock;
pub mod config;
pub mod easing;
pub mod error;
pub mod events;
pub mod headless;
pub mod ids;
pub mod renderer;
pub mod scheduler;
pub mod sequence;
pub mod step;
pub mod stored_sequence;
pub mod value;

// Re-exports for hosts and renderer backends
pub use clock::{Clock, ManualClock, Millis, SystemClock};
pub use config::{SequencerConfig, TransportMode, DEFAULT_DURATION_MS, DEFAULT_EASING};
pub use easing::{Easing, EasingRegistry};
pub use error::SequencerError;
pub use events::{EventBus, EventContext, SequenceCommand, SequenceEvent};
pub use headless::{HeadlessRenderer, RenderCall, TargetHandle};
pub use ids::{ListenerId, StepId, TimerId};
pub use renderer::{Completion, Renderer, TargetCache, Timing};
pub use scheduler::{Scheduler, TimerAction};
pub use sequence::{Direction, Sequence, SequenceBuilder, SequenceState};
pub use step::{Step, StepConfig, StepOptions, StepSnapshot, StepState};
pub use stored_sequence::{parse_stored_sequence_json, StoredSequence, StoredStep};
pub use value::{Properties, PropertyValue};

pub type Result<T> = core::result::Result<T, SequencerError>;
