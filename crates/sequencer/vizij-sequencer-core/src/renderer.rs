//! Rendering backend seam.
//!
//! The core never touches a rendered target directly. Steps call through
//! `Renderer`, which owns interpolation, units, compositing and whatever the
//! target actually is (DOM node, scene entity, in-memory record).

use std::fmt::Debug;

use hashbrown::HashMap;

use crate::easing::Easing;
use crate::value::{Properties, PropertyValue};

/// Timing handed to the renderer for one step run.
#[derive(Clone, Debug)]
pub struct Timing {
    pub duration_ms: f64,
    /// Alias the step was configured with (after fallback).
    pub easing: String,
    /// Resolved curve for `easing`.
    pub curve: Easing,
}

/// Who completes an `animate` call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Completion {
    /// The core arms a completion timer for the step duration.
    Timed,
    /// The host reports completion via `Sequence::notify_step_complete`.
    Deferred,
}

pub trait Renderer {
    /// Cached, cheap-to-clone reference to a resolved target.
    type Handle: Clone + Debug;

    /// Resolve an opaque target identity. `None` means the target is unknown.
    fn resolve(&mut self, target: &str) -> Option<Self::Handle>;

    /// Remember the target's pre-sequence style so rewind can restore it.
    fn capture_original(&mut self, _handle: &Self::Handle) {}

    /// Current rendered value of one property.
    fn current_value(&mut self, handle: &Self::Handle, property: &str) -> Option<PropertyValue>;

    /// Discrete, renderer-driven interpolation (animate transport).
    fn animate(
        &mut self,
        handle: &Self::Handle,
        properties: &Properties,
        timing: &Timing,
    ) -> Completion;

    /// Declarative transition from `start` to `properties` (transition transport).
    fn transition(
        &mut self,
        handle: &Self::Handle,
        properties: &Properties,
        start: &Properties,
        timing: &Timing,
    );

    /// Pin the target at `snapshot` and suspend any in-flight transition.
    fn freeze(&mut self, handle: &Self::Handle, snapshot: &Properties);

    /// Release a freeze applied with `snapshot`.
    fn unfreeze(&mut self, handle: &Self::Handle, snapshot: &Properties);

    /// Transition the target back to its captured original style.
    fn restore_original(&mut self, handle: &Self::Handle, timing: &Timing);

    /// Drop any transient marker left by a rewind.
    fn finish_rewind(&mut self, _handle: &Self::Handle) {}
}

/// Append-only identity → handle cache. Each identity is resolved (and its
/// original style captured) at most once.
#[derive(Debug)]
pub struct TargetCache<H> {
    handles: HashMap<String, H>,
}

impl<H: Clone> TargetCache<H> {
    pub fn new() -> Self {
        Self {
            handles: HashMap::new(),
        }
    }

    /// Cached handle, resolving through `renderer` on first use.
    pub fn resolve<R>(&mut self, renderer: &mut R, target: &str) -> Option<H>
    where
        R: Renderer<Handle = H>,
    {
        if let Some(h) = self.handles.get(target) {
            return Some(h.clone());
        }
        let handle = renderer.resolve(target)?;
        renderer.capture_original(&handle);
        self.handles.insert(target.to_string(), handle.clone());
        Some(handle)
    }

    #[inline]
    pub fn get(&self, target: &str) -> Option<&H> {
        self.handles.get(target)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl<H: Clone> Default for TargetCache<H> {
    fn default() -> Self {
        Self::new()
    }
}
