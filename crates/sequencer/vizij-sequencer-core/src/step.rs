//! Per-step state machine.
//!
//! A `Step` is one "animate target with properties over duration at offset"
//! unit. It owns its start and completion timers; the owning `Sequence`
//! passes in the renderer and scheduler for every transition instead of the
//! step holding a back-reference.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::clock::Millis;
use crate::config::{TransportMode, DEFAULT_DURATION_MS, DEFAULT_EASING};
use crate::easing::Easing;
use crate::ids::{StepId, TimerId};
use crate::renderer::{Completion, Renderer, Timing};
use crate::scheduler::{Scheduler, TimerAction};
use crate::value::{is_transform_property, Properties, TRANSFORM_KEY};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    /// Queued for the current pass.
    OnStack,
    /// Queued, but the sequence is paused before the step started.
    OnStackReset,
    Playing,
    Paused,
    Completed,
    /// Excluded from all further scheduling.
    Stopped,
}

impl StepState {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::OnStack => "on_stack",
            Self::OnStackReset => "on_stack_reset",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Stopped => "stopped",
        }
    }

    /// Still owed a completion in the current pass.
    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            Self::OnStack | Self::OnStackReset | Self::Playing | Self::Paused
        )
    }
}

/// Resolved timing for a step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepOptions {
    pub duration_ms: Millis,
    pub easing: String,
    pub when: Millis,
}

impl Default for StepOptions {
    fn default() -> Self {
        Self {
            duration_ms: DEFAULT_DURATION_MS,
            easing: DEFAULT_EASING.to_string(),
            when: 0.0,
        }
    }
}

/// Caller-supplied step options. Unset fields take the sequence defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StepConfig {
    pub duration_ms: Option<Millis>,
    pub easing: Option<String>,
    pub when: Option<Millis>,
}

impl StepConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duration(mut self, ms: Millis) -> Self {
        self.duration_ms = Some(ms);
        self
    }

    pub fn easing(mut self, alias: impl Into<String>) -> Self {
        self.easing = Some(alias.into());
        self
    }

    pub fn when(mut self, ms: Millis) -> Self {
        self.when = Some(ms);
        self
    }
}

/// Serializable view of a step, carried by `animation:completed`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepSnapshot {
    pub id: StepId,
    pub target: String,
    pub state: StepState,
    pub when: Millis,
    pub duration_ms: Millis,
    pub easing: String,
    pub properties: Properties,
    pub rewinding: bool,
}

#[derive(Debug)]
pub struct Step<H> {
    id: StepId,
    target: String,
    handle: H,
    properties: Properties,
    options: StepOptions,
    original_when: Millis,
    curve: Easing,
    state: StepState,
    start_params: Option<Properties>,
    paused_params: Option<Properties>,
    start_timer: Option<TimerId>,
    complete_timer: Option<TimerId>,
    run_started: Option<Millis>,
    played_ms: Millis,
    rewinding: bool,
}

impl<H: Clone + Debug> Step<H> {
    pub(crate) fn new(
        id: StepId,
        target: String,
        handle: H,
        properties: Properties,
        options: StepOptions,
        curve: Easing,
    ) -> Self {
        let original_when = options.when;
        Self {
            id,
            target,
            handle,
            properties,
            options,
            original_when,
            curve,
            state: StepState::OnStack,
            start_params: None,
            paused_params: None,
            start_timer: None,
            complete_timer: None,
            run_started: None,
            played_ms: 0.0,
            rewinding: false,
        }
    }

    /// Replace timing and easing between passes. `options.when` becomes the
    /// new forward schedule.
    pub(crate) fn retime(&mut self, options: StepOptions, curve: Easing) {
        self.original_when = options.when;
        self.options = options;
        self.curve = curve;
    }

    #[inline]
    pub fn id(&self) -> StepId {
        self.id
    }

    #[inline]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[inline]
    pub fn handle(&self) -> &H {
        &self.handle
    }

    #[inline]
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    #[inline]
    pub fn options(&self) -> &StepOptions {
        &self.options
    }

    /// Offset of this step within the current pass.
    #[inline]
    pub fn when(&self) -> Millis {
        self.options.when
    }

    /// Offset in the forward schedule, as added.
    #[inline]
    pub fn original_when(&self) -> Millis {
        self.original_when
    }

    #[inline]
    pub fn duration_ms(&self) -> Millis {
        self.options.duration_ms
    }

    #[inline]
    pub fn state(&self) -> StepState {
        self.state
    }

    #[inline]
    pub fn start_params(&self) -> Option<&Properties> {
        self.start_params.as_ref()
    }

    #[inline]
    pub fn is_rewinding(&self) -> bool {
        self.rewinding
    }

    /// Milliseconds of the current run already played (up to the last pause).
    #[inline]
    pub fn played_ms(&self) -> Millis {
        self.played_ms
    }

    pub fn snapshot(&self) -> StepSnapshot {
        StepSnapshot {
            id: self.id,
            target: self.target.clone(),
            state: self.state,
            when: self.options.when,
            duration_ms: self.options.duration_ms,
            easing: self.options.easing.clone(),
            properties: self.properties.clone(),
            rewinding: self.rewinding,
        }
    }

    fn timing(&self, duration_ms: Millis) -> Timing {
        Timing {
            duration_ms,
            easing: self.options.easing.clone(),
            curve: self.curve.clone(),
        }
    }

    /// Current rendered values of the animated properties. Transform-family
    /// properties are also captured under the composite transform key.
    fn capture<R>(&self, renderer: &mut R) -> Properties
    where
        R: Renderer<Handle = H>,
    {
        let mut params = Properties::new();
        for name in self.properties.names() {
            if is_transform_property(name) && !params.contains(TRANSFORM_KEY) {
                if let Some(v) = renderer.current_value(&self.handle, TRANSFORM_KEY) {
                    params.insert(TRANSFORM_KEY, v);
                }
            }
            if let Some(v) = renderer.current_value(&self.handle, name) {
                params.insert(name, v);
            }
        }
        params
    }

    fn arm_completion(&mut self, scheduler: &mut Scheduler, delay: Millis) {
        if let Some(old) = self.complete_timer.take() {
            scheduler.cancel(old);
        }
        self.complete_timer = Some(scheduler.schedule(delay, TimerAction::Complete(self.id)));
    }

    pub(crate) fn cancel_timers(&mut self, scheduler: &mut Scheduler) {
        if let Some(id) = self.start_timer.take() {
            scheduler.cancel(id);
        }
        if let Some(id) = self.complete_timer.take() {
            scheduler.cancel(id);
        }
    }

    /// Back to the forward schedule for a fresh pass. Stopped steps only
    /// lose their timers.
    pub(crate) fn reset(&mut self, scheduler: &mut Scheduler) {
        self.cancel_timers(scheduler);
        if self.state == StepState::Stopped {
            return;
        }
        self.state = StepState::OnStack;
        self.options.when = self.original_when;
        self.start_params = None;
        self.paused_params = None;
        self.run_started = None;
        self.played_ms = 0.0;
        self.rewinding = false;
    }

    /// Queue for a rewind pass at `when`. A paused step is released first.
    pub(crate) fn requeue<R>(&mut self, renderer: &mut R, scheduler: &mut Scheduler, when: Millis)
    where
        R: Renderer<Handle = H>,
    {
        self.cancel_timers(scheduler);
        if self.state == StepState::Stopped {
            return;
        }
        if let Some(snapshot) = self.paused_params.take() {
            renderer.unfreeze(&self.handle, &snapshot);
        }
        self.state = StepState::OnStack;
        self.options.when = when;
        self.run_started = None;
        self.played_ms = 0.0;
    }

    /// Arm the start timer `delay` ms from now.
    pub(crate) fn schedule_start(
        &mut self,
        scheduler: &mut Scheduler,
        delay: Millis,
        action: TimerAction,
    ) {
        if let Some(old) = self.start_timer.take() {
            scheduler.cancel(old);
        }
        self.start_timer = Some(scheduler.schedule(delay, action));
    }

    /// Sequence paused before this step started.
    pub(crate) fn hold(&mut self, scheduler: &mut Scheduler) -> bool {
        if self.state != StepState::OnStack {
            return false;
        }
        if let Some(id) = self.start_timer.take() {
            scheduler.cancel(id);
        }
        self.state = StepState::OnStackReset;
        true
    }

    /// Undo `hold`, firing `action` after `delay`.
    pub(crate) fn release(
        &mut self,
        scheduler: &mut Scheduler,
        delay: Millis,
        action: TimerAction,
    ) -> bool {
        if self.state != StepState::OnStackReset {
            return false;
        }
        self.state = StepState::OnStack;
        self.schedule_start(scheduler, delay, action);
        true
    }

    /// Claim a fired start timer. False for stale or foreign timers.
    pub(crate) fn take_start_timer(&mut self, id: TimerId) -> bool {
        if self.start_timer == Some(id) {
            self.start_timer = None;
            true
        } else {
            false
        }
    }

    /// Claim a fired completion timer. False for stale or foreign timers.
    pub(crate) fn take_complete_timer(&mut self, id: TimerId) -> bool {
        if self.complete_timer == Some(id) {
            self.complete_timer = None;
            true
        } else {
            false
        }
    }

    pub(crate) fn play<R>(
        &mut self,
        renderer: &mut R,
        scheduler: &mut Scheduler,
        transport: TransportMode,
    ) where
        R: Renderer<Handle = H>,
    {
        let start = self.capture(renderer);
        self.state = StepState::Playing;
        self.rewinding = false;
        self.played_ms = 0.0;
        self.run_started = Some(scheduler.now());
        let timing = self.timing(self.options.duration_ms);
        match transport {
            TransportMode::Transition => {
                renderer.transition(&self.handle, &self.properties, &start, &timing);
                self.arm_completion(scheduler, timing.duration_ms);
            }
            TransportMode::Animate => {
                match renderer.animate(&self.handle, &self.properties, &timing) {
                    Completion::Timed => self.arm_completion(scheduler, timing.duration_ms),
                    Completion::Deferred => {}
                }
            }
        }
        self.start_params = Some(start);
    }

    /// Play toward the original style.
    pub(crate) fn rewind<R>(&mut self, renderer: &mut R, scheduler: &mut Scheduler)
    where
        R: Renderer<Handle = H>,
    {
        self.state = StepState::Playing;
        self.rewinding = true;
        self.played_ms = 0.0;
        self.run_started = Some(scheduler.now());
        let timing = self.timing(self.options.duration_ms);
        renderer.restore_original(&self.handle, &timing);
        self.arm_completion(scheduler, timing.duration_ms);
    }

    pub(crate) fn pause<R>(&mut self, renderer: &mut R, scheduler: &mut Scheduler) -> bool
    where
        R: Renderer<Handle = H>,
    {
        if self.state != StepState::Playing {
            return false;
        }
        if let Some(id) = self.complete_timer.take() {
            scheduler.cancel(id);
        }
        let snapshot = self.capture(renderer);
        renderer.freeze(&self.handle, &snapshot);
        if let Some(started) = self.run_started.take() {
            self.played_ms += (scheduler.now() - started).max(0.0);
        }
        self.paused_params = Some(snapshot);
        self.state = StepState::Paused;
        true
    }

    /// Continue a paused run; completes after the unplayed remainder.
    pub(crate) fn resume<R>(&mut self, renderer: &mut R, scheduler: &mut Scheduler) -> bool
    where
        R: Renderer<Handle = H>,
    {
        if self.state != StepState::Paused {
            return false;
        }
        let snapshot = self.paused_params.take().unwrap_or_default();
        renderer.unfreeze(&self.handle, &snapshot);
        self.start_params = Some(self.capture(renderer));
        self.state = StepState::Playing;
        self.run_started = Some(scheduler.now());
        let remaining = (self.options.duration_ms - self.played_ms).max(0.0);
        self.arm_completion(scheduler, remaining);
        true
    }

    /// Finish the current run. Returns false if the step was not playing.
    pub(crate) fn complete<R>(&mut self, renderer: &mut R, scheduler: &mut Scheduler) -> bool
    where
        R: Renderer<Handle = H>,
    {
        if self.state != StepState::Playing {
            return false;
        }
        self.cancel_timers(scheduler);
        if let Some(started) = self.run_started.take() {
            self.played_ms += (scheduler.now() - started).max(0.0);
        }
        self.state = StepState::Completed;
        if self.rewinding {
            renderer.finish_rewind(&self.handle);
        }
        true
    }

    /// Drop out of all scheduling. Returns whether the step still owed a
    /// completion in the current pass.
    pub(crate) fn stop<R>(&mut self, renderer: &mut R, scheduler: &mut Scheduler) -> bool
    where
        R: Renderer<Handle = H>,
    {
        self.cancel_timers(scheduler);
        if let Some(snapshot) = self.paused_params.take() {
            renderer.unfreeze(&self.handle, &snapshot);
        }
        let was_pending = self.state.is_pending();
        self.state = StepState::Stopped;
        self.run_started = None;
        was_pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::easing::EasingRegistry;
    use crate::headless::{HeadlessRenderer, RenderCall};

    fn fixture() -> (ManualClock, Scheduler, HeadlessRenderer, Step<crate::headless::TargetHandle>) {
        let clock = ManualClock::new();
        let scheduler = Scheduler::new(Box::new(clock.clone()));
        let mut renderer = HeadlessRenderer::new().with_target(
            "box",
            Properties::new().with("left", 0).with("transform", "none"),
        );
        let handle = renderer.resolve("box").expect("box");
        let curve = EasingRegistry::with_builtins()
            .resolve("linear")
            .cloned()
            .expect("linear");
        let options = StepOptions {
            duration_ms: 400.0,
            easing: "linear".to_string(),
            when: 0.0,
        };
        let step = Step::new(
            StepId(0),
            "box".to_string(),
            handle,
            Properties::new().with("left", 100).with("rotate", "45deg"),
            options,
            curve,
        );
        (clock, scheduler, renderer, step)
    }

    fn drain_completion(s: &mut Scheduler, now: Millis) -> Vec<TimerAction> {
        let mut out = Vec::new();
        while let Some(f) = s.pop_due(now) {
            out.push(f.action);
        }
        s.settle();
        out
    }

    #[test]
    fn play_captures_start_params_with_transform_key() {
        let (_clock, mut sched, mut r, mut step) = fixture();
        step.play(&mut r, &mut sched, TransportMode::Transition);
        assert_eq!(step.state(), StepState::Playing);
        let start = step.start_params().expect("captured");
        assert!(start.contains("left"));
        assert!(start.contains(TRANSFORM_KEY));
        assert_eq!(sched.pending(), 1);
        assert!(matches!(r.calls()[0], RenderCall::Transition { .. }));
    }

    #[test]
    fn pause_then_resume_arms_remaining_time() {
        let (clock, mut sched, mut r, mut step) = fixture();
        step.play(&mut r, &mut sched, TransportMode::Transition);
        clock.advance(150.0);
        assert!(step.pause(&mut r, &mut sched));
        assert_eq!(sched.pending(), 0);
        assert_eq!(step.played_ms(), 150.0);
        clock.advance(1000.0);
        assert!(step.resume(&mut r, &mut sched));
        assert_eq!(sched.next_due(), Some(1150.0 + 250.0));
        clock.advance(250.0);
        assert_eq!(
            drain_completion(&mut sched, clock.now_ms()),
            vec![TimerAction::Complete(StepId(0))]
        );
    }

    #[test]
    fn rewind_completion_finishes_rewind() {
        let (_clock, mut sched, mut r, mut step) = fixture();
        step.rewind(&mut r, &mut sched);
        assert!(step.is_rewinding());
        assert!(step.complete(&mut r, &mut sched));
        assert_eq!(step.state(), StepState::Completed);
        assert!(!step.complete(&mut r, &mut sched));
        let kinds: Vec<&str> = r.calls().iter().map(|c| c.kind()).collect();
        assert_eq!(kinds, vec!["restore_original", "finish_rewind"]);
    }

    #[test]
    fn hold_and_release_only_apply_to_queued_steps() {
        let (_clock, mut sched, _r, mut step) = fixture();
        step.schedule_start(&mut sched, 100.0, TimerAction::Play(StepId(0)));
        assert!(step.hold(&mut sched));
        assert_eq!(sched.pending(), 0);
        assert_eq!(step.state(), StepState::OnStackReset);
        assert!(!step.hold(&mut sched));
        assert!(step.release(&mut sched, 40.0, TimerAction::Play(StepId(0))));
        assert_eq!(step.state(), StepState::OnStack);
        assert_eq!(sched.pending(), 1);
    }

    #[test]
    fn stop_reports_pending_and_cancels() {
        let (_clock, mut sched, mut r, mut step) = fixture();
        step.play(&mut r, &mut sched, TransportMode::Transition);
        assert!(step.stop(&mut r, &mut sched));
        assert_eq!(sched.pending(), 0);
        assert!(!step.stop(&mut r, &mut sched));
        step.reset(&mut sched);
        assert_eq!(step.state(), StepState::Stopped);
    }

    #[test]
    fn step_config_builder() {
        let cfg = StepConfig::new().duration(250.0).easing("linear").when(100.0);
        assert_eq!(cfg.duration_ms, Some(250.0));
        assert_eq!(cfg.easing.as_deref(), Some("linear"));
        assert_eq!(cfg.when, Some(100.0));
    }
}
