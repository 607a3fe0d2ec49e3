//! Sequence: drives a list of steps as one timeline.
//!
//! All mutation happens inside host calls (`add`, `start`, `pause`, ...) or
//! inside `tick`, which drains due timers from the scheduler. Event handlers
//! never get `&mut Sequence`; they queue `SequenceCommand`s on the
//! `EventContext`, and the sequence applies them once the outermost dispatch
//! returns.

use std::collections::VecDeque;
use std::fmt;

use hashbrown::HashMap;
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, Millis, SystemClock};
use crate::config::SequencerConfig;
use crate::easing::{Easing, EasingRegistry};
use crate::error::SequencerError;
use crate::events::{EventBus, EventContext, SequenceCommand, SequenceEvent};
use crate::ids::{IdAllocator, ListenerId, StepId, TimerId};
use crate::renderer::{Renderer, TargetCache};
use crate::scheduler::{Fired, Scheduler, TimerAction};
use crate::step::{Step, StepConfig, StepOptions, StepState};
use crate::value::Properties;
use crate::Result;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceState {
    #[default]
    Idle,
    Playing,
    Paused,
    Resuming,
    Rewinding,
}

impl SequenceState {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Resuming => "resuming",
            Self::Rewinding => "rewinding",
        }
    }
}

impl fmt::Display for SequenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    Rewind,
}

/// A validated step with its target resolved, not yet part of a sequence.
pub(crate) struct PreparedStep<H> {
    target: String,
    handle: H,
    properties: Properties,
    options: StepOptions,
    curve: Easing,
}

/// Fluent constructor for `Sequence`.
pub struct SequenceBuilder {
    name: Option<String>,
    config: SequencerConfig,
    clock: Option<Box<dyn Clock>>,
    easings: Option<EasingRegistry>,
}

impl SequenceBuilder {
    pub fn new() -> Self {
        Self {
            name: None,
            config: SequencerConfig::default(),
            clock: None,
            easings: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    pub fn config(mut self, config: SequencerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn transport(mut self, transport: crate::config::TransportMode) -> Self {
        self.config.transport = transport;
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Easing table; defaults to `EasingRegistry::with_builtins()`.
    pub fn easings(mut self, easings: EasingRegistry) -> Self {
        self.easings = Some(easings);
        self
    }

    pub fn build<R: Renderer>(self, renderer: R) -> Result<Sequence<R>> {
        self.config.validate()?;
        let clock = self
            .clock
            .unwrap_or_else(|| Box::new(SystemClock::new()) as Box<dyn Clock>);
        let easings = self.easings.unwrap_or_else(EasingRegistry::with_builtins);
        Ok(Sequence::assemble(
            self.name,
            self.config,
            renderer,
            easings,
            clock,
        ))
    }
}

impl Default for SequenceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Sequence<R: Renderer> {
    name: Option<String>,
    debug: bool,
    config: SequencerConfig,
    renderer: R,
    easings: EasingRegistry,
    targets: TargetCache<R::Handle>,
    scheduler: Scheduler,
    bus: EventBus<EventContext>,
    steps: Vec<Step<R::Handle>>,
    index: HashMap<StepId, usize>,
    /// Step indices in firing order for the current pass.
    order: Vec<usize>,
    ids: IdAllocator,
    state: SequenceState,
    direction: Direction,
    started_at: Option<Millis>,
    paused_at: Option<Millis>,
    paused_since: Option<Millis>,
    paused_total: Millis,
    remaining: usize,
    pad_time: Option<Millis>,
    pad_timer: Option<TimerId>,
    pad_remaining: Option<Millis>,
    listeners_armed: bool,
    animated: bool,
    pass_completed: bool,
    dispatch_depth: u32,
    deferred: VecDeque<SequenceCommand>,
}

impl<R: Renderer> Sequence<R> {
    /// Sequence with default config, builtin easings and the system clock.
    pub fn new(renderer: R) -> Self {
        Self::assemble(
            None,
            SequencerConfig::default(),
            renderer,
            EasingRegistry::with_builtins(),
            Box::new(SystemClock::new()),
        )
    }

    fn assemble(
        name: Option<String>,
        config: SequencerConfig,
        renderer: R,
        easings: EasingRegistry,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            name,
            debug: config.debug,
            config,
            renderer,
            easings,
            targets: TargetCache::new(),
            scheduler: Scheduler::new(clock),
            bus: EventBus::new(),
            steps: Vec::new(),
            index: HashMap::new(),
            order: Vec::new(),
            ids: IdAllocator::new(),
            state: SequenceState::Idle,
            direction: Direction::Forward,
            started_at: None,
            paused_at: None,
            paused_since: None,
            paused_total: 0.0,
            remaining: 0,
            pad_time: None,
            pad_timer: None,
            pad_remaining: None,
            listeners_armed: false,
            animated: false,
            pass_completed: false,
            dispatch_depth: 0,
            deferred: VecDeque::new(),
        }
    }

    // ----- construction -----

    /// Append a step. Nothing is scheduled until `start`.
    pub fn add(
        &mut self,
        target: &str,
        properties: Properties,
        options: StepConfig,
    ) -> Result<StepId> {
        let prepared = self.prepare_step(target, properties, options)?;
        Ok(self.commit_step(prepared))
    }

    /// Validate timing and easing and resolve the target, without touching
    /// the step list.
    pub(crate) fn prepare_step(
        &mut self,
        target: &str,
        properties: Properties,
        options: StepConfig,
    ) -> Result<PreparedStep<R::Handle>> {
        let (options, curve) = self.resolve_options(options)?;
        let handle = self
            .targets
            .resolve(&mut self.renderer, target)
            .ok_or_else(|| SequencerError::invalid(format!("Unknown target - {target}")))?;
        Ok(PreparedStep {
            target: target.to_string(),
            handle,
            properties,
            options,
            curve,
        })
    }

    /// Fill unset fields from the config and validate the result.
    fn resolve_options(&self, options: StepConfig) -> Result<(StepOptions, Easing)> {
        let easing = self.validate_easing(options.easing.as_deref())?;
        let duration_ms = options
            .duration_ms
            .unwrap_or(self.config.default_duration_ms);
        if !duration_ms.is_finite() || duration_ms < 0.0 {
            return Err(SequencerError::invalid(format!(
                "duration must be a finite, non-negative number of ms (got {duration_ms})"
            )));
        }
        let when = options.when.unwrap_or(0.0);
        if !when.is_finite() || when < 0.0 {
            return Err(SequencerError::invalid(format!(
                "when must be a finite, non-negative number of ms (got {when})"
            )));
        }
        let curve = self
            .easings
            .resolve(&easing)
            .cloned()
            .ok_or_else(|| SequencerError::invalid(format!("Unknown easing method! - {easing}")))?;
        Ok((
            StepOptions {
                duration_ms,
                easing,
                when,
            },
            curve,
        ))
    }

    /// Change the timing or easing of one step. Unset fields keep their
    /// current value. Only allowed between passes (idle, or after
    /// `sequence:completed`); the change applies from the next `start` or
    /// `rewind`.
    pub fn set_step_options(&mut self, id: StepId, options: StepConfig) -> Result<()> {
        self.guard_between_passes("set_step_options")?;
        let idx = self.index_of(id)?;
        let (resolved, curve) = self.merged_options(idx, options)?;
        self.steps[idx].retime(resolved, curve);
        Ok(())
    }

    /// `set_step_options` for every step animating `target`, all or nothing.
    /// Returns how many steps changed.
    pub fn set_target_options(&mut self, target: &str, options: StepConfig) -> Result<usize> {
        self.guard_between_passes("set_target_options")?;
        let matched: Vec<usize> = (0..self.steps.len())
            .filter(|&i| self.steps[i].target() == target)
            .collect();
        let updates = matched
            .into_iter()
            .map(|idx| -> Result<_> { Ok((idx, self.merged_options(idx, options.clone())?)) })
            .collect::<Result<Vec<_>>>()?;
        let changed = updates.len();
        for (idx, (resolved, curve)) in updates {
            self.steps[idx].retime(resolved, curve);
        }
        Ok(changed)
    }

    fn merged_options(&self, idx: usize, options: StepConfig) -> Result<(StepOptions, Easing)> {
        let step = &self.steps[idx];
        let current = step.options();
        self.resolve_options(StepConfig {
            duration_ms: options.duration_ms.or(Some(current.duration_ms)),
            easing: options.easing.or_else(|| Some(current.easing.clone())),
            when: options.when.or(Some(step.original_when())),
        })
    }

    pub(crate) fn commit_step(&mut self, prepared: PreparedStep<R::Handle>) -> StepId {
        let PreparedStep {
            target,
            handle,
            properties,
            options,
            curve,
        } = prepared;
        let id = self.ids.alloc_step();
        let step = Step::new(id, target, handle, properties, options, curve);
        self.index.insert(id, self.steps.len());
        self.steps.push(step);
        id
    }

    fn validate_easing(&self, requested: Option<&str>) -> Result<String> {
        let default = self.config.default_easing.as_str();
        let alias = requested.unwrap_or(default);
        if self.easings.has(alias) {
            return Ok(alias.to_string());
        }
        if !self.easings.has(default) {
            return Err(SequencerError::invalid(format!(
                "Unknown easing method! - {alias}"
            )));
        }
        warn!("unknown easing '{alias}', falling back to '{default}'");
        Ok(default.to_string())
    }

    /// Register or replace an easing alias.
    pub fn add_easing(&mut self, alias: impl Into<String>, easing: Easing) -> &mut Self {
        self.easings.add_easing(alias, easing);
        self
    }

    /// Pad the end of the sequence: `sequence:completed` fires `ms` after
    /// the last step completes. Zero or invalid values clear the pad.
    pub fn wait(&mut self, ms: Millis) -> &mut Self {
        self.pad_time = if ms.is_finite() && ms > 0.0 {
            Some(ms)
        } else {
            None
        };
        self
    }

    // ----- events -----

    /// Register a handler; chainable.
    pub fn on<F>(&mut self, name: &str, handler: F) -> &mut Self
    where
        F: FnMut(&mut EventContext) + 'static,
    {
        self.bus.on(name, handler);
        self
    }

    pub fn subscribe<F>(&mut self, name: &str, handler: F) -> ListenerId
    where
        F: FnMut(&mut EventContext) + 'static,
    {
        self.bus.subscribe(name, handler)
    }

    pub fn off(&mut self, name: &str, id: ListenerId) -> bool {
        self.bus.off(name, id)
    }

    pub fn off_event(&mut self, name: &str) -> usize {
        self.bus.off_event(name)
    }

    /// Hard teardown: drop every listener (internal ones included) and
    /// cancel every pending timer.
    pub fn off_all(&mut self) -> &mut Self {
        self.bus.clear();
        self.listeners_armed = false;
        for step in &mut self.steps {
            step.cancel_timers(&mut self.scheduler);
        }
        self.pad_timer = None;
        self.pad_remaining = None;
        self.deferred.clear();
        self.scheduler.clear();
        self
    }

    /// Dispatch an event to its handlers.
    pub fn trigger(&mut self, event: SequenceEvent) -> &mut Self {
        self.emit(event);
        self
    }

    fn emit(&mut self, event: SequenceEvent) {
        let name = event.name().to_string();
        let mut ctx = EventContext::new(event, self.name.clone(), self.state, self.remaining);
        self.dispatch_depth += 1;
        self.bus.trigger(&name, &mut ctx);
        self.deferred.extend(ctx.take_commands());
        if self.listeners_armed {
            match ctx.event {
                SequenceEvent::AnimationCompleted { .. } => self.on_animation_complete(),
                SequenceEvent::Animated => self.on_animated(),
                _ => {}
            }
        }
        self.dispatch_depth -= 1;
        if self.dispatch_depth == 0 {
            // one at a time so `OffAll` can drop what is still queued
            while let Some(command) = self.deferred.pop_front() {
                self.apply(command);
            }
        }
    }

    fn apply(&mut self, command: SequenceCommand) {
        match command {
            SequenceCommand::Start => {
                self.start();
            }
            SequenceCommand::Pause => {
                self.pause();
            }
            SequenceCommand::Resume => {
                self.resume();
            }
            SequenceCommand::Rewind => {
                self.rewind();
            }
            SequenceCommand::Wait(ms) => {
                self.wait(ms);
            }
            SequenceCommand::StopStep(id) => {
                if let Err(err) = self.stop_step(id) {
                    debug!("stop_step({id}) from handler ignored: {err}");
                }
            }
            SequenceCommand::Off(name, id) => {
                self.off(&name, id);
            }
            SequenceCommand::OffAll => {
                self.off_all();
            }
        }
    }

    fn on_animation_complete(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
        self.check_animated();
    }

    fn check_animated(&mut self) {
        if self.listeners_armed
            && self.remaining == 0
            && !self.animated
            && self.state != SequenceState::Idle
        {
            self.animated = true;
            self.emit(SequenceEvent::Animated);
        }
    }

    fn on_animated(&mut self) {
        match self.pad_time {
            Some(pad) => {
                if let Some(old) = self.pad_timer.take() {
                    self.scheduler.cancel(old);
                }
                self.pad_timer = Some(self.scheduler.schedule(pad, TimerAction::PadElapsed));
            }
            None => self.finish_pass(),
        }
    }

    fn finish_pass(&mut self) {
        if self.pass_completed {
            return;
        }
        self.pass_completed = true;
        self.log("sequence completed");
        self.emit(SequenceEvent::Completed);
    }

    // ----- playback -----

    /// Play from the top, or resume if paused.
    pub fn start(&mut self) -> &mut Self {
        if self.state == SequenceState::Paused {
            return self.resume();
        }
        for step in &mut self.steps {
            step.reset(&mut self.scheduler);
        }
        self.cancel_pad();
        self.order = (0..self.steps.len()).collect();
        self.direction = Direction::Forward;
        self.begin_pass();
        self.listeners_armed = true;
        self.state = SequenceState::Playing;
        self.log("starting sequence");
        for &idx in &self.order {
            let step = &mut self.steps[idx];
            if step.state() == StepState::Stopped {
                continue;
            }
            let (when, id) = (step.when(), step.id());
            step.schedule_start(&mut self.scheduler, when, TimerAction::Play(id));
        }
        self.emit(SequenceEvent::Started {
            steps: self.remaining,
        });
        self.check_animated();
        self
    }

    /// Pause every active step, retaining state.
    pub fn pause(&mut self) -> &mut Self {
        if let Err(err) = self.try_pause() {
            debug!("pause ignored: {err}");
        }
        self
    }

    pub fn try_pause(&mut self) -> Result<()> {
        self.guard_transport("pause")?;
        if matches!(self.state, SequenceState::Paused | SequenceState::Idle) {
            return Err(self.no_op("pause"));
        }
        self.paused_at = Some(self.position());
        self.paused_since = Some(self.scheduler.now());
        self.log("pausing");
        for step in &mut self.steps {
            match step.state() {
                StepState::OnStack => {
                    step.hold(&mut self.scheduler);
                }
                StepState::Playing => {
                    step.pause(&mut self.renderer, &mut self.scheduler);
                }
                _ => {}
            }
        }
        if let Some(timer) = self.pad_timer.take() {
            let now = self.scheduler.now();
            self.pad_remaining = self
                .scheduler
                .due_of(timer)
                .map(|due| (due - now).max(0.0));
            self.scheduler.cancel(timer);
        }
        self.state = SequenceState::Paused;
        self.emit(SequenceEvent::Paused);
        Ok(())
    }

    /// Resume paused and held steps.
    pub fn resume(&mut self) -> &mut Self {
        if let Err(err) = self.try_resume() {
            debug!("resume ignored: {err}");
        }
        self
    }

    pub fn try_resume(&mut self) -> Result<()> {
        self.guard_transport("resume")?;
        if self.state != SequenceState::Paused {
            return Err(self.no_op("resume"));
        }
        let offset = self.paused_at.unwrap_or(0.0);
        if let Some(since) = self.paused_since.take() {
            self.paused_total += (self.scheduler.now() - since).max(0.0);
        }
        self.log("resuming");
        self.state = SequenceState::Resuming;
        for &idx in &self.order {
            let step = &mut self.steps[idx];
            match step.state() {
                StepState::Paused => {
                    step.resume(&mut self.renderer, &mut self.scheduler);
                }
                StepState::OnStackReset => {
                    let action = match self.direction {
                        Direction::Forward => TimerAction::Play(step.id()),
                        Direction::Rewind => TimerAction::Rewind(step.id()),
                    };
                    let delay = step.when() - offset;
                    step.release(&mut self.scheduler, delay, action);
                }
                _ => {}
            }
        }
        if let Some(rem) = self.pad_remaining.take() {
            self.pad_timer = Some(self.scheduler.schedule(rem, TimerAction::PadElapsed));
        }
        self.emit(SequenceEvent::Resuming);
        Ok(())
    }

    /// Replay the timeline in reverse toward each target's original style.
    pub fn rewind(&mut self) -> &mut Self {
        if let Err(err) = self.try_rewind() {
            debug!("rewind ignored: {err}");
        }
        self
    }

    pub fn try_rewind(&mut self) -> Result<()> {
        self.guard_transport("rewind")?;
        if let Err(err) = self.try_pause() {
            trace!("rewind: pause skipped ({err})");
        }
        let run_time = self.run_time();
        self.log("rewinding");
        for step in &mut self.steps {
            let when = run_time - step.original_when() - step.duration_ms();
            step.requeue(&mut self.renderer, &mut self.scheduler, when);
        }
        self.cancel_pad();
        self.order = (0..self.steps.len()).rev().collect();
        self.direction = Direction::Rewind;
        self.begin_pass();
        self.listeners_armed = true;
        self.state = SequenceState::Rewinding;
        for &idx in &self.order {
            let step = &mut self.steps[idx];
            if step.state() == StepState::Stopped {
                continue;
            }
            let (when, id) = (step.when(), step.id());
            step.schedule_start(&mut self.scheduler, when, TimerAction::Rewind(id));
        }
        self.emit(SequenceEvent::Rewinding);
        self.check_animated();
        Ok(())
    }

    /// Report completion of a step whose renderer deferred it.
    pub fn notify_step_complete(&mut self, id: StepId) -> Result<()> {
        let idx = self.index_of(id)?;
        if self.steps[idx].state() != StepState::Playing {
            return Err(SequencerError::NoOp {
                operation: "notify_step_complete".to_string(),
                state: self.steps[idx].state().name().to_string(),
            });
        }
        self.complete_step(idx);
        Ok(())
    }

    /// Exclude a step from this and every later pass.
    pub fn stop_step(&mut self, id: StepId) -> Result<()> {
        let idx = self.index_of(id)?;
        let was_pending = self.steps[idx].stop(&mut self.renderer, &mut self.scheduler);
        if was_pending && self.state != SequenceState::Idle {
            self.remaining = self.remaining.saturating_sub(1);
            self.check_animated();
        }
        Ok(())
    }

    /// Fire every timer due at the current clock time. Returns how many fired.
    pub fn tick(&mut self) -> usize {
        let now = self.scheduler.clock_now();
        let mut fired = 0;
        while let Some(timer) = self.scheduler.pop_due(now) {
            fired += 1;
            trace!("timer {:?} fired at {} ({:?})", timer.id, timer.due, timer.action);
            self.fire(timer);
        }
        self.scheduler.settle();
        fired
    }

    fn fire(&mut self, timer: Fired) {
        match timer.action {
            TimerAction::Play(id) => {
                let Ok(idx) = self.index_of(id) else { return };
                let transport = self.config.transport;
                let step = &mut self.steps[idx];
                if step.take_start_timer(timer.id) {
                    step.play(&mut self.renderer, &mut self.scheduler, transport);
                }
            }
            TimerAction::Rewind(id) => {
                let Ok(idx) = self.index_of(id) else { return };
                let step = &mut self.steps[idx];
                if step.take_start_timer(timer.id) {
                    step.rewind(&mut self.renderer, &mut self.scheduler);
                }
            }
            TimerAction::Complete(id) => {
                let Ok(idx) = self.index_of(id) else { return };
                if self.steps[idx].take_complete_timer(timer.id) {
                    self.complete_step(idx);
                }
            }
            TimerAction::PadElapsed => {
                if self.pad_timer == Some(timer.id) {
                    self.pad_timer = None;
                    self.finish_pass();
                }
            }
        }
    }

    fn complete_step(&mut self, idx: usize) {
        let step = &mut self.steps[idx];
        if step.complete(&mut self.renderer, &mut self.scheduler) {
            let snapshot = step.snapshot();
            self.emit(SequenceEvent::AnimationCompleted { step: snapshot });
        }
    }

    fn begin_pass(&mut self) {
        self.started_at = Some(self.scheduler.now());
        self.paused_at = None;
        self.paused_since = None;
        self.paused_total = 0.0;
        self.remaining = self
            .steps
            .iter()
            .filter(|s| s.state() != StepState::Stopped)
            .count();
        self.animated = false;
        self.pass_completed = false;
    }

    fn cancel_pad(&mut self) {
        if let Some(timer) = self.pad_timer.take() {
            self.scheduler.cancel(timer);
        }
        self.pad_remaining = None;
    }

    fn guard_transport(&self, operation: &str) -> Result<()> {
        if self.config.transport.supports_mid_flight_control() {
            Ok(())
        } else {
            Err(SequencerError::UnsupportedOperation {
                operation: operation.to_string(),
                transport: self.config.transport.name().to_string(),
            })
        }
    }

    fn guard_between_passes(&self, operation: &str) -> Result<()> {
        if self.state == SequenceState::Idle || self.pass_completed {
            Ok(())
        } else {
            Err(self.no_op(operation))
        }
    }

    fn no_op(&self, operation: &str) -> SequencerError {
        SequencerError::NoOp {
            operation: operation.to_string(),
            state: self.state.name().to_string(),
        }
    }

    fn index_of(&self, id: StepId) -> Result<usize> {
        self.index
            .get(&id)
            .copied()
            .ok_or_else(|| SequencerError::StepNotFound { id: id.to_string() })
    }

    /// Active time into the current pass, excluding paused intervals.
    fn position(&self) -> Millis {
        let Some(started) = self.started_at else {
            return 0.0;
        };
        let now = self.scheduler.now();
        let paused_now = self
            .paused_since
            .map(|since| (now - since).max(0.0))
            .unwrap_or(0.0);
        (now - started - self.paused_total - paused_now).max(0.0)
    }

    fn log(&self, message: &str) {
        if !self.debug {
            return;
        }
        let name = self.name.as_deref().unwrap_or("NO NAME");
        debug!(
            "DEBUG [{:06}] > {} \"{}\"",
            self.position().round() as u64,
            message,
            name
        );
    }

    // ----- queries -----

    /// End of the last-added step in the forward schedule.
    pub fn run_time(&self) -> Millis {
        self.steps
            .last()
            .map(|s| s.original_when() + s.duration_ms())
            .unwrap_or(0.0)
    }

    /// Timeline position of the current pass in ms.
    pub fn elapsed(&self) -> Millis {
        self.position()
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    #[inline]
    pub fn get_state(&self) -> SequenceState {
        self.state
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Steps still owed a completion in the current pass.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    #[inline]
    pub fn pad_time(&self) -> Option<Millis> {
        self.pad_time
    }

    /// Timeline position recorded by the last pause.
    #[inline]
    pub fn paused_at(&self) -> Option<Millis> {
        self.paused_at
    }

    #[inline]
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn set_debug(&mut self, debug: bool) -> &mut Self {
        self.debug = debug;
        self
    }

    #[inline]
    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Steps in insertion order.
    #[inline]
    pub fn steps(&self) -> &[Step<R::Handle>] {
        &self.steps
    }

    pub fn step(&self, id: StepId) -> Option<&Step<R::Handle>> {
        self.index.get(&id).and_then(|&i| self.steps.get(i))
    }

    /// Steps animating `target`, in insertion order.
    pub fn steps_for(&self, target: &str) -> Vec<&Step<R::Handle>> {
        self.steps.iter().filter(|s| s.target() == target).collect()
    }

    /// Step ids in the current pass's firing order.
    pub fn order(&self) -> Vec<StepId> {
        self.order.iter().map(|&i| self.steps[i].id()).collect()
    }

    #[inline]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    #[inline]
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    #[inline]
    pub fn easings(&self) -> &EasingRegistry {
        &self.easings
    }

    /// Live timers owned by the sequence and its steps.
    #[inline]
    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }

    /// Absolute clock time of the next due timer.
    #[inline]
    pub fn next_due(&self) -> Option<Millis> {
        self.scheduler.next_due()
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.bus.listener_count(name)
    }
}

impl<R: Renderer> fmt::Debug for Sequence<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("direction", &self.direction)
            .field("steps", &self.steps.len())
            .field("remaining", &self.remaining)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}
