//! In-memory renderer.
//!
//! Applies end values immediately, records every call, and keeps each
//! target's original snapshot for rewind. Used by tests, benches and
//! offline drivers; it does not interpolate.

use hashbrown::HashMap;

use crate::renderer::{Completion, Renderer, Timing};
use crate::value::{Properties, PropertyValue};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TargetHandle(pub usize);

/// One recorded renderer call.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderCall {
    Transition {
        target: String,
        properties: Properties,
        start: Properties,
        duration_ms: f64,
        easing: String,
    },
    Animate {
        target: String,
        properties: Properties,
        duration_ms: f64,
        easing: String,
    },
    Freeze {
        target: String,
        snapshot: Properties,
    },
    Unfreeze {
        target: String,
    },
    RestoreOriginal {
        target: String,
        duration_ms: f64,
    },
    FinishRewind {
        target: String,
    },
}

impl RenderCall {
    pub fn target(&self) -> &str {
        match self {
            Self::Transition { target, .. }
            | Self::Animate { target, .. }
            | Self::Freeze { target, .. }
            | Self::Unfreeze { target }
            | Self::RestoreOriginal { target, .. }
            | Self::FinishRewind { target } => target,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transition { .. } => "transition",
            Self::Animate { .. } => "animate",
            Self::Freeze { .. } => "freeze",
            Self::Unfreeze { .. } => "unfreeze",
            Self::RestoreOriginal { .. } => "restore_original",
            Self::FinishRewind { .. } => "finish_rewind",
        }
    }
}

#[derive(Debug)]
struct TargetRecord {
    name: String,
    values: Properties,
    original: Option<Properties>,
    frozen: bool,
    rewinding: bool,
}

#[derive(Debug)]
pub struct HeadlessRenderer {
    targets: Vec<TargetRecord>,
    index: HashMap<String, usize>,
    calls: Vec<RenderCall>,
    animate_completion: Completion,
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self {
            targets: Vec::new(),
            index: HashMap::new(),
            calls: Vec::new(),
            animate_completion: Completion::Timed,
        }
    }

    /// Builder-style `add_target`.
    pub fn with_target(mut self, name: impl Into<String>, values: Properties) -> Self {
        self.add_target(name, values);
        self
    }

    /// Register (or reset) a target with its initial values.
    ///
    /// Handles already handed out stay valid. A target whose original style
    /// was captured takes `values` as its new original, since callers that
    /// cache handles never capture twice.
    pub fn add_target(&mut self, name: impl Into<String>, values: Properties) -> TargetHandle {
        let name = name.into();
        if let Some(&idx) = self.index.get(&name) {
            let rec = &mut self.targets[idx];
            if rec.original.is_some() {
                rec.original = Some(values.clone());
            }
            rec.values = values;
            return TargetHandle(idx);
        }
        let idx = self.targets.len();
        self.index.insert(name.clone(), idx);
        self.targets.push(TargetRecord {
            name,
            values,
            original: None,
            frozen: false,
            rewinding: false,
        });
        TargetHandle(idx)
    }

    /// How `animate` reports completion.
    pub fn with_animate_completion(mut self, completion: Completion) -> Self {
        self.animate_completion = completion;
        self
    }

    #[inline]
    pub fn calls(&self) -> &[RenderCall] {
        &self.calls
    }

    pub fn calls_for<'a>(&'a self, target: &'a str) -> impl Iterator<Item = &'a RenderCall> + 'a {
        self.calls.iter().filter(move |c| c.target() == target)
    }

    pub fn values(&self, target: &str) -> Option<&Properties> {
        self.record(target).map(|r| &r.values)
    }

    pub fn value(&self, target: &str, property: &str) -> Option<&PropertyValue> {
        self.values(target).and_then(|v| v.get(property))
    }

    pub fn original(&self, target: &str) -> Option<&Properties> {
        self.record(target).and_then(|r| r.original.as_ref())
    }

    pub fn is_frozen(&self, target: &str) -> bool {
        self.record(target).map(|r| r.frozen).unwrap_or(false)
    }

    pub fn is_rewinding(&self, target: &str) -> bool {
        self.record(target).map(|r| r.rewinding).unwrap_or(false)
    }

    fn record(&self, target: &str) -> Option<&TargetRecord> {
        self.index.get(target).and_then(|&i| self.targets.get(i))
    }

    fn record_mut(&mut self, handle: &TargetHandle) -> Option<&mut TargetRecord> {
        self.targets.get_mut(handle.0)
    }

    fn name_of(&self, handle: &TargetHandle) -> String {
        self.targets
            .get(handle.0)
            .map(|r| r.name.clone())
            .unwrap_or_default()
    }

    fn apply(&mut self, handle: &TargetHandle, properties: &Properties) {
        if let Some(rec) = self.record_mut(handle) {
            for (name, value) in properties.iter() {
                let next = resolve_relative(rec.values.get(name), value);
                rec.values.insert(name, next);
            }
        }
    }
}

/// `"+=N"` / `"-=N"` against a numeric current value; anything else is taken
/// as-is.
fn resolve_relative(current: Option<&PropertyValue>, value: &PropertyValue) -> PropertyValue {
    let (Some(text), Some(base)) = (value.as_text(), current.and_then(|c| c.as_number())) else {
        return value.clone();
    };
    let (sign, rest) = match text.get(..2) {
        Some("+=") => (1.0, &text[2..]),
        Some("-=") => (-1.0, &text[2..]),
        _ => return value.clone(),
    };
    match rest.trim().parse::<f64>() {
        Ok(delta) => PropertyValue::Number(base + sign * delta),
        Err(_) => value.clone(),
    }
}

impl Renderer for HeadlessRenderer {
    type Handle = TargetHandle;

    fn resolve(&mut self, target: &str) -> Option<TargetHandle> {
        self.index.get(target).map(|&i| TargetHandle(i))
    }

    fn capture_original(&mut self, handle: &TargetHandle) {
        if let Some(rec) = self.record_mut(handle) {
            if rec.original.is_none() {
                rec.original = Some(rec.values.clone());
            }
        }
    }

    fn current_value(&mut self, handle: &TargetHandle, property: &str) -> Option<PropertyValue> {
        self.targets
            .get(handle.0)
            .and_then(|r| r.values.get(property).cloned())
    }

    fn animate(
        &mut self,
        handle: &TargetHandle,
        properties: &Properties,
        timing: &Timing,
    ) -> Completion {
        let target = self.name_of(handle);
        self.calls.push(RenderCall::Animate {
            target,
            properties: properties.clone(),
            duration_ms: timing.duration_ms,
            easing: timing.easing.clone(),
        });
        self.apply(handle, properties);
        self.animate_completion
    }

    fn transition(
        &mut self,
        handle: &TargetHandle,
        properties: &Properties,
        start: &Properties,
        timing: &Timing,
    ) {
        let target = self.name_of(handle);
        self.calls.push(RenderCall::Transition {
            target,
            properties: properties.clone(),
            start: start.clone(),
            duration_ms: timing.duration_ms,
            easing: timing.easing.clone(),
        });
        self.apply(handle, properties);
    }

    fn freeze(&mut self, handle: &TargetHandle, snapshot: &Properties) {
        let target = self.name_of(handle);
        self.calls.push(RenderCall::Freeze {
            target,
            snapshot: snapshot.clone(),
        });
        if let Some(rec) = self.record_mut(handle) {
            rec.frozen = true;
        }
    }

    fn unfreeze(&mut self, handle: &TargetHandle, _snapshot: &Properties) {
        let target = self.name_of(handle);
        self.calls.push(RenderCall::Unfreeze { target });
        if let Some(rec) = self.record_mut(handle) {
            rec.frozen = false;
        }
    }

    fn restore_original(&mut self, handle: &TargetHandle, timing: &Timing) {
        let target = self.name_of(handle);
        self.calls.push(RenderCall::RestoreOriginal {
            target,
            duration_ms: timing.duration_ms,
        });
        if let Some(rec) = self.record_mut(handle) {
            if let Some(original) = rec.original.clone() {
                rec.values = original;
            }
            rec.rewinding = true;
        }
    }

    fn finish_rewind(&mut self, handle: &TargetHandle) {
        let target = self.name_of(handle);
        self.calls.push(RenderCall::FinishRewind { target });
        if let Some(rec) = self.record_mut(handle) {
            rec.rewinding = false;
        }
    }
}
