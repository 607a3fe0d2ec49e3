//! Easing aliases.
//!
//! An alias maps to either a cubic-bezier descriptor `(x1, y1, x2, y2)` or a
//! custom curve. Renderers receive the resolved `Easing` in `Timing` and may
//! forward the descriptor (e.g. as `cubic-bezier(...)`) or sample it with
//! `ease`.

use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;

/// Custom easing curve over normalized time.
pub type EasingFn = Arc<dyn Fn(f32) -> f32 + Send + Sync>;

#[derive(Clone)]
pub enum Easing {
    CubicBezier([f32; 4]),
    Function(EasingFn),
}

impl Easing {
    pub fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::CubicBezier([x1, y1, x2, y2])
    }

    pub fn function<F>(f: F) -> Self
    where
        F: Fn(f32) -> f32 + Send + Sync + 'static,
    {
        Self::Function(Arc::new(f))
    }

    /// Eased progress for normalized time `t` (clamped to [0,1]).
    pub fn ease(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::CubicBezier([x1, y1, x2, y2]) => bezier_ease_t(t, *x1, *y1, *x2, *y2),
            Self::Function(f) => f(t),
        }
    }
}

impl fmt::Debug for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CubicBezier(c) => f.debug_tuple("CubicBezier").field(c).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

#[inline]
fn cubic_bezier(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// Invert the x bezier by bisection, then evaluate y.
#[inline]
fn bezier_ease_t(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    if x1 == 0.0 && y1 == 0.0 && x2 == 1.0 && y2 == 1.0 {
        return t;
    }
    let mut lo = 0.0f32;
    let mut hi = 1.0f32;
    let mut mid = t;
    for _ in 0..24 {
        let x = cubic_bezier(0.0, x1, x2, 1.0, mid);
        if (x - t).abs() < 1e-6 {
            break;
        }
        if x < t {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = 0.5 * (lo + hi);
    }
    cubic_bezier(0.0, y1, y2, 1.0, mid)
}

const BUILTINS: &[(&str, [f32; 4])] = &[
    ("ease", [0.25, 0.1, 0.25, 1.0]),
    ("linear", [0.0, 0.0, 1.0, 1.0]),
    ("ease-in", [0.42, 0.0, 1.0, 1.0]),
    ("ease-out", [0.0, 0.0, 0.58, 1.0]),
    ("ease-in-out", [0.42, 0.0, 0.58, 1.0]),
    ("snap", [0.0, 1.0, 0.5, 1.0]),
    ("easeInQuad", [0.55, 0.085, 0.68, 0.53]),
    ("easeOutQuad", [0.25, 0.46, 0.45, 0.94]),
    ("easeInOutQuad", [0.455, 0.03, 0.515, 0.955]),
    ("easeInCubic", [0.55, 0.055, 0.675, 0.19]),
    ("easeOutCubic", [0.215, 0.61, 0.355, 1.0]),
    ("easeInOutCubic", [0.645, 0.045, 0.355, 1.0]),
    ("easeInQuart", [0.895, 0.03, 0.685, 0.22]),
    ("easeOutQuart", [0.165, 0.84, 0.44, 1.0]),
    ("easeInOutQuart", [0.77, 0.0, 0.175, 1.0]),
    ("easeInQuint", [0.755, 0.05, 0.855, 0.06]),
    ("easeOutQuint", [0.23, 1.0, 0.32, 1.0]),
    ("easeInOutQuint", [0.86, 0.0, 0.07, 1.0]),
    ("easeInSine", [0.47, 0.0, 0.745, 0.715]),
    ("easeOutSine", [0.39, 0.575, 0.565, 1.0]),
    ("easeInOutSine", [0.445, 0.05, 0.55, 0.95]),
    ("easeInExpo", [0.95, 0.05, 0.795, 0.035]),
    ("easeOutExpo", [0.19, 1.0, 0.22, 1.0]),
    ("easeInOutExpo", [1.0, 0.0, 0.0, 1.0]),
    ("easeInCirc", [0.6, 0.04, 0.98, 0.335]),
    ("easeOutCirc", [0.075, 0.82, 0.165, 1.0]),
    ("easeInOutCirc", [0.785, 0.135, 0.15, 0.86]),
    ("easeInBack", [0.6, -0.28, 0.735, 0.045]),
    ("easeOutBack", [0.175, 0.885, 0.32, 1.275]),
    ("easeInOutBack", [0.68, -0.55, 0.265, 1.55]),
];

/// Alias → easing table.
#[derive(Clone, Debug, Default)]
pub struct EasingRegistry {
    entries: HashMap<String, Easing>,
}

impl EasingRegistry {
    /// Registry with no aliases at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// CSS keywords plus the Penner-style aliases.
    pub fn with_builtins() -> Self {
        let mut reg = Self::empty();
        for (alias, ctrl) in BUILTINS {
            reg.entries
                .insert((*alias).to_string(), Easing::CubicBezier(*ctrl));
        }
        reg
    }

    #[inline]
    pub fn has(&self, alias: &str) -> bool {
        self.entries.contains_key(alias)
    }

    #[inline]
    pub fn resolve(&self, alias: &str) -> Option<&Easing> {
        self.entries.get(alias)
    }

    /// Register or replace an alias.
    pub fn add_easing(&mut self, alias: impl Into<String>, easing: Easing) {
        self.entries.insert(alias.into(), easing);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn builtins_present() {
        let reg = EasingRegistry::with_builtins();
        for alias in ["ease", "linear", "snap", "easeOutExpo", "easeInOutBack"] {
            assert!(reg.has(alias), "missing {alias}");
        }
        assert!(!reg.has("bogus"));
        assert!(EasingRegistry::empty().is_empty());
    }

    #[test]
    fn linear_is_identity() {
        let reg = EasingRegistry::with_builtins();
        let linear = reg.resolve("linear").expect("linear");
        for t in [0.0, 0.25, 0.5, 0.9, 1.0] {
            assert!(approx(linear.ease(t), t));
        }
    }

    #[test]
    fn bezier_endpoints_and_monotonic_progress() {
        let reg = EasingRegistry::with_builtins();
        let e = reg.resolve("easeOutExpo").expect("alias");
        assert!(approx(e.ease(0.0), 0.0));
        assert!(approx(e.ease(1.0), 1.0));
        // ease-out front-loads progress
        assert!(e.ease(0.25) > 0.5);
        assert!(matches!(e, Easing::CubicBezier([x1, ..]) if approx(*x1, 0.19)));
    }

    #[test]
    fn custom_function_easing() {
        let mut reg = EasingRegistry::with_builtins();
        reg.add_easing("square", Easing::function(|t| t * t));
        let e = reg.resolve("square").expect("custom");
        assert!(approx(e.ease(0.5), 0.25));
        assert!(approx(e.ease(2.0), 1.0));
        assert!(matches!(e, Easing::Function(_)));
    }
}
