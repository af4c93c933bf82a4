#![forbid(unsafe_code)]

//! Time-based transition primitives.
//!
//! Nothing here reads a clock. The host advances every animation with an
//! explicit `dt`, so overlays animate deterministically under test.

use std::time::Duration;

/// Tooltip entrance duration.
pub const ENTER_DURATION: Duration = Duration::from_millis(300);
/// Tooltip exit duration.
pub const EXIT_DURATION: Duration = Duration::from_millis(200);
/// Dialog busy overlay fade-out duration.
pub const BUSY_FADE_DURATION: Duration = Duration::from_millis(500);
/// Vertical travel of tooltip transitions.
pub const TRANSITION_TRAVEL: f64 = 10.0;

// ---------------------------------------------------------------------------
// Easing
// ---------------------------------------------------------------------------

/// Maps `t` in [0, 1] to output in [0, 1].
pub type EasingFn = fn(f32) -> f32;

#[inline]
pub fn linear(t: f32) -> f32 {
    t.clamp(0.0, 1.0)
}

/// Quadratic ease-out.
#[inline]
pub fn ease_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Quadratic ease-in-out.
#[inline]
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

// ---------------------------------------------------------------------------
// Animation trait
// ---------------------------------------------------------------------------

/// A time-based animation producing values in [0.0, 1.0].
pub trait Animation {
    /// Advance by `dt`.
    fn tick(&mut self, dt: Duration);

    fn is_complete(&self) -> bool;

    /// Current eased progress.
    fn value(&self) -> f32;

    fn reset(&mut self);
}

// ---------------------------------------------------------------------------
// Fade
// ---------------------------------------------------------------------------

/// Progression from 0.0 to 1.0 over a fixed duration.
#[derive(Debug, Clone, Copy)]
pub struct Fade {
    elapsed: Duration,
    duration: Duration,
    easing: EasingFn,
}

impl Fade {
    pub fn new(duration: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            duration: if duration.is_zero() {
                Duration::from_nanos(1)
            } else {
                duration
            },
            easing: linear,
        }
    }

    #[must_use]
    pub fn easing(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    fn raw_progress(&self) -> f32 {
        let t = self.elapsed.as_secs_f64() / self.duration.as_secs_f64();
        (t as f32).clamp(0.0, 1.0)
    }
}

impl Animation for Fade {
    fn tick(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt);
    }

    fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    fn value(&self) -> f32 {
        (self.easing)(self.raw_progress())
    }

    fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }
}

// ---------------------------------------------------------------------------
// Transition
// ---------------------------------------------------------------------------

/// Which way a [`Transition`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    /// Fade in while travelling onto the placement.
    Enter,
    /// Fade out while travelling away from the placement.
    Exit,
}

/// A combined offset and opacity transition with a one-shot completion
/// signal.
///
/// [`advance`](Self::advance) and [`finish`](Self::finish) report completion
/// at most once between them, whatever the tick granularity.
#[derive(Debug, Clone, Copy)]
pub struct Transition {
    kind: TransitionKind,
    fade: Fade,
    from_offset: f64,
    to_offset: f64,
    reported: bool,
}

impl Transition {
    /// Entrance starting `from_offset` pixels off the placement.
    ///
    /// A panel placed above its anchor enters from `-10`, one placed below
    /// from `+10`.
    pub fn enter(from_offset: f64) -> Self {
        Self {
            kind: TransitionKind::Enter,
            fade: Fade::new(ENTER_DURATION).easing(ease_out),
            from_offset,
            to_offset: 0.0,
            reported: false,
        }
    }

    /// Exit travelling to `to_offset` pixels off the placement.
    pub fn exit(to_offset: f64) -> Self {
        Self {
            kind: TransitionKind::Exit,
            fade: Fade::new(EXIT_DURATION).easing(ease_in_out),
            from_offset: 0.0,
            to_offset,
            reported: false,
        }
    }

    /// Plain fade-out with no travel.
    pub fn fade_out(duration: Duration) -> Self {
        Self {
            kind: TransitionKind::Exit,
            fade: Fade::new(duration),
            from_offset: 0.0,
            to_offset: 0.0,
            reported: false,
        }
    }

    pub fn kind(&self) -> TransitionKind {
        self.kind
    }

    pub fn duration(&self) -> Duration {
        self.fade.duration()
    }

    /// Current vertical offset relative to the placement.
    pub fn offset(&self) -> f64 {
        let t = f64::from(self.fade.value());
        self.from_offset + (self.to_offset - self.from_offset) * t
    }

    /// Current opacity.
    pub fn opacity(&self) -> f64 {
        let t = f64::from(self.fade.value());
        match self.kind {
            TransitionKind::Enter => t,
            TransitionKind::Exit => 1.0 - t,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.fade.is_complete()
    }

    /// Advance by `dt`. Returns `true` on the call that completes the
    /// transition and never again afterwards.
    pub fn advance(&mut self, dt: Duration) -> bool {
        if self.reported {
            return false;
        }
        self.fade.tick(dt);
        if self.fade.is_complete() {
            self.reported = true;
            return true;
        }
        false
    }

    /// Jump to the end. Returns `true` if completion had not been reported
    /// yet.
    pub fn finish(&mut self) -> bool {
        let remaining = self.fade.duration();
        self.fade.tick(remaining);
        if self.reported {
            return false;
        }
        self.reported = true;
        true
    }
}
