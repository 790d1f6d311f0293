//! Transition timing
//!
//! [`TransitionSpec`] carries the identity and timing of a transition. It is
//! orthogonal to the geometry: the same spec drives both the outgoing and the
//! incoming element. [`TransitionTimeline`] turns a spec plus a start instant
//! into a progress fraction for any later instant.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::kind::TransitionKind;

/// Default transition duration in milliseconds
pub const DEFAULT_TRANSITION_DURATION_MS: u32 = 500;

/// Easing applied to linear progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EasingCurve {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
}

impl EasingCurve {
    /// Map linear progress (0.0-1.0) to eased progress
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            EasingCurve::Linear => t,
            EasingCurve::EaseIn => t * t,
            EasingCurve::EaseOut => t * (2.0 - t),
            EasingCurve::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
        }
    }
}

impl std::fmt::Display for EasingCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EasingCurve::Linear => "linear",
            EasingCurve::EaseIn => "ease-in",
            EasingCurve::EaseOut => "ease-out",
            EasingCurve::EaseInOut => "ease-in-out",
        };
        f.write_str(name)
    }
}

impl From<String> for EasingCurve {
    /// Unrecognised names fall back to linear
    fn from(name: String) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "ease-in" => EasingCurve::EaseIn,
            "ease-out" => EasingCurve::EaseOut,
            "ease-in-out" => EasingCurve::EaseInOut,
            _ => EasingCurve::Linear,
        }
    }
}

impl From<EasingCurve> for String {
    fn from(curve: EasingCurve) -> Self {
        curve.to_string()
    }
}

/// Identity and timing of a transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionSpec {
    #[serde(rename = "kind")]
    pub kind: TransitionKind,

    #[serde(rename = "durationMs", default = "default_duration_ms")]
    pub duration_ms: u32,

    #[serde(rename = "delayMs", default)]
    pub delay_ms: u32,

    /// Number of cycles to run (at least 1)
    #[serde(rename = "repeatCount", default = "default_repeat_count")]
    pub repeat_count: u32,

    /// Run every second cycle backwards
    #[serde(rename = "autoReverse", default)]
    pub auto_reverse: bool,

    #[serde(rename = "easing", default)]
    pub easing: EasingCurve,
}

fn default_duration_ms() -> u32 {
    DEFAULT_TRANSITION_DURATION_MS
}

fn default_repeat_count() -> u32 {
    1
}

impl Default for TransitionSpec {
    fn default() -> Self {
        Self {
            kind: TransitionKind::Fade,
            duration_ms: DEFAULT_TRANSITION_DURATION_MS,
            delay_ms: 0,
            repeat_count: 1,
            auto_reverse: false,
            easing: EasingCurve::Linear,
        }
    }
}

impl TransitionSpec {
    /// Create a spec with the given kind and duration
    pub fn new(kind: TransitionKind, duration_ms: u32) -> Self {
        Self {
            kind,
            duration_ms,
            ..Default::default()
        }
    }

    /// Instant cut with no duration
    pub fn cut() -> Self {
        Self::new(TransitionKind::Swap, 0)
    }

    pub fn with_delay(mut self, delay_ms: u32) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn with_repeat(mut self, repeat_count: u32, auto_reverse: bool) -> Self {
        self.repeat_count = repeat_count;
        self.auto_reverse = auto_reverse;
        self
    }

    pub fn with_easing(mut self, easing: EasingCurve) -> Self {
        self.easing = easing;
        self
    }

    fn cycles(&self) -> u32 {
        self.repeat_count.max(1)
    }

    /// Total time from start to completion, including the delay
    pub fn total_duration(&self) -> Duration {
        Duration::from_millis(self.delay_ms as u64)
            + Duration::from_millis(self.duration_ms as u64) * self.cycles()
    }

    /// Eased fraction after `elapsed` time since the transition started
    pub fn fraction_at(&self, elapsed: Duration) -> f64 {
        let delay = Duration::from_millis(self.delay_ms as u64);
        let Some(active) = elapsed.checked_sub(delay) else {
            return 0.0;
        };

        let cycles = self.cycles();
        let cycle_len = Duration::from_millis(self.duration_ms as u64);
        if cycle_len.is_zero() || active >= cycle_len * cycles {
            return self.easing.apply(self.final_linear_fraction());
        }

        let position = active.as_secs_f64() / cycle_len.as_secs_f64();
        let cycle = position.floor() as u32;
        let within = position - cycle as f64;
        let linear = if self.auto_reverse && cycle % 2 == 1 {
            1.0 - within
        } else {
            within
        };
        self.easing.apply(linear)
    }

    /// Where the last cycle leaves the linear fraction
    fn final_linear_fraction(&self) -> f64 {
        if self.auto_reverse && self.cycles() % 2 == 0 {
            0.0
        } else {
            1.0
        }
    }
}

/// A running transition anchored at a start instant
#[derive(Debug, Clone)]
pub struct TransitionTimeline {
    spec: TransitionSpec,
    started_at: Instant,
}

impl TransitionTimeline {
    pub fn start(spec: TransitionSpec, now: Instant) -> Self {
        Self {
            spec,
            started_at: now,
        }
    }

    pub fn spec(&self) -> &TransitionSpec {
        &self.spec
    }

    /// Eased fraction at `now`; instants before the start read as 0
    pub fn fraction(&self, now: Instant) -> f64 {
        self.spec
            .fraction_at(now.saturating_duration_since(self.started_at))
    }

    pub fn is_complete(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started_at) >= self.spec.total_duration()
    }
}
