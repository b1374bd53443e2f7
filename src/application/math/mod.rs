//! Math typesetting: backend contract, readiness monitor and span rendering.

mod availability;
mod backend;
mod span;

use serde::Serialize;

pub use availability::{
    AvailabilityConfig, AvailabilityConfigError, BackendState, DEFAULT_AVAILABILITY_TIMEOUT,
    DEFAULT_POLL_INTERVAL, MathAvailability, Subscription, configure_math_availability,
    math_availability,
};
pub use backend::{DisabledBackend, KatexBackend, MathBackend, MathBackendError};
pub use span::{MathSpanRenderer, RenderedSpan, strip_delimiters};

pub const METRIC_MATH_RENDER_TOTAL: &str = "gradebridge_math_render_total";
pub const METRIC_MATH_FALLBACK_TOTAL: &str = "gradebridge_math_fallback_total";
pub const METRIC_MATH_CACHE_HIT_TOTAL: &str = "gradebridge_math_cache_hit_total";

/// Whether a formula is typeset inline (`$…$`) or as a block (`$$…$$`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MathDisplay {
    Inline,
    Block,
}

impl MathDisplay {
    pub fn is_block(self) -> bool {
        matches!(self, MathDisplay::Block)
    }

    pub fn delimiter(self) -> &'static str {
        match self {
            MathDisplay::Inline => "$",
            MathDisplay::Block => "$$",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MathDisplay::Inline => "inline",
            MathDisplay::Block => "block",
        }
    }
}
