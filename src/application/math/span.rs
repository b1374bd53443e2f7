use std::sync::Arc;

use metrics::counter;
use tracing::{debug, warn};

use crate::cache::MathRenderCache;

use super::{
    METRIC_MATH_CACHE_HIT_TOTAL, METRIC_MATH_FALLBACK_TOTAL, METRIC_MATH_RENDER_TOTAL,
    MathAvailability, MathBackend, MathDisplay,
};

/// Outcome of rendering one delimited formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedSpan {
    /// Trusted backend markup, inserted without escaping.
    Markup { markup: String, display: MathDisplay },
    /// The original text, delimiters included.
    Fallback(String),
}

impl RenderedSpan {
    pub fn is_fallback(&self) -> bool {
        matches!(self, RenderedSpan::Fallback(_))
    }

    pub fn to_html(&self) -> String {
        match self {
            RenderedSpan::Markup { markup, display } => {
                format!(
                    "<span class=\"math math-{}\">{markup}</span>",
                    display.as_str()
                )
            }
            RenderedSpan::Fallback(original) => format!(
                "<span class=\"math-fallback\">{}</span>",
                ammonia::clean_text(original)
            ),
        }
    }
}

/// Remove one delimiter pair matching `display`, if the expression is wrapped
/// in it on both ends. Anything else is returned unchanged.
pub fn strip_delimiters(expression: &str, display: MathDisplay) -> &str {
    let delimiter = display.delimiter();
    if expression.len() < delimiter.len() * 2 {
        return expression;
    }
    expression
        .strip_prefix(delimiter)
        .and_then(|rest| rest.strip_suffix(delimiter))
        .unwrap_or(expression)
}

/// Renders single formulas through the math backend, falling back to the
/// source text whenever no markup is available.
#[derive(Clone)]
pub struct MathSpanRenderer {
    backend: Arc<dyn MathBackend>,
    availability: MathAvailability,
    cache: Arc<MathRenderCache>,
}

impl MathSpanRenderer {
    pub fn new(
        backend: Arc<dyn MathBackend>,
        availability: MathAvailability,
        cache: Arc<MathRenderCache>,
    ) -> Self {
        Self {
            backend,
            availability,
            cache,
        }
    }

    pub fn render(&self, expression: &str, display: MathDisplay) -> RenderedSpan {
        if !self.availability.is_ready() {
            return fallback(expression, "backend_not_ready");
        }

        let bare = strip_delimiters(expression, display);
        if let Some(markup) = self.cache.get(display, bare) {
            counter!(METRIC_MATH_CACHE_HIT_TOTAL).increment(1);
            return RenderedSpan::Markup { markup, display };
        }

        // `display` would resolve to `tracing::field::display` inside the macros.
        let mode = display.as_str();
        match self.backend.render(bare, display.is_block()) {
            Ok(markup) if !markup.trim().is_empty() => {
                counter!(METRIC_MATH_RENDER_TOTAL, "display" => mode).increment(1);
                self.cache.insert(display, bare, markup.clone());
                RenderedSpan::Markup { markup, display }
            }
            Ok(_) => {
                warn!(
                    target = "application::math::span",
                    backend = self.backend.name(),
                    display = mode,
                    "Math backend returned empty markup"
                );
                fallback(expression, "empty_output")
            }
            Err(err) => {
                warn!(
                    target = "application::math::span",
                    backend = self.backend.name(),
                    display = mode,
                    error = %err,
                    "Math backend failed to render expression"
                );
                fallback(expression, "render_error")
            }
        }
    }
}

fn fallback(expression: &str, reason: &'static str) -> RenderedSpan {
    debug!(
        target = "application::math::span",
        reason, "Showing formula source instead of markup"
    );
    counter!(METRIC_MATH_FALLBACK_TOTAL, "reason" => reason).increment(1);
    RenderedSpan::Fallback(expression.to_string())
}
