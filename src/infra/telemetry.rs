use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::{
    application::{
        math::{METRIC_MATH_CACHE_HIT_TOTAL, METRIC_MATH_FALLBACK_TOTAL, METRIC_MATH_RENDER_TOTAL},
        print::METRIC_PAGES_RENDERED_TOTAL,
    },
    config::{LogFormat, LoggingSettings},
};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
///
/// Logs go to stderr so rendered documents can be piped from stdout.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_MATH_RENDER_TOTAL,
            Unit::Count,
            "Total number of formulas typeset by the math backend."
        );
        describe_counter!(
            METRIC_MATH_FALLBACK_TOTAL,
            Unit::Count,
            "Total number of formulas shown as source text instead of markup."
        );
        describe_counter!(
            METRIC_MATH_CACHE_HIT_TOTAL,
            Unit::Count,
            "Total number of formulas served from the render cache."
        );
        describe_counter!(
            METRIC_PAGES_RENDERED_TOTAL,
            Unit::Count,
            "Total number of pages rendered into print documents."
        );
    });
}
