//! Process-wide tracing subscriber plus the metric names emitted by the
//! request pipeline.

use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, Registry, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

pub const GUARD_ALLOWED_TOTAL: &str = "cafe_guard_allowed_total";
pub const GUARD_DENIED_TOTAL: &str = "cafe_guard_denied_total";
pub const INTERCEPTOR_APPLIED_TOTAL: &str = "cafe_interceptor_applied_total";
pub const ERROR_FILTER_APPLIED_TOTAL: &str = "cafe_error_filter_applied_total";

static DESCRIBED: Once = Once::new();

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Installs the global subscriber. `RUST_LOG` directives win over the
/// configured level when present.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    DESCRIBED.call_once(register_pipeline_metrics);

    let filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    Registry::default()
        .with(output_layer(logging.format))
        .with(ErrorLayer::default())
        .with(filter)
        .try_init()
        .map_err(|err| InfraError::telemetry(format!("subscriber already installed: {err}")))
}

fn output_layer(format: LogFormat) -> BoxedLayer {
    match format {
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
    }
}

fn register_pipeline_metrics() {
    let counters = [
        (
            GUARD_ALLOWED_TOTAL,
            "Requests the global guard allowed through.",
        ),
        (
            GUARD_DENIED_TOTAL,
            "Requests the global guard rejected before any handler ran.",
        ),
        (
            INTERCEPTOR_APPLIED_TOTAL,
            "Handler results wrapped by the global response interceptor.",
        ),
        (
            ERROR_FILTER_APPLIED_TOTAL,
            "Handler failures translated by the global error filter.",
        ),
    ];

    for (name, help) in counters {
        describe_counter!(name, Unit::Count, help);
    }
}
