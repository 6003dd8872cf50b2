use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
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
            "meridian_post_fallback_total",
            Unit::Count,
            "Database post lookups that failed and were served from static files."
        );
        describe_counter!(
            "meridian_static_post_errors_total",
            Unit::Count,
            "Static post files skipped because they could not be parsed."
        );
        describe_counter!(
            "meridian_contact_submissions_total",
            Unit::Count,
            "Contact form messages accepted, labelled by outcome."
        );
        describe_counter!(
            "meridian_contact_rejected_total",
            Unit::Count,
            "Contact form submissions refused, labelled by reason."
        );
        describe_counter!(
            "meridian_scheduled_posts_published_total",
            Unit::Count,
            "Scheduled posts promoted to published by the scheduler."
        );
    });
}
