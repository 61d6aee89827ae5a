//! Logging integration for the schemaform workspace.
//!
//! Provides a helper for configuring [`tracing`]-based logging from
//! [`Settings`](crate::Settings) and span constructors for the two form
//! passes (render and accept).

use crate::settings::Settings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The filter directive comes from `settings.log_level`. In debug mode a
/// pretty, human-readable format is used; otherwise output is structured
/// JSON. Repeated calls are a no-op once a subscriber is installed.
pub fn setup_logging(settings: &Settings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a tracing span for one render pass over a schema.
///
/// # Examples
///
/// ```
/// let span = schemaform_core::logging::render_span("person");
/// let _guard = span.enter();
/// tracing::debug!("rendering form");
/// ```
pub fn render_span(table: &str) -> tracing::Span {
    tracing::debug_span!("form_render", table = table)
}

/// Creates a tracing span for one accept pass over a submission.
pub fn accept_span(table: &str) -> tracing::Span {
    tracing::debug_span!("form_accept", table = table)
}
