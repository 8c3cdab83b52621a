//! Tracing configuration and initialization.

use std::io;

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Configuration for tracing initialization.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Service name reported at startup
    pub service_name: String,
    /// Default level when `RUST_LOG` is unset
    pub log_level: Level,
    /// Emit one JSON object per event
    pub json_output: bool,
    /// Include file and line numbers
    pub include_location: bool,
    /// Include target (module path)
    pub include_target: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: "gke-mcp".to_string(),
            log_level: Level::INFO,
            json_output: false,
            include_location: false,
            include_target: true,
        }
    }
}

impl TracingConfig {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.log_level = level;
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json_output = json;
        self
    }

    pub fn with_location(mut self, include: bool) -> Self {
        self.include_location = include;
        self
    }

    /// `RUST_LOG` wins over the configured level.
    fn build_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.log_level.to_string()))
    }
}

/// Initialize tracing with the given configuration.
///
/// Call once at startup. Events are written to stderr.
///
/// ```no_run
/// use observability::{init_tracing, TracingConfig};
/// use tracing::Level;
///
/// init_tracing(TracingConfig::new("gke-mcp").with_level(Level::DEBUG));
/// ```
pub fn init_tracing(config: TracingConfig) {
    let filter = config.build_filter();

    if config.json_output {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(io::stderr)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_target(config.include_target);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(io::stderr)
            .with_ansi(false)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_target(config.include_target);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }

    tracing::info!(
        service = %config.service_name,
        level = %config.log_level,
        "Tracing initialized"
    );
}

/// Span wrapping a single tool call.
#[macro_export]
macro_rules! tool_span {
    ($tool:expr) => {
        tracing::info_span!("tool_call", tool = %$tool)
    };
}

/// Span wrapping a single prompt render.
#[macro_export]
macro_rules! prompt_span {
    ($prompt:expr) => {
        tracing::info_span!("prompt_get", prompt = %$prompt)
    };
}
