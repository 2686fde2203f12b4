//! # plume-telemetry
//!
//! Logging bootstrap shared by the server and the CLI.

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Output format for log lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line (server default).
    #[default]
    Json,
    /// Human-readable, for interactive use.
    Pretty,
}

/// Configuration for the telemetry subsystem.
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    /// Default log level. Overridden by RUST_LOG env var.
    pub log_level: Level,
    /// Per-module level overrides (e.g. "plume_spellcheck" => DEBUG).
    pub module_levels: Vec<(String, Level)>,
    pub format: LogFormat,
    /// Write logs to stderr instead of stdout.
    pub to_stderr: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            module_levels: Vec::new(),
            format: LogFormat::Json,
            to_stderr: false,
        }
    }
}

impl TelemetryConfig {
    /// Config suited to the interactive CLI: pretty output on stderr, warnings only.
    pub fn interactive() -> Self {
        Self {
            log_level: Level::WARN,
            module_levels: Vec::new(),
            format: LogFormat::Pretty,
            to_stderr: true,
        }
    }

    /// Build the filter directive string from the configured levels.
    pub fn filter_directive(&self) -> String {
        let mut filter_str = self.log_level.to_string().to_lowercase();
        for (module, level) in &self.module_levels {
            filter_str.push_str(&format!(",{}={}", module, level.to_string().to_lowercase()));
        }
        filter_str
    }
}

/// Returned by [`init_telemetry`]; reports what was installed.
#[derive(Debug)]
pub struct TelemetryGuard {
    filter: String,
    installed: bool,
}

impl TelemetryGuard {
    /// The effective filter directive.
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// False when a global subscriber was already set before this call.
    pub fn installed(&self) -> bool {
        self.installed
    }
}

/// Initialize the global tracing subscriber. Call once at startup.
pub fn init_telemetry(config: TelemetryConfig) -> TelemetryGuard {
    let directive = config.filter_directive();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directive));
    let filter = env_filter.to_string();

    let fmt_layer = match (config.format, config.to_stderr) {
        (LogFormat::Json, false) => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_span_list(true)
            .boxed(),
        (LogFormat::Json, true) => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_span_list(true)
            .with_writer(std::io::stderr)
            .boxed(),
        (LogFormat::Pretty, false) => tracing_subscriber::fmt::layer().with_target(false).boxed(),
        (LogFormat::Pretty, true) => tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    let installed = tracing_subscriber::registry()
        .with(fmt_layer.with_filter(env_filter))
        .try_init()
        .is_ok();

    TelemetryGuard { filter, installed }
}
