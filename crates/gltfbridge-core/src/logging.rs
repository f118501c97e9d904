//! Logging and tracing setup for gltfbridge
//!
//! Diagnostics from the export core are `tracing` events. This module installs
//! the subscriber that renders them.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Whether tracing has been initialized
static TRACING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Default filter directive when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "warn,gltfbridge=info";

/// Initialize the default tracing subscriber
///
/// This should be called once at application startup. Multiple calls are safe
/// and will be ignored.
pub fn init_default() {
    init_with_config(TracingConfig::default());
}

/// Initialize tracing with a custom configuration
pub fn init_with_config(config: TracingConfig) {
    if TRACING_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
        .is_err()
    {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_level));

    let fmt_layer = fmt::layer()
        .with_target(config.show_target)
        .with_thread_ids(config.show_thread_ids)
        .with_file(config.show_file)
        .with_line_number(config.show_line_number)
        .with_writer(std::io::stderr);

    // A subscriber installed elsewhere (tests, embedding hosts) wins
    let _ = tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .try_init();
}

/// Configuration for tracing initialization
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Default log level filter (e.g., "info", "debug", "warn")
    pub default_level: String,
    /// Show the target (module path) in log output
    pub show_target: bool,
    /// Show thread IDs in log output
    pub show_thread_ids: bool,
    /// Show source file in log output
    pub show_file: bool,
    /// Show line number in log output
    pub show_line_number: bool,
}

impl TracingConfig {
    /// Configuration for a `-v` count given on the command line
    pub fn from_verbosity(verbose: u8) -> Self {
        let default_level = match verbose {
            0 => DEFAULT_FILTER.to_string(),
            1 => "warn,gltfbridge=debug".to_string(),
            _ => "debug,gltfbridge=trace".to_string(),
        };

        Self {
            default_level,
            show_file: verbose >= 2,
            show_line_number: verbose >= 2,
            ..Self::default()
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: DEFAULT_FILTER.to_string(),
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
        }
    }
}
