pub mod catalog;
pub mod client;
pub mod config;
pub mod editor;
pub mod error;
pub mod models;
pub mod plan;
pub mod region;
pub mod render;
pub mod state;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing/logging
///
/// `RUST_LOG` takes precedence over `default_level`. Logs go to stderr so
/// they never mix with command output.
pub fn init_tracing(default_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let (text_layer, json_layer) = if json {
        (
            None,
            Some(fmt::layer().json().with_target(true).with_writer(std::io::stderr)),
        )
    } else {
        (
            Some(fmt::layer().with_target(true).with_writer(std::io::stderr)),
            None,
        )
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text_layer)
        .with(json_layer)
        .init();
}
