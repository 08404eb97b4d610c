// Activity logging
//
// Every transliteration is appended to a JSONL file; the most recent output
// is also written to its own file for tools that only want the latest text.

pub mod activity_logger;

pub use activity_logger::{ActivityLogger, LogEntry};

/// Install the global `tracing` subscriber (RUST_LOG, default `info`)
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
