use tracing_subscriber::{fmt, EnvFilter};

/// Target used for the outbound request/response log.
pub const GATEWAY_LOG_TARGET: &str = "stackpurge::gateway";

pub fn init_logging() {
    init_logging_with("info");
}

/// `RUST_LOG` wins over `default_directive` when set.
pub fn init_logging_with(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}
