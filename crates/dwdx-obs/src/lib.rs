use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,dwdx=debug";

/// Filter used when RUST_LOG is not set
pub fn default_filter(enabled: bool) -> &'static str {
    if enabled {
        DEFAULT_FILTER
    } else {
        "off"
    }
}

/// Initialize logging.
/// - RUST_LOG wins; otherwise "info,dwdx=debug", or nothing at all when logs are disabled
/// - `json` switches to JSON lines
pub fn init(service_name: &str, enabled: bool, json: bool) {
    let env_filter = std::env::var("RUST_LOG")
        .map(EnvFilter::new)
        .unwrap_or_else(|_| EnvFilter::new(default_filter(enabled)));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!(service = %service_name, "Logging initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_logs_filter_everything() {
        assert_eq!(default_filter(false), "off");
        assert_eq!(default_filter(true), DEFAULT_FILTER);
    }
}
