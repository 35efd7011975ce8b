use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Project-specific filter directives, checked before `RUST_LOG`.
const LOG_ENV: &str = "CAMPAIGN_HEALTH_LOG";

/// Installs the global subscriber. Logs go to stderr so command output on
/// stdout stays pipeable.
pub fn init(verbose: bool) {
    tracing_subscriber::registry()
        .with(build_env_filter(verbose))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .without_time()
                .compact(),
        )
        .init();
}

fn build_env_filter(verbose: bool) -> EnvFilter {
    if let Some(filter) = std::env::var(LOG_ENV)
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
    {
        return filter;
    }

    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    EnvFilter::new(default_directive(verbose))
}

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "warn,outbound_campaign_health=debug,campaign_health=debug"
    } else {
        "warn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_raises_crate_level() {
        assert_eq!(default_directive(false), "warn");
        assert!(default_directive(true).contains("outbound_campaign_health=debug"));
    }
}
