use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

const CACHE_TARGET: &str = "estatedash::core::cache";

/// Installs the global subscriber. `RUST_LOG` overrides the verbosity flag.
pub fn init_logging(verbose: bool) {
    let directives = if verbose {
        format!("debug,{CACHE_TARGET}=trace")
    } else {
        "off".to_string()
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    tracing_subscriber::registry()
        .with(fmt::layer().pretty().without_time())
        .with(app_targets(verbose))
        .with(env_filter)
        .init();
}

/// Verbose runs log the crate at debug, and cache evictions and expiries
/// at trace.
fn app_targets(verbose: bool) -> Targets {
    if !verbose {
        return Targets::new().with_target("estatedash", LevelFilter::OFF);
    }
    Targets::new()
        .with_target("estatedash", Level::DEBUG)
        .with_target(CACHE_TARGET, Level::TRACE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_targets() {
        let targets = app_targets(true);
        assert!(targets.would_enable("estatedash::core::view", &Level::DEBUG));
        assert!(!targets.would_enable("estatedash::core::view", &Level::TRACE));
        assert!(targets.would_enable(CACHE_TARGET, &Level::TRACE));
    }

    #[test]
    fn test_quiet_targets() {
        let targets = app_targets(false);
        assert!(!targets.would_enable("estatedash::core::cache", &Level::ERROR));
        assert!(!targets.would_enable("estatedash", &Level::ERROR));
    }
}
