//! Log setup for binaries.
//!
//! `RUST_LOG` takes precedence over the `[logging]` config section:
//! ```bash
//! RUST_LOG=lectern_core=debug lectern ask "What is in chapter 2?"
//! ```

use std::sync::Once;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Initialize logging to stderr. Only the first call takes effect.
pub fn init(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(filter_directives(config))
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .compact()
            .with_filter(filter);

        // A subscriber may already be set (tests, embedding apps); keep theirs.
        let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
    });
}

/// `default,module=level,...` as understood by `EnvFilter`.
fn filter_directives(config: &LoggingConfig) -> String {
    let mut directives = config.default.clone();
    for (module, level) in &config.modules {
        directives.push_str(&format!(",{module}={level}"));
    }
    directives
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_include_module_overrides() {
        let mut config = LoggingConfig::default();
        config.modules.insert("lectern_core".to_string(), "debug".to_string());
        assert_eq!(filter_directives(&config), "warn,lectern_core=debug");
    }

    #[test]
    fn init_twice_is_harmless() {
        init(&LoggingConfig::default());
        init(&LoggingConfig::default());
    }
}
