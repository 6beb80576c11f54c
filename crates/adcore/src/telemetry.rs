//! Tracing setup for hosts that do not install their own subscriber.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a stderr subscriber.
///
/// `RUST_LOG` takes precedence. Otherwise `ADCORE_LOG` (`debug`, `info`,
/// `warn`, `error`; default `info`) sets the level for this crate only.
/// `LOG_FORMAT=json` switches to JSON lines. A second call is a no-op.
pub fn init_tracing() {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(default_directive(std::env::var("ADCORE_LOG").ok().as_deref()))
    };

    let use_json = std::env::var("LOG_FORMAT").as_deref() == Ok("json");

    if use_json {
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr));
        let _ = subscriber.try_init();
    } else {
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr));
        let _ = subscriber.try_init();
    }
}

fn default_directive(level: Option<&str>) -> String {
    let level = match level {
        Some("debug") => "debug",
        Some("warn") | Some("warning") => "warn",
        Some("error") => "error",
        _ => "info",
    };
    format!("adcore={level}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_defaults_to_info() {
        assert_eq!(default_directive(None), "adcore=info");
        assert_eq!(default_directive(Some("verbose")), "adcore=info");
    }

    #[test]
    fn directive_accepts_known_levels() {
        assert_eq!(default_directive(Some("debug")), "adcore=debug");
        assert_eq!(default_directive(Some("warning")), "adcore=warn");
        assert_eq!(default_directive(Some("error")), "adcore=error");
    }

    #[test]
    fn init_twice_is_harmless() {
        init_tracing();
        init_tracing();
        tracing::info!("tracing installed");
    }
}
