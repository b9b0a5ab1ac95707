//! Log setup for the `rtlagent` binary.
//!
//! Every log record goes to stderr. Stdout carries only command output (the
//! run summary, or the documents printed by `ports --json` and
//! `diagnose --json`), so it can be piped into other tools unchanged.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// HTTP stack targets that are noisy at debug level; capped unless
/// `RUST_LOG` says otherwise.
const QUIET_TARGETS: &[&str] = &["hyper", "hyper_util", "reqwest", "rustls"];

/// Filter directives used when `RUST_LOG` is unset.
fn default_directives(level: Level) -> String {
    let mut directives = vec![level.as_str().to_ascii_lowercase()];
    directives.extend(QUIET_TARGETS.iter().map(|t| format!("{}=warn", t)));
    directives.join(",")
}

/// Install the stderr subscriber.
///
/// `json` switches records to one JSON object per line, matching the
/// `--json` flag that also switches command output to JSON. `RUST_LOG`
/// replaces the default filter entirely. Only the first call in a process
/// takes effect.
pub fn init_tracing(json: bool, level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let human = (!json).then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });
    let machine = json.then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .json()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(human)
        .with(machine)
        .try_init()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_cap_http_stack() {
        let d = default_directives(Level::DEBUG);
        assert!(d.starts_with("debug,"));
        assert!(d.contains("hyper=warn"));
        assert!(d.contains("reqwest=warn"));
        EnvFilter::try_new(&d).unwrap();
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_tracing(false, Level::WARN);
        init_tracing(true, Level::DEBUG);
    }
}
