use std::panic;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const DEFAULT_FILTER: &str = "info";

/// Log output knobs read from `LM_LOG_*`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogSettings {
    /// Daily-rotated file output when set; stdout otherwise.
    pub dir: Option<PathBuf>,
    /// JSON lines on stdout. File output is always JSON.
    pub json: bool,
    pub include_backtrace: bool,
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |name: &str| {
            lookup(name)
                .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
                .unwrap_or(false)
        };

        Self {
            dir: lookup("LM_LOG_DIR")
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from),
            json: lookup("LM_LOG_FORMAT")
                .is_some_and(|format| format.eq_ignore_ascii_case("json")),
            include_backtrace: flag("LM_LOG_INCLUDE_BACKTRACE"),
        }
    }
}

/// Route panics through `tracing` with the run id and source location.
/// Installed once per process.
pub fn install_tracing_panic_hook(app_name: &'static str) {
    static INSTALLED: OnceLock<()> = OnceLock::new();

    INSTALLED.get_or_init(|| {
        let default_hook = panic::take_hook();
        let include_backtrace = LogSettings::from_env().include_backtrace;

        panic::set_hook(Box::new(move |info| {
            let location = info
                .location()
                .map(|loc| format!("{}:{}", loc.file(), loc.line()));
            let message = info
                .payload()
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| info.payload().downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".into());

            tracing::error!(
                application = app_name,
                run_id = crate::run_id::get(),
                thread = std::thread::current().name().unwrap_or("unnamed"),
                location = location.as_deref().unwrap_or("unknown"),
                panic_message = %message,
                "panic"
            );

            if include_backtrace {
                default_hook(info);
            }
        }));
    });
}

fn rotating_file_writer(dir: &Path, app_name: &str) -> Option<NonBlocking> {
    if let Err(err) = std::fs::create_dir_all(dir) {
        eprintln!("cannot create log dir {}: {err}; logging to stdout", dir.display());
        return None;
    }

    let appender = tracing_appender::rolling::daily(dir, format!("{app_name}.log"));
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    Some(writer)
}

/// Install the global subscriber. `RUST_LOG` overrides the `info` default.
///
/// File output is JSON with the current span attached, so `search_id` and
/// `job_id` from the engine spans land on every line of a search.
pub fn init_tracing_subscriber(app_name: &'static str) {
    let settings = LogSettings::from_env();
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(env_filter);

    let file = settings
        .dir
        .as_ref()
        .and_then(|dir| rotating_file_writer(dir, app_name));

    let _ = match file {
        Some(writer) => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_writer(writer),
            )
            .try_init(),
        None if settings.json => registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init(),
        None => registry.with(fmt::layer()).try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> LogSettings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LogSettings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_to_plain_stdout() {
        assert_eq!(settings(&[]), LogSettings::default());
    }

    #[test]
    fn reads_dir_format_and_backtrace() {
        let parsed = settings(&[
            ("LM_LOG_DIR", "/var/log/lm"),
            ("LM_LOG_FORMAT", "JSON"),
            ("LM_LOG_INCLUDE_BACKTRACE", "true"),
        ]);

        assert_eq!(parsed.dir, Some(PathBuf::from("/var/log/lm")));
        assert!(parsed.json);
        assert!(parsed.include_backtrace);
    }

    #[test]
    fn blank_dir_is_ignored() {
        let parsed = settings(&[("LM_LOG_DIR", "  "), ("LM_LOG_FORMAT", "pretty")]);
        assert_eq!(parsed.dir, None);
        assert!(!parsed.json);
    }
}
