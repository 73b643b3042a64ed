//! Provide tracing, tailored to this program.
//!
//! The host program calls [`init_journald_or_stdout`] once at startup to
//! install a subscriber. Everything else imports `crate::tracing::prelude::*`
//! for the `trace!()`, `debug!()`, `info!()`, `warn!()` and `error!()`
//! macros and logs with structured fields.

use std::env;
use std::fmt::Write as _;

use time::OffsetDateTime;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt::{format::Writer, time::FormatTime},
    prelude::*,
};

pub mod prelude {
    #[allow(unused_imports)]
    pub use tracing::{debug, error, info, trace, warn};
}

use prelude::*;

const CRATE_PREFIX: &str = "baikal_miner::";

/// Initialize logging.
///
/// If running under systemd, use journald; otherwise fall back to stdout.
pub fn init_journald_or_stdout() {
    if env::var("JOURNAL_STREAM").is_ok() {
        match tracing_journald::layer() {
            Ok(layer) => tracing_subscriber::registry().with(layer).init(),
            Err(e) => {
                use_stdout();
                error!(error = %e, "Failed to initialize journald logging, using stdout.");
            }
        }
    } else {
        use_stdout();
    }
}

// Log to stdout, filtering according to RUST_LOG with INFO as the default.
fn use_stdout() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var("RUST_LOG")
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().event_format(BoardFormatter))
        .init();
}

/// Event formatter: local time, colored level, short target, and the
/// structured fields on a second, dimmed line.
struct BoardFormatter;

#[derive(Default)]
struct FieldCollector {
    message: Option<String>,
    fields: Vec<(&'static str, String)>,
}

impl tracing::field::Visit for FieldCollector {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields.push((field.name(), value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        let formatted = format!("{:?}", value);
        if field.name() == "message" {
            self.message = Some(formatted);
        } else {
            self.fields.push((field.name(), unwrap_some(&formatted).to_string()));
        }
    }
}

/// `Some(x)` reads as `x` in a log line.
fn unwrap_some(formatted: &str) -> &str {
    formatted
        .strip_prefix("Some(")
        .and_then(|inner| inner.strip_suffix(')'))
        .unwrap_or(formatted)
}

/// Drop our crate prefix; events bridged from `log` carry their real target
/// in a `log.target` field.
fn short_target<'a>(target: &'a str, fields: &'a [(&'static str, String)]) -> &'a str {
    if let Some(stripped) = target.strip_prefix(CRATE_PREFIX) {
        return stripped;
    }
    if target == "log" {
        if let Some((_, real)) = fields.iter().find(|(k, _)| *k == "log.target") {
            return real.trim_matches('"');
        }
    }
    target
}

fn level_style(level: tracing::Level) -> (&'static str, &'static str) {
    match level {
        tracing::Level::ERROR => ("\x1b[31m", "ERROR"),
        tracing::Level::WARN => ("\x1b[33m", "WARN "),
        tracing::Level::INFO => ("\x1b[32m", "INFO "),
        tracing::Level::DEBUG => ("\x1b[34m", "DEBUG"),
        tracing::Level::TRACE => ("\x1b[35m", "TRACE"),
    }
}

/// Render `key=value` pairs, skipping the `log.*` bridge metadata.
fn render_fields(fields: &[(&'static str, String)]) -> String {
    let mut out = String::new();
    for (key, value) in fields.iter().filter(|(k, _)| !k.starts_with("log.")) {
        if !out.is_empty() {
            out.push_str(", ");
        }
        let _ = write!(out, "{}={}", key, value.trim_matches('"'));
    }
    out
}

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for BoardFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let mut visitor = FieldCollector::default();
        event.record(&mut visitor);

        LocalTimer.format_time(&mut writer)?;

        let (color, label) = level_style(*event.metadata().level());
        write!(writer, " {}{}\x1b[0m ", color, label)?;
        write!(
            writer,
            "{}: ",
            short_target(event.metadata().target(), &visitor.fields)
        )?;

        if let Some(ref msg) = visitor.message {
            write!(writer, "{}", msg.trim_matches('"'))?;
        }

        let fields = render_fields(&visitor.fields);
        if !fields.is_empty() {
            // Indent past "HH:MM:SS LEVEL "
            write!(writer, "\n\x1b[90m               {}\x1b[0m", fields)?;
        }

        writeln!(writer)
    }
}

// Local time to the nearest second; the default timer is UTC and verbose.
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let formatted = now
            .format(time::macros::format_description!(
                "[hour]:[minute]:[second]"
            ))
            .map_err(|_| std::fmt::Error)?;
        write!(w, "{}", formatted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_target_strips_crate_prefix() {
        assert_eq!(short_target("baikal_miner::board::protocol", &[]), "board::protocol");
        assert_eq!(short_target("tokio::runtime", &[]), "tokio::runtime");
    }

    #[test]
    fn test_short_target_for_log_bridge() {
        let fields = vec![("log.target", "\"nusb::platform\"".to_string())];
        assert_eq!(short_target("log", &fields), "nusb::platform");
        assert_eq!(short_target("log", &[]), "log");
    }

    #[test]
    fn test_render_fields() {
        let fields = vec![
            ("board", "\"BLKU:1:12:0\"".to_string()),
            ("log.file", "x.rs".to_string()),
            ("slot", "4".to_string()),
        ];
        assert_eq!(render_fields(&fields), "board=BLKU:1:12:0, slot=4");
        assert_eq!(render_fields(&[]), "");
    }

    #[test]
    fn test_unwrap_some() {
        assert_eq!(unwrap_some("Some(55)"), "55");
        assert_eq!(unwrap_some("None"), "None");
    }
}
