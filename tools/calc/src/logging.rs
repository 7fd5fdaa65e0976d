//! Logging setup
//!
//! Events go to stderr as `timestamp [LEVEL] message` so they never mix with
//! calculator output on stdout.

use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use tracing::Level;
use tracing_subscriber::{
    fmt::{format::Writer, FmtContext, FormatEvent, FormatFields},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Bracketed level label, colored when the writer accepts ANSI escapes
fn level_label(level: Level, ansi: bool) -> ColoredString {
    let label = match level {
        Level::TRACE => "[TRACE]",
        Level::DEBUG => "[DEBUG]",
        Level::INFO => "[INFO]",
        Level::WARN => "[WARN]",
        Level::ERROR => "[ERROR]",
    };
    if !ansi {
        return label.normal();
    }
    match level {
        Level::TRACE => label.magenta(),
        Level::DEBUG => label.blue(),
        Level::INFO => label.green(),
        Level::WARN => label.yellow(),
        Level::ERROR => label.red(),
    }
}

/// `timestamp [LEVEL] message fields`, e.g.
/// `2025-12-02T00:50:44.809Z [DEBUG] parsed postfix nodes=5`
struct BracketedLevelFormat;

impl<S, N> FormatEvent<S, N> for BracketedLevelFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let label = level_label(*event.metadata().level(), writer.has_ansi_escapes());
        write!(
            writer,
            "{} {} ",
            chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            label
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Pick the filter directive: `RUST_LOG`, then `--verbose`, then config
fn filter_directive(rust_log: Option<String>, level: &str, verbose: bool) -> String {
    match rust_log {
        Some(directive) if !directive.trim().is_empty() => directive,
        _ if verbose => "debug".to_string(),
        _ => level.to_string(),
    }
}

/// Install the global subscriber
pub fn init(level: &str, verbose: bool, ansi: bool) -> Result<()> {
    let directive = filter_directive(std::env::var("RUST_LOG").ok(), level, verbose);
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("Invalid log filter '{}'", directive))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .event_format(BracketedLevelFormat)
                .with_writer(std::io::stderr)
                .with_ansi(ansi),
        )
        .try_init()
        .context("Failed to initialize logging")
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn test_level_label_plain() {
        assert_eq!(level_label(Level::DEBUG, false).to_string(), "[DEBUG]");
        assert_eq!(level_label(Level::ERROR, false).to_string(), "[ERROR]");
    }

    #[test]
    fn test_filter_priority() {
        assert_eq!(
            filter_directive(Some("calc_core=trace".into()), "warn", true),
            "calc_core=trace"
        );
        assert_eq!(filter_directive(None, "warn", true), "debug");
        assert_eq!(filter_directive(Some("  ".into()), "info", false), "info");
        assert_eq!(filter_directive(None, "warn", false), "warn");
    }
}
