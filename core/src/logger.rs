//----------------------------------------------------------------------------------------- std lib
use std::io::Write;
use std::time::Instant;
//--------------------------------------------------------------------------------- other libraries
use env_logger::fmt::style::{AnsiColor, Color, Style};
use log::info;
use once_cell::sync::Lazy;
use tracing_subscriber::{Layer as _, layer::SubscriberExt as _};

// This will get initialized below.
/// Returns the init [`Instant`]
pub static INIT_INSTANT: Lazy<Instant> = Lazy::new(Instant::now);

/// The filter used when `RUST_LOG` isn't set: nothing from other crates, `filter` from ours.
#[must_use]
pub fn default_log_filter(filter: log::LevelFilter) -> String {
    format!("off,songbook={filter}")
}

fn level_style(level: log::Level) -> (Style, &'static str) {
    let (color, letter) = match level {
        log::Level::Debug => (AnsiColor::Blue, "D"),
        log::Level::Trace => (AnsiColor::Magenta, "T"),
        log::Level::Info => (AnsiColor::White, "I"),
        log::Level::Warn => (AnsiColor::Yellow, "W"),
        log::Level::Error => (AnsiColor::Red, "E"),
    };
    (Style::new().fg_color(Some(Color::Ansi(color))).bold(), letter)
}

//---------------------------------------------------------------------------------------------------- Logger init function
#[allow(clippy::module_name_repetitions)]
/// Initializes the logger.
///
/// This enables console logging on all the internals of `Songbook`.
///
/// Functionality is provided by [`log`].
///
/// The levels are:
/// - ERROR
/// - WARN
/// - INFO
/// - DEBUG
/// - TRACE
///
/// # Panics
/// This must only be called _once_.
#[cfg(not(tarpaulin_include))]
pub fn init_logger(filter: log::LevelFilter) {
    use crate::format_duration;

    // Initialize timer.
    let now = Lazy::force(&INIT_INSTANT);

    // If `RUST_LOG` isn't set, disable all library crate logs except for songbook and its sub-crates.
    let env = std::env::var("RUST_LOG").unwrap_or_default();
    let filters = if env.is_empty() {
        default_log_filter(filter)
    } else {
        env.clone()
    };

    env_logger::Builder::new()
        .format(move |buf, record| {
            let (style, level) = level_style(record.level());
            let dimmed = Style::new().dimmed();
            writeln!(
                buf,
                // Longest PATH in the repo: `storage/src/db/validation.rs` - `28` characters
                // Longest file in the repo: `storage/src/db/crud/song.rs`  - `3` digits
                //
                //      Longest PATH ---|        |--- Longest file
                //                      |        |
                //                      v        v
                "| {style}{level}{style:#} | {dimmed}{}{dimmed:#} | {dimmed}{: >28} @ {: <3}{dimmed:#} | {}",
                format_duration(&now.elapsed()),
                record.file_static().unwrap_or("???"),
                record.line().unwrap_or(0),
                record.args(),
            )
        })
        .write_style(env_logger::WriteStyle::Always)
        .parse_filters(&filters)
        .init();

    if env.is_empty() {
        info!("Log Level (Flag) ... {}", filter);
    } else {
        info!("Log Level (RUST_LOG) ... {}", env);
    }
}

/// The directives of the tracing filter, `SONGBOOK_TRACE` overrides them.
#[must_use]
pub fn tracing_directives(filter: log::LevelFilter) -> String {
    if let Ok(directives) = std::env::var("SONGBOOK_TRACE") {
        return directives;
    }

    if cfg!(feature = "verbose_tracing") {
        "trace,h2=off".to_string()
    } else {
        format!("off,tower_http={filter}")
    }
}

/// Initializes the tracing layer.
///
/// Request traces from the HTTP layer are written to stderr, at most at `filter`.
#[must_use]
pub fn init_tracing(filter: log::LevelFilter) -> impl tracing::Subscriber + Send + Sync {
    let env_filter =
        tracing_subscriber::EnvFilter::builder().parse_lossy(tracing_directives(filter));

    tracing_subscriber::registry().with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_filter(env_filter),
    )
}
