//! Logging to the console and the session log file
//!
//! Both sinks share one line layout, `[elapsed LVL] message`, with the record target added for
//! debug and trace records. Console tags are coloured, file tags are plain so the session log can
//! be grepped.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use log::{self, info, Level};
use fern;
use colored::{ColoredString, Colorize};
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Could not open the session log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("A logger is already installed: {0}")]
    FernInitError(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Install the logger for this execution.
///
/// The console shows records down to `console_level`. The session log file records down to
/// `console_level` or `Info`, whichever is more verbose, so client and mission lifecycle lines
/// are always kept.
///
/// Must only be called once per process.
pub fn logger_init(
    console_level: LevelFilter,
    session: &session::Session
) -> Result<(), LoggerInitError> {

    let file_level = file_level(console_level);

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFileInitError)?;

    let console = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}",
                format_line(
                    session::get_elapsed_seconds(),
                    coloured_tag(record.level()),
                    record.level(),
                    record.target(),
                    message
                )
            ))
        })
        .level(console_level)
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}",
                format_line(
                    session::get_elapsed_seconds(),
                    plain_tag(record.level()),
                    record.level(),
                    record.target(),
                    message
                )
            ))
        })
        .level(file_level)
        .chain(log_file);

    fern::Dispatch::new()
        .level(console_level.max(file_level))
        .level_for("zmq", LevelFilter::Info)
        .chain(console)
        .chain(file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    if let Some(epoch) = session::get_epoch() {
        info!("    Session epoch: {}", epoch);
    }
    info!("    Console level: {:?}, file level: {:?}", console_level, file_level);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn file_level(console_level: LevelFilter) -> LevelFilter {
    console_level.max(LevelFilter::Info)
}

fn format_line<T: std::fmt::Display>(
    elapsed_s: f64,
    tag: T,
    level: Level,
    target: &str,
    message: &std::fmt::Arguments
) -> String {
    if level > Level::Info {
        format!("[{:10.6} {}] {}: {}", elapsed_s, tag, target, message)
    }
    else {
        format!("[{:10.6} {}] {}", elapsed_s, tag, message)
    }
}

fn plain_tag(level: Level) -> &'static str {
    match level {
        Level::Trace => "TRC",
        Level::Debug => "DBG",
        Level::Info  => "INF",
        Level::Warn  => "WRN",
        Level::Error => "ERR"
    }
}

fn coloured_tag(level: Level) -> ColoredString {
    let tag = plain_tag(level);

    match level {
        Level::Trace => tag.dimmed().italic(),
        Level::Debug => tag.dimmed(),
        Level::Info  => tag.normal(),
        Level::Warn  => tag.yellow(),
        Level::Error => tag.red().bold()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_file_keeps_lifecycle_lines() {
        assert_eq!(file_level(LevelFilter::Off), LevelFilter::Info);
        assert_eq!(file_level(LevelFilter::Warn), LevelFilter::Info);
        assert_eq!(file_level(LevelFilter::Debug), LevelFilter::Debug);
    }

    #[test]
    fn test_format_line() {
        let line = format_line(
            1.5,
            plain_tag(Level::Info),
            Level::Info,
            "turtle_lib::session_mgr",
            &format_args!("Client {} connected", "0a")
        );
        assert_eq!(line, "[  1.500000 INF] Client 0a connected");

        let line = format_line(
            0.25,
            plain_tag(Level::Debug),
            Level::Debug,
            "turtle_lib::session_mgr",
            &format_args!("tick")
        );
        assert_eq!(line, "[  0.250000 DBG] turtle_lib::session_mgr: tick");
    }
}
