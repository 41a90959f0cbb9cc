//! Logging module for terminal based output control.
//!
//! Contains a custom logging implementation to disable output based on
//! command line switches baked into the application level. Everything is
//! written to stderr, as stdout is reserved for the generated output of
//! the gathering commands.
use clap::ArgMatches;
use logger::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Basic logger instance to allow quiet-aware logging.
struct BasicLogger {
    quiet: bool,
}

impl BasicLogger {
    /// Determines whether a record at the given level should be written.
    fn should_write(&self, level: Level) -> bool {
        level == Level::Error || !self.quiet
    }
}

impl Log for BasicLogger {
    /// Returns enabled only for infra-utils modules.
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.target().starts_with("infra_utils")
    }

    /// Logs out a `Record` when logging is enabled.
    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) && self.should_write(record.level()) {
            eprintln!("{}", record.args());
        }
    }

    fn flush(&self) {}
}

/// Initializes the logger based on the provided arguments.
///
/// If the `-q` flag was provided, this short circuits to cull all logging
/// aside from errors.
pub fn init(args: &ArgMatches) -> Result<(), SetLoggerError> {
    let quiet = args
        .subcommand()
        .1
        .map_or(false, |subargs| subargs.is_present("quiet"));

    let logger = Box::new(BasicLogger { quiet });
    log::set_boxed_logger(logger).map(|_| log::set_max_level(LevelFilter::Info))
}

#[cfg(test)]
mod tests {
    use super::BasicLogger;
    use logger::Level;

    #[test]
    fn quiet_logger_only_writes_errors() {
        let logger = BasicLogger { quiet: true };

        assert!(logger.should_write(Level::Error));
        assert!(!logger.should_write(Level::Info));
        assert!(!logger.should_write(Level::Warn));
    }

    #[test]
    fn loud_logger_writes_everything() {
        let logger = BasicLogger { quiet: false };

        assert!(logger.should_write(Level::Error));
        assert!(logger.should_write(Level::Info));
    }
}
