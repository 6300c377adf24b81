//! Console log sink: one level-colored line per record on stderr.

use std::io::{IsTerminal, Write};

use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::spec::TagbookError;

const C_ANSI_RESET: &str = "\x1b[0m";

struct ConsoleLogger;

static CONSOLE_LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut stderr = std::io::stderr().lock();
        let c_line = format_record_line(
            record.level(),
            record.target(),
            &record.args().to_string(),
            stderr.is_terminal(),
        );
        let _ = writeln!(stderr, "{c_line}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn derive_level_color(level: Level) -> &'static str {
    match level {
        Level::Error => "\x1b[31m",
        Level::Warn => "\x1b[33m",
        Level::Info => "\x1b[32m",
        Level::Debug => "\x1b[36m",
        Level::Trace => "\x1b[90m",
    }
}

fn format_record_line(level: Level, target: &str, message: &str, if_color: bool) -> String {
    if if_color {
        format!(
            "{}{level:<5}{C_ANSI_RESET} {target}: {message}",
            derive_level_color(level)
        )
    } else {
        format!("{level:<5} {target}: {message}")
    }
}

/// Install the console logger; a second call fails.
pub fn init_logging(level: LevelFilter) -> Result<(), TagbookError> {
    log::set_logger(&CONSOLE_LOGGER)
        .map_err(|err| TagbookError::Settings(format!("logger already installed: {err}")))?;
    log::set_max_level(level);
    Ok(())
}
