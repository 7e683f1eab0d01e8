//! Kernel logging facility
//!
//! Routes the `log` crate to COM1. Each record becomes one CRLF-terminated
//! line of the form `LEVEL [target:line] message`.
//! Log levels are configured based on build configuration (debug/release).

use core::fmt;

use log::{LevelFilter, Log, Metadata, Record};
use spin::Mutex;

/// Global logger instance available throughout the kernel
pub static LOGGER: Logger = Logger::new();

/// Serializes whole lines on the serial port
pub struct Logger {
    inner: Mutex<()>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    pub const fn new() -> Logger {
        Logger {
            inner: Mutex::new(()),
        }
    }
}

/// Writes one record in the serial line format.
pub fn write_record(out: &mut impl fmt::Write, record: &Record) -> fmt::Result {
    write!(out, "{:<5} [{}", record.level(), record.target())?;
    if let Some(line) = record.line() {
        write!(out, ":{}", line)?;
    }
    write!(out, "] {}\r\n", record.args())
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let _guard = self.inner.lock();
            let mut serial = crate::serial::SERIAL1.lock();
            let _ = write_record(&mut *serial, record);
        }
    }

    /// Output is unbuffered
    fn flush(&self) {}
}

/// Installs [`LOGGER`] and prints the boot banner.
///
/// # Notes
/// * Only the first call has an effect
/// * Sets different log levels for debug/release builds:
///   - Debug builds: LevelFilter::Debug
///   - Release builds: LevelFilter::Info
pub fn init() {
    if log::set_logger(&LOGGER).is_err() {
        return;
    }
    log::set_max_level(
        #[cfg(debug_assertions)]
        LevelFilter::Debug,
        #[cfg(not(debug_assertions))]
        LevelFilter::Info,
    );

    crate::serial_println!();
    crate::serial_println!(
        "{} {} - serial console on COM1",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    fn format(record: &Record) -> String {
        let mut out = String::new();
        write_record(&mut out, record).unwrap();
        out
    }

    #[test]
    fn record_line_format() {
        let line = format(
            &Record::builder()
                .level(Level::Info)
                .target("lumen::init")
                .line(Some(42))
                .args(format_args!("Frame allocator ready"))
                .build(),
        );
        assert_eq!(line, "INFO  [lumen::init:42] Frame allocator ready\r\n");
    }

    #[test]
    fn record_without_line_number() {
        let line = format(
            &Record::builder()
                .level(Level::Error)
                .target("panic")
                .args(format_args!("boom"))
                .build(),
        );
        assert_eq!(line, "ERROR [panic] boom\r\n");
    }
}
