pub mod io;


use log::{Level, LevelFilter, Log, Metadata, Record};

/// Reset SIGPIPE to default behavior (SIG_DFL) so `fbigsort ... | head`
/// terminates quietly like other command-line tools.
/// This must be called at the start of main().
#[inline]
pub fn reset_sigpipe() {
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}

/// Format an IO error message without the "(os error N)" suffix.
pub fn io_error_msg(e: &std::io::Error) -> String {
    if let Some(raw) = e.raw_os_error() {
        let os_err = std::io::Error::from_raw_os_error(raw);
        let msg = format!("{}", os_err);
        msg.replace(&format!(" (os error {})", raw), "")
    } else {
        format!("{}", e)
    }
}

/// Stderr sink for the `log` facade: `tool: message`, with the level
/// spelled out for warnings and anything more verbose than info.
struct StderrLogger {
    tool: &'static str,
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            Level::Info => eprintln!("{}: {}", self.tool, record.args()),
            level => eprintln!(
                "{}: {}: {}",
                self.tool,
                level.as_str().to_ascii_lowercase(),
                record.args()
            ),
        }
    }

    fn flush(&self) {}
}

/// Install the stderr logger. Later calls are ignored.
pub fn init_logging(tool: &'static str, level: LevelFilter) {
    let logger = Box::new(StderrLogger { tool, level });
    if log::set_boxed_logger(logger).is_ok() {
        log::set_max_level(level);
    }
}
