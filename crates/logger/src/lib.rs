use std::{fmt::Display, io::Write, sync::Mutex};

use anyhow::anyhow;

/// Sink for progress and diagnostic messages.
///
/// Report output goes to stdout through other channels, so implementations
/// should not write to stdout.
pub trait Logger: Clone {
    fn log(&self, message: impl Display);
    fn warn(&self, message: impl Display) {
        self.log(format!("WARN: {}", message));
    }
    fn error(&self, message: impl Display) {
        self.log(format!("ERROR: {}", message));
    }
}

#[macro_export]
macro_rules! debug_logf {
    ($logger:expr, $fmt:expr $(, $arg:expr)*) => {
        if cfg!(debug_assertions) {
            $logger.log(format!($fmt $(, $arg)*));
        }
    };
}

impl<T: Logger> Logger for &T {
    fn log(&self, message: impl Display) {
        (*self).log(message);
    }
    fn warn(&self, message: impl Display) {
        (*self).warn(message);
    }
    fn error(&self, message: impl Display) {
        (*self).error(message);
    }
}

/// Writes timestamped lines to stderr.
///
/// When `verbose` is false, plain `log` lines are dropped and only warnings
/// and errors are written.
pub struct StdioLogger {
    zero_time: std::time::Instant,
    verbose: bool,
}
impl Logger for &StdioLogger {
    fn log(&self, message: impl Display) {
        if self.verbose {
            self.write_line(message);
        }
    }
    fn warn(&self, message: impl Display) {
        self.write_line(format!("WARN: {}", message));
    }
    fn error(&self, message: impl Display) {
        self.write_line(format!("ERROR: {}", message));
    }
}
impl StdioLogger {
    pub fn new() -> Self {
        Self::with_verbosity(true)
    }

    pub fn with_verbosity(verbose: bool) -> Self {
        Self {
            zero_time: std::time::Instant::now(),
            verbose,
        }
    }

    fn write_line(&self, message: impl Display) {
        let delta_time = std::time::Instant::now().duration_since(self.zero_time);
        // a closed stderr is not worth failing the run over
        let _ = writeln!(
            std::io::stderr().lock(),
            "[{:.04}] {}",
            delta_time.as_secs_f64(),
            message
        );
    }
}
impl Default for StdioLogger {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects log lines in memory. Used to assert on diagnostics in tests.
pub struct VecLogger {
    logs: Mutex<Vec<String>>,
}

impl Logger for &VecLogger {
    fn log(&self, message: impl Display) {
        if let Ok(mut logs) = self.logs.lock() {
            logs.push(format!("{}", message));
        }
    }
}
impl VecLogger {
    pub fn new() -> Self {
        Self {
            logs: Mutex::new(Vec::new()),
        }
    }

    pub fn get_logs(self) -> Result<Vec<String>, anyhow::Error> {
        // clone the data out of the logger
        self.logs
            .try_lock()
            .map_err(|err| anyhow!("error unlocking VecLogger logs:{err}"))
            .map(|mut x| x.drain(0..).collect::<Vec<_>>())
    }
}
impl Default for VecLogger {
    fn default() -> Self {
        Self::new()
    }
}
