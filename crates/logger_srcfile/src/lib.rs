use std::{borrow::Borrow, fmt::Display};

use logger::Logger;
use swc_common::{SourceMap, Span};

/// A logger that can attribute messages to a location in a parsed source file.
pub trait SrcFileLogger: Logger {
    fn src_warn(&self, location: &Span, message: impl Display);
}

/// Wraps a [Logger] with the [SourceMap] of the file currently being
/// processed, rendering spans as `file:line:col`.
#[derive(Clone)]
pub struct WrapFileLogger<TSrcMap, TLogger> {
    source_map: TSrcMap,
    inner_logger: TLogger,
}
impl<TSourceMap: Borrow<SourceMap> + Clone, TLogger: Logger> WrapFileLogger<TSourceMap, TLogger> {
    pub fn new(source_map: TSourceMap, inner_logger: TLogger) -> Self {
        Self {
            source_map,
            inner_logger,
        }
    }

    fn format_location(&self, location: &Span, message: impl Display) -> String {
        let loc = self.source_map.borrow().lookup_char_pos(location.lo);
        format!(
            "{}:{}:{} :: {}",
            loc.file.name, loc.line, loc.col_display, message,
        )
    }
}
impl<TSourceMap: Borrow<SourceMap> + Clone, TLogger: Logger> Logger
    for WrapFileLogger<TSourceMap, TLogger>
{
    fn log(&self, message: impl Display) {
        self.inner_logger.log(message);
    }
    fn error(&self, message: impl Display) {
        self.inner_logger.error(message);
    }
    fn warn(&self, message: impl Display) {
        self.inner_logger.warn(message);
    }
}
impl<TSourceMap: Borrow<SourceMap> + Clone, TLogger: Logger> SrcFileLogger
    for WrapFileLogger<TSourceMap, TLogger>
{
    fn src_warn(&self, location: &Span, message: impl Display) {
        self.warn(self.format_location(location, message));
    }
}
