//! Limlog
//!
//! Asynchronous, low-latency structured logging. A thread that emits a
//! record pays only for formatting bytes into its own lock-free ring; one
//! background thread multiplexes every ring into an output buffer and hands
//! it to a [`Writer`].
//!
//! # Architecture
//!
//! ```text
//! [thread A] --format--> [ring A] \
//! [thread B] --format--> [ring B]  >--> [sink thread] --write--> [Writer]
//! [thread C] --format--> [ring C] /         |
//!                                     rotation, retention
//! ```
//!
//! Records are published atomically: a producer copies header and payload
//! into its ring piecewise, then advances the ring's consumable watermark by
//! the record's total length. The sink thread only ever drains up to that
//! watermark, so a partial record can never reach the writer.
//!
//! # Example
//!
//! ```no_run
//! limlog::set_level(limlog::Level::Debug);
//! limlog::set_log_file("/var/log/app");
//! limlog::set_max_size(64);
//! limlog::set_max_backups(8);
//!
//! limlog::info!("listening on {}:{}", "0.0.0.0", 4096);
//! limlog::debug_loc!("connection accepted, fd={}", 17);
//!
//! // Before process exit, push everything published so far to the writer.
//! limlog::drain();
//! ```
//!
//! # Ordering guarantees
//!
//! Records from one thread appear in the writer in publish order. There is
//! no total order across threads; rings drain in registration order, a whole
//! ring at a time.

pub mod engine;
pub mod level;
pub mod logger;
pub mod record;
pub mod tid;
pub mod timestamp;

#[cfg(test)]
mod test_util;

pub use engine::{EngineConfig, EngineMetrics, EngineMetricsSnapshot, SinkEngine};
pub use level::Level;
pub use logger::{
    drain, level, logger, set_level, set_log_file, set_max_backups, set_max_size, set_precision,
    set_writer, statistics, Config, Logger, Statistics,
};
pub use record::{Location, Record, RecordError};
pub use timestamp::Precision;

pub use limlog_buffer::{BufferRegistry, RingBuffer};
pub use limlog_sinks::{
    NullWriter, RotateConfig, RotatingFileWriter, StdoutWriter, Writer, WriterError,
};

/// Emit a record at `level` through the process-wide logger.
///
/// The level filter runs before any record state is built; a filtered call
/// costs one relaxed load.
#[macro_export]
macro_rules! log {
    ($level:expr, $($arg:tt)+) => {{
        let level = $level;
        let logger = $crate::logger();
        if logger.enabled(level) {
            use ::core::fmt::Write as _;
            let mut record = logger.record(level, ::core::option::Option::None);
            let _ = ::core::write!(record, $($arg)+);
        }
    }};
}

/// Emit a record carrying the call site as a `<file>:<line>` token.
#[macro_export]
macro_rules! log_loc {
    ($level:expr, $($arg:tt)+) => {{
        let level = $level;
        let logger = $crate::logger();
        if logger.enabled(level) {
            use ::core::fmt::Write as _;
            let loc = $crate::Location {
                file: ::core::file!(),
                line: ::core::line!(),
            };
            let mut record = logger.record(level, ::core::option::Option::Some(loc));
            let _ = ::core::write!(record, $($arg)+);
        }
    }};
}

#[macro_export]
macro_rules! trace {
    ($($arg:tt)+) => ($crate::log!($crate::Level::Trace, $($arg)+));
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)+) => ($crate::log!($crate::Level::Debug, $($arg)+));
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)+) => ($crate::log!($crate::Level::Info, $($arg)+));
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)+) => ($crate::log!($crate::Level::Warn, $($arg)+));
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)+) => ($crate::log!($crate::Level::Error, $($arg)+));
}

#[macro_export]
macro_rules! fatal {
    ($($arg:tt)+) => ($crate::log!($crate::Level::Fatal, $($arg)+));
}

#[macro_export]
macro_rules! trace_loc {
    ($($arg:tt)+) => ($crate::log_loc!($crate::Level::Trace, $($arg)+));
}

#[macro_export]
macro_rules! debug_loc {
    ($($arg:tt)+) => ($crate::log_loc!($crate::Level::Debug, $($arg)+));
}

#[macro_export]
macro_rules! info_loc {
    ($($arg:tt)+) => ($crate::log_loc!($crate::Level::Info, $($arg)+));
}

#[macro_export]
macro_rules! warn_loc {
    ($($arg:tt)+) => ($crate::log_loc!($crate::Level::Warn, $($arg)+));
}

#[macro_export]
macro_rules! error_loc {
    ($($arg:tt)+) => ($crate::log_loc!($crate::Level::Error, $($arg)+));
}

#[macro_export]
macro_rules! fatal_loc {
    ($($arg:tt)+) => ($crate::log_loc!($crate::Level::Fatal, $($arg)+));
}
