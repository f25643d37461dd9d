//! One-record assembler.
//!
//! A [`Record`] accumulates the bytes of a single log line into the calling
//! thread's ring and publishes them as one unit when it drops. The header is
//! written at construction; payload tokens stream in through
//! [`std::fmt::Write`], so the logging macros drive it with `format_args!`.
//!
//! Wire layout, newline terminated:
//!
//! ```text
//! <LEVEL5> <TIMESTAMP> <tid>[ <file>:<line>] <payload>\n
//! ```

use std::fmt;

use crate::level::Level;
use crate::logger::Logger;
use crate::{tid, timestamp};

/// Source location attached to a record.
#[derive(Debug, Clone, Copy)]
pub struct Location {
    pub file: &'static str,
    pub line: u32,
}

/// Errors surfaced while assembling a record.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The record would exceed the ring capacity; it is truncated at its
    /// current length and the refused bytes are dropped.
    #[error("record exceeds ring capacity of {capacity} bytes")]
    TooLarge { capacity: u32 },
}

/// A single in-flight log record.
///
/// Every appended byte goes straight into the thread-local ring unpublished;
/// dropping the record appends the trailing newline and advances the ring's
/// consumable position by exactly the record's length, which is the moment
/// the sink thread may see it.
pub struct Record<'a> {
    logger: &'a Logger,
    /// Bytes produced so far for this record.
    count: u32,
    /// Hard ceiling leaving room for the trailing newline.
    limit: u32,
    truncated: bool,
}

impl<'a> Record<'a> {
    pub(crate) fn new(logger: &'a Logger, level: Level, loc: Option<Location>) -> Self {
        let mut record = Self {
            logger,
            count: 0,
            limit: logger.ring_capacity() as u32 - 1,
            truncated: false,
        };

        let _ = record.append(level.label().as_bytes());
        let _ = record.append(b" ");
        let _ = record.append(timestamp::now(logger.precision()).as_bytes());
        let _ = record.append(b" ");
        let _ = fmt::Write::write_fmt(&mut record, format_args!("{}", tid::current()));
        if let Some(loc) = loc {
            let _ = fmt::Write::write_fmt(&mut record, format_args!(" {}:{}", loc.file, loc.line));
        }
        let _ = record.append(b" ");

        record
    }

    /// Bytes accumulated so far (excluding the trailing newline).
    pub fn len(&self) -> u32 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether an append was refused for size.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Append raw payload bytes.
    ///
    /// Refuses any append that would push the record past the ring capacity;
    /// the ring's `produce` is therefore never asked for more space than can
    /// exist, and the record goes out truncated instead of wedging the
    /// producer.
    pub fn append(&mut self, bytes: &[u8]) -> Result<(), RecordError> {
        if self.truncated {
            return Err(RecordError::TooLarge {
                capacity: self.limit + 1,
            });
        }

        let n = u32::try_from(bytes.len()).unwrap_or(u32::MAX);
        if n > self.limit - self.count {
            self.truncated = true;
            self.logger.note_truncated();
            return Err(RecordError::TooLarge {
                capacity: self.limit + 1,
            });
        }

        self.logger.produce(bytes);
        self.count += n;
        Ok(())
    }
}

impl fmt::Write for Record<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.append(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

impl Drop for Record<'_> {
    fn drop(&mut self) {
        // The limit reserves this byte, so the newline always fits.
        self.logger.produce(b"\n");
        self.count += 1;
        self.logger.flush(self.count);
    }
}

#[cfg(test)]
#[path = "record_test.rs"]
mod record_test;
