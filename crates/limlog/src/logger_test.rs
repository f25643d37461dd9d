//! Tests for the logging facade.

use std::fmt::Write as FmtWrite;
use std::sync::Arc;

use crate::level::Level;
use crate::logger::{Config, Logger};
use crate::test_util::CollectingWriter;

fn collecting_logger() -> (Logger, CollectingWriter) {
    let writer = CollectingWriter::new();
    let logger = Logger::with_writer(Config::default(), Box::new(writer.clone()));
    (logger, writer)
}

// ============================================================================
// Level filter
// ============================================================================

#[test]
fn test_default_level_is_info() {
    let (logger, _writer) = collecting_logger();
    assert_eq!(logger.level(), Level::Info);
    assert!(!logger.enabled(Level::Debug));
    assert!(logger.enabled(Level::Info));
    assert!(logger.enabled(Level::Fatal));
}

#[test]
fn test_set_level() {
    let (logger, _writer) = collecting_logger();
    logger.set_level(Level::Error);
    assert!(!logger.enabled(Level::Warn));
    assert!(logger.enabled(Level::Error));
}

// ============================================================================
// Produce / flush
// ============================================================================

#[test]
fn test_produce_then_flush_publishes() {
    let (logger, writer) = collecting_logger();

    logger.produce(b"raw bytes\n");
    logger.flush(10);
    logger.drain();

    assert_eq!(writer.contents(), b"raw bytes\n");
    assert_eq!(logger.statistics().produced_records, 1);
}

#[test]
fn test_unflushed_bytes_are_withheld() {
    let (logger, writer) = collecting_logger();

    logger.produce(b"not yet");
    logger.drain();
    assert!(writer.contents().is_empty());

    logger.flush(7);
    logger.drain();
    assert_eq!(writer.contents(), b"not yet");
}

#[test]
fn test_each_thread_gets_its_own_ring() {
    let (logger, writer) = collecting_logger();
    let logger = Arc::new(logger);

    logger.produce(b"main\n");
    logger.flush(5);

    {
        let logger = Arc::clone(&logger);
        std::thread::spawn(move || {
            logger.produce(b"spawned\n");
            logger.flush(8);
        })
        .join()
        .unwrap();
    }

    logger.drain();
    let out = writer.contents_string();
    assert!(out.contains("main\n"));
    assert!(out.contains("spawned\n"));
    assert_eq!(logger.statistics().produced_records, 2);
}

// ============================================================================
// Writer management
// ============================================================================

#[test]
fn test_set_writer_swaps_sink() {
    let (logger, first) = collecting_logger();

    logger.produce(b"to first\n");
    logger.flush(9);
    logger.drain();

    let second = CollectingWriter::new();
    logger.set_writer(Box::new(second.clone()));
    logger.produce(b"to second\n");
    logger.flush(10);
    logger.drain();

    assert_eq!(first.contents(), b"to first\n");
    assert_eq!(second.contents(), b"to second\n");
}

#[test]
fn test_set_log_file_appends_log_extension() {
    let dir = tempfile::TempDir::new().unwrap();
    let (logger, _writer) = collecting_logger();

    logger.set_log_file(dir.path().join("app"));
    logger.produce(b"on disk\n");
    logger.flush(8);
    logger.drain();

    let contents = std::fs::read(dir.path().join("app.log")).unwrap();
    assert_eq!(contents, b"on disk\n");
}

#[test]
fn test_set_log_file_keeps_custom_extension() {
    let dir = tempfile::TempDir::new().unwrap();
    let (logger, _writer) = collecting_logger();

    logger.set_log_file(dir.path().join("app.txt"));
    logger.produce(b"x\n");
    logger.flush(2);
    logger.drain();

    assert!(dir.path().join("app.txt").exists());
}

// ============================================================================
// Statistics and teardown
// ============================================================================

#[test]
fn test_statistics_track_bytes_and_averages() {
    let (logger, _writer) = collecting_logger();

    logger.produce(b"0123456789");
    logger.flush(10);
    logger.drain();

    let stats = logger.statistics();
    assert_eq!(stats.produced_records, 1);
    assert_eq!(stats.total_sink_bytes, 10);
    assert!(stats.sink_count >= 1);
    assert_eq!(stats.avg_sink_bytes, stats.total_sink_bytes / stats.sink_count);
}

#[test]
fn test_drop_flushes_trailing_record() {
    let writer = CollectingWriter::new();
    {
        let logger = Logger::with_writer(Config::default(), Box::new(writer.clone()));
        let mut record = logger.record(Level::Info, None);
        let _ = write!(record, "teardown");
        drop(record);
        // Logger dropped here without an explicit drain.
    }
    assert!(writer.contents_string().contains("teardown"));
}
