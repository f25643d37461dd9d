//! Process-wide logging facade.
//!
//! A [`Logger`] owns the buffer registry and the sink engine, and hands each
//! producer thread its own lazily created ring. The usual shape is the
//! process-wide singleton behind [`logger()`], configured once at startup:
//!
//! ```no_run
//! limlog::set_level(limlog::Level::Debug);
//! limlog::set_log_file("/var/log/app");
//! limlog::info!("service listening on {}", 8080);
//! ```
//!
//! Owned instances work too and are what the tests use; dropping an owned
//! `Logger` drains every published record and joins the sink thread.

use std::cell::RefCell;
use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;

use limlog_buffer::{BufferRegistry, RingBuffer, DEFAULT_RING_CAPACITY};
use limlog_sinks::{RotateConfig, RotatingFileWriter, StdoutWriter, Writer};

use crate::engine::{EngineConfig, SinkEngine};
use crate::level::Level;
use crate::record::{Location, Record};
use crate::timestamp::Precision;

/// Facade configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Minimum level a record needs to be emitted.
    pub level: Level,

    /// Fractional precision of record timestamps.
    pub precision: Precision,

    /// Capacity of each per-thread ring, rounded up to a power of two.
    pub ring_capacity: usize,

    /// Sink engine tuning.
    pub engine: EngineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: Level::Info,
            precision: Precision::Micro,
            ring_capacity: DEFAULT_RING_CAPACITY,
            engine: EngineConfig::default(),
        }
    }
}

static NEXT_LOGGER_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    /// This thread's ring per live logger, keyed by logger id.
    static THREAD_RINGS: RefCell<Vec<(u64, Arc<RingBuffer>)>> = const { RefCell::new(Vec::new()) };
}

/// The logging facade: level filter, per-thread rings, background engine.
pub struct Logger {
    id: u64,
    level: AtomicU8,
    precision: AtomicU8,
    ring_capacity: usize,
    registry: Arc<BufferRegistry>,
    engine: SinkEngine,
    /// Records published, bumped on every `flush`.
    log_count: AtomicU64,
    /// Records cut short by the ring-capacity guard.
    truncated_records: AtomicU64,
}

impl Logger {
    /// Logger writing to stdout.
    pub fn new(config: Config) -> Self {
        Self::with_writer(config, Box::new(StdoutWriter::new()))
    }

    /// Logger writing to the given sink.
    pub fn with_writer(config: Config, writer: Box<dyn Writer>) -> Self {
        let registry = Arc::new(BufferRegistry::new());
        let engine = SinkEngine::new(Arc::clone(&registry), writer, config.engine.clone());

        Self {
            id: NEXT_LOGGER_ID.fetch_add(1, Ordering::Relaxed),
            level: AtomicU8::new(config.level as u8),
            precision: AtomicU8::new(config.precision as u8),
            ring_capacity: config.ring_capacity.next_power_of_two(),
            registry,
            engine,
            log_count: AtomicU64::new(0),
            truncated_records: AtomicU64::new(0),
        }
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    pub fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, level: Level) {
        self.level.store(level as u8, Ordering::Relaxed);
    }

    /// Whether a record at `level` would be emitted.
    #[inline]
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.level()
    }

    pub fn precision(&self) -> Precision {
        Precision::from_u8(self.precision.load(Ordering::Relaxed))
    }

    pub fn set_precision(&self, precision: Precision) {
        self.precision.store(precision as u8, Ordering::Relaxed);
    }

    /// Substitute the sink. Takes effect between drain cycles.
    pub fn set_writer(&self, writer: Box<dyn Writer>) {
        self.engine.set_writer(writer);
    }

    /// Route records to a size-rotated file at `path`.
    ///
    /// A path without an extension gets `.log` appended; parent directories
    /// are created. Failing to open the initial file is a configuration
    /// error and panics.
    pub fn set_log_file(&self, path: impl AsRef<Path>) {
        let mut path = path.as_ref().to_path_buf();
        if path.extension().is_none() {
            path.set_extension("log");
        }

        let writer = RotatingFileWriter::new(RotateConfig::default().with_filename(&path));
        writer.ensure_open().expect("failed to open log file");
        self.engine.set_writer(Box::new(writer));
    }

    /// Per-file size cap in MiB for file-backed writers; 0 means default.
    pub fn set_max_size(&self, mib: u64) {
        self.engine.writer_mut().set_max_size(mib);
    }

    /// Retained backups for file-backed writers; 0 means unbounded.
    pub fn set_max_backups(&self, count: usize) {
        self.engine.writer_mut().set_max_backups(count);
    }

    // ------------------------------------------------------------------
    // Producing
    // ------------------------------------------------------------------

    /// Start a record. The level filter has already been consulted by the
    /// macros; calling this directly always emits.
    pub fn record(&self, level: Level, loc: Option<Location>) -> Record<'_> {
        Record::new(self, level, loc)
    }

    /// Append raw bytes to this thread's ring without publishing them.
    pub fn produce(&self, data: &[u8]) {
        self.with_thread_ring(|ring| ring.produce(data));
    }

    /// Publish `n` produced bytes as one complete record.
    pub fn flush(&self, n: u32) {
        self.with_thread_ring(|ring| ring.advance_consumable(n));
        self.log_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Block until everything published so far has reached the writer.
    pub fn drain(&self) {
        self.engine.drain();
    }

    pub(crate) fn ring_capacity(&self) -> usize {
        self.ring_capacity
    }

    pub(crate) fn note_truncated(&self) {
        self.truncated_records.fetch_add(1, Ordering::Relaxed);
    }

    fn with_thread_ring<R>(&self, f: impl FnOnce(&RingBuffer) -> R) -> R {
        THREAD_RINGS.with(|cell| {
            let mut rings = cell.borrow_mut();
            if let Some((_, ring)) = rings.iter().find(|(id, _)| *id == self.id) {
                return f(ring.as_ref());
            }

            // First record from this thread: allocate and register its ring.
            let ring = Arc::new(RingBuffer::new(self.ring_capacity));
            self.registry.register(Arc::clone(&ring));
            rings.push((self.id, ring));
            f(rings.last().expect("just pushed").1.as_ref())
        })
    }

    // ------------------------------------------------------------------
    // Statistics
    // ------------------------------------------------------------------

    pub fn statistics(&self) -> Statistics {
        let engine = self.engine.metrics().snapshot();
        let avg = |total: u64, count: u64| if count == 0 { 0 } else { total / count };

        Statistics {
            produced_records: self.log_count.load(Ordering::Relaxed),
            truncated_records: self.truncated_records.load(Ordering::Relaxed),
            sink_count: engine.sink_count,
            total_sink_bytes: engine.total_consume_bytes,
            avg_sink_bytes: avg(engine.total_consume_bytes, engine.sink_count),
            total_sink_micros: engine.total_sink_micros,
            avg_sink_micros: avg(engine.total_sink_micros, engine.sink_count),
        }
    }

    /// Emit the current statistics through `tracing`.
    pub fn list_statistics(&self) {
        let s = self.statistics();
        tracing::info!(
            produced_records = s.produced_records,
            truncated_records = s.truncated_records,
            sink_count = s.sink_count,
            total_sink_bytes = s.total_sink_bytes,
            avg_sink_bytes = s.avg_sink_bytes,
            total_sink_micros = s.total_sink_micros,
            avg_sink_micros = s.avg_sink_micros,
            "logging statistics"
        );
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        // Flush everything published so far, then report; the engine member
        // runs the exit half of the shutdown protocol right after.
        self.drain();
        self.list_statistics();
    }
}

/// Point-in-time logging statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    pub produced_records: u64,
    pub truncated_records: u64,
    pub sink_count: u64,
    pub total_sink_bytes: u64,
    pub avg_sink_bytes: u64,
    pub total_sink_micros: u64,
    pub avg_sink_micros: u64,
}

// ----------------------------------------------------------------------
// Process-wide facade
// ----------------------------------------------------------------------

static GLOBAL: OnceCell<Logger> = OnceCell::new();

/// The process-wide logger, created on first use with [`Config::default`].
pub fn logger() -> &'static Logger {
    GLOBAL.get_or_init(|| Logger::new(Config::default()))
}

/// Set the process-wide level filter.
pub fn set_level(level: Level) {
    logger().set_level(level);
}

/// The process-wide level filter.
pub fn level() -> Level {
    logger().level()
}

/// Route the process-wide logger to a size-rotated file.
pub fn set_log_file(path: impl AsRef<Path>) {
    logger().set_log_file(path);
}

/// Per-file size cap in MiB; 0 means the writer default.
pub fn set_max_size(mib: u64) {
    logger().set_max_size(mib);
}

/// Retained backups; 0 means unbounded.
pub fn set_max_backups(count: usize) {
    logger().set_max_backups(count);
}

/// Substitute the process-wide sink.
pub fn set_writer(writer: Box<dyn Writer>) {
    logger().set_writer(writer);
}

/// Set the record timestamp precision.
pub fn set_precision(precision: Precision) {
    logger().set_precision(precision);
}

/// Block until everything published so far has reached the writer.
pub fn drain() {
    logger().drain();
}

/// Current process-wide logging statistics.
pub fn statistics() -> Statistics {
    logger().statistics()
}

#[cfg(test)]
#[path = "logger_test.rs"]
mod logger_test;
