//! Background sink engine.
//!
//! One thread drains every registered ring into a large output buffer and
//! hands the buffer to the writer. Producers never touch the writer; the
//! engine never blocks a producer.
//!
//! # Drain cycle
//!
//! ```text
//! lock registry -> copy each ring's consumable run into the output buffer
//! unlock
//! no bytes?  -> signal hit_empty, sleep up to 50us on proceed
//! bytes?     -> writer.write(output), record timings, reset
//! ```
//!
//! # Shutdown rendezvous
//!
//! Teardown sets `thread_sync` and waits on `hit_empty` until the engine has
//! observed an empty pass after the flag was consumed; every record published
//! before the rendezvous began is in the writer by then. A second signal sets
//! `thread_exit` and joins the thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};

use limlog_buffer::BufferRegistry;
use limlog_sinks::Writer;

/// Default output buffer size: 16 MiB.
pub const DEFAULT_OUTPUT_BUFFER_SIZE: usize = 16 << 20;

/// How long the engine sleeps when every ring reports empty.
pub const IDLE_WAIT: Duration = Duration::from_micros(50);

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Output buffer capacity in bytes.
    pub output_buffer_size: usize,

    /// Idle sleep bound for the sink thread.
    pub idle_wait: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            output_buffer_size: DEFAULT_OUTPUT_BUFFER_SIZE,
            idle_wait: IDLE_WAIT,
        }
    }
}

/// Counters the sink thread maintains, readable from any thread.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Writer invocations.
    sink_count: AtomicU64,

    /// Microseconds spent inside the writer.
    total_sink_micros: AtomicU64,

    /// Bytes handed to the writer.
    total_consume_bytes: AtomicU64,
}

impl EngineMetrics {
    fn record_sink(&self, bytes: u64, micros: u64) {
        self.sink_count.fetch_add(1, Ordering::Relaxed);
        self.total_sink_micros.fetch_add(micros, Ordering::Relaxed);
        self.total_consume_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> EngineMetricsSnapshot {
        EngineMetricsSnapshot {
            sink_count: self.sink_count.load(Ordering::Relaxed),
            total_sink_micros: self.total_sink_micros.load(Ordering::Relaxed),
            total_consume_bytes: self.total_consume_bytes.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of [`EngineMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineMetricsSnapshot {
    pub sink_count: u64,
    pub total_sink_micros: u64,
    pub total_consume_bytes: u64,
}

/// Flags the shutdown rendezvous trades with the sink thread.
#[derive(Default)]
struct SyncFlags {
    /// Set by a drainer; consumed by the sink thread, which then runs one
    /// more full pass before reporting empty.
    thread_sync: bool,

    /// Set at teardown; the sink thread exits at the next loop top.
    thread_exit: bool,

    /// Incremented on every empty pass that found `thread_sync` clear;
    /// drainers wait for it to move past their snapshot.
    empty_passes: u64,
}

struct Shared {
    registry: Arc<BufferRegistry>,
    writer: Mutex<Box<dyn Writer>>,
    sync: Mutex<SyncFlags>,
    /// Wakes the sink thread out of its idle sleep.
    proceed: Condvar,
    /// Wakes a drainer once the sink has observed an empty state.
    hit_empty: Condvar,
    metrics: EngineMetrics,
}

/// The background consumer: spawns its thread on construction, drains and
/// joins it on drop.
pub struct SinkEngine {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl SinkEngine {
    pub fn new(registry: Arc<BufferRegistry>, writer: Box<dyn Writer>, config: EngineConfig) -> Self {
        let shared = Arc::new(Shared {
            registry,
            writer: Mutex::new(writer),
            sync: Mutex::new(SyncFlags::default()),
            proceed: Condvar::new(),
            hit_empty: Condvar::new(),
            metrics: EngineMetrics::default(),
        });

        let handle = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("limlog-sink".into())
                .spawn(move || run(&shared, config))
                .expect("failed to spawn sink thread")
        };

        Self {
            shared,
            handle: Some(handle),
        }
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.shared.metrics
    }

    /// Replace the writer. The swap happens between drain cycles.
    pub fn set_writer(&self, writer: Box<dyn Writer>) {
        *self.shared.writer.lock() = writer;
    }

    /// Borrow the writer for reconfiguration.
    pub fn writer_mut(&self) -> MutexGuard<'_, Box<dyn Writer>> {
        self.shared.writer.lock()
    }

    /// Block until every record published before this call is in the writer.
    ///
    /// One full empty-observing pass of the sink thread is awaited: the sync
    /// flag forces an extra pass, and the pass counter only moves on passes
    /// that ran after the flag was consumed.
    pub fn drain(&self) {
        let mut flags = self.shared.sync.lock();
        if flags.thread_exit {
            return;
        }
        let seen = flags.empty_passes;
        flags.thread_sync = true;
        self.shared.proceed.notify_one();
        while flags.empty_passes == seen {
            self.shared.hit_empty.wait(&mut flags);
        }
    }

    fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        self.drain();

        {
            let mut flags = self.shared.sync.lock();
            flags.thread_exit = true;
            self.shared.proceed.notify_one();
        }

        if handle.join().is_err() {
            tracing::error!("sink thread panicked");
        }

        let snapshot = self.shared.metrics.snapshot();
        tracing::debug!(
            sink_count = snapshot.sink_count,
            bytes = snapshot.total_consume_bytes,
            micros = snapshot.total_sink_micros,
            "sink engine stopped"
        );
    }
}

impl Drop for SinkEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Sink thread main loop.
fn run(shared: &Shared, config: EngineConfig) {
    let mut output = vec![0u8; config.output_buffer_size];
    // Bytes staged in `output` but not yet written.
    let mut pending = 0usize;

    loop {
        if shared.sync.lock().thread_exit {
            break;
        }

        // Copy phase: move complete records from every ring into the output
        // buffer, in registration order, a whole ring at a time.
        {
            let buffers = shared.registry.lock();
            for ring in buffers.iter() {
                let consumable = ring.consumable() as usize;
                if output.len() - pending < consumable {
                    // Output buffer full; write what we have and come back.
                    break;
                }
                if consumable > 0 {
                    pending += ring.consume(&mut output[pending..pending + consumable]);
                }
            }
        }

        if pending == 0 {
            let mut flags = shared.sync.lock();
            if flags.thread_sync {
                // A drainer is waiting; run one more full pass first.
                flags.thread_sync = false;
                continue;
            }
            flags.empty_passes += 1;
            shared.hit_empty.notify_all();
            let _ = shared.proceed.wait_for(&mut flags, config.idle_wait);
        } else {
            let start = Instant::now();
            let result = shared.writer.lock().write(&output[..pending]);
            let micros = start.elapsed().as_micros() as u64;

            if let Err(e) = result {
                // Bytes are dropped; the engine never retries.
                tracing::error!(error = %e, bytes = pending, "writer failed, bytes lost");
            }

            shared.metrics.record_sink(pending as u64, micros);
            pending = 0;
        }
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;
