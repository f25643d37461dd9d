//! Writer error types.

/// Errors a [`Writer`](crate::Writer) can report.
///
/// The engine treats every variant the same way: it logs the failure and
/// drops the bytes. Nothing propagates back to a producer.
#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A single write larger than the configured file-size cap.
    #[error("write of {len} bytes exceeds max file size of {max} bytes")]
    EntryTooLarge { len: usize, max: u64 },
}
