//! Shared helpers for unit tests.

use std::sync::Arc;

use parking_lot::Mutex;

use limlog_sinks::{Writer, WriterError};

/// Writer that appends everything into a shared byte vector.
#[derive(Clone, Default)]
pub struct CollectingWriter {
    data: Arc<Mutex<Vec<u8>>>,
}

impl CollectingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.data.lock().clone()
    }

    pub fn contents_string(&self) -> String {
        String::from_utf8(self.contents()).expect("writer output is valid utf-8")
    }
}

impl Writer for CollectingWriter {
    fn write(&mut self, data: &[u8]) -> Result<usize, WriterError> {
        self.data.lock().extend_from_slice(data);
        Ok(data.len())
    }
}
