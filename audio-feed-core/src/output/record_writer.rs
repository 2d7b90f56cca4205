use std::io::{self, Write};

use crate::models::error::FeedError;
use crate::models::record::OutputRecord;

/// Result of handing one record to the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// The reading end is gone; no further records can be delivered.
    Closed,
}

/// Line-delimited JSON record writer.
///
/// ## Wire Format
///
/// ```text
/// [0.2,0.3,0.9,0.1]\n
/// {"leftSamples":[...],"rightSamples":[...]}\n
/// ```
///
/// Each record is flushed as soon as it is written so a polling parent
/// process sees it immediately.
pub struct RecordWriter<W: Write> {
    inner: W,
    records_written: u64,
    bytes_written: u64,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            records_written: 0,
            bytes_written: 0,
        }
    }

    pub fn write(&mut self, record: &OutputRecord) -> Result<WriteOutcome, FeedError> {
        let mut line = serde_json::to_vec(record)
            .map_err(|e| FeedError::OutputFailed(format!("failed to encode record: {}", e)))?;
        line.push(b'\n');

        match self.inner.write_all(&line).and_then(|_| self.inner.flush()) {
            Ok(()) => {
                self.records_written += 1;
                self.bytes_written += line.len() as u64;
                Ok(WriteOutcome::Written)
            }
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(WriteOutcome::Closed),
            Err(e) => Err(FeedError::OutputFailed(format!("failed to write record: {}", e))),
        }
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}
