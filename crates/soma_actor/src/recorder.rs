//! Buffered telemetry sink.
//!
//! [`BufferedRecorder`] collects frame samples and ships them in batches over
//! a bounded tokio channel. Sending never blocks the frame: a full channel
//! drops the batch and reports [`TelemetryError::Backpressure`], which the
//! actor logs and ignores. The receiving end is drained out of band, usually
//! by a tokio task writing to disk.

use soma_core::{FrameSample, TelemetryError, TelemetrySink};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Samples per batch.
pub const BATCH_SIZE: usize = 1024;

pub type SampleBatch = Vec<FrameSample>;

pub struct BufferedRecorder {
    buffer: SampleBatch,
    batch_size: usize,
    tx: mpsc::Sender<SampleBatch>,
    dropped: usize,
}

impl BufferedRecorder {
    /// New recorder whose channel holds at most `capacity` unread batches.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<SampleBatch>) {
        Self::with_batch_size(capacity, BATCH_SIZE)
    }

    pub fn with_batch_size(capacity: usize, batch_size: usize) -> (Self, mpsc::Receiver<SampleBatch>) {
        let batch_size = batch_size.max(1);
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let recorder = Self {
            buffer: Vec::with_capacity(batch_size),
            batch_size,
            tx,
            dropped: 0,
        };
        (recorder, rx)
    }

    /// Samples waiting for the next batch.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Samples lost to a full channel so far.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl TelemetrySink for BufferedRecorder {
    fn record(&mut self, sample: FrameSample) -> Result<(), TelemetryError> {
        self.buffer.push(sample);
        if self.buffer.len() >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TelemetryError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let batch = std::mem::replace(&mut self.buffer, Vec::with_capacity(self.batch_size));
        match self.tx.try_send(batch) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(batch)) => {
                self.dropped += batch.len();
                Err(TelemetryError::Backpressure(batch.len()))
            }
            Err(TrySendError::Closed(batch)) => {
                self.dropped += batch.len();
                Err(TelemetryError::ChannelClosed)
            }
        }
    }
}

impl Drop for BufferedRecorder {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!("Telemetry lost on shutdown: {}", e);
        }
    }
}
