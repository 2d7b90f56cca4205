use std::io::Write;
use std::time::Duration;

use crate::models::config::FeedConfiguration;
use crate::models::error::FeedError;
use crate::models::format::StreamFormat;
use crate::models::state::{LoopState, LoopStats, StopReason};
use crate::output::record_writer::{RecordWriter, WriteOutcome};
use crate::processing::packet_processor::PacketProcessor;
use crate::session::stop::StopSignal;
use crate::traits::loopback_source::LoopbackSource;
use crate::traits::packet_lease::PacketLease;

/// What a single poll did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Nothing was pending.
    Idle,
    Emitted,
    /// A packet was pending but could not be turned into a record.
    Dropped,
    /// The record consumer is gone.
    OutputClosed,
}

/// Polling capture loop over a `LoopbackSource`.
///
/// Data flow per wake-up:
/// ```text
/// next_packet_size → PacketLease → PacketProcessor → release → RecordWriter → sleep
/// ```
///
/// At most one packet is drained per wake-up; backlog is left to the
/// platform. Buffer-level failures drop the packet and keep the loop alive;
/// a failed poll stops it. The source is closed exactly once when the loop
/// finishes (or when the loop is dropped).
pub struct CaptureLoop<S: LoopbackSource, W: Write> {
    source: S,
    format: StreamFormat,
    processor: PacketProcessor,
    writer: RecordWriter<W>,
    interval: Duration,
    state: LoopState,
    stats: LoopStats,
    started: bool,
    closed: bool,
}

impl<S: LoopbackSource, W: Write> CaptureLoop<S, W> {
    pub fn new(source: S, config: &FeedConfiguration, writer: W) -> Result<Self, FeedError> {
        config.validate()?;
        let format = source.format();
        format.validate()?;

        Ok(Self {
            source,
            format,
            processor: PacketProcessor::new(config),
            writer: RecordWriter::new(writer),
            interval: config.interval,
            state: LoopState::Running,
            stats: LoopStats::default(),
            started: false,
            closed: false,
        })
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn format(&self) -> StreamFormat {
        self.format
    }

    pub fn writer(&self) -> &RecordWriter<W> {
        &self.writer
    }

    /// Start the underlying stream. Idempotent.
    pub fn start(&mut self) -> Result<(), FeedError> {
        if self.started {
            return Ok(());
        }
        self.source.start()?;
        self.started = true;
        log::info!(
            "Loopback capture started on '{}' ({} Hz, {} ch, {:?})",
            self.source.endpoint_name(),
            self.format.sample_rate,
            self.format.channels,
            self.format.sample_format
        );
        Ok(())
    }

    /// Poll once and drain at most one packet.
    ///
    /// Only an unusable stream or an unwritable output is returned as an error.
    pub fn poll_once(&mut self) -> Result<PollOutcome, FeedError> {
        self.stats.polls += 1;

        let pending = self.source.next_packet_size()?;
        if pending == 0 {
            self.stats.empty_polls += 1;
            return Ok(PollOutcome::Idle);
        }

        let lease = match PacketLease::acquire(&mut self.source) {
            Ok(lease) => lease,
            Err(e) => {
                log::warn!("Dropping packet: {}", e);
                self.stats.packets_dropped += 1;
                return Ok(PollOutcome::Dropped);
            }
        };

        if lease.header().flags.discontinuity {
            log::debug!("Packet follows a capture discontinuity");
        }

        let processed = self.processor.process(&lease.packet(), &self.format);

        if let Err(e) = lease.release() {
            log::warn!("{}", e);
        }

        let record = match processed {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Dropping packet: {}", e);
                self.stats.packets_dropped += 1;
                return Ok(PollOutcome::Dropped);
            }
        };

        match self.writer.write(&record)? {
            WriteOutcome::Written => {
                self.stats.records_emitted += 1;
                Ok(PollOutcome::Emitted)
            }
            WriteOutcome::Closed => Ok(PollOutcome::OutputClosed),
        }
    }

    /// Run until `stop` is requested, the output closes, or the stream fails.
    pub fn run(&mut self, stop: &StopSignal) -> Result<LoopStats, FeedError> {
        if let Err(e) = self.start() {
            self.finish(StopReason::Failed(e.clone()));
            return Err(e);
        }

        let reason = loop {
            if stop.is_stop_requested() {
                break StopReason::Requested;
            }

            match self.poll_once() {
                Ok(PollOutcome::OutputClosed) => break StopReason::OutputClosed,
                Ok(_) => {}
                Err(e) => break StopReason::Failed(e),
            }

            if stop.wait(self.interval) {
                break StopReason::Requested;
            }
        };

        self.finish(reason.clone());

        match reason {
            StopReason::Failed(e) => Err(e),
            _ => Ok(self.stats),
        }
    }

    fn finish(&mut self, reason: StopReason) {
        match &reason {
            StopReason::Requested => log::info!("Capture stop requested"),
            StopReason::OutputClosed => log::info!("Record consumer closed the output"),
            StopReason::Failed(e) => log::error!("Loopback capture error: {}", e),
        }
        log::info!(
            "Capture finished: {} polls ({} empty), {} records, {} dropped",
            self.stats.polls,
            self.stats.empty_polls,
            self.stats.records_emitted,
            self.stats.packets_dropped
        );
        self.close_source();
        self.state = LoopState::Stopped(reason);
    }

    fn close_source(&mut self) {
        if !self.closed {
            self.closed = true;
            self.source.close();
        }
    }
}

impl<S: LoopbackSource, W: Write> Drop for CaptureLoop<S, W> {
    fn drop(&mut self) {
        self.close_source();
    }
}
