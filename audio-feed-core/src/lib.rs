//! # audio-feed-core
//!
//! Platform-agnostic core of the loopback audio feed.
//!
//! Turns packets from a default-output loopback stream into line-delimited
//! JSON records for visualizers. Platform backends (Windows WASAPI)
//! implement the `LoopbackSource` trait and plug into the generic
//! `CaptureLoop`.
//!
//! ## Architecture
//!
//! ```text
//! audio-feed-core (this crate)
//! ├── traits/       ← LoopbackSource, PacketLease
//! ├── models/       ← FeedError, StreamFormat, FeedConfiguration, OutputRecord, LoopState
//! ├── processing/   ← SampleExtractor, SpectralCompressor, PacketProcessor
//! ├── output/       ← RecordWriter (JSON lines)
//! └── session/      ← CaptureLoop, CaptureWorker, StopSignal
//! ```

pub mod models;
pub mod output;
pub mod processing;
pub mod session;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key types at crate root for convenience.
pub use models::config::{FeedConfiguration, OutputMode};
pub use models::error::FeedError;
pub use models::format::{PacketFlags, PacketHeader, RawPacket, SampleFormat, StreamFormat};
pub use models::record::OutputRecord;
pub use models::state::{LoopState, LoopStats, StopReason};
pub use output::record_writer::{RecordWriter, WriteOutcome};
pub use processing::compressor::SpectralCompressor;
pub use processing::packet_processor::PacketProcessor;
pub use processing::sample_extractor::SampleExtractor;
pub use session::capture_loop::{CaptureLoop, PollOutcome};
pub use session::stop::StopSignal;
pub use session::worker::CaptureWorker;
pub use traits::loopback_source::LoopbackSource;
pub use traits::packet_lease::PacketLease;
