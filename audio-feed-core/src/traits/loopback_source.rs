use crate::models::error::FeedError;
use crate::models::format::{PacketHeader, StreamFormat};

/// Interface for platform loopback streams on the default output device.
///
/// Opening is the implementor's constructor; by the time a value exists the
/// endpoint is bound and the stream format is negotiated.
/// Implemented by:
/// - `WasapiLoopbackSource` (Windows)
///
/// Implementations are not required to be `Send`: platform handles are
/// usually thread-affine, so open the source on the thread that polls it.
pub trait LoopbackSource {
    /// Frame layout negotiated when the stream was opened.
    fn format(&self) -> StreamFormat;

    /// Human-readable name of the bound endpoint.
    fn endpoint_name(&self) -> String;

    /// Start the stream. Packets become available after this returns.
    fn start(&mut self) -> Result<(), FeedError>;

    /// Frames in the next pending packet, or 0 when nothing is pending.
    ///
    /// A failure here means the stream is unusable.
    fn next_packet_size(&mut self) -> Result<u32, FeedError>;

    /// Take ownership of the next packet's buffer.
    ///
    /// Every `Ok` must be paired with exactly one `release_buffer`.
    /// Prefer `PacketLease::acquire`, which enforces the pairing.
    fn acquire_buffer(&mut self) -> Result<PacketHeader, FeedError>;

    /// Bytes of the currently held buffer; empty when nothing is held.
    fn buffer(&self) -> &[u8];

    /// Hand the currently held buffer back to the platform.
    fn release_buffer(&mut self, frames: u32) -> Result<(), FeedError>;

    /// Stop the stream and release platform resources. Safe to call twice.
    fn close(&mut self);
}
