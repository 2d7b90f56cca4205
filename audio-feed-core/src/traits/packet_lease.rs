use crate::models::error::FeedError;
use crate::models::format::{PacketHeader, RawPacket};
use crate::traits::loopback_source::LoopbackSource;

/// Scoped ownership of one acquired platform buffer.
///
/// The buffer goes back to the platform exactly once: either through
/// `release()`, which reports the result, or on drop, which logs it.
pub struct PacketLease<'a, S: LoopbackSource + ?Sized> {
    source: &'a mut S,
    header: PacketHeader,
    released: bool,
}

impl<'a, S: LoopbackSource + ?Sized> PacketLease<'a, S> {
    pub fn acquire(source: &'a mut S) -> Result<Self, FeedError> {
        let header = source.acquire_buffer()?;
        Ok(Self {
            source,
            header,
            released: false,
        })
    }

    pub fn header(&self) -> PacketHeader {
        self.header
    }

    /// View of the held buffer. The borrow ends before `release()` can run.
    pub fn packet(&self) -> RawPacket<'_> {
        RawPacket {
            data: self.source.buffer(),
            frames: self.header.frames,
            flags: self.header.flags,
        }
    }

    pub fn release(mut self) -> Result<(), FeedError> {
        self.released = true;
        self.source.release_buffer(self.header.frames)
    }
}

impl<S: LoopbackSource + ?Sized> Drop for PacketLease<'_, S> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.source.release_buffer(self.header.frames) {
            log::warn!("Failed to release abandoned buffer: {}", e);
        }
    }
}
