//! In-memory `LoopbackSource` that replays a script of packets and counts
//! platform calls, for exercising the capture loop without hardware.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::FeedError;
use crate::models::format::{PacketFlags, PacketHeader, SampleFormat, StreamFormat};
use crate::session::stop::StopSignal;
use crate::traits::loopback_source::LoopbackSource;

#[derive(Debug, Clone)]
pub(crate) struct ScriptedPacket {
    pub data: Vec<u8>,
    pub frames: u32,
    pub flags: PacketFlags,
}

/// One poll's worth of scripted platform behavior.
#[derive(Debug, Clone)]
pub(crate) enum ScriptStep {
    /// `next_packet_size` reports nothing pending.
    Empty,
    /// `next_packet_size` fails.
    PollFails,
    /// A packet is pending but `acquire_buffer` fails.
    AcquireFails,
    Deliver(ScriptedPacket),
    /// Delivered normally, but `release_buffer` fails.
    ReleaseFails(ScriptedPacket),
}

impl ScriptStep {
    pub fn stereo(frames: &[(f32, f32)]) -> Self {
        let mut data = Vec::with_capacity(frames.len() * 8);
        for (l, r) in frames {
            data.extend_from_slice(&l.to_le_bytes());
            data.extend_from_slice(&r.to_le_bytes());
        }
        Self::Deliver(ScriptedPacket {
            data,
            frames: frames.len() as u32,
            flags: PacketFlags::default(),
        })
    }

    pub fn stereo_i16(frames: &[(i16, i16)]) -> Self {
        let mut data = Vec::with_capacity(frames.len() * 4);
        for (l, r) in frames {
            data.extend_from_slice(&l.to_le_bytes());
            data.extend_from_slice(&r.to_le_bytes());
        }
        Self::Deliver(ScriptedPacket {
            data,
            frames: frames.len() as u32,
            flags: PacketFlags::default(),
        })
    }

    /// A packet that declares more frames than its buffer holds.
    pub fn truncated(frames: u32) -> Self {
        Self::Deliver(ScriptedPacket {
            data: vec![0u8; 4],
            frames,
            flags: PacketFlags::default(),
        })
    }

    pub fn silent(self) -> Self {
        self.map_packet(|p| p.flags.silent = true)
    }

    pub fn failing_release(self) -> Self {
        match self {
            Self::Deliver(p) => Self::ReleaseFails(p),
            other => other,
        }
    }

    fn map_packet(self, f: impl FnOnce(&mut ScriptedPacket)) -> Self {
        match self {
            Self::Deliver(mut p) => {
                f(&mut p);
                Self::Deliver(p)
            }
            Self::ReleaseFails(mut p) => {
                f(&mut p);
                Self::ReleaseFails(p)
            }
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CallCounts {
    pub started: u32,
    pub polls: u32,
    pub acquired: u32,
    pub released: u32,
    pub closed: u32,
}

pub(crate) struct ScriptedSource {
    format: StreamFormat,
    steps: VecDeque<ScriptStep>,
    pending: Option<ScriptStep>,
    held: Option<Vec<u8>>,
    fail_release: bool,
    stop_when_exhausted: Option<StopSignal>,
    calls: Arc<Mutex<CallCounts>>,
}

impl ScriptedSource {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            format: StreamFormat::stereo_f32(48000),
            steps: steps.into(),
            pending: None,
            held: None,
            fail_release: false,
            stop_when_exhausted: None,
            calls: Arc::new(Mutex::new(CallCounts::default())),
        }
    }

    pub fn with_format(mut self, format: StreamFormat) -> Self {
        self.format = format;
        self
    }

    pub fn int16(self) -> Self {
        self.with_format(StreamFormat {
            sample_rate: 44100,
            channels: 2,
            sample_format: SampleFormat::Int16,
        })
    }

    /// Request a stop once the script has been fully replayed.
    pub fn stopping(mut self, stop: &StopSignal) -> Self {
        self.stop_when_exhausted = Some(stop.clone());
        self
    }

    pub fn calls(&self) -> CallCounts {
        *self.calls.lock()
    }

    /// Shared counters that outlive the source.
    pub fn call_log(&self) -> Arc<Mutex<CallCounts>> {
        Arc::clone(&self.calls)
    }
}

impl LoopbackSource for ScriptedSource {
    fn format(&self) -> StreamFormat {
        self.format
    }

    fn endpoint_name(&self) -> String {
        "Scripted Loopback".into()
    }

    fn start(&mut self) -> Result<(), FeedError> {
        self.calls.lock().started += 1;
        Ok(())
    }

    fn next_packet_size(&mut self) -> Result<u32, FeedError> {
        self.calls.lock().polls += 1;
        match self.steps.pop_front() {
            Some(ScriptStep::Empty) => Ok(0),
            Some(ScriptStep::PollFails) => Err(FeedError::StreamFailed("device invalidated".into())),
            Some(step) => {
                let frames = match &step {
                    ScriptStep::Deliver(p) | ScriptStep::ReleaseFails(p) => p.frames.max(1),
                    _ => 1,
                };
                self.pending = Some(step);
                Ok(frames)
            }
            None => {
                if let Some(stop) = &self.stop_when_exhausted {
                    stop.request_stop();
                }
                Ok(0)
            }
        }
    }

    fn acquire_buffer(&mut self) -> Result<PacketHeader, FeedError> {
        assert!(self.held.is_none(), "acquire while a buffer is still held");
        let packet = match self.pending.take() {
            Some(ScriptStep::Deliver(p)) => p,
            Some(ScriptStep::ReleaseFails(p)) => {
                self.fail_release = true;
                p
            }
            Some(ScriptStep::AcquireFails) => {
                return Err(FeedError::BufferAcquireFailed("scripted failure".into()))
            }
            _ => return Err(FeedError::BufferAcquireFailed("nothing pending".into())),
        };
        self.held = Some(packet.data);
        self.calls.lock().acquired += 1;
        Ok(PacketHeader {
            frames: packet.frames,
            flags: packet.flags,
        })
    }

    fn buffer(&self) -> &[u8] {
        self.held.as_deref().unwrap_or(&[])
    }

    fn release_buffer(&mut self, _frames: u32) -> Result<(), FeedError> {
        assert!(self.held.take().is_some(), "release without a held buffer");
        self.calls.lock().released += 1;
        if std::mem::take(&mut self.fail_release) {
            return Err(FeedError::BufferReleaseFailed("scripted failure".into()));
        }
        Ok(())
    }

    fn close(&mut self) {
        self.calls.lock().closed += 1;
    }
}
