use super::error::FeedError;

const WAVE_FORMAT_PCM: u16 = 0x0001;
const WAVE_FORMAT_IEEE_FLOAT: u16 = 0x0003;
const WAVE_FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Sample container type negotiated with the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    Float32,
    Int16,
}

impl SampleFormat {
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            Self::Float32 => 4,
            Self::Int16 => 2,
        }
    }

    /// Classify a wave format descriptor.
    ///
    /// - `tag`: the `wFormatTag` of the descriptor.
    /// - `bits`: bits per sample.
    /// - `sub_format`: the first field of the extensible sub-format GUID,
    ///   only consulted when `tag` is `WAVE_FORMAT_EXTENSIBLE`.
    pub fn from_wave_format(tag: u16, bits: u16, sub_format: Option<u32>) -> Result<Self, FeedError> {
        let effective_tag = if tag == WAVE_FORMAT_EXTENSIBLE {
            match sub_format {
                Some(code) if code <= u16::MAX as u32 => code as u16,
                _ => {
                    return Err(FeedError::FormatUnsupported(
                        "extensible format without a known sub-format".into(),
                    ))
                }
            }
        } else {
            tag
        };

        match (effective_tag, bits) {
            (WAVE_FORMAT_IEEE_FLOAT, 32) => Ok(Self::Float32),
            (WAVE_FORMAT_PCM, 16) => Ok(Self::Int16),
            (t, b) => Err(FeedError::FormatUnsupported(format!(
                "format tag {:#06x} with {} bits per sample",
                t, b
            ))),
        }
    }
}

/// Frame layout of an open loopback stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub sample_format: SampleFormat,
}

impl StreamFormat {
    /// Interleaved stereo float32, the shared-mode mix format on most systems.
    pub fn stereo_f32(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: 2,
            sample_format: SampleFormat::Float32,
        }
    }

    /// Bytes per frame (all channels of one sampling instant).
    pub fn block_align(&self) -> usize {
        self.channels as usize * self.sample_format.bytes_per_sample()
    }

    pub fn validate(&self) -> Result<(), FeedError> {
        if self.channels == 0 {
            return Err(FeedError::FormatUnsupported("stream reports zero channels".into()));
        }
        Ok(())
    }
}

/// Status bits the platform attaches to a captured packet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PacketFlags {
    /// Buffer content must be treated as silence.
    pub silent: bool,
    pub discontinuity: bool,
    pub timestamp_error: bool,
}

/// What a successful buffer acquire reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub frames: u32,
    pub flags: PacketFlags,
}

/// Borrowed view of a platform-owned packet.
///
/// Only valid between acquire and release; the borrow ties it to the
/// lease that owns the acquire.
#[derive(Debug, Clone, Copy)]
pub struct RawPacket<'a> {
    pub data: &'a [u8],
    pub frames: u32,
    pub flags: PacketFlags,
}
