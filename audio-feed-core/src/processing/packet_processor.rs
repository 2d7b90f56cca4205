use crate::models::config::{FeedConfiguration, OutputMode};
use crate::models::error::FeedError;
use crate::models::format::{RawPacket, StreamFormat};
use crate::models::record::OutputRecord;
use crate::processing::compressor::SpectralCompressor;
use crate::processing::sample_extractor::SampleExtractor;

/// Turns one raw packet into one output record according to the output mode.
#[derive(Debug)]
pub struct PacketProcessor {
    mode: OutputMode,
    extractor: SampleExtractor,
    compressor: SpectralCompressor,
}

impl PacketProcessor {
    pub fn new(config: &FeedConfiguration) -> Self {
        Self {
            mode: config.mode,
            extractor: SampleExtractor::new(config.max_samples),
            compressor: SpectralCompressor::new(),
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn process(&mut self, packet: &RawPacket<'_>, format: &StreamFormat) -> Result<OutputRecord, FeedError> {
        match self.mode {
            OutputMode::Amplitude => Ok(OutputRecord::Amplitudes(self.extractor.amplitudes(packet, format)?)),
            OutputMode::Compressed => {
                let (mut left, mut right) = self.extractor.channels(packet, format)?;
                self.compressor.process(&mut left);
                self.compressor.process(&mut right);
                Ok(OutputRecord::Channels {
                    left_samples: left,
                    right_samples: right,
                })
            }
        }
    }
}
