use crate::models::error::FeedError;
use crate::models::format::{RawPacket, SampleFormat, StreamFormat};

/// Decodes raw loopback packets into bounded per-record sample series.
///
/// Frames are read in arrival order and capped at `max_samples / 2`, so a
/// record never carries more than `max_samples` scalars. Only the first two
/// channels of each frame are used; a mono stream feeds both sides.
#[derive(Debug, Clone)]
pub struct SampleExtractor {
    max_samples: usize,
}

impl SampleExtractor {
    pub fn new(max_samples: usize) -> Self {
        Self { max_samples }
    }

    pub fn max_samples(&self) -> usize {
        self.max_samples
    }

    /// Number of frames of `packet` that will be decoded.
    pub fn frames_to_process(&self, packet: &RawPacket<'_>) -> usize {
        (packet.frames as usize).min(self.max_samples / 2)
    }

    /// Interleaved `[L0, R0, L1, R1, ...]` amplitudes, each `clamp(|x|, 0, 1)`.
    pub fn amplitudes(&self, packet: &RawPacket<'_>, format: &StreamFormat) -> Result<Vec<f32>, FeedError> {
        let frames = self.frames_to_process(packet);
        let mut out = Vec::with_capacity(frames * 2);
        self.for_each_frame(packet, format, frames, |left, right| {
            out.push(amplitude(left));
            out.push(amplitude(right));
        })?;
        Ok(out)
    }

    /// Signed left and right series, unclamped.
    pub fn channels(
        &self,
        packet: &RawPacket<'_>,
        format: &StreamFormat,
    ) -> Result<(Vec<f32>, Vec<f32>), FeedError> {
        let frames = self.frames_to_process(packet);
        let mut left_out = Vec::with_capacity(frames);
        let mut right_out = Vec::with_capacity(frames);
        self.for_each_frame(packet, format, frames, |left, right| {
            left_out.push(left);
            right_out.push(right);
        })?;
        Ok((left_out, right_out))
    }

    fn for_each_frame(
        &self,
        packet: &RawPacket<'_>,
        format: &StreamFormat,
        frames: usize,
        mut f: impl FnMut(f32, f32),
    ) -> Result<(), FeedError> {
        format.validate()?;

        let block_align = format.block_align();
        let needed = packet.frames as usize * block_align;
        if packet.data.len() < needed {
            return Err(FeedError::MalformedPacket(format!(
                "{} frames need {} bytes, buffer holds {}",
                packet.frames,
                needed,
                packet.data.len()
            )));
        }

        if packet.flags.silent {
            (0..frames).for_each(|_| f(0.0, 0.0));
            return Ok(());
        }

        let width = format.sample_format.bytes_per_sample();
        let right_offset = if format.channels >= 2 { width } else { 0 };

        for frame in packet.data.chunks_exact(block_align).take(frames) {
            let left = decode(&frame[..width], format.sample_format);
            let right = decode(&frame[right_offset..right_offset + width], format.sample_format);
            f(left, right);
        }
        Ok(())
    }
}

fn decode(bytes: &[u8], sample_format: SampleFormat) -> f32 {
    let value = match sample_format {
        SampleFormat::Float32 => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        SampleFormat::Int16 => i16::from_le_bytes([bytes[0], bytes[1]]) as f32 / i16::MAX as f32,
    };
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn amplitude(sample: f32) -> f32 {
    sample.abs().clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::format::PacketFlags;
    use approx::assert_abs_diff_eq;

    fn stereo_bytes(frames: &[(f32, f32)]) -> Vec<u8> {
        frames
            .iter()
            .flat_map(|(l, r)| l.to_le_bytes().into_iter().chain(r.to_le_bytes()))
            .collect()
    }

    fn packet(data: &[u8], frames: usize) -> RawPacket<'_> {
        RawPacket {
            data,
            frames: frames as u32,
            flags: PacketFlags::default(),
        }
    }

    #[test]
    fn amplitudes_are_interleaved_absolute_values() {
        let frames = [
            (0.2, -0.3),
            (0.9, 0.1),
            (-0.5, 0.5),
            (0.0, -1.0),
            (0.25, 0.75),
            (-0.125, 0.125),
            (0.6, -0.6),
            (0.33, 0.44),
            (-0.05, 0.05),
            (1.0, 0.0),
        ];
        let data = stereo_bytes(&frames);
        let extractor = SampleExtractor::new(64);

        let out = extractor
            .amplitudes(&packet(&data, frames.len()), &StreamFormat::stereo_f32(48000))
            .unwrap();

        let expected: Vec<f32> = frames.iter().flat_map(|(l, r)| [l.abs(), r.abs()]).collect();
        assert_eq!(out.len(), 20);
        for (got, want) in out.iter().zip(&expected) {
            assert_abs_diff_eq!(*got, *want, epsilon = 1e-6);
        }
        assert_abs_diff_eq!(out[0], 0.2, epsilon = 1e-6);
        assert_abs_diff_eq!(out[1], 0.3, epsilon = 1e-6);
        assert_abs_diff_eq!(out[2], 0.9, epsilon = 1e-6);
        assert_abs_diff_eq!(out[3], 0.1, epsilon = 1e-6);
    }

    #[test]
    fn output_never_exceeds_budget() {
        let frames: Vec<(f32, f32)> = (0..200).map(|i| (i as f32 / 200.0, 0.5)).collect();
        let data = stereo_bytes(&frames);
        let format = StreamFormat::stereo_f32(48000);

        for budget in [1, 2, 3, 63, 64, 65, 400, 1000] {
            let extractor = SampleExtractor::new(budget);
            let out = extractor.amplitudes(&packet(&data, frames.len()), &format).unwrap();
            assert!(out.len() <= budget, "budget {} produced {}", budget, out.len());
            assert_eq!(out.len(), (budget / 2).min(200) * 2);
        }
    }

    #[test]
    fn amplitudes_are_clamped_to_unit_range() {
        let data = stereo_bytes(&[(3.5, -7.0), (f32::NAN, f32::INFINITY)]);
        let extractor = SampleExtractor::new(64);

        let out = extractor
            .amplitudes(&packet(&data, 2), &StreamFormat::stereo_f32(48000))
            .unwrap();

        assert_eq!(out, vec![1.0, 1.0, 0.0, 0.0]);
        assert!(out.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn silent_input_yields_zeros() {
        let data = vec![0u8; 16 * 8];
        let extractor = SampleExtractor::new(64);

        let out = extractor
            .amplitudes(&packet(&data, 16), &StreamFormat::stereo_f32(48000))
            .unwrap();

        assert_eq!(out, vec![0.0; 32]);
    }

    #[test]
    fn silent_flag_overrides_buffer_content() {
        let data = stereo_bytes(&[(0.7, 0.8), (0.9, 1.0)]);
        let mut raw = packet(&data, 2);
        raw.flags.silent = true;
        let extractor = SampleExtractor::new(64);

        let (left, right) = extractor.channels(&raw, &StreamFormat::stereo_f32(48000)).unwrap();

        assert_eq!(left, vec![0.0, 0.0]);
        assert_eq!(right, vec![0.0, 0.0]);
    }

    #[test]
    fn int16_samples_are_normalized() {
        let mut data = Vec::new();
        for v in [i16::MAX, i16::MIN, 16384, -16384] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let format = StreamFormat {
            sample_rate: 44100,
            channels: 2,
            sample_format: SampleFormat::Int16,
        };
        let extractor = SampleExtractor::new(64);

        let amps = extractor.amplitudes(&packet(&data, 2), &format).unwrap();
        assert_abs_diff_eq!(amps[0], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(amps[1], 1.0, epsilon = 1e-6); // |i16::MIN| / i16::MAX clamps to 1
        assert_abs_diff_eq!(amps[2], 0.5, epsilon = 1e-4);
        assert_abs_diff_eq!(amps[3], 0.5, epsilon = 1e-4);

        let (left, right) = extractor.channels(&packet(&data, 2), &format).unwrap();
        assert_abs_diff_eq!(left[1], 0.5, epsilon = 1e-4);
        assert_abs_diff_eq!(right[1], -0.5, epsilon = 1e-4);
    }

    #[test]
    fn channels_keep_sign() {
        let data = stereo_bytes(&[(0.2, -0.3), (-0.9, 0.1)]);
        let extractor = SampleExtractor::new(64);

        let (left, right) = extractor
            .channels(&packet(&data, 2), &StreamFormat::stereo_f32(48000))
            .unwrap();

        assert_eq!(left, vec![0.2, -0.9]);
        assert_eq!(right, vec![-0.3, 0.1]);
    }

    #[test]
    fn extra_channels_are_skipped() {
        // 4 channels per frame: only the first two are read.
        let values: [f32; 8] = [0.1, 0.2, 0.8, 0.8, 0.3, 0.4, 0.8, 0.8];
        let data: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let format = StreamFormat {
            sample_rate: 48000,
            channels: 4,
            sample_format: SampleFormat::Float32,
        };
        let extractor = SampleExtractor::new(64);

        let (left, right) = extractor.channels(&packet(&data, 2), &format).unwrap();

        assert_eq!(left, vec![0.1, 0.3]);
        assert_eq!(right, vec![0.2, 0.4]);
    }

    #[test]
    fn mono_feeds_both_sides() {
        let data: Vec<u8> = [0.25f32, -0.5].iter().flat_map(|v| v.to_le_bytes()).collect();
        let format = StreamFormat {
            sample_rate: 48000,
            channels: 1,
            sample_format: SampleFormat::Float32,
        };
        let extractor = SampleExtractor::new(64);

        let (left, right) = extractor.channels(&packet(&data, 2), &format).unwrap();

        assert_eq!(left, right);
        assert_eq!(left, vec![0.25, -0.5]);
    }

    #[test]
    fn short_buffer_is_malformed() {
        let data = stereo_bytes(&[(0.1, 0.1)]);
        let extractor = SampleExtractor::new(64);

        let result = extractor.amplitudes(&packet(&data, 4), &StreamFormat::stereo_f32(48000));

        assert!(matches!(result, Err(FeedError::MalformedPacket(_))));
    }

    #[test]
    fn empty_packet_yields_empty_output() {
        let extractor = SampleExtractor::new(64);
        let out = extractor
            .amplitudes(&packet(&[], 0), &StreamFormat::stereo_f32(48000))
            .unwrap();
        assert!(out.is_empty());
    }
}
