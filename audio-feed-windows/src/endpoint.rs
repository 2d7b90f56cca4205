//! Endpoint description helpers for the MMDevice API.

use windows::core::{PCWSTR, PROPVARIANT};
use windows::Win32::Devices::FunctionDiscovery::PKEY_Device_FriendlyName;
use windows::Win32::Media::Audio::{IMMDevice, WAVEFORMATEX, WAVEFORMATEXTENSIBLE};
use windows::Win32::System::Com::STGM_READ;

use audio_feed_core::models::error::FeedError;
use audio_feed_core::models::format::{SampleFormat, StreamFormat};

const VT_LPWSTR: u16 = 31;
const WAVE_FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Read the PKEY_Device_FriendlyName property from a device.
pub fn friendly_name(device: &IMMDevice) -> Option<String> {
    unsafe {
        let store = device.OpenPropertyStore(STGM_READ).ok()?;
        let value: PROPVARIANT = store.GetValue(&PKEY_Device_FriendlyName).ok()?;

        let inner = &value.as_raw().Anonymous.Anonymous;
        if inner.vt != VT_LPWSTR || inner.Anonymous.pwszVal.is_null() {
            return None;
        }
        PCWSTR(inner.Anonymous.pwszVal).to_string().ok()
    }
}

/// Classify a mix format returned by `IAudioClient::GetMixFormat`.
///
/// # Safety
/// `format` must point to a valid `WAVEFORMATEX`, followed by the
/// extensible tail when its tag says so.
pub unsafe fn describe_mix_format(format: *const WAVEFORMATEX) -> Result<StreamFormat, FeedError> {
    let header = format.read_unaligned();
    let tag = header.wFormatTag;
    let bits = header.wBitsPerSample;
    let extensible_tail = (std::mem::size_of::<WAVEFORMATEXTENSIBLE>() - std::mem::size_of::<WAVEFORMATEX>()) as u16;

    let sub_format = if tag == WAVE_FORMAT_EXTENSIBLE && header.cbSize >= extensible_tail {
        let extensible = (format as *const WAVEFORMATEXTENSIBLE).read_unaligned();
        let guid = extensible.SubFormat;
        Some(guid.data1)
    } else {
        None
    };

    let stream = StreamFormat {
        sample_rate: header.nSamplesPerSec,
        channels: header.nChannels,
        sample_format: SampleFormat::from_wave_format(tag, bits, sub_format)?,
    };
    stream.validate()?;

    let block_align = header.nBlockAlign as usize;
    if block_align != stream.block_align() {
        return Err(FeedError::FormatUnsupported(format!(
            "block alignment {} does not match {} channels of {:?}",
            block_align, stream.channels, stream.sample_format
        )));
    }

    Ok(stream)
}
