//! WASAPI loopback source for the default output device.
//!
//! Opens the default render endpoint in shared mode with
//! `AUDCLNT_STREAMFLAGS_LOOPBACK`, so packets carry the mix currently being
//! played. No special permissions are needed on Windows; DRM-protected
//! audio is silenced by the platform.

use windows::core::PCWSTR;
use windows::Win32::Foundation::HANDLE;
use windows::Win32::Media::Audio::*;
use windows::Win32::System::Com::*;
use windows::Win32::System::Threading::*;

use audio_feed_core::models::error::FeedError;
use audio_feed_core::models::format::{PacketFlags, PacketHeader, StreamFormat};
use audio_feed_core::traits::loopback_source::LoopbackSource;

use crate::endpoint;

/// Shared-mode buffer duration requested from the engine: 100ms in 100ns units.
const BUFFER_DURATION: i64 = 1_000_000;

/// Platform buffer currently lent to the caller.
struct HeldBuffer {
    data: *mut u8,
    len: usize,
}

/// WASAPI loopback stream on the default render endpoint.
///
/// COM objects are created on, and confined to, the opening thread; this
/// type is deliberately not `Send`.
pub struct WasapiLoopbackSource {
    endpoint_name: String,
    format: StreamFormat,
    audio_client: IAudioClient,
    capture_client: IAudioCaptureClient,
    held: Option<HeldBuffer>,
    mmcss: Option<HANDLE>,
    started: bool,
    closed: bool,
    // Declared last so COM is uninitialized after the interfaces are released.
    _com_guard: CoUninitializeGuard,
}

impl WasapiLoopbackSource {
    /// Bind to the default render endpoint and negotiate the loopback stream.
    ///
    /// Sequence:
    /// 1. CoInitializeEx (MTA)
    /// 2. Get default render endpoint
    /// 3. Activate IAudioClient
    /// 4. Read and classify the mix format
    /// 5. Initialize with LOOPBACK flag in shared mode
    /// 6. Get IAudioCaptureClient
    pub fn open_default() -> Result<Self, FeedError> {
        unsafe {
            CoInitializeEx(None, COINIT_MULTITHREADED)
                .ok()
                .map_err(|e| FeedError::ActivationFailed(format!("CoInitializeEx failed: {}", e)))?;

            let com_guard = CoUninitializeGuard;

            let enumerator: IMMDeviceEnumerator =
                CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL).map_err(|_| FeedError::DeviceUnavailable)?;

            // Loopback reads from the RENDER endpoint.
            let device = enumerator
                .GetDefaultAudioEndpoint(eRender, eConsole)
                .map_err(|_| FeedError::DeviceUnavailable)?;

            let endpoint_name = endpoint::friendly_name(&device).unwrap_or_else(|| "Default Output".into());

            let audio_client: IAudioClient = device
                .Activate(CLSCTX_ALL, None)
                .map_err(|e| FeedError::ActivationFailed(format!("Activate failed: {}", e)))?;

            let mix_format = MixFormat(
                audio_client
                    .GetMixFormat()
                    .map_err(|e| FeedError::ActivationFailed(format!("GetMixFormat failed: {}", e)))?,
            );

            let format = endpoint::describe_mix_format(mix_format.0)?;

            audio_client
                .Initialize(
                    AUDCLNT_SHAREMODE_SHARED,
                    AUDCLNT_STREAMFLAGS_LOOPBACK | AUDCLNT_STREAMFLAGS_NOPERSIST,
                    BUFFER_DURATION,
                    0,
                    mix_format.0,
                    None,
                )
                .map_err(|e| {
                    FeedError::ActivationFailed(format!("IAudioClient::Initialize (loopback) failed: {}", e))
                })?;

            let capture_client: IAudioCaptureClient = audio_client
                .GetService()
                .map_err(|e| FeedError::ActivationFailed(format!("GetService failed: {}", e)))?;

            log::debug!("Opened loopback on '{}': {:?}", endpoint_name, format);

            Ok(Self {
                endpoint_name,
                format,
                audio_client,
                capture_client,
                held: None,
                mmcss: None,
                started: false,
                closed: false,
                _com_guard: com_guard,
            })
        }
    }
}

impl LoopbackSource for WasapiLoopbackSource {
    fn format(&self) -> StreamFormat {
        self.format
    }

    fn endpoint_name(&self) -> String {
        self.endpoint_name.clone()
    }

    fn start(&mut self) -> Result<(), FeedError> {
        if self.started {
            return Ok(());
        }
        unsafe {
            // MMCSS registration for real-time priority on the polling thread
            let mut task_index: u32 = 0;
            let task_name: Vec<u16> = "Pro Audio\0".encode_utf16().collect();
            self.mmcss = AvSetMmThreadCharacteristicsW(PCWSTR(task_name.as_ptr()), &mut task_index).ok();
            if self.mmcss.is_none() {
                log::debug!("MMCSS registration unavailable, polling at normal priority");
            }

            self.audio_client
                .Start()
                .map_err(|e| FeedError::StreamFailed(format!("IAudioClient::Start failed: {}", e)))?;
        }
        self.started = true;
        Ok(())
    }

    fn next_packet_size(&mut self) -> Result<u32, FeedError> {
        unsafe { self.capture_client.GetNextPacketSize() }
            .map_err(|e| FeedError::StreamFailed(format!("GetNextPacketSize failed: {}", e)))
    }

    fn acquire_buffer(&mut self) -> Result<PacketHeader, FeedError> {
        if self.held.is_some() {
            return Err(FeedError::BufferAcquireFailed("previous buffer still held".into()));
        }

        let mut data: *mut u8 = std::ptr::null_mut();
        let mut frames: u32 = 0;
        let mut flags: u32 = 0;

        unsafe {
            self.capture_client
                .GetBuffer(&mut data, &mut frames, &mut flags, None, None)
                .map_err(|e| FeedError::BufferAcquireFailed(format!("GetBuffer failed: {}", e)))?;
        }

        let len = if data.is_null() {
            0
        } else {
            frames as usize * self.format.block_align()
        };
        self.held = Some(HeldBuffer { data, len });

        Ok(PacketHeader {
            frames,
            flags: decode_flags(flags),
        })
    }

    fn buffer(&self) -> &[u8] {
        match &self.held {
            // SAFETY: the engine guarantees `frames * nBlockAlign` readable bytes
            // until ReleaseBuffer, and `held` is cleared before that call.
            Some(held) if held.len > 0 => unsafe { std::slice::from_raw_parts(held.data, held.len) },
            _ => &[],
        }
    }

    fn release_buffer(&mut self, frames: u32) -> Result<(), FeedError> {
        if self.held.take().is_none() {
            return Err(FeedError::BufferReleaseFailed("no buffer held".into()));
        }
        unsafe { self.capture_client.ReleaseBuffer(frames) }
            .map_err(|e| FeedError::BufferReleaseFailed(format!("ReleaseBuffer failed: {}", e)))
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        unsafe {
            if self.held.take().is_some() {
                let _ = self.capture_client.ReleaseBuffer(0);
            }
            if self.started {
                if let Err(e) = self.audio_client.Stop() {
                    log::warn!("IAudioClient::Stop failed: {}", e);
                }
            }
            if let Some(handle) = self.mmcss.take() {
                let _ = AvRevertMmThreadCharacteristics(handle);
            }
        }
        log::debug!("Closed loopback on '{}'", self.endpoint_name);
    }
}

impl Drop for WasapiLoopbackSource {
    fn drop(&mut self) {
        self.close();
    }
}

fn decode_flags(flags: u32) -> PacketFlags {
    PacketFlags {
        silent: flags & (AUDCLNT_BUFFERFLAGS_SILENT.0 as u32) != 0,
        discontinuity: flags & (AUDCLNT_BUFFERFLAGS_DATA_DISCONTINUITY.0 as u32) != 0,
        timestamp_error: flags & (AUDCLNT_BUFFERFLAGS_TIMESTAMP_ERROR.0 as u32) != 0,
    }
}

/// Owns the `WAVEFORMATEX` returned by `GetMixFormat`.
struct MixFormat(*mut WAVEFORMATEX);

impl Drop for MixFormat {
    fn drop(&mut self) {
        unsafe {
            CoTaskMemFree(Some(self.0 as *const _));
        }
    }
}

/// RAII guard to call CoUninitialize when dropped.
struct CoUninitializeGuard;

impl Drop for CoUninitializeGuard {
    fn drop(&mut self) {
        unsafe {
            CoUninitialize();
        }
    }
}
