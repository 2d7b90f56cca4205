//! # audio-feed-windows
//!
//! Windows WASAPI backend for audio-feed.
//!
//! Provides:
//! - `WasapiLoopbackSource` — shared-mode loopback stream on the default render endpoint
//! - `endpoint` — endpoint friendly names and mix format classification
//!
//! ## Usage
//! ```ignore
//! use audio_feed_core::{CaptureLoop, FeedConfiguration, StopSignal};
//! use audio_feed_windows::WasapiLoopbackSource;
//!
//! let source = WasapiLoopbackSource::open_default()?;
//! let mut capture = CaptureLoop::new(source, &FeedConfiguration::default(), std::io::stdout())?;
//! capture.run(&StopSignal::new())?;
//! ```

#[cfg(target_os = "windows")]
pub mod endpoint;
#[cfg(target_os = "windows")]
pub mod wasapi_loopback;

#[cfg(target_os = "windows")]
pub use wasapi_loopback::WasapiLoopbackSource;
