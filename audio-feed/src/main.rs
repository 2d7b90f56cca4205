//! audio-feed: streams the default output device's loopback audio to
//! standard output as one JSON record per captured packet.

mod cli;

use std::process::ExitCode;

use audio_feed_core::{FeedConfiguration, FeedError, LoopStats, StopSignal};
use clap::error::ErrorKind;
use clap::Parser;

use cli::Args;

fn main() -> ExitCode {
    let normalized = cli::normalize_args(std::env::args());

    let args = match Args::try_parse_from(&normalized.args) {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    cli::init_logging(&args);
    for arg in &normalized.ignored {
        log::debug!("Ignoring unrecognized argument '{}'", arg);
    }

    let config = args.feed_configuration();
    if let Err(e) = config.validate() {
        log::error!("{}", e);
        return ExitCode::FAILURE;
    }

    let stop = StopSignal::new();
    let handler_stop = stop.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        log::info!("Received Ctrl+C");
        handler_stop.request_stop();
    }) {
        log::warn!("Failed to install Ctrl+C handler: {}", e);
    }

    log::info!(
        "Starting feed: {} samples per record, {:?} interval, {:?} output",
        config.max_samples,
        config.interval,
        config.mode
    );

    match run(config, stop) {
        Ok(stats) => {
            log::info!("Feed stopped after {} records", stats.records_emitted);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(target_os = "windows")]
fn run(config: FeedConfiguration, stop: StopSignal) -> Result<LoopStats, FeedError> {
    run_capture(audio_feed_windows::WasapiLoopbackSource::open_default, config, stop)
}

#[cfg(not(target_os = "windows"))]
fn run(_config: FeedConfiguration, _stop: StopSignal) -> Result<LoopStats, FeedError> {
    log::error!("Loopback capture of the default output device is only available on Windows");
    Err(FeedError::DeviceUnavailable)
}

/// Debug builds poll on a dedicated capture thread; release builds poll inline.
#[cfg(all(target_os = "windows", debug_assertions))]
fn run_capture<S, F>(open: F, config: FeedConfiguration, stop: StopSignal) -> Result<LoopStats, FeedError>
where
    S: audio_feed_core::LoopbackSource,
    F: FnOnce() -> Result<S, FeedError> + Send + 'static,
{
    let worker = audio_feed_core::CaptureWorker::spawn(open, config, std::io::stdout(), stop)?;
    worker.join()
}

#[cfg(all(target_os = "windows", not(debug_assertions)))]
fn run_capture<S, F>(open: F, config: FeedConfiguration, stop: StopSignal) -> Result<LoopStats, FeedError>
where
    S: audio_feed_core::LoopbackSource,
    F: FnOnce() -> Result<S, FeedError>,
{
    let source = open()?;
    let mut capture = audio_feed_core::CaptureLoop::new(source, &config, std::io::stdout().lock())?;
    capture.run(&stop)
}
