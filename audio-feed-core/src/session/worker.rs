use std::io::Write;
use std::thread;

use parking_lot::Mutex;

use crate::models::config::FeedConfiguration;
use crate::models::error::FeedError;
use crate::models::state::LoopStats;
use crate::session::capture_loop::CaptureLoop;
use crate::session::stop::StopSignal;
use crate::traits::loopback_source::LoopbackSource;

type CaptureResult = Result<LoopStats, FeedError>;

/// Capture loop running on a dedicated thread.
///
/// The source is opened on the capture thread itself, since platform
/// stream handles are bound to the thread that created them.
pub struct CaptureWorker {
    stop: StopSignal,
    capture_handle: Mutex<Option<thread::JoinHandle<CaptureResult>>>,
}

impl CaptureWorker {
    pub fn spawn<S, F, W>(open: F, config: FeedConfiguration, writer: W, stop: StopSignal) -> Result<Self, FeedError>
    where
        S: LoopbackSource,
        F: FnOnce() -> Result<S, FeedError> + Send + 'static,
        W: Write + Send + 'static,
    {
        let loop_stop = stop.clone();

        let handle = thread::Builder::new()
            .name("loopback-capture".into())
            .spawn(move || {
                let result = open().and_then(|source| {
                    let mut capture = CaptureLoop::new(source, &config, writer)?;
                    capture.run(&loop_stop)
                });
                if let Err(ref e) = result {
                    log::error!("Capture thread exiting: {}", e);
                }
                // Let anyone waiting on the signal know the loop is gone.
                loop_stop.request_stop();
                result
            })
            .map_err(|e| FeedError::Unknown(format!("failed to spawn capture thread: {}", e)))?;

        Ok(Self {
            stop,
            capture_handle: Mutex::new(Some(handle)),
        })
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.capture_handle
            .lock()
            .as_ref()
            .map_or(true, |handle| handle.is_finished())
    }

    /// Wait for the capture thread and return its result.
    pub fn join(&self) -> CaptureResult {
        let handle = self
            .capture_handle
            .lock()
            .take()
            .ok_or_else(|| FeedError::Unknown("capture thread already joined".into()))?;

        handle
            .join()
            .unwrap_or_else(|_| Err(FeedError::Unknown("capture thread panicked".into())))
    }

    /// Request a stop and wait for the capture thread.
    pub fn stop(&self) -> CaptureResult {
        self.stop.request_stop();
        self.join()
    }
}

impl Drop for CaptureWorker {
    fn drop(&mut self) {
        if let Some(handle) = self.capture_handle.lock().take() {
            self.stop.request_stop();
            let _ = handle.join();
        }
    }
}
