use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// Cloneable cancellation token shared between a controller and a capture loop.
///
/// The loop observes it at the top of each iteration; `wait` lets the loop's
/// inter-poll sleep end early once a stop is requested.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        let (flag, cvar) = &*self.inner;
        *flag.lock() = true;
        cvar.notify_all();
    }

    pub fn is_stop_requested(&self) -> bool {
        *self.inner.0.lock()
    }

    /// Sleep for up to `timeout`. Returns `true` if a stop was requested.
    pub fn wait(&self, timeout: Duration) -> bool {
        let (flag, cvar) = &*self.inner;
        let mut stopped = flag.lock();
        if !*stopped {
            cvar.wait_while_for(&mut stopped, |s| !*s, timeout);
        }
        *stopped
    }
}
