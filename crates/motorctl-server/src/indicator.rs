//! Non-blocking activity indicator.
//!
//! The host server handles requests concurrently, so the LED pulse runs on a
//! tokio task instead of stalling the request. A newer pulse supersedes an
//! older one: only the task that raised the output last lowers it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::{info, warn};

use motorctl_core::{ActivityIndicator, StatusOutput};

/// Pulses a status output from a background task.
pub struct BackgroundPulse<O> {
    output: Arc<Mutex<O>>,
    pulse: Duration,
    generation: Arc<AtomicU64>,
    runtime: Handle,
}

impl<O: StatusOutput + 'static> BackgroundPulse<O> {
    /// Create an indicator bound to the current tokio runtime.
    ///
    /// Returns `None` outside a runtime.
    pub fn new(output: O, pulse: Duration) -> Option<Self> {
        let runtime = Handle::try_current().ok()?;
        Some(Self {
            output: Arc::new(Mutex::new(output)),
            pulse,
            generation: Arc::new(AtomicU64::new(0)),
            runtime,
        })
    }

    fn set_level(output: &Mutex<O>, high: bool) {
        let mut output = output.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = output.set_level(high) {
            warn!("status output write failed: {e}");
        }
    }
}

impl<O: StatusOutput + 'static> ActivityIndicator for BackgroundPulse<O> {
    fn indicate(&self) {
        info!("indicating request");
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        Self::set_level(&self.output, true);

        let output = self.output.clone();
        let latest = self.generation.clone();
        let pulse = self.pulse;
        self.runtime.spawn(async move {
            tokio::time::sleep(pulse).await;
            if latest.load(Ordering::SeqCst) == generation {
                Self::set_level(&output, false);
            }
        });
    }
}
