//! Activity indicator.
//!
//! Pulses a status output once per accepted command. Purely diagnostic:
//! output failures are logged and otherwise ignored.

use std::sync::Mutex;
use std::time::Duration;

use log::{info, warn};

use crate::hardware::StatusOutput;

/// Something that signals "a command arrived".
pub trait ActivityIndicator: Send + Sync {
    fn indicate(&self);
}

/// Drives the output high, sleeps for the pulse length, drives it low.
///
/// Blocks the calling thread for the whole pulse. Meant for servers that
/// handle one request at a time.
#[derive(Debug)]
pub struct BlockingPulse<O> {
    output: Mutex<O>,
    pulse: Duration,
}

impl<O: StatusOutput> BlockingPulse<O> {
    pub fn new(mut output: O, pulse: Duration) -> Self {
        if let Err(e) = output.set_level(false) {
            warn!("status output init failed: {e}");
        }
        Self {
            output: Mutex::new(output),
            pulse,
        }
    }
}

impl<O: StatusOutput> ActivityIndicator for BlockingPulse<O> {
    fn indicate(&self) {
        info!("indicating request");
        let mut output = self.output.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = output.set_level(true) {
            warn!("status output write failed: {e}");
            return;
        }
        std::thread::sleep(self.pulse);
        if let Err(e) = output.set_level(false) {
            warn!("status output write failed: {e}");
        }
    }
}

/// Indicator that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIndicator;

impl ActivityIndicator for NoIndicator {
    fn indicate(&self) {}
}

impl<T: ActivityIndicator + ?Sized> ActivityIndicator for std::sync::Arc<T> {
    fn indicate(&self) {
        (**self).indicate()
    }
}
