use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

/// Rejects a new run while another is in progress
#[derive(Debug, Default)]
pub struct RunGate {
    busy: AtomicBool,
}

/// Held for the duration of a run; releases the gate on drop
#[derive(Debug)]
pub struct RunGuard<'a> {
    gate: &'a RunGate,
}

/// Busy/idle status as reported to a control surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatus {
    #[serde(rename = "isProcessing")]
    pub is_processing: bool,
}

impl RunGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the gate, or `None` if a run is already active
    pub fn try_start(&self) -> Option<RunGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard { gate: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn status(&self) -> RunStatus {
        RunStatus {
            is_processing: self.is_busy(),
        }
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::Release);
    }
}
