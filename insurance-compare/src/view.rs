use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::debug;

use crate::{error::CompareError, models::ComparisonResult, service::ComparisonService};

/// What the results page renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ResultsState {
    Idle,
    Loading { session_id: String },
    Ready { result: ComparisonResult },
    Failed { session_id: String, message: String },
}

/// Outcome of one [`ResultsView::load`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// The view was unmounted or a newer load started while this one was in flight.
    Discarded,
}

#[derive(Debug)]
struct ViewSlot {
    state: ResultsState,
    mounted: bool,
}

/// View-side holder of the latest comparison result.
///
/// Loads are tagged with a generation number; only the newest load of a
/// still-mounted view may write its outcome. The mounted flag shares the
/// state lock, so unmounting waits for any write in progress.
#[derive(Clone)]
pub struct ResultsView {
    service: ComparisonService,
    slot: Arc<Mutex<ViewSlot>>,
    generation: Arc<AtomicU64>,
}

impl ResultsView {
    pub fn new(service: ComparisonService) -> Self {
        Self {
            service,
            slot: Arc::new(Mutex::new(ViewSlot {
                state: ResultsState::Idle,
                mounted: true,
            })),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ViewSlot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> ResultsState {
        self.lock().state.clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.lock().mounted
    }

    /// Tears the view down; in-flight loads will be dropped on arrival.
    pub fn unmount(&self) {
        self.lock().mounted = false;
    }

    pub async fn load(&self, session_id: &str) -> LoadOutcome {
        let generation = {
            let mut slot = self.lock();
            if !slot.mounted {
                return LoadOutcome::Discarded;
            }
            slot.state = ResultsState::Loading {
                session_id: session_id.to_string(),
            };
            self.generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        let outcome = self.service.get_session_results(session_id).await;

        // Mounted flag and generation are checked and the state written under one lock.
        let mut slot = self.lock();
        if !slot.mounted || self.generation.load(Ordering::SeqCst) != generation {
            debug!(session_id = %session_id, generation, "discarding stale session results");
            return LoadOutcome::Discarded;
        }
        slot.state = match outcome {
            Ok(result) => ResultsState::Ready { result },
            Err(e) => ResultsState::Failed {
                session_id: session_id.to_string(),
                message: failure_message(&e),
            },
        };
        LoadOutcome::Applied
    }
}

fn failure_message(error: &CompareError) -> String {
    match error {
        CompareError::InvalidResponse(_) => "invalid server response".to_string(),
        other => other.to_string(),
    }
}
