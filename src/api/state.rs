use crate::store::TaskStore;
use chrono::NaiveDateTime;
use mockable::{Clock, DefaultClock};
use std::sync::Arc;

// Shared state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TaskStore>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl AppState {
    /// State reading "now" from the local wall clock.
    pub fn new(store: impl TaskStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
            clock: Arc::new(DefaultClock),
        }
    }

    /// Replaces the clock used to stamp writes and evaluate reads.
    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Local time of the request, without a zone.
    pub fn now(&self) -> NaiveDateTime {
        self.clock.local().naive_local()
    }
}
