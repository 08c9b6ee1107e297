//! Scripted listers shared by unit tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::data::{ListError, Listing, StoreLister, StoreRecord};

/// A lister that replays queued outcomes and counts calls
///
/// When the script runs out, the last outcome is repeated.
pub struct ScriptedLister {
    outcomes: Mutex<VecDeque<Result<Listing, ListError>>>,
    last: Mutex<Option<Result<Listing, ListError>>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedLister {
    pub fn new(outcomes: Vec<Result<Listing, ListError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            last: Mutex::new(None),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always returns the given records
    pub fn always(records: Vec<StoreRecord>) -> Self {
        Self::new(vec![Ok(listing(records))])
    }

    /// Sleeps before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoreLister for ScriptedLister {
    async fn fetch_all(&self) -> Result<Listing, ListError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.outcomes.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        match next {
            Some(outcome) => {
                *last = Some(outcome.clone());
                outcome
            }
            None => last
                .clone()
                .unwrap_or_else(|| Err(ListError::Transport("script exhausted".to_string()))),
        }
    }
}

pub fn listing(records: Vec<StoreRecord>) -> Listing {
    Listing {
        records,
        skipped: Vec::new(),
    }
}

pub fn record(id: &str, name: &str, created_at: i64) -> StoreRecord {
    StoreRecord::new(id, name, created_at)
}

/// The three-store example: two "Docs" generations and one "FAQ"
pub fn docs_and_faq() -> Vec<StoreRecord> {
    vec![
        record("A1", "Docs", 100),
        record("A2", "Docs", 200),
        record("B1", "FAQ", 150),
    ]
}

pub fn transport_error() -> ListError {
    ListError::Transport("connection refused".to_string())
}
