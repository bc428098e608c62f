use std::sync::Mutex;

use tracing::debug;

use super::SearchOutcome;

/// Identifies one issued search. Later searches get larger tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SearchToken(u64);

impl SearchToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
struct SessionState {
    latest: u64,
    outcome: Option<(SearchToken, SearchOutcome)>,
}

/// Guards a sequence of overlapping searches so that only the most recently
/// issued one can publish its outcome.
#[derive(Debug, Default)]
pub struct SearchSession {
    state: Mutex<SessionState>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a token for a new search, superseding all earlier ones.
    pub fn begin(&self) -> SearchToken {
        let mut state = self.lock();
        state.latest += 1;
        SearchToken(state.latest)
    }

    /// Publish `outcome` if `token` is still the latest issued.
    ///
    /// Returns false (and drops the outcome) for a stale token.
    pub fn complete(&self, token: SearchToken, outcome: SearchOutcome) -> bool {
        let mut state = self.lock();
        if token.0 != state.latest {
            debug!(
                "Discarding stale search {} (latest is {})",
                token.0, state.latest
            );
            return false;
        }
        state.outcome = Some((token, outcome));
        true
    }

    pub fn is_current(&self, token: SearchToken) -> bool {
        self.lock().latest == token.0
    }

    /// The last published outcome.
    pub fn current(&self) -> Option<SearchOutcome> {
        self.lock().outcome.as_ref().map(|(_, o)| o.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
