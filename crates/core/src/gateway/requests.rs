//! Loading and error state, tracked per logical request.
//!
//! Each call gets a [`RequestId`]. State for a [`RequestKey`] only reflects the
//! most recently started call for that key, so an older call finishing late
//! cannot overwrite a newer call's outcome, and calls on different keys
//! never clobber each other.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

/// Logical request, one per endpoint and argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestKey {
    SearchItem,
    AllItems,
    ItemsByLanguage(String),
    TopItems,
    AllContributors,
    ContributorsAlive(i32),
}

impl RequestKey {
    /// Endpoint label, without arguments.
    pub fn endpoint(&self) -> &'static str {
        match self {
            RequestKey::SearchItem => "books_search",
            RequestKey::AllItems => "books",
            RequestKey::ItemsByLanguage(_) => "books_language",
            RequestKey::TopItems => "books_top",
            RequestKey::AllContributors => "authors",
            RequestKey::ContributorsAlive(_) => "authors_alive",
        }
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKey::ItemsByLanguage(lang) => write!(f, "{}({})", self.endpoint(), lang),
            RequestKey::ContributorsAlive(year) => write!(f, "{}({})", self.endpoint(), year),
            _ => f.write_str(self.endpoint()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

/// A failed call and its message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFailure {
    pub request_id: RequestId,
    pub key: RequestKey,
    pub message: String,
}

/// State of one logical request.
#[derive(Debug, Clone, Default)]
pub struct RequestState {
    /// Calls started but not yet finished.
    pub in_flight: usize,
    /// Most recently started call.
    pub latest: Option<RequestId>,
    /// Error of the latest call, if it failed.
    pub error: Option<RequestFailure>,
}

#[derive(Debug, Default)]
struct TrackerInner {
    next_id: u64,
    states: HashMap<RequestKey, RequestState>,
    last_failure: Option<RequestFailure>,
}

/// In-flight and error bookkeeping shared by all calls of a gateway.
#[derive(Debug, Default)]
pub struct RequestTracker {
    inner: Mutex<TrackerInner>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the start of a call. The returned ticket must be finished
    /// with [`RequestTicket::succeed`] or [`RequestTicket::fail`]; dropping
    /// it unfinished counts as a cancelled call.
    pub fn begin(&self, key: RequestKey) -> RequestTicket<'_> {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = RequestId(inner.next_id);
        let state = inner.states.entry(key.clone()).or_default();
        state.in_flight += 1;
        state.latest = Some(id);
        state.error = None;
        RequestTicket {
            tracker: self,
            key,
            id,
            finished: false,
        }
    }

    /// True while any call is in flight.
    pub fn is_loading(&self) -> bool {
        self.lock().states.values().any(|s| s.in_flight > 0)
    }

    pub fn is_in_flight(&self, key: &RequestKey) -> bool {
        self.lock()
            .states
            .get(key)
            .is_some_and(|s| s.in_flight > 0)
    }

    /// Error message of the latest call for `key`.
    pub fn error_for(&self, key: &RequestKey) -> Option<String> {
        self.lock()
            .states
            .get(key)
            .and_then(|s| s.error.as_ref())
            .map(|f| f.message.clone())
    }

    /// Most recent failure across all keys.
    pub fn last_failure(&self) -> Option<RequestFailure> {
        self.lock().last_failure.clone()
    }

    /// State for `key`. Keys with nothing in flight and no error are not
    /// kept, so this is `None` for them.
    pub fn state(&self, key: &RequestKey) -> Option<RequestState> {
        self.lock().states.get(key).cloned()
    }

    /// Forget all recorded errors.
    pub fn clear_errors(&self) {
        let mut inner = self.lock();
        inner.last_failure = None;
        inner.states.retain(|_, state| {
            state.error = None;
            state.in_flight > 0
        });
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.lock().states.len()
    }

    fn finish(&self, key: &RequestKey, id: RequestId, error: Option<String>) {
        let mut inner = self.lock();
        let failure = error.map(|message| RequestFailure {
            request_id: id,
            key: key.clone(),
            message,
        });

        let settled = match inner.states.get_mut(key) {
            Some(state) => {
                state.in_flight = state.in_flight.saturating_sub(1);
                if state.latest == Some(id) {
                    state.error = failure.clone();
                }
                state.in_flight == 0 && state.error.is_none()
            }
            None => false,
        };
        if settled {
            inner.states.remove(key);
        }

        if let Some(failure) = failure {
            let newer_recorded = inner
                .last_failure
                .as_ref()
                .is_some_and(|f| f.request_id > failure.request_id);
            if !newer_recorded {
                inner.last_failure = Some(failure);
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TrackerInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Handle for one in-flight call.
#[derive(Debug)]
pub struct RequestTicket<'a> {
    tracker: &'a RequestTracker,
    key: RequestKey,
    id: RequestId,
    finished: bool,
}

impl RequestTicket<'_> {
    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn succeed(mut self) {
        self.finished = true;
        self.tracker.finish(&self.key, self.id, None);
    }

    pub fn fail(mut self, message: impl Into<String>) {
        self.finished = true;
        self.tracker.finish(&self.key, self.id, Some(message.into()));
    }
}

impl Drop for RequestTicket<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.tracker.finish(&self.key, self.id, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_tracks_in_flight() {
        let tracker = RequestTracker::new();

        let ticket = tracker.begin(RequestKey::AllItems);
        assert!(tracker.is_loading());
        assert!(tracker.is_in_flight(&RequestKey::AllItems));
        assert!(!tracker.is_in_flight(&RequestKey::TopItems));

        ticket.succeed();
        assert!(!tracker.is_loading());
    }

    #[test]
    fn test_failure_is_scoped_to_its_key() {
        let tracker = RequestTracker::new();

        let search = tracker.begin(RequestKey::SearchItem);
        let all = tracker.begin(RequestKey::AllItems);
        search.fail("Book not found");
        all.succeed();

        assert_eq!(
            tracker.error_for(&RequestKey::SearchItem).as_deref(),
            Some("Book not found")
        );
        assert!(tracker.error_for(&RequestKey::AllItems).is_none());
        assert_eq!(
            tracker.last_failure().map(|f| f.key),
            Some(RequestKey::SearchItem)
        );
    }

    #[test]
    fn test_late_failure_of_superseded_call_is_not_attributed() {
        let tracker = RequestTracker::new();

        let first = tracker.begin(RequestKey::AllItems);
        let second = tracker.begin(RequestKey::AllItems);
        second.succeed();
        first.fail("timeout");

        assert!(tracker.error_for(&RequestKey::AllItems).is_none());
        assert!(!tracker.is_loading());
    }

    #[test]
    fn test_new_call_resets_error_for_key() {
        let tracker = RequestTracker::new();

        tracker.begin(RequestKey::TopItems).fail("HTTP 500: Internal Server Error");
        assert!(tracker.error_for(&RequestKey::TopItems).is_some());

        let retry = tracker.begin(RequestKey::TopItems);
        assert!(tracker.error_for(&RequestKey::TopItems).is_none());
        retry.succeed();
    }

    #[test]
    fn test_dropped_ticket_is_not_left_in_flight() {
        let tracker = RequestTracker::new();
        {
            let _ticket = tracker.begin(RequestKey::ItemsByLanguage("es".to_string()));
            assert!(tracker.is_loading());
        }
        assert!(!tracker.is_loading());
        assert!(tracker.last_failure().is_none());
    }

    #[test]
    fn test_clear_errors() {
        let tracker = RequestTracker::new();
        tracker.begin(RequestKey::SearchItem).fail("boom");

        tracker.clear_errors();

        assert!(tracker.error_for(&RequestKey::SearchItem).is_none());
        assert!(tracker.last_failure().is_none());
    }

    #[test]
    fn test_settled_keys_are_not_retained() {
        let tracker = RequestTracker::new();
        for year in 1900..2000 {
            tracker.begin(RequestKey::ContributorsAlive(year)).succeed();
        }
        tracker
            .begin(RequestKey::ItemsByLanguage("xx".to_string()))
            .fail("Language not found");

        assert_eq!(tracker.tracked_keys(), 1);
        assert!(tracker.state(&RequestKey::ContributorsAlive(1950)).is_none());

        tracker.clear_errors();
        assert_eq!(tracker.tracked_keys(), 0);
    }

    #[test]
    fn test_key_with_call_still_in_flight_is_retained() {
        let tracker = RequestTracker::new();
        let first = tracker.begin(RequestKey::AllItems);
        let second = tracker.begin(RequestKey::AllItems);

        second.succeed();
        assert_eq!(tracker.state(&RequestKey::AllItems).map(|s| s.in_flight), Some(1));

        first.succeed();
        assert_eq!(tracker.tracked_keys(), 0);
    }

    #[test]
    fn test_request_key_display() {
        assert_eq!(
            RequestKey::ItemsByLanguage("es".to_string()).to_string(),
            "books_language(es)"
        );
        assert_eq!(RequestKey::TopItems.to_string(), "books_top");
    }
}
