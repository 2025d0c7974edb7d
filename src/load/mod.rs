//! Keyed asynchronous loads with supersession.
//!
//! A [`LoadCell`] does not run futures itself. Changing its key (or asking for a
//! re-run) hands out a [`Ticket`]; the owner runs the fetch and passes the
//! result back through [`LoadCell::resolve`] together with that ticket. Only the
//! ticket of the most recent run is accepted, so a slow response for an old key
//! can never overwrite the state of the current one.

use std::fmt::Debug;

use tokio::sync::watch;

use crate::errors::AppError;

/// What observers of a cell see.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState<V> {
    /// Never run.
    #[default]
    Initial,
    /// A fetch for the current key is in flight.
    Pending,
    Ready(V),
    Failed(AppError),
}

impl<V> LoadState<V> {
    pub fn is_pending(&self) -> bool {
        matches!(self, LoadState::Pending)
    }

    pub fn value(&self) -> Option<&V> {
        match self {
            LoadState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&AppError> {
        match self {
            LoadState::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// Proof that a fetch was started for `key` as run number `generation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket<K> {
    generation: u64,
    key: K,
}

impl<K> Ticket<K> {
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

pub struct LoadCell<K, V> {
    name: &'static str,
    key: Option<K>,
    generation: u64,
    state: watch::Sender<LoadState<V>>,
}

impl<K, V> LoadCell<K, V>
where
    K: Clone + PartialEq + Debug,
    V: Clone,
{
    pub fn new(name: &'static str) -> Self {
        let (state, _) = watch::channel(LoadState::Initial);
        Self {
            name,
            key: None,
            generation: 0,
            state,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    /// Bind a new key. Returns a ticket to fetch with, or `None` when the key is
    /// equal to the current one.
    pub fn set_key(&mut self, key: K) -> Option<Ticket<K>> {
        if self.key.as_ref() == Some(&key) {
            return None;
        }
        self.key = Some(key);
        self.start()
    }

    /// Fetch again for the unchanged key. `None` if no key was ever bound.
    pub fn rerun(&mut self) -> Option<Ticket<K>> {
        self.start()
    }

    /// Bind `key` to an already known value, superseding any fetch in flight.
    pub fn prime(&mut self, key: K, value: V) {
        self.key = Some(key);
        self.generation += 1;
        self.state.send_replace(LoadState::Ready(value));
    }

    fn start(&mut self) -> Option<Ticket<K>> {
        let key = self.key.clone()?;
        self.generation += 1;
        self.state.send_replace(LoadState::Pending);
        tracing::trace!(cell = self.name, generation = self.generation, key = ?key, "Load started");
        Some(Ticket {
            generation: self.generation,
            key,
        })
    }

    pub fn is_current(&self, ticket: &Ticket<K>) -> bool {
        ticket.generation == self.generation
    }

    /// Deliver the result of a fetch.
    ///
    /// Returns `false` and leaves the state untouched when the ticket has been
    /// superseded.
    pub fn resolve(&mut self, ticket: &Ticket<K>, result: Result<V, AppError>) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(
                cell = self.name,
                key = ?ticket.key,
                generation = ticket.generation,
                current = self.generation,
                "Discarding stale result"
            );
            return false;
        }

        let state = match result {
            Ok(value) => LoadState::Ready(value),
            Err(error) => LoadState::Failed(error),
        };
        self.state.send_replace(state);
        true
    }

    pub fn state(&self) -> LoadState<V> {
        self.state.borrow().clone()
    }

    pub fn value(&self) -> Option<V> {
        self.state.borrow().value().cloned()
    }

    pub fn error(&self) -> Option<AppError> {
        self.state.borrow().error().cloned()
    }

    pub fn is_pending(&self) -> bool {
        self.state.borrow().is_pending()
    }

    /// Watch state changes from elsewhere.
    pub fn subscribe(&self) -> watch::Receiver<LoadState<V>> {
        self.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell() -> LoadCell<&'static str, String> {
        LoadCell::new("test")
    }

    #[test]
    fn test_states_in_order() {
        let mut cell = cell();
        assert_eq!(cell.state(), LoadState::Initial);

        let ticket = cell.set_key("k1").unwrap();
        assert_eq!(cell.state(), LoadState::Pending);

        assert!(cell.resolve(&ticket, Ok("v1".to_string())));
        assert_eq!(cell.state(), LoadState::Ready("v1".to_string()));

        let ticket = cell.set_key("k2").unwrap();
        assert_eq!(cell.state(), LoadState::Pending);

        let error = AppError::BackendUnavailable("down".to_string());
        assert!(cell.resolve(&ticket, Err(error.clone())));
        assert_eq!(cell.state(), LoadState::Failed(error));
    }

    #[test]
    fn test_equal_key_does_not_refetch() {
        let mut cell = cell();
        assert!(cell.set_key("k1").is_some());
        assert!(cell.set_key("k1").is_none());
    }

    #[test]
    fn test_superseded_result_is_discarded() {
        let mut cell = cell();
        let first = cell.set_key("k1").unwrap();
        let second = cell.set_key("k2").unwrap();

        assert!(cell.resolve(&second, Ok("v2".to_string())));
        assert!(!cell.resolve(&first, Ok("v1".to_string())));

        assert_eq!(cell.value().as_deref(), Some("v2"));
    }

    #[test]
    fn test_superseded_result_arriving_first_is_discarded() {
        let mut cell = cell();
        let first = cell.set_key("k1").unwrap();
        let second = cell.set_key("k2").unwrap();

        assert!(!cell.resolve(&first, Ok("v1".to_string())));
        assert!(cell.is_pending());

        assert!(cell.resolve(&second, Ok("v2".to_string())));
        assert_eq!(cell.value().as_deref(), Some("v2"));
    }

    #[test]
    fn test_superseded_failure_is_discarded() {
        let mut cell = cell();
        let first = cell.set_key("k1").unwrap();
        let second = cell.set_key("k2").unwrap();

        let error = AppError::BackendUnavailable("late".to_string());
        assert!(!cell.resolve(&first, Err(error)));
        assert!(cell.error().is_none());
        assert!(cell.resolve(&second, Ok("v2".to_string())));
    }

    #[test]
    fn test_rerun_supersedes_previous_run() {
        let mut cell = cell();
        assert!(cell.rerun().is_none());

        let first = cell.set_key("k1").unwrap();
        let second = cell.rerun().unwrap();
        assert_eq!(second.key(), &"k1");
        assert!(second.generation() > first.generation());

        assert!(!cell.resolve(&first, Ok("old".to_string())));
        assert!(cell.resolve(&second, Ok("new".to_string())));
        assert_eq!(cell.value().as_deref(), Some("new"));
    }

    #[test]
    fn test_prime_supersedes_in_flight_fetch() {
        let mut cell = cell();
        let ticket = cell.set_key("k1").unwrap();

        cell.prime("k2", "known".to_string());

        assert!(!cell.resolve(&ticket, Ok("fetched".to_string())));
        assert_eq!(cell.key(), Some(&"k2"));
        assert_eq!(cell.value().as_deref(), Some("known"));
        assert!(cell.set_key("k2").is_none());
    }

    #[tokio::test]
    async fn test_subscribers_see_only_current_results() {
        let mut cell = cell();
        let mut rx = cell.subscribe();

        let first = cell.set_key("k1").unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_pending());

        let second = cell.set_key("k2").unwrap();
        cell.resolve(&first, Ok("v1".to_string()));
        cell.resolve(&second, Ok("v2".to_string()));

        rx.changed().await.unwrap();
        assert_eq!(
            *rx.borrow_and_update(),
            LoadState::Ready("v2".to_string())
        );
    }
}
