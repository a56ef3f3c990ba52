//! Cart change subscribers.
//!
//! Every successful cart mutation ends with a synchronous broadcast of the
//! full item list to each registered callback, in registration order. A
//! callback that returns an error is logged and skipped; the remaining
//! subscribers still receive the notification.

use std::fmt;

use thiserror::Error;

use super::CartEntry;

/// Error returned by a subscriber callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct SubscriberError(String);

impl SubscriberError {
    /// Create a subscriber error with a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Handle returned by [`Subscribers::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&[CartEntry]) -> Result<(), SubscriberError> + Send>;

/// Registry of cart change callbacks.
#[derive(Default)]
pub struct Subscribers {
    next_id: u64,
    callbacks: Vec<(SubscriptionId, Callback)>,
}

impl fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.callbacks.len())
            .finish()
    }
}

impl Subscribers {
    /// Register a callback.
    ///
    /// Registering the same logic twice creates two independent
    /// subscriptions, each removed by its own handle.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&[CartEntry]) -> Result<(), SubscriberError> + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.callbacks.push((id, Box::new(callback)));
        id
    }

    /// Remove a subscription. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(existing, _)| *existing != id);
        self.callbacks.len() != before
    }

    /// Deliver `items` to every subscriber.
    pub fn notify(&mut self, items: &[CartEntry]) {
        for (id, callback) in &mut self.callbacks {
            if let Err(e) = callback(items) {
                tracing::warn!(subscription = ?id, error = %e, "Cart subscriber failed");
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn recorder(
        log: &Log,
        tag: &'static str,
    ) -> impl FnMut(&[CartEntry]) -> Result<(), SubscriberError> + Send + 'static {
        let log = Arc::clone(log);
        move |_| {
            log.lock().unwrap().push(tag);
            Ok(())
        }
    }

    #[test]
    fn test_notify_runs_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut subs = Subscribers::default();
        subs.subscribe(recorder(&log, "first"));
        subs.subscribe(recorder(&log, "second"));

        subs.notify(&[]);

        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_duplicate_subscriptions_are_independent() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut subs = Subscribers::default();
        let a = subs.subscribe(recorder(&log, "same"));
        let _b = subs.subscribe(recorder(&log, "same"));

        assert!(subs.unsubscribe(a));
        subs.notify(&[]);

        assert_eq!(*log.lock().unwrap(), vec!["same"]);
        assert_eq!(subs.len(), 1);
    }

    #[test]
    fn test_unsubscribe_unknown_is_noop() {
        let mut subs = Subscribers::default();
        let id = subs.subscribe(|_| Ok(()));
        assert!(subs.unsubscribe(id));
        assert!(!subs.unsubscribe(id));
        assert!(subs.is_empty());
    }

    #[test]
    fn test_failing_subscriber_does_not_block_others() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut subs = Subscribers::default();
        subs.subscribe(|_| Err(SubscriberError::new("render target gone")));
        subs.subscribe(recorder(&log, "after"));

        subs.notify(&[]);
        subs.notify(&[]);

        assert_eq!(*log.lock().unwrap(), vec!["after", "after"]);
    }
}
