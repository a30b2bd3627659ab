//! Change notification with a pluggable delivery policy
//!
//! After every successful mutation the store publishes a generic "changed"
//! notice to its observers. How the notice reaches them is an injected
//! strategy: [`ImmediateDispatch`] runs observers synchronously on the
//! mutating thread, [`ChannelDispatch`] schedules them onto whatever single
//! thread owns the receiving end (the GUI loop, typically) and returns
//! immediately.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};

use tracing::warn;

/// A scheduled notification: runs all observers captured at publish time.
pub type Notice = Box<dyn FnOnce() + Send>;

/// Delivery policy for change notices.
pub trait Dispatch: Send + Sync {
    /// Deliver `notice` now or later, per the policy.
    fn dispatch(&self, notice: Notice);
}

/// Run the notice synchronously before the mutating call returns.
#[derive(Debug, Default)]
pub struct ImmediateDispatch;

impl Dispatch for ImmediateDispatch {
    fn dispatch(&self, notice: Notice) {
        notice();
    }
}

/// Queue notices onto a channel owned by a single consuming thread.
///
/// The owner drains the receiver on its own loop and runs each notice
/// there, so observers only ever execute on that thread.
pub struct ChannelDispatch {
    tx: Sender<Notice>,
}

impl ChannelDispatch {
    /// Create the dispatch half and the receiver the owning thread drains.
    pub fn new() -> (Self, Receiver<Notice>) {
        let (tx, rx) = channel();
        (Self { tx }, rx)
    }
}

impl Dispatch for ChannelDispatch {
    fn dispatch(&self, notice: Notice) {
        if self.tx.send(notice).is_err() {
            warn!("notification receiver is gone, dropping change notice");
        }
    }
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type ObserverFn = Arc<dyn Fn() + Send + Sync>;

/// Registered observers of one store.
#[derive(Default)]
pub(crate) struct ObserverList {
    next_id: u64,
    entries: Vec<(u64, ObserverFn)>,
}

impl ObserverList {
    pub(crate) fn subscribe(&mut self, observer: impl Fn() + Send + Sync + 'static) -> ObserverId {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, Arc::new(observer)));
        ObserverId(id)
    }

    pub(crate) fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id.0);
        self.entries.len() != before
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Publish one "changed" notice covering all current observers.
    pub(crate) fn notify_all(&self, dispatch: &dyn Dispatch) {
        if self.entries.is_empty() {
            return;
        }
        let snapshot: Vec<ObserverFn> =
            self.entries.iter().map(|(_, observer)| Arc::clone(observer)).collect();
        dispatch.dispatch(Box::new(move || {
            for observer in &snapshot {
                observer();
            }
        }));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_immediate_dispatch_runs_synchronously() {
        let mut observers = ObserverList::default();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        observers.subscribe(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        observers.notify_all(&ImmediateDispatch);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut observers = ObserverList::default();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let id = observers.subscribe(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        assert!(observers.unsubscribe(id));
        assert!(!observers.unsubscribe(id));
        observers.notify_all(&ImmediateDispatch);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_channel_dispatch_defers_to_receiver_owner() {
        let mut observers = ObserverList::default();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        observers.subscribe(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let (dispatch, rx) = ChannelDispatch::new();
        observers.notify_all(&dispatch);
        observers.notify_all(&dispatch);

        // Nothing ran yet: the owning thread has not drained the channel.
        assert_eq!(count.load(Ordering::SeqCst), 0);
        for notice in rx.try_iter() {
            notice();
        }
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_channel_dispatch_survives_dropped_receiver() {
        let mut observers = ObserverList::default();
        observers.subscribe(|| {});

        let (dispatch, rx) = ChannelDispatch::new();
        drop(rx);
        // Must not panic; the notice is dropped with a warning.
        observers.notify_all(&dispatch);
    }
}
