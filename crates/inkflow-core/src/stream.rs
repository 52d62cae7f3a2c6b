//! Push-based event streams.
//!
//! A [`Subject`] is a hot multicast source: every [`Subject::emit`] is delivered
//! synchronously, in subscription order, to the observers registered at that
//! moment. An [`EventStream`] is a cold description of a source plus operators;
//! each call to [`EventStream::subscribe`] builds a fresh chain with its own state.
//!
//! Every subscription is represented by a [`Subscription`] handle. Unsubscribing
//! is idempotent, happens automatically on drop, and takes effect immediately:
//! an observer removed while an event is being dispatched does not see it.
//!
//! Streams are forward-only. There is no replay and no reset.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use thiserror::Error;

/// Stream errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("Event streams are forward-only and cannot be reset")]
    ForwardOnly,
}

/// Result type for stream operations.
pub type StreamResult<T> = Result<T, StreamError>;

/// Boxed observer callback handed to a stream's subscribe function.
pub type Observer<T> = Box<dyn FnMut(&T)>;

type Callback<T> = Rc<RefCell<dyn FnMut(&T)>>;

/// Handle to an active subscription.
#[must_use = "dropping a Subscription unsubscribes it immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Create a subscription that runs `cancel` exactly once when released.
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription that is already closed.
    pub fn closed() -> Self {
        Self { cancel: None }
    }

    /// Release the subscription. Calling this more than once is a no-op.
    pub fn unsubscribe(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Check whether the subscription has been released.
    pub fn is_closed(&self) -> bool {
        self.cancel.is_none()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// A group of subscriptions released together.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    /// Release every subscription in the set. Safe to call repeatedly.
    pub fn clear(&mut self) {
        for mut subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

struct Slot<T: ?Sized> {
    id: u64,
    live: Rc<Cell<bool>>,
    callback: Callback<T>,
}

struct SubjectInner<T> {
    next_id: u64,
    slots: Vec<Slot<T>>,
}

/// Hot multicast event source.
pub struct Subject<T> {
    inner: Rc<RefCell<SubjectInner<T>>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Subject<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SubjectInner {
                next_id: 0,
                slots: Vec::new(),
            })),
        }
    }

    /// Register an observer for future emissions.
    pub fn subscribe(&self, observer: impl FnMut(&T) + 'static) -> Subscription {
        let live = Rc::new(Cell::new(true));
        let callback: Callback<T> = Rc::new(RefCell::new(observer));
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.slots.push(Slot {
                id,
                live: Rc::clone(&live),
                callback,
            });
            id
        };

        let weak: Weak<RefCell<SubjectInner<T>>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            live.set(false);
            if let Some(inner) = weak.upgrade() {
                // A failed borrow only means we are inside `subscribe`; the dead
                // slot is pruned on the next emit instead.
                if let Ok(mut inner) = inner.try_borrow_mut() {
                    inner.slots.retain(|slot| slot.id != id);
                }
            }
        })
    }

    /// Deliver `value` to every live observer, in subscription order.
    pub fn emit(&self, value: &T) {
        let targets: Vec<(Rc<Cell<bool>>, Callback<T>)> = {
            let mut inner = self.inner.borrow_mut();
            inner.slots.retain(|slot| slot.live.get());
            inner
                .slots
                .iter()
                .map(|slot| (Rc::clone(&slot.live), Rc::clone(&slot.callback)))
                .collect()
        };

        for (live, callback) in targets {
            if !live.get() {
                continue;
            }
            match callback.try_borrow_mut() {
                Ok(mut observer) => (&mut *observer)(value),
                Err(_) => log::warn!("dropping re-entrant delivery to a busy observer"),
            }
        }
    }

    /// Number of observers currently registered.
    pub fn observer_count(&self) -> usize {
        self.inner
            .borrow()
            .slots
            .iter()
            .filter(|slot| slot.live.get())
            .count()
    }

    /// View this subject as a composable stream.
    pub fn stream(&self) -> EventStream<T> {
        let subject = self.clone();
        EventStream::new(move |mut observer| subject.subscribe(move |value| observer(value)))
    }
}

/// Cold, composable event stream.
pub struct EventStream<T> {
    subscribe_fn: Rc<dyn Fn(Observer<T>) -> Subscription>,
}

impl<T> Clone for EventStream<T> {
    fn clone(&self) -> Self {
        Self {
            subscribe_fn: Rc::clone(&self.subscribe_fn),
        }
    }
}

impl<T: 'static> EventStream<T> {
    /// Build a stream from its subscribe function.
    pub fn new(subscribe_fn: impl Fn(Observer<T>) -> Subscription + 'static) -> Self {
        Self {
            subscribe_fn: Rc::new(subscribe_fn),
        }
    }

    /// A stream that never emits.
    pub fn never() -> Self {
        Self::new(|_| Subscription::closed())
    }

    pub fn subscribe(&self, observer: impl FnMut(&T) + 'static) -> Subscription {
        (self.subscribe_fn)(Box::new(observer))
    }

    /// Streams are forward-only; this always fails.
    pub fn reset(&self) -> StreamResult<()> {
        Err(StreamError::ForwardOnly)
    }

    /// Forward only the events matching `predicate`.
    pub fn filter(&self, predicate: impl Fn(&T) -> bool + 'static) -> EventStream<T> {
        let source = self.clone();
        let predicate = Rc::new(predicate);
        EventStream::new(move |mut observer| {
            let predicate = Rc::clone(&predicate);
            source.subscribe(move |value| {
                if predicate(value) {
                    observer(value);
                }
            })
        })
    }

    /// Transform every event.
    pub fn map<U: 'static>(&self, f: impl Fn(&T) -> U + 'static) -> EventStream<U> {
        let source = self.clone();
        let f = Rc::new(f);
        EventStream::new(move |mut observer: Observer<U>| {
            let f = Rc::clone(&f);
            source.subscribe(move |value| observer(&f(value)))
        })
    }

    /// Transform events, dropping those mapped to `None`.
    pub fn filter_map<U: 'static>(&self, f: impl Fn(&T) -> Option<U> + 'static) -> EventStream<U> {
        let source = self.clone();
        let f = Rc::new(f);
        EventStream::new(move |mut observer: Observer<U>| {
            let f = Rc::clone(&f);
            source.subscribe(move |value| {
                if let Some(mapped) = f(value) {
                    observer(&mapped);
                }
            })
        })
    }

    /// Run a side effect for every event before passing it on.
    pub fn inspect(&self, f: impl Fn(&T) + 'static) -> EventStream<T> {
        let source = self.clone();
        let f = Rc::new(f);
        EventStream::new(move |mut observer| {
            let f = Rc::clone(&f);
            source.subscribe(move |value| {
                f(value);
                observer(value);
            })
        })
    }

    /// Fold events through per-subscription state.
    ///
    /// Each subscription starts from its own copy of `seed`.
    pub fn scan<S, U>(&self, seed: S, f: impl Fn(&mut S, &T) -> U + 'static) -> EventStream<U>
    where
        S: Clone + 'static,
        U: 'static,
    {
        let source = self.clone();
        let f = Rc::new(f);
        EventStream::new(move |mut observer: Observer<U>| {
            let f = Rc::clone(&f);
            let mut state = seed.clone();
            source.subscribe(move |value| {
                let out = f(&mut state, value);
                observer(&out);
            })
        })
    }

    /// Forward events until `stop` emits once, then release both upstream
    /// subscriptions. Nothing is delivered after the stop event.
    pub fn take_until<U: 'static>(&self, stop: &EventStream<U>) -> EventStream<T> {
        let source = self.clone();
        let stop = stop.clone();
        EventStream::new(move |mut observer| {
            let done = Rc::new(Cell::new(false));
            let upstream: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
            let stopper: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

            let stop_subscription = {
                let done = Rc::clone(&done);
                let upstream = Rc::clone(&upstream);
                let stopper = Rc::clone(&stopper);
                stop.subscribe(move |_| {
                    if done.replace(true) {
                        return;
                    }
                    release(&upstream);
                    release(&stopper);
                })
            };
            *stopper.borrow_mut() = Some(stop_subscription);

            let source_subscription = {
                let done = Rc::clone(&done);
                source.subscribe(move |value| {
                    if !done.get() {
                        observer(value);
                    }
                })
            };
            if done.get() {
                drop(source_subscription);
            } else {
                *upstream.borrow_mut() = Some(source_subscription);
            }

            Subscription::new(move || {
                done.set(true);
                release(&upstream);
                release(&stopper);
            })
        })
    }
}

fn release(cell: &RefCell<Option<Subscription>>) {
    let taken = cell.borrow_mut().take();
    if let Some(mut subscription) = taken {
        subscription.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect<T: Clone + 'static>(stream: &EventStream<T>) -> (Rc<RefCell<Vec<T>>>, Subscription) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let subscription = stream.subscribe(move |value: &T| sink.borrow_mut().push(value.clone()));
        (seen, subscription)
    }

    #[test]
    fn test_subject_delivers_in_order() {
        let subject = Subject::<i32>::new();
        let (seen, _sub) = collect(&subject.stream());

        subject.emit(&1);
        subject.emit(&2);
        subject.emit(&3);

        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let subject = Subject::<i32>::new();
        let (seen, mut sub) = collect(&subject.stream());
        assert_eq!(subject.observer_count(), 1);

        sub.unsubscribe();
        sub.unsubscribe();
        assert!(sub.is_closed());
        assert_eq!(subject.observer_count(), 0);

        subject.emit(&1);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_drop_unsubscribes() {
        let subject = Subject::<i32>::new();
        {
            let _sub = subject.subscribe(|_| {});
            assert_eq!(subject.observer_count(), 1);
        }
        assert_eq!(subject.observer_count(), 0);
    }

    #[test]
    fn test_subscription_set_clear_twice() {
        let subject = Subject::<i32>::new();
        let mut set = SubscriptionSet::new();
        set.add(subject.subscribe(|_| {}));
        set.add(subject.subscribe(|_| {}));
        assert_eq!(set.len(), 2);

        set.clear();
        set.clear();
        assert!(set.is_empty());
        assert_eq!(subject.observer_count(), 0);
    }

    #[test]
    fn test_observer_removed_mid_dispatch_is_skipped() {
        let subject = Subject::<i32>::new();
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let hits = Rc::new(Cell::new(0));

        let killer = {
            let victim = Rc::clone(&victim);
            subject.subscribe(move |_| release(&victim))
        };
        let counted = {
            let hits = Rc::clone(&hits);
            subject.subscribe(move |_| hits.set(hits.get() + 1))
        };
        *victim.borrow_mut() = Some(counted);

        subject.emit(&1);
        assert_eq!(hits.get(), 0);
        drop(killer);
    }

    #[test]
    fn test_filter_map_and_filter_map() {
        let subject = Subject::<i32>::new();
        let evens = subject.stream().filter(|n| n % 2 == 0);
        let doubled = evens.map(|n| n * 2);
        let small = subject.stream().filter_map(|n| (*n < 3).then(|| format!("#{n}")));

        let (seen_doubled, _a) = collect(&doubled);
        let (seen_small, _b) = collect(&small);

        for n in 0..5 {
            subject.emit(&n);
        }

        assert_eq!(*seen_doubled.borrow(), vec![0, 4, 8]);
        assert_eq!(*seen_small.borrow(), vec!["#0", "#1", "#2"]);
    }

    #[test]
    fn test_scan_state_is_per_subscription() {
        let subject = Subject::<i32>::new();
        let running = subject.stream().scan(0, |total, n| {
            *total += n;
            *total
        });

        let (first, _a) = collect(&running);
        subject.emit(&1);
        subject.emit(&2);
        let (second, _b) = collect(&running);
        subject.emit(&3);

        assert_eq!(*first.borrow(), vec![1, 3, 6]);
        assert_eq!(*second.borrow(), vec![3]);
    }

    #[test]
    fn test_inspect_runs_before_observer() {
        let subject = Subject::<i32>::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let tap = Rc::clone(&log);
        let stream = subject.stream().inspect(move |n| tap.borrow_mut().push(format!("tap {n}")));
        let sink = Rc::clone(&log);
        let _sub = stream.subscribe(move |n| sink.borrow_mut().push(format!("got {n}")));

        subject.emit(&7);
        assert_eq!(*log.borrow(), vec!["tap 7", "got 7"]);
    }

    #[test]
    fn test_take_until_stops_and_releases() {
        let values = Subject::<i32>::new();
        let stop = Subject::<()>::new();
        let (seen, sub) = collect(&values.stream().take_until(&stop.stream()));

        values.emit(&1);
        values.emit(&2);
        stop.emit(&());
        values.emit(&3);

        assert_eq!(*seen.borrow(), vec![1, 2]);
        assert_eq!(values.observer_count(), 0);
        assert_eq!(stop.observer_count(), 0);
        drop(sub);
    }

    #[test]
    fn test_take_until_dispose_before_stop() {
        let values = Subject::<i32>::new();
        let stop = Subject::<()>::new();
        let (seen, mut sub) = collect(&values.stream().take_until(&stop.stream()));

        values.emit(&1);
        sub.unsubscribe();
        values.emit(&2);
        stop.emit(&());

        assert_eq!(*seen.borrow(), vec![1]);
        assert_eq!(values.observer_count(), 0);
        assert_eq!(stop.observer_count(), 0);
    }

    #[test]
    fn test_reset_is_rejected() {
        let stream = EventStream::<i32>::never();
        assert_eq!(stream.reset(), Err(StreamError::ForwardOnly));
    }
}
