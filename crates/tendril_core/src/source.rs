//! Writable push sources
//!
//! A [`Source<T>`] is a cheap-to-clone handle to a shared list of observers.
//! Calling [`Source::emit`] pushes a value to every observer in the order
//! they subscribed.
//!
//! Two flavors exist:
//!
//! - [`Source::new`] only forwards values emitted after subscription.
//! - [`Source::with_value`] keeps the latest value and replays it to each
//!   new observer inside `subscribe`.
//!
//! # Reentrancy
//!
//! Observers may emit, subscribe or unsubscribe while an emission is in
//! flight. An emission works on a snapshot of the observer list:
//!
//! - observers removed mid-emission are skipped,
//! - observers added mid-emission do not receive the in-flight value.

use indexmap::IndexMap;
use smallvec::SmallVec;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::stream::{BoxStream, Observer, Stream, Subscription};

/// Identifier of an observer registered on a [`Source`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

struct SourceInner<T> {
    /// Latest value, kept only by replaying sources
    current: Option<T>,
    replay: bool,
    /// Observers in subscription order
    observers: IndexMap<ObserverId, Observer<T>>,
    next_id: u64,
}

/// A writable, multicast stream
pub struct Source<T> {
    inner: Rc<RefCell<SourceInner<T>>>,
}

impl<T> Clone for Source<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + 'static> Source<T> {
    /// Create a source without a current value
    pub fn new() -> Self {
        Self::from_parts(None, false)
    }

    /// Create a source that replays its latest value to new observers
    pub fn with_value(initial: T) -> Self {
        Self::from_parts(Some(initial), true)
    }

    fn from_parts(current: Option<T>, replay: bool) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SourceInner {
                current,
                replay,
                observers: IndexMap::new(),
                next_id: 0,
            })),
        }
    }

    /// Latest value, if this source keeps one
    pub fn get(&self) -> Option<T> {
        self.inner.borrow().current.clone()
    }

    /// Push a value to every observer
    pub fn emit(&self, value: T) {
        let observers: SmallVec<[(ObserverId, Observer<T>); 4]> = {
            let mut inner = self.inner.borrow_mut();
            if inner.replay {
                inner.current = Some(value.clone());
            }
            inner
                .observers
                .iter()
                .map(|(id, observer)| (*id, observer.clone()))
                .collect()
        };

        tracing::trace!(observers = observers.len(), "source emit");

        for (id, observer) in observers {
            // Skip observers released by an earlier observer in this emission
            let live = self.inner.borrow().observers.contains_key(&id);
            if live {
                observer(&value);
            }
        }
    }

    /// Emit a value derived from the current one
    ///
    /// Does nothing when the source holds no current value. `f` may use
    /// this source freely.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        if let Some(current) = self.get() {
            self.emit(f(&current));
        }
    }

    /// Number of live observers
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().observers.len()
    }

    /// Type-erased stream view of this source
    pub fn stream(&self) -> BoxStream<T> {
        Rc::new(self.clone())
    }

    fn register(&self, observer: Observer<T>) -> (ObserverId, Option<T>) {
        let mut inner = self.inner.borrow_mut();
        let id = ObserverId(inner.next_id);
        inner.next_id += 1;
        inner.observers.insert(id, observer);
        let replay = if inner.replay {
            inner.current.clone()
        } else {
            None
        };
        (id, replay)
    }
}

impl<T: Clone + 'static> Default for Source<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> Stream<T> for Source<T> {
    fn subscribe(&self, observer: Observer<T>) -> Subscription {
        let (id, replay) = self.register(observer.clone());
        let weak: Weak<RefCell<SourceInner<T>>> = Rc::downgrade(&self.inner);
        let subscription = Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().observers.shift_remove(&id);
            }
        });

        if let Some(value) = replay {
            observer(&value);
        }

        subscription
    }
}

impl<T: fmt::Debug> fmt::Debug for Source<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Source")
            .field("current", &inner.current)
            .field("replay", &inner.replay)
            .field("observers", &inner.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::StreamExt;
    use std::cell::Cell;

    fn recorder<T: Clone + 'static>() -> (Rc<RefCell<Vec<T>>>, impl Fn(&T) + 'static) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |v: &T| sink.borrow_mut().push(v.clone()))
    }

    #[test]
    fn test_plain_source_does_not_replay() {
        let source = Source::<i32>::new();
        source.emit(1);

        let (seen, observer) = recorder();
        let _sub = source.stream().observe(observer);
        source.emit(2);

        assert_eq!(*seen.borrow(), vec![2]);
        assert_eq!(source.get(), None);
    }

    #[test]
    fn test_value_source_replays_on_subscribe() {
        let source = Source::with_value("a".to_string());
        let (seen, observer) = recorder();

        let _sub = source.stream().observe(observer);
        assert_eq!(*seen.borrow(), vec!["a".to_string()]);

        source.emit("b".to_string());
        assert_eq!(*seen.borrow(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(source.get().as_deref(), Some("b"));
    }

    #[test]
    fn test_update() {
        let source = Source::with_value(10u32);
        source.update(|v| v + 5);
        assert_eq!(source.get(), Some(15));

        let empty = Source::<u32>::new();
        empty.update(|v| v + 5);
        assert_eq!(empty.get(), None);
    }

    #[test]
    fn test_observers_fire_in_subscription_order() {
        let source = Source::<i32>::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let subs: Vec<_> = (0..3)
            .map(|i| {
                let order = order.clone();
                source.stream().observe(move |_| order.borrow_mut().push(i))
            })
            .collect();

        source.emit(0);
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
        assert_eq!(subs.len(), 3);
    }

    #[test]
    fn test_unsubscribe_removes_observer() {
        let source = Source::<i32>::new();
        let (seen, observer) = recorder();

        let mut sub = source.stream().observe(observer);
        assert_eq!(source.subscriber_count(), 1);

        sub.unsubscribe();
        sub.unsubscribe();
        assert_eq!(source.subscriber_count(), 0);

        source.emit(1);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_unsubscribe_during_emission_skips_observer() {
        let source = Source::<i32>::new();
        let second_sub: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let second_runs = Rc::new(Cell::new(0));

        let slot = second_sub.clone();
        let _first = source.stream().observe(move |_| {
            if let Some(mut sub) = slot.borrow_mut().take() {
                sub.unsubscribe();
            }
        });

        let runs = second_runs.clone();
        let second = source.stream().observe(move |_| runs.set(runs.get() + 1));
        *second_sub.borrow_mut() = Some(second);

        source.emit(1);
        assert_eq!(second_runs.get(), 0);
        assert_eq!(source.subscriber_count(), 1);
    }

    #[test]
    fn test_update_closure_can_use_source() {
        let source = Source::with_value(1u32);
        let (seen, observer) = recorder();
        let _sub = source.stream().observe(observer);

        let inner = source.clone();
        source.update(|v| {
            inner.emit(v + 10);
            let _late = inner.stream().observe(|_| {});
            v + 1
        });

        assert_eq!(*seen.borrow(), vec![1, 11, 2]);
        assert_eq!(source.get(), Some(2));
        assert_eq!(source.subscriber_count(), 2);
    }

    #[test]
    fn test_subscribe_during_emission_misses_in_flight_value() {
        let source = Source::<i32>::new();
        let (late_seen, late_observer) = recorder();
        let late_observer = Rc::new(RefCell::new(Some(late_observer)));
        let late_sub: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let inner = source.clone();
        let pending = late_observer.clone();
        let slot = late_sub.clone();
        let _first = source.stream().observe(move |_| {
            let observer = pending.borrow_mut().take();
            if let Some(observer) = observer {
                *slot.borrow_mut() = Some(inner.stream().observe(observer));
            }
        });

        source.emit(1);
        assert!(late_seen.borrow().is_empty());
        assert_eq!(source.subscriber_count(), 2);

        source.emit(2);
        assert_eq!(*late_seen.borrow(), vec![2]);
    }

    #[test]
    fn test_reentrant_emit() {
        let source = Source::with_value(0i32);
        let feedback = source.clone();
        let _loopback = source.stream().observe(move |v| {
            if *v < 3 {
                feedback.emit(v + 1);
            }
        });

        assert_eq!(source.get(), Some(3));
    }

    #[test]
    fn test_subscription_outlives_source() {
        let source = Source::<i32>::new();
        let mut sub = source.stream().observe(|_| {});
        drop(source);
        sub.unsubscribe();
        assert!(sub.is_closed());
    }
}
