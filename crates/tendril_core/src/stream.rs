//! Stream and subscription abstractions
//!
//! A [`Stream<T>`] pushes values to observers registered with
//! [`Stream::subscribe`]. The returned [`Subscription`] is the only way to
//! stop receiving values: dropping it does **not** unsubscribe, release is
//! always explicit.
//!
//! Streams carry values only. There is no error or completion channel; an
//! observer that panics unwinds into whoever drove the emission.

use std::fmt;
use std::rc::Rc;

/// Callback invoked with every value a stream pushes
///
/// Uses Rc since streams are single-threaded.
pub type Observer<T> = Rc<dyn Fn(&T)>;

/// Shared, type-erased stream handle
pub type BoxStream<T> = Rc<dyn Stream<T>>;

/// A push-based source of values over time
pub trait Stream<T> {
    /// Register an observer.
    ///
    /// Streams that hold a current value may invoke the observer
    /// synchronously before this call returns.
    fn subscribe(&self, observer: Observer<T>) -> Subscription;
}

/// Release handle for a stream subscription
///
/// Unsubscribing is idempotent: the release runs on the first call and
/// every later call is a no-op.
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Create a subscription that runs `release` when unsubscribed
    pub fn new<F>(release: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A subscription with nothing to release
    pub fn closed() -> Self {
        Self { release: None }
    }

    /// Stop receiving values
    pub fn unsubscribe(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    /// Whether this subscription has already been released
    pub fn is_closed(&self) -> bool {
        self.release.is_none()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}

// =============================================================================
// COMBINATORS
// =============================================================================

/// Stream that transforms every upstream value
pub struct Map<T, U> {
    upstream: BoxStream<T>,
    transform: Rc<dyn Fn(&T) -> U>,
}

impl<T: 'static, U: 'static> Stream<U> for Map<T, U> {
    fn subscribe(&self, observer: Observer<U>) -> Subscription {
        let transform = self.transform.clone();
        self.upstream
            .subscribe(Rc::new(move |value: &T| observer(&transform(value))))
    }
}

/// Transform every value of `upstream` with `transform`
pub fn map<T, U, F>(upstream: BoxStream<T>, transform: F) -> BoxStream<U>
where
    T: 'static,
    U: 'static,
    F: Fn(&T) -> U + 'static,
{
    Rc::new(Map {
        upstream,
        transform: Rc::new(transform),
    })
}

/// Stream that pushes a single value to each subscriber, synchronously
pub struct Just<T> {
    value: T,
}

impl<T> Stream<T> for Just<T> {
    fn subscribe(&self, observer: Observer<T>) -> Subscription {
        observer(&self.value);
        Subscription::closed()
    }
}

/// A stream that emits `value` once per subscriber and never again
pub fn just<T: 'static>(value: T) -> BoxStream<T> {
    Rc::new(Just { value })
}

/// Convenience methods on shared stream handles
pub trait StreamExt<T> {
    /// Transform every value
    fn map<U, F>(&self, transform: F) -> BoxStream<U>
    where
        U: 'static,
        F: Fn(&T) -> U + 'static;

    /// Subscribe with a plain closure
    fn observe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + 'static;
}

impl<T: 'static> StreamExt<T> for BoxStream<T> {
    fn map<U, F>(&self, transform: F) -> BoxStream<U>
    where
        U: 'static,
        F: Fn(&T) -> U + 'static,
    {
        map(self.clone(), transform)
    }

    fn observe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + 'static,
    {
        self.subscribe(Rc::new(observer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let releases = Rc::new(Cell::new(0));
        let counter = releases.clone();
        let mut sub = Subscription::new(move || counter.set(counter.get() + 1));

        assert!(!sub.is_closed());
        sub.unsubscribe();
        sub.unsubscribe();

        assert!(sub.is_closed());
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn test_closed_subscription() {
        let mut sub = Subscription::closed();
        assert!(sub.is_closed());
        sub.unsubscribe();
        assert!(sub.is_closed());
    }

    #[test]
    fn test_just_emits_once_per_subscriber() {
        let stream = just(7i32);
        let seen = Rc::new(RefCell::new(Vec::new()));

        for _ in 0..2 {
            let sink = seen.clone();
            let sub = stream.observe(move |v| sink.borrow_mut().push(*v));
            assert!(sub.is_closed());
        }

        assert_eq!(*seen.borrow(), vec![7, 7]);
    }

    #[test]
    fn test_map_chain() {
        let stream = just(3i32).map(|v| v * 2).map(|v| format!("<{v}>"));
        let seen = Rc::new(RefCell::new(String::new()));
        let sink = seen.clone();

        let _sub = stream.observe(move |s: &String| sink.borrow_mut().push_str(s));

        assert_eq!(*seen.borrow(), "<6>");
    }
}
