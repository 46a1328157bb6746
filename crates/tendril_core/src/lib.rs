//! Tendril Core
//!
//! Push-based reactive primitives consumed by the Tendril render engine:
//!
//! - **Streams**: anything that can be subscribed to with an observer callback
//! - **Subscriptions**: explicit, idempotent release handles
//! - **Sources**: writable streams, optionally replaying their current value
//!
//! Everything here is single-threaded and synchronous. An emission invokes
//! every observer directly, in subscription order, before `emit` returns.
//!
//! # Example
//!
//! ```rust
//! use tendril_core::{Source, StreamExt};
//!
//! let count = Source::with_value(0u32);
//! let label = count.stream().map(|n| format!("Count is: {n}"));
//!
//! let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
//! let sink = seen.clone();
//! let mut sub = label.observe(move |s: &String| sink.borrow_mut().push(s.clone()));
//!
//! count.update(|n| n + 1);
//! sub.unsubscribe();
//! count.update(|n| n + 1);
//!
//! assert_eq!(*seen.borrow(), vec!["Count is: 0", "Count is: 1"]);
//! assert_eq!(count.subscriber_count(), 0);
//! ```

pub mod source;
pub mod stream;

pub use source::{ObserverId, Source};
pub use stream::{just, map, BoxStream, Just, Map, Observer, Stream, StreamExt, Subscription};
