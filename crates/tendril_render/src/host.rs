//! Host surface abstraction
//!
//! The render engine never touches a concrete UI substrate. It drives a
//! [`Host`], which owns the node storage and performs the mutations. Node
//! handles are cheap, clonable references; the engine only uses them for
//! the mutations its own instances issue.
//!
//! All methods take `&self`: hosts are shared (`Rc<H>`) between the
//! renderer and the stream callbacks it installs, so mutation goes through
//! interior mutability, the same way a document tree would.

use std::fmt;
use std::rc::Rc;

use slotmap::new_key_type;

use crate::error::Result;

new_key_type! {
    /// Handle for an attached event listener
    pub struct ListenerId;
}

/// Callback for handling events
///
/// Uses Rc since UI is single-threaded.
pub type EventHandler = Rc<dyn Fn(&Event)>;

/// An event delivered to a listener
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    /// Event name, e.g. `"click"`
    pub name: String,
    /// Optional payload (input value, key, ...)
    pub value: Option<String>,
}

impl Event {
    /// Create an event without payload
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// Attach a payload
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Mutation capability of a UI surface
pub trait Host {
    /// Reference to a node owned by the host
    type Node: Clone + PartialEq + fmt::Debug + 'static;

    /// Create a detached element node
    fn create_element(&self, tag: &str) -> Result<Self::Node>;

    /// Create a detached text node
    fn create_text(&self, content: &str) -> Result<Self::Node>;

    /// Set or overwrite an attribute on an element
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str) -> Result<()>;

    /// Overwrite the content of a text node
    fn set_text(&self, node: &Self::Node, content: &str) -> Result<()>;

    /// Attach a listener for `event`
    fn add_event_listener(
        &self,
        node: &Self::Node,
        event: &str,
        handler: EventHandler,
    ) -> Result<ListenerId>;

    /// Detach a previously attached listener
    fn remove_event_listener(&self, node: &Self::Node, listener: ListenerId) -> Result<()>;

    /// Insert `child` into `parent` before `reference`, or at the end when
    /// `reference` is `None`
    fn insert_before(
        &self,
        parent: &Self::Node,
        child: &Self::Node,
        reference: Option<&Self::Node>,
    ) -> Result<()>;

    /// Detach `child` from `parent`
    fn remove_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<()>;

    /// Append `child` as the last child of `parent`
    fn append_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<()> {
        self.insert_before(parent, child, None)
    }
}
