//! Instances: the live counterpart of rendered plans
//!
//! Every render call returns an instance that owns the release capability
//! for everything it acquired (stream subscriptions, event listeners, child
//! instances). Host nodes are only referenced, never owned.
//!
//! Releasing consumes the instance, so a cleanup can run at most once.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;
use tendril_core::Subscription;

use crate::error::Result;
use crate::host::Host;
use crate::lazy::LazySlot;
use crate::plan::PlanKind;

type Release = Box<dyn FnOnce()>;

/// An aggregated release capability
///
/// Releases run in the order they were recorded. They are infallible:
/// one release can never prevent the rest from running.
#[derive(Default)]
pub struct Cleanup {
    releases: SmallVec<[Release; 4]>,
}

impl Cleanup {
    /// A cleanup that releases nothing
    pub fn noop() -> Self {
        Self::default()
    }

    /// A cleanup running a single release
    pub fn new<F>(release: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        let mut cleanup = Self::noop();
        cleanup.push_fn(release);
        cleanup
    }

    /// Record another release
    pub fn push_fn<F>(&mut self, release: F)
    where
        F: FnOnce() + 'static,
    {
        self.releases.push(Box::new(release));
    }

    /// Absorb every release of `other`
    pub fn push(&mut self, other: Cleanup) {
        self.releases.extend(other.releases);
    }

    /// Number of recorded releases
    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    /// Run every release
    pub fn run(self) {
        for release in self.releases {
            release();
        }
    }
}

impl From<Subscription> for Cleanup {
    fn from(mut subscription: Subscription) -> Self {
        Cleanup::new(move || subscription.unsubscribe())
    }
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cleanup")
            .field("releases", &self.releases.len())
            .finish()
    }
}

// =============================================================================
// TEXT
// =============================================================================

/// Whether a text node is fixed or bound to a stream
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextKind {
    Const,
    Reactive,
}

/// A rendered text node
#[derive(Debug)]
pub struct TextInstance<N> {
    pub(crate) node: N,
    pub(crate) kind: TextKind,
    pub(crate) cleanup: Cleanup,
}

impl<N> TextInstance<N> {
    pub fn node(&self) -> &N {
        &self.node
    }

    pub fn kind(&self) -> TextKind {
        self.kind
    }

    pub fn cleanup(self) {
        self.cleanup.run();
    }
}

// =============================================================================
// ELEMENT
// =============================================================================

/// A rendered element and its bindings
#[derive(Debug)]
pub struct ElementInstance<N> {
    pub(crate) node: N,
    pub(crate) tag: String,
    pub(crate) cleanup: Cleanup,
}

impl<N> ElementInstance<N> {
    pub fn node(&self) -> &N {
        &self.node
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Number of releases this element will run on cleanup
    pub fn binding_count(&self) -> usize {
        self.cleanup.len()
    }

    pub fn cleanup(self) {
        self.cleanup.run();
    }
}

// =============================================================================
// NODE (text or element)
// =============================================================================

/// The instance a lazy node currently holds
#[derive(Debug)]
pub enum NodeInstance<N> {
    Text(TextInstance<N>),
    Element(ElementInstance<N>),
}

impl<N> NodeInstance<N> {
    pub fn node(&self) -> &N {
        match self {
            NodeInstance::Text(text) => &text.node,
            NodeInstance::Element(element) => &element.node,
        }
    }

    pub fn kind(&self) -> PlanKind {
        match self {
            NodeInstance::Text(text) => match text.kind {
                TextKind::Const => PlanKind::ConstText,
                TextKind::Reactive => PlanKind::ReactiveText,
            },
            NodeInstance::Element(_) => PlanKind::Element,
        }
    }

    pub fn cleanup(self) {
        match self {
            NodeInstance::Text(text) => text.cleanup(),
            NodeInstance::Element(element) => element.cleanup(),
        }
    }
}

// =============================================================================
// LAZY
// =============================================================================

/// A rendered lazy node
///
/// The held child changes as the plan stream emits; the node it exposes
/// is whatever is mounted right now. The anchor is an empty text node that
/// stays in the parent and marks where the child is mounted.
pub struct LazyInstance<N> {
    pub(crate) slot: Rc<RefCell<LazySlot<N>>>,
    pub(crate) anchor: N,
    pub(crate) cleanup: Cleanup,
}

impl<N: Clone> LazyInstance<N> {
    /// Host node of the currently held child
    pub fn current_node(&self) -> Option<N> {
        self.slot.borrow().node()
    }

    /// Kind of the currently held child
    pub fn current_kind(&self) -> Option<PlanKind> {
        self.slot.borrow().kind()
    }

    /// Position marker in the parent
    pub fn anchor(&self) -> &N {
        &self.anchor
    }

    /// Cancel the plan stream and release the held child
    pub fn cleanup(self) {
        self.cleanup.run();
    }
}

impl<N: fmt::Debug> fmt::Debug for LazyInstance<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyInstance")
            .field("slot", &*self.slot.borrow())
            .field("anchor", &self.anchor)
            .field("cleanup", &self.cleanup)
            .finish()
    }
}

// =============================================================================
// INSTANCE
// =============================================================================

/// Any rendered plan node
#[derive(Debug)]
pub enum Instance<N> {
    Text(TextInstance<N>),
    Element(ElementInstance<N>),
    Lazy(LazyInstance<N>),
}

impl<N: Clone> Instance<N> {
    /// The host node this instance currently occupies, if any
    pub fn node(&self) -> Option<N> {
        match self {
            Instance::Text(text) => Some(text.node.clone()),
            Instance::Element(element) => Some(element.node.clone()),
            Instance::Lazy(lazy) => lazy.current_node(),
        }
    }

    pub fn kind(&self) -> PlanKind {
        match self {
            Instance::Text(text) => match text.kind {
                TextKind::Const => PlanKind::ConstText,
                TextKind::Reactive => PlanKind::ReactiveText,
            },
            Instance::Element(_) => PlanKind::Element,
            Instance::Lazy(_) => PlanKind::Lazy,
        }
    }

    /// Release everything this instance and its descendants acquired
    ///
    /// Host nodes stay where they are; use [`Instance::unmount`] to also
    /// detach them.
    pub fn cleanup(self) {
        self.into_cleanup().run();
    }

    /// Give up the release capability without running it
    pub fn into_cleanup(self) -> Cleanup {
        match self {
            Instance::Text(text) => text.cleanup,
            Instance::Element(element) => element.cleanup,
            Instance::Lazy(lazy) => lazy.cleanup,
        }
    }

    /// Detach this instance's node from `parent`, then release everything
    ///
    /// A lazy instance also detaches its anchor. The release runs even
    /// when the host refuses a removal; the first host error is returned
    /// afterwards.
    pub fn unmount<H>(self, host: &H, parent: &N) -> Result<()>
    where
        H: Host<Node = N> + ?Sized,
    {
        let mut nodes: SmallVec<[N; 2]> = self.node().into_iter().collect();
        if let Instance::Lazy(lazy) = &self {
            nodes.push(lazy.anchor.clone());
        }

        let removed = nodes
            .iter()
            .map(|node| host.remove_child(parent, node))
            .fold(Ok(()), |removed, result| removed.and(result));
        self.cleanup();
        removed
    }
}

impl<N> From<NodeInstance<N>> for Instance<N> {
    fn from(instance: NodeInstance<N>) -> Self {
        match instance {
            NodeInstance::Text(text) => Instance::Text(text),
            NodeInstance::Element(element) => Instance::Element(element),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counting(counter: &Rc<Cell<u32>>) -> impl FnOnce() + 'static {
        let counter = counter.clone();
        move || counter.set(counter.get() + 1)
    }

    #[test]
    fn test_noop_cleanup() {
        let cleanup = Cleanup::noop();
        assert!(cleanup.is_empty());
        cleanup.run();
    }

    #[test]
    fn test_cleanup_runs_every_release_once() {
        let runs = Rc::new(Cell::new(0));
        let mut cleanup = Cleanup::new(counting(&runs));
        cleanup.push_fn(counting(&runs));

        let mut nested = Cleanup::noop();
        nested.push_fn(counting(&runs));
        nested.push_fn(counting(&runs));
        cleanup.push(nested);

        assert_eq!(cleanup.len(), 4);
        cleanup.run();
        assert_eq!(runs.get(), 4);
    }

    #[test]
    fn test_cleanup_preserves_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut cleanup = Cleanup::noop();
        for i in 0..3 {
            let order = order.clone();
            cleanup.push_fn(move || order.borrow_mut().push(i));
        }
        cleanup.run();
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_cleanup_from_subscription() {
        let released = Rc::new(Cell::new(0));
        let subscription = Subscription::new(counting(&released));
        Cleanup::from(subscription).run();
        assert_eq!(released.get(), 1);
    }

    #[test]
    fn test_node_instance_kind() {
        let text = NodeInstance::Text(TextInstance {
            node: 1u32,
            kind: TextKind::Reactive,
            cleanup: Cleanup::noop(),
        });
        assert_eq!(text.kind(), PlanKind::ReactiveText);
        assert_eq!(*text.node(), 1);

        let instance: Instance<u32> = text.into();
        assert_eq!(instance.kind(), PlanKind::ReactiveText);
        assert_eq!(instance.node(), Some(1));
    }
}
