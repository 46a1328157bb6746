//! Lazy reconciliation
//!
//! A lazy plan is a stream of text-or-element plans. The lazy instance
//! subscribes once and, for every emitted plan, either patches the node it
//! holds or replaces it:
//!
//! ```text
//!            emit P
//!  Empty ─────────────▶ Holding(render P)
//!
//!  Holding(const text) ── emit const text ──▶ same node, content overwritten
//!  Holding(old)        ── emit anything else ▶ render P, remove old node,
//!                                             release old bindings
//! ```
//!
//! Only const-text to const-text is patched: a reactive text node owns a
//! subscription and an element owns bindings and children, so any other
//! change alters which bindings exist and gets a fresh instance.
//!
//! The lazy node marks its place in the parent with an empty text node,
//! the anchor. Whenever nothing is held (before the first plan, after a
//! failed replacement) the next plan is mounted right before the anchor,
//! so the lazy child keeps its position among its siblings.
//!
//! The replacement is attached before the old instance's resources are
//! released. With [`ReplaceStrategy::InPlace`] it takes the old node's
//! position among its siblings; [`ReplaceStrategy::Append`] puts it after
//! the parent's last child.

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::ReplaceStrategy;
use crate::error::{RenderError, Result};
use crate::host::Host;
use crate::instance::{Cleanup, LazyInstance, NodeInstance};
use crate::plan::{LazyPlan, NodePlan, PlanKind, TextPlan};
use crate::render::Renderer;

/// What an emitted plan does to the held instance
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Nothing is held yet: render before the anchor and hold
    Mount,
    /// Overwrite the held text node in place
    Patch,
    /// Render a fresh instance and discard the held one
    Replace,
}

impl Transition {
    /// Decide how to move from the held kind (if any) to the next plan kind
    pub fn decide(held: Option<PlanKind>, next: PlanKind) -> Self {
        match (held, next) {
            (None, _) => Transition::Mount,
            (Some(PlanKind::ConstText), PlanKind::ConstText) => Transition::Patch,
            (Some(_), _) => Transition::Replace,
        }
    }
}

/// Shared state between a lazy instance and its plan-stream callback
#[derive(Debug)]
pub(crate) struct LazySlot<N> {
    held: Option<NodeInstance<N>>,
    released: bool,
    /// Set while the plan stream is being subscribed
    subscribing: bool,
    /// First render failure seen while subscribing
    initial_error: Option<RenderError>,
}

impl<N> Default for LazySlot<N> {
    fn default() -> Self {
        Self {
            held: None,
            released: false,
            subscribing: false,
            initial_error: None,
        }
    }
}

impl<N: Clone> LazySlot<N> {
    pub(crate) fn node(&self) -> Option<N> {
        self.held.as_ref().map(|held| held.node().clone())
    }

    pub(crate) fn kind(&self) -> Option<PlanKind> {
        self.held.as_ref().map(NodeInstance::kind)
    }
}

/// Where a lazy node lives in the host tree
struct Placement<N> {
    parent: N,
    anchor: N,
}

impl<H: Host + 'static> Renderer<H> {
    /// Subscribe to a plan stream and keep one rendered child in `parent`
    ///
    /// An empty anchor text node is appended to `parent` first; rendered
    /// children are mounted before it. Plans a replaying stream pushes
    /// during this call are rendered before it returns, and if one of
    /// them fails the subscription is cancelled, the anchor removed and
    /// the error returned.
    ///
    /// The cleanup cancels the plan stream first, then releases the held
    /// child. Like every other instance, host nodes stay where they are.
    pub fn render_lazy(&self, plan: &LazyPlan, parent: &H::Node) -> Result<LazyInstance<H::Node>> {
        let host = self.host();
        let anchor = host.create_text("")?;
        host.append_child(parent, &anchor)?;

        let slot: Rc<RefCell<LazySlot<H::Node>>> = Rc::new(RefCell::new(LazySlot {
            subscribing: true,
            ..LazySlot::default()
        }));

        let renderer = self.clone();
        let target = slot.clone();
        let placement = Placement {
            parent: parent.clone(),
            anchor: anchor.clone(),
        };
        let mut subscription = plan.plans.subscribe(Rc::new(move |next: &NodePlan| {
            renderer.reconcile(&target, &placement, next);
        }));

        let failed = {
            let mut slot = slot.borrow_mut();
            slot.subscribing = false;
            slot.initial_error.take()
        };

        let released = slot.clone();
        let cleanup = Cleanup::new(move || {
            subscription.unsubscribe();
            let held = {
                let mut slot = released.borrow_mut();
                slot.released = true;
                slot.held.take()
            };
            if let Some(held) = held {
                tracing::debug!(kind = %held.kind(), "releasing lazy child");
                held.cleanup();
            }
        });

        if let Some(err) = failed {
            tracing::debug!(%err, "lazy render failed on first plan");
            if let Some(node) = slot.borrow().node() {
                if let Err(err) = host.remove_child(parent, &node) {
                    tracing::warn!(?node, %err, "failed to remove lazy child");
                }
            }
            cleanup.run();
            if let Err(err) = host.remove_child(parent, &anchor) {
                tracing::warn!(node = ?anchor, %err, "failed to remove lazy anchor");
            }
            return Err(err);
        }

        Ok(LazyInstance {
            slot,
            anchor,
            cleanup,
        })
    }

    fn reconcile(
        &self,
        slot: &Rc<RefCell<LazySlot<H::Node>>>,
        placement: &Placement<H::Node>,
        next: &NodePlan,
    ) {
        // The held instance is taken out so host callbacks fired while
        // rendering can re-enter this slot without a borrow conflict
        let held = {
            let mut slot = slot.borrow_mut();
            if slot.released {
                return;
            }
            slot.held.take()
        };

        let transition = Transition::decide(held.as_ref().map(NodeInstance::kind), next.kind());
        tracing::debug!(
            from = ?held.as_ref().map(NodeInstance::kind),
            to = %next.kind(),
            ?transition,
            "lazy reconcile"
        );

        let updated = match held {
            None => self.render_node(next, &placement.parent, Some(&placement.anchor)),
            Some(held) if transition == Transition::Patch => Ok(self.patch(held, next)),
            Some(held) => self.replace(&placement.parent, held, next),
        };

        let stale = {
            let mut slot = slot.borrow_mut();
            match updated {
                Err(err) => {
                    if slot.subscribing {
                        slot.initial_error.get_or_insert(err);
                    } else {
                        tracing::error!(kind = %next.kind(), %err, "lazy render failed");
                    }
                    None
                }
                // Released mid-flight, or a newer emission already mounted
                Ok(updated) if slot.released || slot.held.is_some() => Some(updated),
                Ok(updated) => {
                    slot.held = Some(updated);
                    None
                }
            }
        };

        if let Some(stale) = stale {
            tracing::debug!(kind = %stale.kind(), "discarding stale lazy child");
            self.discard(&placement.parent, stale);
        }
    }

    fn patch(&self, held: NodeInstance<H::Node>, next: &NodePlan) -> NodeInstance<H::Node> {
        if let NodePlan::Text(TextPlan::Const(content)) = next {
            if let Err(err) = self.host().set_text(held.node(), content) {
                tracing::warn!(node = ?held.node(), %err, "failed to patch lazy text");
            }
        }
        held
    }

    /// Render `next`, then remove and release `old` whether or not that worked
    fn replace(
        &self,
        parent: &H::Node,
        old: NodeInstance<H::Node>,
        next: &NodePlan,
    ) -> Result<NodeInstance<H::Node>> {
        let before = match self.config().replace_strategy {
            ReplaceStrategy::InPlace => Some(old.node().clone()),
            ReplaceStrategy::Append => None,
        };

        let rendered = self.render_node(next, parent, before.as_ref());
        self.discard(parent, old);
        rendered
    }

    fn discard(&self, parent: &H::Node, instance: NodeInstance<H::Node>) {
        if let Err(err) = self.host().remove_child(parent, instance.node()) {
            tracing::warn!(node = ?instance.node(), %err, "failed to remove lazy child");
        }
        instance.cleanup();
    }
}
