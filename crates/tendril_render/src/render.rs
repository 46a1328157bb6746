//! Render engine
//!
//! Walks a plan tree, creates the matching host nodes, wires streams to
//! attributes and text content, and returns the instance tree that owns
//! every binding it created.
//!
//! Rendering is synchronous. A stream that already holds a value pushes it
//! while the binding is being created, so the host node carries that value
//! before the render call returns.
//!
//! # Failure
//!
//! A host error aborts the render of the current subtree. Everything that
//! subtree acquired so far is released before the error is returned;
//! siblings rendered earlier keep their nodes and bindings. Errors raised
//! inside stream callbacks cannot be returned to anyone and are logged.

use std::rc::Rc;

use tendril_core::{BoxStream, Subscription};

use crate::config::RenderConfig;
use crate::error::Result;
use crate::host::{Host, ListenerId};
use crate::instance::{Cleanup, ElementInstance, Instance, NodeInstance, TextInstance, TextKind};
use crate::plan::{ElementPlan, NodePlan, Plan, TextPlan};

/// Render `plan` into `parent` with the default configuration
pub fn render<H>(host: &Rc<H>, plan: &Plan, parent: &H::Node) -> Result<Instance<H::Node>>
where
    H: Host + 'static,
{
    Renderer::new(host.clone()).render(plan, parent)
}

/// Renders plans against a shared host
pub struct Renderer<H> {
    host: Rc<H>,
    config: RenderConfig,
}

impl<H> Clone for Renderer<H> {
    fn clone(&self) -> Self {
        Self {
            host: self.host.clone(),
            config: self.config.clone(),
        }
    }
}

impl<H: Host + 'static> Renderer<H> {
    pub fn new(host: Rc<H>) -> Self {
        Self::with_config(host, RenderConfig::default())
    }

    pub fn with_config(host: Rc<H>, config: RenderConfig) -> Self {
        Self { host, config }
    }

    pub fn host(&self) -> &Rc<H> {
        &self.host
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render any plan, appending its node to `parent`
    pub fn render(&self, plan: &Plan, parent: &H::Node) -> Result<Instance<H::Node>> {
        match plan {
            Plan::Text(text) => self.text_at(text, parent, None).map(Instance::Text),
            Plan::Element(element) => self.element_at(element, parent, None).map(Instance::Element),
            Plan::Lazy(lazy) => self.render_lazy(lazy, parent).map(Instance::Lazy),
        }
    }

    /// Render a text plan, appending one text node to `parent`
    pub fn render_text(&self, plan: &TextPlan, parent: &H::Node) -> Result<TextInstance<H::Node>> {
        self.text_at(plan, parent, None)
    }

    /// Render an element plan and its children, appending one element to `parent`
    pub fn render_element(
        &self,
        plan: &ElementPlan,
        parent: &H::Node,
    ) -> Result<ElementInstance<H::Node>> {
        self.element_at(plan, parent, None)
    }

    /// Render a text or element plan before `before` (or at the end)
    pub(crate) fn render_node(
        &self,
        plan: &NodePlan,
        parent: &H::Node,
        before: Option<&H::Node>,
    ) -> Result<NodeInstance<H::Node>> {
        match plan {
            NodePlan::Text(text) => self.text_at(text, parent, before).map(NodeInstance::Text),
            NodePlan::Element(element) => self
                .element_at(element, parent, before)
                .map(NodeInstance::Element),
        }
    }

    fn text_at(
        &self,
        plan: &TextPlan,
        parent: &H::Node,
        before: Option<&H::Node>,
    ) -> Result<TextInstance<H::Node>> {
        let host = &*self.host;
        match plan {
            TextPlan::Const(content) => {
                let node = host.create_text(content)?;
                host.insert_before(parent, &node, before)?;
                tracing::trace!(?node, "mounted const text");
                Ok(TextInstance {
                    node,
                    kind: TextKind::Const,
                    cleanup: Cleanup::noop(),
                })
            }
            TextPlan::Reactive(content) => {
                let node = host.create_text("")?;
                let cleanup = Cleanup::from(self.bind_text(content, &node));
                if let Err(err) = host.insert_before(parent, &node, before) {
                    cleanup.run();
                    return Err(err);
                }
                tracing::trace!(?node, "mounted reactive text");
                Ok(TextInstance {
                    node,
                    kind: TextKind::Reactive,
                    cleanup,
                })
            }
        }
    }

    fn element_at(
        &self,
        plan: &ElementPlan,
        parent: &H::Node,
        before: Option<&H::Node>,
    ) -> Result<ElementInstance<H::Node>> {
        let host = &*self.host;
        let node = host.create_element(&plan.tag)?;
        let mut cleanup = Cleanup::noop();

        // Children go into the new node before it is attached to the parent
        let mounted = self
            .populate(plan, &node, &mut cleanup)
            .and_then(|()| host.insert_before(parent, &node, before));

        if let Err(err) = mounted {
            tracing::debug!(
                tag = %plan.tag,
                %err,
                released = cleanup.len(),
                "element render failed"
            );
            cleanup.run();
            return Err(err);
        }

        tracing::debug!(
            tag = %plan.tag,
            children = plan.children.len(),
            bindings = cleanup.len(),
            "rendered element"
        );

        Ok(ElementInstance {
            node,
            tag: plan.tag.clone(),
            cleanup,
        })
    }

    fn populate(&self, plan: &ElementPlan, node: &H::Node, cleanup: &mut Cleanup) -> Result<()> {
        let host = &*self.host;

        for (name, value) in &plan.const_attrs {
            host.set_attribute(node, name, value)?;
        }

        for (name, value) in &plan.reactive_attrs {
            cleanup.push(self.bind_attribute(value, node, name).into());
        }

        for (event, handler) in &plan.event_listeners {
            let listener = host.add_event_listener(node, event, handler.clone())?;
            if self.config.detach_listeners {
                cleanup.push(self.detach_listener(node, listener));
            }
        }

        for child in &plan.children {
            let instance = self.render(child, node)?;
            cleanup.push(instance.into_cleanup());
        }

        Ok(())
    }

    fn bind_text(&self, content: &BoxStream<String>, node: &H::Node) -> Subscription {
        let host = self.host.clone();
        let node = node.clone();
        content.subscribe(Rc::new(move |value: &String| {
            if let Err(err) = host.set_text(&node, value) {
                tracing::warn!(?node, %err, "failed to update reactive text");
            }
        }))
    }

    fn bind_attribute(
        &self,
        value: &BoxStream<String>,
        node: &H::Node,
        name: &str,
    ) -> Subscription {
        let host = self.host.clone();
        let node = node.clone();
        let name = name.to_string();
        value.subscribe(Rc::new(move |value: &String| {
            if let Err(err) = host.set_attribute(&node, &name, value) {
                tracing::warn!(?node, attribute = %name, %err, "failed to update reactive attribute");
            }
        }))
    }

    fn detach_listener(&self, node: &H::Node, listener: ListenerId) -> Cleanup {
        let host = self.host.clone();
        let node = node.clone();
        Cleanup::new(move || {
            if let Err(err) = host.remove_event_listener(&node, listener) {
                tracing::warn!(?node, %err, "failed to detach event listener");
            }
        })
    }
}
