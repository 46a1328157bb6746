//! Plans: immutable descriptions of UI structure
//!
//! A plan tree says *what* should be on screen. It holds constant values,
//! reactive streams and event handlers, but never host nodes. Rendering a
//! plan produces an [`Instance`](crate::Instance).
//!
//! # Example
//!
//! ```rust
//! use tendril_core::Source;
//! use tendril_render::plan::{element, reactive_text, text, Plan};
//! use tendril_core::StreamExt;
//!
//! let count = Source::with_value(0u32);
//!
//! let plan: Plan = element("div")
//!     .child(element("button").attr("type", "button").child(text("+1")))
//!     .child(text(" "))
//!     .child(reactive_text(count.stream().map(|n| format!("Count is: {n}"))))
//!     .into();
//! ```
//!
//! Plans are cheap to clone: streams and handlers are reference counted.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use tendril_core::BoxStream;

use crate::host::{Event, EventHandler};

/// The four shapes a plan node can take
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlanKind {
    ConstText,
    ReactiveText,
    Element,
    Lazy,
}

impl PlanKind {
    /// Short name used in logs
    pub fn as_str(self) -> &'static str {
        match self {
            PlanKind::ConstText => "const-text",
            PlanKind::ReactiveText => "reactive-text",
            PlanKind::Element => "element",
            PlanKind::Lazy => "lazy",
        }
    }
}

impl fmt::Display for PlanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// TEXT
// =============================================================================

/// Text content, fixed or driven by a stream
#[derive(Clone)]
pub enum TextPlan {
    Const(String),
    Reactive(BoxStream<String>),
}

impl TextPlan {
    pub fn kind(&self) -> PlanKind {
        match self {
            TextPlan::Const(_) => PlanKind::ConstText,
            TextPlan::Reactive(_) => PlanKind::ReactiveText,
        }
    }
}

impl fmt::Debug for TextPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextPlan::Const(content) => f.debug_tuple("Const").field(content).finish(),
            TextPlan::Reactive(_) => f.write_str("Reactive(<stream>)"),
        }
    }
}

/// Constant text
pub fn text(content: impl Into<String>) -> TextPlan {
    TextPlan::Const(content.into())
}

/// Text that follows a stream of strings
pub fn reactive_text(content: BoxStream<String>) -> TextPlan {
    TextPlan::Reactive(content)
}

// =============================================================================
// ELEMENT
// =============================================================================

/// An element with attributes, listeners and children
///
/// All maps keep insertion order; attributes are applied in that order.
#[derive(Clone)]
pub struct ElementPlan {
    pub tag: String,
    pub const_attrs: IndexMap<String, String>,
    pub reactive_attrs: IndexMap<String, BoxStream<String>>,
    pub event_listeners: IndexMap<String, EventHandler>,
    pub children: Vec<Plan>,
}

/// Start building an element plan
pub fn element(tag: impl Into<String>) -> ElementPlan {
    ElementPlan::new(tag)
}

impl ElementPlan {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            const_attrs: IndexMap::new(),
            reactive_attrs: IndexMap::new(),
            event_listeners: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Set a constant attribute
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.const_attrs.insert(name.into(), value.into());
        self
    }

    /// Bind an attribute to a stream
    pub fn reactive_attr(mut self, name: impl Into<String>, value: BoxStream<String>) -> Self {
        self.reactive_attrs.insert(name.into(), value);
        self
    }

    /// Register the handler for an event (replaces any previous one)
    pub fn on<F>(mut self, event: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Event) + 'static,
    {
        self.event_listeners.insert(event.into(), Rc::new(handler));
        self
    }

    /// Append a child
    pub fn child(mut self, child: impl Into<Plan>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append several children
    pub fn children<I, P>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Plan>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }
}

impl fmt::Debug for ElementPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementPlan")
            .field("tag", &self.tag)
            .field("const_attrs", &self.const_attrs)
            .field("reactive_attrs", &self.reactive_attrs.keys().collect::<Vec<_>>())
            .field("event_listeners", &self.event_listeners.keys().collect::<Vec<_>>())
            .field("children", &self.children)
            .finish()
    }
}

// =============================================================================
// LAZY
// =============================================================================

/// The plans a lazy node can resolve to
#[derive(Clone, Debug)]
pub enum NodePlan {
    Text(TextPlan),
    Element(ElementPlan),
}

impl NodePlan {
    pub fn kind(&self) -> PlanKind {
        match self {
            NodePlan::Text(text) => text.kind(),
            NodePlan::Element(_) => PlanKind::Element,
        }
    }
}

impl From<TextPlan> for NodePlan {
    fn from(plan: TextPlan) -> Self {
        NodePlan::Text(plan)
    }
}

impl From<ElementPlan> for NodePlan {
    fn from(plan: ElementPlan) -> Self {
        NodePlan::Element(plan)
    }
}

/// A node whose shape is decided over time by a stream of plans
#[derive(Clone)]
pub struct LazyPlan {
    pub plans: BoxStream<NodePlan>,
}

impl fmt::Debug for LazyPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LazyPlan(<stream>)")
    }
}

/// A node resolved from a stream of plans
pub fn lazy(plans: BoxStream<NodePlan>) -> LazyPlan {
    LazyPlan { plans }
}

// =============================================================================
// PLAN
// =============================================================================

/// Any plan node
#[derive(Clone, Debug)]
pub enum Plan {
    Text(TextPlan),
    Element(ElementPlan),
    Lazy(LazyPlan),
}

impl Plan {
    /// Constant text
    pub fn text(content: impl Into<String>) -> Self {
        Plan::Text(text(content))
    }

    /// Text that follows a stream
    pub fn reactive_text(content: BoxStream<String>) -> Self {
        Plan::Text(reactive_text(content))
    }

    /// A node resolved from a stream of plans
    pub fn lazy(plans: BoxStream<NodePlan>) -> Self {
        Plan::Lazy(lazy(plans))
    }

    pub fn kind(&self) -> PlanKind {
        match self {
            Plan::Text(text) => text.kind(),
            Plan::Element(_) => PlanKind::Element,
            Plan::Lazy(_) => PlanKind::Lazy,
        }
    }
}

impl From<TextPlan> for Plan {
    fn from(plan: TextPlan) -> Self {
        Plan::Text(plan)
    }
}

impl From<ElementPlan> for Plan {
    fn from(plan: ElementPlan) -> Self {
        Plan::Element(plan)
    }
}

impl From<LazyPlan> for Plan {
    fn from(plan: LazyPlan) -> Self {
        Plan::Lazy(plan)
    }
}

impl From<NodePlan> for Plan {
    fn from(plan: NodePlan) -> Self {
        match plan {
            NodePlan::Text(text) => Plan::Text(text),
            NodePlan::Element(element) => Plan::Element(element),
        }
    }
}

// =============================================================================
// COMPONENTS
// =============================================================================

/// A reusable plan factory
///
/// Props are expected to carry streams for anything that changes over
/// time, so a component is called once and stays live through its streams.
///
/// ```rust
/// use tendril_core::{BoxStream, StreamExt};
/// use tendril_render::plan::{element, reactive_text, Component, Plan};
///
/// struct Badge;
///
/// struct BadgeProps {
///     label: BoxStream<String>,
/// }
///
/// impl Component for Badge {
///     type Props = BadgeProps;
///
///     fn plan(props: BadgeProps) -> Plan {
///         element("span")
///             .attr("class", "badge")
///             .child(reactive_text(props.label))
///             .into()
///     }
/// }
/// ```
pub trait Component {
    type Props;

    fn plan(props: Self::Props) -> Plan;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tendril_core::{just, Source};

    #[test]
    fn test_plan_kinds() {
        assert_eq!(Plan::text("a").kind(), PlanKind::ConstText);
        assert_eq!(Plan::reactive_text(just("a".into())).kind(), PlanKind::ReactiveText);
        assert_eq!(Plan::from(element("div")).kind(), PlanKind::Element);
        assert_eq!(Plan::lazy(Source::<NodePlan>::new().stream()).kind(), PlanKind::Lazy);
    }

    #[test]
    fn test_element_builder_keeps_order() {
        let plan = element("input")
            .attr("type", "text")
            .attr("name", "q")
            .attr("type", "search")
            .on("input", |_| {})
            .on("change", |_| {})
            .children([text("a"), text("b")]);

        let attrs: Vec<_> = plan.const_attrs.iter().collect();
        assert_eq!(
            attrs,
            vec![
                (&"type".to_string(), &"search".to_string()),
                (&"name".to_string(), &"q".to_string())
            ]
        );
        let events: Vec<_> = plan.event_listeners.keys().cloned().collect();
        assert_eq!(events, vec!["input", "change"]);
        assert_eq!(plan.children.len(), 2);
    }

    #[test]
    fn test_node_plan_into_plan() {
        let node: NodePlan = element("span").into();
        assert_eq!(node.kind(), PlanKind::Element);
        assert_eq!(Plan::from(node).kind(), PlanKind::Element);

        let node: NodePlan = text("x").into();
        assert!(matches!(Plan::from(node), Plan::Text(TextPlan::Const(ref s)) if s == "x"));
    }

    #[test]
    fn test_debug_hides_streams() {
        let plan = element("p").reactive_attr("title", just("t".into()));
        let rendered = format!("{plan:?}");
        assert!(rendered.contains("\"title\""));
        assert!(format!("{:?}", reactive_text(just("t".into()))).contains("<stream>"));
    }
}
