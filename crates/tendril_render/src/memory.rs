//! In-memory host surface
//!
//! A small document tree backed by a slotmap arena. It implements [`Host`]
//! with the same rules a browser document enforces (text nodes have no
//! children, a node has at most one parent, no cycles) and adds the
//! inspection helpers tests and headless tools need: tree queries, event
//! dispatch, HTML serialization and a mutation counter.
//!
//! ```rust
//! use std::rc::Rc;
//! use tendril_render::memory::MemoryHost;
//! use tendril_render::plan::{element, text};
//! use tendril_render::render;
//!
//! let host = Rc::new(MemoryHost::new());
//! let root = host.root();
//!
//! let plan = element("p").attr("class", "note").child(text("hi & bye")).into();
//! let instance = render(&host, &plan, &root).unwrap();
//!
//! assert_eq!(host.to_html(root), r#"<body><p class="note">hi &amp; bye</p></body>"#);
//! instance.cleanup();
//! ```
//!
//! Removed nodes stay in the arena; they are simply detached.

use std::cell::RefCell;
use std::fmt::Write as _;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, Key, SlotMap};
use smallvec::SmallVec;

use crate::error::{RenderError, Result};
use crate::host::{Event, EventHandler, Host, ListenerId};

new_key_type! {
    /// Node handle in a [`MemoryHost`]
    pub struct NodeId;
}

impl NodeId {
    /// Convert to a raw u64 representation
    pub fn to_raw(self) -> u64 {
        self.data().as_ffi()
    }
}

enum NodeData {
    Element {
        tag: String,
        attributes: IndexMap<String, String>,
        children: Vec<NodeId>,
    },
    Text {
        content: String,
    },
}

struct MemoryNode {
    data: NodeData,
    parent: Option<NodeId>,
}

struct Listener {
    node: NodeId,
    event: String,
    handler: EventHandler,
}

#[derive(Default)]
struct Document {
    nodes: SlotMap<NodeId, MemoryNode>,
    listeners: SlotMap<ListenerId, Listener>,
    /// Listeners per node, in attach order
    node_listeners: FxHashMap<NodeId, SmallVec<[ListenerId; 2]>>,
    mutations: u64,
}

impl Document {
    fn node(&self, id: NodeId) -> Result<&MemoryNode> {
        self.nodes
            .get(id)
            .ok_or_else(|| RenderError::UnknownNode(describe(id)))
    }

    fn children_mut(&mut self, id: NodeId) -> Result<&mut Vec<NodeId>> {
        match self.nodes.get_mut(id) {
            Some(MemoryNode {
                data: NodeData::Element { children, .. },
                ..
            }) => Ok(children),
            Some(_) => Err(RenderError::NotAContainer(describe(id))),
            None => Err(RenderError::UnknownNode(describe(id))),
        }
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.nodes.get(node).and_then(|n| n.parent) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.nodes.get_mut(child).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Ok(children) = self.children_mut(parent) {
            children.retain(|&c| c != child);
        }
    }
}

fn describe(id: NodeId) -> String {
    format!("node#{}", id.to_raw())
}

fn is_valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
        }
        _ => false,
    }
}

/// Headless document tree
pub struct MemoryHost {
    doc: RefCell<Document>,
    root: NodeId,
}

impl MemoryHost {
    /// Create a document with an empty `body` root
    pub fn new() -> Self {
        let mut doc = Document::default();
        let root = doc.nodes.insert(MemoryNode {
            data: NodeData::Element {
                tag: "body".to_string(),
                attributes: IndexMap::new(),
                children: Vec::new(),
            },
            parent: None,
        });
        Self {
            doc: RefCell::new(doc),
            root,
        }
    }

    /// The document root
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Whether `node` exists on this host
    pub fn contains(&self, node: NodeId) -> bool {
        self.doc.borrow().nodes.contains_key(node)
    }

    /// Children of `node` in order (empty for text nodes)
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        match self.doc.borrow().nodes.get(node).map(|n| &n.data) {
            Some(NodeData::Element { children, .. }) => children.clone(),
            _ => Vec::new(),
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.doc.borrow().nodes.get(node).and_then(|n| n.parent)
    }

    /// Tag name of an element node
    pub fn tag(&self, node: NodeId) -> Option<String> {
        match self.doc.borrow().nodes.get(node).map(|n| &n.data) {
            Some(NodeData::Element { tag, .. }) => Some(tag.clone()),
            _ => None,
        }
    }

    /// Content of a text node
    pub fn text(&self, node: NodeId) -> Option<String> {
        match self.doc.borrow().nodes.get(node).map(|n| &n.data) {
            Some(NodeData::Text { content }) => Some(content.clone()),
            _ => None,
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        match self.doc.borrow().nodes.get(node).map(|n| &n.data) {
            Some(NodeData::Element { attributes, .. }) => attributes.get(name).cloned(),
            _ => None,
        }
    }

    /// Number of listeners currently attached to `node`
    pub fn listener_count(&self, node: NodeId) -> usize {
        self.doc
            .borrow()
            .node_listeners
            .get(&node)
            .map_or(0, |ids| ids.len())
    }

    /// Number of tree, attribute, text and listener mutations so far
    pub fn mutation_count(&self) -> u64 {
        self.doc.borrow().mutations
    }

    /// Elements with the given tag, in document order
    pub fn find_by_tag(&self, tag: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            if self.tag(node).as_deref() == Some(tag) {
                found.push(node);
            }
            stack.extend(self.children(node).into_iter().rev());
        }
        found
    }

    /// Invoke every listener for `event.name` on `node`, in attach order
    ///
    /// Events do not bubble. Returns the number of handlers invoked.
    pub fn dispatch(&self, node: NodeId, event: &Event) -> usize {
        let handlers: SmallVec<[EventHandler; 2]> = {
            let doc = self.doc.borrow();
            let handlers = doc
                .node_listeners
                .get(&node)
                .into_iter()
                .flatten()
                .filter_map(|id| doc.listeners.get(*id))
                .filter(|listener| listener.event == event.name)
                .map(|listener| listener.handler.clone())
                .collect();
            handlers
        };

        tracing::trace!(node = %describe(node), event = %event.name, handlers = handlers.len(), "dispatch");

        // Handlers may mutate the document, so no borrow is held here
        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    /// Serialize the subtree rooted at `node` as HTML
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let doc = self.doc.borrow();
        let Some(data) = doc.nodes.get(node).map(|n| &n.data) else {
            return;
        };
        match data {
            NodeData::Text { content } => out.push_str(&escape_text(content)),
            NodeData::Element {
                tag,
                attributes,
                children,
            } => {
                let _ = write!(out, "<{tag}");
                for (name, value) in attributes {
                    let _ = write!(out, " {name}=\"{}\"", escape_attribute(value));
                }
                out.push('>');
                let children = children.clone();
                let tag = tag.clone();
                drop(doc);
                for child in children {
                    self.write_html(child, out);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut Document) -> Result<R>) -> Result<R> {
        let mut doc = self.doc.borrow_mut();
        let result = f(&mut *doc)?;
        doc.mutations += 1;
        Ok(result)
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

impl Host for MemoryHost {
    type Node = NodeId;

    fn create_element(&self, tag: &str) -> Result<NodeId> {
        if !is_valid_tag(tag) {
            return Err(RenderError::InvalidTagName(tag.to_string()));
        }
        let id = self.doc.borrow_mut().nodes.insert(MemoryNode {
            data: NodeData::Element {
                tag: tag.to_ascii_lowercase(),
                attributes: IndexMap::new(),
                children: Vec::new(),
            },
            parent: None,
        });
        tracing::trace!(node = %describe(id), tag, "create element");
        Ok(id)
    }

    fn create_text(&self, content: &str) -> Result<NodeId> {
        let id = self.doc.borrow_mut().nodes.insert(MemoryNode {
            data: NodeData::Text {
                content: content.to_string(),
            },
            parent: None,
        });
        tracing::trace!(node = %describe(id), "create text");
        Ok(id)
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) -> Result<()> {
        let node = *node;
        self.mutate(|doc| match doc.nodes.get_mut(node).map(|n| &mut n.data) {
            Some(NodeData::Element { attributes, .. }) => {
                attributes.insert(name.to_string(), value.to_string());
                Ok(())
            }
            Some(NodeData::Text { .. }) => Err(RenderError::NotAContainer(describe(node))),
            None => Err(RenderError::UnknownNode(describe(node))),
        })
    }

    fn set_text(&self, node: &NodeId, content: &str) -> Result<()> {
        let node = *node;
        self.mutate(|doc| match doc.nodes.get_mut(node).map(|n| &mut n.data) {
            Some(NodeData::Text { content: current }) => {
                current.clear();
                current.push_str(content);
                Ok(())
            }
            Some(NodeData::Element { .. }) => Err(RenderError::NotAContainer(describe(node))),
            None => Err(RenderError::UnknownNode(describe(node))),
        })
    }

    fn add_event_listener(
        &self,
        node: &NodeId,
        event: &str,
        handler: EventHandler,
    ) -> Result<ListenerId> {
        let node = *node;
        self.mutate(|doc| {
            doc.node(node)?;
            let id = doc.listeners.insert(Listener {
                node,
                event: event.to_string(),
                handler,
            });
            doc.node_listeners.entry(node).or_default().push(id);
            Ok(id)
        })
    }

    fn remove_event_listener(&self, node: &NodeId, listener: ListenerId) -> Result<()> {
        let node = *node;
        self.mutate(|doc| {
            match doc.listeners.get(listener) {
                Some(entry) if entry.node == node => {}
                _ => return Err(RenderError::UnknownListener(describe(node))),
            }
            doc.listeners.remove(listener);
            if let Some(ids) = doc.node_listeners.get_mut(&node) {
                ids.retain(|id| *id != listener);
                if ids.is_empty() {
                    doc.node_listeners.remove(&node);
                }
            }
            Ok(())
        })
    }

    fn insert_before(
        &self,
        parent: &NodeId,
        child: &NodeId,
        reference: Option<&NodeId>,
    ) -> Result<()> {
        let (parent, child) = (*parent, *child);
        self.mutate(|doc| {
            doc.node(child)?;
            doc.children_mut(parent)?;
            if doc.is_inclusive_ancestor(child, parent) {
                return Err(RenderError::InvalidHierarchy {
                    child: describe(child),
                });
            }
            if let Some(&reference) = reference {
                if reference == child {
                    return Ok(());
                }
                if doc.node(reference)?.parent != Some(parent) {
                    return Err(RenderError::NotAChild {
                        parent: describe(parent),
                        child: describe(reference),
                    });
                }
            }

            doc.detach(child);

            let children = doc.children_mut(parent)?;
            let index = reference
                .and_then(|reference| children.iter().position(|c| c == reference))
                .unwrap_or(children.len());
            children.insert(index, child);
            if let Some(node) = doc.nodes.get_mut(child) {
                node.parent = Some(parent);
            }
            Ok(())
        })
    }

    fn remove_child(&self, parent: &NodeId, child: &NodeId) -> Result<()> {
        let (parent, child) = (*parent, *child);
        self.mutate(|doc| {
            doc.children_mut(parent)?;
            if doc.node(child)?.parent != Some(parent) {
                return Err(RenderError::NotAChild {
                    parent: describe(parent),
                    child: describe(child),
                });
            }
            doc.detach(child);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_tag_validation() {
        assert!(is_valid_tag("div"));
        assert!(is_valid_tag("my-widget2"));
        assert!(!is_valid_tag(""));
        assert!(!is_valid_tag("2col"));
        assert!(!is_valid_tag("a b"));

        let host = MemoryHost::new();
        assert_eq!(
            host.create_element("<p>"),
            Err(RenderError::InvalidTagName("<p>".to_string()))
        );
    }

    #[test]
    fn test_append_and_insert_before() {
        let host = MemoryHost::new();
        let root = host.root();
        let a = host.create_text("a").unwrap();
        let b = host.create_text("b").unwrap();
        let c = host.create_text("c").unwrap();

        host.append_child(&root, &a).unwrap();
        host.append_child(&root, &c).unwrap();
        host.insert_before(&root, &b, Some(&c)).unwrap();

        assert_eq!(host.children(root), vec![a, b, c]);
        assert_eq!(host.parent(b), Some(root));
        assert_eq!(host.to_html(root), "<body>abc</body>");
    }

    #[test]
    fn test_insert_moves_existing_child() {
        let host = MemoryHost::new();
        let root = host.root();
        let div = host.create_element("div").unwrap();
        let t = host.create_text("t").unwrap();

        host.append_child(&root, &t).unwrap();
        host.append_child(&root, &div).unwrap();
        host.append_child(&div, &t).unwrap();

        assert_eq!(host.children(root), vec![div]);
        assert_eq!(host.children(div), vec![t]);
    }

    #[test]
    fn test_structural_errors() {
        let host = MemoryHost::new();
        let root = host.root();
        let text = host.create_text("x").unwrap();
        let div = host.create_element("div").unwrap();
        let stray = host.create_text("y").unwrap();

        assert!(matches!(
            host.append_child(&text, &div),
            Err(RenderError::NotAContainer(_))
        ));
        assert!(matches!(
            host.remove_child(&root, &stray),
            Err(RenderError::NotAChild { .. })
        ));
        assert!(matches!(
            host.insert_before(&root, &div, Some(&stray)),
            Err(RenderError::NotAChild { .. })
        ));

        host.append_child(&root, &div).unwrap();
        assert!(matches!(
            host.append_child(&div, &root),
            Err(RenderError::InvalidHierarchy { .. })
        ));
        assert!(matches!(
            host.set_text(&div, "nope"),
            Err(RenderError::NotAContainer(_))
        ));
    }

    #[test]
    fn test_remove_child_detaches() {
        let host = MemoryHost::new();
        let root = host.root();
        let span = host.create_element("span").unwrap();
        host.append_child(&root, &span).unwrap();
        host.remove_child(&root, &span).unwrap();

        assert!(host.children(root).is_empty());
        assert_eq!(host.parent(span), None);
        assert!(host.contains(span));
    }

    #[test]
    fn test_listeners_dispatch_in_order_and_detach() {
        let host = MemoryHost::new();
        let button = host.create_element("button").unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));

        let first = log.clone();
        let a = host
            .add_event_listener(&button, "click", Rc::new(move |_: &Event| first.borrow_mut().push("a")))
            .unwrap();
        let second = log.clone();
        host.add_event_listener(&button, "click", Rc::new(move |_: &Event| second.borrow_mut().push("b")))
            .unwrap();

        assert_eq!(host.dispatch(button, &Event::new("click")), 2);
        assert_eq!(host.dispatch(button, &Event::new("input")), 0);
        assert_eq!(*log.borrow(), vec!["a", "b"]);

        host.remove_event_listener(&button, a).unwrap();
        assert_eq!(host.listener_count(button), 1);
        assert!(matches!(
            host.remove_event_listener(&button, a),
            Err(RenderError::UnknownListener(_))
        ));
    }

    #[test]
    fn test_handler_can_mutate_document() {
        let host = Rc::new(MemoryHost::new());
        let root = host.root();
        let button = host.create_element("button").unwrap();
        host.append_child(&root, &button).unwrap();

        let clicks = Rc::new(Cell::new(0));
        let weak = Rc::downgrade(&host);
        let counter = clicks.clone();
        host.add_event_listener(
            &button,
            "click",
            Rc::new(move |_: &Event| {
                counter.set(counter.get() + 1);
                if let Some(host) = weak.upgrade() {
                    let _ = host.set_attribute(&button, "data-clicks", &counter.get().to_string());
                }
            }),
        )
        .unwrap();

        host.dispatch(button, &Event::new("click"));
        host.dispatch(button, &Event::new("click"));
        assert_eq!(host.attribute(button, "data-clicks").as_deref(), Some("2"));
    }

    #[test]
    fn test_html_escaping_and_mutations() {
        let host = MemoryHost::new();
        let root = host.root();
        let a = host.create_element("a").unwrap();
        let before = host.mutation_count();

        host.set_attribute(&a, "title", "say \"hi\" & go").unwrap();
        let t = host.create_text("1 < 2").unwrap();
        host.append_child(&a, &t).unwrap();
        host.append_child(&root, &a).unwrap();

        assert_eq!(host.mutation_count(), before + 3);
        assert_eq!(
            host.to_html(root),
            "<body><a title=\"say &quot;hi&quot; &amp; go\">1 &lt; 2</a></body>"
        );
        assert_eq!(host.find_by_tag("a"), vec![a]);
    }
}
