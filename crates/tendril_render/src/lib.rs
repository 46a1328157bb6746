//! Tendril Render Engine
//!
//! Turns immutable plan trees into live instances bound to a host surface
//! and keeps them in sync with reactive streams.
//!
//! - **Plans**: text, element and lazy descriptions of UI structure
//! - **Instances**: rendered nodes plus the cleanup for every binding
//! - **Renderer**: materializes plans against a [`Host`]
//! - **Lazy reconciliation**: subtrees whose shape changes over time
//! - **MemoryHost**: a headless document tree implementing [`Host`]
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//! use tendril_core::{Source, StreamExt};
//! use tendril_render::prelude::*;
//!
//! let host = Rc::new(MemoryHost::new());
//! let count = Source::with_value(0u32);
//!
//! let plan: Plan = element("div")
//!     .child(text("Count: "))
//!     .child(reactive_text(count.stream().map(|n| n.to_string())))
//!     .into();
//!
//! let instance = render(&host, &plan, &host.root()).unwrap();
//! count.emit(3);
//! assert_eq!(host.to_html(host.root()), "<body><div>Count: 3</div></body>");
//!
//! instance.cleanup();
//! assert_eq!(count.subscriber_count(), 0);
//! ```

pub mod config;
pub mod error;
pub mod host;
pub mod instance;
pub mod lazy;
pub mod memory;
pub mod plan;
pub mod render;

pub use config::{RenderConfig, ReplaceStrategy};
pub use error::{RenderError, Result};
pub use host::{Event, EventHandler, Host, ListenerId};
pub use instance::{
    Cleanup, ElementInstance, Instance, LazyInstance, NodeInstance, TextInstance, TextKind,
};
pub use lazy::Transition;
pub use memory::{MemoryHost, NodeId};
pub use plan::{
    element, lazy, reactive_text, text, Component, ElementPlan, LazyPlan, NodePlan, Plan,
    PlanKind, TextPlan,
};
pub use render::{render, Renderer};

/// Common imports for building and rendering plans
pub mod prelude {
    pub use crate::config::{RenderConfig, ReplaceStrategy};
    pub use crate::host::{Event, Host};
    pub use crate::instance::Instance;
    pub use crate::memory::MemoryHost;
    pub use crate::plan::{
        element, lazy, reactive_text, text, Component, ElementPlan, NodePlan, Plan, TextPlan,
    };
    pub use crate::render::{render, Renderer};
}
