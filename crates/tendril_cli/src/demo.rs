//! Demo trees rendered headlessly into a [`MemoryHost`]
//!
//! Each demo owns its reactive state, drives it the way a user would, and
//! returns the serialized document after every step.

use std::rc::Rc;

use anyhow::{Context, Result};
use tendril_core::{BoxStream, Source, StreamExt};
use tendril_render::prelude::*;

/// Props for [`Counter`]
pub struct CounterProps {
    pub count: BoxStream<u32>,
    pub increment: Rc<dyn Fn()>,
}

/// A "+1" button followed by the current count
pub struct Counter;

impl Component for Counter {
    type Props = CounterProps;

    fn plan(props: CounterProps) -> Plan {
        let CounterProps { count, increment } = props;

        element("div")
            .child(
                element("button")
                    .attr("type", "button")
                    .on("click", move |_| increment())
                    .child(text("+1")),
            )
            .child(text(" "))
            .child(reactive_text(count.map(|count| format!("Count is: {count}"))))
            .into()
    }
}

/// Render the counter, click its button `clicks` times and snapshot each state
pub fn run_counter(config: &RenderConfig, clicks: u32) -> Result<Vec<String>> {
    let host = Rc::new(MemoryHost::new());
    let root = host.root();
    let count = Source::with_value(0u32);

    let increment = {
        let count = count.clone();
        Rc::new(move || count.update(|n| n + 1))
    };
    let plan = Counter::plan(CounterProps {
        count: count.stream(),
        increment,
    });

    let renderer = Renderer::with_config(host.clone(), config.clone());
    let instance = renderer.render(&plan, &root).context("Failed to render counter")?;

    let button = host
        .find_by_tag("button")
        .first()
        .copied()
        .context("Counter has no button")?;

    let mut snapshots = vec![host.to_html(root)];
    for click in 1..=clicks {
        let handled = host.dispatch(button, &Event::new("click"));
        tracing::debug!(click, handled, "clicked");
        snapshots.push(host.to_html(root));
    }

    instance
        .unmount(&*host, &root)
        .context("Failed to unmount counter")?;
    tracing::info!(
        clicks,
        subscribers = count.subscriber_count(),
        listeners = host.listener_count(button),
        "counter released"
    );

    Ok(snapshots)
}

/// Lazy subtree alternating between a constant text and a `span`
pub fn toggle_plan(open: BoxStream<bool>, step: BoxStream<u32>) -> Plan {
    let content = open.map(move |open| -> NodePlan {
        if *open {
            element("span")
                .attr("class", "open")
                .child(reactive_text(step.map(|step| format!("step {step}"))))
                .into()
        } else {
            text("closed").into()
        }
    });

    element("p")
        .child(text("["))
        .child(lazy(content))
        .child(text("]"))
        .into()
}

/// Flip the toggle `steps` times and snapshot each state
pub fn run_toggle(config: &RenderConfig, steps: u32) -> Result<Vec<String>> {
    let host = Rc::new(MemoryHost::new());
    let root = host.root();
    let open = Source::with_value(false);
    let step = Source::with_value(0u32);

    let renderer = Renderer::with_config(host.clone(), config.clone());
    let instance = renderer
        .render(&toggle_plan(open.stream(), step.stream()), &root)
        .context("Failed to render toggle")?;

    let mut snapshots = vec![host.to_html(root)];
    for n in 1..=steps {
        step.emit(n);
        open.update(|open| !open);
        snapshots.push(host.to_html(root));
    }

    instance
        .unmount(&*host, &root)
        .context("Failed to unmount toggle")?;
    tracing::info!(
        steps,
        plan_subscribers = open.subscriber_count(),
        step_subscribers = step.subscriber_count(),
        "toggle released"
    );

    Ok(snapshots)
}
