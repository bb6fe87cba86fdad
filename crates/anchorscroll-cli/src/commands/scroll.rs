use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Result};
use tokio::sync::mpsc;
use tracing::info;

use anchorscroll_core::{AnchorConfig, AnchorEngine, AnchorEvent, AnchorOptions, Axis, Coordinates};

use crate::layout::{Document, Layout};

pub async fn run(config: &AnchorConfig, layout: Option<&Path>, step: f64, interval_ms: u64) -> Result<()> {
    if step <= 0.0 {
        bail!("--step must be positive, got {step}");
    }

    let layout = Layout::load(layout)?;
    let mut document = Document::build(&layout);

    let (tx, mut events) = mpsc::unbounded_channel();
    let options = AnchorOptions::new(config.clone())
        .with_on_anchor_reached_y(|name| println!("reached {name}"))
        .with_event_sender(tx);
    let engine = AnchorEngine::new(&document.viewport, options);
    let forwarding = document.connect(&engine)?;

    let max_offset = layout.max_offset();
    info!(
        sections = layout.sections.len(),
        max_offset,
        step,
        interval_ms,
        "Scrolling through document"
    );

    let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms.max(1)));
    let mut offset = 0.0;
    let mut scroll_events = 0u32;
    loop {
        ticker.tick().await;
        document.viewport.set_offset(Coordinates::new(0.0, offset));
        scroll_events += 1;

        if offset >= max_offset {
            break;
        }
        offset = (offset + step).min(max_offset);
    }

    // Let the last detection pass finish.
    tokio::time::sleep(config.throttle_window()).await;
    forwarding.abort();

    let mut reached = 0u32;
    while let Ok(event) = events.try_recv() {
        if matches!(event, AnchorEvent::AnchorReached { axis: Axis::Y, .. }) {
            reached += 1;
        }
    }

    println!(
        "{} scroll events, {} reached-anchor notifications, final offset {}",
        scroll_events,
        reached,
        engine.scroll_offset()
    );

    Ok(())
}
