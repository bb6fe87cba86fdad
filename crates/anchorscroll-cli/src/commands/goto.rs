use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use anchorscroll_core::{AnchorConfig, AnchorEngine, AnchorOptions, ScrollEvent};

use crate::layout::{Document, Layout};

pub async fn run(config: &AnchorConfig, layout: Option<&Path>, name: &str, suppress_ms: u64) -> Result<()> {
    let layout = Layout::load(layout)?;
    let mut document = Document::build(&layout);

    let options = AnchorOptions::new(config.clone()).with_on_anchor_reached_y(|name| println!("reached {name}"));
    let engine = AnchorEngine::new(&document.viewport, options);
    let forwarding = document.connect(&engine)?;

    // Keep the jump itself from reporting every anchor it passes.
    engine.timeout_on_scroll(suppress_ms)?;
    engine
        .scroll_to(name)
        .await
        .with_context(|| format!("Cannot navigate to {name}"))?;

    tokio::time::sleep(Duration::from_millis(suppress_ms + 10)).await;
    let offset = engine.scroll_offset();
    info!(anchor = name, %offset, "Navigation finished");
    println!("{name} -> offset {offset}");

    // Suppression is over: the next scroll event reports where we landed.
    engine.on_scroll(ScrollEvent { offset });
    tokio::time::sleep(Duration::from_millis(10)).await;
    forwarding.abort();

    Ok(())
}
