//! Document layouts for the simulated viewport.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use anchorscroll_core::sim::{SimAnchor, SimViewport};
use anchorscroll_core::{AnchorEngine, Coordinates, ScrollEvent};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layout {
    /// Visible height of the viewport
    #[serde(default = "default_viewport_height")]
    pub viewport_height: f64,
    #[serde(default)]
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub height: f64,
}

fn default_viewport_height() -> f64 {
    600.0
}

impl Default for Layout {
    /// Twenty sections of uneven height
    fn default() -> Self {
        let sections = (0..20)
            .map(|i| Section {
                name: format!("anchor{i}"),
                height: 120.0 + ((i * 73) % 200) as f64,
            })
            .collect();

        Self {
            viewport_height: default_viewport_height(),
            sections,
        }
    }
}

impl Layout {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read layout {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid layout {}", path.display()))
    }

    pub fn content_height(&self) -> f64 {
        self.sections.iter().map(|s| s.height).sum()
    }

    /// Largest offset the viewport can scroll to
    pub fn max_offset(&self) -> f64 {
        (self.content_height() - self.viewport_height).max(0.0)
    }
}

/// A laid-out document: viewport plus one mounted anchor per section
pub struct Document {
    pub viewport: Arc<SimViewport>,
    pub anchors: Vec<(String, Arc<SimAnchor>)>,
    /// Scroll events published by the viewport, until connected to an engine
    scroll_events: Option<mpsc::UnboundedReceiver<ScrollEvent>>,
}

impl Document {
    pub fn build(layout: &Layout) -> Self {
        let (tx, scroll_events) = mpsc::unbounded_channel();
        let viewport = Arc::new(SimViewport::new(Coordinates::new(0.0, 48.0)).with_scroll_events(tx));

        let mut top = 0.0;
        let anchors = layout
            .sections
            .iter()
            .map(|section| {
                let anchor = SimAnchor::new(&viewport, Coordinates::new(0.0, top));
                top += section.height;
                (section.name.clone(), anchor)
            })
            .collect();

        Self {
            viewport,
            anchors,
            scroll_events: Some(scroll_events),
        }
    }

    /// Register every section with `engine` and forward the viewport's
    /// scroll events to it, the way a host wires its scroll handler
    pub fn connect(&mut self, engine: &AnchorEngine) -> Result<JoinHandle<()>> {
        for (name, anchor) in &self.anchors {
            engine
                .register(name.as_str(), anchor)
                .with_context(|| format!("Failed to register {name}"))?;
        }

        let Some(mut events) = self.scroll_events.take() else {
            bail!("Document is already connected to an engine");
        };
        let engine = engine.clone();
        Ok(tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                engine.on_scroll(event);
            }
        }))
    }
}
