//! Playground
//!
//! Composes the source buffer, the render pipeline and the latest result. An
//! editing surface reports changes through [`Playground::on_change`]; a preview
//! surface reads [`Playground::result`]. Each change runs one full cycle before
//! returning, so results always follow submission order.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::pipeline::{RenderOptions, RenderPipeline, RenderResult};
use crate::source::SourceBuffer;

/// One-time configuration of the text editing surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    pub language: String,
    pub jsx_factory: String,
    pub tab_width: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            language: "typescript".to_string(),
            jsx_factory: "React.createElement".to_string(),
            tab_width: 2,
        }
    }
}

/// A text editing surface the playground can read on demand.
pub trait TextSurface {
    /// The live buffer contents.
    fn value(&self) -> String;
}

pub struct Playground {
    buffer: SourceBuffer,
    pipeline: RenderPipeline,
    result: RenderResult,
    editor: EditorConfig,
}

impl Default for Playground {
    fn default() -> Self {
        Self::new(RenderOptions::default(), EditorConfig::default())
    }
}

impl Playground {
    /// Starts on the default sample and renders it once.
    pub fn new(options: RenderOptions, editor: EditorConfig) -> Self {
        Self::with_source(SourceBuffer::default(), options, editor)
    }

    pub fn with_source(buffer: SourceBuffer, options: RenderOptions, editor: EditorConfig) -> Self {
        let mut pipeline = RenderPipeline::new(options);
        let result = pipeline.render(buffer.text());
        Self {
            buffer,
            pipeline,
            result,
            editor,
        }
    }

    pub fn text(&self) -> &str {
        self.buffer.text()
    }

    pub fn revision(&self) -> u64 {
        self.buffer.revision()
    }

    pub fn result(&self) -> &RenderResult {
        &self.result
    }

    pub fn editor_config(&self) -> &EditorConfig {
        &self.editor
    }

    /// Replaces the source and re-renders. A failure replaces the previous
    /// view; nothing of the last success is kept.
    pub fn set_text(&mut self, text: impl Into<String>) -> &RenderResult {
        self.buffer.set_text(text);
        debug!(revision = self.buffer.revision(), "source changed");
        self.result = self.pipeline.render(self.buffer.text());
        &self.result
    }

    /// Change notification from the editing surface.
    pub fn on_change(&mut self, text: &str) -> &RenderResult {
        self.set_text(text)
    }

    /// Manual commit: re-asserts the surface's current value as the source.
    pub fn commit(&mut self, surface: &dyn TextSurface) -> &RenderResult {
        self.set_text(surface.value())
    }
}
