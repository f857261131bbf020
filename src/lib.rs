//! # Component Playground
//!
//! Live preview for a single TSX component. Source text goes through one
//! render cycle per change:
//!
//! 1. **Transpile** (`transpile`): oxc parses the TSX, imports and exports are
//!    stripped, JSX is lowered to `React.createElement` calls, and types are
//!    erased. Syntax errors surface as `component.tsx: <message> (line:col)`.
//! 2. **Construct** (`unit`): the compiled code is wrapped in a function whose
//!    only parameter is `React` and parsed again as a script.
//! 3. **Execute** (`runtime`): a tree-walking interpreter runs the unit and
//!    extracts the top-level `Component` binding. A missing or non-callable
//!    binding fails with "No valid React component found in the code.".
//! 4. **Materialize** (`materialize`): the component is called, hooks are
//!    resolved against per-instance slots, effects run after commit, and the
//!    element tree becomes an owned [`View`].
//!
//! The cycle returns a [`RenderResult`]; nothing else escapes it. Hosts show
//! the result through `preview` (HTML or terminal text).

#[cfg(feature = "napi")]
mod bridge;

mod jsx_lowerer;
mod materialize;
mod pipeline;
mod playground;
mod preview;
mod runtime;
mod source;
mod transpile;
mod unit;
mod view;

pub mod ui;

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod lowering_tests;
#[cfg(test)]
mod pipeline_tests;
#[cfg(test)]
mod runtime_tests;

#[cfg(feature = "napi")]
pub use bridge::{
    default_component_source_native, editor_config_native, render_component_native,
    render_view_native, PreviewPayload,
};

pub use pipeline::{
    render_component, render_with_options, CycleStage, RenderError, RenderOptions, RenderPipeline,
    RenderResult, BINDING_ERROR_MESSAGE, RENDER_STACK_SIZE,
};
pub use playground::{EditorConfig, Playground, TextSurface};
pub use preview::{render_html, render_text, render_tree, view_to_html};
pub use runtime::Limits;
pub use source::{SourceBuffer, DEFAULT_COMPONENT_SOURCE};
pub use transpile::{transpile, CompiledUnit, VIRTUAL_FILE_NAME};
pub use view::{Attribute, ElementNode, TextNode, View, ViewNode};
