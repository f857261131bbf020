//! Render Pipeline
//!
//! `Idle → Transpiling → Executing → Materializing → {Success | Failure}`.
//! Every stage is fallible; the first failure short-circuits the cycle and its
//! message becomes the [`RenderResult::Failure`] text unmodified. Nothing
//! escapes [`RenderPipeline::render`] except a [`RenderResult`].
//!
//! Each cycle runs on its own thread with [`RENDER_STACK_SIZE`] of stack, so
//! callers on small stacks get the same depth limits as everyone else.

use oxc_allocator::Allocator;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::materialize::materialize;
use crate::runtime::{Interpreter, Limits};
use crate::transpile::transpile;
use crate::unit::ExecutableUnit;
use crate::view::View;

pub const BINDING_ERROR_MESSAGE: &str = "No valid React component found in the code.";

/// Stack reserved for the render thread. Evaluation recurses on the native
/// stack, bounded by [`RenderOptions::max_call_depth`].
pub const RENDER_STACK_SIZE: usize = 64 * 1024 * 1024;

// ═══════════════════════════════════════════════════════════════════════════════
// TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The transpiler rejected the source.
    #[error("{0}")]
    Transpile(String),
    /// No top-level `Component`, or it is not callable.
    #[error("No valid React component found in the code.")]
    Binding,
    /// A fault raised while executing the unit or rendering the component.
    #[error("{0}")]
    Runtime(String),
    /// The render thread could not be started or did not finish.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "camelCase")]
pub enum RenderResult {
    Success(View),
    Failure(String),
}

impl RenderResult {
    pub fn is_success(&self) -> bool {
        matches!(self, RenderResult::Success(_))
    }

    pub fn view(&self) -> Option<&View> {
        match self {
            RenderResult::Success(view) => Some(view),
            RenderResult::Failure(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            RenderResult::Success(_) => None,
            RenderResult::Failure(message) => Some(message),
        }
    }
}

impl From<Result<View, RenderError>> for RenderResult {
    fn from(result: Result<View, RenderError>) -> Self {
        match result {
            Ok(view) => RenderResult::Success(view),
            Err(error) => RenderResult::Failure(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CycleStage {
    #[default]
    Idle,
    Transpiling,
    Executing,
    Materializing,
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    pub max_call_depth: usize,
    pub max_steps: u64,
    pub max_render_passes: usize,
    pub run_effects: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        let limits = Limits::default();
        Self {
            max_call_depth: limits.max_call_depth,
            max_steps: limits.max_steps,
            max_render_passes: 25,
            run_effects: true,
        }
    }
}

impl RenderOptions {
    pub fn limits(&self) -> Limits {
        Limits {
            max_call_depth: self.max_call_depth,
            max_steps: self.max_steps,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PIPELINE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default)]
pub struct RenderPipeline {
    options: RenderOptions,
    stage: CycleStage,
}

impl RenderPipeline {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            stage: CycleStage::Idle,
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Stage reached by the last cycle (`Success` or `Failure` once finished).
    pub fn stage(&self) -> CycleStage {
        self.stage
    }

    /// Runs one full cycle over `source` on the render thread.
    pub fn render(&mut self, source: &str) -> RenderResult {
        self.stage = CycleStage::Idle;
        let result = std::thread::scope(|scope| {
            let spawned = std::thread::Builder::new()
                .name("render-cycle".to_string())
                .stack_size(RENDER_STACK_SIZE)
                .spawn_scoped(scope, || self.run_cycle(source));
            match spawned {
                Ok(handle) => handle.join().unwrap_or_else(|_| {
                    Err(RenderError::Internal("the render thread panicked".to_string()))
                }),
                Err(e) => Err(RenderError::Internal(e.to_string())),
            }
        });
        match &result {
            Ok(view) => {
                self.enter(CycleStage::Success);
                debug!(nodes = view.nodes.len(), "render cycle succeeded");
            }
            Err(err) => {
                self.enter(CycleStage::Failure);
                error!(error = %err, "Error rendering component");
            }
        }
        RenderResult::from(result)
    }

    fn run_cycle(&mut self, source: &str) -> Result<View, RenderError> {
        self.enter(CycleStage::Transpiling);
        let compiled = transpile(source)?;

        self.enter(CycleStage::Executing);
        let allocator = Allocator::default();
        let unit = ExecutableUnit::construct(&allocator, &compiled)?;
        let mut interp = Interpreter::new(self.options.limits())
            .map_err(|fault| RenderError::Runtime(fault.message()))?;
        let component = unit.run(&mut interp)?;

        self.enter(CycleStage::Materializing);
        let view = materialize(&mut interp, &component, &self.options)
            .map_err(|fault| RenderError::Runtime(fault.message()))?;
        Ok(view)
    }

    fn enter(&mut self, stage: CycleStage) {
        debug!(from = ?self.stage, to = ?stage, "render stage");
        self.stage = stage;
    }
}

/// One-shot render with default options.
pub fn render_component(source: &str) -> RenderResult {
    RenderPipeline::default().render(source)
}

/// One-shot render with explicit options.
pub fn render_with_options(source: &str, options: RenderOptions) -> RenderResult {
    RenderPipeline::new(options).render(source)
}
