//! Helpers shared by the test modules.

use crate::pipeline::{render_component, RenderResult};

pub fn render(source: &str) -> RenderResult {
    render_component(source)
}

pub fn render_ok(source: &str) -> crate::view::View {
    match render(source) {
        RenderResult::Success(view) => view,
        RenderResult::Failure(message) => panic!("expected success, got failure: {}", message),
    }
}

pub fn render_err(source: &str) -> String {
    match render(source) {
        RenderResult::Success(view) => panic!("expected failure, got {:?}", view),
        RenderResult::Failure(message) => message,
    }
}
