#[cfg(test)]
mod tests {
    use crate::pipeline::{
        render_component, render_with_options, CycleStage, RenderOptions, RenderPipeline,
        RenderResult, BINDING_ERROR_MESSAGE,
    };
    use crate::playground::{EditorConfig, Playground};
    use crate::preview::{render_html, render_text, render_tree};
    use crate::source::{SourceBuffer, DEFAULT_COMPONENT_SOURCE};
    use crate::test_support::{render, render_err, render_ok};

    #[test]
    fn test_minimal_component_renders() {
        let view = render_ok("function Component() { return <h1>Hi</h1>; }");
        let h1 = view.find_element("h1").expect("h1");
        assert_eq!(h1.text_content(), "Hi");
        assert_eq!(view.nodes.len(), 1);
    }

    #[test]
    fn test_syntax_error_is_reported_with_file_name() {
        let message = render_err("function Component() { return <h1>Hi</h1 }");
        assert!(
            message.starts_with("component.tsx: "),
            "unexpected message: {}",
            message
        );
    }

    #[test]
    fn test_unterminated_component_fails() {
        let message = render_err("function Component() {");
        assert!(message.len() > "component.tsx: ".len(), "{}", message);
        let html = render_html(&render("function Component() {"));
        assert!(html.starts_with("<pre class=\"text-red-500\">component.tsx: "), "{}", html);
    }

    #[test]
    fn test_other_function_names_are_not_searched() {
        assert_eq!(
            render_err("function NotComponent() { return <div/>; }"),
            BINDING_ERROR_MESSAGE
        );
    }

    #[test]
    fn test_missing_component_binding() {
        let message = render_err("const NotComponent = () => <p>x</p>;");
        assert_eq!(message, BINDING_ERROR_MESSAGE);
        assert_eq!(message, "No valid React component found in the code.");
    }

    #[test]
    fn test_non_callable_component_binding() {
        assert_eq!(render_err("const Component = 42;"), BINDING_ERROR_MESSAGE);
        assert_eq!(render_err(""), BINDING_ERROR_MESSAGE);
    }

    #[test]
    fn test_default_sample_renders_invoice() {
        let view = render_ok(DEFAULT_COMPONENT_SOURCE);
        assert_eq!(view.find_element("h1").map(|h| h.text_content()), Some("Invoice".to_string()));
        assert_eq!(view.count_elements("tr"), 4);
        assert_eq!(view.count_elements("td"), 12);

        let root = view.find_element("div").expect("root div");
        assert!(root
            .attribute("class")
            .unwrap_or_default()
            .starts_with("relative flex min-h-screen"));

        let link = view.find_element("a").expect("billing link");
        assert_eq!(link.attribute("href"), Some("#"));
        assert_eq!(link.text_content(), "Contact our billing department →");

        let text = render_text(&view);
        assert!(text.contains("Logo Design | 1 | $500.00 | $500.00"));
        assert!(text.contains("$1,914.00"));
    }

    #[test]
    fn test_type_annotations_are_erased() {
        let view = render_ok(
            r#"
interface Props { label?: string }
type Pair = [number, number];

function Badge({ label = "none" }: Props): JSX.Element {
  return <b>{label}</b>;
}

function Component() {
  const [count] = useState<number>(2);
  const pair: Pair = [count, count * 2] as Pair;
  const size = (pair.length satisfies number) as unknown as number;
  return <div><Badge label={`${pair[0]}+${pair[1]}`} /><i>{size}</i></div>;
}
"#,
        );
        assert_eq!(view.find_element("b").map(|b| b.text_content()), Some("2+4".to_string()));
        assert_eq!(view.find_element("i").map(|i| i.text_content()), Some("2".to_string()));
    }

    #[test]
    fn test_react_imports_and_exports_are_accepted() {
        let view = render_ok(
            r#"
import React, { useState } from "react";
import type { ReactNode } from "react";

export default function Component() {
  const [name] = React.useState("Ada");
  return <p>Hello {name}</p>;
}
"#,
        );
        assert_eq!(view.text_content(), "Hello Ada");
    }

    #[test]
    fn test_foreign_imports_fail() {
        let message = render_err("import _ from 'lodash';\nfunction Component() { return null; }");
        assert!(message.contains("Cannot import from 'lodash'"), "{}", message);
    }

    #[test]
    fn test_state_update_from_effect_rerenders() {
        let view = render_ok(
            r#"
function Component() {
  const [count, setCount] = useState(0);
  useEffect(() => {
    if (count < 3) setCount(count + 1);
  }, [count]);
  return <span>{count}</span>;
}
"#,
        );
        assert_eq!(view.text_content(), "3");
    }

    #[test]
    fn test_reducer_memo_ref_and_layout_effect() {
        let view = render_ok(
            r#"
function reducer(state, action) {
  return action.type === "inc" ? state + action.by : state;
}

function Component() {
  const [n, dispatch] = useReducer(reducer, 1);
  const doubled = useMemo(() => n * 2, [n]);
  const renders = useRef(0);
  renders.current += 1;
  useLayoutEffect(() => {
    if (n === 1) dispatch({ type: "inc", by: 4 });
  }, [n]);
  return <p>{n}:{doubled}:{renders.current}</p>;
}
"#,
        );
        assert_eq!(view.text_content(), "5:10:2");
    }

    #[test]
    fn test_effects_run_children_first() {
        let view = render_ok(
            r#"
const log = [];

function Child({ name }) {
  useEffect(() => { log.push(name); }, []);
  return <li>{name}</li>;
}

function Component() {
  const [order, setOrder] = useState("");
  useEffect(() => { log.push("parent"); setOrder(log.join(",")); }, []);
  return <ul><Child name="a" /><Child name="b" /><li>{order}</li></ul>;
}
"#,
        );
        assert!(view.text_content().ends_with("a,b,parent"), "{}", view.text_content());
    }

    #[test]
    fn test_setting_state_during_render_fails() {
        let message = render_err(
            r#"
function Component() {
  const [n, setN] = useState(0);
  setN(n + 1);
  return <p>{n}</p>;
}
"#,
        );
        assert!(message.starts_with("Too many re-renders."), "{}", message);
    }

    #[test]
    fn test_infinite_loop_is_stopped() {
        let message = render_err("function Component() { while (true) {} return null; }");
        assert_eq!(message, "Execution step limit exceeded");
    }

    #[test]
    fn test_unbounded_recursion_is_stopped() {
        let message = render_err(
            "function f(n) { return f(n + 1); }\nfunction Component() { return <p>{f(0)}</p>; }",
        );
        assert_eq!(message, "Maximum call stack size exceeded");
    }

    #[test]
    fn test_recursive_components_are_stopped() {
        let message = render_err("function Component() { return <div><Component /></div>; }");
        assert_eq!(message, "Maximum call stack size exceeded");
    }

    #[test]
    fn test_invalid_element_types_fail() {
        let message = render_err(
            "const Missing = undefined;\nfunction Component() { return <div><Missing /></div>; }",
        );
        assert!(
            message.starts_with(
                "Element type is invalid: expected a string (for built-in components) or a class/function (for composite components) but got: undefined."
            ),
            "{}",
            message
        );
        let message = render_err("const Bad = { a: 1 };\nfunction Component() { return <Bad />; }");
        assert!(message.ends_with("but got: object with keys {a}."), "{}", message);
    }

    #[test]
    fn test_recursion_is_safe_on_small_stacks() {
        let source = "function f(n) { return n <= 0 ? 0 : 1 + f(n - 1); }\nfunction Component() { return <div>{f(120)}</div>; }";
        let result = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(move || render_component(source))
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(result.view().map(|v| v.text_content()), Some("120".to_string()));

        let mut playground = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(|| {
                let mut playground = Playground::default();
                playground.set_text("function f(n) { return f(n + 1); }\nfunction Component() { return <p>{f(0)}</p>; }");
                playground
            })
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(
            playground.result().error_message(),
            Some("Maximum call stack size exceeded")
        );
        assert!(playground.set_text("function Component() { return <p />; }").is_success());
    }

    #[test]
    fn test_deeply_nested_children_fail() {
        let message = render_err(
            "function Component() { let a = []; for (let i = 0; i < 200000; i++) a = [a]; return <div>{a}</div>; }",
        );
        assert_eq!(message, "Maximum call stack size exceeded");
    }

    #[test]
    fn test_deep_values_are_torn_down() {
        let view = render_ok(
            r#"
function Component() {
  let a = [];
  let o = {};
  for (let i = 0; i < 150000; i++) {
    a = [a];
    o = { o };
  }
  return <p>ok</p>;
}
"#,
        );
        assert_eq!(view.text_content(), "ok");
    }

    #[test]
    fn test_explicit_options_apply() {
        let options = RenderOptions {
            max_call_depth: 4,
            ..RenderOptions::default()
        };
        let source = "function f(n) { return n <= 0 ? 0 : 1 + f(n - 1); }\nfunction Component() { return <i>{f(10)}</i>; }";
        assert_eq!(
            render_with_options(source, options),
            RenderResult::Failure("Maximum call stack size exceeded".to_string())
        );
        assert!(render_with_options(source, RenderOptions::default()).is_success());
    }

    #[test]
    fn test_tree_outline_of_rendered_view() {
        let view = render_ok(
            "function Component() { return <ul className=\"list\"><li>a</li><li>b</li></ul>; }",
        );
        assert_eq!(
            render_tree(&view),
            "<ul class=\"list\">\n  <li>\n    \"a\"\n  <li>\n    \"b\"\n"
        );
    }

    #[test]
    fn test_thrown_errors_become_failures() {
        assert_eq!(
            render_err("function Component() { throw new Error('boom'); }"),
            "boom"
        );
        assert_eq!(render_err("function Component() { throw 'plain'; }"), "plain");
    }

    #[test]
    fn test_undefined_reference_fails() {
        let message = render_err("function Component() { return <Missing />; }");
        assert_eq!(message, "Missing is not defined");
    }

    #[test]
    fn test_render_is_idempotent() {
        let source = "function Component() { const [n] = useState(1); return <p title=\"t\">{n}</p>; }";
        assert_eq!(render(source), render(source));
        assert_eq!(render(DEFAULT_COMPONENT_SOURCE), render(DEFAULT_COMPONENT_SOURCE));
    }

    #[test]
    fn test_cycle_stage_tracks_outcome() {
        let mut pipeline = RenderPipeline::default();
        assert_eq!(pipeline.stage(), CycleStage::Idle);
        pipeline.render("function Component() { return null; }");
        assert_eq!(pipeline.stage(), CycleStage::Success);
        pipeline.render("function Component( {");
        assert_eq!(pipeline.stage(), CycleStage::Failure);
    }

    #[test]
    fn test_step_budget_is_configurable() {
        let options = RenderOptions {
            max_steps: 50,
            ..RenderOptions::default()
        };
        let result = RenderPipeline::new(options).render(
            "function Component() { let s = 0; for (let i = 0; i < 1000; i++) s += i; return <p>{s}</p>; }",
        );
        assert_eq!(
            result,
            RenderResult::Failure("Execution step limit exceeded".to_string())
        );
    }

    #[test]
    fn test_playground_follows_submission_order() {
        let mut playground = Playground::default();
        assert!(playground.result().is_success());

        playground.on_change("function Component() { return <p>first</p>; }");
        playground.on_change("function Component() { return <p>second</p>; }");
        assert_eq!(
            playground.result().view().map(|v| v.text_content()),
            Some("second".to_string())
        );
        assert_eq!(playground.revision(), 2);

        // A failure replaces the last good view.
        playground.on_change("function Component() { return <p>; }");
        assert!(playground.result().view().is_none());
        assert!(playground
            .result()
            .error_message()
            .unwrap_or_default()
            .starts_with("component.tsx: "));
    }

    #[test]
    fn test_playground_commit_rerenders_current_text() {
        struct Fixed(&'static str);
        impl crate::playground::TextSurface for Fixed {
            fn value(&self) -> String {
                self.0.to_string()
            }
        }

        let mut playground = Playground::with_source(
            SourceBuffer::new("const Component = 1;"),
            RenderOptions::default(),
            EditorConfig::default(),
        );
        assert_eq!(
            playground.result().error_message(),
            Some(BINDING_ERROR_MESSAGE)
        );
        playground.commit(&Fixed("function Component() { return <em>ok</em>; }"));
        assert_eq!(playground.text(), "function Component() { return <em>ok</em>; }");
        assert!(playground.result().is_success());
    }

    #[test]
    fn test_preview_html_for_results() {
        let ok = render("function Component() { return <p className=\"x\">a &amp; b</p>; }");
        assert_eq!(
            render_html(&ok),
            "<div class=\"preview-surface\" style=\"overflow: auto\"><p class=\"x\">a &amp; b</p></div>"
        );
        let failed = render("const Nope = 1;");
        assert_eq!(
            render_html(&failed),
            "<pre class=\"text-red-500\">No valid React component found in the code.</pre>"
        );
    }

    #[test]
    fn test_result_serializes_with_status_tag() {
        let failed = RenderResult::Failure("boom".to_string());
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["value"], "boom");
    }
}
