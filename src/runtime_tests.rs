#[cfg(test)]
mod tests {
    use crate::test_support::{render_err, render_ok};
    use crate::view::View;

    /// Renders `function Component() { <body> }`.
    fn component(body: &str) -> View {
        render_ok(&format!("function Component() {{\n{}\n}}", body))
    }

    fn text(body: &str) -> String {
        component(body).text_content()
    }

    #[test]
    fn test_arithmetic_and_coercion() {
        assert_eq!(
            text(r#"return <p>{1 + 2 * 3}|{"a" + 1}|{10 / 4}|{7 % 3}|{2 ** 10}|{"5" * "2"}</p>;"#),
            "7|a1|2.5|1|1024|10"
        );
        assert_eq!(
            text(r#"return <p>{String(0.1 + 0.2)}|{String(1 / 0)}|{String(-0)}|{String(NaN)}</p>;"#),
            "0.30000000000000004|Infinity|0|NaN"
        );
    }

    #[test]
    fn test_equality_and_logic() {
        assert_eq!(
            text(
                r#"
const values = [1 == "1", 1 === "1", null == undefined, null === undefined, NaN === NaN];
const fallback = null ?? "dflt";
const zero = 0 || "or";
return <p>{values.map(String).join(",")}|{fallback}|{zero}</p>;"#
            ),
            "true,false,true,false,false|dflt|or"
        );
    }

    #[test]
    fn test_template_literals_and_string_methods() {
        assert_eq!(
            text(
                r#"
const name = "  ada lovelace ";
const words = name.trim().split(" ").map((w) => w[0].toUpperCase() + w.slice(1));
return <p>{`Hi ${words.join(" ")}!`}|{"abc".padStart(5, "*")}|{"a-b-c".replaceAll("-", "+")}</p>;"#
            ),
            "Hi Ada Lovelace!|**abc|a+b+c"
        );
    }

    #[test]
    fn test_array_methods() {
        assert_eq!(
            text(
                r#"
const nums = [5, 1, 4, 2, 3];
const sorted = [...nums].sort((a, b) => a - b);
const total = nums.map((x) => x * 2).filter((x) => x > 4).reduce((a, b) => a + b, 0);
const found = nums.find((x) => x > 3);
return <p>{sorted.join("-")}|{total}|{found}|{nums.indexOf(4)}|{[[1, 2], [3]].flat().length}</p>;"#
            ),
            "1-2-3-4-5|24|5|2|3"
        );
    }

    #[test]
    fn test_default_sort_is_lexicographic() {
        assert_eq!(text(r#"return <p>{[10, 9, 1].sort().join(",")}</p>;"#), "1,10,9");
    }

    #[test]
    fn test_objects_spread_and_destructuring() {
        assert_eq!(
            text(
                r#"
const base = { a: 1, b: 2 };
const { a, ...rest } = { ...base, c: 3 };
const [first, , third = "t"] = ["x", "y"];
const key = "dyn";
const computed = { [key + "amic"]: true };
return <p>{a}|{Object.keys(rest).join(",")}|{first}{third}|{String(computed.dynamic)}</p>;"#
            ),
            "1|b,c|xt|true"
        );
    }

    #[test]
    fn test_closures_and_loops() {
        assert_eq!(
            text(
                r#"
function counter() {
  let n = 0;
  return () => ++n;
}
const next = counter();
next();
next();
const fns = [];
for (let i = 0; i < 3; i++) fns.push(() => i);
let out = "";
for (const k in { x: 1, y: 2 }) out += k;
for (const v of [7, 8]) out += v;
let w = 0;
do { w++; } while (w < 4);
return <p>{next()}|{fns.map((f) => f()).join("")}|{out}|{w}</p>;"#
            ),
            "3|012|xy78|4"
        );
    }

    #[test]
    fn test_switch_and_labels() {
        assert_eq!(
            text(
                r#"
function grade(score) {
  switch (true) {
    case score >= 90: return "A";
    case score >= 80: return "B";
    default: return "C";
  }
}
let hits = 0;
outer: for (let i = 0; i < 3; i++) {
  for (let j = 0; j < 3; j++) {
    if (j === 1) continue outer;
    if (i === 2) break outer;
    hits++;
  }
}
return <p>{grade(95)}{grade(85)}{grade(10)}|{hits}</p>;"#
            ),
            "ABC|2"
        );
    }

    #[test]
    fn test_try_catch_finally() {
        assert_eq!(
            text(
                r#"
let log = "";
try {
  const value = null;
  value.missing;
} catch (e) {
  log += e instanceof TypeError ? "T" : "?";
} finally {
  log += "F";
}
try {
  throw new RangeError("bad");
} catch ({ name, message }) {
  log += `|${name}:${message}`;
}
return <p>{log}</p>;"#
            ),
            "TF|RangeError:bad"
        );
    }

    #[test]
    fn test_typeof() {
        assert_eq!(
            text(
                r#"return <p>{[typeof undeclared, typeof 1, typeof "s", typeof (() => 1), typeof null, typeof {}, typeof [], typeof undefined].join(",")}</p>;"#
            ),
            "undefined,number,string,function,object,object,object,undefined"
        );
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(
            text(
                r#"
const price = 1740;
return <p>{(3.14159).toFixed(2)}|{price.toLocaleString()}|{price.toLocaleString("en-US", { style: "currency", currency: "USD" })}|{(255).toString(16)}</p>;"#
            ),
            "3.14|1,740|$1,740.00|ff"
        );
    }

    #[test]
    fn test_replace_with_empty_pattern_and_callback() {
        assert_eq!(
            text(
                r#"
const all = "abc".replaceAll("", "-");
const once = "abc".replace("", "-");
const called = "a-b-a".replaceAll("a", (match, offset, whole) => match.toUpperCase() + offset + whole.length);
return <p>{all}|{once}|{called}</p>;"#
            ),
            "-a-b-c-|-abc|A05-b-A45"
        );
    }

    #[test]
    fn test_to_fixed_rounds_ties_up() {
        assert_eq!(
            text(
                r#"
const fixed = [(2.5).toFixed(0), (0.125).toFixed(2), (0.25).toFixed(1), (9.5).toFixed(0), (-2.5).toFixed(0), (1.005).toFixed(2), (0).toFixed(2)];
return <p>{fixed.join(" ")}|{(0.125).toLocaleString("en-US", { maximumFractionDigits: 2 })}</p>;"#
            ),
            "3 0.13 0.3 10 -3 1.00 0.00|0.13"
        );
    }

    #[test]
    fn test_elements_compare_by_identity() {
        assert_eq!(
            text(
                r#"
const el = <b />;
const same = [el === el, el === <b />, [el].includes(el), [el].indexOf(<b />)];
return <p>{same.map(String).join(",")}</p>;"#
            ),
            "true,false,true,-1"
        );
    }

    #[test]
    fn test_oversized_strings_fail() {
        assert_eq!(
            render_err(r#"function Component() { return <p>{"ab".repeat(2 ** 62)}</p>; }"#),
            "Invalid string length"
        );
        assert_eq!(
            render_err(r#"function Component() { return <p>{"x".padStart(2 ** 40, "-")}</p>; }"#),
            "Invalid string length"
        );
        assert_eq!(
            text(r#"try { "ab".repeat(2 ** 62); } catch (e) { return <p>{e.name}</p>; }"#),
            "RangeError"
        );
    }

    #[test]
    fn test_oversized_arrays_fail() {
        assert_eq!(
            render_err("function Component() { return <p>{Array.from({ length: 2 ** 62 }).length}</p>; }"),
            "Invalid array length"
        );
        assert_eq!(
            render_err("function Component() { const a = []; a[2 ** 31] = 1; return null; }"),
            "Invalid array length"
        );
        assert_eq!(
            render_err("function Component() { const a = []; a.length = 2 ** 33; return null; }"),
            "Invalid array length"
        );
    }

    #[test]
    fn test_native_iteration_counts_against_step_budget() {
        assert_eq!(
            render_err("function Component() { return <p>{Array.from({ length: 1e8 }).length}</p>; }"),
            "Execution step limit exceeded"
        );
        assert_eq!(
            render_err(
                "function Component() { let a = [1, 2, 3, 4, 5, 6, 7, 8]; for (let i = 0; i < 40; i++) a = a.concat(a); return null; }"
            ),
            "Execution step limit exceeded"
        );
    }

    #[test]
    fn test_deeply_nested_arrays() {
        let nest = "let a = []; for (let i = 0; i < 5000; i++) a = [a];";
        assert_eq!(
            render_err(&format!("function Component() {{ {} return <p>{{String(a)}}</p>; }}", nest)),
            "Maximum call stack size exceeded"
        );
        assert_eq!(
            render_err(&format!("function Component() {{ {} return <p>{{a.flat(Infinity).length}}</p>; }}", nest)),
            "Maximum call stack size exceeded"
        );
        assert_eq!(
            render_err(&format!("function Component() {{ {} return <p>{{JSON.stringify(a)}}</p>; }}", nest)),
            "Converting circular structure to JSON"
        );
    }

    #[test]
    fn test_self_referencing_array_joins_empty() {
        assert_eq!(
            text(r#"const a = [1]; a.push(a); return <p>{a.join()}|{String([a, 2])}</p>;"#),
            "1,|1,,2"
        );
    }

    #[test]
    fn test_json_stringify() {
        assert_eq!(
            text(r#"return <pre>{JSON.stringify({ a: [1, "x", null], b: undefined, c: true })}</pre>;"#),
            r#"{"a":[1,"x",null],"c":true}"#
        );
    }

    #[test]
    fn test_classes_are_rejected() {
        let message = render_err("class Component {}");
        assert!(message.contains("not supported"), "{}", message);
    }

    #[test]
    fn test_calling_a_non_function_names_the_callee() {
        let message = render_err("function Component() { const user = {}; return user.name(); }");
        assert_eq!(message, "user.name is not a function");
    }

    #[test]
    fn test_const_reassignment_fails() {
        let message = render_err("function Component() { const a = 1; a = 2; return null; }");
        assert_eq!(message, "Assignment to constant variable.");
    }

    // ─── rendering semantics ──────────────────────────────────────────────────

    #[test]
    fn test_lists_conditionals_and_fragments() {
        let view = component(
            r#"
const items = ["a", "b", "c"];
return (
  <>
    <ul>{items.map((x) => <li key={x}>{x}</li>)}</ul>
    {false && <b>hidden</b>}
    {null}
    {undefined}
    {0}
    {items.length > 2 ? <em>many</em> : <em>few</em>}
  </>
);"#,
        );
        assert_eq!(view.count_elements("li"), 3);
        assert_eq!(view.count_elements("b"), 0);
        assert_eq!(view.text_content(), "abc0many");
        assert_eq!(view.nodes.len(), 3);
    }

    #[test]
    fn test_props_children_and_defaults() {
        let view = render_ok(
            r#"
function Card({ title = "Untitled", children, ...rest }) {
  return <section title={title} {...rest}><h2>{title}</h2>{children}</section>;
}

const Component = () => (
  <div>
    <Card data-id="1">first</Card>
    <Card title="Second" aria-hidden={true}><i>x</i><i>y</i></Card>
  </div>
);
"#,
        );
        assert_eq!(view.count_elements("section"), 2);
        let first = view.find_element("section").expect("section");
        assert_eq!(first.attribute("title"), Some("Untitled"));
        assert_eq!(first.attribute("data-id"), Some("1"));
        assert_eq!(view.text_content(), "UntitledfirstSecondxy");
        assert_eq!(view.count_elements("i"), 2);
    }

    #[test]
    fn test_style_and_boolean_attributes() {
        let view = component(
            r#"return <input type="checkbox" checked={true} disabled={false} readOnly style={{ fontSize: 12, marginTop: "1rem", opacity: 0.5 }} onChange={() => {}} />;"#,
        );
        let input = view.find_element("input").expect("input");
        assert_eq!(input.attribute("type"), Some("checkbox"));
        assert_eq!(input.attribute("checked"), Some(""));
        assert_eq!(input.attribute("disabled"), None);
        assert_eq!(input.attribute("readonly"), Some(""));
        assert_eq!(input.attribute("onChange"), None);
        assert_eq!(
            input.attribute("style"),
            Some("font-size: 12px; margin-top: 1rem; opacity: 0.5")
        );
    }

    #[test]
    fn test_objects_are_not_valid_children() {
        let message = render_err("function Component() { return <p>{{ a: 1, b: 2 }}</p>; }");
        assert!(
            message.starts_with("Objects are not valid as a React child (found: object with keys {a, b})"),
            "{}",
            message
        );
    }

    #[test]
    fn test_void_elements_reject_children() {
        let message = render_err("function Component() { return <br>text</br>; }");
        assert!(message.starts_with("br is a void element tag"), "{}", message);
    }

    #[test]
    fn test_hook_names_can_be_shadowed() {
        assert_eq!(
            text(
                r#"
const useState = (v) => [v + "!", () => {}];
const [v] = useState("shadow");
return <p>{v}</p>;"#
            ),
            "shadow!"
        );
    }

    #[test]
    fn test_callbacks_keep_identity_between_renders() {
        assert_eq!(
            text(
                r#"
const [seen, setSeen] = useState([]);
const cb = useCallback(() => 1, []);
const first = useRef(cb);
useEffect(() => {
  if (seen.length < 2) setSeen([...seen, first.current === cb]);
});
return <p>{seen.map(String).join(",")}</p>;"#
            ),
            "true,true"
        );
    }

    #[test]
    fn test_effect_cleanup_runs_before_rerun() {
        let view = render_ok(
            r#"
const log = [];
function Component() {
  const [n, setN] = useState(0);
  useEffect(() => {
    log.push("run" + n);
    if (n < 2) setN(n + 1);
    return () => log.push("clean" + n);
  }, [n]);
  return <p>{n === 2 ? log.join(",") : "pending"}</p>;
}
"#,
        );
        assert_eq!(view.text_content(), "run0,clean0,run1");
    }

    #[test]
    fn test_hooks_outside_components_fail() {
        let message = render_err("useState(0);\nfunction Component() { return null; }");
        assert!(message.starts_with("Invalid hook call."), "{}", message);
    }
}
