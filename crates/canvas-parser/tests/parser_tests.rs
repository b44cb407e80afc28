//! Parser tests: modules, imports/exports, statements, expressions,
//! JSX elements, error reporting and determinism.

use canvas_parser::{parse_source, ParseResult};
use canvas_types::ast::*;
use canvas_types::{ErrorCode, SourceFile};
use pretty_assertions::assert_eq;

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn parse(source: &str) -> ParseResult {
    let sf = SourceFile::new("App.tsx", source);
    parse_source(&sf)
}

/// Parse source and return the module, panicking if there are errors.
fn parse_ok(source: &str) -> Module {
    let result = parse(source);
    if result.errors.has_errors() {
        for e in &result.errors.errors {
            eprintln!("  ERROR: {} ({}) at {}", e.message, e.code, e.span);
        }
        panic!("unexpected parse errors (see above)");
    }
    result.module.expect("no module returned")
}

fn first_error_code(source: &str) -> ErrorCode {
    let result = parse(source);
    assert!(result.module.is_none(), "module returned despite errors");
    result.errors.first().expect("expected an error").code
}

/// The initializer of the first declarator of the first statement.
fn first_init(module: &Module) -> &Expr {
    match &module.body[0].kind {
        StmtKind::Var(decl) => decl.declarators[0].init.as_ref().expect("no initializer"),
        other => panic!("expected a variable declaration, got {other:?}"),
    }
}

fn init_of(source: &str) -> Expr {
    let module = parse_ok(source);
    first_init(&module).clone()
}

fn jsx_of(source: &str) -> JsxElement {
    match init_of(source).kind {
        ExprKind::Jsx(element) => *element,
        other => panic!("expected JSX, got {other:?}"),
    }
}

fn ident_name(expr: &Expr) -> &str {
    match &expr.kind {
        ExprKind::Ident(name) => name,
        other => panic!("expected identifier, got {other:?}"),
    }
}

// ─────────────────────────────────────────────────────────────────────
// Modules
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_empty_module() {
    let module = parse_ok("");
    assert!(module.body.is_empty());
}

#[test]
fn test_default_exported_component() {
    let module = parse_ok(
        r#"export default function App() {
  return <div>Hello</div>;
}"#,
    );
    assert_eq!(module.body.len(), 1);
    match &module.body[0].kind {
        StmtKind::Export(ExportDecl::DefaultFunction(function)) => {
            assert_eq!(function.name.as_ref().map(|n| n.name.as_str()), Some("App"));
            assert!(!function.is_arrow);
            let FunctionBody::Block(body) = &function.body else {
                panic!("expected block body");
            };
            assert!(matches!(
                &body[0].kind,
                StmtKind::Return(Some(Expr { kind: ExprKind::Jsx(_), .. }))
            ));
        }
        other => panic!("expected default function export, got {other:?}"),
    }
}

#[test]
fn test_default_export_expression() {
    let module = parse_ok("const App = () => null;\nexport default App;");
    match &module.body[1].kind {
        StmtKind::Export(ExportDecl::Default(expr)) => assert_eq!(ident_name(expr), "App"),
        other => panic!("expected default export, got {other:?}"),
    }
}

#[test]
fn test_statements_without_semicolons() {
    let module = parse_ok("const a = 1\nconst b = a + 2\nexport default b");
    assert_eq!(module.body.len(), 3);
}

#[test]
fn test_return_followed_by_newline_returns_nothing() {
    let module = parse_ok("function f() {\n  return\n  1\n}");
    let StmtKind::Function(function) = &module.body[0].kind else {
        panic!("expected function");
    };
    let FunctionBody::Block(body) = &function.body else {
        panic!("expected block body");
    };
    assert_eq!(body.len(), 2);
    assert!(matches!(body[0].kind, StmtKind::Return(None)));
}

// ─────────────────────────────────────────────────────────────────────
// Imports & exports
// ─────────────────────────────────────────────────────────────────────

fn import_of(source: &str) -> ImportDecl {
    let module = parse_ok(source);
    match &module.body[0].kind {
        StmtKind::Import(import) => import.clone(),
        other => panic!("expected import, got {other:?}"),
    }
}

#[test]
fn test_default_and_named_imports() {
    let import = import_of(r#"import React, { useState as useS, useEffect } from "react";"#);
    assert_eq!(import.source, "react");
    assert_eq!(import.default.as_ref().map(|d| d.name.as_str()), Some("React"));
    assert_eq!(import.named.len(), 2);
    assert_eq!(import.named[0].imported, "useState");
    assert_eq!(import.named[0].local.name, "useS");
    assert_eq!(import.named[1].imported, "useEffect");
    assert_eq!(import.named[1].local.name, "useEffect");
    assert!(!import.type_only);
}

#[test]
fn test_namespace_import() {
    let import = import_of(r#"import * as utils from "./utils";"#);
    assert_eq!(import.namespace.as_ref().map(|n| n.name.as_str()), Some("utils"));
    assert!(import.default.is_none());
}

#[test]
fn test_side_effect_import() {
    let import = import_of(r#"import "./styles.css";"#);
    assert!(import.is_side_effect());
    assert_eq!(import.source, "./styles.css");
}

#[test]
fn test_type_only_import() {
    let import = import_of(r#"import type { Props } from "./types";"#);
    assert!(import.type_only);
}

#[test]
fn test_inline_type_specifiers_are_dropped() {
    let import = import_of(r#"import { type Props, Card } from "./Card";"#);
    assert!(!import.type_only);
    assert_eq!(import.named.len(), 1);
    assert_eq!(import.named[0].imported, "Card");
}

#[test]
fn test_import_default_by_name() {
    let import = import_of(r#"import { default as Card } from "./Card";"#);
    assert_eq!(import.named[0].imported, "default");
    assert_eq!(import.named[0].local.name, "Card");
}

#[test]
fn test_import_source_span() {
    let import = import_of(r#"import x from "./x";"#);
    assert_eq!(import.source_span.line, 1);
    assert_eq!(import.source_span.col, 15);
}

#[test]
fn test_export_list_with_rename() {
    let module = parse_ok("const a = 1, b = 2;\nexport { a, b as c };");
    match &module.body[1].kind {
        StmtKind::Export(ExportDecl::Named { specifiers, source, .. }) => {
            assert!(source.is_none());
            assert_eq!(specifiers.len(), 2);
            assert_eq!(specifiers[1].local, "b");
            assert_eq!(specifiers[1].exported, "c");
        }
        other => panic!("expected named export, got {other:?}"),
    }
}

#[test]
fn test_reexports() {
    let module = parse_ok(
        r#"export { Button } from "./Button";
export * from "./icons";
export * as theme from "./theme";"#,
    );
    assert!(matches!(
        &module.body[0].kind,
        StmtKind::Export(ExportDecl::Named { source: Some(s), .. }) if s == "./Button"
    ));
    assert!(matches!(
        &module.body[1].kind,
        StmtKind::Export(ExportDecl::All { alias: None, .. })
    ));
    assert!(matches!(
        &module.body[2].kind,
        StmtKind::Export(ExportDecl::All { alias: Some(a), .. }) if a == "theme"
    ));
}

#[test]
fn test_exported_declarations() {
    let module = parse_ok("export const LIMIT = 10;\nexport function helper() {}");
    for stmt in &module.body {
        assert!(matches!(stmt.kind, StmtKind::Export(ExportDecl::Decl(_))));
    }
}

// ─────────────────────────────────────────────────────────────────────
// Statements
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_array_destructuring_declaration() {
    let module = parse_ok("const [count, setCount] = useState(0);");
    let StmtKind::Var(decl) = &module.body[0].kind else {
        panic!("expected var");
    };
    assert_eq!(decl.kind, VarKind::Const);
    assert_eq!(decl.declarators[0].pattern.bound_names(), vec!["count", "setCount"]);
}

#[test]
fn test_object_pattern_with_default_and_rest() {
    let module = parse_ok(r#"function Card({ title = "Untitled", ...rest }) {}"#);
    let StmtKind::Function(function) = &module.body[0].kind else {
        panic!("expected function");
    };
    let Pattern::Object { props, rest } = &function.params[0].pattern else {
        panic!("expected object pattern");
    };
    assert_eq!(props.len(), 1);
    assert!(props[0].default.is_some());
    assert!(rest.is_some());
}

#[test]
fn test_if_else_chain() {
    let module = parse_ok("if (a) { x(); } else if (b) { y(); } else { z(); }");
    let StmtKind::If { alternate, .. } = &module.body[0].kind else {
        panic!("expected if");
    };
    let alternate = alternate.as_ref().expect("else branch");
    assert!(matches!(alternate.kind, StmtKind::If { .. }));
}

#[test]
fn test_classic_for_loop() {
    let module = parse_ok("for (let i = 0; i < 3; i++) { total += i; }");
    let StmtKind::For { init, test, update, .. } = &module.body[0].kind else {
        panic!("expected for");
    };
    assert!(matches!(init, Some(ForInit::Var(_))));
    assert!(test.is_some());
    assert!(update.is_some());
}

#[test]
fn test_for_of_with_destructuring() {
    let module = parse_ok("for (const [key, value] of entries) { log(key, value); }");
    let StmtKind::ForEach { kind, binding, pattern, .. } = &module.body[0].kind else {
        panic!("expected for-of");
    };
    assert_eq!(*kind, ForEachKind::Of);
    assert_eq!(*binding, VarKind::Const);
    assert_eq!(pattern.bound_names(), vec!["key", "value"]);
}

#[test]
fn test_for_in_loop() {
    let module = parse_ok("for (const key in obj) {}");
    assert!(matches!(
        module.body[0].kind,
        StmtKind::ForEach { kind: ForEachKind::In, .. }
    ));
}

#[test]
fn test_switch_in_reducer() {
    let module = parse_ok(
        r#"function reducer(state, action) {
  switch (action.type) {
    case "inc":
      return state + 1;
    case "dec":
    case "down":
      return state - 1;
    default:
      return state;
  }
}"#,
    );
    let StmtKind::Function(function) = &module.body[0].kind else {
        panic!("expected function");
    };
    let FunctionBody::Block(body) = &function.body else {
        panic!("expected block body");
    };
    let StmtKind::Switch { cases, .. } = &body[0].kind else {
        panic!("expected switch");
    };
    assert_eq!(cases.len(), 4);
    assert!(!cases[2].body.is_empty());
    assert!(cases[1].body.is_empty());
    assert!(cases[3].test.is_none());
}

#[test]
fn test_try_catch_finally() {
    let module = parse_ok("try { risky(); } catch (e) { report(e); } finally { done(); }");
    let StmtKind::Try { param, handler, finalizer, .. } = &module.body[0].kind else {
        panic!("expected try");
    };
    assert!(param.is_some());
    assert!(handler.is_some());
    assert!(finalizer.is_some());
}

#[test]
fn test_catch_without_binding() {
    let module = parse_ok("try { risky(); } catch { recover(); }");
    assert!(matches!(
        module.body[0].kind,
        StmtKind::Try { param: None, handler: Some(_), .. }
    ));
}

// ─────────────────────────────────────────────────────────────────────
// Expressions
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    let expr = init_of("const v = 1 + 2 * 3;");
    let ExprKind::Binary { op, right, .. } = expr.kind else {
        panic!("expected binary");
    };
    assert_eq!(op, BinaryOp::Add);
    assert!(matches!(right.kind, ExprKind::Binary { op: BinaryOp::Mul, .. }));
}

#[test]
fn test_exponent_is_right_associative() {
    let expr = init_of("const v = 2 ** 3 ** 2;");
    let ExprKind::Binary { op, left, right } = expr.kind else {
        panic!("expected binary");
    };
    assert_eq!(op, BinaryOp::Exp);
    assert!(matches!(left.kind, ExprKind::Number(n) if n == 2.0));
    assert!(matches!(right.kind, ExprKind::Binary { op: BinaryOp::Exp, .. }));
}

#[test]
fn test_and_binds_tighter_than_or() {
    let expr = init_of("const v = a || b && c;");
    let ExprKind::Logical { op, right, .. } = expr.kind else {
        panic!("expected logical");
    };
    assert_eq!(op, LogicalOp::Or);
    assert!(matches!(right.kind, ExprKind::Logical { op: LogicalOp::And, .. }));
}

#[test]
fn test_optional_chain_with_nullish_default() {
    let expr = init_of("const v = user?.name ?? \"anonymous\";");
    let ExprKind::Logical { op, left, .. } = expr.kind else {
        panic!("expected logical");
    };
    assert_eq!(op, LogicalOp::Nullish);
    assert!(matches!(left.kind, ExprKind::Member { optional: true, .. }));
}

#[test]
fn test_optional_call_and_index() {
    let expr = init_of("const v = handlers?.[name]?.(event);");
    let ExprKind::Call { optional, callee, .. } = expr.kind else {
        panic!("expected call");
    };
    assert!(optional);
    assert!(matches!(
        callee.kind,
        ExprKind::Member { property: MemberProp::Computed(_), optional: true, .. }
    ));
}

#[test]
fn test_conditional_expression() {
    let expr = init_of("const v = open ? \"yes\" : \"no\";");
    assert!(matches!(expr.kind, ExprKind::Conditional { .. }));
}

#[test]
fn test_parenthesized_conditional_branch_is_not_an_arrow() {
    let expr = init_of("const v = ready ? (count) : fallback;");
    let ExprKind::Conditional { consequent, .. } = expr.kind else {
        panic!("expected conditional");
    };
    assert_eq!(ident_name(&consequent), "count");
}

#[test]
fn test_compound_assignment() {
    let module = parse_ok("total += 1;");
    let StmtKind::Expr(expr) = &module.body[0].kind else {
        panic!("expected expression statement");
    };
    assert!(matches!(expr.kind, ExprKind::Assign { op: AssignOp::Add, .. }));
}

#[test]
fn test_prefix_and_postfix_updates() {
    let module = parse_ok("++a; b--;");
    assert!(matches!(
        &module.body[0].kind,
        StmtKind::Expr(Expr { kind: ExprKind::Update { prefix: true, op: UpdateOp::Increment, .. }, .. })
    ));
    assert!(matches!(
        &module.body[1].kind,
        StmtKind::Expr(Expr { kind: ExprKind::Update { prefix: false, op: UpdateOp::Decrement, .. }, .. })
    ));
}

#[test]
fn test_typeof_and_not() {
    let expr = init_of("const v = !(typeof x === \"string\");");
    let ExprKind::Unary { op, operand } = expr.kind else {
        panic!("expected unary");
    };
    assert_eq!(op, UnaryOp::Not);
    assert!(matches!(operand.kind, ExprKind::Binary { op: BinaryOp::StrictEq, .. }));
}

#[test]
fn test_simple_arrow() {
    let expr = init_of("const double = x => x * 2;");
    let ExprKind::Function(function) = expr.kind else {
        panic!("expected function");
    };
    assert!(function.is_arrow);
    assert_eq!(function.params.len(), 1);
    assert!(matches!(function.body, FunctionBody::Expr(_)));
}

#[test]
fn test_paren_arrow_with_default_and_rest() {
    let expr = init_of("const f = (a, b = 2, ...more) => a + b;");
    let ExprKind::Function(function) = expr.kind else {
        panic!("expected function");
    };
    assert_eq!(function.params.len(), 2);
    assert!(function.params[1].default.is_some());
    assert!(function.rest.is_some());
}

#[test]
fn test_arrow_with_block_body() {
    let expr = init_of("const f = () => { return 1; };");
    let ExprKind::Function(function) = expr.kind else {
        panic!("expected function");
    };
    assert!(matches!(function.body, FunctionBody::Block(_)));
}

#[test]
fn test_arrow_returning_object_literal() {
    let expr = init_of("const f = () => ({ a: 1 });");
    let ExprKind::Function(function) = expr.kind else {
        panic!("expected function");
    };
    let FunctionBody::Expr(body) = &function.body else {
        panic!("expected expression body");
    };
    assert!(matches!(body.kind, ExprKind::Object(_)));
}

#[test]
fn test_object_literal_forms() {
    let expr = init_of(r#"const o = { a, b: 1, "c-d": 2, 3: x, [key]: v, ...rest, run() { return 1; } };"#);
    let ExprKind::Object(props) = expr.kind else {
        panic!("expected object");
    };
    assert_eq!(props.len(), 7);
    assert!(matches!(&props[0], ObjectProp::Shorthand(id) if id.name == "a"));
    assert!(matches!(&props[2], ObjectProp::KeyValue { key: PropKey::Named(k), .. } if k == "c-d"));
    assert!(matches!(&props[3], ObjectProp::KeyValue { key: PropKey::Named(k), .. } if k == "3"));
    assert!(matches!(&props[4], ObjectProp::KeyValue { key: PropKey::Computed(_), .. }));
    assert!(matches!(&props[5], ObjectProp::Spread(_)));
    assert!(matches!(
        &props[6],
        ObjectProp::KeyValue { value: Expr { kind: ExprKind::Function(_), .. }, .. }
    ));
}

#[test]
fn test_method_named_get_is_not_a_getter() {
    let expr = init_of("const api = { get(id) { return id; } };");
    let ExprKind::Object(props) = expr.kind else {
        panic!("expected object");
    };
    assert!(matches!(&props[0], ObjectProp::KeyValue { key: PropKey::Named(k), .. } if k == "get"));
}

#[test]
fn test_array_literal_with_hole_and_spread() {
    let expr = init_of("const xs = [1, , ...rest];");
    let ExprKind::Array(elems) = expr.kind else {
        panic!("expected array");
    };
    assert_eq!(elems.len(), 3);
    assert!(matches!(elems[1], ArrayElem::Hole));
    assert!(matches!(elems[2], ArrayElem::Spread(_)));
}

#[test]
fn test_template_literal() {
    let expr = init_of("const s = `count: ${n} of ${total}`;");
    let ExprKind::Template { quasis, exprs } = expr.kind else {
        panic!("expected template");
    };
    assert_eq!(quasis, vec!["count: ".to_string(), " of ".to_string(), String::new()]);
    assert_eq!(exprs.len(), 2);
}

#[test]
fn test_new_expression() {
    let expr = init_of("const d = new Date(0);");
    let ExprKind::New { callee, args } = expr.kind else {
        panic!("expected new");
    };
    assert_eq!(ident_name(&callee), "Date");
    assert_eq!(args.len(), 1);
}

#[test]
fn test_keyword_property_names() {
    let expr = init_of("const v = module.default.new;");
    assert!(matches!(
        expr.kind,
        ExprKind::Member { property: MemberProp::Name(ref n), .. } if n == "new"
    ));
}

#[test]
fn test_sequence_expression() {
    let module = parse_ok("a = 1, b = 2;");
    let StmtKind::Expr(expr) = &module.body[0].kind else {
        panic!("expected expression statement");
    };
    assert!(matches!(&expr.kind, ExprKind::Sequence(items) if items.len() == 2));
}

// ─────────────────────────────────────────────────────────────────────
// JSX
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_element_with_every_attribute_form() {
    let element = jsx_of(r#"const el = <div className="app" id={id} {...rest} hidden><Child /></div>;"#);
    assert_eq!(element.name, JsxName::Tag("div".into()));
    assert_eq!(element.attrs.len(), 4);
    assert!(matches!(
        &element.attrs[0],
        JsxAttr::Named { name, value: Some(JsxAttrValue::String(v)), .. } if name == "className" && v == "app"
    ));
    assert!(matches!(
        &element.attrs[1],
        JsxAttr::Named { value: Some(JsxAttrValue::Expr(_)), .. }
    ));
    assert!(matches!(&element.attrs[2], JsxAttr::Spread(_)));
    assert!(matches!(&element.attrs[3], JsxAttr::Named { value: None, .. }));
    assert_eq!(element.children.len(), 1);
    let JsxChild::Element(child) = &element.children[0] else {
        panic!("expected child element");
    };
    assert!(matches!(&child.name, JsxName::Component(e) if ident_name(e) == "Child"));
}

#[test]
fn test_fragment() {
    let element = jsx_of("const el = <><A /><B /></>;");
    assert_eq!(element.name, JsxName::Fragment);
    assert_eq!(element.children.len(), 2);
}

#[test]
fn test_member_component_name() {
    let element = jsx_of("const el = <UI.Button />;");
    let JsxName::Component(expr) = &element.name else {
        panic!("expected component");
    };
    assert!(matches!(expr.kind, ExprKind::Member { .. }));
}

#[test]
fn test_custom_element_and_namespaced_names_are_tags() {
    let element = jsx_of(r##"const el = <my-widget><svg:rect xlink:href="#a" /></my-widget>;"##);
    assert_eq!(element.name, JsxName::Tag("my-widget".into()));
    let JsxChild::Element(child) = &element.children[0] else {
        panic!("expected child element");
    };
    assert_eq!(child.name, JsxName::Tag("svg:rect".into()));
    assert!(matches!(&child.attrs[0], JsxAttr::Named { name, .. } if name == "xlink:href"));
}

#[test]
fn test_text_children_are_kept_raw() {
    let element = jsx_of("const el = <p>Tom &amp; Jerry's</p>;");
    assert_eq!(element.children, vec![JsxChild::Text("Tom &amp; Jerry's".into())]);
}

#[test]
fn test_expression_children() {
    let element = jsx_of(
        r#"const el = <ul>
  {open && <Modal />}
  {items.map(item => <li key={item.id}>{item.name}</li>)}
  {/* nothing */}
</ul>;"#,
    );
    let exprs: Vec<&Expr> = element
        .children
        .iter()
        .filter_map(|c| match c {
            JsxChild::Expr(e) => Some(e),
            _ => None,
        })
        .collect();
    assert_eq!(exprs.len(), 2);
    assert!(matches!(exprs[0].kind, ExprKind::Logical { op: LogicalOp::And, .. }));
    assert!(matches!(exprs[1].kind, ExprKind::Call { .. }));
}

#[test]
fn test_element_as_attribute_value() {
    let element = jsx_of("const el = <Button icon=<Star /> />;");
    assert!(matches!(
        &element.attrs[0],
        JsxAttr::Named { value: Some(JsxAttrValue::Element(_)), .. }
    ));
}

#[test]
fn test_parenthesized_multiline_jsx() {
    let module = parse_ok(
        r#"export default function App() {
  return (
    <main>
      <h1>Title</h1>
    </main>
  );
}"#,
    );
    assert_eq!(module.body.len(), 1);
}

#[test]
fn test_comparison_after_element_is_still_comparison() {
    let module = parse_ok("const ok = a < b;\nconst el = <b>x</b>;");
    assert!(matches!(
        first_init(&module).kind,
        ExprKind::Binary { op: BinaryOp::Less, .. }
    ));
}

// ─────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_mismatched_closing_tag() {
    assert_eq!(first_error_code("const a = <div></span>;"), ErrorCode::MISMATCHED_CLOSING_TAG);
}

#[test]
fn test_unclosed_element() {
    assert_eq!(first_error_code("const a = <div>hello"), ErrorCode::UNCLOSED_ELEMENT);
}

#[test]
fn test_unclosed_block() {
    assert_eq!(first_error_code("function f() {\n  return 1;\n"), ErrorCode::UNCLOSED_DELIMITER);
}

#[test]
fn test_duplicate_default_export() {
    assert_eq!(
        first_error_code("export default function A() {}\nexport default function B() {}"),
        ErrorCode::DUPLICATE_DEFAULT_EXPORT
    );
}

#[test]
fn test_invalid_assignment_target() {
    assert_eq!(first_error_code("1 = 2;"), ErrorCode::INVALID_ASSIGNMENT_TARGET);
}

#[test]
fn test_missing_binding_name() {
    assert_eq!(first_error_code("const = 5;"), ErrorCode::UNEXPECTED_TOKEN);
}

#[test]
fn test_errors_carry_location_and_source_line() {
    let result = parse("const a = 1;\nconst b = <div></span>;");
    let error = result.errors.first().expect("an error");
    assert_eq!(error.file, "App.tsx");
    assert_eq!(error.span.line, 2);
    assert_eq!(error.source_line, "const b = <div></span>;");
}

#[test]
fn test_recovery_reports_several_errors() {
    let result = parse("const = 1;\nconst ok = 2;\nlet = 3;");
    assert_eq!(result.errors.total_errors, 2);
}

// ─────────────────────────────────────────────────────────────────────
// Determinism
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_parser_determinism_100_iterations() {
    let source = r#"import { useState } from "react";
import Card from "./Card";

type Item = { id: number; label: string };

export default function App({ items }: { items: Item[] }) {
  const [open, setOpen] = useState<boolean>(false);
  return (
    <>
      <button onClick={() => setOpen(!open)}>Toggle</button>
      {open && items.map((item) => <Card key={item.id} {...item} />)}
    </>
  );
}"#;
    let first = parse_ok(source);
    for i in 0..100 {
        let again = parse_ok(source);
        assert_eq!(first, again, "parse differed on iteration {i}");
    }
}
