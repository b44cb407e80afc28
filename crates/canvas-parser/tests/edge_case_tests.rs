//! Edge cases: TypeScript erasure, deliberately unsupported syntax,
//! nesting and error limits.

use canvas_parser::{parse_source, ParseResult, MAX_NESTING_DEPTH};
use canvas_types::ast::*;
use canvas_types::{ErrorCode, SourceFile, MAX_ERRORS};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn parse(source: &str) -> ParseResult {
    let sf = SourceFile::new("App.tsx", source);
    parse_source(&sf)
}

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

fn first_error(source: &str) -> (ErrorCode, String) {
    let result = parse(source);
    let error = result.errors.first().expect("expected an error");
    (error.code, error.message.clone())
}

/// Statements that survive type erasure.
fn runtime_statements(module: &Module) -> usize {
    module
        .body
        .iter()
        .filter(|s| !matches!(s.kind, StmtKind::Empty))
        .count()
}

fn init_of(source: &str) -> Expr {
    let module = parse_ok(source);
    match &module.body[0].kind {
        StmtKind::Var(decl) => decl.declarators[0].init.clone().expect("no initializer"),
        other => panic!("expected a variable declaration, got {other:?}"),
    }
}

// ─────────────────────────────────────────────────────────────────────
// Type erasure
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_annotated_declaration() {
    let expr = init_of("const count: number = 1;");
    assert!(matches!(expr.kind, ExprKind::Number(n) if n == 1.0));
}

#[test]
fn test_type_aliases_and_interfaces_vanish() {
    let module = parse_ok(
        r#"type Mode = "light" | "dark";
type Handler<T> = (value: T) => void;
interface Props extends Base, Other<string> {
  title: string;
  onClick?: () => void;
  items: Array<{ id: number }>;
}
export type Size = "sm" | "lg";
export interface Theme { color: string }
declare const VERSION: string;
const ok = 1;"#,
    );
    assert_eq!(runtime_statements(&module), 1);
}

#[test]
fn test_export_type_list_vanishes() {
    let module = parse_ok(r#"export type { Props, Mode } from "./types";"#);
    assert_eq!(runtime_statements(&module), 0);
}

#[test]
fn test_as_casts_are_erased() {
    let expr = init_of(r#"const el = document.getElementById("root") as HTMLElement;"#);
    assert!(matches!(expr.kind, ExprKind::Call { .. }));
}

#[test]
fn test_as_const_and_satisfies() {
    let expr = init_of("const sizes = [1, 2] as const;");
    assert!(matches!(expr.kind, ExprKind::Array(_)));
    let expr = init_of("const theme = { dark: true } satisfies Theme;");
    assert!(matches!(expr.kind, ExprKind::Object(_)));
}

#[test]
fn test_cast_binds_tighter_than_logical_or() {
    let expr = init_of("const v = (input as string) || fallback;");
    assert!(matches!(expr.kind, ExprKind::Logical { op: LogicalOp::Or, .. }));
}

#[test]
fn test_non_null_assertion() {
    let module = parse_ok("ref.current!.focus();");
    let StmtKind::Expr(expr) = &module.body[0].kind else {
        panic!("expected expression statement");
    };
    assert!(matches!(expr.kind, ExprKind::Call { .. }));
}

#[test]
fn test_definite_assignment() {
    let module = parse_ok("let timer!: number;");
    assert!(matches!(module.body[0].kind, StmtKind::Var(_)));
}

#[test]
fn test_explicit_type_arguments_on_call() {
    let expr = init_of("const [items, setItems] = useState<Array<Item>>([]);");
    let ExprKind::Call { callee, args, .. } = expr.kind else {
        panic!("expected call");
    };
    assert!(matches!(callee.kind, ExprKind::Ident(ref n) if n == "useState"));
    assert_eq!(args.len(), 1);
}

#[test]
fn test_less_than_is_not_mistaken_for_type_arguments() {
    let expr = init_of("const v = a < b && c > d;");
    assert!(matches!(expr.kind, ExprKind::Logical { op: LogicalOp::And, .. }));
}

#[test]
fn test_generic_function_declaration() {
    let module = parse_ok("function identity<T extends object = {}>(value: T): T { return value; }");
    let StmtKind::Function(function) = &module.body[0].kind else {
        panic!("expected function");
    };
    assert_eq!(function.params.len(), 1);
}

#[test]
fn test_arrow_with_return_type() {
    let expr = init_of("const label = (n: number): string => String(n);");
    let ExprKind::Function(function) = expr.kind else {
        panic!("expected function");
    };
    assert!(function.is_arrow);
    assert_eq!(function.params.len(), 1);
}

#[test]
fn test_optional_and_typed_parameters() {
    let module = parse_ok(
        "function Row({ label, onSelect }: RowProps, index?: number, ...rest: unknown[]): JSX.Element | null { return null; }",
    );
    let StmtKind::Function(function) = &module.body[0].kind else {
        panic!("expected function");
    };
    assert_eq!(function.params.len(), 2);
    assert!(function.rest.is_some());
}

#[test]
fn test_type_predicate_return() {
    let module = parse_ok("function isItem(x: unknown): x is Item { return x != null; }");
    assert_eq!(runtime_statements(&module), 1);
}

#[test]
fn test_rich_annotation_types() {
    let module = parse_ok(
        r#"let a: keyof typeof config;
let b: readonly string[];
let c: Record<string, (e: Event) => void>;
let d: [number, string?];
let e: T extends string ? "s" : "n";
let f: `prefix-${string}`;
let g: -1 | 0 | 1;
let h: new () => Widget;"#,
    );
    assert_eq!(runtime_statements(&module), 8);
}

#[test]
fn test_typed_catch_parameter() {
    let module = parse_ok("try { run(); } catch (err: unknown) { report(err); }");
    assert!(matches!(module.body[0].kind, StmtKind::Try { .. }));
}

#[test]
fn test_word_type_is_still_an_identifier() {
    let module = parse_ok("const type = 1;\ntype;\ntype = 2;");
    assert_eq!(runtime_statements(&module), 3);
}

#[test]
fn test_import_attributes_are_skipped() {
    let module = parse_ok(r#"import data from "./data.json" with { type: "json" };"#);
    assert!(matches!(module.body[0].kind, StmtKind::Import(_)));
}

// ─────────────────────────────────────────────────────────────────────
// Unsupported syntax
// ─────────────────────────────────────────────────────────────────────

fn assert_unsupported(source: &str, what: &str) {
    let (code, message) = first_error(source);
    assert_eq!(code, ErrorCode::UNSUPPORTED_SYNTAX, "for {source:?}: {message}");
    assert!(
        message.contains(what),
        "expected message about {what:?}, got {message:?}"
    );
}

#[test]
fn test_classes_are_unsupported() {
    assert_unsupported("class Store {}", "classes");
    assert_unsupported("export default class App {}", "classes");
}

#[test]
fn test_async_is_unsupported() {
    assert_unsupported("const load = async () => {};", "async");
    assert_unsupported("async function load() {}", "async");
}

#[test]
fn test_generators_are_unsupported() {
    assert_unsupported("function* ids() {}", "generator");
}

#[test]
fn test_this_is_unsupported() {
    assert_unsupported("const v = this;", "'this'");
}

#[test]
fn test_regex_literals_are_unsupported() {
    assert_unsupported("const re = /ab+c/;", "regular expression");
}

#[test]
fn test_do_while_is_unsupported() {
    assert_unsupported("do { x++; } while (x < 3);", "do-while");
}

#[test]
fn test_enums_are_unsupported() {
    assert_unsupported("enum Color { Red }", "enums");
    assert_unsupported("const enum Color { Red }", "enums");
}

#[test]
fn test_getters_are_unsupported() {
    assert_unsupported("const o = { get value() { return 1; } };", "getters");
}

#[test]
fn test_instanceof_is_unsupported() {
    assert_unsupported("const v = e instanceof Error;", "instanceof");
}

#[test]
fn test_dynamic_import_is_unsupported() {
    assert_unsupported(r#"const m = import("./lazy");"#, "dynamic import");
}

#[test]
fn test_tagged_templates_are_unsupported() {
    assert_unsupported("const q = sql`select 1`;", "tagged templates");
}

#[test]
fn test_delete_is_unsupported() {
    assert_unsupported("delete cache[key];", "delete");
}

// ─────────────────────────────────────────────────────────────────────
// Limits
// ─────────────────────────────────────────────────────────────────────

/// Deep recursion needs more stack than the default test thread has.
fn on_big_stack<F: FnOnce() + Send + 'static>(f: F) {
    std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(f)
        .expect("spawn")
        .join()
        .expect("thread panicked");
}

#[test]
fn test_nesting_limit_is_reported() {
    on_big_stack(|| {
        let depth = MAX_NESTING_DEPTH as usize + 10;
        let source = format!("const x = {}1{};", "(".repeat(depth), ")".repeat(depth));
        let (code, _) = first_error(&source);
        assert_eq!(code, ErrorCode::NESTING_LIMIT_EXCEEDED);
    });
}

#[test]
fn test_nesting_below_limit_is_fine() {
    on_big_stack(|| {
        let source = format!("const x = {}1{};", "[".repeat(40), "]".repeat(40));
        parse_ok(&source);
    });
}

#[test]
fn test_deeply_nested_elements_hit_the_limit() {
    on_big_stack(|| {
        let depth = MAX_NESTING_DEPTH as usize + 10;
        let source = format!("const x = {}{};", "<div>".repeat(depth), "</div>".repeat(depth));
        let (code, _) = first_error(&source);
        assert_eq!(code, ErrorCode::NESTING_LIMIT_EXCEEDED);
    });
}

#[test]
fn test_error_count_is_capped() {
    let source = "class A {}\n".repeat(40);
    let result = parse(&source);
    assert!(result.module.is_none());
    assert_eq!(result.errors.errors.len(), MAX_ERRORS);
    assert!(result.errors.total_errors >= MAX_ERRORS);
}

#[test]
fn test_stray_closing_brace() {
    let (code, _) = first_error("const a = 1;\n}");
    assert_eq!(code, ErrorCode::UNEXPECTED_TOKEN);
}
