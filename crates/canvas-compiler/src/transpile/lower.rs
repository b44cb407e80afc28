//! Module lowering: imports, exports and a full walk for markup.

use std::rc::Rc;

use canvas_sanitizer::{ExternalBinding, ImportedName};
use canvas_types::ast::*;
use canvas_types::Span;

use super::{ExecutableModule, EXPORTS, FRAGMENT, JSX_FACTORY, JSX_RUNTIME, REQUIRE};
use crate::resolver::{Resolution, ResolvedImport};

const STYLESHEET_EXTENSIONS: [&str; 4] = [".css", ".scss", ".sass", ".less"];

pub(crate) struct Lowerer<'a> {
    path: &'a str,
    resolve: &'a dyn Fn(&str) -> Resolution,
    imports: Vec<ResolvedImport>,
    /// Export assignments for hoisted function declarations; they run
    /// before the body so circular importers see them.
    hoisted: Vec<Stmt>,
    pub(super) uses_markup: bool,
    temps: usize,
}

impl<'a> Lowerer<'a> {
    pub(crate) fn new(path: &'a str, resolve: &'a dyn Fn(&str) -> Resolution) -> Self {
        Self {
            path,
            resolve,
            imports: Vec::new(),
            hoisted: Vec::new(),
            uses_markup: false,
            temps: 0,
        }
    }

    pub(crate) fn lower_module(
        mut self,
        module: Module,
        bindings: &[ExternalBinding],
    ) -> ExecutableModule {
        let span = module.span;
        let linked: Vec<Stmt> = bindings
            .iter()
            .map(|binding| self.link_binding(binding, span))
            .collect();

        let mut body = Vec::new();
        for stmt in module.body {
            self.top_level(stmt, &mut body);
        }

        let mut out = Vec::with_capacity(body.len() + linked.len() + self.hoisted.len() + 1);
        if self.uses_markup {
            out.push(prelude(span));
        }
        out.extend(linked);
        out.append(&mut self.hoisted);
        out.extend(body);

        ExecutableModule {
            path: self.path.to_string(),
            body: Module { body: out, span },
            imports: self.imports,
            uses_markup: self.uses_markup,
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Module syntax
    // ══════════════════════════════════════════════════════════════════════

    fn top_level(&mut self, stmt: Stmt, out: &mut Vec<Stmt>) {
        let span = stmt.span;
        match stmt.kind {
            StmtKind::Import(decl) => self.import(decl, span, out),
            StmtKind::Export(decl) => self.export(decl, span, out),
            kind => out.push(self.stmt(Stmt::new(kind, span))),
        }
    }

    /// `require("<resolved>"[, true])`, recording the import.
    fn require(&mut self, specifier: &str, span: Span, namespace: bool) -> Expr {
        let resolution = (self.resolve)(specifier);
        let target = resolution.target().unwrap_or(specifier).to_string();
        if !self.imports.iter().any(|i| i.specifier == specifier) {
            self.imports.push(ResolvedImport {
                from_path: self.path.to_string(),
                specifier: specifier.to_string(),
                resolution,
            });
        }
        let mut args = vec![Expr::string(target, span)];
        if namespace {
            args.push(Expr::new(ExprKind::Bool(true), span));
        }
        Expr::call(Expr::ident(REQUIRE, span), args, span)
    }

    /// A `const __reexportN = require(..., true)` statement; returns the name.
    fn require_temp(&mut self, specifier: &str, span: Span, out: &mut Vec<Stmt>) -> String {
        let name = format!("__reexport{}", self.temps);
        self.temps += 1;
        let init = self.require(specifier, span, true);
        out.push(const_decl(
            Pattern::Ident(Ident::new(name.clone(), span)),
            init,
            span,
        ));
        name
    }

    fn import(&mut self, decl: ImportDecl, span: Span, out: &mut Vec<Stmt>) {
        if decl.type_only {
            return;
        }
        let source_span = decl.source_span;
        if decl.is_side_effect() {
            if is_stylesheet(&decl.source) {
                return;
            }
            let call = self.require(&decl.source, source_span, false);
            out.push(Stmt::new(StmtKind::Expr(call), span));
            return;
        }
        if let Some(default) = decl.default {
            let init = self.require(&decl.source, source_span, false);
            out.push(const_decl(Pattern::Ident(default), init, span));
        }
        if let Some(namespace) = decl.namespace {
            let init = self.require(&decl.source, source_span, true);
            out.push(const_decl(Pattern::Ident(namespace), init, span));
        }
        if !decl.named.is_empty() {
            let props = decl
                .named
                .into_iter()
                .map(|s| named_prop(s.imported, s.local))
                .collect();
            let init = self.require(&decl.source, source_span, true);
            out.push(const_decl(Pattern::Object { props, rest: None }, init, span));
        }
    }

    fn link_binding(&mut self, binding: &ExternalBinding, span: Span) -> Stmt {
        let local = Ident::new(binding.local.clone(), span);
        match &binding.imported {
            ImportedName::Default => {
                let init = self.require(&binding.source, span, false);
                const_decl(Pattern::Ident(local), init, span)
            }
            ImportedName::Namespace => {
                let init = self.require(&binding.source, span, true);
                const_decl(Pattern::Ident(local), init, span)
            }
            ImportedName::Named(imported) => {
                let init = self.require(&binding.source, span, true);
                let pattern = Pattern::Object {
                    props: vec![named_prop(imported.clone(), local)],
                    rest: None,
                };
                const_decl(pattern, init, span)
            }
        }
    }

    fn export(&mut self, decl: ExportDecl, span: Span, out: &mut Vec<Stmt>) {
        match decl {
            ExportDecl::Default(expr) => {
                let value = self.expr(expr);
                out.push(export_assign("default", value, span));
            }
            ExportDecl::DefaultFunction(function) => {
                let function = self.function(function);
                match &function.name {
                    Some(name) => {
                        let value = Expr::ident(name.name.clone(), name.span);
                        self.hoisted.push(export_assign("default", value, span));
                        out.push(Stmt::new(StmtKind::Function(function), span));
                    }
                    None => {
                        let value = Expr::new(ExprKind::Function(function), span);
                        out.push(export_assign("default", value, span));
                    }
                }
            }
            ExportDecl::Decl(stmt) => {
                let stmt = self.stmt(*stmt);
                let mut exported = Vec::new();
                match &stmt.kind {
                    StmtKind::Function(function) => {
                        if let Some(name) = &function.name {
                            let value = Expr::ident(name.name.clone(), name.span);
                            self.hoisted.push(export_assign(&name.name, value, span));
                        }
                    }
                    StmtKind::Var(decl) => {
                        for declarator in &decl.declarators {
                            exported.extend(
                                declarator.pattern.bound_names().into_iter().map(str::to_string),
                            );
                        }
                    }
                    _ => {}
                }
                out.push(stmt);
                for name in exported {
                    let value = Expr::ident(name.clone(), span);
                    out.push(export_assign(&name, value, span));
                }
            }
            ExportDecl::Named {
                specifiers,
                source: None,
                ..
            } => {
                for s in specifiers {
                    out.push(export_assign(&s.exported, Expr::ident(s.local, span), span));
                }
            }
            ExportDecl::Named {
                specifiers,
                source: Some(source),
                source_span,
            } => {
                let temp = self.require_temp(&source, source_span.unwrap_or(span), out);
                for s in specifiers {
                    let value = Expr::member(Expr::ident(temp.clone(), span), s.local, span);
                    out.push(export_assign(&s.exported, value, span));
                }
            }
            ExportDecl::All {
                source,
                source_span,
                alias: Some(alias),
            } => {
                let value = self.require(&source, source_span, true);
                out.push(export_assign(&alias, value, span));
            }
            ExportDecl::All {
                source,
                source_span,
                alias: None,
            } => {
                let temp = self.require_temp(&source, source_span, out);
                out.push(copy_exports(&temp, span));
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Walk
    // ══════════════════════════════════════════════════════════════════════

    fn stmts(&mut self, stmts: Vec<Stmt>) -> Vec<Stmt> {
        stmts.into_iter().map(|s| self.stmt(s)).collect()
    }

    fn boxed_stmt(&mut self, stmt: Box<Stmt>) -> Box<Stmt> {
        Box::new(self.stmt(*stmt))
    }

    fn stmt(&mut self, stmt: Stmt) -> Stmt {
        let span = stmt.span;
        let kind = match stmt.kind {
            StmtKind::Var(decl) => StmtKind::Var(self.var_decl(decl)),
            StmtKind::Function(function) => StmtKind::Function(self.function(function)),
            StmtKind::Return(value) => StmtKind::Return(value.map(|v| self.expr(v))),
            StmtKind::If {
                test,
                consequent,
                alternate,
            } => StmtKind::If {
                test: self.expr(test),
                consequent: self.boxed_stmt(consequent),
                alternate: alternate.map(|a| self.boxed_stmt(a)),
            },
            StmtKind::For {
                init,
                test,
                update,
                body,
            } => StmtKind::For {
                init: init.map(|init| match init {
                    ForInit::Var(decl) => ForInit::Var(self.var_decl(decl)),
                    ForInit::Expr(expr) => ForInit::Expr(self.expr(expr)),
                }),
                test: test.map(|t| self.expr(t)),
                update: update.map(|u| self.expr(u)),
                body: self.boxed_stmt(body),
            },
            StmtKind::ForEach {
                kind,
                binding,
                pattern,
                iterable,
                body,
            } => StmtKind::ForEach {
                kind,
                binding,
                pattern: self.pattern(pattern),
                iterable: self.expr(iterable),
                body: self.boxed_stmt(body),
            },
            StmtKind::While { test, body } => StmtKind::While {
                test: self.expr(test),
                body: self.boxed_stmt(body),
            },
            StmtKind::Switch {
                discriminant,
                cases,
            } => StmtKind::Switch {
                discriminant: self.expr(discriminant),
                cases: cases
                    .into_iter()
                    .map(|case| SwitchCase {
                        test: case.test.map(|t| self.expr(t)),
                        body: self.stmts(case.body),
                    })
                    .collect(),
            },
            StmtKind::Throw(value) => StmtKind::Throw(self.expr(value)),
            StmtKind::Try {
                block,
                param,
                handler,
                finalizer,
            } => StmtKind::Try {
                block: self.stmts(block),
                param: param.map(|p| self.pattern(p)),
                handler: handler.map(|h| self.stmts(h)),
                finalizer: finalizer.map(|f| self.stmts(f)),
            },
            StmtKind::Block(stmts) => StmtKind::Block(self.stmts(stmts)),
            StmtKind::Expr(expr) => StmtKind::Expr(self.expr(expr)),
            kind @ (StmtKind::Import(_)
            | StmtKind::Export(_)
            | StmtKind::Break
            | StmtKind::Continue
            | StmtKind::Empty) => kind,
        };
        Stmt::new(kind, span)
    }

    fn var_decl(&mut self, decl: VarDecl) -> VarDecl {
        VarDecl {
            kind: decl.kind,
            declarators: decl
                .declarators
                .into_iter()
                .map(|d| Declarator {
                    pattern: self.pattern(d.pattern),
                    init: d.init.map(|i| self.expr(i)),
                    span: d.span,
                })
                .collect(),
        }
    }

    pub(super) fn function(&mut self, function: Rc<Function>) -> Rc<Function> {
        let function = Rc::unwrap_or_clone(function);
        let params = function
            .params
            .into_iter()
            .map(|p| Param {
                pattern: self.pattern(p.pattern),
                default: p.default.map(|d| self.expr(d)),
            })
            .collect();
        let body = match function.body {
            FunctionBody::Block(stmts) => FunctionBody::Block(self.stmts(stmts)),
            FunctionBody::Expr(expr) => FunctionBody::Expr(self.boxed(expr)),
        };
        Rc::new(Function {
            name: function.name,
            params,
            rest: function.rest.map(|r| self.pattern(r)),
            body,
            is_arrow: function.is_arrow,
            span: function.span,
        })
    }

    fn pattern(&mut self, pattern: Pattern) -> Pattern {
        match pattern {
            Pattern::Ident(id) => Pattern::Ident(id),
            Pattern::Object { props, rest } => Pattern::Object {
                props: props
                    .into_iter()
                    .map(|p| ObjectPatternProp {
                        key: self.prop_key(p.key),
                        value: self.pattern(p.value),
                        default: p.default.map(|d| self.expr(d)),
                    })
                    .collect(),
                rest: rest.map(|r| Box::new(self.pattern(*r))),
            },
            Pattern::Array { elems, rest } => Pattern::Array {
                elems: elems
                    .into_iter()
                    .map(|elem| {
                        elem.map(|e| PatternElem {
                            pattern: self.pattern(e.pattern),
                            default: e.default.map(|d| self.expr(d)),
                        })
                    })
                    .collect(),
                rest: rest.map(|r| Box::new(self.pattern(*r))),
            },
        }
    }

    fn prop_key(&mut self, key: PropKey) -> PropKey {
        match key {
            PropKey::Named(name) => PropKey::Named(name),
            PropKey::Computed(expr) => PropKey::Computed(self.boxed(expr)),
        }
    }

    fn boxed(&mut self, expr: Box<Expr>) -> Box<Expr> {
        Box::new(self.expr(*expr))
    }

    fn args(&mut self, args: Vec<Arg>) -> Vec<Arg> {
        args.into_iter()
            .map(|arg| match arg {
                Arg::Expr(e) => Arg::Expr(self.expr(e)),
                Arg::Spread(e) => Arg::Spread(self.expr(e)),
            })
            .collect()
    }

    pub(super) fn expr(&mut self, expr: Expr) -> Expr {
        let span = expr.span;
        let kind = match expr.kind {
            ExprKind::Template { quasis, exprs } => ExprKind::Template {
                quasis,
                exprs: exprs.into_iter().map(|e| self.expr(e)).collect(),
            },
            ExprKind::Array(elems) => ExprKind::Array(
                elems
                    .into_iter()
                    .map(|elem| match elem {
                        ArrayElem::Expr(e) => ArrayElem::Expr(self.expr(e)),
                        ArrayElem::Spread(e) => ArrayElem::Spread(self.expr(e)),
                        ArrayElem::Hole => ArrayElem::Hole,
                    })
                    .collect(),
            ),
            ExprKind::Object(props) => ExprKind::Object(
                props
                    .into_iter()
                    .map(|prop| match prop {
                        ObjectProp::KeyValue { key, value } => ObjectProp::KeyValue {
                            key: self.prop_key(key),
                            value: self.expr(value),
                        },
                        ObjectProp::Shorthand(id) => ObjectProp::Shorthand(id),
                        ObjectProp::Spread(e) => ObjectProp::Spread(self.expr(e)),
                    })
                    .collect(),
            ),
            ExprKind::Function(function) => ExprKind::Function(self.function(function)),
            ExprKind::Member {
                object,
                property,
                optional,
            } => ExprKind::Member {
                object: self.boxed(object),
                property: match property {
                    MemberProp::Name(name) => MemberProp::Name(name),
                    MemberProp::Computed(index) => MemberProp::Computed(self.boxed(index)),
                },
                optional,
            },
            ExprKind::Call {
                callee,
                args,
                optional,
            } => ExprKind::Call {
                callee: self.boxed(callee),
                args: self.args(args),
                optional,
            },
            ExprKind::New { callee, args } => ExprKind::New {
                callee: self.boxed(callee),
                args: self.args(args),
            },
            ExprKind::Unary { op, operand } => ExprKind::Unary {
                op,
                operand: self.boxed(operand),
            },
            ExprKind::Update { op, prefix, target } => ExprKind::Update {
                op,
                prefix,
                target: self.boxed(target),
            },
            ExprKind::Binary { op, left, right } => ExprKind::Binary {
                op,
                left: self.boxed(left),
                right: self.boxed(right),
            },
            ExprKind::Logical { op, left, right } => ExprKind::Logical {
                op,
                left: self.boxed(left),
                right: self.boxed(right),
            },
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => ExprKind::Conditional {
                test: self.boxed(test),
                consequent: self.boxed(consequent),
                alternate: self.boxed(alternate),
            },
            ExprKind::Assign { op, target, value } => ExprKind::Assign {
                op,
                target: self.boxed(target),
                value: self.boxed(value),
            },
            ExprKind::Sequence(exprs) => {
                ExprKind::Sequence(exprs.into_iter().map(|e| self.expr(e)).collect())
            }
            ExprKind::Jsx(element) => return self.element(*element),
            kind @ (ExprKind::Number(_)
            | ExprKind::String(_)
            | ExprKind::Bool(_)
            | ExprKind::Null
            | ExprKind::Ident(_)) => kind,
        };
        Expr::new(kind, span)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Builders
// ══════════════════════════════════════════════════════════════════════════════

fn is_stylesheet(source: &str) -> bool {
    STYLESHEET_EXTENSIONS.iter().any(|ext| source.ends_with(ext))
}

fn const_decl(pattern: Pattern, init: Expr, span: Span) -> Stmt {
    Stmt::new(
        StmtKind::Var(VarDecl {
            kind: VarKind::Const,
            declarators: vec![Declarator {
                pattern,
                init: Some(init),
                span,
            }],
        }),
        span,
    )
}

fn named_prop(imported: String, local: Ident) -> ObjectPatternProp {
    ObjectPatternProp {
        key: PropKey::Named(imported),
        value: Pattern::Ident(local),
        default: None,
    }
}

fn assign(target: Expr, value: Expr, span: Span) -> Stmt {
    let assign = ExprKind::Assign {
        op: AssignOp::Assign,
        target: Box::new(target),
        value: Box::new(value),
    };
    Stmt::new(StmtKind::Expr(Expr::new(assign, span)), span)
}

/// `exports.<name> = <value>;`
fn export_assign(name: &str, value: Expr, span: Span) -> Stmt {
    assign(Expr::member(Expr::ident(EXPORTS, span), name, span), value, span)
}

/// `for (const __key in <module>) if (__key !== "default") exports[__key] = <module>[__key];`
fn copy_exports(module: &str, span: Span) -> Stmt {
    let key = || Expr::ident("__key", span);
    let index = |object: Expr| {
        Expr::new(
            ExprKind::Member {
                object: Box::new(object),
                property: MemberProp::Computed(Box::new(key())),
                optional: false,
            },
            span,
        )
    };
    let copy = assign(
        index(Expr::ident(EXPORTS, span)),
        index(Expr::ident(module, span)),
        span,
    );
    let test = Expr::new(
        ExprKind::Binary {
            op: BinaryOp::StrictNotEq,
            left: Box::new(key()),
            right: Box::new(Expr::string("default", span)),
        },
        span,
    );
    let body = Stmt::new(
        StmtKind::If {
            test,
            consequent: Box::new(copy),
            alternate: None,
        },
        span,
    );
    Stmt::new(
        StmtKind::ForEach {
            kind: ForEachKind::In,
            binding: VarKind::Const,
            pattern: Pattern::Ident(Ident::new("__key", span)),
            iterable: Expr::ident(module, span),
            body: Box::new(body),
        },
        span,
    )
}

/// `const { jsx: __jsx, Fragment: __Fragment } = require("react/jsx-runtime", true);`
fn prelude(span: Span) -> Stmt {
    let pattern = Pattern::Object {
        props: vec![
            named_prop("jsx".into(), Ident::new(JSX_FACTORY, span)),
            named_prop("Fragment".into(), Ident::new(FRAGMENT, span)),
        ],
        rest: None,
    };
    let init = Expr::call(
        Expr::ident(REQUIRE, span),
        vec![
            Expr::string(JSX_RUNTIME, span),
            Expr::new(ExprKind::Bool(true), span),
        ],
        span,
    );
    const_decl(pattern, init, span)
}
