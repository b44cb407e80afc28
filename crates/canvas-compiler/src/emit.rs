//! JavaScript text for a module.
//!
//! Hosts that evaluate modules themselves take this text; the canvas uses it
//! for error excerpts and snapshots. Output is a pure function of the AST:
//! two-space indentation, double-quoted strings, every statement body braced.

use canvas_types::ast::*;

/// Render a module as JavaScript source text.
pub fn emit_js(module: &Module) -> String {
    let mut emitter = Emitter::default();
    for stmt in &module.body {
        emitter.stmt(stmt);
    }
    emitter.out
}

/// Render a single expression.
pub fn emit_expr(expr: &Expr) -> String {
    let mut emitter = Emitter::default();
    emitter.expr(expr, 0);
    emitter.out
}

// ══════════════════════════════════════════════════════════════════════════════
// Precedence
// ══════════════════════════════════════════════════════════════════════════════

const PREC_SEQUENCE: u8 = 1;
const PREC_ASSIGN: u8 = 2;
const PREC_CONDITIONAL: u8 = 3;
const PREC_NULLISH: u8 = 4;
const PREC_AND: u8 = 5;
const PREC_UNARY: u8 = 15;
const PREC_POSTFIX: u8 = 16;
const PREC_CALL: u8 = 18;
const PREC_PRIMARY: u8 = 20;

fn binary_prec(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::LooseEq | BinaryOp::LooseNotEq | BinaryOp::StrictEq | BinaryOp::StrictNotEq => 9,
        BinaryOp::Less
        | BinaryOp::Greater
        | BinaryOp::LessEq
        | BinaryOp::GreaterEq
        | BinaryOp::In => 10,
        BinaryOp::Add | BinaryOp::Sub => 12,
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 13,
        BinaryOp::Exp => 14,
    }
}

fn logical_prec(op: LogicalOp) -> u8 {
    match op {
        LogicalOp::Or | LogicalOp::Nullish => PREC_NULLISH,
        LogicalOp::And => PREC_AND,
    }
}

fn prec(expr: &Expr) -> u8 {
    match &expr.kind {
        ExprKind::Sequence(_) => PREC_SEQUENCE,
        ExprKind::Assign { .. } => PREC_ASSIGN,
        ExprKind::Function(f) if f.is_arrow => PREC_ASSIGN,
        ExprKind::Conditional { .. } => PREC_CONDITIONAL,
        ExprKind::Logical { op, .. } => logical_prec(*op),
        ExprKind::Binary { op, .. } => binary_prec(*op),
        ExprKind::Unary { .. } => PREC_UNARY,
        ExprKind::Update { prefix: true, .. } => PREC_UNARY,
        ExprKind::Update { prefix: false, .. } => PREC_POSTFIX,
        ExprKind::New { .. } | ExprKind::Call { .. } | ExprKind::Member { .. } => PREC_CALL,
        _ => PREC_PRIMARY,
    }
}

/// `??` cannot be mixed with `&&`/`||` without parentheses.
fn mixes_nullish(parent: LogicalOp, child: &Expr) -> bool {
    match &child.kind {
        ExprKind::Logical { op, .. } => {
            (parent == LogicalOp::Nullish) != (*op == LogicalOp::Nullish)
        }
        _ => false,
    }
}

/// An expression statement may not begin with `{` or `function`.
fn starts_ambiguously(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Object(_) => true,
        ExprKind::Function(f) => !f.is_arrow,
        ExprKind::Member { object, .. } => starts_ambiguously(object),
        ExprKind::Call { callee, .. } => starts_ambiguously(callee),
        ExprKind::Binary { left, .. } | ExprKind::Logical { left, .. } => starts_ambiguously(left),
        ExprKind::Assign { target, .. } => starts_ambiguously(target),
        ExprKind::Conditional { test, .. } => starts_ambiguously(test),
        ExprKind::Update {
            prefix: false,
            target,
            ..
        } => starts_ambiguously(target),
        ExprKind::Sequence(exprs) => exprs.first().is_some_and(starts_ambiguously),
        _ => false,
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// A double-quoted JavaScript string literal.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// The shortest JavaScript literal for a number.
pub fn number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Emitter
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Default)]
struct Emitter {
    out: String,
    indent: usize,
}

impl Emitter {
    fn push(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn line_start(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
    }

    fn list<T>(&mut self, items: &[T], mut each: impl FnMut(&mut Self, &T)) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            each(self, item);
        }
    }

    // ── Statements ─────────────────────────────────────────────────────────

    fn stmt(&mut self, stmt: &Stmt) {
        self.line_start();
        self.stmt_inline(stmt);
        self.push("\n");
    }

    fn block(&mut self, stmts: &[Stmt]) {
        if stmts.is_empty() {
            self.push("{}");
            return;
        }
        self.push("{\n");
        self.indent += 1;
        for stmt in stmts {
            self.stmt(stmt);
        }
        self.indent -= 1;
        self.line_start();
        self.push("}");
    }

    /// The body of `if`/`for`/`while`, always braced.
    fn body(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Block(stmts) => self.block(stmts),
            _ => self.block(std::slice::from_ref(stmt)),
        }
    }

    fn stmt_inline(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Import(decl) => self.import(decl),
            StmtKind::Export(decl) => self.export(decl),
            StmtKind::Var(decl) => {
                self.var_decl(decl);
                self.push(";");
            }
            StmtKind::Function(f) => self.function(f),
            StmtKind::Return(value) => {
                self.push("return");
                if let Some(value) = value {
                    self.push(" ");
                    self.expr(value, 0);
                }
                self.push(";");
            }
            StmtKind::If {
                test,
                consequent,
                alternate,
            } => {
                self.push("if (");
                self.expr(test, 0);
                self.push(") ");
                self.body(consequent);
                if let Some(alternate) = alternate {
                    self.push(" else ");
                    if matches!(alternate.kind, StmtKind::If { .. }) {
                        self.stmt_inline(alternate);
                    } else {
                        self.body(alternate);
                    }
                }
            }
            StmtKind::For {
                init,
                test,
                update,
                body,
            } => {
                self.push("for (");
                match init {
                    Some(ForInit::Var(decl)) => self.var_decl(decl),
                    Some(ForInit::Expr(expr)) => self.expr(expr, 0),
                    None => {}
                }
                self.push(";");
                if let Some(test) = test {
                    self.push(" ");
                    self.expr(test, 0);
                }
                self.push(";");
                if let Some(update) = update {
                    self.push(" ");
                    self.expr(update, 0);
                }
                self.push(") ");
                self.body(body);
            }
            StmtKind::ForEach {
                kind,
                binding,
                pattern,
                iterable,
                body,
            } => {
                self.push("for (");
                self.push(binding.as_str());
                self.push(" ");
                self.pattern(pattern);
                self.push(match kind {
                    ForEachKind::Of => " of ",
                    ForEachKind::In => " in ",
                });
                self.expr(iterable, PREC_ASSIGN);
                self.push(") ");
                self.body(body);
            }
            StmtKind::While { test, body } => {
                self.push("while (");
                self.expr(test, 0);
                self.push(") ");
                self.body(body);
            }
            StmtKind::Switch {
                discriminant,
                cases,
            } => {
                self.push("switch (");
                self.expr(discriminant, 0);
                self.push(") {\n");
                self.indent += 1;
                for case in cases {
                    self.line_start();
                    match &case.test {
                        Some(test) => {
                            self.push("case ");
                            self.expr(test, 0);
                            self.push(":\n");
                        }
                        None => self.push("default:\n"),
                    }
                    self.indent += 1;
                    for stmt in &case.body {
                        self.stmt(stmt);
                    }
                    self.indent -= 1;
                }
                self.indent -= 1;
                self.line_start();
                self.push("}");
            }
            StmtKind::Break => self.push("break;"),
            StmtKind::Continue => self.push("continue;"),
            StmtKind::Throw(value) => {
                self.push("throw ");
                self.expr(value, 0);
                self.push(";");
            }
            StmtKind::Try {
                block,
                param,
                handler,
                finalizer,
            } => {
                self.push("try ");
                self.block(block);
                if let Some(handler) = handler {
                    self.push(" catch ");
                    if let Some(param) = param {
                        self.push("(");
                        self.pattern(param);
                        self.push(") ");
                    }
                    self.block(handler);
                }
                if let Some(finalizer) = finalizer {
                    self.push(" finally ");
                    self.block(finalizer);
                }
            }
            StmtKind::Block(stmts) => self.block(stmts),
            StmtKind::Expr(expr) => {
                if starts_ambiguously(expr) {
                    self.push("(");
                    self.expr(expr, 0);
                    self.push(")");
                } else {
                    self.expr(expr, 0);
                }
                self.push(";");
            }
            StmtKind::Empty => self.push(";"),
        }
    }

    fn var_decl(&mut self, decl: &VarDecl) {
        self.push(decl.kind.as_str());
        self.push(" ");
        self.list(&decl.declarators, |e, d| {
            e.pattern(&d.pattern);
            if let Some(init) = &d.init {
                e.push(" = ");
                e.expr(init, PREC_ASSIGN);
            }
        });
    }

    fn import(&mut self, decl: &ImportDecl) {
        self.push("import ");
        if decl.type_only {
            self.push("type ");
        }
        let mut clauses = Vec::new();
        if let Some(default) = &decl.default {
            clauses.push(default.name.clone());
        }
        if let Some(namespace) = &decl.namespace {
            clauses.push(format!("* as {}", namespace.name));
        }
        if !decl.named.is_empty() {
            let named: Vec<String> = decl
                .named
                .iter()
                .map(|s| {
                    if s.imported == s.local.name {
                        s.imported.clone()
                    } else {
                        format!("{} as {}", s.imported, s.local.name)
                    }
                })
                .collect();
            clauses.push(format!("{{ {} }}", named.join(", ")));
        }
        if !clauses.is_empty() {
            self.push(&clauses.join(", "));
            self.push(" from ");
        }
        self.push(&quote(&decl.source));
        self.push(";");
    }

    fn export(&mut self, decl: &ExportDecl) {
        self.push("export ");
        match decl {
            ExportDecl::Default(expr) => {
                self.push("default ");
                self.expr(expr, PREC_ASSIGN);
                self.push(";");
            }
            ExportDecl::DefaultFunction(f) => {
                self.push("default ");
                self.function(f);
            }
            ExportDecl::Decl(stmt) => self.stmt_inline(stmt),
            ExportDecl::Named {
                specifiers, source, ..
            } => {
                let names: Vec<String> = specifiers
                    .iter()
                    .map(|s| {
                        if s.local == s.exported {
                            s.local.clone()
                        } else {
                            format!("{} as {}", s.local, s.exported)
                        }
                    })
                    .collect();
                self.push(&format!("{{ {} }}", names.join(", ")));
                if let Some(source) = source {
                    self.push(" from ");
                    self.push(&quote(source));
                }
                self.push(";");
            }
            ExportDecl::All { source, alias, .. } => {
                self.push("*");
                if let Some(alias) = alias {
                    self.push(" as ");
                    self.push(alias);
                }
                self.push(" from ");
                self.push(&quote(source));
                self.push(";");
            }
        }
    }

    // ── Functions & Patterns ──────────────────────────────────────────────

    fn params(&mut self, f: &Function) {
        self.push("(");
        self.list(&f.params, |e, p| {
            e.pattern(&p.pattern);
            if let Some(default) = &p.default {
                e.push(" = ");
                e.expr(default, PREC_ASSIGN);
            }
        });
        if let Some(rest) = &f.rest {
            if !f.params.is_empty() {
                self.push(", ");
            }
            self.push("...");
            self.pattern(rest);
        }
        self.push(")");
    }

    fn function(&mut self, f: &Function) {
        if f.is_arrow {
            self.params(f);
            self.push(" => ");
            match &f.body {
                FunctionBody::Block(stmts) => self.block(stmts),
                FunctionBody::Expr(expr) => {
                    if starts_ambiguously(expr) {
                        self.push("(");
                        self.expr(expr, 0);
                        self.push(")");
                    } else {
                        self.expr(expr, PREC_ASSIGN);
                    }
                }
            }
            return;
        }
        self.push("function");
        if let Some(name) = &f.name {
            self.push(" ");
            self.push(&name.name);
        }
        self.params(f);
        self.push(" ");
        match &f.body {
            FunctionBody::Block(stmts) => self.block(stmts),
            FunctionBody::Expr(expr) => {
                self.push("{ return ");
                self.expr(expr, 0);
                self.push("; }");
            }
        }
    }

    fn prop_key(&mut self, key: &PropKey) {
        match key {
            PropKey::Named(name) if is_identifier(name) => self.push(name),
            PropKey::Named(name) => self.push(&quote(name)),
            PropKey::Computed(expr) => {
                self.push("[");
                self.expr(expr, PREC_ASSIGN);
                self.push("]");
            }
        }
    }

    fn pattern(&mut self, pattern: &Pattern) {
        match pattern {
            Pattern::Ident(id) => self.push(&id.name),
            Pattern::Object { props, rest } => {
                if props.is_empty() && rest.is_none() {
                    self.push("{}");
                    return;
                }
                self.push("{ ");
                self.list(props, |e, prop| {
                    let shorthand = matches!(
                        (&prop.key, &prop.value),
                        (PropKey::Named(key), Pattern::Ident(id)) if *key == id.name
                    );
                    if !shorthand {
                        e.prop_key(&prop.key);
                        e.push(": ");
                    }
                    e.pattern(&prop.value);
                    if let Some(default) = &prop.default {
                        e.push(" = ");
                        e.expr(default, PREC_ASSIGN);
                    }
                });
                if let Some(rest) = rest {
                    if !props.is_empty() {
                        self.push(", ");
                    }
                    self.push("...");
                    self.pattern(rest);
                }
                self.push(" }");
            }
            Pattern::Array { elems, rest } => {
                self.push("[");
                self.list(elems, |e, elem| {
                    if let Some(elem) = elem {
                        e.pattern(&elem.pattern);
                        if let Some(default) = &elem.default {
                            e.push(" = ");
                            e.expr(default, PREC_ASSIGN);
                        }
                    }
                });
                if let Some(rest) = rest {
                    if !elems.is_empty() {
                        self.push(", ");
                    }
                    self.push("...");
                    self.pattern(rest);
                } else if matches!(elems.last(), Some(None)) {
                    self.push(",");
                }
                self.push("]");
            }
        }
    }

    // ── Expressions ───────────────────────────────────────────────────────

    /// Emit `expr`, parenthesised when it binds looser than `min`.
    fn expr(&mut self, expr: &Expr, min: u8) {
        if prec(expr) < min {
            self.push("(");
            self.expr_inner(expr);
            self.push(")");
        } else {
            self.expr_inner(expr);
        }
    }

    fn args(&mut self, args: &[Arg]) {
        self.push("(");
        self.list(args, |e, arg| match arg {
            Arg::Expr(expr) => e.expr(expr, PREC_ASSIGN),
            Arg::Spread(expr) => {
                e.push("...");
                e.expr(expr, PREC_ASSIGN);
            }
        });
        self.push(")");
    }

    fn expr_inner(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Number(n) => self.push(&number(*n)),
            ExprKind::String(s) => self.push(&quote(s)),
            ExprKind::Template { quasis, exprs } => {
                self.push("`");
                for (i, quasi) in quasis.iter().enumerate() {
                    let escaped = quasi
                        .replace('\\', "\\\\")
                        .replace('`', "\\`")
                        .replace("${", "\\${");
                    self.push(&escaped);
                    if let Some(expr) = exprs.get(i) {
                        self.push("${");
                        self.expr(expr, 0);
                        self.push("}");
                    }
                }
                self.push("`");
            }
            ExprKind::Bool(b) => self.push(if *b { "true" } else { "false" }),
            ExprKind::Null => self.push("null"),
            ExprKind::Ident(name) => self.push(name),
            ExprKind::Array(elems) => {
                self.push("[");
                self.list(elems, |e, elem| match elem {
                    ArrayElem::Expr(expr) => e.expr(expr, PREC_ASSIGN),
                    ArrayElem::Spread(expr) => {
                        e.push("...");
                        e.expr(expr, PREC_ASSIGN);
                    }
                    ArrayElem::Hole => {}
                });
                if matches!(elems.last(), Some(ArrayElem::Hole)) {
                    self.push(",");
                }
                self.push("]");
            }
            ExprKind::Object(props) => {
                if props.is_empty() {
                    self.push("{}");
                    return;
                }
                self.push("{ ");
                self.list(props, |e, prop| match prop {
                    ObjectProp::KeyValue { key, value } => {
                        e.prop_key(key);
                        e.push(": ");
                        e.expr(value, PREC_ASSIGN);
                    }
                    ObjectProp::Shorthand(id) => e.push(&id.name),
                    ObjectProp::Spread(expr) => {
                        e.push("...");
                        e.expr(expr, PREC_ASSIGN);
                    }
                });
                self.push(" }");
            }
            ExprKind::Function(f) => self.function(f),
            ExprKind::Member {
                object,
                property,
                optional,
            } => {
                if matches!(object.kind, ExprKind::Number(_)) {
                    self.push("(");
                    self.expr_inner(object);
                    self.push(")");
                } else {
                    self.expr(object, PREC_CALL);
                }
                match property {
                    MemberProp::Name(name) => {
                        self.push(if *optional { "?." } else { "." });
                        self.push(name);
                    }
                    MemberProp::Computed(index) => {
                        self.push(if *optional { "?.[" } else { "[" });
                        self.expr(index, 0);
                        self.push("]");
                    }
                }
            }
            ExprKind::Call {
                callee,
                args,
                optional,
            } => {
                self.expr(callee, PREC_CALL);
                if *optional {
                    self.push("?.");
                }
                self.args(args);
            }
            ExprKind::New { callee, args } => {
                self.push("new ");
                self.expr(callee, PREC_CALL + 1);
                self.args(args);
            }
            ExprKind::Unary { op, operand } => {
                self.push(match op {
                    UnaryOp::Not => "!",
                    UnaryOp::Neg => "-",
                    UnaryOp::Plus => "+",
                    UnaryOp::TypeOf => "typeof ",
                    UnaryOp::Void => "void ",
                });
                if matches!(
                    operand.kind,
                    ExprKind::Unary { .. } | ExprKind::Update { prefix: true, .. }
                ) {
                    self.push("(");
                    self.expr_inner(operand);
                    self.push(")");
                } else {
                    self.expr(operand, PREC_UNARY);
                }
            }
            ExprKind::Update { op, prefix, target } => {
                let symbol = match op {
                    UpdateOp::Increment => "++",
                    UpdateOp::Decrement => "--",
                };
                if *prefix {
                    self.push(symbol);
                    self.expr(target, PREC_POSTFIX);
                } else {
                    self.expr(target, PREC_POSTFIX);
                    self.push(symbol);
                }
            }
            ExprKind::Binary { op, left, right } => {
                let p = binary_prec(*op);
                let (left_min, right_min) = if *op == BinaryOp::Exp {
                    (p + 1, p)
                } else {
                    (p, p + 1)
                };
                self.expr(left, left_min);
                self.push(" ");
                self.push(op.as_str());
                self.push(" ");
                self.expr(right, right_min);
            }
            ExprKind::Logical { op, left, right } => {
                let p = logical_prec(*op);
                self.logical_operand(*op, left, p);
                self.push(" ");
                self.push(op.as_str());
                self.push(" ");
                self.logical_operand(*op, right, p + 1);
            }
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                self.expr(test, PREC_NULLISH);
                self.push(" ? ");
                self.expr(consequent, PREC_ASSIGN);
                self.push(" : ");
                self.expr(alternate, PREC_ASSIGN);
            }
            ExprKind::Assign { op, target, value } => {
                self.expr(target, PREC_CALL);
                self.push(" ");
                self.push(op.as_str());
                self.push(" ");
                self.expr(value, PREC_ASSIGN);
            }
            ExprKind::Sequence(exprs) => {
                self.list(exprs, |e, expr| e.expr(expr, PREC_ASSIGN));
            }
            ExprKind::Jsx(element) => self.jsx(element),
        }
    }

    fn logical_operand(&mut self, op: LogicalOp, operand: &Expr, min: u8) {
        if mixes_nullish(op, operand) {
            self.push("(");
            self.expr_inner(operand);
            self.push(")");
        } else {
            self.expr(operand, min);
        }
    }

    // ── Markup ────────────────────────────────────────────────────────────

    fn jsx_name(&mut self, name: &JsxName) {
        match name {
            JsxName::Fragment => {}
            JsxName::Tag(tag) => self.push(tag),
            JsxName::Component(expr) => self.expr(expr, PREC_CALL),
        }
    }

    fn jsx(&mut self, element: &JsxElement) {
        self.push("<");
        self.jsx_name(&element.name);
        for attr in &element.attrs {
            self.push(" ");
            match attr {
                JsxAttr::Named { name, value, .. } => {
                    self.push(name);
                    match value {
                        None => {}
                        Some(JsxAttrValue::String(text)) => {
                            self.push("=");
                            self.push(&quote(text));
                        }
                        Some(JsxAttrValue::Expr(expr)) => {
                            self.push("={");
                            self.expr(expr, PREC_ASSIGN);
                            self.push("}");
                        }
                        Some(JsxAttrValue::Element(child)) => {
                            self.push("=");
                            self.jsx(child);
                        }
                    }
                }
                JsxAttr::Spread(expr) => {
                    self.push("{...");
                    self.expr(expr, PREC_ASSIGN);
                    self.push("}");
                }
            }
        }
        if element.children.is_empty() && element.name != JsxName::Fragment {
            self.push(" />");
            return;
        }
        self.push(">");
        for child in &element.children {
            match child {
                JsxChild::Text(text) => self.push(text),
                JsxChild::Expr(expr) => {
                    self.push("{");
                    self.expr(expr, 0);
                    self.push("}");
                }
                JsxChild::Element(child) => self.jsx(child),
            }
        }
        self.push("</");
        self.jsx_name(&element.name);
        self.push(">");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas_parser::parse_source;
    use canvas_types::SourceFile;
    use pretty_assertions::assert_eq;

    fn round(source: &str) -> String {
        let file = SourceFile::new("/t.tsx", source);
        let module = parse_source(&file).module.expect("parses");
        emit_js(&module)
    }

    #[test]
    fn test_statements() {
        assert_eq!(
            round("let a = 1, b;\nif (a) b = 2;\nelse if (b) { a++; } else a--;"),
            "let a = 1, b;\nif (a) {\n  b = 2;\n} else if (b) {\n  a++;\n} else {\n  a--;\n}\n"
        );
    }

    #[test]
    fn test_precedence_is_preserved() {
        assert_eq!(round("x = (a + b) * c - (d - e);"), "x = (a + b) * c - (d - e);\n");
        assert_eq!(round("x = (a ?? b) || c;"), "x = (a ?? b) || c;\n");
        assert_eq!(round("x = -(-a);"), "x = -(-a);\n");
    }

    #[test]
    fn test_arrow_returning_object() {
        assert_eq!(round("const f = (a) => ({ a });"), "const f = (a) => ({ a });\n");
    }

    #[test]
    fn test_strings_and_numbers() {
        assert_eq!(quote("a\"b\n"), "\"a\\\"b\\n\"");
        assert_eq!(number(3.0), "3");
        assert_eq!(number(0.5), "0.5");
        assert_eq!(number(f64::NAN), "NaN");
    }

    #[test]
    fn test_patterns() {
        assert_eq!(
            round("const { a, b: c = 1, ...r } = o;\nconst [x, , y = 2, ...z] = l;"),
            "const { a, b: c = 1, ...r } = o;\nconst [x, , y = 2, ...z] = l;\n"
        );
    }

    #[test]
    fn test_markup_is_emitted_as_written() {
        assert_eq!(
            round("const e = <div className=\"x\" {...p}><b>hi</b>{n}</div>;"),
            "const e = <div className=\"x\" {...p}><b>hi</b>{n}</div>;\n"
        );
    }

    #[test]
    fn test_imports_and_exports() {
        assert_eq!(
            round("import React, { useState as use } from \"react\";\nexport { a as b } from \"./x\";"),
            "import React, { useState as use } from \"react\";\nexport { a as b } from \"./x\";\n"
        );
    }
}
