//! Expression parsing with full operator precedence.
//!
//! Precedence (lowest → highest):
//! 9. `,` (sequence)
//! 8. `=`, `+=`, … (assignment, right-assoc), arrow functions
//! 7. `? :` (conditional)
//! 6. `||`, `??`
//! 5. `&&`
//! 4. `==`, `!=`, `===`, `!==`
//! 3. `<`, `>`, `<=`, `>=`, `in`, `as` / `satisfies` (erased)
//! 2. `+`, `-` / `*`, `/`, `%` / `**` (right-assoc)
//! 1. unary `!`, `-`, `+`, `typeof`, `void`, prefix and postfix `++`/`--`
//! 0. `.`, `?.`, `[]`, `()`, `new`, non-null `!`

use canvas_lexer::token::TokenKind;
use canvas_types::ast::*;
use canvas_types::{ErrorCode, Span};

use crate::parse_decl::number_key;
use crate::parser::Parser;

/// Precedence of `<`, `>`, `in` and the erased `as` operator.
const RELATIONAL: u8 = 4;

#[derive(Debug, Clone, Copy)]
enum Infix {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

/// How an upcoming `(`/identifier starts, as far as arrows go.
enum ArrowShape {
    None,
    /// `x => …`
    Simple,
    /// `(…) => …`
    Paren,
    /// `(…): T => …` or a parenthesised expression followed by `:`.
    Ambiguous,
    /// `async …`
    Async,
}

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Entry Points
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse an expression, including the comma operator.
    pub(crate) fn parse_expression(&mut self) -> Option<Expr> {
        let first = self.parse_assignment()?;
        if !self.check(&TokenKind::Comma) {
            return Some(first);
        }
        let mut exprs = vec![first];
        while self.eat(&TokenKind::Comma) {
            exprs.push(self.parse_assignment()?);
        }
        let span = exprs[0].span.merge(self.previous_span());
        Some(Expr::new(ExprKind::Sequence(exprs), span))
    }

    /// Parse an assignment expression (no top-level comma).
    pub(crate) fn parse_assignment(&mut self) -> Option<Expr> {
        self.enter()?;
        let result = self.parse_assignment_inner();
        self.leave();
        result
    }

    fn parse_assignment_inner(&mut self) -> Option<Expr> {
        match self.arrow_shape() {
            ArrowShape::Simple => {
                let function = self.parse_simple_arrow()?;
                let span = function.span;
                return Some(Expr::new(ExprKind::Function(function), span));
            }
            ArrowShape::Paren => {
                let function = self.parse_paren_arrow()?;
                let span = function.span;
                return Some(Expr::new(ExprKind::Function(function), span));
            }
            ArrowShape::Ambiguous => {
                let checkpoint = self.checkpoint();
                match self.parse_paren_arrow() {
                    Some(function) if !self.failed_since(checkpoint) => {
                        let span = function.span;
                        return Some(Expr::new(ExprKind::Function(function), span));
                    }
                    _ => self.rewind(checkpoint),
                }
            }
            ArrowShape::Async => {
                self.reject_async(self.current_span());
                return None;
            }
            ArrowShape::None => {}
        }

        let target = self.parse_conditional()?;
        let Some(op) = assign_op(self.peek_kind()) else {
            return Some(target);
        };
        if !is_assignment_target(&target) {
            self.error_at(
                ErrorCode::INVALID_ASSIGNMENT_TARGET,
                "invalid assignment target",
                target.span,
            );
            return None;
        }
        self.advance();
        let value = self.parse_assignment()?;
        let span = target.span.merge(value.span);
        Some(Expr::new(
            ExprKind::Assign {
                op,
                target: Box::new(target),
                value: Box::new(value),
            },
            span,
        ))
    }

    fn arrow_shape(&self) -> ArrowShape {
        match self.peek_kind() {
            TokenKind::Identifier(name) if name == "async" && !self.newline_before_ahead(1) => {
                let starts_function = match self.look_ahead(1) {
                    TokenKind::Function => true,
                    TokenKind::Identifier(_) => self.look_ahead(2) == &TokenKind::Arrow,
                    TokenKind::LParen => self
                        .matching_close(self.position() + 1)
                        .is_some_and(|end| self.kind_at(end) == &TokenKind::Arrow),
                    _ => false,
                };
                if starts_function {
                    ArrowShape::Async
                } else if self.look_ahead(1) == &TokenKind::Arrow {
                    ArrowShape::Simple
                } else {
                    ArrowShape::None
                }
            }
            TokenKind::Identifier(_)
                if self.look_ahead(1) == &TokenKind::Arrow && !self.newline_before_ahead(1) =>
            {
                ArrowShape::Simple
            }
            TokenKind::LParen => match self.matching_close(self.position()) {
                Some(end) => match self.kind_at(end) {
                    TokenKind::Arrow => ArrowShape::Paren,
                    TokenKind::Colon => ArrowShape::Ambiguous,
                    _ => ArrowShape::None,
                },
                None => ArrowShape::None,
            },
            _ => ArrowShape::None,
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Precedence Chain
    // ══════════════════════════════════════════════════════════════════════════

    /// `Binary [ "?" Assignment ":" Assignment ]`
    fn parse_conditional(&mut self) -> Option<Expr> {
        let test = self.parse_binary(0)?;
        if !self.eat(&TokenKind::Question) {
            return Some(test);
        }
        let no_in = std::mem::replace(&mut self.no_in, false);
        let consequent = self.parse_assignment();
        self.no_in = no_in;
        let consequent = consequent?;
        self.expect(&TokenKind::Colon)?;
        let alternate = self.parse_assignment()?;
        let span = test.span.merge(alternate.span);
        Some(Expr::new(
            ExprKind::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            },
            span,
        ))
    }

    /// Precedence climbing over the binary and logical operators.
    fn parse_binary(&mut self, min_prec: u8) -> Option<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            // `value as Type` / `value satisfies Type` are erased.
            if (self.check_word("as") || self.check_word("satisfies"))
                && !self.peek().newline_before
                && min_prec <= RELATIONAL
            {
                self.advance();
                if !self.eat(&TokenKind::Const) {
                    self.skip_type()?;
                }
                left.span = left.span.merge(self.previous_span());
                continue;
            }
            if self.check(&TokenKind::Instanceof) {
                self.unsupported("instanceof checks", self.current_span());
                return None;
            }
            let Some((prec, infix)) = self.infix_operator() else {
                break;
            };
            if prec < min_prec {
                break;
            }
            self.advance();
            let right_assoc = matches!(infix, Infix::Binary(BinaryOp::Exp));
            let next_min = if right_assoc { prec } else { prec + 1 };
            let right = self.parse_binary(next_min)?;
            let span = left.span.merge(right.span);
            let kind = match infix {
                Infix::Binary(op) => ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                Infix::Logical(op) => ExprKind::Logical {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            };
            left = Expr::new(kind, span);
        }
        Some(left)
    }

    fn infix_operator(&self) -> Option<(u8, Infix)> {
        let entry = match self.peek_kind() {
            TokenKind::PipePipe => (1, Infix::Logical(LogicalOp::Or)),
            TokenKind::QuestionQuestion => (1, Infix::Logical(LogicalOp::Nullish)),
            TokenKind::AmpAmp => (2, Infix::Logical(LogicalOp::And)),
            TokenKind::EqEq => (3, Infix::Binary(BinaryOp::LooseEq)),
            TokenKind::BangEq => (3, Infix::Binary(BinaryOp::LooseNotEq)),
            TokenKind::EqEqEq => (3, Infix::Binary(BinaryOp::StrictEq)),
            TokenKind::BangEqEq => (3, Infix::Binary(BinaryOp::StrictNotEq)),
            TokenKind::Less => (RELATIONAL, Infix::Binary(BinaryOp::Less)),
            TokenKind::Greater => (RELATIONAL, Infix::Binary(BinaryOp::Greater)),
            TokenKind::LessEq => (RELATIONAL, Infix::Binary(BinaryOp::LessEq)),
            TokenKind::GreaterEq => (RELATIONAL, Infix::Binary(BinaryOp::GreaterEq)),
            TokenKind::In if !self.no_in => (RELATIONAL, Infix::Binary(BinaryOp::In)),
            TokenKind::Plus => (5, Infix::Binary(BinaryOp::Add)),
            TokenKind::Minus => (5, Infix::Binary(BinaryOp::Sub)),
            TokenKind::Star => (6, Infix::Binary(BinaryOp::Mul)),
            TokenKind::Slash => (6, Infix::Binary(BinaryOp::Div)),
            TokenKind::Percent => (6, Infix::Binary(BinaryOp::Mod)),
            TokenKind::StarStar => (7, Infix::Binary(BinaryOp::Exp)),
            _ => return None,
        };
        Some(entry)
    }

    /// Prefix operators, then postfix `++`/`--`.
    fn parse_unary(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let op = match self.peek_kind() {
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Typeof => Some(UnaryOp::TypeOf),
            TokenKind::Void => Some(UnaryOp::Void),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            self.enter()?;
            let operand = self.parse_unary();
            self.leave();
            let operand = operand?;
            let span = start.merge(operand.span);
            return Some(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            ));
        }

        match self.peek_kind() {
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let op = if self.advance().kind == TokenKind::PlusPlus {
                    UpdateOp::Increment
                } else {
                    UpdateOp::Decrement
                };
                let target = self.parse_unary()?;
                return self.update_expr(op, true, target, start);
            }
            TokenKind::Delete => {
                self.unsupported("delete expressions", start);
                return None;
            }
            TokenKind::Identifier(name)
                if name == "await"
                    && !self.newline_before_ahead(1)
                    && matches!(
                        self.look_ahead(1),
                        TokenKind::Identifier(_)
                            | TokenKind::LParen
                            | TokenKind::New
                            | TokenKind::This
                    ) =>
            {
                self.unsupported("await expressions", start);
                return None;
            }
            _ => {}
        }

        let expr = self.parse_call_member()?;
        if matches!(self.peek_kind(), TokenKind::PlusPlus | TokenKind::MinusMinus)
            && !self.peek().newline_before
        {
            let op = if self.advance().kind == TokenKind::PlusPlus {
                UpdateOp::Increment
            } else {
                UpdateOp::Decrement
            };
            let span = expr.span;
            return self.update_expr(op, false, expr, span);
        }
        Some(expr)
    }

    fn update_expr(&mut self, op: UpdateOp, prefix: bool, target: Expr, start: Span) -> Option<Expr> {
        if !is_assignment_target(&target) {
            self.error_at(
                ErrorCode::INVALID_ASSIGNMENT_TARGET,
                "invalid increment/decrement operand",
                target.span,
            );
            return None;
        }
        let span = start.merge(self.previous_span());
        Some(Expr::new(
            ExprKind::Update {
                op,
                prefix,
                target: Box::new(target),
            },
            span,
        ))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Calls & Member Access
    // ══════════════════════════════════════════════════════════════════════════

    /// `Primary { "." Name | "?." … | "[" Expr "]" | Args | "!" }`
    fn parse_call_member(&mut self) -> Option<Expr> {
        let mut expr = if self.check(&TokenKind::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };

        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let name = self.expect_property_name()?;
                    expr = member(expr, MemberProp::Name(name.name), false, name.span);
                }
                TokenKind::QuestionDot => {
                    self.advance();
                    match self.peek_kind() {
                        TokenKind::LParen => {
                            let args = self.parse_arguments()?;
                            expr = call(expr, args, true, self.previous_span());
                        }
                        TokenKind::LBracket => {
                            self.advance();
                            let property = self.parse_expression()?;
                            let end = self.expect(&TokenKind::RBracket)?.span;
                            expr = member(expr, MemberProp::Computed(Box::new(property)), true, end);
                        }
                        _ => {
                            let name = self.expect_property_name()?;
                            expr = member(expr, MemberProp::Name(name.name), true, name.span);
                        }
                    }
                }
                TokenKind::LBracket => {
                    self.advance();
                    let no_in = std::mem::replace(&mut self.no_in, false);
                    let property = self.parse_expression();
                    self.no_in = no_in;
                    let property = property?;
                    let end = self.expect(&TokenKind::RBracket)?.span;
                    expr = member(expr, MemberProp::Computed(Box::new(property)), false, end);
                }
                TokenKind::LParen => {
                    let args = self.parse_arguments()?;
                    expr = call(expr, args, false, self.previous_span());
                }
                // `useState<string>(…)`: explicit type arguments before a call.
                TokenKind::Less => {
                    let checkpoint = self.checkpoint();
                    let skipped = self.skip_type_arguments().is_some();
                    if skipped && !self.failed_since(checkpoint) && self.check(&TokenKind::LParen) {
                        continue;
                    }
                    self.rewind(checkpoint);
                    break;
                }
                // Non-null assertion: `ref.current!`
                TokenKind::Bang if !self.peek().newline_before => {
                    self.advance();
                }
                TokenKind::NoSubstitutionTemplate(_) | TokenKind::TemplateHead(_)
                    if !self.peek().newline_before =>
                {
                    self.unsupported("tagged templates", self.current_span());
                    return None;
                }
                _ => break,
            }
        }
        Some(expr)
    }

    /// `new Callee[<T>][(args)]`
    fn parse_new(&mut self) -> Option<Expr> {
        let start = self.advance().span; // eat `new`
        if self.check(&TokenKind::Dot) {
            self.unsupported("'new.target' references", start);
            return None;
        }
        let mut callee = if self.check(&TokenKind::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let name = self.expect_property_name()?;
                    callee = member(callee, MemberProp::Name(name.name), false, name.span);
                }
                TokenKind::LBracket => {
                    self.advance();
                    let property = self.parse_expression()?;
                    let end = self.expect(&TokenKind::RBracket)?.span;
                    callee = member(callee, MemberProp::Computed(Box::new(property)), false, end);
                }
                _ => break,
            }
        }
        if self.check(&TokenKind::Less) {
            self.skip_type_arguments()?;
        }
        let args = if self.check(&TokenKind::LParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        let span = start.merge(self.previous_span());
        Some(Expr::new(
            ExprKind::New {
                callee: Box::new(callee),
                args,
            },
            span,
        ))
    }

    /// `( [arg {, arg}] [,] )`
    fn parse_arguments(&mut self) -> Option<Vec<Arg>> {
        self.expect(&TokenKind::LParen)?;
        let no_in = std::mem::replace(&mut self.no_in, false);
        let mut args = Vec::new();
        while !self.check(&TokenKind::RParen) && !self.at_end() {
            let arg = if self.eat(&TokenKind::DotDotDot) {
                self.parse_assignment().map(Arg::Spread)
            } else {
                self.parse_assignment().map(Arg::Expr)
            };
            let Some(arg) = arg else {
                self.no_in = no_in;
                return None;
            };
            args.push(arg);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.no_in = no_in;
        self.expect(&TokenKind::RParen)?;
        Some(args)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Primary Expressions
    // ══════════════════════════════════════════════════════════════════════════

    fn parse_primary(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let kind = match self.peek_kind().clone() {
            TokenKind::Number(n) => {
                self.advance();
                ExprKind::Number(n)
            }
            TokenKind::String(s) => {
                self.advance();
                ExprKind::String(s)
            }
            TokenKind::NoSubstitutionTemplate(s) => {
                self.advance();
                ExprKind::Template {
                    quasis: vec![s],
                    exprs: Vec::new(),
                }
            }
            TokenKind::TemplateHead(_) => return self.parse_template(),
            TokenKind::Identifier(name) => {
                self.advance();
                ExprKind::Ident(name)
            }
            TokenKind::True => {
                self.advance();
                ExprKind::Bool(true)
            }
            TokenKind::False => {
                self.advance();
                ExprKind::Bool(false)
            }
            TokenKind::Null => {
                self.advance();
                ExprKind::Null
            }
            TokenKind::LParen => {
                self.advance();
                let no_in = std::mem::replace(&mut self.no_in, false);
                let inner = self.parse_expression();
                self.no_in = no_in;
                let inner = inner?;
                self.expect(&TokenKind::RParen)?;
                return Some(inner);
            }
            TokenKind::LBracket => return self.parse_array_literal(),
            TokenKind::LBrace => return self.parse_object_literal(),
            TokenKind::Function => {
                let function = self.parse_function_expr()?;
                let span = function.span;
                return Some(Expr::new(ExprKind::Function(function), span));
            }
            TokenKind::JsxLt => {
                let element = self.parse_jsx_element()?;
                let span = element.span;
                return Some(Expr::new(ExprKind::Jsx(Box::new(element)), span));
            }
            TokenKind::This => {
                self.unsupported("'this' references", start);
                return None;
            }
            TokenKind::Class => {
                self.unsupported("classes", start);
                return None;
            }
            TokenKind::Import => {
                self.unsupported("dynamic imports", start);
                return None;
            }
            TokenKind::Super => {
                self.unsupported("'super' references", start);
                return None;
            }
            TokenKind::Slash | TokenKind::SlashEq => {
                self.unsupported("regular expression literals", start);
                return None;
            }
            TokenKind::Eof => {
                self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, "unexpected end of file");
                return None;
            }
            other => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("unexpected '{other}'"),
                );
                return None;
            }
        };
        Some(Expr::new(kind, start))
    }

    /// `` `head${a}middle${b}tail` ``
    fn parse_template(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let TokenKind::TemplateHead(head) = self.advance().kind else {
            return None;
        };
        let no_in = std::mem::replace(&mut self.no_in, false);
        let result = self.parse_template_parts(head);
        self.no_in = no_in;
        let (quasis, exprs) = result?;
        Some(Expr::new(
            ExprKind::Template { quasis, exprs },
            start.merge(self.previous_span()),
        ))
    }

    fn parse_template_parts(&mut self, head: String) -> Option<(Vec<String>, Vec<Expr>)> {
        let mut quasis = vec![head];
        let mut exprs = Vec::new();
        loop {
            exprs.push(self.parse_expression()?);
            match self.peek_kind().clone() {
                TokenKind::TemplateMiddle(text) => {
                    self.advance();
                    quasis.push(text);
                }
                TokenKind::TemplateTail(text) => {
                    self.advance();
                    quasis.push(text);
                    return Some((quasis, exprs));
                }
                other => {
                    self.error_at_current(
                        ErrorCode::UNEXPECTED_TOKEN,
                        format!("expected '}}' closing a template substitution, got '{other}'"),
                    );
                    return None;
                }
            }
        }
    }

    /// `[a, , ...rest]`
    fn parse_array_literal(&mut self) -> Option<Expr> {
        let start = self.expect(&TokenKind::LBracket)?.span;
        let no_in = std::mem::replace(&mut self.no_in, false);
        let elems = self.parse_array_elems();
        self.no_in = no_in;
        let elems = elems?;
        let end = self.expect(&TokenKind::RBracket)?.span;
        Some(Expr::new(ExprKind::Array(elems), start.merge(end)))
    }

    fn parse_array_elems(&mut self) -> Option<Vec<ArrayElem>> {
        let mut elems = Vec::new();
        while !self.check(&TokenKind::RBracket) && !self.at_end() {
            if self.eat(&TokenKind::Comma) {
                elems.push(ArrayElem::Hole);
                continue;
            }
            let elem = if self.eat(&TokenKind::DotDotDot) {
                ArrayElem::Spread(self.parse_assignment()?)
            } else {
                ArrayElem::Expr(self.parse_assignment()?)
            };
            elems.push(elem);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Some(elems)
    }

    /// `{ a, b: 1, [k]: v, ...rest, m() {} }`
    fn parse_object_literal(&mut self) -> Option<Expr> {
        let start = self.expect(&TokenKind::LBrace)?.span;
        let no_in = std::mem::replace(&mut self.no_in, false);
        let props = self.parse_object_props();
        self.no_in = no_in;
        let props = props?;
        let end = self.expect(&TokenKind::RBrace)?.span;
        Some(Expr::new(ExprKind::Object(props), start.merge(end)))
    }

    fn parse_object_props(&mut self) -> Option<Vec<ObjectProp>> {
        let mut props = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            props.push(self.parse_object_prop()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Some(props)
    }

    fn parse_object_prop(&mut self) -> Option<ObjectProp> {
        let start = self.current_span();
        if self.eat(&TokenKind::DotDotDot) {
            return Some(ObjectProp::Spread(self.parse_assignment()?));
        }

        let follows_key = |kind: &TokenKind| {
            !matches!(
                kind,
                TokenKind::LParen
                    | TokenKind::Colon
                    | TokenKind::Comma
                    | TokenKind::RBrace
                    | TokenKind::Less
                    | TokenKind::Eq
            )
        };
        if let TokenKind::Identifier(word) = self.peek_kind() {
            if matches!(word.as_str(), "get" | "set") && follows_key(self.look_ahead(1)) {
                self.unsupported("getters and setters", start);
                return None;
            }
            if word == "async" && follows_key(self.look_ahead(1)) {
                self.reject_async(start);
                return None;
            }
        }

        // Shorthand `{ a }` is only possible for plain identifiers.
        let shorthand = match self.peek_kind() {
            TokenKind::Identifier(name) => Some(Ident::new(name.clone(), start)),
            _ => None,
        };
        let key = match self.peek_kind().clone() {
            TokenKind::String(s) => {
                self.advance();
                PropKey::Named(s)
            }
            TokenKind::Number(n) => {
                self.advance();
                PropKey::Named(number_key(n))
            }
            TokenKind::LBracket => {
                self.advance();
                let expr = self.parse_assignment()?;
                self.expect(&TokenKind::RBracket)?;
                PropKey::Computed(Box::new(expr))
            }
            _ => PropKey::Named(self.expect_property_name()?.name),
        };

        match self.peek_kind() {
            TokenKind::Colon => {
                self.advance();
                let value = self.parse_assignment()?;
                Some(ObjectProp::KeyValue { key, value })
            }
            TokenKind::LParen | TokenKind::Less => {
                let name = match &key {
                    PropKey::Named(name) => Some(Ident::new(name.clone(), start)),
                    PropKey::Computed(_) => None,
                };
                let function = self.parse_method(name, start)?;
                let span = function.span;
                Some(ObjectProp::KeyValue {
                    key,
                    value: Expr::new(ExprKind::Function(function), span),
                })
            }
            _ => match shorthand {
                Some(ident) => Some(ObjectProp::Shorthand(ident)),
                None => {
                    self.error_at_current(
                        ErrorCode::UNEXPECTED_TOKEN,
                        format!("expected ':', got '{}'", self.peek_kind()),
                    );
                    None
                }
            },
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn assign_op(kind: &TokenKind) -> Option<AssignOp> {
    let op = match kind {
        TokenKind::Eq => AssignOp::Assign,
        TokenKind::PlusEq => AssignOp::Add,
        TokenKind::MinusEq => AssignOp::Sub,
        TokenKind::StarEq => AssignOp::Mul,
        TokenKind::SlashEq => AssignOp::Div,
        TokenKind::PercentEq => AssignOp::Mod,
        TokenKind::AmpAmpEq => AssignOp::And,
        TokenKind::PipePipeEq => AssignOp::Or,
        TokenKind::QuestionQuestionEq => AssignOp::Nullish,
        _ => return None,
    };
    Some(op)
}

/// Identifiers and non-optional member accesses can be assigned to.
fn is_assignment_target(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Ident(_) => true,
        ExprKind::Member { optional, .. } => !optional,
        _ => false,
    }
}

fn member(object: Expr, property: MemberProp, optional: bool, end: Span) -> Expr {
    let span = object.span.merge(end);
    Expr::new(
        ExprKind::Member {
            object: Box::new(object),
            property,
            optional,
        },
        span,
    )
}

fn call(callee: Expr, args: Vec<Arg>, optional: bool, end: Span) -> Expr {
    let span = callee.span.merge(end);
    Expr::new(
        ExprKind::Call {
            callee: Box::new(callee),
            args,
            optional,
        },
        span,
    )
}
