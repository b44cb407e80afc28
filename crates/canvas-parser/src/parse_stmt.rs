//! Module and statement parsing.

use crate::parser::Parser;
use canvas_lexer::token::TokenKind;
use canvas_types::ast::*;
use canvas_types::{ErrorCode, Span};

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Module
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse a whole file: `{ Statement }`.
    pub(crate) fn parse_module(&mut self) -> Module {
        let start = self.current_span();
        let mut body = Vec::new();
        while !self.at_end() {
            if self.too_many_errors() {
                break;
            }
            if self.check(&TokenKind::RBrace) {
                self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, "unexpected '}'");
                self.advance();
                continue;
            }
            match self.parse_statement() {
                Some(stmt) => body.push(stmt),
                None => self.synchronize(),
            }
        }
        Module {
            body,
            span: start.merge(self.previous_span()),
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Statements
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse a block of statements: `{ stmts... }`
    pub(crate) fn parse_block(&mut self) -> Option<Vec<Stmt>> {
        self.expect(&TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            if self.too_many_errors() {
                break;
            }
            match self.parse_statement() {
                Some(stmt) => stmts.push(stmt),
                None => self.synchronize(),
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Some(stmts)
    }

    /// Parse a single statement.
    pub(crate) fn parse_statement(&mut self) -> Option<Stmt> {
        self.enter()?;
        let stmt = self.parse_statement_inner();
        self.leave();
        stmt
    }

    fn parse_statement_inner(&mut self) -> Option<Stmt> {
        let start = self.current_span();
        let kind = match self.peek_kind().clone() {
            TokenKind::Import if !matches!(self.look_ahead(1), TokenKind::LParen | TokenKind::Dot) => {
                StmtKind::Import(self.parse_import()?)
            }
            TokenKind::Export => return self.parse_export(),
            TokenKind::Const | TokenKind::Let | TokenKind::Var => {
                if self.check(&TokenKind::Const) && self.look_ahead(1) == &TokenKind::Enum {
                    self.unsupported("enums", start);
                    return None;
                }
                let decl = self.parse_var_decl()?;
                self.consume_semicolon();
                StmtKind::Var(decl)
            }
            TokenKind::Function => StmtKind::Function(self.parse_function_decl()?),
            TokenKind::If => self.parse_if()?,
            TokenKind::For => self.parse_for()?,
            TokenKind::While => {
                self.advance();
                self.expect(&TokenKind::LParen)?;
                let test = self.parse_expression()?;
                self.expect(&TokenKind::RParen)?;
                let body = Box::new(self.parse_statement()?);
                StmtKind::While { test, body }
            }
            TokenKind::Switch => self.parse_switch()?,
            TokenKind::Break => {
                self.advance();
                self.consume_semicolon();
                StmtKind::Break
            }
            TokenKind::Continue => {
                self.advance();
                self.consume_semicolon();
                StmtKind::Continue
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.ends_statement() {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.consume_semicolon();
                StmtKind::Return(value)
            }
            TokenKind::Throw => {
                self.advance();
                let value = self.parse_expression()?;
                self.consume_semicolon();
                StmtKind::Throw(value)
            }
            TokenKind::Try => self.parse_try()?,
            TokenKind::LBrace => StmtKind::Block(self.parse_block()?),
            TokenKind::Semicolon => {
                self.advance();
                StmtKind::Empty
            }
            TokenKind::Class => {
                self.unsupported("classes", start);
                return None;
            }
            TokenKind::Enum => {
                self.unsupported("enums", start);
                return None;
            }
            TokenKind::Do => {
                self.unsupported("do-while loops", start);
                return None;
            }
            TokenKind::Identifier(ref word) if self.starts_type_declaration(word) => {
                self.skip_type_declaration()?;
                StmtKind::Empty
            }
            _ => {
                let expr = self.parse_expression()?;
                self.consume_semicolon();
                StmtKind::Expr(expr)
            }
        };
        Some(Stmt::new(kind, start.merge(self.previous_span())))
    }

    /// `return` / `break` without an operand: the statement ends here.
    fn ends_statement(&self) -> bool {
        self.at_end()
            || self.peek().newline_before
            || matches!(self.peek_kind(), TokenKind::Semicolon | TokenKind::RBrace)
    }

    /// `type X = ...`, `interface X {...}` and `declare ...` at statement start.
    fn starts_type_declaration(&self, word: &str) -> bool {
        let next_is_name = matches!(self.look_ahead(1), TokenKind::Identifier(_))
            && !self.newline_before_ahead(1);
        match word {
            "type" | "interface" => next_is_name,
            "declare" => !self.newline_before_ahead(1),
            _ => false,
        }
    }

    /// `const a = 1, { b } = c` (without the terminating `;`).
    pub(crate) fn parse_var_decl(&mut self) -> Option<VarDecl> {
        let kind = match self.advance().kind {
            TokenKind::Const => VarKind::Const,
            TokenKind::Let => VarKind::Let,
            _ => VarKind::Var,
        };
        let mut declarators = Vec::new();
        loop {
            let start = self.current_span();
            let pattern = self.parse_binding_pattern()?;
            // Definite assignment assertion: `let x!: T`
            self.eat(&TokenKind::Bang);
            if self.eat(&TokenKind::Colon) {
                self.skip_type()?;
            }
            let init = if self.eat(&TokenKind::Eq) {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            declarators.push(Declarator {
                pattern,
                init,
                span: start.merge(self.previous_span()),
            });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Some(VarDecl { kind, declarators })
    }

    fn parse_if(&mut self) -> Option<StmtKind> {
        self.advance(); // eat `if`
        self.expect(&TokenKind::LParen)?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RParen)?;
        let consequent = Box::new(self.parse_statement()?);
        let alternate = if self.eat(&TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Some(StmtKind::If {
            test,
            consequent,
            alternate,
        })
    }

    /// `for (init; test; update)`, `for (const x of xs)`, `for (const k in o)`
    fn parse_for(&mut self) -> Option<StmtKind> {
        let start = self.advance().span; // eat `for`
        if self.check_word("await") {
            self.unsupported("async iteration loops", start);
            return None;
        }
        self.expect(&TokenKind::LParen)?;

        let init = match self.peek_kind() {
            TokenKind::Semicolon => None,
            TokenKind::Const | TokenKind::Let | TokenKind::Var => {
                let binding = match self.peek_kind() {
                    TokenKind::Const => VarKind::Const,
                    TokenKind::Let => VarKind::Let,
                    _ => VarKind::Var,
                };
                let checkpoint = self.checkpoint();
                self.advance();
                let pattern = self.parse_binding_pattern()?;
                let each = if self.check_word("of") {
                    Some(ForEachKind::Of)
                } else if self.check(&TokenKind::In) {
                    Some(ForEachKind::In)
                } else {
                    None
                };
                if let Some(kind) = each {
                    self.advance();
                    let iterable = self.parse_assignment()?;
                    self.expect(&TokenKind::RParen)?;
                    let body = Box::new(self.parse_statement()?);
                    return Some(StmtKind::ForEach {
                        kind,
                        binding,
                        pattern,
                        iterable,
                        body,
                    });
                }
                self.rewind(checkpoint);
                self.no_in = true;
                let decl = self.parse_var_decl();
                self.no_in = false;
                Some(ForInit::Var(decl?))
            }
            _ => {
                self.no_in = true;
                let expr = self.parse_expression();
                self.no_in = false;
                let expr = expr?;
                if self.check_word("of") || self.check(&TokenKind::In) {
                    self.unsupported("loops over existing bindings", expr.span);
                    return None;
                }
                Some(ForInit::Expr(expr))
            }
        };
        self.expect(&TokenKind::Semicolon)?;
        let test = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::Semicolon)?;
        let update = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::RParen)?;
        let body = Box::new(self.parse_statement()?);
        Some(StmtKind::For {
            init,
            test,
            update,
            body,
        })
    }

    /// `switch (x) { case a: ... default: ... }`
    fn parse_switch(&mut self) -> Option<StmtKind> {
        self.advance(); // eat `switch`
        self.expect(&TokenKind::LParen)?;
        let discriminant = self.parse_expression()?;
        self.expect(&TokenKind::RParen)?;
        self.expect(&TokenKind::LBrace)?;
        let mut cases = Vec::new();
        let mut seen_default = false;
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            let test = if self.eat(&TokenKind::Default) {
                if seen_default {
                    self.error_at(
                        ErrorCode::UNEXPECTED_TOKEN,
                        "more than one 'default' clause in switch",
                        self.previous_span(),
                    );
                }
                seen_default = true;
                None
            } else {
                self.expect(&TokenKind::Case)?;
                Some(self.parse_expression()?)
            };
            self.expect(&TokenKind::Colon)?;
            let mut body = Vec::new();
            while !matches!(
                self.peek_kind(),
                TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof
            ) {
                if self.too_many_errors() {
                    return None;
                }
                match self.parse_statement() {
                    Some(stmt) => body.push(stmt),
                    None => self.synchronize(),
                }
            }
            cases.push(SwitchCase { test, body });
        }
        self.expect(&TokenKind::RBrace)?;
        Some(StmtKind::Switch {
            discriminant,
            cases,
        })
    }

    /// `try { } catch (e) { } finally { }`
    fn parse_try(&mut self) -> Option<StmtKind> {
        let start = self.advance().span; // eat `try`
        let block = self.parse_block()?;
        let mut param = None;
        let mut handler = None;
        if self.eat(&TokenKind::Catch) {
            if self.eat(&TokenKind::LParen) {
                param = Some(self.parse_binding_pattern()?);
                if self.eat(&TokenKind::Colon) {
                    self.skip_type()?;
                }
                self.expect(&TokenKind::RParen)?;
            }
            handler = Some(self.parse_block()?);
        }
        let finalizer = if self.eat(&TokenKind::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            self.error_at(
                ErrorCode::UNEXPECTED_TOKEN,
                "'try' needs a 'catch' or 'finally' block",
                start,
            );
            return None;
        }
        Some(StmtKind::Try {
            block,
            param,
            handler,
            finalizer,
        })
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Imports
    // ══════════════════════════════════════════════════════════════════════════

    /// ```text
    /// import "s";
    /// import D from "s";
    /// import D, { a, b as c } from "s";
    /// import * as ns from "s";
    /// import type { T } from "s";
    /// ```
    fn parse_import(&mut self) -> Option<ImportDecl> {
        self.advance(); // eat `import`

        if let TokenKind::String(source) = self.peek_kind().clone() {
            let source_span = self.advance().span;
            self.consume_semicolon();
            return Some(ImportDecl {
                source,
                source_span,
                default: None,
                namespace: None,
                named: Vec::new(),
                type_only: false,
            });
        }

        // `import type from "x"` imports a default binding called `type`.
        let type_only = self.check_word("type")
            && !(matches!(self.look_ahead(1), TokenKind::Identifier(w) if w == "from")
                && matches!(self.look_ahead(2), TokenKind::String(_)))
            && !matches!(self.look_ahead(1), TokenKind::Comma);
        if type_only {
            self.advance();
        }

        let mut default = None;
        let mut namespace = None;
        let mut named = Vec::new();

        if let TokenKind::Identifier(_) = self.peek_kind() {
            default = Some(self.expect_identifier()?);
            if !self.eat(&TokenKind::Comma) {
                return self.finish_import(type_only, default, namespace, named);
            }
        }

        if self.eat(&TokenKind::Star) {
            self.expect_word("as")?;
            namespace = Some(self.expect_identifier()?);
        } else if self.eat(&TokenKind::LBrace) {
            while !self.check(&TokenKind::RBrace) && !self.at_end() {
                // `import { type T, a }`: type-only specifiers vanish.
                let inline_type = self.check_word("type")
                    && !matches!(
                        self.look_ahead(1),
                        TokenKind::Comma | TokenKind::RBrace
                    )
                    && !matches!(self.look_ahead(1), TokenKind::Identifier(w) if w == "as");
                if inline_type {
                    self.advance();
                }
                let imported = match self.peek_kind().clone() {
                    TokenKind::String(s) => {
                        let span = self.advance().span;
                        Ident::new(s, span)
                    }
                    _ => self.expect_property_name()?,
                };
                let local = if self.check_word("as") {
                    self.advance();
                    self.expect_identifier()?
                } else {
                    if imported.name == "default" {
                        self.error_at(
                            ErrorCode::UNEXPECTED_TOKEN,
                            "'default' must be renamed with 'as'",
                            imported.span,
                        );
                        return None;
                    }
                    imported.clone()
                };
                if !inline_type {
                    named.push(ImportSpecifier {
                        imported: imported.name,
                        local,
                    });
                }
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RBrace)?;
        } else {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("expected import bindings, got '{}'", self.peek_kind()),
            );
            return None;
        }

        self.finish_import(type_only, default, namespace, named)
    }

    fn finish_import(
        &mut self,
        type_only: bool,
        default: Option<Ident>,
        namespace: Option<Ident>,
        named: Vec<ImportSpecifier>,
    ) -> Option<ImportDecl> {
        self.expect_word("from")?;
        let (source, source_span) = self.expect_string_literal()?;
        self.skip_import_attributes()?;
        self.consume_semicolon();
        Some(ImportDecl {
            source,
            source_span,
            default,
            namespace,
            named,
            type_only,
        })
    }

    /// `with { type: "json" }` / `assert { ... }` after a module source.
    fn skip_import_attributes(&mut self) -> Option<()> {
        let is_attributes = (self.check_word("assert") || self.check_word("with"))
            && !self.peek().newline_before
            && self.look_ahead(1) == &TokenKind::LBrace;
        if is_attributes {
            self.advance();
            self.skip_balanced()?;
        }
        Some(())
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Exports
    // ══════════════════════════════════════════════════════════════════════════

    fn parse_export(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // eat `export`

        let decl = match self.peek_kind().clone() {
            TokenKind::Default => {
                let default_span = self.advance().span;
                self.note_default_export(default_span);
                if self.check(&TokenKind::Function) {
                    ExportDecl::DefaultFunction(self.parse_function_expr()?)
                } else if self.check(&TokenKind::Class) {
                    self.unsupported("classes", self.current_span());
                    return None;
                } else if self.check_word("async") && self.look_ahead(1) == &TokenKind::Function {
                    self.unsupported("async functions", self.current_span());
                    return None;
                } else if self.check_word("interface") {
                    self.skip_type_declaration()?;
                    return Some(Stmt::new(StmtKind::Empty, start.merge(self.previous_span())));
                } else {
                    let expr = self.parse_assignment()?;
                    self.consume_semicolon();
                    ExportDecl::Default(expr)
                }
            }
            TokenKind::Const | TokenKind::Let | TokenKind::Var | TokenKind::Function => {
                let stmt = self.parse_statement()?;
                ExportDecl::Decl(Box::new(stmt))
            }
            TokenKind::Identifier(ref word) if self.starts_type_declaration(word) => {
                self.skip_type_declaration()?;
                return Some(Stmt::new(StmtKind::Empty, start.merge(self.previous_span())));
            }
            // `export type { T } from "s"`
            TokenKind::Identifier(ref word)
                if word == "type" && self.look_ahead(1) == &TokenKind::LBrace =>
            {
                self.advance();
                self.skip_balanced()?;
                if self.check_word("from") {
                    self.advance();
                    self.expect_string_literal()?;
                }
                self.consume_semicolon();
                return Some(Stmt::new(StmtKind::Empty, start.merge(self.previous_span())));
            }
            TokenKind::Star => {
                self.advance();
                let alias = if self.check_word("as") {
                    self.advance();
                    Some(self.expect_property_name()?.name)
                } else {
                    None
                };
                self.expect_word("from")?;
                let (source, source_span) = self.expect_string_literal()?;
                self.consume_semicolon();
                ExportDecl::All {
                    source,
                    source_span,
                    alias,
                }
            }
            TokenKind::LBrace => self.parse_export_list()?,
            TokenKind::Class => {
                self.unsupported("classes", self.current_span());
                return None;
            }
            TokenKind::Enum => {
                self.unsupported("enums", self.current_span());
                return None;
            }
            _ => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected declaration after 'export', got '{}'", self.peek_kind()),
                );
                return None;
            }
        };
        Some(Stmt::new(
            StmtKind::Export(decl),
            start.merge(self.previous_span()),
        ))
    }

    /// `export { a, b as c } [from "s"]`
    fn parse_export_list(&mut self) -> Option<ExportDecl> {
        self.expect(&TokenKind::LBrace)?;
        let mut specifiers = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            let inline_type = self.check_word("type")
                && !matches!(self.look_ahead(1), TokenKind::Comma | TokenKind::RBrace)
                && !matches!(self.look_ahead(1), TokenKind::Identifier(w) if w == "as");
            if inline_type {
                self.advance();
            }
            let local = self.expect_property_name()?;
            let exported = if self.check_word("as") {
                self.advance();
                self.expect_property_name()?
            } else {
                local.clone()
            };
            if exported.name == "default" {
                self.note_default_export(exported.span);
            }
            if !inline_type {
                specifiers.push(ExportSpecifier {
                    local: local.name,
                    exported: exported.name,
                });
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        let (source, source_span) = if self.check_word("from") {
            self.advance();
            let (source, span) = self.expect_string_literal()?;
            (Some(source), Some(span))
        } else {
            (None, None)
        };
        self.consume_semicolon();
        Some(ExportDecl::Named {
            specifiers,
            source,
            source_span,
        })
    }

    /// A module has at most one default export.
    fn note_default_export(&mut self, span: Span) {
        match self.default_export {
            Some(first) => self.error_at(
                ErrorCode::DUPLICATE_DEFAULT_EXPORT,
                format!("duplicate default export (first one at {first})"),
                span,
            ),
            None => self.default_export = Some(span),
        }
    }
}
