//! JSX element parsing.
//!
//! The lexer has already split element syntax into tag tokens, raw
//! `JsxText` runs and `{ … }` containers; this module assembles them into
//! [`JsxElement`] trees and checks that every opening tag is closed by a
//! tag of the same name.

use canvas_lexer::token::TokenKind;
use canvas_types::ast::*;
use canvas_types::{ErrorCode, Span};

use crate::parser::Parser;

impl<'src> Parser<'src> {
    /// `<Name attrs…>children</Name>`, `<Name … />` or `<>…</>`, with the
    /// opening `<` at the cursor.
    pub(crate) fn parse_jsx_element(&mut self) -> Option<JsxElement> {
        self.enter()?;
        let element = self.parse_jsx_element_inner();
        self.leave();
        element
    }

    fn parse_jsx_element_inner(&mut self) -> Option<JsxElement> {
        let start = self.expect(&TokenKind::JsxLt)?.span;

        // ── Fragment ──
        if self.eat(&TokenKind::Greater) {
            let children = self.parse_jsx_children(start, "")?;
            self.expect(&TokenKind::Greater)?;
            return Some(JsxElement {
                name: JsxName::Fragment,
                attrs: Vec::new(),
                children,
                span: start.merge(self.previous_span()),
            });
        }

        // ── Opening Tag ──
        let (name, display) = self.parse_jsx_name()?;
        let attrs = self.parse_jsx_attrs()?;

        if self.eat(&TokenKind::JsxSelfClose) {
            return Some(JsxElement {
                name,
                attrs,
                children: Vec::new(),
                span: start.merge(self.previous_span()),
            });
        }
        self.expect(&TokenKind::Greater)?;

        // ── Children & Closing Tag ──
        let children = self.parse_jsx_children(start, &display)?;
        let close_start = self.current_span();
        let (_, closing) = self.parse_jsx_name()?;
        if closing != display {
            let span = close_start.merge(self.previous_span());
            self.error_at(
                ErrorCode::MISMATCHED_CLOSING_TAG,
                format!("expected '</{display}>', found '</{closing}>'"),
                span,
            );
            return None;
        }
        self.expect(&TokenKind::Greater)?;

        Some(JsxElement {
            name,
            attrs,
            children,
            span: start.merge(self.previous_span()),
        })
    }

    /// Element name: `div`, `my-element`, `svg:rect`, `Card`, `UI.Button`.
    /// Returns the name and its source text for closing-tag matching.
    fn parse_jsx_name(&mut self) -> Option<(JsxName, String)> {
        let first = self.expect_identifier()?;

        if self.eat(&TokenKind::Colon) {
            let local = self.expect_identifier()?;
            let text = format!("{}:{}", first.name, local.name);
            return Some((JsxName::Tag(text.clone()), text));
        }

        if self.check(&TokenKind::Dot) {
            let mut text = first.name.clone();
            let mut expr = Expr::ident(first.name, first.span);
            while self.eat(&TokenKind::Dot) {
                let segment = self.expect_identifier()?;
                text.push('.');
                text.push_str(&segment.name);
                let span = expr.span.merge(segment.span);
                expr = Expr::member(expr, segment.name, span);
            }
            return Some((JsxName::Component(expr), text));
        }

        let text = first.name.clone();
        let name = if is_intrinsic(&first.name) {
            JsxName::Tag(first.name)
        } else {
            JsxName::Component(Expr::ident(first.name, first.span))
        };
        Some((name, text))
    }

    /// Attributes up to the `>` or `/>` ending the opening tag.
    fn parse_jsx_attrs(&mut self) -> Option<Vec<JsxAttr>> {
        let mut attrs = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::LBrace => {
                    let start = self.advance().span;
                    if !self.eat(&TokenKind::DotDotDot) {
                        self.error_at(
                            ErrorCode::UNEXPECTED_TOKEN,
                            "expected '...' in attribute spread",
                            start,
                        );
                        return None;
                    }
                    let expr = self.parse_jsx_container_expr()?;
                    attrs.push(JsxAttr::Spread(expr));
                }
                TokenKind::Identifier(_) => attrs.push(self.parse_jsx_named_attr()?),
                TokenKind::Greater | TokenKind::JsxSelfClose => return Some(attrs),
                TokenKind::Eof => {
                    self.error_at_current(
                        ErrorCode::UNCLOSED_ELEMENT,
                        "unexpected end of file in element tag",
                    );
                    return None;
                }
                other => {
                    self.error_at_current(
                        ErrorCode::UNEXPECTED_TOKEN,
                        format!("unexpected '{other}' in element tag"),
                    );
                    return None;
                }
            }
        }
    }

    /// `name`, `name="text"`, `name={expr}`, `name=<Element />`,
    /// `xlink:href="…"`.
    fn parse_jsx_named_attr(&mut self) -> Option<JsxAttr> {
        let first = self.expect_identifier()?;
        let mut name = first.name;
        if self.eat(&TokenKind::Colon) {
            let local = self.expect_identifier()?;
            name = format!("{name}:{}", local.name);
        }

        if !self.eat(&TokenKind::Eq) {
            return Some(JsxAttr::Named {
                name,
                value: None,
                span: first.span.merge(self.previous_span()),
            });
        }

        let value = match self.peek_kind().clone() {
            TokenKind::String(text) => {
                self.advance();
                JsxAttrValue::String(text)
            }
            TokenKind::LBrace => {
                let open = self.advance().span;
                if self.check(&TokenKind::RBrace) {
                    self.error_at(
                        ErrorCode::UNEXPECTED_TOKEN,
                        "attribute value must be a non-empty expression",
                        open.merge(self.current_span()),
                    );
                    return None;
                }
                JsxAttrValue::Expr(self.parse_jsx_container_expr()?)
            }
            TokenKind::JsxLt => JsxAttrValue::Element(self.parse_jsx_element()?),
            other => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected attribute value, got '{other}'"),
                );
                return None;
            }
        };
        Some(JsxAttr::Named {
            name,
            value: Some(value),
            span: first.span.merge(self.previous_span()),
        })
    }

    /// The expression inside `{ … }` (the `{` already consumed) plus the
    /// closing `}`.
    fn parse_jsx_container_expr(&mut self) -> Option<Expr> {
        let no_in = std::mem::replace(&mut self.no_in, false);
        let expr = self.parse_expression();
        self.no_in = no_in;
        let expr = expr?;
        self.expect(&TokenKind::RBrace)?;
        Some(expr)
    }

    /// Children up to and including the `</` of the closing tag.
    fn parse_jsx_children(&mut self, open: Span, display: &str) -> Option<Vec<JsxChild>> {
        let mut children = Vec::new();
        loop {
            match self.peek_kind().clone() {
                TokenKind::JsxText(text) => {
                    self.advance();
                    children.push(JsxChild::Text(text));
                }
                TokenKind::LBrace => {
                    self.advance();
                    // `{}` and `{/* comment */}` render nothing.
                    if self.eat(&TokenKind::RBrace) {
                        continue;
                    }
                    self.eat(&TokenKind::DotDotDot);
                    let expr = self.parse_jsx_container_expr()?;
                    children.push(JsxChild::Expr(expr));
                }
                TokenKind::JsxLt => {
                    let element = self.parse_jsx_element()?;
                    children.push(JsxChild::Element(element));
                }
                TokenKind::JsxCloseStart => {
                    self.advance();
                    return Some(children);
                }
                TokenKind::Eof => {
                    let shown = if display.is_empty() {
                        "<>".to_string()
                    } else {
                        format!("<{display}>")
                    };
                    self.error_at(
                        ErrorCode::UNCLOSED_ELEMENT,
                        format!("element {shown} is never closed"),
                        open,
                    );
                    return None;
                }
                other => {
                    self.error_at_current(
                        ErrorCode::UNEXPECTED_TOKEN,
                        format!("unexpected '{other}' in element children"),
                    );
                    return None;
                }
            }
        }
    }
}

/// Lowercase names (and custom elements like `my-widget`) are host tags;
/// anything else refers to a component in scope.
fn is_intrinsic(name: &str) -> bool {
    name.contains('-') || name.starts_with(|c: char| c.is_ascii_lowercase())
}
