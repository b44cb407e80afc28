//! Markup lowering: elements become `__jsx(type, props, ...children)`.

use canvas_types::ast::*;

use super::lower::Lowerer;
use super::{FRAGMENT, JSX_FACTORY};

impl Lowerer<'_> {
    pub(super) fn element(&mut self, element: JsxElement) -> Expr {
        self.uses_markup = true;
        let span = element.span;
        let tag = match element.name {
            JsxName::Fragment => Expr::ident(FRAGMENT, span),
            JsxName::Tag(name) => Expr::string(name, span),
            JsxName::Component(expr) => self.expr(expr),
        };

        let props = if element.attrs.is_empty() {
            Expr::new(ExprKind::Null, span)
        } else {
            let mut props = Vec::with_capacity(element.attrs.len());
            for attr in element.attrs {
                props.push(match attr {
                    JsxAttr::Named { name, value, span } => ObjectProp::KeyValue {
                        key: PropKey::Named(name),
                        value: match value {
                            None => Expr::new(ExprKind::Bool(true), span),
                            Some(JsxAttrValue::String(text)) => {
                                Expr::string(decode_entities(&text), span)
                            }
                            Some(JsxAttrValue::Expr(expr)) => self.expr(expr),
                            Some(JsxAttrValue::Element(child)) => self.element(child),
                        },
                    },
                    JsxAttr::Spread(expr) => ObjectProp::Spread(self.expr(expr)),
                });
            }
            Expr::new(ExprKind::Object(props), span)
        };

        let mut args = vec![tag, props];
        for child in element.children {
            match child {
                JsxChild::Text(raw) => {
                    if let Some(text) = jsx_text(&raw) {
                        args.push(Expr::string(text, span));
                    }
                }
                JsxChild::Expr(expr) => args.push(self.expr(expr)),
                JsxChild::Element(child) => args.push(self.element(child)),
            }
        }
        Expr::call(Expr::ident(JSX_FACTORY, span), args, span)
    }
}

/// The string a raw text child contributes, if any.
///
/// Lines are trimmed where they meet a line break, whitespace-only lines
/// are dropped and the remaining lines are joined by single spaces.
pub fn jsx_text(raw: &str) -> Option<String> {
    let lines: Vec<&str> = raw.split('\n').map(|l| l.trim_end_matches('\r')).collect();
    let last_non_empty = lines
        .iter()
        .rposition(|l| l.chars().any(|c| c != ' ' && c != '\t'))
        .unwrap_or(0);

    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        let line = line.replace('\t', " ");
        let mut trimmed = line.as_str();
        if i != 0 {
            trimmed = trimmed.trim_start_matches(' ');
        }
        if i != lines.len() - 1 {
            trimmed = trimmed.trim_end_matches(' ');
        }
        if trimmed.is_empty() {
            continue;
        }
        out.push_str(trimmed);
        if i != last_non_empty {
            out.push(' ');
        }
    }
    (!out.is_empty()).then(|| decode_entities(&out))
}

/// Decode the HTML character references markup text may contain.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| entity(&rest[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn entity(name: &str) -> Option<char> {
    if let Some(code) = name.strip_prefix('#') {
        let value = match code.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => code.parse().ok()?,
        };
        return char::from_u32(value);
    }
    Some(match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "copy" => '©',
        "reg" => '®',
        "trade" => '™',
        "hellip" => '…',
        "mdash" => '—',
        "ndash" => '–',
        "middot" => '·',
        "times" => '×',
        "rarr" => '→',
        "larr" => '←',
        "bull" => '•',
        _ => return None,
    })
}
