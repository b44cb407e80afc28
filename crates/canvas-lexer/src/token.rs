//! Token types for the TSX lexer.
//!
//! Defines [`TokenKind`] covering every lexeme of the supported TSX subset
//! and [`Token`], which pairs a kind with a source [`Span`].

use canvas_types::Span;
use std::fmt;

/// Reserved words recognised by the lexer.
///
/// Contextual words (`of`, `from`, `as`, `type`, `interface`, `satisfies`,
/// `async`, `declare`, `readonly`) stay identifiers and are interpreted by
/// the parser from their position.
pub const ALL_KEYWORDS: &[&str] = &[
    // Declarations (5)
    "const", "let", "var", "function", "class",
    // Control flow (14)
    "if", "else", "for", "while", "do", "break", "continue", "return", "throw", "try",
    "catch", "finally", "switch", "case",
    // Modules (3)
    "import", "export", "default",
    // Operators (6)
    "new", "typeof", "void", "delete", "in", "instanceof",
    // Literals (4)
    "true", "false", "null", "this",
    // Reserved, unsupported (4)
    "enum", "extends", "super", "yield",
];

// ─────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────

/// A single token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// A line break separates this token from the previous one. Drives
    /// automatic semicolon insertion in the parser.
    pub newline_before: bool,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            span,
            newline_before: false,
        }
    }

    /// Returns `true` if this token is a reserved keyword.
    pub fn is_keyword(&self) -> bool {
        self.kind.is_keyword()
    }
}

// ─────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────

/// Every token kind of the supported TSX subset.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ── Literals ──────────────────────────────────────────────

    /// `42`, `3.14`, `0xff`, `1e3`
    Number(f64),
    /// `"hello"` / `'hello'`, escapes already processed. Inside a JSX tag
    /// the text is kept raw.
    String(String),

    // ── Template literals ────────────────────────────────────

    /// `` `text` `` with no substitutions.
    NoSubstitutionTemplate(String),
    /// `` `text${ ``: text before the first substitution.
    TemplateHead(String),
    /// `}text${`: text between two substitutions.
    TemplateMiddle(String),
    /// `` }text` ``: text after the last substitution.
    TemplateTail(String),

    // ── Identifiers ──────────────────────────────────────────

    /// `count`, `setCount`, `$el`; inside a JSX tag also `aria-label`.
    Identifier(String),

    // ── Keywords ─────────────────────────────────────────────

    Const,
    Let,
    Var,
    Function,
    Class,
    If,
    Else,
    For,
    While,
    Do,
    Break,
    Continue,
    Return,
    Throw,
    Try,
    Catch,
    Finally,
    Switch,
    Case,
    Import,
    Export,
    Default,
    New,
    Typeof,
    Void,
    Delete,
    In,
    Instanceof,
    True,
    False,
    Null,
    This,
    Enum,
    Extends,
    Super,
    Yield,

    // ── Operators ────────────────────────────────────────────

    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
    PlusPlus,
    MinusMinus,
    Eq,
    EqEq,
    EqEqEq,
    BangEq,
    BangEqEq,
    Bang,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    AmpAmp,
    PipePipe,
    Amp,
    Pipe,
    Question,
    QuestionQuestion,
    QuestionDot,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    AmpAmpEq,
    PipePipeEq,
    QuestionQuestionEq,
    /// `=>`
    Arrow,

    // ── Punctuation ──────────────────────────────────────────

    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Colon,
    Dot,
    DotDotDot,

    // ── Markup ───────────────────────────────────────────────

    /// `<` opening a JSX tag.
    JsxLt,
    /// `</` opening a closing tag.
    JsxCloseStart,
    /// `/>` ending a self-closing tag.
    JsxSelfClose,
    /// Raw text between tags (whitespace and entities untouched).
    JsxText(String),

    // ── Special ──────────────────────────────────────────────

    Eof,
}

impl TokenKind {
    /// Look up a reserved word.
    pub fn from_keyword(s: &str) -> Option<TokenKind> {
        let kind = match s {
            "const" => TokenKind::Const,
            "let" => TokenKind::Let,
            "var" => TokenKind::Var,
            "function" => TokenKind::Function,
            "class" => TokenKind::Class,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "while" => TokenKind::While,
            "do" => TokenKind::Do,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "return" => TokenKind::Return,
            "throw" => TokenKind::Throw,
            "try" => TokenKind::Try,
            "catch" => TokenKind::Catch,
            "finally" => TokenKind::Finally,
            "switch" => TokenKind::Switch,
            "case" => TokenKind::Case,
            "import" => TokenKind::Import,
            "export" => TokenKind::Export,
            "default" => TokenKind::Default,
            "new" => TokenKind::New,
            "typeof" => TokenKind::Typeof,
            "void" => TokenKind::Void,
            "delete" => TokenKind::Delete,
            "in" => TokenKind::In,
            "instanceof" => TokenKind::Instanceof,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "this" => TokenKind::This,
            "enum" => TokenKind::Enum,
            "extends" => TokenKind::Extends,
            "super" => TokenKind::Super,
            "yield" => TokenKind::Yield,
            _ => return None,
        };
        Some(kind)
    }

    /// Returns `true` for reserved words.
    pub fn is_keyword(&self) -> bool {
        self.keyword_text().is_some()
    }

    /// The source text of a keyword token.
    pub fn keyword_text(&self) -> Option<&'static str> {
        let text = match self {
            TokenKind::Const => "const",
            TokenKind::Let => "let",
            TokenKind::Var => "var",
            TokenKind::Function => "function",
            TokenKind::Class => "class",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::For => "for",
            TokenKind::While => "while",
            TokenKind::Do => "do",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Return => "return",
            TokenKind::Throw => "throw",
            TokenKind::Try => "try",
            TokenKind::Catch => "catch",
            TokenKind::Finally => "finally",
            TokenKind::Switch => "switch",
            TokenKind::Case => "case",
            TokenKind::Import => "import",
            TokenKind::Export => "export",
            TokenKind::Default => "default",
            TokenKind::New => "new",
            TokenKind::Typeof => "typeof",
            TokenKind::Void => "void",
            TokenKind::Delete => "delete",
            TokenKind::In => "in",
            TokenKind::Instanceof => "instanceof",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::This => "this",
            TokenKind::Enum => "enum",
            TokenKind::Extends => "extends",
            TokenKind::Super => "super",
            TokenKind::Yield => "yield",
            _ => return None,
        };
        Some(text)
    }

    /// `const`, `let`, `var` or `function`: the words the sanitizer's
    /// declaration census counts.
    pub fn is_declaration_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Const | TokenKind::Let | TokenKind::Var | TokenKind::Function
        )
    }

    /// Tokens after which a `<` is a comparison rather than a JSX tag.
    pub fn ends_expression(&self) -> bool {
        matches!(
            self,
            TokenKind::Number(_)
                | TokenKind::String(_)
                | TokenKind::NoSubstitutionTemplate(_)
                | TokenKind::TemplateTail(_)
                | TokenKind::Identifier(_)
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::This
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
        )
    }

    /// Identifier-like tokens (identifiers and keywords) usable as property
    /// names after `.` or as object keys.
    pub fn as_property_name(&self) -> Option<&str> {
        match self {
            TokenKind::Identifier(name) => Some(name),
            other => other.keyword_text(),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(text) = self.keyword_text() {
            return write!(f, "{text}");
        }
        match self {
            TokenKind::Number(n) => write!(f, "{n}"),
            TokenKind::String(s) => write!(f, "\"{s}\""),
            TokenKind::NoSubstitutionTemplate(s) => write!(f, "`{s}`"),
            TokenKind::TemplateHead(s) => write!(f, "`{s}${{"),
            TokenKind::TemplateMiddle(s) => write!(f, "}}{s}${{"),
            TokenKind::TemplateTail(s) => write!(f, "}}{s}`"),
            TokenKind::Identifier(name) => write!(f, "{name}"),
            TokenKind::JsxText(text) => write!(f, "{text}"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::StarStar => write!(f, "**"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Percent => write!(f, "%"),
            TokenKind::PlusPlus => write!(f, "++"),
            TokenKind::MinusMinus => write!(f, "--"),
            TokenKind::Eq => write!(f, "="),
            TokenKind::EqEq => write!(f, "=="),
            TokenKind::EqEqEq => write!(f, "==="),
            TokenKind::BangEq => write!(f, "!="),
            TokenKind::BangEqEq => write!(f, "!=="),
            TokenKind::Bang => write!(f, "!"),
            TokenKind::Less => write!(f, "<"),
            TokenKind::LessEq => write!(f, "<="),
            TokenKind::Greater => write!(f, ">"),
            TokenKind::GreaterEq => write!(f, ">="),
            TokenKind::AmpAmp => write!(f, "&&"),
            TokenKind::PipePipe => write!(f, "||"),
            TokenKind::Amp => write!(f, "&"),
            TokenKind::Pipe => write!(f, "|"),
            TokenKind::Question => write!(f, "?"),
            TokenKind::QuestionQuestion => write!(f, "??"),
            TokenKind::QuestionDot => write!(f, "?."),
            TokenKind::PlusEq => write!(f, "+="),
            TokenKind::MinusEq => write!(f, "-="),
            TokenKind::StarEq => write!(f, "*="),
            TokenKind::SlashEq => write!(f, "/="),
            TokenKind::PercentEq => write!(f, "%="),
            TokenKind::AmpAmpEq => write!(f, "&&="),
            TokenKind::PipePipeEq => write!(f, "||="),
            TokenKind::QuestionQuestionEq => write!(f, "??="),
            TokenKind::Arrow => write!(f, "=>"),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::LBrace => write!(f, "{{"),
            TokenKind::RBrace => write!(f, "}}"),
            TokenKind::LBracket => write!(f, "["),
            TokenKind::RBracket => write!(f, "]"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Semicolon => write!(f, ";"),
            TokenKind::Colon => write!(f, ":"),
            TokenKind::Dot => write!(f, "."),
            TokenKind::DotDotDot => write!(f, "..."),
            TokenKind::JsxLt => write!(f, "<"),
            TokenKind::JsxCloseStart => write!(f, "</"),
            TokenKind::JsxSelfClose => write!(f, "/>"),
            TokenKind::Eof => write!(f, "end of file"),
            _ => Ok(()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_keyword_recognises_all() {
        for kw in ALL_KEYWORDS {
            assert!(
                TokenKind::from_keyword(kw).is_some(),
                "'{kw}' should be a keyword"
            );
        }
    }

    #[test]
    fn test_contextual_words_are_identifiers() {
        for word in ["of", "from", "as", "type", "interface", "satisfies", "undefined"] {
            assert_eq!(TokenKind::from_keyword(word), None, "'{word}'");
        }
    }

    #[test]
    fn test_display_roundtrip_keywords() {
        for kw in ALL_KEYWORDS {
            let kind = TokenKind::from_keyword(kw).unwrap();
            assert_eq!(kind.to_string(), *kw);
        }
    }

    #[test]
    fn test_declaration_keywords() {
        assert!(TokenKind::Const.is_declaration_keyword());
        assert!(TokenKind::Function.is_declaration_keyword());
        assert!(!TokenKind::Return.is_declaration_keyword());
        assert!(!TokenKind::Identifier("type".into()).is_declaration_keyword());
    }

    #[test]
    fn test_ends_expression() {
        assert!(TokenKind::Identifier("a".into()).ends_expression());
        assert!(TokenKind::RParen.ends_expression());
        assert!(!TokenKind::Return.ends_expression());
        assert!(!TokenKind::Eq.ends_expression());
        assert!(!TokenKind::LParen.ends_expression());
    }

    #[test]
    fn test_display_operators() {
        assert_eq!(TokenKind::QuestionDot.to_string(), "?.");
        assert_eq!(TokenKind::EqEqEq.to_string(), "===");
        assert_eq!(TokenKind::LBrace.to_string(), "{");
        assert_eq!(TokenKind::TemplateHead("a".into()).to_string(), "`a${");
        assert_eq!(TokenKind::Eof.to_string(), "end of file");
    }
}
