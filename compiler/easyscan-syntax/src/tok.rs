use easyscan_span::Span;
use std::fmt;
use std::fmt::{Debug, Formatter};

/// A single token parsed from the source code.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub span: Span,
    pub ty: TokenType,
}

impl Token {
    /// Create a new token from a span and a token type.
    pub fn new(ty: TokenType, span: Span) -> Self {
        Self { span, ty }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ty)
    }
}

/// Enumeration of all possible token types.
///
/// Literals keep their raw source text, quotes and prefixes included. Nothing downstream needs
/// their values, and struct tags in particular must be passed on verbatim.
///
/// Operators the parser never inspects individually are folded into [`TokenType::Operator`].
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, PartialEq, Clone)]
pub enum TokenType {
    KeywordBreak,
    KeywordCase,
    KeywordChan,
    KeywordConst,
    KeywordContinue,
    KeywordDefault,
    KeywordDefer,
    KeywordElse,
    KeywordFallthrough,
    KeywordFor,
    KeywordFunc,
    KeywordGo,
    KeywordGoto,
    KeywordIf,
    KeywordImport,
    KeywordInterface,
    KeywordMap,
    KeywordPackage,
    KeywordRange,
    KeywordReturn,
    KeywordSelect,
    KeywordStruct,
    KeywordSwitch,
    KeywordType,
    KeywordVar,

    Identifier(String),
    IntegerLiteral(String),
    FloatLiteral(String),
    ImaginaryLiteral(String),
    RuneLiteral(String),
    StringLiteral(String),
    Comment(String),

    Dot,
    Ellipsis,
    Comma,
    Colon,
    Semicolon,
    Star,
    Tilde,
    Pipe,
    Arrow,
    Equal,
    Increment,
    Decrement,
    Operator(&'static str),

    OpenParen,
    CloseParen,
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::KeywordBreak => write!(f, "break"),
            TokenType::KeywordCase => write!(f, "case"),
            TokenType::KeywordChan => write!(f, "chan"),
            TokenType::KeywordConst => write!(f, "const"),
            TokenType::KeywordContinue => write!(f, "continue"),
            TokenType::KeywordDefault => write!(f, "default"),
            TokenType::KeywordDefer => write!(f, "defer"),
            TokenType::KeywordElse => write!(f, "else"),
            TokenType::KeywordFallthrough => write!(f, "fallthrough"),
            TokenType::KeywordFor => write!(f, "for"),
            TokenType::KeywordFunc => write!(f, "func"),
            TokenType::KeywordGo => write!(f, "go"),
            TokenType::KeywordGoto => write!(f, "goto"),
            TokenType::KeywordIf => write!(f, "if"),
            TokenType::KeywordImport => write!(f, "import"),
            TokenType::KeywordInterface => write!(f, "interface"),
            TokenType::KeywordMap => write!(f, "map"),
            TokenType::KeywordPackage => write!(f, "package"),
            TokenType::KeywordRange => write!(f, "range"),
            TokenType::KeywordReturn => write!(f, "return"),
            TokenType::KeywordSelect => write!(f, "select"),
            TokenType::KeywordStruct => write!(f, "struct"),
            TokenType::KeywordSwitch => write!(f, "switch"),
            TokenType::KeywordType => write!(f, "type"),
            TokenType::KeywordVar => write!(f, "var"),
            TokenType::Identifier(v) => write!(f, "{}", v),
            TokenType::IntegerLiteral(v) => write!(f, "{}", v),
            TokenType::FloatLiteral(v) => write!(f, "{}", v),
            TokenType::ImaginaryLiteral(v) => write!(f, "{}", v),
            TokenType::RuneLiteral(v) => write!(f, "{}", v),
            TokenType::StringLiteral(v) => write!(f, "{}", v),
            TokenType::Comment(v) => write!(f, "{}", v),
            TokenType::Dot => write!(f, "."),
            TokenType::Ellipsis => write!(f, "..."),
            TokenType::Comma => write!(f, ","),
            TokenType::Colon => write!(f, ":"),
            TokenType::Semicolon => write!(f, ";"),
            TokenType::Star => write!(f, "*"),
            TokenType::Tilde => write!(f, "~"),
            TokenType::Pipe => write!(f, "|"),
            TokenType::Arrow => write!(f, "<-"),
            TokenType::Equal => write!(f, "="),
            TokenType::Increment => write!(f, "++"),
            TokenType::Decrement => write!(f, "--"),
            TokenType::Operator(v) => write!(f, "{}", v),
            TokenType::OpenParen => write!(f, "("),
            TokenType::CloseParen => write!(f, ")"),
            TokenType::OpenBrace => write!(f, "{{"),
            TokenType::CloseBrace => write!(f, "}}"),
            TokenType::OpenBracket => write!(f, "["),
            TokenType::CloseBracket => write!(f, "]"),
        }
    }
}

impl TokenType {
    /// Look up the keyword spelled by `ident`, if any.
    pub fn keyword(ident: &str) -> Option<TokenType> {
        let ty = match ident {
            "break" => TokenType::KeywordBreak,
            "case" => TokenType::KeywordCase,
            "chan" => TokenType::KeywordChan,
            "const" => TokenType::KeywordConst,
            "continue" => TokenType::KeywordContinue,
            "default" => TokenType::KeywordDefault,
            "defer" => TokenType::KeywordDefer,
            "else" => TokenType::KeywordElse,
            "fallthrough" => TokenType::KeywordFallthrough,
            "for" => TokenType::KeywordFor,
            "func" => TokenType::KeywordFunc,
            "go" => TokenType::KeywordGo,
            "goto" => TokenType::KeywordGoto,
            "if" => TokenType::KeywordIf,
            "import" => TokenType::KeywordImport,
            "interface" => TokenType::KeywordInterface,
            "map" => TokenType::KeywordMap,
            "package" => TokenType::KeywordPackage,
            "range" => TokenType::KeywordRange,
            "return" => TokenType::KeywordReturn,
            "select" => TokenType::KeywordSelect,
            "struct" => TokenType::KeywordStruct,
            "switch" => TokenType::KeywordSwitch,
            "type" => TokenType::KeywordType,
            "var" => TokenType::KeywordVar,
            _ => return None,
        };
        Some(ty)
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, TokenType::Comment(_))
    }

    pub fn is_string_literal(&self) -> bool {
        matches!(self, TokenType::StringLiteral(_))
    }

    /// Determine if a newline directly after this token terminates the statement.
    ///
    /// This is the automatic semicolon insertion rule from the Go specification.
    pub fn inserts_semicolon(&self) -> bool {
        matches!(
            self,
            TokenType::Identifier(_)
                | TokenType::IntegerLiteral(_)
                | TokenType::FloatLiteral(_)
                | TokenType::ImaginaryLiteral(_)
                | TokenType::RuneLiteral(_)
                | TokenType::StringLiteral(_)
                | TokenType::KeywordBreak
                | TokenType::KeywordContinue
                | TokenType::KeywordFallthrough
                | TokenType::KeywordReturn
                | TokenType::Increment
                | TokenType::Decrement
                | TokenType::CloseParen
                | TokenType::CloseBracket
                | TokenType::CloseBrace
        )
    }

    /// Determine if this token opens a bracket pair.
    pub fn is_opening_bracket(&self) -> bool {
        matches!(
            self,
            TokenType::OpenParen | TokenType::OpenBrace | TokenType::OpenBracket
        )
    }

    /// Determine if this token closes a bracket pair.
    pub fn is_closing_bracket(&self) -> bool {
        matches!(
            self,
            TokenType::CloseParen | TokenType::CloseBrace | TokenType::CloseBracket
        )
    }

    /// Determine if this token can begin a type expression.
    pub fn starts_type(&self) -> bool {
        matches!(
            self,
            TokenType::Identifier(_)
                | TokenType::Star
                | TokenType::OpenBracket
                | TokenType::OpenParen
                | TokenType::Arrow
                | TokenType::KeywordMap
                | TokenType::KeywordChan
                | TokenType::KeywordFunc
                | TokenType::KeywordStruct
                | TokenType::KeywordInterface
        )
    }
}
