use crate::{
    ParseError, ParseResult, Token, TokenType, UnexpectedCharacterError,
    UnexpectedEndOfFileError, UnfinishedTokenError,
};
use easyscan_span::{LineIndex, SourcePosition, Span};

/// Operators and delimiters, longest spelling first so that a prefix never shadows a longer
/// operator.
const OPERATORS: [&str; 48] = [
    "<<=", ">>=", "&^=", "...", "<<", ">>", "&^", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=",
    "&&", "||", "<-", "++", "--", "==", "!=", "<=", ">=", ":=", "+", "-", "*", "/", "%", "&", "|",
    "^", "<", ">", "=", "!", "~", "(", ")", "[", "]", "{", "}", ",", ";", ".", ":",
];

pub struct LexerInput<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> LexerInput<'a> {
    /// Create a new lexer input from a string.
    pub fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn next(&mut self) -> ParseResult<char> {
        let ch = self
            .peek()
            .ok_or(ParseError::from(UnexpectedEndOfFileError {
                span: Span::new(self.position()..self.position()),
            }))?;
        self.pos += ch.len_utf8();
        Ok(ch)
    }

    /// Advance past `len` bytes that the caller has already inspected.
    fn skip(&mut self, len: usize) {
        self.pos += len;
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    fn position(&self) -> SourcePosition {
        self.pos as SourcePosition
    }

    fn slice_from(&self, start: usize) -> &'a str {
        &self.source[start..self.pos]
    }

    /// Consume characters for as long as `f` accepts them.
    fn eat_while<F>(&mut self, f: F)
    where
        F: Fn(char) -> bool,
    {
        while matches!(self.peek(), Some(ch) if f(ch)) {
            self.pos += self.peek().map_or(0, char::len_utf8);
        }
    }
}

/// A lexer for Go source to token stream conversion.
///
/// Comments are produced as tokens so that the parser can group them and attach doc comments to
/// declarations. Semicolons are inserted according to the Go specification, so the parser only
/// ever sees explicit statement terminators.
pub struct Lexer<'a> {
    input: LexerInput<'a>,
    lines: LineIndex,
    insert_semicolon: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut input = LexerInput::new(source);
        if input.peek() == Some('\u{feff}') {
            input.skip('\u{feff}'.len_utf8());
        }
        Self {
            input,
            lines: LineIndex::new(source),
            insert_semicolon: false,
        }
    }

    pub fn pos(&self) -> usize {
        self.input.pos()
    }

    /// Get the 1-based line number of a byte position in the source.
    pub fn line(&self, pos: SourcePosition) -> u32 {
        self.lines.line(pos)
    }

    /// Produce the next token from the input stream.
    ///
    /// Returns [`ParseError::UnexpectedEndOfFile`] once the input is exhausted.
    pub fn produce(&mut self) -> ParseResult<Token> {
        let token = self.produce_token()?;
        // Comments are transparent to the semicolon insertion rule.
        if !token.ty.is_comment() {
            self.insert_semicolon = token.ty.inserts_semicolon();
        }
        Ok(token)
    }

    fn produce_token(&mut self) -> ParseResult<Token> {
        while let Some(ch) = self.input.peek() {
            match ch {
                '\n' if self.insert_semicolon => {
                    let pos = self.input.position();
                    self.input.skip(1);
                    return Ok(Token::new(TokenType::Semicolon, Span::pos(pos)));
                }
                ' ' | '\t' | '\r' | '\n' => self.input.skip(1),
                _ => break,
            }
        }

        let pos = self.input.position();
        let Some(ch) = self.input.peek() else {
            if self.insert_semicolon {
                return Ok(Token::new(TokenType::Semicolon, Span::new(pos..pos)));
            }
            return Err(ParseError::from(UnexpectedEndOfFileError {
                span: Span::new(pos..pos),
            }));
        };

        match ch {
            '/' if matches!(self.input.peek_nth(1), Some('/' | '*')) => {
                if self.insert_semicolon && self.comment_ends_line() {
                    return Ok(Token::new(TokenType::Semicolon, Span::new(pos..pos)));
                }
                self.produce_comment()
            }
            '0'..='9' => self.produce_number_literal(),
            '.' if matches!(self.input.peek_nth(1), Some('0'..='9')) => {
                self.produce_number_literal()
            }
            '"' => self.produce_interpreted_literal('"', TokenType::StringLiteral),
            '\'' => self.produce_interpreted_literal('\'', TokenType::RuneLiteral),
            '`' => self.produce_raw_string_literal(),
            ch if ch.is_alphabetic() || ch == '_' => self.produce_keyword_or_identifier(),
            _ => self.produce_operator(),
        }
    }

    /// Determine if the comment(s) starting at the current position run up to the end of the
    /// line. A pending semicolon has to be emitted before such a comment.
    fn comment_ends_line(&self) -> bool {
        let mut rest = self.input.rest();
        loop {
            if rest.starts_with("//") {
                return true;
            }
            let Some(body) = rest.strip_prefix("/*") else {
                return false;
            };
            let Some(end) = body.find("*/") else {
                // Unterminated, the comment production reports it.
                return false;
            };
            if body[..end].contains('\n') {
                return true;
            }
            rest = body[end + 2..].trim_start_matches([' ', '\t', '\r']);
            if rest.is_empty() || rest.starts_with('\n') {
                return true;
            }
        }
    }

    /// Produce a line or block comment, markers included in the text.
    fn produce_comment(&mut self) -> ParseResult<Token> {
        let start = self.input.pos();
        if self.input.rest().starts_with("//") {
            self.input.eat_while(|ch| ch != '\n');
            let text = self.input.slice_from(start).trim_end_matches('\r');
            let span = Span::new(start as SourcePosition..self.input.position());
            return Ok(Token::new(TokenType::Comment(text.to_owned()), span));
        }
        let Some(end) = self.input.rest()[2..].find("*/") else {
            return Err(ParseError::from(UnfinishedTokenError {
                expected: "*/".to_owned(),
                span: Span::new(start as SourcePosition..self.input.source.len() as SourcePosition),
            }));
        };
        self.input.skip(end + 4);
        let text = self.input.slice_from(start);
        let span = Span::new(start as SourcePosition..self.input.position());
        Ok(Token::new(TokenType::Comment(text.to_owned()), span))
    }

    /// Produce an integer, floating-point or imaginary literal.
    ///
    /// The lexer only determines the extent of the literal and its kind. Digit validity is left
    /// alone since the value is never evaluated.
    fn produce_number_literal(&mut self) -> ParseResult<Token> {
        let start = self.input.pos();
        let hex = self.input.rest().starts_with("0x") || self.input.rest().starts_with("0X");
        if hex {
            self.input.skip(2);
        }
        let mut float = false;
        while let Some(ch) = self.input.peek() {
            match ch {
                'e' | 'E' if !hex => float = self.eat_exponent(),
                'p' | 'P' if hex => float = self.eat_exponent(),
                '.' if self.input.peek_nth(1) != Some('.') => {
                    float = true;
                    self.input.skip(1);
                }
                ch if ch.is_ascii_alphanumeric() || ch == '_' => self.input.skip(1),
                _ => break,
            }
        }
        let text = self.input.slice_from(start).to_owned();
        let span = Span::new(start as SourcePosition..self.input.position());
        let ty = if text.ends_with('i') {
            TokenType::ImaginaryLiteral(text)
        } else if float {
            TokenType::FloatLiteral(text)
        } else {
            TokenType::IntegerLiteral(text)
        };
        Ok(Token::new(ty, span))
    }

    fn eat_exponent(&mut self) -> bool {
        self.input.skip(1);
        if matches!(self.input.peek(), Some('+' | '-')) {
            self.input.skip(1);
        }
        true
    }

    /// Produce a string or rune literal that supports escape sequences.
    fn produce_interpreted_literal<F>(&mut self, quote: char, f: F) -> ParseResult<Token>
    where
        F: FnOnce(String) -> TokenType,
    {
        let start = self.input.pos();
        self.input.skip(1);
        loop {
            match self.input.peek() {
                Some(ch) if ch == quote => {
                    self.input.skip(1);
                    break;
                }
                Some('\\') => {
                    self.input.skip(1);
                    // The escaped character may itself be the quote or a backslash.
                    if self.input.peek().is_some_and(|ch| ch != '\n') {
                        self.input.next()?;
                    }
                }
                Some('\n') | None => {
                    return Err(ParseError::from(UnfinishedTokenError {
                        expected: quote.to_string(),
                        span: Span::new(start as SourcePosition..self.input.position()),
                    }));
                }
                Some(_) => {
                    self.input.next()?;
                }
            }
        }
        let text = self.input.slice_from(start).to_owned();
        let span = Span::new(start as SourcePosition..self.input.position());
        Ok(Token::new(f(text), span))
    }

    /// Produce a raw string literal, which may span multiple lines.
    fn produce_raw_string_literal(&mut self) -> ParseResult<Token> {
        let start = self.input.pos();
        self.input.skip(1);
        self.input.eat_while(|ch| ch != '`');
        if self.input.peek().is_none() {
            return Err(ParseError::from(UnfinishedTokenError {
                expected: "`".to_owned(),
                span: Span::new(start as SourcePosition..self.input.position()),
            }));
        }
        self.input.skip(1);
        let text = self.input.slice_from(start).to_owned();
        let span = Span::new(start as SourcePosition..self.input.position());
        Ok(Token::new(TokenType::StringLiteral(text), span))
    }

    /// Produce a keyword or identifier token from the input stream.
    fn produce_keyword_or_identifier(&mut self) -> ParseResult<Token> {
        let start = self.input.pos();
        self.input.eat_while(|ch| ch.is_alphanumeric() || ch == '_');
        let value = self.input.slice_from(start);
        let ty = TokenType::keyword(value).unwrap_or_else(|| TokenType::Identifier(value.to_owned()));
        let span = Span::new(start as SourcePosition..self.input.position());
        Ok(Token::new(ty, span))
    }

    /// Produce an operator or delimiter using the longest matching spelling.
    fn produce_operator(&mut self) -> ParseResult<Token> {
        let start = self.input.position();
        let rest = self.input.rest();
        let Some(op) = OPERATORS.iter().find(|op| rest.starts_with(**op)) else {
            let ch = self.input.next()?;
            return Err(ParseError::from(UnexpectedCharacterError {
                ch,
                span: Span::new(start..self.input.position()),
            }));
        };
        self.input.skip(op.len());
        let ty = match *op {
            "..." => TokenType::Ellipsis,
            "." => TokenType::Dot,
            "," => TokenType::Comma,
            ":" => TokenType::Colon,
            ";" => TokenType::Semicolon,
            "*" => TokenType::Star,
            "~" => TokenType::Tilde,
            "|" => TokenType::Pipe,
            "<-" => TokenType::Arrow,
            "=" => TokenType::Equal,
            "++" => TokenType::Increment,
            "--" => TokenType::Decrement,
            "(" => TokenType::OpenParen,
            ")" => TokenType::CloseParen,
            "[" => TokenType::OpenBracket,
            "]" => TokenType::CloseBracket,
            "{" => TokenType::OpenBrace,
            "}" => TokenType::CloseBrace,
            other => TokenType::Operator(other),
        };
        Ok(Token::new(ty, Span::new(start..self.input.position())))
    }
}

#[cfg(test)]
mod tests {
    use crate::lexer::Lexer;
    use crate::{ParseError, Token, TokenType, UnexpectedCharacterError, UnfinishedTokenError};
    use easyscan_span::Span;

    macro_rules! assert_lexer_parse {
        ($input:expr, $($token:expr),*) => {
            let mut lexer = Lexer::new($input);
            $(
                let tok = lexer.produce().unwrap();
                assert_eq!(tok, $token);
            )*
            assert!(matches!(lexer.produce(), Err(ParseError::UnexpectedEndOfFile(_))));
        }
    }

    macro_rules! assert_failure {
        ($input:expr, $pat:pat $(if $cond:expr)?) => {
            let mut lexer = Lexer::new($input);
            let result = loop {
                match lexer.produce() {
                    Ok(_) => continue,
                    Err(err) => break err,
                }
            };
            assert!(matches!(result, $pat $(if $cond)?), "unexpected error {:?}", result);
        };
    }

    fn ident(name: &str) -> TokenType {
        TokenType::Identifier(name.to_owned())
    }

    /// Collect every token type up to the end of input.
    fn token_types(input: &str) -> Vec<TokenType> {
        let mut lexer = Lexer::new(input);
        let mut types = vec![];
        while let Ok(tok) = lexer.produce() {
            types.push(tok.ty);
        }
        types
    }

    #[test]
    fn test_parse_keyword() {
        assert_lexer_parse!("type", Token::new(TokenType::KeywordType, Span::new(0..4)));
        assert_lexer_parse!("struct", Token::new(TokenType::KeywordStruct, Span::new(0..6)));
        // Non-keywords are turned into identifiers, with a trailing semicolon at end of input
        assert_lexer_parse!(
            "foo",
            Token::new(ident("foo"), Span::new(0..3)),
            Token::new(TokenType::Semicolon, Span::new(3..3))
        );
        assert_lexer_parse!(
            "__foo_Bar9",
            Token::new(ident("__foo_Bar9"), Span::new(0..10)),
            Token::new(TokenType::Semicolon, Span::new(10..10))
        );
    }

    #[test]
    fn test_parse_unicode_identifier() {
        assert_eq!(
            token_types("größe"),
            vec![ident("größe"), TokenType::Semicolon]
        );
    }

    #[test]
    fn test_semicolon_insertion_after_newline() {
        assert_eq!(
            token_types("package main\n\ntype A int\n"),
            vec![
                TokenType::KeywordPackage,
                ident("main"),
                TokenType::Semicolon,
                TokenType::KeywordType,
                ident("A"),
                ident("int"),
                TokenType::Semicolon,
            ]
        );
        // No semicolon follows an opening brace or an operator
        assert_eq!(
            token_types("struct {\n}\n"),
            vec![
                TokenType::KeywordStruct,
                TokenType::OpenBrace,
                TokenType::CloseBrace,
                TokenType::Semicolon,
            ]
        );
        assert_eq!(
            token_types("x ++\nreturn\n"),
            vec![
                ident("x"),
                TokenType::Increment,
                TokenType::Semicolon,
                TokenType::KeywordReturn,
                TokenType::Semicolon,
            ]
        );
    }

    #[test]
    fn test_semicolon_inserted_before_line_comment() {
        let mut lexer = Lexer::new("A int // trailing\n");
        assert_eq!(lexer.produce().unwrap().ty, ident("A"));
        assert_eq!(lexer.produce().unwrap().ty, ident("int"));
        let semi = lexer.produce().unwrap();
        assert_eq!(semi, Token::new(TokenType::Semicolon, Span::new(6..6)));
        let comment = lexer.produce().unwrap();
        assert_eq!(
            comment,
            Token::new(
                TokenType::Comment("// trailing".to_owned()),
                Span::new(6..17)
            )
        );
        assert!(matches!(
            lexer.produce(),
            Err(ParseError::UnexpectedEndOfFile(_))
        ));
    }

    #[test]
    fn test_block_comment_on_one_line_keeps_statement_open() {
        assert_eq!(
            token_types("a /* inline */ b"),
            vec![
                ident("a"),
                TokenType::Comment("/* inline */".to_owned()),
                ident("b"),
                TokenType::Semicolon,
            ]
        );
        assert_eq!(
            token_types("a /* multi\nline */ b"),
            vec![
                ident("a"),
                TokenType::Semicolon,
                TokenType::Comment("/* multi\nline */".to_owned()),
                ident("b"),
                TokenType::Semicolon,
            ]
        );
    }

    #[test]
    fn test_parse_string_literals() {
        assert_lexer_parse!(
            r#""a \"quoted\" word""#,
            Token::new(
                TokenType::StringLiteral(r#""a \"quoted\" word""#.to_owned()),
                Span::new(0..19)
            ),
            Token::new(TokenType::Semicolon, Span::new(19..19))
        );
        assert_lexer_parse!(
            "`db:\"id\"\njson:\"id\"`",
            Token::new(
                TokenType::StringLiteral("`db:\"id\"\njson:\"id\"`".to_owned()),
                Span::new(0..19)
            ),
            Token::new(TokenType::Semicolon, Span::new(19..19))
        );
        assert_eq!(
            token_types(r"'\''"),
            vec![TokenType::RuneLiteral(r"'\''".to_owned()), TokenType::Semicolon]
        );
    }

    #[test]
    fn test_parse_number_literals() {
        assert_eq!(
            token_types("42 0x1F 1_000 3.14 1e10 .5 0x1p-2 2i"),
            vec![
                TokenType::IntegerLiteral("42".to_owned()),
                TokenType::IntegerLiteral("0x1F".to_owned()),
                TokenType::IntegerLiteral("1_000".to_owned()),
                TokenType::FloatLiteral("3.14".to_owned()),
                TokenType::FloatLiteral("1e10".to_owned()),
                TokenType::FloatLiteral(".5".to_owned()),
                TokenType::FloatLiteral("0x1p-2".to_owned()),
                TokenType::ImaginaryLiteral("2i".to_owned()),
                TokenType::Semicolon,
            ]
        );
    }

    #[test]
    fn test_parse_operators() {
        assert_eq!(
            token_types("[...]T <-chan x := a &^= b"),
            vec![
                TokenType::OpenBracket,
                TokenType::Ellipsis,
                TokenType::CloseBracket,
                ident("T"),
                TokenType::Arrow,
                TokenType::KeywordChan,
                ident("x"),
                TokenType::Operator(":="),
                ident("a"),
                TokenType::Operator("&^="),
                ident("b"),
                TokenType::Semicolon,
            ]
        );
    }

    #[test]
    fn test_unterminated_tokens() {
        assert_failure!(
            "\"abc\n\"",
            ParseError::UnfinishedToken(UnfinishedTokenError { ref expected, span })
                if expected == "\"" && span == Span::new(0..4)
        );
        assert_failure!(
            "`never closed",
            ParseError::UnfinishedToken(UnfinishedTokenError { ref expected, .. }) if expected == "`"
        );
        assert_failure!(
            "/* never closed",
            ParseError::UnfinishedToken(UnfinishedTokenError { ref expected, .. }) if expected == "*/"
        );
    }

    #[test]
    fn test_unexpected_character() {
        assert_failure!(
            "a $ b",
            ParseError::UnexpectedCharacter(UnexpectedCharacterError { ch, span })
                if ch == '$' && span == Span::new(2..3)
        );
    }
}
