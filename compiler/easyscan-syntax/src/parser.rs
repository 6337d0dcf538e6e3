use crate::ast::{
    AstArrayType, AstChanDirection, AstChanType, AstComment, AstCommentGroup, AstDecl, AstField,
    AstFuncDecl, AstFuncType, AstGenDecl, AstGenDeclKind, AstIdentifier, AstImportSpec,
    AstInterfaceType, AstMapType, AstNamedType, AstParenType, AstPointerType, AstSourceFile,
    AstSpec, AstStringLiteral, AstStructType, AstType, AstTypeParameter, AstTypeSpec,
    AstValueSpec,
};
use crate::bracket::opens_type_parameters;
use crate::lexer::Lexer;
use crate::{ParseError, ParseResult, Token, TokenType, UnexpectedEndOfFileError, UnexpectedTokenError};
use easyscan_span::Span;
use std::collections::VecDeque;
use std::iter::Peekable;
use std::vec::IntoIter;

/// A token in the lookahead buffer, together with the comment group that leads it.
struct LookaheadToken {
    token: Token,
    lead_comment: Option<AstCommentGroup>,
}

pub struct ParserInput<'a> {
    lexer: &'a mut Lexer<'a>,
    /// Buffer of upcoming tokens.
    ///
    /// Most of the grammar is LL(1). Telling type parameter lists apart from array lengths and
    /// embedded generic fields from named fields needs a few more tokens, so this is a queue.
    la: VecDeque<LookaheadToken>,
    /// All comment groups seen so far, in source order.
    comments: Vec<AstCommentGroup>,
    /// Line of the most recent non-comment token pulled from the lexer.
    previous_line: Option<u32>,
    /// Span of the most recently consumed token.
    previous_span: Span,
    exhausted: bool,
}

impl<'a> ParserInput<'a> {
    pub fn new(lexer: &'a mut Lexer<'a>) -> Self {
        Self {
            lexer,
            la: VecDeque::new(),
            comments: Vec::new(),
            previous_line: None,
            previous_span: Span::empty(),
            exhausted: false,
        }
    }

    /// Pull the next non-comment token from the lexer, grouping the comments in front of it.
    ///
    /// Returns `None` at the end of input. Comments trailing the last token are still grouped.
    fn pull(&mut self) -> ParseResult<Option<LookaheadToken>> {
        if self.exhausted {
            return Ok(None);
        }
        let mut pending = Vec::new();
        let token = loop {
            match self.lexer.produce() {
                Ok(token) if token.ty.is_comment() => pending.push(token),
                Ok(token) => break Some(token),
                Err(ParseError::UnexpectedEndOfFile(_)) => break None,
                Err(err) => return Err(err),
            }
        };
        let lead_comment = self.group_comments(pending, token.as_ref());
        match token {
            Some(token) => {
                self.previous_line = Some(self.lexer.line(token.span.low));
                Ok(Some(LookaheadToken {
                    token,
                    lead_comment,
                }))
            }
            None => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }

    /// Group the comments between two tokens and determine the lead comment of `next`.
    ///
    /// Comments starting on the line of the previous token form a trailing group of their own,
    /// which never leads the next token. The remaining comments are grouped whenever no blank
    /// line separates them, and the last group leads `next` if it ends on the line directly
    /// above it.
    fn group_comments(
        &mut self,
        pending: Vec<Token>,
        next: Option<&Token>,
    ) -> Option<AstCommentGroup> {
        let mut pending = pending.into_iter().peekable();
        let first_line = pending.peek().map(|token| self.lexer.line(token.span.low));
        if first_line.is_some() && first_line == self.previous_line {
            let group = self.take_comment_group(&mut pending, 0);
            self.comments.push(group);
        }
        let mut last = None;
        while pending.peek().is_some() {
            let group = self.take_comment_group(&mut pending, 1);
            self.comments.push(group.clone());
            last = Some(group);
        }
        let next_line = self.lexer.line(next?.span.low);
        last.filter(|group| self.end_line(&group.span) + 1 == next_line)
    }

    /// Take comments into one group for as long as each starts at most `n` lines after the end
    /// of the previous one.
    fn take_comment_group(
        &self,
        pending: &mut Peekable<IntoIter<Token>>,
        n: u32,
    ) -> AstCommentGroup {
        let mut comments: Vec<AstComment> = Vec::new();
        let mut end_line = pending
            .peek()
            .map_or(0, |token| self.lexer.line(token.span.low));
        while let Some(token) = pending.next_if(|t| self.lexer.line(t.span.low) <= end_line + n) {
            end_line = self.end_line(&token.span);
            if let TokenType::Comment(text) = token.ty {
                comments.push(AstComment {
                    span: token.span,
                    text,
                });
            }
        }
        let span = match (comments.first(), comments.last()) {
            (Some(first), Some(last)) => Span::from_pair(&first.span, &last.span),
            _ => Span::empty(),
        };
        AstCommentGroup { span, comments }
    }

    fn end_line(&self, span: &Span) -> u32 {
        self.lexer.line(span.high.saturating_sub(1).max(span.low))
    }

    /// Make sure the lookahead buffer holds `n + 1` tokens, unless the input ends first.
    fn fill(&mut self, n: usize) -> ParseResult<()> {
        while self.la.len() <= n {
            match self.pull()? {
                Some(token) => self.la.push_back(token),
                None => break,
            }
        }
        Ok(())
    }

    /// Perform a single token lookahead.
    ///
    /// This function will fail the entire parser if the lexer fails to produce a token, except
    /// when the lexer reaches the end of input.
    pub fn lookahead(&mut self) -> ParseResult<Option<&Token>> {
        self.lookahead_nth(0)
    }

    /// Peek `n` tokens past the next one.
    pub fn lookahead_nth(&mut self, n: usize) -> ParseResult<Option<&Token>> {
        self.fill(n)?;
        Ok(self.la.get(n).map(|la| &la.token))
    }

    /// Get the comment group leading the next token, if there is one.
    pub fn lead_comment(&mut self) -> ParseResult<Option<AstCommentGroup>> {
        self.fill(0)?;
        Ok(self.la.front().and_then(|la| la.lead_comment.clone()))
    }

    /// Consume the next token from the token stream.
    pub fn eat(&mut self) -> ParseResult<Token> {
        self.fill(0)?;
        match self.la.pop_front() {
            Some(la) => {
                self.previous_span = la.token.span;
                Ok(la.token)
            }
            None => {
                let pos = self.lexer.pos() as u32;
                Err(ParseError::from(UnexpectedEndOfFileError {
                    span: Span::new(pos..pos),
                }))
            }
        }
    }

    pub fn previous_span(&self) -> Span {
        self.previous_span
    }

    /// Hand out every comment group collected so far.
    pub fn take_comments(&mut self) -> Vec<AstCommentGroup> {
        std::mem::take(&mut self.comments)
    }
}

pub struct Parser<'a> {
    input: ParserInput<'a>,
}

impl<'a> Parser<'a> {
    /// Create a new parser from a given lexer.
    pub fn new(lexer: &'a mut Lexer<'a>) -> Self {
        Self {
            input: ParserInput::new(lexer),
        }
    }

    /// Advance the token stream by one, and return the advanced token.
    pub fn eat(&mut self) -> ParseResult<Token> {
        self.input.eat()
    }

    /// Peek at the next token in the source without consuming it.
    pub fn lookahead(&mut self) -> ParseResult<Option<&Token>> {
        self.input.lookahead()
    }

    /// Peek at the token `n` positions past the next one.
    pub fn lookahead_nth(&mut self, n: usize) -> ParseResult<Option<&Token>> {
        self.input.lookahead_nth(n)
    }

    /// Peek at the next token in the source without consuming it.
    ///
    /// As indicated by the name, this function fails the parser if the input has ended.
    pub fn lookahead_or_err(&mut self) -> ParseResult<&Token> {
        let pos = self.input.lexer.pos() as u32;
        self.input
            .lookahead()?
            .ok_or(ParseError::UnexpectedEndOfFile(UnexpectedEndOfFileError {
                span: Span::new(pos..pos),
            }))
    }

    /// Determine if the next token in the token stream matches the given type.
    pub fn lookahead_check(&mut self, ty: &TokenType) -> ParseResult<bool> {
        let token = self.lookahead()?;
        match token {
            Some(token) if token.ty == *ty => Ok(true),
            _ => Ok(false),
        }
    }

    /// Determine if the token `n` positions past the next one satisfies `f`.
    pub fn lookahead_nth_is<F>(&mut self, n: usize, f: F) -> ParseResult<bool>
    where
        F: FnOnce(&TokenType) -> bool,
    {
        Ok(self.lookahead_nth(n)?.is_some_and(|token| f(&token.ty)))
    }

    /// Consume the next token from the token stream and ensure it matches the given type.
    ///
    /// If the token doesn't match, the entire parser fails.
    pub fn check(&mut self, ty: &TokenType) -> ParseResult<Token> {
        let token = self.eat()?;
        match token {
            token if token.ty == *ty => Ok(token),
            _ => Err(ParseError::UnexpectedToken(UnexpectedTokenError {
                span: token.span,
                token,
            })),
        }
    }

    /// Consume the next token and report it as unexpected.
    pub fn unexpected<T>(&mut self) -> ParseResult<T> {
        let token = self.eat()?;
        Err(ParseError::UnexpectedToken(UnexpectedTokenError {
            span: token.span,
            token,
        }))
    }

    /// Consume a statement terminator.
    ///
    /// A terminator may be omitted before a closing `)` or `}` and at the end of input, the same
    /// way the Go parser allows it.
    pub fn expect_semicolon(&mut self) -> ParseResult<()> {
        match self.lookahead()?.map(|t| &t.ty) {
            None | Some(TokenType::CloseParen | TokenType::CloseBrace) => Ok(()),
            Some(_) => self.check(&TokenType::Semicolon).map(|_| ()),
        }
    }

    /// Apply the given parser `f` to the parser repeatedly until the next token matches the given
    /// circuit breaker.
    ///
    /// Parses the applied parser `f` until the next token matches the given circuit breaker, with
    /// each call to `f` being interleaved by a single consumption of the delimiter token. A
    /// trailing delimiter is allowed.
    ///
    /// This function does not consume the circuit breaker token.
    pub fn parser_combinator_delimited<T, F>(
        &mut self,
        delimiter: &TokenType,
        circuit_breaker: &TokenType,
        f: F,
    ) -> ParseResult<Vec<T>>
    where
        F: Fn(&mut Parser) -> ParseResult<T>,
    {
        let mut items = Vec::new();
        while !self.lookahead_check(circuit_breaker)? {
            items.push(f(self)?);
            if !self.lookahead_check(circuit_breaker)? {
                self.check(delimiter)?;
            }
        }
        Ok(items)
    }

    /// Optionally apply `f`, decided by the `matcher` on the next token.
    ///
    /// If the next token is matched, the parser `f` is applied to the parser and the result is
    /// wrapped in `Some`. Otherwise, the result is `None`.
    ///
    /// The combinator does not consume the matched token, `f` is responsible for it.
    pub fn parser_combinator_take_if<T, F, M>(&mut self, matcher: M, f: F) -> ParseResult<Option<T>>
    where
        F: FnOnce(&mut Parser) -> ParseResult<T>,
        M: FnOnce(&Token) -> bool,
    {
        let token = self.lookahead()?;
        match token {
            Some(token) if matcher(token) => Ok(Some(f(self)?)),
            _ => Ok(None),
        }
    }

    /// Apply the given parser `f` to the parser repeatedly until the next token matches the given
    /// circuit breaker.
    ///
    /// This function does not consume the circuit breaker token.
    pub fn parser_combinator_many<T, F>(
        &mut self,
        circuit_breaker: &TokenType,
        f: F,
    ) -> ParseResult<Vec<T>>
    where
        F: Fn(&mut Parser) -> ParseResult<T>,
    {
        let mut items = Vec::new();
        while !self.lookahead_check(circuit_breaker)? {
            items.push(f(self)?);
        }
        Ok(items)
    }

    /// Consume tokens until `stop` matches a token outside of any bracket pair.
    ///
    /// Unbalanced closing brackets also stop the skip, as they belong to the enclosing
    /// production. Neither stopping token is consumed. Returns the span of the skipped tokens,
    /// which is empty if nothing was skipped.
    pub fn parser_combinator_skip_until<S>(&mut self, stop: S) -> ParseResult<Span>
    where
        S: Fn(&TokenType) -> bool,
    {
        let mut depth = 0usize;
        let mut span: Option<Span> = None;
        loop {
            let Some(token) = self.lookahead()? else {
                break;
            };
            if depth == 0 && (stop(&token.ty) || token.ty.is_closing_bracket()) {
                break;
            }
            if token.ty.is_opening_bracket() {
                depth += 1;
            } else if token.ty.is_closing_bracket() {
                depth -= 1;
            }
            let token = self.eat()?;
            span = Some(match span {
                Some(span) => Span::from_pair(&span, &token.span),
                None => token.span,
            });
        }
        match span {
            Some(span) => Ok(span),
            None => {
                let pos = self.input.previous_span().high;
                Ok(Span::new(pos..pos))
            }
        }
    }

    /// Consume a bracketed group such as a parameter list or a function body, without looking at
    /// its contents.
    pub fn parser_combinator_skip_group(
        &mut self,
        open: &TokenType,
        close: &TokenType,
    ) -> ParseResult<Span> {
        let start = self.check(open)?;
        self.parser_combinator_skip_until(|_| false)?;
        let end = self.check(close)?;
        Ok(Span::from_pair(&start.span, &end.span))
    }
}

impl Parser<'_> {
    /// Top-level entry for parsing a source file.
    pub fn parse(&mut self) -> ParseResult<AstSourceFile> {
        self.parse_source_file()
    }

    /// Parse a source file.
    ///
    /// ```text
    /// source_file ::= KEYWORD_PACKAGE identifier SEMICOLON (top_level_decl SEMICOLON)*
    /// ```
    pub fn parse_source_file(&mut self) -> ParseResult<AstSourceFile> {
        let doc = self.input.lead_comment()?;
        let start = self.check(&TokenType::KeywordPackage)?;
        let package = self.parse_identifier()?;
        self.expect_semicolon()?;
        let mut decls = Vec::new();
        while self.lookahead()?.is_some() {
            decls.push(self.parse_top_level_decl()?);
            self.expect_semicolon()?;
        }
        let end = decls.last().map_or(package.span, |d| *d.span());
        let node = AstSourceFile {
            span: Span::from_pair(&start.span, &end),
            doc,
            package,
            decls,
            comments: self.input.take_comments(),
        };
        Ok(node)
    }

    /// Parse a top-level declaration.
    ///
    /// ```text
    /// top_level_decl ::= gen_decl | func_decl
    /// ```
    pub fn parse_top_level_decl(&mut self) -> ParseResult<AstDecl> {
        let ty = self.lookahead_or_err()?.ty.clone();
        let node = match ty {
            TokenType::KeywordImport
            | TokenType::KeywordConst
            | TokenType::KeywordType
            | TokenType::KeywordVar => AstDecl::Gen(self.parse_gen_decl()?),
            TokenType::KeywordFunc => AstDecl::Func(self.parse_func_decl()?),
            _ => return self.unexpected(),
        };
        Ok(node)
    }

    /// Parse a declaration group.
    ///
    /// ```text
    /// gen_decl ::= (KEYWORD_IMPORT | KEYWORD_CONST | KEYWORD_TYPE | KEYWORD_VAR)
    ///              (spec | OPEN_PAREN (spec SEMICOLON)* CLOSE_PAREN)
    /// ```
    pub fn parse_gen_decl(&mut self) -> ParseResult<AstGenDecl> {
        let doc = self.input.lead_comment()?;
        let keyword = self.eat()?;
        let kind = match keyword.ty {
            TokenType::KeywordImport => AstGenDeclKind::Import,
            TokenType::KeywordConst => AstGenDeclKind::Const,
            TokenType::KeywordType => AstGenDeclKind::Type,
            TokenType::KeywordVar => AstGenDeclKind::Var,
            _ => {
                return Err(ParseError::UnexpectedToken(UnexpectedTokenError {
                    span: keyword.span,
                    token: keyword,
                }))
            }
        };
        let grouped = self.lookahead_check(&TokenType::OpenParen)?;
        let specs = if grouped {
            self.check(&TokenType::OpenParen)?;
            let specs = self.parser_combinator_many(&TokenType::CloseParen, |p| {
                let doc = p.input.lead_comment()?;
                let spec = p.parse_spec(kind, doc)?;
                p.expect_semicolon()?;
                Ok(spec)
            })?;
            self.check(&TokenType::CloseParen)?;
            specs
        } else {
            vec![self.parse_spec(kind, None)?]
        };
        let node = AstGenDecl {
            span: Span::from_pair(&keyword.span, &self.input.previous_span()),
            doc,
            kind,
            grouped,
            specs,
        };
        Ok(node)
    }

    /// Parse a single spec of a declaration group.
    pub fn parse_spec(
        &mut self,
        kind: AstGenDeclKind,
        doc: Option<AstCommentGroup>,
    ) -> ParseResult<AstSpec> {
        let node = match kind {
            AstGenDeclKind::Import => AstSpec::Import(self.parse_import_spec(doc)?),
            AstGenDeclKind::Const | AstGenDeclKind::Var => {
                AstSpec::Value(self.parse_value_spec(doc)?)
            }
            AstGenDeclKind::Type => AstSpec::Type(self.parse_type_spec(doc)?),
        };
        Ok(node)
    }

    /// Parse an import spec.
    ///
    /// ```text
    /// import_spec ::= (DOT | identifier)? STRING_LITERAL
    /// ```
    pub fn parse_import_spec(
        &mut self,
        doc: Option<AstCommentGroup>,
    ) -> ParseResult<AstImportSpec> {
        let token = self.lookahead_or_err()?;
        let start = token.span;
        let alias = match token.ty.clone() {
            TokenType::Dot => {
                self.eat()?;
                Some(".".to_owned())
            }
            TokenType::Identifier(_) => Some(self.parse_identifier()?.name),
            _ => None,
        };
        let path = self.parse_string_literal()?;
        let node = AstImportSpec {
            span: Span::from_pair(&start, &path.span),
            doc,
            alias,
            path,
        };
        Ok(node)
    }

    /// Parse a constant or variable spec. Initializer expressions are skipped.
    ///
    /// ```text
    /// value_spec ::= identifier (COMMA identifier)* type? (EQUAL expr (COMMA expr)*)?
    /// ```
    pub fn parse_value_spec(&mut self, doc: Option<AstCommentGroup>) -> ParseResult<AstValueSpec> {
        let names = self.parse_identifier_list()?;
        let ty = self.parser_combinator_take_if(|t| t.ty.starts_type(), |p| p.parse_type())?;
        self.parser_combinator_take_if(
            |t| t.ty == TokenType::Equal,
            |p| {
                p.check(&TokenType::Equal)?;
                p.parser_combinator_skip_until(|ty| *ty == TokenType::Semicolon)
            },
        )?;
        let start = names.first().map_or(Span::empty(), |n| n.span);
        let node = AstValueSpec {
            span: Span::from_pair(&start, &self.input.previous_span()),
            doc,
            names,
            ty,
        };
        Ok(node)
    }

    /// Parse a type spec.
    ///
    /// ```text
    /// type_spec ::= identifier type_parameters? EQUAL? type
    /// ```
    pub fn parse_type_spec(&mut self, doc: Option<AstCommentGroup>) -> ParseResult<AstTypeSpec> {
        let name = self.parse_identifier()?;
        let type_parameters = if self.lookahead_is_type_parameters()? {
            self.parse_type_parameters()?
        } else {
            vec![]
        };
        let alias = self
            .parser_combinator_take_if(|t| t.ty == TokenType::Equal, |p| p.eat())?
            .is_some();
        let ty = self.parse_type()?;
        let node = AstTypeSpec {
            span: Span::from_pair(&name.span, ty.span()),
            doc,
            name,
            type_parameters,
            alias,
            ty,
        };
        Ok(node)
    }

    /// Determine if the upcoming `[` opens a type parameter list rather than an array length.
    ///
    /// `type A [N]T` declares an array while `type A[T any] ...` declares a generic type. The
    /// tokens up to the matching `]` are handed to [`opens_type_parameters`] to decide.
    fn lookahead_is_type_parameters(&mut self) -> ParseResult<bool> {
        if !self.lookahead_check(&TokenType::OpenBracket)? {
            return Ok(false);
        }
        if !self.lookahead_nth_is(1, |ty| matches!(ty, TokenType::Identifier(_)))? {
            return Ok(false);
        }
        let mut contents = Vec::new();
        let mut depth = 0usize;
        let mut n = 1;
        loop {
            let Some(token) = self.lookahead_nth(n)? else {
                // Unbalanced, let the array type report it.
                return Ok(false);
            };
            if token.ty.is_opening_bracket() {
                depth += 1;
            } else if token.ty.is_closing_bracket() {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            contents.push(token.ty.clone());
            n += 1;
        }
        Ok(opens_type_parameters(&contents))
    }

    /// Parse a type parameter list. Constraints are skipped.
    ///
    /// ```text
    /// type_parameters ::= OPEN_BRACKET (identifier (COMMA identifier)* constraint COMMA?)+ CLOSE_BRACKET
    /// ```
    pub fn parse_type_parameters(&mut self) -> ParseResult<Vec<AstTypeParameter>> {
        self.check(&TokenType::OpenBracket)?;
        let mut parameters = Vec::new();
        let mut names = Vec::new();
        while !self.lookahead_check(&TokenType::CloseBracket)? {
            names.push(self.parse_identifier()?);
            if self.lookahead_check(&TokenType::Comma)? {
                self.eat()?;
                continue;
            }
            let constraint = self.parser_combinator_skip_until(|ty| *ty == TokenType::Comma)?;
            let start = names.first().map_or(constraint, |n| n.span);
            parameters.push(AstTypeParameter {
                span: Span::from_pair(&start, &constraint),
                names: std::mem::take(&mut names),
                constraint,
            });
            if self.lookahead_check(&TokenType::Comma)? {
                self.eat()?;
            }
        }
        if !names.is_empty() {
            // A name list without a constraint, such as `[T, U]`.
            return self.unexpected();
        }
        self.check(&TokenType::CloseBracket)?;
        Ok(parameters)
    }

    /// Parse a function or method declaration. The signature and body are skipped.
    ///
    /// ```text
    /// func_decl ::= KEYWORD_FUNC receiver? identifier type_parameters? signature block?
    /// ```
    pub fn parse_func_decl(&mut self) -> ParseResult<AstFuncDecl> {
        let doc = self.input.lead_comment()?;
        let start = self.check(&TokenType::KeywordFunc)?;
        let receiver = self.parser_combinator_take_if(
            |t| t.ty == TokenType::OpenParen,
            |p| p.parser_combinator_skip_group(&TokenType::OpenParen, &TokenType::CloseParen),
        )?;
        let name = self.parse_identifier()?;
        self.parser_combinator_take_if(
            |t| t.ty == TokenType::OpenBracket,
            |p| p.parser_combinator_skip_group(&TokenType::OpenBracket, &TokenType::CloseBracket),
        )?;
        self.parse_signature()?;
        self.parser_combinator_take_if(
            |t| t.ty == TokenType::OpenBrace,
            |p| p.parser_combinator_skip_group(&TokenType::OpenBrace, &TokenType::CloseBrace),
        )?;
        let node = AstFuncDecl {
            span: Span::from_pair(&start.span, &self.input.previous_span()),
            doc,
            receiver,
            name,
        };
        Ok(node)
    }

    /// Parse a function signature without keeping it.
    ///
    /// ```text
    /// signature ::= OPEN_PAREN ... CLOSE_PAREN (OPEN_PAREN ... CLOSE_PAREN | type)?
    /// ```
    pub fn parse_signature(&mut self) -> ParseResult<Span> {
        let parameters =
            self.parser_combinator_skip_group(&TokenType::OpenParen, &TokenType::CloseParen)?;
        let result = self.parser_combinator_take_if(
            |t| t.ty.starts_type(),
            |p| {
                if p.lookahead_check(&TokenType::OpenParen)? {
                    p.parser_combinator_skip_group(&TokenType::OpenParen, &TokenType::CloseParen)
                } else {
                    p.parse_type().map(|ty| *ty.span())
                }
            },
        )?;
        Ok(result.map_or(parameters, |result| Span::from_pair(&parameters, &result)))
    }

    /// Parse a type.
    ///
    /// ```text
    /// type ::= named_type
    ///        | STAR type
    ///        | OPEN_BRACKET length? CLOSE_BRACKET type
    ///        | KEYWORD_MAP OPEN_BRACKET type CLOSE_BRACKET type
    ///        | (KEYWORD_CHAN ARROW? | ARROW KEYWORD_CHAN) type
    ///        | KEYWORD_FUNC signature
    ///        | struct_type
    ///        | KEYWORD_INTERFACE OPEN_BRACE ... CLOSE_BRACE
    ///        | OPEN_PAREN type CLOSE_PAREN
    /// ```
    pub fn parse_type(&mut self) -> ParseResult<AstType> {
        let ty = self.lookahead_or_err()?.ty.clone();
        let node = match ty {
            TokenType::Identifier(_) => AstType::Named(self.parse_named_type()?),
            TokenType::Star => AstType::Pointer(self.parse_pointer_type()?),
            TokenType::OpenBracket => AstType::Array(self.parse_array_type()?),
            TokenType::KeywordMap => AstType::Map(self.parse_map_type()?),
            TokenType::KeywordChan | TokenType::Arrow => AstType::Chan(self.parse_chan_type()?),
            TokenType::KeywordFunc => {
                let start = self.check(&TokenType::KeywordFunc)?;
                let signature = self.parse_signature()?;
                AstType::Func(AstFuncType {
                    span: Span::from_pair(&start.span, &signature),
                })
            }
            TokenType::KeywordStruct => AstType::Struct(self.parse_struct_type()?),
            TokenType::KeywordInterface => {
                let start = self.check(&TokenType::KeywordInterface)?;
                let body = self
                    .parser_combinator_skip_group(&TokenType::OpenBrace, &TokenType::CloseBrace)?;
                AstType::Interface(AstInterfaceType {
                    span: Span::from_pair(&start.span, &body),
                })
            }
            TokenType::OpenParen => {
                let start = self.check(&TokenType::OpenParen)?;
                let inner = self.parse_type()?;
                let end = self.check(&TokenType::CloseParen)?;
                AstType::Paren(AstParenType {
                    span: Span::from_pair(&start.span, &end.span),
                    inner: Box::new(inner),
                })
            }
            _ => return self.unexpected(),
        };
        Ok(node)
    }

    /// Parse a named type.
    ///
    /// ```text
    /// named_type ::= identifier (DOT identifier)? (OPEN_BRACKET type (COMMA type)* COMMA? CLOSE_BRACKET)?
    /// ```
    pub fn parse_named_type(&mut self) -> ParseResult<AstNamedType> {
        let first = self.parse_identifier()?;
        let (package, name) = match self.parser_combinator_take_if(
            |t| t.ty == TokenType::Dot,
            |p| {
                p.check(&TokenType::Dot)?;
                p.parse_identifier()
            },
        )? {
            Some(name) => (Some(first), name),
            None => (None, first),
        };
        let type_arguments = self
            .parser_combinator_take_if(
                |t| t.ty == TokenType::OpenBracket,
                |p| {
                    p.check(&TokenType::OpenBracket)?;
                    let arguments = p.parser_combinator_delimited(
                        &TokenType::Comma,
                        &TokenType::CloseBracket,
                        |p| p.parse_type(),
                    )?;
                    p.check(&TokenType::CloseBracket)?;
                    Ok(arguments)
                },
            )?
            .unwrap_or_default();
        let start = package.as_ref().map_or(name.span, |p| p.span);
        let node = AstNamedType {
            span: Span::from_pair(&start, &self.input.previous_span()),
            package,
            name,
            type_arguments,
        };
        Ok(node)
    }

    /// Parse a pointer type.
    ///
    /// ```text
    /// pointer_type ::= STAR type
    /// ```
    pub fn parse_pointer_type(&mut self) -> ParseResult<AstPointerType> {
        let start = self.check(&TokenType::Star)?;
        let pointee = self.parse_type()?;
        let node = AstPointerType {
            span: Span::from_pair(&start.span, pointee.span()),
            pointee: Box::new(pointee),
        };
        Ok(node)
    }

    /// Parse an array or slice type. The length expression is skipped.
    ///
    /// ```text
    /// array_type ::= OPEN_BRACKET (ELLIPSIS | expr)? CLOSE_BRACKET type
    /// ```
    pub fn parse_array_type(&mut self) -> ParseResult<AstArrayType> {
        let start = self.check(&TokenType::OpenBracket)?;
        let length = self.parser_combinator_take_if(
            |t| t.ty != TokenType::CloseBracket,
            |p| p.parser_combinator_skip_until(|_| false),
        )?;
        self.check(&TokenType::CloseBracket)?;
        let element = self.parse_type()?;
        let node = AstArrayType {
            span: Span::from_pair(&start.span, element.span()),
            length,
            element: Box::new(element),
        };
        Ok(node)
    }

    /// Parse a map type.
    ///
    /// ```text
    /// map_type ::= KEYWORD_MAP OPEN_BRACKET type CLOSE_BRACKET type
    /// ```
    pub fn parse_map_type(&mut self) -> ParseResult<AstMapType> {
        let start = self.check(&TokenType::KeywordMap)?;
        self.check(&TokenType::OpenBracket)?;
        let key = self.parse_type()?;
        self.check(&TokenType::CloseBracket)?;
        let value = self.parse_type()?;
        let node = AstMapType {
            span: Span::from_pair(&start.span, value.span()),
            key: Box::new(key),
            value: Box::new(value),
        };
        Ok(node)
    }

    /// Parse a channel type.
    ///
    /// ```text
    /// chan_type ::= KEYWORD_CHAN ARROW? type | ARROW KEYWORD_CHAN type
    /// ```
    pub fn parse_chan_type(&mut self) -> ParseResult<AstChanType> {
        let start = self.eat()?;
        let direction = match start.ty {
            TokenType::Arrow => {
                self.check(&TokenType::KeywordChan)?;
                AstChanDirection::Receive
            }
            TokenType::KeywordChan if self.lookahead_check(&TokenType::Arrow)? => {
                self.eat()?;
                AstChanDirection::Send
            }
            TokenType::KeywordChan => AstChanDirection::Both,
            _ => {
                return Err(ParseError::UnexpectedToken(UnexpectedTokenError {
                    span: start.span,
                    token: start,
                }))
            }
        };
        let element = self.parse_type()?;
        let node = AstChanType {
            span: Span::from_pair(&start.span, element.span()),
            direction,
            element: Box::new(element),
        };
        Ok(node)
    }

    /// Parse a struct type.
    ///
    /// ```text
    /// struct_type ::= KEYWORD_STRUCT OPEN_BRACE (field_decl SEMICOLON)* CLOSE_BRACE
    /// ```
    pub fn parse_struct_type(&mut self) -> ParseResult<AstStructType> {
        let start = self.check(&TokenType::KeywordStruct)?;
        self.check(&TokenType::OpenBrace)?;
        let fields = self.parser_combinator_many(&TokenType::CloseBrace, |p| {
            let field = p.parse_field_decl()?;
            p.expect_semicolon()?;
            Ok(field)
        })?;
        let end = self.check(&TokenType::CloseBrace)?;
        let node = AstStructType {
            span: Span::from_pair(&start.span, &end.span),
            fields,
        };
        Ok(node)
    }

    /// Parse a field declaration of a struct type.
    ///
    /// ```text
    /// field_decl ::= (identifier (COMMA identifier)* type | STAR? named_type) STRING_LITERAL?
    /// ```
    pub fn parse_field_decl(&mut self) -> ParseResult<AstField> {
        let doc = self.input.lead_comment()?;
        let token = self.lookahead_or_err()?;
        let start = token.span;
        let ty = token.ty.clone();
        let (names, ty) = match ty {
            TokenType::Star => {
                let star = self.check(&TokenType::Star)?;
                let pointee = self.parse_named_type()?;
                let ty = AstType::Pointer(AstPointerType {
                    span: Span::from_pair(&star.span, &pointee.span),
                    pointee: Box::new(AstType::Named(pointee)),
                });
                (vec![], ty)
            }
            TokenType::Identifier(_) if self.lookahead_is_embedded_field()? => {
                (vec![], AstType::Named(self.parse_named_type()?))
            }
            TokenType::Identifier(_) => {
                let names = self.parse_identifier_list()?;
                (names, self.parse_type()?)
            }
            _ => return self.unexpected(),
        };
        let tag = self.parser_combinator_take_if(
            |t| t.ty.is_string_literal(),
            |p| p.parse_string_literal(),
        )?;
        let node = AstField {
            span: Span::from_pair(&start, &self.input.previous_span()),
            doc,
            names,
            ty,
            tag,
        };
        Ok(node)
    }

    /// Determine if the field starting at the next identifier is an embedded field.
    ///
    /// `pkg.T`, a lone `T` and `T[A]` followed by the end of the field are embedded. Anything else
    /// starts a list of field names.
    fn lookahead_is_embedded_field(&mut self) -> ParseResult<bool> {
        let is_field_end = |ty: &TokenType| {
            matches!(
                ty,
                TokenType::Semicolon | TokenType::CloseBrace | TokenType::StringLiteral(_)
            )
        };
        let Some(next) = self.lookahead_nth(1)?.map(|t| t.ty.clone()) else {
            return Ok(true);
        };
        match next {
            TokenType::Dot => Ok(true),
            ref ty if is_field_end(ty) => Ok(true),
            TokenType::OpenBracket => {
                if self.lookahead_nth_is(2, |ty| *ty == TokenType::CloseBracket)? {
                    return Ok(false);
                }
                // Find the bracket closing the instantiation and look past it.
                let mut depth = 0usize;
                let mut n = 1;
                loop {
                    let Some(token) = self.lookahead_nth(n)? else {
                        return Ok(false);
                    };
                    if token.ty.is_opening_bracket() {
                        depth += 1;
                    } else if token.ty.is_closing_bracket() {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    n += 1;
                }
                self.lookahead_nth_is(n + 1, is_field_end)
            }
            _ => Ok(false),
        }
    }

    /// Parse a comma separated list of identifiers.
    ///
    /// ```text
    /// identifier_list ::= identifier (COMMA identifier)*
    /// ```
    pub fn parse_identifier_list(&mut self) -> ParseResult<Vec<AstIdentifier>> {
        let mut names = vec![self.parse_identifier()?];
        while self.lookahead_check(&TokenType::Comma)? {
            self.eat()?;
            names.push(self.parse_identifier()?);
        }
        Ok(names)
    }

    /// Parse an identifier.
    pub fn parse_identifier(&mut self) -> ParseResult<AstIdentifier> {
        let token = self.eat()?;
        match token.ty {
            TokenType::Identifier(name) => Ok(AstIdentifier {
                span: token.span,
                name,
            }),
            _ => Err(ParseError::UnexpectedToken(UnexpectedTokenError {
                span: token.span,
                token,
            })),
        }
    }

    /// Parse a string literal, keeping its raw text.
    pub fn parse_string_literal(&mut self) -> ParseResult<AstStringLiteral> {
        let token = self.eat()?;
        match token.ty {
            TokenType::StringLiteral(raw) => Ok(AstStringLiteral {
                span: token.span,
                raw,
            }),
            _ => Err(ParseError::UnexpectedToken(UnexpectedTokenError {
                span: token.span,
                token,
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{AstDecl, AstGenDeclKind, AstSourceFile, AstSpec, AstType, AstTypeSpec};
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use crate::{ParseError, ParseResult, UnexpectedTokenError};
    use easyscan_macros::{assert_err, assert_matches, assert_none, assert_ok, assert_some};
    use easyscan_span::Span;

    fn assert_parse<T>(
        input: &str,
        rule: impl FnOnce(&mut Parser) -> ParseResult<T>,
    ) -> ParseResult<T> {
        let mut lexer = Lexer::new(input);
        let mut p = Parser::new(&mut lexer);
        rule(&mut p)
    }

    fn parse_file(input: &str) -> AstSourceFile {
        assert_ok!(assert_parse(input, |p| p.parse()))
    }

    /// Collect every type spec of the file, in order.
    fn type_specs(file: &AstSourceFile) -> Vec<&AstTypeSpec> {
        file.decls
            .iter()
            .filter_map(|d| match d {
                AstDecl::Gen(g) => Some(g),
                AstDecl::Func(_) => None,
            })
            .flat_map(|g| g.specs.iter())
            .filter_map(|s| match s {
                AstSpec::Type(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_parse_package_clause() {
        let file = parse_file("package models\n");
        assert_eq!(file.package.name, "models");
        assert_eq!(file.package.span, Span::new(8..14));
        assert!(file.decls.is_empty());
    }

    #[test]
    fn test_parse_struct_type_spec() {
        let file = parse_file(
            r#"package models

type User struct {
    ID    int64  `db:"id"`
    Name  string `db:"name"`
    Email, Alias string
}
"#,
        );
        let specs = type_specs(&file);
        assert_eq!(specs.len(), 1);
        let spec = specs[0];
        assert_eq!(spec.name.name, "User");
        assert!(!spec.alias);
        let fields = assert_matches!(&spec.ty, AstType::Struct(s) => &s.fields);
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].names[0].name, "ID");
        assert_eq!(assert_some!(&fields[0].tag).raw, "`db:\"id\"`");
        assert_eq!(fields[1].names[0].name, "Name");
        let names = fields[2].names.iter().map(|n| n.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["Email", "Alias"]);
        assert_none!(&fields[2].tag);
    }

    #[test]
    fn test_parse_embedded_fields() {
        let file = parse_file(
            r#"package models

type Row struct {
    Base
    *sql.DB
    pkg.Thing `db:"thing"`
    List[int]
    Count [4]int
    Items []Item
}
"#,
        );
        let fields = assert_matches!(&type_specs(&file)[0].ty, AstType::Struct(s) => &s.fields);
        assert_eq!(fields.len(), 6);
        assert!(fields[0].names.is_empty());
        assert!(fields[1].names.is_empty());
        assert!(matches!(&fields[1].ty, AstType::Pointer(_)));
        assert!(fields[2].names.is_empty());
        assert!(fields[2].tag.is_some());
        assert!(fields[3].names.is_empty());
        let named = assert_matches!(&fields[3].ty, AstType::Named(n) => n);
        assert_eq!(named.type_arguments.len(), 1);
        assert_eq!(fields[4].names[0].name, "Count");
        let array = assert_matches!(&fields[4].ty, AstType::Array(a) => a);
        assert!(array.length.is_some());
        assert_eq!(fields[5].names[0].name, "Items");
        let slice = assert_matches!(&fields[5].ty, AstType::Array(a) => a);
        assert_none!(slice.length);
    }

    #[test]
    fn test_parse_list_type_specs() {
        let file = parse_file(
            r#"package models

type Users []User
type Fixed [3]User
type Inferred = [...]User
type Pointers []*User
type Remote []time.Time
"#,
        );
        let specs = type_specs(&file);
        assert_eq!(specs.len(), 5);
        let users = assert_matches!(&specs[0].ty, AstType::Array(a) => a);
        let element = assert_matches!(users.element.as_ref(), AstType::Named(n) => n);
        assert!(element.is_plain_identifier());
        assert_eq!(element.name.name, "User");
        assert!(matches!(&specs[1].ty, AstType::Array(a) if a.length.is_some()));
        assert!(specs[2].alias);
        let pointers = assert_matches!(&specs[3].ty, AstType::Array(a) => a);
        assert!(matches!(pointers.element.as_ref(), AstType::Pointer(_)));
        let remote = assert_matches!(&specs[4].ty, AstType::Array(a) => a);
        let element = assert_matches!(remote.element.as_ref(), AstType::Named(n) => n);
        assert!(!element.is_plain_identifier());
        assert_eq!(assert_some!(&element.package).name, "time");
    }

    #[test]
    fn test_parse_type_parameters() {
        let file = parse_file(
            r#"package models

type Page[T any] []T
type Pair[K comparable, V any] struct { Key K; Value V }
type Both[A, B interface{ ~int | ~string }] struct{}
type Matrix [N]Row
"#,
        );
        let specs = type_specs(&file);
        assert_eq!(specs[0].type_parameters.len(), 1);
        assert!(specs[0].declares_type_parameter("T"));
        assert!(matches!(&specs[0].ty, AstType::Array(_)));
        assert_eq!(specs[1].type_parameters.len(), 2);
        assert!(specs[1].declares_type_parameter("V"));
        assert_eq!(specs[2].type_parameters.len(), 1);
        assert_eq!(specs[2].type_parameters[0].names.len(), 2);
        assert!(specs[3].type_parameters.is_empty());
        assert!(matches!(&specs[3].ty, AstType::Array(a) if a.length.is_some()));
    }

    #[test]
    fn test_parse_computed_array_lengths() {
        for input in [
            "Pair [N * 2]Row",
            "Three [len(\"abc\")]Row",
            "Plain [N + 1]Row",
            "Scaled [P *C]Row",
            "Converted [int(N)]Row",
        ] {
            let spec = assert_ok!(assert_parse(input, |p| p.parse_type_spec(None)));
            assert!(spec.type_parameters.is_empty(), "{input}");
            assert!(
                matches!(&spec.ty, AstType::Array(a) if a.length.is_some()),
                "{input}"
            );
        }
    }

    #[test]
    fn test_parse_type_parameters_with_type_element_constraints() {
        for input in [
            "A[P *[]int] struct{}",
            "B[P *C,] struct{}",
            "C[P *T | ~int] struct{}",
            "D[T ~int] struct{}",
            "E[P (struct{})] struct{}",
            "F[T []int] struct{}",
        ] {
            let spec = assert_ok!(assert_parse(input, |p| p.parse_type_spec(None)));
            assert_eq!(spec.type_parameters.len(), 1, "{input}");
            assert!(matches!(&spec.ty, AstType::Struct(_)), "{input}");
        }
    }

    #[test]
    fn test_parse_grouped_declarations() {
        let file = parse_file(
            r#"package models

import (
    "database/sql"
    str "strings"
)

const (
    A = iota
    B
)

var defaults = map[string]int{
    "a": 1,
    "b": func() int { return 2 }(),
}

type (
    Account struct{ ID int }
    Accounts []Account
)
"#,
        );
        assert_eq!(file.decls.len(), 4);
        let import = assert_matches!(&file.decls[0], AstDecl::Gen(g) => g);
        assert_eq!(import.kind, AstGenDeclKind::Import);
        assert!(import.grouped);
        assert_eq!(import.specs.len(), 2);
        let alias = assert_matches!(&import.specs[1], AstSpec::Import(i) => i);
        assert_eq!(alias.alias.as_deref(), Some("str"));
        let consts = assert_matches!(&file.decls[1], AstDecl::Gen(g) => g);
        assert_eq!(consts.specs.len(), 2);
        let var = assert_matches!(&file.decls[2], AstDecl::Gen(g) => g);
        assert!(!var.grouped);
        let types = assert_matches!(&file.decls[3], AstDecl::Gen(g) => g);
        assert_eq!(types.kind, AstGenDeclKind::Type);
        assert_eq!(types.specs.len(), 2);
    }

    #[test]
    fn test_parse_functions_are_skipped() {
        let file = parse_file(
            r#"package models

func (u *User) Scan(dest ...any) error {
    if len(dest) == 0 {
        return nil
    }
    for i := range dest { _ = i }
    return nil
}

func Map[T, U any](in []T, f func(T) U) (out []U) {
    return
}

func external() int

type After struct{}
"#,
        );
        assert_eq!(file.decls.len(), 4);
        let method = assert_matches!(&file.decls[0], AstDecl::Func(f) => f);
        assert!(method.receiver.is_some());
        assert_eq!(method.name.name, "Scan");
        let generic = assert_matches!(&file.decls[1], AstDecl::Func(f) => f);
        assert_none!(generic.receiver);
        assert_eq!(generic.name.name, "Map");
        assert_eq!(type_specs(&file)[0].name.name, "After");
    }

    #[test]
    fn test_parse_complex_field_types() {
        let file = parse_file(
            r#"package models

type Everything struct {
    M     map[string][]*Item
    C     <-chan struct{}
    S     chan<- int
    F     func(a, b int) (string, error)
    G     func() error
    I     interface{ Scan(...any) error }
    P     (int)
    Inner struct {
        X int `db:"x"`
    }
}
"#,
        );
        let fields = assert_matches!(&type_specs(&file)[0].ty, AstType::Struct(s) => &s.fields);
        assert_eq!(fields.len(), 8);
        assert!(matches!(&fields[0].ty, AstType::Map(_)));
        assert!(matches!(&fields[1].ty, AstType::Chan(_)));
        assert!(matches!(&fields[2].ty, AstType::Chan(_)));
        assert!(matches!(&fields[3].ty, AstType::Func(_)));
        assert!(matches!(&fields[4].ty, AstType::Func(_)));
        assert!(matches!(&fields[5].ty, AstType::Interface(_)));
        assert!(matches!(&fields[6].ty, AstType::Paren(_)));
        assert!(matches!(&fields[7].ty, AstType::Struct(_)));
    }

    #[test]
    fn test_doc_comments_attach_to_declarations() {
        let file = parse_file(
            r#"// Package models holds rows.
package models

// easyscan:explicit
type A struct{}

// detached from B by a blank line

type B struct{}

type (
    // easyscan:skip
    C struct {
        // field doc
        X int
    }
)
"#,
        );
        let doc = assert_some!(&file.doc);
        assert_eq!(doc.comments[0].text, "// Package models holds rows.");
        let a = assert_matches!(&file.decls[0], AstDecl::Gen(g) => g);
        assert_eq!(assert_some!(&a.doc).comments[0].text, "// easyscan:explicit");
        let b = assert_matches!(&file.decls[1], AstDecl::Gen(g) => g);
        assert_none!(&b.doc);
        let group = assert_matches!(&file.decls[2], AstDecl::Gen(g) => g);
        assert_none!(&group.doc);
        let c = assert_matches!(&group.specs[0], AstSpec::Type(t) => t);
        assert_eq!(assert_some!(&c.doc).comments[0].text, "// easyscan:skip");
        let fields = assert_matches!(&c.ty, AstType::Struct(s) => &s.fields);
        assert_eq!(assert_some!(&fields[0].doc).comments[0].text, "// field doc");
        assert_eq!(file.comments.len(), 5);
    }

    #[test]
    fn test_trailing_comment_does_not_lead_next_declaration() {
        let file = parse_file(
            r#"package models

type A struct{} // easyscan:skip
type B struct{}
"#,
        );
        let b = assert_matches!(&file.decls[1], AstDecl::Gen(g) => g);
        assert_none!(&b.doc);
        assert_eq!(file.comments.len(), 1);
    }

    #[test]
    fn test_adjacent_comments_form_one_group() {
        let file = parse_file(
            r#"package models

// first line
/* second line */
// easyscan:explicit
type A struct{}
"#,
        );
        let a = assert_matches!(&file.decls[0], AstDecl::Gen(g) => g);
        assert_eq!(assert_some!(&a.doc).comments.len(), 3);
    }

    #[test]
    fn test_parse_missing_package_clause() {
        let err = assert_err!(assert_parse("type A struct{}", |p| p.parse()));
        assert!(matches!(err, ParseError::UnexpectedToken(UnexpectedTokenError { .. })));
    }

    #[test]
    fn test_parse_unbalanced_struct() {
        let err = assert_err!(assert_parse(
            "package models\n\ntype A struct {\n    X int\n",
            |p| p.parse()
        ));
        assert!(matches!(err, ParseError::UnexpectedEndOfFile(_)));
    }

    #[test]
    fn test_parse_field_requires_type() {
        let err = assert_err!(assert_parse(
            "package models\n\ntype A struct {\n    X, Y\n}\n",
            |p| p.parse()
        ));
        assert!(matches!(err, ParseError::UnexpectedToken(_)));
    }
}
