//! Telling a type parameter list from an array length.
//!
//! After a type name, `[` opens either the type parameters of a generic type, as in
//! `type Page[T any] []T`, or the length of an array type, as in `type Grid [N * 2]Row`. Both
//! begin with an identifier. The bracket contents are read as an expression and split into a
//! parameter name and a constraint where possible. `P *C` and `P(C)` are only split when the
//! operand is a type element such as `[]int`, `struct{}` or `~int`, or when a comma follows and
//! forces a parameter list.

use crate::TokenType;

/// The shape of a bracket expression, as far as the decision needs it.
#[derive(Debug)]
enum BracketExpr {
    Name,
    /// An array, struct, func, interface, map or channel type.
    TypeLiteral,
    /// `~T`
    Underlying,
    Paren(Box<BracketExpr>),
    Binary(Box<BracketExpr>, BinaryOp, Box<BracketExpr>),
    Call {
        callee: Box<BracketExpr>,
        args: Vec<BracketExpr>,
        spread: bool,
    },
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Star,
    Pipe,
    Other,
}

impl BracketExpr {
    fn is_type_element(&self) -> bool {
        match self {
            BracketExpr::TypeLiteral | BracketExpr::Underlying => true,
            BracketExpr::Binary(lhs, _, rhs) => lhs.is_type_element() || rhs.is_type_element(),
            BracketExpr::Paren(inner) => inner.is_type_element(),
            _ => false,
        }
    }

    /// Split the expression into a parameter name and an optional constraint.
    ///
    /// Returns `None` if the expression has no leading parameter name, otherwise whether a
    /// constraint follows the name.
    fn split_parameter(&self, force: bool) -> Option<bool> {
        match self {
            BracketExpr::Name => Some(false),
            BracketExpr::Binary(lhs, BinaryOp::Star, rhs)
                if matches!(**lhs, BracketExpr::Name) && (force || rhs.is_type_element()) =>
            {
                Some(true)
            }
            BracketExpr::Binary(lhs, BinaryOp::Pipe, rhs) => lhs
                .split_parameter(force || rhs.is_type_element())
                .filter(|constrained| *constrained),
            BracketExpr::Call {
                callee,
                args,
                spread,
            } if matches!(**callee, BracketExpr::Name)
                && !*spread
                && args.len() == 1
                && (force || args[0].is_type_element()) =>
            {
                Some(true)
            }
            _ => None,
        }
    }
}

fn binary_operator(ty: &TokenType) -> Option<(BinaryOp, u8)> {
    let operator = match ty {
        TokenType::Star => (BinaryOp::Star, 5),
        TokenType::Pipe => (BinaryOp::Pipe, 4),
        TokenType::Operator(op) => match *op {
            "||" => (BinaryOp::Other, 1),
            "&&" => (BinaryOp::Other, 2),
            "==" | "!=" | "<" | "<=" | ">" | ">=" => (BinaryOp::Other, 3),
            "+" | "-" | "^" => (BinaryOp::Other, 4),
            "/" | "%" | "<<" | ">>" | "&" | "&^" => (BinaryOp::Other, 5),
            _ => return None,
        },
        _ => return None,
    };
    Some(operator)
}

/// Expression reader over the tokens between the brackets.
///
/// The reader never fails. Tokens it cannot make sense of end the expression, and the caller
/// looks at what is left.
struct BracketReader<'t> {
    tokens: &'t [TokenType],
    pos: usize,
}

impl<'t> BracketReader<'t> {
    fn peek(&self) -> Option<&'t TokenType> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn eat(&mut self, ty: &TokenType) -> bool {
        if self.peek() == Some(ty) {
            self.bump();
            return true;
        }
        false
    }

    /// Consume tokens up to and including the bracket closing the current group.
    fn leave_group(&mut self) {
        let mut depth = 0usize;
        while let Some(ty) = self.peek() {
            self.bump();
            if ty.is_opening_bracket() {
                depth += 1;
            } else if ty.is_closing_bracket() {
                if depth == 0 {
                    return;
                }
                depth -= 1;
            }
        }
    }

    /// Consume a bracket group if one starts at the current token.
    fn skip_group(&mut self) {
        if self.peek().is_some_and(|ty| ty.is_opening_bracket()) {
            self.bump();
            self.leave_group();
        }
    }

    fn skip_type(&mut self) {
        match self.peek() {
            Some(TokenType::Identifier(_)) => {
                self.bump();
                if self.eat(&TokenType::Dot) {
                    self.bump();
                }
                if self.peek() == Some(&TokenType::OpenBracket) {
                    self.skip_group();
                }
            }
            Some(TokenType::Star) => {
                self.bump();
                self.skip_type();
            }
            Some(TokenType::OpenBracket) => {
                self.skip_group();
                self.skip_type();
            }
            Some(TokenType::KeywordMap) => {
                self.bump();
                self.skip_group();
                self.skip_type();
            }
            Some(TokenType::KeywordChan) => {
                self.bump();
                self.eat(&TokenType::Arrow);
                self.skip_type();
            }
            Some(TokenType::Arrow) => {
                self.bump();
                self.eat(&TokenType::KeywordChan);
                self.skip_type();
            }
            Some(TokenType::KeywordStruct | TokenType::KeywordInterface) => {
                self.bump();
                self.skip_group();
            }
            Some(TokenType::KeywordFunc) => {
                self.bump();
                self.skip_group();
                match self.peek() {
                    Some(TokenType::OpenParen) => self.skip_group(),
                    Some(ty) if ty.starts_type() => self.skip_type(),
                    _ => {}
                }
            }
            Some(TokenType::OpenParen) => self.skip_group(),
            _ => {}
        }
    }

    /// Read a binary expression whose operators bind tighter than `min_precedence`.
    fn binary(&mut self, min_precedence: u8) -> BracketExpr {
        let mut lhs = self.unary();
        while let Some((op, precedence)) = self.peek().and_then(binary_operator) {
            if precedence <= min_precedence {
                break;
            }
            self.bump();
            let rhs = self.binary(precedence);
            lhs = BracketExpr::Binary(Box::new(lhs), op, Box::new(rhs));
        }
        lhs
    }

    fn unary(&mut self) -> BracketExpr {
        match self.peek() {
            Some(TokenType::Tilde) => {
                self.bump();
                self.unary();
                BracketExpr::Underlying
            }
            Some(TokenType::Arrow) => {
                if self.tokens.get(self.pos + 1) == Some(&TokenType::KeywordChan) {
                    self.skip_type();
                    return BracketExpr::TypeLiteral;
                }
                self.bump();
                self.unary();
                BracketExpr::Other
            }
            Some(TokenType::Star | TokenType::Operator("+" | "-" | "!" | "^" | "&")) => {
                self.bump();
                self.unary();
                BracketExpr::Other
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> BracketExpr {
        let mut expr = self.operand();
        loop {
            match self.peek() {
                // Selector or type assertion.
                Some(TokenType::Dot) => {
                    self.bump();
                    if self.peek() == Some(&TokenType::OpenParen) {
                        self.skip_group();
                    } else {
                        self.bump();
                    }
                    expr = BracketExpr::Other;
                }
                Some(TokenType::OpenParen) => {
                    let (args, spread) = self.arguments();
                    expr = BracketExpr::Call {
                        callee: Box::new(expr),
                        args,
                        spread,
                    };
                }
                Some(TokenType::OpenBracket) => {
                    self.skip_group();
                    expr = BracketExpr::Other;
                }
                // Composite literal.
                Some(TokenType::OpenBrace)
                    if matches!(expr, BracketExpr::Name | BracketExpr::TypeLiteral) =>
                {
                    self.skip_group();
                    expr = BracketExpr::Other;
                }
                _ => return expr,
            }
        }
    }

    fn operand(&mut self) -> BracketExpr {
        match self.peek() {
            Some(TokenType::Identifier(_)) => {
                self.bump();
                BracketExpr::Name
            }
            Some(TokenType::OpenParen) => {
                self.bump();
                let inner = self.binary(0);
                self.leave_group();
                BracketExpr::Paren(Box::new(inner))
            }
            Some(
                TokenType::OpenBracket
                | TokenType::KeywordStruct
                | TokenType::KeywordInterface
                | TokenType::KeywordFunc
                | TokenType::KeywordMap
                | TokenType::KeywordChan,
            ) => {
                self.skip_type();
                BracketExpr::TypeLiteral
            }
            Some(_) => {
                self.bump();
                BracketExpr::Other
            }
            None => BracketExpr::Other,
        }
    }

    fn arguments(&mut self) -> (Vec<BracketExpr>, bool) {
        self.bump();
        let mut args = Vec::new();
        let mut spread = false;
        while self
            .peek()
            .is_some_and(|ty| *ty != TokenType::CloseParen)
        {
            args.push(self.binary(0));
            if self.eat(&TokenType::Ellipsis) {
                spread = true;
            }
            if !self.eat(&TokenType::Comma) {
                break;
            }
        }
        self.leave_group();
        (args, spread)
    }
}

/// Determine if the tokens between the brackets following a type name are type parameters.
///
/// `tokens` excludes both brackets.
pub(crate) fn opens_type_parameters(tokens: &[TokenType]) -> bool {
    if !matches!(tokens.first(), Some(TokenType::Identifier(_))) {
        return false;
    }
    // `[P [`: never read as an index expression.
    if tokens.get(1) == Some(&TokenType::OpenBracket) {
        return true;
    }
    let mut reader = BracketReader { tokens, pos: 0 };
    let expr = reader.binary(0);
    let next = reader.peek();
    match expr.split_parameter(next == Some(&TokenType::Comma)) {
        Some(constrained) => constrained || next.is_some(),
        None => false,
    }
}
