//! Recursive-descent parser for path expressions.
//!
//! ```text
//! query     := path ('|' path)*
//! path      := '/' relpath | '//' relpath | relpath
//! relpath   := step (('/' | '//') step)*
//! step      := ('.' | '*' | NAME) predicate*
//! predicate := '[' or ']'
//! or        := and ('or' and)*
//! and       := unary ('and' unary)*
//! unary     := 'not' '(' or ')' | primary
//! primary   := '(' or ')'
//!            | '@' NAME (cmpop literal)?
//!            | FUNC '(' '@' NAME ',' STRING ')'
//! ```

use crate::path::ast::{
    Attribute, Axis, CompareOp, Expr, Literal, LocationPath, NodeTest, Step, StringFn,
};
use crate::path::errors::PathError;
use crate::path::lexer::{tokenize, Spanned, Token};

/// Steps are tracked as bits of a `u128` during evaluation.
pub const MAX_STEPS: usize = 64;

/// Deepest allowed stack of `(` and `not(` groups inside one predicate.
pub const MAX_NESTING: usize = 64;

/// Most attribute tests and function calls allowed in one predicate.
pub const MAX_PREDICATE_TERMS: usize = 256;

pub fn parse(query: &str) -> Result<Vec<LocationPath>, PathError> {
    if query.trim().is_empty() {
        return Err(PathError::Empty);
    }

    let tokens = tokenize(query)?;
    let mut parser = PathParser {
        query,
        tokens,
        pos: 0,
        depth: 0,
        terms: 0,
    };

    let mut paths = vec![parser.parse_path()?];
    while parser.eat(&Token::Pipe) {
        paths.push(parser.parse_path()?);
    }

    if let Some(extra) = parser.peek() {
        return Err(parser.error_at(
            extra.offset,
            format!("unexpected {}", extra.token.describe()),
        ));
    }

    Ok(paths)
}

struct PathParser<'q> {
    query: &'q str,
    tokens: Vec<Spanned>,
    pos: usize,
    /// Open groups in the current predicate.
    depth: usize,
    /// Terms seen in the current predicate.
    terms: usize,
}

impl PathParser<'_> {
    fn parse_path(&mut self) -> Result<LocationPath, PathError> {
        let start = self.offset();
        let (absolute, first_separator) = match self.peek_token() {
            Some(Token::Slash) => {
                self.pos += 1;
                (true, Some(Token::Slash))
            }
            Some(Token::DoubleSlash) => {
                self.pos += 1;
                (true, Some(Token::DoubleSlash))
            }
            _ => (false, None),
        };

        if absolute && first_separator == Some(Token::Slash) && self.peek_token() == Some(&Token::Dot)
        {
            return Err(self.error_at(start, "'/.' selects the document, not a node".into()));
        }

        let mut steps = vec![self.parse_step(first_separator.as_ref())?];
        loop {
            let separator = match self.peek_token() {
                Some(Token::Slash) => Token::Slash,
                Some(Token::DoubleSlash) => Token::DoubleSlash,
                _ => break,
            };
            self.pos += 1;
            steps.push(self.parse_step(Some(&separator))?);
        }

        if steps.len() > MAX_STEPS {
            return Err(self.error_at(start, format!("path has more than {MAX_STEPS} steps")));
        }

        Ok(LocationPath { absolute, steps })
    }

    /// Parse one step; `separator` is the token that preceded it, if any.
    fn parse_step(&mut self, separator: Option<&Token>) -> Result<Step, PathError> {
        let descendant = separator == Some(&Token::DoubleSlash);
        let offset = self.offset();

        let (axis, test) = match self.next_token() {
            Some(Token::Dot) => {
                let axis = if descendant {
                    Axis::DescendantOrSelf
                } else {
                    Axis::SelfNode
                };
                (axis, NodeTest::Any)
            }
            Some(Token::Star) => (child_or_descendant(descendant), NodeTest::Any),
            Some(Token::Name(name)) => (child_or_descendant(descendant), NodeTest::Kind(name)),
            Some(other) => {
                return Err(self.error_at(
                    offset,
                    format!("expected a node test, found {}", other.describe()),
                ))
            }
            None => return Err(self.error_at(offset, "expected a node test".into())),
        };

        let mut predicates = Vec::new();
        while self.eat(&Token::LBracket) {
            self.terms = 0;
            predicates.push(self.parse_or()?);
            self.expect(&Token::RBracket)?;
        }

        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn parse_or(&mut self) -> Result<Expr, PathError> {
        let mut expr = self.parse_and()?;
        while self.eat_keyword("or") {
            let rhs = self.parse_and()?;
            expr = Expr::Or(Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Expr, PathError> {
        let mut expr = self.parse_unary()?;
        while self.eat_keyword("and") {
            let rhs = self.parse_unary()?;
            expr = Expr::And(Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expr, PathError> {
        if self.peek_keyword("not") && self.peek_token_at(1) == Some(&Token::LParen) {
            self.enter_group(self.offset())?;
            self.pos += 2;
            let inner = self.parse_or()?;
            self.expect(&Token::RParen)?;
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, PathError> {
        let offset = self.offset();
        match self.next_token() {
            Some(Token::LParen) => {
                self.enter_group(offset)?;
                let inner = self.parse_or()?;
                self.expect(&Token::RParen)?;
                self.depth -= 1;
                Ok(inner)
            }
            Some(Token::At) => {
                self.count_term(offset)?;
                let attribute = self.parse_attribute_name()?;
                match self.parse_compare_op() {
                    Some(op) => {
                        let literal = self.parse_literal()?;
                        Ok(Expr::Compare {
                            attribute,
                            op,
                            literal,
                        })
                    }
                    None => Ok(Expr::Exists(attribute)),
                }
            }
            Some(Token::Name(name)) => {
                let function = StringFn::from_name(&name).ok_or_else(|| {
                    self.error_at(offset, format!("unknown function or predicate '{name}'"))
                })?;
                self.count_term(offset)?;
                self.expect(&Token::LParen)?;
                self.expect(&Token::At)?;
                let attribute = self.parse_attribute_name()?;
                self.expect(&Token::Comma)?;
                let argument = match self.next_token() {
                    Some(Token::Str(s)) => s,
                    _ => {
                        return Err(self.error_at(
                            self.previous_offset(),
                            format!("{name}() expects a string argument"),
                        ))
                    }
                };
                self.expect(&Token::RParen)?;
                Ok(Expr::Call {
                    function,
                    attribute,
                    argument,
                })
            }
            Some(Token::Number(_)) => Err(self.error_at(
                offset,
                "positional predicates are not supported".into(),
            )),
            Some(other) => Err(self.error_at(
                offset,
                format!("expected a predicate, found {}", other.describe()),
            )),
            None => Err(self.error_at(offset, "unterminated predicate".into())),
        }
    }

    /// Predicates are parsed and evaluated recursively, so their shape is
    /// bounded here rather than by the call stack.
    fn enter_group(&mut self, offset: usize) -> Result<(), PathError> {
        if self.depth == MAX_NESTING {
            return Err(self.error_at(
                offset,
                format!("predicate nesting deeper than {MAX_NESTING}"),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn count_term(&mut self, offset: usize) -> Result<(), PathError> {
        if self.terms == MAX_PREDICATE_TERMS {
            return Err(self.error_at(
                offset,
                format!("predicate has more than {MAX_PREDICATE_TERMS} terms"),
            ));
        }
        self.terms += 1;
        Ok(())
    }

    fn parse_attribute_name(&mut self) -> Result<Attribute, PathError> {
        let offset = self.offset();
        match self.next_token() {
            Some(Token::Name(name)) => Ok(Attribute::from_name(&name)),
            _ => Err(self.error_at(offset, "expected an attribute name after '@'".into())),
        }
    }

    fn parse_compare_op(&mut self) -> Option<CompareOp> {
        let op = match self.peek_token()? {
            Token::Eq => CompareOp::Eq,
            Token::NotEq => CompareOp::NotEq,
            Token::Lt => CompareOp::Lt,
            Token::Le => CompareOp::Le,
            Token::Gt => CompareOp::Gt,
            Token::Ge => CompareOp::Ge,
            _ => return None,
        };
        self.pos += 1;
        Some(op)
    }

    fn parse_literal(&mut self) -> Result<Literal, PathError> {
        let offset = self.offset();
        match self.next_token() {
            Some(Token::Str(s)) => Ok(Literal::Str(s)),
            Some(Token::Number(n)) => Ok(Literal::Number(n)),
            _ => Err(self.error_at(offset, "expected a string or number literal".into())),
        }
    }

    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn peek_token(&self) -> Option<&Token> {
        self.peek_token_at(0)
    }

    fn peek_token_at(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead).map(|s| &s.token)
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek_token(), Some(Token::Name(name)) if name == keyword)
    }

    fn next_token(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek_token() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<(), PathError> {
        if self.eat(token) {
            return Ok(());
        }
        let found = match self.peek() {
            Some(spanned) => spanned.token.describe(),
            None => "end of expression".to_string(),
        };
        Err(self.error_at(
            self.offset(),
            format!("expected {}, found {found}", token.describe()),
        ))
    }

    /// Offset of the current token, or the end of the query.
    fn offset(&self) -> usize {
        self.peek().map_or(self.query.len(), |s| s.offset)
    }

    fn previous_offset(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|idx| self.tokens.get(idx))
            .map_or(self.query.len(), |s| s.offset)
    }

    fn error_at(&self, offset: usize, message: String) -> PathError {
        PathError::InvalidPathExpression {
            query: self.query.to_string(),
            offset,
            message,
        }
    }
}

fn child_or_descendant(descendant: bool) -> Axis {
    if descendant {
        Axis::Descendant
    } else {
        Axis::Child
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(query: &str) -> LocationPath {
        let mut paths = parse(query).unwrap();
        assert_eq!(paths.len(), 1);
        paths.remove(0)
    }

    fn message(query: &str) -> String {
        match parse(query).unwrap_err() {
            PathError::InvalidPathExpression { message, .. } => message,
            PathError::Empty => "empty".into(),
        }
    }

    #[test]
    fn parses_descendant_role_query() {
        let path = single("//*[@roleIdentifier]");
        assert!(path.absolute);
        assert_eq!(path.steps.len(), 1);
        assert_eq!(path.steps[0].axis, Axis::Descendant);
        assert_eq!(path.steps[0].test, NodeTest::Any);
        assert_eq!(
            path.steps[0].predicates,
            vec![Expr::Exists(Attribute::Role("Identifier".into()))]
        );
    }

    #[test]
    fn parses_axes() {
        let path = single("/Module/FunctionDefinition//Identifier");
        let axes: Vec<_> = path.steps.iter().map(|s| s.axis).collect();
        assert_eq!(axes, vec![Axis::Child, Axis::Child, Axis::Descendant]);

        let path = single("//.");
        assert_eq!(path.steps[0].axis, Axis::DescendantOrSelf);

        let path = single("./Identifier");
        assert!(!path.absolute);
        assert_eq!(path.steps[0].axis, Axis::SelfNode);
        assert_eq!(path.steps[1].axis, Axis::Child);
    }

    #[test]
    fn parses_boolean_predicates() {
        let path = single("//Identifier[not(@token='a') and (@startLine > 1 or @roleCall)]");
        let expected = Expr::And(
            Box::new(Expr::Not(Box::new(Expr::Compare {
                attribute: Attribute::Token,
                op: CompareOp::Eq,
                literal: Literal::Str("a".into()),
            }))),
            Box::new(Expr::Or(
                Box::new(Expr::Compare {
                    attribute: Attribute::Position(crate::path::ast::PositionField::StartLine),
                    op: CompareOp::Gt,
                    literal: Literal::Number(1),
                }),
                Box::new(Expr::Exists(Attribute::Role("Call".into()))),
            )),
        );
        assert_eq!(path.steps[0].predicates, vec![expected]);
    }

    #[test]
    fn parses_functions_and_unions() {
        let paths = parse("//Identifier[starts-with(@token, 'su')] | //Call").unwrap();
        assert_eq!(paths.len(), 2);
        assert!(matches!(
            paths[0].steps[0].predicates[0],
            Expr::Call {
                function: StringFn::StartsWith,
                ..
            }
        ));
    }

    #[test]
    fn rejects_malformed_queries() {
        assert_eq!(parse("").unwrap_err(), PathError::Empty);
        assert_eq!(parse("   ").unwrap_err(), PathError::Empty);
        assert!(message("/").contains("expected a node test"));
        assert!(message("//a/").contains("expected a node test"));
        assert!(message("//a[").contains("unterminated predicate"));
        assert!(message("//a[@x").contains("expected ']'"));
        assert!(message("//a[@x=]").contains("literal"));
        assert!(message("//a[1]").contains("positional"));
        assert!(message("//a[foo(@x, 'y')]").contains("unknown function"));
        assert!(message("//a b").contains("unexpected name 'b'"));
        assert!(message("/.").contains("document"));
        assert!(message("//a |").contains("expected a node test"));
    }

    #[test]
    fn rejects_too_many_steps() {
        let query = vec!["a"; MAX_STEPS + 1].join("/");
        assert!(message(&query).contains("more than"));
        assert!(parse(&vec!["a"; MAX_STEPS].join("/")).is_ok());
    }

    fn nested(open: &str, levels: usize) -> String {
        format!("//*[{}@x{}]", open.repeat(levels), ")".repeat(levels))
    }

    #[test]
    fn rejects_deeply_nested_predicates() {
        for open in ["(", "not("] {
            let query = nested(open, 100_000);
            match parse(&query).unwrap_err() {
                PathError::InvalidPathExpression {
                    offset, message, ..
                } => {
                    assert!(message.contains("nesting deeper than"), "{message}");
                    assert_eq!(offset, 4 + MAX_NESTING * open.len());
                }
                other => panic!("expected an invalid path expression, got {other:?}"),
            }

            assert!(parse(&nested(open, MAX_NESTING)).is_ok());
            assert!(parse(&nested(open, MAX_NESTING + 1)).is_err());
        }
    }

    #[test]
    fn nesting_is_counted_per_group() {
        let group = nested("(", MAX_NESTING);
        let inner = &group[4..group.len() - 1];
        let query = format!("//*[{inner} and {inner}][{inner}]");
        assert!(parse(&query).is_ok());
    }

    #[test]
    fn rejects_overlong_boolean_chains() {
        let chain = vec!["@x"; 100_000].join(" or ");
        assert!(message(&format!("//*[{chain}]")).contains("more than"));

        let chain = vec!["@x"; MAX_PREDICATE_TERMS].join(" and ");
        assert!(parse(&format!("//*[{chain}][{chain}]")).is_ok());
    }
}
