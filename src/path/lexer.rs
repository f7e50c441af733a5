use crate::path::errors::PathError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Slash,
    DoubleSlash,
    Dot,
    Star,
    At,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Pipe,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Name(String),
    Str(String),
    Number(u64),
}

impl Token {
    pub fn describe(&self) -> String {
        match self {
            Token::Slash => "'/'".into(),
            Token::DoubleSlash => "'//'".into(),
            Token::Dot => "'.'".into(),
            Token::Star => "'*'".into(),
            Token::At => "'@'".into(),
            Token::LBracket => "'['".into(),
            Token::RBracket => "']'".into(),
            Token::LParen => "'('".into(),
            Token::RParen => "')'".into(),
            Token::Comma => "','".into(),
            Token::Pipe => "'|'".into(),
            Token::Eq => "'='".into(),
            Token::NotEq => "'!='".into(),
            Token::Lt => "'<'".into(),
            Token::Le => "'<='".into(),
            Token::Gt => "'>'".into(),
            Token::Ge => "'>='".into(),
            Token::Name(name) => format!("name '{name}'"),
            Token::Str(s) => format!("string '{s}'"),
            Token::Number(n) => format!("number {n}"),
        }
    }
}

/// A token and the byte offset where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

pub fn tokenize(query: &str) -> Result<Vec<Spanned>, PathError> {
    let error = |offset: usize, message: String| PathError::InvalidPathExpression {
        query: query.to_string(),
        offset,
        message,
    };

    let mut tokens = Vec::new();
    let mut chars = query.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        let token = match ch {
            c if c.is_whitespace() => continue,
            '/' => {
                if chars.next_if(|&(_, c)| c == '/').is_some() {
                    Token::DoubleSlash
                } else {
                    Token::Slash
                }
            }
            '.' => {
                if chars.peek().is_some_and(|&(_, c)| c == '.') {
                    return Err(error(offset, "parent axis '..' is not supported".into()));
                }
                Token::Dot
            }
            '*' => Token::Star,
            '@' => Token::At,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            '|' => Token::Pipe,
            '=' => Token::Eq,
            '!' => {
                if chars.next_if(|&(_, c)| c == '=').is_some() {
                    Token::NotEq
                } else {
                    return Err(error(offset, "expected '=' after '!'".into()));
                }
            }
            '<' => {
                if chars.next_if(|&(_, c)| c == '=').is_some() {
                    Token::Le
                } else {
                    Token::Lt
                }
            }
            '>' => {
                if chars.next_if(|&(_, c)| c == '=').is_some() {
                    Token::Ge
                } else {
                    Token::Gt
                }
            }
            '\'' | '"' => {
                let mut value = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == ch {
                        closed = true;
                        break;
                    }
                    value.push(c);
                }
                if !closed {
                    return Err(error(offset, "unterminated string literal".into()));
                }
                Token::Str(value)
            }
            c if c.is_ascii_digit() => {
                let mut digits = String::from(c);
                while let Some((_, d)) = chars.next_if(|&(_, d)| d.is_ascii_digit()) {
                    digits.push(d);
                }
                let value = digits
                    .parse::<u64>()
                    .map_err(|_| error(offset, format!("number '{digits}' is too large")))?;
                Token::Number(value)
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut name = String::from(c);
                while let Some((_, n)) = chars
                    .next_if(|&(_, n)| n.is_ascii_alphanumeric() || matches!(n, '_' | ':' | '-'))
                {
                    name.push(n);
                }
                Token::Name(name)
            }
            other => return Err(error(offset, format!("unexpected character '{other}'"))),
        };

        tokens.push(Spanned { token, offset });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(query: &str) -> Vec<Token> {
        tokenize(query)
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn tokenizes_role_query() {
        assert_eq!(
            kinds("//*[@roleIdentifier]"),
            vec![
                Token::DoubleSlash,
                Token::Star,
                Token::LBracket,
                Token::At,
                Token::Name("roleIdentifier".into()),
                Token::RBracket,
            ]
        );
    }

    #[test]
    fn tokenizes_comparisons_and_literals() {
        assert_eq!(
            kinds("[@startLine >= 3 and @token != \"x y\"]"),
            vec![
                Token::LBracket,
                Token::At,
                Token::Name("startLine".into()),
                Token::Ge,
                Token::Number(3),
                Token::Name("and".into()),
                Token::At,
                Token::Name("token".into()),
                Token::NotEq,
                Token::Str("x y".into()),
                Token::RBracket,
            ]
        );
    }

    #[test]
    fn names_may_contain_dashes_and_colons() {
        assert_eq!(
            kinds("starts-with python:Module"),
            vec![
                Token::Name("starts-with".into()),
                Token::Name("python:Module".into())
            ]
        );
    }

    #[test]
    fn offsets_are_byte_positions() {
        let tokens = tokenize("a / b").unwrap();
        let offsets: Vec<_> = tokens.iter().map(|t| t.offset).collect();
        assert_eq!(offsets, vec![0, 2, 4]);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            tokenize("//a[@x='open"),
            Err(PathError::InvalidPathExpression { offset: 7, .. })
        ));
        assert!(tokenize("a ! b").is_err());
        assert!(tokenize("a/..").is_err());
        assert!(tokenize("a#b").is_err());
        assert!(tokenize("99999999999999999999999").is_err());
    }
}
