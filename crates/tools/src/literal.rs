//! Constrained literal parser for tabular tool data.
//!
//! Accepts the small grammar models and the SQL tool use to pass rows around:
//! lists, tuples, single- or double-quoted strings, integers, floats, and the
//! constants `None`, `True`, `False`. Anything else is rejected; nothing is
//! evaluated.

use fieldhand_core::capability::SqlValue;
use std::fmt;

const MAX_DEPTH: usize = 32;

/// A parsed literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Literal>),
    Tuple(Vec<Literal>),
}

impl Literal {
    /// Items of a list or tuple.
    pub fn items(&self) -> Option<&[Literal]> {
        match self {
            Literal::List(items) | Literal::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Numeric value of an int or float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Literal::Int(n) => Some(*n as f64),
            Literal::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Human-facing text: strings without quotes, sequences joined with `", "`.
    pub fn to_plain(&self) -> String {
        match self {
            Literal::Str(s) => s.clone(),
            Literal::List(items) | Literal::Tuple(items) => items
                .iter()
                .map(Literal::to_plain)
                .collect::<Vec<_>>()
                .join(", "),
            other => other.to_string(),
        }
    }
}

impl From<&SqlValue> for Literal {
    fn from(value: &SqlValue) -> Self {
        match value {
            SqlValue::Null => Literal::None,
            SqlValue::Integer(n) => Literal::Int(*n),
            SqlValue::Real(f) => Literal::Float(*f),
            SqlValue::Text(s) => Literal::Str(s.clone()),
        }
    }
}

/// Database rows as a list of tuples.
pub fn rows_literal(rows: &[Vec<SqlValue>]) -> Literal {
    Literal::List(
        rows.iter()
            .map(|row| Literal::Tuple(row.iter().map(Literal::from).collect()))
            .collect(),
    )
}

/// Renders in the same grammar [`parse`] accepts.
impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::None => f.write_str("None"),
            Literal::Bool(true) => f.write_str("True"),
            Literal::Bool(false) => f.write_str("False"),
            Literal::Int(n) => write!(f, "{n}"),
            Literal::Float(x) if x.is_finite() => write!(f, "{x:?}"),
            Literal::Float(x) if x.is_nan() => f.write_str("nan"),
            Literal::Float(x) => f.write_str(if *x > 0.0 { "inf" } else { "-inf" }),
            Literal::Str(s) => {
                f.write_str("'")?;
                for c in s.chars() {
                    match c {
                        '\'' => f.write_str("\\'")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        '\r' => f.write_str("\\r")?,
                        c => write!(f, "{c}")?,
                    }
                }
                f.write_str("'")
            }
            Literal::List(items) => {
                f.write_str("[")?;
                write_items(f, items)?;
                f.write_str("]")
            }
            Literal::Tuple(items) => {
                f.write_str("(")?;
                write_items(f, items)?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Literal]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

// ── Recursive-descent parser ─────────────────────────────────────────────

/// Parse a literal, rejecting trailing input.
pub fn parse(input: &str) -> Result<Literal, String> {
    let tokens = tokenize(input)?;
    let mut parser = Parser::new(&tokens);
    let value = parser.parse_value(0)?;
    if parser.pos < parser.tokens.len() {
        return Err(format!(
            "Unexpected token at position {}: {:?}",
            parser.pos, parser.tokens[parser.pos]
        ));
    }
    Ok(value)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Str(String),
    Int(i64),
    Float(f64),
    Ident(String),
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            c if c.is_whitespace() => i += 1,
            '[' => { tokens.push(Token::LBracket); i += 1; }
            ']' => { tokens.push(Token::RBracket); i += 1; }
            '(' => { tokens.push(Token::LParen); i += 1; }
            ')' => { tokens.push(Token::RParen); i += 1; }
            ',' => { tokens.push(Token::Comma); i += 1; }
            quote @ ('\'' | '"') => {
                i += 1;
                let mut s = String::new();
                loop {
                    match chars.get(i) {
                        None => return Err("Unterminated string".into()),
                        Some(&c) if c == quote => {
                            i += 1;
                            break;
                        }
                        Some('\\') => {
                            let escaped = chars.get(i + 1).ok_or("Unterminated string")?;
                            s.push(match escaped {
                                'n' => '\n',
                                't' => '\t',
                                'r' => '\r',
                                '0' => '\0',
                                other => *other,
                            });
                            i += 2;
                        }
                        Some(&c) => {
                            s.push(c);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token::Str(s));
            }
            c if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                let start = i;
                i += 1;
                while i < chars.len()
                    && (chars[i].is_ascii_alphanumeric()
                        || chars[i] == '.'
                        || chars[i] == '_'
                        || ((chars[i] == '-' || chars[i] == '+')
                            && matches!(chars[i - 1], 'e' | 'E')))
                {
                    i += 1;
                }
                let text: String = chars[start..i].iter().filter(|c| **c != '_').collect();
                tokens.push(number_token(&text)?);
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            c => return Err(format!("Unexpected character: '{c}'")),
        }
    }

    Ok(tokens)
}

fn number_token(text: &str) -> Result<Token, String> {
    if let Ok(n) = text.parse::<i64>() {
        return Ok(Token::Int(n));
    }
    let is_float_syntax = text
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '-' | '+'));
    match text.parse::<f64>() {
        Ok(f) if is_float_syntax => Ok(Token::Float(f)),
        _ => Err(format!("Invalid number: {text}")),
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    // value = '[' items ']' | '(' items ')' | STRING | NUMBER | IDENT
    fn parse_value(&mut self, depth: usize) -> Result<Literal, String> {
        if depth > MAX_DEPTH {
            return Err("Nesting too deep".into());
        }
        match self.consume().cloned() {
            Some(Token::LBracket) => {
                let (items, _) = self.parse_items(&Token::RBracket, depth)?;
                Ok(Literal::List(items))
            }
            Some(Token::LParen) => {
                let (items, trailing_comma) = self.parse_items(&Token::RParen, depth)?;
                // `(x)` is a parenthesised value, `(x,)` a one-tuple.
                if items.len() == 1 && !trailing_comma {
                    Ok(items.into_iter().next().unwrap_or(Literal::None))
                } else {
                    Ok(Literal::Tuple(items))
                }
            }
            Some(Token::Str(s)) => {
                // Adjacent string literals concatenate.
                let mut s = s;
                while let Some(Token::Str(next)) = self.peek() {
                    s.push_str(next);
                    self.pos += 1;
                }
                Ok(Literal::Str(s))
            }
            Some(Token::Int(n)) => Ok(Literal::Int(n)),
            Some(Token::Float(f)) => Ok(Literal::Float(f)),
            Some(Token::Ident(name)) => match name.as_str() {
                "None" => Ok(Literal::None),
                "True" => Ok(Literal::Bool(true)),
                "False" => Ok(Literal::Bool(false)),
                other => Err(format!("Unsupported name: {other}")),
            },
            Some(tok) => Err(format!("Unexpected token: {tok:?}")),
            None => Err("Unexpected end of input".into()),
        }
    }

    // items = (value (',' value)* ','?)?
    fn parse_items(&mut self, close: &Token, depth: usize) -> Result<(Vec<Literal>, bool), String> {
        let mut items = Vec::new();
        let mut trailing_comma = false;
        loop {
            if self.peek() == Some(close) {
                self.consume();
                return Ok((items, trailing_comma));
            }
            items.push(self.parse_value(depth + 1)?);
            trailing_comma = false;
            match self.consume() {
                Some(Token::Comma) => trailing_comma = true,
                Some(tok) if tok == close => return Ok((items, false)),
                Some(tok) => return Err(format!("Expected ',' or {close:?}, found {tok:?}")),
                None => return Err(format!("Missing closing {close:?}")),
            }
        }
    }
}
