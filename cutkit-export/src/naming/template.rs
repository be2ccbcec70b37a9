//! Output name template evaluation
//!
//! Templates are plain text with `${...}` placeholders. Each placeholder holds a
//! small expression over the naming context:
//!
//! ```text
//! expr    := postfix ('+' postfix)*
//! postfix := primary ('.' IDENT | '[' STRING ']')*
//! primary := IDENT | STRING | NUMBER | '(' expr ')'
//! ```
//!
//! The evaluator only sees the [`NamingContext`] it is given. There is no
//! function call syntax and no binding to anything outside the context, so a
//! template can build strings and nothing else.
//!
//! Outside placeholders, `\$` produces a literal `$`.

use crate::error::TemplateError;
use std::collections::BTreeMap;

/// Value bound to a template variable
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Num(f64),
    Map(BTreeMap<String, String>),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Num(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Num(n as f64)
    }
}

impl From<BTreeMap<String, String>> for Value {
    fn from(m: BTreeMap<String, String>) -> Self {
        Value::Map(m)
    }
}

/// Variables visible to a template
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamingContext {
    vars: BTreeMap<String, Value>,
}

impl NamingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, replacing any previous binding
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        self.vars.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }
}

/// Render a number the way template authors expect (`3`, not `3.0`)
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

/// Evaluate `template` against `ctx`
pub fn evaluate(template: &str, ctx: &NamingContext) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '\\' if matches!(chars.peek(), Some((_, '$' | '\\'))) => {
                if let Some((_, escaped)) = chars.next() {
                    out.push(escaped);
                }
            }
            '$' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                let body_start = pos + 2;
                let body_end = find_placeholder_end(template, body_start)?;
                let source = &template[body_start..body_end];
                out.push_str(&evaluate_placeholder(source, body_start, ctx)?);
                // skip the body and the closing brace
                while let Some((i, _)) = chars.peek() {
                    if *i > body_end {
                        break;
                    }
                    chars.next();
                }
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}

/// Byte offset of the `}` closing a placeholder that starts at `start`
fn find_placeholder_end(template: &str, start: usize) -> Result<usize, TemplateError> {
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in template[start..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '}' => return Ok(start + i),
            _ => {}
        }
    }

    Err(TemplateError::Syntax {
        pos: start.saturating_sub(2),
        message: "unterminated placeholder".to_string(),
    })
}

fn evaluate_placeholder(
    source: &str,
    offset: usize,
    ctx: &NamingContext,
) -> Result<String, TemplateError> {
    let tokens = tokenize(source, offset)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        end_offset: offset + source.len(),
        ctx,
    };
    let value = parser.expr()?;
    if let Some(tok) = parser.tokens.get(parser.pos) {
        return Err(TemplateError::Syntax {
            pos: tok.pos,
            message: "unexpected trailing input".to_string(),
        });
    }

    match value {
        Value::Str(s) => Ok(s),
        Value::Num(n) => Ok(format_number(n)),
        Value::Map(_) => Err(TemplateError::NotAString(source.trim().to_string())),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Ident(String),
    Str(String),
    Num(f64),
    Plus,
    Dot,
    LBracket,
    RBracket,
    LParen,
    RParen,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    pos: usize,
}

fn tokenize(source: &str, offset: usize) -> Result<Vec<Token>, TemplateError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(i, c)) = chars.peek() {
        let pos = offset + i;
        let single = match c {
            '+' => Some(TokenKind::Plus),
            '.' => Some(TokenKind::Dot),
            '[' => Some(TokenKind::LBracket),
            ']' => Some(TokenKind::RBracket),
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            _ => None,
        };
        if let Some(kind) = single {
            chars.next();
            tokens.push(Token { kind, pos });
            continue;
        }

        if c.is_whitespace() {
            chars.next();
        } else if c == '\'' || c == '"' {
            chars.next();
            let mut s = String::new();
            let mut closed = false;
            while let Some((_, ch)) = chars.next() {
                match ch {
                    '\\' => match chars.next() {
                        Some((_, 'n')) => s.push('\n'),
                        Some((_, 't')) => s.push('\t'),
                        Some((_, other)) => s.push(other),
                        None => break,
                    },
                    ch if ch == c => {
                        closed = true;
                        break;
                    }
                    ch => s.push(ch),
                }
            }
            if !closed {
                return Err(TemplateError::Syntax {
                    pos,
                    message: "unterminated string literal".to_string(),
                });
            }
            tokens.push(Token {
                kind: TokenKind::Str(s),
                pos,
            });
        } else if c.is_ascii_digit() {
            let mut text = String::new();
            while let Some(&(_, d)) = chars.peek() {
                if d.is_ascii_digit() || (d == '.' && !text.contains('.')) {
                    text.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            let n = text.parse::<f64>().map_err(|_| TemplateError::Syntax {
                pos,
                message: format!("invalid number `{}`", text),
            })?;
            tokens.push(Token {
                kind: TokenKind::Num(n),
                pos,
            });
        } else if c.is_alphabetic() || c == '_' || c == '$' {
            let mut ident = String::new();
            while let Some(&(_, d)) = chars.peek() {
                if d.is_alphanumeric() || d == '_' || d == '$' {
                    ident.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token {
                kind: TokenKind::Ident(ident),
                pos,
            });
        } else {
            return Err(TemplateError::Syntax {
                pos,
                message: format!("unexpected character `{}`", c),
            });
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    end_offset: usize,
    ctx: &'a NamingContext,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn current_pos(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|t| t.pos)
            .unwrap_or(self.end_offset)
    }

    fn syntax(&self, message: &str) -> TemplateError {
        TemplateError::Syntax {
            pos: self.current_pos(),
            message: message.to_string(),
        }
    }

    fn expr(&mut self) -> Result<Value, TemplateError> {
        let mut acc = self.postfix()?;
        while self.peek() == Some(&TokenKind::Plus) {
            self.next();
            let rhs = self.postfix()?;
            acc = concat(acc, rhs)?;
        }
        Ok(acc)
    }

    fn postfix(&mut self) -> Result<Value, TemplateError> {
        let mut value = self.primary()?;
        loop {
            match self.peek() {
                Some(TokenKind::Dot) => {
                    self.next();
                    let key = match self.next().map(|t| &t.kind) {
                        Some(TokenKind::Ident(name)) => name.clone(),
                        _ => return Err(self.syntax("expected property name after `.`")),
                    };
                    value = property(value, &key)?;
                }
                Some(TokenKind::LBracket) => {
                    self.next();
                    let key = match self.next().map(|t| &t.kind) {
                        Some(TokenKind::Str(s)) => s.clone(),
                        _ => return Err(self.syntax("expected string key inside `[]`")),
                    };
                    if self.next().map(|t| &t.kind) != Some(&TokenKind::RBracket) {
                        return Err(self.syntax("expected `]`"));
                    }
                    value = property(value, &key)?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn primary(&mut self) -> Result<Value, TemplateError> {
        let Some(tok) = self.next() else {
            return Err(self.syntax("expected expression"));
        };
        match &tok.kind {
            TokenKind::Ident(name) => self
                .ctx
                .get(name)
                .cloned()
                .ok_or_else(|| TemplateError::UnknownVariable(name.clone())),
            TokenKind::Str(s) => Ok(Value::Str(s.clone())),
            TokenKind::Num(n) => Ok(Value::Num(*n)),
            TokenKind::LParen => {
                let inner = self.expr()?;
                if self.next().map(|t| &t.kind) != Some(&TokenKind::RParen) {
                    return Err(self.syntax("expected `)`"));
                }
                Ok(inner)
            }
            _ => Err(TemplateError::Syntax {
                pos: tok.pos,
                message: "expected expression".to_string(),
            }),
        }
    }
}

fn property(value: Value, key: &str) -> Result<Value, TemplateError> {
    match value {
        // missing keys read as empty so per-segment tags can be optional
        Value::Map(map) => Ok(Value::Str(map.get(key).cloned().unwrap_or_default())),
        _ => Err(TemplateError::InvalidOperand(format!(".{}", key))),
    }
}

fn concat(lhs: Value, rhs: Value) -> Result<Value, TemplateError> {
    match (lhs, rhs) {
        (Value::Num(a), Value::Num(b)) => Ok(Value::Num(a + b)),
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
        (Value::Str(a), Value::Num(b)) => Ok(Value::Str(a + &format_number(b))),
        (Value::Num(a), Value::Str(b)) => Ok(Value::Str(format_number(a) + &b)),
        _ => Err(TemplateError::InvalidOperand("+".to_string())),
    }
}
