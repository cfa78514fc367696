//! Literal-only call grammar
//!
//! Parses `identifier(lit, lit, ...)` where every argument is a scalar or a
//! container of scalars. Nothing is ever evaluated: names other than the
//! boolean and null keywords, operators and nested calls are rejected.

use std::fmt::{self, Write as _};

/// A literal argument value
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Literal>),
    Tuple(Vec<Literal>),
    Dict(Vec<(Literal, Literal)>),
}

impl Literal {
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric value, widening integers
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Render in call syntax, so that parsing the output yields `self` again
    ///
    /// Strings are double-quoted. Non-finite floats have no literal spelling
    /// and render as `inf` / `nan`, which the parser rejects.
    #[must_use]
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        self.write_source(&mut out);
        out
    }

    fn write_source(&self, out: &mut String) {
        match self {
            Self::Str(s) => write_double_quoted(s, out),
            Self::List(items) => {
                out.push('[');
                write_source_seq(items, out);
                out.push(']');
            }
            Self::Tuple(items) => {
                out.push('(');
                write_source_seq(items, out);
                if items.len() == 1 {
                    out.push(',');
                }
                out.push(')');
            }
            Self::Dict(pairs) => {
                out.push('{');
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    k.write_source(out);
                    out.push_str(": ");
                    v.write_source(out);
                }
                out.push('}');
            }
            scalar => {
                let _ = write!(out, "{scalar}");
            }
        }
    }

    /// Convert to a JSON value for host payloads
    ///
    /// Tuples become arrays; dictionary keys are stringified.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            Self::None => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(v) => Value::from(*v),
            Self::Float(v) => serde_json::Number::from_f64(*v).map_or(Value::Null, Value::Number),
            Self::Str(s) => Value::String(s.clone()),
            Self::List(items) | Self::Tuple(items) => {
                Value::Array(items.iter().map(Self::to_json).collect())
            }
            Self::Dict(pairs) => Value::Object(
                pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Quoted form used inside containers
    fn write_repr(&self, out: &mut String) {
        match self {
            Self::Str(s) => write_single_quoted(s, out),
            other => {
                let _ = write!(out, "{other}");
            }
        }
    }
}

/// Text coercion of a value: strings bare, everything else in literal form
/// with inner strings quoted (`[1, 'a']`)
impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => f.write_str(&format_float(*v)),
            Self::Str(s) => f.write_str(s),
            Self::List(items) => {
                let mut out = String::from("[");
                write_repr_seq(items, &mut out);
                out.push(']');
                f.write_str(&out)
            }
            Self::Tuple(items) => {
                let mut out = String::from("(");
                write_repr_seq(items, &mut out);
                if items.len() == 1 {
                    out.push(',');
                }
                out.push(')');
                f.write_str(&out)
            }
            Self::Dict(pairs) => {
                let mut out = String::from("{");
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    k.write_repr(&mut out);
                    out.push_str(": ");
                    v.write_repr(&mut out);
                }
                out.push('}');
                f.write_str(&out)
            }
        }
    }
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Literal {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// Shortest round-trip digits; exponent form below 1e-4 and from 1e16 up,
/// with a signed exponent of at least two digits (`1e-05`, `1.5e+20`)
fn format_float(v: f64) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return (if v > 0.0 { "inf" } else { "-inf" }).to_string();
    }

    let scientific = format!("{v:e}");
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if (-4..16).contains(&exponent) {
        let plain = v.to_string();
        if plain.contains('.') {
            plain
        } else {
            format!("{plain}.0")
        }
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs())
    }
}

/// Drop `_` digit separators, each of which must sit between two digits
fn strip_underscores(raw: &str, radix: u32) -> Option<String> {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    for (i, &c) in chars.iter().enumerate() {
        if c != '_' {
            out.push(c);
            continue;
        }
        let before = i.checked_sub(1).and_then(|j| chars.get(j));
        let after = chars.get(i + 1);
        if !(before.is_some_and(|b| b.is_digit(radix)) && after.is_some_and(|a| a.is_digit(radix)))
        {
            return None;
        }
    }
    Some(out)
}

fn write_source_seq(items: &[Literal], out: &mut String) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        item.write_source(out);
    }
}

fn write_repr_seq(items: &[Literal], out: &mut String) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        item.write_repr(out);
    }
}

fn write_double_quoted(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn write_single_quoted(s: &str, out: &mut String) {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
}

/// Parse `name(arg, ...)` into the function name and its literal arguments
///
/// Integers may use `_` separators and `0x` / `0o` / `0b` prefixes but must
/// fit in an `i64`; larger values are rejected rather than widened. Set
/// literals (`{1, 2}`), byte strings and string prefixes are not part of the
/// grammar.
///
/// # Errors
///
/// Returns a description of the first offending construct
pub fn parse_call(text: &str) -> std::result::Result<(String, Vec<Literal>), String> {
    let mut parser = Parser::new(text);
    parser.skip_ws();

    let name = parser
        .identifier()
        .ok_or_else(|| "expected a function name".to_string())?;

    parser.skip_ws();
    parser.expect('(')?;

    let mut args = Vec::new();
    loop {
        parser.skip_ws();
        if parser.eat(')') {
            break;
        }
        let start = parser.pos;
        if let Some(ident) = parser.identifier() {
            parser.skip_ws();
            if parser.peek() == Some('=') {
                return Err(format!("keyword argument `{ident}` is not supported"));
            }
            parser.pos = start;
        }
        args.push(parser.literal()?);
        parser.skip_ws();
        if parser.eat(')') {
            break;
        }
        parser.expect(',')?;
    }

    parser.skip_ws();
    if let Some(c) = parser.peek() {
        return Err(format!("unexpected `{c}` after the call"));
    }

    Ok((name, args))
}

/// Parse a single literal value
///
/// # Errors
///
/// Returns a description of the first offending construct
pub fn parse_literal(text: &str) -> std::result::Result<Literal, String> {
    let mut parser = Parser::new(text);
    parser.skip_ws();
    let value = parser.literal()?;
    parser.skip_ws();
    match parser.peek() {
        Some(c) => Err(format!("unexpected `{c}` after the literal")),
        None => Ok(value),
    }
}

/// Nesting limit for containers
const MAX_DEPTH: usize = 32;

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> std::result::Result<(), String> {
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => Err(format!("expected `{expected}`, found `{c}`")),
            None => Err(format!("expected `{expected}`, found end of input")),
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn identifier(&mut self) -> Option<String> {
        let first = self.peek()?;
        if !(first.is_alphabetic() || first == '_') {
            return None;
        }
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        Some(self.chars[start..self.pos].iter().collect())
    }

    fn literal(&mut self) -> std::result::Result<Literal, String> {
        match self.peek() {
            None => Err("expected a literal, found end of input".to_string()),
            Some('"' | '\'') => self.string().map(Literal::Str),
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.number(),
            Some('[') => self.nested(|p| p.sequence(']').map(Literal::List)),
            Some('(') => self.nested(Self::parenthesized),
            Some('{') => self.nested(Self::dict),
            Some(_) => {
                let Some(ident) = self.identifier() else {
                    let c = self.peek().unwrap_or_default();
                    return Err(format!("unexpected `{c}` where a literal was expected"));
                };
                match ident.as_str() {
                    "True" | "true" => Ok(Literal::Bool(true)),
                    "False" | "false" => Ok(Literal::Bool(false)),
                    "None" | "null" => Ok(Literal::None),
                    _ => {
                        self.skip_ws();
                        if self.peek() == Some('(') {
                            Err(format!("nested call `{ident}(...)` is not a literal"))
                        } else {
                            Err(format!("name `{ident}` is not a literal"))
                        }
                    }
                }
            }
        }
    }

    fn nested(
        &mut self,
        parse: impl FnOnce(&mut Self) -> std::result::Result<Literal, String>,
    ) -> std::result::Result<Literal, String> {
        if self.depth >= MAX_DEPTH {
            return Err("literal nested too deeply".to_string());
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Comma-separated literals after an opening bracket, up to `close`
    fn sequence(&mut self, close: char) -> std::result::Result<Vec<Literal>, String> {
        self.bump();
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.eat(close) {
                return Ok(items);
            }
            items.push(self.literal()?);
            self.skip_ws();
            if self.eat(close) {
                return Ok(items);
            }
            self.expect(',')?;
        }
    }

    /// `()` and `(a,)` are tuples; `(a)` is just `a`
    fn parenthesized(&mut self) -> std::result::Result<Literal, String> {
        self.bump();
        self.skip_ws();
        if self.eat(')') {
            return Ok(Literal::Tuple(Vec::new()));
        }
        let first = self.literal()?;
        self.skip_ws();
        if self.eat(')') {
            return Ok(first);
        }
        self.expect(',')?;
        let mut items = vec![first];
        loop {
            self.skip_ws();
            if self.eat(')') {
                return Ok(Literal::Tuple(items));
            }
            items.push(self.literal()?);
            self.skip_ws();
            if self.eat(')') {
                return Ok(Literal::Tuple(items));
            }
            self.expect(',')?;
        }
    }

    fn dict(&mut self) -> std::result::Result<Literal, String> {
        self.bump();
        let mut pairs = Vec::new();
        loop {
            self.skip_ws();
            if self.eat('}') {
                return Ok(Literal::Dict(pairs));
            }
            let key = self.literal()?;
            if matches!(key, Literal::List(_) | Literal::Dict(_)) {
                return Err("dictionary keys must be scalars or tuples".to_string());
            }
            self.skip_ws();
            self.expect(':')?;
            self.skip_ws();
            let value = self.literal()?;
            pairs.push((key, value));
            self.skip_ws();
            if self.eat('}') {
                return Ok(Literal::Dict(pairs));
            }
            self.expect(',')?;
        }
    }

    fn string(&mut self) -> std::result::Result<String, String> {
        let Some(quote) = self.bump() else {
            return Err("expected a string".to_string());
        };
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err("unterminated string".to_string()),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => {
                    let escaped = match self.bump() {
                        None => return Err("unterminated string".to_string()),
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('0') => '\0',
                        Some('u') => self.unicode_escape()?,
                        Some(c @ ('\\' | '\'' | '"')) => c,
                        Some(c) => {
                            out.push('\\');
                            c
                        }
                    };
                    out.push(escaped);
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn unicode_escape(&mut self) -> std::result::Result<char, String> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| "invalid \\u escape".to_string())?;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or_else(|| format!("invalid code point \\u{code:04x}"))
    }

    fn number(&mut self) -> std::result::Result<Literal, String> {
        let start = self.pos;
        if matches!(self.peek(), Some('-' | '+')) {
            self.pos += 1;
            self.skip_ws();
        }
        let sign: String = self.chars[start..self.pos]
            .iter()
            .filter(|c| !c.is_whitespace())
            .collect();

        if let Some(radix) = self.radix_prefix() {
            return self.radix_integer(&sign, radix);
        }

        let digits_start = self.pos;
        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' | '_' => {}
                '.' if !is_float => is_float = true,
                'e' | 'E' => {
                    is_float = true;
                    self.pos += 1;
                    if matches!(self.peek(), Some('-' | '+')) {
                        self.pos += 1;
                    }
                    continue;
                }
                _ => break,
            }
            self.pos += 1;
        }

        let raw: String = self.chars[digits_start..self.pos].iter().collect();
        let malformed = || format!("malformed number `{sign}{raw}`");
        if !raw.chars().any(|c| c.is_ascii_digit()) {
            return Err(malformed());
        }
        if self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            return Err(malformed());
        }
        let digits = strip_underscores(&raw, 10).ok_or_else(malformed)?;

        let text = format!("{sign}{digits}");
        if is_float {
            text.parse::<f64>()
                .map(Literal::Float)
                .map_err(|_| format!("malformed number `{text}`"))
        } else {
            text.parse::<i64>()
                .map(Literal::Int)
                .map_err(|_| format!("integer `{text}` out of range"))
        }
    }

    /// Consume a `0x` / `0o` / `0b` prefix
    fn radix_prefix(&mut self) -> Option<u32> {
        if self.peek() != Some('0') {
            return None;
        }
        let radix = match self.chars.get(self.pos + 1)? {
            'x' | 'X' => 16,
            'o' | 'O' => 8,
            'b' | 'B' => 2,
            _ => return None,
        };
        self.pos += 2;
        Some(radix)
    }

    fn radix_integer(&mut self, sign: &str, radix: u32) -> std::result::Result<Literal, String> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        let raw: String = self.chars[start..self.pos].iter().collect();
        let digits = strip_underscores(&raw, radix)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| format!("malformed base-{radix} integer `{sign}{raw}`"))?;

        i64::from_str_radix(&format!("{sign}{digits}"), radix)
            .map(Literal::Int)
            .map_err(|_| format!("malformed or out of range base-{radix} integer `{sign}{raw}`"))
    }
}
