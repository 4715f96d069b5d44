/* Streaming token model.

JsonReader lexes the borrowed input on demand with one token of lookahead;
nothing is materialized beyond the current token. JsonWriter appends to a
byte buffer while a frame stack checks the structure. Both sides use the
token categories the codec IR is written against. */

use crate::errors::{ReflectError, ReflectResult};
use codec_gen::codegen::ir::TokenKind;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as Json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Object,
    Array,
}

/* What the grammar allows next */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Value,
    FirstEntry,
    AfterValue,
}

/* Current token: kind plus its byte span. Strings keep their quotes. */
#[derive(Debug, Clone, Copy)]
struct Lexeme {
    kind: TokenKind,
    start: usize,
    end: usize,
    escaped: bool,
}

#[derive(Debug, Clone)]
pub struct JsonReader<'a> {
    input: &'a str,
    pos: usize,
    scopes: Vec<Scope>,
    state: State,
    current: Lexeme,
    consumed_end: usize,
}

impl<'a> JsonReader<'a> {
    pub fn parse(input: &'a str) -> ReflectResult<Self> {
        let mut reader = Self {
            input,
            pos: 0,
            scopes: Vec::new(),
            state: State::Value,
            current: Lexeme { kind: TokenKind::EndDocument, start: 0, end: 0, escaped: false },
            consumed_end: 0,
        };
        reader.current = reader.lex()?;
        Ok(reader)
    }

    pub fn peek(&self) -> TokenKind {
        self.current.kind
    }

    /// True while the current object or array has more members.
    pub fn has_next(&self) -> bool {
        !matches!(self.peek(), TokenKind::EndObject | TokenKind::EndArray | TokenKind::EndDocument)
    }

    pub fn is_exhausted(&self) -> bool {
        self.peek() == TokenKind::EndDocument
    }

    fn syntax(&self, reason: &'static str) -> ReflectError {
        ReflectError::Syntax { offset: self.pos, reason }
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.input[self.pos..];
        self.pos += rest.len() - rest.trim_start_matches(|c: char| matches!(c, ' ' | '\t' | '\n' | '\r')).len();
    }

    fn byte(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn lexeme(&self, kind: TokenKind, start: usize) -> Lexeme {
        Lexeme { kind, start, end: self.pos, escaped: false }
    }

    /* Consumes one punctuation byte as a token */
    fn punct(&mut self, kind: TokenKind) -> Lexeme {
        let start = self.pos;
        self.pos += 1;
        self.lexeme(kind, start)
    }

    fn lex(&mut self) -> ReflectResult<Lexeme> {
        self.skip_whitespace();
        let scope = self.scopes.last().copied();
        match (self.state, scope) {
            (State::Value, _) => self.lex_value(),
            (State::AfterValue, None) => match self.byte() {
                None => Ok(self.lexeme(TokenKind::EndDocument, self.pos)),
                Some(_) => Err(self.syntax("trailing characters after the document")),
            },
            (State::FirstEntry, Some(Scope::Object)) => match self.byte() {
                Some(b'}') => Ok(self.punct(TokenKind::EndObject)),
                _ => self.lex_name(),
            },
            (State::FirstEntry, Some(Scope::Array)) => match self.byte() {
                Some(b']') => Ok(self.punct(TokenKind::EndArray)),
                _ => self.lex_value(),
            },
            (State::AfterValue, Some(container)) => match (self.byte(), container) {
                (Some(b','), Scope::Object) => {
                    self.pos += 1;
                    self.skip_whitespace();
                    self.lex_name()
                }
                (Some(b','), Scope::Array) => {
                    self.pos += 1;
                    self.skip_whitespace();
                    self.lex_value()
                }
                (Some(b'}'), Scope::Object) => Ok(self.punct(TokenKind::EndObject)),
                (Some(b']'), Scope::Array) => Ok(self.punct(TokenKind::EndArray)),
                (None, _) => Err(ReflectError::UnexpectedEnd),
                _ => Err(self.syntax("expected ',' or a closing bracket")),
            },
            (State::FirstEntry, None) => Err(self.syntax("container state without a container")),
        }
    }

    fn lex_name(&mut self) -> ReflectResult<Lexeme> {
        if self.byte() != Some(b'"') {
            return Err(self.syntax("expected a member name"));
        }
        let name = self.lex_string(TokenKind::Name)?;
        self.skip_whitespace();
        if self.byte() != Some(b':') {
            return Err(self.syntax("expected ':' after a member name"));
        }
        self.pos += 1;
        Ok(name)
    }

    fn lex_value(&mut self) -> ReflectResult<Lexeme> {
        let start = self.pos;
        match self.byte() {
            None => Err(ReflectError::UnexpectedEnd),
            Some(b'{') => Ok(self.punct(TokenKind::BeginObject)),
            Some(b'[') => Ok(self.punct(TokenKind::BeginArray)),
            Some(b'"') => self.lex_string(TokenKind::String),
            Some(b'-' | b'0'..=b'9') => {
                let rest = &self.input[start..];
                let len = rest
                    .find(|c: char| !matches!(c, '0'..='9' | '-' | '+' | '.' | 'e' | 'E'))
                    .unwrap_or(rest.len());
                if rest[..len].parse::<f64>().is_err() {
                    return Err(self.syntax("malformed number"));
                }
                self.pos += len;
                Ok(self.lexeme(TokenKind::Number, start))
            }
            Some(_) => {
                let rest = &self.input[start..];
                for (word, kind) in [("true", TokenKind::Boolean), ("false", TokenKind::Boolean), ("null", TokenKind::Null)] {
                    if rest.starts_with(word) {
                        self.pos += word.len();
                        return Ok(self.lexeme(kind, start));
                    }
                }
                Err(self.syntax("unexpected character"))
            }
        }
    }

    /* Scans a quoted string; the span includes both quotes */
    fn lex_string(&mut self, kind: TokenKind) -> ReflectResult<Lexeme> {
        let start = self.pos;
        let bytes = self.input.as_bytes();
        let mut at = start + 1;
        let mut escaped = false;
        loop {
            match bytes.get(at) {
                None => return Err(ReflectError::UnexpectedEnd),
                Some(b'"') => break,
                Some(b'\\') => {
                    escaped = true;
                    at += 2;
                }
                Some(_) => at += 1,
            }
        }
        self.pos = at + 1;
        Ok(Lexeme { kind, start, end: self.pos, escaped })
    }

    /* Consumes the current token and lexes the next one */
    fn advance(&mut self) -> ReflectResult<Lexeme> {
        let token = self.current;
        if token.kind == TokenKind::EndDocument {
            return Err(ReflectError::UnexpectedEnd);
        }
        match token.kind {
            TokenKind::BeginObject => {
                self.scopes.push(Scope::Object);
                self.state = State::FirstEntry;
            }
            TokenKind::BeginArray => {
                self.scopes.push(Scope::Array);
                self.state = State::FirstEntry;
            }
            TokenKind::EndObject | TokenKind::EndArray => {
                self.scopes.pop();
                self.state = State::AfterValue;
            }
            TokenKind::Name => self.state = State::Value,
            _ => self.state = State::AfterValue,
        }
        self.consumed_end = token.end;
        self.current = self.lex()?;
        Ok(token)
    }

    fn expect(&mut self, expected: TokenKind) -> ReflectResult<Lexeme> {
        let found = self.peek();
        if found != expected {
            return Err(ReflectError::UnexpectedToken { expected, found });
        }
        self.advance()
    }

    fn text_of(&self, token: &Lexeme) -> ReflectResult<String> {
        match token.kind {
            TokenKind::String | TokenKind::Name => {
                let quoted = &self.input[token.start..token.end];
                if token.escaped {
                    Ok(serde_json::from_str(quoted)?)
                } else {
                    Ok(quoted[1..quoted.len() - 1].to_string())
                }
            }
            _ => Ok(self.input[token.start..token.end].to_string()),
        }
    }

    pub fn begin_object(&mut self) -> ReflectResult<()> {
        self.expect(TokenKind::BeginObject).map(|_| ())
    }

    pub fn end_object(&mut self) -> ReflectResult<()> {
        self.expect(TokenKind::EndObject).map(|_| ())
    }

    pub fn begin_array(&mut self) -> ReflectResult<()> {
        self.expect(TokenKind::BeginArray).map(|_| ())
    }

    pub fn end_array(&mut self) -> ReflectResult<()> {
        self.expect(TokenKind::EndArray).map(|_| ())
    }

    pub fn next_null(&mut self) -> ReflectResult<()> {
        self.expect(TokenKind::Null).map(|_| ())
    }

    pub fn next_name(&mut self) -> ReflectResult<String> {
        let token = self.expect(TokenKind::Name)?;
        self.text_of(&token)
    }

    /// Numbers are accepted and returned in their textual form.
    pub fn next_string(&mut self) -> ReflectResult<String> {
        match self.peek() {
            TokenKind::String | TokenKind::Number => {
                let token = self.advance()?;
                self.text_of(&token)
            }
            found => Err(ReflectError::UnexpectedToken { expected: TokenKind::String, found }),
        }
    }

    pub fn next_bool(&mut self) -> ReflectResult<bool> {
        let token = self.expect(TokenKind::Boolean)?;
        Ok(&self.input[token.start..token.end] == "true")
    }

    /* Numbers, or strings holding numbers */
    fn next_number_text(&mut self) -> ReflectResult<String> {
        match self.peek() {
            TokenKind::Number | TokenKind::String => {
                let token = self.advance()?;
                self.text_of(&token)
            }
            found => Err(ReflectError::UnexpectedToken { expected: TokenKind::Number, found }),
        }
    }

    pub fn next_long(&mut self) -> ReflectResult<i64> {
        let text = self.next_number_text()?;
        let trimmed = text.trim();
        let parsed = trimmed.parse::<i64>().ok().or_else(|| {
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        });
        parsed.ok_or(ReflectError::NumberFormat { text, target: "long" })
    }

    pub fn next_int(&mut self) -> ReflectResult<i32> {
        let text = self.next_number_text()?;
        let trimmed = text.trim();
        let parsed = trimmed
            .parse::<i64>()
            .ok()
            .or_else(|| trimmed.parse::<f64>().ok().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .and_then(|v| i32::try_from(v).ok());
        parsed.ok_or(ReflectError::NumberFormat { text, target: "int" })
    }

    pub fn next_double(&mut self) -> ReflectResult<f64> {
        let text = self.next_number_text()?;
        text.trim().parse::<f64>().map_err(|_| ReflectError::NumberFormat { text, target: "double" })
    }

    pub fn next_float(&mut self) -> ReflectResult<f32> {
        self.next_double().map(|value| value as f32)
    }

    /// Skips the next complete value, including nested containers.
    pub fn skip_value(&mut self) -> ReflectResult<()> {
        let mut depth = 0usize;
        loop {
            match self.advance()?.kind {
                TokenKind::BeginObject | TokenKind::BeginArray => depth += 1,
                TokenKind::EndObject | TokenKind::EndArray => {
                    if depth == 0 {
                        return Err(ReflectError::UnexpectedToken { expected: TokenKind::Null, found: TokenKind::EndObject });
                    }
                    depth -= 1;
                }
                TokenKind::Name => continue,
                _ => {}
            }
            if depth == 0 {
                return Ok(());
            }
        }
    }

    /// Deserializes the next complete value straight from its source text.
    pub fn deserialize_next<T: DeserializeOwned>(&mut self) -> ReflectResult<T> {
        let start = self.current.start;
        self.skip_value()?;
        Ok(serde_json::from_str(&self.input[start..self.consumed_end])?)
    }

    /// Reads the next complete value as a JSON tree.
    pub fn read_json(&mut self) -> ReflectResult<Json> {
        self.deserialize_next()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Object { awaiting_value: bool, empty: bool },
    Array { empty: bool },
}

#[derive(Debug, Clone, Default)]
pub struct JsonWriter {
    out: Vec<u8>,
    stack: Vec<Frame>,
}

impl JsonWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn before_value(&mut self) -> ReflectResult<()> {
        match self.stack.last_mut() {
            Some(Frame::Object { awaiting_value, .. }) => {
                if !*awaiting_value {
                    return Err(ReflectError::InvalidWrite { reason: "object member written without a name" });
                }
                *awaiting_value = false;
            }
            Some(Frame::Array { empty }) => {
                if !*empty {
                    self.out.push(b',');
                }
                *empty = false;
            }
            None => {
                if !self.out.is_empty() {
                    return Err(ReflectError::InvalidWrite { reason: "document already has a top-level value" });
                }
            }
        }
        Ok(())
    }

    /// Writes any serializable value in place of one token.
    pub fn serialize<T: Serialize + ?Sized>(&mut self, value: &T) -> ReflectResult<()> {
        self.before_value()?;
        serde_json::to_writer(&mut self.out, value)?;
        Ok(())
    }

    pub fn begin_object(&mut self) -> ReflectResult<()> {
        self.before_value()?;
        self.out.push(b'{');
        self.stack.push(Frame::Object { awaiting_value: false, empty: true });
        Ok(())
    }

    pub fn end_object(&mut self) -> ReflectResult<()> {
        match self.stack.pop() {
            Some(Frame::Object { awaiting_value: false, .. }) => {
                self.out.push(b'}');
                Ok(())
            }
            _ => Err(ReflectError::InvalidWrite { reason: "end_object without a matching open object" }),
        }
    }

    pub fn begin_array(&mut self) -> ReflectResult<()> {
        self.before_value()?;
        self.out.push(b'[');
        self.stack.push(Frame::Array { empty: true });
        Ok(())
    }

    pub fn end_array(&mut self) -> ReflectResult<()> {
        match self.stack.pop() {
            Some(Frame::Array { .. }) => {
                self.out.push(b']');
                Ok(())
            }
            _ => Err(ReflectError::InvalidWrite { reason: "end_array without a matching open array" }),
        }
    }

    pub fn name(&mut self, name: &str) -> ReflectResult<()> {
        match self.stack.last_mut() {
            Some(Frame::Object { awaiting_value, empty }) if !*awaiting_value => {
                if !*empty {
                    self.out.push(b',');
                }
                *awaiting_value = true;
                *empty = false;
            }
            _ => return Err(ReflectError::InvalidWrite { reason: "name written outside an object" }),
        }
        serde_json::to_writer(&mut self.out, name)?;
        self.out.push(b':');
        Ok(())
    }

    pub fn null_value(&mut self) -> ReflectResult<()> {
        self.serialize(&())
    }

    pub fn bool_value(&mut self, value: bool) -> ReflectResult<()> {
        self.serialize(&value)
    }

    pub fn int_value(&mut self, value: i32) -> ReflectResult<()> {
        self.serialize(&value)
    }

    pub fn long_value(&mut self, value: i64) -> ReflectResult<()> {
        self.serialize(&value)
    }

    pub fn double_value(&mut self, value: f64) -> ReflectResult<()> {
        if !value.is_finite() {
            return Err(ReflectError::NonFiniteNumber { value });
        }
        self.serialize(&value)
    }

    pub fn float_value(&mut self, value: f32) -> ReflectResult<()> {
        self.double_value(f64::from(value))
    }

    pub fn string_value(&mut self, value: &str) -> ReflectResult<()> {
        self.serialize(value)
    }

    /// Writes a whole JSON tree as one value.
    pub fn json_value(&mut self, json: &Json) -> ReflectResult<()> {
        self.serialize(json)
    }

    /// The written text; fails while containers are still open.
    pub fn into_string(self) -> ReflectResult<String> {
        if !self.stack.is_empty() {
            return Err(ReflectError::InvalidWrite { reason: "document has unclosed containers" });
        }
        if self.out.is_empty() {
            return Err(ReflectError::UnexpectedEnd);
        }
        String::from_utf8(self.out).map_err(|_| ReflectError::InvalidWrite { reason: "output is not UTF-8" })
    }

    pub fn into_json(self) -> ReflectResult<Json> {
        Ok(serde_json::from_str(&self.into_string()?)?)
    }
}
