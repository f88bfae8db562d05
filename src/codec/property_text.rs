//! Property-text encoder and decoder.
//!
//! The engine importer reads arrays and structs from a single cell in its own
//! parenthesized notation rather than JSON:
//!
//! ```text
//! ("Character","Item")
//! ((stat_id="01HP",value=100),(stat_id="01ATK",value=10))
//! ```
//!
//! Grammar accepted by [`decode`]:
//!
//! ```text
//! container := '(' [ item { ',' item } ] ')'
//! item      := [ key '=' ] element
//! key       := bare-identifier | quoted
//! element   := container | quoted | number | 'true' | 'false' | <empty>
//! quoted    := '"' { char | '\"' | '\\' } '"'
//! ```
//!
//! A container whose items all carry keys is a struct; one with no keys is
//! an array; mixing the two is an error. `()` decodes as an empty array.
//!
//! Two shapes do not survive a round trip, since the notation has no way to
//! spell them:
//!
//! - an empty struct encodes as `()` and decodes as an empty array, at any
//!   depth (`(meta=())` yields `meta = []`);
//! - an array holding a single null encodes as `()` as well.
//!
//! Callers that know the declared shape restore it; object cells read `()`
//! as an empty struct during import coercion.

use thiserror::Error as ThisError;

use crate::models::{Fields, Value, format_float};

/// Nesting limit for decoded containers.
pub const MAX_DEPTH: usize = 32;

/// A violation of the property-text grammar.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("{reason} at offset {offset}")]
pub struct PropertyTextError {
    /// Byte offset into the decoded text.
    pub offset: usize,
    /// What was wrong.
    pub reason: String,
}

/// Encodes a value for a single CSV cell.
///
/// Null becomes the empty string and top-level scalars their plain text;
/// only containers use the parenthesized notation.
#[must_use]
pub fn encode(value: &Value) -> String {
    match value {
        Value::Array(_) | Value::Struct(_) => {
            let mut out = String::new();
            encode_element(value, &mut out);
            out
        },
        scalar => scalar.scalar_text().unwrap_or_default(),
    }
}

fn encode_element(value: &Value, out: &mut String) {
    match value {
        Value::Null => {},
        Value::Str(s) => push_quoted(s, out),
        Value::Enum(member) => push_quoted(member.token(), out),
        Value::Int(i) => out.push_str(&i.to_string()),
        // Non-finite floats have no literal; they degrade to an empty element.
        Value::Float(f) if f.is_finite() => out.push_str(&format_float(*f)),
        Value::Float(_) => {},
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Array(items) => {
            out.push('(');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                encode_element(item, out);
            }
            out.push(')');
        },
        Value::Struct(fields) => {
            out.push('(');
            for (i, (key, item)) in fields.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                if is_bare_key(key) {
                    out.push_str(key);
                } else {
                    push_quoted(key, out);
                }
                out.push('=');
                encode_element(item, out);
            }
            out.push(')');
        },
    }
}

fn push_quoted(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
}

fn is_bare_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Decodes a parenthesized container.
///
/// # Errors
///
/// Returns [`PropertyTextError`] for anything outside the grammar,
/// including trailing input after the closing parenthesis.
pub fn decode(text: &str) -> Result<Value, PropertyTextError> {
    let mut parser = Parser { input: text, pos: 0 };
    parser.skip_whitespace();
    if parser.peek() != Some('(') {
        return Err(parser.error("expected '('"));
    }
    let value = parser.container(0)?;
    parser.skip_whitespace();
    if parser.pos < text.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(value)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

enum Item {
    Keyed(String, Value),
    Plain(Value),
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn error(&self, reason: &str) -> PropertyTextError {
        PropertyTextError {
            offset: self.pos,
            reason: reason.to_string(),
        }
    }

    fn container(&mut self, depth: usize) -> Result<Value, PropertyTextError> {
        if depth >= MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.bump();
        self.skip_whitespace();
        if self.peek() == Some(')') {
            self.bump();
            return Ok(Value::Array(Vec::new()));
        }

        let mut items = Vec::new();
        loop {
            items.push(self.item(depth)?);
            self.skip_whitespace();
            match self.bump() {
                Some(',') => {},
                Some(')') => break,
                Some(_) => return Err(self.error("expected ',' or ')'")),
                None => return Err(self.error("unclosed '('")),
            }
        }
        self.assemble(items)
    }

    fn assemble(&self, items: Vec<Item>) -> Result<Value, PropertyTextError> {
        if matches!(items.first(), Some(Item::Keyed(..))) {
            let mut fields = Fields::with_capacity(items.len());
            for item in items {
                let Item::Keyed(key, value) = item else {
                    return Err(self.error("struct mixes keyed and plain items"));
                };
                if fields.insert(key, value).is_some() {
                    return Err(self.error("duplicate struct key"));
                }
            }
            return Ok(Value::Struct(fields));
        }

        items
            .into_iter()
            .map(|item| match item {
                Item::Plain(value) => Ok(value),
                Item::Keyed(..) => Err(self.error("array mixes plain and keyed items")),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }

    fn item(&mut self, depth: usize) -> Result<Item, PropertyTextError> {
        self.skip_whitespace();
        match self.peek() {
            Some('(') => Ok(Item::Plain(self.container(depth + 1)?)),
            Some('"') => {
                let text = self.quoted()?;
                self.keyed_or(text, depth, Value::Str)
            },
            Some(',' | ')') | None => Ok(Item::Plain(Value::Null)),
            Some(_) => {
                let start = self.pos;
                let token = self.bare();
                if token.is_empty() {
                    return Err(PropertyTextError {
                        offset: start,
                        reason: "unexpected character".to_string(),
                    });
                }
                self.keyed_or(token.clone(), depth, |_| Value::Null)
                    .and_then(|item| match item {
                        Item::Plain(_) => scalar(&token).map(Item::Plain).ok_or_else(|| {
                            PropertyTextError {
                                offset: start,
                                reason: format!("bare token '{token}' is not a number or boolean"),
                            }
                        }),
                        keyed => Ok(keyed),
                    })
            },
        }
    }

    /// After a quoted string or bare token, checks for `=` to decide whether
    /// it was a key. `plain` builds the value for the non-key case.
    fn keyed_or(
        &mut self,
        text: String,
        depth: usize,
        plain: impl FnOnce(String) -> Value,
    ) -> Result<Item, PropertyTextError> {
        self.skip_whitespace();
        if self.peek() != Some('=') {
            return Ok(Item::Plain(plain(text)));
        }
        if text.is_empty() {
            return Err(self.error("empty struct key"));
        }
        self.bump();
        self.skip_whitespace();
        let value = match self.peek() {
            Some('(') => self.container(depth + 1)?,
            Some('"') => Value::Str(self.quoted()?),
            Some(',' | ')') | None => Value::Null,
            Some(_) => {
                let start = self.pos;
                let token = self.bare();
                scalar(&token).ok_or_else(|| PropertyTextError {
                    offset: start,
                    reason: format!("bare token '{token}' is not a number or boolean"),
                })?
            },
        };
        Ok(Item::Keyed(text, value))
    }

    fn quoted(&mut self) -> Result<String, PropertyTextError> {
        self.bump();
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(text),
                Some('\\') => match self.bump() {
                    Some(c @ ('"' | '\\')) => text.push(c),
                    Some(_) => return Err(self.error("invalid escape")),
                    None => return Err(self.error("unterminated string")),
                },
                Some(c) => text.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn bare(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| !matches!(c, ',' | ')' | '(' | '"' | '=') && !c.is_whitespace())
        {
            self.bump();
        }
        self.input[start..self.pos].to_string()
    }
}

fn scalar(token: &str) -> Option<Value> {
    match token {
        "true" => return Some(Value::Bool(true)),
        "false" => return Some(Value::Bool(false)),
        _ => {},
    }
    if !token
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return None;
    }
    if let Ok(i) = token.parse::<i64>() {
        return Some(Value::Int(i));
    }
    token
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Value::Float)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EnumKind;

    fn fields(pairs: &[(&str, Value)]) -> Value {
        Value::Struct(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_encode_string_array() {
        let value = Value::from(vec!["Character", "Item"]);
        assert_eq!(encode(&value), r#"("Character","Item")"#);
    }

    #[test]
    fn test_encode_array_of_structs() {
        let value = Value::Array(vec![
            fields(&[("stat_id", "01HP".into()), ("value", Value::Int(100))]),
            fields(&[("stat_id", "01ATK".into()), ("value", Value::Int(10))]),
        ]);
        assert_eq!(
            encode(&value),
            r#"((stat_id="01HP",value=100),(stat_id="01ATK",value=10))"#
        );
    }

    #[test]
    fn test_encode_scalars_and_null() {
        assert_eq!(encode(&Value::Null), "");
        assert_eq!(encode(&Value::from("plain, text")), "plain, text");
        assert_eq!(encode(&Value::Float(2.0)), "2.0");
        let member = EnumKind::ArcType.member("Main").unwrap();
        assert_eq!(encode(&Value::Enum(member)), "Main");
        assert_eq!(encode(&Value::Array(vec![Value::Enum(member)])), r#"("Main")"#);
    }

    #[test]
    fn test_encode_escapes_and_mixed_scalars() {
        let value = Value::Array(vec![
            Value::from(r#"say "hi" \ bye"#),
            Value::Int(-3),
            Value::Float(0.5),
            Value::Bool(false),
            Value::Null,
        ]);
        let text = encode(&value);
        assert_eq!(text, r#"("say \"hi\" \\ bye",-3,0.5,false,)"#);
        assert_eq!(decode(&text).unwrap(), value);
    }

    #[test]
    fn test_decode_nested_round_trip() {
        let value = fields(&[
            ("name", "Tree".into()),
            ("tiers", Value::Array(vec![
                Value::from(vec![1_i64, 2]),
                Value::Array(vec![]),
            ])),
            ("odd key", Value::Bool(true)),
            ("meta", fields(&[("x", Value::Float(1e21))])),
        ]);
        assert_eq!(decode(&encode(&value)).unwrap(), value);
    }

    #[test]
    fn test_decode_tolerates_whitespace() {
        let decoded = decode(r#" ( a = 1 , b = "x" ) "#).unwrap();
        assert_eq!(decoded, fields(&[("a", Value::Int(1)), ("b", "x".into())]));
    }

    #[test]
    fn test_decode_empty_container() {
        assert_eq!(decode("()").unwrap(), Value::Array(vec![]));
    }

    #[test]
    fn test_shapes_without_a_spelling() {
        assert_eq!(encode(&Value::Struct(Fields::new())), "()");
        assert_eq!(encode(&Value::Array(vec![Value::Null])), "()");

        let nested = fields(&[("meta", Value::Struct(Fields::new()))]);
        assert_eq!(encode(&nested), "(meta=())");
        assert_eq!(
            decode("(meta=())").unwrap(),
            fields(&[("meta", Value::Array(vec![]))])
        );
    }

    #[test]
    fn test_decode_rejects_malformed() {
        for bad in [
            "",
            "abc",
            "(",
            r#"("a""#,
            r#"("a" "b")"#,
            "(a=1,2)",
            "(1,a=2)",
            "(hello)",
            "(a=1,a=2)",
            "(1) trailing",
            r#"("\n")"#,
            "(nan)",
            "(=1)",
        ] {
            assert!(decode(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_decode_depth_limit() {
        let deep = format!("{}{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert!(decode(&deep).is_err());
        let ok = format!("{}{}", "(".repeat(4), ")".repeat(4));
        assert!(decode(&ok).is_ok());
    }
}
