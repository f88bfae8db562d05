//! Schema-driven coercion of imported cells.

use super::enum_token::{EnumResolution, from_token};
use super::property_text;
use crate::models::{EnumKind, FieldSpec, FieldType, Fields, Value};
use crate::{Error, Result};

/// Literals read as null in non-string cells.
const NULL_LITERALS: [&str; 3] = ["null", "none", "__null__"];

/// Location of a cell, for error reporting.
#[derive(Debug, Clone, Copy)]
pub struct CellRef<'a> {
    /// 1-based data row.
    pub row: usize,
    /// Column name.
    pub field: &'a str,
}

impl CellRef<'_> {
    fn malformed(&self, reason: impl Into<String>) -> Error {
        Error::MalformedInput {
            row: self.row,
            field: self.field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Coerces one raw cell to its declared type.
///
/// Empty cells are null at every type. Enum-valued string fields resolve
/// through [`from_token`] and fail on unresolved tokens.
///
/// # Errors
///
/// Returns [`Error::MalformedInput`] when the text does not parse as the
/// declared type and [`Error::UnresolvedEnumToken`] for unknown enum tokens.
pub fn coerce_cell(
    cell: CellRef<'_>,
    spec: &FieldSpec,
    enum_kind: Option<EnumKind>,
    raw: &str,
) -> Result<Value> {
    let text = raw.trim();
    if text.is_empty() {
        return Ok(Value::Null);
    }

    match spec.field_type {
        FieldType::String => match enum_kind {
            Some(kind) => match from_token(kind, text) {
                EnumResolution::Resolved(member) => Ok(Value::Enum(member)),
                EnumResolution::Unresolved(token) => Err(Error::UnresolvedEnumToken {
                    row: cell.row,
                    field: cell.field.to_string(),
                    token,
                }),
            },
            None => Ok(Value::Str(text.to_string())),
        },
        _ if is_null_literal(text) => Ok(Value::Null),
        FieldType::Integer => text
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| cell.malformed(format!("expected an integer, got '{text}'"))),
        FieldType::Number => text
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Value::Float)
            .ok_or_else(|| cell.malformed(format!("expected a number, got '{text}'"))),
        FieldType::Boolean => parse_bool(text)
            .map(Value::Bool)
            .ok_or_else(|| cell.malformed(format!("expected true/false/1/0, got '{text}'"))),
        FieldType::Array => coerce_array(cell, text),
        FieldType::Object => coerce_object(cell, text),
    }
}

fn is_null_literal(text: &str) -> bool {
    NULL_LITERALS
        .iter()
        .any(|literal| literal.eq_ignore_ascii_case(text))
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn coerce_array(cell: CellRef<'_>, text: &str) -> Result<Value> {
    if text.starts_with('(') {
        return match decode(cell, text)? {
            array @ Value::Array(_) => Ok(array),
            _ => Err(cell.malformed("expected an array, got a struct")),
        };
    }
    if text.starts_with('[') {
        return match parse_json(cell, text)? {
            array @ Value::Array(_) => Ok(array),
            _ => Err(cell.malformed("expected a JSON array")),
        };
    }
    Ok(Value::Array(
        text.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(Value::from)
            .collect(),
    ))
}

fn coerce_object(cell: CellRef<'_>, text: &str) -> Result<Value> {
    if text.starts_with('(') {
        return match decode(cell, text)? {
            object @ Value::Struct(_) => Ok(object),
            Value::Array(items) if items.is_empty() => Ok(Value::Struct(Fields::new())),
            _ => Err(cell.malformed("expected a struct, got an array")),
        };
    }
    if text.starts_with('{') {
        return match parse_json(cell, text)? {
            object @ Value::Struct(_) => Ok(object),
            _ => Err(cell.malformed("expected a JSON object")),
        };
    }
    Err(cell.malformed(format!("expected a struct, got '{text}'")))
}

fn decode(cell: CellRef<'_>, text: &str) -> Result<Value> {
    property_text::decode(text).map_err(|e| cell.malformed(format!("property text: {e}")))
}

fn parse_json(cell: CellRef<'_>, text: &str) -> Result<Value> {
    serde_json::from_str::<serde_json::Value>(text)
        .map(Value::from_json)
        .map_err(|e| cell.malformed(format!("invalid JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const CELL: CellRef<'static> = CellRef { row: 2, field: "f" };

    fn spec(field_type: FieldType) -> FieldSpec {
        FieldSpec {
            field_type,
            required: false,
        }
    }

    fn coerce(field_type: FieldType, raw: &str) -> Result<Value> {
        coerce_cell(CELL, &spec(field_type), None, raw)
    }

    #[test_case(FieldType::Integer, "42" => Value::Int(42); "integer")]
    #[test_case(FieldType::Integer, " -7 " => Value::Int(-7); "integer trimmed")]
    #[test_case(FieldType::Number, "1.5" => Value::Float(1.5); "number")]
    #[test_case(FieldType::Number, "10" => Value::Float(10.0); "whole number")]
    #[test_case(FieldType::Boolean, "TRUE" => Value::Bool(true); "bool upper")]
    #[test_case(FieldType::Boolean, "0" => Value::Bool(false); "bool digit")]
    #[test_case(FieldType::String, "None" => Value::from("None"); "string keeps none")]
    #[test_case(FieldType::Integer, "null" => Value::Null; "null literal")]
    #[test_case(FieldType::Object, "__NULL__" => Value::Null; "null marker")]
    #[test_case(FieldType::Array, "" => Value::Null; "empty")]
    #[test_case(FieldType::Array, "a, b,,c " => Value::from(vec!["a", "b", "c"]); "comma split")]
    #[test_case(FieldType::Array, r#"["a", 1]"# => Value::Array(vec![Value::from("a"), Value::Int(1)]); "json array")]
    #[test_case(FieldType::Array, r#"("a",1)"# => Value::Array(vec![Value::from("a"), Value::Int(1)]); "property text array")]
    #[test_case(FieldType::Object, "()" => Value::Struct(Fields::new()); "empty struct")]
    fn test_coerce_ok(field_type: FieldType, raw: &str) -> Value {
        coerce(field_type, raw).unwrap()
    }

    #[test_case(FieldType::Integer, "1.5"; "fractional integer")]
    #[test_case(FieldType::Number, "fast"; "word number")]
    #[test_case(FieldType::Number, "inf"; "infinite number")]
    #[test_case(FieldType::Boolean, "yes"; "yes boolean")]
    #[test_case(FieldType::Array, "(a=1)"; "struct in array")]
    #[test_case(FieldType::Array, "(\"a\""; "broken property text")]
    #[test_case(FieldType::Array, "[1,"; "broken json")]
    #[test_case(FieldType::Object, "(1,2)"; "array in object")]
    #[test_case(FieldType::Object, "plain"; "plain object")]
    fn test_coerce_malformed(field_type: FieldType, raw: &str) {
        match coerce(field_type, raw) {
            Err(Error::MalformedInput { row, field, .. }) => {
                assert_eq!(row, 2);
                assert_eq!(field, "f");
            },
            other => panic!("expected MalformedInput, got {other:?}"),
        }
    }

    #[test]
    fn test_object_empty_parens_is_empty_struct() {
        assert_eq!(coerce(FieldType::Object, "()").unwrap(), Value::Struct(Fields::new()));
        assert_eq!(coerce(FieldType::Array, "()").unwrap(), Value::Array(vec![]));
    }

    #[test]
    fn test_object_property_text() {
        let value = coerce(FieldType::Object, r#"(hp=100,label="Base")"#).unwrap();
        let Value::Struct(fields) = value else {
            panic!("expected struct");
        };
        assert_eq!(fields["hp"], Value::Int(100));
        assert_eq!(fields["label"], Value::from("Base"));
    }

    #[test]
    fn test_enum_resolution() {
        let value = coerce_cell(CELL, &spec(FieldType::String), Some(EnumKind::ArcType), "Main")
            .unwrap();
        assert_eq!(value, Value::Enum(EnumKind::ArcType.member("Main").unwrap()));

        let err = coerce_cell(CELL, &spec(FieldType::String), Some(EnumKind::ArcType), "Prologue")
            .unwrap_err();
        assert!(matches!(
            err,
            Error::UnresolvedEnumToken { row: 2, ref token, .. } if token == "Prologue"
        ));
    }
}
