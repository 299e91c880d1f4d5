//! The schema grammar parser (spec §4.2): turns schema text into the
//! [`crate::ir`] the registry builds from.
//!
//! The grammar is line-oriented: one record header or closing brace per
//! line, one field declaration per line, `//` comments anywhere to
//! end-of-line. A field declaration is internally whitespace-insensitive —
//! `int32   x   [ 5 ]` and `int32 x[5]` parse identically.

use crate::errors::SchemaError;
use crate::expr::{self, Expr};
use crate::ident::to_snake_case;
use crate::ir::{Assertion, DefaultValue, FieldDef, Literal, RecordDef, Schema, TypeRef};

/// Parses a full schema text into its intermediate representation.
pub fn parse_schema(text: &str) -> Result<Schema, SchemaError> {
    let mut schema = Schema::default();
    let mut current: Option<RecordDef> = None;
    let mut pending_comment: Option<String> = None;

    for (line_no, raw_line) in text.lines().enumerate() {
        let line_no = line_no + 1;
        let (code, trailing_comment) = split_comment(raw_line);
        let code_trimmed = code.trim();

        if code_trimmed.is_empty() {
            let line_trimmed = raw_line.trim();
            if let Some(stripped) = line_trimmed.strip_prefix("//") {
                let text = stripped.trim().to_string();
                pending_comment = Some(match pending_comment.take() {
                    Some(existing) => format!("{existing}\n{text}"),
                    None => text,
                });
            }
            continue;
        }

        match &mut current {
            None => {
                let record = parse_record_header(code_trimmed, line_no, pending_comment.take())?;
                current = Some(record);
            }
            Some(record) => {
                if code_trimmed == "}" {
                    schema.records.push(current.take().unwrap());
                } else {
                    let comment = trailing_comment.or_else(|| pending_comment.take());
                    let field = parse_field(code_trimmed, line_no, comment)?;
                    record.fields.push(field);
                }
            }
        }
    }

    if current.is_some() {
        return Err(SchemaError::SchemaSyntax {
            line: text.lines().count(),
            message: "unterminated record: missing closing '}'".to_string(),
        });
    }

    Ok(schema)
}

/// Splits a line into `(code, trailing_comment)` at the first `//` that
/// falls outside a quoted string.
fn split_comment(line: &str) -> (&str, Option<String>) {
    let bytes = line.as_bytes();
    let mut in_string = false;
    let mut i = 0;
    while i + 1 < bytes.len() {
        match bytes[i] {
            b'"' => in_string = !in_string,
            b'/' if !in_string && bytes[i + 1] == b'/' => {
                return (&line[..i], Some(line[i + 2..].trim().to_string()));
            }
            _ => {}
        }
        i += 1;
    }
    (line, None)
}

fn parse_record_header(
    code: &str,
    line: usize,
    comment: Option<String>,
) -> Result<RecordDef, SchemaError> {
    let code = code
        .strip_suffix('{')
        .ok_or_else(|| SchemaError::SchemaSyntax {
            line,
            message: format!("expected record header ending in '{{': {code:?}"),
        })?
        .trim();

    let chars: Vec<char> = code.chars().collect();
    let mut pos = 0;
    let name = parse_identifier(&chars, &mut pos).ok_or_else(|| SchemaError::SchemaSyntax {
        line,
        message: format!("expected record name in header: {code:?}"),
    })?;
    skip_ws(&chars, &mut pos);

    let mut template_params = Vec::new();
    if chars.get(pos) == Some(&'<') {
        pos += 1;
        loop {
            skip_ws(&chars, &mut pos);
            let param = parse_identifier(&chars, &mut pos).ok_or_else(|| SchemaError::SchemaSyntax {
                line,
                message: format!("expected template parameter name: {code:?}"),
            })?;
            template_params.push(param);
            skip_ws(&chars, &mut pos);
            match chars.get(pos) {
                Some(',') => {
                    pos += 1;
                }
                Some('>') => {
                    pos += 1;
                    break;
                }
                _ => {
                    return Err(SchemaError::SchemaSyntax {
                        line,
                        message: format!("malformed template parameter list: {code:?}"),
                    })
                }
            }
        }
    }

    skip_ws(&chars, &mut pos);
    if pos != chars.len() {
        return Err(SchemaError::SchemaSyntax {
            line,
            message: format!("unexpected trailing content in record header: {code:?}"),
        });
    }

    Ok(RecordDef {
        name,
        template_params,
        fields: Vec::new(),
        comment,
    })
}

fn parse_field(code: &str, line: usize, comment: Option<String>) -> Result<FieldDef, SchemaError> {
    let chars: Vec<char> = code.chars().collect();
    let mut pos = 0;

    skip_ws(&chars, &mut pos);
    let mut injected = false;
    if try_consume_keyword(&chars, &mut pos, "injected") {
        injected = true;
        skip_ws(&chars, &mut pos);
    }

    let ty = parse_type_ref(&chars, &mut pos, line)?;
    skip_ws(&chars, &mut pos);
    let name = parse_identifier(&chars, &mut pos).ok_or_else(|| SchemaError::SchemaSyntax {
        line,
        message: format!("expected field name: {code:?}"),
    })?;

    let mut is_array = false;
    let mut array_size = None;
    let mut if_clause = None;
    let mut props = Vec::new();
    let mut default = None;
    let mut assertion = None;

    loop {
        skip_ws(&chars, &mut pos);
        if pos >= chars.len() {
            break;
        }

        if chars[pos] == '[' {
            if is_array {
                return Err(duplicate_clause(line, "array size", code));
            }
            pos += 1;
            let inner = take_until(&chars, &mut pos, ']', line, code)?;
            is_array = true;
            array_size = Some(parse_clause_expr(&inner, line, code)?);
        } else if try_consume_keyword(&chars, &mut pos, "if") {
            if if_clause.is_some() {
                return Err(duplicate_clause(line, "if", code));
            }
            skip_ws(&chars, &mut pos);
            let inner = take_balanced_parens(&chars, &mut pos, line, code)?;
            if_clause = Some(parse_clause_expr(&inner, line, code)?);
        } else if try_consume_keyword(&chars, &mut pos, "props") {
            if !props.is_empty() {
                return Err(duplicate_clause(line, "props", code));
            }
            skip_ws(&chars, &mut pos);
            let inner = take_balanced_parens(&chars, &mut pos, line, code)?;
            props = split_top_level_commas(&inner)
                .into_iter()
                .map(|item| parse_clause_expr(item.trim(), line, code))
                .collect::<Result<Vec<_>, _>>()?;
        } else if try_consume_keyword(&chars, &mut pos, "default") {
            if default.is_some() {
                return Err(duplicate_clause(line, "default", code));
            }
            skip_ws(&chars, &mut pos);
            let inner = take_balanced_parens(&chars, &mut pos, line, code)?;
            default = Some(parse_value_or_token(inner.trim()).into_default());
        } else if chars[pos] == '=' {
            if assertion.is_some() {
                return Err(duplicate_clause(line, "assertion", code));
            }
            pos += 1;
            skip_ws(&chars, &mut pos);
            let rest: String = chars[pos..].iter().collect();
            pos = chars.len();
            let parsed = parse_value_or_token(rest.trim());
            assertion = Some(if injected {
                match parsed {
                    ValueOrToken::Literal(Literal::Int(n)) => Assertion::PropsIndex(n as usize),
                    _ => {
                        return Err(SchemaError::SchemaSyntax {
                            line,
                            message: format!(
                                "injected field assertion must be an integer props index: {code:?}"
                            ),
                        })
                    }
                }
            } else {
                parsed.into_assertion()
            });
        } else {
            return Err(SchemaError::SchemaSyntax {
                line,
                message: format!("unexpected content in field declaration: {code:?}"),
            });
        }
    }

    Ok(FieldDef {
        name,
        ty,
        injected,
        is_array,
        array_size,
        if_clause,
        default,
        props,
        assertion,
        comment,
    })
}

fn duplicate_clause(line: usize, clause: &str, code: &str) -> SchemaError {
    SchemaError::SchemaSyntax {
        line,
        message: format!("duplicate {clause} clause in field declaration: {code:?}"),
    }
}

fn parse_clause_expr(text: &str, line: usize, code: &str) -> Result<Expr, SchemaError> {
    expr::parse(text).map_err(|e| SchemaError::SchemaSyntax {
        line,
        message: format!("invalid expression {text:?} in {code:?}: {e}"),
    })
}

enum ValueOrToken {
    Literal(Literal),
    Token(String),
}

impl ValueOrToken {
    fn into_assertion(self) -> Assertion {
        match self {
            ValueOrToken::Literal(l) => Assertion::Literal(l),
            ValueOrToken::Token(t) => Assertion::FieldRef(to_snake_case(&t)),
        }
    }

    fn into_default(self) -> DefaultValue {
        match self {
            ValueOrToken::Literal(l) => DefaultValue::Literal(l),
            ValueOrToken::Token(t) => DefaultValue::FieldRef(to_snake_case(&t)),
        }
    }
}

fn parse_value_or_token(text: &str) -> ValueOrToken {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        return ValueOrToken::Literal(Literal::Str(stripped.to_string()));
    }

    let looks_numeric = text
        .strip_prefix('-')
        .unwrap_or(text)
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit());

    if looks_numeric {
        if let Some(lit) = parse_numeric_literal(text) {
            return ValueOrToken::Literal(lit);
        }
    }

    ValueOrToken::Token(text.to_string())
}

fn parse_numeric_literal(text: &str) -> Option<Literal> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        let value = i64::from_str_radix(hex, 16).ok()?;
        return Some(Literal::Int(if negative { -value } else { value }));
    }

    if rest.contains('.') {
        let value: f64 = rest.parse().ok()?;
        return Some(Literal::Float(if negative { -value } else { value }));
    }

    let value: i64 = rest.parse().ok()?;
    Some(Literal::Int(if negative { -value } else { value }))
}

fn parse_type_ref(chars: &[char], pos: &mut usize, line: usize) -> Result<TypeRef, SchemaError> {
    let name = parse_identifier(chars, pos).ok_or_else(|| SchemaError::SchemaSyntax {
        line,
        message: "expected type name".to_string(),
    })?;

    skip_ws(chars, pos);
    let mut type_args = Vec::new();
    if chars.get(*pos) == Some(&'<') {
        *pos += 1;
        loop {
            skip_ws(chars, pos);
            type_args.push(parse_type_ref(chars, pos, line)?);
            skip_ws(chars, pos);
            match chars.get(*pos) {
                Some(',') => {
                    *pos += 1;
                }
                Some('>') => {
                    *pos += 1;
                    break;
                }
                _ => {
                    return Err(SchemaError::SchemaSyntax {
                        line,
                        message: "malformed type argument list".to_string(),
                    })
                }
            }
        }
    }

    Ok(TypeRef { name, type_args })
}

fn parse_identifier(chars: &[char], pos: &mut usize) -> Option<String> {
    let start = *pos;
    if chars.get(*pos).is_some_and(|c| c.is_alphabetic() || *c == '_') {
        *pos += 1;
        while chars.get(*pos).is_some_and(|c| c.is_alphanumeric() || *c == '_') {
            *pos += 1;
        }
        Some(chars[start..*pos].iter().collect())
    } else {
        None
    }
}

fn skip_ws(chars: &[char], pos: &mut usize) {
    while chars.get(*pos).is_some_and(|c| c.is_whitespace()) {
        *pos += 1;
    }
}

/// Consumes `keyword` at `pos` only if it is a whole word there (not a
/// prefix of a longer identifier).
fn try_consume_keyword(chars: &[char], pos: &mut usize, keyword: &str) -> bool {
    let kw_chars: Vec<char> = keyword.chars().collect();
    if chars.len() < *pos + kw_chars.len() {
        return false;
    }
    if chars[*pos..*pos + kw_chars.len()] != kw_chars[..] {
        return false;
    }
    let next_is_ident_continuation = chars
        .get(*pos + kw_chars.len())
        .is_some_and(|c| c.is_alphanumeric() || *c == '_');
    if next_is_ident_continuation {
        return false;
    }
    *pos += kw_chars.len();
    true
}

fn take_until(
    chars: &[char],
    pos: &mut usize,
    closing: char,
    line: usize,
    code: &str,
) -> Result<String, SchemaError> {
    let start = *pos;
    while chars.get(*pos).is_some_and(|c| *c != closing) {
        *pos += 1;
    }
    if chars.get(*pos) != Some(&closing) {
        return Err(SchemaError::SchemaSyntax {
            line,
            message: format!("missing closing {closing:?} in field declaration: {code:?}"),
        });
    }
    let inner: String = chars[start..*pos].iter().collect();
    *pos += 1;
    Ok(inner)
}

/// Consumes a parenthesized group starting at `pos` (which must point at
/// `(`), tracking nesting depth, and returns its interior text.
fn take_balanced_parens(
    chars: &[char],
    pos: &mut usize,
    line: usize,
    code: &str,
) -> Result<String, SchemaError> {
    if chars.get(*pos) != Some(&'(') {
        return Err(SchemaError::SchemaSyntax {
            line,
            message: format!("expected '(' in field declaration: {code:?}"),
        });
    }
    let start = *pos + 1;
    let mut depth = 0;
    loop {
        match chars.get(*pos) {
            Some('(') => depth += 1,
            Some(')') => {
                depth -= 1;
                if depth == 0 {
                    let inner: String = chars[start..*pos].iter().collect();
                    *pos += 1;
                    return Ok(inner);
                }
            }
            Some(_) => {}
            None => {
                return Err(SchemaError::SchemaSyntax {
                    line,
                    message: format!("unbalanced parentheses in field declaration: {code:?}"),
                })
            }
        }
        *pos += 1;
    }
}

/// Splits `props(a[i], b, c[i])`-style interiors on top-level commas,
/// respecting nested `[]`/`()`.
fn split_top_level_commas(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'(' | b'[' => depth += 1,
            b')' | b']' => depth -= 1,
            b',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::TypeRef;

    #[test]
    fn parses_simple_record() {
        let schema = parse_schema("Point {\n    int32 x\n    int32 y\n}\n").unwrap();
        assert_eq!(schema.records.len(), 1);
        let record = &schema.records[0];
        assert_eq!(record.name, "Point");
        assert_eq!(record.fields.len(), 2);
        assert_eq!(record.fields[0].name, "x");
        assert_eq!(record.fields[0].ty, TypeRef::simple("int32"));
    }

    #[test]
    fn parses_template_record() {
        let schema = parse_schema("LinkedList<T> {\n    T value\n    injected int32 length = 0\n}\n").unwrap();
        let record = &schema.records[0];
        assert_eq!(record.template_params, vec!["T".to_string()]);
        assert!(record.fields[1].injected);
        assert_eq!(record.fields[1].assertion, Some(Assertion::PropsIndex(0)));
    }

    #[test]
    fn parses_array_with_if_props_default() {
        let schema = parse_schema(
            "Parent {\n    int32 count\n    Child item[count] if (count != 0) props (i, count) default (0)\n}\n",
        )
        .unwrap();
        let field = &schema.records[0].fields[1];
        assert!(field.is_array);
        assert!(field.if_clause.is_some());
        assert_eq!(field.props.len(), 2);
        assert!(field.default.is_some());
    }

    #[test]
    fn parses_generic_type_argument_to_another_record() {
        let schema = parse_schema("Holder {\n    LinkedList<PlanetData> items\n}\n").unwrap();
        let field = &schema.records[0].fields[0];
        assert_eq!(field.ty.name, "LinkedList");
        assert_eq!(field.ty.type_args[0].name, "PlanetData");
        assert_eq!(field.ty.instantiated_name(), "LinkedList_PlanetData");
    }

    #[test]
    fn trailing_comment_is_captured() {
        let schema = parse_schema("Foo {\n    int32 x // the x coordinate\n}\n").unwrap();
        assert_eq!(
            schema.records[0].fields[0].comment.as_deref(),
            Some("the x coordinate")
        );
    }

    #[test]
    fn string_assertion_and_default() {
        let schema = parse_schema(
            "Foo {\n    string tag = \"ok\"\n    string label default (\"n/a\")\n}\n",
        )
        .unwrap();
        assert_eq!(
            schema.records[0].fields[0].assertion,
            Some(Assertion::Literal(Literal::Str("ok".to_string())))
        );
        assert_eq!(
            schema.records[0].fields[1].default,
            Some(DefaultValue::Literal(Literal::Str("n/a".to_string())))
        );
    }

    #[test]
    fn duplicate_clause_is_a_syntax_error() {
        let result = parse_schema("Foo {\n    int32 x if (a == null) if (b == null)\n}\n");
        assert!(result.is_err());
    }

    #[test]
    fn unterminated_record_is_a_syntax_error() {
        let result = parse_schema("Foo {\n    int32 x\n");
        assert!(result.is_err());
    }
}
