//! The dynamically-typed object tree produced by a decode and consumed by an
//! encode (spec §3, §4.5).

use std::fmt;

/// One decoded (or synthesized) record instance.
#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Record {
    pub type_name: String,
    /// Field values in declaration order, paired with the field's
    /// `snake_case` name.
    pub fields: Vec<(String, FieldValue)>,
    /// Inclusive start of the byte range this record occupied in the
    /// source stream, or `-1` when synthesized (never decoded from bytes).
    pub location_start: i64,
    /// Exclusive end of that byte range.
    pub location_end: i64,
}

impl Record {
    pub fn synthesized(type_name: impl Into<String>) -> Self {
        Record {
            type_name: type_name.into(),
            fields: Vec::new(),
            location_start: -1,
            location_end: -1,
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// `location_end - location_start`, used by the round-trip size law.
    pub fn byte_len(&self) -> i64 {
        self.location_end - self.location_start
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{ ", self.type_name)?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}: {value:?}")?;
        }
        write!(f, " }}")
    }
}

/// A single field's value. Nested records render, in [`Debug`], by type
/// name only — printing their own fields is the containing record's
/// responsibility, not a recursive dump.
#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldValue {
    Int(i64),
    UInt(u64),
    Bool(bool),
    Float(f64),
    Str(String),
    /// Raw buffer for a `uint8[n]` field — never boxed element-by-element.
    Bytes(Vec<u8>),
    Record(Box<Record>),
    Array(Vec<FieldValue>),
    /// Bound to a conditional field whose `if_clause` was false and which
    /// had no `default`.
    Null,
}

impl FieldValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(n) => Some(*n),
            FieldValue::UInt(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }

    /// The value as a `u64`, for unsigned-typed fields (`uint32`, `uint64`,
    /// `varint`) whose decoded magnitude may exceed `i64::MAX`. Unlike
    /// [`FieldValue::as_int`], a non-negative [`FieldValue::Int`] also
    /// widens here so hand-built values (not just decoded ones) still encode.
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            FieldValue::UInt(n) => Some(*n),
            FieldValue::Int(n) => u64::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            FieldValue::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(n) => write!(f, "{n}"),
            FieldValue::UInt(n) => write!(f, "{n}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Float(x) => write!(f, "{x}"),
            FieldValue::Str(s) => write!(f, "{s:?}"),
            FieldValue::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
            FieldValue::Record(record) => write!(f, "{}(..)", record.type_name),
            FieldValue::Array(items) if items.is_empty() => write!(f, "[]"),
            FieldValue::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item:?}")?;
                }
                write!(f, "]")
            }
            FieldValue::Null => write!(f, "null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesized_record_has_sentinel_location() {
        let record = Record::synthesized("Foo");
        assert_eq!(record.location_start, -1);
        assert_eq!(record.location_end, -1);
        assert_eq!(record.byte_len(), 0);
    }

    #[test]
    fn debug_prints_nested_record_by_type_name_only() {
        let inner = Record {
            type_name: "Inner".to_string(),
            fields: vec![("x".to_string(), FieldValue::Int(1))],
            location_start: 0,
            location_end: 4,
        };
        let outer = Record {
            type_name: "Outer".to_string(),
            fields: vec![("inner".to_string(), FieldValue::Record(Box::new(inner)))],
            location_start: 0,
            location_end: 4,
        };
        assert_eq!(format!("{outer:?}"), "Outer { inner: Inner(..) }");
    }

    #[test]
    fn debug_distinguishes_empty_array() {
        assert_eq!(format!("{:?}", FieldValue::Array(vec![])), "[]");
        assert_eq!(
            format!("{:?}", FieldValue::Array(vec![FieldValue::Int(1)])),
            "[1]"
        );
    }

    #[test]
    fn field_lookup_by_name() {
        let record = Record {
            type_name: "Foo".to_string(),
            fields: vec![("a".to_string(), FieldValue::Int(5))],
            location_start: 0,
            location_end: 1,
        };
        assert_eq!(record.get("a"), Some(&FieldValue::Int(5)));
        assert_eq!(record.get("missing"), None);
    }
}
