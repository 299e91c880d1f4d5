//! The schema intermediate representation (spec §3): what [`crate::parser`]
//! produces and [`crate::registry`] consumes, independent of any particular
//! schema source syntax.

use crate::expr::Expr;

/// A parsed schema: an ordered collection of record definitions, in
/// declaration order (later records may reference earlier ones and vice
/// versa — ordering matters only for diagnostics, never for resolution).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    pub records: Vec<RecordDef>,
}

/// One `Name [<T1, T2>] { ... }` block.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDef {
    pub name: String,
    /// Template parameter names, e.g. `["T"]` for `LinkedList<T>`. Empty for
    /// an ordinary (non-generic) record.
    pub template_params: Vec<String>,
    pub fields: Vec<FieldDef>,
    /// Free-form comment immediately preceding the record header, preserved
    /// for diagnostic round-tripping.
    pub comment: Option<String>,
}

impl RecordDef {
    pub fn is_template(&self) -> bool {
        !self.template_params.is_empty()
    }
}

/// A reference to a primitive or record type, optionally parameterized —
/// `PlanetData`, `uint8`, or `LinkedList<PlanetData>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub name: String,
    pub type_args: Vec<TypeRef>,
}

impl TypeRef {
    pub fn simple(name: impl Into<String>) -> Self {
        TypeRef {
            name: name.into(),
            type_args: Vec::new(),
        }
    }

    /// The name a template instantiation of this type would be registered
    /// under, e.g. `LinkedList<PlanetData>` -> `LinkedList_PlanetData`.
    pub fn instantiated_name(&self) -> String {
        if self.type_args.is_empty() {
            self.name.clone()
        } else {
            let args: Vec<String> = self.type_args.iter().map(TypeRef::instantiated_name).collect();
            format!("{}_{}", self.name, args.join("_"))
        }
    }
}

/// One field declaration within a record.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// Identifier exactly as written in the schema text.
    pub name: String,
    pub ty: TypeRef,
    pub injected: bool,
    pub is_array: bool,
    pub array_size: Option<Expr>,
    pub if_clause: Option<Expr>,
    pub default: Option<DefaultValue>,
    pub props: Vec<Expr>,
    pub assertion: Option<Assertion>,
    pub comment: Option<String>,
}

impl FieldDef {
    /// The `snake_case` name other fields use to refer to this one from
    /// expression text (spec §4.2: "normalized... on the output side").
    pub fn snake_name(&self) -> String {
        crate::ident::to_snake_case(&self.name)
    }
}

/// A literal value appearing in `default`, `= literal`, or an assertion.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
}

/// The value bound to a field whose `if_clause` evaluated false.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Literal(Literal),
    /// References another field in the same record by its snake_case name.
    FieldRef(String),
}

/// A field's compile-time assertion target.
#[derive(Debug, Clone, PartialEq)]
pub enum Assertion {
    Literal(Literal),
    FieldRef(String),
    /// For an injected field, the assertion literal is instead an integer
    /// index into the caller's `props` tuple (spec §3).
    PropsIndex(usize),
}
