//! The type registry (spec §4.3): resolves every type reference in a parsed
//! [`crate::ir::Schema`] to either a primitive or a registered record,
//! instantiating template records on demand and memoizing the result.
//!
//! Building a registry is the only time generics are resolved; once built,
//! it is immutable and safe to share across concurrent decode/encode calls
//! against independent streams (spec §5).

use std::collections::HashMap;

use crate::codec;
use crate::errors::{CodecError, SchemaError};
use crate::ir::{RecordDef, Schema, TypeRef};
use crate::primitive::PrimitiveKind;
use crate::value::Record;

/// A fully resolved schema: every record name maps to a concrete (non-
/// template) [`RecordDef`], with all required template instantiations
/// already materialized.
pub struct TypeRegistry {
    records: HashMap<String, RecordDef>,
}

impl TypeRegistry {
    /// Builds a registry from parsed schema IR, instantiating every
    /// template reference reachable from a concrete record to a fixed
    /// point, then validates reference resolution and layout cycles.
    pub fn build(schema: Schema) -> Result<Self, SchemaError> {
        let mut templates: HashMap<String, RecordDef> = HashMap::new();
        let mut records: HashMap<String, RecordDef> = HashMap::new();

        for record in schema.records {
            let key = record.name.clone();
            let target = if record.is_template() {
                &mut templates
            } else {
                &mut records
            };
            if target.contains_key(&key) {
                return Err(SchemaError::DuplicateRecord { name: key });
            }
            target.insert(key, record);
        }

        let mut memo: HashMap<(String, Vec<TypeRef>), String> = HashMap::new();
        let mut worklist: Vec<String> = records.keys().cloned().collect();

        while let Some(name) = worklist.pop() {
            let field_types: Vec<TypeRef> = records[&name]
                .fields
                .iter()
                .map(|f| f.ty.clone())
                .collect();

            for ty in &field_types {
                collect_instantiations(ty, &templates, &mut records, &mut memo, &mut worklist)?;
            }
        }

        let registry = TypeRegistry { records };
        registry.validate_references(&templates)?;
        registry.check_cycles()?;
        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Option<&RecordDef> {
        self.records.get(name)
    }

    /// Decodes `type_name` from `data`, passing `props` to the root
    /// record's injected fields (usually empty for a true root).
    pub fn decode(
        &self,
        type_name: &str,
        data: &[u8],
        props: &[crate::expr::Value],
    ) -> Result<Record, CodecError> {
        codec::decode_root(self, type_name, data, props)
    }

    pub fn encode(&self, type_name: &str, value: &Record) -> Result<Vec<u8>, CodecError> {
        codec::encode_root(self, type_name, value)
    }

    pub fn size(&self, type_name: &str, value: &Record) -> Result<usize, CodecError> {
        codec::size_root(self, type_name, value)
    }

    fn validate_references(&self, templates: &HashMap<String, RecordDef>) -> Result<(), SchemaError> {
        for record in self.records.values() {
            for field in &record.fields {
                validate_type_ref(&field.ty, &self.records, templates, &record.name)?;
            }
        }
        Ok(())
    }

    fn check_cycles(&self) -> Result<(), SchemaError> {
        let mut state: HashMap<String, VisitState> = HashMap::new();
        for name in self.records.keys() {
            self.visit_for_cycle(name, &mut state)?;
        }
        Ok(())
    }

    fn visit_for_cycle(
        &self,
        name: &str,
        state: &mut HashMap<String, VisitState>,
    ) -> Result<(), SchemaError> {
        match state.get(name) {
            Some(VisitState::Done) => return Ok(()),
            Some(VisitState::InProgress) => {
                return Err(SchemaError::SchemaCycle {
                    name: name.to_string(),
                });
            }
            None => {}
        }

        state.insert(name.to_string(), VisitState::InProgress);
        if let Some(record) = self.records.get(name) {
            for field in &record.fields {
                if field.injected || field.if_clause.is_some() {
                    continue;
                }
                if PrimitiveKind::from_name(&field.ty.name).is_some() {
                    continue;
                }
                let target = field.ty.instantiated_name();
                self.visit_for_cycle(&target, state)?;
            }
        }
        state.insert(name.to_string(), VisitState::Done);
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    InProgress,
    Done,
}

fn validate_type_ref(
    ty: &TypeRef,
    records: &HashMap<String, RecordDef>,
    templates: &HashMap<String, RecordDef>,
    owner: &str,
) -> Result<(), SchemaError> {
    if PrimitiveKind::from_name(&ty.name).is_some() {
        return Ok(());
    }
    if ty.type_args.is_empty() {
        if records.contains_key(&ty.name) {
            return Ok(());
        }
        if templates.contains_key(&ty.name) {
            return Err(SchemaError::TemplateArity {
                name: ty.name.clone(),
                expected: templates[&ty.name].template_params.len(),
                got: 0,
            });
        }
        return Err(SchemaError::UnknownType {
            record: owner.to_string(),
            name: ty.name.clone(),
        });
    }

    let template = templates.get(&ty.name).ok_or_else(|| SchemaError::UnknownType {
        record: owner.to_string(),
        name: ty.name.clone(),
    })?;
    if template.template_params.len() != ty.type_args.len() {
        return Err(SchemaError::TemplateArity {
            name: ty.name.clone(),
            expected: template.template_params.len(),
            got: ty.type_args.len(),
        });
    }
    for arg in &ty.type_args {
        validate_type_ref(arg, records, templates, owner)?;
    }
    Ok(())
}

/// If `ty` names a template with concrete arguments, instantiates it (and
/// anything its arguments themselves require) into `records`, memoizing by
/// `(name, args)`, and queues the new record for its own instantiation scan.
fn collect_instantiations(
    ty: &TypeRef,
    templates: &HashMap<String, RecordDef>,
    records: &mut HashMap<String, RecordDef>,
    memo: &mut HashMap<(String, Vec<TypeRef>), String>,
    worklist: &mut Vec<String>,
) -> Result<(), SchemaError> {
    if ty.type_args.is_empty() {
        return Ok(());
    }

    for arg in &ty.type_args {
        collect_instantiations(arg, templates, records, memo, worklist)?;
    }

    let memo_key = (ty.name.clone(), ty.type_args.clone());
    if memo.contains_key(&memo_key) {
        return Ok(());
    }

    let template = templates
        .get(&ty.name)
        .ok_or_else(|| SchemaError::UnknownType {
            record: ty.name.clone(),
            name: ty.name.clone(),
        })?;

    if template.template_params.len() != ty.type_args.len() {
        return Err(SchemaError::TemplateArity {
            name: ty.name.clone(),
            expected: template.template_params.len(),
            got: ty.type_args.len(),
        });
    }

    let instantiated_name = ty.instantiated_name();
    memo.insert(memo_key, instantiated_name.clone());

    if records.contains_key(&instantiated_name) {
        return Ok(());
    }

    let substitution: HashMap<&str, &TypeRef> = template
        .template_params
        .iter()
        .map(String::as_str)
        .zip(ty.type_args.iter())
        .collect();

    let mut instantiated = template.clone();
    instantiated.name = instantiated_name.clone();
    instantiated.template_params.clear();
    for field in &mut instantiated.fields {
        field.ty = substitute(&field.ty, &substitution);
    }

    records.insert(instantiated_name.clone(), instantiated);
    worklist.push(instantiated_name);
    Ok(())
}

fn substitute(ty: &TypeRef, substitution: &HashMap<&str, &TypeRef>) -> TypeRef {
    if ty.type_args.is_empty() {
        if let Some(replacement) = substitution.get(ty.name.as_str()) {
            return (*replacement).clone();
        }
        return ty.clone();
    }
    TypeRef {
        name: ty.name.clone(),
        type_args: ty
            .type_args
            .iter()
            .map(|arg| substitute(arg, substitution))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_schema;

    #[test]
    fn instantiates_generic_once_per_distinct_argument_tuple() {
        let schema = parse_schema(
            "LinkedList<T> {\n    T value\n}\n\
             PlanetData {\n    int32 id\n}\n\
             StarData {\n    int32 id\n}\n\
             Root {\n    LinkedList<PlanetData> planets\n    LinkedList<PlanetData> more_planets\n    LinkedList<StarData> stars\n}\n",
        )
        .unwrap();
        let registry = TypeRegistry::build(schema).unwrap();
        assert!(registry.get("LinkedList_PlanetData").is_some());
        assert!(registry.get("LinkedList_StarData").is_some());
        // PlanetData, StarData, Root, LinkedList_PlanetData, LinkedList_StarData
        assert_eq!(registry.records.len(), 5);
    }

    #[test]
    fn unknown_type_is_an_error() {
        let schema = parse_schema("Foo {\n    Bar x\n}\n").unwrap();
        let result = TypeRegistry::build(schema);
        assert!(matches!(result, Err(SchemaError::UnknownType { .. })));
    }

    #[test]
    fn wrong_template_arity_is_an_error() {
        let schema = parse_schema(
            "Pair<A, B> {\n    A first\n    B second\n}\n\
             Foo {\n    Pair<int32> bad\n}\n",
        )
        .unwrap();
        let result = TypeRegistry::build(schema);
        assert!(matches!(result, Err(SchemaError::TemplateArity { .. })));
    }

    #[test]
    fn straight_recursion_is_a_schema_cycle() {
        let schema = parse_schema("Node {\n    Node child\n}\n").unwrap();
        let result = TypeRegistry::build(schema);
        assert!(matches!(result, Err(SchemaError::SchemaCycle { .. })));
    }

    #[test]
    fn guarded_recursion_through_if_is_permitted() {
        let schema = parse_schema(
            "Node {\n    boolean has_child\n    Node child if (has_child != null)\n}\n",
        )
        .unwrap();
        assert!(TypeRegistry::build(schema).is_ok());
    }
}
