//! Executable schema — SDL-derived type and root-field tables with
//! resolver bindings.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use graphql_parser::parse_schema;
use graphql_parser::schema::{Definition, TypeDefinition};

use crate::error::SchemaError;
use crate::schema::{Handler, RootType};

/// One field of a root operation type, optionally bound to a resolver.
#[derive(Clone)]
pub(crate) struct FieldBinding {
    pub(crate) resolver: Option<Arc<dyn Handler>>,
}

/// A schema that can be executed: the set of type names the SDL defined
/// (used for merge-conflict detection) plus per-root-type field tables with
/// their resolver bindings.
///
/// Built from SDL via [`ExecutableSchema::from_sdl`] and bound with
/// [`ExecutableSchema::bind`]; the registry builds these internally for the
/// text-with-resolver registration forms.
#[derive(Default, Clone)]
pub struct ExecutableSchema {
    type_names: BTreeSet<String>,
    roots: BTreeMap<RootType, BTreeMap<String, FieldBinding>>,
}

impl ExecutableSchema {
    /// Parse SDL text into an executable schema with no resolvers bound.
    ///
    /// Only the fixed root type names `Query`, `Mutation`, and
    /// `Subscription` are recognized as operation entry points.
    pub fn from_sdl(sdl: &str) -> Result<Self, SchemaError> {
        let document = parse_schema::<String>(sdl).map_err(|e| SchemaError::Parse(e.to_string()))?;

        let mut schema = Self::default();
        for definition in &document.definitions {
            let Definition::TypeDefinition(def) = definition else {
                continue;
            };
            let name = type_definition_name(def);
            if !schema.type_names.insert(name.to_string()) {
                return Err(SchemaError::DuplicateType(name.to_string()));
            }
            if let TypeDefinition::Object(object) = def {
                if let Some(root) = RootType::from_type_name(&object.name) {
                    let fields = schema.roots.entry(root).or_default();
                    for field in &object.fields {
                        fields.insert(field.name.clone(), FieldBinding { resolver: None });
                    }
                }
            }
        }
        Ok(schema)
    }

    /// Bind a resolver to a root field.
    pub fn bind(
        &mut self,
        root: RootType,
        field: &str,
        resolver: Arc<dyn Handler>,
    ) -> Result<(), SchemaError> {
        let binding = self
            .roots
            .get_mut(&root)
            .and_then(|fields| fields.get_mut(field))
            .ok_or_else(|| SchemaError::UnknownField {
                root,
                field: field.to_string(),
            })?;
        binding.resolver = Some(resolver);
        Ok(())
    }

    /// Every root field across all present root types, in root order.
    pub fn root_fields(&self) -> Vec<(RootType, String)> {
        self.roots
            .iter()
            .flat_map(|(root, fields)| fields.keys().map(|name| (*root, name.clone())))
            .collect()
    }

    pub fn has_field(&self, root: RootType, field: &str) -> bool {
        self.roots
            .get(&root)
            .is_some_and(|fields| fields.contains_key(field))
    }

    pub(crate) fn resolver(&self, root: RootType, field: &str) -> Option<Arc<dyn Handler>> {
        self.roots
            .get(&root)?
            .get(field)?
            .resolver
            .clone()
    }

    /// Structural validation for prebuilt fragments. Returns every
    /// violation found, not just the first.
    pub fn validate(&self) -> Vec<String> {
        let mut violations = Vec::new();
        if self.root_fields().is_empty() {
            violations.push("schema defines no root operation type with fields".to_string());
        }
        for (root, fields) in &self.roots {
            for (name, binding) in fields {
                if binding.resolver.is_none() {
                    violations.push(format!("no resolver bound for {root}.{name}"));
                }
            }
        }
        violations
    }

    /// Merge an ordered list of fragments into one executable graph.
    ///
    /// Root types merge by field-table union; everything else must be
    /// disjoint. Duplicate non-root type names and conflicting root fields
    /// are rejected rather than resolved last-write-wins.
    pub fn merge<'a>(
        fragments: impl IntoIterator<Item = &'a ExecutableSchema>,
    ) -> Result<ExecutableSchema, SchemaError> {
        let mut merged = ExecutableSchema::default();
        for fragment in fragments {
            for name in &fragment.type_names {
                let is_root = RootType::from_type_name(name).is_some();
                if !merged.type_names.insert(name.clone()) && !is_root {
                    return Err(SchemaError::DuplicateType(name.clone()));
                }
            }
            for (root, fields) in &fragment.roots {
                let target = merged.roots.entry(*root).or_default();
                for (name, binding) in fields {
                    if target.insert(name.clone(), binding.clone()).is_some() {
                        return Err(SchemaError::DuplicateField {
                            type_name: root.type_name().to_string(),
                            field: name.clone(),
                        });
                    }
                }
            }
        }
        Ok(merged)
    }
}

impl std::fmt::Debug for ExecutableSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutableSchema")
            .field("types", &self.type_names)
            .field(
                "root_fields",
                &self
                    .root_fields()
                    .iter()
                    .map(|(root, name)| format!("{root}.{name}"))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

fn type_definition_name<'a>(def: &'a TypeDefinition<'a, String>) -> &'a str {
    match def {
        TypeDefinition::Scalar(t) => &t.name,
        TypeDefinition::Object(t) => &t.name,
        TypeDefinition::Interface(t) => &t.name,
        TypeDefinition::Union(t) => &t.name,
        TypeDefinition::Enum(t) => &t.name,
        TypeDefinition::InputObject(t) => &t.name,
    }
}
