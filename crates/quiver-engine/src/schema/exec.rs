//! Root-field execution against a merged executable schema.
//!
//! Intentionally thin: select the operation, flatten its top-level
//! selection set, and invoke the bound resolver for each field, collecting
//! `{data, errors}`. A resolver's return value is the field's complete
//! value — nested selection semantics and validation rules belong to the
//! resolvers, not the engine.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use graphql_parser::query::{
    Definition, Document, Field, FragmentDefinition, OperationDefinition, Selection, SelectionSet,
    Value as AstValue,
};
use serde_json::{Map, Value};

use quiver_protocol::{GraphQLError, ResponsePayload};

use crate::context::{Context, ResolverInfo};
use crate::error::ExecuteError;
use crate::schema::{ExecutableSchema, RootType};

type Doc = Document<'static, String>;

/// Execute a parsed document's root fields against `schema`, writing each
/// resolver's call frame into `ctx.graphql` before invoking it.
///
/// Per-field failures are collected into the payload's `errors` array; an
/// `Err` is returned only when the schema itself is unusable (a known field
/// with no resolver bound).
pub async fn execute(
    schema: Arc<ExecutableSchema>,
    document: Doc,
    ctx: &mut Context,
) -> Result<ResponsePayload, ExecuteError> {
    let operation = match select_operation(&document, ctx.graphql.operation_name.as_deref()) {
        Ok(operation) => operation,
        Err(message) => return Ok(ResponsePayload::error(GraphQLError::client(message))),
    };

    let variables = ctx.graphql.variables.clone().unwrap_or_default();
    let fragments: HashMap<&str, &FragmentDefinition<'static, String>> = document
        .definitions
        .iter()
        .filter_map(|def| match def {
            Definition::Fragment(fragment) => Some((fragment.name.as_str(), fragment)),
            _ => None,
        })
        .collect();

    let mut errors = Vec::new();
    let mut fields = Vec::new();
    let mut visited = HashSet::new();
    flatten_fields(
        &operation.selection_set,
        &fragments,
        &mut visited,
        &mut fields,
        &mut errors,
    );

    let mut data = Map::new();
    for field in fields {
        let key = field.alias.clone().unwrap_or_else(|| field.name.clone());

        if !schema.has_field(operation.root, &field.name) {
            errors.push(GraphQLError::client(format!(
                "cannot query field \"{}\" on type \"{}\"",
                field.name,
                operation.root.type_name()
            )));
            continue;
        }
        let Some(resolver) = schema.resolver(operation.root, &field.name) else {
            return Err(ExecuteError::UnboundField {
                type_name: operation.root.type_name().to_string(),
                field: field.name.clone(),
            });
        };

        ctx.graphql.parent = Value::Null;
        ctx.graphql.args = coerce_arguments(&field.arguments, &variables);
        ctx.graphql.info = Some(ResolverInfo {
            field: field.name.clone(),
            alias: field.alias.clone(),
            root_type: operation.root,
            operation_name: operation.name.clone(),
        });

        match resolver.call(ctx).await {
            Ok(value) => {
                data.insert(key, value);
            }
            Err(err) => {
                data.insert(key, Value::Null);
                errors.push(err);
            }
        }
    }

    let data = if data.is_empty() && !errors.is_empty() {
        Value::Null
    } else {
        Value::Object(data)
    };
    Ok(ResponsePayload { data, errors })
}

struct SelectedOperation {
    root: RootType,
    name: Option<String>,
    selection_set: SelectionSet<'static, String>,
}

/// Pick the operation to run: by name when one was provided, otherwise the
/// document's sole operation.
fn select_operation(document: &Doc, wanted: Option<&str>) -> Result<SelectedOperation, String> {
    let mut operations = Vec::new();
    for definition in &document.definitions {
        let Definition::Operation(op) = definition else {
            continue;
        };
        operations.push(match op {
            OperationDefinition::SelectionSet(set) => SelectedOperation {
                root: RootType::Query,
                name: None,
                selection_set: set.clone(),
            },
            OperationDefinition::Query(q) => SelectedOperation {
                root: RootType::Query,
                name: q.name.clone(),
                selection_set: q.selection_set.clone(),
            },
            OperationDefinition::Mutation(m) => SelectedOperation {
                root: RootType::Mutation,
                name: m.name.clone(),
                selection_set: m.selection_set.clone(),
            },
            OperationDefinition::Subscription(s) => SelectedOperation {
                root: RootType::Subscription,
                name: s.name.clone(),
                selection_set: s.selection_set.clone(),
            },
        });
    }

    match wanted {
        Some(wanted) => operations
            .into_iter()
            .find(|op| op.name.as_deref() == Some(wanted))
            .ok_or_else(|| format!("unknown operation named \"{wanted}\"")),
        None => {
            if operations.len() > 1 {
                return Err(
                    "must provide operation name if query contains multiple operations".to_string(),
                );
            }
            operations
                .into_iter()
                .next()
                .ok_or_else(|| "query contains no operation".to_string())
        }
    }
}

/// Flatten a selection set into root fields, resolving inline fragments and
/// named fragment spreads.
///
/// Each fragment name is expanded at most once per flattening pass — the
/// `visited` set makes cyclic or repeated spreads terminate instead of
/// recursing without bound.
fn flatten_fields<'a>(
    selection_set: &'a SelectionSet<'static, String>,
    fragments: &HashMap<&'a str, &'a FragmentDefinition<'static, String>>,
    visited: &mut HashSet<&'a str>,
    fields: &mut Vec<Field<'static, String>>,
    errors: &mut Vec<GraphQLError>,
) {
    for selection in &selection_set.items {
        match selection {
            Selection::Field(field) => fields.push(field.clone()),
            Selection::InlineFragment(fragment) => {
                flatten_fields(&fragment.selection_set, fragments, visited, fields, errors);
            }
            Selection::FragmentSpread(spread) => {
                if !visited.insert(spread.fragment_name.as_str()) {
                    continue;
                }
                match fragments.get(spread.fragment_name.as_str()) {
                    Some(fragment) => {
                        flatten_fields(&fragment.selection_set, fragments, visited, fields, errors);
                    }
                    None => errors.push(GraphQLError::client(format!(
                        "unknown fragment \"{}\"",
                        spread.fragment_name
                    ))),
                }
            }
        }
    }
}

/// Coerce AST argument literals into JSON values, substituting variables
/// from the request's variable mapping.
fn coerce_arguments(
    arguments: &[(String, AstValue<'static, String>)],
    variables: &Map<String, Value>,
) -> Map<String, Value> {
    arguments
        .iter()
        .map(|(name, value)| (name.clone(), coerce_value(value, variables)))
        .collect()
}

fn coerce_value(value: &AstValue<'static, String>, variables: &Map<String, Value>) -> Value {
    match value {
        AstValue::Variable(name) => variables.get(name.as_str()).cloned().unwrap_or(Value::Null),
        AstValue::Int(n) => n.as_i64().map(Value::from).unwrap_or(Value::Null),
        AstValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        AstValue::String(s) => Value::String(s.clone()),
        AstValue::Boolean(b) => Value::Bool(*b),
        AstValue::Null => Value::Null,
        AstValue::Enum(name) => Value::String(name.clone()),
        AstValue::List(items) => Value::Array(
            items
                .iter()
                .map(|item| coerce_value(item, variables))
                .collect(),
        ),
        AstValue::Object(entries) => Value::Object(
            entries
                .iter()
                .map(|(key, value)| (key.clone(), coerce_value(value, variables)))
                .collect(),
        ),
    }
}
