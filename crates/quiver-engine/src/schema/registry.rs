//! Schema registry — ordered fragments, three registration forms, one
//! merged graph.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::SchemaError;
use crate::schema::{ExecutableSchema, Handler};

/// One unit of schema registration, selected by shape at the call site — a
/// closed set of variants standing in for dynamic overload resolution.
pub enum SchemaSource {
    /// An already-built schema; validated structurally on registration.
    Prebuilt(ExecutableSchema),
    /// SDL text defining exactly one root operation field, with the single
    /// resolver bound to it.
    TextWithResolver {
        sdl: String,
        resolver: Arc<dyn Handler>,
    },
    /// SDL text with a field-name → resolver mapping; every root field must
    /// have an entry.
    TextWithResolverMap {
        sdl: String,
        resolvers: HashMap<String, Arc<dyn Handler>>,
    },
}

/// Ordered collection of schema fragments plus the merged executable graph
/// derived from them.
///
/// The registry is built up during application setup and must be treated as
/// read-only once traffic is flowing; registration concurrent with request
/// serving is not supported.
#[derive(Default)]
pub struct SchemaRegistry {
    fragments: Vec<Arc<ExecutableSchema>>,
    merged: Option<Arc<ExecutableSchema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fragment and re-derive the merged graph from the full
    /// ordered collection.
    ///
    /// Merge conflicts are registration-time errors; a fragment that fails
    /// to merge is not retained.
    pub fn register(&mut self, source: SchemaSource) -> Result<(), SchemaError> {
        let fragment = match source {
            SchemaSource::Prebuilt(schema) => {
                let violations = schema.validate();
                if !violations.is_empty() {
                    return Err(SchemaError::Invalid { violations });
                }
                schema
            }
            SchemaSource::TextWithResolver { sdl, resolver } => {
                let mut schema = ExecutableSchema::from_sdl(&sdl)?;
                let fields = schema.root_fields();
                if fields.len() != 1 {
                    return Err(SchemaError::SingleRootField {
                        found: fields.len(),
                    });
                }
                let (root, name) = &fields[0];
                schema.bind(*root, name, resolver)?;
                schema
            }
            SchemaSource::TextWithResolverMap { sdl, resolvers } => {
                let mut schema = ExecutableSchema::from_sdl(&sdl)?;
                for (root, name) in schema.root_fields() {
                    let Some(resolver) = resolvers.get(&name) else {
                        return Err(SchemaError::MissingResolver {
                            type_name: root.type_name().to_string(),
                            field: name,
                        });
                    };
                    schema.bind(root, &name, resolver.clone())?;
                }
                schema
            }
        };

        let fragment = Arc::new(fragment);
        let merged = ExecutableSchema::merge(
            self.fragments
                .iter()
                .chain(std::iter::once(&fragment))
                .map(Arc::as_ref),
        )?;

        self.fragments.push(fragment);
        self.merged = Some(Arc::new(merged));
        tracing::info!(fragments = self.fragments.len(), "schema fragment registered");
        Ok(())
    }

    /// The currently active merged schema, if any fragment has been
    /// registered.
    pub fn merged(&self) -> Option<Arc<ExecutableSchema>> {
        self.merged.clone()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}
