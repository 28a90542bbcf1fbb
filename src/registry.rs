//! registry
//!
//! The stateful annotation registry.
//!
//! # Architecture
//!
//! The registry owns two tables: class → ordered annotation list, and schema
//! name → schema (first registration wins). A class the registry has never
//! seen is resolved lazily: its parent's list is resolved first (recursively),
//! then copied onto the class with [`Annotation::clone_with_owner`], then
//! memoized. The copy is taken once; later changes to the parent do not flow
//! into an already-resolved child.
//!
//! Inserts are schema-driven. A singleton schema collapses a duplicate add
//! into the existing record by merging payloads (existing payload first,
//! incoming second); everything else appends in insertion order.
//!
//! # Concurrency
//!
//! The registry is a plain mutable value with no interior locking. All
//! operations are synchronous and bounded by the lists they touch. Wrap the
//! instance in a `Mutex` if it must be shared across threads.
//!
//! # Example
//!
//! ```
//! use marginalia::hierarchy::TypeGraph;
//! use marginalia::registry::Registry;
//! use marginalia::schema::{Merger, Schema};
//! use serde_json::json;
//!
//! let mut graph = TypeGraph::new();
//! let base = graph.declare("Controller");
//! let derived = graph.declare_under("UserController", base);
//!
//! let mut registry = Registry::new(graph);
//! registry.add_class(base, "route", json!({ "prefix": "/api" }));
//!
//! let inherited = registry.all(derived);
//! assert_eq!(inherited.len(), 1);
//! assert_eq!(inherited[0].owner, derived);
//! assert_eq!(inherited[0].original_owner, base);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::annotation::{Annotation, AnnotationFilter};
use crate::hierarchy::Hierarchy;
use crate::schema::{Merger, Schema};
use crate::types::{ClassId, MemberName};

/// Either a bare annotation name or a full schema.
///
/// The `add_*` methods accept both. Passing a schema registers it as a side
/// effect (first registration wins) before the record is built.
#[derive(Debug)]
pub enum NameOrSchema {
    /// A bare annotation name, governed by whatever schema is registered for
    /// it (or the default schema).
    Name(String),
    /// A schema to register alongside the record.
    Schema(Schema),
}

impl From<&str> for NameOrSchema {
    fn from(name: &str) -> Self {
        NameOrSchema::Name(name.to_string())
    }
}

impl From<String> for NameOrSchema {
    fn from(name: String) -> Self {
        NameOrSchema::Name(name)
    }
}

impl From<Schema> for NameOrSchema {
    fn from(schema: Schema) -> Self {
        NameOrSchema::Schema(schema)
    }
}

/// The annotation registry.
///
/// Constructed with a [`Hierarchy`] implementation that answers parent
/// lookups during lazy inheritance. One instance per process is typical;
/// tests construct their own for isolation.
#[derive(Debug)]
pub struct Registry<H: Hierarchy> {
    hierarchy: H,
    /// All annotations grouped by class, in insertion order.
    annotations: HashMap<ClassId, Vec<Arc<Annotation>>>,
    /// Registered schemas by name. First registration wins.
    schemas: HashMap<String, Arc<Schema>>,
    /// Governs annotation names with no registered schema.
    default_schema: Arc<Schema>,
}

impl<H: Hierarchy> Registry<H> {
    /// Create an empty registry over the given hierarchy.
    pub fn new(hierarchy: H) -> Self {
        Self {
            hierarchy,
            annotations: HashMap::new(),
            schemas: HashMap::new(),
            default_schema: Arc::new(
                Schema::builder("")
                    .singleton(true)
                    .merger(Merger::Overwrite)
                    .build(),
            ),
        }
    }

    /// Borrow the hierarchy.
    pub fn hierarchy(&self) -> &H {
        &self.hierarchy
    }

    /// Mutably borrow the hierarchy.
    ///
    /// Extending the hierarchy after classes have been resolved does not
    /// re-resolve them; inheritance copies are taken at first access.
    pub fn hierarchy_mut(&mut self) -> &mut H {
        &mut self.hierarchy
    }

    /// Register a schema under its name.
    ///
    /// Idempotent with first-wins semantics: when a schema is already
    /// registered under the name, the new definition is discarded and the
    /// existing one is returned.
    pub fn register_schema(&mut self, schema: Schema) -> Arc<Schema> {
        if let Some(existing) = self.schemas.get(schema.name()) {
            return existing.clone();
        }

        debug!(name = schema.name(), "registered annotation schema");
        let schema = Arc::new(schema);
        self.schemas.insert(schema.name().to_string(), schema.clone());
        schema
    }

    /// Register a singleton schema with overwrite-on-duplicate behavior.
    ///
    /// Shorthand for the most common policy. First-wins like
    /// [`register_schema`](Self::register_schema).
    pub fn declare_schema(&mut self, name: impl Into<String>) -> Arc<Schema> {
        self.register_schema(
            Schema::builder(name)
                .singleton(true)
                .merger(Merger::Overwrite)
                .build(),
        )
    }

    /// The schema governing an annotation name.
    ///
    /// Falls back to the default schema (singleton, overwrite) when no schema
    /// is registered for the name.
    pub fn schema_for(&self, name: &str) -> Arc<Schema> {
        self.schemas
            .get(name)
            .cloned()
            .unwrap_or_else(|| self.default_schema.clone())
    }

    /// Add a pre-built record.
    ///
    /// Returns the record actually stored, which is the merged replacement
    /// rather than the input when a singleton collapse occurred.
    pub fn add(&mut self, annotation: Annotation) -> Arc<Annotation> {
        self.insert(annotation)
    }

    /// Add a copy of `annotation` owned by `class`.
    ///
    /// The copy keeps the record's `original_owner`, so this behaves like a
    /// manual inheritance step.
    pub fn add_to(&mut self, class: ClassId, annotation: &Annotation) -> Arc<Annotation> {
        self.insert(annotation.clone_with_owner(class))
    }

    /// Add a class-level annotation built from its parts.
    pub fn add_class(
        &mut self,
        class: ClassId,
        name: impl Into<NameOrSchema>,
        metadata: Value,
    ) -> Arc<Annotation> {
        let name = self.resolve_name(name.into());
        self.insert(Annotation::new(name, class, None, metadata))
    }

    /// Add a member-level annotation built from its parts.
    pub fn add_member(
        &mut self,
        class: ClassId,
        member: MemberName,
        name: impl Into<NameOrSchema>,
        metadata: Value,
    ) -> Arc<Annotation> {
        let name = self.resolve_name(name.into());
        self.insert(Annotation::new(name, class, Some(member), metadata))
    }

    /// Remove a record from its owner's list.
    ///
    /// Matching is by pointer identity: only the exact record previously
    /// returned by an add or query call is removed. A structurally equal but
    /// distinct record, or a record not present, is a silent no-op.
    pub fn remove(&mut self, annotation: &Arc<Annotation>) {
        if let Some(list) = self.annotations.get_mut(&annotation.owner) {
            if let Some(pos) = list.iter().position(|a| Arc::ptr_eq(a, annotation)) {
                list.remove(pos);
                debug!(name = %annotation.name, owner = %annotation.owner, "removed annotation");
            }
        }
    }

    /// Remove a batch of records, each from its own owner's list.
    ///
    /// The input is grouped by owner so each stored list is filtered once.
    /// Matching is by pointer identity, as in [`remove`](Self::remove). An
    /// empty batch is a no-op.
    pub fn remove_all(&mut self, annotations: &[Arc<Annotation>]) {
        if annotations.is_empty() {
            return;
        }

        let mut by_owner: HashMap<ClassId, Vec<&Arc<Annotation>>> = HashMap::new();
        for annotation in annotations {
            by_owner.entry(annotation.owner).or_default().push(annotation);
        }

        for (owner, group) in by_owner {
            if let Some(list) = self.annotations.get_mut(&owner) {
                list.retain(|a| !group.iter().any(|r| Arc::ptr_eq(a, r)));
            }
        }
    }

    /// All annotations of a class, resolving inheritance on first access.
    pub fn all(&mut self, class: ClassId) -> Vec<Arc<Annotation>> {
        self.resolve_entry(class);
        self.annotations.get(&class).cloned().unwrap_or_default()
    }

    /// Annotations of a class that target the class itself (no member).
    pub fn all_for_class(&mut self, class: ClassId) -> Vec<Arc<Annotation>> {
        let mut list = self.all(class);
        list.retain(|a| a.member.is_none());
        list
    }

    /// Annotations of a class that target a specific member.
    pub fn all_for_member(&mut self, class: ClassId, member: &MemberName) -> Vec<Arc<Annotation>> {
        let mut list = self.all(class);
        list.retain(|a| a.member.as_ref() == Some(member));
        list
    }

    /// Annotations of a class matching an identifier.
    pub fn get<'a>(
        &mut self,
        class: ClassId,
        filter: impl Into<AnnotationFilter<'a>>,
    ) -> Vec<Arc<Annotation>> {
        let filter = filter.into();
        let mut list = self.all(class);
        list.retain(|a| a.is(filter));
        list
    }

    /// Annotations of a class matching any of the identifiers.
    pub fn get_any(
        &mut self,
        class: ClassId,
        filters: &[AnnotationFilter<'_>],
    ) -> Vec<Arc<Annotation>> {
        let mut list = self.all(class);
        list.retain(|a| filters.iter().any(|f| a.is(*f)));
        list
    }

    /// Class-level annotations matching an identifier.
    pub fn get_for_class<'a>(
        &mut self,
        class: ClassId,
        filter: impl Into<AnnotationFilter<'a>>,
    ) -> Vec<Arc<Annotation>> {
        let filter = filter.into();
        let mut list = self.all_for_class(class);
        list.retain(|a| a.is(filter));
        list
    }

    /// Member-level annotations matching an identifier.
    pub fn get_for_member<'a>(
        &mut self,
        class: ClassId,
        member: &MemberName,
        filter: impl Into<AnnotationFilter<'a>>,
    ) -> Vec<Arc<Annotation>> {
        let filter = filter.into();
        let mut list = self.all_for_member(class, member);
        list.retain(|a| a.is(filter));
        list
    }

    /// Resolve a name-or-schema argument, registering the schema when given.
    fn resolve_name(&mut self, name: NameOrSchema) -> String {
        match name {
            NameOrSchema::Name(name) => name,
            NameOrSchema::Schema(schema) => self.register_schema(schema).name().to_string(),
        }
    }

    /// Ensure `class` has a stored list, inheriting from its parent if this
    /// is the first access.
    fn resolve_entry(&mut self, class: ClassId) {
        if self.annotations.contains_key(&class) {
            return;
        }

        let inherited: Vec<Arc<Annotation>> = match self.hierarchy.parent_of(class) {
            Some(parent) => {
                self.resolve_entry(parent);
                self.annotations
                    .get(&parent)
                    .map(|list| {
                        list.iter()
                            .map(|a| Arc::new(a.clone_with_owner(class)))
                            .collect()
                    })
                    .unwrap_or_default()
            }
            None => Vec::new(),
        };

        if !inherited.is_empty() {
            debug!(class = %class, count = inherited.len(), "inherited annotations from parent");
        }
        self.annotations.insert(class, inherited);
    }

    /// The single insert path behind every `add_*` method.
    fn insert(&mut self, annotation: Annotation) -> Arc<Annotation> {
        let owner = annotation.owner;
        self.resolve_entry(owner);

        // A class whose resolved list is empty cannot hold a singleton peer,
        // so the schema scan is skipped entirely.
        let is_first = self
            .annotations
            .get(&owner)
            .map_or(true, |list| list.is_empty());
        if is_first {
            let stored = Arc::new(annotation);
            self.annotations
                .entry(owner)
                .or_default()
                .push(stored.clone());
            debug!(name = %stored.name, owner = %owner, "added annotation");
            return stored;
        }

        let schema = self.schema_for(&annotation.name);
        let list = self.annotations.entry(owner).or_default();

        if schema.is_singleton() {
            if let Some(pos) = list.iter().position(|a| a.matches(&annotation, &schema)) {
                let merged = list[pos]
                    .clone_with_metadata(schema.merge(&list[pos].metadata, &annotation.metadata));
                let stored = Arc::new(merged);
                list[pos] = stored.clone();
                debug!(name = %stored.name, owner = %owner, "merged singleton annotation");
                return stored;
            }
        }

        let stored = Arc::new(annotation);
        list.push(stored.clone());
        debug!(name = %stored.name, owner = %owner, "added annotation");
        stored
    }
}
