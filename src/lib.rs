//! Marginalia - an in-memory annotation registry for class and member metadata
//!
//! Marginalia lets unrelated parts of a program attach declarative facts
//! ("annotations") to a class, or to a specific member of a class, and
//! retrieve them later without the class knowing about the registry.
//! Annotations are inherited lazily down a class hierarchy, duplicate
//! singleton annotations are merged under a pluggable policy, and lookups
//! filter by name or schema across the inheritance chain.
//!
//! # Architecture
//!
//! - [`types`] - Strong types: ClassId, MemberName
//! - [`hierarchy`] - Parent lookup capability and the map-backed TypeGraph
//! - [`annotation`] - The annotation record and query filters
//! - [`schema`] - Per-name policies: singleton, merge strategy, identity
//! - [`registry`] - The stateful registry: add, remove, resolve, query
//!
//! # Correctness invariants
//!
//! 1. Records are immutable; every change produces a new record
//! 2. A record's original owner is set once and survives every clone
//! 3. Inheritance is copy-on-first-access, never a live view
//! 4. Schema registration is first-wins per name
//!
//! # Example
//!
//! ```
//! use marginalia::{Merger, Registry, Schema, TypeGraph};
//! use serde_json::json;
//!
//! let mut graph = TypeGraph::new();
//! let controller = graph.declare("Controller");
//! let users = graph.declare_under("UsersController", controller);
//!
//! let mut registry = Registry::new(graph);
//!
//! // A singleton schema that shallow-merges duplicate payloads
//! registry.register_schema(
//!     Schema::builder("route")
//!         .singleton(true)
//!         .merger(Merger::Shallow)
//!         .build(),
//! );
//!
//! registry.add_class(controller, "route", json!({ "prefix": "/api" }));
//! registry.add_class(users, "route", json!({ "path": "/users" }));
//!
//! let routes = registry.get(users, "route");
//! assert_eq!(routes.len(), 1);
//! assert_eq!(routes[0].metadata, json!({ "prefix": "/api", "path": "/users" }));
//! ```

pub mod annotation;
pub mod hierarchy;
pub mod registry;
pub mod schema;
pub mod types;

// Re-export the public surface at the crate root
pub use annotation::{Annotation, AnnotationFilter};
pub use hierarchy::{Hierarchy, HierarchyError, TypeGraph};
pub use registry::{NameOrSchema, Registry};
pub use schema::{IdentityFn, MergeFn, Merger, Schema, SchemaBuilder};
pub use types::{ClassId, MemberName, TypeError};
