//! schema
//!
//! Per-name behavior policies for annotations.
//!
//! # Policy table
//!
//! A schema governs every annotation sharing its name:
//!
//! | `singleton` | `merger`             | behavior on duplicate add        |
//! |-------------|----------------------|----------------------------------|
//! | `false`     | any                  | append                           |
//! | `true`      | [`Merger::Overwrite`]| newer payload replaces the old   |
//! | `true`      | [`Merger::Shallow`]  | key-wise merge of object payloads|
//! | `true`      | [`Merger::Custom`]   | closure of (old, new)            |
//!
//! The optional identity function decides whether two candidate records count
//! as "the same" singleton; without one, any two records sharing
//! (owner, member, name) collapse.
//!
//! # Example
//!
//! ```
//! use marginalia::schema::{Merger, Schema};
//! use serde_json::json;
//!
//! let schema = Schema::builder("route")
//!     .singleton(true)
//!     .merger(Merger::Shallow)
//!     .build();
//!
//! let merged = schema.merge(&json!({ "a": 1 }), &json!({ "b": 2 }));
//! assert_eq!(merged, json!({ "a": 1, "b": 2 }));
//! ```

use std::fmt;

use serde_json::Value;

/// Custom merge function over (old, new) metadata payloads.
pub type MergeFn = dyn Fn(&Value, &Value) -> Value + Send + Sync;

/// Custom equality function over two metadata payloads.
pub type IdentityFn = dyn Fn(&Value, &Value) -> bool + Send + Sync;

/// How a singleton schema combines an existing payload with a new one.
pub enum Merger {
    /// The newer payload replaces the old one.
    Overwrite,

    /// Key-wise merge when both payloads are JSON objects, newer keys
    /// winning. Falls back to overwrite when either side is not an object.
    Shallow,

    /// Custom combination. Called with the existing payload first and the
    /// incoming payload second.
    Custom(Box<MergeFn>),
}

impl fmt::Debug for Merger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Merger::Overwrite => f.write_str("Overwrite"),
            Merger::Shallow => f.write_str("Shallow"),
            Merger::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A named policy controlling singleton collapse and merge behavior for all
/// annotations sharing its name.
///
/// Constructed either with [`Schema::new`] (non-singleton, shallow merge,
/// matching the permissive defaults of a freestanding schema) or through
/// [`Schema::builder`] for full control.
pub struct Schema {
    name: String,
    singleton: bool,
    merger: Merger,
    identity: Option<Box<IdentityFn>>,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("singleton", &self.singleton)
            .field("merger", &self.merger)
            .field("identity", &self.identity.as_ref().map(|_| ".."))
            .finish()
    }
}

impl Schema {
    /// Create a schema with default policy: non-singleton, shallow merge, no
    /// identity function.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            singleton: false,
            merger: Merger::Shallow,
            identity: None,
        }
    }

    /// Create a builder for constructing a schema with more options.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    /// The annotation name this schema governs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether at most one annotation of this name may exist per
    /// (owner, member).
    pub fn is_singleton(&self) -> bool {
        self.singleton
    }

    /// Combine an existing payload with a newly added one.
    ///
    /// `old` is the payload already stored; `new` is the incoming one. The
    /// order is part of the contract for [`Merger::Custom`] closures.
    pub fn merge(&self, old: &Value, new: &Value) -> Value {
        match &self.merger {
            Merger::Custom(f) => f(old, new),
            Merger::Shallow => match (old, new) {
                (Value::Object(old_map), Value::Object(new_map)) => {
                    let mut merged = old_map.clone();
                    for (key, value) in new_map {
                        merged.insert(key.clone(), value.clone());
                    }
                    Value::Object(merged)
                }
                _ => new.clone(),
            },
            Merger::Overwrite => new.clone(),
        }
    }

    /// Decide whether two payloads belong to the same annotation instance.
    ///
    /// Delegates to the identity function; passes unconditionally when none
    /// is set.
    pub fn matches(&self, a: &Value, b: &Value) -> bool {
        match &self.identity {
            Some(identity) => identity(a, b),
            None => true,
        }
    }
}

/// Builder for [`Schema`].
#[derive(Debug)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            schema: Schema::new(name),
        }
    }

    /// Set whether the schema is a singleton.
    pub fn singleton(mut self, singleton: bool) -> Self {
        self.schema.singleton = singleton;
        self
    }

    /// Set the merge policy.
    pub fn merger(mut self, merger: Merger) -> Self {
        self.schema.merger = merger;
        self
    }

    /// Set a custom identity function over metadata payloads.
    pub fn identity(
        mut self,
        identity: impl Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.schema.identity = Some(Box::new(identity));
        self
    }

    /// Finish building the schema.
    pub fn build(self) -> Schema {
        self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_are_non_singleton_shallow() {
        let schema = Schema::new("route");
        assert_eq!(schema.name(), "route");
        assert!(!schema.is_singleton());
        assert!(matches!(
            Schema::new("x").merger,
            Merger::Shallow
        ));
    }

    #[test]
    fn overwrite_returns_new_payload() {
        let schema = Schema::builder("x").merger(Merger::Overwrite).build();
        assert_eq!(schema.merge(&json!({ "v": 1 }), &json!({ "v": 2 })), json!({ "v": 2 }));
        assert_eq!(schema.merge(&json!(10), &json!(3)), json!(3));
    }

    #[test]
    fn shallow_merges_objects_new_keys_win() {
        let schema = Schema::builder("x").merger(Merger::Shallow).build();

        let merged = schema.merge(&json!({ "a": 1, "b": 1 }), &json!({ "b": 2, "c": 3 }));
        assert_eq!(merged, json!({ "a": 1, "b": 2, "c": 3 }));
    }

    #[test]
    fn shallow_degrades_to_overwrite_for_non_objects() {
        let schema = Schema::builder("x").merger(Merger::Shallow).build();

        assert_eq!(schema.merge(&json!(10), &json!(3)), json!(3));
        assert_eq!(schema.merge(&json!({ "a": 1 }), &json!("text")), json!("text"));
        assert_eq!(schema.merge(&json!([1]), &json!([2, 3])), json!([2, 3]));
    }

    #[test]
    fn custom_merger_sees_old_then_new() {
        let schema = Schema::builder("x")
            .merger(Merger::Custom(Box::new(|old, new| {
                json!(old.as_i64().unwrap() - new.as_i64().unwrap())
            })))
            .build();

        assert_eq!(schema.merge(&json!(10), &json!(3)), json!(7));
    }

    #[test]
    fn matches_defaults_to_true() {
        let schema = Schema::new("x");
        assert!(schema.matches(&json!(1), &json!("other")));
    }

    #[test]
    fn matches_uses_identity_function() {
        let schema = Schema::builder("x")
            .identity(|a, b| a["key"] == b["key"])
            .build();

        assert!(schema.matches(&json!({ "key": 1 }), &json!({ "key": 1, "v": 2 })));
        assert!(!schema.matches(&json!({ "key": 1 }), &json!({ "key": 2 })));
    }

    #[test]
    fn debug_elides_closures() {
        let schema = Schema::builder("x")
            .merger(Merger::Custom(Box::new(|_, new| new.clone())))
            .identity(|_, _| true)
            .build();

        let rendered = format!("{:?}", schema);
        assert!(rendered.contains("Custom"));
        assert!(!rendered.contains("closure"));
    }
}
