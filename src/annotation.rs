//! annotation
//!
//! The annotation record: one unit of metadata attached to a class or member.
//!
//! # Provenance
//!
//! Every record tracks two owners. `owner` is the class the record currently
//! applies to and moves when the record is copied down the hierarchy;
//! `original_owner` is the class the annotation was first declared on and is
//! fixed at construction. Consumers use `original_owner` to tell inherited
//! facts from locally declared ones.
//!
//! # Example
//!
//! ```
//! use marginalia::annotation::Annotation;
//! use marginalia::types::ClassId;
//! use serde_json::json;
//!
//! let base = ClassId::next();
//! let derived = ClassId::next();
//!
//! let ann = Annotation::new("route", base, None, json!({ "path": "/" }));
//! let inherited = ann.clone_with_owner(derived);
//!
//! assert_eq!(inherited.owner, derived);
//! assert_eq!(inherited.original_owner, base);
//! assert!(inherited.is("route"));
//! ```

use serde::Serialize;
use serde_json::Value;

use crate::schema::Schema;
use crate::types::{ClassId, MemberName};

/// A unit of metadata attached to a class or one of its members.
///
/// Records are never mutated after construction; every change produces a new
/// record through one of the clone operations. The registry relies on this to
/// keep inherited copies independent of their source.
#[derive(Debug, Clone, Serialize)]
pub struct Annotation {
    /// The kind of annotation. Matches a schema name when one is registered.
    pub name: String,

    /// The class this record currently applies to.
    pub owner: ClassId,

    /// The class the annotation was first declared on.
    ///
    /// Preserved across inheritance clones and merges; set exactly once.
    pub original_owner: ClassId,

    /// The member this record targets, or `None` for the class itself.
    pub member: Option<MemberName>,

    /// Opaque metadata payload.
    pub metadata: Value,
}

impl Annotation {
    /// Create a record declared directly on `owner`.
    ///
    /// `original_owner` starts out equal to `owner`.
    pub fn new(
        name: impl Into<String>,
        owner: ClassId,
        member: Option<MemberName>,
        metadata: Value,
    ) -> Self {
        Self {
            name: name.into(),
            owner,
            original_owner: owner,
            member,
            metadata,
        }
    }

    /// Check whether this record's name matches an identifier.
    ///
    /// The identifier is either a bare name or a schema; a schema matches
    /// through its name.
    pub fn is<'a>(&self, filter: impl Into<AnnotationFilter<'a>>) -> bool {
        self.name == filter.into().name()
    }

    /// Copy this record onto a new owner.
    ///
    /// Name, member, metadata, and `original_owner` are kept. This is the
    /// inheritance operation: the copy belongs to the subclass but still
    /// points back at the declaring class.
    pub fn clone_with_owner(&self, owner: ClassId) -> Self {
        Self {
            name: self.name.clone(),
            owner,
            original_owner: self.original_owner,
            member: self.member.clone(),
            metadata: self.metadata.clone(),
        }
    }

    /// Copy this record with a replacement payload.
    ///
    /// Name, owner, member, and `original_owner` are kept. This is the merge
    /// operation: the merged record takes the old record's place.
    pub fn clone_with_metadata(&self, metadata: Value) -> Self {
        Self {
            name: self.name.clone(),
            owner: self.owner,
            original_owner: self.original_owner,
            member: self.member.clone(),
            metadata,
        }
    }

    /// Check whether two records are the same annotation under a schema.
    ///
    /// Owner, member, and name must match exactly, and the schema's identity
    /// function must accept the two payloads. With no identity function set
    /// the payload check passes unconditionally, so any two records sharing
    /// (owner, member, name) collapse into one singleton slot.
    pub fn matches(&self, other: &Annotation, schema: &Schema) -> bool {
        self.owner == other.owner
            && self.member == other.member
            && self.name == other.name
            && schema.matches(&self.metadata, &other.metadata)
    }
}

/// An identifier used to filter annotations: a bare name or a schema.
///
/// Query methods accept anything convertible into this, so call sites can
/// pass `"route"` or `&schema` interchangeably.
#[derive(Debug, Clone, Copy)]
pub enum AnnotationFilter<'a> {
    /// Match records by bare name.
    Name(&'a str),
    /// Match records carrying the schema's name.
    Schema(&'a Schema),
}

impl AnnotationFilter<'_> {
    /// The name this filter matches against.
    pub fn name(&self) -> &str {
        match self {
            AnnotationFilter::Name(name) => name,
            AnnotationFilter::Schema(schema) => schema.name(),
        }
    }
}

impl<'a> From<&'a str> for AnnotationFilter<'a> {
    fn from(name: &'a str) -> Self {
        AnnotationFilter::Name(name)
    }
}

impl<'a> From<&'a String> for AnnotationFilter<'a> {
    fn from(name: &'a String) -> Self {
        AnnotationFilter::Name(name)
    }
}

impl<'a> From<&'a Schema> for AnnotationFilter<'a> {
    fn from(schema: &'a Schema) -> Self {
        AnnotationFilter::Schema(schema)
    }
}

impl<'a> From<&'a std::sync::Arc<Schema>> for AnnotationFilter<'a> {
    fn from(schema: &'a std::sync::Arc<Schema>) -> Self {
        AnnotationFilter::Schema(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Merger, Schema};
    use serde_json::json;

    #[test]
    fn new_record_owns_itself() {
        let owner = ClassId::next();
        let ann = Annotation::new("route", owner, None, json!({ "path": "/" }));

        assert_eq!(ann.owner, owner);
        assert_eq!(ann.original_owner, owner);
        assert_eq!(ann.member, None);
    }

    #[test]
    fn is_matches_name_and_schema() {
        let owner = ClassId::next();
        let ann = Annotation::new("route", owner, None, json!(null));
        let schema = Schema::new("route");
        let other = Schema::new("validator");

        assert!(ann.is("route"));
        assert!(!ann.is("validator"));
        assert!(ann.is(&schema));
        assert!(!ann.is(&other));
    }

    #[test]
    fn clone_with_owner_preserves_original_owner() {
        let base = ClassId::next();
        let derived = ClassId::next();
        let grandchild = ClassId::next();

        let ann = Annotation::new("route", base, None, json!(1));
        let first = ann.clone_with_owner(derived);
        let second = first.clone_with_owner(grandchild);

        assert_eq!(first.owner, derived);
        assert_eq!(first.original_owner, base);
        assert_eq!(second.owner, grandchild);
        assert_eq!(second.original_owner, base);
        assert_eq!(second.metadata, json!(1));
    }

    #[test]
    fn clone_with_metadata_preserves_identity_fields() {
        let base = ClassId::next();
        let member = MemberName::new("save").unwrap();
        let ann = Annotation::new("required", base, Some(member.clone()), json!(1));

        let merged = ann.clone_with_metadata(json!(2));

        assert_eq!(merged.name, "required");
        assert_eq!(merged.owner, base);
        assert_eq!(merged.original_owner, base);
        assert_eq!(merged.member, Some(member));
        assert_eq!(merged.metadata, json!(2));
    }

    #[test]
    fn matches_requires_exact_identity_fields() {
        let owner = ClassId::next();
        let other_owner = ClassId::next();
        let schema = Schema::new("route");

        let a = Annotation::new("route", owner, None, json!(1));
        let same_slot = Annotation::new("route", owner, None, json!(2));
        let other_class = Annotation::new("route", other_owner, None, json!(1));
        let other_name = Annotation::new("validator", owner, None, json!(1));
        let on_member = Annotation::new(
            "route",
            owner,
            Some(MemberName::new("save").unwrap()),
            json!(1),
        );

        // Default identity collapses on (owner, member, name) alone
        assert!(a.matches(&same_slot, &schema));
        assert!(!a.matches(&other_class, &schema));
        assert!(!a.matches(&other_name, &schema));
        assert!(!a.matches(&on_member, &schema));
    }

    #[test]
    fn serializes_for_diagnostics() {
        let owner = ClassId::next();
        let ann = Annotation::new("route", owner, None, json!({ "path": "/" }));

        let dumped = serde_json::to_value(&ann).unwrap();
        assert_eq!(dumped["name"], json!("route"));
        assert_eq!(dumped["member"], json!(null));
        assert_eq!(dumped["metadata"], json!({ "path": "/" }));
    }

    #[test]
    fn matches_consults_schema_identity() {
        let owner = ClassId::next();
        let schema = Schema::builder("route")
            .singleton(true)
            .merger(Merger::Overwrite)
            .identity(|a, b| a["key"] == b["key"])
            .build();

        let a = Annotation::new("route", owner, None, json!({ "key": 1 }));
        let same_key = Annotation::new("route", owner, None, json!({ "key": 1, "v": 9 }));
        let other_key = Annotation::new("route", owner, None, json!({ "key": 2 }));

        assert!(a.matches(&same_key, &schema));
        assert!(!a.matches(&other_key, &schema));
    }
}
