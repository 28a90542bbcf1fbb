//! types
//!
//! Strong types for registry identities.
//!
//! # Types
//!
//! - [`ClassId`] - Opaque per-class token used as the registry key
//! - [`MemberName`] - Validated member (method/field) identifier
//!
//! # Class identity
//!
//! Rust has no runtime class object that can serve as a hashable map key the
//! way a prototype reference can, so classes are identified by an explicit
//! opaque token. Tokens are minted from a process-wide counter: two calls to
//! [`ClassId::next`] never return the same token, which gives the map
//! reference-equality semantics.
//!
//! # Examples
//!
//! ```
//! use marginalia::types::{ClassId, MemberName};
//!
//! let a = ClassId::next();
//! let b = ClassId::next();
//! assert_ne!(a, b);
//!
//! let member = MemberName::new("handle_request").unwrap();
//! assert_eq!(member.as_str(), "handle_request");
//!
//! // Invalid constructions fail at creation time
//! assert!(MemberName::new("").is_err());
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid member name: {0}")]
    InvalidMemberName(String),
}

/// Counter backing [`ClassId::next`].
static NEXT_CLASS_ID: AtomicU32 = AtomicU32::new(1);

/// An opaque token identifying a class.
///
/// The registry keys every annotation list by `ClassId`. Equality is token
/// equality: a token only ever matches itself, never a structurally similar
/// class. Host code mints one token per class it wants to annotate, usually
/// through a [`TypeGraph`](crate::hierarchy::TypeGraph) so the parent link is
/// recorded at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassId(u32);

impl ClassId {
    /// Mint a fresh class token.
    ///
    /// Never returns the same token twice within a process.
    pub fn next() -> Self {
        Self(NEXT_CLASS_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw token value.
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class#{}", self.0)
    }
}

/// A validated member identifier.
///
/// Members name a method or field within a class. Names must:
/// - Not be empty
/// - Not contain ASCII control characters
/// - Not start or end with whitespace
///
/// # Example
///
/// ```
/// use marginalia::types::MemberName;
///
/// let name = MemberName::new("save").unwrap();
/// assert_eq!(name.as_str(), "save");
///
/// assert!(MemberName::new(" padded ").is_err());
/// assert!(MemberName::new("has\tcontrol").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MemberName(String);

impl MemberName {
    /// Create a new validated member name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidMemberName` if the name is empty, contains
    /// control characters, or has leading/trailing whitespace.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidMemberName(
                "member name cannot be empty".into(),
            ));
        }

        if name.starts_with(char::is_whitespace) || name.ends_with(char::is_whitespace) {
            return Err(TypeError::InvalidMemberName(
                "member name cannot start or end with whitespace".into(),
            ));
        }

        if name.chars().any(|c| c.is_ascii_control()) {
            return Err(TypeError::InvalidMemberName(
                "member name cannot contain control characters".into(),
            ));
        }

        Ok(())
    }

    /// Get the member name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MemberName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MemberName> for String {
    fn from(value: MemberName) -> Self {
        value.0
    }
}

impl fmt::Display for MemberName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_ids_are_unique() {
        let a = ClassId::next();
        let b = ClassId::next();
        let c = ClassId::next();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }

    #[test]
    fn class_id_display() {
        let id = ClassId::next();
        assert_eq!(format!("{}", id), format!("class#{}", id.as_u32()));
    }

    #[test]
    fn valid_member_names() {
        assert!(MemberName::new("save").is_ok());
        assert!(MemberName::new("handle_request").is_ok());
        assert!(MemberName::new("röst").is_ok());
        assert!(MemberName::new("a b").is_ok());
    }

    #[test]
    fn invalid_member_names() {
        assert!(MemberName::new("").is_err());
        assert!(MemberName::new(" leading").is_err());
        assert!(MemberName::new("trailing ").is_err());
        assert!(MemberName::new("tab\there").is_err());
        assert!(MemberName::new("nul\0byte").is_err());
    }

    #[test]
    fn member_name_serde_roundtrip() {
        let name = MemberName::new("save").unwrap();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"save\"");

        let parsed: MemberName = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, name);
    }

    #[test]
    fn member_name_serde_rejects_invalid() {
        let result: Result<MemberName, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn type_error_display() {
        let err = MemberName::new("").unwrap_err();
        assert!(err.to_string().contains("member name"));
    }
}
