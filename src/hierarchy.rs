//! hierarchy
//!
//! Class hierarchy lookup for annotation inheritance.
//!
//! # Architecture
//!
//! The registry never inspects the host program's type system directly.
//! Instead it is handed a [`Hierarchy`], a single-operation capability that
//! answers "what is the direct parent of this class?". Any source of that
//! information works: a reflection shim, a schema loader, or the map-backed
//! [`TypeGraph`] provided here.
//!
//! # Invariants
//!
//! - The graph must be acyclic
//! - A class has at most one parent (single inheritance)
//!
//! # Example
//!
//! ```
//! use marginalia::hierarchy::TypeGraph;
//!
//! let mut graph = TypeGraph::new();
//! let base = graph.declare("Base");
//! let derived = graph.declare_under("Derived", base);
//!
//! assert_eq!(graph.parent(derived), Some(base));
//! assert_eq!(graph.parent(base), None);
//! assert_eq!(graph.ancestors(derived), vec![base]);
//! ```

use std::collections::{HashMap, HashSet, VecDeque};

use thiserror::Error;

use crate::types::ClassId;

/// Errors from hierarchy construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HierarchyError {
    /// The child already has a parent recorded.
    #[error("{child} is already linked to a parent")]
    AlreadyLinked {
        /// The class that was being relinked.
        child: ClassId,
    },

    /// Linking would make the graph cyclic.
    #[error("linking {child} under {parent} would create a cycle")]
    CycleDetected {
        /// The class that was being linked.
        child: ClassId,
        /// The proposed parent.
        parent: ClassId,
    },
}

/// Parent lookup capability.
///
/// The registry calls this when a class it has never seen is resolved, to
/// decide which class's annotations to inherit. Returning `None` marks the
/// class as a hierarchy root (it inherits nothing).
pub trait Hierarchy {
    /// Get the direct parent of a class, or `None` for a root.
    fn parent_of(&self, class: ClassId) -> Option<ClassId>;
}

/// A map-backed class hierarchy.
///
/// This is the standard [`Hierarchy`] implementation: classes are declared
/// explicitly, each with at most one parent, and the graph rejects edges that
/// would form a cycle. It also keeps a human-readable label per class for
/// diagnostics; labels carry no identity.
#[derive(Debug, Default)]
pub struct TypeGraph {
    /// Parent pointer for each linked class
    parents: HashMap<ClassId, ClassId>,
    /// Cached children sets (derived from parents)
    children: HashMap<ClassId, HashSet<ClassId>>,
    /// Diagnostic labels
    labels: HashMap<ClassId, String>,
}

impl TypeGraph {
    /// Create an empty hierarchy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a token for a root class.
    pub fn declare(&mut self, label: impl Into<String>) -> ClassId {
        let class = ClassId::next();
        self.labels.insert(class, label.into());
        class
    }

    /// Mint a token for a class that inherits from `parent`.
    ///
    /// A fresh token cannot already be linked or close a cycle, so unlike
    /// [`link`](Self::link) this cannot fail.
    pub fn declare_under(&mut self, label: impl Into<String>, parent: ClassId) -> ClassId {
        let class = self.declare(label);
        self.children.entry(parent).or_default().insert(class);
        self.parents.insert(class, parent);
        class
    }

    /// Record that `child` inherits from `parent`.
    ///
    /// # Errors
    ///
    /// - [`HierarchyError::AlreadyLinked`] if `child` already has a parent
    /// - [`HierarchyError::CycleDetected`] if `parent` is `child` itself or
    ///   one of its descendants
    pub fn link(&mut self, child: ClassId, parent: ClassId) -> Result<(), HierarchyError> {
        if self.parents.contains_key(&child) {
            return Err(HierarchyError::AlreadyLinked { child });
        }

        // An edge closes a cycle iff the proposed parent can already reach
        // the child by walking up.
        if parent == child || self.ancestors(parent).contains(&child) {
            return Err(HierarchyError::CycleDetected { child, parent });
        }

        self.children.entry(parent).or_default().insert(child);
        self.parents.insert(child, parent);
        Ok(())
    }

    /// Get the direct parent of a class.
    pub fn parent(&self, class: ClassId) -> Option<ClassId> {
        self.parents.get(&class).copied()
    }

    /// Get the direct children of a class.
    pub fn children(&self, class: ClassId) -> Option<&HashSet<ClassId>> {
        self.children.get(&class)
    }

    /// Get all ancestors of a class, immediate parent first.
    pub fn ancestors(&self, class: ClassId) -> Vec<ClassId> {
        let mut result = Vec::new();
        let mut current = self.parent(class);

        while let Some(parent) = current {
            result.push(parent);
            current = self.parent(parent);
        }

        result
    }

    /// Get all descendants of a class (children, grandchildren, etc.).
    ///
    /// Uses breadth-first traversal over the children cache.
    pub fn descendants(&self, class: ClassId) -> HashSet<ClassId> {
        let mut result = HashSet::new();
        let mut queue = VecDeque::new();

        if let Some(children) = self.children(class) {
            queue.extend(children.iter().copied());
        }

        while let Some(current) = queue.pop_front() {
            if result.insert(current) {
                if let Some(children) = self.children(current) {
                    queue.extend(children.iter().copied());
                }
            }
        }

        result
    }

    /// Get the diagnostic label of a class, if it was declared here.
    pub fn label(&self, class: ClassId) -> Option<&str> {
        self.labels.get(&class).map(String::as_str)
    }
}

impl Hierarchy for TypeGraph {
    fn parent_of(&self, class: ClassId) -> Option<ClassId> {
        self.parent(class)
    }
}

impl<H: Hierarchy> Hierarchy for &H {
    fn parent_of(&self, class: ClassId) -> Option<ClassId> {
        (**self).parent_of(class)
    }
}
