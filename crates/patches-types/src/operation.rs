//! The atomic edit type: [`Operation`].
//!
//! Operations are opaque to the core beyond composition and transform, both
//! of which are delegated to the algorithm strategy (`patches-algorithm`).
//! This module only fixes the wire shape and the small set of tags the core
//! must recognise for bookkeeping (e.g. `@txt` for collapsing type-ahead
//! runs); everything else round-trips untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One segment of a path from the document root: either an object key or an
/// array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl Serialize for PathSegment {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            PathSegment::Key(key) => serializer.serialize_str(key),
            PathSegment::Index(index) => serializer.serialize_u64(*index as u64),
        }
    }
}

impl<'de> Deserialize<'de> for PathSegment {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Index(u64),
            Key(String),
        }
        Ok(match Repr::deserialize(deserializer)? {
            Repr::Index(index) => PathSegment::Index(index as usize),
            Repr::Key(key) => PathSegment::Key(key),
        })
    }
}

impl From<&str> for PathSegment {
    fn from(value: &str) -> Self {
        PathSegment::Key(value.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(value: String) -> Self {
        PathSegment::Key(value)
    }
}

impl From<usize> for PathSegment {
    fn from(value: usize) -> Self {
        PathSegment::Index(value)
    }
}

/// A path from the document root, e.g. `["users", 0, "name"]`.
pub type Path = Vec<PathSegment>;

/// Well-known operation tags the core gives special treatment.
///
/// Any other tag is passed through opaquely: it is still composed, rebased,
/// and applied, but only the algorithm strategy interprets it.
pub mod tag {
    pub const ADD: &str = "add";
    pub const REMOVE: &str = "remove";
    pub const REPLACE: &str = "replace";
    pub const MOVE: &str = "move";
    pub const COPY: &str = "copy";
    pub const TEST: &str = "test";
    /// Text splice: an incremental text edit at a path, collapsible across
    /// a same-author typing run.
    pub const TEXT_SPLICE: &str = "@txt";
    /// Numeric increment: adds `value` to the number at `path`.
    pub const INCREMENT: &str = "@inc";
}

/// An atomic edit encoded as a JSON-Patch-style record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// The operation tag, e.g. `"add"`, `"replace"`, `"@txt"`.
    pub op: String,
    /// Path from the document root this operation targets.
    pub path: Path,
    /// Tag-dependent payload (the value to add/replace/increment by, …).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<Value>,
    /// Source path for `move`/`copy` operations.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub from: Option<Path>,
}

impl Operation {
    pub fn new(op: impl Into<String>, path: Path) -> Self {
        Self {
            op: op.into(),
            path,
            value: None,
            from: None,
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_from(mut self, from: Path) -> Self {
        self.from = Some(from);
        self
    }

    pub fn is_tag(&self, tag: &str) -> bool {
        self.op == tag
    }

    /// True if this operation and `other` target the exact same path.
    pub fn same_path(&self, other: &Operation) -> bool {
        self.path == other.path
    }

    /// True if `other`'s path is this operation's path or a descendant of it
    /// (used by the last-writer-wins strategy to decide whether a pending
    /// change's target was also written by an incoming server change).
    pub fn path_intersects(&self, other: &Operation) -> bool {
        let (shorter, longer) = if self.path.len() <= other.path.len() {
            (&self.path, &other.path)
        } else {
            (&other.path, &self.path)
        };
        shorter.iter().zip(longer.iter()).all(|(a, b)| a == b)
    }
}
