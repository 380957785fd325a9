//! Id-paths: the identity of a mounted instance.
//!
//! One id-path is at the same time the DOM element id, the key under which
//! event listeners are filed, and the identity used to match old and new
//! children during reconciliation. It is stored as a list of segments with a
//! cached string form (`.top.header.button`) for DOM interop.

use core::{cmp::Ordering, fmt, hash::Hash};
use std::rc::Rc;

use crate::{Error, Result};

/// Separator between id-path segments.
pub const SEPARATOR: char = '.';

/// A structured, immutable position in the mount tree.
///
/// Ordering compares segment by segment, so every subtree forms one
/// contiguous range in an ordered map keyed by `IdPath`.
#[derive(Clone)]
pub struct IdPath {
    segments: Rc<[Box<str>]>,
    joined: Rc<str>,
}

impl IdPath {
    /// Creates a root id-path with a single segment.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty or contains the separator.
    #[must_use]
    pub fn root(name: &str) -> Self {
        assert_segment(name);
        Self::from_segments(vec![Box::from(name)])
    }

    /// Fallible form of [`IdPath::root`] for names that come from outside.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidKey`] if `name` is empty or contains the separator.
    pub fn try_root(name: &str) -> Result<Self> {
        check_segment(name)?;
        Ok(Self::from_segments(vec![Box::from(name)]))
    }

    /// Parses the string form used as a DOM id. Returns `None` for ids that
    /// were not produced by an id-path.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let rest = raw.strip_prefix(SEPARATOR)?;
        let segments: Vec<Box<str>> = rest.split(SEPARATOR).map(Box::from).collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return None;
        }
        Some(Self::from_segments(segments))
    }

    fn from_segments(segments: Vec<Box<str>>) -> Self {
        let mut joined = String::with_capacity(segments.iter().map(|s| s.len() + 1).sum());
        for segment in &segments {
            joined.push(SEPARATOR);
            joined.push_str(segment);
        }
        Self {
            segments: segments.into(),
            joined: joined.into(),
        }
    }

    /// Returns the id-path of the named child `key`.
    ///
    /// # Panics
    ///
    /// Panics if `key` is empty or contains the separator.
    #[must_use]
    pub fn child(&self, key: &str) -> Self {
        assert_segment(key);
        self.push(key)
    }

    /// Fallible form of [`IdPath::child`], used for keys supplied by
    /// components.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidKey`] if `key` is empty or contains the separator.
    pub fn try_child(&self, key: &str) -> Result<Self> {
        check_segment(key)?;
        Ok(self.push(key))
    }

    fn push(&self, key: &str) -> Self {
        let mut segments = self.segments.to_vec();
        segments.push(Box::from(key));
        Self::from_segments(segments)
    }

    /// Returns the id-path of the ordered child at `index`.
    #[must_use]
    pub fn child_index(&self, index: usize) -> Self {
        self.child(&index.to_string())
    }

    /// Returns the parent id-path, or `None` for a root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        (self.depth() > 1).then(|| self.prefix(self.depth() - 1))
    }

    fn prefix(&self, len: usize) -> Self {
        Self::from_segments(self.segments[..len].to_vec())
    }

    /// Number of segments.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Iterates over the segments, outermost first.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(AsRef::as_ref)
    }

    /// Returns the innermost segment.
    #[must_use]
    pub fn last(&self) -> &str {
        self.segments.last().map_or("", AsRef::as_ref)
    }

    /// Returns `true` if `self` lies strictly below `other`.
    #[must_use]
    pub fn is_descendant_of(&self, other: &Self) -> bool {
        self.depth() > other.depth() && self.segments.starts_with(&other.segments)
    }

    /// Returns `true` if `self` equals `other` or lies below it.
    #[must_use]
    pub fn is_within(&self, other: &Self) -> bool {
        self == other || self.is_descendant_of(other)
    }

    /// Iterates from `self` up to its root, innermost first.
    pub fn ancestors(&self) -> impl Iterator<Item = Self> + '_ {
        (1..=self.depth()).rev().map(|len| self.prefix(len))
    }

    /// Returns the deepest id-path that both `self` and `other` lie within.
    #[must_use]
    pub fn common_ancestor(&self, other: &Self) -> Option<Self> {
        let shared = self
            .segments
            .iter()
            .zip(other.segments.iter())
            .take_while(|(a, b)| a == b)
            .count();
        (shared > 0).then(|| self.prefix(shared))
    }

    /// The string form used as DOM id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.joined
    }
}

fn is_segment(segment: &str) -> bool {
    !segment.is_empty() && !segment.contains(SEPARATOR)
}

fn check_segment(segment: &str) -> Result<()> {
    if is_segment(segment) {
        Ok(())
    } else {
        Err(Error::InvalidKey(segment.to_owned()))
    }
}

fn assert_segment(segment: &str) {
    assert!(
        is_segment(segment),
        "id-path segment `{segment}` must be non-empty and must not contain `{SEPARATOR}`"
    );
}

impl PartialEq for IdPath {
    fn eq(&self, other: &Self) -> bool {
        self.joined == other.joined
    }
}

impl Eq for IdPath {}

impl Hash for IdPath {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.joined.hash(state);
    }
}

impl PartialOrd for IdPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IdPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.segments.iter().cmp(other.segments.iter())
    }
}

impl fmt::Display for IdPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined)
    }
}

impl fmt::Debug for IdPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdPath({})", self.joined)
    }
}

impl AsRef<str> for IdPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
