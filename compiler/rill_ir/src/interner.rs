//! String interner for identifier and literal storage.
//!
//! Interning assigns each distinct byte sequence a stable [`Name`] on first
//! mention. Lookup and equality are O(1). The table is shared across all
//! phases of one evaluation context (a REPL session reuses one table for
//! every line), so it lives behind a lock and an `Arc`.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::Name;

/// Error when interning a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternError {
    /// Table exceeded capacity (over 4 billion strings).
    Overflow { count: usize },
}

impl std::fmt::Display for InternError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InternError::Overflow { count } => write!(
                f,
                "interner exceeded capacity: {count} strings, max is {}",
                u32::MAX
            ),
        }
    }
}

impl std::error::Error for InternError {}

/// Interner storage behind the lock.
struct Inner {
    /// Map from string content to index.
    map: FxHashMap<&'static str, u32>,
    /// Storage for string contents, indexed by `Name`.
    strings: Vec<&'static str>,
}

impl Inner {
    fn with_empty() -> Self {
        // Pre-intern the empty string at index 0 so `Name::EMPTY` resolves.
        let empty: &'static str = "";
        let mut map = FxHashMap::default();
        map.insert(empty, 0);
        Inner {
            map,
            strings: vec![empty],
        }
    }
}

/// String interner with O(1) lookup and interned-index equality.
///
/// Interned strings are leaked into `'static` storage; the table is
/// module-scoped and lives for the whole session, so the leak is bounded
/// by the set of distinct names the session ever mentions.
pub struct StringInterner {
    inner: RwLock<Inner>,
}

/// Interner handle shared across REPL lines and pipeline phases.
pub type SharedInterner = Arc<StringInterner>;

impl StringInterner {
    /// Create a new interner with the empty string pre-interned.
    pub fn new() -> Self {
        StringInterner {
            inner: RwLock::new(Inner::with_empty()),
        }
    }

    /// Intern a string, returning its `Name`.
    ///
    /// Returns the existing `Name` if the string was interned before.
    pub fn intern(&self, s: &str) -> Name {
        // Fast path: already interned, read lock only.
        if let Some(&idx) = self.inner.read().map.get(s) {
            return Name::from_raw(idx);
        }

        let mut inner = self.inner.write();
        // Re-check under the write lock: another caller may have won the race.
        if let Some(&idx) = inner.map.get(s) {
            return Name::from_raw(idx);
        }

        let idx = u32::try_from(inner.strings.len()).unwrap_or_else(|_| {
            // 4 billion distinct names exceeds any real module; treat as
            // an invariant violation rather than threading a Result through
            // every phase.
            panic!("{}", InternError::Overflow {
                count: inner.strings.len()
            })
        });
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        inner.map.insert(leaked, idx);
        inner.strings.push(leaked);
        Name::from_raw(idx)
    }

    /// Resolve a `Name` back to its string.
    ///
    /// Returns the empty string for indices that were never interned,
    /// which cannot happen for `Name`s produced by this table.
    pub fn lookup(&self, name: Name) -> &'static str {
        self.inner
            .read()
            .strings
            .get(name.index())
            .copied()
            .unwrap_or("")
    }

    /// Number of interned strings (including the pre-interned empty string).
    pub fn len(&self) -> usize {
        self.inner.read().strings.len()
    }

    /// Returns `true` if only the empty string is interned.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn intern_is_idempotent() {
        let interner = StringInterner::new();
        let a = interner.intern("foo");
        let b = interner.intern("foo");
        assert_eq!(a, b);
        assert_eq!(interner.lookup(a), "foo");
    }

    #[test]
    fn distinct_strings_get_distinct_names() {
        let interner = StringInterner::new();
        let a = interner.intern("foo");
        let b = interner.intern("bar");
        assert_ne!(a, b);
        assert_eq!(interner.lookup(a), "foo");
        assert_eq!(interner.lookup(b), "bar");
    }

    #[test]
    fn empty_string_is_pre_interned() {
        let interner = StringInterner::new();
        assert_eq!(interner.intern(""), Name::EMPTY);
        assert_eq!(interner.lookup(Name::EMPTY), "");
        assert!(interner.is_empty());
    }
}
