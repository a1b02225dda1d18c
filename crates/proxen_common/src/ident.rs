//! Interned identifiers for container symbol tables.

use lasso::ThreadedRodeo;

/// An interned name inside one container's symbol table.
///
/// Identifiers are `u32` indices into the interner that produced them, so
/// equality and cloning are O(1). They are only meaningful relative to that
/// interner and are never persisted; images store resolved strings.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Ident(u32);

// SAFETY: `Ident` wraps a `u32` which is always a valid `usize` on 32-bit and
// 64-bit platforms. `try_from_usize` rejects values that don't fit in `u32`.
unsafe impl lasso::Key for Ident {
    fn into_usize(self) -> usize {
        self.0 as usize
    }

    fn try_from_usize(int: usize) -> Option<Self> {
        u32::try_from(int).ok().map(Ident)
    }
}

/// Thread-safe string interner backed by [`lasso::ThreadedRodeo`].
///
/// Each generation container owns one, holding the names of the
/// implementations it defines.
pub struct Interner {
    rodeo: ThreadedRodeo<Ident>,
}

impl Interner {
    /// Creates a new empty interner.
    pub fn new() -> Self {
        Self {
            rodeo: ThreadedRodeo::new(),
        }
    }

    /// Interns a string, returning its [`Ident`]. If the string was already
    /// interned, returns the existing identifier without allocating.
    pub fn get_or_intern(&self, s: &str) -> Ident {
        self.rodeo.get_or_intern(s)
    }

    /// Returns the identifier for `s` if it has been interned.
    pub fn get(&self, s: &str) -> Option<Ident> {
        self.rodeo.get(s)
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}
