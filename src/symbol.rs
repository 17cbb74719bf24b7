//! Global string interner. The grounding codebase threads an opaque
//! `Symbol` newtype produced by a shared `intern` function through every
//! stage instead of passing owned `String`s around; this module reproduces
//! that pattern locally instead of depending on an external `mm0_util`
//! crate, since identifiers are compared far more often than they are
//! printed.

use std::cell::RefCell;
use hashbrown::HashMap;

/// An interned identifier. Cheap to copy and compare; two `Symbol`s are
/// equal iff the underlying lexemes are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

struct Interner {
    map: HashMap<Box<str>, u32>,
    strings: Vec<Box<str>>,
}

impl Interner {
    fn new() -> Self { Interner { map: HashMap::new(), strings: Vec::new() } }

    fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&id) = self.map.get(s) {
            return Symbol(id);
        }
        let id = self.strings.len() as u32;
        let boxed: Box<str> = Box::from(s);
        self.strings.push(boxed.clone());
        self.map.insert(boxed, id);
        Symbol(id)
    }

    fn resolve(&self, sym: Symbol) -> &str { &self.strings[sym.0 as usize] }
}

thread_local! {
    static INTERNER: RefCell<Interner> = RefCell::new(Interner::new());
}

/// Intern `s`, returning a stable `Symbol` usable as a hash map key.
#[must_use]
pub fn intern(s: &str) -> Symbol {
    INTERNER.with(|i| i.borrow_mut().intern(s))
}

/// Resolve a `Symbol` back to its original text.
#[must_use]
pub fn resolve(sym: Symbol) -> String {
    INTERNER.with(|i| i.borrow().resolve(sym).to_owned())
}

impl Symbol {
    #[must_use]
    pub fn as_str(self) -> String { resolve(self) }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", resolve(*self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_text_interns_to_same_symbol() {
        let a = intern("foo");
        let b = intern("foo");
        let c = intern("bar");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str(), "foo");
    }
}
