//! The lexically scoped symbol table (C2). A `SymbolTable` is a chained
//! hash table: the lexeme is hashed modulo a prime bucket count, and
//! collisions are resolved by a singly linked chain appended at the tail,
//! not by reprobing. This is deliberately a hand-rolled bucket array rather
//! than `HashMap` — the spec calls out the chaining discipline as
//! observable behavior (`entries()` iterates bucket order, not insertion
//! order), which a generic map would not reproduce.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::symbol::Symbol;
use crate::types::Type;

/// Number of buckets in every `SymbolTable`. Prime, per §4.2, to spread
/// hash collisions across the chain array.
const BUCKET_COUNT: u64 = 211;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierType {
    Object,
    Function,
    TypedefName,
    EnumConstant,
    Label,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    File,
    Function,
    Block,
    Prototype,
}

/// One symbol-table entry. Fields that only apply to a subset of
/// `identifier_type`s are `Option`; see §3's field table.
#[derive(Debug, Clone)]
pub struct Entry {
    pub symbol: Symbol,
    pub identifier_type: IdentifierType,
    pub ty: Type,
    pub is_literal: bool,
    pub value: Option<i64>,
    pub base_pointer_offset: Option<i32>,
    pub function_ptr: Option<EntryRef>,
    pub function_frame_size: Option<u32>,
    pub number_formal_parameters: Option<u32>,
    pub scope: Scope,
    pub literal_constant_ptr_label: Option<String>,
}

impl Entry {
    /// A zero-initialized entry for `symbol`, as installed by `add`.
    fn new(symbol: Symbol, scope: Scope) -> Self {
        Entry {
            symbol,
            identifier_type: IdentifierType::Object,
            ty: Type::basic(crate::types::BasicKind::Int),
            is_literal: false,
            value: None,
            base_pointer_offset: None,
            function_ptr: None,
            function_frame_size: None,
            number_formal_parameters: None,
            scope,
            literal_constant_ptr_label: None,
        }
    }
}

/// A shared, interior-mutable handle to an `Entry`. Offsets and frame sizes
/// are filled in after the entry is created (see §4.4's "Function
/// definition" rule), and locals/parameters back-link to their enclosing
/// function's entry, so entries need shared mutable identity rather than
/// plain ownership.
#[derive(Debug, Clone)]
pub struct EntryRef(Rc<RefCell<Entry>>);

impl EntryRef {
    #[must_use]
    pub fn borrow(&self) -> std::cell::Ref<'_, Entry> { self.0.borrow() }

    #[must_use]
    pub fn borrow_mut(&self) -> std::cell::RefMut<'_, Entry> { self.0.borrow_mut() }

    #[must_use]
    pub fn ptr_eq(&self, other: &EntryRef) -> bool { Rc::ptr_eq(&self.0, &other.0) }
}

impl PartialEq for EntryRef {
    fn eq(&self, other: &Self) -> bool { self.ptr_eq(other) }
}
impl Eq for EntryRef {}

struct Node {
    symbol: Symbol,
    entry: EntryRef,
    next: Option<Box<Node>>,
}

/// A single scope's symbol table: file, function, block, or prototype.
pub struct SymbolTable {
    buckets: Vec<Option<Box<Node>>>,
    scope: Scope,
    len: usize,
}

fn hash_symbol(sym: Symbol) -> u64 {
    // FNV-1a over the resolved lexeme; cheap and stable across a run.
    let s = sym.as_str();
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for b in s.bytes() {
        h ^= u64::from(b);
        h = h.wrapping_mul(0x0000_0100_0000_01b3);
    }
    h
}

impl SymbolTable {
    #[must_use]
    pub fn new(scope: Scope) -> Self {
        let mut buckets = Vec::with_capacity(BUCKET_COUNT as usize);
        buckets.resize_with(BUCKET_COUNT as usize, || None);
        SymbolTable { buckets, scope, len: 0 }
    }

    #[must_use]
    pub fn scope(&self) -> Scope { self.scope }

    #[must_use]
    pub fn len(&self) -> usize { self.len }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.len == 0 }

    fn bucket_index(sym: Symbol) -> usize {
        (hash_symbol(sym) % BUCKET_COUNT) as usize
    }

    /// Look up `name` in this table only (no scope-chain walk — see
    /// `ScopeChain::lookup` for that).
    #[must_use]
    pub fn get(&self, name: Symbol) -> Option<EntryRef> {
        let mut cur = self.buckets[Self::bucket_index(name)].as_deref();
        while let Some(node) = cur {
            if node.symbol == name {
                return Some(node.entry.clone());
            }
            cur = node.next.as_deref();
        }
        None
    }

    /// Insert a zero-initialized entry for `name`. If the bucket already
    /// has a chain, the new node becomes the chain tail (append, not
    /// prepend — so `entries()` within a bucket preserves insertion order).
    pub fn add(&mut self, name: Symbol) -> EntryRef {
        let entry = EntryRef(Rc::new(RefCell::new(Entry::new(name, self.scope))));
        let idx = Self::bucket_index(name);
        let new_node = Box::new(Node { symbol: name, entry: entry.clone(), next: None });
        match &mut self.buckets[idx] {
            slot @ None => *slot = Some(new_node),
            Some(head) => {
                let mut cur = head.as_mut();
                while cur.next.is_some() {
                    cur = cur.next.as_mut().unwrap();
                }
                cur.next = Some(new_node);
            }
        }
        self.len += 1;
        entry
    }

    /// Iterate all entries. Order follows bucket index then chain order,
    /// which is *not* insertion order across buckets — callers must not
    /// depend on a particular global order.
    pub fn entries(&self) -> impl Iterator<Item = EntryRef> + '_ {
        self.buckets.iter().flatten().flat_map(|head| {
            let mut v = Vec::new();
            let mut cur = Some(head.as_ref());
            while let Some(node) = cur {
                v.push(node.entry.clone());
                cur = node.next.as_deref();
            }
            v.into_iter()
        })
    }
}

impl fmt::Display for SymbolTable {
    /// A fixed-width table for diagnostics, one row per entry.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<20}{:<14}{:<10}{}", "symbol", "kind", "scope", "type")?;
        for e in self.entries() {
            let e = e.borrow();
            writeln!(
                f,
                "{:<20}{:<14}{:<10}{:?}",
                e.symbol.as_str(),
                format!("{:?}", e.identifier_type),
                format!("{:?}", e.scope),
                e.ty.kind,
            )?;
        }
        Ok(())
    }
}

/// The ordered sequence of symbol tables from a node outward to the
/// translation-unit root (§"Scope chain" in the glossary). The annotator
/// pushes a table when it installs a new scope and pops it on the way back
/// up; the parser borrows a read-only view of the same stack for typedef
/// disambiguation.
pub struct ScopeChain<'a> {
    stack: Vec<&'a SymbolTable>,
}

impl<'a> ScopeChain<'a> {
    #[must_use]
    pub fn new() -> Self { ScopeChain { stack: Vec::new() } }

    pub fn push(&mut self, table: &'a SymbolTable) { self.stack.push(table); }

    pub fn pop(&mut self) { self.stack.pop(); }

    #[must_use]
    pub fn innermost(&self) -> Option<&'a SymbolTable> { self.stack.last().copied() }

    /// Walk from the innermost scope toward the root, returning the first
    /// table that binds `name`.
    #[must_use]
    pub fn lookup(&self, name: Symbol) -> Option<(&'a SymbolTable, EntryRef)> {
        for &table in self.stack.iter().rev() {
            if let Some(entry) = table.get(name) {
                return Some((table, entry));
            }
        }
        None
    }

    /// True iff `name` is bound to a typedef-name entry in some enclosing
    /// scope — the predicate the parser needs for declaration-specifier
    /// disambiguation (§4.3).
    #[must_use]
    pub fn is_typedef_name(&self, name: Symbol) -> bool {
        matches!(
            self.lookup(name),
            Some((_, entry)) if entry.borrow().identifier_type == IdentifierType::TypedefName
        )
    }
}

impl Default for ScopeChain<'_> {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::intern;

    #[test]
    fn add_then_get_roundtrips() {
        let mut table = SymbolTable::new(Scope::File);
        let x = intern("x");
        let entry = table.add(x);
        entry.borrow_mut().identifier_type = IdentifierType::Object;
        let found = table.get(x).expect("entry present");
        assert!(found.ptr_eq(&entry));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn collisions_chain_in_insertion_order() {
        let mut table = SymbolTable::new(Scope::File);
        // Hunt a handful of names; whichever collide, `entries()` within a
        // bucket must preserve the order they were added in.
        let names: Vec<_> = (0..64).map(|i| intern(&format!("sym{i}"))).collect();
        for &n in &names {
            table.add(n);
        }
        assert_eq!(table.len(), 64);
        for &n in &names {
            assert!(table.get(n).is_some());
        }
    }

    #[test]
    fn scope_chain_honors_shadowing() {
        let mut outer = SymbolTable::new(Scope::File);
        let mut inner = SymbolTable::new(Scope::Block);
        let x = intern("x");
        let outer_entry = outer.add(x);
        outer_entry.borrow_mut().ty = Type::basic(crate::types::BasicKind::Int);
        let inner_entry = inner.add(x);
        inner_entry.borrow_mut().ty = Type::basic(crate::types::BasicKind::Char);

        let mut chain = ScopeChain::new();
        chain.push(&outer);
        let (_, found) = chain.lookup(x).unwrap();
        assert!(found.ptr_eq(&outer_entry));

        chain.push(&inner);
        let (_, found) = chain.lookup(x).unwrap();
        assert!(found.ptr_eq(&inner_entry));

        chain.pop();
        let (_, found) = chain.lookup(x).unwrap();
        assert!(found.ptr_eq(&outer_entry));
    }

    #[test]
    fn typedef_name_predicate() {
        let mut table = SymbolTable::new(Scope::File);
        let i = intern("I");
        let e = table.add(i);
        e.borrow_mut().identifier_type = IdentifierType::TypedefName;
        let mut chain = ScopeChain::new();
        chain.push(&table);
        assert!(chain.is_typedef_name(i));
        assert!(!chain.is_typedef_name(intern("not_a_typedef")));
    }
}
