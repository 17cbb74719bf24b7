//! The C type model (C1). A `Type` is a small owned tree: pointer types own
//! their pointee, function types own their parameter list, aggregate types
//! own their member list. Two types are equivalent iff their variant,
//! qualifiers, and recursive components match (`PartialEq`). There is no
//! interning here (see `DESIGN.md` for why) — every type produced by the
//! annotator is freshly owned by the node it annotates.

use bitflags::bitflags;

use crate::options::CompileOptions;
use crate::symbol::Symbol;

bitflags! {
    /// `const`/`volatile`/`restrict`. The closed set of combinations is 8.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TypeQualifiers: u8 {
        const CONST    = 0b001;
        const VOLATILE = 0b010;
        const RESTRICT = 0b100;
    }
}

/// Basic (non-derived, non-aggregate) C types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    Void,
    Bool,
    Char,
    SignedChar,
    UnsignedChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Float,
    Double,
    LongDouble,
    Complex,
}

impl BasicKind {
    /// Byte size on the reference target. `Int`/`Long`/pointer-adjacent
    /// sizes are target-parameterized via `CompileOptions`; every other
    /// basic kind has a fixed size under the target's data model.
    #[must_use]
    pub fn size(self, opts: &CompileOptions) -> u32 {
        match self {
            BasicKind::Void => 0,
            BasicKind::Bool | BasicKind::Char | BasicKind::SignedChar | BasicKind::UnsignedChar => 1,
            BasicKind::Short | BasicKind::UnsignedShort => 2,
            BasicKind::Int | BasicKind::UnsignedInt => opts.int_size,
            BasicKind::Long | BasicKind::UnsignedLong => opts.long_size,
            BasicKind::LongLong | BasicKind::UnsignedLongLong => 8,
            BasicKind::Float => 4,
            BasicKind::Double => 8,
            BasicKind::LongDouble => 16,
            BasicKind::Complex => 16,
        }
    }

    #[must_use]
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            BasicKind::Char
                | BasicKind::SignedChar
                | BasicKind::Short
                | BasicKind::Int
                | BasicKind::Long
                | BasicKind::LongLong
        )
    }

    #[must_use]
    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            BasicKind::UnsignedChar
                | BasicKind::UnsignedShort
                | BasicKind::UnsignedInt
                | BasicKind::UnsignedLong
                | BasicKind::UnsignedLongLong
                | BasicKind::Bool
        )
    }

    #[must_use]
    pub fn is_floating(self) -> bool {
        matches!(self, BasicKind::Float | BasicKind::Double | BasicKind::LongDouble | BasicKind::Complex)
    }

    #[must_use]
    pub fn is_integer(self) -> bool {
        !self.is_floating() && !matches!(self, BasicKind::Void)
    }
}

/// A struct or union member: name, type, and byte offset from the start of
/// the aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub name: Symbol,
    pub ty: Box<Type>,
    pub offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    Struct,
    Union,
}

/// One formal parameter of a function type: an optional name (parameters
/// may be unnamed in a prototype) plus its type.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Option<Symbol>,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Basic(BasicKind),
    Pointer(Box<Type>),
    Array { element: Box<Type>, count: Option<u64> },
    Function { ret: Box<Type>, params: Vec<Param>, variadic: bool },
    Aggregate { kind: AggregateKind, tag: Option<Symbol>, members: Vec<Member>, size: Option<u32> },
    Enum { tag: Option<Symbol>, enumerators: Vec<Symbol> },
    /// A reference to a typedef name, resolved through the symbol table.
    /// The annotator replaces these with the underlying type as soon as
    /// the typedef entry is looked up; this variant only appears
    /// transiently during declaration-specifier synthesis.
    TypedefName(Symbol),
}

/// A fully qualified C type: a `TypeKind` plus its qualifier set.
#[derive(Debug, Clone, PartialEq)]
pub struct Type {
    pub kind: TypeKind,
    pub quals: TypeQualifiers,
}

/// Failure from a structural accessor whose precondition does not hold
/// (e.g. dereferencing a non-pointer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeError {
    NotAPointer,
    NotAnArray,
    NotAFunction,
    IncompleteType,
}

impl std::fmt::Display for TypeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeError::NotAPointer => write!(f, "type is not a pointer type"),
            TypeError::NotAnArray => write!(f, "type is not an array type"),
            TypeError::NotAFunction => write!(f, "type is not a function type"),
            TypeError::IncompleteType => write!(f, "type is incomplete"),
        }
    }
}

impl std::error::Error for TypeError {}

pub type TypeResult<T> = Result<T, TypeError>;

impl Type {
    #[must_use]
    pub fn basic(kind: BasicKind) -> Self {
        Type { kind: TypeKind::Basic(kind), quals: TypeQualifiers::empty() }
    }

    #[must_use]
    pub fn pointer_to(pointee: Type) -> Self {
        Type { kind: TypeKind::Pointer(Box::new(pointee)), quals: TypeQualifiers::empty() }
    }

    #[must_use]
    pub fn array_of(element: Type, count: Option<u64>) -> Self {
        Type { kind: TypeKind::Array { element: Box::new(element), count }, quals: TypeQualifiers::empty() }
    }

    #[must_use]
    pub fn function_of(ret: Type, params: Vec<Param>, variadic: bool) -> Self {
        Type { kind: TypeKind::Function { ret: Box::new(ret), params, variadic }, quals: TypeQualifiers::empty() }
    }

    /// Apply `quals` on top of whatever qualifiers this type already
    /// carries (declaration specifiers may list `const` more than once,
    /// or a typedef may already be qualified).
    #[must_use]
    pub fn qualify(mut self, quals: TypeQualifiers) -> Self {
        self.quals |= quals;
        self
    }

    /// Deep copy, preserving qualifiers and ownership. `Type` is plain
    /// `Clone`, so this is just documentation of intent at call sites that
    /// mirror the grounding codebase's explicit `duplicate_type` step.
    #[must_use]
    pub fn duplicate(&self) -> Self { self.clone() }

    /// # Errors
    /// Returns `TypeError::NotAPointer` if `self` is not a pointer type.
    pub fn dereference(&self) -> TypeResult<&Type> {
        match &self.kind {
            TypeKind::Pointer(pointee) => Ok(pointee),
            _ => Err(TypeError::NotAPointer),
        }
    }

    /// # Errors
    /// Returns `TypeError::NotAnArray` if `self` is not an array type.
    pub fn element_type(&self) -> TypeResult<&Type> {
        match &self.kind {
            TypeKind::Array { element, .. } => Ok(element),
            _ => Err(TypeError::NotAnArray),
        }
    }

    /// # Errors
    /// Returns `TypeError::NotAFunction` if `self` is not a function type.
    pub fn return_type(&self) -> TypeResult<&Type> {
        match &self.kind {
            TypeKind::Function { ret, .. } => Ok(ret),
            _ => Err(TypeError::NotAFunction),
        }
    }

    /// # Errors
    /// Returns `TypeError::NotAFunction` if `self` is not a function type.
    pub fn parameters(&self) -> TypeResult<&[Param]> {
        match &self.kind {
            TypeKind::Function { params, .. } => Ok(params),
            _ => Err(TypeError::NotAFunction),
        }
    }

    #[must_use]
    pub fn is_variadic(&self) -> bool {
        matches!(&self.kind, TypeKind::Function { variadic: true, .. })
    }

    /// Two types are equivalent iff their variant, qualifiers, and
    /// recursive components match.
    #[must_use]
    pub fn equivalent(&self, other: &Type) -> bool { self == other }

    /// Walks the structure, summing members; pointers are target-word-sized;
    /// arrays are `element_size × count`.
    ///
    /// # Errors
    /// Returns `TypeError::IncompleteType` for `void`, an array with no
    /// known count, or a function type.
    pub fn sizeof(&self, opts: &CompileOptions) -> TypeResult<u32> {
        match &self.kind {
            TypeKind::Basic(BasicKind::Void) => Err(TypeError::IncompleteType),
            TypeKind::Basic(b) => Ok(b.size(opts)),
            TypeKind::Pointer(_) => Ok(opts.pointer_size),
            TypeKind::Array { element, count: Some(n) } => {
                let elem = element.sizeof(opts)?;
                Ok(elem * u32::try_from(*n).unwrap_or(u32::MAX))
            }
            TypeKind::Array { count: None, .. } => Err(TypeError::IncompleteType),
            TypeKind::Function { .. } => Err(TypeError::IncompleteType),
            TypeKind::Aggregate { size: Some(sz), .. } => Ok(*sz),
            TypeKind::Aggregate { size: None, .. } => Err(TypeError::IncompleteType),
            TypeKind::Enum { .. } => Ok(opts.int_size),
            TypeKind::TypedefName(_) => Err(TypeError::IncompleteType),
        }
    }

    // -- classification predicates (total: false when inapplicable) --

    #[must_use]
    pub fn is_integer(&self) -> bool {
        matches!(&self.kind, TypeKind::Basic(b) if b.is_integer()) || matches!(&self.kind, TypeKind::Enum { .. })
    }

    #[must_use]
    pub fn is_signed_integer(&self) -> bool {
        matches!(&self.kind, TypeKind::Basic(b) if b.is_signed())
    }

    #[must_use]
    pub fn is_unsigned_integer(&self) -> bool {
        matches!(&self.kind, TypeKind::Basic(b) if b.is_unsigned())
    }

    #[must_use]
    pub fn is_real_floating(&self) -> bool {
        matches!(&self.kind, TypeKind::Basic(b) if b.is_floating())
    }

    #[must_use]
    pub fn is_arithmetic(&self) -> bool { self.is_integer() || self.is_real_floating() }

    #[must_use]
    pub fn is_scalar(&self) -> bool { self.is_arithmetic() || self.is_pointer() }

    #[must_use]
    pub fn is_object(&self) -> bool { !self.is_function() && !self.is_void() }

    #[must_use]
    pub fn is_function(&self) -> bool { matches!(&self.kind, TypeKind::Function { .. }) }

    #[must_use]
    pub fn is_array(&self) -> bool { matches!(&self.kind, TypeKind::Array { .. }) }

    #[must_use]
    pub fn is_pointer(&self) -> bool { matches!(&self.kind, TypeKind::Pointer(_)) }

    #[must_use]
    pub fn is_void(&self) -> bool { matches!(&self.kind, TypeKind::Basic(BasicKind::Void)) }

    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        match &self.kind {
            TypeKind::Basic(BasicKind::Void) => true,
            TypeKind::Array { count: None, .. } => true,
            TypeKind::Aggregate { size: None, .. } => true,
            _ => false,
        }
    }

    /// An lvalue designates an object, not a function or value; this
    /// predicate is about the type's object-ness since this model does not
    /// carry value-category on `Type` itself (that lives on the annotated
    /// expression node, see `ast::AnnotatedNode`).
    #[must_use]
    pub fn is_lvalue(&self) -> bool { self.is_object() }

    #[must_use]
    pub fn is_modifiable_lvalue(&self) -> bool {
        self.is_lvalue() && !self.quals.contains(TypeQualifiers::CONST) && !self.is_array() && !self.is_incomplete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> CompileOptions { CompileOptions::default() }

    #[test]
    fn pointer_is_target_word_sized() {
        let p = Type::pointer_to(Type::basic(BasicKind::Int));
        assert_eq!(p.sizeof(&opts()).unwrap(), 8);
        assert!(p.is_pointer());
        assert!(p.is_scalar());
        assert!(!p.is_arithmetic());
    }

    #[test]
    fn array_size_multiplies_element_by_count() {
        let a = Type::array_of(Type::basic(BasicKind::Int), Some(4));
        assert_eq!(a.sizeof(&opts()).unwrap(), 16);
    }

    #[test]
    fn incomplete_array_has_no_size() {
        let a = Type::array_of(Type::basic(BasicKind::Int), None);
        assert_eq!(a.sizeof(&opts()), Err(TypeError::IncompleteType));
        assert!(a.is_incomplete());
    }

    #[test]
    fn equivalence_is_structural() {
        let a = Type::pointer_to(Type::basic(BasicKind::Int));
        let b = Type::pointer_to(Type::basic(BasicKind::Int));
        let c = Type::pointer_to(Type::basic(BasicKind::Char));
        assert!(a.equivalent(&b));
        assert!(!a.equivalent(&c));
    }

    #[test]
    fn qualifiers_are_a_closed_set_of_eight() {
        use itertools::Itertools;
        let all = [TypeQualifiers::CONST, TypeQualifiers::VOLATILE, TypeQualifiers::RESTRICT];
        let combos: std::collections::HashSet<_> = (0..=3)
            .flat_map(|k| all.iter().copied().combinations(k))
            .map(|combo| combo.into_iter().fold(TypeQualifiers::empty(), |a, b| a | b))
            .collect();
        assert_eq!(combos.len(), 8);
    }

    #[test]
    fn dereference_fails_on_non_pointer() {
        let t = Type::basic(BasicKind::Int);
        assert_eq!(t.dereference().unwrap_err(), TypeError::NotAPointer);
    }

    #[test]
    fn const_qualified_is_not_modifiable() {
        let t = Type::basic(BasicKind::Int).qualify(TypeQualifiers::CONST);
        assert!(!t.is_modifiable_lvalue());
    }
}
