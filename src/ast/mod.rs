//! The AST and annotated AST (§3). Nodes are allocated out of a per-
//! translation-unit [`bumpalo`] arena rather than individually heap
//! allocated: the whole tree is thrown away in one deallocation once code
//! generation completes, and `bumpalo::boxed::Box` gives us unique,
//! mutable ownership of arena memory so the annotator can fill in
//! `annotation` fields in place during its tree walk — the same node is
//! the "AST node" before annotation and the "annotated AST node" after,
//! rather than two separate tree shapes.
//!
//! Every node still carries a [`ProductionTag`] recording which grammar
//! rule and alternative produced it (§3's `(grammar_name, production_alt)`
//! pair); the tree shape itself is a typed enum per nonterminal rather than
//! a generic `first_child`/`next_sibling` list, since Rust's enum
//! discriminant already *is* that dispatch — carrying both would be
//! redundant busywork, not fidelity.

use bumpalo::boxed::Box as ABox;
use bumpalo::collections::Vec as AVec;
use bumpalo::Bump;

use crate::symbol::Symbol;
use crate::symtab::SymbolTable;
use crate::token::FileLocation;
use crate::types::Type;

/// Owns the bump allocator backing one translation unit's AST.
#[derive(Default)]
pub struct Arena {
    bump: Bump,
}

impl Arena {
    #[must_use]
    pub fn new() -> Self { Arena::default() }

    #[must_use]
    pub fn alloc<T>(&self, value: T) -> AmBox<'_, T> { ABox::new_in(value, &self.bump) }

    #[must_use]
    pub fn vec<T>(&self) -> AVec<'_, T> { AVec::new_in(&self.bump) }
}

/// Shorthand for an arena-owned, uniquely-mutable node reference.
pub type AmBox<'a, T> = ABox<'a, T>;

/// Which grammar rule and alternative produced a node, e.g.
/// `postfix-expression '[' expression ']'` is `(POSTFIX_EXPRESSION,
/// POSTFIX_EXPRESSION_2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductionTag {
    pub grammar_name: &'static str,
    pub alt: u32,
}

impl ProductionTag {
    #[must_use]
    pub const fn new(grammar_name: &'static str, alt: u32) -> Self {
        ProductionTag { grammar_name, alt }
    }
}

/// The five annotations the semantic annotator adds to an expression node.
#[derive(Debug, Clone, Default)]
pub struct ExprAnnotation {
    pub ty: Option<Type>,
    pub symbol: Option<Symbol>,
    pub constant_evaluation: bool,
    pub constant_val: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    BitNot,
    LogicalNot,
    AddressOf,
    Deref,
    PreInc,
    PreDec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOp {
    PostInc,
    PostDec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Mul, Div, Mod,
    Add, Sub,
    Shl, Shr,
    Lt, Gt, Le, Ge,
    Eq, Ne,
    BitAnd, BitXor, BitOr,
    LogicalAnd, LogicalOr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    MulAssign, DivAssign, ModAssign,
    AddAssign, SubAssign,
    ShlAssign, ShrAssign,
    AndAssign, XorAssign, OrAssign,
}

/// An expression node. `kind` holds the production-specific children;
/// `annotation` starts empty and is filled by the semantic annotator.
pub struct Expr<'a> {
    pub kind: ExprKind<'a>,
    pub loc: FileLocation,
    pub tag: ProductionTag,
    pub annotation: ExprAnnotation,
}

impl<'a> Expr<'a> {
    #[must_use]
    pub fn new(kind: ExprKind<'a>, loc: FileLocation, tag: ProductionTag) -> Self {
        Expr { kind, loc, tag, annotation: ExprAnnotation::default() }
    }

    #[must_use]
    pub fn ty(&self) -> Option<&Type> { self.annotation.ty.as_ref() }
}

pub enum ExprKind<'a> {
    IntConst(i64),
    FloatConst(f64),
    CharConst(i64),
    StringLit(Symbol),
    Ident(Symbol),
    Index(AmBox<'a, Expr<'a>>, AmBox<'a, Expr<'a>>),
    Call(AmBox<'a, Expr<'a>>, AVec<'a, Expr<'a>>),
    Member { base: AmBox<'a, Expr<'a>>, field: Symbol, arrow: bool },
    Unary(UnaryOp, AmBox<'a, Expr<'a>>),
    PostOp(PostOp, AmBox<'a, Expr<'a>>),
    /// `sizeof expr`.
    SizeofExpr(AmBox<'a, Expr<'a>>),
    /// `sizeof(type-name)`.
    SizeofType(Type),
    /// `(type-name) expr`.
    Cast(Type, AmBox<'a, Expr<'a>>),
    Binary(BinOp, AmBox<'a, Expr<'a>>, AmBox<'a, Expr<'a>>),
    Conditional(AmBox<'a, Expr<'a>>, AmBox<'a, Expr<'a>>, AmBox<'a, Expr<'a>>),
    Assign(AssignOp, AmBox<'a, Expr<'a>>, AmBox<'a, Expr<'a>>),
    Comma(AmBox<'a, Expr<'a>>, AmBox<'a, Expr<'a>>),
}

// -- declarations --

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageClass {
    None,
    Typedef,
    Extern,
    Static,
    Auto,
    Register,
}

/// The base type and storage class synthesized from a declaration's
/// declaration-specifier list, before any declarator wrapping is applied.
#[derive(Debug, Clone)]
pub struct DeclSpecs {
    pub storage: StorageClass,
    pub base_type: Type,
}

/// A declarator, already reduced to the shape the annotator walks:
/// zero or more pointer layers, then a direct declarator (identifier,
/// possibly wrapped in array or function-parameter suffixes).
pub enum DeclaratorKind<'a> {
    Ident(Symbol),
    Pointer(crate::types::TypeQualifiers, AmBox<'a, Declarator<'a>>),
    Array(AmBox<'a, Declarator<'a>>, Option<AmBox<'a, Expr<'a>>>),
    Function(AmBox<'a, Declarator<'a>>, AVec<'a, ParamDecl<'a>>, bool),
}

pub struct Declarator<'a> {
    pub kind: DeclaratorKind<'a>,
    pub loc: FileLocation,
}

pub struct ParamDecl<'a> {
    pub specs: DeclSpecs,
    pub declarator: Option<AmBox<'a, Declarator<'a>>>,
    pub loc: FileLocation,
}

pub struct InitDeclarator<'a> {
    pub declarator: AmBox<'a, Declarator<'a>>,
    pub initializer: Option<AmBox<'a, Expr<'a>>>,
}

pub struct Declaration<'a> {
    pub specs: DeclSpecs,
    pub declarators: AVec<'a, InitDeclarator<'a>>,
    pub loc: FileLocation,
}

// -- statements --

pub enum StmtKind<'a> {
    Expr(Option<AmBox<'a, Expr<'a>>>),
    Compound { items: AVec<'a, BlockItem<'a>>, scope: SymbolTable },
    If { cond: AmBox<'a, Expr<'a>>, then_branch: AmBox<'a, Stmt<'a>>, else_branch: Option<AmBox<'a, Stmt<'a>>> },
    While { cond: AmBox<'a, Expr<'a>>, body: AmBox<'a, Stmt<'a>> },
    DoWhile { body: AmBox<'a, Stmt<'a>>, cond: AmBox<'a, Expr<'a>> },
    For {
        init: Option<AmBox<'a, ForInit<'a>>>,
        cond: Option<AmBox<'a, Expr<'a>>>,
        step: Option<AmBox<'a, Expr<'a>>>,
        body: AmBox<'a, Stmt<'a>>,
        scope: SymbolTable,
    },
    Return(Option<AmBox<'a, Expr<'a>>>),
    Break,
    Continue,
    Goto(Symbol),
    Labeled(Symbol, AmBox<'a, Stmt<'a>>),
}

pub enum ForInit<'a> {
    Expr(Expr<'a>),
    Decl(Declaration<'a>),
}

pub enum BlockItem<'a> {
    Stmt(Stmt<'a>),
    Decl(Declaration<'a>),
}

pub struct Stmt<'a> {
    pub kind: StmtKind<'a>,
    pub loc: FileLocation,
    pub tag: ProductionTag,
}

// -- external structure --

pub struct FunctionDef<'a> {
    pub specs: DeclSpecs,
    pub declarator: AmBox<'a, Declarator<'a>>,
    pub body: Stmt<'a>, // always a Compound
    pub scope: SymbolTable,
    pub loc: FileLocation,
}

pub enum ExternalDecl<'a> {
    FunctionDef(FunctionDef<'a>),
    Declaration(Declaration<'a>),
}

pub struct TranslationUnit<'a> {
    pub decls: AVec<'a, ExternalDecl<'a>>,
    pub scope: SymbolTable,
}
