//! The semantic annotator (C4): walks the parser's AST in place, filling
//! in each node's `annotation`/type/offset fields rather than building a
//! second tree. Declarations are processed in two passes per scope —
//! first every name in the scope is registered (so mutually referencing
//! declarations and forward calls within one translation unit resolve),
//! then the scope's bodies are walked with that scope pushed onto the
//! read-only `ScopeChain` used for lookups. Entries use `Rc<RefCell<_>>`
//! (see `symtab::EntryRef`) so individual fields (constant values, frame
//! offsets) can still be mutated through a shared `&SymbolTable` borrow.

mod decl;
mod expr;

use std::fmt;

use crate::ast::TranslationUnit;
use crate::diag::DiagnosticSink;
use crate::options::CompileOptions;
use crate::symbol::Symbol;
use crate::symtab::ScopeChain;
use crate::token::FileLocation;
use crate::types::{Type, TypeError};

#[derive(Debug, Clone)]
pub enum SemaError {
    UndeclaredIdentifier(Symbol),
    Redeclaration(Symbol),
    NotCallable,
    NotAssignable,
    InvalidOperands { op: &'static str },
    CallArityMismatch { expected: usize, found: usize },
    Type(TypeError),
}

impl fmt::Display for SemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemaError::UndeclaredIdentifier(s) => write!(f, "use of undeclared identifier '{s}'"),
            SemaError::Redeclaration(s) => write!(f, "redeclaration of '{s}' in the same scope"),
            SemaError::NotCallable => write!(f, "called object is not a function"),
            SemaError::NotAssignable => write!(f, "left-hand side of assignment is not a modifiable lvalue"),
            SemaError::InvalidOperands { op } => write!(f, "invalid operands to operator '{op}'"),
            SemaError::CallArityMismatch { expected, found } => {
                write!(f, "expected {expected} argument(s), found {found}")
            }
            SemaError::Type(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SemaError {}

impl From<TypeError> for SemaError {
    fn from(e: TypeError) -> Self { SemaError::Type(e) }
}

pub type SemaResult<T> = Result<T, SemaError>;

/// Drives the single annotation pass over one translation unit.
pub struct Annotator<'d> {
    pub(crate) opts: CompileOptions,
    pub(crate) diag: &'d mut dyn DiagnosticSink,
    /// Running byte offset for the function currently being annotated;
    /// reset at the start of each function definition (§4.4, "Function
    /// definition processing"). Locals grow downward from the frame base.
    pub(crate) next_local_offset: i32,
}

impl<'d> Annotator<'d> {
    #[must_use]
    pub fn new(opts: CompileOptions, diag: &'d mut dyn DiagnosticSink) -> Self {
        Annotator { opts, diag, next_local_offset: 0 }
    }

    pub fn annotate_translation_unit<'a>(&mut self, tu: &mut TranslationUnit<'a>) -> SemaResult<()> {
        self.declare_file_scope_names(tu)?;
        let mut chain = ScopeChain::new();
        // SAFETY-free: `tu.scope` is fully populated by the call above and
        // is not mutated again for the remainder of this pass, so an
        // immutable borrow for the body walk below does not alias the
        // population step's `&mut` borrow (which has already ended).
        let file_scope: &crate::symtab::SymbolTable = &tu.scope;
        chain.push(file_scope);
        for decl in tu.decls.iter_mut() {
            self.annotate_external_decl(decl, &mut chain)?;
        }
        chain.pop();
        Ok(())
    }

    /// True if an identifier used in an expression resolves, via the
    /// annotator's own copy of the scope chain, to something other than
    /// an ordinary object or function — used by call-site and assignment
    /// checks that need to reject e.g. assigning to a typedef name.
    pub(crate) fn error_at(&mut self, code: &'static str, message: impl Into<String>, loc: Option<FileLocation>) {
        self.diag.error(code, message, loc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Arena, ExternalDecl, ExprKind};
    use crate::diag::VecSink;
    use crate::parser::{Parser, ParserScopes};
    use crate::token::{ConstantValue, FileLocation, Token, TokenForm, TokenName};

    fn tok(name: TokenName, form: TokenForm, lexeme: &str) -> Token {
        Token { name, form, lexeme: lexeme.into(), constant_value: None, location: FileLocation::new("t.c", 1, 1) }
    }
    fn int_tok(v: i64) -> Token {
        Token { name: TokenName::Constant, form: TokenForm::IntConst, lexeme: v.to_string().into(), constant_value: Some(ConstantValue::Integer(v)), location: FileLocation::new("t.c", 1, 1) }
    }
    fn kw(form: TokenForm, s: &str) -> Token { tok(TokenName::Keyword, form, s) }
    fn id(s: &str) -> Token { tok(TokenName::Identifier, TokenForm::Ident, s) }
    fn p(form: TokenForm, s: &str) -> Token { tok(TokenName::Punctuator, form, s) }
    fn eof() -> Token { Token::eof(FileLocation::new("t.c", 1, 1)) }

    #[test]
    fn annotates_a_trivial_function_returning_a_constant() {
        // int f(void) { return 1 + 2; }
        let tokens = vec![
            kw(TokenForm::Int, "int"), id("f"), p(TokenForm::OpenParen, "("),
            kw(TokenForm::Void, "void"), p(TokenForm::CloseParen, ")"),
            p(TokenForm::OpenBrace, "{"),
            kw(TokenForm::Return, "return"), int_tok(1), p(TokenForm::Plus, "+"), int_tok(2),
            p(TokenForm::Semicolon, ";"),
            p(TokenForm::CloseBrace, "}"),
            eof(),
        ];
        let arena = Arena::new();
        let mut sink = VecSink::new();
        let mut parser = Parser::new(&tokens, &arena, ParserScopes::new(), &mut sink);
        let mut tu = parser.parse_translation_unit().expect("parses");

        let mut sink2 = VecSink::new();
        let mut ann = Annotator::new(CompileOptions::default(), &mut sink2);
        ann.annotate_translation_unit(&mut tu).expect("annotates");

        let ExternalDecl::FunctionDef(fd) = &tu.decls[0] else { panic!("expected a function definition") };
        let crate::ast::StmtKind::Compound { items, .. } = &fd.body.kind else { panic!("expected a compound body") };
        let crate::ast::BlockItem::Stmt(ret_stmt) = &items[0] else { panic!("expected a statement") };
        let crate::ast::StmtKind::Return(Some(expr)) = &ret_stmt.kind else { panic!("expected a return expression") };
        assert!(expr.annotation.constant_evaluation);
        assert_eq!(expr.annotation.constant_val, 3);
        assert!(matches!(expr.kind, ExprKind::Binary(..)));
    }
}
