//! Literal pool assignment (§4.5, "Literal pool"). The source describes
//! this as a walk over the *file-scope symbol table*, but by the time
//! expressions are annotated the file scope is already pushed immutably
//! onto the `ScopeChain` and can no longer take new entries. This walks the
//! already-annotated AST directly instead, keyed by each floating
//! constant's bit pattern (so two equal literals share one label) — a
//! deliberate deviation from the symbol-table-walk wording, not an
//! oversight.

use std::collections::HashMap;

use crate::ast::{BlockItem, Declaration, Expr, ExprKind, ExternalDecl, ForInit, Stmt, StmtKind, TranslationUnit};
use crate::symbol::Symbol;

use super::arch::{Instruction, Mnemonic, Operand};

#[derive(Default)]
pub struct LiteralPool {
    floats: HashMap<u64, String>,
    strings: HashMap<Symbol, String>,
    directives: Vec<Instruction>,
}

impl LiteralPool {
    #[must_use]
    pub fn float_label(&self, value: f64) -> Option<&str> {
        self.floats.get(&value.to_bits()).map(String::as_str)
    }

    #[must_use]
    pub fn string_label(&self, sym: Symbol) -> Option<&str> {
        self.strings.get(&sym).map(String::as_str)
    }

    #[must_use]
    pub fn emit_directives(&self) -> Vec<Instruction> {
        self.directives.clone()
    }

    fn intern(&mut self, value: f64, counter: &mut u32) -> String {
        let bits = value.to_bits();
        if let Some(label) = self.floats.get(&bits) {
            return label.clone();
        }
        let label = format!(".LCP_{counter}");
        *counter += 1;
        // Truncated to the reference target's 32-bit `.long` cell; a
        // literal that needs full double precision is a known gap (see
        // DESIGN.md) since the directive only models one machine word.
        #[allow(clippy::cast_possible_truncation)]
        let bits32 = (value as f32).to_bits();
        self.directives.push(Instruction::labeled(label.clone(), Mnemonic::Long, [Operand::Imm(bits32)]));
        self.floats.insert(bits, label.clone());
        label
    }

    fn intern_string(&mut self, sym: Symbol, counter: &mut u32) -> String {
        if let Some(label) = self.strings.get(&sym) {
            return label.clone();
        }
        let label = format!(".LSTR_{counter}");
        *counter += 1;
        self.directives.push(Instruction::labeled(label.clone(), Mnemonic::Asciz, [Operand::Str(sym.as_str())]));
        self.strings.insert(sym, label.clone());
        label
    }
}

#[must_use]
pub fn build(tu: &TranslationUnit<'_>) -> LiteralPool {
    let mut pool = LiteralPool::default();
    let mut counter = 0u32;
    for decl in tu.decls.iter() {
        match decl {
            ExternalDecl::FunctionDef(fd) => walk_stmt(&fd.body, &mut pool, &mut counter),
            ExternalDecl::Declaration(d) => walk_decl(d, &mut pool, &mut counter),
        }
    }
    pool
}

fn walk_decl(d: &Declaration<'_>, pool: &mut LiteralPool, counter: &mut u32) {
    for id in d.declarators.iter() {
        if let Some(init) = &id.initializer {
            walk_expr(init, pool, counter);
        }
    }
}

fn walk_stmt(stmt: &Stmt<'_>, pool: &mut LiteralPool, counter: &mut u32) {
    match &stmt.kind {
        StmtKind::Expr(Some(e)) | StmtKind::Return(Some(e)) => walk_expr(e, pool, counter),
        StmtKind::Expr(None) | StmtKind::Return(None) | StmtKind::Break | StmtKind::Continue | StmtKind::Goto(_) => {}
        StmtKind::Compound { items, .. } => {
            for item in items.iter() {
                match item {
                    BlockItem::Stmt(s) => walk_stmt(s, pool, counter),
                    BlockItem::Decl(d) => walk_decl(d, pool, counter),
                }
            }
        }
        StmtKind::If { cond, then_branch, else_branch } => {
            walk_expr(cond, pool, counter);
            walk_stmt(then_branch, pool, counter);
            if let Some(e) = else_branch {
                walk_stmt(e, pool, counter);
            }
        }
        StmtKind::While { cond, body } | StmtKind::DoWhile { body, cond } => {
            walk_expr(cond, pool, counter);
            walk_stmt(body, pool, counter);
        }
        StmtKind::For { init, cond, step, body, .. } => {
            if let Some(init) = init {
                match init.as_ref() {
                    ForInit::Expr(e) => walk_expr(e, pool, counter),
                    ForInit::Decl(d) => walk_decl(d, pool, counter),
                }
            }
            if let Some(cond) = cond {
                walk_expr(cond, pool, counter);
            }
            if let Some(step) = step {
                walk_expr(step, pool, counter);
            }
            walk_stmt(body, pool, counter);
        }
        StmtKind::Labeled(_, inner) => walk_stmt(inner, pool, counter),
    }
}

fn walk_expr(expr: &Expr<'_>, pool: &mut LiteralPool, counter: &mut u32) {
    match &expr.kind {
        ExprKind::FloatConst(v) => {
            pool.intern(*v, counter);
        }
        ExprKind::StringLit(sym) => {
            pool.intern_string(*sym, counter);
        }
        ExprKind::IntConst(_) | ExprKind::CharConst(_) | ExprKind::Ident(_) => {}
        ExprKind::Index(a, b) | ExprKind::Binary(_, a, b) | ExprKind::Assign(_, a, b) | ExprKind::Comma(a, b) => {
            walk_expr(a, pool, counter);
            walk_expr(b, pool, counter);
        }
        ExprKind::Call(callee, args) => {
            walk_expr(callee, pool, counter);
            for a in args.iter() {
                walk_expr(a, pool, counter);
            }
        }
        ExprKind::Member { base, .. } => walk_expr(base, pool, counter),
        ExprKind::Unary(_, e) | ExprKind::PostOp(_, e) | ExprKind::SizeofExpr(e) | ExprKind::Cast(_, e) => {
            walk_expr(e, pool, counter);
        }
        ExprKind::SizeofType(_) => {}
        ExprKind::Conditional(c, t, f) => {
            walk_expr(c, pool, counter);
            walk_expr(t, pool, counter);
            walk_expr(f, pool, counter);
        }
    }
}
