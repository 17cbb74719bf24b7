//! Declaration and statement-scope processing (§4.4, "Declaration
//! processing" and "Function definition processing"). Types are composed
//! from a declarator's pointer/array/function layers the same way the
//! parser's `parse_type_name` does for type-names, but here the result is
//! bound to a symbol-table entry rather than embedded directly into an
//! expression node.

use bumpalo::collections::Vec as AVec;

use crate::ast::{
    BlockItem, Declaration, Declarator, DeclaratorKind, Expr, ExprKind, ExternalDecl, FunctionDef,
    ParamDecl, Stmt, StmtKind, StorageClass,
};
use crate::symbol::Symbol;
use crate::symtab::{EntryRef, IdentifierType, ScopeChain, SymbolTable};
use crate::types::{Param, Type, TypeKind};

use super::{Annotator, SemaResult};

fn align_up(n: i32, align: i32) -> i32 { ((n + align - 1) / align) * align }

fn literal_array_size(expr: &Expr<'_>) -> Option<u64> {
    match expr.kind {
        ExprKind::IntConst(v) if v >= 0 => Some(v as u64),
        _ => None,
    }
}

/// Builds the fully derived type and declared name for one declarator,
/// applying pointer layers closest to `base` and array/function suffixes
/// outward from there (the same composition order `parse_type_name` uses,
/// generalized to named declarators).
fn compose_declarator_type(base: &Type, declarator: &Declarator<'_>) -> (Symbol, Type) {
    match &declarator.kind {
        DeclaratorKind::Ident(name) => (*name, base.clone()),
        DeclaratorKind::Pointer(quals, inner) => {
            compose_declarator_type(&Type::pointer_to(base.clone()).qualify(*quals), inner)
        }
        DeclaratorKind::Array(inner, size_expr) => {
            let count = size_expr.as_deref().and_then(literal_array_size);
            compose_declarator_type(&Type::array_of(base.clone(), count), inner)
        }
        DeclaratorKind::Function(inner, params, variadic) => {
            let param_types = params.iter().map(param_decl_to_param).collect();
            compose_declarator_type(&Type::function_of(base.clone(), param_types, *variadic), inner)
        }
    }
}

fn param_decl_to_param(p: &ParamDecl<'_>) -> Param {
    match &p.declarator {
        Some(d) => {
            let (name, ty) = compose_declarator_type(&p.specs.base_type, d);
            Param { name: Some(name), ty }
        }
        None => Param { name: None, ty: p.specs.base_type.clone() },
    }
}

fn declarator_name(declarator: &Declarator<'_>) -> Symbol {
    match &declarator.kind {
        DeclaratorKind::Ident(s) => *s,
        DeclaratorKind::Pointer(_, inner)
        | DeclaratorKind::Array(inner, _)
        | DeclaratorKind::Function(inner, _, _) => declarator_name(inner),
    }
}

/// A declarator shaped `'(' function-params ')'` at its outermost
/// non-pointer layer, as every function definition's declarator must be.
fn as_function_shape<'x, 'a>(
    declarator: &'x Declarator<'a>,
) -> Option<(Symbol, &'x AVec<'a, ParamDecl<'a>>, bool)> {
    match &declarator.kind {
        DeclaratorKind::Function(inner, params, variadic) => {
            Some((declarator_name(inner), params, *variadic))
        }
        DeclaratorKind::Pointer(_, inner) => as_function_shape(inner),
        _ => None,
    }
}

impl<'d> Annotator<'d> {
    /// Resolves `TypedefName` leaves against `local` (the scope currently
    /// being populated, so a typedef declared earlier in the same block
    /// is visible to declarations later in that block) and then the
    /// enclosing scope chain.
    pub(crate) fn resolve_type(&self, ty: &Type, local: Option<&SymbolTable>, chain: &ScopeChain<'_>) -> Type {
        match &ty.kind {
            TypeKind::TypedefName(name) => {
                if let Some(tbl) = local {
                    if let Some(entry) = tbl.get(*name) {
                        return entry.borrow().ty.clone().qualify(ty.quals);
                    }
                }
                if let Some((_, entry)) = chain.lookup(*name) {
                    return entry.borrow().ty.clone().qualify(ty.quals);
                }
                ty.clone()
            }
            TypeKind::Pointer(inner) => Type::pointer_to(self.resolve_type(inner, local, chain)).qualify(ty.quals),
            TypeKind::Array { element, count } => {
                Type::array_of(self.resolve_type(element, local, chain), *count).qualify(ty.quals)
            }
            TypeKind::Function { ret, params, variadic } => {
                let ret2 = self.resolve_type(ret, local, chain);
                let params2 = params
                    .iter()
                    .map(|p| Param { name: p.name, ty: self.resolve_type(&p.ty, local, chain) })
                    .collect();
                Type::function_of(ret2, params2, *variadic).qualify(ty.quals)
            }
            _ => ty.clone(),
        }
    }

    pub(crate) fn declare_file_scope_names(&mut self, tu: &mut crate::ast::TranslationUnit<'_>) -> SemaResult<()> {
        let empty_chain = ScopeChain::new();
        for decl in tu.decls.iter() {
            match decl {
                ExternalDecl::FunctionDef(fd) => {
                    if let Some((name, params, variadic)) = as_function_shape(&fd.declarator) {
                        let param_types: Vec<Param> = params.iter().map(param_decl_to_param).collect();
                        let ty = Type::function_of(fd.specs.base_type.clone(), param_types, variadic);
                        let entry = tu.scope.add(name);
                        let mut e = entry.borrow_mut();
                        e.identifier_type = IdentifierType::Function;
                        e.ty = ty;
                        e.number_formal_parameters = Some(u32::try_from(params.len()).unwrap_or(u32::MAX));
                    }
                }
                ExternalDecl::Declaration(d) => {
                    for id in d.declarators.iter() {
                        let (name, ty) = compose_declarator_type(&d.specs.base_type, &id.declarator);
                        let resolved = self.resolve_type(&ty, Some(&tu.scope), &empty_chain);
                        let entry = tu.scope.add(name);
                        let mut e = entry.borrow_mut();
                        e.identifier_type = if d.specs.storage == StorageClass::Typedef {
                            IdentifierType::TypedefName
                        } else if matches!(resolved.kind, TypeKind::Function { .. }) {
                            IdentifierType::Function
                        } else {
                            IdentifierType::Object
                        };
                        e.ty = resolved;
                    }
                }
            }
        }
        Ok(())
    }

    pub(crate) fn annotate_external_decl<'a, 's>(
        &mut self,
        decl: &mut ExternalDecl<'a>,
        chain: &mut ScopeChain<'s>,
    ) -> SemaResult<()> {
        match decl {
            ExternalDecl::FunctionDef(fd) => self.annotate_function_def(fd, chain),
            ExternalDecl::Declaration(d) => self.annotate_declaration_initializers(d, chain),
        }
    }

    fn annotate_declaration_initializers<'a, 's>(&mut self, d: &mut Declaration<'a>, chain: &mut ScopeChain<'s>) -> SemaResult<()> {
        for id in d.declarators.iter_mut() {
            if let Some(init) = &mut id.initializer {
                self.annotate_expr(init, chain)?;
                if init.annotation.constant_evaluation {
                    let name = declarator_name(&id.declarator);
                    if let Some((_, entry)) = chain.lookup(name) {
                        entry.borrow_mut().value = Some(init.annotation.constant_val);
                    }
                }
            }
        }
        Ok(())
    }

    fn annotate_function_def<'a, 's>(&mut self, fd: &mut FunctionDef<'a>, chain: &mut ScopeChain<'s>) -> SemaResult<()> {
        self.next_local_offset = 0;
        let function_entry = chain.lookup(declarator_name(&fd.declarator)).map(|(_, e)| e);

        if let Some((_, params, _)) = as_function_shape(&fd.declarator) {
            for param in params.iter() {
                let Some(pd) = &param.declarator else { continue };
                let (name, ty) = compose_declarator_type(&param.specs.base_type, pd);
                let resolved = self.resolve_type(&ty, None, chain);
                let size = resolved.sizeof(&self.opts).unwrap_or(self.opts.pointer_size) as i32;
                self.next_local_offset -= align_up(size.max(1), 8);
                let entry = fd.scope.add(name);
                let mut e = entry.borrow_mut();
                e.identifier_type = IdentifierType::Object;
                e.ty = resolved;
                e.base_pointer_offset = Some(self.next_local_offset);
                e.function_ptr = function_entry.clone();
            }
        }

        // `fd.scope` is fully populated by the loop above and is not
        // mutated again while borrowed by the chain below.
        let param_scope: &SymbolTable = &fd.scope;
        chain.push(param_scope);
        self.annotate_stmt(&mut fd.body, chain, function_entry.as_ref())?;
        chain.pop();

        if let Some(entry) = &function_entry {
            let mut e = entry.borrow_mut();
            e.function_frame_size = Some(align_up(-self.next_local_offset, 16) as u32);
        }
        Ok(())
    }

    fn annotate_stmt<'a, 's>(
        &mut self,
        stmt: &mut Stmt<'a>,
        chain: &mut ScopeChain<'s>,
        function_entry: Option<&EntryRef>,
    ) -> SemaResult<()> {
        match &mut stmt.kind {
            StmtKind::Expr(Some(e)) => self.annotate_expr(e, chain)?,
            StmtKind::Expr(None) | StmtKind::Break | StmtKind::Continue | StmtKind::Goto(_) => {}
            StmtKind::Compound { items, scope } => self.annotate_compound(items, scope, chain, function_entry)?,
            StmtKind::If { cond, then_branch, else_branch } => {
                self.annotate_expr(cond, chain)?;
                self.annotate_stmt(then_branch, chain, function_entry)?;
                if let Some(e) = else_branch {
                    self.annotate_stmt(e, chain, function_entry)?;
                }
            }
            StmtKind::While { cond, body } => {
                self.annotate_expr(cond, chain)?;
                self.annotate_stmt(body, chain, function_entry)?;
            }
            StmtKind::DoWhile { body, cond } => {
                self.annotate_stmt(body, chain, function_entry)?;
                self.annotate_expr(cond, chain)?;
            }
            StmtKind::For { init, cond, step, body, scope } => {
                if let Some(init) = init {
                    match init.as_mut() {
                        crate::ast::ForInit::Expr(e) => self.annotate_expr(e, chain)?,
                        crate::ast::ForInit::Decl(d) => self.declare_block_scope_decl(d, scope, chain, function_entry)?,
                    }
                }
                let loop_scope: &SymbolTable = &*scope;
                chain.push(loop_scope);
                if let Some(cond) = cond {
                    self.annotate_expr(cond, chain)?;
                }
                if let Some(step) = step {
                    self.annotate_expr(step, chain)?;
                }
                self.annotate_stmt(body, chain, function_entry)?;
                chain.pop();
            }
            StmtKind::Return(Some(e)) => self.annotate_expr(e, chain)?,
            StmtKind::Return(None) => {}
            StmtKind::Labeled(_, inner) => self.annotate_stmt(inner, chain, function_entry)?,
        }
        Ok(())
    }

    /// Registers one declaration's names into `scope` (used by `for`-loop
    /// init-declarations, which share a scope with the loop body instead
    /// of owning a `Compound`'s own scope) and annotates its initializers.
    fn declare_block_scope_decl<'a, 's>(
        &mut self,
        d: &mut Declaration<'a>,
        scope: &mut SymbolTable,
        chain: &ScopeChain<'s>,
        function_entry: Option<&EntryRef>,
    ) -> SemaResult<()> {
        for id in d.declarators.iter_mut() {
            let (name, ty) = compose_declarator_type(&d.specs.base_type, &id.declarator);
            let resolved = self.resolve_type(&ty, Some(&*scope), chain);
            let entry = scope.add(name);
            {
                let mut e = entry.borrow_mut();
                e.identifier_type = if d.specs.storage == StorageClass::Typedef {
                    IdentifierType::TypedefName
                } else {
                    IdentifierType::Object
                };
                e.ty = resolved.clone();
                if d.specs.storage != StorageClass::Typedef {
                    let size = resolved.sizeof(&self.opts).unwrap_or(self.opts.pointer_size) as i32;
                    self.next_local_offset -= align_up(size.max(1), 8);
                    e.base_pointer_offset = Some(self.next_local_offset);
                    e.function_ptr = function_entry.cloned();
                }
            }
            if let Some(init) = &mut id.initializer {
                self.annotate_expr(init, chain)?;
            }
        }
        Ok(())
    }

    fn annotate_compound<'a, 's>(
        &mut self,
        items: &mut [BlockItem<'a>],
        scope: &mut SymbolTable,
        chain: &mut ScopeChain<'s>,
        function_entry: Option<&EntryRef>,
    ) -> SemaResult<()> {
        for item in items.iter_mut() {
            if let BlockItem::Decl(d) = item {
                self.declare_block_scope_decl(d, scope, chain, function_entry)?;
            }
        }
        let body_scope: &SymbolTable = &*scope;
        chain.push(body_scope);
        for item in items.iter_mut() {
            if let BlockItem::Stmt(s) = item {
                self.annotate_stmt(s, chain, function_entry)?;
            }
        }
        chain.pop();
        Ok(())
    }
}
