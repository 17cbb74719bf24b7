//! x86-64 code generation (C5, §4.5). A post-order walk over the already
//! annotated AST producing a flat ordered instruction stream; nothing here
//! re-derives types or re-resolves identifiers that the annotator already
//! settled — `ScopeChain` is walked a second time only to recover each
//! `Ident`'s `EntryRef` (frame offset, literal label, …), not to redo type
//! synthesis.

pub mod arch;
mod convert;
mod emit;
mod expr;
mod isel;
mod literal_pool;
mod regalloc;
mod stmt;

pub use arch::{Instruction, Mnemonic, Operand, OperandForm, Register};
pub use emit::render;

use crate::ast::{ExternalDecl, FunctionDef, TranslationUnit};
use crate::diag::DiagnosticSink;
use crate::options::CompileOptions;
use crate::symbol::Symbol;
use crate::symtab::{EntryRef, ScopeChain};

use literal_pool::LiteralPool;
use regalloc::RegisterAllocator;

/// Incoming-argument registers, in declaration order, by class. Only the
/// first four of each class are stored; a function with more than that many
/// parameters of one class only has its first four made reachable — a
/// known limitation of this ad-hoc model (see §9).
const ARG_INT_ORDER: [Register; 4] = [Register::Rdi, Register::Rsi, Register::Rdx, Register::Rcx];
const ARG_FLOAT_ORDER: [Register; 4] = [Register::Xmm0, Register::Xmm1, Register::Xmm2, Register::Xmm3];

fn declarator_name(declarator: &crate::ast::Declarator<'_>) -> Symbol {
    match &declarator.kind {
        crate::ast::DeclaratorKind::Ident(s) => *s,
        crate::ast::DeclaratorKind::Pointer(_, inner)
        | crate::ast::DeclaratorKind::Array(inner, _)
        | crate::ast::DeclaratorKind::Function(inner, _, _) => declarator_name(inner),
    }
}

fn declarator_params<'x, 'a>(declarator: &'x crate::ast::Declarator<'a>) -> Option<&'x bumpalo::collections::Vec<'a, crate::ast::ParamDecl<'a>>> {
    match &declarator.kind {
        crate::ast::DeclaratorKind::Function(_, params, _) => Some(params),
        crate::ast::DeclaratorKind::Pointer(_, inner) => declarator_params(inner),
        _ => None,
    }
}

#[derive(Debug)]
pub enum CodegenError {
    ConversionError { from: OperandForm, to: OperandForm },
    GenericFailure(String),
}

impl std::fmt::Display for CodegenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodegenError::ConversionError { from, to } => {
                write!(f, "no operand-form conversion from {from:?} to {to:?}")
            }
            CodegenError::GenericFailure(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CodegenError {}

pub type CodegenResult<T> = Result<T, CodegenError>;

/// The generator's per-translation-unit state. `regs` resets at the start
/// of every function definition (§4.5's allocator is single-pass *within* a
/// function, not across the whole unit); `pool` and `label_counter` are
/// shared across the whole translation unit.
pub struct CodeGenerator<'d> {
    opts: CompileOptions,
    diag: &'d mut dyn DiagnosticSink,
    regs: RegisterAllocator,
    label_counter: u32,
    pool: LiteralPool,
    current_frame_size: u32,
    exit_label: Option<String>,
    /// `(continue_label, break_label)` per enclosing loop, innermost last.
    loop_labels: Vec<(String, String)>,
}

impl<'d> CodeGenerator<'d> {
    #[must_use]
    pub fn new(opts: CompileOptions, diag: &'d mut dyn DiagnosticSink) -> Self {
        CodeGenerator {
            opts,
            diag,
            regs: RegisterAllocator::new(),
            label_counter: 0,
            pool: LiteralPool::default(),
            current_frame_size: 0,
            exit_label: None,
            loop_labels: Vec::new(),
        }
    }

    /// `.LBB0_`, `.LCP_`, `LSS_` — a shared counter, incremented on every
    /// use regardless of which prefix calls it (§4.5, "Label generation").
    fn fresh_label(&mut self, prefix: &str) -> String {
        let n = self.label_counter;
        self.label_counter += 1;
        format!("{prefix}{n}")
    }

    fn fail(&mut self, code: &'static str, message: impl Into<String>) -> CodegenError {
        let message = message.into();
        self.diag.error(code, message.clone(), None);
        CodegenError::GenericFailure(message)
    }

    /// # Errors
    /// Returns the first conversion or selection failure encountered while
    /// compiling any function definition.
    pub fn generate_translation_unit(&mut self, tu: &TranslationUnit<'_>) -> CodegenResult<Vec<Instruction>> {
        self.pool = literal_pool::build(tu);
        let mut out = self.pool.emit_directives();

        let mut chain = ScopeChain::new();
        chain.push(&tu.scope);
        for decl in tu.decls.iter() {
            if let ExternalDecl::FunctionDef(fd) = decl {
                self.regs = RegisterAllocator::new();
                out.extend(self.generate_function(fd, &mut chain)?);
            }
        }
        chain.pop();
        Ok(out)
    }

    fn function_name(fd: &FunctionDef<'_>) -> Symbol {
        fn inner(d: &crate::ast::Declarator<'_>) -> Symbol {
            match &d.kind {
                crate::ast::DeclaratorKind::Ident(s) => *s,
                crate::ast::DeclaratorKind::Pointer(_, i)
                | crate::ast::DeclaratorKind::Array(i, _)
                | crate::ast::DeclaratorKind::Function(i, _, _) => inner(i),
            }
        }
        inner(&fd.declarator)
    }

    fn generate_function<'a, 's>(
        &mut self,
        fd: &FunctionDef<'a>,
        chain: &mut ScopeChain<'s>,
    ) -> CodegenResult<Vec<Instruction>> {
        let name = Self::function_name(fd);
        let entry = chain.lookup(name).map(|(_, e)| e);
        self.current_frame_size = entry.as_ref().and_then(|e| e.borrow().function_frame_size).unwrap_or(0);
        let exit_label = self.fresh_label(".LBB0_");
        self.exit_label = Some(exit_label.clone());

        let mut out = vec![Instruction::labeled(name.as_str().to_string(), Mnemonic::Pushq, [Operand::Reg(Register::Rbp)])];
        out.push(Instruction::new(Mnemonic::Movq, [Operand::Reg(Register::Rbp), Operand::Reg(Register::Rsp)]));

        let param_scope: &crate::symtab::SymbolTable = &fd.scope;
        chain.push(param_scope);

        if let Some(params) = declarator_params(&fd.declarator) {
            let (mut int_idx, mut float_idx) = (0usize, 0usize);
            for p in params.iter() {
                let Some(d) = &p.declarator else { continue };
                let name = declarator_name(d);
                let Some(entry) = param_scope.get(name) else { continue };
                let (is_float, offset) = {
                    let e = entry.borrow();
                    (e.ty.is_real_floating(), e.base_pointer_offset.unwrap_or(0))
                };
                let dest = Operand::RegOffset(Register::Rbp, offset - self.current_frame_size as i32);
                if is_float {
                    if let Some(&src) = ARG_FLOAT_ORDER.get(float_idx) {
                        out.push(Instruction::new(Mnemonic::Movss, [dest, Operand::Reg(src)]));
                    }
                    float_idx += 1;
                } else {
                    if let Some(&src) = ARG_INT_ORDER.get(int_idx) {
                        out.push(Instruction::new(Mnemonic::Mov, [dest, Operand::Reg(src)]));
                    }
                    int_idx += 1;
                }
            }
        }

        out.extend(self.generate_stmt(&fd.body, chain)?);
        chain.pop();

        out.push(Instruction::labeled(exit_label, Mnemonic::Popq, [Operand::Reg(Register::Rbp)]));
        out.push(Instruction::new(Mnemonic::Retq, []));
        Ok(out)
    }

    fn lookup_entry(&self, chain: &ScopeChain<'_>, name: Symbol) -> Option<EntryRef> {
        chain.lookup(name).map(|(_, e)| e)
    }
}
