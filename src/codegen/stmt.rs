//! Statement compilation (§4.5, "Statement compilation"). Labels for
//! selection and iteration constructs come from the same shared counter as
//! everything else; `break`/`continue` resolve against a small stack of
//! enclosing loop label pairs rather than walking the AST a second time to
//! find the nearest loop.

use crate::ast::{BlockItem, ForInit, Stmt, StmtKind};
use crate::symtab::{ScopeChain, SymbolTable};

use super::arch::{Instruction, Mnemonic, Operand, OperandForm, Register};
use super::{CodeGenerator, CodegenResult};

impl<'d> CodeGenerator<'d> {
    pub(super) fn generate_stmt<'a, 's>(&mut self, stmt: &Stmt<'a>, chain: &mut ScopeChain<'s>) -> CodegenResult<Vec<Instruction>> {
        let mut out = Vec::new();
        match &stmt.kind {
            StmtKind::Expr(Some(e)) => {
                self.compile_expr(e, chain, &mut out)?;
            }
            StmtKind::Expr(None) => {}
            StmtKind::Compound { items, scope } => out.extend(self.generate_compound(items, scope, chain)?),
            StmtKind::If { cond, then_branch, else_branch } => {
                let cond_op = self.compile_expr(cond, chain, &mut out)?;
                let cond_reg = self.force_register(&mut out, cond_op, &cond.annotation.ty.clone().unwrap_or_else(int_ty))?;
                let else_label = self.fresh_label(".LBB0_");
                let done_label = self.fresh_label(".LBB0_");
                out.push(Instruction::new(Mnemonic::Jz, [Operand::Reg(cond_reg), Operand::Label(else_label.clone())]));
                out.extend(self.generate_stmt(then_branch, chain)?);
                out.push(Instruction::new(Mnemonic::Jmp, [Operand::Label(done_label.clone())]));
                out.push(Instruction::labeled(else_label, Mnemonic::Nop, []));
                if let Some(e) = else_branch {
                    out.extend(self.generate_stmt(e, chain)?);
                }
                out.push(Instruction::labeled(done_label, Mnemonic::Nop, []));
            }
            StmtKind::While { cond, body } => {
                let start_label = self.fresh_label(".LBB0_");
                let end_label = self.fresh_label(".LBB0_");
                out.push(Instruction::labeled(start_label.clone(), Mnemonic::Nop, []));
                let cond_op = self.compile_expr(cond, chain, &mut out)?;
                let cond_reg = self.force_register(&mut out, cond_op, &cond.annotation.ty.clone().unwrap_or_else(int_ty))?;
                out.push(Instruction::new(Mnemonic::Jz, [Operand::Reg(cond_reg), Operand::Label(end_label.clone())]));
                self.loop_labels.push((start_label.clone(), end_label.clone()));
                out.extend(self.generate_stmt(body, chain)?);
                self.loop_labels.pop();
                out.push(Instruction::new(Mnemonic::Jmp, [Operand::Label(start_label)]));
                out.push(Instruction::labeled(end_label, Mnemonic::Nop, []));
            }
            StmtKind::DoWhile { body, cond } => {
                let start_label = self.fresh_label(".LBB0_");
                let cont_label = self.fresh_label(".LBB0_");
                let end_label = self.fresh_label(".LBB0_");
                out.push(Instruction::labeled(start_label.clone(), Mnemonic::Nop, []));
                self.loop_labels.push((cont_label.clone(), end_label.clone()));
                out.extend(self.generate_stmt(body, chain)?);
                self.loop_labels.pop();
                out.push(Instruction::labeled(cont_label, Mnemonic::Nop, []));
                let cond_op = self.compile_expr(cond, chain, &mut out)?;
                let cond_reg = self.force_register(&mut out, cond_op, &cond.annotation.ty.clone().unwrap_or_else(int_ty))?;
                out.push(Instruction::new(Mnemonic::Jz, [Operand::Reg(cond_reg), Operand::Label(end_label.clone())]));
                out.push(Instruction::new(Mnemonic::Jmp, [Operand::Label(start_label)]));
                out.push(Instruction::labeled(end_label, Mnemonic::Nop, []));
            }
            StmtKind::For { init, cond, step, body, scope } => {
                if let Some(init) = init {
                    match init.as_ref() {
                        ForInit::Expr(e) => {
                            self.compile_expr(e, chain, &mut out)?;
                        }
                        ForInit::Decl(d) => self.generate_decl_initializers(d, chain, &mut out)?,
                    }
                }
                let loop_scope: &SymbolTable = scope;
                chain.push(loop_scope);
                let start_label = self.fresh_label(".LBB0_");
                let cont_label = self.fresh_label(".LBB0_");
                let end_label = self.fresh_label(".LBB0_");
                out.push(Instruction::labeled(start_label.clone(), Mnemonic::Nop, []));
                if let Some(cond) = cond {
                    let cond_op = self.compile_expr(cond, chain, &mut out)?;
                    let cond_reg = self.force_register(&mut out, cond_op, &cond.annotation.ty.clone().unwrap_or_else(int_ty))?;
                    out.push(Instruction::new(Mnemonic::Jz, [Operand::Reg(cond_reg), Operand::Label(end_label.clone())]));
                }
                self.loop_labels.push((cont_label.clone(), end_label.clone()));
                out.extend(self.generate_stmt(body, chain)?);
                self.loop_labels.pop();
                out.push(Instruction::labeled(cont_label, Mnemonic::Nop, []));
                if let Some(step) = step {
                    self.compile_expr(step, chain, &mut out)?;
                }
                out.push(Instruction::new(Mnemonic::Jmp, [Operand::Label(start_label)]));
                out.push(Instruction::labeled(end_label, Mnemonic::Nop, []));
                chain.pop();
            }
            StmtKind::Return(Some(e)) => {
                let value = self.compile_expr(e, chain, &mut out)?;
                let value = self.coerce(&mut out, value, OperandForm::Register, &e.annotation.ty.clone().unwrap_or_else(int_ty))?;
                out.push(Instruction::new(Mnemonic::Mov, [Operand::Reg(Register::Xmm0), value]));
                self.emit_return_jump(&mut out);
            }
            StmtKind::Return(None) => self.emit_return_jump(&mut out),
            StmtKind::Break => {
                let (_, break_label) = self
                    .loop_labels
                    .last()
                    .cloned()
                    .ok_or_else(|| self.fail("codegen/break-outside-loop", "'break' outside a loop"))?;
                out.push(Instruction::new(Mnemonic::Jmp, [Operand::Label(break_label)]));
            }
            StmtKind::Continue => {
                let (cont_label, _) = self
                    .loop_labels
                    .last()
                    .cloned()
                    .ok_or_else(|| self.fail("codegen/continue-outside-loop", "'continue' outside a loop"))?;
                out.push(Instruction::new(Mnemonic::Jmp, [Operand::Label(cont_label)]));
            }
            StmtKind::Goto(target) => {
                out.push(Instruction::new(Mnemonic::Jmp, [Operand::Label(target.as_str().to_string())]));
            }
            StmtKind::Labeled(name, inner) => {
                out.push(Instruction::labeled(name.as_str().to_string(), Mnemonic::Nop, []));
                out.extend(self.generate_stmt(inner, chain)?);
            }
        }
        Ok(out)
    }

    fn emit_return_jump(&mut self, out: &mut Vec<Instruction>) {
        if let Some(label) = self.exit_label.clone() {
            out.push(Instruction::new(Mnemonic::Jmp, [Operand::Label(label)]));
        }
    }

    fn generate_compound<'a, 's>(
        &mut self,
        items: &[BlockItem<'a>],
        scope: &SymbolTable,
        chain: &mut ScopeChain<'s>,
    ) -> CodegenResult<Vec<Instruction>> {
        chain.push(scope);
        let mut out = Vec::new();
        for item in items {
            match item {
                BlockItem::Decl(d) => self.generate_decl_initializers(d, chain, &mut out)?,
                BlockItem::Stmt(s) => out.extend(self.generate_stmt(s, chain)?),
            }
        }
        chain.pop();
        Ok(out)
    }

    fn generate_decl_initializers<'a, 's>(
        &mut self,
        d: &crate::ast::Declaration<'a>,
        chain: &mut ScopeChain<'s>,
        out: &mut Vec<Instruction>,
    ) -> CodegenResult<()> {
        for id in d.declarators.iter() {
            let Some(init) = &id.initializer else { continue };
            let name = super::declarator_name(&id.declarator);
            let Some(entry) = chain.lookup(name).map(|(_, e)| e) else { continue };
            let (offset, ty) = {
                let e = entry.borrow();
                (e.base_pointer_offset.unwrap_or(0), e.ty.clone())
            };
            let value = self.compile_expr(init, chain, out)?;
            let value = self.coerce(out, value, OperandForm::Register, &ty)?;
            let dest = Operand::RegOffset(Register::Rbp, offset - self.current_frame_size as i32);
            out.push(Instruction::new(super::isel::select_move(&ty), [dest, value]));
        }
        Ok(())
    }
}

fn int_ty() -> crate::types::Type {
    crate::types::Type::basic(crate::types::BasicKind::Int)
}
