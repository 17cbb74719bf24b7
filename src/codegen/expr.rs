//! Expression compilation (§4.5, "Expression compilation"). Every compiled
//! expression yields an `Operand` naming where its value now lives;
//! instructions needed to get it there are appended to the caller's
//! instruction buffer rather than returned separately, mirroring the
//! annotator's in-place style.

use crate::ast::{AssignOp, BinOp, Expr, ExprKind, PostOp, UnaryOp};
use crate::symtab::ScopeChain;
use crate::types::{Type, TypeKind};

use super::arch::{Instruction, Mnemonic, Operand, OperandForm, Register};
use super::isel;
use super::{CodeGenerator, CodegenResult};

impl<'d> CodeGenerator<'d> {
    fn ty_of(expr: &Expr<'_>) -> Type {
        expr.annotation.ty.clone().unwrap_or_else(|| Type::basic(crate::types::BasicKind::Int))
    }

    pub(super) fn compile_expr(
        &mut self,
        expr: &Expr<'_>,
        chain: &ScopeChain<'_>,
        out: &mut Vec<Instruction>,
    ) -> CodegenResult<Operand> {
        match &expr.kind {
            ExprKind::IntConst(v) => Ok(Operand::Imm(*v as u32)),
            ExprKind::CharConst(v) => Ok(Operand::Imm(*v as u32)),
            ExprKind::FloatConst(v) => {
                let label = self.pool.float_label(*v).map(str::to_string);
                let label = label.unwrap_or_else(|| ".LCP_unknown".to_string());
                Ok(Operand::LabelReg(label, Register::Rip))
            }
            ExprKind::StringLit(sym) => {
                let label = self.pool.string_label(*sym).map(str::to_string);
                let label = label.unwrap_or_else(|| ".LSTR_unknown".to_string());
                Ok(Operand::LabelReg(label, Register::Rip))
            }
            ExprKind::Ident(name) => {
                let Some(entry) = self.lookup_entry(chain, *name) else {
                    return Err(self.fail("codegen/undeclared-identifier", format!("no symbol-table entry for '{name}' at codegen time")));
                };
                let e = entry.borrow();
                let offset = e.base_pointer_offset.unwrap_or(0) - self.current_frame_size as i32;
                Ok(Operand::RegOffset(Register::Rbp, offset))
            }
            ExprKind::Index(base, index) => self.compile_index(base, index, chain, out),
            ExprKind::Member { base, field, arrow } => self.compile_member(base, *field, *arrow, chain, out),
            ExprKind::Call(callee, args) => self.compile_call(callee, args, chain, out),
            ExprKind::Unary(op, operand) => self.compile_unary(*op, operand, &Self::ty_of(expr), chain, out),
            ExprKind::PostOp(op, operand) => self.compile_postop(*op, operand, &Self::ty_of(expr), chain, out),
            ExprKind::SizeofExpr(_) | ExprKind::SizeofType(_) => {
                Ok(Operand::Imm(u32::try_from(expr.annotation.constant_val).unwrap_or(0)))
            }
            ExprKind::Cast(target_ty, operand) => {
                let src = self.compile_expr(operand, chain, out)?;
                self.coerce(out, src, OperandForm::Register, target_ty)
            }
            ExprKind::Binary(op, l, r) => self.compile_binary(*op, l, r, &Self::ty_of(expr), chain, out),
            ExprKind::Conditional(c, t, f) => self.compile_conditional(c, t, f, &Self::ty_of(expr), chain, out),
            ExprKind::Assign(op, l, r) => self.compile_assign(*op, l, r, chain, out),
            ExprKind::Comma(l, r) => {
                self.compile_expr(l, chain, out)?;
                self.compile_expr(r, chain, out)
            }
        }
    }

    fn compile_index(
        &mut self,
        base: &Expr<'_>,
        index: &Expr<'_>,
        chain: &ScopeChain<'_>,
        out: &mut Vec<Instruction>,
    ) -> CodegenResult<Operand> {
        let base_ty = Self::ty_of(base);
        let elem_size = base_ty.element_type().or_else(|_| base_ty.dereference()).and_then(|t| t.sizeof(&self.opts)).unwrap_or(1);

        let base_op = self.compile_expr(base, chain, out)?;
        let base_reg = self.force_register(out, base_op, &base_ty)?;
        let index_op = self.compile_expr(index, chain, out)?;
        let index_reg = self.force_register(out, index_op, &Type::basic(crate::types::BasicKind::Int))?;

        out.push(Instruction::new(Mnemonic::Imul, [Operand::Reg(index_reg), Operand::Imm(elem_size)]));
        out.push(Instruction::new(Mnemonic::Add, [Operand::Reg(base_reg), Operand::Reg(index_reg)]));
        Ok(Operand::RegOffset(base_reg, 0))
    }

    fn compile_member(
        &mut self,
        base: &Expr<'_>,
        field: crate::symbol::Symbol,
        arrow: bool,
        chain: &ScopeChain<'_>,
        out: &mut Vec<Instruction>,
    ) -> CodegenResult<Operand> {
        let base_ty = Self::ty_of(base);
        let agg = if arrow { base_ty.dereference().ok().cloned() } else { Some(base_ty.clone()) };
        let member_offset = agg
            .and_then(|t| match t.kind {
                TypeKind::Aggregate { members, .. } => members.into_iter().find(|m| m.name == field).map(|m| m.offset),
                _ => None,
            })
            .unwrap_or(0) as i32;

        let base_op = self.compile_expr(base, chain, out)?;
        if arrow {
            let base_reg = self.force_register(out, base_op, &base_ty)?;
            Ok(Operand::RegOffset(base_reg, member_offset))
        } else {
            match base_op {
                Operand::RegOffset(reg, off) => Ok(Operand::RegOffset(reg, off + member_offset)),
                other => {
                    let base_reg = self.force_register(out, other, &base_ty)?;
                    Ok(Operand::RegOffset(base_reg, member_offset))
                }
            }
        }
    }

    fn compile_call(
        &mut self,
        callee: &Expr<'_>,
        args: &[Expr<'_>],
        chain: &ScopeChain<'_>,
        out: &mut Vec<Instruction>,
    ) -> CodegenResult<Operand> {
        let mut int_idx = 0usize;
        let mut float_idx = 0usize;
        for arg in args {
            let arg_op = self.compile_expr(arg, chain, out)?;
            let ty = Self::ty_of(arg);
            if ty.is_real_floating() {
                if let Some(&dest) = super::ARG_FLOAT_ORDER.get(float_idx) {
                    let v = self.coerce(out, arg_op, OperandForm::Register, &ty)?;
                    out.push(Instruction::new(Mnemonic::Movss, [Operand::Reg(dest), v]));
                }
                float_idx += 1;
            } else {
                if let Some(&dest) = super::ARG_INT_ORDER.get(int_idx) {
                    let v = self.coerce(out, arg_op, OperandForm::Register, &ty)?;
                    out.push(Instruction::new(Mnemonic::Mov, [Operand::Reg(dest), v]));
                }
                int_idx += 1;
            }
        }
        let label = match &callee.kind {
            ExprKind::Ident(name) => name.as_str().to_string(),
            _ => {
                let op = self.compile_expr(callee, chain, out)?;
                let reg = self.force_register(out, op, &Self::ty_of(callee))?;
                out.push(Instruction::new(Mnemonic::Call, [Operand::Reg(reg)]));
                return Ok(Operand::Reg(Register::Rax));
            }
        };
        out.push(Instruction::new(Mnemonic::Call, [Operand::Label(label)]));
        Ok(Operand::Reg(Register::Rax))
    }

    fn compile_unary(
        &mut self,
        op: UnaryOp,
        operand: &Expr<'_>,
        result_ty: &Type,
        chain: &ScopeChain<'_>,
        out: &mut Vec<Instruction>,
    ) -> CodegenResult<Operand> {
        match op {
            UnaryOp::AddressOf => {
                let loc = self.compile_expr(operand, chain, out)?;
                let Operand::RegOffset(base, offset) = loc else {
                    return Err(self.fail("codegen/address-of-non-lvalue", "'&' applied to a non-lvalue operand"));
                };
                let r = self.regs.alloc_int()?;
                out.push(Instruction::new(Mnemonic::Mov, [Operand::Reg(r), Operand::Reg(base)]));
                out.push(Instruction::new(Mnemonic::Add, [Operand::Reg(r), Operand::Imm(offset as u32)]));
                Ok(Operand::Reg(r))
            }
            UnaryOp::Deref => {
                let loc = self.compile_expr(operand, chain, out)?;
                let reg = self.force_register(out, loc, &Self::ty_of(operand))?;
                Ok(Operand::RegOffset(reg, 0))
            }
            UnaryOp::PreInc | UnaryOp::PreDec => {
                let loc = self.compile_expr(operand, chain, out)?;
                let mnemonic = if op == UnaryOp::PreInc { Mnemonic::Inc } else { Mnemonic::Dec };
                out.push(Instruction::new(mnemonic, [loc.clone()]));
                Ok(loc)
            }
            UnaryOp::Plus => self.compile_expr(operand, chain, out),
            UnaryOp::Minus => {
                let v = self.compile_expr(operand, chain, out)?;
                let reg = self.force_register(out, v, result_ty)?;
                out.push(Instruction::new(Mnemonic::Neg, [Operand::Reg(reg)]));
                Ok(Operand::Reg(reg))
            }
            UnaryOp::BitNot => {
                // No dedicated `not` opcode in this instruction set;
                // `~x == -x - 1`.
                let v = self.compile_expr(operand, chain, out)?;
                let reg = self.force_register(out, v, result_ty)?;
                out.push(Instruction::new(Mnemonic::Neg, [Operand::Reg(reg)]));
                out.push(Instruction::new(Mnemonic::Sub, [Operand::Reg(reg), Operand::Imm(1)]));
                Ok(Operand::Reg(reg))
            }
            UnaryOp::LogicalNot => {
                let v = self.compile_expr(operand, chain, out)?;
                let reg = self.force_register(out, v, &Self::ty_of(operand))?;
                out.push(Instruction::new(Mnemonic::Cmp, [Operand::Reg(reg), Operand::Imm(0)]));
                let dest = self.regs.alloc_int()?;
                out.push(Instruction::new(Mnemonic::Sete, [Operand::Reg(dest)]));
                Ok(Operand::Reg(dest))
            }
        }
    }

    fn compile_postop(
        &mut self,
        op: PostOp,
        operand: &Expr<'_>,
        result_ty: &Type,
        chain: &ScopeChain<'_>,
        out: &mut Vec<Instruction>,
    ) -> CodegenResult<Operand> {
        let loc = self.compile_expr(operand, chain, out)?;
        let saved = self.coerce(out, loc.clone(), OperandForm::Register, result_ty)?;
        let mnemonic = if op == PostOp::PostInc { Mnemonic::Inc } else { Mnemonic::Dec };
        out.push(Instruction::new(mnemonic, [loc]));
        Ok(saved)
    }

    fn compile_binary(
        &mut self,
        op: BinOp,
        l: &Expr<'_>,
        r: &Expr<'_>,
        result_ty: &Type,
        chain: &ScopeChain<'_>,
        out: &mut Vec<Instruction>,
    ) -> CodegenResult<Operand> {
        let lv = self.compile_expr(l, chain, out)?;
        let lhs = self.force_register(out, lv, &Self::ty_of(l))?;
        let rv = self.compile_expr(r, chain, out)?;
        let rhs = self.coerce(out, rv, OperandForm::Register, &Self::ty_of(r))?;

        let is_comparison = matches!(op, BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge | BinOp::Eq | BinOp::Ne);
        if is_comparison {
            out.push(Instruction::new(Mnemonic::Cmp, [Operand::Reg(lhs), rhs]));
            let set_mnemonic = match op {
                BinOp::Lt => Mnemonic::Setl,
                BinOp::Gt => Mnemonic::Setg,
                BinOp::Le => Mnemonic::Setle,
                BinOp::Ge => Mnemonic::Setge,
                BinOp::Eq => Mnemonic::Sete,
                BinOp::Ne => Mnemonic::Setne,
                _ => unreachable!(),
            };
            out.push(Instruction::new(set_mnemonic, [Operand::Reg(lhs)]));
            return Ok(Operand::Reg(lhs));
        }

        let mnemonic = match op {
            BinOp::Add => isel::select_add(result_ty),
            BinOp::Sub => isel::select_sub(result_ty),
            BinOp::Mul => isel::select_mul(result_ty),
            BinOp::Div => isel::select_div(result_ty),
            BinOp::Mod => isel::select_div(result_ty),
            BinOp::Shl => Mnemonic::Shl,
            BinOp::Shr => Mnemonic::Shr,
            BinOp::BitAnd | BinOp::LogicalAnd => Mnemonic::And,
            BinOp::BitOr | BinOp::LogicalOr => Mnemonic::Or,
            BinOp::BitXor => Mnemonic::Xor,
            BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge | BinOp::Eq | BinOp::Ne => unreachable!(),
        };
        out.push(Instruction::new(mnemonic, [Operand::Reg(lhs), rhs]));
        Ok(Operand::Reg(lhs))
    }

    fn compile_conditional(
        &mut self,
        c: &Expr<'_>,
        t: &Expr<'_>,
        f: &Expr<'_>,
        result_ty: &Type,
        chain: &ScopeChain<'_>,
        out: &mut Vec<Instruction>,
    ) -> CodegenResult<Operand> {
        let skip = self.fresh_label(".LBB0_");
        let done = self.fresh_label(".LBB0_");

        let cond_op = self.compile_expr(c, chain, out)?;
        let cond_reg = self.force_register(out, cond_op, &Self::ty_of(c))?;
        let result_reg = if result_ty.is_real_floating() { self.regs.alloc_float()? } else { self.regs.alloc_int()? };

        out.push(Instruction::new(Mnemonic::Jz, [Operand::Reg(cond_reg), Operand::Label(skip.clone())]));
        let then_op = self.compile_expr(t, chain, out)?;
        out.push(Instruction::new(isel::select_move(result_ty), [Operand::Reg(result_reg), then_op]));
        out.push(Instruction::new(Mnemonic::Jmp, [Operand::Label(done.clone())]));
        out.push(Instruction::labeled(skip, Mnemonic::Nop, []));
        let else_op = self.compile_expr(f, chain, out)?;
        out.push(Instruction::new(isel::select_move(result_ty), [Operand::Reg(result_reg), else_op]));
        out.push(Instruction::labeled(done, Mnemonic::Nop, []));
        Ok(Operand::Reg(result_reg))
    }

    fn compile_assign(
        &mut self,
        op: AssignOp,
        l: &Expr<'_>,
        r: &Expr<'_>,
        chain: &ScopeChain<'_>,
        out: &mut Vec<Instruction>,
    ) -> CodegenResult<Operand> {
        let dest = self.compile_expr(l, chain, out)?;
        let rhs_ty = Self::ty_of(r);
        let rv = self.compile_expr(r, chain, out)?;
        let value = if op == AssignOp::Assign {
            self.coerce(out, rv, OperandForm::Register, &rhs_ty)?
        } else {
            let lhs_reg = self.force_register(out, dest.clone(), &Self::ty_of(l))?;
            let rhs_reg = self.coerce(out, rv, OperandForm::Register, &rhs_ty)?;
            let mnemonic = match op {
                AssignOp::AddAssign => isel::select_add(&rhs_ty),
                AssignOp::SubAssign => isel::select_sub(&rhs_ty),
                AssignOp::MulAssign => isel::select_mul(&rhs_ty),
                AssignOp::DivAssign | AssignOp::ModAssign => isel::select_div(&rhs_ty),
                AssignOp::ShlAssign => Mnemonic::Shl,
                AssignOp::ShrAssign => Mnemonic::Shr,
                AssignOp::AndAssign => Mnemonic::And,
                AssignOp::OrAssign => Mnemonic::Or,
                AssignOp::XorAssign => Mnemonic::Xor,
                AssignOp::Assign => unreachable!(),
            };
            out.push(Instruction::new(mnemonic, [Operand::Reg(lhs_reg), rhs_reg]));
            Operand::Reg(lhs_reg)
        };
        // Pointer assignment (`*p = e`) lands here as a `RegOffset`
        // destination synthesized with offset zero (§4.5).
        out.push(Instruction::new(isel::select_move(&Self::ty_of(l)), [dest, value.clone()]));
        Ok(value)
    }
}
