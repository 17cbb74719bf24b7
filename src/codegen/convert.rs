//! Operand-form conversion matrix (§4.5, "Operand-form conversion"). Keyed
//! by `(current_form, required_form)`; the only form most opcodes actually
//! require of a non-destination operand is `Register`, so the matrix
//! collapses to "already that form" vs. "move into a fresh register" vs.
//! "no rule for this pair".

use super::arch::{Mnemonic, Operand, OperandForm, Register};
use super::isel;
use super::{CodeGenerator, CodegenError, CodegenResult, Instruction};
use crate::types::Type;

impl<'d> CodeGenerator<'d> {
    /// Coerces `operand` to `required`, appending whatever move instruction
    /// that takes onto `out`. Returns the (possibly unchanged) operand in
    /// its new form.
    ///
    /// # Errors
    /// Returns `CodegenError::ConversionError` for a `(current, required)`
    /// pair this matrix has no rule for.
    pub(super) fn coerce(
        &mut self,
        out: &mut Vec<Instruction>,
        operand: Operand,
        required: OperandForm,
        ty: &Type,
    ) -> CodegenResult<Operand> {
        let current = operand.form();
        if current == required {
            return Ok(operand);
        }
        match required {
            OperandForm::Register => {
                let float = ty.is_real_floating();
                let dest = if float { self.regs.alloc_float()? } else { self.regs.alloc_int()? };
                out.push(Instruction::new(isel::select_move(ty), [Operand::Reg(dest), operand]));
                Ok(Operand::Reg(dest))
            }
            _ => Err(CodegenError::ConversionError { from: current, to: required }),
        }
    }

    /// Forces `operand` into a fresh register, regardless of its current
    /// form (used before a binary opcode clobbers the LHS slot).
    pub(super) fn force_register(&mut self, out: &mut Vec<Instruction>, operand: Operand, ty: &Type) -> CodegenResult<Register> {
        match self.coerce(out, operand, OperandForm::Register, ty)? {
            Operand::Reg(r) => Ok(r),
            _ => unreachable!("coerce(.., Register, ..) always returns Operand::Reg"),
        }
    }
}
