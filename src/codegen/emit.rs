//! Textual rendering of an instruction stream (§6, "Instruction stream
//! (output)"). Intel-ish syntax: `label:\n\t<mnemonic> <op1>, <op2>`.

use std::fmt::Write as _;

use super::arch::{Instruction, Operand};

fn render_operand(op: &Operand) -> String {
    match op {
        Operand::Reg(r) => r.to_string(),
        Operand::RegOffset(r, off) => format!("{off}({r})"),
        Operand::RegAddr(r) => format!("[{r}]"),
        Operand::Imm(v) => format!("{v:#x}"),
        Operand::NearPtr(_) => "[0x00000000]".to_string(),
        Operand::Label(l) => l.clone(),
        Operand::LabelReg(l, r) => format!("{l}({r})"),
        Operand::Str(s) => format!("{s:?}"),
    }
}

/// Renders a whole instruction stream as assembly-like text, one
/// instruction per line (plus one more for its label, if it has one).
#[must_use]
pub fn render(instructions: &[Instruction]) -> String {
    let mut out = String::new();
    for instr in instructions {
        if let Some(label) = &instr.label {
            let _ = writeln!(out, "{label}:");
        }
        let _ = write!(out, "\t{}", instr.mnemonic.text());
        for (i, op) in instr.operands.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            let _ = write!(out, "{sep}{}", render_operand(op));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::arch::{Mnemonic, Register};

    #[test]
    fn renders_a_labeled_instruction_with_two_operands() {
        let instrs = vec![Instruction::labeled("f", Mnemonic::Pushq, [Operand::Reg(Register::Rbp)])];
        assert_eq!(render(&instrs), "f:\n\tpushq RBP\n");
    }

    #[test]
    fn renders_register_offset_and_label_register_forms() {
        let instrs = vec![
            Instruction::new(Mnemonic::Mov, [Operand::Reg(Register::Rax), Operand::RegOffset(Register::Rbp, -8)]),
            Instruction::new(Mnemonic::Movss, [Operand::Reg(Register::Xmm0), Operand::LabelReg(".LCP_0".to_string(), Register::Rip)]),
        ];
        let rendered = render(&instrs);
        assert!(rendered.contains("-8(RBP)"));
        assert!(rendered.contains(".LCP_0(RIP)"));
    }
}
