//! x86-64 instruction-stream IR (§4.5, "Operand-form conversion" and
//! "Type-directed instruction selection"). This is a flat instruction list,
//! not a control-flow graph — branches are ordinary instructions whose
//! operand is a label, and fallthrough is simply "the next instruction".

use arrayvec::ArrayVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    Rax,
    Rcx,
    Rdx,
    Rbx,
    Rsp,
    Rbp,
    Rsi,
    Rdi,
    Xmm0,
    Xmm1,
    Xmm2,
    Xmm3,
    Xmm4,
    Xmm5,
    Xmm6,
    Xmm7,
    /// Instruction-pointer-relative addressing, used only as the second
    /// half of a `(label, register)` literal-pool operand — never handed
    /// out by the allocator.
    Rip,
}

impl Register {
    #[must_use]
    pub fn is_float(self) -> bool {
        matches!(
            self,
            Register::Xmm0
                | Register::Xmm1
                | Register::Xmm2
                | Register::Xmm3
                | Register::Xmm4
                | Register::Xmm5
                | Register::Xmm6
                | Register::Xmm7
        )
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Register::Rax => "RAX",
            Register::Rcx => "RCX",
            Register::Rdx => "RDX",
            Register::Rbx => "RBX",
            Register::Rsp => "RSP",
            Register::Rbp => "RBP",
            Register::Rsi => "RSI",
            Register::Rdi => "RDI",
            Register::Xmm0 => "XMM0",
            Register::Xmm1 => "XMM1",
            Register::Xmm2 => "XMM2",
            Register::Xmm3 => "XMM3",
            Register::Xmm4 => "XMM4",
            Register::Xmm5 => "XMM5",
            Register::Xmm6 => "XMM6",
            Register::Xmm7 => "XMM7",
            Register::Rip => "RIP",
        }
    }
}

impl std::fmt::Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.name()) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandForm {
    Register,
    RegOffset,
    RegAddr,
    Imm,
    NearPtr,
    Label,
    LabelReg,
    Str,
}

/// One instruction operand. The six forms named in §4.5, plus the register
/// form every freshly allocated result lands in.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Reg(Register),
    /// `offset(reg)`.
    RegOffset(Register, i32),
    /// `[reg]`.
    RegAddr(Register),
    Imm(u32),
    /// `[0x00000000]`.
    NearPtr(u32),
    Label(String),
    /// `label(reg)`.
    LabelReg(String, Register),
    /// A quoted string, the sole operand of a `.asciz` directive.
    Str(String),
}

impl Operand {
    #[must_use]
    pub fn form(&self) -> OperandForm {
        match self {
            Operand::Reg(_) => OperandForm::Register,
            Operand::RegOffset(..) => OperandForm::RegOffset,
            Operand::RegAddr(_) => OperandForm::RegAddr,
            Operand::Imm(_) => OperandForm::Imm,
            Operand::NearPtr(_) => OperandForm::NearPtr,
            Operand::Label(_) => OperandForm::Label,
            Operand::LabelReg(..) => OperandForm::LabelReg,
            Operand::Str(_) => OperandForm::Str,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mnemonic {
    Pushq,
    Popq,
    Retq,
    Movq,
    Mov,
    Movss,
    Add,
    Addss,
    Sub,
    Subss,
    Imul,
    Mul,
    Mulss,
    Idiv,
    Div,
    Divss,
    Neg,
    Inc,
    Dec,
    Shl,
    Shr,
    And,
    Or,
    Xor,
    Cmp,
    Sete,
    Setne,
    Setl,
    Setg,
    Setle,
    Setge,
    Jz,
    Jmp,
    Call,
    /// A no-operand marker used purely to carry a label when a branch
    /// target has no instruction of its own to attach the label to.
    Nop,
    /// `.long` literal-pool directive.
    Long,
    /// `.asciz` literal-pool directive for string literals.
    Asciz,
}

impl Mnemonic {
    #[must_use]
    pub fn text(self) -> &'static str {
        match self {
            Mnemonic::Pushq => "pushq",
            Mnemonic::Popq => "popq",
            Mnemonic::Retq => "retq",
            Mnemonic::Movq => "movq",
            Mnemonic::Mov => "mov",
            Mnemonic::Movss => "movss",
            Mnemonic::Add => "add",
            Mnemonic::Addss => "addss",
            Mnemonic::Sub => "sub",
            Mnemonic::Subss => "subss",
            Mnemonic::Imul => "imul",
            Mnemonic::Mul => "mul",
            Mnemonic::Mulss => "mulss",
            Mnemonic::Idiv => "idiv",
            Mnemonic::Div => "div",
            Mnemonic::Divss => "divss",
            Mnemonic::Neg => "neg",
            Mnemonic::Inc => "inc",
            Mnemonic::Dec => "dec",
            Mnemonic::Shl => "shl",
            Mnemonic::Shr => "shr",
            Mnemonic::And => "and",
            Mnemonic::Or => "or",
            Mnemonic::Xor => "xor",
            Mnemonic::Cmp => "cmp",
            Mnemonic::Sete => "sete",
            Mnemonic::Setne => "setne",
            Mnemonic::Setl => "setl",
            Mnemonic::Setg => "setg",
            Mnemonic::Setle => "setle",
            Mnemonic::Setge => "setge",
            Mnemonic::Jz => "jz",
            Mnemonic::Jmp => "jmp",
            Mnemonic::Call => "call",
            Mnemonic::Nop => "nop",
            Mnemonic::Long => ".long",
            Mnemonic::Asciz => ".asciz",
        }
    }
}

/// A labeled or unlabeled instruction with up to three operands (§6,
/// "Instruction stream"). Fixed-capacity rather than heap-backed, since no
/// opcode in §4.5's table ever takes more than three.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub label: Option<String>,
    pub mnemonic: Mnemonic,
    pub operands: ArrayVec<Operand, 3>,
}

impl Instruction {
    #[must_use]
    pub fn new(mnemonic: Mnemonic, operands: impl IntoIterator<Item = Operand>) -> Self {
        Instruction { label: None, mnemonic, operands: operands.into_iter().collect() }
    }

    #[must_use]
    pub fn labeled(label: impl Into<String>, mnemonic: Mnemonic, operands: impl IntoIterator<Item = Operand>) -> Self {
        Instruction { label: Some(label.into()), mnemonic, operands: operands.into_iter().collect() }
    }
}
