//! Ad-hoc single-pass register allocator (§4.5, "Register allocator").
//! Every request for a fresh register of a class walks a fixed priority
//! order and claims the first unclaimed one; nothing is ever freed, so a
//! function that needs more live values than physical registers exist
//! simply fails to compile. This is a deliberate limitation of the design
//! (see §9), not an oversight — the bitmap exists to make that limitation
//! observable rather than to support reuse.

use bit_set::BitSet;

use super::arch::Register;
use super::{CodegenError, CodegenResult};

const INT_ORDER: [Register; 8] = [
    Register::Rax,
    Register::Rcx,
    Register::Rdx,
    Register::Rbx,
    Register::Rsp,
    Register::Rbp,
    Register::Rsi,
    Register::Rdi,
];

const FLOAT_ORDER: [Register; 8] = [
    Register::Xmm0,
    Register::Xmm1,
    Register::Xmm2,
    Register::Xmm3,
    Register::Xmm4,
    Register::Xmm5,
    Register::Xmm6,
    Register::Xmm7,
];

/// One bitmap per register class; a set bit means "claimed for this
/// function". Subregister aliases would set the same bit as their parent
/// physical register if this model tracked them individually — since this
/// core only models the eight full-width names per class, aliasing is
/// already total by construction.
#[derive(Default)]
pub struct RegisterAllocator {
    int_used: BitSet,
    float_used: BitSet,
}

impl RegisterAllocator {
    #[must_use]
    pub fn new() -> Self {
        log::debug!("new register allocator for function: single-pass, no spill/free support");
        RegisterAllocator::default()
    }

    pub fn alloc_int(&mut self) -> CodegenResult<Register> {
        Self::alloc_from(&INT_ORDER, &mut self.int_used)
    }

    pub fn alloc_float(&mut self) -> CodegenResult<Register> {
        Self::alloc_from(&FLOAT_ORDER, &mut self.float_used)
    }

    fn alloc_from(order: &[Register; 8], used: &mut BitSet) -> CodegenResult<Register> {
        for (idx, reg) in order.iter().enumerate() {
            if !used.contains(idx) {
                used.insert(idx);
                return Ok(*reg);
            }
        }
        Err(CodegenError::GenericFailure("register allocator exhausted its class".into()))
    }
}
