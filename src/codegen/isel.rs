//! Type-directed instruction selection (§4.5's opcode table). Every
//! selector takes the *result* type of the operation, since by the time
//! codegen runs the annotator has already settled what that type is.

use crate::types::Type;

use super::arch::Mnemonic;

#[must_use]
pub fn select_move(ty: &Type) -> Mnemonic {
    if ty.is_real_floating() { Mnemonic::Movss } else { Mnemonic::Mov }
}

#[must_use]
pub fn select_add(ty: &Type) -> Mnemonic {
    if ty.is_real_floating() { Mnemonic::Addss } else { Mnemonic::Add }
}

#[must_use]
pub fn select_sub(ty: &Type) -> Mnemonic {
    if ty.is_real_floating() { Mnemonic::Subss } else { Mnemonic::Sub }
}

/// The table has no integer (neither-signed-nor-unsigned) entry for
/// multiply/divide — every integer type is one or the other once it
/// reaches codegen, so the unreachable cell is never hit in practice.
#[must_use]
pub fn select_mul(ty: &Type) -> Mnemonic {
    if ty.is_real_floating() {
        Mnemonic::Mulss
    } else if ty.is_unsigned_integer() {
        Mnemonic::Mul
    } else {
        Mnemonic::Imul
    }
}

#[must_use]
pub fn select_div(ty: &Type) -> Mnemonic {
    if ty.is_real_floating() {
        Mnemonic::Divss
    } else if ty.is_unsigned_integer() {
        Mnemonic::Div
    } else {
        Mnemonic::Idiv
    }
}
