//! `int main(void){ int x=1; if(x) return 2; return 3; }` (§8's end-to-end
//! table): two distinct `.LBB0_*` labels, one `jz`, one `jmp`, and two
//! `mov XMM0, imm` return sequences.

mod common;

use cc0::diag::VecSink;
use cc0::options::CompileOptions;
use cc0::token::TokenForm;

use common::*;

#[test]
fn if_without_else_emits_two_distinct_labels_and_a_conditional_jump() {
    let tokens = vec![
        kw(TokenForm::Int, "int"), ident("main"), punct(TokenForm::OpenParen, "("),
        kw(TokenForm::Void, "void"), punct(TokenForm::CloseParen, ")"),
        punct(TokenForm::OpenBrace, "{"),
        kw(TokenForm::Int, "int"), ident("x"), punct(TokenForm::Assign, "="), int_const(1), punct(TokenForm::Semicolon, ";"),
        kw(TokenForm::If, "if"), punct(TokenForm::OpenParen, "("), ident("x"), punct(TokenForm::CloseParen, ")"),
        kw(TokenForm::Return, "return"), int_const(2), punct(TokenForm::Semicolon, ";"),
        kw(TokenForm::Return, "return"), int_const(3), punct(TokenForm::Semicolon, ";"),
        punct(TokenForm::CloseBrace, "}"),
        eof(),
    ];

    let mut sink = VecSink::new();
    let instrs = cc0::compile(&tokens, CompileOptions::default(), &mut sink).expect("compiles");
    assert!(!sink.has_errors());

    let labels: Vec<&str> = instrs.iter().filter_map(|i| i.label.as_deref()).filter(|l| l.starts_with(".LBB0_")).collect();
    assert!(labels.len() >= 2, "expected at least two distinct basic-block labels, got {labels:?}");

    let jz_count = instrs.iter().filter(|i| i.mnemonic == cc0::codegen::Mnemonic::Jz).count();
    let jmp_count = instrs.iter().filter(|i| i.mnemonic == cc0::codegen::Mnemonic::Jmp).count();
    assert_eq!(jz_count, 1, "exactly one conditional jump for the single if");
    assert!(jmp_count >= 1, "at least one unconditional jump past the then-branch");

    let xmm0_moves = instrs
        .iter()
        .filter(|i| i.mnemonic == cc0::codegen::Mnemonic::Mov && i.operands.first() == Some(&cc0::codegen::Operand::Reg(cc0::codegen::Register::Xmm0)))
        .count();
    assert_eq!(xmm0_moves, 2, "one return-value move per return statement");
}
