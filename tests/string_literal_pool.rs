//! `const char *s = "hi";` (§8's end-to-end table): a file-scope literal
//! entry backed by a `.LCP_`/`.LSTR_`-style label plus an `.asciz`
//! directive emitting the literal text.

mod common;

use cc0::diag::VecSink;
use cc0::options::CompileOptions;
use cc0::token::TokenForm;

use common::*;

#[test]
fn string_literal_gets_a_backing_asciz_directive() {
    // const char *s = "hi";
    let tokens = vec![
        kw(TokenForm::Const, "const"), kw(TokenForm::Char, "char"), punct(TokenForm::Star, "*"),
        ident("s"), punct(TokenForm::Assign, "="), string_lit("hi"), punct(TokenForm::Semicolon, ";"),
        eof(),
    ];

    let mut sink = VecSink::new();
    let instrs = cc0::compile(&tokens, CompileOptions::default(), &mut sink).expect("compiles");
    assert!(!sink.has_errors());

    let asciz: Vec<_> = instrs.iter().filter(|i| i.mnemonic == cc0::codegen::Mnemonic::Asciz).collect();
    assert_eq!(asciz.len(), 1, "exactly one string literal interned into the pool");
    assert!(asciz[0].label.is_some(), "the directive carries the literal's label");
    assert!(
        asciz[0].operands.iter().any(|op| matches!(op, cc0::codegen::Operand::Str(s) if s == "hi")),
        "directive operand carries the literal text, got {:?}",
        asciz[0].operands,
    );
}

#[test]
fn repeated_string_literal_shares_one_pool_entry() {
    // void f(void) { const char *a = "hi"; const char *b = "hi"; }
    let tokens = vec![
        kw(TokenForm::Void, "void"), ident("f"), punct(TokenForm::OpenParen, "("),
        kw(TokenForm::Void, "void"), punct(TokenForm::CloseParen, ")"),
        punct(TokenForm::OpenBrace, "{"),
        kw(TokenForm::Const, "const"), kw(TokenForm::Char, "char"), punct(TokenForm::Star, "*"),
        ident("a"), punct(TokenForm::Assign, "="), string_lit("hi"), punct(TokenForm::Semicolon, ";"),
        kw(TokenForm::Const, "const"), kw(TokenForm::Char, "char"), punct(TokenForm::Star, "*"),
        ident("b"), punct(TokenForm::Assign, "="), string_lit("hi"), punct(TokenForm::Semicolon, ";"),
        punct(TokenForm::CloseBrace, "}"),
        eof(),
    ];

    let mut sink = VecSink::new();
    let instrs = cc0::compile(&tokens, CompileOptions::default(), &mut sink).expect("compiles");
    assert!(!sink.has_errors());

    let asciz_count = instrs.iter().filter(|i| i.mnemonic == cc0::codegen::Mnemonic::Asciz).count();
    assert_eq!(asciz_count, 1, "two equal string literals share one pool entry");
}
