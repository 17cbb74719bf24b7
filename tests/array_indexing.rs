//! `int a[4]; a[2] = 7;` inside a function (§8's end-to-end table): the
//! frame holds `a` at offset 0 with size 16, and the store multiplies the
//! index by the element size before adding it to the base.

mod common;

use cc0::ast::{Arena, BlockItem, ExternalDecl, StmtKind};
use cc0::diag::VecSink;
use cc0::options::CompileOptions;
use cc0::parser::{Parser, ParserScopes};
use cc0::symbol::intern;
use cc0::token::TokenForm;
use cc0::Annotator;

use common::*;

// void f(void) { int a[4]; a[2] = 7; }
fn array_decl_tokens() -> Vec<cc0::token::Token> {
    vec![
        kw(TokenForm::Void, "void"), ident("f"), punct(TokenForm::OpenParen, "("),
        kw(TokenForm::Void, "void"), punct(TokenForm::CloseParen, ")"),
        punct(TokenForm::OpenBrace, "{"),
        kw(TokenForm::Int, "int"), ident("a"), punct(TokenForm::OpenBracket, "["), int_const(4), punct(TokenForm::CloseBracket, "]"), punct(TokenForm::Semicolon, ";"),
        ident("a"), punct(TokenForm::OpenBracket, "["), int_const(2), punct(TokenForm::CloseBracket, "]"), punct(TokenForm::Assign, "="), int_const(7), punct(TokenForm::Semicolon, ";"),
        punct(TokenForm::CloseBrace, "}"),
        eof(),
    ]
}

#[test]
fn declared_array_occupies_sixteen_bytes_at_offset_zero() {
    let tokens = array_decl_tokens();
    let arena = Arena::new();
    let mut parse_sink = VecSink::new();
    let mut parser = Parser::new(&tokens, &arena, ParserScopes::new(), &mut parse_sink);
    let mut tu = parser.parse_translation_unit().expect("parses");

    let mut sema_sink = VecSink::new();
    Annotator::new(CompileOptions::default(), &mut sema_sink)
        .annotate_translation_unit(&mut tu)
        .expect("annotates");
    assert!(!sema_sink.has_errors());

    let ExternalDecl::FunctionDef(fd) = &tu.decls[0] else { panic!("expected a function definition") };
    let StmtKind::Compound { items, scope } = &fd.body.kind else { panic!("expected a compound body") };
    assert!(matches!(&items[0], BlockItem::Decl(_)), "first item is the array declaration");

    let a = scope.get(intern("a")).expect("'a' installed in the body's block scope");
    let e = a.borrow();
    assert_eq!(e.base_pointer_offset, Some(-16));
    assert_eq!(e.ty.sizeof(&CompileOptions::default()).expect("array has a known size"), 16);
}

#[test]
fn indexed_store_scales_by_element_size() {
    let tokens = array_decl_tokens();

    let mut sink = VecSink::new();
    let instrs = cc0::compile(&tokens, CompileOptions::default(), &mut sink).expect("compiles");
    assert!(!sink.has_errors());

    let imuls: Vec<_> = instrs.iter().filter(|i| i.mnemonic == cc0::codegen::Mnemonic::Imul).collect();
    assert_eq!(imuls.len(), 1, "index scaled by element size exactly once");
    assert!(
        imuls[0].operands.iter().any(|op| *op == cc0::codegen::Operand::Imm(4)),
        "scales by `int`'s element size (4 bytes), got {:?}",
        imuls[0].operands,
    );
}
