//! `typedef int I; I x;` (§8's end-to-end table): `I` is installed as a
//! typedef-name and a later declaration using `I` in specifier position
//! resolves `x`'s type to the underlying `int`.

mod common;

use cc0::ast::Arena;
use cc0::diag::VecSink;
use cc0::options::CompileOptions;
use cc0::parser::{Parser, ParserScopes};
use cc0::symbol::intern;
use cc0::symtab::IdentifierType;
use cc0::token::TokenForm;
use cc0::Annotator;

use common::*;

#[test]
fn typedef_name_resolves_to_its_underlying_type() {
    let tokens = vec![
        kw(TokenForm::Typedef, "typedef"), kw(TokenForm::Int, "int"), ident("I"), punct(TokenForm::Semicolon, ";"),
        ident("I"), ident("x"), punct(TokenForm::Semicolon, ";"),
        eof(),
    ];

    let arena = Arena::new();
    let mut parse_sink = VecSink::new();
    let mut parser = Parser::new(&tokens, &arena, ParserScopes::new(), &mut parse_sink);
    let mut tu = parser.parse_translation_unit().expect("parses");
    assert!(!parse_sink.has_errors());

    let mut sema_sink = VecSink::new();
    Annotator::new(CompileOptions::default(), &mut sema_sink)
        .annotate_translation_unit(&mut tu)
        .expect("annotates");
    assert!(!sema_sink.has_errors());

    let i = tu.scope.get(intern("I")).expect("'I' installed");
    assert_eq!(i.borrow().identifier_type, IdentifierType::TypedefName);

    let x = tu.scope.get(intern("x")).expect("'x' installed");
    assert_eq!(x.borrow().identifier_type, IdentifierType::Object);
    assert!(x.borrow().ty.is_integer());
}
