//! `int a = 5; int b = a + 3;` at file scope (§8's end-to-end table):
//! both entries land at file scope with type `int`, and `b`'s initializer
//! folds to a constant value of 8.

mod common;

use cc0::ast::{Arena, ExternalDecl};
use cc0::diag::VecSink;
use cc0::options::CompileOptions;
use cc0::parser::{Parser, ParserScopes};
use cc0::symbol::intern;
use cc0::token::TokenForm;
use cc0::Annotator;

use common::*;

#[test]
fn file_scope_initializer_folds_and_both_names_land_at_file_scope() {
    let tokens = vec![
        kw(TokenForm::Int, "int"), ident("a"), punct(TokenForm::Assign, "="), int_const(5), punct(TokenForm::Semicolon, ";"),
        kw(TokenForm::Int, "int"), ident("b"), punct(TokenForm::Assign, "="), ident("a"), punct(TokenForm::Plus, "+"), int_const(3), punct(TokenForm::Semicolon, ";"),
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

    assert_eq!(tu.decls.len(), 2);
    for decl in tu.decls.iter() {
        let ExternalDecl::Declaration(_) = decl else { panic!("expected plain declarations, not function definitions") };
    }

    let a = tu.scope.get(intern("a")).expect("'a' installed at file scope");
    assert!(a.borrow().ty.is_integer());

    let b = tu.scope.get(intern("b")).expect("'b' installed at file scope");
    assert!(b.borrow().ty.is_integer());
    assert_eq!(b.borrow().value, Some(8));
}
