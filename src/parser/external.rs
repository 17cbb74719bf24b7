//! Translation-unit structure: the sequence of external declarations, each
//! either a plain declaration or a function definition.
//!
//! Backtracking site #2 (§4.3): a function-definition and a declaration
//! share the `declaration-specifiers declarator` prefix; only the token
//! that follows (`{` vs. `;`/`,`/`=`) tells them apart. This mirrors
//! backtracking site #1 in `expr.rs` — attempt the richer production
//! first, and on failure rewind to the shared prefix and fall back.

use crate::ast::{ExternalDecl, FunctionDef, TranslationUnit};
use crate::symtab::{Scope, SymbolTable};
use crate::token::TokenForm;

use super::{ParseError, ParseResult, Parser, TypedefLookup};

impl<'t, 'a, L: TypedefLookup> Parser<'t, 'a, L> {
    pub fn parse_translation_unit(&mut self) -> ParseResult<TranslationUnit<'a>> {
        let mut decls = self.arena.vec();
        while !self.peek().is_eof() {
            decls.push(self.parse_external_declaration()?);
        }
        Ok(TranslationUnit { decls, scope: SymbolTable::new(Scope::File) })
    }

    fn parse_external_declaration(&mut self) -> ParseResult<ExternalDecl<'a>> {
        let mark = self.save();
        match self.try_parse_function_definition() {
            Ok(def) => Ok(ExternalDecl::FunctionDef(def)),
            Err(_) => {
                self.restore(mark);
                Ok(ExternalDecl::Declaration(self.parse_declaration()?))
            }
        }
    }

    fn try_parse_function_definition(&mut self) -> ParseResult<FunctionDef<'a>> {
        let loc = self.loc();
        let specs = self.parse_declaration_specifiers(true)?;
        let declarator = self.parse_declarator()?;
        if !self.at(TokenForm::OpenBrace) {
            let found = self.peek().clone();
            return Err(ParseError::UnexpectedToken { expected: "'{' starting a function body", found });
        }
        let body = self.parse_compound_statement()?;
        Ok(FunctionDef { specs, declarator, body, scope: SymbolTable::new(Scope::Function), loc })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Arena;
    use crate::parser::tests::*;
    use crate::parser::ParserScopes;

    fn parser_for(tokens: &'static [crate::token::Token]) -> Parser<'static, 'static, ParserScopes> {
        let arena: &'static Arena = Box::leak(Box::new(Arena::new()));
        let sink: &'static mut crate::diag::VecSink = Box::leak(Box::new(crate::diag::VecSink::new()));
        Parser::new(tokens, arena, ParserScopes::new(), sink)
    }

    #[test]
    fn function_definition_vs_prototype_declaration() {
        // int f(void) { return 0; }
        let def_tokens: &'static [crate::token::Token] = Box::leak(vec![
            keyword(TokenForm::Int, "int"),
            ident("f"),
            punct(TokenForm::OpenParen, "("),
            keyword(TokenForm::Void, "void"),
            punct(TokenForm::CloseParen, ")"),
            punct(TokenForm::OpenBrace, "{"),
            keyword(TokenForm::Return, "return"),
            int_tok(0),
            punct(TokenForm::Semicolon, ";"),
            punct(TokenForm::CloseBrace, "}"),
            eof(),
        ].into_boxed_slice());
        let mut p = parser_for(def_tokens);
        let tu = p.parse_translation_unit().unwrap();
        assert_eq!(tu.decls.len(), 1);
        assert!(matches!(tu.decls[0], ExternalDecl::FunctionDef(_)));

        // int f(void);
        let decl_tokens: &'static [crate::token::Token] = Box::leak(vec![
            keyword(TokenForm::Int, "int"),
            ident("f"),
            punct(TokenForm::OpenParen, "("),
            keyword(TokenForm::Void, "void"),
            punct(TokenForm::CloseParen, ")"),
            punct(TokenForm::Semicolon, ";"),
            eof(),
        ].into_boxed_slice());
        let mut p2 = parser_for(decl_tokens);
        let tu2 = p2.parse_translation_unit().unwrap();
        assert_eq!(tu2.decls.len(), 1);
        assert!(matches!(tu2.decls[0], ExternalDecl::Declaration(_)));
    }

    #[test]
    fn multiple_external_declarations_accumulate() {
        // int g; int f(void) { return g; }
        let tokens: &'static [crate::token::Token] = Box::leak(vec![
            keyword(TokenForm::Int, "int"),
            ident("g"),
            punct(TokenForm::Semicolon, ";"),
            keyword(TokenForm::Int, "int"),
            ident("f"),
            punct(TokenForm::OpenParen, "("),
            keyword(TokenForm::Void, "void"),
            punct(TokenForm::CloseParen, ")"),
            punct(TokenForm::OpenBrace, "{"),
            keyword(TokenForm::Return, "return"),
            ident("g"),
            punct(TokenForm::Semicolon, ";"),
            punct(TokenForm::CloseBrace, "}"),
            eof(),
        ].into_boxed_slice());
        let mut p = parser_for(tokens);
        let tu = p.parse_translation_unit().unwrap();
        assert_eq!(tu.decls.len(), 2);
    }
}
