//! `cc0`: a single-pass educational C compiler core. Each translation unit
//! flows through four owned stages — lexing is out of scope, so this crate
//! begins at a token slice — parsing (C3) straight into semantic annotation
//! (C4) of that same tree, then x86-64 code generation (C5) from the
//! annotated tree into an ordered instruction stream. No stage holds onto
//! another translation unit's state; `compile` is free to be called
//! repeatedly with fresh arenas.

pub mod ast;
pub mod codegen;
pub mod diag;
pub mod options;
pub mod sema;
pub mod symbol;
pub mod symtab;
pub mod token;
pub mod types;

mod parser;

pub use parser::{ParseError, ParseResult, Parser, ParserScopes, TypedefLookup};
pub use sema::{Annotator, SemaError, SemaResult};

use ast::{Arena, TranslationUnit};
use codegen::{CodeGenerator, CodegenError, Instruction};
use diag::DiagnosticSink;
use options::CompileOptions;
use token::Token;

/// Runs the whole pipeline over one translation unit's tokens and returns
/// its generated instruction stream. `arena` must outlive the returned
/// value only incidentally — the AST itself is dropped at the end of this
/// call; callers that need the annotated tree itself should drive the
/// stages directly instead of going through this convenience entry point.
///
/// # Errors
/// Returns the first stage's failure: a parse failure, a semantic error, or
/// a code-generation failure, in that order.
pub fn compile(
    tokens: &[Token],
    opts: CompileOptions,
    diag: &mut dyn DiagnosticSink,
) -> Result<Vec<Instruction>, CompileError> {
    let arena = Arena::new();
    let mut tu = parse(tokens, &arena, diag)?;
    annotate(&mut tu, opts, diag)?;
    Ok(generate(&tu, opts, diag)?)
}

/// Stage 1: tokens to AST.
///
/// # Errors
/// Returns the parser's failure at the offending token.
pub fn parse<'a>(tokens: &[Token], arena: &'a Arena, diag: &mut dyn DiagnosticSink) -> ParseResult<TranslationUnit<'a>> {
    let mut parser = Parser::new(tokens, arena, ParserScopes::new(), diag);
    parser.parse_translation_unit()
}

/// Stage 2: fills in `TranslationUnit`'s annotations and symbol tables
/// in place.
///
/// # Errors
/// Returns the first semantic constraint violation encountered.
pub fn annotate(tu: &mut TranslationUnit<'_>, opts: CompileOptions, diag: &mut dyn DiagnosticSink) -> SemaResult<()> {
    Annotator::new(opts, diag).annotate_translation_unit(tu)
}

/// Stage 3: annotated AST to an x86-64 instruction stream.
///
/// # Errors
/// Returns the first conversion or selection failure encountered.
pub fn generate(tu: &TranslationUnit<'_>, opts: CompileOptions, diag: &mut dyn DiagnosticSink) -> Result<Vec<Instruction>, CodegenError> {
    CodeGenerator::new(opts, diag).generate_translation_unit(tu)
}

#[derive(Debug)]
pub enum CompileError {
    Parse(ParseError),
    Sema(SemaError),
    Codegen(CodegenError),
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::Parse(e) => write!(f, "{e}"),
            CompileError::Sema(e) => write!(f, "{e}"),
            CompileError::Codegen(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<ParseError> for CompileError {
    fn from(e: ParseError) -> Self { CompileError::Parse(e) }
}
impl From<SemaError> for CompileError {
    fn from(e: SemaError) -> Self { CompileError::Sema(e) }
}
impl From<CodegenError> for CompileError {
    fn from(e: CodegenError) -> Self { CompileError::Codegen(e) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diag::VecSink;
    use token::{ConstantValue, FileLocation, TokenForm, TokenName};

    fn tok(name: TokenName, form: TokenForm, lexeme: &str) -> Token {
        Token { name, form, lexeme: lexeme.into(), constant_value: None, location: FileLocation::new("t.c", 1, 1) }
    }
    fn int_tok(v: i64) -> Token {
        Token {
            name: TokenName::Constant,
            form: TokenForm::IntConst,
            lexeme: v.to_string().into(),
            constant_value: Some(ConstantValue::Integer(v)),
            location: FileLocation::new("t.c", 1, 1),
        }
    }

    #[test]
    fn empty_translation_unit_compiles_to_an_empty_instruction_stream() {
        let tokens = vec![Token::eof(FileLocation::new("t.c", 1, 1))];
        let mut sink = VecSink::new();
        let instrs = compile(&tokens, CompileOptions::default(), &mut sink).expect("compiles");
        assert!(instrs.is_empty());
        assert!(!sink.has_errors());
    }

    #[test]
    fn trivial_function_returning_zero_compiles() {
        // int f(void) { return 0; }
        let tokens = vec![
            tok(TokenName::Keyword, TokenForm::Int, "int"),
            tok(TokenName::Identifier, TokenForm::Ident, "f"),
            tok(TokenName::Punctuator, TokenForm::OpenParen, "("),
            tok(TokenName::Keyword, TokenForm::Void, "void"),
            tok(TokenName::Punctuator, TokenForm::CloseParen, ")"),
            tok(TokenName::Punctuator, TokenForm::OpenBrace, "{"),
            tok(TokenName::Keyword, TokenForm::Return, "return"),
            int_tok(0),
            tok(TokenName::Punctuator, TokenForm::Semicolon, ";"),
            tok(TokenName::Punctuator, TokenForm::CloseBrace, "}"),
            Token::eof(FileLocation::new("t.c", 1, 1)),
        ];
        let mut sink = VecSink::new();
        let instrs = compile(&tokens, CompileOptions::default(), &mut sink).expect("compiles");
        assert!(!instrs.is_empty());
        assert!(!sink.has_errors());
    }
}
