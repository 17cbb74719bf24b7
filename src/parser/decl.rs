//! Declaration grammar: declaration-specifiers, declarators, struct/union/
//! enum specifiers, and the parameter lists used by both function
//! declarators and function definitions.
//!
//! Declarators are kept as syntax (`ast::Declarator`) rather than resolved
//! into a derived `Type` here — the declarator shape plus the base type
//! from `DeclSpecs` is the semantic annotator's input, not the parser's
//! output (C4 owns type synthesis). The one exception is `parse_type_name`,
//! used by cast-expressions and `sizeof(type-name)`, whose AST nodes embed
//! a resolved `Type` directly; that composition has no identifier and no
//! symbol-table consequences, so doing it eagerly here is harmless.

use bumpalo::collections::Vec as AVec;

use crate::ast::{DeclSpecs, Declarator, DeclaratorKind, Declaration, InitDeclarator, ParamDecl, StorageClass};
use crate::types::{AggregateKind, BasicKind, Member, Param, Type, TypeKind, TypeQualifiers};

use super::{first, ParseError, ParseResult, Parser, TypedefLookup};
use crate::token::{TokenForm, TokenName};

/// Running tally of builtin type-specifier keywords seen in one
/// declaration-specifier list, resolved into a `BasicKind` once the list
/// is complete (§4.3, "declaration-specifiers").
#[derive(Default)]
struct BuiltinSpecifiers {
    void: bool,
    bool_: bool,
    char_: u8,
    short: u8,
    int: u8,
    long: u8,
    float: bool,
    double: bool,
    signed: bool,
    unsigned: bool,
    complex: bool,
}

impl BuiltinSpecifiers {
    fn any(&self) -> bool {
        self.void || self.bool_ || self.char_ > 0 || self.short > 0 || self.int > 0 || self.long > 0
            || self.float || self.double || self.signed || self.unsigned || self.complex
    }

    fn resolve(&self) -> Option<BasicKind> {
        use BasicKind::{
            Char, Complex, Double, Float, Int, Long, LongDouble, LongLong, Short, SignedChar,
            UnsignedChar, UnsignedInt, UnsignedLong, UnsignedLongLong, UnsignedShort, Bool, Void,
        };
        Some(match self {
            Self { void: true, .. } => Void,
            Self { bool_: true, .. } => Bool,
            Self { char_: 1, signed: false, unsigned: false, .. } => Char,
            Self { char_: 1, signed: true, .. } => SignedChar,
            Self { char_: 1, unsigned: true, .. } => UnsignedChar,
            Self { short: 1, unsigned: true, .. } => UnsignedShort,
            Self { short: 1, .. } => Short,
            Self { double: true, long: 1, complex: true, .. } => Complex,
            Self { double: true, long: 1, .. } => LongDouble,
            Self { double: true, complex: true, .. } => Complex,
            Self { double: true, .. } => Double,
            Self { float: true, complex: true, .. } => Complex,
            Self { float: true, .. } => Float,
            Self { long: n, unsigned: true, .. } if *n >= 2 => UnsignedLongLong,
            Self { long: n, .. } if *n >= 2 => LongLong,
            Self { long: 1, unsigned: true, .. } => UnsignedLong,
            Self { long: 1, .. } => Long,
            Self { unsigned: true, .. } => UnsignedInt,
            Self { signed: true, .. } | Self { int: 1, .. } => Int,
            _ => return None,
        })
    }
}

fn qualifier_of(form: TokenForm) -> TypeQualifiers {
    match form {
        TokenForm::Const => TypeQualifiers::CONST,
        TokenForm::Volatile => TypeQualifiers::VOLATILE,
        TokenForm::Restrict => TypeQualifiers::RESTRICT,
        _ => TypeQualifiers::empty(),
    }
}

impl<'t, 'a, L: TypedefLookup> Parser<'t, 'a, L> {
    fn parse_type_qualifier_list(&mut self) -> TypeQualifiers {
        let mut quals = TypeQualifiers::empty();
        while first::starts_type_qualifier(self.peek_form()) {
            quals |= qualifier_of(self.peek_form());
            self.advance();
        }
        quals
    }

    /// Parses a declaration-specifier list. `allow_storage_class` is false
    /// in contexts where C forbids one (parameter declarations, type
    /// names).
    pub(crate) fn parse_declaration_specifiers(&mut self, allow_storage_class: bool) -> ParseResult<DeclSpecs> {
        let mut storage = StorageClass::None;
        let mut quals = TypeQualifiers::empty();
        let mut builtin = BuiltinSpecifiers::default();
        let mut base_type: Option<Type> = None;

        loop {
            let form = self.peek_form();
            if allow_storage_class && first::starts_storage_class(form) {
                storage = match form {
                    TokenForm::Typedef => StorageClass::Typedef,
                    TokenForm::Extern => StorageClass::Extern,
                    TokenForm::Static => StorageClass::Static,
                    TokenForm::Auto => StorageClass::Auto,
                    TokenForm::Register => StorageClass::Register,
                    _ => unreachable!(),
                };
                self.advance();
                continue;
            }
            if first::starts_type_qualifier(form) {
                quals |= qualifier_of(form);
                self.advance();
                continue;
            }
            if base_type.is_none() {
                match form {
                    TokenForm::Struct => {
                        base_type = Some(self.parse_aggregate_specifier(AggregateKind::Struct)?);
                        continue;
                    }
                    TokenForm::Union => {
                        base_type = Some(self.parse_aggregate_specifier(AggregateKind::Union)?);
                        continue;
                    }
                    TokenForm::Enum => {
                        base_type = Some(self.parse_enum_specifier()?);
                        continue;
                    }
                    _ => {}
                }
                // A typedef-name is only a type-specifier if no builtin
                // keyword has already started this list (§4.3).
                if !builtin.any() && self.at_typedef_name() {
                    let name = crate::symbol::intern(&self.peek().lexeme);
                    self.advance();
                    base_type = Some(Type { kind: TypeKind::TypedefName(name), quals: TypeQualifiers::empty() });
                    continue;
                }
            }
            match form {
                TokenForm::Void => { builtin.void = true; self.advance(); }
                TokenForm::Bool => { builtin.bool_ = true; self.advance(); }
                TokenForm::Char => { builtin.char_ += 1; self.advance(); }
                TokenForm::Short => { builtin.short += 1; self.advance(); }
                TokenForm::Int => { builtin.int += 1; self.advance(); }
                TokenForm::Long => { builtin.long += 1; self.advance(); }
                TokenForm::Float => { builtin.float = true; self.advance(); }
                TokenForm::Double => { builtin.double = true; self.advance(); }
                TokenForm::Signed => { builtin.signed = true; self.advance(); }
                TokenForm::Unsigned => { builtin.unsigned = true; self.advance(); }
                TokenForm::Complex => { builtin.complex = true; self.advance(); }
                _ => break,
            }
        }

        let base_type = match base_type {
            Some(t) => t.qualify(quals),
            None => Type::basic(builtin.resolve().ok_or_else(|| {
                let found = self.peek().clone();
                ParseError::UnexpectedToken { expected: "a type specifier", found }
            })?)
            .qualify(quals),
        };

        Ok(DeclSpecs { storage, base_type })
    }

    fn parse_aggregate_specifier(&mut self, kind: AggregateKind) -> ParseResult<Type> {
        self.advance(); // 'struct' / 'union'
        let tag = if self.peek_name() == TokenName::Identifier {
            let s = crate::symbol::intern(&self.peek().lexeme);
            self.advance();
            Some(s)
        } else {
            None
        };
        let mut members = Vec::new();
        if self.eat(TokenForm::OpenBrace) {
            let mut offset: u32 = 0;
            while !self.at(TokenForm::CloseBrace) && !self.peek().is_eof() {
                let specs = self.parse_declaration_specifiers(false)?;
                loop {
                    let declarator = self.parse_declarator()?;
                    let name = declarator_leaf_name(&declarator);
                    members.push(Member { name, ty: Box::new(specs.base_type.clone()), offset });
                    offset += 1; // exact byte offsets are assigned by the annotator, once sizes are known
                    if !self.eat(TokenForm::Comma) {
                        break;
                    }
                }
                self.expect(TokenForm::Semicolon, "';' after struct/union member declarator")?;
            }
            self.expect(TokenForm::CloseBrace, "'}' closing struct/union specifier")?;
        }
        Ok(Type {
            kind: TypeKind::Aggregate { kind, tag, members, size: None },
            quals: TypeQualifiers::empty(),
        })
    }

    fn parse_enum_specifier(&mut self) -> ParseResult<Type> {
        self.advance(); // 'enum'
        let tag = if self.peek_name() == TokenName::Identifier {
            let s = crate::symbol::intern(&self.peek().lexeme);
            self.advance();
            Some(s)
        } else {
            None
        };
        let mut enumerators = Vec::new();
        if self.eat(TokenForm::OpenBrace) {
            loop {
                let name = self.expect_identifier_symbol("enumerator name")?;
                enumerators.push(name);
                if self.eat(TokenForm::Assign) {
                    self.parse_conditional_constant_expr()?;
                }
                if !self.eat(TokenForm::Comma) || self.at(TokenForm::CloseBrace) {
                    break;
                }
            }
            self.expect(TokenForm::CloseBrace, "'}' closing enum specifier")?;
        }
        Ok(Type { kind: TypeKind::Enum { tag, enumerators }, quals: TypeQualifiers::empty() })
    }

    /// An enumerator's optional constant-expression initializer is parsed
    /// but not folded here — constant evaluation belongs entirely to the
    /// annotator (§4.4); the parser only needs to consume the tokens.
    fn parse_conditional_constant_expr(&mut self) -> ParseResult<()> {
        self.parse_assignment_expr()?;
        Ok(())
    }

    fn expect_identifier_symbol(&mut self, what: &'static str) -> ParseResult<crate::symbol::Symbol> {
        if self.peek_name() == TokenName::Identifier {
            let s = crate::symbol::intern(&self.peek().lexeme);
            self.advance();
            Ok(s)
        } else {
            let found = self.peek().clone();
            Err(ParseError::UnexpectedToken { expected: what, found })
        }
    }

    /// `pointer? direct-declarator`. Pointer layers are applied closest to
    /// the base type; direct-declarator suffixes (array/function) wrap
    /// around the whole pointer-prefixed declarator, matching ordinary
    /// "declaration mimics use" composition performed later by the
    /// annotator.
    pub(crate) fn parse_declarator(&mut self) -> ParseResult<bumpalo::boxed::Box<'a, Declarator<'a>>> {
        let loc = self.loc();
        if self.eat(TokenForm::Star) {
            let quals = self.parse_type_qualifier_list();
            let inner = self.parse_declarator()?;
            return Ok(self.arena.alloc(Declarator { kind: DeclaratorKind::Pointer(quals, inner), loc }));
        }
        self.parse_direct_declarator()
    }

    fn parse_direct_declarator(&mut self) -> ParseResult<bumpalo::boxed::Box<'a, Declarator<'a>>> {
        let loc = self.loc();
        let mut node = if self.eat(TokenForm::OpenParen) {
            let inner = self.parse_declarator()?;
            self.expect(TokenForm::CloseParen, "')' closing parenthesized declarator")?;
            inner
        } else {
            let name = self.expect_identifier_symbol("a declarator name")?;
            self.arena.alloc(Declarator { kind: DeclaratorKind::Ident(name), loc: loc.clone() })
        };
        loop {
            let suffix_loc = self.loc();
            if self.eat(TokenForm::OpenBracket) {
                let size = if self.at(TokenForm::CloseBracket) {
                    None
                } else {
                    Some(self.arena.alloc(self.parse_assignment_expr()?))
                };
                self.expect(TokenForm::CloseBracket, "']' closing array declarator")?;
                node = self.arena.alloc(Declarator { kind: DeclaratorKind::Array(node, size), loc: suffix_loc });
            } else if self.eat(TokenForm::OpenParen) {
                let (params, variadic) = self.parse_parameter_list()?;
                self.expect(TokenForm::CloseParen, "')' closing function declarator")?;
                node = self.arena.alloc(Declarator { kind: DeclaratorKind::Function(node, params, variadic), loc: suffix_loc });
            } else {
                break;
            }
        }
        Ok(node)
    }

    pub(crate) fn parse_parameter_list(&mut self) -> ParseResult<(AVec<'a, ParamDecl<'a>>, bool)> {
        let mut params = self.arena.vec();
        if self.at(TokenForm::CloseParen) {
            return Ok((params, false));
        }
        if self.peek_form() == TokenForm::Void {
            let mark = self.save();
            self.advance();
            if self.at(TokenForm::CloseParen) {
                return Ok((params, false));
            }
            self.restore(mark);
        }
        let mut variadic = false;
        loop {
            if self.eat(TokenForm::Ellipsis) {
                variadic = true;
                break;
            }
            params.push(self.parse_parameter_declaration()?);
            if !self.eat(TokenForm::Comma) {
                break;
            }
        }
        Ok((params, variadic))
    }

    fn parse_parameter_declaration(&mut self) -> ParseResult<ParamDecl<'a>> {
        let loc = self.loc();
        let specs = self.parse_declaration_specifiers(false)?;
        let mark = self.save();
        let declarator = match self.parse_declarator() {
            Ok(d) => Some(d),
            Err(_) => {
                self.restore(mark);
                None
            }
        };
        Ok(ParamDecl { specs, declarator, loc })
    }

    /// A `type-name`: `specifier-qualifier-list abstract-declarator?`.
    /// Used only by cast-expressions and `sizeof(type-name)`, whose AST
    /// nodes hold a resolved `Type` rather than declarator syntax, so the
    /// pointer/array composition happens immediately.
    pub(crate) fn parse_type_name(&mut self) -> ParseResult<Type> {
        let specs = self.parse_declaration_specifiers(false)?;
        self.parse_abstract_declarator_onto(specs.base_type)
    }

    fn parse_abstract_declarator_onto(&mut self, mut base: Type) -> ParseResult<Type> {
        while self.eat(TokenForm::Star) {
            let quals = self.parse_type_qualifier_list();
            base = Type::pointer_to(base).qualify(quals);
        }
        loop {
            if self.eat(TokenForm::OpenBracket) {
                let count = if self.at(TokenForm::CloseBracket) {
                    None
                } else {
                    let size_expr = self.parse_assignment_expr()?;
                    literal_array_size(&size_expr)
                };
                self.expect(TokenForm::CloseBracket, "']' closing abstract array declarator")?;
                base = Type::array_of(base, count);
            } else if self.at(TokenForm::OpenParen) {
                // Abstract function declarators (function-pointer type
                // names, e.g. in a cast) are not produced by any of the
                // end-to-end scenarios this core targets; treat the
                // parameter types as unnamed `Param`s for completeness
                // without attempting K&R-style parameter forward
                // declarations.
                self.advance();
                let (params, variadic) = self.parse_parameter_list()?;
                self.expect(TokenForm::CloseParen, "')' closing abstract function declarator")?;
                let params: Vec<Param> = params.iter().map(|p| Param { name: None, ty: p.specs.base_type.clone() }).collect();
                base = Type::function_of(base, params, variadic);
            } else {
                break;
            }
        }
        Ok(base)
    }

    /// Parses a full declaration: `declaration-specifiers
    /// init-declarator-list? ';'`. Each `typedef`-declared identifier is
    /// fed back into the parser's typedef-name scope immediately, so later
    /// tokens in the same translation unit resolve it correctly (§4.3).
    pub(crate) fn parse_declaration(&mut self) -> ParseResult<Declaration<'a>> {
        let loc = self.loc();
        let specs = self.parse_declaration_specifiers(true)?;
        let mut declarators = self.arena.vec();
        if !self.at(TokenForm::Semicolon) {
            loop {
                let declarator = self.parse_declarator()?;
                if specs.storage == StorageClass::Typedef {
                    self.scopes.declare_typedef(declarator_leaf_name(&declarator));
                }
                let initializer = if self.eat(TokenForm::Assign) {
                    Some(self.arena.alloc(self.parse_assignment_expr()?))
                } else {
                    None
                };
                declarators.push(InitDeclarator { declarator, initializer });
                if !self.eat(TokenForm::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenForm::Semicolon, "';' terminating declaration")?;
        Ok(Declaration { specs, declarators, loc })
    }
}

/// Walks to the `Ident` leaf of a declarator tree. Every concrete (i.e.
/// non-abstract) declarator has exactly one.
fn declarator_leaf_name(declarator: &Declarator<'_>) -> crate::symbol::Symbol {
    match &declarator.kind {
        DeclaratorKind::Ident(s) => *s,
        DeclaratorKind::Pointer(_, inner)
        | DeclaratorKind::Array(inner, _)
        | DeclaratorKind::Function(inner, _, _) => declarator_leaf_name(inner),
    }
}

fn literal_array_size(expr: &crate::ast::Expr<'_>) -> Option<u64> {
    match expr.kind {
        crate::ast::ExprKind::IntConst(v) if v >= 0 => Some(v as u64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Arena;
    use crate::parser::tests::*;
    use crate::parser::ParserScopes;
    use crate::types::BasicKind;

    fn parser_for(tokens: &'static [crate::token::Token]) -> Parser<'static, 'static, ParserScopes> {
        let arena: &'static Arena = Box::leak(Box::new(Arena::new()));
        let sink: &'static mut crate::diag::VecSink = Box::leak(Box::new(crate::diag::VecSink::new()));
        Parser::new(tokens, arena, ParserScopes::new(), sink)
    }

    #[test]
    fn resolves_unsigned_long_long_int() {
        let tokens: &'static [crate::token::Token] = Box::leak(vec![
            keyword(TokenForm::Unsigned, "unsigned"),
            keyword(TokenForm::Long, "long"),
            keyword(TokenForm::Long, "long"),
            keyword(TokenForm::Int, "int"),
            eof(),
        ].into_boxed_slice());
        let mut p = parser_for(tokens);
        let specs = p.parse_declaration_specifiers(false).unwrap();
        assert_eq!(specs.base_type.kind, TypeKind::Basic(BasicKind::UnsignedLongLong));
    }

    #[test]
    fn pointer_to_array_declarator_nests_pointer_innermost() {
        // `*a[3]` as a declarator: array of pointer to base type.
        let tokens: &'static [crate::token::Token] = Box::leak(vec![
            punct(TokenForm::Star, "*"),
            ident("a"),
            punct(TokenForm::OpenBracket, "["),
            int_tok(3),
            punct(TokenForm::CloseBracket, "]"),
            eof(),
        ].into_boxed_slice());
        let mut p = parser_for(tokens);
        let d = p.parse_declarator().unwrap();
        match &d.kind {
            DeclaratorKind::Pointer(_, inner) => assert!(matches!(inner.kind, DeclaratorKind::Ident(_))),
            _ => panic!("expected pointer wrapping the direct-declarator"),
        }
    }

    #[test]
    fn typedef_declaration_feeds_parser_scope() {
        // `typedef int I;`
        let tokens: &'static [crate::token::Token] = Box::leak(vec![
            keyword(TokenForm::Typedef, "typedef"),
            keyword(TokenForm::Int, "int"),
            ident("I"),
            punct(TokenForm::Semicolon, ";"),
            eof(),
        ].into_boxed_slice());
        let mut p = parser_for(tokens);
        p.parse_declaration().unwrap();
        assert!(p.scopes.is_typedef_name(crate::symbol::intern("I")));
    }

    #[test]
    fn void_parameter_list_is_empty() {
        let tokens: &'static [crate::token::Token] = Box::leak(vec![
            keyword(TokenForm::Void, "void"),
            punct(TokenForm::CloseParen, ")"),
            eof(),
        ].into_boxed_slice());
        let mut p = parser_for(tokens);
        let (params, variadic) = p.parse_parameter_list().unwrap();
        assert!(params.is_empty());
        assert!(!variadic);
    }
}
