//! Shared token-building helpers for the end-to-end scenarios in §8. Tests
//! build their own token stream by hand rather than depending on a lexer,
//! since lexing is out of scope for this crate.

use cc0::token::{ConstantValue, FileLocation, Token, TokenForm, TokenName};

pub fn loc() -> FileLocation {
    FileLocation::new("t.c", 1, 1)
}

pub fn kw(form: TokenForm, lexeme: &str) -> Token {
    Token { name: TokenName::Keyword, form, lexeme: lexeme.into(), constant_value: None, location: loc() }
}

pub fn punct(form: TokenForm, lexeme: &str) -> Token {
    Token { name: TokenName::Punctuator, form, lexeme: lexeme.into(), constant_value: None, location: loc() }
}

pub fn ident(name: &str) -> Token {
    Token { name: TokenName::Identifier, form: TokenForm::Ident, lexeme: name.into(), constant_value: None, location: loc() }
}

pub fn int_const(v: i64) -> Token {
    Token {
        name: TokenName::Constant,
        form: TokenForm::IntConst,
        lexeme: v.to_string().into(),
        constant_value: Some(ConstantValue::Integer(v)),
        location: loc(),
    }
}

pub fn string_lit(s: &str) -> Token {
    Token {
        name: TokenName::StringLiteral,
        form: TokenForm::StrLit,
        lexeme: s.into(),
        constant_value: None,
        location: loc(),
    }
}

pub fn eof() -> Token {
    Token::eof(loc())
}
