//! Precomputed FIRST-set membership predicates (§4.3, "Look-ahead tables").
//! Each function answers "can a token with this form start this
//! nonterminal?" for one grammar rule; the parser calls these to decide
//! which alternative to attempt without consuming input.

use crate::token::TokenForm;

#[must_use]
pub fn starts_type_qualifier(form: TokenForm) -> bool {
    matches!(form, TokenForm::Const | TokenForm::Volatile | TokenForm::Restrict)
}

#[must_use]
pub fn starts_storage_class(form: TokenForm) -> bool {
    matches!(form, TokenForm::Typedef | TokenForm::Extern | TokenForm::Static | TokenForm::Auto | TokenForm::Register)
}

#[must_use]
pub fn starts_builtin_type_specifier(form: TokenForm) -> bool {
    matches!(
        form,
        TokenForm::Void
            | TokenForm::Char
            | TokenForm::Short
            | TokenForm::Int
            | TokenForm::Long
            | TokenForm::Float
            | TokenForm::Double
            | TokenForm::Signed
            | TokenForm::Unsigned
            | TokenForm::Bool
            | TokenForm::Complex
            | TokenForm::Struct
            | TokenForm::Union
            | TokenForm::Enum
    )
}

/// FIRST(unary-operator): the single-token unary operators `+ - ~ ! & *`.
#[must_use]
pub fn starts_unary_operator(form: TokenForm) -> bool {
    matches!(
        form,
        TokenForm::Plus | TokenForm::Minus | TokenForm::Tilde | TokenForm::Bang | TokenForm::Amp | TokenForm::Star
    )
}

#[must_use]
pub fn starts_assignment_operator(form: TokenForm) -> bool {
    matches!(
        form,
        TokenForm::Assign
            | TokenForm::PlusEq
            | TokenForm::MinusEq
            | TokenForm::StarEq
            | TokenForm::SlashEq
            | TokenForm::PercentEq
            | TokenForm::AmpEq
            | TokenForm::PipeEq
            | TokenForm::CaretEq
            | TokenForm::ShlEq
            | TokenForm::ShrEq
    )
}

/// `switch`/`case`/`default` are intentionally absent: this core's
/// `StmtKind` has no selection-statement form for them (see `DESIGN.md`).
#[must_use]
pub fn starts_statement(form: TokenForm) -> bool {
    matches!(
        form,
        TokenForm::OpenBrace
            | TokenForm::If
            | TokenForm::While
            | TokenForm::Do
            | TokenForm::For
            | TokenForm::Goto
            | TokenForm::Continue
            | TokenForm::Break
            | TokenForm::Return
            | TokenForm::Semicolon
    ) || starts_expression(form)
}

#[must_use]
pub fn starts_expression(form: TokenForm) -> bool {
    starts_unary_operator(form)
        || matches!(
            form,
            TokenForm::Ident
                | TokenForm::IntConst
                | TokenForm::FloatConst
                | TokenForm::CharConst
                | TokenForm::StrLit
                | TokenForm::OpenParen
                | TokenForm::Sizeof
                | TokenForm::PlusPlus
                | TokenForm::MinusMinus
        )
}
