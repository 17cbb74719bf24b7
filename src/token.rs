//! The token stream contract (§6). The lexer and preprocessor that produce
//! this stream are out of scope for this crate; this module only defines
//! the shape the parser consumes.

use std::fmt;
use std::rc::Rc;

/// `(filename, line, column)`, carried by every token for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileLocation {
    pub filename: Rc<str>,
    pub line: u32,
    pub column: u32,
}

impl FileLocation {
    #[must_use]
    pub fn new(filename: impl Into<Rc<str>>, line: u32, column: u32) -> Self {
        FileLocation { filename: filename.into(), line, column }
    }
}

impl fmt::Display for FileLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.column)
    }
}

/// The coarse kind of a token, mirroring the preprocessing-token to token
/// reclassification performed by the (out of scope) lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenName {
    Keyword,
    Identifier,
    Constant,
    StringLiteral,
    Punctuator,
    EndOfFile,
    Error,
}

/// Enumerated sub-kind of a token. Only the forms this core's grammar
/// actually dispatches on are listed; the lexer may produce others (e.g.
/// extended punctuators) which surface here as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenForm {
    // Keywords
    Void, Char, Short, Int, Long, Float, Double, Signed, Unsigned, Bool, Complex,
    Struct, Union, Enum, Typedef,
    Const, Volatile, Restrict,
    Extern, Static, Auto, Register,
    Sizeof,
    If, Else, Switch, Case, Default,
    While, Do, For,
    Goto, Continue, Break, Return,

    // Identifier / constant / string carry no extra form discriminant
    Ident, IntConst, FloatConst, CharConst, StrLit,

    // Punctuators
    OpenParen, CloseParen, OpenBrace, CloseBrace, OpenBracket, CloseBracket,
    Semicolon, Comma, Colon, Question,
    Dot, Arrow,
    Plus, Minus, Star, Slash, Percent,
    PlusPlus, MinusMinus,
    Amp, Pipe, Caret, Tilde, Bang,
    ShiftLeft, ShiftRight,
    Lt, Gt, LtEq, GtEq, EqEq, NotEq,
    AmpAmp, PipePipe,
    Assign, PlusEq, MinusEq, StarEq, SlashEq, PercentEq,
    AmpEq, PipeEq, CaretEq, ShlEq, ShrEq,
    Ellipsis,

    EndOfFile,
    Other,
}

/// Parsed payload of a `constant` token, produced by the (out of scope)
/// lexer from the raw lexeme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstantValue {
    Integer(i64),
    Floating(f64),
    Character(i64),
}

/// One token in the stream the parser consumes.
#[derive(Debug, Clone)]
pub struct Token {
    pub name: TokenName,
    pub form: TokenForm,
    pub lexeme: Rc<str>,
    pub constant_value: Option<ConstantValue>,
    pub location: FileLocation,
}

impl Token {
    #[must_use]
    pub fn eof(location: FileLocation) -> Self {
        Token {
            name: TokenName::EndOfFile,
            form: TokenForm::EndOfFile,
            lexeme: Rc::from(""),
            constant_value: None,
            location,
        }
    }

    #[must_use]
    pub fn is_eof(&self) -> bool { self.name == TokenName::EndOfFile }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?})", self.name, self.lexeme)
    }
}
