//! Expression grammar (§4.3's precedence chain): `primary ← postfix ←
//! unary ← cast ← multiplicative ← additive ← shift ← relational ←
//! equality ← bit-and ← bit-xor ← bit-or ← logical-and ← logical-or ←
//! conditional ← assignment ← expression`.
//!
//! Every binary level is naturally left-recursive in the grammar; each is
//! implemented as the iterative "parse one operand at the next lower
//! level, then loop while the lookahead matches one of this level's
//! operators" pattern, rewriting the growing subtree as the new
//! production's left operand each iteration.

use crate::ast::{AssignOp, BinOp, Expr, ExprKind, ProductionTag, UnaryOp, PostOp};
use crate::token::{ConstantValue, TokenForm, TokenName};

use super::{ParseError, ParseResult, Parser, TypedefLookup};

macro_rules! left_assoc_level {
    ($name:ident, $next:ident, $tag:literal, [$(($form:path, $op:path)),+ $(,)?]) => {
        fn $name(&mut self) -> ParseResult<Expr<'a>> {
            let mut lhs = self.$next()?;
            loop {
                let op = match self.peek_form() {
                    $($form => $op,)+
                    _ => break,
                };
                let loc = self.loc();
                self.advance();
                let rhs = self.$next()?;
                lhs = Expr::new(
                    ExprKind::Binary(op, self.arena.alloc(lhs), self.arena.alloc(rhs)),
                    loc,
                    ProductionTag::new($tag, 2),
                );
            }
            Ok(lhs)
        }
    };
}

impl<'t, 'a, L: TypedefLookup> Parser<'t, 'a, L> {
    pub fn parse_expression(&mut self) -> ParseResult<Expr<'a>> {
        let mut lhs = self.parse_assignment_expr()?;
        while self.at(TokenForm::Comma) {
            let loc = self.loc();
            self.advance();
            let rhs = self.parse_assignment_expr()?;
            lhs = Expr::new(
                ExprKind::Comma(self.arena.alloc(lhs), self.arena.alloc(rhs)),
                loc,
                ProductionTag::new("EXPRESSION", 2),
            );
        }
        Ok(lhs)
    }

    /// Backtracking site #1 (§4.3): try the `unary-expression '='
    /// assignment-expression` form first (sharing the unary-expression
    /// prefix with conditional-expression); if no assignment operator
    /// follows, rewind and parse a plain conditional-expression.
    pub(crate) fn parse_assignment_expr(&mut self) -> ParseResult<Expr<'a>> {
        let mark = self.save();
        if let Ok(lhs) = self.parse_unary_expr() {
            if let Some(op) = assign_op_of(self.peek_form()) {
                let loc = self.loc();
                self.advance();
                let rhs = self.parse_assignment_expr()?;
                return Ok(Expr::new(
                    ExprKind::Assign(op, self.arena.alloc(lhs), self.arena.alloc(rhs)),
                    loc,
                    ProductionTag::new("ASSIGNMENT_EXPRESSION", 1),
                ));
            }
        }
        self.restore(mark);
        self.parse_conditional_expr()
    }

    fn parse_conditional_expr(&mut self) -> ParseResult<Expr<'a>> {
        let cond = self.parse_logical_or_expr()?;
        if self.at(TokenForm::Question) {
            let loc = self.loc();
            self.advance();
            let then_branch = self.parse_expression()?;
            self.expect(TokenForm::Colon, "':' in conditional expression")?;
            let else_branch = self.parse_conditional_expr()?;
            return Ok(Expr::new(
                ExprKind::Conditional(self.arena.alloc(cond), self.arena.alloc(then_branch), self.arena.alloc(else_branch)),
                loc,
                ProductionTag::new("CONDITIONAL_EXPRESSION", 2),
            ));
        }
        Ok(cond)
    }

    left_assoc_level!(parse_logical_or_expr, parse_logical_and_expr, "LOGICAL_OR_EXPRESSION",
        [(TokenForm::PipePipe, BinOp::LogicalOr)]);
    left_assoc_level!(parse_logical_and_expr, parse_bit_or_expr, "LOGICAL_AND_EXPRESSION",
        [(TokenForm::AmpAmp, BinOp::LogicalAnd)]);
    left_assoc_level!(parse_bit_or_expr, parse_bit_xor_expr, "INCLUSIVE_OR_EXPRESSION",
        [(TokenForm::Pipe, BinOp::BitOr)]);
    left_assoc_level!(parse_bit_xor_expr, parse_bit_and_expr, "EXCLUSIVE_OR_EXPRESSION",
        [(TokenForm::Caret, BinOp::BitXor)]);
    left_assoc_level!(parse_bit_and_expr, parse_equality_expr, "AND_EXPRESSION",
        [(TokenForm::Amp, BinOp::BitAnd)]);
    left_assoc_level!(parse_equality_expr, parse_relational_expr, "EQUALITY_EXPRESSION",
        [(TokenForm::EqEq, BinOp::Eq), (TokenForm::NotEq, BinOp::Ne)]);
    left_assoc_level!(parse_relational_expr, parse_shift_expr, "RELATIONAL_EXPRESSION",
        [(TokenForm::Lt, BinOp::Lt), (TokenForm::Gt, BinOp::Gt), (TokenForm::LtEq, BinOp::Le), (TokenForm::GtEq, BinOp::Ge)]);
    left_assoc_level!(parse_shift_expr, parse_additive_expr, "SHIFT_EXPRESSION",
        [(TokenForm::ShiftLeft, BinOp::Shl), (TokenForm::ShiftRight, BinOp::Shr)]);
    left_assoc_level!(parse_additive_expr, parse_multiplicative_expr, "ADDITIVE_EXPRESSION",
        [(TokenForm::Plus, BinOp::Add), (TokenForm::Minus, BinOp::Sub)]);
    left_assoc_level!(parse_multiplicative_expr, parse_cast_expr, "MULTIPLICATIVE_EXPRESSION",
        [(TokenForm::Star, BinOp::Mul), (TokenForm::Slash, BinOp::Div), (TokenForm::Percent, BinOp::Mod)]);

    fn parse_cast_expr(&mut self) -> ParseResult<Expr<'a>> {
        // A cast is syntactically `'(' type-name ')' cast-expression`, which
        // shares its opening `(` with a parenthesized primary-expression.
        // This implementation only recognizes the cast form when the
        // parenthesized contents start with a type-specifier keyword,
        // which never starts an expression, so no backtracking is needed
        // here (unlike the two sites named in §4.3).
        if self.at(TokenForm::OpenParen) {
            let mark = self.save();
            let loc = self.loc();
            self.advance();
            if super::first::starts_builtin_type_specifier(self.peek_form())
                || super::first::starts_type_qualifier(self.peek_form())
            {
                if let Ok(ty) = self.parse_type_name() {
                    if self.eat(TokenForm::CloseParen) {
                        let operand = self.parse_cast_expr()?;
                        return Ok(Expr::new(
                            ExprKind::Cast(ty, self.arena.alloc(operand)),
                            loc,
                            ProductionTag::new("CAST_EXPRESSION", 1),
                        ));
                    }
                }
            }
            self.restore(mark);
        }
        self.parse_unary_expr()
    }

    fn parse_unary_expr(&mut self) -> ParseResult<Expr<'a>> {
        let loc = self.loc();
        match self.peek_form() {
            TokenForm::PlusPlus => {
                self.advance();
                let operand = self.parse_unary_expr()?;
                Ok(Expr::new(ExprKind::Unary(UnaryOp::PreInc, self.arena.alloc(operand)), loc, ProductionTag::new("UNARY_EXPRESSION", 2)))
            }
            TokenForm::MinusMinus => {
                self.advance();
                let operand = self.parse_unary_expr()?;
                Ok(Expr::new(ExprKind::Unary(UnaryOp::PreDec, self.arena.alloc(operand)), loc, ProductionTag::new("UNARY_EXPRESSION", 3)))
            }
            TokenForm::Sizeof => {
                self.advance();
                if self.at(TokenForm::OpenParen) {
                    let mark = self.save();
                    self.advance();
                    if super::first::starts_builtin_type_specifier(self.peek_form()) {
                        if let Ok(ty) = self.parse_type_name() {
                            if self.eat(TokenForm::CloseParen) {
                                return Ok(Expr::new(ExprKind::SizeofType(ty), loc, ProductionTag::new("UNARY_EXPRESSION", 5)));
                            }
                        }
                    }
                    self.restore(mark);
                }
                let operand = self.parse_unary_expr()?;
                Ok(Expr::new(ExprKind::SizeofExpr(self.arena.alloc(operand)), loc, ProductionTag::new("UNARY_EXPRESSION", 4)))
            }
            form if super::first::starts_unary_operator(form) => {
                let op = match form {
                    TokenForm::Plus => UnaryOp::Plus,
                    TokenForm::Minus => UnaryOp::Minus,
                    TokenForm::Tilde => UnaryOp::BitNot,
                    TokenForm::Bang => UnaryOp::LogicalNot,
                    TokenForm::Amp => UnaryOp::AddressOf,
                    TokenForm::Star => UnaryOp::Deref,
                    _ => unreachable!(),
                };
                self.advance();
                let operand = self.parse_cast_expr()?;
                Ok(Expr::new(ExprKind::Unary(op, self.arena.alloc(operand)), loc, ProductionTag::new("UNARY_EXPRESSION", 1)))
            }
            _ => self.parse_postfix_expr(),
        }
    }

    fn parse_postfix_expr(&mut self) -> ParseResult<Expr<'a>> {
        let mut expr = self.parse_primary_expr()?;
        loop {
            let loc = self.loc();
            match self.peek_form() {
                TokenForm::OpenBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(TokenForm::CloseBracket, "']'")?;
                    expr = Expr::new(
                        ExprKind::Index(self.arena.alloc(expr), self.arena.alloc(index)),
                        loc,
                        ProductionTag::new("POSTFIX_EXPRESSION", 2),
                    );
                }
                TokenForm::OpenParen => {
                    self.advance();
                    let mut args = self.arena.vec();
                    if !self.at(TokenForm::CloseParen) {
                        loop {
                            args.push(self.parse_assignment_expr()?);
                            if !self.eat(TokenForm::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(TokenForm::CloseParen, "')'")?;
                    expr = Expr::new(
                        ExprKind::Call(self.arena.alloc(expr), args),
                        loc,
                        ProductionTag::new("POSTFIX_EXPRESSION", 3),
                    );
                }
                TokenForm::Dot => {
                    self.advance();
                    let field = self.expect_ident("struct/union member name")?;
                    expr = Expr::new(
                        ExprKind::Member { base: self.arena.alloc(expr), field, arrow: false },
                        loc,
                        ProductionTag::new("POSTFIX_EXPRESSION", 4),
                    );
                }
                TokenForm::Arrow => {
                    self.advance();
                    let field = self.expect_ident("struct/union member name")?;
                    expr = Expr::new(
                        ExprKind::Member { base: self.arena.alloc(expr), field, arrow: true },
                        loc,
                        ProductionTag::new("POSTFIX_EXPRESSION", 5),
                    );
                }
                TokenForm::PlusPlus => {
                    self.advance();
                    expr = Expr::new(
                        ExprKind::PostOp(PostOp::PostInc, self.arena.alloc(expr)),
                        loc,
                        ProductionTag::new("POSTFIX_EXPRESSION", 6),
                    );
                }
                TokenForm::MinusMinus => {
                    self.advance();
                    expr = Expr::new(
                        ExprKind::PostOp(PostOp::PostDec, self.arena.alloc(expr)),
                        loc,
                        ProductionTag::new("POSTFIX_EXPRESSION", 7),
                    );
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary_expr(&mut self) -> ParseResult<Expr<'a>> {
        let loc = self.loc();
        let tok = self.peek().clone();
        match tok.name {
            TokenName::Identifier => {
                self.advance();
                Ok(Expr::new(ExprKind::Ident(crate::symbol::intern(&tok.lexeme)), loc, ProductionTag::new("PRIMARY_EXPRESSION", 2)))
            }
            TokenName::Constant => {
                self.advance();
                match tok.constant_value {
                    Some(ConstantValue::Integer(v)) => {
                        Ok(Expr::new(ExprKind::IntConst(v), loc, ProductionTag::new("PRIMARY_EXPRESSION", 3)))
                    }
                    Some(ConstantValue::Floating(v)) => {
                        Ok(Expr::new(ExprKind::FloatConst(v), loc, ProductionTag::new("PRIMARY_EXPRESSION", 3)))
                    }
                    Some(ConstantValue::Character(v)) => {
                        Ok(Expr::new(ExprKind::CharConst(v), loc, ProductionTag::new("PRIMARY_EXPRESSION", 3)))
                    }
                    None => Err(ParseError::UnexpectedToken { expected: "a parsed constant value", found: tok }),
                }
            }
            TokenName::StringLiteral => {
                self.advance();
                Ok(Expr::new(
                    ExprKind::StringLit(crate::symbol::intern(&tok.lexeme)),
                    loc,
                    ProductionTag::new("PRIMARY_EXPRESSION", 4),
                ))
            }
            _ if tok.form == TokenForm::OpenParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenForm::CloseParen, "')'")?;
                Ok(inner)
            }
            _ => {
                self.diag.error("parse/unexpected-token", format!("expected an expression, found {tok}"), Some(loc));
                Err(ParseError::UnexpectedToken { expected: "an expression", found: tok })
            }
        }
    }

    fn expect_ident(&mut self, what: &'static str) -> ParseResult<crate::symbol::Symbol> {
        if self.peek_name() == TokenName::Identifier {
            let sym = crate::symbol::intern(&self.peek().lexeme);
            self.advance();
            Ok(sym)
        } else {
            let found = self.peek().clone();
            Err(ParseError::UnexpectedToken { expected: what, found })
        }
    }
}

fn assign_op_of(form: TokenForm) -> Option<AssignOp> {
    Some(match form {
        TokenForm::Assign => AssignOp::Assign,
        TokenForm::StarEq => AssignOp::MulAssign,
        TokenForm::SlashEq => AssignOp::DivAssign,
        TokenForm::PercentEq => AssignOp::ModAssign,
        TokenForm::PlusEq => AssignOp::AddAssign,
        TokenForm::MinusEq => AssignOp::SubAssign,
        TokenForm::ShlEq => AssignOp::ShlAssign,
        TokenForm::ShrEq => AssignOp::ShrAssign,
        TokenForm::AmpEq => AssignOp::AndAssign,
        TokenForm::CaretEq => AssignOp::XorAssign,
        TokenForm::PipeEq => AssignOp::OrAssign,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Arena;
    use crate::parser::tests::*;
    use crate::parser::ParserScopes;

    fn parse_expr_str(tokens: Vec<crate::token::Token>) -> Expr<'static> {
        // Leak the arena so the returned `Expr<'a>` can outlive this
        // function in tests; acceptable since tests are short-lived
        // processes.
        let arena: &'static Arena = Box::leak(Box::new(Arena::new()));
        let sink: &'static mut crate::diag::VecSink = Box::leak(Box::new(crate::diag::VecSink::new()));
        let tokens: &'static [crate::token::Token] = Box::leak(tokens.into_boxed_slice());
        let mut p = Parser::new(tokens, arena, ParserScopes::new(), sink);
        p.parse_expression().expect("expression should parse")
    }

    #[test]
    fn left_associativity_of_additive_expression() {
        // a - b - c
        let tokens = vec![
            ident("a"),
            punct(TokenForm::Minus, "-"),
            ident("b"),
            punct(TokenForm::Minus, "-"),
            ident("c"),
            eof(),
        ];
        let expr = parse_expr_str(tokens);
        match expr.kind {
            ExprKind::Binary(BinOp::Sub, lhs, _rhs) => {
                assert!(matches!(lhs.kind, ExprKind::Binary(BinOp::Sub, _, _)), "left child must itself be additive");
            }
            _ => panic!("expected a subtraction at the top"),
        }
    }

    #[test]
    fn assignment_backtracks_to_conditional_when_no_operator_follows() {
        // a ? b : c   (no leading unary-expression '=' form applies)
        let tokens = vec![
            ident("a"),
            punct(TokenForm::Question, "?"),
            ident("b"),
            punct(TokenForm::Colon, ":"),
            ident("c"),
            eof(),
        ];
        let expr = parse_expr_str(tokens);
        assert!(matches!(expr.kind, ExprKind::Conditional(..)));
    }

    #[test]
    fn assignment_parses_rhs_as_assignment_expression_recursively() {
        // a = b = c
        let tokens = vec![
            ident("a"),
            punct(TokenForm::Assign, "="),
            ident("b"),
            punct(TokenForm::Assign, "="),
            ident("c"),
            eof(),
        ];
        let expr = parse_expr_str(tokens);
        match expr.kind {
            ExprKind::Assign(AssignOp::Assign, _, rhs) => {
                assert!(matches!(rhs.kind, ExprKind::Assign(AssignOp::Assign, _, _)));
            }
            _ => panic!("expected top-level assignment"),
        }
    }

    #[test]
    fn sizeof_int_parses_as_sizeof_type() {
        let tokens = vec![
            keyword(TokenForm::Sizeof, "sizeof"),
            punct(TokenForm::OpenParen, "("),
            keyword(TokenForm::Int, "int"),
            punct(TokenForm::CloseParen, ")"),
            eof(),
        ];
        let expr = parse_expr_str(tokens);
        assert!(matches!(expr.kind, ExprKind::SizeofType(_)));
    }

    #[test]
    fn array_index_and_call_chain_left_to_right() {
        // f(a)[0]
        let tokens = vec![
            ident("f"),
            punct(TokenForm::OpenParen, "("),
            ident("a"),
            punct(TokenForm::CloseParen, ")"),
            punct(TokenForm::OpenBracket, "["),
            int_tok(0),
            punct(TokenForm::CloseBracket, "]"),
            eof(),
        ];
        let expr = parse_expr_str(tokens);
        match expr.kind {
            ExprKind::Index(base, _) => assert!(matches!(base.kind, ExprKind::Call(..))),
            _ => panic!("expected an index expression wrapping a call"),
        }
    }
}
