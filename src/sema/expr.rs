//! Expression type synthesis and constant folding (§4.4, "Expression
//! processing"). Every node's `annotation` is filled in a single bottom-up
//! pass: operands are annotated first, then the node's own type and (when
//! every operand participating is itself a constant expression) constant
//! value are derived from them.

use crate::ast::{BinOp, Expr, ExprKind, UnaryOp};
use crate::symtab::ScopeChain;
use crate::types::{BasicKind, Type};

use super::{Annotator, SemaError, SemaResult};

fn truncate_to(ty: &Type, opts: &crate::options::CompileOptions, val: i64) -> i64 {
    match ty.sizeof(opts) {
        Ok(1) => val as i8 as i64,
        Ok(2) => val as i16 as i64,
        Ok(4) => val as i32 as i64,
        _ => val,
    }
}

impl<'d> Annotator<'d> {
    /// Picks the wider of two arithmetic types by byte size, a simplified
    /// stand-in for the usual arithmetic conversions (no separate rank
    /// table for signed-vs-unsigned ties — ties keep the left operand).
    fn usual_arithmetic_result(&self, l: &Type, r: &Type) -> Type {
        if l.is_real_floating() && !r.is_real_floating() {
            return l.clone();
        }
        if r.is_real_floating() && !l.is_real_floating() {
            return r.clone();
        }
        let lsz = l.sizeof(&self.opts).unwrap_or(self.opts.int_size);
        let rsz = r.sizeof(&self.opts).unwrap_or(self.opts.int_size);
        if rsz > lsz { r.clone() } else { l.clone() }
    }

    pub(crate) fn annotate_expr<'a, 's>(&mut self, expr: &mut Expr<'a>, chain: &ScopeChain<'s>) -> SemaResult<()> {
        match &mut expr.kind {
            ExprKind::IntConst(v) => {
                expr.annotation.ty = Some(Type::basic(BasicKind::Int));
                expr.annotation.constant_evaluation = true;
                expr.annotation.constant_val = *v;
            }
            ExprKind::CharConst(v) => {
                expr.annotation.ty = Some(Type::basic(BasicKind::Char));
                expr.annotation.constant_evaluation = true;
                expr.annotation.constant_val = *v;
            }
            ExprKind::FloatConst(_) => {
                expr.annotation.ty = Some(Type::basic(BasicKind::Float));
            }
            ExprKind::StringLit(_) => {
                expr.annotation.ty = Some(Type::pointer_to(Type::basic(BasicKind::Char)));
            }
            ExprKind::Ident(name) => match chain.lookup(*name) {
                Some((_, entry)) => {
                    let e = entry.borrow();
                    expr.annotation.ty = Some(e.ty.clone());
                    expr.annotation.symbol = Some(*name);
                    if let Some(value) = e.value {
                        expr.annotation.constant_evaluation = true;
                        expr.annotation.constant_val = value;
                    }
                }
                None => {
                    let name = *name;
                    self.error_at("undeclared-identifier", format!("use of undeclared identifier '{name}'"), Some(expr.loc));
                    return Err(SemaError::UndeclaredIdentifier(name));
                }
            },
            ExprKind::Index(base, index) => {
                self.annotate_expr(base, chain)?;
                self.annotate_expr(index, chain)?;
                if let Some(bt) = base.annotation.ty.clone() {
                    let elem = bt.element_type().or_else(|_| bt.dereference());
                    if let Ok(t) = elem {
                        expr.annotation.ty = Some(t.clone());
                    }
                }
            }
            ExprKind::Call(callee, args) => {
                self.annotate_expr(callee, chain)?;
                for a in args.iter_mut() {
                    self.annotate_expr(a, chain)?;
                }
                let Some(ct) = callee.annotation.ty.clone() else { return Ok(()) };
                if !ct.is_function() {
                    self.error_at("not-callable", "called object is not a function", Some(expr.loc));
                    return Err(SemaError::NotCallable);
                }
                if let Ok(params) = ct.parameters() {
                    if !ct.is_variadic() && params.len() != args.len() {
                        let (expected, found) = (params.len(), args.len());
                        self.error_at(
                            "call-arity-mismatch",
                            format!("expected {expected} argument(s), found {found}"),
                            Some(expr.loc),
                        );
                        return Err(SemaError::CallArityMismatch { expected, found });
                    }
                }
                if let Ok(ret) = ct.return_type() {
                    expr.annotation.ty = Some(ret.clone());
                }
            }
            ExprKind::Member { base, field, arrow } => {
                self.annotate_expr(base, chain)?;
                let field = *field;
                let arrow = *arrow;
                if let Some(bt) = base.annotation.ty.clone() {
                    let agg = if arrow { bt.dereference().ok().cloned() } else { Some(bt) };
                    if let Some(Type { kind: crate::types::TypeKind::Aggregate { members, .. }, .. }) = agg {
                        if let Some(m) = members.iter().find(|m| m.name == field) {
                            expr.annotation.ty = Some((*m.ty).clone());
                        }
                    }
                }
            }
            ExprKind::Unary(op, operand) => {
                self.annotate_expr(operand, chain)?;
                let op = *op;
                match op {
                    UnaryOp::AddressOf => {
                        expr.annotation.ty = operand.annotation.ty.clone().map(Type::pointer_to);
                    }
                    UnaryOp::Deref => {
                        expr.annotation.ty = operand.annotation.ty.as_ref().and_then(|t| t.dereference().ok().cloned());
                    }
                    UnaryOp::PreInc | UnaryOp::PreDec => {
                        expr.annotation.ty = operand.annotation.ty.clone();
                    }
                    UnaryOp::Plus | UnaryOp::Minus | UnaryOp::BitNot | UnaryOp::LogicalNot => {
                        expr.annotation.ty = operand.annotation.ty.clone();
                        if operand.annotation.constant_evaluation {
                            let v = operand.annotation.constant_val;
                            expr.annotation.constant_evaluation = true;
                            expr.annotation.constant_val = match op {
                                UnaryOp::Plus => v,
                                UnaryOp::Minus => v.wrapping_neg(),
                                UnaryOp::BitNot => !v,
                                UnaryOp::LogicalNot => i64::from(v == 0),
                                _ => unreachable!(),
                            };
                        }
                    }
                }
            }
            ExprKind::PostOp(_, operand) => {
                self.annotate_expr(operand, chain)?;
                expr.annotation.ty = operand.annotation.ty.clone();
            }
            ExprKind::SizeofExpr(operand) => {
                self.annotate_expr(operand, chain)?;
                expr.annotation.ty = Some(Type::basic(BasicKind::Int));
                if let Some(t) = operand.annotation.ty.clone() {
                    if let Ok(sz) = t.sizeof(&self.opts) {
                        expr.annotation.constant_evaluation = true;
                        expr.annotation.constant_val = i64::from(sz);
                    }
                }
            }
            ExprKind::SizeofType(ty) => {
                let resolved = self.resolve_type(ty, None, chain);
                expr.annotation.ty = Some(Type::basic(BasicKind::Int));
                if let Ok(sz) = resolved.sizeof(&self.opts) {
                    expr.annotation.constant_evaluation = true;
                    expr.annotation.constant_val = i64::from(sz);
                }
                *ty = resolved;
            }
            ExprKind::Cast(ty, operand) => {
                self.annotate_expr(operand, chain)?;
                let resolved = self.resolve_type(ty, None, chain);
                *ty = resolved.clone();
                if resolved.is_integer() && operand.annotation.constant_evaluation {
                    expr.annotation.constant_evaluation = true;
                    expr.annotation.constant_val = truncate_to(&resolved, &self.opts, operand.annotation.constant_val);
                }
                expr.annotation.ty = Some(resolved);
            }
            ExprKind::Binary(op, l, r) => {
                self.annotate_expr(l, chain)?;
                self.annotate_expr(r, chain)?;
                let op = *op;
                let result_ty = match op {
                    BinOp::Add | BinOp::Sub => match (l.annotation.ty.clone(), r.annotation.ty.clone()) {
                        (Some(lt), Some(_)) if lt.is_pointer() => Some(lt),
                        (Some(_), Some(rt)) if rt.is_pointer() && op == BinOp::Add => Some(rt),
                        (Some(lt), Some(rt)) => Some(self.usual_arithmetic_result(&lt, &rt)),
                        _ => None,
                    },
                    BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge | BinOp::Eq | BinOp::Ne | BinOp::LogicalAnd | BinOp::LogicalOr => {
                        Some(Type::basic(BasicKind::Int))
                    }
                    _ => match (l.annotation.ty.clone(), r.annotation.ty.clone()) {
                        (Some(lt), Some(rt)) => Some(self.usual_arithmetic_result(&lt, &rt)),
                        _ => None,
                    },
                };
                expr.annotation.ty = result_ty;
                if l.annotation.constant_evaluation && r.annotation.constant_evaluation {
                    let (a, b) = (l.annotation.constant_val, r.annotation.constant_val);
                    let folded = match op {
                        BinOp::Mul => Some(a.wrapping_mul(b)),
                        BinOp::Div if b != 0 => Some(a.wrapping_div(b)),
                        BinOp::Mod if b != 0 => Some(a.wrapping_rem(b)),
                        BinOp::Add => Some(a.wrapping_add(b)),
                        BinOp::Sub => Some(a.wrapping_sub(b)),
                        BinOp::Shl => Some(a.wrapping_shl(b as u32)),
                        BinOp::Shr => Some(a.wrapping_shr(b as u32)),
                        BinOp::Lt => Some(i64::from(a < b)),
                        BinOp::Gt => Some(i64::from(a > b)),
                        BinOp::Le => Some(i64::from(a <= b)),
                        BinOp::Ge => Some(i64::from(a >= b)),
                        BinOp::Eq => Some(i64::from(a == b)),
                        BinOp::Ne => Some(i64::from(a != b)),
                        BinOp::BitAnd => Some(a & b),
                        BinOp::BitXor => Some(a ^ b),
                        BinOp::BitOr => Some(a | b),
                        BinOp::LogicalAnd => Some(i64::from(a != 0 && b != 0)),
                        BinOp::LogicalOr => Some(i64::from(a != 0 || b != 0)),
                        BinOp::Div | BinOp::Mod => None,
                    };
                    if let Some(v) = folded {
                        expr.annotation.constant_evaluation = true;
                        expr.annotation.constant_val = v;
                    }
                }
            }
            ExprKind::Conditional(c, t, f) => {
                self.annotate_expr(c, chain)?;
                self.annotate_expr(t, chain)?;
                self.annotate_expr(f, chain)?;
                expr.annotation.ty = t.annotation.ty.clone().or_else(|| f.annotation.ty.clone());
                if c.annotation.constant_evaluation {
                    let chosen = if c.annotation.constant_val != 0 { &t } else { &f };
                    if chosen.annotation.constant_evaluation {
                        expr.annotation.constant_evaluation = true;
                        expr.annotation.constant_val = chosen.annotation.constant_val;
                    }
                }
            }
            ExprKind::Assign(_op, l, r) => {
                self.annotate_expr(l, chain)?;
                self.annotate_expr(r, chain)?;
                if let Some(lt) = &l.annotation.ty {
                    if !lt.is_modifiable_lvalue() {
                        self.error_at("not-assignable", "left-hand side of assignment is not a modifiable lvalue", Some(expr.loc));
                        return Err(SemaError::NotAssignable);
                    }
                }
                expr.annotation.ty = l.annotation.ty.clone();
            }
            ExprKind::Comma(l, r) => {
                self.annotate_expr(l, chain)?;
                self.annotate_expr(r, chain)?;
                expr.annotation.ty = r.annotation.ty.clone();
            }
        }
        Ok(())
    }
}
