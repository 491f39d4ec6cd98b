//! Expressions, operator precedence, conditionals and the `for`/`some`/`every`
//! binding constructs.

use smallvec::SmallVec;

use super::ast::{
    BinaryOp, Binding, Expr, ExprKind, GeneralComp, Literal, Location, NodeComp, Quantifier, RangeBinding,
    SetOp, SingleType, UnarySign, ValueComp,
};
use super::scope::{DepthGuard, NESTED_EXPRESSION_COST, RangeScope};
use super::token::Token;
use super::{ExpressionParser, PResult};
use crate::error::ErrorCode;
use crate::types::{AtomicType, Occurrence, SequenceType};

/// A `$v in seq` clause waiting for its action.
struct ForClause {
    variable: Binding,
    sequence: Expr,
}

impl ExpressionParser<'_> {
    /// `ExprSingle (',' ExprSingle)*`
    pub(crate) fn parse_expression(&mut self) -> PResult<Expr> {
        let loc = self.loc();
        let first = self.parse_expr_single()?;
        if self.t.current_token != Token::Comma {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.t.current_token == Token::Comma {
            self.next_token()?;
            items.push(self.parse_expr_single()?);
        }
        Ok(Expr::new(ExprKind::Sequence(items), loc))
    }

    pub(crate) fn parse_expr_single(&mut self) -> PResult<Expr> {
        let mut p = DepthGuard::enter(self);
        p.descend(NESTED_EXPRESSION_COST)?;
        match p.t.current_token {
            Token::For | Token::Some | Token::Every => p.parse_mapping_expression(),
            Token::If => p.parse_if_expression(),
            _ => {
                let lhs = p.parse_unary_expression()?;
                p.parse_binary_expression(lhs, 4)
            }
        }
    }

    fn current_precedence(&self) -> Option<u8> {
        self.t.current_token.precedence()
    }

    /// Precedence climbing over every binary operator from `or` up to `cast as`.
    pub(crate) fn parse_binary_expression(&mut self, mut lhs: Expr, min_precedence: u8) -> PResult<Expr> {
        let mut p = DepthGuard::enter(self);
        while let Some(prec) = p.current_precedence().filter(|level| *level >= min_precedence) {
            let operator = p.t.current_token;
            let loc = p.loc();
            p.descend(1)?;
            match operator {
                Token::InstanceOf | Token::TreatAs => {
                    p.next_token()?;
                    let ty = p.parse_sequence_type()?;
                    let expr = Box::new(lhs);
                    let kind = if operator == Token::InstanceOf {
                        ExprKind::InstanceOf { expr, ty }
                    } else {
                        ExprKind::TreatAs { expr, ty, error_code: ErrorCode::XPDY0050 }
                    };
                    lhs = Expr::new(kind, loc);
                    p.check_left_operand(prec)?;
                }
                Token::CastAs | Token::CastableAs => {
                    p.next_token()?;
                    p.expect(Token::Name)?;
                    let atomic = p.atomic_type(&p.t.current_value)?;
                    if matches!(atomic, AtomicType::AnyAtomic | AtomicType::Notation) {
                        return p.grumble_with(ErrorCode::XPST0080, format!("No value is castable to {atomic}"));
                    }
                    p.next_token()?;
                    let optional = p.t.current_token == Token::QMark;
                    if optional {
                        p.t.treat_current_as_operand_end();
                        p.next_token()?;
                    }
                    lhs = p.make_single_type_expression(lhs, operator, SingleType { atomic, optional }, loc)?;
                    p.check_left_operand(prec)?;
                }
                _ => {
                    p.next_token()?;
                    let mut rhs = p.parse_unary_expression()?;
                    while let Some(next) = p.current_precedence().filter(|level| *level > prec) {
                        rhs = p.parse_binary_expression(rhs, next)?;
                    }
                    lhs = p.make_binary_expression(lhs, operator, rhs, loc)?;
                }
            }
        }
        Ok(lhs)
    }

    /// The type operators do not associate: `a instance of T instance of U` is ambiguous.
    fn check_left_operand(&self, prec: u8) -> PResult<()> {
        if self.current_precedence().is_some_and(|p| p >= prec) {
            return self.grumble(format!("Left operand of '{}' needs parentheses", self.t.current_token));
        }
        Ok(())
    }

    fn make_binary_expression(&self, lhs: Expr, operator: Token, rhs: Expr, loc: Location) -> PResult<Expr> {
        let (left, right) = (Box::new(lhs), Box::new(rhs));
        let kind = if let Some(op) = binary_op(operator) {
            ExprKind::Binary { left, op, right }
        } else if let Some(op) = general_comp(operator) {
            ExprKind::GeneralComparison { left, op, right }
        } else if let Some(op) = value_comp(operator) {
            ExprKind::ValueComparison { left, op, right }
        } else if let Some(op) = node_comp(operator) {
            ExprKind::NodeComparison { left, op, right }
        } else if let Some(op) = set_op(operator) {
            ExprKind::SetOp { left, op, right }
        } else if operator == Token::To {
            ExprKind::Range { start: left, end: right }
        } else {
            return self.grumble(format!("Unexpected operator {operator}"));
        };
        Ok(Expr::new(kind, loc))
    }

    /// `cast as` / `castable as`. A string literal cast to `xs:QName` is resolved
    /// now, while the namespace bindings are known.
    fn make_single_type_expression(
        &self,
        lhs: Expr,
        operator: Token,
        ty: SingleType,
        loc: Location,
    ) -> PResult<Expr> {
        let folded = match (ty.atomic, lhs.as_string_literal()) {
            (AtomicType::QName, Some(lexical)) => Some(self.cast_string_to_qname(lexical)),
            _ => None,
        };
        let kind = match (operator, folded) {
            (Token::CastableAs, Some(result)) => ExprKind::Literal(Literal::Boolean(result.is_ok())),
            (_, Some(result)) => ExprKind::Literal(result.map_err(|e| self.locate(e))?),
            (Token::CastableAs, None) => ExprKind::CastableAs { expr: Box::new(lhs), ty },
            (_, None) => ExprKind::CastAs { expr: Box::new(lhs), ty },
        };
        Ok(Expr::new(kind, loc))
    }

    /// `(for|some|every) $x in E (, $y in E)* (return|satisfies) E`
    ///
    /// Each variable comes into scope after its own sequence, so later clauses
    /// see earlier variables but no clause sees itself. The clauses are folded
    /// into nested bindings once the action is known.
    fn parse_mapping_expression(&mut self) -> PResult<Expr> {
        let loc = self.loc();
        let operator = self.t.current_token;
        let mut clauses: SmallVec<[ForClause; 2]> = SmallVec::new();
        let mut action = {
            let mut scope = RangeScope::enter(self);
            loop {
                scope.next_token()?;
                scope.expect(Token::Dollar)?;
                scope.next_token()?;
                scope.expect(Token::Name)?;
                let name = scope.make_structured_qname(&scope.t.current_value, false)?;
                scope.next_token()?;
                scope.expect(Token::In)?;
                scope.next_token()?;
                let sequence = scope.parse_expr_single()?;
                let variable = scope.range_variables.declare(name);
                clauses.push(ForClause { variable, sequence });
                if scope.t.current_token != Token::Comma {
                    break;
                }
            }
            scope.expect(if operator == Token::For { Token::Return } else { Token::Satisfies })?;
            scope.next_token()?;
            scope.parse_expr_single()?
        };

        // Earliest first: a later sequence may refer to an earlier variable.
        for i in 0..clauses.len() {
            let (done, later) = clauses.split_at_mut(i + 1);
            let clause = &mut done[i];
            let required_type = SequenceType::new(clause.sequence.item_type(), Occurrence::ExactlyOne);
            let id = clause.variable.id;
            for next in later {
                next.sequence.retype_range_variable(id, &required_type);
            }
            action.retype_range_variable(id, &required_type);
            clause.variable.required_type = required_type;
        }

        while let Some(ForClause { variable, sequence }) = clauses.pop() {
            let binding = Box::new(RangeBinding { variable, sequence, action });
            let kind = match operator {
                Token::For => ExprKind::For(binding),
                Token::Some => ExprKind::Quantified { kind: Quantifier::Some, binding },
                _ => ExprKind::Quantified { kind: Quantifier::Every, binding },
            };
            action = Expr::new(kind, loc);
        }
        Ok(action)
    }

    /// `if (E) then E else E`; the tokenizer has already consumed the `(`.
    fn parse_if_expression(&mut self) -> PResult<Expr> {
        let loc = self.loc();
        self.next_token()?;
        let cond = self.parse_expression()?;
        self.expect(Token::RPar)?;
        self.next_token()?;
        self.expect(Token::Then)?;
        self.next_token()?;
        let then_expr = self.parse_expr_single()?;
        self.expect(Token::Else)?;
        self.next_token()?;
        let else_expr = self.parse_expr_single()?;
        Ok(Expr::new(
            ExprKind::IfThenElse {
                cond: Box::new(cond),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            loc,
        ))
    }

    /// `('+'|'-')* PathExpr`
    pub(crate) fn parse_unary_expression(&mut self) -> PResult<Expr> {
        let mut p = DepthGuard::enter(self);
        let mut signs: SmallVec<[(UnarySign, Location); 2]> = SmallVec::new();
        loop {
            let sign = match p.t.current_token {
                Token::Minus => UnarySign::Minus,
                Token::Plus => UnarySign::Plus,
                _ => break,
            };
            p.descend(1)?;
            signs.push((sign, p.loc()));
            p.next_token()?;
        }
        let mut expr = p.parse_path_expression()?;
        while let Some((sign, loc)) = signs.pop() {
            expr = Expr::new(ExprKind::Unary { sign, expr: Box::new(expr) }, loc);
        }
        Ok(expr)
    }
}

fn binary_op(token: Token) -> Option<BinaryOp> {
    Some(match token {
        Token::Or => BinaryOp::Or,
        Token::And => BinaryOp::And,
        Token::Plus => BinaryOp::Add,
        Token::Minus => BinaryOp::Sub,
        Token::Mult => BinaryOp::Mul,
        Token::Div => BinaryOp::Div,
        Token::Idiv => BinaryOp::IDiv,
        Token::Mod => BinaryOp::Mod,
        _ => return None,
    })
}

fn general_comp(token: Token) -> Option<GeneralComp> {
    Some(match token {
        Token::Equals => GeneralComp::Eq,
        Token::Ne => GeneralComp::Ne,
        Token::Lt => GeneralComp::Lt,
        Token::Le => GeneralComp::Le,
        Token::Gt => GeneralComp::Gt,
        Token::Ge => GeneralComp::Ge,
        _ => return None,
    })
}

fn value_comp(token: Token) -> Option<ValueComp> {
    Some(match token {
        Token::FEq => ValueComp::Eq,
        Token::FNe => ValueComp::Ne,
        Token::FLt => ValueComp::Lt,
        Token::FLe => ValueComp::Le,
        Token::FGt => ValueComp::Gt,
        Token::FGe => ValueComp::Ge,
        _ => return None,
    })
}

fn node_comp(token: Token) -> Option<NodeComp> {
    Some(match token {
        Token::Is => NodeComp::Is,
        Token::Precedes => NodeComp::Precedes,
        Token::Follows => NodeComp::Follows,
        _ => return None,
    })
}

fn set_op(token: Token) -> Option<SetOp> {
    Some(match token {
        Token::Union => SetOp::Union,
        Token::Intersect => SetOp::Intersect,
        Token::Except => SetOp::Except,
        _ => return None,
    })
}
