//! Path expressions, steps, predicates, node tests and primary expressions.

use std::sync::Arc;

use rust_decimal::Decimal;

use super::ast::{Axis, Expr, ExprKind, Literal, Location, VarRef};
use super::scope::DepthGuard;
use super::token::Token;
use super::{ExpressionParser, Language, PResult};
use crate::error::{Error, ErrorCode};
use crate::names::is_ncname;
use crate::types::{NodeKind, NodeTest};

fn descendant_or_self(loc: Location) -> Expr {
    Expr::new(ExprKind::AxisStep { axis: Axis::DescendantOrSelf, test: NodeTest::AnyNode }, loc)
}

fn path(start: Expr, step: Expr, loc: Location) -> Expr {
    Expr::new(ExprKind::Path { start: Box::new(start), step: Box::new(step) }, loc)
}

/// Tree levels added by joining a step with `/` or `//`.
fn path_levels(separator: Token) -> usize {
    if separator == Token::SlSl { 2 } else { 1 }
}

/// Join `exp` and `next` with `/`, or with `//` expanded to `/descendant-or-self::node()/`.
fn join_steps(exp: Expr, separator: Token, next: Expr, loc: Location) -> Expr {
    if separator == Token::SlSl {
        let step = path(descendant_or_self(loc), next, loc);
        path(exp, step, loc)
    } else {
        path(exp, next, loc)
    }
}

/// The tokenizer only yields digit strings here, so every input is a valid integer.
fn integer_literal(digits: &str) -> Literal {
    match digits.parse() {
        Ok(value) => Literal::Integer(value),
        Err(_) => {
            let significant = digits.trim_start_matches('0');
            Literal::BigInteger(if significant.is_empty() { "0" } else { significant }.to_string())
        }
    }
}

/// `.5` and `5.` are valid decimal literals but not valid `rust_decimal` input.
/// Fractional digits beyond the 28 that `Decimal` carries are rounded.
fn decimal_literal(lexical: &str) -> Result<Literal, rust_decimal::Error> {
    let mut text = String::with_capacity(lexical.len() + 2);
    if lexical.starts_with('.') {
        text.push('0');
    }
    text.push_str(lexical);
    if lexical.ends_with('.') {
        text.push('0');
    }
    text.parse::<Decimal>().map(Literal::Decimal)
}

impl ExpressionParser<'_> {
    fn at_start_of_relative_path(&self) -> bool {
        matches!(
            self.t.current_token,
            Token::Axis
                | Token::At
                | Token::Name
                | Token::Prefix
                | Token::Suffix
                | Token::Star
                | Token::NodeKind
                | Token::Dot
                | Token::DotDot
                | Token::Function
                | Token::StringLiteral
                | Token::Number
                | Token::LPar
                | Token::Dollar
        )
    }

    /// Two-word operators are recognised after a lone `/` but may not follow it.
    fn disallowed_at_start_of_relative_path(&self) -> bool {
        matches!(
            self.t.current_token,
            Token::CastAs | Token::CastableAs | Token::InstanceOf | Token::TreatAs
        )
    }

    pub(crate) fn parse_path_expression(&mut self) -> PResult<Expr> {
        let loc = self.loc();
        match self.t.current_token {
            Token::Slash => {
                self.next_token()?;
                let root = Expr::new(ExprKind::Root, loc);
                if self.disallowed_at_start_of_relative_path() {
                    return self.grumble(format!("Operator '{}' is not allowed after '/'", self.t.current_token));
                }
                if self.at_start_of_relative_path() {
                    self.parse_remaining_path(root, loc)
                } else {
                    Ok(root)
                }
            }
            Token::SlSl => {
                // `//A/B` is `((/descendant-or-self::node())/A)/B`.
                self.next_token()?;
                let start = path(Expr::new(ExprKind::Root, loc), descendant_or_self(loc), loc);
                self.parse_remaining_path(start, loc)
            }
            _ => self.parse_relative_path(),
        }
    }

    fn parse_relative_path(&mut self) -> PResult<Expr> {
        let first_in_pattern = self.language == Language::XsltPattern;
        let mut p = DepthGuard::enter(self);
        let mut exp = p.parse_step_expression(first_in_pattern)?;
        while matches!(p.t.current_token, Token::Slash | Token::SlSl) {
            let separator = p.t.current_token;
            let loc = p.loc();
            p.descend(path_levels(separator))?;
            p.next_token()?;
            let next = p.parse_step_expression(false)?;
            exp = join_steps(exp, separator, next, loc);
        }
        Ok(exp)
    }

    /// Steps after a leading `/` or `//`, whose first token has already been read.
    fn parse_remaining_path(&mut self, start: Expr, loc: Location) -> PResult<Expr> {
        let mut p = DepthGuard::enter(self);
        let mut exp = start;
        let mut separator = Token::Slash;
        let mut loc = loc;
        loop {
            p.descend(path_levels(separator))?;
            let next = p.parse_step_expression(false)?;
            exp = join_steps(exp, separator, next, loc);
            separator = p.t.current_token;
            if !matches!(separator, Token::Slash | Token::SlSl) {
                return Ok(exp);
            }
            loc = p.loc();
            p.next_token()?;
        }
    }

    /// A step with its predicates. Predicates on a reverse-axis step see the
    /// nodes in axis order; the filtered result is then put back into document order.
    fn parse_step_expression(&mut self, first_in_pattern: bool) -> PResult<Expr> {
        let mut p = DepthGuard::enter(self);
        let mut step = p.parse_basic_step(first_in_pattern)?;
        let reverse = matches!(&step.kind, ExprKind::AxisStep { axis, .. } if axis.is_reverse());
        while p.t.current_token == Token::LSqb {
            let loc = p.loc();
            p.descend(1)?;
            p.next_token()?;
            let predicate = p.parse_expression()?;
            p.expect(Token::RSqb)?;
            p.next_token()?;
            step = Expr::new(ExprKind::Filter { base: Box::new(step), predicate: Box::new(predicate) }, loc);
        }
        if reverse {
            let loc = step.loc;
            step = Expr::new(ExprKind::Reverse(Box::new(step)), loc);
        }
        Ok(step)
    }

    fn parse_basic_step(&mut self, first_in_pattern: bool) -> PResult<Expr> {
        let loc = self.loc();
        match self.t.current_token {
            Token::Dollar => self.parse_variable_reference(),
            Token::LPar => {
                self.next_token()?;
                if self.t.current_token == Token::RPar {
                    self.next_token()?;
                    return Ok(Expr::new(ExprKind::Literal(Literal::EmptySequence), loc));
                }
                let inner = self.parse_expression()?;
                self.expect(Token::RPar)?;
                self.next_token()?;
                Ok(inner)
            }
            Token::StringLiteral => {
                let value = self.t.current_value.to_string();
                self.next_token()?;
                Ok(Expr::new(ExprKind::Literal(Literal::String(value)), loc))
            }
            Token::Number => self.parse_numeric_literal(),
            Token::Function => self.parse_function_call(),
            Token::Dot => {
                self.next_token()?;
                Ok(Expr::new(ExprKind::ContextItem, loc))
            }
            Token::DotDot => {
                self.next_token()?;
                Ok(Expr::new(ExprKind::ParentNode, loc))
            }
            Token::NodeKind | Token::Name | Token::Prefix | Token::Suffix | Token::Star => {
                let kind_test = (self.t.current_token == Token::NodeKind).then_some(self.t.current_value.as_str());
                let axis = match kind_test {
                    Some("attribute" | "schema-attribute") => Axis::Attribute,
                    Some("document-node") if first_in_pattern => Axis::SelfAxis,
                    _ => Axis::Child,
                };
                let test = self.parse_node_test(NodeKind::Element)?;
                Ok(Expr::new(ExprKind::AxisStep { axis, test }, loc))
            }
            Token::At => {
                self.next_token()?;
                if !self.at_node_test() {
                    return self.grumble("@ must be followed by a NodeTest");
                }
                let test = self.parse_node_test(NodeKind::Attribute)?;
                Ok(Expr::new(ExprKind::AxisStep { axis: Axis::Attribute, test }, loc))
            }
            Token::Axis => {
                let Some(axis) = Axis::from_name(&self.t.current_value) else {
                    return self.grumble(format!("'{}' is not a valid axis name", self.t.current_value));
                };
                self.next_token()?;
                if !self.at_node_test() {
                    return self.grumble(format!(
                        "Unexpected token {} after axis name",
                        self.current_token_display()
                    ));
                }
                let test = self.parse_node_test(axis.principal_node_kind())?;
                Ok(Expr::new(ExprKind::AxisStep { axis, test }, loc))
            }
            _ => self.grumble(format!("Unexpected token {} in path expression", self.current_token_display())),
        }
    }

    fn at_node_test(&self) -> bool {
        matches!(
            self.t.current_token,
            Token::Name | Token::Prefix | Token::Suffix | Token::Star | Token::NodeKind
        )
    }

    /// A name test, wildcard or kind test. `kind` is the principal node kind of the axis.
    fn parse_node_test(&mut self, kind: NodeKind) -> PResult<NodeTest> {
        match self.t.current_token {
            Token::Name => {
                let name = self.make_structured_qname(&self.t.current_value, kind == NodeKind::Element)?;
                self.next_token()?;
                Ok(NodeTest::Name { kind, name })
            }
            Token::Prefix => {
                let uri = self
                    .env
                    .uri_for_prefix(&self.t.current_value)
                    .map_err(|e| self.static_error(ErrorCode::XPST0081, e.message))?;
                self.next_token()?;
                Ok(NodeTest::Namespace { kind, uri: (!uri.is_empty()).then_some(uri) })
            }
            Token::Suffix => {
                self.next_token()?;
                let local = self.t.current_value.to_string();
                self.expect(Token::Name)?;
                if !is_ncname(&local) {
                    return self.grumble(format!("Local name [{local}] contains invalid characters"));
                }
                self.next_token()?;
                Ok(NodeTest::LocalName { kind, local })
            }
            Token::Star => {
                self.next_token()?;
                Ok(NodeTest::Kind(kind))
            }
            Token::NodeKind => self.parse_kind_test(),
            _ => self.grumble("Unrecognized node test"),
        }
    }

    fn parse_numeric_literal(&mut self) -> PResult<Expr> {
        let loc = self.loc();
        let lexical = self.t.current_value.as_str();
        let literal = if lexical.contains(['e', 'E']) {
            lexical.parse().map(Literal::Double).map_err(|e| self.invalid_number(lexical, e))?
        } else if lexical.contains('.') {
            decimal_literal(lexical).map_err(|e| self.invalid_number(lexical, e))?
        } else {
            integer_literal(lexical)
        };
        self.next_token()?;
        Ok(Expr::new(ExprKind::Literal(literal), loc))
    }

    fn invalid_number(&self, lexical: &str, cause: impl std::error::Error + Send + Sync + 'static) -> Error {
        let source: Arc<dyn std::error::Error + Send + Sync> = Arc::new(cause);
        self.syntax_error(format!("Invalid numeric literal \"{lexical}\"")).with_source(source)
    }

    /// `$name`: a range variable if one is in scope, otherwise a context variable.
    fn parse_variable_reference(&mut self) -> PResult<Expr> {
        let loc = self.loc();
        self.next_token()?;
        self.expect(Token::Name)?;
        let lexical = self.t.current_value.clone();
        self.next_token()?;
        let name = self.make_structured_qname(&lexical, false)?;
        let reference = match self.range_variables.find(&name) {
            Some(binding) => VarRef::Range {
                id: binding.id,
                name: binding.name.clone(),
                required_type: binding.required_type.clone(),
            },
            None => match self.env.bind_variable(&name) {
                Ok(var) => VarRef::Context { name: var.name, declared_type: var.declared_type },
                Err(e) if e.code_enum() == ErrorCode::XPST0008 => {
                    return self
                        .grumble_with(ErrorCode::XPST0008, format!("Variable ${lexical} has not been declared"));
                }
                Err(e) => return Err(self.locate(e)),
            },
        };
        Ok(Expr::new(ExprKind::VarRef(reference), loc))
    }
}
