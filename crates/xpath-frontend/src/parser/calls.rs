//! Function calls: name resolution, binding against the function library, and
//! the rewrites applied at bind time.

use itertools::Itertools;

use super::ast::{Expr, ExprKind, Literal};
use super::token::Token;
use super::{ExpressionParser, Language, PResult};
use crate::error::{Error, ErrorCode};
use crate::functions::FunctionKind;
use crate::names::split_qname;
use crate::types::AtomicType;
use crate::xdm::ExpandedName;

impl ExpressionParser<'_> {
    /// `QName '(' (ExprSingle (',' ExprSingle)*)? ')'`; the tokenizer has already consumed the `(`.
    pub(crate) fn parse_function_call(&mut self) -> PResult<Expr> {
        let loc = self.loc();
        let name = self.resolve_function_name(&self.t.current_value)?;
        self.next_token()?;
        let mut args = Vec::new();
        if self.t.current_token != Token::RPar {
            loop {
                args.push(self.parse_expr_single()?);
                if self.t.current_token != Token::Comma {
                    break;
                }
                self.next_token()?;
            }
            self.expect(Token::RPar)?;
        }
        self.next_token()?;

        let library = self.env.function_library();
        let bound = library.bind(&name, args.len()).map_err(|e| self.locate(e))?;
        let Some(function) = bound else {
            let mut message = format!(
                "Cannot find a matching {}-argument function named {}()",
                args.len(),
                name.clark_name()
            );
            let known = library.arities(&name);
            if !known.is_empty() {
                message.push_str(&format!(
                    ". The function exists with {} argument(s)",
                    known.iter().join(" or ")
                ));
            }
            if self.env.is_backwards_compatible() {
                tracing::debug!(function = %name, arity = args.len(), "deferring unknown function to evaluation");
                let err = Error::dynamic(ErrorCode::XTDE1425, message);
                return Ok(Expr::new(ExprKind::Error(err), loc));
            }
            return self.grumble_with(ErrorCode::XPST0017, message);
        };

        if function.kind == FunctionKind::Constructor(AtomicType::QName)
            && let Some(lexical) = args.first().and_then(Expr::as_string_literal)
        {
            let literal = self.cast_string_to_qname(lexical).map_err(|e| self.locate(e))?;
            return Ok(Expr::new(ExprKind::Literal(literal), loc));
        }

        if self.language == Language::XsltPattern {
            match function.kind {
                FunctionKind::RegexGroup => {
                    return Ok(Expr::new(ExprKind::Literal(Literal::EmptySequence), loc));
                }
                FunctionKind::CurrentGroup => {
                    return self.grumble_with(
                        ErrorCode::XTSE1060,
                        "The current-group() function cannot be used in a pattern",
                    );
                }
                FunctionKind::CurrentGroupingKey => {
                    return self.grumble_with(
                        ErrorCode::XTSE1070,
                        "The current-grouping-key() function cannot be used in a pattern",
                    );
                }
                _ => {}
            }
        }
        Ok(Expr::new(ExprKind::FunctionCall { function, args }, loc))
    }

    /// Unprefixed function names are in the default function namespace.
    fn resolve_function_name(&self, lexical: &str) -> PResult<ExpandedName> {
        let Ok((prefix, local)) = split_qname(lexical) else {
            return self.grumble_with(
                ErrorCode::XPST0003,
                format!("Function name is not a valid QName: {lexical}()"),
            );
        };
        if prefix.is_empty() {
            return Ok(ExpandedName::new(self.env.default_function_namespace(), local));
        }
        let uri = self
            .env
            .uri_for_prefix(prefix)
            .map_err(|e| self.static_error(ErrorCode::XPST0081, e.message))?;
        Ok(ExpandedName::new(Some(&uri), local))
    }

    /// Evaluate `xs:QName("p:local")` while the in-scope namespaces are known.
    /// Unprefixed names take the default element namespace. The error is not yet
    /// located, so `castable as` can test the outcome quietly.
    pub(crate) fn cast_string_to_qname(&self, source: &str) -> Result<Literal, Error> {
        let lexical = source.trim_matches([' ', '\t', '\n', '\r']);
        let (prefix, local) = split_qname(lexical)
            .map_err(|_| Error::static_code(ErrorCode::FORG0001, format!("Invalid QName \"{lexical}\"")))?;
        if prefix.is_empty() {
            return Ok(Literal::QName {
                prefix: None,
                name: ExpandedName::new(self.env.default_element_namespace(), local),
            });
        }
        let uri = self.env.uri_for_prefix(prefix).map_err(|_| {
            Error::static_code(ErrorCode::FONS0004, format!("Namespace prefix '{prefix}' has not been declared"))
        })?;
        Ok(Literal::QName { prefix: Some(prefix.to_string()), name: ExpandedName::new(Some(&uri), local) })
    }
}
