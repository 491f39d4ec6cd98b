//! Recursive-descent parser for XPath 2.0 expressions, XSLT match patterns and
//! SequenceTypes. Names, variables, types and functions are resolved against a
//! [`StaticContext`] while parsing, so the tree that comes out is already bound.

pub mod ast;
mod calls;
mod operators;
mod paths;
mod scope;
mod sequence_type;
pub mod token;
pub mod tokenizer;

use crate::context::StaticContext;
use crate::error::{Error, ErrorCode};
use crate::names::split_qname;
use crate::types::SequenceType;
use crate::xdm::ExpandedName;

use ast::{Expr, Location};
use scope::ScopeStack;
use token::Token;
use tokenizer::Tokenizer;

pub type PResult<T> = Result<T, Error>;

/// The grammar being parsed. It selects the default error code and a few
/// pattern-only rules; the productions themselves are shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    XPath,
    XsltPattern,
    SequenceType,
}

impl Language {
    fn display_name(self) -> &'static str {
        match self {
            Language::XPath => "XPath",
            Language::XsltPattern => "XSLT Pattern",
            Language::SequenceType => "SequenceType",
        }
    }
}

/// One parse over one source string. Not reusable: create a new parser per input.
pub struct ExpressionParser<'a> {
    pub(crate) t: Tokenizer<'a>,
    pub(crate) env: &'a dyn StaticContext,
    pub(crate) range_variables: ScopeStack,
    /// Levels of the tree under construction, bounded by `scope::MAX_DEPTH`.
    pub(crate) depth: usize,
    language: Language,
}

impl<'a> ExpressionParser<'a> {
    pub fn new(source: &'a str, start: usize, env: &'a dyn StaticContext, language: Language) -> Self {
        Self {
            t: Tokenizer::new(source, start),
            env,
            range_variables: ScopeStack::default(),
            depth: 0,
            language,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Parse a complete expression that must be followed by `terminator`
    /// (`Token::Eof`, or `Token::RCurly` inside an attribute value template).
    pub fn parse(&mut self, terminator: Token) -> PResult<Expr> {
        self.next_token()?;
        let expr = self.parse_expression()?;
        if self.t.current_token != terminator {
            if self.t.current_token == Token::Eof && terminator == Token::RCurly {
                return self.grumble_with(
                    ErrorCode::XTSE0350,
                    "Missing curly brace after expression in attribute value template",
                );
            }
            return self.grumble(format!(
                "Unexpected token {} beyond end of expression",
                self.current_token_display()
            ));
        }
        Ok(expr)
    }

    /// Parse a source that consists of exactly one SequenceType.
    pub fn parse_sequence_type_root(&mut self) -> PResult<SequenceType> {
        self.next_token()?;
        let ty = self.parse_sequence_type()?;
        if self.t.current_token != Token::Eof {
            return self.grumble(format!(
                "Unexpected token {} beyond end of SequenceType",
                self.current_token_display()
            ));
        }
        Ok(ty)
    }

    /// Byte offset of the current token; after [`ExpressionParser::parse`] this is
    /// where the terminator starts.
    pub fn end_offset(&self) -> usize {
        self.t.current_offset
    }

    /// Number of range variables currently bound. Zero between top-level parses.
    pub fn range_variables_in_scope(&self) -> usize {
        self.range_variables.len()
    }

    pub(crate) fn loc(&self) -> Location {
        Location { offset: self.t.current_offset }
    }

    /// Advance the cursor. Lexical errors are reported like syntax errors.
    pub(crate) fn next_token(&mut self) -> PResult<()> {
        match self.t.next() {
            Ok(()) => Ok(()),
            Err(e) => self.grumble(e.message),
        }
    }

    /// Fail unless the current token is `token`. Does not advance.
    pub(crate) fn expect(&self, token: Token) -> PResult<()> {
        if self.t.current_token != token {
            return self.grumble(format!("expected \"{token}\", found {}", self.current_token_display()));
        }
        Ok(())
    }

    fn default_code(&self) -> ErrorCode {
        match self.language {
            Language::XsltPattern => ErrorCode::XTSE0340,
            _ => ErrorCode::XPST0003,
        }
    }

    fn recent_context(&self) -> String {
        let recent = self.t.recent_text();
        let position = if recent.starts_with("...") { "near" } else { "in" };
        format!("{position} {{{recent}}}:\n    ")
    }

    /// Attach location text to an error raised here or by a collaborator.
    pub(crate) fn locate(&self, mut err: Error) -> Error {
        if err.location.is_none() {
            err.location = Some(format!("{} syntax error {}", self.language.display_name(), self.recent_context()));
        }
        tracing::debug!(code = %err.format_code(), error = %err.message, "static error raised");
        err
    }

    pub(crate) fn static_error(&self, code: ErrorCode, message: impl Into<String>) -> Error {
        self.locate(Error::static_code(code, message))
    }

    /// A syntax error with the default code for the language being parsed.
    pub(crate) fn syntax_error(&self, message: impl Into<String>) -> Error {
        self.static_error(self.default_code(), message)
    }

    pub(crate) fn grumble<T>(&self, message: impl Into<String>) -> PResult<T> {
        Err(self.syntax_error(message))
    }

    pub(crate) fn grumble_with<T>(&self, code: ErrorCode, message: impl Into<String>) -> PResult<T> {
        Err(self.static_error(code, message))
    }

    pub(crate) fn warning(&self, message: &str) {
        self.env.issue_warning(&format!("{}{message}", self.recent_context()));
    }

    pub(crate) fn current_token_display(&self) -> String {
        match self.t.current_token {
            Token::Name => format!("name \"{}\"", self.t.current_value),
            Token::Unknown => "(unknown token)".to_string(),
            Token::Function => format!("\"{}(\"", self.t.current_value),
            other => format!("\"{other}\""),
        }
    }

    /// Resolve a lexical QName. Unprefixed names take the default element
    /// namespace when `use_default` is set and no namespace otherwise.
    pub(crate) fn make_structured_qname(&self, lexical: &str, use_default: bool) -> PResult<ExpandedName> {
        let (prefix, local) = split_qname(lexical).map_err(|m| self.syntax_error(m))?;
        if prefix.is_empty() {
            let ns = if use_default { self.env.default_element_namespace() } else { None };
            return Ok(ExpandedName::new(ns, local));
        }
        let uri = self.env.uri_for_prefix(prefix).map_err(|e| self.locate(e))?;
        Ok(ExpandedName::new(Some(&uri), local))
    }
}

/// Parse an XPath expression spanning the whole of `source`.
pub fn parse_expression(source: &str, env: &dyn StaticContext) -> PResult<Expr> {
    parse_expression_at(source, 0, Token::Eof, env)
}

/// Parse an XPath expression starting at byte offset `start` and ending at `terminator`.
pub fn parse_expression_at(source: &str, start: usize, terminator: Token, env: &dyn StaticContext) -> PResult<Expr> {
    tracing::debug!(source, start, "parsing expression");
    let expr = ExpressionParser::new(source, start, env, Language::XPath).parse(terminator)?;
    tracing::debug!(tree = %expr, "parsed expression");
    Ok(expr)
}

/// Parse an XSLT 2.0 match pattern.
pub fn parse_pattern(source: &str, env: &dyn StaticContext) -> PResult<Expr> {
    tracing::debug!(source, "parsing pattern");
    let expr = ExpressionParser::new(source, 0, env, Language::XsltPattern).parse(Token::Eof)?;
    tracing::debug!(tree = %expr, "parsed pattern");
    Ok(expr)
}

/// Parse a standalone SequenceType such as `element(foo)*` or `xs:integer?`.
pub fn parse_sequence_type(source: &str, env: &dyn StaticContext) -> PResult<SequenceType> {
    tracing::debug!(source, "parsing sequence type");
    ExpressionParser::new(source, 0, env, Language::SequenceType).parse_sequence_type_root()
}
