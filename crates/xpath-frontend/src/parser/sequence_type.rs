//! SequenceType, ItemType and KindTest productions.

use super::token::Token;
use super::{ExpressionParser, PResult};
use crate::consts::XS;
use crate::error::ErrorCode;
use crate::names::{is_ncname, split_qname};
use crate::types::{AtomicType, ItemType, NodeKind, NodeTest, Occurrence, SchemaType, SequenceType};
use crate::xdm::ExpandedName;

/// The keyword of a kind test, with the `schema-` forms folded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SystemType {
    Item,
    Node,
    Document,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
    Namespace,
}

fn system_type(keyword: &str) -> Option<SystemType> {
    Some(match keyword {
        "item" => SystemType::Item,
        "node" => SystemType::Node,
        "document-node" => SystemType::Document,
        "element" | "schema-element" => SystemType::Element,
        "attribute" | "schema-attribute" => SystemType::Attribute,
        "text" => SystemType::Text,
        "comment" => SystemType::Comment,
        "processing-instruction" => SystemType::ProcessingInstruction,
        "namespace-node" => SystemType::Namespace,
        _ => return None,
    })
}

fn trim_whitespace(s: &str) -> &str {
    s.trim_matches([' ', '\t', '\n', '\r'])
}

impl ExpressionParser<'_> {
    /// `ItemType OccurrenceIndicator?`, or `empty-sequence()`.
    pub(crate) fn parse_sequence_type(&mut self) -> PResult<SequenceType> {
        let item = self.parse_item_type()?;
        if item == ItemType::Empty {
            return Ok(SequenceType::empty());
        }
        let occurrence = match self.t.current_token {
            // `*` is read as a wildcard or as multiplication depending on what precedes it
            Token::Star | Token::Mult => Occurrence::ZeroOrMore,
            Token::Plus => Occurrence::OneOrMore,
            Token::QMark => Occurrence::ZeroOrOne,
            _ => return Ok(SequenceType::new(item, Occurrence::ExactlyOne)),
        };
        self.t.treat_current_as_operand_end();
        self.next_token()?;
        Ok(SequenceType::new(item, occurrence))
    }

    fn parse_item_type(&mut self) -> PResult<ItemType> {
        match self.t.current_token {
            Token::Name => {
                let atomic = self.atomic_type(&self.t.current_value)?;
                self.next_token()?;
                Ok(ItemType::Atomic(atomic))
            }
            Token::NodeKind if matches!(self.t.current_value.as_str(), "item" | "empty-sequence") => {
                let item = if self.t.current_value == "item" { ItemType::AnyItem } else { ItemType::Empty };
                self.next_token()?;
                self.expect(Token::RPar)?;
                self.next_token()?;
                Ok(item)
            }
            Token::NodeKind => Ok(ItemType::Node(self.parse_kind_test()?)),
            other => self.grumble(format!("Expected type name in SequenceType, found {other}")),
        }
    }

    /// Resolve the lexical name of a built-in atomic type.
    pub(crate) fn atomic_type(&self, lexical: &str) -> PResult<AtomicType> {
        let (prefix, local) = split_qname(lexical).map_err(|m| self.syntax_error(m))?;
        let uri = if prefix.is_empty() {
            self.env.default_element_namespace().map(str::to_owned)
        } else {
            Some(self.env.uri_for_prefix(prefix).map_err(|e| self.locate(e))?)
        };
        let Some(uri) = uri.filter(|u| !u.is_empty()) else {
            return self.grumble_with(ErrorCode::XPST0051, format!("Unknown atomic type {lexical}"));
        };
        if uri == XS {
            return match SchemaType::builtin(local) {
                Some(SchemaType::Atomic(atomic)) => Ok(atomic),
                Some(_) => self.grumble_with(ErrorCode::XPST0051, format!("The type {lexical} is not atomic")),
                None => self.grumble_with(ErrorCode::XPST0051, format!("Unknown atomic type {lexical}")),
            };
        }
        let name = ExpandedName::new(Some(&uri), local);
        match self.env.schema_type(&name) {
            Some(_) => self.grumble_with(
                ErrorCode::XPST0051,
                format!("Type {lexical} is not a built-in atomic type and cannot be used here"),
            ),
            None => self.grumble_with(
                ErrorCode::XPST0051,
                format!("There is no imported schema for the namespace {uri}"),
            ),
        }
    }

    /// Parse a kind test; the current token is its keyword with the `(` consumed.
    pub(crate) fn parse_kind_test(&mut self) -> PResult<NodeTest> {
        let keyword = self.t.current_value.clone();
        let schema_declaration = keyword.starts_with("schema-");
        let Some(primary) = system_type(&keyword) else {
            return self.grumble(format!("{keyword}() is not allowed in a path expression"));
        };
        self.next_token()?;
        let empty = self.t.current_token == Token::RPar;
        if empty {
            if schema_declaration {
                return self.grumble("schema-element() and schema-attribute() require a name to be supplied");
            }
            self.next_token()?;
        }
        let no_arguments = |kind: &str, test: NodeTest| {
            if empty { Ok(test) } else { Err(format!("No arguments are allowed in {kind}()")) }
        };
        let result = match primary {
            SystemType::Item => Err("item() is not allowed in a path expression".to_string()),
            SystemType::Node => no_arguments("node", NodeTest::AnyNode),
            SystemType::Text => no_arguments("text", NodeTest::Kind(NodeKind::Text)),
            SystemType::Comment => no_arguments("comment", NodeTest::Kind(NodeKind::Comment)),
            SystemType::Namespace => {
                if empty && !self.env.is_namespace_test_allowed() {
                    return self.grumble("namespace-node() test is not allowed in XPath 2.0/XQuery 1.0");
                }
                no_arguments("namespace-node", NodeTest::Kind(NodeKind::Namespace))
            }
            SystemType::Document if empty => Ok(NodeTest::Kind(NodeKind::Document)),
            SystemType::Document => return self.parse_document_test(),
            SystemType::ProcessingInstruction if empty => Ok(NodeTest::Kind(NodeKind::ProcessingInstruction)),
            SystemType::ProcessingInstruction => return self.parse_pi_test(),
            SystemType::Element | SystemType::Attribute => {
                let kind = if primary == SystemType::Element { NodeKind::Element } else { NodeKind::Attribute };
                if empty {
                    Ok(NodeTest::Kind(kind))
                } else {
                    return self.parse_element_or_attribute_test(kind, schema_declaration);
                }
            }
        };
        result.or_else(|message| self.grumble(message))
    }

    /// `document-node(element(...))` or `document-node(schema-element(...))`.
    fn parse_document_test(&mut self) -> PResult<NodeTest> {
        let is_element_test = self.t.current_token == Token::NodeKind
            && system_type(&self.t.current_value) == Some(SystemType::Element);
        if !is_element_test {
            return self.grumble("Argument to document-node() must be an element type descriptor");
        }
        let inner = self.parse_kind_test()?;
        self.expect(Token::RPar)?;
        self.next_token()?;
        Ok(NodeTest::Document(Box::new(inner)))
    }

    /// `processing-instruction(N)` where N is an NCName or a string literal.
    fn parse_pi_test(&mut self) -> PResult<NodeTest> {
        let target = match self.t.current_token {
            Token::StringLiteral => {
                let name = trim_whitespace(&self.t.current_value);
                if !is_ncname(name) {
                    return self.grumble_with(
                        ErrorCode::XPTY0004,
                        "Processing instruction name must be a valid NCName",
                    );
                }
                name.to_string()
            }
            Token::Name => match split_qname(&self.t.current_value) {
                Ok(("", local)) => local.to_string(),
                Ok(_) => return self.grumble("Processing instruction name must not contain a colon"),
                Err(e) => return self.grumble(format!("Invalid processing instruction name. {e}")),
            },
            _ => return self.grumble("Processing instruction name must be a QName or a string literal"),
        };
        self.next_token()?;
        self.expect(Token::RPar)?;
        self.next_token()?;
        Ok(NodeTest::Name { kind: NodeKind::ProcessingInstruction, name: ExpandedName::local(&target) })
    }

    /// `element(N)`, `element(*, T)`, `element(N, T?)`, the attribute forms and
    /// `schema-element(N)` / `schema-attribute(N)`. No schema can be imported, so
    /// the schema forms always fail once their name is known.
    fn parse_element_or_attribute_test(&mut self, kind: NodeKind, schema_declaration: bool) -> PResult<NodeTest> {
        let node_name = self.t.current_value.clone();
        let name = match self.t.current_token {
            Token::Star | Token::Mult => {
                if schema_declaration {
                    return self.grumble("schema-element() and schema-attribute() must specify an actual name, not '*'");
                }
                None
            }
            Token::Name => Some(self.make_structured_qname(&node_name, kind == NodeKind::Element)?),
            other => return self.grumble(format!("Unexpected {other} after '(' in SequenceType")),
        };
        self.next_token()?;
        match self.t.current_token {
            Token::RPar => {
                self.next_token()?;
                match (name, schema_declaration) {
                    (None, _) => Ok(NodeTest::Kind(kind)),
                    (Some(_), true) if kind == NodeKind::Attribute => self.grumble_with(
                        ErrorCode::XPST0008,
                        format!("There is no declaration for attribute @{node_name} in an imported schema"),
                    ),
                    (Some(_), true) => self.grumble_with(
                        ErrorCode::XPST0008,
                        format!("There is no declaration for element <{node_name}> in an imported schema"),
                    ),
                    (Some(name), false) => Ok(NodeTest::Name { kind, name }),
                }
            }
            Token::Comma => {
                if schema_declaration {
                    return self.grumble("schema-element() and schema-attribute() must have one argument only");
                }
                self.next_token()?;
                let content = self.parse_content_type(kind)?;
                self.expect(Token::RPar)?;
                self.next_token()?;
                Ok(match name {
                    None => content,
                    Some(name) => NodeTest::Combined(Box::new(NodeTest::Name { kind, name }), Box::new(content)),
                })
            }
            _ => self.grumble("Expected ')' or ',' in SequenceType"),
        }
    }

    /// The type annotation after the comma in `element(N, T)`, with an optional
    /// `?` marking an element test as nillable.
    fn parse_content_type(&mut self, kind: NodeKind) -> PResult<NodeTest> {
        match self.t.current_token {
            Token::Star | Token::Mult => {
                return self.grumble("'*' is not permitted as the second argument of element() and attribute()");
            }
            Token::Name => {}
            other => return self.grumble(format!("Unexpected {other} after ',' in SequenceType")),
        }
        let type_name = self.make_structured_qname(&self.t.current_value, true)?;
        let Some(schema_type) = self.env.schema_type(&type_name) else {
            return self.grumble_with(
                ErrorCode::XPST0008,
                format!("Type {} is not a known type", self.t.current_value),
            );
        };
        if kind == NodeKind::Attribute && !schema_type.is_atomic() {
            self.warning("An attribute must have an atomic type");
        }
        self.next_token()?;
        let nillable = kind == NodeKind::Element && self.t.current_token == Token::QMark;
        if nillable {
            self.next_token()?;
        }
        Ok(NodeTest::ContentType { kind, schema_type, nillable })
    }
}
