//! Static types: atomic and schema types, node tests, item types and SequenceTypes.

use core::fmt;

use crate::consts::XS;
use crate::xdm::ExpandedName;

macro_rules! atomic_types {
    ($( $variant:ident => $local:literal ),* $(,)?) => {
        /// Built-in atomic types of XML Schema 1.0 as seen by XPath 2.0.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum AtomicType {
            $( $variant ),*
        }

        impl AtomicType {
            pub const ALL: &'static [AtomicType] = &[ $( AtomicType::$variant ),* ];

            pub fn local_name(self) -> &'static str {
                match self {
                    $( AtomicType::$variant => $local ),*
                }
            }

            pub fn from_local_name(local: &str) -> Option<Self> {
                match local {
                    $( $local => Some(AtomicType::$variant), )*
                    _ => None,
                }
            }
        }
    };
}

atomic_types! {
    AnyAtomic => "anyAtomicType",
    UntypedAtomic => "untypedAtomic",
    String => "string",
    NormalizedString => "normalizedString",
    Token => "token",
    Language => "language",
    NmToken => "NMTOKEN",
    Name => "Name",
    NcName => "NCName",
    Id => "ID",
    IdRef => "IDREF",
    Entity => "ENTITY",
    Boolean => "boolean",
    Decimal => "decimal",
    Integer => "integer",
    NonPositiveInteger => "nonPositiveInteger",
    NegativeInteger => "negativeInteger",
    Long => "long",
    Int => "int",
    Short => "short",
    Byte => "byte",
    NonNegativeInteger => "nonNegativeInteger",
    UnsignedLong => "unsignedLong",
    UnsignedInt => "unsignedInt",
    UnsignedShort => "unsignedShort",
    UnsignedByte => "unsignedByte",
    PositiveInteger => "positiveInteger",
    Float => "float",
    Double => "double",
    Duration => "duration",
    DayTimeDuration => "dayTimeDuration",
    YearMonthDuration => "yearMonthDuration",
    DateTime => "dateTime",
    Date => "date",
    Time => "time",
    GYearMonth => "gYearMonth",
    GYear => "gYear",
    GMonthDay => "gMonthDay",
    GDay => "gDay",
    GMonth => "gMonth",
    HexBinary => "hexBinary",
    Base64Binary => "base64Binary",
    AnyUri => "anyURI",
    QName => "QName",
    Notation => "NOTATION",
}

impl AtomicType {
    pub fn name(self) -> ExpandedName {
        ExpandedName::new(Some(XS), self.local_name())
    }

    /// Types that have no instances of their own and cannot be cast to.
    pub fn is_abstract(self) -> bool {
        matches!(self, AtomicType::AnyAtomic | AtomicType::Notation)
    }

    pub fn is_numeric(self) -> bool {
        self.numeric_rank().is_some()
    }

    /// Rank in the numeric promotion order integer < decimal < float < double.
    fn numeric_rank(self) -> Option<u8> {
        use AtomicType::*;
        match self {
            Integer | NonPositiveInteger | NegativeInteger | Long | Int | Short | Byte
            | NonNegativeInteger | UnsignedLong | UnsignedInt | UnsignedShort | UnsignedByte
            | PositiveInteger => Some(0),
            Decimal => Some(1),
            Float => Some(2),
            Double => Some(3),
            _ => None,
        }
    }

    /// Result type of `+`, `-` and `*` over two numeric operand types.
    pub fn promote_numeric(self, other: AtomicType) -> Option<AtomicType> {
        let rank = self.numeric_rank()?.max(other.numeric_rank()?);
        Some(match rank {
            0 => AtomicType::Integer,
            1 => AtomicType::Decimal,
            2 => AtomicType::Float,
            _ => AtomicType::Double,
        })
    }
}

impl fmt::Display for AtomicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "xs:{}", self.local_name())
    }
}

/// A type that may appear as the content type of `element(N, T)` or `attribute(N, T)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SchemaType {
    Atomic(AtomicType),
    AnyType,
    AnySimpleType,
    Untyped,
    IdRefs,
    NmTokens,
    Entities,
    /// A type registered by the host, e.g. from an imported schema.
    User { name: ExpandedName, atomic: bool },
}

impl SchemaType {
    /// Look up a type in the XML Schema namespace by local name.
    pub fn builtin(local: &str) -> Option<SchemaType> {
        if let Some(atomic) = AtomicType::from_local_name(local) {
            return Some(SchemaType::Atomic(atomic));
        }
        match local {
            "anyType" => Some(SchemaType::AnyType),
            "anySimpleType" => Some(SchemaType::AnySimpleType),
            "untyped" => Some(SchemaType::Untyped),
            "IDREFS" => Some(SchemaType::IdRefs),
            "NMTOKENS" => Some(SchemaType::NmTokens),
            "ENTITIES" => Some(SchemaType::Entities),
            _ => None,
        }
    }

    pub fn is_atomic(&self) -> bool {
        match self {
            SchemaType::Atomic(_) => true,
            SchemaType::User { atomic, .. } => *atomic,
            _ => false,
        }
    }

    pub fn name(&self) -> ExpandedName {
        match self {
            SchemaType::Atomic(t) => t.name(),
            SchemaType::AnyType => ExpandedName::new(Some(XS), "anyType"),
            SchemaType::AnySimpleType => ExpandedName::new(Some(XS), "anySimpleType"),
            SchemaType::Untyped => ExpandedName::new(Some(XS), "untyped"),
            SchemaType::IdRefs => ExpandedName::new(Some(XS), "IDREFS"),
            SchemaType::NmTokens => ExpandedName::new(Some(XS), "NMTOKENS"),
            SchemaType::Entities => ExpandedName::new(Some(XS), "ENTITIES"),
            SchemaType::User { name, .. } => name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
    Namespace,
}

impl NodeKind {
    pub fn keyword(self) -> &'static str {
        match self {
            NodeKind::Document => "document-node",
            NodeKind::Element => "element",
            NodeKind::Attribute => "attribute",
            NodeKind::Text => "text",
            NodeKind::Comment => "comment",
            NodeKind::ProcessingInstruction => "processing-instruction",
            NodeKind::Namespace => "namespace-node",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeTest {
    /// `node()`
    AnyNode,
    /// All nodes of one kind: `element()`, `text()`, `*` on the child axis.
    Kind(NodeKind),
    /// `foo`, `p:foo`, `attribute(foo)`, `processing-instruction(foo)`.
    Name { kind: NodeKind, name: ExpandedName },
    /// `p:*`
    Namespace { kind: NodeKind, uri: Option<String> },
    /// `*:foo`
    LocalName { kind: NodeKind, local: String },
    /// `document-node(element(...))`
    Document(Box<NodeTest>),
    /// `element(*, T)` / `attribute(*, T)`
    ContentType { kind: NodeKind, schema_type: SchemaType, nillable: bool },
    /// Intersection of a name test and a content-type test: `element(N, T)`.
    Combined(Box<NodeTest>, Box<NodeTest>),
}

impl NodeTest {
    /// The node kind every matching node has, if the test fixes one.
    pub fn node_kind(&self) -> Option<NodeKind> {
        match self {
            NodeTest::AnyNode => None,
            NodeTest::Kind(kind)
            | NodeTest::Name { kind, .. }
            | NodeTest::Namespace { kind, .. }
            | NodeTest::LocalName { kind, .. }
            | NodeTest::ContentType { kind, .. } => Some(*kind),
            NodeTest::Document(_) => Some(NodeKind::Document),
            NodeTest::Combined(left, _) => left.node_kind(),
        }
    }
}

fn write_name_arg(f: &mut fmt::Formatter<'_>, test: &NodeTest) -> fmt::Result {
    match test {
        NodeTest::Name { name, .. } => write!(f, "{name}"),
        _ => f.write_str("*"),
    }
}

impl fmt::Display for NodeTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeTest::AnyNode => f.write_str("node()"),
            NodeTest::Kind(kind) => write!(f, "{}()", kind.keyword()),
            NodeTest::Name { kind: NodeKind::Element | NodeKind::Attribute, name } => write!(f, "{name}"),
            NodeTest::Name { kind, name } => write!(f, "{}({name})", kind.keyword()),
            NodeTest::Namespace { uri: Some(uri), .. } => write!(f, "Q{{{uri}}}*"),
            NodeTest::Namespace { uri: None, .. } => f.write_str("Q{}*"),
            NodeTest::LocalName { local, .. } => write!(f, "*:{local}"),
            NodeTest::Document(inner) => match inner.as_ref() {
                NodeTest::Name { kind: NodeKind::Element, name } => write!(f, "document-node(element({name}))"),
                other => write!(f, "document-node({other})"),
            },
            NodeTest::ContentType { kind, schema_type, nillable } => {
                write!(f, "{}(*, {}{})", kind.keyword(), schema_type.name(), if *nillable { "?" } else { "" })
            }
            NodeTest::Combined(name, content) => match content.as_ref() {
                NodeTest::ContentType { kind, schema_type, nillable } => {
                    write!(f, "{}(", kind.keyword())?;
                    write_name_arg(f, name)?;
                    write!(f, ", {}{})", schema_type.name(), if *nillable { "?" } else { "" })
                }
                other => write!(f, "({name} intersect {other})"),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemType {
    AnyItem,
    /// The item type of `empty-sequence()`; matches nothing.
    Empty,
    Atomic(AtomicType),
    Node(NodeTest),
}

impl ItemType {
    /// Least common supertype, used when inferring the type of a sequence or conditional.
    pub fn common_supertype(&self, other: &ItemType) -> ItemType {
        match (self, other) {
            (a, b) if a == b => a.clone(),
            (ItemType::Empty, x) | (x, ItemType::Empty) => x.clone(),
            (ItemType::Atomic(a), ItemType::Atomic(b)) => {
                ItemType::Atomic(a.promote_numeric(*b).unwrap_or(AtomicType::AnyAtomic))
            }
            (ItemType::Node(a), ItemType::Node(b)) => match (a.node_kind(), b.node_kind()) {
                (Some(x), Some(y)) if x == y => ItemType::Node(NodeTest::Kind(x)),
                _ => ItemType::Node(NodeTest::AnyNode),
            },
            _ => ItemType::AnyItem,
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::AnyItem => f.write_str("item()"),
            ItemType::Empty => f.write_str("empty-sequence()"),
            ItemType::Atomic(t) => write!(f, "{t}"),
            ItemType::Node(NodeTest::Name { kind: NodeKind::Element, name }) => write!(f, "element({name})"),
            ItemType::Node(NodeTest::Name { kind: NodeKind::Attribute, name }) => {
                write!(f, "attribute({name})")
            }
            ItemType::Node(test) => write!(f, "{test}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Occurrence {
    ExactlyOne,
    ZeroOrOne,
    ZeroOrMore,
    OneOrMore,
    /// Fixed cardinality of `empty-sequence()`.
    Empty,
}

impl Occurrence {
    pub fn indicator(self) -> &'static str {
        match self {
            Occurrence::ExactlyOne | Occurrence::Empty => "",
            Occurrence::ZeroOrOne => "?",
            Occurrence::ZeroOrMore => "*",
            Occurrence::OneOrMore => "+",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SequenceType {
    pub item: ItemType,
    pub occurrence: Occurrence,
}

impl SequenceType {
    pub const fn new(item: ItemType, occurrence: Occurrence) -> Self {
        Self { item, occurrence }
    }

    /// `item()`: the initial type of a range variable.
    pub const fn single_item() -> Self {
        Self::new(ItemType::AnyItem, Occurrence::ExactlyOne)
    }

    pub const fn any_sequence() -> Self {
        Self::new(ItemType::AnyItem, Occurrence::ZeroOrMore)
    }

    pub const fn empty() -> Self {
        Self::new(ItemType::Empty, Occurrence::Empty)
    }

    pub const fn atomic(t: AtomicType, occurrence: Occurrence) -> Self {
        Self::new(ItemType::Atomic(t), occurrence)
    }
}

impl fmt::Display for SequenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.item, self.occurrence.indicator())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_lookup_by_local_name() {
        assert_eq!(AtomicType::from_local_name("integer"), Some(AtomicType::Integer));
        assert_eq!(AtomicType::from_local_name("anyURI"), Some(AtomicType::AnyUri));
        assert_eq!(AtomicType::from_local_name("anyType"), None);
        assert!(AtomicType::ALL.iter().all(|t| AtomicType::from_local_name(t.local_name()) == Some(*t)));
    }

    #[test]
    fn builtin_schema_types() {
        assert!(SchemaType::builtin("string").is_some_and(|t| t.is_atomic()));
        assert!(SchemaType::builtin("anyType").is_some_and(|t| !t.is_atomic()));
        assert!(SchemaType::builtin("IDREFS").is_some_and(|t| !t.is_atomic()));
        assert_eq!(SchemaType::builtin("nope"), None);
    }

    #[test]
    fn numeric_promotion() {
        assert_eq!(AtomicType::Int.promote_numeric(AtomicType::Integer), Some(AtomicType::Integer));
        assert_eq!(AtomicType::Integer.promote_numeric(AtomicType::Double), Some(AtomicType::Double));
        assert_eq!(AtomicType::String.promote_numeric(AtomicType::Double), None);
    }

    #[test]
    fn common_supertypes() {
        let el = ItemType::Node(NodeTest::Name { kind: NodeKind::Element, name: ExpandedName::local("a") });
        let el2 = ItemType::Node(NodeTest::Name { kind: NodeKind::Element, name: ExpandedName::local("b") });
        assert_eq!(el.common_supertype(&el2), ItemType::Node(NodeTest::Kind(NodeKind::Element)));
        assert_eq!(
            ItemType::Atomic(AtomicType::String).common_supertype(&ItemType::Atomic(AtomicType::Integer)),
            ItemType::Atomic(AtomicType::AnyAtomic)
        );
        assert_eq!(ItemType::Empty.common_supertype(&el), el);
        assert_eq!(el.common_supertype(&ItemType::Atomic(AtomicType::String)), ItemType::AnyItem);
    }

    #[test]
    fn sequence_type_display() {
        assert_eq!(SequenceType::atomic(AtomicType::Integer, Occurrence::ZeroOrOne).to_string(), "xs:integer?");
        assert_eq!(SequenceType::empty().to_string(), "empty-sequence()");
        assert_eq!(SequenceType::any_sequence().to_string(), "item()*");
        let combined = NodeTest::Combined(
            Box::new(NodeTest::Name { kind: NodeKind::Element, name: ExpandedName::local("foo") }),
            Box::new(NodeTest::ContentType {
                kind: NodeKind::Element,
                schema_type: SchemaType::Atomic(AtomicType::String),
                nillable: false,
            }),
        );
        assert_eq!(combined.to_string(), "element(foo, xs:string)");
    }
}
