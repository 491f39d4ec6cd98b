use rstest::rstest;
use xpath_frontend::context::LanguageLevel;
use xpath_frontend::{
    AtomicType, ErrorCode, ExpandedName, ItemType, NodeKind, NodeTest, Occurrence, SchemaType, SequenceType,
    SimpleStaticContext, StaticContextBuilder, parse_expression, parse_sequence_type,
};

fn ctx() -> SimpleStaticContext {
    StaticContextBuilder::new()
        .with_namespace("u", "urn:user")
        .with_schema_type(SchemaType::User { name: ExpandedName::new(Some("urn:user"), "price"), atomic: true })
        .with_schema_type(SchemaType::User { name: ExpandedName::new(Some("urn:user"), "order"), atomic: false })
        .build()
}

fn parse_type(src: &str) -> SequenceType {
    parse_sequence_type(src, &ctx()).unwrap_or_else(|e| panic!("'{src}' should parse: {e}"))
}

#[rstest]
#[case("xs:integer", "xs:integer")]
#[case("xs:integer?", "xs:integer?")]
#[case("xs:string*", "xs:string*")]
#[case("xs:anyURI+", "xs:anyURI+")]
#[case("item()", "item()")]
#[case("item()*", "item()*")]
#[case("node()+", "node()+")]
#[case("element()", "element()")]
#[case("element(*)", "element()")]
#[case("element(foo)*", "element(foo)*")]
#[case("attribute(id)?", "attribute(id)?")]
#[case("text()", "text()")]
#[case("comment()", "comment()")]
#[case("processing-instruction()", "processing-instruction()")]
#[case("document-node()", "document-node()")]
#[case("document-node(element(root))", "document-node(element(root))")]
#[case("element(*, xs:string)", "element(*, xs:string)")]
#[case("element(a, xs:string?)", "element(a, xs:string?)")]
#[case("attribute(a, xs:integer)", "attribute(a, xs:integer)")]
#[case("element(*, u:order)", "element(*, Q{urn:user}order)")]
#[case(" empty-sequence ( ) ", "empty-sequence()")]
fn sequence_type_forms(#[case] src: &str, #[case] expected: &str) {
    assert_eq!(parse_type(src).to_string(), expected);
}

#[test]
fn empty_sequence_has_fixed_cardinality() {
    assert_eq!(parse_type("empty-sequence()"), SequenceType::empty());
    assert_eq!(parse_type("empty-sequence()").occurrence, Occurrence::Empty);
}

#[test]
fn nillable_and_named_element_test() {
    let ty = parse_type("element(a, xs:string?)");
    let ItemType::Node(NodeTest::Combined(name, content)) = ty.item else { panic!("expected a combined test") };
    assert_eq!(*name, NodeTest::Name { kind: NodeKind::Element, name: ExpandedName::local("a") });
    assert_eq!(
        *content,
        NodeTest::ContentType {
            kind: NodeKind::Element,
            schema_type: SchemaType::Atomic(AtomicType::String),
            nillable: true,
        }
    );
}

#[test]
fn processing_instruction_string_argument_is_trimmed() {
    let ty = parse_type("processing-instruction(' go ')");
    assert_eq!(
        ty.item,
        ItemType::Node(NodeTest::Name { kind: NodeKind::ProcessingInstruction, name: ExpandedName::local("go") })
    );
}

#[test]
fn attribute_with_complex_type_warns() {
    let env = ctx();
    let ty = parse_sequence_type("attribute(a, xs:anyType)", &env).unwrap();
    assert!(matches!(ty.item, ItemType::Node(NodeTest::Combined(..))));
    let warnings = env.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].ends_with("An attribute must have an atomic type"));
    assert!(warnings[0].starts_with("in {attribute(a, xs:anyType}:\n    "));
}

#[test]
fn namespace_node_test_depends_on_language_level() {
    let err = parse_sequence_type("namespace-node()", &ctx()).unwrap_err();
    assert_eq!(err.message, "namespace-node() test is not allowed in XPath 2.0/XQuery 1.0");
    let later = StaticContextBuilder::new().with_language_level(LanguageLevel::XPath30).build();
    assert_eq!(
        parse_sequence_type("namespace-node()", &later).unwrap().item,
        ItemType::Node(NodeTest::Kind(NodeKind::Namespace))
    );
}

#[rstest]
#[case("xs:foo", ErrorCode::XPST0051, "Unknown atomic type xs:foo")]
#[case("xs:anyType", ErrorCode::XPST0051, "The type xs:anyType is not atomic")]
#[case("u:price", ErrorCode::XPST0051, "Type u:price is not a built-in atomic type and cannot be used here")]
#[case("q:x", ErrorCode::XPST0081, "Prefix q has not been declared")]
#[case("element(a, xs:nope)", ErrorCode::XPST0008, "Type xs:nope is not a known type")]
#[case("schema-element(a)", ErrorCode::XPST0008, "There is no declaration for element <a> in an imported schema")]
#[case("schema-attribute(a)", ErrorCode::XPST0008, "There is no declaration for attribute @a in an imported schema")]
#[case(
    "schema-element()",
    ErrorCode::XPST0003,
    "schema-element() and schema-attribute() require a name to be supplied"
)]
#[case(
    "schema-element(*)",
    ErrorCode::XPST0003,
    "schema-element() and schema-attribute() must specify an actual name, not '*'"
)]
#[case(
    "schema-element(a, xs:string)",
    ErrorCode::XPST0003,
    "schema-element() and schema-attribute() must have one argument only"
)]
#[case(
    "element(*, *)",
    ErrorCode::XPST0003,
    "'*' is not permitted as the second argument of element() and attribute()"
)]
#[case("text(a)", ErrorCode::XPST0003, "No arguments are allowed in text()")]
#[case("node(1)", ErrorCode::XPST0003, "No arguments are allowed in node()")]
#[case("document-node(text())", ErrorCode::XPST0003, "Argument to document-node() must be an element type descriptor")]
#[case("processing-instruction('1x')", ErrorCode::XPTY0004, "Processing instruction name must be a valid NCName")]
#[case("processing-instruction(a:b)", ErrorCode::XPST0003, "Processing instruction name must not contain a colon")]
#[case("element(a b)", ErrorCode::XPST0003, "Expected ')' or ',' in SequenceType")]
#[case("1", ErrorCode::XPST0003, "Expected type name in SequenceType, found <numeric-literal>")]
fn sequence_type_errors(#[case] src: &str, #[case] code: ErrorCode, #[case] message: &str) {
    let err = parse_sequence_type(src, &ctx()).expect_err("expected an error");
    assert_eq!(err.code_enum(), code);
    assert_eq!(err.message, message);
    assert!(err.location.as_deref().is_some_and(|l| l.starts_with("SequenceType syntax error")));
}

#[test]
fn trailing_tokens_after_sequence_type() {
    let err = parse_sequence_type("xs:integer xs:string", &ctx()).unwrap_err();
    assert_eq!(err.code_enum(), ErrorCode::XPST0003);
}

#[rstest]
#[case("1 cast as xs:anyAtomicType", "No value is castable to xs:anyAtomicType")]
#[case("1 castable as xs:NOTATION", "No value is castable to xs:NOTATION")]
fn abstract_cast_targets(#[case] src: &str, #[case] message: &str) {
    let err = parse_expression(src, &ctx()).unwrap_err();
    assert_eq!(err.code_enum(), ErrorCode::XPST0080);
    assert_eq!(err.message, message);
}

#[test]
fn cast_to_unimported_namespace() {
    let env = StaticContextBuilder::new().with_namespace("n", "urn:none").build();
    let err = parse_expression("1 cast as n:t", &env).unwrap_err();
    assert_eq!(err.code_enum(), ErrorCode::XPST0051);
    assert_eq!(err.message, "There is no imported schema for the namespace urn:none");
}

#[test]
fn default_element_namespace_applies_to_unprefixed_type_names() {
    let env = StaticContextBuilder::new().with_default_element_namespace(xpath_frontend::consts::XS).build();
    assert_eq!(
        parse_sequence_type("integer?", &env).unwrap(),
        SequenceType::atomic(AtomicType::Integer, Occurrence::ZeroOrOne)
    );
}
