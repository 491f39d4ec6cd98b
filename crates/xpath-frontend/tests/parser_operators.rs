use rstest::rstest;
use rust_decimal::Decimal;
use xpath_frontend::parser::ast::{BinaryOp, ExprKind, Literal};
use xpath_frontend::{
    AtomicType, ErrorCode, ExpandedName, ItemType, NodeKind, NodeTest, Occurrence, SequenceType,
    SimpleStaticContext, StaticContextBuilder, parse_expression,
};

fn ctx() -> SimpleStaticContext {
    StaticContextBuilder::new()
        .with_variable(ExpandedName::local("v"), SequenceType::atomic(AtomicType::String, Occurrence::ZeroOrMore))
        .build()
}

fn render(src: &str) -> String {
    parse_expression(src, &ctx())
        .unwrap_or_else(|e| panic!("'{src}' should parse: {e}"))
        .to_string()
}

#[rstest]
#[case("1 + 2 * 3", "(1 + (2 * 3))")]
#[case("1 * 2 + 3", "((1 * 2) + 3)")]
#[case("1 - 2 - 3", "((1 - 2) - 3)")]
#[case("8 div 4 idiv 2 mod 3", "(((8 div 4) idiv 2) mod 3)")]
#[case("a or b and c", "(child::a or (child::b and child::c))")]
#[case("a and b or c", "((child::a and child::b) or child::c)")]
#[case("1 = 2 or 3 eq 4", "((1 = 2) or (3 eq 4))")]
#[case("1 to 2 + 3", "(1 to (2 + 3))")]
#[case("a | b intersect c", "(child::a union (child::b intersect child::c))")]
#[case("a union b except c", "(child::a union (child::b except child::c))")]
#[case("a is b", "(child::a is child::b)")]
#[case("a << b", "(child::a << child::b)")]
#[case("-1 + 2", "((-1) + 2)")]
#[case("- - 1", "(-(-1))")]
#[case("+a", "(+child::a)")]
#[case("1, 2, 3", "(1, 2, 3)")]
#[case("()", "()")]
#[case("(1 + 2) * 3", "((1 + 2) * 3)")]
fn binary_precedence(#[case] src: &str, #[case] expected: &str) {
    assert_eq!(render(src), expected);
}

#[rstest]
#[case("1 instance of xs:integer", "(1 instance of xs:integer)")]
#[case("$v instance of xs:string* and true()", "(($v instance of xs:string*) and fn:true())")]
#[case("1 + 2 instance of xs:integer", "(1 + (2 instance of xs:integer))")]
#[case("'a' cast as xs:string?", "(\"a\" cast as xs:string?)")]
#[case("1 cast as xs:integer + 1", "((1 cast as xs:integer) + 1)")]
#[case("1 castable as xs:date", "(1 castable as xs:date)")]
#[case("a treat as element()+", "(child::a treat as element()+)")]
#[case("(1 cast as xs:double) cast as xs:string", "((1 cast as xs:double) cast as xs:string)")]
fn type_operators(#[case] src: &str, #[case] expected: &str) {
    assert_eq!(render(src), expected);
}

#[rstest]
#[case("1 instance of xs:integer instance of xs:boolean", "instance of")]
#[case("1 cast as xs:integer cast as xs:string", "cast as")]
#[case("1 treat as xs:integer castable as xs:string", "castable as")]
fn chained_type_operators_need_parentheses(#[case] src: &str, #[case] op: &str) {
    let err = parse_expression(src, &ctx()).expect_err("expected a syntax error");
    assert_eq!(err.code_enum(), ErrorCode::XPST0003);
    assert_eq!(err.message, format!("Left operand of '{op}' needs parentheses"));
}

#[test]
fn treat_as_carries_its_dynamic_error_code() {
    let expr = parse_expression("1 treat as xs:integer", &ctx()).unwrap();
    match expr.kind {
        ExprKind::TreatAs { error_code, ty, .. } => {
            assert_eq!(error_code, ErrorCode::XPDY0050);
            assert_eq!(ty, SequenceType::atomic(AtomicType::Integer, Occurrence::ExactlyOne));
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[rstest]
#[case("1.5", Literal::Decimal(Decimal::new(15, 1)))]
#[case(".5", Literal::Decimal(Decimal::new(5, 1)))]
#[case("5.", Literal::Decimal(Decimal::new(5, 0)))]
#[case("0.1", Literal::Decimal(Decimal::new(1, 1)))]
#[case("1e3", Literal::Double(1000.0))]
#[case("2.5E-1", Literal::Double(0.25))]
#[case("42", Literal::Integer(42))]
#[case("9223372036854775807", Literal::Integer(i64::MAX))]
#[case("99999999999999999999", Literal::BigInteger("99999999999999999999".to_string()))]
#[case("00012345678901234567890", Literal::BigInteger("12345678901234567890".to_string()))]
#[case("'it''s'", Literal::String("it's".to_string()))]
fn literals(#[case] src: &str, #[case] expected: Literal) {
    match parse_expression(src, &ctx()).unwrap().kind {
        ExprKind::Literal(l) => assert_eq!(l, expected),
        other => panic!("unexpected: {other:?}"),
    }
}

#[rstest]
#[case("0.1", "0.1")]
#[case("1.50", "1.50")]
#[case(".5", "0.5")]
#[case("5.", "5.0")]
#[case("0.1 + 0.2", "(0.1 + 0.2)")]
#[case("123456789012345678901234567.8", "123456789012345678901234567.8")]
#[case("99999999999999999999 + 1", "(99999999999999999999 + 1)")]
fn numeric_literals_keep_their_digits(#[case] src: &str, #[case] expected: &str) {
    assert_eq!(render(src), expected);
}

#[test]
fn big_integer_literals_are_integers() {
    let expr = parse_expression("99999999999999999999", &ctx()).unwrap();
    assert_eq!(expr.item_type(), ItemType::Atomic(AtomicType::Integer));
}

#[test]
fn decimal_out_of_range_is_a_syntax_error() {
    let src = format!("{}.5", "9".repeat(40));
    let err = parse_expression(&src, &ctx()).unwrap_err();
    assert_eq!(err.code_enum(), ErrorCode::XPST0003);
    assert_eq!(err.message, format!("Invalid numeric literal \"{src}\""));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn binary_nodes_record_operator_offset() {
    let expr = parse_expression("10 + 2", &ctx()).unwrap();
    assert_eq!(expr.loc.offset, 3);
    match expr.kind {
        ExprKind::Binary { left, op: BinaryOp::Add, right } => {
            assert_eq!(left.loc.offset, 0);
            assert_eq!(right.loc.offset, 5);
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn range_has_integer_bounds() {
    let expr = parse_expression("1 to 10", &ctx()).unwrap();
    let ExprKind::Range { start, end } = expr.kind else { panic!("expected a range") };
    assert_eq!(start.kind, ExprKind::Literal(Literal::Integer(1)));
    assert_eq!(end.kind, ExprKind::Literal(Literal::Integer(10)));
}

#[test]
fn conditional_branches() {
    let expr = parse_expression("if (true()) then 1 else 2", &ctx()).unwrap();
    let ExprKind::IfThenElse { cond, then_expr, else_expr } = expr.kind else { panic!("expected a conditional") };
    assert!(matches!(cond.kind, ExprKind::FunctionCall { ref args, .. } if args.is_empty()));
    assert_eq!(then_expr.kind, ExprKind::Literal(Literal::Integer(1)));
    assert_eq!(else_expr.kind, ExprKind::Literal(Literal::Integer(2)));
}

#[test]
fn conditional() {
    assert_eq!(render("if (a) then 1 else 'x'"), "(if (child::a) then 1 else \"x\")");
    let err = parse_expression("if (1) then else 2", &ctx()).unwrap_err();
    assert_eq!(err.code_enum(), ErrorCode::XPST0003);
}

#[rstest]
#[case("1 div 2", ItemType::Atomic(AtomicType::Decimal))]
#[case("1 idiv 2", ItemType::Atomic(AtomicType::Integer))]
#[case("1 + 2.0", ItemType::Atomic(AtomicType::Decimal))]
#[case("1 * 2e0", ItemType::Atomic(AtomicType::Double))]
#[case("(1, 'a')", ItemType::Atomic(AtomicType::AnyAtomic))]
#[case("a | b", ItemType::Node(NodeTest::Kind(NodeKind::Element)))]
#[case("if (1) then a else 2", ItemType::AnyItem)]
#[case("1 to 3", ItemType::Atomic(AtomicType::Integer))]
#[case("$v", ItemType::Atomic(AtomicType::String))]
#[case("count(a)", ItemType::Atomic(AtomicType::Integer))]
#[case("1 lt 2", ItemType::Atomic(AtomicType::Boolean))]
fn inferred_item_types(#[case] src: &str, #[case] expected: ItemType) {
    assert_eq!(parse_expression(src, &ctx()).unwrap().item_type(), expected);
}

#[test]
fn trailing_tokens_are_rejected() {
    let err = parse_expression("1 2", &ctx()).unwrap_err();
    assert_eq!(err.message, "Unexpected token \"<numeric-literal>\" beyond end of expression");
}
