use rstest::rstest;
use xpath_frontend::parser::ast::{Quantifier, RangeBinding, VarRef};
use xpath_frontend::{
    AtomicType, ErrorCode, ExpandedName, Expr, ExprKind, ExpressionParser, ItemType, Language, NodeKind, NodeTest,
    Occurrence, SequenceType, SimpleStaticContext, StaticContextBuilder, Token, parse_expression,
};

fn ctx() -> SimpleStaticContext {
    StaticContextBuilder::new()
        .with_variable(ExpandedName::local("ctx"), SequenceType::atomic(AtomicType::Boolean, Occurrence::ExactlyOne))
        .build()
}

fn parse(src: &str) -> Expr {
    parse_expression(src, &ctx()).unwrap_or_else(|e| panic!("'{src}' should parse: {e}"))
}

fn expect_for(expr: &Expr) -> &RangeBinding {
    match &expr.kind {
        ExprKind::For(b) => b,
        other => panic!("expected a for expression, got {other:?}"),
    }
}

fn expect_range_ref(expr: &Expr) -> &VarRef {
    match &expr.kind {
        ExprKind::VarRef(r @ VarRef::Range { .. }) => r,
        other => panic!("expected a range variable reference, got {other:?}"),
    }
}

#[rstest]
#[case("for $x in (1, 2) return $x", "(for $x in (1, 2) return $x)")]
#[case("for $x in a, $y in b return ($x, $y)", "(for $x in child::a return (for $y in child::b return ($x, $y)))")]
#[case("some $x in 1 to 3 satisfies $x gt 2", "(some $x in (1 to 3) satisfies ($x gt 2))")]
#[case("every $x in a satisfies $x", "(every $x in child::a satisfies $x)")]
#[case("for $x in 1 return $x + 1", "(for $x in 1 return ($x + 1))")]
fn binding_expressions(#[case] src: &str, #[case] expected: &str) {
    assert_eq!(parse(src).to_string(), expected);
}

#[test]
fn multiple_clauses_nest_and_later_clauses_see_earlier_variables() {
    let expr = parse("for $x in (1, 2), $y in $x return $y");
    let outer = expect_for(&expr);
    let inner = expect_for(&outer.action);
    assert_eq!(outer.variable.name, ExpandedName::local("x"));
    assert_eq!(inner.variable.name, ExpandedName::local("y"));
    assert_ne!(outer.variable.id, inner.variable.id);

    let VarRef::Range { id, .. } = expect_range_ref(&inner.sequence) else { unreachable!() };
    assert_eq!(*id, outer.variable.id);
    let VarRef::Range { id, .. } = expect_range_ref(&inner.action) else { unreachable!() };
    assert_eq!(*id, inner.variable.id);
}

#[test]
fn required_type_comes_from_the_sequence() {
    let expr = parse("for $x in (1, 2), $y in ('a', 'b') return $y");
    let outer = expect_for(&expr);
    let inner = expect_for(&outer.action);
    assert_eq!(outer.variable.required_type, SequenceType::atomic(AtomicType::Integer, Occurrence::ExactlyOne));
    assert_eq!(inner.variable.required_type, SequenceType::atomic(AtomicType::String, Occurrence::ExactlyOne));
}

#[test]
fn references_take_the_type_of_the_sequence() {
    let expr = parse("for $x in 1 return $x");
    let binding = expect_for(&expr);
    let integer = SequenceType::atomic(AtomicType::Integer, Occurrence::ExactlyOne);
    assert_eq!(binding.variable.required_type, integer);
    assert_eq!(expect_range_ref(&binding.action).static_type(), &integer);
}

#[rstest]
#[case("for $x in 1 to 3 return $x", ItemType::Atomic(AtomicType::Integer))]
#[case("for $x in 1 to 3 return $x + 1.5", ItemType::Atomic(AtomicType::Decimal))]
#[case("for $x in ('a', 'b') return ($x, $x)", ItemType::Atomic(AtomicType::String))]
#[case("for $x in (1, 2), $y in $x return $y", ItemType::Atomic(AtomicType::Integer))]
#[case("for $x in 1 return if ($x) then $x else 2", ItemType::Atomic(AtomicType::Integer))]
#[case("for $x in a return $x", ItemType::Node(NodeTest::Name { kind: NodeKind::Element, name: ExpandedName::local("a") }))]
fn loop_variable_types_flow_into_the_result(#[case] src: &str, #[case] expected: ItemType) {
    assert_eq!(parse(src).item_type(), expected);
}

#[test]
fn later_clauses_are_typed_from_earlier_variables() {
    let expr = parse("for $x in (1, 2), $y in $x return $y");
    let outer = expect_for(&expr);
    let inner = expect_for(&outer.action);
    let integer = SequenceType::atomic(AtomicType::Integer, Occurrence::ExactlyOne);
    assert_eq!(expect_range_ref(&inner.sequence).static_type(), &integer);
    assert_eq!(inner.variable.required_type, integer);
}

#[test]
fn shadowed_references_keep_their_own_binding_type() {
    let expr = parse("for $x in 1 return for $x in 'a' return $x");
    let inner = expect_for(&expect_for(&expr).action);
    assert_eq!(
        expect_range_ref(&inner.action).static_type(),
        &SequenceType::atomic(AtomicType::String, Occurrence::ExactlyOne)
    );
}

#[test]
fn inner_binding_shadows_outer() {
    let expr = parse("for $x in 1 return for $x in 'a' return $x");
    let outer = expect_for(&expr);
    let inner = expect_for(&outer.action);
    let VarRef::Range { id, .. } = expect_range_ref(&inner.action) else { unreachable!() };
    assert_eq!(*id, inner.variable.id);
    assert_ne!(*id, outer.variable.id);
}

#[test]
fn variable_is_not_visible_in_its_own_sequence() {
    let err = parse_expression("for $x in $x return 1", &ctx()).unwrap_err();
    assert_eq!(err.code_enum(), ErrorCode::XPST0008);
    assert_eq!(err.message, "Variable $x has not been declared");
}

#[test]
fn variable_is_out_of_scope_after_its_expression() {
    let err = parse_expression("(for $x in 1 return $x), $x", &ctx()).unwrap_err();
    assert_eq!(err.code_enum(), ErrorCode::XPST0008);
}

#[test]
fn context_variables_resolve_when_no_range_variable_matches() {
    let expr = parse("some $x in a satisfies $ctx");
    let ExprKind::Quantified { kind: Quantifier::Some, binding } = &expr.kind else { panic!("expected some") };
    match &binding.action.kind {
        ExprKind::VarRef(VarRef::Context { name, declared_type }) => {
            assert_eq!(name, &ExpandedName::local("ctx"));
            assert_eq!(declared_type.item, ItemType::Atomic(AtomicType::Boolean));
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn range_variable_shadows_context_variable() {
    let expr = parse("for $ctx in 1 return $ctx");
    expect_range_ref(&expect_for(&expr).action);
}

#[rstest]
#[case("for $x in 1 return $x")]
#[case("for $a in 1, $b in 2, $c in 3 return ($a, $b, $c)")]
#[case("every $x in (some $y in 1 satisfies $y) satisfies $x")]
#[case("for $x in 1 return")]
#[case("for $x in (for $y in 1 return $undeclared) return $x")]
#[case("some $x in 1, $y in 2 satisfies $x + ")]
fn scope_is_balanced_after_success_and_failure(#[case] src: &str) {
    let env = ctx();
    let mut parser = ExpressionParser::new(src, 0, &env, Language::XPath);
    let _ = parser.parse(Token::Eof);
    assert_eq!(parser.range_variables_in_scope(), 0);
}

#[rstest]
#[case("for x in 1 return x")]
#[case("for $x 1 return $x")]
#[case("for $x in 1 satisfies $x")]
#[case("some $x in 1 return $x")]
fn malformed_bindings(#[case] src: &str) {
    let err = parse_expression(src, &ctx()).unwrap_err();
    assert_eq!(err.code_enum(), ErrorCode::XPST0003);
}
