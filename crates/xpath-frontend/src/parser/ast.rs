//! Expression tree produced by the parser. Names, variables and functions are
//! already resolved; every node records where in the source it started.

use core::fmt;

use rust_decimal::Decimal;

use crate::error::{Error, ErrorCode};
use crate::functions::FunctionBinding;
use crate::types::{AtomicType, ItemType, NodeKind, NodeTest, SequenceType};
use crate::xdm::ExpandedName;

/// Byte offset of the token that started a construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Location {
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    /// An integer literal outside the `i64` range, as its digits without leading zeros.
    BigInteger(String),
    Decimal(Decimal),
    Double(f64),
    String(String),
    Boolean(bool),
    /// Folded from `xs:QName("p:local")` or `"p:local" cast as xs:QName`.
    QName { prefix: Option<String>, name: ExpandedName },
    EmptySequence,
}

impl Literal {
    pub fn item_type(&self) -> ItemType {
        match self {
            Literal::Integer(_) | Literal::BigInteger(_) => ItemType::Atomic(AtomicType::Integer),
            Literal::Decimal(_) => ItemType::Atomic(AtomicType::Decimal),
            Literal::Double(_) => ItemType::Atomic(AtomicType::Double),
            Literal::String(_) => ItemType::Atomic(AtomicType::String),
            Literal::Boolean(_) => ItemType::Atomic(AtomicType::Boolean),
            Literal::QName { .. } => ItemType::Atomic(AtomicType::QName),
            Literal::EmptySequence => ItemType::Empty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnarySign {
    Plus,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    IDiv,
    Mod,
    And,
    Or,
}

impl BinaryOp {
    pub fn is_boolean(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "div",
            BinaryOp::IDiv => "idiv",
            BinaryOp::Mod => "mod",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

/// `=`, `!=`, ... : existentially quantified comparison of two sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneralComp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl GeneralComp {
    fn symbol(self) -> &'static str {
        match self {
            GeneralComp::Eq => "=",
            GeneralComp::Ne => "!=",
            GeneralComp::Lt => "<",
            GeneralComp::Le => "<=",
            GeneralComp::Gt => ">",
            GeneralComp::Ge => ">=",
        }
    }
}

/// `eq`, `ne`, ... : comparison of two single atomic values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueComp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl ValueComp {
    fn symbol(self) -> &'static str {
        match self {
            ValueComp::Eq => "eq",
            ValueComp::Ne => "ne",
            ValueComp::Lt => "lt",
            ValueComp::Le => "le",
            ValueComp::Gt => "gt",
            ValueComp::Ge => "ge",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeComp {
    Is,
    Precedes,
    Follows,
}

impl NodeComp {
    fn symbol(self) -> &'static str {
        match self {
            NodeComp::Is => "is",
            NodeComp::Precedes => "<<",
            NodeComp::Follows => ">>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    Union,
    Intersect,
    Except,
}

impl SetOp {
    fn symbol(self) -> &'static str {
        match self {
            SetOp::Union => "union",
            SetOp::Intersect => "intersect",
            SetOp::Except => "except",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    Some,
    Every,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Child,
    Descendant,
    Attribute,
    SelfAxis,
    DescendantOrSelf,
    FollowingSibling,
    Following,
    Namespace,
    Parent,
    Ancestor,
    PrecedingSibling,
    Preceding,
    AncestorOrSelf,
}

impl Axis {
    pub fn from_name(name: &str) -> Option<Axis> {
        Some(match name {
            "child" => Axis::Child,
            "descendant" => Axis::Descendant,
            "attribute" => Axis::Attribute,
            "self" => Axis::SelfAxis,
            "descendant-or-self" => Axis::DescendantOrSelf,
            "following-sibling" => Axis::FollowingSibling,
            "following" => Axis::Following,
            "namespace" => Axis::Namespace,
            "parent" => Axis::Parent,
            "ancestor" => Axis::Ancestor,
            "preceding-sibling" => Axis::PrecedingSibling,
            "preceding" => Axis::Preceding,
            "ancestor-or-self" => Axis::AncestorOrSelf,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Axis::Child => "child",
            Axis::Descendant => "descendant",
            Axis::Attribute => "attribute",
            Axis::SelfAxis => "self",
            Axis::DescendantOrSelf => "descendant-or-self",
            Axis::FollowingSibling => "following-sibling",
            Axis::Following => "following",
            Axis::Namespace => "namespace",
            Axis::Parent => "parent",
            Axis::Ancestor => "ancestor",
            Axis::PrecedingSibling => "preceding-sibling",
            Axis::Preceding => "preceding",
            Axis::AncestorOrSelf => "ancestor-or-self",
        }
    }

    /// Axes that deliver nodes in reverse document order. `parent` selects
    /// at most one node, so its order never needs correcting.
    pub fn is_reverse(self) -> bool {
        matches!(self, Axis::Ancestor | Axis::AncestorOrSelf | Axis::Preceding | Axis::PrecedingSibling)
    }

    /// The kind of node a bare name test selects on this axis.
    pub fn principal_node_kind(self) -> NodeKind {
        match self {
            Axis::Attribute => NodeKind::Attribute,
            Axis::Namespace => NodeKind::Namespace,
            _ => NodeKind::Element,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(pub u32);

/// A range variable introduced by `for`, `some` or `every`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub id: BindingId,
    pub name: ExpandedName,
    pub required_type: SequenceType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VarRef {
    /// Bound by an enclosing `for`/`some`/`every` in the same expression.
    Range { id: BindingId, name: ExpandedName, required_type: SequenceType },
    /// Supplied by the static context.
    Context { name: ExpandedName, declared_type: SequenceType },
}

impl VarRef {
    pub fn name(&self) -> &ExpandedName {
        match self {
            VarRef::Range { name, .. } | VarRef::Context { name, .. } => name,
        }
    }

    pub fn static_type(&self) -> &SequenceType {
        match self {
            VarRef::Range { required_type, .. } => required_type,
            VarRef::Context { declared_type, .. } => declared_type,
        }
    }
}

/// One `$v in seq` clause together with the expression it scopes over.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeBinding {
    pub variable: Binding,
    pub sequence: Expr,
    pub action: Expr,
}

/// Target of `cast as` / `castable as`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleType {
    pub atomic: AtomicType,
    pub optional: bool,
}

impl fmt::Display for SingleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.atomic, if self.optional { "?" } else { "" })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    VarRef(VarRef),
    ContextItem,
    /// `/`: the root of the tree containing the context node.
    Root,
    /// `..`
    ParentNode,
    AxisStep { axis: Axis, test: NodeTest },
    Filter { base: Box<Expr>, predicate: Box<Expr> },
    /// `start/step`
    Path { start: Box<Expr>, step: Box<Expr> },
    /// Puts the result of a reverse-axis step back into document order.
    Reverse(Box<Expr>),
    Binary { left: Box<Expr>, op: BinaryOp, right: Box<Expr> },
    GeneralComparison { left: Box<Expr>, op: GeneralComp, right: Box<Expr> },
    ValueComparison { left: Box<Expr>, op: ValueComp, right: Box<Expr> },
    NodeComparison { left: Box<Expr>, op: NodeComp, right: Box<Expr> },
    Range { start: Box<Expr>, end: Box<Expr> },
    SetOp { left: Box<Expr>, op: SetOp, right: Box<Expr> },
    Unary { sign: UnarySign, expr: Box<Expr> },
    IfThenElse { cond: Box<Expr>, then_expr: Box<Expr>, else_expr: Box<Expr> },
    For(Box<RangeBinding>),
    Quantified { kind: Quantifier, binding: Box<RangeBinding> },
    InstanceOf { expr: Box<Expr>, ty: SequenceType },
    /// `error_code` is raised at evaluation time when the operand does not match.
    TreatAs { expr: Box<Expr>, ty: SequenceType, error_code: ErrorCode },
    CastableAs { expr: Box<Expr>, ty: SingleType },
    CastAs { expr: Box<Expr>, ty: SingleType },
    FunctionCall { function: FunctionBinding, args: Vec<Expr> },
    Sequence(Vec<Expr>),
    /// Raises the carried dynamic error if evaluated.
    Error(Error),
}

impl Expr {
    pub fn new(kind: ExprKind, loc: Location) -> Self {
        Self { kind, loc }
    }

    /// Best-effort static item type of the expression's value.
    pub fn item_type(&self) -> ItemType {
        match &self.kind {
            ExprKind::Literal(l) => l.item_type(),
            ExprKind::VarRef(v) => v.static_type().item.clone(),
            ExprKind::ContextItem | ExprKind::Error(_) => ItemType::AnyItem,
            ExprKind::Root => ItemType::Node(NodeTest::Kind(NodeKind::Document)),
            ExprKind::ParentNode => ItemType::Node(NodeTest::AnyNode),
            ExprKind::AxisStep { axis, test } => match test {
                NodeTest::AnyNode if *axis == Axis::Attribute => {
                    ItemType::Node(NodeTest::Kind(NodeKind::Attribute))
                }
                _ => ItemType::Node(test.clone()),
            },
            ExprKind::Filter { base, .. } | ExprKind::Reverse(base) => base.item_type(),
            ExprKind::Path { step, .. } => step.item_type(),
            ExprKind::Binary { left, op, right } => {
                if op.is_boolean() {
                    return ItemType::Atomic(AtomicType::Boolean);
                }
                arithmetic_item_type(*op, &left.item_type(), &right.item_type())
            }
            ExprKind::Unary { expr, .. } => match expr.item_type() {
                ItemType::Atomic(t) if t.is_numeric() => ItemType::Atomic(t),
                _ => ItemType::Atomic(AtomicType::AnyAtomic),
            },
            ExprKind::GeneralComparison { .. }
            | ExprKind::ValueComparison { .. }
            | ExprKind::NodeComparison { .. }
            | ExprKind::Quantified { .. }
            | ExprKind::InstanceOf { .. }
            | ExprKind::CastableAs { .. } => ItemType::Atomic(AtomicType::Boolean),
            ExprKind::Range { .. } => ItemType::Atomic(AtomicType::Integer),
            ExprKind::SetOp { left, right, .. } => match left.item_type().common_supertype(&right.item_type()) {
                node @ ItemType::Node(_) => node,
                _ => ItemType::Node(NodeTest::AnyNode),
            },
            ExprKind::IfThenElse { then_expr, else_expr, .. } => {
                then_expr.item_type().common_supertype(&else_expr.item_type())
            }
            ExprKind::For(binding) => binding.action.item_type(),
            ExprKind::TreatAs { ty, .. } => ty.item.clone(),
            ExprKind::CastAs { ty, .. } => ItemType::Atomic(ty.atomic),
            ExprKind::FunctionCall { function, .. } => function.result_type.item.clone(),
            ExprKind::Sequence(items) => items
                .iter()
                .map(Expr::item_type)
                .reduce(|a, b| a.common_supertype(&b))
                .unwrap_or(ItemType::Empty),
        }
    }

    /// Give every reference to the range variable `id` in this tree the type `ty`.
    pub(crate) fn retype_range_variable(&mut self, id: BindingId, ty: &SequenceType) {
        if let ExprKind::VarRef(VarRef::Range { id: bound, required_type, .. }) = &mut self.kind {
            if *bound == id {
                *required_type = ty.clone();
            }
            return;
        }
        self.for_each_child_mut(|child| child.retype_range_variable(id, ty));
    }

    fn for_each_child_mut(&mut self, mut visit: impl FnMut(&mut Expr)) {
        match &mut self.kind {
            ExprKind::Literal(_)
            | ExprKind::VarRef(_)
            | ExprKind::ContextItem
            | ExprKind::Root
            | ExprKind::ParentNode
            | ExprKind::AxisStep { .. }
            | ExprKind::Error(_) => {}
            ExprKind::Filter { base: first, predicate: second }
            | ExprKind::Path { start: first, step: second }
            | ExprKind::Range { start: first, end: second }
            | ExprKind::Binary { left: first, right: second, .. }
            | ExprKind::GeneralComparison { left: first, right: second, .. }
            | ExprKind::ValueComparison { left: first, right: second, .. }
            | ExprKind::NodeComparison { left: first, right: second, .. }
            | ExprKind::SetOp { left: first, right: second, .. } => {
                visit(&mut **first);
                visit(&mut **second);
            }
            ExprKind::Reverse(inner)
            | ExprKind::Unary { expr: inner, .. }
            | ExprKind::InstanceOf { expr: inner, .. }
            | ExprKind::TreatAs { expr: inner, .. }
            | ExprKind::CastableAs { expr: inner, .. }
            | ExprKind::CastAs { expr: inner, .. } => visit(&mut **inner),
            ExprKind::IfThenElse { cond, then_expr, else_expr } => {
                visit(&mut **cond);
                visit(&mut **then_expr);
                visit(&mut **else_expr);
            }
            ExprKind::For(binding) | ExprKind::Quantified { binding, .. } => {
                visit(&mut binding.sequence);
                visit(&mut binding.action);
            }
            ExprKind::FunctionCall { args: items, .. } | ExprKind::Sequence(items) => items.iter_mut().for_each(visit),
        }
    }

    /// The string value, if this is a string literal.
    pub fn as_string_literal(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Literal(Literal::String(s)) => Some(s),
            _ => None,
        }
    }
}

fn arithmetic_item_type(op: BinaryOp, left: &ItemType, right: &ItemType) -> ItemType {
    let (ItemType::Atomic(a), ItemType::Atomic(b)) = (left, right) else {
        return ItemType::Atomic(AtomicType::AnyAtomic);
    };
    match (op, a.promote_numeric(*b)) {
        (BinaryOp::IDiv, Some(_)) => ItemType::Atomic(AtomicType::Integer),
        (BinaryOp::Div, Some(AtomicType::Integer)) => ItemType::Atomic(AtomicType::Decimal),
        (_, Some(t)) => ItemType::Atomic(t),
        (_, None) => ItemType::Atomic(AtomicType::AnyAtomic),
    }
}

fn write_string_literal(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "\"{}\"", s.replace('"', "\"\""))
}

fn write_range_binding(f: &mut fmt::Formatter<'_>, keyword: &str, b: &RangeBinding, action_kw: &str) -> fmt::Result {
    write!(f, "({keyword} ${} in {} {action_kw} {})", b.variable.name, b.sequence, b.action)
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(i) => write!(f, "{i}"),
            Literal::BigInteger(digits) => f.write_str(digits),
            Literal::Decimal(d) => write!(f, "{d}"),
            Literal::Double(d) => write!(f, "{d:e}"),
            Literal::String(s) => write_string_literal(f, s),
            Literal::Boolean(b) => write!(f, "{b}()"),
            Literal::QName { prefix, name } => {
                let lexical = match prefix {
                    Some(p) => format!("{p}:{}", name.local),
                    None => name.local.to_string(),
                };
                f.write_str("xs:QName(")?;
                write_string_literal(f, &lexical)?;
                f.write_str(")")
            }
            Literal::EmptySequence => f.write_str("()"),
        }
    }
}

/// Fully parenthesised rendering: every operator application is wrapped in
/// parentheses, so the grouping chosen by the parser is visible.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Literal(l) => write!(f, "{l}"),
            ExprKind::VarRef(v) => write!(f, "${}", v.name()),
            ExprKind::ContextItem => f.write_str("."),
            ExprKind::Root => f.write_str("/"),
            ExprKind::ParentNode => f.write_str(".."),
            ExprKind::AxisStep { axis, test } => write!(f, "{}::{test}", axis.name()),
            ExprKind::Filter { base, predicate } => write!(f, "{base}[{predicate}]"),
            ExprKind::Path { start, step } => match start.kind {
                ExprKind::Root => write!(f, "(/{step})"),
                _ => write!(f, "({start}/{step})"),
            },
            ExprKind::Reverse(inner) => write!(f, "reverse({inner})"),
            ExprKind::Binary { left, op, right } => write!(f, "({left} {} {right})", op.symbol()),
            ExprKind::GeneralComparison { left, op, right } => write!(f, "({left} {} {right})", op.symbol()),
            ExprKind::ValueComparison { left, op, right } => write!(f, "({left} {} {right})", op.symbol()),
            ExprKind::NodeComparison { left, op, right } => write!(f, "({left} {} {right})", op.symbol()),
            ExprKind::Range { start, end } => write!(f, "({start} to {end})"),
            ExprKind::SetOp { left, op, right } => write!(f, "({left} {} {right})", op.symbol()),
            ExprKind::Unary { sign: UnarySign::Minus, expr } => write!(f, "(-{expr})"),
            ExprKind::Unary { sign: UnarySign::Plus, expr } => write!(f, "(+{expr})"),
            ExprKind::IfThenElse { cond, then_expr, else_expr } => {
                write!(f, "(if ({cond}) then {then_expr} else {else_expr})")
            }
            ExprKind::For(b) => write_range_binding(f, "for", b, "return"),
            ExprKind::Quantified { kind: Quantifier::Some, binding } => {
                write_range_binding(f, "some", binding, "satisfies")
            }
            ExprKind::Quantified { kind: Quantifier::Every, binding } => {
                write_range_binding(f, "every", binding, "satisfies")
            }
            ExprKind::InstanceOf { expr, ty } => write!(f, "({expr} instance of {ty})"),
            ExprKind::TreatAs { expr, ty, .. } => write!(f, "({expr} treat as {ty})"),
            ExprKind::CastableAs { expr, ty } => write!(f, "({expr} castable as {ty})"),
            ExprKind::CastAs { expr, ty } => write!(f, "({expr} cast as {ty})"),
            ExprKind::FunctionCall { function, args } => {
                write!(f, "{}(", function.name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            ExprKind::Sequence(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
            ExprKind::Error(err) => write!(f, "error({})", err.format_code()),
        }
    }
}
