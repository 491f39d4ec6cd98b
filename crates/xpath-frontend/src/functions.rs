//! Function libraries: binding a function name and arity to a callable description.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use itertools::Itertools;

use crate::consts::{FNS, XS};
use crate::error::Error;
use crate::types::{AtomicType, ItemType, NodeKind, NodeTest, Occurrence, SequenceType};
use crate::xdm::ExpandedName;

/// What a bound function is, as far as static analysis needs to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    System,
    /// `xs:T($arg)`
    Constructor(AtomicType),
    CurrentGroup,
    CurrentGroupingKey,
    RegexGroup,
    /// Registered by the host.
    Extension,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionBinding {
    pub name: ExpandedName,
    pub arity: usize,
    pub kind: FunctionKind,
    pub result_type: SequenceType,
}

pub trait FunctionLibrary: Send + Sync {
    /// Bind a call. `Ok(None)` means no function with this name and arity exists;
    /// an `Err` is reported to the caller unchanged.
    fn bind(&self, name: &ExpandedName, arity: usize) -> Result<Option<FunctionBinding>, Error>;

    /// Arities under which `name` is known, for diagnostics.
    fn arities(&self, _name: &ExpandedName) -> Vec<usize> {
        Vec::new()
    }
}

#[derive(Debug, Clone)]
struct Signature {
    min: usize,
    max: Option<usize>,
    kind: FunctionKind,
    result: SequenceType,
}

impl Signature {
    fn accepts(&self, arity: usize) -> bool {
        arity >= self.min && self.max.is_none_or(|max| arity <= max)
    }
}

/// Registry of function signatures keyed by expanded name.
#[derive(Debug, Clone, Default)]
pub struct FunctionSignatures {
    by_name: HashMap<ExpandedName, Vec<Signature>>,
    constructors: bool,
}

impl FunctionSignatures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `ns:local` for arities `min..=max`; `max == None` means variadic.
    pub fn register_ns(&mut self, ns: &str, local: &str, min: usize, max: Option<usize>, result: SequenceType) {
        self.register_kind(ns, local, min, max, result, FunctionKind::System);
    }

    pub fn register_kind(
        &mut self,
        ns: &str,
        local: &str,
        min: usize,
        max: Option<usize>,
        result: SequenceType,
        kind: FunctionKind,
    ) {
        self.by_name
            .entry(ExpandedName::new(Some(ns), local))
            .or_default()
            .push(Signature { min, max, kind, result });
    }

    /// Also bind `xs:T($arg)` for every non-abstract built-in atomic type.
    pub fn with_constructor_functions(mut self) -> Self {
        self.constructors = true;
        self
    }

    fn constructor_target(&self, name: &ExpandedName) -> Option<AtomicType> {
        if !self.constructors || !name.is_in(XS) {
            return None;
        }
        AtomicType::from_local_name(name.local_name()).filter(|t| !t.is_abstract())
    }

    /// XPath 2.0 core functions, the XSLT 2.0 additions and the constructor functions.
    pub fn standard() -> Self {
        let mut sigs = Self::new().with_constructor_functions();
        register_core(&mut sigs);
        register_xslt(&mut sigs);
        sigs
    }
}

impl FunctionLibrary for FunctionSignatures {
    fn bind(&self, name: &ExpandedName, arity: usize) -> Result<Option<FunctionBinding>, Error> {
        if let Some(target) = self.constructor_target(name) {
            return Ok((arity == 1).then(|| FunctionBinding {
                name: name.clone(),
                arity,
                kind: FunctionKind::Constructor(target),
                result_type: SequenceType::atomic(target, Occurrence::ZeroOrOne),
            }));
        }
        Ok(self
            .by_name
            .get(name)
            .and_then(|sigs| sigs.iter().find(|s| s.accepts(arity)))
            .map(|sig| FunctionBinding {
                name: name.clone(),
                arity,
                kind: sig.kind,
                result_type: sig.result.clone(),
            }))
    }

    fn arities(&self, name: &ExpandedName) -> Vec<usize> {
        if self.constructor_target(name).is_some() {
            return vec![1];
        }
        self.by_name
            .get(name)
            .map(|sigs| {
                sigs.iter()
                    .flat_map(|s| s.min..=s.max.unwrap_or(s.min))
                    .sorted()
                    .dedup()
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Shared instance of [`FunctionSignatures::standard`].
pub fn default_function_signatures() -> Arc<FunctionSignatures> {
    static SIGS: OnceLock<Arc<FunctionSignatures>> = OnceLock::new();
    SIGS.get_or_init(|| Arc::new(FunctionSignatures::standard())).clone()
}

fn one(t: AtomicType) -> SequenceType {
    SequenceType::atomic(t, Occurrence::ExactlyOne)
}

fn opt(t: AtomicType) -> SequenceType {
    SequenceType::atomic(t, Occurrence::ZeroOrOne)
}

fn many(t: AtomicType) -> SequenceType {
    SequenceType::atomic(t, Occurrence::ZeroOrMore)
}

fn items(occurrence: Occurrence) -> SequenceType {
    SequenceType::new(ItemType::AnyItem, occurrence)
}

fn nodes(test: NodeTest, occurrence: Occurrence) -> SequenceType {
    SequenceType::new(ItemType::Node(test), occurrence)
}

macro_rules! reg {
    ($s:ident, $local:literal, $min:literal ..= $max:literal => $ret:expr) => {
        $s.register_ns(FNS, $local, $min, Some($max), $ret)
    };
    ($s:ident, $local:literal, $min:literal .. => $ret:expr) => {
        $s.register_ns(FNS, $local, $min, None, $ret)
    };
    ($s:ident, $local:literal, $arity:literal => $ret:expr) => {
        $s.register_ns(FNS, $local, $arity, Some($arity), $ret)
    };
}

fn register_core(s: &mut FunctionSignatures) {
    use AtomicType::*;
    use Occurrence::*;

    // accessors
    reg!(s, "node-name", 1 => opt(QName));
    reg!(s, "nilled", 1 => opt(Boolean));
    reg!(s, "string", 0..=1 => one(String));
    reg!(s, "data", 1 => many(AnyAtomic));
    reg!(s, "base-uri", 0..=1 => opt(AnyUri));
    reg!(s, "document-uri", 1 => opt(AnyUri));
    reg!(s, "error", 0..=3 => items(ZeroOrMore));
    reg!(s, "trace", 2 => items(ZeroOrMore));

    // numeric
    reg!(s, "abs", 1 => opt(AnyAtomic));
    reg!(s, "ceiling", 1 => opt(AnyAtomic));
    reg!(s, "floor", 1 => opt(AnyAtomic));
    reg!(s, "round", 1 => opt(AnyAtomic));
    reg!(s, "round-half-to-even", 1..=2 => opt(AnyAtomic));
    reg!(s, "number", 0..=1 => one(Double));

    // strings
    reg!(s, "codepoints-to-string", 1 => one(String));
    reg!(s, "string-to-codepoints", 1 => many(Integer));
    reg!(s, "compare", 2..=3 => opt(Integer));
    reg!(s, "codepoint-equal", 2 => opt(Boolean));
    reg!(s, "concat", 2.. => one(String));
    reg!(s, "string-join", 2 => one(String));
    reg!(s, "substring", 2..=3 => one(String));
    reg!(s, "string-length", 0..=1 => one(Integer));
    reg!(s, "normalize-space", 0..=1 => one(String));
    reg!(s, "normalize-unicode", 1..=2 => one(String));
    reg!(s, "upper-case", 1 => one(String));
    reg!(s, "lower-case", 1 => one(String));
    reg!(s, "translate", 3 => one(String));
    reg!(s, "encode-for-uri", 1 => one(String));
    reg!(s, "iri-to-uri", 1 => one(String));
    reg!(s, "escape-html-uri", 1 => one(String));
    reg!(s, "contains", 2..=3 => one(Boolean));
    reg!(s, "starts-with", 2..=3 => one(Boolean));
    reg!(s, "ends-with", 2..=3 => one(Boolean));
    reg!(s, "substring-before", 2..=3 => one(String));
    reg!(s, "substring-after", 2..=3 => one(String));
    reg!(s, "matches", 2..=3 => one(Boolean));
    reg!(s, "replace", 3..=4 => one(String));
    reg!(s, "tokenize", 2..=3 => many(String));
    reg!(s, "resolve-uri", 1..=2 => opt(AnyUri));

    // booleans
    reg!(s, "true", 0 => one(Boolean));
    reg!(s, "false", 0 => one(Boolean));
    reg!(s, "not", 1 => one(Boolean));
    reg!(s, "boolean", 1 => one(Boolean));

    // durations, dates and times
    reg!(s, "seconds-from-duration", 1 => opt(Decimal));
    for local in [
        "years-from-duration",
        "months-from-duration",
        "days-from-duration",
        "hours-from-duration",
        "minutes-from-duration",
        "year-from-dateTime",
        "month-from-dateTime",
        "day-from-dateTime",
        "hours-from-dateTime",
        "minutes-from-dateTime",
        "year-from-date",
        "month-from-date",
        "day-from-date",
        "hours-from-time",
        "minutes-from-time",
    ] {
        s.register_ns(FNS, local, 1, Some(1), opt(Integer));
    }
    reg!(s, "seconds-from-dateTime", 1 => opt(Decimal));
    reg!(s, "seconds-from-time", 1 => opt(Decimal));
    for local in ["timezone-from-dateTime", "timezone-from-date", "timezone-from-time"] {
        s.register_ns(FNS, local, 1, Some(1), opt(DayTimeDuration));
    }
    reg!(s, "adjust-dateTime-to-timezone", 1..=2 => opt(DateTime));
    reg!(s, "adjust-date-to-timezone", 1..=2 => opt(Date));
    reg!(s, "adjust-time-to-timezone", 1..=2 => opt(Time));
    reg!(s, "dateTime", 2 => opt(DateTime));

    // QNames
    reg!(s, "resolve-QName", 2 => opt(QName));
    reg!(s, "QName", 2 => one(QName));
    reg!(s, "prefix-from-QName", 1 => opt(NcName));
    reg!(s, "local-name-from-QName", 1 => opt(NcName));
    reg!(s, "namespace-uri-from-QName", 1 => opt(AnyUri));
    reg!(s, "namespace-uri-for-prefix", 2 => opt(AnyUri));
    reg!(s, "in-scope-prefixes", 1 => many(String));

    // nodes
    reg!(s, "name", 0..=1 => one(String));
    reg!(s, "local-name", 0..=1 => one(String));
    reg!(s, "namespace-uri", 0..=1 => one(AnyUri));
    reg!(s, "lang", 1..=2 => one(Boolean));
    reg!(s, "root", 0..=1 => nodes(NodeTest::AnyNode, ZeroOrOne));

    // sequences
    reg!(s, "index-of", 2..=3 => many(Integer));
    reg!(s, "empty", 1 => one(Boolean));
    reg!(s, "exists", 1 => one(Boolean));
    reg!(s, "distinct-values", 1..=2 => many(AnyAtomic));
    reg!(s, "insert-before", 3 => items(ZeroOrMore));
    reg!(s, "remove", 2 => items(ZeroOrMore));
    reg!(s, "reverse", 1 => items(ZeroOrMore));
    reg!(s, "subsequence", 2..=3 => items(ZeroOrMore));
    reg!(s, "unordered", 1 => items(ZeroOrMore));
    reg!(s, "zero-or-one", 1 => items(ZeroOrOne));
    reg!(s, "one-or-more", 1 => items(OneOrMore));
    reg!(s, "exactly-one", 1 => items(ExactlyOne));
    reg!(s, "deep-equal", 2..=3 => one(Boolean));
    reg!(s, "count", 1 => one(Integer));
    reg!(s, "avg", 1 => opt(AnyAtomic));
    reg!(s, "max", 1..=2 => opt(AnyAtomic));
    reg!(s, "min", 1..=2 => opt(AnyAtomic));
    reg!(s, "sum", 1..=2 => opt(AnyAtomic));
    reg!(s, "id", 1..=2 => nodes(NodeTest::Kind(NodeKind::Element), ZeroOrMore));
    reg!(s, "idref", 1..=2 => nodes(NodeTest::AnyNode, ZeroOrMore));
    reg!(s, "doc", 1 => nodes(NodeTest::Kind(NodeKind::Document), ZeroOrOne));
    reg!(s, "doc-available", 1 => one(Boolean));
    reg!(s, "collection", 0..=1 => nodes(NodeTest::AnyNode, ZeroOrMore));

    // context
    reg!(s, "position", 0 => one(Integer));
    reg!(s, "last", 0 => one(Integer));
    reg!(s, "current-dateTime", 0 => one(DateTime));
    reg!(s, "current-date", 0 => one(Date));
    reg!(s, "current-time", 0 => one(Time));
    reg!(s, "implicit-timezone", 0 => one(DayTimeDuration));
    reg!(s, "default-collation", 0 => one(String));
    reg!(s, "static-base-uri", 0 => opt(AnyUri));
}

fn register_xslt(s: &mut FunctionSignatures) {
    use AtomicType::*;
    use Occurrence::*;

    reg!(s, "current", 0 => items(ExactlyOne));
    s.register_kind(FNS, "current-group", 0, Some(0), items(ZeroOrMore), FunctionKind::CurrentGroup);
    s.register_kind(FNS, "current-grouping-key", 0, Some(0), opt(AnyAtomic), FunctionKind::CurrentGroupingKey);
    s.register_kind(FNS, "regex-group", 1, Some(1), one(String), FunctionKind::RegexGroup);
    reg!(s, "key", 2..=3 => nodes(NodeTest::AnyNode, ZeroOrMore));
    reg!(s, "document", 1..=2 => nodes(NodeTest::AnyNode, ZeroOrMore));
    reg!(s, "format-number", 2..=3 => one(String));
    reg!(s, "format-dateTime", 2..=5 => opt(String));
    reg!(s, "format-date", 2..=5 => opt(String));
    reg!(s, "format-time", 2..=5 => opt(String));
    reg!(s, "system-property", 1 => one(String));
    reg!(s, "element-available", 1 => one(Boolean));
    reg!(s, "function-available", 1..=2 => one(Boolean));
    reg!(s, "type-available", 1 => one(Boolean));
    reg!(s, "generate-id", 0..=1 => one(String));
    reg!(s, "unparsed-entity-uri", 1 => one(AnyUri));
    reg!(s, "unparsed-entity-public-id", 1 => one(String));
    reg!(s, "unparsed-text", 1..=2 => opt(String));
    reg!(s, "unparsed-text-available", 1..=2 => one(Boolean));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fname(local: &str) -> ExpandedName {
        ExpandedName::new(Some(FNS), local)
    }

    #[test]
    fn binds_by_arity() {
        let lib = FunctionSignatures::standard();
        let b = lib.bind(&fname("substring"), 3).unwrap().unwrap();
        assert_eq!(b.kind, FunctionKind::System);
        assert_eq!(b.result_type, one(AtomicType::String));
        assert!(lib.bind(&fname("substring"), 1).unwrap().is_none());
        assert!(lib.bind(&fname("concat"), 9).unwrap().is_some());
        assert_eq!(lib.arities(&fname("substring")), vec![2, 3]);
    }

    #[test]
    fn constructor_functions() {
        let lib = FunctionSignatures::standard();
        let xs_date = ExpandedName::new(Some(XS), "date");
        let b = lib.bind(&xs_date, 1).unwrap().unwrap();
        assert_eq!(b.kind, FunctionKind::Constructor(AtomicType::Date));
        assert!(lib.bind(&xs_date, 2).unwrap().is_none());
        let abstract_type = ExpandedName::new(Some(XS), "anyAtomicType");
        assert!(lib.bind(&abstract_type, 1).unwrap().is_none());
    }

    #[test]
    fn xslt_kinds() {
        let lib = default_function_signatures();
        assert_eq!(lib.bind(&fname("current-group"), 0).unwrap().unwrap().kind, FunctionKind::CurrentGroup);
        assert_eq!(lib.bind(&fname("regex-group"), 1).unwrap().unwrap().kind, FunctionKind::RegexGroup);
    }
}
