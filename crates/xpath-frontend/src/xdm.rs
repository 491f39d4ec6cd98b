use core::fmt;
use string_cache::DefaultAtom;

use crate::consts::conventional_prefix;
use crate::name_pool::{intern_name, intern_namespace};

/// A namespace-qualified name. Equality ignores any lexical prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExpandedName {
    pub ns_uri: Option<DefaultAtom>,
    pub local: DefaultAtom,
}

impl ExpandedName {
    pub fn new(ns_uri: Option<&str>, local: &str) -> Self {
        Self {
            ns_uri: ns_uri.filter(|ns| !ns.is_empty()).map(intern_namespace),
            local: intern_name(local),
        }
    }

    /// A name in no namespace.
    pub fn local(local: &str) -> Self {
        Self::new(None, local)
    }

    pub fn namespace_uri(&self) -> Option<&str> {
        self.ns_uri.as_deref()
    }

    pub fn local_name(&self) -> &str {
        &self.local
    }

    pub fn is_in(&self, ns: &str) -> bool {
        self.namespace_uri() == Some(ns)
    }

    /// `{uri}local`, or just `local` for names in no namespace.
    pub fn clark_name(&self) -> String {
        match self.namespace_uri() {
            Some(ns) => format!("{{{ns}}}{}", self.local),
            None => self.local.to_string(),
        }
    }
}

/// Renders with the conventional prefix for well-known namespaces
/// (`xs:integer`, `fn:count`) and as an EQName (`Q{uri}local`) otherwise.
impl fmt::Display for ExpandedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.namespace_uri() {
            None => write!(f, "{}", self.local),
            Some(ns) => match conventional_prefix(ns) {
                Some(prefix) => write!(f, "{prefix}:{}", self.local),
                None => write!(f, "Q{{{ns}}}{}", self.local),
            },
        }
    }
}
