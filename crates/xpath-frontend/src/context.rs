//! The static context an expression is resolved against.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::consts::{FNS, XML_URI, XS, XSI};
use crate::error::{Error, ErrorCode};
use crate::functions::{FunctionLibrary, default_function_signatures};
use crate::types::{SchemaType, SequenceType};
use crate::xdm::ExpandedName;

/// A variable supplied by the host rather than bound inside the expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextVariable {
    pub name: ExpandedName,
    pub declared_type: SequenceType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LanguageLevel {
    #[default]
    XPath20,
    /// Enables syntax from later language levels, currently `namespace-node()`.
    XPath30,
}

/// Services the parser consults while resolving names.
pub trait StaticContext {
    /// Namespace URI bound to `prefix`. Fails with `XPST0081` when unbound.
    fn uri_for_prefix(&self, prefix: &str) -> Result<String, Error>;

    /// Namespace for unprefixed element and type names.
    fn default_element_namespace(&self) -> Option<&str>;

    /// Namespace for unprefixed function names.
    fn default_function_namespace(&self) -> Option<&str>;

    /// Resolve a variable not bound inside the expression. Fails with `XPST0008`.
    fn bind_variable(&self, name: &ExpandedName) -> Result<ContextVariable, Error>;

    /// Look up a schema type by name.
    fn schema_type(&self, name: &ExpandedName) -> Option<SchemaType>;

    fn function_library(&self) -> &dyn FunctionLibrary;

    /// Report a non-fatal problem. `message` already carries location text.
    fn issue_warning(&self, message: &str);

    fn is_backwards_compatible(&self) -> bool;

    /// Whether `namespace-node()` may appear in a kind test.
    fn is_namespace_test_allowed(&self) -> bool;
}

#[derive(Debug, Clone, Default)]
pub struct NamespaceBindings {
    pub by_prefix: HashMap<String, String>,
}

/// Host-configured static context built with [`StaticContextBuilder`].
pub struct SimpleStaticContext {
    namespaces: NamespaceBindings,
    default_element_namespace: Option<String>,
    default_function_namespace: Option<String>,
    variables: HashMap<ExpandedName, SequenceType>,
    schema_types: HashMap<ExpandedName, SchemaType>,
    functions: Arc<dyn FunctionLibrary>,
    backwards_compatible: bool,
    language_level: LanguageLevel,
    warnings: Mutex<Vec<String>>,
}

impl SimpleStaticContext {
    /// Warnings issued so far, oldest first.
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().map(|w| w.clone()).unwrap_or_default()
    }

    pub fn language_level(&self) -> LanguageLevel {
        self.language_level
    }
}

impl Default for SimpleStaticContext {
    fn default() -> Self {
        let mut ns = NamespaceBindings::default();
        // The xml prefix is always bound and cannot be overridden.
        ns.by_prefix.insert("xml".to_string(), XML_URI.to_string());
        ns.by_prefix.insert("xs".to_string(), XS.to_string());
        ns.by_prefix.insert("xsi".to_string(), XSI.to_string());
        ns.by_prefix.insert("fn".to_string(), FNS.to_string());
        Self {
            namespaces: ns,
            default_element_namespace: None,
            default_function_namespace: Some(FNS.to_string()),
            variables: HashMap::new(),
            schema_types: HashMap::new(),
            functions: default_function_signatures(),
            backwards_compatible: false,
            language_level: LanguageLevel::default(),
            warnings: Mutex::new(Vec::new()),
        }
    }
}

impl StaticContext for SimpleStaticContext {
    fn uri_for_prefix(&self, prefix: &str) -> Result<String, Error> {
        self.namespaces.by_prefix.get(prefix).cloned().ok_or_else(|| {
            Error::static_code(ErrorCode::XPST0081, format!("Prefix {prefix} has not been declared"))
        })
    }

    fn default_element_namespace(&self) -> Option<&str> {
        self.default_element_namespace.as_deref()
    }

    fn default_function_namespace(&self) -> Option<&str> {
        self.default_function_namespace.as_deref()
    }

    fn bind_variable(&self, name: &ExpandedName) -> Result<ContextVariable, Error> {
        self.variables
            .get(name)
            .map(|ty| ContextVariable { name: name.clone(), declared_type: ty.clone() })
            .ok_or_else(|| {
                Error::static_code(ErrorCode::XPST0008, format!("Variable ${name} has not been declared"))
            })
    }

    fn schema_type(&self, name: &ExpandedName) -> Option<SchemaType> {
        if name.is_in(XS)
            && let Some(builtin) = SchemaType::builtin(name.local_name())
        {
            return Some(builtin);
        }
        self.schema_types.get(name).cloned()
    }

    fn function_library(&self) -> &dyn FunctionLibrary {
        self.functions.as_ref()
    }

    fn issue_warning(&self, message: &str) {
        tracing::warn!(warning = %message, "static warning issued");
        if let Ok(mut warnings) = self.warnings.lock() {
            warnings.push(message.to_string());
        }
    }

    fn is_backwards_compatible(&self) -> bool {
        self.backwards_compatible
    }

    fn is_namespace_test_allowed(&self) -> bool {
        self.language_level == LanguageLevel::XPath30
    }
}

/// Builder for [`SimpleStaticContext`]. Starts with the `xml`, `xs`, `xsi`
/// and `fn` prefixes bound, `fn` as the default function namespace and the
/// standard function library.
pub struct StaticContextBuilder {
    ctx: SimpleStaticContext,
}

impl Default for StaticContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticContextBuilder {
    pub fn new() -> Self {
        Self { ctx: SimpleStaticContext::default() }
    }

    /// Register a namespace prefix. Attempts to rebind `xml` are ignored.
    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        let p = prefix.into();
        if p == "xml" {
            return self;
        }
        self.ctx.namespaces.by_prefix.insert(p, uri.into());
        self
    }

    pub fn with_default_element_namespace(mut self, uri: impl Into<String>) -> Self {
        self.ctx.default_element_namespace = Some(uri.into());
        self
    }

    pub fn with_default_function_namespace(mut self, uri: impl Into<String>) -> Self {
        self.ctx.default_function_namespace = Some(uri.into());
        self
    }

    pub fn with_variable(mut self, name: ExpandedName, declared_type: SequenceType) -> Self {
        self.ctx.variables.insert(name, declared_type);
        self
    }

    /// Make a user-defined schema type known, as an imported schema would.
    pub fn with_schema_type(mut self, schema_type: SchemaType) -> Self {
        self.ctx.schema_types.insert(schema_type.name(), schema_type);
        self
    }

    pub fn with_functions(mut self, library: Arc<dyn FunctionLibrary>) -> Self {
        self.ctx.functions = library;
        self
    }

    pub fn with_backwards_compatibility(mut self, enabled: bool) -> Self {
        self.ctx.backwards_compatible = enabled;
        self
    }

    pub fn with_language_level(mut self, level: LanguageLevel) -> Self {
        self.ctx.language_level = level;
        self
    }

    pub fn build(self) -> SimpleStaticContext {
        self.ctx
    }
}
