use core::fmt;
use std::sync::Arc;

use crate::consts::ERR_NS;
use crate::xdm::ExpandedName;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Static,
    Dynamic,
}

/// The error codes this crate raises. Codes supplied by a host collaborator
/// outside this set map to `Unknown` through [`Error::code_enum`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    XPST0003, // syntax error
    XPST0008, // undeclared variable, type or schema component
    XPST0017, // no function with this name and arity
    XPST0051, // unknown or non-atomic type in a SequenceType
    XPST0080, // cast target is xs:anyAtomicType or xs:NOTATION
    XPST0081, // unbound namespace prefix
    XPTY0004, // type error, e.g. a PI name that is not an NCName
    XPDY0050, // treat as failure
    FORG0001, // invalid lexical form in a cast
    FONS0004, // no namespace found for prefix in a cast
    XTSE0340, // syntax error in an XSLT pattern
    XTSE0350, // unterminated attribute value template
    XTSE1060, // current-group() in a pattern
    XTSE1070, // current-grouping-key() in a pattern
    XTDE1425, // unknown function under backwards-compatible processing
    Unknown,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        use ErrorCode::*;
        match self {
            XPST0003 => "err:XPST0003",
            XPST0008 => "err:XPST0008",
            XPST0017 => "err:XPST0017",
            XPST0051 => "err:XPST0051",
            XPST0080 => "err:XPST0080",
            XPST0081 => "err:XPST0081",
            XPTY0004 => "err:XPTY0004",
            XPDY0050 => "err:XPDY0050",
            FORG0001 => "err:FORG0001",
            FONS0004 => "err:FONS0004",
            XTSE0340 => "err:XTSE0340",
            XTSE0350 => "err:XTSE0350",
            XTSE1060 => "err:XTSE1060",
            XTSE1070 => "err:XTSE1070",
            XTDE1425 => "err:XTDE1425",
            Unknown => "err:UNKNOWN",
        }
    }

    pub fn from_code(s: &str) -> Self {
        use ErrorCode::*;
        match s {
            "err:XPST0003" => XPST0003,
            "err:XPST0008" => XPST0008,
            "err:XPST0017" => XPST0017,
            "err:XPST0051" => XPST0051,
            "err:XPST0080" => XPST0080,
            "err:XPST0081" => XPST0081,
            "err:XPTY0004" => XPTY0004,
            "err:XPDY0050" => XPDY0050,
            "err:FORG0001" => FORG0001,
            "err:FONS0004" => FONS0004,
            "err:XTSE0340" => XTSE0340,
            "err:XTSE0350" => XTSE0350,
            "err:XTSE1060" => XTSE1060,
            "err:XTSE1070" => XTSE1070,
            "err:XTDE1425" => XTDE1425,
            _ => Unknown,
        }
    }

    /// The code as a name in the err namespace.
    pub fn qname(&self) -> ExpandedName {
        let local = self.as_str().trim_start_matches("err:");
        ExpandedName::new(Some(ERR_NS), local)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub struct Error {
    pub kind: ErrorKind,
    pub code: ExpandedName,
    pub message: String,
    /// `XPath syntax error near {...}:` style text built from recent input.
    pub location: Option<String>,
    #[source]
    pub source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub fn new_qname(kind: ErrorKind, code: ExpandedName, msg: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: msg.into(),
            location: None,
            source: None,
        }
    }

    pub fn static_code(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self::new_qname(ErrorKind::Static, code.qname(), msg)
    }

    pub fn dynamic(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self::new_qname(ErrorKind::Dynamic, code.qname(), msg)
    }

    pub fn is_static(&self) -> bool {
        self.kind == ErrorKind::Static
    }

    pub fn code_enum(&self) -> ErrorCode {
        if self.code.is_in(ERR_NS) {
            ErrorCode::from_code(&format!("err:{}", self.code.local))
        } else {
            ErrorCode::Unknown
        }
    }

    /// `err:LOCAL` for standard codes, `Q{ns}local` otherwise.
    pub fn format_code(&self) -> String {
        match self.code.namespace_uri() {
            Some(ERR_NS) => format!("err:{}", self.code.local),
            Some(ns) => format!("Q{{{ns}}}{}", self.code.local),
            None => self.code.local.to_string(),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_source(
        mut self,
        source: impl Into<Option<Arc<dyn std::error::Error + Send + Sync>>>,
    ) -> Self {
        self.source = source.into();
        self
    }
}

/// Two errors are equal when they carry the same code, kind, message and
/// location; the underlying source is not compared.
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.code == other.code
            && self.message == other.message
            && self.location == other.location
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = &self.location {
            f.write_str(location)?;
        }
        write!(f, "{} ({})", self.message, self.format_code())
    }
}
