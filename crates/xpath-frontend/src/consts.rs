//! Well-known namespace URIs.

pub const FNS: &str = "http://www.w3.org/2005/xpath-functions";
pub const XS: &str = "http://www.w3.org/2001/XMLSchema";
pub const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const XML_URI: &str = "http://www.w3.org/XML/1998/namespace";
pub const XSLT: &str = "http://www.w3.org/1999/XSL/Transform";

/// Namespace URI used for W3C-defined XPath/XSLT error codes (xqt-errors).
pub const ERR_NS: &str = "http://www.w3.org/2005/xqt-errors";

/// Conventional prefix for a well-known namespace, used when rendering names.
pub(crate) fn conventional_prefix(uri: &str) -> Option<&'static str> {
    match uri {
        FNS => Some("fn"),
        XS => Some("xs"),
        XSI => Some("xsi"),
        XML_URI => Some("xml"),
        XSLT => Some("xsl"),
        ERR_NS => Some("err"),
        _ => None,
    }
}
