use string_cache::DefaultAtom;

/// Forwarders to the global `string_cache` interner. Local names and
/// namespace URIs recur constantly in parsed expressions, so every
/// `ExpandedName` holds interned atoms rather than owned strings.
pub fn intern_name(name: &str) -> DefaultAtom {
    DefaultAtom::from(name)
}

pub fn intern_namespace(uri: &str) -> DefaultAtom {
    DefaultAtom::from(uri)
}
