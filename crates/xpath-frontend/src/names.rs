//! Lexical checks for XML names.

pub fn is_name_start_char(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

pub fn is_name_char(c: char) -> bool {
    is_name_start_char(c) || c.is_alphanumeric() || matches!(c, '-' | '.' | '\u{B7}')
}

pub fn is_ncname(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if is_name_start_char(c) => chars.all(is_name_char),
        _ => false,
    }
}

/// Split a lexical QName into `(prefix, local)`. The prefix is empty when absent.
pub fn split_qname(lexical: &str) -> Result<(&str, &str), String> {
    match lexical.split_once(':') {
        None if is_ncname(lexical) => Ok(("", lexical)),
        Some((prefix, local)) if is_ncname(prefix) && is_ncname(local) => Ok((prefix, local)),
        _ => Err(format!("Invalid QName {{{lexical}}}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a", true)]
    #[case("_x.y-z", true)]
    #[case("été", true)]
    #[case("1a", false)]
    #[case("-a", false)]
    #[case("a:b", false)]
    #[case("", false)]
    fn ncname_check(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(is_ncname(input), expected);
    }

    #[test]
    fn qname_split() {
        assert_eq!(split_qname("xs:integer"), Ok(("xs", "integer")));
        assert_eq!(split_qname("local"), Ok(("", "local")));
        assert!(split_qname("a:b:c").is_err());
        assert!(split_qname(":b").is_err());
    }
}
