use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Eof,
    Unknown,
    Name,
    /// A name immediately followed by `(`; the parenthesis is consumed.
    Function,
    /// A kind-test keyword followed by `(`; the parenthesis is consumed.
    NodeKind,
    /// An axis name followed by `::`; the separator is consumed.
    Axis,
    /// `prefix:*`
    Prefix,
    /// `*:`, always followed by a local name.
    Suffix,
    StringLiteral,
    Number,
    Dollar,
    At,
    LPar,
    RPar,
    LSqb,
    RSqb,
    LCurly,
    RCurly,
    Comma,
    Dot,
    DotDot,
    Slash,
    SlSl,
    /// `*` as a wildcard name test.
    Star,
    /// `*` as multiplication.
    Mult,
    Plus,
    Minus,
    QMark,
    Union,
    Intersect,
    Except,
    Div,
    Idiv,
    Mod,
    And,
    Or,
    To,
    Equals,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    FEq,
    FNe,
    FLt,
    FLe,
    FGt,
    FGe,
    Is,
    Precedes,
    Follows,
    InstanceOf,
    TreatAs,
    CastAs,
    CastableAs,
    /// `if (`; the parenthesis is consumed.
    If,
    Then,
    Else,
    For,
    Some,
    Every,
    In,
    Return,
    Satisfies,
}

impl Token {
    /// Binding strength of a binary operator; `None` for every other token.
    pub fn precedence(self) -> Option<u8> {
        use Token::*;
        let level = match self {
            Or => 4,
            And => 5,
            Equals | Ne | Lt | Le | Gt | Ge | FEq | FNe | FLt | FLe | FGt | FGe | Is | Precedes
            | Follows => 6,
            To => 7,
            Plus | Minus => 8,
            Mult | Div | Idiv | Mod => 9,
            Union => 10,
            Intersect | Except => 11,
            InstanceOf => 12,
            TreatAs => 13,
            CastableAs => 14,
            CastAs => 15,
            _ => return None,
        };
        Option::Some(level)
    }

    /// True when a token ends an operand, so that what follows is read as an operator.
    pub fn ends_operand(self) -> bool {
        use Token::*;
        matches!(self, Name | StringLiteral | Number | RPar | RSqb | Dot | DotDot | Star | Prefix)
    }

    pub fn text(self) -> &'static str {
        use Token::*;
        match self {
            Eof => "<eof>",
            Unknown => "<unknown>",
            Name => "<name>",
            Function => "<function>(",
            NodeKind => "<node-type>()",
            Axis => "<axis>::",
            Prefix => "<prefix:*>",
            Suffix => "<*:local-name>",
            StringLiteral => "<string-literal>",
            Number => "<numeric-literal>",
            Dollar => "$",
            At => "@",
            LPar => "(",
            RPar => ")",
            LSqb => "[",
            RSqb => "]",
            LCurly => "{",
            RCurly => "}",
            Comma => ",",
            Dot => ".",
            DotDot => "..",
            Slash => "/",
            SlSl => "//",
            Star | Mult => "*",
            Plus => "+",
            Minus => "-",
            QMark => "?",
            Union => "union",
            Intersect => "intersect",
            Except => "except",
            Div => "div",
            Idiv => "idiv",
            Mod => "mod",
            And => "and",
            Or => "or",
            To => "to",
            Equals => "=",
            Ne => "!=",
            Lt => "<",
            Le => "<=",
            Gt => ">",
            Ge => ">=",
            FEq => "eq",
            FNe => "ne",
            FLt => "lt",
            FLe => "le",
            FGt => "gt",
            FGe => "ge",
            Is => "is",
            Precedes => "<<",
            Follows => ">>",
            InstanceOf => "instance of",
            TreatAs => "treat as",
            CastAs => "cast as",
            CastableAs => "castable as",
            If => "if",
            Then => "then",
            Else => "else",
            For => "for",
            Some => "some",
            Every => "every",
            In => "in",
            Return => "return",
            Satisfies => "satisfies",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Word operators recognised after an operand.
pub(crate) fn keyword_operator(word: &str) -> Option<Token> {
    use Token::*;
    Option::Some(match word {
        "and" => And,
        "or" => Or,
        "div" => Div,
        "idiv" => Idiv,
        "mod" => Mod,
        "to" => To,
        "union" => Union,
        "intersect" => Intersect,
        "except" => Except,
        "eq" => FEq,
        "ne" => FNe,
        "lt" => FLt,
        "le" => FLe,
        "gt" => FGt,
        "ge" => FGe,
        "is" => Is,
        "then" => Then,
        "else" => Else,
        "in" => In,
        "return" => Return,
        "satisfies" => Satisfies,
        _ => return None,
    })
}

/// Two-word operators: the first word and the word that must follow it.
pub(crate) fn double_keyword(first: &str) -> Option<(&'static str, Token)> {
    match first {
        "instance" => Some(("of", Token::InstanceOf)),
        "treat" => Some(("as", Token::TreatAs)),
        "cast" => Some(("as", Token::CastAs)),
        "castable" => Some(("as", Token::CastableAs)),
        _ => None,
    }
}

/// Keywords that start a kind test when followed by `(`.
pub(crate) fn is_kind_keyword(word: &str) -> bool {
    matches!(
        word,
        "node"
            | "text"
            | "comment"
            | "processing-instruction"
            | "document-node"
            | "element"
            | "attribute"
            | "schema-element"
            | "schema-attribute"
            | "namespace-node"
            | "item"
            | "empty-sequence"
    )
}
