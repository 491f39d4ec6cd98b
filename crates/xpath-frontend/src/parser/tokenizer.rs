//! Context-sensitive lexer for XPath 2.0.
//!
//! Whether a word is an operator or a name depends on the token before it
//! (`div div div` is a division of two `div` children), so tokens are read
//! one at a time on demand and classified against the previous token.

use compact_str::CompactString;

use super::token::{Token, double_keyword, is_kind_keyword, keyword_operator};
use crate::error::{Error, ErrorCode};
use crate::names::{is_name_char, is_name_start_char};

const RECENT_TEXT_LIMIT: usize = 30;

pub struct Tokenizer<'a> {
    input: &'a str,
    start: usize,
    pos: usize,
    pub current_token: Token,
    pub current_value: CompactString,
    /// Byte offset of the current token in the input.
    pub current_offset: usize,
}

impl<'a> Tokenizer<'a> {
    /// Lex `input` from byte offset `start`. Call [`Tokenizer::next`] to read the first token.
    pub fn new(input: &'a str, start: usize) -> Self {
        let mut start = start.min(input.len());
        while !input.is_char_boundary(start) {
            start -= 1;
        }
        Self {
            input,
            start,
            pos: start,
            current_token: Token::Eof,
            current_value: CompactString::default(),
            current_offset: start,
        }
    }

    /// Byte offset just past the current token.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Make the next token be classified as if it followed an operand. Used after
    /// occurrence indicators, which end a type but are themselves operator symbols.
    pub fn treat_current_as_operand_end(&mut self) {
        self.current_token = Token::RPar;
    }

    /// Advance to the next token.
    pub fn next(&mut self) -> Result<(), Error> {
        let preceding = self.current_token;
        let pos = self.skip_trivia(self.pos)?;
        self.pos = pos;
        self.current_offset = pos;
        self.current_value.clear();
        let Some(c) = self.char_at(pos) else {
            self.current_token = Token::Eof;
            return Ok(());
        };
        let input = self.input;
        let rest = &input[pos..];
        let (token, len) = match c {
            '(' => (Token::LPar, 1),
            ')' => (Token::RPar, 1),
            '[' => (Token::LSqb, 1),
            ']' => (Token::RSqb, 1),
            '{' => (Token::LCurly, 1),
            '}' => (Token::RCurly, 1),
            ',' => (Token::Comma, 1),
            '@' => (Token::At, 1),
            '$' => (Token::Dollar, 1),
            '?' => (Token::QMark, 1),
            '|' => (Token::Union, 1),
            '+' => (Token::Plus, 1),
            '-' => (Token::Minus, 1),
            '=' => (Token::Equals, 1),
            '!' if rest.starts_with("!=") => (Token::Ne, 2),
            '<' if rest.starts_with("<=") => (Token::Le, 2),
            '<' if rest.starts_with("<<") => (Token::Precedes, 2),
            '<' => (Token::Lt, 1),
            '>' if rest.starts_with(">=") => (Token::Ge, 2),
            '>' if rest.starts_with(">>") => (Token::Follows, 2),
            '>' => (Token::Gt, 1),
            '/' if rest.starts_with("//") => (Token::SlSl, 2),
            '/' => (Token::Slash, 1),
            '.' if rest.starts_with("..") => (Token::DotDot, 2),
            '.' if self.char_at(pos + 1).is_some_and(|d| d.is_ascii_digit()) => return self.read_number(),
            '.' => (Token::Dot, 1),
            '*' => self.classify_star(preceding),
            '"' | '\'' => return self.read_string(c),
            d if d.is_ascii_digit() => return self.read_number(),
            n if is_name_start_char(n) => return self.read_name(preceding),
            other => {
                self.pos = pos + other.len_utf8();
                self.current_token = Token::Unknown;
                return Err(lexical_error(format!("Unexpected character '{other}' in expression")));
            }
        };
        self.pos = pos + len;
        self.current_token = token;
        Ok(())
    }

    /// Source text consumed so far, limited to the last few characters.
    pub fn recent_text(&self) -> String {
        let end = self.pos.min(self.input.len());
        let text = self.input.get(self.start..end).unwrap_or_default();
        let count = text.chars().count();
        if count > RECENT_TEXT_LIMIT {
            let tail: String = text.chars().skip(count - RECENT_TEXT_LIMIT).collect();
            format!("...{tail}")
        } else {
            text.to_string()
        }
    }

    fn char_at(&self, pos: usize) -> Option<char> {
        self.input.get(pos..)?.chars().next()
    }

    fn set(&mut self, token: Token, value: &str, next_pos: usize) {
        self.current_token = token;
        self.current_value.push_str(value);
        self.pos = next_pos;
    }

    fn skip_trivia(&self, mut pos: usize) -> Result<usize, Error> {
        loop {
            while matches!(self.char_at(pos), Some(' ' | '\t' | '\n' | '\r')) {
                pos += 1;
            }
            if self.input[pos..].starts_with("(:") {
                pos = self.skip_comment(pos)?;
            } else {
                return Ok(pos);
            }
        }
    }

    /// Skip a possibly nested `(: ... :)` comment starting at `start`.
    fn skip_comment(&self, start: usize) -> Result<usize, Error> {
        let bytes = self.input.as_bytes();
        let mut depth = 0usize;
        let mut i = start;
        while i + 1 < bytes.len() {
            match (bytes[i], bytes[i + 1]) {
                (b'(', b':') => {
                    depth += 1;
                    i += 2;
                }
                (b':', b')') => {
                    depth -= 1;
                    i += 2;
                    if depth == 0 {
                        return Ok(i);
                    }
                }
                _ => i += 1,
            }
        }
        Err(lexical_error("Unclosed XPath comment"))
    }

    fn classify_star(&self, preceding: Token) -> (Token, usize) {
        if preceding.ends_operand() {
            return (Token::Mult, 1);
        }
        let pos = self.current_offset;
        if self.char_at(pos + 1) == Some(':') && self.char_at(pos + 2).is_some_and(is_name_start_char) {
            (Token::Suffix, 2)
        } else {
            (Token::Star, 1)
        }
    }

    fn scan_ncname(&self, start: usize) -> usize {
        let tail = &self.input[start..];
        start + tail.find(|c: char| !is_name_char(c)).unwrap_or(tail.len())
    }

    fn scan_digits(&self, start: usize) -> usize {
        let tail = &self.input[start..];
        start + tail.find(|c: char| !c.is_ascii_digit()).unwrap_or(tail.len())
    }

    fn read_number(&mut self) -> Result<(), Error> {
        let start = self.pos;
        let mut i = self.scan_digits(start);
        if self.char_at(i) == Some('.') {
            i = self.scan_digits(i + 1);
        }
        if matches!(self.char_at(i), Some('e' | 'E')) {
            i += 1;
            if matches!(self.char_at(i), Some('+' | '-')) {
                i += 1;
            }
            i = self.scan_digits(i);
        }
        let input = self.input;
        self.set(Token::Number, &input[start..i], i);
        Ok(())
    }

    fn read_string(&mut self, quote: char) -> Result<(), Error> {
        let mut value = CompactString::default();
        let mut i = self.pos + 1;
        loop {
            let Some(ch) = self.char_at(i) else {
                self.pos = self.input.len();
                self.current_token = Token::Unknown;
                return Err(lexical_error("Unmatched quote in expression"));
            };
            i += ch.len_utf8();
            if ch == quote {
                if self.char_at(i) == Some(quote) {
                    value.push(quote);
                    i += 1;
                    continue;
                }
                break;
            }
            value.push(ch);
        }
        self.current_token = Token::StringLiteral;
        self.current_value = value;
        self.pos = i;
        Ok(())
    }

    fn read_name(&mut self, preceding: Token) -> Result<(), Error> {
        let input = self.input;
        let start = self.pos;
        let mut end = self.scan_ncname(start);
        if self.char_at(end) == Some(':') {
            match self.char_at(end + 1) {
                Some(':') => {
                    self.set(Token::Axis, &input[start..end], end + 2);
                    return Ok(());
                }
                Some('*') => {
                    self.set(Token::Prefix, &input[start..end], end + 2);
                    return Ok(());
                }
                Some(c) if is_name_start_char(c) => end = self.scan_ncname(end + 1),
                _ => {}
            }
        }
        let word = &input[start..end];

        if matches!(preceding, Token::Dollar | Token::Suffix) {
            self.set(Token::Name, word, end);
            return Ok(());
        }

        // Two-word operators stay recognisable after a lone `/` so that the
        // parser can reject them there.
        if (preceding.ends_operand() || preceding == Token::Slash)
            && let Some((second, token)) = double_keyword(word)
            && let Some(next) = self.match_word(end, second)?
        {
            self.set(token, word, next);
            return Ok(());
        }

        if preceding.ends_operand() {
            let token = keyword_operator(word).unwrap_or(Token::Name);
            self.set(token, word, end);
            return Ok(());
        }

        let lookahead = self.skip_trivia(end)?;
        match self.char_at(lookahead) {
            Some('(') => {
                let token = if word == "if" {
                    Token::If
                } else if is_kind_keyword(word) {
                    Token::NodeKind
                } else {
                    Token::Function
                };
                self.set(token, word, lookahead + 1);
            }
            Some('$') if word == "for" => self.set(Token::For, word, end),
            Some('$') if word == "some" => self.set(Token::Some, word, end),
            Some('$') if word == "every" => self.set(Token::Every, word, end),
            _ => self.set(Token::Name, word, end),
        }
        Ok(())
    }

    /// If `word` follows `from` (after trivia) as a whole word, the offset just past it.
    fn match_word(&self, from: usize, word: &str) -> Result<Option<usize>, Error> {
        let p = self.skip_trivia(from)?;
        let rest = &self.input[p..];
        let whole = rest.starts_with(word) && !rest[word.len()..].chars().next().is_some_and(is_name_char);
        Ok(whole.then_some(p + word.len()))
    }
}

fn lexical_error(message: impl Into<String>) -> Error {
    Error::static_code(ErrorCode::XPST0003, message)
}
