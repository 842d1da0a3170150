//! Recursive-descent parser for s-expression source text.
//!
//! Single pass, no backtracking: at each position exactly one token rule
//! applies, chosen by the leading character. Every produced node carries the
//! exact position span of the text it came from, and every error is
//! positioned at the token or construct start (or at the current scan index
//! for unbalanced parentheses, which points at where the next token was
//! expected).

use crate::ast::Node;
use crate::pos::{Pos, SourceSet};
use crate::{Error, ErrorKind};

/// Parse one whole source unit into a [`Node::Root`].
pub(crate) fn parse_unit(sources: &SourceSet, code: &str, base: Pos) -> Result<Node, Error> {
    tracing::trace!(bytes = code.len(), "parsing source unit");
    let mut parser = Parser {
        sources,
        code,
        base,
        i: 0,
    };
    let first = parser.pos(0);
    let mut nodes = Vec::new();
    loop {
        match parser.next_node()? {
            Step::Node(node) => nodes.push(node),
            Step::Eof => break,
            Step::Closed => return Err(parser.error_here(ErrorKind::UnexpectedCloseParen)),
        }
    }
    Ok(Node::Root {
        first,
        after: parser.pos(parser.i),
        nodes,
    })
}

/// Outcome of scanning for the next element: a node, a bare `)` (which only
/// the enclosing list parse may consume), or end of input.
enum Step {
    Node(Node),
    Closed,
    Eof,
}

struct Parser<'a> {
    sources: &'a SourceSet,
    code: &'a str,
    base: Pos,
    /// Byte offset of the scan head.
    i: usize,
}

impl Parser<'_> {
    fn pos(&self, offset: usize) -> Pos {
        self.base.advance(offset)
    }

    fn error_at(&self, offset: usize, kind: ErrorKind) -> Error {
        Error::positioned(kind, self.sources.pos_info(self.pos(offset)))
    }

    fn error_here(&self, kind: ErrorKind) -> Error {
        self.error_at(self.i, kind)
    }

    fn peek(&self) -> Option<char> {
        self.code[self.i..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.i += c.len_utf8();
        Some(c)
    }

    /// Whitespace (Unicode-aware) and `;`-to-end-of-line comments separate
    /// tokens at any nesting depth.
    fn skip_blank(&mut self) {
        while let Some(c) = self.peek() {
            if c == ';' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else if c.is_whitespace() {
                self.i += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn next_node(&mut self) -> Result<Step, Error> {
        self.skip_blank();
        let start = self.i;
        let Some(c) = self.bump() else {
            return Ok(Step::Eof);
        };
        match c {
            ')' => Ok(Step::Closed),
            '(' => self.finish_list(start),
            '\'' => self.char_literal(start),
            '"' => self.string_literal(start),
            '-' if self.peek().is_some_and(|d| d.is_ascii_digit()) => self.number(start),
            c if c.is_ascii_digit() => self.number(start),
            _ => Ok(self.symbol(start)),
        }
    }

    /// The opening `(` has been consumed; collect elements until the
    /// matching `)` (which becomes the list's end) or input runs out.
    fn finish_list(&mut self, start: usize) -> Result<Step, Error> {
        let mut nodes = Vec::new();
        loop {
            match self.next_node()? {
                Step::Node(node) => nodes.push(node),
                Step::Closed => break,
                Step::Eof => return Err(self.error_here(ErrorKind::UnclosedList)),
            }
        }
        Ok(Step::Node(Node::List {
            lparen: self.pos(start),
            // the `)` is a single byte, consumed just before the break
            rparen: self.pos(self.i - 1),
            nodes,
        }))
    }

    /// Digit-initial token (the sign, if any, is already consumed): scan to
    /// the next delimiter, then pick float or int parsing by the presence
    /// of a `.` anywhere in the token.
    fn number(&mut self, start: usize) -> Result<Step, Error> {
        let mut dot = false;
        while let Some(c) = self.peek() {
            if c == ')' || c.is_whitespace() {
                break;
            }
            if c == '.' {
                dot = true;
            }
            self.i += c.len_utf8();
        }
        let text = &self.code[start..self.i];
        if dot {
            match text.parse::<f64>() {
                Ok(value) => Ok(Step::Node(Node::Float {
                    text: text.into(),
                    pos: self.pos(start),
                    value,
                })),
                Err(_) => Err(self.error_at(start, ErrorKind::InvalidFloatLiteral(text.into()))),
            }
        } else {
            match parse_int_literal(text) {
                Some(value) => Ok(Step::Node(Node::Int {
                    text: text.into(),
                    pos: self.pos(start),
                    value,
                })),
                None => Err(self.error_at(start, ErrorKind::InvalidIntLiteral(text.into()))),
            }
        }
    }

    /// `'c'` is an `Int` holding the character's code point, with one level
    /// of backslash escaping (`'\''`).
    fn char_literal(&mut self, start: usize) -> Result<Step, Error> {
        let c = match self.bump() {
            Some('\'') => return Err(self.error_at(start, ErrorKind::InvalidCharLiteral)),
            Some('\\') => match self.bump() {
                Some(escaped) => escaped,
                None => return Err(self.error_at(start, ErrorKind::InvalidCharLiteral)),
            },
            Some(c) => c,
            None => return Err(self.error_at(start, ErrorKind::InvalidCharLiteral)),
        };
        match self.bump() {
            Some('\'') => Ok(Step::Node(Node::Int {
                text: self.code[start..self.i].into(),
                pos: self.pos(start),
                value: i64::from(u32::from(c)),
            })),
            Some(_) => Err(self.error_at(start, ErrorKind::UnclosedCharLiteral)),
            None => Err(self.error_at(start, ErrorKind::InvalidCharLiteral)),
        }
    }

    /// Content runs until an unescaped `"`; the captured text, quotes
    /// included, is then decoded as a whole.
    fn string_literal(&mut self, start: usize) -> Result<Step, Error> {
        let mut escaped = false;
        loop {
            let Some(c) = self.bump() else {
                return Err(self.error_at(
                    start,
                    ErrorKind::UnclosedStringLiteral(self.code[start..].into()),
                ));
            };
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                break;
            }
        }
        let text = &self.code[start..self.i];
        match unquote(text) {
            Some(value) => Ok(Step::Node(Node::String {
                text: text.into(),
                pos: self.pos(start),
                value,
            })),
            None => Err(self.error_at(start, ErrorKind::InvalidStringLiteral(text.into()))),
        }
    }

    /// Fallback token: anything up to the next `)` or whitespace.
    fn symbol(&mut self, start: usize) -> Step {
        while let Some(c) = self.peek() {
            if c == ')' || c.is_whitespace() {
                break;
            }
            self.i += c.len_utf8();
        }
        Step::Node(Node::Symbol {
            name: self.code[start..self.i].into(),
            pos: self.pos(start),
        })
    }
}

/// Integer literal with the standard prefixes: `0x`/`0X` hexadecimal, a
/// leading `0` octal, decimal otherwise; an optional leading `-`.
fn parse_int_literal(text: &str) -> Option<i64> {
    let (sign, body) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };
    if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        if hex.is_empty() {
            return None;
        }
        i64::from_str_radix(&format!("{sign}{hex}"), 16).ok()
    } else if body.len() > 1 && body.starts_with('0') {
        i64::from_str_radix(&format!("{sign}{}", &body[1..]), 8).ok()
    } else {
        text.parse().ok()
    }
}

/// Decode a quoted string literal, resolving the standard backslash
/// escapes: `\n \t \r \\ \" \' \0`, `\xNN` (ASCII), and `\u{...}`.
fn unquote(text: &str) -> Option<String> {
    let inner = text.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            '0' => out.push('\0'),
            'x' => {
                let hi = chars.next()?.to_digit(16)?;
                let lo = chars.next()?.to_digit(16)?;
                let byte = hi * 16 + lo;
                if byte > 0x7f {
                    return None;
                }
                out.push(char::from_u32(byte)?);
            }
            'u' => {
                if chars.next()? != '{' {
                    return None;
                }
                let mut value: u32 = 0;
                let mut digits = 0;
                loop {
                    let c = chars.next()?;
                    if c == '}' {
                        break;
                    }
                    value = value.checked_mul(16)?.checked_add(c.to_digit(16)?)?;
                    digits += 1;
                }
                if digits == 0 || digits > 6 {
                    return None;
                }
                out.push(char::from_u32(value)?);
            }
            _ => return None,
        }
    }
    Some(out)
}
