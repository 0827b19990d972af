//! Template parsing and rendering.
//!
//! Parsing is a single forward scan. A `@{` that does not form a valid
//! reference is copied through as literal text, exactly like any other
//! character, so every input string is a valid template.

use crate::vars::VariableSource;

/// Separator used by `@{name}`.
pub const DEFAULT_SEPARATOR: &str = ", ";

/// How a variable reference reads its values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// All values joined with `separator`.
    Join { separator: String },
    /// A single zero-based value. Indices too large for `usize` are kept
    /// as `usize::MAX`, which is always out of range.
    Index(usize),
}

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Variable { name: String, access: Access },
}

/// A parsed template, reusable across many variable tables.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Self {
        Parser::new(source).run()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether the template references any variable at all.
    pub fn has_variables(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Variable { .. }))
    }

    pub fn render<V: VariableSource + ?Sized>(&self, vars: &V) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Variable { name, access } => {
                    let Some(values) = vars.values(name) else {
                        continue;
                    };
                    match access {
                        Access::Join { separator } => out.push_str(&values.join(separator)),
                        Access::Index(idx) => {
                            if let Some(value) = values.get(*idx) {
                                out.push_str(value);
                            }
                        }
                    }
                }
            }
        }
        out
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    /// Byte offset of the last `}` in the source. A separator scan that
    /// starts past it can fail without looking, which keeps unterminated
    /// `@{a,@{a,...` inputs linear.
    last_close: Option<usize>,
    literal: String,
    segments: Vec<Segment>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            last_close: src.rfind('}'),
            literal: String::new(),
            segments: Vec::new(),
        }
    }

    fn run(mut self) -> Template {
        while let Some(c) = self.peek() {
            match c {
                '@' => match self.reference() {
                    Some((segment, end)) => {
                        self.flush_literal();
                        self.segments.push(segment);
                        self.pos = end;
                    }
                    None => self.take_literal(),
                },
                '\\' => {
                    self.pos += 1;
                    // A trailing backslash escapes nothing and stays literal.
                    match self.peek() {
                        Some(_) => self.take_literal(),
                        None => self.literal.push('\\'),
                    }
                }
                _ => self.take_literal(),
            }
        }
        self.flush_literal();
        Template {
            segments: self.segments,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn take_literal(&mut self) {
        if let Some(c) = self.peek() {
            self.literal.push(c);
            self.pos += c.len_utf8();
        }
    }

    fn flush_literal(&mut self) {
        if !self.literal.is_empty() {
            self.segments
                .push(Segment::Literal(std::mem::take(&mut self.literal)));
        }
    }

    /// Try to read a reference starting at the current `@`. Returns the
    /// segment and the byte offset just past its closing `}`.
    fn reference(&self) -> Option<(Segment, usize)> {
        let rest = self.src[self.pos..].strip_prefix("@{")?;
        let start = self.pos + 2;

        let name_len = rest
            .char_indices()
            .find(|&(_, c)| !is_name_char(c))
            .map_or(rest.len(), |(i, _)| i);
        if name_len == 0 {
            return None;
        }
        let name = &rest[..name_len];
        let after_name = start + name_len;
        let mut tail = self.src[after_name..].chars();

        let (access, end) = match tail.next()? {
            '}' => (
                Access::Join {
                    separator: DEFAULT_SEPARATOR.to_string(),
                },
                after_name + 1,
            ),
            ',' => {
                let sep_start = after_name + 1;
                if self.last_close.map_or(true, |close| close < sep_start) {
                    return None;
                }
                let sep_len = self.src[sep_start..].find('}')?;
                let separator = self.src[sep_start..sep_start + sep_len].to_string();
                (Access::Join { separator }, sep_start + sep_len + 1)
            }
            ':' => {
                let digits_start = after_name + 1;
                let digits = &self.src[digits_start..];
                let digits_len = digits
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(digits.len());
                if digits_len == 0 || !digits[digits_len..].starts_with('}') {
                    return None;
                }
                let idx = digits[..digits_len].parse::<usize>().unwrap_or(usize::MAX);
                (Access::Index(idx), digits_start + digits_len + 1)
            }
            _ => return None,
        };

        Some((
            Segment::Variable {
                name: name.to_string(),
                access,
            },
            end,
        ))
    }
}
