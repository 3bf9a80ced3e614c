//! Parser for the regular-expression subset generators understand.
//!
//! Supported: literals, escapes (`\d \w \s` and their negations, escaped
//! metacharacters, `\t \n \r`, `\xHH`), `.`, character classes with ranges
//! and negation, groups (`(..)`, `(?:..)`, `(?P<name>..)`, `(?<name>..)`),
//! alternation, the quantifiers `? * + {n} {n,} {n,m}` (lazy suffix
//! accepted), and the placeholder tokens from [`Placeholder`]. `^` and `\A`
//! are accepted only at the very start of the pattern, `$` and `\z` only at
//! its very end; word boundaries are rejected.
//!
//! Negation and `.` are resolved against printable ASCII. Unbounded
//! quantifiers are capped at `min + UNBOUNDED_EXTRA` repetitions when
//! generating, but [`Node::to_regex`] keeps them unbounded.

use super::placeholder::Placeholder;

/// Extra repetitions allowed for `*`, `+` and `{n,}`.
pub const UNBOUNDED_EXTRA: u32 = 8;

/// Upper bound accepted for an explicit repetition count.
pub const MAX_REPEAT: u32 = 1000;

/// Longest output, in characters, a pattern may produce.
pub const MAX_OUTPUT_CHARS: u64 = 64 * 1024;

/// Parsed pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Matches the empty string (also used for edge anchors).
    Empty,
    Literal(char),
    /// Sorted, de-duplicated set of characters.
    Class(Vec<char>),
    Concat(Vec<Node>),
    Alternation(Vec<Node>),
    Repeat {
        node: Box<Node>,
        min: u32,
        max: u32,
        /// Written as `*`, `+` or `{n,}`; `max` is only the generation cap.
        unbounded: bool,
    },
    Placeholder(Placeholder),
}

impl Node {
    /// Length in characters of the longest string this node produces.
    pub fn max_len(&self) -> u64 {
        match self {
            Node::Empty => 0,
            Node::Literal(_) | Node::Class(_) => 1,
            Node::Concat(items) => items
                .iter()
                .fold(0u64, |acc, n| acc.saturating_add(n.max_len())),
            Node::Alternation(branches) => branches.iter().map(Node::max_len).max().unwrap_or(0),
            Node::Repeat { node, max, .. } => node.max_len().saturating_mul(u64::from(*max)),
            Node::Placeholder(p) => p
                .values()
                .iter()
                .map(|v| v.chars().count() as u64)
                .max()
                .unwrap_or(0),
        }
    }

    /// Regular expression for exactly the strings this node describes.
    ///
    /// Placeholders become alternations of their pool, classes are spelled
    /// out character by character, so the result agrees with what the
    /// generator produces.
    pub fn to_regex(&self) -> String {
        let mut out = String::new();
        self.write_regex(&mut out);
        out
    }

    fn write_regex(&self, out: &mut String) {
        match self {
            Node::Empty => {}
            Node::Literal(c) => out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
            Node::Class(set) => {
                out.push('[');
                for c in set {
                    out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4])));
                }
                out.push(']');
            }
            Node::Concat(items) => {
                for item in items {
                    item.write_regex(out);
                }
            }
            Node::Alternation(branches) => {
                out.push_str("(?:");
                for (i, branch) in branches.iter().enumerate() {
                    if i > 0 {
                        out.push('|');
                    }
                    branch.write_regex(out);
                }
                out.push(')');
            }
            Node::Repeat {
                node,
                min,
                max,
                unbounded,
            } => {
                out.push_str("(?:");
                node.write_regex(out);
                out.push(')');
                if *unbounded {
                    out.push_str(&format!("{{{},}}", min));
                } else {
                    out.push_str(&format!("{{{},{}}}", min, max));
                }
            }
            Node::Placeholder(p) => out.push_str(&p.as_regex()),
        }
    }
}

/// Parse `pattern` into a [`Node`], or describe why it is unsupported.
pub fn parse(pattern: &str) -> Result<Node, String> {
    let mut parser = Parser {
        chars: pattern.chars().collect(),
        pos: 0,
        depth: 0,
    };
    let node = parser.parse_alternation()?;
    if parser.pos < parser.chars.len() {
        return Err(format!("unbalanced ')' at position {}", parser.pos));
    }
    Ok(node)
}

fn printable_ascii() -> impl Iterator<Item = char> {
    (0x20u8..=0x7e).map(char::from)
}

fn digit_chars() -> Vec<char> {
    ('0'..='9').collect()
}

fn word_chars() -> Vec<char> {
    ('a'..='z')
        .chain('A'..='Z')
        .chain('0'..='9')
        .chain(std::iter::once('_'))
        .collect()
}

fn space_chars() -> Vec<char> {
    vec![' ', '\t']
}

fn complement(set: &[char]) -> Vec<char> {
    printable_ascii().filter(|c| !set.contains(c)).collect()
}

fn normalize_class(mut set: Vec<char>) -> Vec<char> {
    set.sort_unstable();
    set.dedup();
    set
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn next(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn expect(&mut self, want: char) -> Result<(), String> {
        match self.next() {
            Some(c) if c == want => Ok(()),
            Some(c) => Err(format!("expected '{}' but found '{}'", want, c)),
            None => Err(format!("expected '{}' but pattern ended", want)),
        }
    }

    fn parse_alternation(&mut self) -> Result<Node, String> {
        let mut branches = vec![self.parse_concat()?];
        while self.peek() == Some('|') {
            self.pos += 1;
            branches.push(self.parse_concat()?);
        }
        Ok(if branches.len() == 1 {
            branches.remove(0)
        } else {
            Node::Alternation(branches)
        })
    }

    fn parse_concat(&mut self) -> Result<Node, String> {
        let mut items = Vec::new();
        while let Some(c) = self.peek() {
            if c == '|' {
                break;
            }
            if c == ')' {
                if self.depth == 0 {
                    return Err(format!("unbalanced ')' at position {}", self.pos));
                }
                break;
            }
            let atom = self.parse_atom()?;
            let atom = self.parse_quantifiers(atom)?;
            if atom != Node::Empty {
                items.push(atom);
            }
        }
        Ok(match items.len() {
            0 => Node::Empty,
            1 => items.remove(0),
            _ => Node::Concat(items),
        })
    }

    /// Placeholder at the cursor, if the text there is `{known}`.
    fn placeholder_here(&self) -> Option<(Placeholder, usize)> {
        if self.peek() != Some('{') {
            return None;
        }
        let rest: String = self.chars[self.pos + 1..].iter().collect();
        let close = rest.find('}')?;
        let name = &rest[..close];
        Placeholder::from_name(name).map(|p| (p, name.chars().count() + 2))
    }

    fn parse_atom(&mut self) -> Result<Node, String> {
        let start = self.pos;
        let c = self.next().ok_or("unexpected end of pattern")?;
        match c {
            '(' => self.parse_group(),
            '[' => self.parse_class(),
            '.' => Ok(Node::Class(printable_ascii().collect())),
            '^' => self.start_anchor(start),
            '$' => self.end_anchor(start),
            '\\' => self.parse_escape(start),
            '{' => {
                self.pos = start;
                match self.placeholder_here() {
                    Some((placeholder, len)) => {
                        self.pos += len;
                        Ok(Node::Placeholder(placeholder))
                    }
                    None => Err(format!("repetition without a target at position {}", start)),
                }
            }
            '*' | '+' | '?' => Err(format!(
                "repetition operator '{}' without a target at position {}",
                c, start
            )),
            other => Ok(Node::Literal(other)),
        }
    }

    /// `^` or `\A`, valid only as the first token of the pattern.
    fn start_anchor(&self, start: usize) -> Result<Node, String> {
        if start == 0 && self.depth == 0 {
            Ok(Node::Empty)
        } else {
            Err(format!(
                "start anchor at position {} is only supported at the start of the pattern",
                start
            ))
        }
    }

    /// `$` or `\z`, valid only as the last token of the pattern.
    fn end_anchor(&self, start: usize) -> Result<Node, String> {
        if self.pos == self.chars.len() && self.depth == 0 {
            Ok(Node::Empty)
        } else {
            Err(format!(
                "end anchor at position {} is only supported at the end of the pattern",
                start
            ))
        }
    }

    fn parse_group(&mut self) -> Result<Node, String> {
        if self.peek() == Some('?') {
            match (self.peek_at(1), self.peek_at(2)) {
                (Some(':'), _) => self.pos += 2,
                (Some('P'), Some('<')) => {
                    self.pos += 3;
                    self.skip_group_name()?;
                }
                (Some('<'), Some(c)) if c != '=' && c != '!' => {
                    self.pos += 2;
                    self.skip_group_name()?;
                }
                _ => return Err("group flags and look-around are not supported".to_string()),
            }
        }
        self.depth += 1;
        let inner = self.parse_alternation()?;
        self.depth -= 1;
        self.expect(')')?;
        Ok(inner)
    }

    fn skip_group_name(&mut self) -> Result<(), String> {
        loop {
            match self.next() {
                Some('>') => return Ok(()),
                Some(c) if c.is_alphanumeric() || c == '_' => {}
                Some(c) => return Err(format!("invalid character '{}' in group name", c)),
                None => return Err("unterminated group name".to_string()),
            }
        }
    }

    fn parse_escape(&mut self, start: usize) -> Result<Node, String> {
        let c = self.next().ok_or("pattern ends with a dangling backslash")?;
        Ok(match c {
            'd' => Node::Class(digit_chars()),
            'D' => Node::Class(complement(&digit_chars())),
            'w' => Node::Class(normalize_class(word_chars())),
            'W' => Node::Class(complement(&word_chars())),
            's' => Node::Class(normalize_class(space_chars())),
            'S' => Node::Class(complement(&space_chars())),
            'A' => self.start_anchor(start)?,
            'z' => self.end_anchor(start)?,
            'b' | 'B' => {
                return Err(format!(
                    "word boundary '\\{}' at position {} is not supported",
                    c, start
                ))
            }
            other => Node::Literal(self.escaped_literal(other)?),
        })
    }

    /// Literal character for an escape that is not a class shorthand.
    fn escaped_literal(&mut self, c: char) -> Result<char, String> {
        match c {
            't' => Ok('\t'),
            'n' => Ok('\n'),
            'r' => Ok('\r'),
            'x' => {
                let hi = self.next().ok_or("truncated \\x escape")?;
                let lo = self.next().ok_or("truncated \\x escape")?;
                let code = u32::from_str_radix(&format!("{}{}", hi, lo), 16)
                    .map_err(|_| format!("invalid \\x escape '{}{}'", hi, lo))?;
                char::from_u32(code).ok_or_else(|| format!("invalid \\x escape '{}{}'", hi, lo))
            }
            c if c.is_ascii_alphanumeric() => Err(format!("unsupported escape '\\{}'", c)),
            c => Ok(c),
        }
    }

    fn parse_class(&mut self) -> Result<Node, String> {
        let mut negated = false;
        if self.peek() == Some('^') {
            negated = true;
            self.pos += 1;
        }

        let mut set = Vec::new();
        let mut first = true;
        loop {
            let c = self.next().ok_or("unterminated character class")?;
            match c {
                ']' if !first => break,
                '[' => return Err("nested character classes are not supported".to_string()),
                '\\' => {
                    let e = self.next().ok_or("unterminated character class")?;
                    match e {
                        'd' => set.extend(digit_chars()),
                        'w' => set.extend(word_chars()),
                        's' => set.extend(space_chars()),
                        'D' | 'W' | 'S' => {
                            return Err(format!("'\\{}' inside a class is not supported", e))
                        }
                        other => {
                            let lit = self.escaped_literal(other)?;
                            self.push_class_item(&mut set, lit)?;
                        }
                    }
                }
                other => self.push_class_item(&mut set, other)?,
            }
            first = false;
        }

        let set = if negated {
            complement(&set)
        } else {
            normalize_class(set)
        };
        if set.is_empty() {
            return Err("character class matches nothing".to_string());
        }
        Ok(Node::Class(set))
    }

    /// Push `start`, or the range `start-end` when a dash follows.
    fn push_class_item(&mut self, set: &mut Vec<char>, start: char) -> Result<(), String> {
        if self.peek() == Some('-') && self.peek_at(1).is_some_and(|c| c != ']') {
            self.pos += 1;
            let mut end = self.next().ok_or("unterminated character class")?;
            if end == '\\' {
                let e = self.next().ok_or("unterminated character class")?;
                end = self.escaped_literal(e)?;
            }
            if end < start {
                return Err(format!("invalid class range '{}-{}'", start, end));
            }
            set.extend(start..=end);
        } else {
            set.push(start);
        }
        Ok(())
    }

    fn parse_quantifiers(&mut self, mut atom: Node) -> Result<Node, String> {
        loop {
            let (min, max, unbounded) = match self.peek() {
                Some('?') => {
                    self.pos += 1;
                    (0, 1, false)
                }
                Some('*') => {
                    self.pos += 1;
                    (0, UNBOUNDED_EXTRA, true)
                }
                Some('+') => {
                    self.pos += 1;
                    (1, 1 + UNBOUNDED_EXTRA, true)
                }
                Some('{') if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                    self.parse_counted()?
                }
                _ => return Ok(atom),
            };
            // Lazy suffix changes matching, not the language.
            if self.peek() == Some('?') {
                self.pos += 1;
            }
            atom = Node::Repeat {
                node: Box::new(atom),
                min,
                max,
                unbounded,
            };
        }
    }

    fn parse_counted(&mut self) -> Result<(u32, u32, bool), String> {
        self.expect('{')?;
        let min = self.parse_number()?;
        let (max, unbounded) = match self.next() {
            Some('}') => (min, false),
            Some(',') => {
                if self.peek() == Some('}') {
                    self.pos += 1;
                    (min.saturating_add(UNBOUNDED_EXTRA), true)
                } else {
                    let max = self.parse_number()?;
                    self.expect('}')?;
                    (max, false)
                }
            }
            _ => return Err("malformed repetition count".to_string()),
        };
        if max < min {
            return Err(format!("invalid repetition {{{},{}}}", min, max));
        }
        if max > MAX_REPEAT {
            return Err(format!("repetition count {} exceeds {}", max, MAX_REPEAT));
        }
        Ok((min, max, unbounded))
    }

    fn parse_number(&mut self) -> Result<u32, String> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        digits
            .parse()
            .map_err(|_| format!("invalid repetition count '{}'", digits))
    }
}
