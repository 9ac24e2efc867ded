//! Section and object location inside manifest text.
//!
//! The manifest is never parsed into a full tree. Instead a small lexer walks
//! the text, and the functions here hand back byte offsets for sections,
//! objects and the lists inside them. Callers splice new text at those offsets
//! and re-run the lookup afterwards, since every insertion shifts what follows.

use std::borrow::Cow;
use std::ops::Range;

/// Lexical category of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Unquoted identifier or value (`PBXGroup`, `A1B2...`, `Data/Models`)
    Word,
    /// Double-quoted string, including the quotes
    Quoted,
    /// `/* ... */` or `// ...` comment
    Comment,
    /// One of `{ } ( ) = ; ,`
    Punct(char),
}

/// A token and the byte range it covers in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// Token category
    pub kind: TokenKind,
    /// Byte offset of the first character
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
}

/// Lexer over a byte range of manifest text.
///
/// Every delimiter is ASCII, so offsets always land on UTF-8 boundaries.
pub struct Lexer<'a> {
    bytes: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer over `range` of `text`.
    #[must_use]
    pub fn new(text: &'a str, range: Range<usize>) -> Self {
        let end = range.end.min(text.len());
        Self {
            bytes: text.as_bytes(),
            pos: range.start.min(end),
            end,
        }
    }

    /// Moves the cursor to `pos`.
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.end);
    }

    /// Next token that is not a comment.
    pub fn next_significant(&mut self) -> Option<Token> {
        self.by_ref().find(|t| t.kind != TokenKind::Comment)
    }

    fn peek_byte(&self, at: usize) -> Option<u8> {
        (at < self.end).then(|| self.bytes[at])
    }

    fn is_word_end(&self, at: usize) -> bool {
        match self.bytes[at] {
            b if b.is_ascii_whitespace() => true,
            b'{' | b'}' | b'(' | b')' | b'=' | b';' | b',' | b'"' => true,
            b'/' => self.peek_byte(at + 1) == Some(b'*'),
            _ => false,
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        while self.pos < self.end && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        if self.pos >= self.end {
            return None;
        }

        let start = self.pos;
        let (kind, end) = match self.bytes[start] {
            b'/' if self.peek_byte(start + 1) == Some(b'*') => {
                let mut i = start + 2;
                while i < self.end && !(self.bytes[i] == b'*' && self.peek_byte(i + 1) == Some(b'/'))
                {
                    i += 1;
                }
                (TokenKind::Comment, (i + 2).min(self.end))
            }
            b'/' if self.peek_byte(start + 1) == Some(b'/') => {
                let mut i = start + 2;
                while i < self.end && self.bytes[i] != b'\n' {
                    i += 1;
                }
                (TokenKind::Comment, i)
            }
            b'"' => {
                let mut i = start + 1;
                while i < self.end {
                    match self.bytes[i] {
                        b'\\' => i += 2,
                        b'"' => {
                            i += 1;
                            break;
                        }
                        _ => i += 1,
                    }
                }
                (TokenKind::Quoted, i.min(self.end))
            }
            b @ (b'{' | b'}' | b'(' | b')' | b'=' | b';' | b',') => {
                (TokenKind::Punct(b as char), start + 1)
            }
            _ => {
                let mut i = start + 1;
                while i < self.end && !self.is_word_end(i) {
                    i += 1;
                }
                (TokenKind::Word, i)
            }
        };

        self.pos = end;
        Some(Token { kind, start, end })
    }
}

/// Begin marker for a section, e.g. `/* Begin PBXGroup section */`.
#[must_use]
pub fn section_begin_marker(section: &str) -> String {
    format!("/* Begin {section} section */")
}

/// End marker for a section, e.g. `/* End PBXGroup section */`.
#[must_use]
pub fn section_end_marker(section: &str) -> String {
    format!("/* End {section} section */")
}

/// Offset at which a new object can be inserted into `section`: the start of
/// the line following the Begin marker.
#[must_use]
pub fn find_section(text: &str, section: &str) -> Option<usize> {
    let marker = section_begin_marker(section);
    let idx = text.find(&marker)?;
    let after = idx + marker.len();
    let line_end = text[after..].find('\n').map_or(text.len(), |i| after + i + 1);
    Some(line_end)
}

/// Byte range of the section body, between its Begin and End markers.
#[must_use]
pub fn section_range(text: &str, section: &str) -> Option<Range<usize>> {
    let start = find_section(text, section)?;
    let end_marker = section_end_marker(section);
    let end = text[start..].find(&end_marker).map(|i| start + i)?;
    Some(start..end)
}

/// Offset of the `}` that closes the `{` at `open`.
///
/// Depth counting skips braces inside quoted strings and comments.
#[must_use]
pub fn find_matching_brace(text: &str, open: usize) -> Option<usize> {
    if text.as_bytes().get(open) != Some(&b'{') {
        return None;
    }
    let mut depth = 0usize;
    for token in Lexer::new(text, open..text.len()) {
        match token.kind {
            TokenKind::Punct('{') => depth += 1,
            TokenKind::Punct('}') => {
                depth -= 1;
                if depth == 0 {
                    return Some(token.start);
                }
            }
            _ => {}
        }
    }
    None
}

/// A `ID /* comment */ = { ... };` object found in a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSpan {
    /// Object identifier
    pub id: String,
    /// Text of the comment following the identifier, if any
    pub comment: Option<String>,
    /// Offset of the identifier
    pub start: usize,
    /// Offset of the opening brace
    pub open: usize,
    /// Offset of the closing brace
    pub close: usize,
    /// Offset just past the trailing `;`
    pub end: usize,
}

impl ObjectSpan {
    /// Parses the `key = value;` pairs of the object body.
    #[must_use]
    pub fn fields(&self, text: &str) -> Fields {
        parse_fields(text, self.open + 1..self.close)
    }
}

/// Lists all objects in `range` of `text`.
#[must_use]
pub fn objects(text: &str, range: Range<usize>) -> Vec<ObjectSpan> {
    let mut found = Vec::new();
    let mut lexer = Lexer::new(text, range);

    while let Some(token) = lexer.next_significant() {
        if token.kind != TokenKind::Word {
            continue;
        }

        let mut comment = None;
        let mut next = lexer.next();
        while let Some(t) = next
            && t.kind == TokenKind::Comment
        {
            comment = Some(comment_text(&text[t.start..t.end]).to_string());
            next = lexer.next();
        }
        if !matches!(next, Some(t) if t.kind == TokenKind::Punct('=')) {
            continue;
        }
        let Some(open) = lexer.next_significant() else {
            break;
        };
        if open.kind != TokenKind::Punct('{') {
            continue;
        }
        let Some(close) = find_matching_brace(text, open.start) else {
            break;
        };

        lexer.seek(close + 1);
        let mut end = close + 1;
        if let Some(t) = lexer.next_significant() {
            if t.kind == TokenKind::Punct(';') {
                end = t.end;
            } else {
                lexer.seek(t.start);
            }
        }

        found.push(ObjectSpan {
            id: text[token.start..token.end].to_string(),
            comment,
            start: token.start,
            open: open.start,
            close,
            end,
        });
    }

    found
}

/// Lists all objects of `section`; empty when the section is absent.
#[must_use]
pub fn section_objects(text: &str, section: &str) -> Vec<ObjectSpan> {
    section_range(text, section).map_or_else(Vec::new, |range| objects(text, range))
}

/// Finds the object with identifier `id` in `section`.
#[must_use]
pub fn find_object(text: &str, section: &str, id: &str) -> Option<ObjectSpan> {
    section_objects(text, section)
        .into_iter()
        .find(|o| o.id == id)
}

/// A parenthesised list value and its location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListValue {
    /// Unquoted list items, comments stripped
    pub items: Vec<String>,
    /// Offset of `(`
    pub open: usize,
    /// Offset of `)`
    pub close: usize,
}

/// Value of an object field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Bare or quoted scalar, unquoted
    Scalar(String),
    /// `( a, b, )`
    List(ListValue),
    /// Nested `{ ... }` dictionary, as the range between its braces
    Object(Range<usize>),
}

/// Ordered `key = value;` pairs of one object body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields(pub Vec<(String, Value)>);

impl Fields {
    /// Scalar value for `key`.
    #[must_use]
    pub fn scalar(&self, key: &str) -> Option<&str> {
        self.0.iter().find_map(|(k, v)| match v {
            Value::Scalar(s) if k == key => Some(s.as_str()),
            _ => None,
        })
    }

    /// List value for `key`.
    #[must_use]
    pub fn list(&self, key: &str) -> Option<&ListValue> {
        self.0.iter().find_map(|(k, v)| match v {
            Value::List(l) if k == key => Some(l),
            _ => None,
        })
    }
}

fn parse_fields(text: &str, range: Range<usize>) -> Fields {
    let mut fields = Vec::new();
    let mut lexer = Lexer::new(text, range);

    while let Some(key) = lexer.next_significant() {
        if !matches!(key.kind, TokenKind::Word | TokenKind::Quoted) {
            continue;
        }
        if !matches!(lexer.next_significant(), Some(t) if t.kind == TokenKind::Punct('=')) {
            continue;
        }
        let Some(value) = lexer.next_significant() else {
            break;
        };

        let parsed = match value.kind {
            TokenKind::Word | TokenKind::Quoted => {
                Value::Scalar(unquote(&text[value.start..value.end]).into_owned())
            }
            TokenKind::Punct('(') => {
                let mut items = Vec::new();
                let mut close = None;
                for t in lexer.by_ref() {
                    match t.kind {
                        TokenKind::Word | TokenKind::Quoted => {
                            items.push(unquote(&text[t.start..t.end]).into_owned());
                        }
                        TokenKind::Punct(')') => {
                            close = Some(t.start);
                            break;
                        }
                        _ => {}
                    }
                }
                let Some(close) = close else {
                    break;
                };
                Value::List(ListValue {
                    items,
                    open: value.start,
                    close,
                })
            }
            TokenKind::Punct('{') => {
                let Some(close) = find_matching_brace(text, value.start) else {
                    break;
                };
                lexer.seek(close + 1);
                Value::Object(value.start + 1..close)
            }
            _ => continue,
        };

        let key = unquote(&text[key.start..key.end]).into_owned();
        fields.push((key, parsed));
    }

    Fields(fields)
}

/// Inner text of a `/* ... */` comment, trimmed.
#[must_use]
pub fn comment_text(raw: &str) -> &str {
    raw.strip_prefix("/*")
        .and_then(|s| s.strip_suffix("*/"))
        .or_else(|| raw.strip_prefix("//"))
        .unwrap_or(raw)
        .trim()
}

/// Removes surrounding quotes and resolves escapes; bare words are returned as is.
#[must_use]
pub fn unquote(raw: &str) -> Cow<'_, str> {
    let Some(inner) = raw
        .strip_prefix('"')
        .map(|s| s.strip_suffix('"').unwrap_or(s))
    else {
        return Cow::Borrowed(raw);
    };
    if !inner.contains('\\') {
        return Cow::Borrowed(inner);
    }

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    Cow::Owned(out)
}

/// Writes `value` bare when it is a plain token, quoted and escaped otherwise.
#[must_use]
pub fn quote_if_needed(value: &str) -> Cow<'_, str> {
    let plain = !value.is_empty()
        && !value.contains("//")
        && !value.contains("___")
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '/' | ':' | '.' | '-'));
    if plain {
        return Cow::Borrowed(value);
    }

    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    Cow::Owned(out)
}

/// Makes `value` safe to place inside a `/* ... */` comment.
#[must_use]
pub fn comment_safe(value: &str) -> Cow<'_, str> {
    if value.contains("*/") {
        Cow::Owned(value.replace("*/", "* /"))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GROUPS: &str = "\
/* Begin PBXGroup section */
\t\tAAAA /* Views */ = {
\t\t\tisa = PBXGroup;
\t\t\tchildren = (
\t\t\t\tBBBB /* ContentView.swift */,
\t\t\t\t\"CC CC\",
\t\t\t);
\t\t\tpath = Views;
\t\t\tsourceTree = \"<group>\";
\t\t};
\t\tDDDD = {isa = PBXGroup; children = ( ); name = \"My {odd} Group\"; sourceTree = \"<group>\"; };
/* End PBXGroup section */
";

    #[test]
    fn test_find_section_points_past_marker_line() {
        let offset = find_section(GROUPS, "PBXGroup").unwrap();
        assert!(GROUPS[offset..].starts_with("\t\tAAAA"));
        assert!(find_section(GROUPS, "PBXBuildFile").is_none());
    }

    #[test]
    fn test_section_range_stops_at_end_marker() {
        let range = section_range(GROUPS, "PBXGroup").unwrap();
        assert!(GROUPS[range.end..].starts_with("/* End PBXGroup section */"));
    }

    #[test]
    fn test_find_matching_brace_nested() {
        let text = "x = { a = { b = 1; }; c = 2; };";
        let open = text.find('{').unwrap();
        let close = find_matching_brace(text, open).unwrap();
        assert_eq!(close, text.rfind('}').unwrap());
    }

    #[test]
    fn test_find_matching_brace_ignores_quoted_braces() {
        let text = "{ name = \"a } b\"; }";
        assert_eq!(find_matching_brace(text, 0), Some(text.len() - 1));
    }

    #[test]
    fn test_find_matching_brace_unbalanced() {
        assert_eq!(find_matching_brace("{ a = { b; }", 0), None);
        assert_eq!(find_matching_brace("no brace", 0), None);
    }

    #[test]
    fn test_objects_and_fields() {
        let objs = section_objects(GROUPS, "PBXGroup");
        assert_eq!(objs.len(), 2);

        let views = &objs[0];
        assert_eq!(views.id, "AAAA");
        assert_eq!(views.comment.as_deref(), Some("Views"));
        let fields = views.fields(GROUPS);
        assert_eq!(fields.scalar("isa"), Some("PBXGroup"));
        assert_eq!(fields.scalar("path"), Some("Views"));
        assert_eq!(fields.scalar("sourceTree"), Some("<group>"));
        let children = fields.list("children").unwrap();
        assert_eq!(children.items, vec!["BBBB", "CC CC"]);
        assert_eq!(&GROUPS[children.open..=children.open], "(");
        assert_eq!(&GROUPS[children.close..=children.close], ")");

        let odd = &objs[1];
        assert_eq!(odd.comment, None);
        let fields = odd.fields(GROUPS);
        assert_eq!(fields.scalar("name"), Some("My {odd} Group"));
        assert!(fields.list("children").unwrap().items.is_empty());
    }

    #[test]
    fn test_find_object_by_id() {
        let obj = find_object(GROUPS, "PBXGroup", "DDDD").unwrap();
        assert!(GROUPS[obj.start..obj.end].ends_with("};"));
        assert!(find_object(GROUPS, "PBXGroup", "EEEE").is_none());
    }

    #[test]
    fn test_unquote_and_quote() {
        assert_eq!(unquote("Views"), "Views");
        assert_eq!(unquote("\"<group>\""), "<group>");
        assert_eq!(unquote("\"a \\\"b\\\"\""), "a \"b\"");

        assert_eq!(quote_if_needed("Foo.swift"), "Foo.swift");
        assert_eq!(quote_if_needed("Data/Models"), "Data/Models");
        assert_eq!(quote_if_needed("My File.swift"), "\"My File.swift\"");
        assert_eq!(quote_if_needed("Foo+Bar.swift"), "\"Foo+Bar.swift\"");
        assert_eq!(quote_if_needed(""), "\"\"");
    }

    #[test]
    fn test_comment_text() {
        assert_eq!(comment_text("/* Views */"), "Views");
        assert_eq!(comment_text("// note"), "note");
        assert_eq!(comment_safe("a*/b"), "a* /b");
    }
}
