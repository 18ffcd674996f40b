//! Block reader for the marked YAML subset.
//!
//! Line-oriented: the reader walks raw lines, tracking indentation, and
//! builds the spanned node tree directly. Errors are collected, never
//! thrown; the reader recovers by skipping the offending line.

use crate::chars;
use crate::diagnostics::{codes, Diagnostic};
use crate::parse_util::{FileId, SourceSpan};

use super::ast::{ScalarStyle, YamlKey, YamlNode, YamlValue};

/// Reader output: a best-effort tree plus the errors hit along the way.
#[derive(Debug)]
pub struct YamlParseResult {
    pub root: Option<YamlNode>,
    pub errors: Vec<Diagnostic>,
}

/// Parse one document. The root must be a mapping.
pub fn parse_document(source: &str, file: FileId) -> YamlParseResult {
    let mut reader = Reader::new(source, file);
    reader.skip_preamble();
    let root = if reader.peek_content().is_some() {
        let node = reader.parse_block(0);
        match node.value {
            YamlValue::Mapping(_) => Some(node),
            _ => {
                reader.errors.push(
                    Diagnostic::error(
                        codes::PARSE_ROOT_NOT_MAPPING,
                        "document root must be a mapping",
                    )
                    .with_span(Some(node.span)),
                );
                None
            }
        }
    } else {
        reader.errors.push(
            Diagnostic::error(codes::PARSE_ROOT_NOT_MAPPING, "document is empty")
                .with_span(Some(SourceSpan::new(file, 1, 1, 0))),
        );
        None
    };
    YamlParseResult { root, errors: reader.errors }
}

struct Reader<'a> {
    file: FileId,
    lines: Vec<&'a str>,
    pos: usize,
    errors: Vec<Diagnostic>,
    /// Lines already reported for tab indentation; `content_line` may scan
    /// the same line more than once.
    tab_reported: std::collections::HashSet<u32>,
}

/// A content line: indentation plus comment-stripped text.
struct ContentLine {
    indent: usize,
    text: String,
    line_no: u32,
}

impl<'a> Reader<'a> {
    fn new(source: &'a str, file: FileId) -> Self {
        Reader {
            file,
            lines: source.lines().collect(),
            pos: 0,
            errors: Vec::new(),
            tab_reported: std::collections::HashSet::new(),
        }
    }

    fn span(&self, line_no: u32, col: usize, length: usize) -> SourceSpan {
        SourceSpan::new(self.file, line_no, col as u32, length as u32)
    }

    fn error(&mut self, code: crate::diagnostics::DiagnosticCode, message: String, span: SourceSpan) {
        self.errors.push(Diagnostic::error(code, message).with_span(Some(span)));
    }

    /// Skip `---` separators and `%` directives at the top of the document.
    fn skip_preamble(&mut self) {
        while let Some(line) = self.content_line(self.pos) {
            if line.indent == 0 && (line.text == "---" || line.text.starts_with('%')) {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// The comment-stripped view of line `idx`, or `None` for blank and
    /// comment-only lines (and past EOF).
    fn content_line(&mut self, idx: usize) -> Option<ContentLine> {
        let raw = *self.lines.get(idx)?;
        let mut indent = 0usize;
        let mut chars_iter = raw.char_indices();
        let mut body_start = raw.len();
        for (i, ch) in &mut chars_iter {
            if ch == chars::SPACE {
                indent += 1;
            } else if ch == chars::TAB {
                if self.tab_reported.insert(idx as u32 + 1) {
                    let span = self.span(idx as u32 + 1, i + 1, 1);
                    self.error(
                        codes::PARSE_TAB_INDENT,
                        "tab character in indentation".to_string(),
                        span,
                    );
                }
                indent += 1;
            } else {
                body_start = i;
                break;
            }
        }
        let body = strip_comment(&raw[body_start..]).trim_end().to_string();
        if body.is_empty() {
            return None;
        }
        Some(ContentLine { indent, text: body, line_no: idx as u32 + 1 })
    }

    /// Advance past blank/comment lines and return the next content line
    /// without consuming it.
    fn peek_content(&mut self) -> Option<ContentLine> {
        while self.pos < self.lines.len() {
            match self.content_line(self.pos) {
                Some(line) => return Some(line),
                None => self.pos += 1,
            }
        }
        None
    }

    /// Parse the block starting at the current line, which must have
    /// indentation of at least `min_indent`.
    fn parse_block(&mut self, min_indent: usize) -> YamlNode {
        let line = match self.peek_content() {
            Some(line) if line.indent >= min_indent => line,
            _ => {
                let line_no = self.pos as u32 + 1;
                return YamlNode::new(YamlValue::Null, self.span(line_no, 1, 0));
            }
        };
        if line.text == "-" || line.text.starts_with("- ") {
            self.parse_sequence(line.indent)
        } else {
            self.parse_mapping(line.indent)
        }
    }

    fn parse_mapping(&mut self, indent: usize) -> YamlNode {
        let mut entries: Vec<(YamlKey, YamlNode)> = Vec::new();
        let first = self.peek_content().expect("mapping parse at EOF");
        let map_span = self.span(first.line_no, indent + 1, first.text.len());

        while let Some(line) = self.peek_content() {
            if line.indent < indent {
                break;
            }
            if line.indent > indent {
                let span = self.span(line.line_no, line.indent + 1, line.text.len());
                self.error(
                    codes::PARSE_SYNTAX,
                    "unexpected indentation".to_string(),
                    span,
                );
                self.pos += 1;
                continue;
            }
            self.pos += 1;
            let Some((key_text, key_len, rest_col, rest)) = split_key(&line.text) else {
                let span = self.span(line.line_no, indent + 1, line.text.len());
                self.error(
                    codes::PARSE_SYNTAX,
                    format!("expected `key: value`, found `{}`", line.text),
                    span,
                );
                continue;
            };
            let key = YamlKey {
                text: key_text,
                span: self.span(line.line_no, indent + 1, key_len),
            };
            let trimmed = rest.trim_start();
            let value_col = indent + rest_col + (rest.len() - trimmed.len()) + 1;
            let value = self.parse_value(trimmed.trim_end(), line.line_no, value_col, indent);
            // Duplicate keys are kept; the schema layer decides whether they
            // are a YAML error or a duplicate-symbol error.
            entries.push((key, value));
        }
        YamlNode::new(YamlValue::Mapping(entries), map_span)
    }

    fn parse_sequence(&mut self, indent: usize) -> YamlNode {
        let mut items: Vec<YamlNode> = Vec::new();
        let first = self.peek_content().expect("sequence parse at EOF");
        let seq_span = self.span(first.line_no, indent + 1, first.text.len());

        while let Some(line) = self.peek_content() {
            if line.indent != indent || !(line.text == "-" || line.text.starts_with("- ")) {
                break;
            }
            self.pos += 1;
            let item_text = line.text[1..].trim_start();
            let item_col = indent + (line.text.len() - item_text.len()) + 1;
            if item_text.is_empty() {
                // Nested block on the following lines.
                let nested = match self.peek_content() {
                    Some(next) if next.indent > indent => self.parse_block(indent + 1),
                    _ => YamlNode::new(YamlValue::Null, self.span(line.line_no, item_col, 0)),
                };
                items.push(nested);
            } else if looks_like_mapping_entry(item_text) {
                let span = self.span(line.line_no, item_col, item_text.len());
                self.error(
                    codes::PARSE_SYNTAX,
                    "compact mapping in sequence item is not supported; indent it on the next line"
                        .to_string(),
                    span,
                );
            } else {
                items.push(self.parse_flow(item_text, line.line_no, item_col));
            }
        }
        YamlNode::new(YamlValue::Sequence(items), seq_span)
    }

    /// Parse the value part of a `key: value` line. `rest` is already
    /// trimmed; an empty rest means a nested block or null.
    fn parse_value(&mut self, rest: &str, line_no: u32, col: usize, key_indent: usize) -> YamlNode {
        if rest.is_empty() {
            return match self.peek_content() {
                Some(next) if next.indent > key_indent => self.parse_block(key_indent + 1),
                _ => YamlNode::new(YamlValue::Null, self.span(line_no, col, 0)),
            };
        }
        if let Some(folded) = block_scalar_header(rest) {
            return self.parse_block_scalar(folded, line_no, col, key_indent);
        }
        self.parse_flow(rest, line_no, col)
    }

    /// Literal (`|`) and folded (`>`) block scalars with clip/strip chomping.
    fn parse_block_scalar(
        &mut self,
        header: BlockScalarHeader,
        line_no: u32,
        col: usize,
        key_indent: usize,
    ) -> YamlNode {
        let mut body: Vec<String> = Vec::new();
        let mut block_indent: Option<usize> = None;
        while self.pos < self.lines.len() {
            let raw = self.lines[self.pos];
            let trimmed = raw.trim_end();
            if trimmed.trim().is_empty() {
                // Blank lines belong to the scalar as long as it continues.
                body.push(String::new());
                self.pos += 1;
                continue;
            }
            let indent = trimmed.len() - trimmed.trim_start().len();
            if indent <= key_indent {
                break;
            }
            let effective = *block_indent.get_or_insert(indent);
            let cut = effective.min(indent);
            body.push(trimmed[cut..].to_string());
            self.pos += 1;
        }
        // Trailing blank lines never survive chomping.
        while body.last().is_some_and(|l| l.is_empty()) {
            body.pop();
        }
        let mut text = if header.folded {
            body.join(" ")
        } else {
            body.join("\n")
        };
        if !header.strip && !text.is_empty() {
            text.push('\n');
        }
        YamlNode::new(
            YamlValue::Scalar(text, ScalarStyle::Block),
            self.span(line_no, col, 1),
        )
    }

    /// Flow values: quoted scalars, flow sequences, flow mappings, plain
    /// scalars.
    fn parse_flow(&mut self, text: &str, line_no: u32, col: usize) -> YamlNode {
        let mut cursor = FlowCursor { text, pos: 0, line_no, col, file: self.file };
        let (node, errors) = cursor.parse_node();
        self.errors.extend(errors);
        node
    }
}

struct BlockScalarHeader {
    folded: bool,
    strip: bool,
}

/// Recognize `|`, `|-`, `>`, `>-` (explicit indent digits tolerated).
fn block_scalar_header(rest: &str) -> Option<BlockScalarHeader> {
    let mut it = rest.chars();
    let folded = match it.next()? {
        '|' => false,
        '>' => true,
        _ => return None,
    };
    let mut strip = false;
    for ch in it {
        match ch {
            '-' => strip = true,
            '+' | '0'..='9' => {}
            _ => return None,
        }
    }
    Some(BlockScalarHeader { folded, strip })
}

/// Strip a trailing comment outside quotes. `#` starts a comment only at the
/// start of the text or after whitespace.
fn strip_comment(text: &str) -> &str {
    let mut in_single = false;
    let mut in_double = false;
    let mut prev: Option<char> = None;
    for (i, ch) in text.char_indices() {
        match ch {
            chars::SQ if !in_double => in_single = !in_single,
            chars::DQ if !in_single => in_double = !in_double,
            chars::HASH if !in_single && !in_double => {
                if prev.is_none() || prev.is_some_and(|p| p == chars::SPACE || p == chars::TAB) {
                    return &text[..i];
                }
            }
            _ => {}
        }
        prev = Some(ch);
    }
    text
}

/// Split `key: value` at the separating colon. The colon separates only when
/// followed by a space or end of line, so pattern expressions like
/// `$BUS<25:1>` stay intact. Returns (key, key length, rest column offset,
/// rest).
fn split_key(text: &str) -> Option<(String, usize, usize, &str)> {
    let bytes = text.as_bytes();
    if bytes[0] == b'"' || bytes[0] == b'\'' {
        let quote = bytes[0] as char;
        let mut end = None;
        let mut i = 1;
        let b = text.char_indices().collect::<Vec<_>>();
        while i < b.len() {
            if b[i].1 == quote {
                end = Some(b[i].0);
                break;
            }
            i += 1;
        }
        let end = end?;
        let key = text[1..end].to_string();
        let after = &text[end + 1..];
        let colon = after.find(':')?;
        if !after[..colon].trim().is_empty() {
            return None;
        }
        let rest_off = end + 1 + colon + 1;
        return Some((key, end + 1, rest_off, &text[rest_off..]));
    }
    for (i, ch) in text.char_indices() {
        if ch == chars::COLON {
            let next = text[i + 1..].chars().next();
            if next.is_none() || next == Some(chars::SPACE) {
                let key = text[..i].trim_end().to_string();
                if key.is_empty() {
                    return None;
                }
                let key_len = text[..i].trim_end().len();
                return Some((key, key_len, i + 1, &text[i + 1..]));
            }
        }
    }
    None
}

fn looks_like_mapping_entry(text: &str) -> bool {
    split_key(text).is_some()
}

/// Character cursor over a single-line flow value.
struct FlowCursor<'a> {
    text: &'a str,
    pos: usize,
    line_no: u32,
    col: usize,
    file: FileId,
}

impl<'a> FlowCursor<'a> {
    fn span_here(&self, length: usize) -> SourceSpan {
        SourceSpan::new(
            self.file,
            self.line_no,
            (self.col + self.pos) as u32,
            length as u32,
        )
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_spaces(&mut self) {
        while self.peek() == Some(chars::SPACE) {
            self.pos += 1;
        }
    }

    fn parse_node(&mut self) -> (YamlNode, Vec<Diagnostic>) {
        let mut errors = Vec::new();
        let node = self.parse_inner(&mut errors, None);
        (node, errors)
    }

    fn parse_inner(&mut self, errors: &mut Vec<Diagnostic>, terminators: Option<&[char]>) -> YamlNode {
        self.skip_spaces();
        match self.peek() {
            Some(chars::LBRACKET) => self.parse_flow_sequence(errors),
            Some(chars::LBRACE) => self.parse_flow_mapping(errors),
            Some(q @ (chars::SQ | chars::DQ)) => self.parse_quoted(q, errors),
            _ => self.parse_plain(terminators),
        }
    }

    fn parse_flow_sequence(&mut self, errors: &mut Vec<Diagnostic>) -> YamlNode {
        let start = self.pos;
        self.bump(); // consume `[`
        let mut items = Vec::new();
        loop {
            self.skip_spaces();
            match self.peek() {
                None => {
                    errors.push(
                        Diagnostic::error(codes::PARSE_SYNTAX, "unterminated flow sequence")
                            .with_span(Some(self.span_here(1))),
                    );
                    break;
                }
                Some(chars::RBRACKET) => {
                    self.bump();
                    break;
                }
                Some(chars::COMMA) => {
                    self.bump();
                }
                _ => {
                    let item = self.parse_inner(errors, Some(&[chars::COMMA, chars::RBRACKET]));
                    items.push(item);
                }
            }
        }
        let span = SourceSpan::new(
            self.file,
            self.line_no,
            (self.col + start) as u32,
            (self.pos - start) as u32,
        );
        YamlNode::new(YamlValue::Sequence(items), span)
    }

    fn parse_flow_mapping(&mut self, errors: &mut Vec<Diagnostic>) -> YamlNode {
        let start = self.pos;
        self.bump(); // consume `{`
        let mut entries: Vec<(YamlKey, YamlNode)> = Vec::new();
        loop {
            self.skip_spaces();
            match self.peek() {
                None => {
                    errors.push(
                        Diagnostic::error(codes::PARSE_SYNTAX, "unterminated flow mapping")
                            .with_span(Some(self.span_here(1))),
                    );
                    break;
                }
                Some(chars::RBRACE) => {
                    self.bump();
                    break;
                }
                Some(chars::COMMA) => {
                    self.bump();
                }
                _ => {
                    let key_start = self.pos;
                    let key_node =
                        self.parse_inner(errors, Some(&[chars::COLON, chars::COMMA, chars::RBRACE]));
                    let key_text = key_node.as_str().unwrap_or_default().to_string();
                    let key = YamlKey {
                        text: key_text,
                        span: SourceSpan::new(
                            self.file,
                            self.line_no,
                            (self.col + key_start) as u32,
                            (self.pos - key_start) as u32,
                        ),
                    };
                    self.skip_spaces();
                    let value = if self.peek() == Some(chars::COLON) {
                        self.bump();
                        self.parse_inner(errors, Some(&[chars::COMMA, chars::RBRACE]))
                    } else {
                        YamlNode::new(YamlValue::Null, key.span)
                    };
                    entries.push((key, value));
                }
            }
        }
        let span = SourceSpan::new(
            self.file,
            self.line_no,
            (self.col + start) as u32,
            (self.pos - start) as u32,
        );
        YamlNode::new(YamlValue::Mapping(entries), span)
    }

    fn parse_quoted(&mut self, quote: char, errors: &mut Vec<Diagnostic>) -> YamlNode {
        let start = self.pos;
        self.bump(); // opening quote
        let mut out = String::new();
        let mut closed = false;
        while let Some(ch) = self.bump() {
            if ch == quote {
                if quote == chars::SQ && self.peek() == Some(chars::SQ) {
                    // `''` is an escaped single quote.
                    self.bump();
                    out.push(chars::SQ);
                    continue;
                }
                closed = true;
                break;
            }
            if quote == chars::DQ && ch == '\\' {
                match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(other) => out.push(other),
                    None => break,
                }
                continue;
            }
            out.push(ch);
        }
        if !closed {
            errors.push(
                Diagnostic::error(codes::PARSE_SYNTAX, "unterminated quoted scalar")
                    .with_span(Some(SourceSpan::new(
                        self.file,
                        self.line_no,
                        (self.col + start) as u32,
                        1,
                    ))),
            );
        }
        let style = if quote == chars::SQ {
            ScalarStyle::SingleQuoted
        } else {
            ScalarStyle::DoubleQuoted
        };
        let span = SourceSpan::new(
            self.file,
            self.line_no,
            (self.col + start) as u32,
            (self.pos - start) as u32,
        );
        YamlNode::new(YamlValue::Scalar(out, style), span)
    }

    fn parse_plain(&mut self, terminators: Option<&[char]>) -> YamlNode {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if terminators.is_some_and(|t| t.contains(&ch)) {
                break;
            }
            self.pos += ch.len_utf8();
        }
        let raw = self.text[start..self.pos].trim_end();
        let span = SourceSpan::new(
            self.file,
            self.line_no,
            (self.col + start) as u32,
            raw.len() as u32,
        );
        if raw.is_empty() || raw == "~" || raw == "null" {
            return YamlNode::new(YamlValue::Null, span);
        }
        YamlNode::new(YamlValue::Scalar(raw.to_string(), ScalarStyle::Plain), span)
    }
}
