//! Argument parser for ca65 source.
//!
//! Consumes the argument item produced by the line lexer and emits the
//! qualified-name groups found in it.  Contents of string literals,
//! character literals, and hexadecimal numbers are blanked first so that
//! identifier-like characters inside them are not mistaken for names.
//!
//! `.sizeof(...)` expressions are extracted in a first pass and their
//! arguments tagged with the `sizeof` context; everything else is scanned
//! in a second pass.  A group is a maximal run of identifier tokens joined
//! by `::`; a leading `::` contributes an initial empty qualifier denoting
//! the file root.

use regex::Regex;
use super::RefContext;
use super::lexer::{is_identifier_start,is_identifier_char};

const RCH: &str = "unreachable was reached";

/// One token of a qualified-name group.  The last token of a group carries
/// the group's context, the tokens before it carry `scope`.
#[derive(Clone,PartialEq,Debug)]
pub struct ArgToken {
    pub text: String,
    pub offset: usize,
    pub ctx: RefContext
}

/// A qualified-name group such as `Gfx::Sprite::HEIGHT`.  A leading token
/// with empty text anchors the chain at the file root (`::name`).
#[derive(Clone,PartialEq,Debug)]
pub struct ArgGroup {
    pub tokens: Vec<ArgToken>
}

/// One item of an `.import`/`.export` style argument list.
#[derive(Clone,PartialEq,Debug)]
pub struct ImportExportItem {
    pub name: String,
    pub offset: usize,
    /// trailing `:addrspec`, e.g. `:zeropage`
    pub addr_size: Option<String>,
    /// value expression after `=` or `:=`
    pub value: Option<String>
}

pub struct ArgParser {
    sizeof_patt: Regex,
    hex_patt: Regex,
    string_patt: Regex,
    char_patt: Regex,
    item_patt: Regex
}

impl ArgParser {
    pub fn new() -> Self {
        Self {
            sizeof_patt: Regex::new(r"(?i)\.sizeof\s*\(([^)]*)\)").expect(RCH),
            hex_patt: Regex::new(r"\$[0-9A-Fa-f]+").expect(RCH),
            string_patt: Regex::new(r#""[^"]*""#).expect(RCH),
            char_patt: Regex::new(r"'[^']*'").expect(RCH),
            item_patt: Regex::new(r"^\s*([A-Za-z_@][A-Za-z0-9_@]*)\s*(:\s*([A-Za-z]+))?\s*((:?=)\s*(.*))?$").expect(RCH)
        }
    }

    /// Blank a span by overwriting it with spaces, preserving every offset.
    fn blank(masked: &mut String, start: usize, end: usize) {
        masked.replace_range(start..end," ".repeat(end-start).as_str());
    }

    /// Blank string literals, character literals, and hex numbers.
    fn mask(&self, args: &str) -> String {
        let mut masked = args.to_string();
        for patt in [&self.string_patt,&self.char_patt,&self.hex_patt] {
            let found: Vec<(usize,usize)> = patt.find_iter(&masked)
                .map(|m| (m.start(),m.end())).collect();
            for (start,end) in found {
                Self::blank(&mut masked,start,end);
            }
        }
        masked
    }

    /// Parse the argument text beginning at byte `offset` of its line into
    /// qualified-name groups.
    pub fn parse(&self, args: &str, offset: usize) -> Vec<ArgGroup> {
        let mut ans = Vec::new();
        let mut masked = self.mask(args);

        // first pass: extract .sizeof(...) expressions, then blank them
        let sizeof_spans: Vec<(usize,usize,usize)> = self.sizeof_patt.captures_iter(&masked)
            .filter_map(|cap| {
                let whole = cap.get(0)?;
                let inner = cap.get(1)?;
                Some((whole.start(),whole.end(),inner.start()))
            }).collect();
        for (start,end,inner_start) in sizeof_spans {
            let inner = masked[inner_start..end-1].to_string();
            ans.append(&mut self.scan_groups(&inner,offset+inner_start,RefContext::Sizeof));
            Self::blank(&mut masked,start,end);
        }

        // second pass: everything that is left
        ans.append(&mut self.scan_groups(&masked,offset,RefContext::Symbol));
        ans.sort_by_key(|g| g.tokens.last().map(|t| t.offset).unwrap_or(0));
        ans
    }

    /// Scan masked text for qualified-name groups, tagging the last token
    /// of each group with `ctx`.
    fn scan_groups(&self, text: &str, offset: usize, ctx: RefContext) -> Vec<ArgGroup> {
        let mut ans = Vec::new();
        let bytes = text.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            let c = bytes[i] as char;
            // a dot-word is a pseudo-function or control command, skip it whole
            if c == '.' && i+1 < bytes.len() && is_identifier_start(bytes[i+1] as char) {
                i += 1;
                while i < bytes.len() && is_identifier_char(bytes[i] as char) {
                    i += 1;
                }
                continue;
            }
            let mut tokens: Vec<ArgToken> = Vec::new();
            // leading :: anchors the group at the file root
            if c == ':' && i+1 < bytes.len() && bytes[i+1] == b':'
                && i+2 < bytes.len() && is_identifier_start(bytes[i+2] as char) {
                tokens.push(ArgToken { text: String::new(), offset: offset+i, ctx: RefContext::Scope });
                i += 2;
            } else if !is_identifier_start(c) {
                i += 1;
                continue;
            }
            // chain of identifiers joined by ::
            loop {
                let start = i;
                while i < bytes.len() && is_identifier_char(bytes[i] as char) {
                    i += 1;
                }
                tokens.push(ArgToken { text: text[start..i].to_string(), offset: offset+start, ctx: RefContext::Scope });
                if i+1 < bytes.len() && bytes[i] == b':' && bytes[i+1] == b':'
                    && i+2 < bytes.len() && is_identifier_start(bytes[i+2] as char) {
                    i += 2;
                    continue;
                }
                break;
            }
            if let Some(last) = tokens.last_mut() {
                last.ctx = ctx;
            }
            ans.push(ArgGroup { tokens });
        }
        ans
    }

    /// Parse an `.import`/`.export`/`.global` argument list: items split on
    /// top-level commas, each an identifier with optional `:addrspec` and
    /// optional `=`/`:=` value.
    pub fn parse_import_export(&self, args: &str, offset: usize) -> Vec<ImportExportItem> {
        let mut ans = Vec::new();
        let masked = self.mask(args);
        let mut item_start = 0;
        let mut spans = Vec::new();
        let mut depth = 0;
        for (i,c) in masked.char_indices() {
            match c {
                '(' => depth += 1,
                ')' => if depth > 0 { depth -= 1 },
                ',' if depth == 0 => {
                    spans.push((item_start,i));
                    item_start = i + 1;
                },
                _ => {}
            }
        }
        spans.push((item_start,masked.len()));
        for (start,end) in spans {
            if let Some(cap) = self.item_patt.captures(&masked[start..end]) {
                let name = match cap.get(1) { Some(m) => m, None => continue };
                // the value expression must come from the unmasked text
                let value = cap.get(6).map(|m| args[start+m.start()..end].trim().to_string())
                    .filter(|v| !v.is_empty());
                ans.push(ImportExportItem {
                    name: name.as_str().to_string(),
                    offset: offset + start + name.start(),
                    addr_size: cap.get(3).map(|m| m.as_str().to_string()),
                    value
                });
            }
        }
        ans
    }
}
