//! Anonymous and cheap-local label utilities.
//!
//! Anonymous labels are written as a bare `:` and referenced by `:+`,
//! `:-`, `:<<`, and so on.  The scanner already turned every such token
//! into an ordinal, so resolution here is table lookup plus a range check.
//!
//! Cheap locals (prefix `@`) have no entry in the scope tree.  Their
//! effective scope is the span between two boundary lines, where a
//! boundary is a non-cheap label definition or a `.proc`/`.struct`/
//! `.union` opener.  They are resolved on demand by re-lexing the lines of
//! the enclosing span.

use lsp_types as lsp;
use crate::lang::{Document,line_range,range_contains_pos};
use super::arguments::ArgParser;
use super::lexer::lex_line;
use super::SymbolTable;

/// Ordinal of the anonymous-label construct at a position, definition
/// sites included.  Out-of-range ordinals are reported as recorded; the
/// caller decides whether a definition must exist.
pub fn ordinal_at(table: &SymbolTable, pos: &lsp::Position) -> Option<usize> {
    for (ordinal,spans) in &table.anon.refs {
        if spans.iter().any(|rng| range_contains_pos(rng,pos)) {
            return Some(*ordinal);
        }
    }
    None
}

/// Span of the definition of the given ordinal, if it exists.
pub fn definition_of_ordinal(table: &SymbolTable, ordinal: usize) -> Option<lsp::Range> {
    let line = *table.anon.defs.get(ordinal)?;
    if let Some(spans) = table.anon.refs.get(&ordinal) {
        if let Some(rng) = spans.iter().find(|rng| rng.start.line == line) {
            return Some(*rng);
        }
    }
    Some(line_range(line,0,1))
}

/// Every recorded span for the ordinal, definition site included.
pub fn references_of_ordinal(table: &SymbolTable, ordinal: usize) -> Vec<lsp::Range> {
    match ordinal < table.anon.defs.len() {
        true => table.anon.refs.get(&ordinal).cloned().unwrap_or_default(),
        false => Vec::new()
    }
}

/// Last boundary at or before `line`, else the top of the file.
pub fn block_start(table: &SymbolTable, line: u32) -> u32 {
    match table.boundaries.partition_point(|b| *b <= line) {
        0 => 0,
        n => table.boundaries[n-1]
    }
}

/// First boundary beyond `block_start`, else EOF.
fn block_end(table: &SymbolTable, start: u32) -> u32 {
    match table.boundaries.iter().find(|b| **b > start) {
        Some(b) => *b,
        None => table.lines
    }
}

/// Definition of a cheap local as seen from `line`: the first line of the
/// enclosing block that defines the same name.
pub fn cheap_definition(doc: &Document, table: &SymbolTable, name: &str, line: u32) -> Option<lsp::Range> {
    let start = block_start(table,line);
    let end = block_end(table,start);
    let mut row = start;
    for text in doc.text.lines().skip(start as usize) {
        if row >= end {
            break;
        }
        let lexed = lex_line(text);
        if let Some(item) = lexed.label {
            if item.text == name {
                return Some(line_range(row,item.offset,item.offset+item.text.len()));
            }
        }
        row += 1;
    }
    None
}

/// Every definition or use of the cheap name within the block around `line`.
pub fn cheap_references(doc: &Document, table: &SymbolTable, name: &str, line: u32) -> Vec<lsp::Range> {
    let parser = ArgParser::new();
    let start = block_start(table,line);
    let end = block_end(table,start);
    let mut ans = Vec::new();
    let mut row = start;
    for text in doc.text.lines().skip(start as usize) {
        if row >= end {
            break;
        }
        let lexed = lex_line(text);
        if let Some(item) = &lexed.label {
            if item.text == name {
                ans.push(line_range(row,item.offset,item.offset+item.text.len()));
            }
        }
        if let Some(args) = &lexed.args {
            for group in parser.parse(&args.text,args.offset) {
                for tok in group.tokens {
                    if tok.text == name {
                        ans.push(line_range(row,tok.offset,tok.offset+tok.text.len()));
                    }
                }
            }
        }
        row += 1;
    }
    ans
}

/// Names of the cheap locals defined in the block around `line`, for
/// completion.
pub fn cheap_labels_in_block(doc: &Document, table: &SymbolTable, line: u32) -> Vec<String> {
    let start = block_start(table,line);
    let end = block_end(table,start);
    let mut ans = Vec::new();
    let mut row = start;
    for text in doc.text.lines().skip(start as usize) {
        if row >= end {
            break;
        }
        if let Some(item) = lex_line(text).label {
            if item.text.starts_with('@') && !ans.contains(&item.text) {
                ans.push(item.text);
            }
        }
        row += 1;
    }
    ans
}
