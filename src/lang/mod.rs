//! # Language Module
//!
//! This module contains facilities for analyzing ca65 assembly source.
//! The root module `lang` contains code for handling documents, positions,
//! and ranges, and general code for interacting with the CLI or the
//! language server.
//!
//! The specific analysis lives in the `ca65` submodule.  There is no
//! generated parser; ca65 source is line oriented and is handled by a
//! purpose-built line lexer and argument parser.
//!
//! The language server itself is compiled to a separate executable, and as
//! such, per rust convention, is in src/bin.  In particular, communication
//! with a language client is handled there, not here.

pub mod ca65;
pub mod server;

use lsp_types as lsp;
use colored::*;
use thiserror::Error;
use std::str::FromStr;

use crate::DYNERR;
const RCH: &str = "unreachable was reached";

#[derive(Error,Debug)]
pub enum Error {
    #[error("Line out of range")]
    LineNumber,
    #[error("Path not found")]
    PathNotFound,
    #[error("Could not parse URL")]
    BadUrl
}

/// This works by normalizing to the server's convention, i.e., anything that comes from the
/// client must be normalized.
/// As an example, the client may send "file:///c%3A" while the server generates "file:///C:".
pub fn normalize_client_uri(uri: lsp::Url) -> lsp::Url {
    if let Ok(path) = uri.to_file_path() {
        if let Ok(new_uri) = lsp::Url::from_file_path(path) {
            return new_uri;
        }
    }
    uri
}

/// Text document packed up with URI and version information.
/// This is similar to the LSP `TextDocumentItem`, except that it originates
/// on the server side, or from the CLI.  There is an internally defined
/// URI scheme for string documents.
#[derive(Clone)]
pub struct Document {
    pub uri: lsp::Url,
    pub version: Option<i32>,
    pub text: String
}

impl Document {
    pub fn new(uri: lsp::Url,text: String) -> Self {
        Self {
            uri,
            version: None,
            text
        }
    }
    pub fn from_string(text: String, id: u64) -> Self {
        Self {
            uri: lsp::Url::from_str(&format!("string:{}",id)).expect(RCH),
            version: None,
            text
        }
    }
    pub fn from_file_path(path: &std::path::Path) -> Result<Self,DYNERR> {
        let by = std::fs::read(path)?;
        let text = String::from_utf8(by)?;
        if let Ok(uri) = lsp::Url::from_file_path(path) {
            Ok(Self {
                uri,
                version: None,
                text
            })
        } else {
            Err(Box::new(Error::PathNotFound))
        }
    }
    /// Get a row from the document, if it exists.
    pub fn line(&self,row: usize) -> Option<String> {
        self.text.lines().nth(row).map(|s| s.to_string())
    }
}

/// Is the position within the range, both endpoints included.
pub fn range_contains_pos(rng: &lsp::Range, pos: &lsp::Position) -> bool {
    let after_start = pos.line > rng.start.line
        || pos.line == rng.start.line && pos.character >= rng.start.character;
    let before_end = pos.line < rng.end.line
        || pos.line == rng.end.line && pos.character <= rng.end.character;
    after_start && before_end
}

/// Range of a token within a single line, `character` counts bytes of the line.
pub fn line_range(row: u32, start: usize, end: usize) -> lsp::Range {
    lsp::Range {
        start: lsp::Position { line: row, character: start as u32 },
        end: lsp::Position { line: row, character: end as u32 }
    }
}

fn json_field<'a>(maybe_obj: &'a serde_json::Value, key: &str) -> Option<&'a serde_json::Value> {
    maybe_obj.as_object().and_then(|obj| obj.get(key))
}

/// Try to update a named boolean from a serde `Value` presumed to be an object.
/// If there is any error do not change the value.
pub fn update_json_bool(maybe_obj: &serde_json::Value, key: &str, curr: &mut bool) {
    if let Some(x) = json_field(maybe_obj,key).and_then(|v| v.as_bool()) {
        *curr = x;
    }
}

/// Try to update a named string from a serde `Value` presumed to be an object.
/// If there is any error do not change the value.
pub fn update_json_string(maybe_obj: &serde_json::Value, key: &str, curr: &mut String) {
    if let Some(x) = json_field(maybe_obj,key).and_then(|v| v.as_str()) {
        *curr = x.to_string();
    }
}

/// Try to update a named list of strings from a serde `Value` presumed to be an object.
/// If there is any error, or any element is not a string, do not change the value.
pub fn update_json_vec_str(maybe_obj: &serde_json::Value, key: &str, curr: &mut Vec<String>) {
    if let Some(list) = json_field(maybe_obj,key).and_then(|v| v.as_array()) {
        let mut ans = Vec::new();
        for v in list {
            match v.as_str() {
                Some(s) => ans.push(s.to_owned()),
                None => return
            }
        }
        *curr = ans;
    }
}

/// Byte offset of the start of every line.
fn line_starts(doc: &str) -> Vec<usize> {
    let mut ans = vec![0];
    for (i,c) in doc.char_indices() {
        if c == '\n' {
            ans.push(i+1);
        }
    }
    ans
}

/// This assumes all CRLF have been filtered from `doc`.
/// CRLF in `raw_new` will be changed to LF.
/// `character` counts bytes of the line, matching the rest of the engine.
fn replace_range(doc: &mut String, rng: lsp::Range, raw_new: &str) -> crate::STDRESULT {
    let new = raw_new.replace("\r\n","\n");
    let starts = line_starts(doc);
    let offset = |pos: &lsp::Position| starts.get(pos.line as usize)
        .map(|line| line + pos.character as usize);
    match (offset(&rng.start),offset(&rng.end)) {
        (Some(start),Some(end)) if start <= end && end <= doc.len() => {
            doc.replace_range(start..end,&new);
            Ok(())
        },
        _ => {
            // an insertion just past the last line is still meaningful
            if rng.start.line as usize == starts.len() && rng.start.character == 0 && rng.start == rng.end {
                doc.push_str(&new);
                return Ok(());
            }
            Err(Box::new(Error::LineNumber))
        }
    }
}

/// Strategy is to sort edits bottom to top and apply in that sequence, this way the
/// meaning of a row doesn't change as we make the replacements.  Overlaps not allowed.
/// This is consistent with the LSP.  Preserves CRLF or LF, unless there is a mixture,
/// in which case LF wins.
pub fn apply_edits(doc: &str, edits: &Vec<lsp::TextEdit>) -> Result<String,DYNERR> {
    let crlf = doc.contains('\n') && doc.matches('\n').count() == doc.matches("\r\n").count();
    let mut ans = doc.replace("\r\n","\n");
    let mut sorted: Vec<&lsp::TextEdit> = edits.iter().collect();
    // the sort is stable, so repeated insertions at one spot keep their order
    sorted.sort_by_key(|e| (e.range.start.line,e.range.start.character));
    for edit in sorted.iter().rev() {
        log::trace!("replace {:?}",edit.range);
        replace_range(&mut ans,edit.range,&edit.new_text)?;
    }
    if crlf {
        ans = ans.replace("\n","\r\n");
    }
    Ok(ans)
}

pub fn eprint_diagnostic(diag: &lsp::Diagnostic, program: &str) {
    if let Some(sev) = diag.severity {
        if sev == lsp::DiagnosticSeverity::HINT {
            // hints are used to dim unused symbols, no need to flag them here
            return;
        }
    }
    let mut lines = program.lines();
    let mut maybe_line = None;
    for _i in 0..diag.range.start.line+1 {
        maybe_line = lines.next();
    }
    let [announcement,squiggle] = match diag.severity {
        Some(lsp::DiagnosticSeverity::ERROR) => ["Error".red(),"^".red()],
        Some(lsp::DiagnosticSeverity::WARNING) => ["Warning".bright_yellow(),"^".bright_yellow()],
        Some(lsp::DiagnosticSeverity::INFORMATION) => ["Information".bright_blue(),"^".bright_blue()],
        _ => ["Unexpected Notice".red(),"^".red()]
    };
    eprintln!("{} on line {}: {}",announcement,diag.range.start.line,diag.message);
    if let Some(line) = maybe_line {
        eprintln!("  {}",line);
        for _i in 0..diag.range.start.character+2 {
            eprint!(" ");
        }
        for _i in diag.range.start.character..diag.range.end.character {
            eprint!("{}",squiggle);
        }
        eprintln!();
    }
}
