//! Navigation queries: definition, references, rename, highlights.
//!
//! All of them share the same first step, identifying what the cursor is
//! on: a named reference (every definition site carries a reference to
//! itself), an anonymous-label construct, or a cheap local.  Unresolved
//! references simply produce empty results.

use lsp_types as lsp;
use std::collections::HashMap;
use crate::lang::range_contains_pos;
use super::analysis::Analyzer;
use super::lexer::lex_line;
use super::unnamed;
use super::Entity;

/// What a query position points at.
pub enum Target {
    Entity(Entity),
    /// anonymous-label ordinal
    Anonymous(usize),
    /// cheap local name and the line it was seen on
    Cheap(String,u32)
}

/// Identify the target under the cursor, resolving named references
/// through the resolver.
pub fn target_at(analyzer: &mut Analyzer, uri: &lsp::Url, pos: &lsp::Position) -> Option<Target> {
    let key = uri.to_string();
    let reference = match analyzer.workspace().table(&key) {
        Some(table) => table.find_reference_at(pos).cloned(),
        None => None
    };
    if let Some(reference) = reference {
        if reference.name.starts_with('@') {
            return Some(Target::Cheap(reference.name.clone(),pos.line));
        }
        return analyzer.resolve(&key,&reference).map(Target::Entity);
    }
    if let Some(table) = analyzer.workspace().table(&key) {
        if let Some(ordinal) = unnamed::ordinal_at(table,pos) {
            return Some(Target::Anonymous(ordinal));
        }
    }
    // a cheap-local definition has no stored reference, inspect the line
    if let Some(doc) = analyzer.workspace().doc(&key) {
        if let Some(line) = doc.line(pos.line as usize) {
            if let Some(item) = lex_line(&line).label {
                let rng = crate::lang::line_range(pos.line,item.offset,item.offset+item.text.len());
                if item.text.starts_with('@') && range_contains_pos(&rng,pos) {
                    return Some(Target::Cheap(item.text,pos.line));
                }
            }
        }
    }
    None
}

pub fn goto_definition(analyzer: &mut Analyzer, uri: &lsp::Url, pos: &lsp::Position) -> Vec<lsp::Location> {
    if !analyzer.ready() {
        return Vec::new();
    }
    let key = uri.to_string();
    match target_at(analyzer,uri,pos) {
        Some(Target::Entity(entity)) => {
            let ws = analyzer.workspace();
            match (ws.table(&entity.uri),lsp::Url::parse(&entity.uri)) {
                (Some(table),Ok(target_uri)) => vec![lsp::Location::new(target_uri,table.node_range(&entity.node))],
                _ => Vec::new()
            }
        },
        Some(Target::Anonymous(ordinal)) => {
            let ws = analyzer.workspace();
            match ws.table(&key).and_then(|t| unnamed::definition_of_ordinal(t,ordinal)) {
                Some(rng) => vec![lsp::Location::new(uri.clone(),rng)],
                None => Vec::new()
            }
        },
        Some(Target::Cheap(name,line)) => {
            let ws = analyzer.workspace();
            match (ws.doc(&key),ws.table(&key)) {
                (Some(doc),Some(table)) => match unnamed::cheap_definition(doc,table,&name,line) {
                    Some(rng) => vec![lsp::Location::new(uri.clone(),rng)],
                    None => Vec::new()
                },
                _ => Vec::new()
            }
        },
        None => Vec::new()
    }
}

/// Every reference span whose resolution lands on the entity, across the
/// whole workspace.
pub fn entity_references(analyzer: &mut Analyzer, entity: &Entity) -> Vec<lsp::Location> {
    let mut candidates = Vec::new();
    for (uri,table) in &analyzer.workspace().tables {
        for reference in &table.references {
            candidates.push((uri.clone(),reference.clone()));
        }
    }
    let mut ans = Vec::new();
    for (uri,reference) in candidates {
        if let Some(resolved) = analyzer.resolve(&uri,&reference) {
            if resolved == *entity {
                if let Ok(parsed) = lsp::Url::parse(&uri) {
                    ans.push(lsp::Location::new(parsed,reference.rng));
                }
            }
        }
    }
    ans.sort_by_key(|loc| (loc.uri.to_string(),loc.range.start.line,loc.range.start.character));
    ans
}

pub fn references(analyzer: &mut Analyzer, uri: &lsp::Url, pos: &lsp::Position) -> Vec<lsp::Location> {
    if !analyzer.ready() {
        return Vec::new();
    }
    let key = uri.to_string();
    match target_at(analyzer,uri,pos) {
        Some(Target::Entity(entity)) => entity_references(analyzer,&entity),
        Some(Target::Anonymous(ordinal)) => {
            let ws = analyzer.workspace();
            match ws.table(&key) {
                Some(table) => unnamed::references_of_ordinal(table,ordinal).into_iter()
                    .map(|rng| lsp::Location::new(uri.clone(),rng)).collect(),
                None => Vec::new()
            }
        },
        Some(Target::Cheap(name,line)) => {
            let ws = analyzer.workspace();
            match (ws.doc(&key),ws.table(&key)) {
                (Some(doc),Some(table)) => unnamed::cheap_references(doc,table,&name,line).into_iter()
                    .map(|rng| lsp::Location::new(uri.clone(),rng)).collect(),
                _ => Vec::new()
            }
        },
        None => Vec::new()
    }
}

/// Text edits replacing every reference span of the target with the new
/// name.  Anonymous labels have no name to replace.
pub fn rename(analyzer: &mut Analyzer, uri: &lsp::Url, pos: &lsp::Position,
    new_name: &str) -> HashMap<lsp::Url,Vec<lsp::TextEdit>> {
    let mut changes: HashMap<lsp::Url,Vec<lsp::TextEdit>> = HashMap::new();
    if !analyzer.ready() {
        return changes;
    }
    let locs = match target_at(analyzer,uri,pos) {
        Some(Target::Anonymous(_)) | None => Vec::new(),
        _ => references(analyzer,uri,pos)
    };
    for loc in locs {
        changes.entry(loc.uri).or_default().push(lsp::TextEdit::new(loc.range,new_name.to_string()));
    }
    changes
}

/// Reference spans within the queried file only.
pub fn highlights(analyzer: &mut Analyzer, uri: &lsp::Url, pos: &lsp::Position) -> Vec<lsp::DocumentHighlight> {
    references(analyzer,uri,pos).into_iter()
        .filter(|loc| loc.uri == *uri)
        .map(|loc| lsp::DocumentHighlight { range: loc.range, kind: Some(lsp::DocumentHighlightKind::TEXT) })
        .collect()
}
