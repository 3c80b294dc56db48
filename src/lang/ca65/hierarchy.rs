//! Call hierarchy.
//!
//! Only entities that can be called participate: symbols (labels) and
//! proc-kind scopes.  A reference takes part in the hierarchy only when
//! the scanner attached a calling entity to it, which happens for `jsr`
//! and `jmp` operands; everything else is invisible here.

use lsp_types as lsp;
use std::collections::HashMap;
use super::analysis::Analyzer;
use super::navigation::{target_at,Target};
use super::{Entity,Node,ScopeKind};

fn item_for(analyzer: &Analyzer, entity: &Entity) -> Option<lsp::CallHierarchyItem> {
    let table = analyzer.workspace().table(&entity.uri)?;
    let uri = lsp::Url::parse(&entity.uri).ok()?;
    let selection = table.node_range(&entity.node);
    let range = match entity.node {
        Node::Scope(handle) => table.scopes[handle].body,
        _ => selection
    };
    Some(lsp::CallHierarchyItem {
        name: table.node_name(&entity.node).to_string(),
        kind: lsp::SymbolKind::FUNCTION,
        tags: None,
        detail: Some(table.node_detail(&entity.node)),
        uri,
        range,
        selection_range: selection,
        data: None
    })
}

/// Recover the entity a prepared item points at.
fn entity_from_item(analyzer: &Analyzer, item: &lsp::CallHierarchyItem) -> Option<Entity> {
    let key = item.uri.to_string();
    let table = analyzer.workspace().table(&key)?;
    for node in table.defined_nodes() {
        if table.node_range(&node) == item.selection_range {
            return Some(Entity::new(&key,node));
        }
    }
    None
}

/// Accept a symbol or a proc-kind scope under the cursor.
pub fn prepare(analyzer: &mut Analyzer, uri: &lsp::Url, pos: &lsp::Position) -> Option<lsp::CallHierarchyItem> {
    if !analyzer.ready() {
        return None;
    }
    let entity = match target_at(analyzer,uri,pos)? {
        Target::Entity(entity) => entity,
        _ => return None
    };
    let callable = match entity.node {
        Node::Symbol(_) => true,
        Node::Scope(handle) => analyzer.workspace().table(&entity.uri)
            .map(|t| t.scopes[handle].kind == ScopeKind::Proc).unwrap_or(false),
        _ => false
    };
    match callable {
        true => item_for(analyzer,&entity),
        false => None
    }
}

/// Group all references resolving to the target by their calling entity.
pub fn incoming(analyzer: &mut Analyzer, item: &lsp::CallHierarchyItem) -> Vec<lsp::CallHierarchyIncomingCall> {
    let target = match entity_from_item(analyzer,item) {
        Some(entity) => entity,
        None => return Vec::new()
    };
    let mut candidates = Vec::new();
    for (uri,table) in &analyzer.workspace().tables {
        for reference in &table.references {
            if let Some(caller) = reference.caller {
                candidates.push((uri.clone(),caller,reference.clone()));
            }
        }
    }
    let mut groups: HashMap<Entity,Vec<lsp::Range>> = HashMap::new();
    for (uri,caller,reference) in candidates {
        if let Some(resolved) = analyzer.resolve(&uri,&reference) {
            if resolved == target {
                groups.entry(Entity::new(&uri,caller)).or_default().push(reference.rng);
            }
        }
    }
    let mut ans = Vec::new();
    for (caller,from_ranges) in groups {
        if let Some(from) = item_for(analyzer,&caller) {
            ans.push(lsp::CallHierarchyIncomingCall { from, from_ranges });
        }
    }
    ans.sort_by_key(|c| (c.from.uri.to_string(),c.from.range.start.line));
    ans
}

/// Enumerate references in the selected entity's file whose calling
/// entity is the selection, grouped by resolved target.
pub fn outgoing(analyzer: &mut Analyzer, item: &lsp::CallHierarchyItem) -> Vec<lsp::CallHierarchyOutgoingCall> {
    let source = match entity_from_item(analyzer,item) {
        Some(entity) => entity,
        None => return Vec::new()
    };
    let mut candidates = Vec::new();
    if let Some(table) = analyzer.workspace().table(&source.uri) {
        for reference in &table.references {
            if reference.caller == Some(source.node) {
                candidates.push((source.uri.clone(),reference.clone()));
            }
        }
    }
    let mut groups: HashMap<Entity,Vec<lsp::Range>> = HashMap::new();
    for (uri,reference) in candidates {
        if let Some(resolved) = analyzer.resolve(&uri,&reference) {
            groups.entry(resolved).or_default().push(reference.rng);
        }
    }
    let mut ans = Vec::new();
    for (target,from_ranges) in groups {
        if let Some(to) = item_for(analyzer,&target) {
            ans.push(lsp::CallHierarchyOutgoingCall { to, from_ranges });
        }
    }
    ans.sort_by_key(|c| (c.to.uri.to_string(),c.to.range.start.line));
    ans
}
