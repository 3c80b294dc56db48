//! Reference resolution.
//!
//! Maps a reference to the entity it names.  The walk has three stages:
//! a scoped lookup through the translation unit, a workspace export lookup
//! when the local walk ended on an import, and an implicit-import fallback
//! for unresolved root-scope references when the configuration allows it.
//!
//! Results are memoized per file.  Invalidation is driven by the
//! orchestrator: when a file is rescanned, every file in its pre- and
//! post-edit closures loses its memos, and entries elsewhere that point
//! into the rescanned file (or that recorded a miss) are dropped, since an
//! edit may create linkage across translation units.
//!
//! Resolution never fails loudly; an unresolvable reference yields `None`.

use std::collections::HashMap;
use super::{Entity,Node,RefContext,Reference,ScopeKind,Workspace,ROOT_SCOPE};
use super::symbols::LookupResult;

/// Identity of a reference within its file: start of span plus name.
type LocalKey = (u32,u32,String);

#[derive(Default)]
pub struct Resolver {
    /// per-file memo of reference resolutions
    locals: HashMap<String,HashMap<LocalKey,Option<Entity>>>,
    /// per-file memo of export lookups by base name
    exports: HashMap<String,HashMap<String,Option<Entity>>>,
    hits: u64,
    misses: u64
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a reference originating in `uri`.
    pub fn resolve_reference(&mut self, ws: &Workspace, uri: &str, reference: &Reference,
        implicit_imports: bool) -> Option<Entity> {
        let key = (reference.rng.start.line,reference.rng.start.character,reference.name.clone());
        if let Some(memo) = self.locals.get(uri) {
            if let Some(ans) = memo.get(&key) {
                self.hits += 1;
                return ans.clone();
            }
        }
        self.misses += 1;
        let ans = self.derive(ws,uri,reference,implicit_imports);
        self.locals.entry(uri.to_string()).or_default().insert(key,ans.clone());
        ans
    }

    fn derive(&mut self, ws: &Workspace, uri: &str, reference: &Reference,
        implicit_imports: bool) -> Option<Entity> {
        if reference.ctx == RefContext::Macro {
            // macros live in a flat per-file namespace across the unit
            for file in ws.includes.translation_unit(uri) {
                if let Some(table) = ws.tables.get(&file) {
                    if let Some(idx) = table.macro_by_name(&reference.name) {
                        return Some(Entity::new(&file,Node::Macro(idx)));
                    }
                }
            }
            return None;
        }
        let mut first_import: Option<Entity> = None;
        for file in ws.includes.translation_unit(uri) {
            let table = match ws.tables.get(&file) {
                Some(table) => table,
                None => continue
            };
            let base = match file == uri {
                true => reference.scope,
                false => ROOT_SCOPE
            };
            match table.lookup(base,&reference.qualifiers,&reference.name,reference.ctx,true) {
                Some(LookupResult::Import(idx)) => {
                    if first_import.is_none() {
                        first_import = Some(Entity::new(&file,Node::Import(idx)));
                    }
                },
                Some(found) => return Some(Entity::new(&file,found.to_node())),
                None => {}
            }
        }
        if let Some(import) = first_import {
            // an import with a workspace definition resolves through it
            if let Some(target) = self.resolve_export_name(ws,uri,&reference.name) {
                return Some(target);
            }
            return Some(import);
        }
        if implicit_imports && reference.ctx == RefContext::Symbol
            && reference.scope == ROOT_SCOPE && reference.qualifiers.is_empty() {
            return self.resolve_export_name(ws,uri,&reference.name);
        }
        None
    }

    /// Find the definition behind an exported name.  Each export is tried
    /// in stack order; the first one that maps to a symbol or a proc-kind
    /// scope within its own translation unit wins.
    pub fn resolve_export_name(&mut self, ws: &Workspace, from_uri: &str, name: &str) -> Option<Entity> {
        if let Some(memo) = self.exports.get(from_uri) {
            if let Some(ans) = memo.get(name) {
                self.hits += 1;
                return ans.clone();
            }
        }
        self.misses += 1;
        let mut ans = None;
        'entries: for entry in ws.exports.get(name) {
            for file in ws.includes.translation_unit(&entry.uri) {
                let table = match ws.tables.get(&file) {
                    Some(table) => table,
                    None => continue
                };
                let base = match file == entry.uri {
                    true => entry.scope,
                    false => ROOT_SCOPE
                };
                // imports are excluded here: an import cannot satisfy a
                // foreign export
                match table.lookup(base,&[],name,RefContext::Symbol,false) {
                    Some(LookupResult::Symbol(idx)) => {
                        ans = Some(Entity::new(&file,Node::Symbol(idx)));
                        break 'entries;
                    },
                    Some(LookupResult::Scope(handle)) if table.scopes[handle].kind == ScopeKind::Proc => {
                        ans = Some(Entity::new(&file,Node::Scope(handle)));
                        break 'entries;
                    },
                    _ => {}
                }
            }
        }
        self.exports.entry(from_uri.to_string()).or_default().insert(name.to_string(),ans.clone());
        ans
    }

    /// Drop the memos of every file in `closure`.  Elsewhere, drop every
    /// entry that could depend on the edited file: misses, results that
    /// point into it, and results that ended on an import, since the edit
    /// may have created or destroyed the export behind it.  Export memos
    /// cross translation units, so they are dropped wholesale.
    pub fn invalidate(&mut self, closure: &[String], edited: &str) {
        for uri in closure {
            self.locals.remove(uri);
        }
        self.exports.clear();
        for memo in self.locals.values_mut() {
            memo.retain(|_,v| match v {
                Some(entity) => entity.uri != edited && !matches!(entity.node,Node::Import(_)),
                None => false
            });
        }
        log::debug!("invalidated memos around {}",edited);
    }

    pub fn clear(&mut self) {
        self.locals.clear();
        self.exports.clear();
    }

    /// (cache hits, cache misses)
    pub fn stats(&self) -> (u64,u64) {
        (self.hits,self.misses)
    }
}
