//! Exports map.
//!
//! Workspace-wide index of exported names.  Each name keys a stack of
//! entries in insertion order; replacing a file's exports first removes
//! every entry belonging to that file, then pushes the new set, so a
//! rescan is atomic per file.

use lsp_types as lsp;
use std::collections::HashMap;
use super::{ExportKind,ScopeHandle};

/// One export, detached from its symbol table so the map survives rescans
/// of other files.
#[derive(Clone,PartialEq)]
pub struct ExportEntry {
    pub uri: String,
    pub name: String,
    pub kind: ExportKind,
    pub rng: lsp::Range,
    /// enclosing scope within the exporting file
    pub scope: ScopeHandle,
    /// index within the exporting file's table
    pub index: usize
}

#[derive(Clone,Default)]
pub struct ExportsMap {
    map: HashMap<String,Vec<ExportEntry>>
}

impl ExportsMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every export belonging to `uri` with the new set.
    pub fn update_exports(&mut self, uri: &str, new_set: Vec<ExportEntry>) {
        for stack in self.map.values_mut() {
            stack.retain(|e| e.uri != uri);
        }
        self.map.retain(|_,stack| !stack.is_empty());
        for entry in new_set {
            self.map.entry(entry.name.clone()).or_default().push(entry);
        }
    }

    pub fn remove_file(&mut self, uri: &str) {
        self.update_exports(uri,Vec::new());
    }

    /// Current stack for a name, insertion order of surviving entries.
    pub fn get(&self, name: &str) -> &[ExportEntry] {
        self.map.get(name).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn names(&self) -> Vec<&String> {
        let mut ans: Vec<&String> = self.map.keys().collect();
        ans.sort();
        ans
    }

    /// Human-readable dump for the debug request.
    pub fn dump(&self) -> String {
        let mut ans = String::new();
        for name in self.names() {
            ans += &format!("{}\n",name);
            for entry in self.get(name) {
                ans += &format!("    {} line {} ({})\n",entry.uri,entry.rng.start.line,entry.kind);
            }
        }
        ans
    }
}
