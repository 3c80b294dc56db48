//! Symbol table operations.
//!
//! The `SymbolTable` structure itself is defined in the parent module; this
//! module implements construction during a scan, position queries, and the
//! scoped lookup walk used by the resolver.
//!
//! The lookup walk starts at a base scope and tries to descend through the
//! reference's qualifier chain; on failure it retries from the parent
//! scope, so inner scopes shadow outer ones.  A leading empty qualifier
//! (`::name`) can only be satisfied at the file root, where it is
//! truncated.

use lsp_types as lsp;
use super::{AnonymousLabels,Export,ExportKind,Import,ImportKind,MacroDef,MacroKind,Node,
    RefContext,Reference,Scope,ScopeEntry,ScopeHandle,ScopeKind,Symbol,SymbolKind,SymbolTable,
    ROOT_SCOPE,is_synthetic};
use crate::lang::range_contains_pos;

/// Outcome of a scoped lookup.  An import is only produced by the entry
/// point that allows imports.
#[derive(Clone,Copy,PartialEq,Debug)]
pub enum LookupResult {
    Symbol(usize),
    Scope(ScopeHandle),
    Import(usize)
}

impl LookupResult {
    pub fn to_node(self) -> Node {
        match self {
            Self::Symbol(i) => Node::Symbol(i),
            Self::Scope(i) => Node::Scope(i),
            Self::Import(i) => Node::Import(i)
        }
    }
}

impl SymbolTable {
    pub fn new(uri: &str) -> Self {
        let zero = lsp::Position::new(0,0);
        let root = Scope {
            name: String::new(),
            kind: ScopeKind::Scope,
            parent: None,
            name_rng: lsp::Range::new(zero,zero),
            body: lsp::Range::new(zero,zero),
            segment: None,
            entries: Vec::new()
        };
        Self {
            uri: uri.to_string(),
            scopes: vec![root],
            symbols: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            macros: Vec::new(),
            references: Vec::new(),
            anon: AnonymousLabels::default(),
            boundaries: Vec::new(),
            include_args: Vec::new(),
            lines: 0
        }
    }

    pub fn add_scope(&mut self, name: &str, kind: ScopeKind, parent: ScopeHandle,
        name_rng: lsp::Range, segment: Option<String>) -> ScopeHandle {
        let handle = self.scopes.len();
        self.scopes.push(Scope {
            name: name.to_string(),
            kind,
            parent: Some(parent),
            name_rng,
            body: lsp::Range::new(name_rng.start,name_rng.end),
            segment,
            entries: Vec::new()
        });
        self.scopes[parent].entries.push(ScopeEntry::Child(handle));
        handle
    }

    pub fn add_symbol(&mut self, name: &str, kind: SymbolKind, scope: ScopeHandle,
        rng: lsp::Range, segment: Option<String>) -> usize {
        let idx = self.symbols.len();
        self.symbols.push(Symbol {
            name: name.to_string(),
            kind,
            rng,
            scope,
            segment
        });
        self.scopes[scope].entries.push(ScopeEntry::Symbol(idx));
        idx
    }

    pub fn add_import(&mut self, name: &str, kind: ImportKind, scope: ScopeHandle,
        rng: lsp::Range, addr_size: Option<String>) -> usize {
        let idx = self.imports.len();
        self.imports.push(Import {
            name: name.to_string(),
            kind,
            rng,
            scope,
            addr_size
        });
        self.scopes[scope].entries.push(ScopeEntry::Import(idx));
        idx
    }

    pub fn add_export(&mut self, name: &str, kind: ExportKind, scope: ScopeHandle,
        rng: lsp::Range, value: Option<String>) -> usize {
        let idx = self.exports.len();
        self.exports.push(Export {
            name: name.to_string(),
            kind,
            rng,
            scope,
            value
        });
        idx
    }

    /// Macro declarations are idempotent, the first definition wins and
    /// later ones are ignored.
    pub fn add_macro(&mut self, name: &str, kind: MacroKind, rng: lsp::Range) -> usize {
        if let Some(idx) = self.macro_by_name(name) {
            return idx;
        }
        let idx = self.macros.len();
        self.macros.push(MacroDef {
            name: name.to_string(),
            kind,
            rng,
            body: rng
        });
        idx
    }

    pub fn macro_by_name(&self, name: &str) -> Option<usize> {
        self.macros.iter().position(|m| m.name == name)
    }

    /// Find the reference whose span contains the position, if any.
    pub fn find_reference_at(&self, pos: &lsp::Position) -> Option<&Reference> {
        self.references.iter().find(|r| range_contains_pos(&r.rng,pos))
    }

    /// Find the deepest scope whose body contains the position.  The root
    /// scope contains every position.
    pub fn find_scope_at(&self, pos: &lsp::Position) -> ScopeHandle {
        let mut best = ROOT_SCOPE;
        let mut best_depth = 0;
        for handle in 1..self.scopes.len() {
            if range_contains_pos(&self.scopes[handle].body,pos) {
                let depth = self.scope_depth(handle);
                if depth > best_depth {
                    best = handle;
                    best_depth = depth;
                }
            }
        }
        best
    }

    fn scope_depth(&self, mut handle: ScopeHandle) -> usize {
        let mut depth = 0;
        while let Some(parent) = self.scopes[handle].parent {
            depth += 1;
            handle = parent;
        }
        depth
    }

    /// First child scope with the given name, in insertion order.
    pub fn child_scope(&self, parent: ScopeHandle, name: &str) -> Option<ScopeHandle> {
        for entry in &self.scopes[parent].entries {
            if let ScopeEntry::Child(h) = entry {
                if self.scopes[*h].name == name {
                    return Some(*h);
                }
            }
        }
        None
    }

    fn local_symbol(&self, scope: ScopeHandle, name: &str) -> Option<usize> {
        for entry in &self.scopes[scope].entries {
            if let ScopeEntry::Symbol(i) = entry {
                if self.symbols[*i].name == name {
                    return Some(*i);
                }
            }
        }
        None
    }

    fn local_import(&self, scope: ScopeHandle, name: &str) -> Option<usize> {
        for entry in &self.scopes[scope].entries {
            if let ScopeEntry::Import(i) = entry {
                if self.imports[*i].name == name {
                    return Some(*i);
                }
            }
        }
        None
    }

    /// Descend from `base` through the qualifier chain as child scopes.
    fn descend(&self, base: ScopeHandle, qualifiers: &[String]) -> Option<ScopeHandle> {
        let mut curr = base;
        for q in qualifiers {
            curr = self.child_scope(curr,q)?;
        }
        Some(curr)
    }

    /// Scoped lookup.  Starting at `base`, descend through the qualifiers;
    /// at the terminal scope search for a child scope (when the context
    /// wants a scope, or the child is a proc, which doubles as a label),
    /// then a local symbol, then an import when `allow_imports`.  On
    /// failure retry from the parent; a leading empty qualifier is
    /// truncated at the root, which anchors `::name` chains there.
    pub fn lookup(&self, base: ScopeHandle, qualifiers: &[String], name: &str,
        ctx: RefContext, allow_imports: bool) -> Option<LookupResult> {
        let mut quals = qualifiers;
        let mut curr = base;
        loop {
            if let Some(terminal) = self.descend(curr,quals) {
                if let Some(child) = self.child_scope(terminal,name) {
                    let wants_scope = matches!(ctx,RefContext::Scope | RefContext::Sizeof);
                    if wants_scope || self.scopes[child].kind == ScopeKind::Proc {
                        return Some(LookupResult::Scope(child));
                    }
                }
                if let Some(sym) = self.local_symbol(terminal,name) {
                    return Some(LookupResult::Symbol(sym));
                }
                if allow_imports {
                    if let Some(imp) = self.local_import(terminal,name) {
                        return Some(LookupResult::Import(imp));
                    }
                }
            }
            match self.scopes[curr].parent {
                Some(parent) => curr = parent,
                None => match quals.first() {
                    Some(q) if q.is_empty() => quals = &quals[1..],
                    _ => return None
                }
            }
        }
    }

    /// Names of the scopes from the root (exclusive) down to `scope`.
    pub fn scope_stack_names(&self, scope: ScopeHandle) -> Vec<String> {
        let mut ans = Vec::new();
        let mut curr = scope;
        while let Some(parent) = self.scopes[curr].parent {
            ans.push(self.scopes[curr].name.clone());
            curr = parent;
        }
        ans.reverse();
        ans
    }

    /// `::`-joined scope stack leading to the node, prefixed with `::`.
    pub fn qualified_name(&self, node: &Node) -> String {
        let mut parts = self.scope_stack_names(self.node_scope(node));
        parts.push(self.node_name(node).to_string());
        format!("::{}",parts.join("::"))
    }

    /// Shortest qualifier chain that resolves back to the node from
    /// `from`.  If no suffix resolves and no other entity was hit, the
    /// full chain without the root anchor is returned; on a conflict the
    /// absolute `::`-prefixed form is returned.
    pub fn shortest_relative_name(&self, from: ScopeHandle, node: &Node) -> String {
        let mut parts = self.scope_stack_names(self.node_scope(node));
        parts.push(self.node_name(node).to_string());
        let ctx = match node {
            Node::Scope(_) => RefContext::Scope,
            _ => RefContext::Symbol
        };
        let mut conflict = false;
        for k in 1..=parts.len() {
            let suffix = &parts[parts.len()-k..];
            let (name,quals) = match suffix.split_last() {
                Some(split) => split,
                None => continue
            };
            match self.lookup(from,quals,name,ctx,true) {
                Some(res) if res.to_node() == *node => return suffix.join("::"),
                Some(_) => conflict = true,
                None => {}
            }
        }
        match conflict {
            true => format!("::{}",parts.join("::")),
            false => parts.join("::")
        }
    }

    pub fn node_name(&self, node: &Node) -> &str {
        match node {
            Node::Symbol(i) => &self.symbols[*i].name,
            Node::Scope(i) => &self.scopes[*i].name,
            Node::Macro(i) => &self.macros[*i].name,
            Node::Import(i) => &self.imports[*i].name,
            Node::Export(i) => &self.exports[*i].name
        }
    }

    /// Span of the defining (or declaring) name token.
    pub fn node_range(&self, node: &Node) -> lsp::Range {
        match node {
            Node::Symbol(i) => self.symbols[*i].rng,
            Node::Scope(i) => self.scopes[*i].name_rng,
            Node::Macro(i) => self.macros[*i].rng,
            Node::Import(i) => self.imports[*i].rng,
            Node::Export(i) => self.exports[*i].rng
        }
    }

    /// Scope that contains the node.  For a scope node this is its parent.
    pub fn node_scope(&self, node: &Node) -> ScopeHandle {
        match node {
            Node::Symbol(i) => self.symbols[*i].scope,
            Node::Scope(i) => self.scopes[*i].parent.unwrap_or(ROOT_SCOPE),
            Node::Macro(_) => ROOT_SCOPE,
            Node::Import(i) => self.imports[*i].scope,
            Node::Export(i) => self.exports[*i].scope
        }
    }

    pub fn node_segment(&self, node: &Node) -> Option<String> {
        match node {
            Node::Symbol(i) => self.symbols[*i].segment.clone(),
            Node::Scope(i) => self.scopes[*i].segment.clone(),
            _ => None
        }
    }

    /// Short kind string for display.
    pub fn node_detail(&self, node: &Node) -> String {
        match node {
            Node::Symbol(i) => self.symbols[*i].kind.to_string(),
            Node::Scope(i) => self.scopes[*i].kind.to_string(),
            Node::Macro(i) => self.macros[*i].kind.to_string(),
            Node::Import(i) => format!("{} declaration",self.imports[*i].kind),
            Node::Export(i) => format!("{} declaration",self.exports[*i].kind)
        }
    }

    /// All defined entities of the file: symbols, named scopes, macros.
    /// Imports and exports are declarations, not definitions.
    pub fn defined_nodes(&self) -> Vec<Node> {
        let mut ans = Vec::new();
        for i in 0..self.symbols.len() {
            ans.push(Node::Symbol(i));
        }
        for i in 1..self.scopes.len() {
            if !is_synthetic(&self.scopes[i].name) {
                ans.push(Node::Scope(i));
            }
        }
        for i in 0..self.macros.len() {
            ans.push(Node::Macro(i));
        }
        ans
    }
}
