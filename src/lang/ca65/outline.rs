//! Scope-tree walks: document symbols, workspace symbols, folding ranges.

use lsp_types as lsp;
use super::analysis::Analyzer;
use super::{is_synthetic,Node,ScopeEntry,ScopeHandle,ScopeKind,SymbolKind,SymbolTable,ROOT_SCOPE};

fn scope_symbol_kind(kind: ScopeKind) -> lsp::SymbolKind {
    match kind {
        ScopeKind::Proc => lsp::SymbolKind::FUNCTION,
        ScopeKind::Scope => lsp::SymbolKind::NAMESPACE,
        ScopeKind::Struct | ScopeKind::Union => lsp::SymbolKind::STRUCT,
        ScopeKind::Enum => lsp::SymbolKind::ENUM
    }
}

fn symbol_symbol_kind(kind: SymbolKind) -> lsp::SymbolKind {
    match kind {
        SymbolKind::Label => lsp::SymbolKind::FUNCTION,
        SymbolKind::ResLabel | SymbolKind::DataLabel => lsp::SymbolKind::FIELD,
        SymbolKind::StringLabel => lsp::SymbolKind::STRING,
        SymbolKind::Constant => lsp::SymbolKind::CONSTANT,
        SymbolKind::Variable => lsp::SymbolKind::VARIABLE,
        SymbolKind::StructMember => lsp::SymbolKind::FIELD,
        SymbolKind::EnumMember => lsp::SymbolKind::ENUM_MEMBER
    }
}

#[allow(deprecated)]
fn create_symbol(name: String, detail: Option<String>, kind: lsp::SymbolKind,
    rng: lsp::Range, selection: lsp::Range, children: Option<Vec<lsp::DocumentSymbol>>) -> lsp::DocumentSymbol {
    lsp::DocumentSymbol {
        name,
        detail,
        kind,
        range: rng,
        selection_range: selection,
        tags: None,
        children,
        deprecated: None
    }
}

fn walk_scope(table: &SymbolTable, handle: ScopeHandle) -> Vec<lsp::DocumentSymbol> {
    let mut ans = Vec::new();
    for entry in &table.scopes[handle].entries {
        match entry {
            ScopeEntry::Child(child) => {
                let scope = &table.scopes[*child];
                if is_synthetic(&scope.name) {
                    // anonymous scopes contribute their members in place
                    ans.append(&mut walk_scope(table,*child));
                } else {
                    ans.push(create_symbol(
                        scope.name.clone(),
                        Some(scope.kind.to_string()),
                        scope_symbol_kind(scope.kind),
                        scope.body,
                        scope.name_rng,
                        Some(walk_scope(table,*child))
                    ));
                }
            },
            ScopeEntry::Symbol(idx) => {
                let sym = &table.symbols[*idx];
                ans.push(create_symbol(
                    sym.name.clone(),
                    sym.segment.clone(),
                    symbol_symbol_kind(sym.kind),
                    sym.rng,
                    sym.rng,
                    None
                ));
            },
            ScopeEntry::Import(_) => {}
        }
    }
    ans
}

pub fn document_symbols(analyzer: &Analyzer, uri: &lsp::Url) -> Vec<lsp::DocumentSymbol> {
    if !analyzer.ready() {
        return Vec::new();
    }
    let table = match analyzer.workspace().table(uri.as_str()) {
        Some(table) => table,
        None => return Vec::new()
    };
    let mut ans = walk_scope(table,ROOT_SCOPE);
    for mac in &table.macros {
        ans.push(create_symbol(
            mac.name.clone(),
            Some(mac.kind.to_string()),
            lsp::SymbolKind::FUNCTION,
            mac.body,
            mac.rng,
            None
        ));
    }
    ans
}

/// Case-insensitive substring query over every file's defined entities.
#[allow(deprecated)]
pub fn workspace_symbols(analyzer: &Analyzer, query: &str) -> Vec<lsp::SymbolInformation> {
    if !analyzer.ready() {
        return Vec::new();
    }
    let needle = query.to_lowercase();
    let mut ans = Vec::new();
    for (uri,table) in &analyzer.workspace().tables {
        let parsed = match lsp::Url::parse(uri) {
            Ok(parsed) => parsed,
            Err(_) => continue
        };
        for node in table.defined_nodes() {
            let name = table.node_name(&node);
            if needle.is_empty() || name.to_lowercase().contains(&needle) {
                let kind = match &node {
                    Node::Scope(handle) => scope_symbol_kind(table.scopes[*handle].kind),
                    Node::Symbol(idx) => symbol_symbol_kind(table.symbols[*idx].kind),
                    _ => lsp::SymbolKind::FUNCTION
                };
                ans.push(lsp::SymbolInformation {
                    name: name.to_string(),
                    kind,
                    tags: None,
                    deprecated: None,
                    location: lsp::Location::new(parsed.clone(),table.node_range(&node)),
                    container_name: {
                        let stack = table.scope_stack_names(table.node_scope(&node));
                        match stack.is_empty() {
                            true => None,
                            false => Some(stack.join("::"))
                        }
                    }
                });
            }
        }
    }
    ans.sort_by_key(|s| (s.location.uri.to_string(),s.location.range.start.line));
    ans
}

/// Folding ranges from the scope tree and macro bodies.  When smart
/// folding is off the client's indentation folding takes over and nothing
/// is reported.
pub fn folding_ranges(analyzer: &Analyzer, uri: &lsp::Url) -> Vec<lsp::FoldingRange> {
    if !analyzer.ready() || !analyzer.settings_for(uri.as_str()).smart_folding {
        return Vec::new();
    }
    let table = match analyzer.workspace().table(uri.as_str()) {
        Some(table) => table,
        None => return Vec::new()
    };
    let mut ans = Vec::new();
    let mut push = |body: lsp::Range| {
        if body.end.line > body.start.line {
            ans.push(lsp::FoldingRange {
                start_line: body.start.line,
                end_line: body.end.line,
                start_character: None,
                end_character: None,
                kind: None,
                collapsed_text: None
            });
        }
    };
    for handle in 1..table.scopes.len() {
        push(table.scopes[handle].body);
    }
    for mac in &table.macros {
        push(mac.body);
    }
    ans.sort_by_key(|f| (f.start_line,f.end_line));
    ans
}
