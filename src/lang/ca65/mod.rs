//! # ca65 analysis
//!
//! This module is used by both the CLI and the language server.
//! The parser is purpose-built: ca65 source is line oriented, so a line
//! lexer splits each line into label, command, arguments, and comment,
//! and an argument parser extracts qualified names from the argument field.
//!
//! The analyzer resolves file relationships (`.include` edges join files
//! into translation units), identifies symbols, and answers semantic
//! queries.  Assembly itself is left to the external assembler; the
//! analyzer never evaluates expressions or expands macros.
//!
//! ## Scopes
//!
//! Scopes form a tree rooted at each file's root scope, which is named by
//! the empty string.  Scopes and the entities they contain are stored in
//! per-file arenas and addressed by handles, so parent edges and back
//! references are plain indices.  The fully qualified name of an entity is
//! the `::`-joined scope stack leading to it.
//!
//! ## Duplicates
//!
//! A name may be defined more than once in a file.  Lookup returns the
//! first definition in textual order, matching the assembler's documented
//! behavior; later duplicates are not flagged here, the external assembler
//! reports them.

use lsp_types as lsp;
use std::collections::HashMap;
use std::fmt;

pub mod settings;
pub mod lexer;
pub mod arguments;
pub mod scanner;
pub mod symbols;
pub mod includes;
pub mod exports;
pub mod resolver;
pub mod unnamed;
pub mod analysis;
pub mod navigation;
pub mod hovers;
pub mod completions;
pub mod hierarchy;
pub mod outline;
pub mod hints;
pub mod links;
pub mod diagnostics;
pub mod handbook;

#[cfg(test)]
mod tests;

/// Index of a scope within a file's scope arena.
pub type ScopeHandle = usize;

/// Every file's scope arena begins with the root scope.
pub const ROOT_SCOPE: ScopeHandle = 0;

/// Name of the segment that is current at the top of every file.
pub const DEFAULT_SEGMENT: &str = "CODE";

/// Names beginning with this byte are generated internally: anonymous
/// scopes and post-include segments.  They never collide with source names
/// because `?` cannot start a ca65 identifier.
pub const SYNTHETIC_MARK: char = '?';

pub fn is_synthetic(name: &str) -> bool {
    name.starts_with(SYNTHETIC_MARK)
}

/// Synthetic name for a scope opened without a name, keyed to the source line.
pub fn synthetic_scope_name(row: u32) -> String {
    format!("?{}",row)
}

/// After an `.include` the current segment is unknowable without expanding
/// the include, so it is replaced by a synthetic tag.  Consumers must not
/// parse the form of this name.
pub fn opaque_segment(row: u32) -> String {
    format!("?seg{}",row)
}

#[derive(Clone,Copy,PartialEq,Eq,Debug)]
pub enum SymbolKind {
    Label,
    ResLabel,
    DataLabel,
    StringLabel,
    Constant,
    Variable,
    StructMember,
    EnumMember
}

#[derive(Clone,Copy,PartialEq,Eq,Debug)]
pub enum MacroKind {
    Macro,
    Define
}

#[derive(Clone,Copy,PartialEq,Eq,Debug)]
pub enum ImportKind {
    Import,
    Global
}

#[derive(Clone,Copy,PartialEq,Eq,Debug)]
pub enum ExportKind {
    Export,
    Global
}

#[derive(Clone,Copy,PartialEq,Eq,Debug)]
pub enum ScopeKind {
    Scope,
    Proc,
    Struct,
    Union,
    Enum
}

/// What kind of thing a reference expects to name.
#[derive(Clone,Copy,PartialEq,Eq,Debug)]
pub enum RefContext {
    Symbol,
    Scope,
    Macro,
    Sizeof
}

/// Handle to an entity within one file's symbol table.  The variant selects
/// the arena, the payload indexes into it.
#[derive(Clone,Copy,PartialEq,Eq,Hash,Debug)]
pub enum Node {
    Symbol(usize),
    Scope(ScopeHandle),
    Macro(usize),
    Import(usize),
    Export(usize)
}

/// A resolved entity: the owning file plus the node within its table.
#[derive(Clone,PartialEq,Eq,Hash,Debug)]
pub struct Entity {
    pub uri: String,
    pub node: Node
}

impl Entity {
    pub fn new(uri: &str,node: Node) -> Self {
        Self { uri: uri.to_string(), node }
    }
}

/// A named value defined in a scope.
#[derive(Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// span of the defining name token
    pub rng: lsp::Range,
    pub scope: ScopeHandle,
    pub segment: Option<String>
}

/// A named expansion template.  Macros live in a flat file-scoped namespace
/// that is visible across the translation unit; their bodies are opaque.
#[derive(Clone)]
pub struct MacroDef {
    pub name: String,
    pub kind: MacroKind,
    /// span of the defining name token
    pub rng: lsp::Range,
    /// from the `.macro` line to the closing directive or EOF
    pub body: lsp::Range
}

/// Declaration that a name originates elsewhere.  A `global` may turn out
/// to act as an export instead, resolved dynamically.
#[derive(Clone)]
pub struct Import {
    pub name: String,
    pub kind: ImportKind,
    pub rng: lsp::Range,
    pub scope: ScopeHandle,
    /// `:zeropage` and friends, kept only for display
    pub addr_size: Option<String>
}

/// Declaration that a local name is visible workspace wide.  May carry an
/// inline constant definition (`.export two = 2`).
#[derive(Clone)]
pub struct Export {
    pub name: String,
    pub kind: ExportKind,
    pub rng: lsp::Range,
    pub scope: ScopeHandle,
    pub value: Option<String>
}

/// Ordered member of a scope.  The union of symbols, child scopes, and
/// imports may hold several entries for one name; lookup takes the first,
/// which encodes the first-definition-wins policy.
#[derive(Clone,Copy)]
pub enum ScopeEntry {
    Symbol(usize),
    Child(ScopeHandle),
    Import(usize)
}

/// A named lexical container.
#[derive(Clone)]
pub struct Scope {
    pub name: String,
    pub kind: ScopeKind,
    pub parent: Option<ScopeHandle>,
    /// span of the name token, or of the opening directive for anonymous scopes
    pub name_rng: lsp::Range,
    /// from the opening directive to the matching `.end*` or EOF
    pub body: lsp::Range,
    pub segment: Option<String>,
    pub entries: Vec<ScopeEntry>
}

/// A use site.
#[derive(Clone)]
pub struct Reference {
    pub name: String,
    /// scope names preceding the base name; a leading empty string anchors
    /// the chain at the file root (the `::name` syntax)
    pub qualifiers: Vec<String>,
    pub ctx: RefContext,
    pub rng: lsp::Range,
    /// enclosing scope at the use site
    pub scope: ScopeHandle,
    /// entity issuing a `jsr`/`jmp`, when there is one
    pub caller: Option<Node>
}

/// Ordinal bookkeeping for labels written as a bare `:`.
#[derive(Clone,Default)]
pub struct AnonymousLabels {
    /// line of each anonymous label definition, ascending
    pub defs: Vec<u32>,
    /// ordinal index -> spans of references that resolve to that ordinal
    pub refs: HashMap<usize,Vec<lsp::Range>>
}

/// A raw `.include`/`.incbin` argument; resolution against the include
/// search path happens when the file is integrated into the workspace.
#[derive(Clone)]
pub struct IncludeRef {
    pub path: String,
    pub rng: lsp::Range,
    pub binary: bool
}

/// Everything the scanner learns about one file.  Replaced atomically when
/// the file is rescanned.
#[derive(Clone)]
pub struct SymbolTable {
    pub uri: String,
    pub scopes: Vec<Scope>,
    pub symbols: Vec<Symbol>,
    pub imports: Vec<Import>,
    pub exports: Vec<Export>,
    pub macros: Vec<MacroDef>,
    pub references: Vec<Reference>,
    pub anon: AnonymousLabels,
    /// cheap-local boundary lines: non-cheap label definitions and
    /// `.proc`/`.struct`/`.union` openers, ascending
    pub boundaries: Vec<u32>,
    pub include_args: Vec<IncludeRef>,
    /// line count at the time of the scan
    pub lines: u32
}

impl fmt::Display for SymbolKind {
    fn fmt(&self,f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Label => write!(f,"label"),
            Self::ResLabel => write!(f,"reserve label"),
            Self::DataLabel => write!(f,"data label"),
            Self::StringLabel => write!(f,"string label"),
            Self::Constant => write!(f,"constant"),
            Self::Variable => write!(f,"variable"),
            Self::StructMember => write!(f,"struct member"),
            Self::EnumMember => write!(f,"enum member")
        }
    }
}

impl fmt::Display for MacroKind {
    fn fmt(&self,f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Macro => write!(f,"macro"),
            Self::Define => write!(f,"define")
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self,f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scope => write!(f,"scope"),
            Self::Proc => write!(f,"proc"),
            Self::Struct => write!(f,"struct"),
            Self::Union => write!(f,"union"),
            Self::Enum => write!(f,"enum")
        }
    }
}

impl fmt::Display for ImportKind {
    fn fmt(&self,f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Import => write!(f,"import"),
            Self::Global => write!(f,"global")
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self,f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Export => write!(f,"export"),
            Self::Global => write!(f,"global")
        }
    }
}

/// The workspace: every buffered document plus the cross-file state derived
/// from them.  The scanner is the sole writer of `tables`, the orchestrator
/// in `analysis` is the sole writer of the rest.
#[derive(Clone)]
pub struct Workspace {
    pub ws_folders: Vec<lsp::Url>,
    /// array of documents in this workspace
    pub docs: Vec<super::Document>,
    /// per-file symbol tables keyed by URI string
    pub tables: HashMap<String,SymbolTable>,
    /// directed multigraph of include edges
    pub includes: includes::IncludesGraph,
    /// workspace-wide index of exported names
    pub exports: exports::ExportsMap
}
