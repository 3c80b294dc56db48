//! Document scanner.
//!
//! A single forward pass over the lines of one document, producing that
//! document's `SymbolTable`.  The scanner maintains the current scope, the
//! current macro, the current segment, and the most recent label (whose
//! kind may still be refined by the next control command).
//!
//! No cross-file state is consulted here; include arguments are recorded
//! as written and resolved later when the table is integrated into the
//! workspace.

use lsp_types as lsp;
use regex::Regex;
use crate::lang::{Document,line_range};
use super::arguments::{ArgGroup,ArgParser};
use super::lexer::{lex_line,is_identifier,is_identifier_char,is_identifier_start,LexedLine,LineItem};
use super::handbook::Handbook;
use super::{ExportKind,ImportKind,IncludeRef,MacroKind,Node,RefContext,Reference,
    ScopeHandle,ScopeKind,SymbolKind,SymbolTable,ROOT_SCOPE,
    DEFAULT_SEGMENT,opaque_segment,synthetic_scope_name};

const RCH: &str = "unreachable was reached";

/// Directives that refine a pending label to `res-label`.
const RES_REFINERS: [&str;2] = [".res",".tag"];
/// Directives that refine a pending label to `data-label`.
const DATA_REFINERS: [&str;9] = [".addr",".align",".bankbytes",".byt",".byte",".dbyt",".dword",".faraddr",".word"];
/// Shorthand segment directives.
const SEGMENT_SHORTHANDS: [&str;5] = [".code",".data",".bss",".zeropage",".rodata"];
/// Single letters that name registers in operand position, never symbols.
const REGISTERS: [&str;4] = ["a","x","y","s"];

pub struct Scanner {
    parser: ArgParser,
    handbook: Handbook,
    anon_ref_patt: Regex,
    const_patt: Regex,
    var_patt: Regex,
    string_patt: Regex,
    // per-scan state
    scope: ScopeHandle,
    in_macro: bool,
    /// macro that receives the end span on close, absent for duplicates
    macro_body: Option<usize>,
    segment: String,
    label: Option<usize>,
    pending_kind: bool,
    row: u32
}

impl Scanner {
    pub fn new() -> Self {
        Self {
            parser: ArgParser::new(),
            handbook: Handbook::new(),
            anon_ref_patt: Regex::new(r":[-+<>]+").expect(RCH),
            const_patt: Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*:?=\s*(\S.*)$").expect(RCH),
            var_patt: Regex::new(r"(?i)^\s*([A-Za-z_][A-Za-z0-9_]*)\s+\.set\s+(\S.*)$").expect(RCH),
            string_patt: Regex::new(r#""([^"]*)""#).expect(RCH),
            scope: ROOT_SCOPE,
            in_macro: false,
            macro_body: None,
            segment: DEFAULT_SEGMENT.to_string(),
            label: None,
            pending_kind: false,
            row: 0
        }
    }

    /// Scan the whole document into a fresh symbol table.
    pub fn scan(&mut self, doc: &Document) -> SymbolTable {
        let mut table = SymbolTable::new(doc.uri.as_str());
        self.scope = ROOT_SCOPE;
        self.in_macro = false;
        self.macro_body = None;
        self.segment = DEFAULT_SEGMENT.to_string();
        self.label = None;
        self.pending_kind = false;
        self.row = 0;
        for line in doc.text.lines() {
            self.scan_line(&mut table,line);
            self.row += 1;
        }
        table.lines = self.row;
        let eof = lsp::Position::new(self.row,0);
        // close everything still open, extending spans to EOF
        if let Some(idx) = self.macro_body.take() {
            table.macros[idx].body.end = eof;
        }
        let mut curr = self.scope;
        loop {
            table.scopes[curr].body.end = eof;
            match table.scopes[curr].parent {
                Some(parent) => curr = parent,
                None => break
            }
        }
        table
    }

    fn scan_line(&mut self, table: &mut SymbolTable, line: &str) {
        let lexed = lex_line(line);
        self.record_anonymous_refs(table,line,&lexed);
        if self.macro_line(table,&lexed) {
            return;
        }
        if self.record_line(table,&lexed) {
            return;
        }
        if self.enum_line(table,&lexed) {
            return;
        }
        if self.assignment_line(table,line,&lexed) {
            return;
        }
        self.generic_line(table,&lexed);
    }

    /// Record references written as `:+`, `:-`, `:<<`, etc.  The target
    /// ordinal is relative to the last anonymous label at or above this
    /// line; a lone `-` means that label itself, further `-` go upward,
    /// `+` go downward.
    fn record_anonymous_refs(&mut self, table: &mut SymbolTable, line: &str, lexed: &LexedLine) {
        let end = match &lexed.comment {
            Some(item) => item.offset,
            None => line.len()
        };
        let code = &line[0..end];
        for m in self.anon_ref_patt.find_iter(code) {
            let tok = &code[m.start()+1..m.end()];
            let fwd = tok.chars().filter(|c| *c=='+' || *c=='>').count() as isize;
            let back = tok.chars().filter(|c| *c=='-' || *c=='<').count() as isize;
            let mut offset = fwd - back;
            if back > 0 {
                offset += 1;
            }
            let target = table.anon.defs.len() as isize - 1 + offset;
            if target >= 0 {
                table.anon.refs.entry(target as usize).or_default()
                    .push(line_range(self.row,m.start(),m.end()));
            }
        }
    }

    /// Lines inside a macro body are still lexed and their references are
    /// recorded, but they never alter scopes or symbols.
    fn macro_line(&mut self, table: &mut SymbolTable, lexed: &LexedLine) -> bool {
        if !self.in_macro {
            return false;
        }
        let cmd = lexed.command_lower();
        if cmd == ".endmacro" || cmd == ".endmac" {
            if let Some(idx) = self.macro_body.take() {
                let item = lexed.command.as_ref().expect(RCH);
                table.macros[idx].body.end = lsp::Position::new(self.row,(item.offset+item.text.len()) as u32);
            }
            self.in_macro = false;
            return true;
        }
        if let Some(args) = &lexed.args {
            let groups = self.parser.parse(&args.text,args.offset);
            self.push_group_refs(table,&groups,None);
        }
        true
    }

    /// Member lines of a `.struct` or `.union` body.
    fn record_line(&mut self, table: &mut SymbolTable, lexed: &LexedLine) -> bool {
        let kind = table.scopes[self.scope].kind;
        if kind != ScopeKind::Struct && kind != ScopeKind::Union {
            return false;
        }
        let cmd = lexed.command_lower();
        match cmd.as_str() {
            ".endstruct" if kind == ScopeKind::Struct => {
                self.close_scope(table,lexed);
                return true;
            },
            ".endunion" if kind == ScopeKind::Union => {
                self.close_scope(table,lexed);
                return true;
            },
            ".struct" => {
                self.open_scope(table,lexed,ScopeKind::Struct);
                return true;
            },
            ".union" => {
                self.open_scope(table,lexed,ScopeKind::Union);
                return true;
            },
            ".tag" => {
                // a labeled .tag line is a member of the tagged struct's size
                if let Some(item) = &lexed.label {
                    if is_identifier(&item.text) {
                        let rng = line_range(self.row,item.offset,item.offset+item.text.len());
                        table.add_symbol(&item.text,SymbolKind::StructMember,self.scope,rng,None);
                        self.push_def_ref(table,&item.text,RefContext::Symbol,rng);
                    }
                }
                self.push_tag_refs(table,lexed);
                return true;
            },
            _ => {}
        }
        // a member line: the name is the first word, the storage directive
        // follows in the argument field
        let name = match (&lexed.label,&lexed.command) {
            (Some(item),_) if is_identifier(&item.text) => item.clone(),
            (None,Some(item)) if is_identifier(&item.text) => item.clone(),
            _ => return true
        };
        let rng = line_range(self.row,name.offset,name.offset+name.text.len());
        table.add_symbol(&name.text,SymbolKind::StructMember,self.scope,rng,None);
        self.push_def_ref(table,&name.text,RefContext::Symbol,rng);
        if let Some(args) = &lexed.args {
            // a member declared with .tag references the named struct
            let inner = lex_line(&format!("{}{}"," ".repeat(args.offset),args.text));
            if inner.command_lower() == ".tag" {
                if let Some(tag_args) = inner.args {
                    let groups = self.parser.parse(&tag_args.text,tag_args.offset);
                    self.push_scope_ctx_refs(table,&groups);
                }
            }
        }
        true
    }

    /// Member lines of an `.enum` body.
    fn enum_line(&mut self, table: &mut SymbolTable, lexed: &LexedLine) -> bool {
        if table.scopes[self.scope].kind != ScopeKind::Enum {
            return false;
        }
        let cmd = lexed.command_lower();
        if cmd == ".endenum" {
            self.close_scope(table,lexed);
            return true;
        }
        let name = match (&lexed.label,&lexed.command) {
            (Some(item),_) if is_identifier(&item.text) => item.clone(),
            (None,Some(item)) if is_identifier(&item.text) => item.clone(),
            _ => return true
        };
        let rng = line_range(self.row,name.offset,name.offset+name.text.len());
        table.add_symbol(&name.text,SymbolKind::EnumMember,self.scope,rng,None);
        self.push_def_ref(table,&name.text,RefContext::Symbol,rng);
        if let Some(args) = &lexed.args {
            let groups = self.parser.parse(&args.text,args.offset);
            self.push_group_refs(table,&groups,None);
        }
        true
    }

    /// `name = expr` and `name .set expr` lines.
    fn assignment_line(&mut self, table: &mut SymbolTable, line: &str, lexed: &LexedLine) -> bool {
        let end = match &lexed.comment {
            Some(item) => item.offset,
            None => line.len()
        };
        let code = &line[0..end];
        let (patt,kind) = match self.var_patt.is_match(code) {
            true => (&self.var_patt,SymbolKind::Variable),
            false => match self.const_patt.is_match(code) {
                true => (&self.const_patt,SymbolKind::Constant),
                false => return false
            }
        };
        let cap = patt.captures(code).expect(RCH);
        let name = cap.get(1).expect(RCH);
        let rng = line_range(self.row,name.start(),name.end());
        table.add_symbol(name.as_str(),kind,self.scope,rng,None);
        self.push_def_ref(table,name.as_str(),RefContext::Symbol,rng);
        if let Some(expr) = cap.get(2) {
            let groups = self.parser.parse(expr.as_str(),expr.start());
            self.push_group_refs(table,&groups,None);
        }
        true
    }

    /// Everything else: labels, control commands, instructions, macro calls.
    fn generic_line(&mut self, table: &mut SymbolTable, lexed: &LexedLine) {
        if let Some(item) = &lexed.label {
            if item.text.is_empty() {
                // bare `:` defines the next anonymous label
                let rng = line_range(self.row,item.offset,item.offset+1);
                table.anon.defs.push(self.row);
                table.anon.refs.entry(table.anon.defs.len()-1).or_default().push(rng);
            } else if item.text.starts_with('@') {
                // cheap locals are resolved on demand, not stored
            } else {
                let rng = line_range(self.row,item.offset,item.offset+item.text.len());
                let idx = table.add_symbol(&item.text,SymbolKind::Label,self.scope,rng,Some(self.segment.clone()));
                self.push_def_ref(table,&item.text,RefContext::Symbol,rng);
                table.boundaries.push(self.row);
                self.label = Some(idx);
                self.pending_kind = true;
            }
        }
        let cmd = match &lexed.command {
            Some(item) => item,
            None => return
        };
        let lower = cmd.text.to_lowercase();
        if lower.starts_with('.') {
            self.refine_label(table,&lower);
        }
        match lower.as_str() {
            ".proc" => { self.open_scope(table,lexed,ScopeKind::Proc); },
            ".scope" => { self.open_scope(table,lexed,ScopeKind::Scope); },
            ".struct" => { self.open_scope(table,lexed,ScopeKind::Struct); },
            ".union" => { self.open_scope(table,lexed,ScopeKind::Union); },
            ".enum" => { self.open_scope(table,lexed,ScopeKind::Enum); },
            ".endproc" if table.scopes[self.scope].kind == ScopeKind::Proc => self.close_scope(table,lexed),
            ".endscope" if table.scopes[self.scope].kind == ScopeKind::Scope => self.close_scope(table,lexed),
            // a mismatched .end* is the assembler's problem, not ours
            ".endproc" | ".endscope" | ".endstruct" | ".endunion" | ".endenum" => {},
            ".macro" | ".mac" => self.open_macro(table,lexed,MacroKind::Macro),
            ".define" => self.open_macro(table,lexed,MacroKind::Define),
            ".endmacro" | ".endmac" => {},
            ".segment" => {
                if let Some(args) = &lexed.args {
                    if let Some(cap) = self.string_patt.captures(&args.text) {
                        self.segment = cap.get(1).expect(RCH).as_str().to_string();
                    }
                }
            },
            _ if SEGMENT_SHORTHANDS.contains(&lower.as_str()) => {
                self.segment = lower[1..].to_uppercase();
            },
            ".import" | ".importzp" => self.declare(table,lexed,Some(ImportKind::Import),None,zp_spec(&lower)),
            ".export" | ".exportzp" => self.declare(table,lexed,None,Some(ExportKind::Export),zp_spec(&lower)),
            ".global" | ".globalzp" => self.declare(table,lexed,Some(ImportKind::Global),Some(ExportKind::Global),zp_spec(&lower)),
            ".include" => {
                self.push_include(table,lexed,false);
                self.segment = opaque_segment(self.row);
            },
            ".incbin" => {
                self.push_include(table,lexed,true);
            },
            ".tag" => self.push_tag_refs(table,lexed),
            _ => {
                let caller = match lower.as_str() {
                    "jsr" | "jmp" => self.current_caller(table),
                    _ => None
                };
                if !lower.starts_with('.') && !self.handbook.is_mnemonic(&lower) && is_identifier(&cmd.text) {
                    // not an instruction, not a control command: a macro call
                    let rng = line_range(self.row,cmd.offset,cmd.offset+cmd.text.len());
                    table.references.push(Reference {
                        name: cmd.text.clone(),
                        qualifiers: Vec::new(),
                        ctx: RefContext::Macro,
                        rng,
                        scope: self.scope,
                        caller: None
                    });
                }
                if let Some(args) = &lexed.args {
                    let groups = self.parser.parse(&args.text,args.offset);
                    self.push_group_refs(table,&groups,caller);
                }
            }
        }
    }

    /// One-shot kind refinement of the most recent label by the first
    /// control command that follows it.
    fn refine_label(&mut self, table: &mut SymbolTable, lower: &str) {
        if !self.pending_kind {
            return;
        }
        self.pending_kind = false;
        let idx = match self.label {
            Some(idx) => idx,
            None => return
        };
        if RES_REFINERS.contains(&lower) {
            table.symbols[idx].kind = SymbolKind::ResLabel;
        } else if DATA_REFINERS.contains(&lower) {
            table.symbols[idx].kind = SymbolKind::DataLabel;
        } else if lower == ".asciiz" {
            table.symbols[idx].kind = SymbolKind::StringLabel;
        }
    }

    fn current_caller(&self, table: &SymbolTable) -> Option<Node> {
        if let Some(idx) = self.label {
            return Some(Node::Symbol(idx));
        }
        if table.scopes[self.scope].kind == ScopeKind::Proc {
            return Some(Node::Scope(self.scope));
        }
        None
    }

    fn open_scope(&mut self, table: &mut SymbolTable, lexed: &LexedLine, kind: ScopeKind) -> ScopeHandle {
        let cmd = lexed.command.as_ref().expect(RCH);
        let name = lexed.args.as_ref().and_then(leading_identifier);
        let (name_txt,name_rng) = match &name {
            Some(item) => (item.text.clone(),line_range(self.row,item.offset,item.offset+item.text.len())),
            None => (synthetic_scope_name(self.row),line_range(self.row,cmd.offset,cmd.offset+cmd.text.len()))
        };
        let segment = match kind {
            ScopeKind::Proc => Some(self.segment.clone()),
            _ => None
        };
        let handle = table.add_scope(&name_txt,kind,self.scope,name_rng,segment);
        if name.is_some() {
            self.push_def_ref(table,&name_txt,RefContext::Scope,name_rng);
        }
        if matches!(kind,ScopeKind::Proc | ScopeKind::Struct | ScopeKind::Union) {
            table.boundaries.push(self.row);
        }
        self.scope = handle;
        self.label = None;
        self.pending_kind = false;
        handle
    }

    fn close_scope(&mut self, table: &mut SymbolTable, lexed: &LexedLine) {
        let parent = match table.scopes[self.scope].parent {
            Some(parent) => parent,
            None => return
        };
        let cmd = lexed.command.as_ref().expect(RCH);
        table.scopes[self.scope].body.end = lsp::Position::new(self.row,(cmd.offset+cmd.text.len()) as u32);
        self.scope = parent;
        self.label = None;
        self.pending_kind = false;
    }

    fn open_macro(&mut self, table: &mut SymbolTable, lexed: &LexedLine, kind: MacroKind) {
        let item = match lexed.args.as_ref().and_then(leading_identifier) {
            Some(item) => item,
            None => return
        };
        let rng = line_range(self.row,item.offset,item.offset+item.text.len());
        let first = table.macro_by_name(&item.text).is_none();
        let idx = table.add_macro(&item.text,kind,rng);
        if first {
            self.push_def_ref(table,&item.text,RefContext::Macro,rng);
        }
        if kind == MacroKind::Macro {
            self.in_macro = true;
            self.macro_body = match first {
                true => Some(idx),
                false => None
            };
        }
    }

    /// Per comma-separated item, create the requested import and/or export
    /// in the current scope.  An export with an assigned value additionally
    /// defines a constant.
    fn declare(&mut self, table: &mut SymbolTable, lexed: &LexedLine,
        import: Option<ImportKind>, export: Option<ExportKind>, addr_size: Option<String>) {
        let args = match &lexed.args {
            Some(args) => args,
            None => return
        };
        for item in self.parser.parse_import_export(&args.text,args.offset) {
            let rng = line_range(self.row,item.offset,item.offset+item.name.len());
            let spec = item.addr_size.clone().or(addr_size.clone());
            if let Some(kind) = import {
                table.add_import(&item.name,kind,self.scope,rng,spec.clone());
            }
            if let Some(kind) = export {
                table.add_export(&item.name,kind,self.scope,rng,item.value.clone());
                self.push_def_ref(table,&item.name,RefContext::Symbol,rng);
                if item.value.is_some() && kind == ExportKind::Export {
                    table.add_symbol(&item.name,SymbolKind::Constant,self.scope,rng,None);
                }
            }
        }
    }

    fn push_include(&mut self, table: &mut SymbolTable, lexed: &LexedLine, binary: bool) {
        let args = match &lexed.args {
            Some(args) => args,
            None => return
        };
        if let Some(cap) = self.string_patt.captures(&args.text) {
            let inner = cap.get(1).expect(RCH);
            table.include_args.push(IncludeRef {
                path: inner.as_str().to_string(),
                rng: line_range(self.row,args.offset+inner.start(),args.offset+inner.end()),
                binary
            });
        }
    }

    /// `.tag` references a struct scope.
    fn push_tag_refs(&mut self, table: &mut SymbolTable, lexed: &LexedLine) {
        if let Some(args) = &lexed.args {
            let groups = self.parser.parse(&args.text,args.offset);
            self.push_scope_ctx_refs(table,&groups);
        }
    }

    fn push_scope_ctx_refs(&mut self, table: &mut SymbolTable, groups: &Vec<ArgGroup>) {
        let mut retagged = groups.clone();
        for group in &mut retagged {
            if let Some(last) = group.tokens.last_mut() {
                if last.ctx == RefContext::Symbol {
                    last.ctx = RefContext::Scope;
                }
            }
        }
        self.push_group_refs(table,&retagged,None);
    }

    /// Emit one reference per named token of each group; qualifier tokens
    /// carry the `scope` context, the final token carries the group's.
    fn push_group_refs(&mut self, table: &mut SymbolTable, groups: &Vec<ArgGroup>, caller: Option<Node>) {
        for group in groups {
            for (i,tok) in group.tokens.iter().enumerate() {
                if tok.text.is_empty() {
                    continue;
                }
                if group.tokens.len() == 1 && tok.text.len() == 1
                    && REGISTERS.contains(&tok.text.to_lowercase().as_str()) {
                    continue;
                }
                table.references.push(Reference {
                    name: tok.text.clone(),
                    qualifiers: group.tokens[0..i].iter().map(|t| t.text.clone()).collect(),
                    ctx: tok.ctx,
                    rng: line_range(self.row,tok.offset,tok.offset+tok.text.len()),
                    scope: self.scope,
                    caller: caller.clone()
                });
            }
        }
    }

    /// A definition site contributes a reference to itself, so reference
    /// sets and unused counts include the defining span.
    fn push_def_ref(&mut self, table: &mut SymbolTable, name: &str, ctx: RefContext, rng: lsp::Range) {
        table.references.push(Reference {
            name: name.to_string(),
            qualifiers: Vec::new(),
            ctx,
            rng,
            scope: self.scope,
            caller: None
        });
    }
}

fn zp_spec(lower: &str) -> Option<String> {
    match lower.ends_with("zp") {
        true => Some("zeropage".to_string()),
        false => None
    }
}

/// The identifier at the head of an argument item, e.g. the name in
/// `.macro name arg1,arg2` or `.define NAME(x) ...`.
fn leading_identifier(args: &LineItem) -> Option<LineItem> {
    let mut len = 0;
    for (i,c) in args.text.char_indices() {
        if i == 0 && !is_identifier_start(c) {
            return None;
        }
        if !is_identifier_char(c) && i > 0 {
            break;
        }
        len = i + c.len_utf8();
    }
    match len {
        0 => None,
        _ => Some(LineItem { text: args.text[0..len].to_string(), offset: args.offset })
    }
}
