//! Hover provider.
//!
//! Entity hovers reconstruct a code block around the definition: the
//! segment and the scope chain are prepended as directives, and any
//! comment block sitting above the definition is carried along as the
//! docstring.  A single blank line inside the comment block is tolerated,
//! and an `.export`/`.global` line between comments and definition does
//! not break the chain.
//!
//! Instruction mnemonics and control commands hover with their handbook
//! briefs.

use lsp_types as lsp;
use crate::lang::{Document,range_contains_pos};
use crate::lang::server::path_in_workspace;
use super::analysis::Analyzer;
use super::handbook::Handbook;
use super::lexer::lex_line;
use super::navigation::{target_at,Target};
use super::{is_synthetic,Entity,ScopeKind,SymbolTable,ROOT_SCOPE};

pub struct HoverProvider {
    handbook: Handbook,
    ws_folder: Vec<lsp::Url>
}

fn new_section(hov: &mut String, sec: &str) {
    if hov.len() > 0 && sec.len() > 0 {
        *hov += "\n\n---\n\n"
    }
    *hov += sec;
}

fn scope_directive(kind: ScopeKind) -> &'static str {
    match kind {
        ScopeKind::Proc => ".proc",
        ScopeKind::Scope => ".scope",
        ScopeKind::Struct => ".struct",
        ScopeKind::Union => ".union",
        ScopeKind::Enum => ".enum"
    }
}

/// Comment lines sitting above `row`, nearest last.  One blank line is
/// forgiven, and export/global declarations are looked through.
fn comment_block(doc: &Document, row: u32) -> Vec<String> {
    let mut ans = Vec::new();
    let mut gap_used = false;
    let mut curr = row;
    while curr > 0 {
        curr -= 1;
        let line = match doc.line(curr as usize) {
            Some(line) => line,
            None => break
        };
        let trimmed = line.trim();
        if trimmed.starts_with(';') {
            ans.push(line);
            continue;
        }
        if trimmed.is_empty() && !gap_used {
            gap_used = true;
            continue;
        }
        let lower = trimmed.to_lowercase();
        if lower.starts_with(".export") || lower.starts_with(".global") {
            continue;
        }
        break;
    }
    ans.reverse();
    ans
}

impl HoverProvider {
    pub fn new() -> Self {
        Self {
            handbook: Handbook::new(),
            ws_folder: Vec::new()
        }
    }
    pub fn set_workspace_folder(&mut self, uri: Vec<lsp::Url>) {
        self.ws_folder = uri;
    }

    pub fn get(&mut self, analyzer: &mut Analyzer, uri: &lsp::Url, pos: &lsp::Position) -> Option<lsp::Hover> {
        if !analyzer.ready() {
            return None;
        }
        if let Some(hov) = self.statement_hover(analyzer,uri,pos) {
            return Some(hov);
        }
        let target = target_at(analyzer,uri,pos)?;
        let rng = analyzer.workspace().table(uri.as_str())
            .and_then(|t| t.find_reference_at(pos))
            .map(|r| r.rng);
        let value = match target {
            Target::Entity(entity) => self.entity_hover(analyzer,uri,&entity)?,
            Target::Anonymous(ordinal) => {
                let table = analyzer.workspace().table(uri.as_str())?;
                match ordinal < table.anon.defs.len() {
                    true => format!("anonymous label L{}",ordinal+1),
                    false => return None
                }
            },
            Target::Cheap(name,_) => format!("cheap local `{}`, scoped to the enclosing code block",name)
        };
        Some(lsp::Hover {
            contents: lsp::HoverContents::Markup(lsp::MarkupContent {
                kind: lsp::MarkupKind::Markdown,
                value
            }),
            range: rng
        })
    }

    /// Hover over the command column: handbook briefs.
    fn statement_hover(&self, analyzer: &Analyzer, uri: &lsp::Url, pos: &lsp::Position) -> Option<lsp::Hover> {
        let doc = analyzer.workspace().doc(uri.as_str())?;
        let line = doc.line(pos.line as usize)?;
        let item = lex_line(&line).command?;
        let rng = crate::lang::line_range(pos.line,item.offset,item.offset+item.text.len());
        if !range_contains_pos(&rng,pos) {
            return None;
        }
        let lower = item.text.to_lowercase();
        let brief = match lower.starts_with('.') {
            true => self.handbook.control_brief(&lower)?,
            false => self.handbook.mnemonic_brief(&lower)?
        };
        Some(lsp::Hover {
            contents: lsp::HoverContents::Markup(lsp::MarkupContent {
                kind: lsp::MarkupKind::Markdown,
                value: format!("`{}`: {}",lower,brief)
            }),
            range: Some(rng)
        })
    }

    fn entity_hover(&self, analyzer: &Analyzer, from: &lsp::Url, entity: &Entity) -> Option<String> {
        let ws = analyzer.workspace();
        let table = ws.table(&entity.uri)?;
        let doc = ws.doc(&entity.uri)?;
        let def_rng = table.node_range(&entity.node);
        let mut code = String::new();
        if let Some(seg) = table.node_segment(&entity.node) {
            if !is_synthetic(&seg) {
                code += &format!(".segment \"{}\"\n",seg);
            }
        }
        code += &self.scope_prefix(table,entity);
        for row in def_rng.start.line..=def_rng.end.line {
            if let Some(line) = doc.line(row as usize) {
                code += &line;
                code += "\n";
            }
        }
        let mut ans = String::new();
        new_section(&mut ans,&["```\n",&code,"```\n"].concat());
        let comments = comment_block(doc,def_rng.start.line);
        if !comments.is_empty() {
            new_section(&mut ans,&comments.join("\n"));
        }
        new_section(&mut ans,&format!("{} `{}`",table.node_detail(&entity.node),table.qualified_name(&entity.node)));
        if entity.uri != from.to_string() {
            if let Ok(parsed) = lsp::Url::parse(&entity.uri) {
                new_section(&mut ans,&format!("defined in {}",path_in_workspace(&parsed,&self.ws_folder)));
            }
        }
        Some(ans)
    }

    /// Scope openers leading to the entity, outermost first.
    fn scope_prefix(&self, table: &SymbolTable, entity: &Entity) -> String {
        let mut ans = String::new();
        let mut chain = Vec::new();
        let mut curr = table.node_scope(&entity.node);
        while curr != ROOT_SCOPE {
            chain.push(curr);
            curr = match table.scopes[curr].parent {
                Some(parent) => parent,
                None => break
            };
        }
        chain.reverse();
        for handle in chain {
            let scope = &table.scopes[handle];
            if !is_synthetic(&scope.name) {
                ans += &format!("{} {}\n",scope_directive(scope.kind),scope.name);
            }
        }
        ans
    }
}
