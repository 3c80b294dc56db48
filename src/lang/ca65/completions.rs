//! Completion provider.
//!
//! Two contexts are distinguished by where the cursor sits relative to the
//! command column.  The command context offers instruction mnemonics,
//! control commands, and the macros visible in the translation unit.  The
//! operand context offers every visible symbol, the cheap locals of the
//! enclosing code block, and the assembler's pseudo-functions and
//! pseudo-variables.
//!
//! Files outside the current translation unit are offered as auto-include
//! completions carrying a prepared `.include` edit; exported symbols that
//! are not otherwise visible are offered as auto-import completions whose
//! edit lands just after the include block.

use lsp_types as lsp;
use std::collections::HashSet;
use std::path::Path;
use crate::lang::Document;
use crate::lang::server::relative_path;
use super::analysis::Analyzer;
use super::handbook::{Handbook,PSEUDO_FUNCTIONS,PSEUDO_VARIABLES};
use super::lexer::lex_line;
use super::unnamed;
use super::Node;

pub struct CompletionProvider {
    handbook: Handbook
}

/// Locate the include block of a document: the run of `.include` lines
/// after any leading comment block.  Returns the line where the block
/// starts and every include line with its path argument.
fn include_block(doc: &Document) -> (u32,Vec<(u32,String)>) {
    let mut start = 0;
    let mut includes = Vec::new();
    let mut in_leading_comments = true;
    for (row,line) in doc.text.lines().enumerate() {
        let trimmed = line.trim();
        if in_leading_comments && (trimmed.is_empty() || trimmed.starts_with(';')) {
            start = row as u32 + 1;
            continue;
        }
        in_leading_comments = false;
        let lexed = lex_line(line);
        if lexed.command_lower() == ".include" {
            let path = lexed.args.map(|a| a.text.trim_matches('"').to_string()).unwrap_or_default();
            includes.push((row as u32,path));
        } else if !includes.is_empty() {
            break;
        } else if !trimmed.is_empty() {
            break;
        }
    }
    (start,includes)
}

impl CompletionProvider {
    pub fn new() -> Self {
        Self {
            handbook: Handbook::new()
        }
    }

    pub fn get(&mut self, analyzer: &mut Analyzer, uri: &lsp::Url, pos: &lsp::Position) -> Vec<lsp::CompletionItem> {
        if !analyzer.ready() {
            return Vec::new();
        }
        let key = uri.to_string();
        let doc = match analyzer.workspace().doc(&key) {
            Some(doc) => doc.clone(),
            None => return Vec::new()
        };
        let line = doc.line(pos.line as usize).unwrap_or_default();
        let lexed = lex_line(&line);
        let operand_ctx = match &lexed.command {
            Some(item) => (pos.character as usize) > item.offset + item.text.len(),
            None => false
        };
        match operand_ctx {
            true => self.operand_items(analyzer,&key,&doc,pos),
            false => self.command_items(analyzer,&key)
        }
    }

    fn command_items(&self, analyzer: &Analyzer, uri: &str) -> Vec<lsp::CompletionItem> {
        let mut ans = Vec::new();
        for (name,brief) in self.handbook.mnemonics() {
            ans.push(lsp::CompletionItem {
                label: name.to_string(),
                kind: Some(lsp::CompletionItemKind::KEYWORD),
                detail: Some(brief.to_string()),
                ..Default::default()
            });
        }
        for (name,brief) in self.handbook.controls() {
            ans.push(lsp::CompletionItem {
                label: name.to_string(),
                kind: Some(lsp::CompletionItemKind::KEYWORD),
                detail: Some(brief.to_string()),
                ..Default::default()
            });
        }
        let ws = analyzer.workspace();
        let mut seen = HashSet::new();
        for file in ws.includes.translation_unit(uri) {
            if let Some(table) = ws.table(&file) {
                for mac in &table.macros {
                    if seen.insert(mac.name.clone()) {
                        ans.push(lsp::CompletionItem {
                            label: mac.name.clone(),
                            kind: Some(lsp::CompletionItemKind::FUNCTION),
                            detail: Some(mac.kind.to_string()),
                            ..Default::default()
                        });
                    }
                }
            }
        }
        ans
    }

    fn operand_items(&self, analyzer: &mut Analyzer, uri: &str, doc: &Document,
        pos: &lsp::Position) -> Vec<lsp::CompletionItem> {
        let mut ans = Vec::new();
        let mut visible = HashSet::new();
        let ws = analyzer.workspace();
        let unit: HashSet<String> = ws.includes.translation_unit(uri).into_iter().collect();
        for file in &unit {
            if let Some(table) = ws.table(file) {
                for node in table.defined_nodes() {
                    let name = table.node_name(&node).to_string();
                    if matches!(node,Node::Macro(_)) || !visible.insert(name.clone()) {
                        continue;
                    }
                    let kind = match node {
                        Node::Scope(_) => lsp::CompletionItemKind::MODULE,
                        _ => lsp::CompletionItemKind::CONSTANT
                    };
                    ans.push(lsp::CompletionItem {
                        label: name,
                        kind: Some(kind),
                        detail: Some(table.node_detail(&node)),
                        ..Default::default()
                    });
                }
                for import in &table.imports {
                    if visible.insert(import.name.clone()) {
                        ans.push(lsp::CompletionItem {
                            label: import.name.clone(),
                            kind: Some(lsp::CompletionItemKind::REFERENCE),
                            detail: Some(format!("{} declaration",import.kind)),
                            ..Default::default()
                        });
                    }
                }
            }
        }
        if let Some(table) = ws.table(uri) {
            for name in unnamed::cheap_labels_in_block(doc,table,pos.line) {
                ans.push(lsp::CompletionItem {
                    label: name,
                    kind: Some(lsp::CompletionItemKind::CONSTANT),
                    detail: Some("cheap local".to_string()),
                    ..Default::default()
                });
            }
        }
        for (name,brief) in PSEUDO_FUNCTIONS {
            ans.push(lsp::CompletionItem {
                label: name.to_string(),
                kind: Some(lsp::CompletionItemKind::FUNCTION),
                detail: Some(brief.to_string()),
                ..Default::default()
            });
        }
        for (name,brief) in PSEUDO_VARIABLES {
            ans.push(lsp::CompletionItem {
                label: name.to_string(),
                kind: Some(lsp::CompletionItemKind::VARIABLE),
                detail: Some(brief.to_string()),
                ..Default::default()
            });
        }
        self.auto_include_items(analyzer,uri,doc,&unit,&mut ans);
        self.auto_import_items(analyzer,uri,doc,&visible,&mut ans);
        ans
    }

    /// Sources outside the unit whose extension is in the allow-list,
    /// offered with a prepared `.include` inserted in lexical order.
    fn auto_include_items(&self, analyzer: &Analyzer, uri: &str, doc: &Document,
        unit: &HashSet<String>, ans: &mut Vec<lsp::CompletionItem>) {
        let allowed = analyzer.settings_for(uri).auto_include_extensions.clone();
        let (block_start,includes) = include_block(doc);
        let ws = analyzer.workspace();
        for other in &ws.docs {
            let other_key = other.uri.to_string();
            if unit.contains(&other_key) {
                continue;
            }
            let ext_ok = Path::new(other.uri.path()).extension()
                .and_then(|os| os.to_str())
                .map(|ext| allowed.iter().any(|a| a.trim_start_matches('.').eq_ignore_ascii_case(ext)))
                .unwrap_or(false);
            if !ext_ok {
                continue;
            }
            let rel = match relative_path(uri,&other_key) {
                Some(rel) => rel,
                None => continue
            };
            // keep the block sorted by path argument
            let mut insert_line = match includes.is_empty() {
                true => block_start,
                false => includes.last().map(|(row,_)| row+1).unwrap_or(block_start)
            };
            for (row,path) in &includes {
                if rel < *path {
                    insert_line = *row;
                    break;
                }
            }
            let point = lsp::Position::new(insert_line,0);
            ans.push(lsp::CompletionItem {
                label: rel.clone(),
                kind: Some(lsp::CompletionItemKind::FILE),
                detail: Some("auto include".to_string()),
                additional_text_edits: Some(vec![lsp::TextEdit {
                    range: lsp::Range::new(point,point),
                    new_text: format!(".include \"{}\"\n",rel)
                }]),
                ..Default::default()
            });
        }
    }

    /// Exported names with no visible declaration here, offered with a
    /// prepared `.import` just after the include block.
    fn auto_import_items(&self, analyzer: &Analyzer, uri: &str, doc: &Document,
        visible: &HashSet<String>, ans: &mut Vec<lsp::CompletionItem>) {
        let (block_start,includes) = include_block(doc);
        let after_block = includes.last().map(|(row,_)| row+1).unwrap_or(block_start);
        let point = lsp::Position::new(after_block,0);
        let ws = analyzer.workspace();
        for name in ws.exports.names() {
            if visible.contains(name.as_str()) {
                continue;
            }
            let origin = ws.exports.get(name).first().map(|e| e.uri.clone()).unwrap_or_default();
            if origin == uri {
                continue;
            }
            ans.push(lsp::CompletionItem {
                label: name.to_string(),
                kind: Some(lsp::CompletionItemKind::REFERENCE),
                detail: Some(format!("auto import from {}",origin)),
                additional_text_edits: Some(vec![lsp::TextEdit {
                    range: lsp::Range::new(point,point),
                    new_text: format!(".import {}\n",name)
                }]),
                ..Default::default()
            });
        }
    }
}
