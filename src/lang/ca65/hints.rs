//! Inlay hints.
//!
//! Anonymous-label constructs are annotated with their ordinal (`L1`,
//! `L2`, ...), so `:--` can be read without counting colons.  Import
//! declarations that resolve to another file are annotated with the
//! file the definition comes from.

use lsp_types as lsp;
use crate::lang::range_contains_pos;
use crate::lang::server::relative_path;
use super::analysis::Analyzer;

pub fn inlay_hints(analyzer: &mut Analyzer, uri: &lsp::Url, rng: &lsp::Range) -> Vec<lsp::InlayHint> {
    if !analyzer.ready() {
        return Vec::new();
    }
    let key = uri.to_string();
    let settings = analyzer.settings_for(&key);
    let want_anon = settings.anonymous_label_index_hints;
    let want_import = settings.import_from_hints;
    let mut ans = Vec::new();
    let (ws,resolver) = analyzer.parts();
    let table = match ws.table(&key) {
        Some(table) => table,
        None => return ans
    };
    if want_anon {
        for (ordinal,spans) in &table.anon.refs {
            if *ordinal >= table.anon.defs.len() {
                continue;
            }
            for span in spans {
                if range_contains_pos(rng,&span.start) {
                    ans.push(lsp::InlayHint {
                        position: span.start,
                        label: lsp::InlayHintLabel::String(format!("L{}",ordinal+1)),
                        kind: None,
                        text_edits: None,
                        tooltip: None,
                        padding_left: None,
                        padding_right: Some(true),
                        data: None
                    });
                }
            }
        }
    }
    if want_import {
        for import in &table.imports {
            if !range_contains_pos(rng,&import.rng.start) {
                continue;
            }
            if let Some(entity) = resolver.resolve_export_name(ws,&key,&import.name) {
                if entity.uri != key {
                    if let Some(rel) = relative_path(&key,&entity.uri) {
                        ans.push(lsp::InlayHint {
                            position: import.rng.end,
                            label: lsp::InlayHintLabel::String(format!(" from {}",rel)),
                            kind: None,
                            text_edits: None,
                            tooltip: None,
                            padding_left: None,
                            padding_right: None,
                            data: None
                        });
                    }
                }
            }
        }
    }
    ans.sort_by_key(|h| (h.position.line,h.position.character));
    ans
}
