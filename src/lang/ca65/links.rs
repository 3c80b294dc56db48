//! Document links for `.include` and `.incbin` arguments that resolve
//! through the include search path.

use lsp_types as lsp;
use super::analysis::Analyzer;

pub fn document_links(analyzer: &Analyzer, uri: &lsp::Url) -> Vec<lsp::DocumentLink> {
    if !analyzer.ready() {
        return Vec::new();
    }
    let key = uri.to_string();
    let settings = analyzer.settings_for(&key);
    let include_dirs = settings.include_dirs.clone();
    let bin_dirs = settings.bin_include_dirs.clone();
    let ws = analyzer.workspace();
    let table = match ws.table(&key) {
        Some(table) => table,
        None => return Vec::new()
    };
    let mut ans = Vec::new();
    for inc in &table.include_args {
        let dirs = match inc.binary {
            true => &bin_dirs,
            false => &include_dirs
        };
        if let Some(target) = ws.resolve_include(&key,&inc.path,dirs) {
            ans.push(lsp::DocumentLink {
                range: inc.rng,
                target: Some(target),
                tooltip: None,
                data: None
            });
        }
    }
    ans
}
