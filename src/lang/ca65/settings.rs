//! Parse settings string sent by any client.
//!
//! The server will check for specific keys that may affect its operation.
//! The settings structure can then be used by the various modules.
//! Settings are also cached per document, since clients may scope the
//! configuration to a resource.

use serde_json;
use crate::DYNERR;
use crate::lang::{update_json_bool,update_json_string,update_json_vec_str};

#[derive(Clone)]
pub struct Settings {
    /// external assembler invoked by the diagnostic runner
    pub executable_path: String,
    pub enable_stderr_diagnostics: bool,
    pub enable_unused_symbol_diagnostics: bool,
    /// search path for `.include`, entries may be glob patterns
    pub include_dirs: Vec<String>,
    /// search path for `.incbin`, entries may be glob patterns
    pub bin_include_dirs: Vec<String>,
    /// extensions offered by auto-include completions
    pub auto_include_extensions: Vec<String>,
    /// extensions treated as source beyond the defaults
    pub additional_extensions: Vec<String>,
    pub anonymous_label_index_hints: bool,
    pub import_from_hints: bool,
    pub smart_folding: bool,
    pub implicit_imports: bool
}

impl Settings {
    pub fn new() -> Self {
        Self {
            executable_path: "ca65".to_string(),
            enable_stderr_diagnostics: true,
            enable_unused_symbol_diagnostics: true,
            include_dirs: Vec::new(),
            bin_include_dirs: Vec::new(),
            auto_include_extensions: vec![".inc".to_string(),".s".to_string()],
            additional_extensions: Vec::new(),
            anonymous_label_index_hints: true,
            import_from_hints: true,
            smart_folding: true,
            implicit_imports: true
        }
    }
}

pub fn parse(json: &str) -> Result<Settings,DYNERR> {
    let mut ans = Settings::new();
    if let Ok(root) = serde_json::from_str::<serde_json::Value>(json) {
        update_json_string(&root,"executablePath",&mut ans.executable_path);
        update_json_bool(&root,"enableStderrDiagnostics",&mut ans.enable_stderr_diagnostics);
        update_json_bool(&root,"enableUnusedSymbolDiagnostics",&mut ans.enable_unused_symbol_diagnostics);
        update_json_vec_str(&root,"includeDirs",&mut ans.include_dirs);
        update_json_vec_str(&root,"binIncludeDirs",&mut ans.bin_include_dirs);
        update_json_vec_str(&root,"autoIncludeExtensions",&mut ans.auto_include_extensions);
        update_json_vec_str(&root,"additionalExtensions",&mut ans.additional_extensions);
        update_json_bool(&root,"anonymousLabelIndexHints",&mut ans.anonymous_label_index_hints);
        update_json_bool(&root,"importFromHints",&mut ans.import_from_hints);
        update_json_bool(&root,"smartFolding",&mut ans.smart_folding);
        update_json_bool(&root,"implicitImports",&mut ans.implicit_imports);
    }
    Ok(ans)
}
