//! Analyzer orchestration.
//!
//! The `Analyzer` owns all process-global analysis state: buffered
//! documents, per-file symbol tables, the includes graph, the exports map,
//! memoized resolutions, and per-document settings.  The language server
//! and the CLI both drive it.
//!
//! Initialization is two-pass: the first pass registers every discovered
//! document with an empty table, the second scans and integrates them.
//! Only then does the initialization gate open; query providers check the
//! gate and return nothing until it does.  Scan-time resolution uses no
//! cross-file state, but the very first query may need the complete
//! include and export picture.
//!
//! On a content change the pre-edit closure is computed first, the file is
//! rescanned and re-integrated, and memos for the union of the pre- and
//! post-edit closures are invalidated.

use lsp_types as lsp;
use std::collections::{HashMap,HashSet};
use std::time::Instant;
use crate::lang::Document;
use crate::{DYNERR,STDRESULT};
use super::exports::ExportEntry;
use super::includes::IncludesGraph;
use super::exports::ExportsMap;
use super::resolver::Resolver;
use super::scanner::Scanner;
use super::settings::{self,Settings};
use super::{Entity,Reference,SymbolTable,Workspace};

const DEFAULT_EXTENSIONS: [&str;3] = ["s","asm","inc"];
const MAX_FILES: usize = 5000;

/// Counters served by the performance dump.
#[derive(Default)]
pub struct Performance {
    pub scans: u64,
    pub scan_micros: u128,
    pub integrations: u64
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            ws_folders: Vec::new(),
            docs: Vec::new(),
            tables: HashMap::new(),
            includes: IncludesGraph::new(),
            exports: ExportsMap::new()
        }
    }
    pub fn doc(&self, uri: &str) -> Option<&Document> {
        self.docs.iter().find(|d| d.uri.as_str() == uri)
    }
    pub fn update_doc(&mut self, doc: &Document) {
        for old in &mut self.docs {
            if old.uri == doc.uri {
                old.text = doc.text.clone();
                old.version = doc.version;
                return;
            }
        }
        self.docs.push(doc.clone());
    }
    pub fn remove_doc(&mut self, uri: &str) {
        self.docs.retain(|d| d.uri.as_str() != uri);
    }
    pub fn table(&self, uri: &str) -> Option<&SymbolTable> {
        self.tables.get(uri)
    }

    /// Resolve an include path argument: first against the directory of
    /// the containing file, then against the configured include
    /// directories, which may be glob patterns relative to a workspace
    /// root.  A buffered document always beats a cold filesystem probe.
    pub fn resolve_include(&self, from_uri: &str, path: &str, dirs: &[String]) -> Option<lsp::Url> {
        let mut candidates = Vec::new();
        if let Ok(from) = lsp::Url::parse(from_uri) {
            if let Ok(from_path) = from.to_file_path() {
                if let Some(parent) = from_path.parent() {
                    candidates.push(parent.join(path));
                }
            }
        }
        for dir in self.expand_dirs(dirs) {
            candidates.push(dir.join(path));
        }
        for candidate in &candidates {
            if let Ok(uri) = lsp::Url::from_file_path(candidate) {
                if self.doc(uri.as_str()).is_some() {
                    return Some(uri);
                }
            }
        }
        for candidate in &candidates {
            if candidate.is_file() {
                if let Ok(uri) = lsp::Url::from_file_path(candidate) {
                    return Some(uri);
                }
            }
        }
        None
    }

    /// Expand configured directory entries, treating each as a glob
    /// pattern relative to every workspace root (absolute patterns pass
    /// through).
    fn expand_dirs(&self, dirs: &[String]) -> Vec<std::path::PathBuf> {
        let mut ans = Vec::new();
        for dir in dirs {
            let mut patterns = Vec::new();
            if std::path::Path::new(dir).is_absolute() {
                patterns.push(dir.to_string());
            } else {
                for folder in &self.ws_folders {
                    if let Ok(base) = folder.to_file_path() {
                        if let Some(s) = base.join(dir).to_str() {
                            patterns.push(s.to_string());
                        }
                    }
                }
            }
            for patt in patterns {
                match glob::glob(&patt) {
                    Ok(paths) => {
                        for entry in paths.flatten() {
                            if entry.is_dir() {
                                ans.push(entry);
                            }
                        }
                    },
                    Err(e) => log::warn!("bad include-dir pattern {}: {}",patt,e)
                }
            }
        }
        ans
    }
}

pub struct Analyzer {
    config: Settings,
    ws: Workspace,
    resolver: Resolver,
    scanner: Scanner,
    doc_settings: HashMap<String,Settings>,
    init_done: bool,
    perf: Performance
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            config: Settings::new(),
            ws: Workspace::new(),
            resolver: Resolver::new(),
            scanner: Scanner::new(),
            doc_settings: HashMap::new(),
            init_done: false,
            perf: Performance::default()
        }
    }

    pub fn set_config(&mut self, config: Settings) {
        self.config = config;
    }
    pub fn update_config(&mut self, json_str: &str) -> STDRESULT {
        self.config = settings::parse(json_str)?;
        Ok(())
    }
    /// Record the settings scoped to one document.
    pub fn set_doc_config(&mut self, uri: &str, json_str: &str) -> STDRESULT {
        self.doc_settings.insert(uri.to_string(),settings::parse(json_str)?);
        Ok(())
    }
    /// Configuration changes clear the per-document cache; the server then
    /// pulls fresh settings as documents are touched.
    pub fn clear_doc_settings(&mut self) {
        self.doc_settings.clear();
    }
    pub fn settings_for(&self, uri: &str) -> &Settings {
        self.doc_settings.get(uri).unwrap_or(&self.config)
    }

    /// Has the two-pass workspace scan completed.
    pub fn ready(&self) -> bool {
        self.init_done
    }

    pub fn workspace(&self) -> &Workspace {
        &self.ws
    }

    /// Split borrows for query providers that iterate the workspace while
    /// resolving through the memo caches.
    pub fn parts(&mut self) -> (&Workspace,&mut Resolver) {
        (&self.ws,&mut self.resolver)
    }

    /// Resolve a reference, honoring the implicit-import setting of the
    /// file it occurs in.
    pub fn resolve(&mut self, uri: &str, reference: &Reference) -> Option<Entity> {
        let implicit = self.settings_for(uri).implicit_imports;
        self.resolver.resolve_reference(&self.ws,uri,reference,implicit)
    }

    fn extensions(&self) -> Vec<String> {
        let mut ans: Vec<String> = DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect();
        for ext in &self.config.additional_extensions {
            ans.push(ext.trim_start_matches('.').to_lowercase());
        }
        ans
    }

    /// Buffer every source in the given directories.  Nested roots are
    /// tolerated; a file is recorded once, under its deepest root.
    fn gather_docs(&mut self, dirs: &Vec<lsp::Url>, volatile_docs: Vec<Document>) -> STDRESULT {
        self.ws.ws_folders = dirs.clone();
        self.ws.docs = Vec::new();
        let extensions = self.extensions();
        let mut count = 0;
        for dir in dirs {
            let base = match dir.to_file_path() {
                Ok(b) => b,
                Err(_) => return Err(Box::new(crate::lang::Error::BadUrl))
            };
            log::debug!("scanning {}",dir.as_str());
            let patt = base.join("**").join("*");
            if let Some(globable) = patt.as_os_str().to_str() {
                if let Ok(paths) = glob::glob(globable) {
                    for entry in paths.flatten() {
                        let matches = entry.extension()
                            .and_then(|os| os.to_str())
                            .map(|ext| extensions.contains(&ext.to_lowercase()))
                            .unwrap_or(false);
                        if !matches {
                            continue;
                        }
                        if count >= MAX_FILES {
                            log::warn!("workspace exceeds {} sources, the rest are ignored",MAX_FILES);
                            break;
                        }
                        if let (Ok(uri),Ok(txt)) = (lsp::Url::from_file_path(&entry),std::fs::read_to_string(&entry)) {
                            if self.ws.doc(uri.as_str()).is_none() {
                                log::trace!("{}",uri.as_str());
                                self.ws.docs.push(Document::new(uri,txt));
                                count += 1;
                            }
                        } else {
                            log::warn!("could not read {}, treating as absent",entry.display());
                        }
                    }
                }
            } else {
                log::warn!("directory {} could not be globbed",dir.as_str());
            }
        }
        log::info!("there were {} sources in the workspace",count);
        for doc in volatile_docs {
            if self.ws.doc(doc.uri.as_str()).is_none() {
                self.ws.docs.push(doc);
            }
        }
        Ok(())
    }

    /// Analyze source directories and volatile documents that define the
    /// workspace.  First pass registers empty tables, second pass scans
    /// and integrates; the initialization gate opens at the end.
    pub fn init_workspace(&mut self, source_dirs: Vec<lsp::Url>, volatile_docs: Vec<Document>) -> STDRESULT {
        self.init_done = false;
        self.gather_docs(&source_dirs,volatile_docs)?;
        self.ws.tables.clear();
        self.ws.includes = IncludesGraph::new();
        self.ws.exports = ExportsMap::new();
        self.resolver.clear();
        for doc in &self.ws.docs {
            self.ws.tables.insert(doc.uri.to_string(),SymbolTable::new(doc.uri.as_str()));
        }
        let uris: Vec<String> = self.ws.docs.iter().map(|d| d.uri.to_string()).collect();
        for uri in uris {
            if let Some(doc) = self.ws.doc(&uri).cloned() {
                self.scan_and_integrate(&doc);
            }
        }
        self.init_done = true;
        Ok(())
    }

    fn scan_and_integrate(&mut self, doc: &Document) {
        let start = Instant::now();
        let table = self.scanner.scan(doc);
        self.perf.scans += 1;
        self.perf.scan_micros += start.elapsed().as_micros();
        self.integrate(table);
    }

    /// Install a fresh table: replace the old one atomically, rebuild the
    /// file's include edges and export entries.
    fn integrate(&mut self, table: SymbolTable) {
        let uri = table.uri.clone();
        let dirs = self.settings_for(&uri).include_dirs.clone();
        let mut edges = Vec::new();
        for inc in &table.include_args {
            if inc.binary {
                continue;
            }
            if let Some(target) = self.ws.resolve_include(&uri,&inc.path,&dirs) {
                // only buffered sources become graph edges
                if self.ws.doc(target.as_str()).is_some() {
                    edges.push(target.to_string());
                }
            }
        }
        let mut export_set = Vec::new();
        for (index,export) in table.exports.iter().enumerate() {
            export_set.push(ExportEntry {
                uri: uri.clone(),
                name: export.name.clone(),
                kind: export.kind,
                rng: export.rng,
                scope: export.scope,
                index
            });
        }
        self.ws.tables.insert(uri.clone(),table);
        self.ws.includes.update_includes(&uri,edges);
        self.ws.exports.update_exports(&uri,export_set);
        self.perf.integrations += 1;
    }

    /// Handle a content change: rescan, re-integrate, and invalidate the
    /// union of the pre- and post-edit closures.
    pub fn update_document(&mut self, doc: &Document) {
        let uri = doc.uri.to_string();
        let pre: HashSet<String> = self.ws.includes.translation_unit(&uri).into_iter().collect();
        self.ws.update_doc(doc);
        self.scan_and_integrate(doc);
        let mut closure = pre;
        for file in self.ws.includes.translation_unit(&uri) {
            closure.insert(file);
        }
        let closure: Vec<String> = closure.into_iter().collect();
        self.resolver.invalidate(&closure,&uri);
    }

    /// Handle deletion of a watched file.
    pub fn remove_document(&mut self, uri: &str) {
        let closure: Vec<String> = self.ws.includes.translation_unit(uri);
        self.ws.remove_doc(uri);
        self.ws.tables.remove(uri);
        self.ws.includes.remove_file(uri);
        self.ws.exports.remove_file(uri);
        self.doc_settings.remove(uri);
        self.resolver.invalidate(&closure,uri);
    }

    /// Files the diagnostic runner should assemble for an edit to `uri`:
    /// the roots above it, or the file itself when it has none.
    pub fn root_files_for(&self, uri: &str) -> Vec<String> {
        self.ws.includes.roots_of(uri)
    }

    pub fn translation_unit(&self, uri: &str) -> Vec<String> {
        self.ws.includes.translation_unit(uri)
    }

    pub fn dump_symbol_tables(&self) -> String {
        let mut ans = String::new();
        let mut uris: Vec<&String> = self.ws.tables.keys().collect();
        uris.sort();
        for uri in uris {
            let table = &self.ws.tables[uri];
            ans += &format!("{}\n",uri);
            for node in table.defined_nodes() {
                let rng = table.node_range(&node);
                ans += &format!("    {} {} line {}",
                    table.node_detail(&node),table.qualified_name(&node),rng.start.line);
                if let Some(seg) = table.node_segment(&node) {
                    ans += &format!(" [{}]",seg);
                }
                ans += "\n";
            }
            for import in &table.imports {
                ans += &format!("    {} declaration {} line {}\n",import.kind,import.name,import.rng.start.line);
            }
            ans += &format!("    {} references\n",table.references.len());
        }
        ans
    }

    pub fn dump_includes_graph(&self) -> String {
        self.ws.includes.dump()
    }

    pub fn dump_exports_map(&self) -> String {
        self.ws.exports.dump()
    }

    pub fn dump_performance_stats(&self) -> String {
        let (hits,misses) = self.resolver.stats();
        let mut ans = String::new();
        ans += &format!("documents        {}\n",self.ws.docs.len());
        ans += &format!("scans            {}\n",self.perf.scans);
        ans += &format!("scan time        {} us\n",self.perf.scan_micros);
        ans += &format!("integrations     {}\n",self.perf.integrations);
        ans += &format!("resolver hits    {}\n",hits);
        ans += &format!("resolver misses  {}\n",misses);
        ans
    }
}

/// Convenience used by tests and the CLI: build an analyzer over in-memory
/// documents only.
pub fn analyzer_from_docs(docs: Vec<Document>) -> Result<Analyzer,DYNERR> {
    let mut analyzer = Analyzer::new();
    analyzer.init_workspace(Vec::new(),docs)?;
    Ok(analyzer)
}
