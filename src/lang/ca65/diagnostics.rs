//! Diagnostics support.
//!
//! The analysis core produces exactly one diagnostic family itself: the
//! unused-symbol hints.  Everything else comes from the external assembler
//! through the `DiagnosticRunner` interface, which is deliberately thin:
//! the core hands over the root files of the edited unit, the runner hands
//! back diagnostics per file, and an abort flag lets a superseded run die
//! without side effects.
//!
//! The debouncer serializes runs per file: scheduling a new run hands out
//! a fresh token and raises the abort flag of the previous one.

use lsp_types as lsp;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool,Ordering};
use std::time::Duration;
use crate::DYNERR;
use super::analysis::Analyzer;
use super::navigation::entity_references;
use super::settings::Settings;
use super::{is_synthetic,Entity};

/// Codes attached to the diagnostics passing through this engine.  The
/// core produces only `UnusedSymbol`; runner implementations tag what the
/// assembler reported with `AssemblerReport`.
#[derive(Clone,Copy,PartialEq,Eq,Debug)]
pub enum DiagnosticCode {
    UnusedSymbol,
    AssemblerReport
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self,f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnusedSymbol => write!(f,"unused-symbol"),
            Self::AssemblerReport => write!(f,"assembler-report")
        }
    }
}

/// Build a diagnostic carrying this engine's source and code.  Unused
/// symbols additionally get the tag that lets clients dim the span.
pub fn code_diag(range: lsp::Range, code: DiagnosticCode, mess: &str,
    severity: lsp::DiagnosticSeverity) -> lsp::Diagnostic {
    lsp::Diagnostic {
        range,
        severity: Some(severity),
        code: Some(lsp::NumberOrString::String(code.to_string())),
        code_description: None,
        source: Some("ca65kit".to_string()),
        message: mess.to_string(),
        related_information: None,
        tags: match code {
            DiagnosticCode::UnusedSymbol => Some(vec![lsp::DiagnosticTag::UNNECESSARY]),
            _ => None
        },
        data: None
    }
}

/// Contract for the external diagnostic collaborator.  `roots` are the
/// master files whose assembly covers the edited unit.  An implementation
/// must poll `abort` at its I/O points and return without effect once it
/// is raised.
pub trait DiagnosticRunner {
    fn run(&self, roots: &[String], settings: &Settings,
        abort: Arc<AtomicBool>) -> Result<HashMap<String,Vec<lsp::Diagnostic>>,DYNERR>;
}

/// Placeholder runner for configurations without an assembler.
pub struct NoAssembler;

impl DiagnosticRunner for NoAssembler {
    fn run(&self, _roots: &[String], _settings: &Settings,
        _abort: Arc<AtomicBool>) -> Result<HashMap<String,Vec<lsp::Diagnostic>>,DYNERR> {
        Ok(HashMap::new())
    }
}

/// Per-file debounce and cancellation bookkeeping.
pub struct Debouncer {
    delay: Duration,
    running: HashMap<String,(u64,Arc<AtomicBool>)>,
    serial: u64
}

impl Debouncer {
    pub fn new(millis: u64) -> Self {
        Self {
            delay: Duration::from_millis(millis),
            running: HashMap::new(),
            serial: 0
        }
    }
    pub fn delay(&self) -> Duration {
        self.delay
    }
    /// Abort any in-flight run for the file and hand out a fresh token
    /// with its abort flag.
    pub fn schedule(&mut self, uri: &str) -> (u64,Arc<AtomicBool>) {
        self.serial += 1;
        let flag = Arc::new(AtomicBool::new(false));
        if let Some((_,old)) = self.running.insert(uri.to_string(),(self.serial,Arc::clone(&flag))) {
            old.store(true,Ordering::Relaxed);
        }
        (self.serial,flag)
    }
    /// A run may only publish when its token is still the latest.
    pub fn is_current(&self, uri: &str, token: u64) -> bool {
        match self.running.get(uri) {
            Some((current,_)) => *current == token,
            None => false
        }
    }
}

/// Unused-symbol hints for one file.  A defined entity is unused when no
/// resolution in its translation-unit closure lands on it apart from the
/// definition itself.  Lines that already carry a diagnostic are skipped,
/// and synthetic names never count.
pub fn unused_symbols(analyzer: &mut Analyzer, uri: &str,
    existing: &Vec<lsp::Diagnostic>) -> Vec<lsp::Diagnostic> {
    if !analyzer.ready() || !analyzer.settings_for(uri).enable_unused_symbol_diagnostics {
        return Vec::new();
    }
    let nodes = match analyzer.workspace().table(uri) {
        Some(table) => table.defined_nodes(),
        None => return Vec::new()
    };
    let mut ans = Vec::new();
    for node in nodes {
        let (name,rng) = match analyzer.workspace().table(uri) {
            Some(table) => (table.node_name(&node).to_string(),table.node_range(&node)),
            None => break
        };
        if is_synthetic(&name) {
            continue;
        }
        if existing.iter().any(|d| d.range.start.line == rng.start.line) {
            continue;
        }
        let entity = Entity::new(uri,node);
        let closure = analyzer.translation_unit(uri);
        let refs: Vec<lsp::Location> = entity_references(analyzer,&entity).into_iter()
            .filter(|loc| closure.contains(&loc.uri.to_string()))
            .collect();
        if refs.len() <= 1 {
            ans.push(code_diag(rng,DiagnosticCode::UnusedSymbol,
                &format!("{} is never referenced",name),lsp::DiagnosticSeverity::HINT));
        }
    }
    ans
}
