//! This is the ca65 language server.
//! Cargo will compile this to a standalone executable.
//!
//! The ca65kit library crate provides all of the analysis.
//! The server activity is all in this file and its submodules.

use lsp_types as lsp;
use lsp::notification::Notification;
use lsp::request::Request;
use lsp_server;
use serde_json;
use std::collections::VecDeque;
use std::error::Error;
use std::sync::atomic::Ordering;
use std::sync::{Arc,Mutex};
use ca65kit::lang::ca65;
use ca65kit::lang::ca65::analysis::Analyzer;
use ca65kit::lang::ca65::diagnostics::{Debouncer,DiagnosticRunner,NoAssembler};

mod notification;
mod request;
mod response;

const DIAG_DEBOUNCE_MILLIS: u64 = 300;

// JSON-RPC error codes; are they defined somewhere else?
// -32768 through -32000 are reserved
mod rpc_error {
    pub const PARSE_ERROR: i32 = -32700;
}

#[derive(thiserror::Error,Debug)]
enum ServerError {
    #[error("Parsing")]
    Parsing
}

struct DiagnosticsResult {
    token: u64,
    uri: lsp::Url,
    version: Option<i32>,
    sets: Vec<(lsp::Url,Vec<lsp::Diagnostic>)>
}

struct Tools {
    analyzer: Arc<Mutex<Analyzer>>,
    hover_provider: ca65::hovers::HoverProvider,
    completion_provider: ca65::completions::CompletionProvider,
    debouncer: Debouncer,
    diag_threads: VecDeque<std::thread::JoinHandle<Option<DiagnosticsResult>>>
}

impl Tools {
    pub fn new() -> Self {
        Self {
            analyzer: Arc::new(Mutex::new(Analyzer::new())),
            hover_provider: ca65::hovers::HoverProvider::new(),
            completion_provider: ca65::completions::CompletionProvider::new(),
            debouncer: Debouncer::new(DIAG_DEBOUNCE_MILLIS),
            diag_threads: VecDeque::new()
        }
    }
}

/// Send log messages to the client.
fn logger(connection: &lsp_server::Connection, message: &str) {
    let note = lsp_server::Notification::new(
        lsp::notification::LogMessage::METHOD.to_string(),
        lsp::LogMessageParams {
            typ: lsp::MessageType::LOG,
            message: message.to_string()
        }
    );
    match connection.sender.send(lsp_server::Message::Notification(note)) {
        Err(_) => {}, // nowhere to send log, what can we do about it?
        Ok(()) => {}
    }
}

/// request the root configuration item
fn request_configuration(connection: &lsp_server::Connection) -> Result<(),Box<dyn Error>> {
    let req = lsp_server::Request::new(
        lsp_server::RequestId::from("ca65-pull-config".to_string()),
        lsp::request::WorkspaceConfiguration::METHOD.to_string(),
        lsp::ConfigurationParams { items: vec![
            lsp::ConfigurationItem {
                scope_uri: None,
                section: Some("ca65".to_string())
            }
        ]}
    );
    match connection.sender.send(req.into()) {
        Ok(()) => Ok(()),
        Err(e) => Err(Box::new(e))
    }
}

/// parse the response to the configuration request
fn parse_configuration(resp: lsp_server::Response) -> Result<ca65::settings::Settings,Box<dyn Error>> {
    if let Some(result) = resp.result {
        if let Some(ary) = result.as_array() {
            // this loop always exits in the first iteration, we only requested 1 item
            for item in ary {
                let json_config = item.to_string();
                match ca65::settings::parse(&json_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => return Err(e)
                }
            }
        }
    }
    Err(Box::new(ServerError::Parsing))
}

/// Diagnostics are never requested by the client.
/// This server pushes them up after a debounced background pass, which in
/// turn is triggered by document changes.
pub fn push_diagnostics(connection: &lsp_server::Connection, uri: lsp::Url, version: Option<i32>,
    diagnostics: Vec<lsp::Diagnostic>) {
    let note = lsp_server::Notification::new(
        "textDocument/publishDiagnostics".to_string(),
        lsp::PublishDiagnosticsParams {
            uri,
            diagnostics,
            version
        }
    );
    match connection.sender.send(lsp_server::Message::Notification(note)) {
        Err(_) => logger(connection,"could not push diagnostics"),
        Ok(()) => {}
    }
}

/// Launch a debounced diagnostic pass over the closure of `uri`.  The pass
/// aborts without side effects when a newer edit supersedes it.
fn schedule_diagnostics(tools: &mut Tools, uri: lsp::Url, version: Option<i32>) {
    let (token,abort) = tools.debouncer.schedule(uri.as_str());
    let delay = tools.debouncer.delay();
    let analyzer = Arc::clone(&tools.analyzer);
    let handle = std::thread::spawn(move || {
        std::thread::sleep(delay);
        if abort.load(Ordering::Relaxed) {
            return None;
        }
        let mut guard = match analyzer.lock() {
            Ok(guard) => guard,
            Err(_) => return None
        };
        let key = uri.to_string();
        let settings = guard.settings_for(&key).clone();
        let roots = guard.root_files_for(&key);
        // the external assembler is a collaborator behind DiagnosticRunner;
        // the stock build analyzes without one
        let external = match NoAssembler.run(&roots,&settings,Arc::clone(&abort)) {
            Ok(map) => map,
            Err(e) => {
                log::error!("diagnostic runner failed: {}",e);
                return None;
            }
        };
        let mut sets = Vec::new();
        for file in guard.translation_unit(&key) {
            let existing = external.get(&file).cloned().unwrap_or_default();
            let mut diags = existing.clone();
            diags.append(&mut ca65::diagnostics::unused_symbols(&mut guard,&file,&existing));
            if let Ok(parsed) = lsp::Url::parse(&file) {
                sets.push((parsed,diags));
            }
        }
        if abort.load(Ordering::Relaxed) {
            return None;
        }
        Some(DiagnosticsResult { token, uri, version, sets })
    });
    tools.diag_threads.push_back(handle);
}

fn main() -> Result<(), Box<dyn Error + Sync + Send>> {

    ca65kit::lang::server::ServerOptions::from_args().init_logging();

    let mut tools = Tools::new();
    let (connection, io_threads) = lsp_server::Connection::stdio();

    logger(&connection,"start initializing connection");
    let (id,params) = connection.initialize_start()?;
    let params: lsp::InitializeParams = serde_json::from_value(params)?;

    let result = lsp::InitializeResult {
        capabilities: lsp::ServerCapabilities {
            text_document_sync: Some(lsp::TextDocumentSyncCapability::Options(
                lsp::TextDocumentSyncOptions {
                    open_close: Some(true),
                    change: Some(lsp::TextDocumentSyncKind::FULL),
                    will_save: None,
                    will_save_wait_until: None,
                    save: None
                }
            )),
            definition_provider: Some(lsp::OneOf::Left(true)),
            references_provider: Some(lsp::OneOf::Left(true)),
            rename_provider: Some(lsp::OneOf::Left(true)),
            hover_provider: Some(lsp::HoverProviderCapability::Simple(true)),
            completion_provider: Some(lsp::CompletionOptions {
                resolve_provider: Some(false),
                trigger_characters: Some([":",".","@","#","("].iter().map(|trig| trig.to_string()).collect()),
                ..lsp::CompletionOptions::default()
            }),
            document_symbol_provider: Some(lsp::OneOf::Left(true)),
            workspace_symbol_provider: Some(lsp::OneOf::Left(true)),
            folding_range_provider: Some(lsp::FoldingRangeProviderCapability::Simple(true)),
            document_link_provider: Some(lsp::DocumentLinkOptions {
                resolve_provider: Some(false),
                work_done_progress_options: lsp::WorkDoneProgressOptions::default()
            }),
            document_highlight_provider: Some(lsp::OneOf::Left(true)),
            inlay_hint_provider: Some(lsp::OneOf::Left(true)),
            call_hierarchy_provider: Some(lsp::CallHierarchyServerCapability::Simple(true)),
            ..lsp::ServerCapabilities::default()
        },
        server_info: Some(lsp::ServerInfo {
            name: "ca65".to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string())
        })
    };
    connection.initialize_finish(id, serde_json::to_value(result)?)?;
    logger(&connection,"connection initialized");

    // registrations
    let mut registrations: Vec<lsp::Registration> = Vec::new();
    if let Some(workspace) = params.capabilities.workspace {
        if let Some(config) = workspace.configuration {
            if config {
                registrations.push(lsp::Registration {
                    id: "pull-config".to_string(),
                    method: lsp::notification::DidChangeConfiguration::METHOD.to_string(),
                    register_options: None
                });
            }
        }
    }
    let req = lsp_server::Request::new(
        lsp_server::RequestId::from("ca65-reg-config".to_string()),
        lsp::request::RegisterCapability::METHOD.to_string(),
        lsp::RegistrationParams { registrations });
    if let Err(_) = connection.sender.send(req.into()) {
        logger(&connection,"could not register change configuration capability");
    }

    // Starting configuration
    match request_configuration(&connection) {
        Ok(()) => {},
        Err(_) => logger(&connection,"could not request starting configuration")
    }

    // Initial workspace scan; queries block on the analyzer mutex until
    // the two-pass scan completes and the initialization gate opens.
    if let Some(folders) = params.workspace_folders {
        let source_dirs = folders.iter().map(|f| f.uri.clone()).collect::<Vec<lsp::Url>>();
        tools.hover_provider.set_workspace_folder(source_dirs.clone());
        if let Ok(mut mutex) = tools.analyzer.lock() {
            match mutex.init_workspace(source_dirs, Vec::new()) {
                Ok(()) => {},
                Err(e) => logger(&connection,&format!("initial workspace scan failed: {}",e))
            }
        }
    }

    // Main loop
    while let Ok(msg) = connection.receiver.recv() {

        // Gather data from finished diagnostic passes; stale tokens were
        // superseded by a newer edit and must not publish.
        if let Some(oldest) = tools.diag_threads.front() {
            if oldest.is_finished() {
                let done = tools.diag_threads.pop_front().unwrap();
                if let Ok(Some(result)) = done.join() {
                    if tools.debouncer.is_current(result.uri.as_str(),result.token) {
                        for (uri,diagnostics) in result.sets {
                            let version = match uri == result.uri {
                                true => result.version,
                                false => None
                            };
                            push_diagnostics(&connection,uri,version,diagnostics);
                        }
                    }
                }
            }
        }

        // Handle messages from the client
        match msg {
            lsp_server::Message::Notification(note) => {
                notification::handle_notification(&connection,note,&mut tools);
            }
            lsp_server::Message::Request(req) => {
                if request::handle_request(&connection, req, &mut tools) {
                    break;
                }
            },
            lsp_server::Message::Response(resp) => {
                response::handle_response(&connection, resp, &mut tools);
            }
        }
    }

    io_threads.join()?;
    Ok(())
}
