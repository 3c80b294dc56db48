//! Handle incoming notifications

use lsp_types as lsp;
use lsp::{notification::Notification, NumberOrString};
use lsp_server;
use serde_json;
use ca65kit::lang::{normalize_client_uri,Document};
use super::{logger,schedule_diagnostics};

pub fn handle_notification(
    connection: &lsp_server::Connection,
    note: lsp_server::Notification,
    tools: &mut super::Tools) {

    match note.method.as_str() {
        lsp::notification::DidChangeConfiguration::METHOD => {
            match super::request_configuration(&connection) {
                Ok(()) => {},
                Err(_) => logger(&connection,"request for configuration failed")
            }
        },
        lsp::notification::DidOpenTextDocument::METHOD => {
            if let Ok(params) = serde_json::from_value::<lsp::DidOpenTextDocumentParams>(note.params) {
                let normalized_uri = normalize_client_uri(params.text_document.uri);
                let doc = Document {
                    uri: normalized_uri.clone(),
                    version: Some(params.text_document.version),
                    text: params.text_document.text
                };
                if let Ok(mut analyzer) = tools.analyzer.lock() {
                    analyzer.update_document(&doc);
                }
                schedule_diagnostics(tools,normalized_uri,doc.version);
            }
        },
        lsp::notification::DidChangeTextDocument::METHOD => {
            if let Ok(params) = serde_json::from_value::<lsp::DidChangeTextDocumentParams>(note.params) {
                let normalized_uri = normalize_client_uri(params.text_document.uri);
                for change in params.content_changes {
                    // we asked for full documents so expect just one iteration
                    let doc = Document {
                        uri: normalized_uri.clone(),
                        version: Some(params.text_document.version),
                        text: change.text
                    };
                    if let Ok(mut analyzer) = tools.analyzer.lock() {
                        analyzer.update_document(&doc);
                    }
                    schedule_diagnostics(tools,normalized_uri.clone(),Some(params.text_document.version));
                }
            }
        },
        lsp::notification::DidCloseTextDocument::METHOD => {
            if let Ok(params) = serde_json::from_value::<lsp::DidCloseTextDocumentParams>(note.params) {
                let normalized_uri = normalize_client_uri(params.text_document.uri);
                logger(&connection,&format!("closed {}",normalized_uri.as_str()));
            }
        },
        lsp::notification::DidChangeWatchedFiles::METHOD => {
            if let Ok(params) = serde_json::from_value::<lsp::DidChangeWatchedFilesParams>(note.params) {
                for event in params.changes {
                    let normalized_uri = normalize_client_uri(event.uri);
                    match event.typ {
                        lsp::FileChangeType::DELETED => {
                            if let Ok(mut analyzer) = tools.analyzer.lock() {
                                analyzer.remove_document(normalized_uri.as_str());
                            }
                        },
                        _ => {
                            if let Ok(path) = normalized_uri.to_file_path() {
                                if let Ok(doc) = Document::from_file_path(&path) {
                                    if let Ok(mut analyzer) = tools.analyzer.lock() {
                                        analyzer.update_document(&doc);
                                    }
                                    schedule_diagnostics(tools,normalized_uri.clone(),None);
                                }
                            }
                        }
                    }
                }
            }
        },
        lsp::notification::Cancel::METHOD => {
            if let Ok(params) = serde_json::from_value::<lsp::CancelParams>(note.params) {
                let id = match params.id {
                    NumberOrString::Number(id) => lsp_server::RequestId::from(id),
                    NumberOrString::String(s) => lsp_server::RequestId::from(s)
                };
                logger(&connection,&format!("request {} was canceled",id.to_string()));
            }
        },
        lsp::notification::SetTrace::METHOD => {
            if let Ok(_params) = serde_json::from_value::<lsp::SetTraceParams>(note.params) {
                logger(&connection,"ignoring the SetTrace notification");
            }
        },
        which_method => {
            logger(&connection,&format!("unhandled notification {}",which_method))
        }
    }
}
