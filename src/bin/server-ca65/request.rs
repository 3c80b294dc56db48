//! Provide our response to incoming requests

use lsp_types as lsp;
use lsp::request::Request;
use lsp_server::{Connection,RequestId};
use serde_json;
use ca65kit::lang::normalize_client_uri;
use ca65kit::lang::ca65::{completions,hierarchy,hints,links,navigation,outline};
use super::logger;
use super::rpc_error::PARSE_ERROR;

fn def_response(req_id: RequestId, meth: &str) -> lsp_server::Response {
    let mess = req_id.to_string();
    lsp_server::Response::new_err(req_id,PARSE_ERROR,format!("request {} ({}) not understood",mess,meth))
}

fn ok_or_err<T: serde::Serialize>(req_id: RequestId, mess: &str, result: T) -> lsp_server::Response {
    match serde_json::to_value(result) {
        Ok(val) => lsp_server::Response::new_ok(req_id,val),
        Err(_) => lsp_server::Response::new_err(req_id,PARSE_ERROR,mess.to_string())
    }
}

/// returns true if there was a shutdown request
pub fn handle_request(
    connection: &Connection,
    req: lsp_server::Request,
    tools: &mut super::Tools) -> bool {

    let mut resp = def_response(req.id.clone(),&req.method);

    match req.method.as_str() {
        lsp::request::GotoDefinition::METHOD => {
            if let Ok(params) = serde_json::from_value::<lsp::GotoDefinitionParams>(req.params) {
                let uri = normalize_client_uri(params.text_document_position_params.text_document.uri);
                let pos = params.text_document_position_params.position;
                if let Ok(mut analyzer) = tools.analyzer.lock() {
                    resp = ok_or_err(req.id,"definition failed while parsing",
                        navigation::goto_definition(&mut analyzer,&uri,&pos));
                }
            }
        },
        lsp::request::References::METHOD => {
            if let Ok(params) = serde_json::from_value::<lsp::ReferenceParams>(req.params) {
                let uri = normalize_client_uri(params.text_document_position.text_document.uri);
                let pos = params.text_document_position.position;
                if let Ok(mut analyzer) = tools.analyzer.lock() {
                    resp = ok_or_err(req.id,"references failed while parsing",
                        navigation::references(&mut analyzer,&uri,&pos));
                }
            }
        },
        lsp::request::Rename::METHOD => {
            if let Ok(params) = serde_json::from_value::<lsp::RenameParams>(req.params) {
                let uri = normalize_client_uri(params.text_document_position.text_document.uri);
                let pos = params.text_document_position.position;
                if let Ok(mut analyzer) = tools.analyzer.lock() {
                    let changes = navigation::rename(&mut analyzer,&uri,&pos,&params.new_name);
                    resp = ok_or_err(req.id,"rename failed while parsing",
                        lsp::WorkspaceEdit::new(changes));
                }
            }
        },
        lsp::request::DocumentHighlightRequest::METHOD => {
            if let Ok(params) = serde_json::from_value::<lsp::DocumentHighlightParams>(req.params) {
                let uri = normalize_client_uri(params.text_document_position_params.text_document.uri);
                let pos = params.text_document_position_params.position;
                if let Ok(mut analyzer) = tools.analyzer.lock() {
                    resp = ok_or_err(req.id,"highlights failed while parsing",
                        navigation::highlights(&mut analyzer,&uri,&pos));
                }
            }
        },
        lsp::request::HoverRequest::METHOD => {
            if let Ok(params) = serde_json::from_value::<lsp::HoverParams>(req.params) {
                let uri = normalize_client_uri(params.text_document_position_params.text_document.uri);
                let pos = params.text_document_position_params.position;
                if let Ok(mut analyzer) = tools.analyzer.lock() {
                    resp = match tools.hover_provider.get(&mut analyzer,&uri,&pos) {
                        Some(hover) => ok_or_err(req.id,"hover failed while parsing",hover),
                        None => lsp_server::Response::new_ok(req.id,serde_json::Value::Null)
                    };
                }
            }
        },
        lsp::request::Completion::METHOD => {
            if let Ok(params) = serde_json::from_value::<lsp::CompletionParams>(req.params) {
                let uri = normalize_client_uri(params.text_document_position.text_document.uri);
                let pos = params.text_document_position.position;
                if let Ok(mut analyzer) = tools.analyzer.lock() {
                    let list = tools.completion_provider.get(&mut analyzer,&uri,&pos);
                    resp = ok_or_err(req.id,"completion failed while parsing",
                        lsp::CompletionResponse::Array(list));
                }
            }
        },
        lsp::request::DocumentSymbolRequest::METHOD => {
            if let Ok(params) = serde_json::from_value::<lsp::DocumentSymbolParams>(req.params) {
                let uri = normalize_client_uri(params.text_document.uri);
                if let Ok(analyzer) = tools.analyzer.lock() {
                    resp = ok_or_err(req.id,"symbol request failed while parsing",
                        outline::document_symbols(&analyzer,&uri));
                }
            }
        },
        lsp::request::WorkspaceSymbolRequest::METHOD => {
            if let Ok(params) = serde_json::from_value::<lsp::WorkspaceSymbolParams>(req.params) {
                if let Ok(analyzer) = tools.analyzer.lock() {
                    resp = ok_or_err(req.id,"workspace symbols failed while parsing",
                        outline::workspace_symbols(&analyzer,&params.query));
                }
            }
        },
        lsp::request::FoldingRangeRequest::METHOD => {
            if let Ok(params) = serde_json::from_value::<lsp::FoldingRangeParams>(req.params) {
                let uri = normalize_client_uri(params.text_document.uri);
                if let Ok(analyzer) = tools.analyzer.lock() {
                    resp = ok_or_err(req.id,"folding range request failed while parsing",
                        outline::folding_ranges(&analyzer,&uri));
                }
            }
        },
        lsp::request::DocumentLinkRequest::METHOD => {
            if let Ok(params) = serde_json::from_value::<lsp::DocumentLinkParams>(req.params) {
                let uri = normalize_client_uri(params.text_document.uri);
                if let Ok(analyzer) = tools.analyzer.lock() {
                    resp = ok_or_err(req.id,"document links failed while parsing",
                        links::document_links(&analyzer,&uri));
                }
            }
        },
        lsp::request::InlayHintRequest::METHOD => {
            if let Ok(params) = serde_json::from_value::<lsp::InlayHintParams>(req.params) {
                let uri = normalize_client_uri(params.text_document.uri);
                if let Ok(mut analyzer) = tools.analyzer.lock() {
                    resp = ok_or_err(req.id,"inlay hints failed while parsing",
                        hints::inlay_hints(&mut analyzer,&uri,&params.range));
                }
            }
        },
        lsp::request::CallHierarchyPrepare::METHOD => {
            if let Ok(params) = serde_json::from_value::<lsp::CallHierarchyPrepareParams>(req.params) {
                let uri = normalize_client_uri(params.text_document_position_params.text_document.uri);
                let pos = params.text_document_position_params.position;
                if let Ok(mut analyzer) = tools.analyzer.lock() {
                    resp = match hierarchy::prepare(&mut analyzer,&uri,&pos) {
                        Some(item) => ok_or_err(req.id,"call hierarchy failed while parsing",vec![item]),
                        None => lsp_server::Response::new_ok(req.id,serde_json::Value::Null)
                    };
                }
            }
        },
        lsp::request::CallHierarchyIncomingCalls::METHOD => {
            if let Ok(params) = serde_json::from_value::<lsp::CallHierarchyIncomingCallsParams>(req.params) {
                if let Ok(mut analyzer) = tools.analyzer.lock() {
                    resp = ok_or_err(req.id,"incoming calls failed while parsing",
                        hierarchy::incoming(&mut analyzer,&params.item));
                }
            }
        },
        lsp::request::CallHierarchyOutgoingCalls::METHOD => {
            if let Ok(params) = serde_json::from_value::<lsp::CallHierarchyOutgoingCallsParams>(req.params) {
                if let Ok(mut analyzer) = tools.analyzer.lock() {
                    resp = ok_or_err(req.id,"outgoing calls failed while parsing",
                        hierarchy::outgoing(&mut analyzer,&params.item));
                }
            }
        },
        lsp::request::ExecuteCommand::METHOD => {
            if let Ok(params) = serde_json::from_value::<lsp::ExecuteCommandParams>(req.params) {
                if let Ok(analyzer) = tools.analyzer.lock() {
                    let dump = match params.command.as_str() {
                        "ca65.dumpSymbolTables" => Some(analyzer.dump_symbol_tables()),
                        "ca65.dumpIncludesGraph" => Some(analyzer.dump_includes_graph()),
                        "ca65.dumpExportsMap" => Some(analyzer.dump_exports_map()),
                        "ca65.dumpPerformanceStats" => Some(analyzer.dump_performance_stats()),
                        _ => None
                    };
                    if let Some(text) = dump {
                        resp = lsp_server::Response::new_ok(req.id,text);
                    }
                }
            }
        },
        lsp::request::Shutdown::METHOD => {
            logger(&connection,"shutdown request");
            resp = lsp_server::Response::new_ok(req.id.clone(), ());
            connection.sender.send(resp.into()).expect("failed to respond to shutdown request");
            connection.receiver.recv_timeout(std::time::Duration::from_secs(30)).expect("failure while pausing");
            return true;
        },
        _ => {}
    };

    if let Err(_) = connection.sender.send(resp.into()) {
        logger(&connection,"could not send response");
    }
    false
}
