//! Handle incoming responses to our requests

use lsp_types as lsp;
use lsp::request::Request;
use lsp_server;
use super::{logger,schedule_diagnostics};

pub fn handle_response(connection: &lsp_server::Connection, resp: lsp_server::Response, tools: &mut super::Tools) {
    match resp.id.to_string().as_str() {
        "\"ca65-pull-config\"" => {
            match super::parse_configuration(resp) {
                Ok(config) => {
                    let mut open_docs = Vec::new();
                    if let Ok(mut analyzer) = tools.analyzer.lock() {
                        analyzer.set_config(config);
                        // scoped settings are pulled again as documents are touched
                        analyzer.clear_doc_settings();
                        for doc in &analyzer.workspace().docs {
                            open_docs.push((doc.uri.clone(),doc.version));
                        }
                    }
                    // hints may render differently under the new settings
                    let req = lsp_server::Request::new(
                        lsp_server::RequestId::from("ca65-refresh-hints".to_string()),
                        lsp::request::InlayHintRefreshRequest::METHOD.to_string(),
                        serde_json::Value::Null
                    );
                    if let Err(_) = connection.sender.send(req.into()) {
                        logger(&connection,"could not request inlay hint refresh");
                    }
                    for (uri,version) in open_docs {
                        schedule_diagnostics(tools,uri,version);
                    }
                },
                Err(_) => logger(&connection,"could not parse config")
            }
        },
        "\"ca65-reg-config\"" | "\"ca65-refresh-hints\"" => {},
        s => {
            logger(&connection,&format!("unhandled response: {}",s))
        }
    }
}
