//! Tests of the ca65 analysis engine.
//!
//! Everything runs against in-memory documents with fabricated `file:`
//! URIs, so no fixtures are read from disk.

use lsp_types as lsp;
use crate::lang::Document;
use super::analysis::{analyzer_from_docs,Analyzer};

mod arguments_test;
mod scanner_test;
mod graph_test;
mod resolver_test;
mod unnamed_test;
mod queries_test;

pub fn uri(path: &str) -> lsp::Url {
    lsp::Url::parse(&format!("file:///proj/{}",path)).expect("could not make uri")
}

pub fn doc(path: &str, text: &str) -> Document {
    Document::new(uri(path),text.to_string())
}

pub fn analyzer(sources: &[(&str,&str)]) -> Analyzer {
    let docs = sources.iter().map(|(p,t)| doc(p,t)).collect();
    analyzer_from_docs(docs).expect("could not build analyzer")
}

pub fn pos(line: u32, character: u32) -> lsp::Position {
    lsp::Position::new(line,character)
}
