//! # Generics for the language server
//!
//! Helpers shared between the server executable and the CLI: logging
//! options, and path display relative to the workspace.  Protocol handling
//! itself lives with the executable in `src/bin/server-ca65`.

use std::io::Write;
use std::path::{Component,PathBuf};
use std::str::FromStr;
use lsp_types as lsp;

/// Get a path relative to the workspace path for display purposes.
/// Only checks the first workspace folder.  Paths are canonicalized when
/// the filesystem allows it, so a symlinked root still matches; documents
/// that exist only in memory fall back to a lexical comparison.
/// If there is any failure we keep the whole URI string.
pub fn path_in_workspace(full: &lsp::Url, ws_folder: &Vec<lsp::Url>) -> String {
    let first = match ws_folder.first() {
        Some(folder) => folder,
        None => return full.to_string()
    };
    let (full_path,ws_path) = match (full.to_file_path(),first.to_file_path()) {
        (Ok(f),Ok(w)) => (f,w),
        _ => return full.to_string()
    };
    let full_canon = full_path.canonicalize().unwrap_or(full_path);
    let ws_canon = ws_path.canonicalize().unwrap_or(ws_path);
    match full_canon.strip_prefix(&ws_canon) {
        Ok(rel) if rel.components().count() > 0 => rel.to_string_lossy().replace('\\',"/"),
        _ => full.to_string()
    }
}

/// Path of `to` relative to the directory of `from`, with `..` components
/// as needed.  None when the URIs do not share a filesystem.
pub fn relative_path(from: &str, to: &str) -> Option<String> {
    let from_path = lsp::Url::parse(from).ok()?.to_file_path().ok()?;
    let to_path = lsp::Url::parse(to).ok()?.to_file_path().ok()?;
    let from_dir = from_path.parent()?;
    let from_parts: Vec<Component> = from_dir.components().collect();
    let to_parts: Vec<Component> = to_path.components().collect();
    let mut common = 0;
    while common < from_parts.len() && common < to_parts.len() && from_parts[common] == to_parts[common] {
        common += 1;
    }
    let mut ans = PathBuf::new();
    for _i in common..from_parts.len() {
        ans.push("..");
    }
    for part in &to_parts[common..] {
        ans.push(part);
    }
    Some(ans.to_string_lossy().replace('\\',"/"))
}

/// Server command line options.  Logging is off unless the client passes
/// `--log-level`, and always goes to a file, since stdio carries the
/// protocol.
pub struct ServerOptions {
    pub log_level: log::LevelFilter,
    pub log_file: String
}

impl ServerOptions {
    /// Parse the server's command line.  Panics on an invalid log level,
    /// there is nobody to report it to yet.
    pub fn from_args() -> Self {
        let mut ans = Self {
            log_level: log::LevelFilter::Off,
            log_file: "ca65kit_log.txt".to_string()
        };
        let mut args = std::env::args().skip(1);
        while let Some(val) = args.next() {
            match val.as_str() {
                "--log-level" => if let Some(val) = args.next() {
                    ans.log_level = log::LevelFilter::from_str(&val).expect("invalid logging filter");
                },
                "--log-file" => if let Some(val) = args.next() {
                    ans.log_file = val;
                },
                _ => {}
            }
        }
        ans
    }
    /// Route the `ca65kit` log targets to the chosen file.
    pub fn init_logging(&self) {
        if self.log_level == log::LevelFilter::Off {
            return;
        }
        let sink = Box::new(std::fs::File::create(&self.log_file).expect("failed to create log file"));
        env_logger::Builder::new()
            .format(|buf,record| writeln!(buf,"[{}] {}: {}",record.level(),record.target(),record.args()))
            .filter(Some("ca65kit"),self.log_level)
            .target(env_logger::Target::Pipe(sink))
            .init();
    }
}
