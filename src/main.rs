//! # Command Line Interface
//!
//! The CLI drives the same analyzer the language server uses.  `verify`
//! checks a source against its workspace and prints diagnostics with
//! squiggles, `dump` prints the internal state of the engine for
//! debugging.

use clap::{arg,Command};
use env_logger;
use std::io::Read;
use std::path::Path;
use lsp_types as lsp;
use ca65kit::lang;
use ca65kit::lang::ca65::analysis::Analyzer;
use ca65kit::lang::ca65::diagnostics;

const RCH: &str = "unreachable was reached";

/// Gather program lines from the console, panics if stdin is not the console
fn line_entry(prompt: &str) -> String {
    use std::io::Write;
    let mut code = String::new();
    eprintln!("line entry interface");
    eprintln!("this is a blind accumulation of lines, `bye` terminates");
    loop {
        eprint!("{} ",prompt);
        let mut line = String::new();
        std::io::stderr().flush().expect("could not flush stderr");
        std::io::stdin().read_line(&mut line).expect("could not read stdin");
        if line=="bye\n" || line=="bye\r\n" {
            break;
        }
        code += &line;
    }
    code
}

fn workspace_dirs(maybe: Option<&str>) -> Vec<lsp::Url> {
    let mut ans = Vec::new();
    if let Some(dir) = maybe {
        if let Ok(canon) = Path::new(dir).canonicalize() {
            if let Ok(uri) = lsp::Url::from_directory_path(canon) {
                ans.push(uri);
            }
        }
    }
    ans
}

fn main() -> Result<(),Box<dyn std::error::Error>>
{
    env_logger::init();
    let long_help =
"ca65kit analyzes ca65 assembly source.
Set RUST_LOG environment variable to control logging level.
  levels: trace,debug,info,warn,error

Examples:
---------
check a file:            `ca65kit verify -f src/main.s -w src`
check the pipeline:      `cat main.s | ca65kit verify`
inspect the engine:      `ca65kit dump -w src -t exports`";

    let dump_types = ["tables","includes","exports","stats"];

    let matches = Command::new("ca65kit")
        .about("Analyzes ca65 assembly source, with workspace comprehension.")
        .after_long_help(long_help)
        .subcommand(Command::new("verify")
            .arg(arg!(-f --file <PATH> "source file to check").required(false))
            .arg(arg!(-w --workspace <DIR> "workspace root").required(false))
            .about("analyze a file and print diagnostics"))
        .subcommand(Command::new("dump")
            .arg(arg!(-w --workspace <DIR> "workspace root"))
            .arg(arg!(-t --type <TYPE> "what to dump").possible_values(dump_types))
            .about("scan a workspace and print engine state"))
        .get_matches();

    if let Some(cmd) = matches.subcommand_matches("verify") {
        let mut analyzer = Analyzer::new();
        let dirs = workspace_dirs(cmd.value_of("workspace"));
        let doc = match cmd.value_of("file") {
            Some(path) => lang::Document::from_file_path(&Path::new(path).canonicalize()?)?,
            None => {
                let mut raw = String::new();
                if atty::is(atty::Stream::Stdin) {
                    raw = line_entry(">");
                } else {
                    std::io::stdin().read_to_string(&mut raw)?;
                }
                lang::Document::from_string(raw,0)
            }
        };
        analyzer.init_workspace(dirs,vec![doc.clone()])?;
        analyzer.update_document(&doc);
        let diag_set = diagnostics::unused_symbols(&mut analyzer,doc.uri.as_str(),&Vec::new());
        for diag in &diag_set {
            lang::eprint_diagnostic(diag,&doc.text);
        }
        eprintln!("{} diagnostics",diag_set.len());
        return Ok(());
    }

    if let Some(cmd) = matches.subcommand_matches("dump") {
        let mut analyzer = Analyzer::new();
        let dirs = workspace_dirs(cmd.value_of("workspace"));
        analyzer.init_workspace(dirs,Vec::new())?;
        let ans = match cmd.value_of("type").expect(RCH) {
            "tables" => analyzer.dump_symbol_tables(),
            "includes" => analyzer.dump_includes_graph(),
            "exports" => analyzer.dump_exports_map(),
            "stats" => analyzer.dump_performance_stats(),
            _ => panic!("{}",RCH)
        };
        println!("{}",ans);
        return Ok(());
    }

    eprintln!("try `ca65kit --help`");
    Ok(())
}
