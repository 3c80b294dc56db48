use lsp_types as lsp;
use super::{analyzer,pos,uri};
use super::super::navigation::{highlights,references,rename};
use super::super::{completions,diagnostics,hierarchy,hints,hovers,links,outline};

#[test]
fn rename_edits_every_reference() {
    let mut analyzer = analyzer(&[
        ("lib.s",".export bar\n.proc bar\nrts\n.endproc"),
        ("main.s",".import bar\njsr bar")
    ]);
    let changes = rename(&mut analyzer,&uri("main.s"),&pos(1,4),"qux");
    let lib_edits = changes.get(&uri("lib.s")).expect("no lib edits");
    assert_eq!(lib_edits.len(),2);
    assert!(lib_edits.iter().all(|e| e.new_text=="qux"));
    let main_edits = changes.get(&uri("main.s")).expect("no main edits");
    // the import declaration is not part of the reference set
    assert_eq!(main_edits.len(),1);
    assert_eq!(main_edits[0].range.start.line,1);
    let patched = crate::lang::apply_edits(".import bar\njsr bar",main_edits).expect("bad edits");
    assert_eq!(patched,".import bar\njsr qux");
}

#[test]
fn rename_skips_anonymous() {
    let mut analyzer = analyzer(&[("a.s",":\njmp :-")]);
    assert!(rename(&mut analyzer,&uri("a.s"),&pos(1,4),"named").is_empty());
}

#[test]
fn highlights_stay_in_file() {
    let mut analyzer = analyzer(&[
        ("lib.s",".export bar\n.proc bar\nrts\n.endproc"),
        ("main.s",".import bar\njsr bar\njsr bar")
    ]);
    let marks = highlights(&mut analyzer,&uri("main.s"),&pos(1,4));
    assert_eq!(marks.len(),2);
    assert!(marks.iter().all(|m| m.range.start.line >= 1));
}

#[test]
fn unused_symbols() {
    let mut analyzer = analyzer(&[
        ("a.s",".proc used\nrts\n.endproc\n.proc dead\nrts\n.endproc\njsr used")
    ]);
    let diags = diagnostics::unused_symbols(&mut analyzer,uri("a.s").as_str(),&Vec::new());
    assert_eq!(diags.len(),1);
    assert_eq!(diags[0].range.start.line,3);
    assert_eq!(diags[0].severity,Some(lsp::DiagnosticSeverity::HINT));
}

#[test]
fn exported_symbols_are_not_unused() {
    let mut analyzer = analyzer(&[
        ("a.s",".export api\n.proc api\nrts\n.endproc")
    ]);
    let diags = diagnostics::unused_symbols(&mut analyzer,uri("a.s").as_str(),&Vec::new());
    assert!(diags.is_empty());
}

#[test]
fn unused_respects_other_diagnostics() {
    let mut analyzer = analyzer(&[("a.s","dead:\nrts")]);
    let existing = vec![diagnostics::code_diag(
        lsp::Range::new(pos(0,0),pos(0,4)),diagnostics::DiagnosticCode::AssemblerReport,
        "already flagged",lsp::DiagnosticSeverity::ERROR)];
    assert!(diagnostics::unused_symbols(&mut analyzer,uri("a.s").as_str(),&existing).is_empty());
    assert_eq!(diagnostics::unused_symbols(&mut analyzer,uri("a.s").as_str(),&Vec::new()).len(),1);
}

#[test]
fn unused_sees_uses_across_the_unit() {
    let mut analyzer = analyzer(&[
        ("root.s",".include \"head.inc\"\njsr foo"),
        ("head.inc",".proc foo\nrts\n.endproc")
    ]);
    let diags = diagnostics::unused_symbols(&mut analyzer,uri("head.inc").as_str(),&Vec::new());
    assert!(diags.is_empty());
}

#[test]
fn call_hierarchy() {
    // S1 expectations plus a real caller chain
    let mut analyzer = analyzer(&[
        ("a.s",".proc a\njsr b\n.endproc\n.proc b\nrts\n.endproc\njsr a")
    ]);
    let item_b = hierarchy::prepare(&mut analyzer,&uri("a.s"),&pos(3,6)).expect("no item");
    assert_eq!(item_b.name,"b");
    let incoming = hierarchy::incoming(&mut analyzer,&item_b);
    assert_eq!(incoming.len(),1);
    assert_eq!(incoming[0].from.name,"a");
    assert_eq!(incoming[0].from_ranges[0].start.line,1);

    let item_a = hierarchy::prepare(&mut analyzer,&uri("a.s"),&pos(0,6)).expect("no item");
    let outgoing = hierarchy::outgoing(&mut analyzer,&item_a);
    assert_eq!(outgoing.len(),1);
    assert_eq!(outgoing[0].to.name,"b");
    // the jsr at the root has no enclosing proc or label
    let incoming_a = hierarchy::incoming(&mut analyzer,&item_a);
    assert!(incoming_a.is_empty());
    let outgoing_b = hierarchy::outgoing(&mut analyzer,&item_b);
    assert!(outgoing_b.is_empty());
}

#[test]
fn label_as_caller() {
    let mut analyzer = analyzer(&[
        ("a.s","start:\njsr sub\nsub:\nrts")
    ]);
    let item = hierarchy::prepare(&mut analyzer,&uri("a.s"),&pos(2,1)).expect("no item");
    let incoming = hierarchy::incoming(&mut analyzer,&item);
    assert_eq!(incoming.len(),1);
    assert_eq!(incoming[0].from.name,"start");
}

#[test]
fn document_symbols_nest() {
    let analyzer = analyzer(&[
        ("a.s",".scope Gfx\n.proc draw\nrts\n.endproc\nWIDTH = 32\n.endscope\n.macro pushall\n.endmacro")
    ]);
    let symbols = outline::document_symbols(&analyzer,&uri("a.s"));
    assert_eq!(symbols.len(),2);
    assert_eq!(symbols[0].name,"Gfx");
    let children = symbols[0].children.as_ref().expect("no children");
    assert_eq!(children.len(),2);
    assert_eq!(children[0].name,"draw");
    assert_eq!(children[0].kind,lsp::SymbolKind::FUNCTION);
    assert_eq!(children[1].name,"WIDTH");
    assert_eq!(symbols[1].name,"pushall");
}

#[test]
fn workspace_symbols_filter() {
    let analyzer = analyzer(&[
        ("a.s","reset:\nrts"),
        ("b.s",".proc restart\nrts\n.endproc\ndone:")
    ]);
    let found = outline::workspace_symbols(&analyzer,"res");
    let names: Vec<&str> = found.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names,vec!["reset","restart"]);
    assert_eq!(outline::workspace_symbols(&analyzer,"zzz").len(),0);
}

#[test]
fn folding() {
    let mut analyzer = analyzer(&[
        ("a.s",".proc foo\nrts\n.endproc\n.macro m\nnop\n.endmacro")
    ]);
    let folds = outline::folding_ranges(&analyzer,&uri("a.s"));
    assert_eq!(folds.len(),2);
    assert_eq!(folds[0].start_line,0);
    assert_eq!(folds[0].end_line,2);
    assert_eq!(folds[1].start_line,3);
    assert_eq!(folds[1].end_line,5);
    // smart folding off leaves folding to the client
    let mut config = super::super::settings::Settings::new();
    config.smart_folding = false;
    analyzer.set_config(config);
    assert!(outline::folding_ranges(&analyzer,&uri("a.s")).is_empty());
}

#[test]
fn completion_contexts() {
    let mut analyzer = analyzer(&[
        ("a.s",".macro pushall\n.endmacro\ntable:\n@near: lda table\nld")
    ]);
    let mut provider = completions::CompletionProvider::new();
    // cursor at the end of a half-typed command
    let items = provider.get(&mut analyzer,&uri("a.s"),&pos(4,2));
    let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
    assert!(labels.contains(&"lda"));
    assert!(labels.contains(&".proc"));
    assert!(labels.contains(&"pushall"));
    assert!(!labels.contains(&"table"));
    // cursor in operand position
    let items = provider.get(&mut analyzer,&uri("a.s"),&pos(3,16));
    let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
    assert!(labels.contains(&"table"));
    assert!(labels.contains(&"@near"));
    assert!(labels.contains(&".sizeof"));
    assert!(labels.contains(&"*"));
    assert!(!labels.contains(&"lda"));
}

#[test]
fn completion_auto_import() {
    let mut analyzer = analyzer(&[
        ("lib.s",".export far_away\nfar_away:\nrts"),
        ("main.s","jsr ")
    ]);
    let mut provider = completions::CompletionProvider::new();
    let items = provider.get(&mut analyzer,&uri("main.s"),&pos(0,4));
    let item = items.iter().find(|i| i.label=="far_away").expect("no auto import");
    let edits = item.additional_text_edits.as_ref().expect("no edit");
    assert_eq!(edits[0].new_text,".import far_away\n");
    assert_eq!(edits[0].range.start.line,0);
}

#[test]
fn completion_auto_include() {
    let mut analyzer = analyzer(&[
        ("main.s","; header\n.include \"a.inc\"\nlda value"),
        ("a.inc","one = 1"),
        ("b.inc","value = 2")
    ]);
    let mut provider = completions::CompletionProvider::new();
    let items = provider.get(&mut analyzer,&uri("main.s"),&pos(2,9));
    let item = items.iter().find(|i| i.label=="b.inc").expect("no auto include");
    let edits = item.additional_text_edits.as_ref().expect("no edit");
    assert_eq!(edits[0].new_text,".include \"b.inc\"\n");
    // lexical order puts b.inc after the existing a.inc include
    assert_eq!(edits[0].range.start.line,2);
}

#[test]
fn inlay_hints_for_anonymous_and_imports() {
    // S4 hint expectations
    let mut analyzer = analyzer(&[
        ("a.s",":\nnop\n:\njmp :-\njmp :++")
    ]);
    let whole = lsp::Range::new(pos(0,0),pos(100,0));
    let hints = hints::inlay_hints(&mut analyzer,&uri("a.s"),&whole);
    let texts: Vec<(u32,String)> = hints.iter().map(|h| (h.position.line,match &h.label {
        lsp::InlayHintLabel::String(s) => s.clone(),
        _ => String::new()
    })).collect();
    assert_eq!(texts,vec![
        (0,"L1".to_string()),
        (2,"L2".to_string()),
        (3,"L2".to_string())
    ]);

    let mut analyzer = super::analyzer(&[
        ("main.s",".import bar\njsr bar"),
        ("lib.s",".export bar\nbar:\nrts")
    ]);
    let hints = hints::inlay_hints(&mut analyzer,&uri("main.s"),&whole);
    assert_eq!(hints.len(),1);
    assert_eq!(hints[0].position.line,0);
    match &hints[0].label {
        lsp::InlayHintLabel::String(s) => assert_eq!(s," from lib.s"),
        _ => panic!("unexpected label form")
    }
}

#[test]
fn hint_settings_are_honored() {
    let mut analyzer = analyzer(&[("a.s",":\njmp :-")]);
    let mut config = super::super::settings::Settings::new();
    config.anonymous_label_index_hints = false;
    analyzer.set_config(config);
    let whole = lsp::Range::new(pos(0,0),pos(100,0));
    assert!(hints::inlay_hints(&mut analyzer,&uri("a.s"),&whole).is_empty());
}

#[test]
fn document_links() {
    let analyzer = analyzer(&[
        ("root.s",".include \"head.inc\"\n.include \"missing.inc\""),
        ("head.inc","foo = 1")
    ]);
    let found = links::document_links(&analyzer,&uri("root.s"));
    assert_eq!(found.len(),1);
    assert_eq!(found[0].target,Some(uri("head.inc")));
    assert_eq!(found[0].range.start.line,0);
}

#[test]
fn hover_statements_and_entities() {
    let mut analyzer = analyzer(&[
        ("a.s","; the entry point\n.proc start\nlda #0\nrts\n.endproc\njsr start")
    ]);
    let mut provider = hovers::HoverProvider::new();
    let hov = provider.get(&mut analyzer,&uri("a.s"),&pos(2,1)).expect("no hover");
    match hov.contents {
        lsp::HoverContents::Markup(markup) => assert!(markup.value.contains("load accumulator")),
        _ => panic!("unexpected hover form")
    }
    let hov = provider.get(&mut analyzer,&uri("a.s"),&pos(5,5)).expect("no hover");
    match hov.contents {
        lsp::HoverContents::Markup(markup) => {
            assert!(markup.value.contains("```"));
            assert!(markup.value.contains(".proc start"));
            assert!(markup.value.contains("; the entry point"));
        },
        _ => panic!("unexpected hover form")
    }
}

#[test]
fn dumps_are_populated() {
    let analyzer = analyzer(&[
        ("root.s",".include \"head.inc\"\n.export top\ntop:\njsr foo"),
        ("head.inc",".proc foo\nrts\n.endproc")
    ]);
    assert!(analyzer.dump_symbol_tables().contains("::foo"));
    assert!(analyzer.dump_includes_graph().contains("includes"));
    assert!(analyzer.dump_exports_map().contains("top"));
    assert!(analyzer.dump_performance_stats().contains("scans"));
}
