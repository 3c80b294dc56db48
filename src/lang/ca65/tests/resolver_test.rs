use super::{analyzer,doc,pos,uri};
use super::super::navigation::{goto_definition,references,target_at,Target};
use super::super::{Node,RefContext,ROOT_SCOPE};

#[test]
fn local_proc() {
    // S1: definition and references of a proc in one file
    let mut analyzer = analyzer(&[
        ("a.s",".proc foo\nrts\n.endproc\njsr foo")
    ]);
    let defs = goto_definition(&mut analyzer,&uri("a.s"),&pos(3,4));
    assert_eq!(defs.len(),1);
    assert_eq!(defs[0].uri,uri("a.s"));
    assert_eq!(defs[0].range.start.line,0);
    assert_eq!(defs[0].range.start.character,6);
    assert_eq!(defs[0].range.end.character,9);
    let refs = references(&mut analyzer,&uri("a.s"),&pos(3,4));
    assert_eq!(refs.len(),2);
    assert_eq!(refs[0].range.start.line,0);
    assert_eq!(refs[1].range.start.line,3);
}

#[test]
fn export_import_linkage() {
    // S2: an import resolves through the exports map to the foreign proc
    let mut analyzer = analyzer(&[
        ("lib.s",".export bar\n.proc bar\nrts\n.endproc"),
        ("main.s",".import bar\njsr bar")
    ]);
    let defs = goto_definition(&mut analyzer,&uri("main.s"),&pos(1,4));
    assert_eq!(defs.len(),1);
    assert_eq!(defs[0].uri,uri("lib.s"));
    assert_eq!(defs[0].range.start.line,1);
    let refs = references(&mut analyzer,&uri("main.s"),&pos(1,4));
    assert_eq!(refs.len(),3);
    assert_eq!(refs[0].uri,uri("lib.s"));
    assert_eq!(refs[0].range.start.line,0); // export site
    assert_eq!(refs[1].range.start.line,1); // proc keyword
    assert_eq!(refs[2].uri,uri("main.s"));
    assert_eq!(refs[2].range.start.line,1); // call site
}

#[test]
fn implicit_imports() {
    // S2 without the declaration: the fallback kicks in only when enabled
    let sources = [
        ("lib.s",".export bar\n.proc bar\nrts\n.endproc"),
        ("main.s","jsr bar")
    ];
    let mut on = analyzer(&sources);
    let defs = goto_definition(&mut on,&uri("main.s"),&pos(0,4));
    assert_eq!(defs.len(),1);
    assert_eq!(defs[0].uri,uri("lib.s"));

    let mut off = analyzer(&sources);
    let mut config = super::super::settings::Settings::new();
    config.implicit_imports = false;
    off.set_config(config);
    let defs = goto_definition(&mut off,&uri("main.s"),&pos(0,4));
    assert!(defs.is_empty());
}

#[test]
fn include_chain() {
    // S3: definitions jump across the include edge and the closure holds
    // both files
    let mut analyzer = analyzer(&[
        ("root.s",".include \"head.inc\"\njsr foo"),
        ("head.inc",".proc foo\nrts\n.endproc")
    ]);
    let defs = goto_definition(&mut analyzer,&uri("root.s"),&pos(1,4));
    assert_eq!(defs.len(),1);
    assert_eq!(defs[0].uri,uri("head.inc"));
    assert_eq!(defs[0].range.start.line,0);
    let mut unit = analyzer.translation_unit(uri("head.inc").as_str());
    unit.sort();
    assert_eq!(unit,vec![uri("head.inc").to_string(),uri("root.s").to_string()]);
}

#[test]
fn rescan_updates_exports() {
    // S6: an edit introduces an export, reverting removes it
    let mut analyzer = analyzer(&[
        ("a.s",".import baz\njsr baz"),
        ("b.s","baz:\nrts")
    ]);
    assert!(analyzer.workspace().exports.get("baz").is_empty());
    let defs = goto_definition(&mut analyzer,&uri("a.s"),&pos(1,4));
    assert!(defs.is_empty() || defs[0].uri == uri("a.s")); // only the import itself

    analyzer.update_document(&doc("b.s",".export baz\nbaz:\nrts"));
    let stack = analyzer.workspace().exports.get("baz");
    assert_eq!(stack.len(),1);
    assert_eq!(stack[0].uri,uri("b.s").to_string());
    let defs = goto_definition(&mut analyzer,&uri("a.s"),&pos(1,4));
    assert_eq!(defs.len(),1);
    assert_eq!(defs[0].uri,uri("b.s"));
    assert_eq!(defs[0].range.start.line,1);

    analyzer.update_document(&doc("b.s","baz:\nrts"));
    assert!(analyzer.workspace().exports.get("baz").is_empty());
}

#[test]
fn qualified_references() {
    let mut analyzer = analyzer(&[
        ("a.s",".scope Gfx\n.proc draw\nrts\n.endproc\n.endscope\njsr Gfx::draw")
    ]);
    let defs = goto_definition(&mut analyzer,&uri("a.s"),&pos(5,9));
    assert_eq!(defs.len(),1);
    assert_eq!(defs[0].range.start.line,1);
    // the qualifier itself resolves to the scope
    let defs = goto_definition(&mut analyzer,&uri("a.s"),&pos(5,4));
    assert_eq!(defs.len(),1);
    assert_eq!(defs[0].range.start.line,0);
}

#[test]
fn root_anchor() {
    let mut analyzer = analyzer(&[
        ("a.s","reset:\n.scope Sys\nreset:\njmp ::reset\n.endscope")
    ]);
    let defs = goto_definition(&mut analyzer,&uri("a.s"),&pos(3,6));
    assert_eq!(defs.len(),1);
    assert_eq!(defs[0].range.start.line,0);
}

#[test]
fn inner_scope_shadows_outer() {
    let mut analyzer = analyzer(&[
        ("a.s","val = 1\n.scope S\nval = 2\nlda val\n.endscope")
    ]);
    let defs = goto_definition(&mut analyzer,&uri("a.s"),&pos(3,4));
    assert_eq!(defs.len(),1);
    assert_eq!(defs[0].range.start.line,2);
}

#[test]
fn first_definition_wins() {
    let mut analyzer = analyzer(&[
        ("a.s","dup = 1\ndup = 2\nlda dup")
    ]);
    let defs = goto_definition(&mut analyzer,&uri("a.s"),&pos(2,4));
    assert_eq!(defs.len(),1);
    assert_eq!(defs[0].range.start.line,0);
}

#[test]
fn macro_references_use_flat_namespace() {
    let mut analyzer = analyzer(&[
        ("root.s",".include \"macros.inc\"\npush16 vec"),
        ("macros.inc",".macro push16 addr\nlda addr\n.endmacro")
    ]);
    let defs = goto_definition(&mut analyzer,&uri("root.s"),&pos(1,0));
    assert_eq!(defs.len(),1);
    assert_eq!(defs[0].uri,uri("macros.inc"));
    assert_eq!(defs[0].range.start.line,0);
}

#[test]
fn sizeof_reaches_structs() {
    let mut analyzer = analyzer(&[
        ("a.s",".struct Point\nx .word\ny .word\n.endstruct\nlda #.sizeof(Point)")
    ]);
    let defs = goto_definition(&mut analyzer,&uri("a.s"),&pos(4,13));
    assert_eq!(defs.len(),1);
    assert_eq!(defs[0].range.start.line,0);
}

#[test]
fn shortest_relative_name_round_trip() {
    let mut analyzer = analyzer(&[
        ("a.s","\
.scope Gfx
.scope Sprite
HEIGHT = 8
.endscope
.endscope
.scope Sound
tick:
.endscope")
    ]);
    let table = analyzer.workspace().table(uri("a.s").as_str()).expect("no table").clone();
    let height = table.symbols.iter().position(|s| s.name=="HEIGHT").expect("no symbol");
    let node = Node::Symbol(height);
    let sprite = table.scopes.iter().position(|s| s.name=="Sprite").expect("no scope");
    let gfx = table.scopes.iter().position(|s| s.name=="Gfx").expect("no scope");
    let sound = table.scopes.iter().position(|s| s.name=="Sound").expect("no scope");
    assert_eq!(table.shortest_relative_name(sprite,&node),"HEIGHT");
    assert_eq!(table.shortest_relative_name(gfx,&node),"Sprite::HEIGHT");
    assert_eq!(table.shortest_relative_name(sound,&node),"Gfx::Sprite::HEIGHT");
    assert_eq!(table.shortest_relative_name(ROOT_SCOPE,&node),"Gfx::Sprite::HEIGHT");
    // round trip: the produced chain resolves back to the entity
    let from_sound = table.shortest_relative_name(sound,&node);
    let parts: Vec<String> = from_sound.split("::").map(|s| s.to_string()).collect();
    let (name,quals) = parts.split_last().expect("empty chain");
    let found = table.lookup(sound,quals,name,RefContext::Symbol,true).expect("no resolution");
    assert_eq!(found.to_node(),node);
}

#[test]
fn unresolved_is_silent() {
    let mut analyzer = analyzer(&[("a.s","jsr nowhere")]);
    assert!(goto_definition(&mut analyzer,&uri("a.s"),&pos(0,4)).is_empty());
    assert!(references(&mut analyzer,&uri("a.s"),&pos(0,4)).is_empty());
    assert!(target_at(&mut analyzer,&uri("a.s"),&pos(0,4)).is_none());
}

#[test]
fn import_entity_when_no_export_exists() {
    let mut analyzer = analyzer(&[("a.s",".import lone\njsr lone")]);
    match target_at(&mut analyzer,&uri("a.s"),&pos(1,4)) {
        Some(Target::Entity(entity)) => {
            assert_eq!(entity.uri,uri("a.s").to_string());
            assert!(matches!(entity.node,Node::Import(0)));
        },
        _ => panic!("expected the import declaration")
    }
}

#[test]
fn memoization_survives_unrelated_edits() {
    let mut analyzer = analyzer(&[
        ("a.s",".proc foo\nrts\n.endproc\njsr foo"),
        ("b.s","other:\nrts")
    ]);
    let first = goto_definition(&mut analyzer,&uri("a.s"),&pos(3,4));
    analyzer.update_document(&doc("b.s","other:\nnop\nrts"));
    let second = goto_definition(&mut analyzer,&uri("a.s"),&pos(3,4));
    assert_eq!(first,second);
}

#[test]
fn scope_reference_context() {
    // a scope that is not a proc is invisible to symbol-context lookups
    let mut analyzer = analyzer(&[
        ("a.s",".scope Data\n.endscope\nlda Data\n.tag Data")
    ]);
    assert!(goto_definition(&mut analyzer,&uri("a.s"),&pos(2,4)).is_empty());
    let defs = goto_definition(&mut analyzer,&uri("a.s"),&pos(3,5));
    assert_eq!(defs.len(),1);
    assert_eq!(defs[0].range.start.line,0);
}

#[test]
fn deleted_file_disappears() {
    let mut analyzer = analyzer(&[
        ("lib.s",".export bar\nbar:\nrts"),
        ("main.s",".import bar\njsr bar")
    ]);
    let defs = goto_definition(&mut analyzer,&uri("main.s"),&pos(1,4));
    assert_eq!(defs[0].uri,uri("lib.s"));
    analyzer.remove_document(uri("lib.s").as_str());
    assert!(analyzer.workspace().exports.get("bar").is_empty());
    match target_at(&mut analyzer,&uri("main.s"),&pos(1,4)) {
        Some(Target::Entity(entity)) => assert!(matches!(entity.node,Node::Import(_))),
        other => panic!("expected the bare import, got {:?}",other.is_some())
    }
}

#[test]
fn root_scope_is_present() {
    let analyzer = analyzer(&[("a.s","top:\nrts")]);
    let table = analyzer.workspace().table(uri("a.s").as_str()).expect("no table");
    assert_eq!(table.scopes[ROOT_SCOPE].name,"");
    assert!(table.scopes[ROOT_SCOPE].parent.is_none());
}
