use super::{analyzer,pos,uri};
use super::super::navigation::{goto_definition,references};
use super::super::unnamed;

#[test]
fn anonymous_labels() {
    // S4: two anonymous labels, one backward reference in range, one
    // forward reference out of range
    let mut analyzer = analyzer(&[
        ("a.s",":\nnop\n:\njmp :-\njmp :++")
    ]);
    let table = analyzer.workspace().table(uri("a.s").as_str()).expect("no table").clone();
    assert_eq!(table.anon.defs,vec![0,2]);

    let defs = goto_definition(&mut analyzer,&uri("a.s"),&pos(3,4));
    assert_eq!(defs.len(),1);
    assert_eq!(defs[0].range.start.line,2);

    let defs = goto_definition(&mut analyzer,&uri("a.s"),&pos(4,4));
    assert!(defs.is_empty());
}

#[test]
fn anonymous_ordinal_arithmetic() {
    let mut analyzer = analyzer(&[
        ("a.s",":\n:\n:\njmp :--\njmp :-\nbne :+")
    ]);
    // :-- from line 3 skips one label upward
    let defs = goto_definition(&mut analyzer,&uri("a.s"),&pos(3,4));
    assert_eq!(defs[0].range.start.line,1);
    // :- is the label immediately previous
    let defs = goto_definition(&mut analyzer,&uri("a.s"),&pos(4,4));
    assert_eq!(defs[0].range.start.line,2);
    // :+ from below every label is out of range
    let defs = goto_definition(&mut analyzer,&uri("a.s"),&pos(5,4));
    assert!(defs.is_empty());
}

#[test]
fn anonymous_angle_bracket_synonyms() {
    let mut analyzer = analyzer(&[
        ("a.s",":\nnop\nbne :<\nbeq :>")
    ]);
    let defs = goto_definition(&mut analyzer,&uri("a.s"),&pos(2,4));
    assert_eq!(defs[0].range.start.line,0);
    // :> looks forward past the last label, nothing is there
    let defs = goto_definition(&mut analyzer,&uri("a.s"),&pos(3,4));
    assert!(defs.is_empty());
}

#[test]
fn anonymous_references_include_definition() {
    let mut analyzer = analyzer(&[
        ("a.s",":\njmp :-\njmp :-")
    ]);
    let refs = references(&mut analyzer,&uri("a.s"),&pos(1,4));
    assert_eq!(refs.len(),3);
    assert_eq!(refs[0].range.start.line,0);
    assert_eq!(refs[1].range.start.line,1);
    assert_eq!(refs[2].range.start.line,2);
}

#[test]
fn cheap_locals() {
    // S5: the same cheap name in two blocks resolves per block
    let src = "foo:\n@loop: nop\nbne @loop\nbar:\n@loop: nop\nbne @loop";
    let mut analyzer = analyzer(&[("a.s",src)]);
    let defs = goto_definition(&mut analyzer,&uri("a.s"),&pos(2,4));
    assert_eq!(defs.len(),1);
    assert_eq!(defs[0].range.start.line,1);
    let defs = goto_definition(&mut analyzer,&uri("a.s"),&pos(5,4));
    assert_eq!(defs[0].range.start.line,4);
    let refs = references(&mut analyzer,&uri("a.s"),&pos(2,4));
    assert_eq!(refs.len(),2);
    assert_eq!(refs[0].range.start.line,1);
    assert_eq!(refs[1].range.start.line,2);
}

#[test]
fn cheap_local_from_definition_site() {
    let mut analyzer = analyzer(&[
        ("a.s","foo:\n@skip: nop\nbne @skip")
    ]);
    // cursor on the defining label itself
    let refs = references(&mut analyzer,&uri("a.s"),&pos(1,2));
    assert_eq!(refs.len(),2);
}

#[test]
fn cheap_names_in_block() {
    let analyzer = analyzer(&[
        ("a.s","foo:\n@a: nop\n@b: nop\nbar:\n@c: nop")
    ]);
    let ws = analyzer.workspace();
    let doc = ws.doc(uri("a.s").as_str()).expect("no doc");
    let table = ws.table(uri("a.s").as_str()).expect("no table");
    assert_eq!(unnamed::cheap_labels_in_block(doc,table,2),vec!["@a".to_string(),"@b".to_string()]);
    assert_eq!(unnamed::cheap_labels_in_block(doc,table,4),vec!["@c".to_string()]);
}
