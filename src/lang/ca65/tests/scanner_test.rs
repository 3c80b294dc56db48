use super::super::scanner::Scanner;
use super::super::{is_synthetic,ExportKind,ImportKind,MacroKind,RefContext,ScopeKind,SymbolKind,ROOT_SCOPE};
use super::doc;

fn scan(text: &str) -> super::super::SymbolTable {
    let mut scanner = Scanner::new();
    scanner.scan(&doc("test.s",text))
}

#[test]
fn label_kinds() {
    let table = scan("\
msg:    .asciiz \"hi\"
buf:    .res 8
vec:    .word msg
plain:  lda #0
count   .set 3
speed = 2");
    assert_eq!(table.symbols.len(),6);
    assert_eq!(table.symbols[0].kind,SymbolKind::StringLabel);
    assert_eq!(table.symbols[1].kind,SymbolKind::ResLabel);
    assert_eq!(table.symbols[2].kind,SymbolKind::DataLabel);
    assert_eq!(table.symbols[3].kind,SymbolKind::Label);
    assert_eq!(table.symbols[4].kind,SymbolKind::Variable);
    assert_eq!(table.symbols[5].kind,SymbolKind::Constant);
}

#[test]
fn refinement_is_one_shot() {
    let table = scan("\
plain:
.segment \"GFX\"
.byte 0");
    // the first control command consumed the refinement window
    assert_eq!(table.symbols[0].kind,SymbolKind::Label);
}

#[test]
fn scopes_nest_and_close() {
    let table = scan("\
.scope Gfx
.proc draw
rts
.endproc
.endscope
rest:");
    assert_eq!(table.scopes.len(),3);
    let gfx = &table.scopes[1];
    assert_eq!(gfx.name,"Gfx");
    assert_eq!(gfx.kind,ScopeKind::Scope);
    assert_eq!(gfx.parent,Some(ROOT_SCOPE));
    assert_eq!(gfx.body.end.line,4);
    let draw = &table.scopes[2];
    assert_eq!(draw.kind,ScopeKind::Proc);
    assert_eq!(draw.parent,Some(1));
    assert_eq!(draw.body.end.line,3);
    // the label after .endscope lands back in the root
    assert_eq!(table.symbols[0].scope,ROOT_SCOPE);
}

#[test]
fn mismatched_closer_is_ignored() {
    let table = scan("\
.proc foo
.endscope
rts
.endproc");
    assert_eq!(table.scopes[1].body.end.line,3);
}

#[test]
fn unclosed_scope_extends_to_eof() {
    let table = scan("\
.proc foo
rts");
    assert_eq!(table.scopes[1].body.end.line,2);
}

#[test]
fn proc_inherits_segment() {
    let table = scan("\
.segment \"GFX\"
.proc draw
.endproc
.code
.proc other
.endproc");
    assert_eq!(table.scopes[1].segment,Some("GFX".to_string()));
    assert_eq!(table.scopes[2].segment,Some("CODE".to_string()));
}

#[test]
fn segment_opaque_after_include() {
    let table = scan("\
.include \"head.inc\"
after:");
    assert_eq!(table.include_args.len(),1);
    assert_eq!(table.include_args[0].path,"head.inc");
    let seg = table.symbols[0].segment.clone().expect("no segment");
    assert!(is_synthetic(&seg));
}

#[test]
fn declarations() {
    let table = scan("\
.import foo, bar
.importzp zp1
.export baz
.exportzp zp2
.global both
.export two = 2");
    assert_eq!(table.imports.len(),4);
    assert_eq!(table.imports[0].kind,ImportKind::Import);
    assert_eq!(table.imports[2].addr_size,Some("zeropage".to_string()));
    assert_eq!(table.imports[3].kind,ImportKind::Global);
    assert_eq!(table.exports.len(),4);
    assert_eq!(table.exports[0].name,"baz");
    assert_eq!(table.exports[2].kind,ExportKind::Global);
    assert_eq!(table.exports[3].value,Some("2".to_string()));
    // the assigned export also defines a constant
    assert_eq!(table.symbols.len(),1);
    assert_eq!(table.symbols[0].name,"two");
    assert_eq!(table.symbols[0].kind,SymbolKind::Constant);
}

#[test]
fn struct_members() {
    let table = scan("\
.struct Point
x .word
y .word
.endstruct
.struct
pos .tag Point
.endstruct");
    assert_eq!(table.scopes[1].name,"Point");
    assert_eq!(table.scopes[1].kind,ScopeKind::Struct);
    assert!(is_synthetic(&table.scopes[2].name));
    let names: Vec<&str> = table.symbols.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names,vec!["x","y","pos"]);
    assert!(table.symbols.iter().all(|s| s.kind==SymbolKind::StructMember));
    // the .tag member references the struct scope
    assert!(table.references.iter().any(|r| r.name=="Point" && r.ctx==RefContext::Scope));
}

#[test]
fn enum_members() {
    let table = scan("\
.enum Color
RED
GREEN = 2
.endenum");
    assert_eq!(table.scopes[1].kind,ScopeKind::Enum);
    let names: Vec<&str> = table.symbols.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names,vec!["RED","GREEN"]);
    assert!(table.symbols.iter().all(|s| s.kind==SymbolKind::EnumMember));
}

#[test]
fn macros_are_idempotent() {
    let table = scan("\
.macro push16 addr
lda addr
.endmacro
.macro push16 addr
.endmacro
.define DOUBLE(x) ((x)*2)");
    assert_eq!(table.macros.len(),2);
    assert_eq!(table.macros[0].name,"push16");
    assert_eq!(table.macros[0].kind,MacroKind::Macro);
    assert_eq!(table.macros[0].body.end.line,2);
    assert_eq!(table.macros[1].kind,MacroKind::Define);
}

#[test]
fn macro_body_leaves_scopes_alone() {
    let table = scan("\
.macro weird
inner:
.proc nope
.endmacro
top:");
    assert_eq!(table.scopes.len(),1);
    let names: Vec<&str> = table.symbols.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names,vec!["top"]);
}

#[test]
fn call_sites_are_tagged() {
    let table = scan("\
.proc a
jsr b
lda b
.endproc
jsr c");
    let jsr_b = table.references.iter().find(|r| r.name=="b" && r.rng.start.line==1).expect("no ref");
    assert!(jsr_b.caller.is_some());
    let lda_b = table.references.iter().find(|r| r.name=="b" && r.rng.start.line==2).expect("no ref");
    assert!(lda_b.caller.is_none());
    let jsr_c = table.references.iter().find(|r| r.name=="c").expect("no ref");
    assert!(jsr_c.caller.is_none());
}

#[test]
fn macro_calls_are_references() {
    let table = scan("push16 vec");
    assert!(table.references.iter().any(|r| r.name=="push16" && r.ctx==RefContext::Macro));
    assert!(table.references.iter().any(|r| r.name=="vec" && r.ctx==RefContext::Symbol));
}

#[test]
fn registers_are_not_references() {
    let table = scan("lda table,x");
    let names: Vec<&str> = table.references.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names,vec!["table"]);
}

#[test]
fn boundaries() {
    let table = scan("\
foo:
@l: nop
.proc p
.endproc
.scope s
.endscope");
    // labels and proc openers bound cheap locals, .scope does not
    assert_eq!(table.boundaries,vec![0,2]);
}
