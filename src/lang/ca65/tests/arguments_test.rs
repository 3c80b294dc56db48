use super::super::arguments::ArgParser;
use super::super::RefContext;

#[test]
fn simple_names() {
    let parser = ArgParser::new();
    let groups = parser.parse("foo, bar",10);
    assert_eq!(groups.len(),2);
    assert_eq!(groups[0].tokens[0].text,"foo");
    assert_eq!(groups[0].tokens[0].offset,10);
    assert_eq!(groups[0].tokens[0].ctx,RefContext::Symbol);
    assert_eq!(groups[1].tokens[0].text,"bar");
    assert_eq!(groups[1].tokens[0].offset,15);
}

#[test]
fn qualified_name() {
    let parser = ArgParser::new();
    let groups = parser.parse("Gfx::Sprite::HEIGHT",0);
    assert_eq!(groups.len(),1);
    let tokens = &groups[0].tokens;
    assert_eq!(tokens.len(),3);
    assert_eq!(tokens[0].text,"Gfx");
    assert_eq!(tokens[0].ctx,RefContext::Scope);
    assert_eq!(tokens[1].text,"Sprite");
    assert_eq!(tokens[1].ctx,RefContext::Scope);
    assert_eq!(tokens[2].text,"HEIGHT");
    assert_eq!(tokens[2].ctx,RefContext::Symbol);
    assert_eq!(tokens[2].offset,13);
}

#[test]
fn root_anchor() {
    let parser = ArgParser::new();
    let groups = parser.parse("::reset",4);
    assert_eq!(groups.len(),1);
    let tokens = &groups[0].tokens;
    assert_eq!(tokens.len(),2);
    assert_eq!(tokens[0].text,"");
    assert_eq!(tokens[0].offset,4);
    assert_eq!(tokens[1].text,"reset");
    assert_eq!(tokens[1].offset,6);
}

#[test]
fn sizeof_context() {
    let parser = ArgParser::new();
    let groups = parser.parse("#.sizeof(Point)+1",0);
    assert_eq!(groups.len(),1);
    let tokens = &groups[0].tokens;
    assert_eq!(tokens[0].text,"Point");
    assert_eq!(tokens[0].ctx,RefContext::Sizeof);
    assert_eq!(tokens[0].offset,9);
}

#[test]
fn sizeof_with_qualifier() {
    let parser = ArgParser::new();
    let groups = parser.parse(".sizeof(Gfx::Sprite)",0);
    assert_eq!(groups.len(),1);
    let tokens = &groups[0].tokens;
    assert_eq!(tokens.len(),2);
    assert_eq!(tokens[0].ctx,RefContext::Scope);
    assert_eq!(tokens[1].text,"Sprite");
    assert_eq!(tokens[1].ctx,RefContext::Sizeof);
}

#[test]
fn masked_literals() {
    let parser = ArgParser::new();
    // hex digits and string contents must not read as names
    assert!(parser.parse("$FADE",0).is_empty());
    assert!(parser.parse("\"abc\"",0).is_empty());
    assert!(parser.parse("'x'",0).is_empty());
    let groups = parser.parse("$FF00+offset",0);
    assert_eq!(groups.len(),1);
    assert_eq!(groups[0].tokens[0].text,"offset");
}

#[test]
fn pseudo_function_is_not_a_name() {
    let parser = ArgParser::new();
    let groups = parser.parse(".lobyte(vec)",0);
    assert_eq!(groups.len(),1);
    assert_eq!(groups[0].tokens[0].text,"vec");
}

#[test]
fn import_export_items() {
    let parser = ArgParser::new();
    let items = parser.parse_import_export("foo, bar: zeropage, two = 2",8);
    assert_eq!(items.len(),3);
    assert_eq!(items[0].name,"foo");
    assert_eq!(items[0].offset,8);
    assert_eq!(items[0].addr_size,None);
    assert_eq!(items[1].name,"bar");
    assert_eq!(items[1].addr_size,Some("zeropage".to_string()));
    assert_eq!(items[2].name,"two");
    assert_eq!(items[2].value,Some("2".to_string()));
}

#[test]
fn import_export_assignment_variants() {
    let parser = ArgParser::new();
    let items = parser.parse_import_export("addr := $2000",0);
    assert_eq!(items.len(),1);
    assert_eq!(items[0].name,"addr");
    assert_eq!(items[0].value,Some("$2000".to_string()));
}
