use super::super::exports::{ExportEntry,ExportsMap};
use super::super::includes::IncludesGraph;
use super::super::{ExportKind,ROOT_SCOPE};
use lsp_types as lsp;

fn entry(uri: &str, name: &str) -> ExportEntry {
    let zero = lsp::Position::new(0,0);
    ExportEntry {
        uri: uri.to_string(),
        name: name.to_string(),
        kind: ExportKind::Export,
        rng: lsp::Range::new(zero,zero),
        scope: ROOT_SCOPE,
        index: 0
    }
}

mod includes {
    use super::IncludesGraph;

    #[test]
    fn adjacency_is_mutual() {
        let mut graph = IncludesGraph::new();
        graph.update_includes("a",vec!["b".to_string(),"c".to_string()]);
        graph.update_includes("b",vec!["c".to_string()]);
        assert_eq!(graph.includes_of("a"),&["b".to_string(),"c".to_string()]);
        assert_eq!(graph.included_by("c"),&["a".to_string(),"b".to_string()]);
        // replacement adjusts the inverse edges
        graph.update_includes("a",vec!["b".to_string()]);
        assert_eq!(graph.included_by("c"),&["b".to_string()]);
        graph.remove_file("b");
        assert!(graph.included_by("c").is_empty());
        assert!(graph.includes_of("b").is_empty());
    }

    #[test]
    fn closure_of_simple_chain() {
        let mut graph = IncludesGraph::new();
        graph.update_includes("root",vec!["head".to_string()]);
        let mut unit = graph.translation_unit("head");
        unit.sort();
        assert_eq!(unit,vec!["head".to_string(),"root".to_string()]);
        let mut unit = graph.translation_unit("root");
        unit.sort();
        assert_eq!(unit,vec!["head".to_string(),"root".to_string()]);
    }

    #[test]
    fn closure_of_shared_include() {
        // two roots share one include; each root sees only its own unit,
        // the include sees both
        let mut graph = IncludesGraph::new();
        graph.update_includes("game",vec!["zp.inc".to_string()]);
        graph.update_includes("editor",vec!["zp.inc".to_string()]);
        let mut unit = graph.translation_unit("zp.inc");
        unit.sort();
        assert_eq!(unit,vec!["editor".to_string(),"game".to_string(),"zp.inc".to_string()]);
        let mut unit = graph.translation_unit("game");
        unit.sort();
        assert_eq!(unit,vec!["game".to_string(),"zp.inc".to_string()]);
    }

    #[test]
    fn lone_file_is_its_own_root() {
        let graph = IncludesGraph::new();
        assert_eq!(graph.translation_unit("solo"),vec!["solo".to_string()]);
    }

    #[test]
    fn cycles_are_tolerated() {
        let mut graph = IncludesGraph::new();
        graph.update_includes("a",vec!["b".to_string()]);
        graph.update_includes("b",vec!["a".to_string()]);
        let mut unit = graph.translation_unit("a");
        unit.sort();
        assert_eq!(unit,vec!["a".to_string(),"b".to_string()]);
    }
}

mod exports {
    use super::{entry,ExportsMap};

    #[test]
    fn replacement_is_atomic() {
        let mut map = ExportsMap::new();
        map.update_exports("lib",vec![entry("lib","foo"),entry("lib","bar")]);
        map.update_exports("aux",vec![entry("aux","foo")]);
        assert_eq!(map.get("foo").len(),2);
        // replace lib's set: bar must vanish, foo must appear exactly once for lib
        map.update_exports("lib",vec![entry("lib","foo"),entry("lib","baz")]);
        assert!(map.get("bar").is_empty());
        assert_eq!(map.get("foo").iter().filter(|e| e.uri=="lib").count(),1);
        assert_eq!(map.get("baz").len(),1);
        map.remove_file("lib");
        assert_eq!(map.get("foo").len(),1);
        assert_eq!(map.get("foo")[0].uri,"aux");
        assert!(map.get("baz").is_empty());
    }
}
