//! Includes graph.
//!
//! Directed multigraph over files.  An edge `A -> B` means `A` includes
//! `B`.  Both directions are kept so masters of an include can be found as
//! cheaply as includes of a master.  Edges come only from `.include`
//! directives that resolved to a known file.
//!
//! The translation unit of a file `F` is built from the roots above it: a
//! root is a file with no inbound include edge that transitively includes
//! `F`.  Every file such a root can reach belongs to the unit.  Cycles are
//! tolerated, traversal carries a visited set; a cycle merely reduces the
//! number of roots.

use std::collections::{HashMap,HashSet};

#[derive(Clone,Default)]
pub struct IncludesGraph {
    /// file -> files it includes, duplicate edges allowed
    includes: HashMap<String,Vec<String>>,
    /// file -> files that include it
    included_by: HashMap<String,Vec<String>>
}

impl IncludesGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replace the outgoing edges of `uri`, adjusting the
    /// inverse adjacency to match.
    pub fn update_includes(&mut self, uri: &str, neighbors: Vec<String>) {
        if let Some(old) = self.includes.remove(uri) {
            for target in old {
                if let Some(back) = self.included_by.get_mut(&target) {
                    back.retain(|s| s != uri);
                }
            }
        }
        for target in &neighbors {
            self.included_by.entry(target.to_string()).or_default().push(uri.to_string());
        }
        if !neighbors.is_empty() {
            self.includes.insert(uri.to_string(),neighbors);
        }
    }

    /// Remove a file from the graph entirely, both directions.
    pub fn remove_file(&mut self, uri: &str) {
        self.update_includes(uri,Vec::new());
        if let Some(sources) = self.included_by.remove(uri) {
            for source in sources {
                if let Some(fwd) = self.includes.get_mut(&source) {
                    fwd.retain(|s| s != uri);
                }
            }
        }
    }

    pub fn includes_of(&self, uri: &str) -> &[String] {
        self.includes.get(uri).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn included_by(&self, uri: &str) -> &[String] {
        self.included_by.get(uri).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Every file reachable along `includes` edges, not counting `uri`.
    pub fn descendants(&self, uri: &str) -> HashSet<String> {
        self.reach(uri,&self.includes)
    }

    /// Every file reachable along `included-by` edges, not counting `uri`.
    pub fn ancestors(&self, uri: &str) -> HashSet<String> {
        self.reach(uri,&self.included_by)
    }

    fn reach(&self, uri: &str, adjacency: &HashMap<String,Vec<String>>) -> HashSet<String> {
        let mut visited = HashSet::new();
        let mut stack: Vec<String> = adjacency.get(uri).cloned().unwrap_or_default();
        while let Some(curr) = stack.pop() {
            if visited.insert(curr.clone()) {
                if let Some(next) = adjacency.get(&curr) {
                    for n in next {
                        if !visited.contains(n) {
                            stack.push(n.clone());
                        }
                    }
                }
            }
        }
        visited.remove(uri);
        visited
    }

    /// Root files above `uri`: ancestors with no inbound edges.  A file
    /// with no ancestors is its own root.
    pub fn roots_of(&self, uri: &str) -> Vec<String> {
        let ancestors = self.ancestors(uri);
        if ancestors.is_empty() {
            return vec![uri.to_string()];
        }
        let mut ans: Vec<String> = ancestors.into_iter()
            .filter(|a| self.included_by(a).is_empty())
            .collect();
        ans.sort();
        if ans.is_empty() {
            // every ancestor is itself included: a cycle; fall back to the file itself
            ans.push(uri.to_string());
        }
        ans
    }

    /// The translation unit of `uri`: for every root above it, the root and
    /// all its descendants, deduplicated.  `uri` itself is always a member.
    pub fn translation_unit(&self, uri: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut ans = vec![uri.to_string()];
        seen.insert(uri.to_string());
        for root in self.roots_of(uri) {
            if seen.insert(root.clone()) {
                ans.push(root.clone());
            }
            for file in self.descendants(&root) {
                if seen.insert(file.clone()) {
                    ans.push(file);
                }
            }
        }
        ans
    }

    /// Human-readable dump for the debug request.
    pub fn dump(&self) -> String {
        let mut ans = String::new();
        let mut uris: Vec<&String> = self.includes.keys().collect();
        uris.sort();
        for uri in uris {
            ans += &format!("{}\n",uri);
            for target in self.includes_of(uri) {
                ans += &format!("    includes {}\n",target);
            }
        }
        let mut uris: Vec<&String> = self.included_by.keys().collect();
        uris.sort();
        for uri in uris {
            let sources = self.included_by(uri);
            if !sources.is_empty() {
                ans += &format!("{}\n",uri);
                for source in sources {
                    ans += &format!("    included by {}\n",source);
                }
            }
        }
        ans
    }
}
