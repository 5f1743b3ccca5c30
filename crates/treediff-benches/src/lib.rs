//! Synthetic corpora for benchmarking `treediff-core`.
//!
//! Every corpus is generated deterministically from its size, serialized to
//! JSON text and canonicalized back, so throughput numbers account for the
//! same bytes on every run.
//!
//! # Examples
//!
//! ```
//! use treediff_benches::available_corpora;
//! use treediff_core::DiffOptions;
//!
//! let corpus = available_corpora().iter().find(|c| c.name() == "menu-tree").unwrap();
//! let dataset = corpus.load().unwrap();
//! assert!(!dataset.diff(&DiffOptions::default()).is_empty());
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs)]

use serde_json::{json, Value};
use treediff_core::{compare_keyed_trees, compare_values, CanonicalizeError, Diff, DiffOptions, Node};

/// Which comparison a corpus is meant for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CorpusKind {
    /// Keyed trees with an `id` identity and a `children` field.
    KeyedTree,
    /// Nested objects and arrays without identities.
    Document,
}

/// A named, lazily generated pair of documents.
#[derive(Clone, Copy, Debug)]
pub struct Corpus {
    name: &'static str,
    kind: CorpusKind,
    size: usize,
}

static CORPORA: [Corpus; 3] = [
    Corpus { name: "menu-tree", kind: CorpusKind::KeyedTree, size: 40 },
    Corpus { name: "menu-tree-large", kind: CorpusKind::KeyedTree, size: 400 },
    Corpus { name: "config-document", kind: CorpusKind::Document, size: 200 },
];

/// Returns every registered corpus.
#[must_use]
pub fn available_corpora() -> &'static [Corpus] {
    &CORPORA
}

impl Corpus {
    /// Returns the corpus name used as benchmark id.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the comparison the corpus targets.
    #[must_use]
    pub fn kind(&self) -> CorpusKind {
        self.kind
    }

    /// Size of both documents as JSON text.
    #[must_use]
    pub fn fixture_bytes(&self) -> usize {
        let (before, after) = self.texts();
        before.len() + after.len()
    }

    /// Generates and canonicalizes both documents.
    pub fn load(&self) -> Result<Dataset, CanonicalizeError> {
        let (before, after) = self.texts();
        Ok(Dataset {
            kind: self.kind,
            before: Node::from_json_str(&before)?,
            after: Node::from_json_str(&after)?,
        })
    }

    fn texts(&self) -> (String, String) {
        let (before, after) = match self.kind {
            CorpusKind::KeyedTree => (menu_tree(self.size, 0), menu_tree(self.size, 1)),
            CorpusKind::Document => (config_document(self.size, 0), config_document(self.size, 1)),
        };
        (before.to_string(), after.to_string())
    }
}

/// Canonicalized old and new document of a corpus.
#[derive(Clone, Debug)]
pub struct Dataset {
    kind: CorpusKind,
    before: Node,
    after: Node,
}

impl Dataset {
    /// Returns the old document.
    #[must_use]
    pub fn before(&self) -> &Node {
        &self.before
    }

    /// Returns the new document.
    #[must_use]
    pub fn after(&self) -> &Node {
        &self.after
    }

    /// Compares the documents with the comparison the corpus targets.
    #[must_use]
    pub fn diff(&self, options: &DiffOptions) -> Diff {
        match self.kind {
            CorpusKind::KeyedTree => compare_keyed_trees(&self.before, &self.after, options),
            CorpusKind::Document => compare_values(&self.before, &self.after, options),
        }
    }
}

/// Three-level menu. Revision 1 swaps neighbouring sections, renames every
/// seventh entry, drops every eleventh leaf and appends one leaf per section.
fn menu_tree(size: usize, revision: usize) -> Value {
    let mut sections: Vec<Value> = (0..size)
        .map(|section| {
            let mut items: Vec<Value> = (0..8)
                .filter(|item| revision == 0 || (section * 8 + item) % 11 != 0)
                .map(|item| {
                    let id = section * 100 + item;
                    let title = if revision == 1 && id % 7 == 0 {
                        format!("Item {id} (renamed)")
                    } else {
                        format!("Item {id}")
                    };
                    json!({ "id": id, "title": title, "visible": item % 3 != 0 })
                })
                .collect();
            if revision == 1 {
                items.push(json!({ "id": section * 100 + 99, "title": "New item", "visible": true }));
            }
            json!({
                "id": format!("section-{section}"),
                "title": format!("Section {section}"),
                "children": [{ "id": format!("group-{section}"), "title": "Group", "children": items }]
            })
        })
        .collect();
    if revision == 1 {
        for pair in sections.chunks_mut(2) {
            pair.reverse();
        }
    }
    Value::Array(sections)
}

/// Flat service map with nested settings. Revision 1 bumps every fifth
/// replica count, removes every ninth service and grows every fourth tag list.
fn config_document(size: usize, revision: usize) -> Value {
    let services: serde_json::Map<String, Value> = (0..size)
        .filter(|service| revision == 0 || service % 9 != 0)
        .map(|service| {
            let replicas = if revision == 1 && service % 5 == 0 { 3 } else { 2 };
            let mut tags = vec![json!("web"), json!(format!("tier-{}", service % 4))];
            if revision == 1 && service % 4 == 0 {
                tags.push(json!("canary"));
            }
            let body = json!({
                "image": format!("registry.local/service-{service}:1.0"),
                "replicas": replicas,
                "env": { "RUST_LOG": "info", "PORT": 8000 + service },
                "tags": tags
            });
            (format!("service-{service}"), body)
        })
        .collect();
    json!({ "version": 2 + revision, "services": services })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corpora_load_and_differ() {
        for corpus in available_corpora() {
            let dataset = corpus.load().expect("corpus loads");
            assert!(corpus.fixture_bytes() > 0);
            assert!(!dataset.diff(&DiffOptions::default()).is_empty(), "{}", corpus.name());
        }
    }

    #[test]
    fn generic_corpus_diff_applies() {
        let corpus = available_corpora()
            .iter()
            .find(|c| c.kind() == CorpusKind::Document)
            .expect("document corpus registered");
        let dataset = corpus.load().unwrap();
        let diff = dataset.diff(&DiffOptions::default());
        assert_eq!(&dataset.before().apply_diff(&diff).unwrap(), dataset.after());
    }
}
